pub mod panels;

use crate::app::App;
use crate::style;
use ratatui::layout::{Constraint, Layout};
use ratatui::Frame;

impl App {
    pub fn render(&self, frame: &mut Frame) {
        let [header, body, footer] = Layout::vertical([
            Constraint::Length(style::HEADER_HEIGHT),
            Constraint::Min(1),
            Constraint::Length(style::FOOTER_HEIGHT),
        ])
        .areas(frame.area());

        let view = self.session.view();
        self.render_header(frame, header, &view);
        self.render_entries(frame, body, &view);
        self.render_footer(frame, footer, &view);
    }
}
