// Header, entry list and footer
use crate::app::App;
use crate::state::{ModeKind, SessionView};
use crate::style;
use ratatui::layout::Rect;
use ratatui::text::{Line, Span};
use ratatui::widgets::{List, ListItem, ListState, Paragraph};
use ratatui::Frame;

/// `< Page: n >`, each arrow shown only when that direction is available.
pub fn page_indicator(current_page: usize, at_last_page: bool) -> String {
    let left = if current_page > 1 { "<" } else { " " };
    let right = if at_last_page { " " } else { ">" };
    format!("{} Page: {} {}", left, current_page, right)
}

impl App {
    pub(crate) fn render_header(&self, frame: &mut Frame, area: Rect, view: &SessionView) {
        let identity = Line::from(vec![
            Span::styled("kura", style::title()),
            Span::raw("  "),
            Span::raw(self.user.display_name.clone()),
            Span::styled(format!(" <{}>", self.user.email_address), style::dimmed()),
        ]);
        let location = match (view.mode, view.search_query) {
            (ModeKind::Searching, Some(query)) => {
                Line::from(Span::styled(format!("Search results for \"{}\"", query), style::title()))
            }
            _ => Line::from(view.breadcrumb.render(style::BREADCRUMB_SEPARATOR)),
        };
        frame.render_widget(Paragraph::new(vec![identity, location]), area);
    }

    pub(crate) fn render_entries(&self, frame: &mut Frame, area: Rect, view: &SessionView) {
        if view.entries.is_empty() {
            let text = if view.mode == ModeKind::Searching {
                "No results"
            } else {
                "This folder is empty"
            };
            frame.render_widget(Paragraph::new(text).style(style::dimmed()), area);
            return;
        }

        let items: Vec<ListItem> = view
            .entries
            .iter()
            .map(|entry| {
                let mut spans = Vec::new();
                if self.ui.show_icons {
                    spans.push(Span::raw(format!("{} ", entry.get_icon())));
                }
                let name = format!("{:<width$}", entry.name, width = style::NAME_COL_WIDTH);
                if entry.is_folder() {
                    spans.push(Span::styled(name, style::folder()));
                } else {
                    spans.push(Span::raw(name));
                }
                if self.ui.show_details {
                    spans.push(Span::styled(
                        format!(
                            " {:>width$}  {}",
                            entry.size_label(),
                            entry.modified_label(),
                            width = style::SIZE_COL_WIDTH
                        ),
                        style::dimmed(),
                    ));
                }
                ListItem::new(Line::from(spans))
            })
            .collect();

        let list = List::new(items)
            .highlight_symbol(style::HIGHLIGHT_SYMBOL)
            .highlight_style(style::selected());
        let mut state = ListState::default().with_selected(Some(view.cursor));
        frame.render_stateful_widget(list, area, &mut state);
    }

    pub(crate) fn render_footer(&self, frame: &mut Frame, area: Rect, view: &SessionView) {
        if view.mode == ModeKind::TypingQuery {
            let query = view.search_query.unwrap_or_default();
            let line = Line::from(vec![
                Span::styled("Search: ", style::title()),
                Span::raw(query.to_string()),
                Span::styled("_", style::dimmed()),
            ]);
            frame.render_widget(Paragraph::new(line), area);
            return;
        }

        let mut spans = vec![Span::raw(page_indicator(view.current_page, view.at_last_page))];
        if let Some(label) = &self.ui.loading {
            spans.push(Span::raw(" | "));
            spans.push(Span::styled(format!("{}...", label), style::loading()));
        } else if let Some((message, _)) = &self.ui.error_message {
            spans.push(Span::raw(" | "));
            spans.push(Span::styled(message.clone(), style::error()));
        } else if let Some((message, _)) = &self.ui.info_message {
            spans.push(Span::raw(" | "));
            spans.push(Span::styled(message.clone(), style::info()));
        } else {
            spans.push(Span::styled(
                " | enter open  backspace back  / search  q quit",
                style::dimmed(),
            ));
        }
        frame.render_widget(Paragraph::new(Line::from(spans)), area);
    }
}
