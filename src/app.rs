use crate::config::{Config, DownloadConfig};
use crate::error::BrowseError;
use crate::io::worker::{IoCommand, IoResult};
use crate::io::UserInfo;
use crate::message::Message;
use crate::state::{Outcome, Session, Step, UIState};
use std::sync::mpsc::{Receiver, Sender};
use tracing::{debug, info, warn};

pub struct App {
    pub session: Session,
    pub ui: UIState,
    pub user: UserInfo,
    download: DownloadConfig,
    command_tx: Sender<IoCommand>,
    result_rx: Receiver<IoResult>,
    /// Id of the fetch in flight. Only one at a time.
    pending: Option<u64>,
    next_id: u64,
    pub should_quit: bool,
}

impl App {
    pub fn new(
        session: Session,
        user: UserInfo,
        config: &Config,
        (command_tx, result_rx): (Sender<IoCommand>, Receiver<IoResult>),
    ) -> Self {
        Self {
            session,
            ui: UIState::new(
                config.ui.show_icons,
                config.ui.show_details,
                config.ui.message_timeout_secs,
            ),
            user,
            download: config.download.clone(),
            command_tx,
            result_rx,
            pending: None,
            next_id: 0,
            should_quit: false,
        }
    }

    pub fn is_loading(&self) -> bool {
        self.pending.is_some()
    }

    pub fn update(&mut self, message: Message) {
        match message {
            Message::Quit => self.should_quit = true,
            Message::CursorUp => self.session.cursor_up(),
            Message::CursorDown => self.session.cursor_down(),
            Message::NextPage => {
                if !self.busy() {
                    let step = self.session.begin_advance();
                    self.dispatch(step);
                }
            }
            Message::PrevPage => {
                if !self.busy() {
                    self.session.retreat();
                }
            }
            Message::Open => {
                if !self.busy() {
                    let step = self.session.begin_open();
                    self.dispatch(step);
                }
            }
            Message::Back => self.back(),
            Message::StartSearch => {
                if !self.busy() {
                    self.session.enter_search();
                }
            }
            Message::QueryChar(c) => self.session.push_query_char(c),
            Message::QueryBackspace => self.session.pop_query_char(),
            Message::SubmitQuery => self.submit_query(),
            Message::CancelSearch => {
                if let Err(e) = self.session.exit_search() {
                    self.report(e);
                }
            }
            Message::Dismiss => {
                self.ui.dismiss();
            }
        }
    }

    /// Rejects page and folder moves while another fetch is outstanding.
    fn busy(&mut self) -> bool {
        if self.is_loading() {
            self.ui.set_info("Still loading, please wait".to_string());
            return true;
        }
        false
    }

    fn back(&mut self) {
        if self.busy() {
            return;
        }
        match self.session.ascend() {
            Ok(()) => {}
            Err(BrowseError::NoPreviousState) => debug!("already at the top"),
            Err(e) => self.report(e),
        }
    }

    fn submit_query(&mut self) {
        if self.busy() {
            return;
        }
        match self.session.begin_search() {
            Ok(step) => self.dispatch(step),
            Err(e) => self.report(e),
        }
    }

    fn dispatch(&mut self, step: Step) {
        match step {
            Step::Done(outcome) => self.handle_outcome(outcome),
            Step::Fetch(job) => {
                let id = self.next_id;
                self.next_id += 1;
                self.ui.loading = Some(job.describe());
                if self.command_tx.send(IoCommand::Fetch { id, job }).is_err() {
                    self.ui.loading = None;
                    self.ui.set_error("I/O worker is not running".to_string());
                    return;
                }
                self.pending = Some(id);
            }
        }
    }

    fn handle_outcome(&mut self, outcome: Outcome) {
        match outcome {
            Outcome::OpenFile(entry) => {
                info!(file = %entry.name, "download requested");
                self.ui.set_info(format!("Downloading {}", entry.name));
                let command = IoCommand::Download {
                    entry,
                    dir: self.download.output_dir.clone(),
                    open_after: self.download.open_after_download,
                };
                if self.command_tx.send(command).is_err() {
                    self.ui.set_error("I/O worker is not running".to_string());
                }
            }
            Outcome::Stale => debug!("dropped stale result"),
            Outcome::Updated | Outcome::Unchanged => {}
        }
    }

    fn report(&mut self, error: BrowseError) {
        self.ui.set_error(error.to_string());
    }

    /// Applies every result the worker has finished so far.
    pub fn drain_io(&mut self) {
        while let Ok(result) = self.result_rx.try_recv() {
            self.handle_io_result(result);
        }
    }

    fn handle_io_result(&mut self, result: IoResult) {
        match result {
            IoResult::Fetched { id, job, result } => {
                if self.pending != Some(id) {
                    warn!(id, "result for a fetch that is no longer pending");
                    return;
                }
                self.pending = None;
                self.ui.loading = None;
                match self.session.complete(job, result) {
                    Ok(outcome) => self.handle_outcome(outcome),
                    Err(e) => self.report(e),
                }
            }
            IoResult::Downloaded { name, result } => match result {
                Ok(path) => self.ui.set_info(format!("Saved {}", path.display())),
                Err(e) => {
                    warn!(file = %name, error = %e, "download failed");
                    self.ui.set_error(format!("Download of {} failed: {}", name, e));
                }
            },
        }
    }
}
