// UI state - status messages and the loading indicator
use std::time::{Duration, Instant};

pub struct UIState {
    pub error_message: Option<(String, Instant)>,
    pub info_message: Option<(String, Instant)>,
    /// Label of the fetch in flight, if any.
    pub loading: Option<String>,
    pub show_icons: bool,
    pub show_details: bool,
    pub message_timeout: Duration,
}

impl UIState {
    pub fn new(show_icons: bool, show_details: bool, message_timeout_secs: u64) -> Self {
        Self {
            error_message: None,
            info_message: None,
            loading: None,
            show_icons,
            show_details,
            message_timeout: Duration::from_secs(message_timeout_secs),
        }
    }

    pub fn set_error(&mut self, message: String) {
        self.error_message = Some((message, Instant::now()));
    }

    pub fn set_info(&mut self, message: String) {
        self.info_message = Some((message, Instant::now()));
    }

    pub fn dismiss(&mut self) -> bool {
        let had_message = self.error_message.is_some() || self.info_message.is_some();
        self.error_message = None;
        self.info_message = None;
        had_message
    }

    pub fn clear_expired_messages(&mut self) {
        let timeout = self.message_timeout;
        if let Some((_, time)) = &self.error_message {
            if time.elapsed() >= timeout {
                self.error_message = None;
            }
        }
        if let Some((_, time)) = &self.info_message {
            if time.elapsed() >= timeout {
                self.info_message = None;
            }
        }
    }
}
