pub mod context;
pub mod mode;
pub mod navigation;
pub mod page_cache;
pub mod session;
pub mod ui;

#[cfg(test)]
pub mod testing;

pub use mode::ModeKind;
pub use navigation::Crumb;
pub use page_cache::ListingPage;
pub use session::{FetchJob, Fetched, Outcome, Session, SessionView, Step};
pub use ui::UIState;
