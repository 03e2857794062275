// Session - the primary browse, the search overlay and the navigation stack
use crate::entry::{kind_for_mime, Entry, EntryKind};
use crate::error::{BrowseError, FetchError};
use crate::io::ListingService;
use crate::state::context::{AdvanceStep, BrowseContext, ListingSource, PageRequest};
use crate::state::mode::{AppMode, ModeKind};
use crate::state::navigation::{Breadcrumb, Crumb, FrameView, NavigationFrame, NavigationStack};
use crate::state::page_cache::ListingPage;
use tracing::{debug, info, warn};

/// Which view an open request was issued from.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Origin {
    Browse,
    Search,
}

/// Remote work a session operation needs before it can complete.
#[derive(Clone, Debug, PartialEq)]
pub enum FetchJob {
    NextPage(PageRequest),
    Open { entry: Entry, origin: Origin },
    Search { query: String },
}

#[derive(Clone, Debug, PartialEq)]
pub enum Fetched {
    Page(ListingPage),
    Folder {
        page: ListingPage,
        /// Full path, resolved when the folder was reached from search results.
        path: Option<Breadcrumb>,
    },
    File(Entry),
    Search(ListingPage),
}

impl FetchJob {
    pub fn run(&self, service: &dyn ListingService) -> Result<Fetched, FetchError> {
        match self {
            Self::NextPage(request) => request.fetch(service).map(Fetched::Page),
            Self::Open { entry, origin } => {
                let mut entry = entry.clone();
                if entry.kind == EntryKind::Unknown {
                    entry.mime_type = service.resolve_type(&entry.id)?;
                    entry.kind = kind_for_mime(&entry.mime_type);
                }
                if !entry.is_folder() {
                    return Ok(Fetched::File(entry));
                }
                let page = service.list_children(&entry.id, "")?;
                let path = match origin {
                    Origin::Browse => None,
                    Origin::Search => Some(Breadcrumb::from_ancestors(
                        service.get_ancestors(&entry.id)?,
                    )),
                };
                Ok(Fetched::Folder { page, path })
            }
            Self::Search { query } => service.search(query, "").map(Fetched::Search),
        }
    }

    pub fn describe(&self) -> String {
        match self {
            Self::NextPage(_) => "Loading next page".to_string(),
            Self::Open { entry, .. } => format!("Opening {}", entry.name),
            Self::Search { query } => format!("Searching for \"{}\"", query),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum Outcome {
    Updated,
    Unchanged,
    /// The result arrived for a view that is no longer current and was dropped.
    Stale,
    /// The opened entry is a file; hand it to the content collaborator.
    OpenFile(Entry),
}

/// Either finished locally or waiting on a fetch.
#[derive(Clone, Debug, PartialEq)]
pub enum Step {
    Done(Outcome),
    Fetch(FetchJob),
}

/// Read-only snapshot handed to the renderer each frame.
#[derive(Debug)]
pub struct SessionView<'a> {
    pub breadcrumb: &'a Breadcrumb,
    pub entries: &'a [Entry],
    pub cursor: usize,
    pub current_page: usize,
    pub at_last_page: bool,
    pub mode: ModeKind,
    pub search_query: Option<&'a str>,
}

pub struct Session {
    browse: BrowseContext,
    mode: AppMode,
    stack: NavigationStack,
    breadcrumb: Breadcrumb,
}

impl Session {
    pub fn new(browse: BrowseContext, breadcrumb: Breadcrumb) -> Self {
        Self {
            browse,
            mode: AppMode::Browsing,
            stack: NavigationStack::new(),
            breadcrumb,
        }
    }

    /// Fetches the root listing and its breadcrumb. Failure here is fatal to the caller.
    pub fn start(service: &dyn ListingService, root_id: &str) -> Result<Self, FetchError> {
        let first = service.list_children(root_id, "")?;
        let ancestors = service.get_ancestors(root_id)?;
        info!(root = root_id, entries = first.entries.len(), "session started");
        Ok(Self::new(
            BrowseContext::new(ListingSource::folder(root_id), first),
            Breadcrumb::from_ancestors(ancestors),
        ))
    }

    pub fn mode(&self) -> &AppMode {
        &self.mode
    }

    #[cfg(test)]
    pub fn primary(&self) -> &BrowseContext {
        &self.browse
    }

    #[cfg(test)]
    pub fn breadcrumb(&self) -> &Breadcrumb {
        &self.breadcrumb
    }

    #[cfg(test)]
    pub fn stack_depth(&self) -> usize {
        self.stack.depth()
    }

    /// The context paging and cursor keys act on. None while a query is being typed.
    pub fn active(&self) -> Option<&BrowseContext> {
        match &self.mode {
            AppMode::Browsing => Some(&self.browse),
            AppMode::Searching { context, .. } => Some(context),
            AppMode::TypingQuery { .. } => None,
        }
    }

    fn active_mut(&mut self) -> Option<&mut BrowseContext> {
        match &mut self.mode {
            AppMode::Browsing => Some(&mut self.browse),
            AppMode::Searching { context, .. } => Some(context),
            AppMode::TypingQuery { .. } => None,
        }
    }

    fn origin(&self) -> Option<Origin> {
        match self.mode {
            AppMode::Browsing => Some(Origin::Browse),
            AppMode::Searching { .. } => Some(Origin::Search),
            AppMode::TypingQuery { .. } => None,
        }
    }

    pub fn view(&self) -> SessionView<'_> {
        let shown = self.active().unwrap_or(&self.browse);
        SessionView {
            breadcrumb: &self.breadcrumb,
            entries: shown.active_entries(),
            cursor: shown.cursor(),
            current_page: shown.current_page_index(),
            at_last_page: shown.at_last_page(),
            mode: self.mode.kind(),
            search_query: self.mode.search_query(),
        }
    }

    // --- Cursor and paging ---

    pub fn cursor_up(&mut self) {
        if let Some(ctx) = self.active_mut() {
            ctx.cursor_up();
        }
    }

    pub fn cursor_down(&mut self) {
        if let Some(ctx) = self.active_mut() {
            ctx.cursor_down();
        }
    }

    pub fn begin_advance(&mut self) -> Step {
        let Some(ctx) = self.active_mut() else {
            return Step::Done(Outcome::Unchanged);
        };
        match ctx.begin_advance() {
            AdvanceStep::Cached => Step::Done(Outcome::Updated),
            AdvanceStep::AtEnd => Step::Done(Outcome::Unchanged),
            AdvanceStep::Fetch(request) => Step::Fetch(FetchJob::NextPage(request)),
        }
    }

    pub fn retreat(&mut self) -> bool {
        self.active_mut().is_some_and(|ctx| ctx.retreat())
    }

    // --- Folders ---

    pub fn selected(&self) -> Option<&Entry> {
        self.active().and_then(|ctx| ctx.selected())
    }

    /// Opens the entry under the cursor.
    pub fn begin_open(&self) -> Step {
        match self.selected() {
            Some(entry) => self.begin_open_entry(entry),
            None => Step::Done(Outcome::Unchanged),
        }
    }

    pub fn begin_open_entry(&self, entry: &Entry) -> Step {
        match self.origin() {
            Some(origin) => Step::Fetch(FetchJob::Open {
                entry: entry.clone(),
                origin,
            }),
            None => Step::Done(Outcome::Unchanged),
        }
    }

    fn install_folder(&mut self, folder: Entry, page: ListingPage, path: Option<Breadcrumb>) {
        let fresh = BrowseContext::new(ListingSource::folder(&folder.id), page);
        let breadcrumb = match path {
            Some(path) => path,
            None => {
                let mut crumbs = self.breadcrumb.clone();
                crumbs.push(Crumb::new(folder.id.clone(), folder.name.clone()));
                crumbs
            }
        };
        let saved_crumbs = std::mem::replace(&mut self.breadcrumb, breadcrumb);
        let view = match std::mem::take(&mut self.mode) {
            AppMode::Searching { query, context } => {
                // the frozen primary is already saved in the frame pushed on search entry
                self.browse = fresh;
                FrameView::Search { query, context }
            }
            _ => FrameView::Browse(std::mem::replace(&mut self.browse, fresh)),
        };
        self.stack.push(NavigationFrame::new(view, saved_crumbs));
        debug!(folder = %folder.id, depth = self.stack.depth(), "descended");
    }

    /// Restores the most recent frame.
    pub fn ascend(&mut self) -> Result<(), BrowseError> {
        let frame = self.stack.pop().ok_or(BrowseError::NoPreviousState)?;
        let (view, breadcrumb) = frame.into_parts();
        self.breadcrumb = breadcrumb;
        match view {
            FrameView::Browse(context) => {
                self.browse = context;
                self.mode = AppMode::Browsing;
            }
            FrameView::Search { query, context } => {
                self.mode = AppMode::Searching { query, context };
            }
        }
        debug!(depth = self.stack.depth(), "ascended");
        Ok(())
    }

    // --- Search ---

    pub fn enter_search(&mut self) {
        self.mode = match std::mem::take(&mut self.mode) {
            AppMode::Browsing => {
                self.stack.push(NavigationFrame::new(
                    FrameView::Browse(self.browse.clone()),
                    self.breadcrumb.clone(),
                ));
                AppMode::TypingQuery {
                    input: String::new(),
                }
            }
            // already in search: the entry frame is still on the stack
            AppMode::TypingQuery { input } => AppMode::TypingQuery { input },
            AppMode::Searching { query, .. } => AppMode::TypingQuery { input: query },
        };
    }

    pub fn push_query_char(&mut self, c: char) {
        if let AppMode::TypingQuery { input } = &mut self.mode {
            input.push(c);
        }
    }

    pub fn pop_query_char(&mut self) {
        if let AppMode::TypingQuery { input } = &mut self.mode {
            input.pop();
        }
    }

    /// Submits the typed query. An empty query cancels the search.
    pub fn begin_search(&mut self) -> Result<Step, BrowseError> {
        let query = match &self.mode {
            AppMode::TypingQuery { input } => input.trim().to_string(),
            _ => return Ok(Step::Done(Outcome::Unchanged)),
        };
        if query.is_empty() {
            self.exit_search()?;
            return Ok(Step::Done(Outcome::Updated));
        }
        Ok(Step::Fetch(FetchJob::Search { query }))
    }

    /// Leaves search and returns to the view saved on search entry.
    pub fn exit_search(&mut self) -> Result<(), BrowseError> {
        if !self.mode.in_search() {
            return Ok(());
        }
        self.ascend()
    }

    // --- Completion ---

    /// Applies the result of a job produced by one of the `begin_*` calls.
    pub fn complete(
        &mut self,
        job: FetchJob,
        result: Result<Fetched, FetchError>,
    ) -> Result<Outcome, BrowseError> {
        let fetched = match result {
            Ok(fetched) => fetched,
            Err(err) => {
                warn!(error = %err, job = %job.describe(), "fetch failed");
                if matches!(job, FetchJob::Search { .. })
                    && self.mode.kind() == ModeKind::TypingQuery
                {
                    if let Err(restore) = self.ascend() {
                        warn!(error = %restore, "could not restore pre-search state");
                    }
                }
                return Err(err.into());
            }
        };

        match (job, fetched) {
            (FetchJob::NextPage(request), Fetched::Page(page)) => match self.active_mut() {
                Some(ctx) => {
                    if ctx.finish_advance(&request, page) {
                        Ok(Outcome::Updated)
                    } else {
                        Ok(Outcome::Stale)
                    }
                }
                None => Ok(Outcome::Stale),
            },
            (FetchJob::Open { origin, .. }, Fetched::File(entry)) => {
                if self.origin() != Some(origin) {
                    return Ok(Outcome::Stale);
                }
                Ok(Outcome::OpenFile(entry))
            }
            (FetchJob::Open { entry, origin }, Fetched::Folder { page, path }) => {
                if self.origin() != Some(origin) {
                    return Ok(Outcome::Stale);
                }
                self.install_folder(entry, page, path);
                Ok(Outcome::Updated)
            }
            (FetchJob::Search { query }, Fetched::Search(page)) => {
                if self.mode.kind() != ModeKind::TypingQuery {
                    return Ok(Outcome::Stale);
                }
                info!(query = %query, hits = page.entries.len(), "search committed");
                let context = BrowseContext::new(ListingSource::search(&query), page);
                self.mode = AppMode::Searching { query, context };
                Ok(Outcome::Updated)
            }
            _ => Ok(Outcome::Stale),
        }
    }

    /// Runs a step to completion on the calling thread.
    #[cfg(test)]
    pub fn run(&mut self, service: &dyn ListingService, step: Step) -> Result<Outcome, BrowseError> {
        match step {
            Step::Done(outcome) => Ok(outcome),
            Step::Fetch(job) => {
                let result = job.run(service);
                self.complete(job, result)
            }
        }
    }

    #[cfg(test)]
    pub fn advance(&mut self, service: &dyn ListingService) -> Result<Outcome, BrowseError> {
        let step = self.begin_advance();
        self.run(service, step)
    }

    #[cfg(test)]
    pub fn descend(
        &mut self,
        service: &dyn ListingService,
        target: &Entry,
    ) -> Result<Outcome, BrowseError> {
        let step = self.begin_open_entry(target);
        self.run(service, step)
    }

    #[cfg(test)]
    pub fn commit_search(
        &mut self,
        service: &dyn ListingService,
        query: &str,
    ) -> Result<Outcome, BrowseError> {
        if let AppMode::TypingQuery { input } = &mut self.mode {
            *input = query.to_string();
        }
        let step = self.begin_search()?;
        self.run(service, step)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entry::FOLDER_MIME;
    use crate::state::testing::StubDrive;

    fn drive() -> StubDrive {
        StubDrive::new()
            .with_folder("root", &[10, 3])
            .with_subfolder("root", "work", "Work", &[4, 4])
            .with_subfolder("work", "reports", "Reports", &[2])
            .with_search("report", &[3, 1])
    }

    fn folder(id: &str, name: &str) -> Entry {
        Entry::new(id, name, FOLDER_MIME)
    }

    fn start(drive: &StubDrive) -> Session {
        Session::start(drive, "root").expect("startup")
    }

    #[test]
    fn test_start_fetches_root_and_breadcrumb() {
        let drive = drive();
        let session = start(&drive);
        assert_eq!(session.breadcrumb().render("/"), "My Drive");
        assert_eq!(session.primary().current_page_index(), 1);
        assert_eq!(session.mode(), &AppMode::Browsing);
        assert_eq!(session.stack_depth(), 0);
    }

    #[test]
    fn test_start_failure_is_reported() {
        let drive = drive();
        drive.fail_next();
        assert!(Session::start(&drive, "root").is_err());
    }

    #[test]
    fn test_descend_then_ascend_is_identity() {
        let drive = drive();
        let mut session = start(&drive);
        session.advance(&drive).expect("advance");
        session.cursor_down();
        let before = session.primary().clone();
        let crumbs = session.breadcrumb().len();

        let outcome = session.descend(&drive, &folder("work", "Work"));
        assert_eq!(outcome, Ok(Outcome::Updated));
        assert_eq!(session.primary().folder_id(), Some("work"));
        assert_eq!(session.breadcrumb().render("/"), "My Drive/Work");
        assert_eq!(session.stack_depth(), 1);

        // mutate the live context, the frame must not see it
        session.advance(&drive).expect("advance");
        session.cursor_down();

        session.ascend().expect("ascend");
        assert_eq!(session.primary(), &before);
        assert_eq!(session.breadcrumb().len(), crumbs);
        assert_eq!(session.stack_depth(), 0);
    }

    #[test]
    fn test_ascend_pops_one_crumb_per_level() {
        let drive = drive();
        let mut session = start(&drive);
        session.descend(&drive, &folder("work", "Work")).expect("work");
        session.descend(&drive, &folder("reports", "Reports")).expect("reports");
        assert_eq!(session.breadcrumb().render("/"), "My Drive/Work/Reports");

        session.ascend().expect("ascend");
        assert_eq!(session.breadcrumb().render("/"), "My Drive/Work");
        session.ascend().expect("ascend");
        assert_eq!(session.breadcrumb().render("/"), "My Drive");
    }

    #[test]
    fn test_ascend_on_empty_stack() {
        let drive = drive();
        let mut session = start(&drive);
        let before = session.primary().clone();
        assert_eq!(session.ascend(), Err(BrowseError::NoPreviousState));
        assert_eq!(session.primary(), &before);
    }

    #[test]
    fn test_failed_descend_changes_nothing() {
        let drive = drive();
        let mut session = start(&drive);
        session.cursor_down();
        let before = session.primary().clone();

        drive.fail_next();
        let result = session.descend(&drive, &folder("work", "Work"));
        assert!(matches!(result, Err(BrowseError::TransientFetch(_))));
        assert_eq!(session.primary(), &before);
        assert_eq!(session.stack_depth(), 0);
        assert_eq!(session.breadcrumb().len(), 1);
    }

    #[test]
    fn test_open_file_is_handed_off() {
        let drive = drive();
        let mut session = start(&drive);
        session.cursor_down();
        let selected = session.selected().cloned().expect("selection");
        let step = session.begin_open();
        let outcome = session.run(&drive, step);
        assert_eq!(outcome, Ok(Outcome::OpenFile(selected)));
        assert_eq!(session.stack_depth(), 0);
    }

    #[test]
    fn test_unknown_type_is_resolved_on_open() {
        let drive = drive();
        let mut session = start(&drive);
        let untyped = Entry::new("work", "Work", "");
        session.descend(&drive, &untyped).expect("descend");
        assert_eq!(drive.resolve_calls(), 1);
        assert_eq!(session.primary().folder_id(), Some("work"));
    }

    #[test]
    fn test_enter_search_then_escape() {
        let drive = drive();
        let mut session = start(&drive);
        session.descend(&drive, &folder("work", "Work")).expect("descend");
        let before = session.primary().clone();
        let depth = session.stack_depth();

        session.enter_search();
        assert_eq!(session.mode().kind(), ModeKind::TypingQuery);
        assert_eq!(session.stack_depth(), depth + 1);
        session.push_query_char('x');

        session.exit_search().expect("exit");
        assert_eq!(session.mode(), &AppMode::Browsing);
        assert_eq!(session.primary(), &before);
        assert_eq!(session.stack_depth(), depth);
    }

    #[test]
    fn test_repeated_searches_do_not_grow_stack() {
        let drive = drive();
        let mut session = start(&drive);
        for _ in 0..3 {
            session.enter_search();
            session.commit_search(&drive, "report").expect("search");
            session.enter_search();
            session.exit_search().expect("exit");
        }
        assert_eq!(session.stack_depth(), 0);
        assert_eq!(session.mode(), &AppMode::Browsing);
    }

    #[test]
    fn test_failed_search_restores_browsing() {
        let drive = drive();
        let mut session = start(&drive);
        session.cursor_down();
        let before = session.primary().clone();

        session.enter_search();
        drive.fail_next();
        let result = session.commit_search(&drive, "report");
        assert!(matches!(result, Err(BrowseError::TransientFetch(_))));
        assert_eq!(session.mode(), &AppMode::Browsing);
        assert_eq!(session.primary(), &before);
        assert_eq!(session.stack_depth(), 0);
    }

    #[test]
    fn test_empty_query_cancels() {
        let drive = drive();
        let mut session = start(&drive);
        session.enter_search();
        assert_eq!(session.commit_search(&drive, "   "), Ok(Outcome::Updated));
        assert_eq!(session.mode(), &AppMode::Browsing);
        assert_eq!(session.stack_depth(), 0);
        assert_eq!(drive.search_calls(), 0);
    }

    #[test]
    fn test_search_paging_leaves_primary_frozen() {
        let drive = drive();
        let mut session = start(&drive);
        let before = session.primary().clone();

        session.enter_search();
        session.commit_search(&drive, "report").expect("search");
        assert_eq!(session.mode().kind(), ModeKind::Searching);
        assert_eq!(session.view().entries.len(), 3);

        session.advance(&drive).expect("advance");
        session.cursor_down();
        assert_eq!(session.view().current_page, 2);
        assert_eq!(session.view().search_query, Some("report"));
        assert_eq!(session.primary(), &before);

        assert!(session.retreat());
        assert_eq!(session.view().current_page, 1);
        assert_eq!(drive.search_calls(), 2);
    }

    #[test]
    fn test_folder_opened_from_search_returns_to_results() {
        let drive = drive().with_search("rep", &[0]).with_search_hit("rep", folder("reports", "Reports"));
        let mut session = start(&drive);
        let primary = session.primary().clone();

        session.enter_search();
        session.commit_search(&drive, "rep").expect("search");
        let results = session.active().cloned().expect("results");

        let step = session.begin_open();
        session.run(&drive, step).expect("open");
        assert_eq!(session.mode(), &AppMode::Browsing);
        assert_eq!(session.breadcrumb().render("/"), "My Drive/Work/Reports");
        assert_eq!(session.stack_depth(), 2);

        session.ascend().expect("back to results");
        assert_eq!(session.mode().kind(), ModeKind::Searching);
        assert_eq!(session.active(), Some(&results));
        assert_eq!(session.breadcrumb().render("/"), "My Drive");

        session.exit_search().expect("exit");
        assert_eq!(session.primary(), &primary);
        assert_eq!(session.stack_depth(), 0);
    }

    #[test]
    fn test_result_for_abandoned_search_is_stale() {
        let drive = drive();
        let mut session = start(&drive);
        session.enter_search();
        session.push_query_char('r');
        let job = match session.begin_search() {
            Ok(Step::Fetch(job)) => job,
            other => panic!("expected fetch, got {:?}", other),
        };
        let result = job.run(&drive);
        session.exit_search().expect("exit");

        assert_eq!(session.complete(job, result), Ok(Outcome::Stale));
        assert_eq!(session.mode(), &AppMode::Browsing);
    }

    #[test]
    fn test_paging_ignored_while_typing() {
        let drive = drive();
        let mut session = start(&drive);
        session.enter_search();
        assert_eq!(session.begin_advance(), Step::Done(Outcome::Unchanged));
        assert!(!session.retreat());
        session.cursor_down();
        assert_eq!(session.primary().cursor(), 0);
    }
}
