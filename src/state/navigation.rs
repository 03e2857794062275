// Navigation state - breadcrumb and the stack of snapshots taken before each descent
use crate::state::context::BrowseContext;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Crumb {
    pub id: String,
    pub name: String,
}

impl Crumb {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
        }
    }
}

/// Ancestor names from the root down to the current folder.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Breadcrumb {
    crumbs: Vec<Crumb>,
}

impl Breadcrumb {
    /// Builds a breadcrumb from an entry-to-root ancestor chain.
    pub fn from_ancestors(mut ancestors: Vec<Crumb>) -> Self {
        ancestors.reverse();
        Self { crumbs: ancestors }
    }

    pub fn push(&mut self, crumb: Crumb) {
        self.crumbs.push(crumb);
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.crumbs.len()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.crumbs.iter().map(|c| c.name.as_str())
    }

    pub fn render(&self, separator: &str) -> String {
        self.names().collect::<Vec<_>>().join(separator)
    }
}

/// What a frame restores into.
#[derive(Clone, Debug, PartialEq)]
pub enum FrameView {
    /// The primary folder browse.
    Browse(BrowseContext),
    /// A search result list a folder was opened from.
    Search {
        query: String,
        context: BrowseContext,
    },
}

/// Owned snapshot. Nothing in it is shared with the live session.
#[derive(Clone, Debug, PartialEq)]
pub struct NavigationFrame {
    view: FrameView,
    breadcrumb: Breadcrumb,
}

impl NavigationFrame {
    pub fn new(view: FrameView, breadcrumb: Breadcrumb) -> Self {
        Self { view, breadcrumb }
    }

    pub fn into_parts(self) -> (FrameView, Breadcrumb) {
        (self.view, self.breadcrumb)
    }
}

#[derive(Clone, Debug, Default)]
pub struct NavigationStack {
    frames: Vec<NavigationFrame>,
}

impl NavigationStack {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, frame: NavigationFrame) {
        self.frames.push(frame);
    }

    pub fn pop(&mut self) -> Option<NavigationFrame> {
        self.frames.pop()
    }

    pub fn depth(&self) -> usize {
        self.frames.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::context::ListingSource;
    use crate::state::page_cache::ListingPage;
    use crate::state::testing::entries;

    #[test]
    fn test_breadcrumb_from_ancestors() {
        let crumbs = Breadcrumb::from_ancestors(vec![
            Crumb::new("c", "Reports"),
            Crumb::new("b", "Work"),
            Crumb::new("root", "My Drive"),
        ]);
        assert_eq!(crumbs.render(" / "), "My Drive / Work / Reports");
        assert_eq!(crumbs.len(), 3);
    }

    fn popped_folder(frame: NavigationFrame) -> Option<String> {
        match frame.into_parts().0 {
            FrameView::Browse(context) => context.folder_id().map(String::from),
            FrameView::Search { .. } => None,
        }
    }

    #[test]
    fn test_frames_are_lifo() {
        let mut stack = NavigationStack::new();
        for id in ["a", "b"] {
            let ctx = BrowseContext::new(ListingSource::folder(id), ListingPage::default());
            stack.push(NavigationFrame::new(FrameView::Browse(ctx), Breadcrumb::default()));
        }
        assert_eq!(stack.depth(), 2);
        assert_eq!(stack.pop().and_then(popped_folder), Some("b".to_string()));
        assert_eq!(stack.pop().and_then(popped_folder), Some("a".to_string()));
        assert!(stack.pop().is_none());
    }

    #[test]
    fn test_frame_is_unaffected_by_later_mutation() {
        let mut live = BrowseContext::new(
            ListingSource::folder("root"),
            ListingPage::new(entries("f", 3), ""),
        );
        let frame = NavigationFrame::new(FrameView::Browse(live.clone()), Breadcrumb::default());

        live.cursor_down();
        live.cursor_down();

        match frame.into_parts().0 {
            FrameView::Browse(saved) => assert_eq!(saved.cursor(), 0),
            other => panic!("unexpected frame {:?}", other),
        }
    }
}
