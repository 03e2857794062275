use super::context::BrowseContext;

#[derive(Debug, PartialEq, Clone)]
pub enum AppMode {
    Browsing,
    TypingQuery {
        input: String,
    },
    Searching {
        query: String,
        context: BrowseContext,
    },
}

impl Default for AppMode {
    fn default() -> Self {
        Self::Browsing
    }
}

/// Mode tag without the payload, for key mapping and rendering.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ModeKind {
    Browsing,
    TypingQuery,
    Searching,
}

impl AppMode {
    pub fn kind(&self) -> ModeKind {
        match self {
            Self::Browsing => ModeKind::Browsing,
            Self::TypingQuery { .. } => ModeKind::TypingQuery,
            Self::Searching { .. } => ModeKind::Searching,
        }
    }

    pub fn in_search(&self) -> bool {
        !matches!(self, Self::Browsing)
    }

    pub fn search_query(&self) -> Option<&str> {
        match self {
            Self::Browsing => None,
            Self::TypingQuery { input } => Some(input),
            Self::Searching { query, .. } => Some(query),
        }
    }
}
