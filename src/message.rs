#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Message {
    Quit,

    // Navigation
    CursorUp,
    CursorDown,
    NextPage,
    PrevPage,
    Open,
    Back,

    // Search
    StartSearch,
    QueryChar(char),
    QueryBackspace,
    SubmitQuery,
    CancelSearch,

    // UI
    Dismiss,
}
