use crate::message::Message;
use crate::state::ModeKind;
use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

pub fn handle_key(key: KeyEvent, mode: ModeKind) -> Option<Message> {
    if key.kind == KeyEventKind::Release {
        return None;
    }
    if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
        return Some(Message::Quit);
    }
    match mode {
        ModeKind::Browsing => handle_browse_mode(key),
        ModeKind::TypingQuery => handle_query_mode(key),
        ModeKind::Searching => handle_results_mode(key),
    }
}

fn handle_navigation(key: KeyEvent) -> Option<Message> {
    match key.code {
        KeyCode::Up | KeyCode::Char('k') => Some(Message::CursorUp),
        KeyCode::Down | KeyCode::Char('j') => Some(Message::CursorDown),
        KeyCode::Right | KeyCode::Char('l') => Some(Message::NextPage),
        KeyCode::Left | KeyCode::Char('h') => Some(Message::PrevPage),
        KeyCode::Enter => Some(Message::Open),
        KeyCode::Backspace => Some(Message::Back),
        KeyCode::Char('/') => Some(Message::StartSearch),
        KeyCode::Char('q') => Some(Message::Quit),
        _ => None,
    }
}

fn handle_browse_mode(key: KeyEvent) -> Option<Message> {
    match key.code {
        KeyCode::Esc => Some(Message::Dismiss),
        _ => handle_navigation(key),
    }
}

fn handle_query_mode(key: KeyEvent) -> Option<Message> {
    match key.code {
        KeyCode::Enter => Some(Message::SubmitQuery),
        KeyCode::Esc => Some(Message::CancelSearch),
        KeyCode::Backspace => Some(Message::QueryBackspace),
        // typed text goes to the query, including q and the vim keys
        KeyCode::Char(c) if !key.modifiers.contains(KeyModifiers::CONTROL) => {
            Some(Message::QueryChar(c))
        }
        _ => None,
    }
}

fn handle_results_mode(key: KeyEvent) -> Option<Message> {
    match key.code {
        KeyCode::Esc => Some(Message::CancelSearch),
        _ => handle_navigation(key),
    }
}
