//! Key binding table.
//!
//! Pure mapping from a key code to a `Command`; kept separate from the
//! terminal-owning loop in `ui::mod` so the binding table itself is
//! trivially unit-testable.

use crossterm::event::{KeyCode, KeyModifiers};

use crate::actions::Action;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Quit,
    MoveSelection(i32),
    ScrollView(i32),
    Help,
    Act(Action),
}

/// Map one keypress to a `Command`, or `None` if it is not bound.
pub fn map_key(code: KeyCode, modifiers: KeyModifiers) -> Option<Command> {
    match code {
        KeyCode::Char('c') if modifiers.contains(KeyModifiers::CONTROL) => Some(Command::Quit),
        KeyCode::Char('q') => Some(Command::Quit),
        KeyCode::Up | KeyCode::Char('k') => Some(Command::MoveSelection(-1)),
        KeyCode::Down | KeyCode::Char('j') => Some(Command::MoveSelection(1)),
        KeyCode::PageUp => Some(Command::ScrollView(-1)),
        KeyCode::PageDown => Some(Command::ScrollView(1)),
        KeyCode::Char('?') => Some(Command::Help),
        KeyCode::Char('l') => Some(Command::Act(Action::Logs)),
        KeyCode::Char('r') => Some(Command::Act(Action::Restart)),
        KeyCode::Char('x') => Some(Command::Act(Action::Stop)),
        KeyCode::Char('s') => Some(Command::Act(Action::Shell)),
        _ => None,
    }
}
