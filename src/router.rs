//! Keyboard command router.
//!
//! Maps key chords to [`Command`]s. The dashboard decides what each command
//! does; this module only decides which command (if any) a key event means
//! in the current focus context.

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use crate::model::task::Priority;

/// Where keyboard focus currently sits
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FocusContext {
    /// A text field; plain keys belong to it
    TextInput,
    Other,
}

/// Everything a chord can ask the dashboard to do
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    ShowHelp,
    FocusSearch,
    SelectAll,
    DeselectAll,
    Export,
    Import,
    BulkComplete,
    BulkUncomplete,
    BulkDelete,
    BulkSetPriority(Priority),
    NewTask,
    Edit,
    DeleteFocused,
    ToggleComplete,
    ToggleSelect,
    NavigateUp,
    NavigateDown,
    CycleStatusFilter,
    CyclePriorityFilter,
    Reload,
    Quit,
}

impl Command {
    /// One-line description for the help overlay
    pub fn describe(self) -> &'static str {
        match self {
            Command::ShowHelp => "show keyboard shortcuts",
            Command::FocusSearch => "focus search",
            Command::SelectAll => "select all visible tasks",
            Command::DeselectAll => "clear selection",
            Command::Export => "export tasks",
            Command::Import => "import tasks",
            Command::BulkComplete => "complete selected",
            Command::BulkUncomplete => "mark selected pending",
            Command::BulkDelete => "delete selected",
            Command::BulkSetPriority(Priority::High) => "set selected to high priority",
            Command::BulkSetPriority(Priority::Medium) => "set selected to medium priority",
            Command::BulkSetPriority(Priority::Low) => "set selected to low priority",
            Command::NewTask => "new task",
            Command::Edit => "edit task",
            Command::DeleteFocused => "delete task",
            Command::ToggleComplete => "toggle complete",
            Command::ToggleSelect => "toggle selection",
            Command::NavigateUp => "move up",
            Command::NavigateDown => "move down",
            Command::CycleStatusFilter => "cycle status filter",
            Command::CyclePriorityFilter => "cycle priority filter",
            Command::Reload => "reload from server",
            Command::Quit => "quit",
        }
    }
}

/// Chord table shown in the help overlay, in display order
pub const SHORTCUTS: &[(&str, Command)] = &[
    ("?", Command::ShowHelp),
    ("Ctrl+K", Command::FocusSearch),
    ("Ctrl+A", Command::SelectAll),
    ("Ctrl+D", Command::DeselectAll),
    ("Ctrl+E", Command::Export),
    ("Ctrl+I", Command::Import),
    ("Shift+C", Command::BulkComplete),
    ("Shift+U", Command::BulkUncomplete),
    ("Shift+D", Command::BulkDelete),
    ("Shift+H", Command::BulkSetPriority(Priority::High)),
    ("Shift+M", Command::BulkSetPriority(Priority::Medium)),
    ("Shift+L", Command::BulkSetPriority(Priority::Low)),
    ("n", Command::NewTask),
    ("e", Command::Edit),
    ("d", Command::DeleteFocused),
    ("Enter", Command::ToggleComplete),
    ("Space", Command::ToggleSelect),
    ("j / Down", Command::NavigateDown),
    ("k / Up", Command::NavigateUp),
    ("Tab", Command::CycleStatusFilter),
    ("p", Command::CyclePriorityFilter),
    ("r", Command::Reload),
    ("q", Command::Quit),
];

/// Fold the ways a terminal can report a shifted letter into one shape:
/// uppercase `Char` with SHIFT set.
fn normalize_key(mut key: KeyEvent) -> KeyEvent {
    if let KeyCode::Char(c) = key.code {
        if c.is_ascii_uppercase() {
            key.modifiers.insert(KeyModifiers::SHIFT);
        } else if c.is_ascii_lowercase() && key.modifiers.contains(KeyModifiers::SHIFT) {
            key.code = KeyCode::Char(c.to_ascii_uppercase());
        }
    }
    key
}

/// Command for `key`, or `None` when the chord means nothing here.
///
/// In a text field only Ctrl+K is honored. Elsewhere chords are checked in
/// order: `?`, Ctrl chords, Shift chords, plain keys, arrows.
pub fn route(key: KeyEvent, focus: FocusContext) -> Option<Command> {
    let key = normalize_key(key);
    let mods = key.modifiers;
    let ctrl = mods.contains(KeyModifiers::CONTROL);
    let shift = mods.contains(KeyModifiers::SHIFT);
    let alt = mods.contains(KeyModifiers::ALT);

    let ctrl_char = match key.code {
        KeyCode::Char(c) if ctrl && !shift && !alt => Some(c.to_ascii_lowercase()),
        _ => None,
    };

    if focus == FocusContext::TextInput {
        return (ctrl_char == Some('k')).then_some(Command::FocusSearch);
    }

    // Terminals disagree on whether `?` carries SHIFT
    if key.code == KeyCode::Char('?') && !ctrl && !alt {
        return Some(Command::ShowHelp);
    }

    if ctrl {
        return match ctrl_char? {
            'k' => Some(Command::FocusSearch),
            'a' => Some(Command::SelectAll),
            'd' => Some(Command::DeselectAll),
            'e' => Some(Command::Export),
            'i' => Some(Command::Import),
            _ => None,
        };
    }
    if alt {
        return None;
    }

    if shift {
        if let KeyCode::Char(c) = key.code {
            return match c {
                'C' => Some(Command::BulkComplete),
                'U' => Some(Command::BulkUncomplete),
                'D' => Some(Command::BulkDelete),
                'H' => Some(Command::BulkSetPriority(Priority::High)),
                'M' => Some(Command::BulkSetPriority(Priority::Medium)),
                'L' => Some(Command::BulkSetPriority(Priority::Low)),
                _ => None,
            };
        }
    } else if let Some(command) = plain_key(key.code) {
        return Some(command);
    }

    // Arrows move the cursor with or without Shift
    match key.code {
        KeyCode::Up => Some(Command::NavigateUp),
        KeyCode::Down => Some(Command::NavigateDown),
        _ => None,
    }
}

/// Single keys that only fire with no modifier held
fn plain_key(code: KeyCode) -> Option<Command> {
    match code {
        KeyCode::Char('n') => Some(Command::NewTask),
        KeyCode::Char('e') => Some(Command::Edit),
        KeyCode::Char('d') => Some(Command::DeleteFocused),
        KeyCode::Char('j') => Some(Command::NavigateDown),
        KeyCode::Char('k') => Some(Command::NavigateUp),
        KeyCode::Char(' ') => Some(Command::ToggleSelect),
        KeyCode::Char('p') => Some(Command::CyclePriorityFilter),
        KeyCode::Char('r') => Some(Command::Reload),
        KeyCode::Char('q') => Some(Command::Quit),
        KeyCode::Enter => Some(Command::ToggleComplete),
        KeyCode::Tab => Some(Command::CycleStatusFilter),
        _ => None,
    }
}
