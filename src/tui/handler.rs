use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppAction {
    Quit,
    MoveUp,
    MoveDown,
    NextPage,
    PrevPage,
    FirstPage,
    LastPage,
    Select,
    Deselect,
    Approve(u32),
    Reject(u32),
    /// Review the record under the list cursor
    ApproveHighlighted,
    RejectHighlighted,
    OpenInBrowser,
    CycleStatusFilter,
    CycleCategoryFilter,
    Refresh,
    SignIn,
    SignOut,
    ShowHelp,
    HideHelp,
    // Search input actions
    SearchStart,
    SearchChar(char),
    SearchBackspace,
    SearchConfirm,
    SearchCancel,
}

/// What the keyboard is currently driving.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputMode {
    /// Blocking error screen
    Fatal,
    SignIn,
    Help,
    Search,
    /// A record is open in the detail view
    Detail(u32),
    List,
}

/// Shortcuts that act on the selected record. Nothing fires without a selection.
pub fn shortcut_action(selection: Option<u32>, key: KeyEvent) -> Option<AppAction> {
    let row = selection?;
    match key.code {
        KeyCode::Esc => Some(AppAction::Deselect),
        KeyCode::Char('a') | KeyCode::Char('A') => Some(AppAction::Approve(row)),
        KeyCode::Char('r') | KeyCode::Char('R') => Some(AppAction::Reject(row)),
        KeyCode::Char('o') => Some(AppAction::OpenInBrowser),
        _ => None,
    }
}

pub fn handle_key_event(key: KeyEvent, mode: InputMode) -> Option<AppAction> {
    if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
        return Some(AppAction::Quit);
    }

    match mode {
        // Any key leaves the error screen
        InputMode::Fatal => Some(AppAction::Quit),

        InputMode::SignIn => match key.code {
            KeyCode::Enter => Some(AppAction::SignIn),
            KeyCode::Char('q') | KeyCode::Esc => Some(AppAction::Quit),
            _ => None,
        },

        // If help is showing, any key closes it
        InputMode::Help => Some(AppAction::HideHelp),

        InputMode::Search => match key.code {
            KeyCode::Enter => Some(AppAction::SearchConfirm),
            KeyCode::Esc => Some(AppAction::SearchCancel),
            KeyCode::Backspace => Some(AppAction::SearchBackspace),
            KeyCode::Char(c) => Some(AppAction::SearchChar(c)),
            _ => None,
        },

        InputMode::Detail(row) => match key.code {
            KeyCode::Char('q') => Some(AppAction::Quit),
            KeyCode::Char('?') => Some(AppAction::ShowHelp),
            _ => shortcut_action(Some(row), key),
        },

        InputMode::List => match key.code {
            KeyCode::Char('q') => Some(AppAction::Quit),

            KeyCode::Char('j') | KeyCode::Down => Some(AppAction::MoveDown),
            KeyCode::Char('k') | KeyCode::Up => Some(AppAction::MoveUp),
            KeyCode::Char('n') | KeyCode::Right => Some(AppAction::NextPage),
            KeyCode::Char('p') | KeyCode::Left => Some(AppAction::PrevPage),
            KeyCode::Home => Some(AppAction::FirstPage),
            KeyCode::End => Some(AppAction::LastPage),

            KeyCode::Enter => Some(AppAction::Select),
            KeyCode::Char('a') | KeyCode::Char('A') => Some(AppAction::ApproveHighlighted),
            KeyCode::Char('r') | KeyCode::Char('R') => Some(AppAction::RejectHighlighted),

            KeyCode::Char('f') => Some(AppAction::CycleStatusFilter),
            KeyCode::Char('c') => Some(AppAction::CycleCategoryFilter),
            KeyCode::Char('/') => Some(AppAction::SearchStart),
            KeyCode::Char('u') | KeyCode::F(5) => Some(AppAction::Refresh),
            KeyCode::Char('x') => Some(AppAction::SignOut),

            KeyCode::Char('?') => Some(AppAction::ShowHelp),

            _ => None,
        },
    }
}
