use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use joblog_core::dashboard::{Dashboard, Outcome};
use joblog_core::nav::Action;

const PAGE: isize = 10;

/// Key shown in the footer for `action`.
pub(crate) fn binding(action: Action) -> &'static str {
    match action {
        Action::Quit => "q",
        Action::Refresh => "t",
        Action::Home => "h",
        Action::Back => "b",
        Action::ShowAll => "a",
        Action::ShowDone => "d",
        Action::ShowRunning => "r",
        Action::ShowFailed => "f",
        Action::Grow => "m",
        Action::Shrink => "l",
        Action::Search => "s",
        Action::Select => "enter",
        Action::Download => "o",
    }
}

fn action_for(code: KeyCode) -> Option<Action> {
    let action = match code {
        KeyCode::Char('q') => Action::Quit,
        KeyCode::Char('t') => Action::Refresh,
        KeyCode::Char('h') => Action::Home,
        KeyCode::Char('b') | KeyCode::Backspace => Action::Back,
        KeyCode::Char('a') => Action::ShowAll,
        KeyCode::Char('d') => Action::ShowDone,
        KeyCode::Char('r') => Action::ShowRunning,
        KeyCode::Char('f') => Action::ShowFailed,
        KeyCode::Char('m') => Action::Grow,
        KeyCode::Char('l') => Action::Shrink,
        KeyCode::Char('s') => Action::Search,
        KeyCode::Enter => Action::Select,
        KeyCode::Char('o') => Action::Download,
        _ => return None,
    };
    Some(action)
}

/// Route a key press. While the search bar is open, printable keys edit it.
pub(crate) fn handle(dashboard: &mut Dashboard, key: KeyEvent) -> Outcome {
    if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
        return dashboard.dispatch(Action::Quit);
    }

    if dashboard.search_input().is_some() {
        return match key.code {
            KeyCode::Esc => dashboard.search_cancel(),
            KeyCode::Enter => dashboard.search_commit(),
            KeyCode::Backspace => dashboard.search_pop(),
            KeyCode::Up => dashboard.move_cursor(-1),
            KeyCode::Down => dashboard.move_cursor(1),
            KeyCode::Char(c) if !key.modifiers.contains(KeyModifiers::CONTROL) => {
                dashboard.search_push(c)
            }
            _ => Outcome::ignored(),
        };
    }

    match key.code {
        KeyCode::Up | KeyCode::Char('k') => dashboard.move_cursor(-1),
        KeyCode::Down | KeyCode::Char('j') => dashboard.move_cursor(1),
        KeyCode::PageUp => dashboard.move_cursor(-PAGE),
        KeyCode::PageDown => dashboard.move_cursor(PAGE),
        KeyCode::Esc => dashboard.dispatch(Action::Back),
        code => match action_for(code) {
            Some(action) => dashboard.dispatch(action),
            None => Outcome::ignored(),
        },
    }
}
