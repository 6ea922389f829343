use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use tokio::sync::mpsc::UnboundedSender;

use crate::app::{App, AuthAction, View, CHAT_MODEL};
use crate::tui::AppEvent;

pub fn handle_event(app: &mut App, event: AppEvent, tx: &UnboundedSender<AppEvent>) {
    match event {
        AppEvent::Key(key) => handle_key(app, key, tx),
        AppEvent::Resize(_, _) => {}
        AppEvent::Tick => app.tick(),
        AppEvent::Auth(action, result) => app.apply_auth_result(action, result),
        AppEvent::Completion(result) => app.apply_completion_result(result),
    }
}

fn handle_key(app: &mut App, key: KeyEvent, tx: &UnboundedSender<AppEvent>) {
    // Quit keys work in either view
    if key.code == KeyCode::Esc
        || (key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL))
    {
        app.should_quit = true;
        return;
    }

    match app.view {
        View::Login { .. } => handle_login_key(app, key, tx),
        View::Chat { .. } => handle_chat_key(app, key, tx),
    }
}

fn handle_login_key(app: &mut App, key: KeyEvent, tx: &UnboundedSender<AppEvent>) {
    match key.code {
        KeyCode::Tab | KeyCode::BackTab => app.toggle_login_focus(),
        KeyCode::Enter => submit_auth(app, AuthAction::Login, tx),
        KeyCode::Char('r') if key.modifiers.contains(KeyModifiers::CONTROL) => {
            submit_auth(app, AuthAction::Register, tx)
        }
        _ => handle_editing_key(app, key),
    }
}

fn handle_chat_key(app: &mut App, key: KeyEvent, tx: &UnboundedSender<AppEvent>) {
    match key.code {
        KeyCode::Enter => submit_message(app, tx),
        _ => handle_editing_key(app, key),
    }
}

fn handle_editing_key(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Backspace => app.delete_back(),
        KeyCode::Delete => app.delete_forward(),
        KeyCode::Left => app.cursor_left(),
        KeyCode::Right => app.cursor_right(),
        KeyCode::Home => app.cursor_home(),
        KeyCode::End => app.cursor_end(),
        KeyCode::Char(c) => app.insert_char(c),
        _ => {}
    }
}

/// Spawn one detached task per submit. No validation of the credentials, no
/// dedup of in-flight calls and no timeout: the backend is the arbiter, and
/// results land through the event channel in arrival order.
fn submit_auth(app: &App, action: AuthAction, tx: &UnboundedSender<AppEvent>) {
    let auth = app.auth.clone();
    let email = app.email.clone();
    let password = app.password.clone();
    let tx = tx.clone();
    tokio::spawn(async move {
        let result = match action {
            AuthAction::Login => auth.sign_in(&email, &password).await,
            AuthAction::Register => auth.sign_up(&email, &password).await,
        };
        let _ = tx.send(AppEvent::Auth(action, result));
    });
}

/// The draft is sent as-is, even when empty, and is not cleared afterwards.
fn submit_message(app: &App, tx: &UnboundedSender<AppEvent>) {
    let openai = app.openai.clone();
    let message = app.message.clone();
    let tx = tx.clone();
    tokio::spawn(async move {
        let result = openai.complete(CHAT_MODEL, &message).await;
        let _ = tx.send(AppEvent::Completion(result));
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::LoginField;
    use crate::auth::Session;
    use crate::config::Config;
    use anyhow::anyhow;
    use tokio::sync::mpsc;

    fn test_app() -> App {
        App::new(Config {
            supabase_url: "http://localhost:54321".to_string(),
            supabase_anon_key: "anon".to_string(),
            openai_api_key: "sk-test".to_string(),
        })
    }

    fn press(code: KeyCode) -> AppEvent {
        AppEvent::Key(KeyEvent::new(code, KeyModifiers::NONE))
    }

    #[tokio::test]
    async fn typing_fills_the_focused_field_and_tab_switches() {
        let (tx, _rx) = mpsc::unbounded_channel();
        let mut app = test_app();

        for c in "a@b.com".chars() {
            handle_event(&mut app, press(KeyCode::Char(c)), &tx);
        }
        assert_eq!(app.email, "a@b.com");

        handle_event(&mut app, press(KeyCode::Tab), &tx);
        assert!(matches!(
            app.view,
            View::Login {
                focus: LoginField::Password
            }
        ));
        for c in "x".chars() {
            handle_event(&mut app, press(KeyCode::Char(c)), &tx);
        }
        assert_eq!(app.password, "x");
        assert_eq!(app.email, "a@b.com");
    }

    #[tokio::test]
    async fn backend_results_flow_through_the_event_channel() {
        let (tx, _rx) = mpsc::unbounded_channel();
        let mut app = test_app();

        handle_event(
            &mut app,
            AppEvent::Auth(
                AuthAction::Login,
                Ok(Session {
                    access_token: "tok".to_string(),
                }),
            ),
            &tx,
        );
        assert!(matches!(app.view, View::Chat { .. }));

        handle_event(&mut app, AppEvent::Completion(Ok("Hello".to_string())), &tx);
        assert_eq!(app.response, "Hello");

        handle_event(
            &mut app,
            AppEvent::Completion(Err(anyhow!("timeout"))),
            &tx,
        );
        assert_eq!(app.response, "Hello");
    }

    #[tokio::test]
    async fn failed_login_keeps_the_login_view() {
        let (tx, _rx) = mpsc::unbounded_channel();
        let mut app = test_app();

        handle_event(
            &mut app,
            AppEvent::Auth(AuthAction::Login, Err(anyhow!("Invalid credentials"))),
            &tx,
        );
        assert!(matches!(app.view, View::Login { .. }));
        assert!(app
            .notice
            .as_ref()
            .unwrap()
            .text
            .contains("Invalid credentials"));
    }

    #[tokio::test]
    async fn escape_quits_from_either_view() {
        let (tx, _rx) = mpsc::unbounded_channel();
        let mut app = test_app();
        handle_event(&mut app, press(KeyCode::Esc), &tx);
        assert!(app.should_quit);
    }
}
