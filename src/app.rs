use anyhow::Result;

use crate::auth::{AuthClient, Session};
use crate::config::Config;
use crate::openai::{OpenAIClient, OPENAI_API_URL};

/// Model sent with every completion request.
pub const CHAT_MODEL: &str = "gpt-3.5-turbo";

/// How many 300ms ticks a notice stays on screen.
const NOTICE_TICKS: u8 = 12;

/// Which login input currently receives keystrokes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoginField {
    Email,
    Password,
}

/// The two mutually exclusive views. A session only exists inside `Chat`,
/// so the chat form is unreachable without one. There is no logout: nothing
/// constructs `Login` again after a successful sign-in or sign-up.
#[derive(Debug, Clone)]
pub enum View {
    Login { focus: LoginField },
    Chat { session: Session },
}

/// Which identity operation produced an auth result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthAction {
    Login,
    Register,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeKind {
    Success,
    Error,
}

/// Transient user-facing notification, the toast equivalent.
#[derive(Debug, Clone)]
pub struct Notice {
    pub kind: NoticeKind,
    pub text: String,
}

pub struct App {
    pub should_quit: bool,
    pub view: View,

    // Form state, mutated on every keystroke. Credentials are not cleared
    // on login and the draft is not cleared on send.
    pub email: String,
    pub password: String,
    pub message: String,

    // Last completion text. Only ever replaced, never cleared.
    pub response: String,

    pub notice: Option<Notice>,
    notice_ticks: u8,

    // Cursor position (in chars) within the focused input.
    pub cursor: usize,

    pub auth: AuthClient,
    pub openai: OpenAIClient,
}

impl App {
    pub fn new(config: Config) -> Self {
        let auth = AuthClient::new(&config.supabase_url, &config.supabase_anon_key);
        let openai = OpenAIClient::new(OPENAI_API_URL, &config.openai_api_key);
        Self {
            should_quit: false,
            view: View::Login {
                focus: LoginField::Email,
            },
            email: String::new(),
            password: String::new(),
            message: String::new(),
            response: String::new(),
            notice: None,
            notice_ticks: 0,
            cursor: 0,
            auth,
            openai,
        }
    }

    /// Apply the outcome of a sign-in or sign-up call. Success enters the
    /// chat view; failure leaves the login view untouched. The notice is the
    /// only other effect, so the decision stays testable without a UI.
    pub fn apply_auth_result(&mut self, action: AuthAction, result: Result<Session>) {
        match result {
            Ok(session) => {
                self.view = View::Chat { session };
                self.cursor = self.message.chars().count();
                let text = match action {
                    AuthAction::Login => "Login successful!",
                    AuthAction::Register => "Registration successful!",
                };
                self.set_notice(NoticeKind::Success, text.to_string());
            }
            Err(err) => {
                let prefix = match action {
                    AuthAction::Login => "Login failed",
                    AuthAction::Register => "Registration failed",
                };
                self.set_notice(NoticeKind::Error, format!("{}: {}", prefix, err));
            }
        }
    }

    /// Apply the outcome of a completion call. Success replaces the shown
    /// response; failure leaves it unchanged. Responses from concurrent sends
    /// land here in arrival order, so the last arrival wins.
    pub fn apply_completion_result(&mut self, result: Result<String>) {
        match result {
            Ok(text) => self.response = text,
            Err(err) => {
                self.set_notice(NoticeKind::Error, format!("Failed to get response: {}", err))
            }
        }
    }

    pub fn set_notice(&mut self, kind: NoticeKind, text: String) {
        self.notice = Some(Notice { kind, text });
        self.notice_ticks = NOTICE_TICKS;
    }

    /// Called on every timer tick; expires the notice.
    pub fn tick(&mut self) {
        if self.notice.is_some() {
            self.notice_ticks = self.notice_ticks.saturating_sub(1);
            if self.notice_ticks == 0 {
                self.notice = None;
            }
        }
    }

    /// Toggle email/password focus on the login view, moving the cursor to
    /// the end of the newly focused field.
    pub fn toggle_login_focus(&mut self) {
        if let View::Login { focus } = &mut self.view {
            *focus = match focus {
                LoginField::Email => LoginField::Password,
                LoginField::Password => LoginField::Email,
            };
        }
        self.cursor = self.focused_input().chars().count();
    }

    pub fn focused_input(&self) -> &str {
        match &self.view {
            View::Login {
                focus: LoginField::Email,
            } => &self.email,
            View::Login {
                focus: LoginField::Password,
            } => &self.password,
            View::Chat { .. } => &self.message,
        }
    }

    fn focused_input_mut(&mut self) -> &mut String {
        match &self.view {
            View::Login {
                focus: LoginField::Email,
            } => &mut self.email,
            View::Login {
                focus: LoginField::Password,
            } => &mut self.password,
            View::Chat { .. } => &mut self.message,
        }
    }

    // Line editing for the focused input, UTF-8 safe.

    pub fn insert_char(&mut self, c: char) {
        let cursor = self.cursor;
        let input = self.focused_input_mut();
        let byte_pos = char_to_byte_index(input, cursor);
        input.insert(byte_pos, c);
        self.cursor += 1;
    }

    pub fn delete_back(&mut self) {
        if self.cursor > 0 {
            self.cursor -= 1;
            let cursor = self.cursor;
            let input = self.focused_input_mut();
            let byte_pos = char_to_byte_index(input, cursor);
            input.remove(byte_pos);
        }
    }

    pub fn delete_forward(&mut self) {
        let cursor = self.cursor;
        let input = self.focused_input_mut();
        if cursor < input.chars().count() {
            let byte_pos = char_to_byte_index(input, cursor);
            input.remove(byte_pos);
        }
    }

    pub fn cursor_left(&mut self) {
        self.cursor = self.cursor.saturating_sub(1);
    }

    pub fn cursor_right(&mut self) {
        self.cursor = (self.cursor + 1).min(self.focused_input().chars().count());
    }

    pub fn cursor_home(&mut self) {
        self.cursor = 0;
    }

    pub fn cursor_end(&mut self) {
        self.cursor = self.focused_input().chars().count();
    }
}

/// Convert a character index to a byte index for UTF-8 safe string edits.
fn char_to_byte_index(s: &str, char_idx: usize) -> usize {
    s.char_indices()
        .nth(char_idx)
        .map(|(i, _)| i)
        .unwrap_or(s.len())
}
