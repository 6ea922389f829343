use ratatui::{
    layout::{Constraint, Layout, Position, Rect},
    style::{Color, Modifier, Style},
    text::Line,
    widgets::{Block, Borders, Paragraph, Wrap},
    Frame,
};

use crate::app::{App, LoginField, NoticeKind, View};

pub fn render(frame: &mut Frame, app: &App) {
    let area = centered_rect(frame.area(), 60, 16);

    match &app.view {
        View::Login { focus } => render_login(frame, app, area, *focus),
        View::Chat { .. } => render_chat(frame, app, area),
    }

    render_notice(frame, app, area);
}

fn render_login(frame: &mut Frame, app: &App, area: Rect, focus: LoginField) {
    let card = Block::default()
        .borders(Borders::ALL)
        .title(" Login / Register ");
    frame.render_widget(card.clone(), area);

    let [email_area, password_area, help_area, _] = layout_rows(card.inner(area));

    let email = Paragraph::new(app.email.as_str()).block(
        field_block("Email", focus == LoginField::Email),
    );
    frame.render_widget(email, email_area);

    // Password is rendered masked, one '*' per character
    let masked = "*".repeat(app.password.chars().count());
    let password = Paragraph::new(masked).block(
        field_block("Password", focus == LoginField::Password),
    );
    frame.render_widget(password, password_area);

    let help = Line::from("tab: switch field  enter: login  ctrl+r: register  esc: quit")
        .style(Style::default().fg(Color::DarkGray));
    frame.render_widget(Paragraph::new(help), help_area);

    let focused_area = match focus {
        LoginField::Email => email_area,
        LoginField::Password => password_area,
    };
    set_input_cursor(frame, focused_area, app.cursor);
}

fn render_chat(frame: &mut Frame, app: &App, area: Rect) {
    let card = Block::default()
        .borders(Borders::ALL)
        .title(" AI Therapist Chatbot ");
    frame.render_widget(card.clone(), area);

    let [message_area, help_area, response_area] = layout_chat_rows(card.inner(area));

    let message = Paragraph::new(app.message.as_str()).block(field_block("Your Message", true));
    frame.render_widget(message, message_area);

    let help = Line::from("enter: send  esc: quit").style(Style::default().fg(Color::DarkGray));
    frame.render_widget(Paragraph::new(help), help_area);

    if !app.response.is_empty() {
        let response = Paragraph::new(app.response.as_str())
            .wrap(Wrap { trim: false })
            .block(Block::default().borders(Borders::ALL).title("Response"));
        frame.render_widget(response, response_area);
    }

    set_input_cursor(frame, message_area, app.cursor);
}

fn render_notice(frame: &mut Frame, app: &App, card_area: Rect) {
    let Some(notice) = &app.notice else {
        return;
    };

    let color = match notice.kind {
        NoticeKind::Success => Color::Green,
        NoticeKind::Error => Color::Red,
    };
    let line = Line::from(notice.text.as_str())
        .style(Style::default().fg(color).add_modifier(Modifier::BOLD));

    // One line directly below the card, clipped to the frame
    let y = card_area.y + card_area.height;
    if y < frame.area().height {
        let notice_area = Rect::new(card_area.x, y, card_area.width, 1);
        frame.render_widget(Paragraph::new(line).wrap(Wrap { trim: true }), notice_area);
    }
}

fn field_block(title: &str, focused: bool) -> Block<'_> {
    let style = if focused {
        Style::default().fg(Color::Cyan)
    } else {
        Style::default()
    };
    Block::default()
        .borders(Borders::ALL)
        .title(title)
        .border_style(style)
}

/// Place the terminal cursor inside a bordered single-line input.
fn set_input_cursor(frame: &mut Frame, field_area: Rect, cursor: usize) {
    let inner_width = field_area.width.saturating_sub(2);
    let x = field_area.x + 1 + (cursor as u16).min(inner_width.saturating_sub(1));
    let y = field_area.y + 1;
    frame.set_cursor_position(Position::new(x, y));
}

fn layout_rows(inner: Rect) -> [Rect; 4] {
    Layout::vertical([
        Constraint::Length(3),
        Constraint::Length(3),
        Constraint::Length(1),
        Constraint::Min(0),
    ])
    .areas(inner)
}

fn layout_chat_rows(inner: Rect) -> [Rect; 3] {
    Layout::vertical([
        Constraint::Length(3),
        Constraint::Length(1),
        Constraint::Min(3),
    ])
    .areas(inner)
}

/// Center a fixed-size card within the frame, clamped to what fits.
fn centered_rect(frame_area: Rect, width: u16, height: u16) -> Rect {
    let width = width.min(frame_area.width);
    let height = height.min(frame_area.height);
    let x = frame_area.x + (frame_area.width - width) / 2;
    let y = frame_area.y + (frame_area.height - height) / 2;
    Rect::new(x, y, width, height)
}
