use anyhow::Result;

mod app;
mod auth;
mod config;
mod handler;
mod openai;
mod tui;
mod ui;

use app::App;
use config::Config;
use tui::EventHandler;

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::from_env();
    let mut app = App::new(config);

    tui::install_panic_hook();
    let mut terminal = tui::init()?;
    let mut events = EventHandler::new();

    let result = run(&mut terminal, &mut app, &mut events).await;

    tui::restore()?;
    result
}

async fn run(terminal: &mut tui::Tui, app: &mut App, events: &mut EventHandler) -> Result<()> {
    let tx = events.sender();
    while !app.should_quit {
        terminal.draw(|frame| ui::render(frame, app))?;
        if let Some(event) = events.next().await {
            handler::handle_event(app, event, &tx);
        }
    }
    Ok(())
}
