use anyhow::{Result, anyhow};
use clap::Parser;
use companion_core::config::{self, API_KEY_ENV};
use companion_core::{build_prompt, split_response, Config, GroqClient, Session};

mod app;
mod handler;
mod logging;
mod tui;
mod ui;

use app::App;
use tui::{EventHandler, Tui};

#[derive(Parser)]
#[command(name = "companion")]
#[command(about = "Terminal pair programmer backed by a hosted reasoning model", version)]
struct Cli {
    /// Model to use instead of the configured default
    #[arg(short, long)]
    model: Option<String>,

    /// Ask a single question, print the answer and exit
    #[arg(long, value_name = "QUESTION")]
    once: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // .env first so RUST_LOG from it reaches the subscriber
    config::load_dotenv();
    // A broken log file must not keep the program from starting
    if let Some(log_path) = logging::init_or_warn() {
        tracing::info!(log = %log_path.display(), "starting");
    }

    let config = Config::load().unwrap_or_else(|e| {
        tracing::warn!(error = %e, "falling back to default config");
        Config::new()
    });

    if let Some(question) = cli.once {
        let model = cli.model.unwrap_or_else(|| config.model());
        return run_once(&config, &model, &question).await;
    }

    tui::install_panic_hook();
    let mut terminal = tui::init()?;
    let mut app = App::new(config, cli.model);
    let mut events = EventHandler::new();

    let result = run(&mut terminal, &mut app, &mut events).await;

    tui::restore()?;
    if let Err(e) = &result {
        tracing::error!(error = %e, "exited with error");
    }
    result
}

async fn run(terminal: &mut Tui, app: &mut App, events: &mut EventHandler) -> Result<()> {
    let tx = events.sender();

    while !app.should_quit {
        terminal.draw(|frame| ui::render(app, frame))?;

        match events.next().await {
            Some(event) => handler::handle_event(app, event, &tx)?,
            None => break,
        }
    }

    tracing::info!(exchanges = app.exchanges(), "session ended");
    Ok(())
}

async fn run_once(config: &Config, model: &str, question: &str) -> Result<()> {
    let key = config.api_key().ok_or_else(|| {
        anyhow!("No Groq API key found. Set {} or add groq_api_key to the config file", API_KEY_ENV)
    })?;
    let client = GroqClient::with_base_url(&key, &config.base_url());

    let mut session = Session::new();
    session.push_user(question);

    let prompt = build_prompt(session.messages());
    let full_response = client.complete(model, config.temperature(), &prompt).await?;
    let parsed = split_response(&full_response);

    if let Some(thinking) = parsed.thinking_opt() {
        println!("🧠 Thinking\n{}\n", thinking);
    }
    println!("{}", parsed.answer);

    Ok(())
}
