use std::fs::{self, File};
use std::sync::{Arc, Mutex};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

use chat_panel::{
    ChatBackend, ChatController, ChatView, Config, ControllerOptions, HttpChatClient,
    MarkupPolicy, PanelView,
};

mod app;
mod handler;
mod tui;
mod ui;

use app::App;
use tui::EventHandler;

#[derive(Parser)]
#[command(name = "chat-panel")]
#[command(about = "Chat with a history/chat HTTP backend from the terminal")]
#[command(version)]
struct Cli {
    /// Backend base URL (overrides $CHAT_PANEL_URL and the config file)
    #[arg(long, global = true)]
    url: Option<String>,

    /// Insert message text as raw markup instead of escaping it
    #[arg(long, global = true)]
    raw_markup: bool,

    /// Refuse to send while a reply is still pending
    #[arg(long, global = true)]
    single_flight: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Interactive chat panel (default)
    Tui,
    /// Load the conversation history and print it
    History {
        /// Print the panel as HTML
        #[arg(long)]
        html: bool,
    },
    /// Send one message and print the resulting panel
    Send {
        /// Message text
        message: String,
        /// Print the panel as HTML
        #[arg(long)]
        html: bool,
    },
    /// Save the backend URL to the config file
    SetUrl {
        url: String,
    },
}

struct Settings {
    base_url: String,
    options: ControllerOptions,
    welcome: String,
}

fn settings(cli: &Cli) -> Settings {
    let config = Config::load().unwrap_or_else(|e| {
        tracing::warn!(error = %e, "could not read config, using defaults");
        Config::new()
    });

    let env_url = std::env::var(chat_panel::config::URL_ENV).ok();
    let base_url = cli
        .url
        .clone()
        .unwrap_or_else(|| config.resolve_base_url(env_url));

    let mut options = config.controller_options();
    if cli.raw_markup {
        options.markup = MarkupPolicy::Raw;
    }
    if cli.single_flight {
        options.single_flight = true;
    }

    Settings {
        base_url,
        options,
        welcome: config.welcome_text().to_string(),
    }
}

/// Logs go to a file while the terminal UI owns the screen, stderr otherwise.
fn init_logging(to_file: bool) -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    if to_file {
        let dir = dirs::cache_dir()
            .context("Could not determine cache directory")?
            .join("chat-panel");
        fs::create_dir_all(&dir)?;
        let file = File::options()
            .create(true)
            .append(true)
            .open(dir.join("chat-panel.log"))?;
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_ansi(false)
            .with_writer(Mutex::new(file))
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let mut cli = Cli::parse();
    let command = cli.command.take().unwrap_or(Commands::Tui);

    init_logging(matches!(command, Commands::Tui))?;
    let settings = settings(&cli);

    match command {
        Commands::Tui => run_tui(settings).await?,
        Commands::History { html } => print_history(settings, html).await?,
        Commands::Send { message, html } => send_once(settings, &message, html).await?,
        Commands::SetUrl { url } => {
            let path = Config::save_base_url(&url)?;
            println!("Saved backend URL {} to {}", url, path.display());
        }
    }

    Ok(())
}

fn connect(settings: &Settings) -> Result<Arc<HttpChatClient>> {
    let client = HttpChatClient::new(&settings.base_url)
        .with_context(|| format!("Could not set up HTTP client for {}", settings.base_url))?;
    Ok(Arc::new(client))
}

async fn run_tui(settings: Settings) -> Result<()> {
    let backend: Arc<dyn ChatBackend> = connect(&settings)?;
    info!(url = %settings.base_url, "starting chat panel");

    tui::install_panic_hook();
    let mut terminal = tui::init()?;
    let mut events = EventHandler::new();

    let mut app = App::new(
        backend,
        settings.options,
        settings.base_url,
        &settings.welcome,
        events.sender(),
    );
    app.start_history_load();

    let result = async {
        loop {
            terminal.draw(|frame| ui::render(&mut app, frame))?;

            let Some(event) = events.next().await else {
                break;
            };
            handler::handle_event(&mut app, event)?;

            if app.should_quit {
                break;
            }
        }
        Ok::<(), anyhow::Error>(())
    }
    .await;

    tui::restore()?;
    result
}

fn print_panel(panel: &PanelView, html: bool) {
    if html {
        println!("{}", panel.to_html());
        return;
    }
    for block in panel.blocks() {
        let who = match block.kind {
            chat_panel::BlockKind::User => "You",
            chat_panel::BlockKind::Bot => "AI",
        };
        println!("{}:\n{}\n", who, block.display_text());
    }
}

async fn print_history(settings: Settings, html: bool) -> Result<()> {
    let backend = connect(&settings)?;
    let mut controller = ChatController::new(backend, settings.options);
    let mut panel = PanelView::new();

    controller.load_history(&mut panel).await;
    if panel.is_empty() {
        println!("No history.");
    } else {
        print_panel(&panel, html);
    }
    Ok(())
}

async fn send_once(settings: Settings, message: &str, html: bool) -> Result<()> {
    let backend = connect(&settings)?;
    let mut controller = ChatController::new(backend, settings.options);
    let mut panel = PanelView::new();

    panel.input.set(message);
    if panel.input_value().trim().is_empty() {
        println!("Nothing to send.");
        return Ok(());
    }

    controller.send_message(&mut panel).await;
    print_panel(&panel, html);
    Ok(())
}
