use std::io::Stderr;
use std::path::PathBuf;
use anyhow::{Context, Result};
use clap::Parser;
use palace_chat_core::{
    page_path, ChatClient, ChatWidget, Config, Transport, DEFAULT_CHAT_TYPE, KNOWN_CHAT_TYPES,
};
use ratatui::backend::CrosstermBackend;

mod handler;
mod input;
mod logging;
mod markup;
mod tui;
mod ui;
mod view;

use handler::Flow;
use tui::EventHandler;
use view::TuiView;

#[derive(Parser)]
#[command(name = "palace-chat", version)]
#[command(about = "Terminal chat client for the memory palace backend")]
struct Cli {
    /// Page URL; its origin serves /chat and its path selects the chat type
    /// (e.g. http://localhost:8000/ocean)
    #[arg(env = "PALACE_CHAT_URL")]
    url: Option<String>,

    /// Config file to use instead of the default location
    #[arg(long)]
    config: Option<PathBuf>,

    /// Write logs here instead of the default cache location
    #[arg(long)]
    log_file: Option<PathBuf>,

    /// Print the chat types the backend ships with and exit
    #[arg(long)]
    list_types: bool,
}

type Widget<T> = ChatWidget<TuiView<CrosstermBackend<Stderr>>, T>;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    if cli.list_types {
        for chat_type in KNOWN_CHAT_TYPES {
            let marker = if chat_type == DEFAULT_CHAT_TYPE { " (default)" } else { "" };
            println!("{}{}", chat_type, marker);
        }
        return Ok(());
    }

    let config = match &cli.config {
        Some(path) => Config::load_from(path)
            .with_context(|| format!("Failed to load config from {}", path.display()))?,
        None => Config::load().unwrap_or_else(|_| Config::new()),
    };

    let log_path = match cli.log_file {
        Some(path) => path,
        None => config.log_path()?,
    };
    logging::init(&log_path)?;

    let page_url = cli.url.unwrap_or_else(|| config.page_url().to_string());
    let client = ChatClient::from_page_url(&page_url)?;
    let location = page_path(&page_url)?;
    let endpoint = client.endpoint().to_string();
    log::info!("chatting via {} from page path {}", endpoint, location);

    tui::install_panic_hook();
    let terminal = tui::init()?;

    let mut widget = ChatWidget::new(TuiView::new(terminal, endpoint), client, location);
    let chat_type = widget.chat_type();
    if !chat_type.is_known() {
        log::info!("chat type '{}' is not a built-in one; forwarding as-is", chat_type);
    }
    widget.view_mut().state.chat_type = chat_type.to_string();

    let result = run(&mut widget).await;

    tui::restore()?;
    result
}

async fn run<T: Transport>(widget: &mut Widget<T>) -> Result<()> {
    let mut events = EventHandler::new();
    widget.view_mut().draw()?;

    while let Some(event) = events.next().await {
        if handler::dispatch(widget, event, events.pending()).await == Flow::Quit {
            break;
        }
        widget.view_mut().draw()?;
    }

    Ok(())
}
