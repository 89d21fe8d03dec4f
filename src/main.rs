mod api;
mod app;
mod cli;
mod event;
mod feed;
mod keys;
mod logging;
mod settings;
mod theme;
mod time;
mod tui;
mod views;

#[cfg(test)]
mod test_utils;

use anyhow::{Context, Result, bail};
use clap::Parser;
use ratatui::Frame;
use tracing::{info, warn};

use api::{ClientConfig, WikiClient};
use app::App;
use cli::{Cli, Commands, OutputFormat};
use event::{Event, EventHandler};
use feed::{ArticleSource, FeedConfig, FeedController};
use settings::Settings;
use theme::ResolvedTheme;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config_dir = settings::config_dir(cli.config_dir.as_ref());
    let settings = config_dir
        .as_ref()
        .map(|dir| {
            let path = settings::settings_path(dir);
            Settings::load(&path).unwrap_or_else(|e| {
                eprintln!("Warning: {:#}", e);
                Settings::default()
            })
        })
        .unwrap_or_default()
        .with_cli(&cli)?;

    // Held until exit so buffered log lines get flushed
    let _log_guard = match &config_dir {
        Some(dir) => {
            let log_dir = settings::log_dir(dir);
            let guard = logging::init(&log_dir, cli.verbose)?;
            if cli.verbose {
                eprintln!("Logging to {}", log_dir.display());
            }
            Some(guard)
        }
        None => None,
    };

    let date = cli
        .date
        .unwrap_or_else(|| time::reference_date(time::system_clock().as_ref()));
    let language = settings.language().to_string();

    let client = WikiClient::new(ClientConfig {
        timeout: settings.timeout(),
        ..ClientConfig::for_language(&language)
    })
    .context("Failed to build HTTP client")?;

    let mut config = FeedConfig::new(date);
    config.batch_size = settings.batch_size();
    config.attempt_limit = settings.attempt_limit();
    config.require_thumbnail = settings.require_thumbnail();

    info!(%date, %language, batch_size = config.batch_size, "starting");

    match cli.command {
        Some(Commands::List { pages, format }) => {
            run_list(client, config, &language, pages, format).await
        }
        None => {
            let theme = theme::resolve(settings.theme);
            info!(variant = ?theme.variant, "resolved theme");
            run_tui(client, config, language, theme).await
        }
    }
}

/// Loads `pages` batches without a terminal UI and prints them.
async fn run_list(
    client: WikiClient,
    config: FeedConfig,
    language: &str,
    pages: usize,
    format: OutputFormat,
) -> Result<()> {
    let mut feed = FeedController::new(config);
    load_pages(&mut feed, &client, pages).await?;

    match format {
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(feed.articles())
                .context("Failed to serialize articles to JSON")?;
            println!("{}", json);
        }
        OutputFormat::Text => {
            let indent = "     ";
            let options = textwrap::Options::new(80)
                .initial_indent(indent)
                .subsequent_indent(indent);
            for (i, article) in feed.articles().iter().enumerate() {
                println!(
                    "{:>3}. {} ({} views)",
                    i + 1,
                    article.title,
                    views::common::format_views(article.views)
                );
                println!("{indent}{}", article.url(language));
                if !article.extract.is_empty() {
                    println!("{}", textwrap::fill(&article.extract, &options));
                }
                println!();
            }
        }
    }

    if let Some(err) = feed.last_error() {
        eprintln!("Stopped early: {}", err.user_message());
    }
    Ok(())
}

/// Loads batches until `pages` of them succeed or the feed stops. Failed
/// batches are retried until the attempt limit ends the feed.
async fn load_pages<S: ArticleSource>(
    feed: &mut FeedController,
    source: &S,
    pages: usize,
) -> Result<()> {
    let mut loaded = 0;

    while loaded < pages && !feed.phase().is_terminal() {
        if !feed.load_more_with(source).await {
            break;
        }
        match feed.last_error() {
            Some(err) => {
                warn!(error = %err, "batch failed");
                eprintln!("Warning: {}", err.user_message());
            }
            None => loaded += 1,
        }
    }

    if feed.articles().is_empty()
        && let Some(err) = feed.last_error()
    {
        bail!("{}", err.user_message());
    }
    Ok(())
}

async fn run_tui(
    client: WikiClient,
    config: FeedConfig,
    language: String,
    theme: ResolvedTheme,
) -> Result<()> {
    let mut terminal = tui::init()?;
    let mut app = App::new(client, config, language, theme);
    let mut events = EventHandler::new(250);

    app.start();

    loop {
        terminal.draw(|frame| render(&app, frame))?;

        // Poll async results (non-blocking)
        while let Ok(result) = app.result_rx.try_recv() {
            app.handle_async_result(result);
        }

        if app.should_quit {
            break;
        }

        match events.next().await? {
            Event::Key(key) => {
                if let Some(msg) = keys::handle_key(key, &app) {
                    app.update(msg);
                }
            }
            Event::Tick | Event::Resize => {}
        }
    }

    tui::restore()?;
    Ok(())
}

fn render(app: &App, frame: &mut Frame) {
    use ratatui::layout::{Constraint, Layout};

    let area = frame.area();

    let (main_area, debug_area) = if app.debug.visible {
        let chunks = Layout::vertical([
            Constraint::Min(0),     // Main content
            Constraint::Length(10), // Debug pane
        ])
        .split(area);
        (chunks[0], Some(chunks[1]))
    } else {
        (area, None)
    };

    views::feed::render(frame, app, main_area);

    if let Some(debug_area) = debug_area {
        views::debug::render(frame, app, debug_area);
    }
}
