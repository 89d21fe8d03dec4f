//! The article feed: one article per screen, moving down loads more.

use ratatui::{
    Frame,
    layout::{Constraint, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Padding, Paragraph},
};

use crate::api::Article;
use crate::app::App;
use crate::feed::FeedPhase;
use crate::theme::ResolvedTheme;
use crate::views::common::{format_views, render_error, truncate_to_width};
use crate::views::spinner::spinner_frame;
use crate::views::status_bar::StatusBar;

pub fn render(frame: &mut Frame, app: &App, area: Rect) {
    let chunks = Layout::vertical([
        Constraint::Length(1), // Header
        Constraint::Min(0),    // Article
        Constraint::Length(1), // Status bar
    ])
    .split(area);

    render_header(frame, app, chunks[0]);
    render_body(frame, app, chunks[1]);
    render_status_bar(frame, app, chunks[2]);
}

fn render_header(frame: &mut Frame, app: &App, area: Rect) {
    let theme = &app.theme;
    let date = app.feed.config().date.format("%-d %B %Y").to_string();
    let mut spans = vec![
        Span::styled(
            "Most read on Wikipedia",
            Style::default()
                .fg(theme.primary)
                .add_modifier(Modifier::BOLD),
        ),
        Span::styled(format!("  {date}  "), theme.dim_style()),
    ];
    if app.should_show_spinner() {
        spans.push(Span::styled(
            spinner_frame(app.loading_start),
            theme.spinner_style(),
        ));
    }
    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}

fn render_body(frame: &mut Frame, app: &App, area: Rect) {
    let theme = &app.theme;
    let error = app.feed.last_error().map(|e| e.user_message());

    let Some(article) = app.selected_article() else {
        if let Some(err) = &error {
            render_error(frame, err, theme, area);
        } else {
            render_placeholder(frame, app, area);
        }
        return;
    };

    let (card_area, error_area) = if error.is_some() {
        let chunks = Layout::vertical([Constraint::Min(0), Constraint::Length(4)]).split(area);
        (chunks[0], Some(chunks[1]))
    } else {
        (area, None)
    };

    render_article(frame, app, article, card_area);

    if let (Some(err), Some(error_area)) = (&error, error_area) {
        render_error(frame, err, theme, error_area);
    }
}

fn render_placeholder(frame: &mut Frame, app: &App, area: Rect) {
    let theme = &app.theme;
    let text = if app.feed.is_exhausted() {
        "No articles for this day."
    } else {
        "Loading articles..."
    };
    let widget = Paragraph::new(Line::from(Span::styled(text, theme.dim_style()))).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(theme.border_style())
            .padding(Padding::horizontal(1)),
    );
    frame.render_widget(widget, area);
}

fn render_article(frame: &mut Frame, app: &App, article: &Article, area: Rect) {
    let theme = &app.theme;
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(theme.border_style())
        .padding(Padding::horizontal(1))
        .title(format!(
            " {}/{} ",
            app.selected_index + 1,
            app.articles().len()
        ));
    let inner = block.inner(area);
    let width = inner.width as usize;

    let mut lines = vec![
        Line::from(Span::styled(
            truncate_to_width(&article.title, width),
            theme.title_style(),
        )),
        Line::from(Span::styled(
            format!("{} views", format_views(article.views)),
            Style::default().fg(theme.article_views),
        )),
        thumbnail_line(article, theme, width),
        Line::from(""),
    ];

    // Leave room for the footer line at the bottom of the card
    let room = (inner.height as usize).saturating_sub(lines.len() + 2);
    let wrapped = textwrap::wrap(&article.extract, width.max(1));
    let truncated = wrapped.len() > room;
    // A cut extract gives up one line to the "…" marker
    let shown = if truncated { room.saturating_sub(1) } else { room };
    for line in wrapped.into_iter().take(shown) {
        lines.push(Line::from(Span::styled(
            line.into_owned(),
            Style::default().fg(theme.article_extract),
        )));
    }
    if truncated {
        lines.push(Line::from(Span::styled("…", theme.dim_style())));
    }

    if let Some(footer) = footer_text(app) {
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled(footer, theme.dim_style())));
    }

    frame.render_widget(Paragraph::new(lines).block(block), area);
}

fn thumbnail_line(article: &Article, theme: &ResolvedTheme, width: usize) -> Line<'static> {
    match &article.thumbnail {
        Some(thumb) => {
            let label = format!("Image {}x{}  ", thumb.width, thumb.height);
            let source_width = width.saturating_sub(label.len());
            Line::from(vec![
                Span::styled(label, theme.dim_style()),
                Span::styled(
                    truncate_to_width(&thumb.source, source_width),
                    Style::default().fg(theme.article_link),
                ),
            ])
        }
        None => Line::from(Span::styled("No image", theme.dim_style())),
    }
}

/// What the last article says about the rest of the feed.
fn footer_text(app: &App) -> Option<&'static str> {
    if !app.sentinel_visible() {
        return None;
    }
    match app.feed.phase() {
        FeedPhase::Fetching => Some("Loading more articles..."),
        FeedPhase::Exhausted => Some("That's all of today's most-read articles."),
        FeedPhase::Idle | FeedPhase::RateLimited => None,
    }
}

fn render_status_bar(frame: &mut Frame, app: &App, area: Rect) {
    let help_text = if app.show_help {
        "j/k:next/prev  g/G:first/last  o:open  r:retry  R:reload  `:debug  q:quit  ?:hide"
    } else {
        "j/k:scroll  o:open  ?:help  q:quit"
    };
    let notice = match app.feed.phase() {
        FeedPhase::Exhausted => Some("end of list"),
        FeedPhase::RateLimited => Some("stopped"),
        FeedPhase::Idle | FeedPhase::Fetching => None,
    };

    let mut bar = StatusBar::new(&app.theme)
        .label("Most read")
        .notice(notice)
        .help(help_text);
    if app.feed.is_fetching() {
        bar = bar.loading("Loading...");
    }
    if !app.articles().is_empty() {
        bar = bar.position(app.selected_index + 1, app.articles().len());
    }
    bar.render(frame, area);
}
