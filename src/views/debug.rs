use ratatui::{
    Frame,
    layout::Rect,
    style::Style,
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
};

use crate::app::App;

pub fn render(frame: &mut Frame, app: &App, area: Rect) {
    let theme = &app.theme;

    let block = Block::default()
        .title(" Debug ")
        .borders(Borders::ALL)
        .border_style(theme.dim_style());

    let mut lines = Vec::new();

    // Pagination state
    let feed = &app.feed;
    let candidates = feed
        .candidate_count()
        .map_or_else(|| "?".to_string(), |n| n.to_string());
    lines.push(Line::from(vec![
        Span::styled("Feed: ", theme.dim_style()),
        Span::styled(
            format!(
                "{:?}  offset {}/{}  loaded {}  attempts {}/{}",
                feed.phase(),
                feed.next_offset(),
                candidates,
                feed.articles().len(),
                feed.attempts(),
                feed.config().attempt_limit,
            ),
            Style::default().fg(theme.foreground),
        ),
    ]));

    for task in &app.debug.running_tasks {
        let elapsed = task.started_at.elapsed();
        lines.push(Line::from(vec![
            Span::raw("  "),
            Span::styled(format!("[{}] ", task.id), theme.dim_style()),
            Span::styled(&task.description, Style::default().fg(theme.foreground)),
            Span::styled(
                format!(" ({:.1?})", elapsed),
                Style::default().fg(theme.article_views),
            ),
        ]));
    }

    if !app.debug.running_tasks.is_empty() {
        lines.push(Line::from(""));
    }

    // Recent log entries (newest first, limit to fit area)
    let available_lines = area.height.saturating_sub(3) as usize; // border + feed line
    let log_lines = available_lines.saturating_sub(app.debug.running_tasks.len());

    for entry in app.debug.log.iter().rev().take(log_lines) {
        lines.push(Line::from(Span::styled(
            format!("  {}", entry.message),
            theme.dim_style(),
        )));
    }

    frame.render_widget(Paragraph::new(lines).block(block), area);
}
