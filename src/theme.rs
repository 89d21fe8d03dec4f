use ratatui::style::{Color, Modifier, Style};
use serde::Deserialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ThemeVariant {
    #[default]
    Dark,
    Light,
}

#[derive(Debug, Clone)]
pub struct ResolvedTheme {
    pub variant: ThemeVariant,
    pub foreground: Color,
    pub foreground_dim: Color,
    pub border: Color,
    pub primary: Color,
    pub error: Color,
    pub article_title: Color,
    pub article_views: Color,
    pub article_extract: Color,
    pub article_link: Color,
    pub status_bar_bg: Color,
    pub status_bar_fg: Color,
    pub spinner: Color,
}

impl ResolvedTheme {
    pub fn dark() -> Self {
        Self {
            variant: ThemeVariant::Dark,
            foreground: Color::Rgb(0xd8, 0xde, 0xe9),
            foreground_dim: Color::Rgb(0x7b, 0x88, 0xa1),
            border: Color::Rgb(0x4c, 0x56, 0x6a),
            primary: Color::Rgb(0x88, 0xc0, 0xd0),
            error: Color::Rgb(0xbf, 0x61, 0x6a),
            article_title: Color::Rgb(0xec, 0xef, 0xf4),
            article_views: Color::Rgb(0xeb, 0xcb, 0x8b),
            article_extract: Color::Rgb(0xd8, 0xde, 0xe9),
            article_link: Color::Rgb(0x81, 0xa1, 0xc1),
            status_bar_bg: Color::Rgb(0x3b, 0x42, 0x52),
            status_bar_fg: Color::Rgb(0xec, 0xef, 0xf4),
            spinner: Color::Rgb(0xa3, 0xbe, 0x8c),
        }
    }

    pub fn light() -> Self {
        Self {
            variant: ThemeVariant::Light,
            foreground: Color::Rgb(0x2e, 0x34, 0x40),
            foreground_dim: Color::Rgb(0x6c, 0x75, 0x86),
            border: Color::Rgb(0xa7, 0xad, 0xba),
            primary: Color::Rgb(0x33, 0x66, 0xcc),
            error: Color::Rgb(0xb0, 0x2a, 0x37),
            article_title: Color::Rgb(0x20, 0x22, 0x22),
            article_views: Color::Rgb(0xa0, 0x6a, 0x00),
            article_extract: Color::Rgb(0x2e, 0x34, 0x40),
            article_link: Color::Rgb(0x33, 0x66, 0xcc),
            status_bar_bg: Color::Rgb(0xea, 0xec, 0xf0),
            status_bar_fg: Color::Rgb(0x20, 0x22, 0x22),
            spinner: Color::Rgb(0x14, 0x86, 0x6d),
        }
    }

    pub fn for_variant(variant: ThemeVariant) -> Self {
        match variant {
            ThemeVariant::Dark => Self::dark(),
            ThemeVariant::Light => Self::light(),
        }
    }

    pub fn border_style(&self) -> Style {
        Style::default().fg(self.border)
    }

    pub fn dim_style(&self) -> Style {
        Style::default().fg(self.foreground_dim)
    }

    pub fn title_style(&self) -> Style {
        Style::default()
            .fg(self.article_title)
            .add_modifier(Modifier::BOLD)
    }

    pub fn error_style(&self) -> Style {
        Style::default().fg(self.error)
    }

    pub fn spinner_style(&self) -> Style {
        Style::default().fg(self.spinner)
    }

    pub fn status_bar_style(&self) -> Style {
        Style::default()
            .bg(self.status_bar_bg)
            .fg(self.status_bar_fg)
    }
}

/// Guess the variant from the terminal background. Falls back to dark when
/// the terminal does not answer the query.
pub fn detect_terminal_theme() -> ThemeVariant {
    match terminal_light::luma() {
        Ok(luma) if luma > 0.6 => ThemeVariant::Light,
        _ => ThemeVariant::Dark,
    }
}

pub fn resolve(variant: Option<ThemeVariant>) -> ResolvedTheme {
    ResolvedTheme::for_variant(variant.unwrap_or_else(detect_terminal_theme))
}
