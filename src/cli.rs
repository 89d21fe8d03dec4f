use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "wikifeed")]
#[command(about = "Scroll through yesterday's most-read Wikipedia articles", long_about = None)]
pub struct Cli {
    /// Day to show rankings for, as YYYY-MM-DD (default: yesterday, UTC)
    #[arg(long, value_name = "DATE")]
    pub date: Option<NaiveDate>,

    /// Wiki language code, e.g. en, de, fr
    #[arg(long, value_name = "CODE")]
    pub language: Option<String>,

    /// Articles requested per batch (1-20)
    #[arg(long, value_name = "N")]
    pub batch_size: Option<usize>,

    /// Consecutive failed fetches before giving up
    #[arg(long, value_name = "N")]
    pub attempt_limit: Option<u32>,

    /// Keep articles that have no thumbnail
    #[arg(long)]
    pub allow_missing_thumbnails: bool,

    /// Force dark mode (overrides auto-detection)
    #[arg(long, conflicts_with = "light")]
    pub dark: bool,

    /// Force light mode (overrides auto-detection)
    #[arg(long, conflicts_with = "dark")]
    pub light: bool,

    /// Custom config directory (default: ~/.config/wikifeed)
    #[arg(long, value_name = "DIR")]
    pub config_dir: Option<PathBuf>,

    /// Enable verbose logging (prints log path, sets DEBUG level)
    #[arg(short, long)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Print articles without starting the interface
    List {
        /// Number of batches to load
        #[arg(short, long, default_value_t = 1)]
        pages: usize,

        /// Output format (text or json)
        #[arg(short, long, default_value = "text")]
        format: OutputFormat,
    },
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" => Ok(Self::Text),
            "json" => Ok(Self::Json),
            _ => Err(format!("Invalid format: {s}. Use 'text' or 'json'")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_date_flag() {
        let cli = Cli::parse_from(["wikifeed", "--date", "2024-02-29"]);
        assert_eq!(cli.date, NaiveDate::from_ymd_opt(2024, 2, 29));
    }

    #[test]
    fn rejects_malformed_date() {
        assert!(Cli::try_parse_from(["wikifeed", "--date", "2024/02/29"]).is_err());
    }

    #[test]
    fn dark_and_light_conflict() {
        assert!(Cli::try_parse_from(["wikifeed", "--dark", "--light"]).is_err());
    }

    #[test]
    fn list_subcommand_defaults() {
        let cli = Cli::parse_from(["wikifeed", "list"]);
        match cli.command {
            Some(Commands::List { pages, format }) => {
                assert_eq!(pages, 1);
                assert_eq!(format, OutputFormat::Text);
            }
            None => panic!("expected list subcommand"),
        }
    }

    #[test]
    fn output_format_is_case_insensitive() {
        assert_eq!("JSON".parse::<OutputFormat>(), Ok(OutputFormat::Json));
        assert!("yaml".parse::<OutputFormat>().is_err());
    }
}
