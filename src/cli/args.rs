//! CLI argument definitions
//!
//! Global CLI options and configuration merging logic.

use std::io::IsTerminal;

use clap::{Parser, ValueEnum};

use crate::config::{Config, ConfigColorMode};
use crate::data::{Selection, parse_months, parse_year_arg};
use crate::error::AppError;

use super::commands::Commands;

#[derive(Debug, Clone, Copy, Default, ValueEnum, PartialEq)]
pub(crate) enum ColorMode {
    /// Auto-detect based on terminal (default)
    #[default]
    Auto,
    /// Always use colors
    Always,
    /// Never use colors
    Never,
}

#[derive(Debug, Parser)]
#[command(name = "adrev")]
#[command(about = "Advertising sales and billing analytics", version)]
pub(crate) struct Cli {
    #[command(subcommand)]
    pub(crate) command: Option<Commands>,

    /// Data file, directory of CSV files, or glob pattern
    #[arg(short, long, global = true, value_name = "PATH|GLOB")]
    pub(crate) data: Option<String>,

    /// First year of the selection
    #[arg(long, global = true, value_name = "YEAR")]
    pub(crate) from: Option<String>,

    /// Last year of the selection
    #[arg(long, global = true, value_name = "YEAR")]
    pub(crate) to: Option<String>,

    /// Months to keep: numbers, abbreviations or ranges (e.g. "1-3,jul,dez")
    #[arg(short, long, global = true, value_name = "LIST")]
    pub(crate) months: Option<String>,

    /// Keep only this broadcaster (repeatable)
    #[arg(short, long, global = true, value_name = "NAME")]
    pub(crate) broadcaster: Vec<String>,

    /// Keep only this executive (repeatable)
    #[arg(short, long, global = true, value_name = "NAME")]
    pub(crate) executive: Vec<String>,

    /// Keep only this client (repeatable)
    #[arg(long, global = true, value_name = "NAME")]
    pub(crate) client: Vec<String>,

    /// Output as JSON
    #[arg(short, long, global = true, conflicts_with = "csv")]
    pub(crate) json: bool,

    /// Output as CSV
    #[arg(long, global = true)]
    pub(crate) csv: bool,

    /// Color output mode
    #[arg(long, global = true, value_enum, default_value = "auto")]
    pub(crate) color: ColorMode,

    /// Disable colored output (shorthand for --color=never)
    #[arg(long, global = true)]
    pub(crate) no_color: bool,

    /// Enable debug output (show processing details)
    #[arg(long, global = true)]
    pub(crate) debug: bool,

    /// Locale for number formatting (e.g., "en", "pt", "de", "fr")
    #[arg(long, global = true, value_name = "LOCALE")]
    pub(crate) locale: Option<String>,
}

impl Cli {
    /// Merge config file values into CLI (CLI args take precedence)
    pub(crate) fn with_config(mut self, config: &Config) -> Self {
        // For boolean flags, config only applies if CLI is false (default)
        if !self.no_color && config.no_color {
            self.no_color = true;
        }
        if !self.debug && config.debug {
            self.debug = true;
        }

        if let Some(color) = config.color
            && self.color == ColorMode::Auto
        {
            self.color = match color {
                ConfigColorMode::Auto => ColorMode::Auto,
                ConfigColorMode::Always => ColorMode::Always,
                ConfigColorMode::Never => ColorMode::Never,
            };
        }

        // String options: only apply if CLI didn't set them
        if self.data.is_none() {
            self.data = config.data.clone();
        }
        if self.locale.is_none() {
            self.locale = config.locale.clone();
        }

        self
    }

    pub(crate) fn use_color(&self) -> bool {
        if self.no_color {
            return false;
        }
        match self.color {
            ColorMode::Always => true,
            ColorMode::Never => false,
            ColorMode::Auto => std::io::stdout().is_terminal(),
        }
    }

    /// Active filters from the global options
    pub(crate) fn selection(&self) -> Result<Selection, AppError> {
        Ok(Selection {
            from_year: self.from.as_deref().map(parse_year_arg).transpose()?,
            to_year: self.to.as_deref().map(parse_year_arg).transpose()?,
            months: match &self.months {
                Some(list) => parse_months(list)?,
                None => Default::default(),
            },
            broadcasters: self.broadcaster.iter().cloned().collect(),
            executives: self.executive.iter().cloned().collect(),
            clients: self.client.iter().cloned().collect(),
        })
    }
}
