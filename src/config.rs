use std::path::PathBuf;

use clap::{Parser, ValueEnum};

use crate::error::ConvertError;

pub const DEFAULT_SERVER: &str = "https://universal-converter-drug.onrender.com";

/// Desktop client for the universal image/PDF conversion service
#[derive(Debug, Parser)]
#[command(name = "universal-converter", version, about)]
pub struct Args {
    /// Base URL of the conversion service
    #[arg(long, env = "CONVERTER_SERVER", default_value = DEFAULT_SERVER)]
    pub server: String,

    /// Window colour scheme
    #[arg(long, value_enum, default_value_t = Theme::Dark)]
    pub theme: Theme,

    /// More logging (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// File to load on start-up
    pub file: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Theme {
    Dark,
    Light,
}

impl Args {
    /// Tracing filter implied by `-v`; `RUST_LOG` still takes precedence.
    pub fn log_filter(&self) -> &'static str {
        match self.verbose {
            0 => "warn",
            1 => "info",
            2 => "debug",
            _ => "trace",
        }
    }

    /// The server URL, checked and without a trailing slash.
    pub fn server_url(&self) -> Result<String, ConvertError> {
        let invalid = |reason: String| ConvertError::InvalidServerUrl {
            url: self.server.clone(),
            reason,
        };
        let url = reqwest::Url::parse(&self.server).map_err(|e| invalid(e.to_string()))?;
        match url.scheme() {
            "http" | "https" => Ok(self.server.trim_end_matches('/').to_string()),
            other => Err(invalid(format!("unsupported scheme '{other}'"))),
        }
    }
}
