//! Configuration loading and parsing

use anyhow::{Context, Result};
use clap::ValueEnum;
use dbc_log_decoder::formats::DEFAULT_HEADER_LINES;
use dbc_log_decoder::DecoderConfig;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Application configuration (loaded from config.toml)
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct AppConfig {
    #[serde(default)]
    pub input: InputConfig,
    #[serde(default)]
    pub output: OutputConfig,
    #[serde(default)]
    pub filtering: FilteringConfig,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct InputConfig {
    pub dbc_file: Option<PathBuf>,
    pub log_dir: Option<PathBuf>,
    #[serde(default)]
    pub files: Vec<PathBuf>,
    pub header_lines: Option<usize>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct OutputConfig {
    pub output_dir: Option<PathBuf>,
    pub format: Option<OutputFormat>,
    pub mode: Option<CsvMode>,
    pub sample_rate_ms: Option<u64>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct FilteringConfig {
    pub channels: Option<Vec<u8>>,
    pub message_ids: Option<Vec<u32>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Csv,
    Json,
}

/// How CSV rows are produced
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum CsvMode {
    /// Every signal keeps its last value; rows are thinned by the sample rate
    #[default]
    Held,
    /// Only the signals of each frame, `nan` elsewhere, in a dated folder
    Sparse,
}

/// Load configuration from a TOML file
pub fn load_config(path: &Path) -> Result<AppConfig> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {:?}", path))?;

    let config: AppConfig = toml::from_str(&content)
        .with_context(|| format!("Failed to parse config file: {:?}", path))?;

    Ok(config)
}

impl AppConfig {
    /// Decoder settings derived from this configuration
    pub fn decoder_config(&self) -> DecoderConfig {
        let mut config = DecoderConfig::new()
            .with_header_lines(self.input.header_lines.unwrap_or(DEFAULT_HEADER_LINES));
        if let Some(channels) = &self.filtering.channels {
            config = config.with_channel_filter(channels.clone());
        }
        if let Some(ids) = &self.filtering.message_ids {
            config = config.with_message_filter(ids.clone());
        }
        config
    }
}
