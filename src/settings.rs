use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::{AppError, Result};

pub const SETTINGS_FILE: &str = "settings.toml";
pub const DEFAULT_BASE_URL: &str = "https://slack.com/api/";
pub const DEFAULT_PAGE_SIZE: u32 = 100;
pub const DEFAULT_MAX_PAGES: usize = 10_000;

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub export: ExportSettings,
    #[serde(default)]
    pub api: ApiSettings,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct ExportSettings {
    #[serde(rename = "output-dir")]
    pub output_dir: PathBuf,
    #[serde(rename = "page-size")]
    pub page_size: u32,
    /// Upper bound on requests per paginated listing; 0 disables the guard.
    #[serde(rename = "max-pages")]
    pub max_pages: usize,
    #[serde(rename = "skip-existing")]
    pub skip_existing: bool,
    #[serde(rename = "continue-on-error")]
    pub continue_on_error: bool,
}

impl Default for ExportSettings {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("."),
            page_size: DEFAULT_PAGE_SIZE,
            max_pages: DEFAULT_MAX_PAGES,
            skip_existing: false,
            continue_on_error: false,
        }
    }
}

impl ExportSettings {
    pub fn max_pages(&self) -> Option<usize> {
        (self.max_pages > 0).then_some(self.max_pages)
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct ApiSettings {
    #[serde(rename = "base-url")]
    pub base_url: String,
    #[serde(rename = "max-retries")]
    pub max_retries: u32,
    /// Used when a 429 response carries no usable Retry-After header.
    #[serde(rename = "retry-after-secs")]
    pub retry_after_secs: u64,
    #[serde(rename = "timeout-secs")]
    pub timeout_secs: u64,
}

impl Default for ApiSettings {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            max_retries: 5,
            retry_after_secs: 30,
            timeout_secs: 60,
        }
    }
}

impl Settings {
    /// Loads settings from `path`, falling back to defaults when the file is absent.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path).map_err(|e| AppError::ReadFile {
            path: path.display().to_string(),
            source: e,
        })?;

        Self::parse(&content)
    }

    pub fn parse(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| AppError::TomlParse(e.to_string()))
    }
}
