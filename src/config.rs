use std::path::Path;

use anyhow::Context as _;
use serde::{Deserialize, Serialize};

use crate::markdown::LinkMode;

pub const LINK_MODE_ENV: &str = "BIOSITE_LINK_MODE";

/// Site settings read from an optional YAML file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SiteConfig {
    pub title: String,
    pub link_mode: LinkMode,
    pub files: DataFiles,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            title: "Биографии и встречи".to_owned(),
            link_mode: LinkMode::default(),
            files: DataFiles::default(),
        }
    }
}

/// JSON data files, relative to the data directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DataFiles {
    pub biography: String,
    pub meetings: String,
    pub books: String,
    pub places: String,
    pub index: String,
    pub materials: String,
}

impl Default for DataFiles {
    fn default() -> Self {
        Self {
            biography: "data/biography.json".to_owned(),
            meetings: "data/meetings.json".to_owned(),
            books: "data/books.json".to_owned(),
            places: "data/places.json".to_owned(),
            index: "data/index.json".to_owned(),
            materials: "data/materials.json".to_owned(),
        }
    }
}

impl SiteConfig {
    /// Read `path`, or return the defaults when no file is given.
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        let yaml = std::fs::read_to_string(path)
            .with_context(|| format!("read config: {}", path.display()))?;
        serde_yaml::from_str(&yaml).with_context(|| format!("parse config: {}", path.display()))
    }

    /// Apply environment overrides.
    pub fn apply_env(&mut self) {
        if let Ok(value) = std::env::var(LINK_MODE_ENV) {
            match parse_link_mode(&value) {
                Some(mode) => self.link_mode = mode,
                None => tracing::warn!(value = %value, "ignoring unknown {LINK_MODE_ENV}"),
            }
        }
    }
}

pub fn parse_link_mode(value: &str) -> Option<LinkMode> {
    <LinkMode as clap::ValueEnum>::from_str(value.trim(), true).ok()
}
