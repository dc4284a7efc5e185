//! Pacman mirror list refresh through reflector
//!
//! `MirrorOptions` holds the user's choices and turns them into the
//! privileged reflector invocation. `log` parses reflector's verbose output
//! into rows as it streams in.

pub mod commands;
pub mod log;

use clap::ValueEnum;
use serde::Serialize;
use std::path::PathBuf;
use thiserror::Error;

use crate::common::shell::join_words;

pub const MIRRORLIST_PATH: &str = "/etc/pacman.d/mirrorlist";

pub const LATEST_RANGE: std::ops::RangeInclusive<u32> = 1..=20;
pub const DOWNLOAD_TIMEOUT_RANGE: std::ops::RangeInclusive<u32> = 5..=60;

/// Countries offered as suggestions when picking mirrors
pub const SUGGESTED_COUNTRIES: [&str; 10] = [
    "United States",
    "Brazil",
    "Japan",
    "Sweden",
    "France",
    "Norway",
    "India",
    "Australia",
    "China",
    "United Kingdom",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Protocol {
    Https,
    Http,
}

impl Protocol {
    pub fn as_str(self) -> &'static str {
        match self {
            Protocol::Https => "https",
            Protocol::Http => "http",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum SortKey {
    Rate,
    Age,
    Score,
    Delay,
    Country,
}

impl SortKey {
    pub fn as_str(self) -> &'static str {
        match self {
            SortKey::Rate => "rate",
            SortKey::Age => "age",
            SortKey::Score => "score",
            SortKey::Delay => "delay",
            SortKey::Country => "country",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MirrorOptionsError {
    #[error("select at least one country")]
    NoCountry,
    #[error("select at least one protocol")]
    NoProtocol,
    #[error("--latest must be between 1 and 20, got {0}")]
    LatestOutOfRange(u32),
    #[error("--download-timeout must be between 5 and 60 seconds, got {0}")]
    TimeoutOutOfRange(u32),
    #[error("country names may not contain commas: {0}")]
    InvalidCountry(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MirrorOptions {
    pub countries: Vec<String>,
    pub protocols: Vec<Protocol>,
    pub latest: u32,
    pub sort: SortKey,
    pub download_timeout: u32,
    pub save_path: PathBuf,
    pub privilege_helper: String,
}

impl Default for MirrorOptions {
    fn default() -> Self {
        Self {
            countries: Vec::new(),
            protocols: vec![Protocol::Https],
            latest: 5,
            sort: SortKey::Rate,
            download_timeout: 10,
            save_path: PathBuf::from(MIRRORLIST_PATH),
            privilege_helper: "pkexec".to_string(),
        }
    }
}

impl MirrorOptions {
    pub fn validate(&self) -> Result<(), MirrorOptionsError> {
        if self.countries.iter().all(|c| c.trim().is_empty()) {
            return Err(MirrorOptionsError::NoCountry);
        }
        if let Some(bad) = self.countries.iter().find(|c| c.contains(',')) {
            return Err(MirrorOptionsError::InvalidCountry(bad.clone()));
        }
        if self.protocols.is_empty() {
            return Err(MirrorOptionsError::NoProtocol);
        }
        if !LATEST_RANGE.contains(&self.latest) {
            return Err(MirrorOptionsError::LatestOutOfRange(self.latest));
        }
        if !DOWNLOAD_TIMEOUT_RANGE.contains(&self.download_timeout) {
            return Err(MirrorOptionsError::TimeoutOutOfRange(self.download_timeout));
        }
        Ok(())
    }

    /// Trimmed country names, blanks and repeats removed, in input order
    pub fn unique_countries(&self) -> Vec<&str> {
        let mut countries: Vec<&str> = Vec::new();
        for country in self.countries.iter().map(|c| c.trim()) {
            if !country.is_empty() && !countries.contains(&country) {
                countries.push(country);
            }
        }
        countries
    }

    /// Full argv, starting with the privilege helper
    pub fn to_args(&self) -> Result<Vec<String>, MirrorOptionsError> {
        self.validate()?;

        let countries = self.unique_countries();

        let mut protocols: Vec<&str> = Vec::new();
        for protocol in &self.protocols {
            if !protocols.contains(&protocol.as_str()) {
                protocols.push(protocol.as_str());
            }
        }

        Ok(vec![
            self.privilege_helper.clone(),
            "reflector".to_string(),
            "--country".to_string(),
            countries.join(","),
            "--protocol".to_string(),
            protocols.join(","),
            "--latest".to_string(),
            self.latest.to_string(),
            "--sort".to_string(),
            self.sort.as_str().to_string(),
            "--download-timeout".to_string(),
            self.download_timeout.to_string(),
            "--save".to_string(),
            self.save_path.to_string_lossy().into_owned(),
            "--verbose".to_string(),
        ])
    }

    /// Quoted shell command line for the refresh
    pub fn command_line(&self) -> Result<String, MirrorOptionsError> {
        Ok(join_words(&self.to_args()?))
    }
}
