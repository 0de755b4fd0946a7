//! Line configuration and loading from RON, TOML or JSON files.
//!
//! Parts are written as single characters (`'A'` in RON, `"A"` in TOML and
//! JSON). Every field has a default, so an empty file describes the classic
//! line: one slot, workers with two arms turning one `A` and one `B` into a
//! `P`, and a source that draws `A`, `B` or nothing with equal probability.

use crate::belt::BeltError;
use crate::id::PartId;
use crate::source::SourceError;
use crate::worker::{Worker, WorkerError};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

// ===========================================================================
// Errors
// ===========================================================================

/// Errors that can occur while loading or validating a configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error(transparent)]
    Belt(#[from] BeltError),

    #[error(transparent)]
    Worker(#[from] WorkerError),

    #[error(transparent)]
    Source(#[from] SourceError),

    /// The file has an extension we don't support.
    #[error("unsupported format for file: {file}")]
    UnsupportedFormat { file: PathBuf },

    /// A deserialization error occurred.
    #[error("parse error in {origin}: {detail}")]
    Parse { origin: String, detail: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

// ===========================================================================
// Format detection
// ===========================================================================

/// Supported configuration formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Ron,
    Toml,
    Json,
}

/// Detect the format of a file based on its extension.
pub fn detect_format(path: &Path) -> Result<Format, ConfigError> {
    match path.extension().and_then(|e| e.to_str()) {
        Some("ron") => Ok(Format::Ron),
        Some("toml") => Ok(Format::Toml),
        Some("json") => Ok(Format::Json),
        _ => Err(ConfigError::UnsupportedFormat {
            file: path.to_path_buf(),
        }),
    }
}

// ===========================================================================
// Schema
// ===========================================================================

/// One input requirement of a worker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct QuotaSpec {
    pub part: char,
    pub quantity: u32,
}

/// How every worker on the line is built.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct WorkerSpec {
    pub arms: u32,
    pub quotas: Vec<QuotaSpec>,
    pub product: char,
}

impl Default for WorkerSpec {
    fn default() -> Self {
        Self {
            arms: 2,
            quotas: vec![
                QuotaSpec { part: 'A', quantity: 1 },
                QuotaSpec { part: 'B', quantity: 1 },
            ],
            product: 'P',
        }
    }
}

impl WorkerSpec {
    pub fn product(&self) -> PartId {
        PartId::from_char(self.product)
    }

    pub fn quotas(&self) -> impl Iterator<Item = (PartId, u32)> + '_ {
        self.quotas.iter().map(|q| (PartId::from_char(q.part), q.quantity))
    }

    /// Build an idle worker with the given assembly duration.
    pub fn build(&self, assembly_duration: u32) -> Result<Worker, WorkerError> {
        Worker::new(self.arms, self.quotas(), self.product(), assembly_duration)
    }
}

/// Everything needed to build a [`ProductionLine`](crate::line::ProductionLine).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LineConfig {
    /// Number of belt slots (and of worker pairs).
    pub capacity: usize,
    /// Timeslots an assembly takes.
    pub assembly_duration: u32,
    /// Seed for the item source and the priority draws.
    pub seed: u64,
    /// Parts the source may inject.
    pub raw_parts: Vec<char>,
    /// Whether "no item" is one of the source's outcomes.
    pub empty_possible: bool,
    pub worker: WorkerSpec,
}

impl Default for LineConfig {
    fn default() -> Self {
        Self {
            capacity: 1,
            assembly_duration: 0,
            seed: 0,
            raw_parts: vec!['A', 'B'],
            empty_possible: true,
            worker: WorkerSpec::default(),
        }
    }
}

impl LineConfig {
    /// Default configuration with the given belt size and assembly duration.
    pub fn new(capacity: usize, assembly_duration: u32) -> Self {
        Self {
            capacity,
            assembly_duration,
            ..Self::default()
        }
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn raw_parts(&self) -> Vec<PartId> {
        self.raw_parts.iter().map(|&c| PartId::from_char(c)).collect()
    }

    /// Check every constraint the line constructor enforces, without
    /// building anything.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.capacity == 0 {
            return Err(BeltError::ZeroCapacity.into());
        }
        self.worker.build(self.assembly_duration)?;
        if self.raw_parts.is_empty() && !self.empty_possible {
            return Err(SourceError::NoOutcomes.into());
        }
        Ok(())
    }

    /// Parse a configuration from text in the given format.
    pub fn parse(text: &str, format: Format) -> Result<Self, ConfigError> {
        Self::parse_named(text, format, "<inline>")
    }

    /// Load and validate a configuration file; the format follows the
    /// extension.
    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let format = detect_format(path)?;
        let text = std::fs::read_to_string(path)?;
        let config = Self::parse_named(&text, format, &path.display().to_string())?;
        config.validate()?;
        Ok(config)
    }

    fn parse_named(text: &str, format: Format, origin: &str) -> Result<Self, ConfigError> {
        let parse_err = |detail: String| ConfigError::Parse {
            origin: origin.to_string(),
            detail,
        };
        match format {
            Format::Ron => ron::from_str(text).map_err(|e| parse_err(e.to_string())),
            Format::Toml => toml::from_str(text).map_err(|e| parse_err(e.to_string())),
            Format::Json => serde_json::from_str(text).map_err(|e| parse_err(e.to_string())),
        }
    }
}
