//! Binary snapshots of a production line.
//!
//! A snapshot is the whole line (belt, workers, counters, clock, source and
//! priority generator state) encoded with `bitcode` behind a versioned
//! header. Loading a snapshot and running it continues exactly where the
//! original left off.

use crate::line::ProductionLine;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Magic number identifying a production line snapshot.
pub const SNAPSHOT_MAGIC: u32 = 0xC0B7_0001;

/// Current format version. Increment when breaking the wire format.
pub const FORMAT_VERSION: u32 = 1;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum SnapshotError {
    #[error("bitcode encoding failed: {0}")]
    Encode(String),
    #[error("bitcode decoding failed: {0}")]
    Decode(String),
    #[error("invalid magic number: expected 0x{:08X}, got 0x{:08X}", SNAPSHOT_MAGIC, .0)]
    InvalidMagic(u32),
    #[error("unsupported format version: expected {}, got {}", FORMAT_VERSION, .0)]
    UnsupportedVersion(u32),
    #[error("snapshot from future version {0} (this build supports up to {FORMAT_VERSION})")]
    FutureVersion(u32),
    #[error("snapshot header says timeslot {header}, line says {line}")]
    TimeslotMismatch { header: u64, line: u64 },
    #[error("snapshot holds an inconsistent line")]
    Inconsistent,
}

// ---------------------------------------------------------------------------
// Header
// ---------------------------------------------------------------------------

/// Header prepended to every snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnapshotHeader {
    pub magic: u32,
    pub version: u32,
    /// Timeslots the line had run when the snapshot was taken.
    pub timeslot: u64,
}

impl SnapshotHeader {
    pub fn new(timeslot: u64) -> Self {
        Self {
            magic: SNAPSHOT_MAGIC,
            version: FORMAT_VERSION,
            timeslot,
        }
    }

    pub fn validate(&self) -> Result<(), SnapshotError> {
        if self.magic != SNAPSHOT_MAGIC {
            return Err(SnapshotError::InvalidMagic(self.magic));
        }
        if self.version > FORMAT_VERSION {
            return Err(SnapshotError::FutureVersion(self.version));
        }
        if self.version < FORMAT_VERSION {
            return Err(SnapshotError::UnsupportedVersion(self.version));
        }
        Ok(())
    }
}

// Borrowed and owned forms share one wire layout.
#[derive(Serialize)]
struct SnapshotRef<'a, S, R> {
    header: SnapshotHeader,
    line: &'a ProductionLine<S, R>,
}

#[derive(Deserialize)]
struct Snapshot<S, R> {
    header: SnapshotHeader,
    line: ProductionLine<S, R>,
}

// ---------------------------------------------------------------------------
// Save / load
// ---------------------------------------------------------------------------

/// Encode `line` into a snapshot.
pub fn save<S: Serialize, R: Serialize>(line: &ProductionLine<S, R>) -> Result<Vec<u8>, SnapshotError> {
    let snapshot = SnapshotRef {
        header: SnapshotHeader::new(line.timeslot()),
        line,
    };
    bitcode::serialize(&snapshot).map_err(|e| SnapshotError::Encode(e.to_string()))
}

/// Decode a snapshot taken by [`save`], checking its header and the
/// consistency of the decoded line.
pub fn load<S: DeserializeOwned, R: DeserializeOwned>(
    data: &[u8],
) -> Result<ProductionLine<S, R>, SnapshotError> {
    let snapshot: Snapshot<S, R> =
        bitcode::deserialize(data).map_err(|e| SnapshotError::Decode(e.to_string()))?;
    snapshot.header.validate()?;
    let line = snapshot.line;
    if snapshot.header.timeslot != line.timeslot() {
        return Err(SnapshotError::TimeslotMismatch {
            header: snapshot.header.timeslot,
            line: line.timeslot(),
        });
    }
    if !line.is_well_formed() {
        return Err(SnapshotError::Inconsistent);
    }
    Ok(line)
}
