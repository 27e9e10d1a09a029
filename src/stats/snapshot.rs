//! `OV_GNA_PLUGIN_STATS` text snapshots.
//!
//! ```text
//! OV_GNA_PLUGIN_STATS <layer_count>
//! <layer_index> <role_tag>: <sample_count> <min> <max> <sum> <sum_sq> <layer_name>
//! ```
//!
//! Data lines are layer-major, role-minor (`I O W B`). Loading is
//! all-or-nothing: the first malformed line rejects the whole file.

use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;

use thiserror::Error;
use tracing::debug;

use super::record::StatsRecord;
use super::role::TensorRole;
use super::store::StatisticsStore;
use super::trim_name;

/// Header magic of a statistics snapshot.
pub const SNAPSHOT_MAGIC: &str = "OV_GNA_PLUGIN_STATS";

/// Snapshot read/write errors.
#[derive(Error, Debug)]
pub enum SnapshotError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Snapshot is empty")]
    MissingHeader,

    #[error("Invalid snapshot header: {0:?}")]
    InvalidHeader(String),

    #[error("Snapshot truncated: expected {expected} data lines, found {found}")]
    Truncated { expected: usize, found: usize },

    #[error("Line {line}: expected layer index {expected}, found {found:?}")]
    LayerIndexMismatch {
        line: usize,
        expected: usize,
        found: String,
    },

    #[error("Line {line}: expected role tag '{expected}:', found {found:?}")]
    InvalidRole {
        line: usize,
        expected: char,
        found: String,
    },

    #[error("Line {line}: malformed {field} field {value:?}")]
    InvalidField {
        line: usize,
        field: &'static str,
        value: String,
    },
}

impl StatisticsStore {
    /// Write the snapshot to `path`, replacing any existing file.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), SnapshotError> {
        let path = path.as_ref();
        let mut writer = BufWriter::new(File::create(path)?);
        self.write_to(&mut writer)?;
        writer.flush()?;
        debug!(path = %path.display(), layers = self.layer_count(), "saved layer statistics");
        Ok(())
    }

    /// Write the snapshot text.
    pub fn write_to<W: Write>(&self, mut writer: W) -> Result<(), SnapshotError> {
        writeln!(writer, "{SNAPSHOT_MAGIC} {}", self.layer_count())?;
        for (layer, role, r) in self.rows() {
            writeln!(
                writer,
                "{layer} {}: {} {:.5} {:.5} {:.5} {:.5} {}",
                role.tag(),
                r.sample_count,
                r.min,
                r.max,
                r.sum,
                r.sum_sq,
                r.name
            )?;
        }
        Ok(())
    }

    /// Load a snapshot from `path`.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, SnapshotError> {
        let file = File::open(path.as_ref())?;
        Self::read_from(BufReader::new(file))
    }

    /// Parse snapshot text. Any error discards everything parsed so far.
    ///
    /// Records are buffered line by line and the store is only sized once
    /// every expected line has parsed, so a bogus header count cannot
    /// trigger a huge allocation.
    pub fn read_from<R: BufRead>(reader: R) -> Result<Self, SnapshotError> {
        let mut lines = reader.lines();
        let header = lines.next().ok_or(SnapshotError::MissingHeader)??;
        let layer_count = parse_header(&header)?;
        let expected = layer_count
            .checked_mul(TensorRole::ALL.len())
            .ok_or_else(|| SnapshotError::InvalidHeader(header.clone()))?;

        let mut records = Vec::new();
        for position in 0..expected {
            let line = lines
                .next()
                .ok_or(SnapshotError::Truncated { expected, found: position })??;
            let layer = position / TensorRole::ALL.len();
            let role = TensorRole::ALL[position % TensorRole::ALL.len()];
            // header is line 1
            records.push((layer, role, parse_record(&line, position + 2, layer, role)?));
        }

        let mut store = StatisticsStore::new(layer_count);
        for (layer, role, parsed) in records {
            if let Ok(slot) = store.record_mut(layer, role) {
                *slot = parsed;
            }
        }
        Ok(store)
    }
}

fn parse_header(header: &str) -> Result<usize, SnapshotError> {
    let invalid = || SnapshotError::InvalidHeader(header.to_string());
    let rest = header.strip_prefix(SNAPSHOT_MAGIC).ok_or_else(invalid)?;
    let count = rest.strip_prefix(' ').ok_or_else(invalid)?;
    match count.trim().parse::<usize>() {
        Ok(n) if n > 0 => Ok(n),
        _ => Err(invalid()),
    }
}

fn parse_record(
    line: &str,
    line_no: usize,
    layer: usize,
    role: TensorRole,
) -> Result<StatsRecord, SnapshotError> {
    let line = line.trim_end_matches(['\r', '\n']);
    let mut fields = line.splitn(8, ' ');

    let index = fields.next().unwrap_or_default();
    if index.parse::<usize>().ok() != Some(layer) {
        return Err(SnapshotError::LayerIndexMismatch {
            line: line_no,
            expected: layer,
            found: index.to_string(),
        });
    }

    let tag = fields.next().unwrap_or_default();
    let mut chars = tag.chars();
    let tag_ok = chars.next() == Some(role.tag()) && chars.next() == Some(':') && chars.next().is_none();
    if !tag_ok {
        return Err(SnapshotError::InvalidRole {
            line: line_no,
            expected: role.tag(),
            found: tag.to_string(),
        });
    }

    let sample_count = parse_field::<u64>(fields.next(), line_no, "sample_count")?;
    let min = parse_field::<f32>(fields.next(), line_no, "min")?;
    let max = parse_field::<f32>(fields.next(), line_no, "max")?;
    let sum = parse_field::<f64>(fields.next(), line_no, "sum")?;
    let sum_sq = parse_field::<f64>(fields.next(), line_no, "sum_sq")?;
    let name = trim_name(fields.next().unwrap_or_default()).to_string();

    Ok(StatsRecord { min, max, sum, sum_sq, sample_count, name })
}

fn parse_field<T: std::str::FromStr>(
    value: Option<&str>,
    line: usize,
    field: &'static str,
) -> Result<T, SnapshotError> {
    let value = value.unwrap_or_default();
    value.parse::<T>().map_err(|_| SnapshotError::InvalidField {
        line,
        field,
        value: value.to_string(),
    })
}
