//! Saved diffusivities of a profile.
//!
//! A profile keeps one record for the bulk signal and four per absorption
//! peak. The JSON layout is a flat array of `[log10 D, error, maximum]`
//! triples: bulk whole-block area, bulk area, then for every peak its
//! whole-block area, area, whole-block height and height. Reading and
//! writing the file is left to the caller.

use serde::{Deserialize, Serialize};

use crate::error::{DiffusionError, Result};
use crate::fit::ProfileFit;

/// Fitted diffusivity with its error and the value the data were scaled to.
///
/// Missing entries are `null` in JSON.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(from = "(Option<f64>, Option<f64>, Option<f64>)", into = "(Option<f64>, Option<f64>, Option<f64>)")]
pub struct DiffusivityRecord {
    /// log10 m²/s
    pub log10_d: Option<f64>,
    pub error: Option<f64>,
    pub scaling_max: Option<f64>,
}

impl DiffusivityRecord {
    pub fn new(log10_d: f64, error: f64, scaling_max: f64) -> Self {
        Self {
            log10_d: Some(log10_d),
            error: Some(error),
            scaling_max: Some(scaling_max),
        }
    }
}

impl From<(Option<f64>, Option<f64>, Option<f64>)> for DiffusivityRecord {
    fn from((log10_d, error, scaling_max): (Option<f64>, Option<f64>, Option<f64>)) -> Self {
        Self {
            log10_d,
            error,
            scaling_max,
        }
    }
}

impl From<DiffusivityRecord> for (Option<f64>, Option<f64>, Option<f64>) {
    fn from(record: DiffusivityRecord) -> Self {
        (record.log10_d, record.error, record.scaling_max)
    }
}

impl From<&ProfileFit> for DiffusivityRecord {
    fn from(fit: &ProfileFit) -> Self {
        Self {
            log10_d: Some(fit.log10_diffusivity),
            error: fit.log10_diffusivity_stderr,
            scaling_max: Some(fit.initial_value),
        }
    }
}

/// The four records kept for one absorption peak.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PeakRecords {
    pub area_wb: DiffusivityRecord,
    pub area: DiffusivityRecord,
    pub height_wb: DiffusivityRecord,
    pub height: DiffusivityRecord,
}

/// Every saved diffusivity of one profile.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(try_from = "Vec<DiffusivityRecord>", into = "Vec<DiffusivityRecord>")]
pub struct DiffusivityTable {
    pub area_wb: DiffusivityRecord,
    pub area: DiffusivityRecord,
    pub peaks: Vec<PeakRecords>,
}

impl DiffusivityTable {
    /// Empty records for a profile with `peaks` absorption peaks.
    pub fn with_peaks(peaks: usize) -> Self {
        Self {
            peaks: vec![PeakRecords::default(); peaks],
            ..Self::default()
        }
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn from_json(json: &str) -> Result<Self> {
        let rows: Vec<DiffusivityRecord> = serde_json::from_str(json)?;
        Self::try_from(rows).map_err(DiffusionError::InvalidInput)
    }
}

impl TryFrom<Vec<DiffusivityRecord>> for DiffusivityTable {
    type Error = String;

    fn try_from(rows: Vec<DiffusivityRecord>) -> std::result::Result<Self, Self::Error> {
        if rows.len() < 2 || (rows.len() - 2) % 4 != 0 {
            return Err(format!(
                "expected 2 bulk rows and 4 rows per peak, got {} rows",
                rows.len()
            ));
        }
        let peaks = rows[2..]
            .chunks_exact(4)
            .map(|chunk| PeakRecords {
                area_wb: chunk[0],
                area: chunk[1],
                height_wb: chunk[2],
                height: chunk[3],
            })
            .collect();
        Ok(Self {
            area_wb: rows[0],
            area: rows[1],
            peaks,
        })
    }
}

impl From<DiffusivityTable> for Vec<DiffusivityRecord> {
    fn from(table: DiffusivityTable) -> Self {
        let mut rows = Vec::with_capacity(2 + 4 * table.peaks.len());
        rows.push(table.area_wb);
        rows.push(table.area);
        for peak in &table.peaks {
            rows.extend([peak.area_wb, peak.area, peak.height_wb, peak.height]);
        }
        rows
    }
}
