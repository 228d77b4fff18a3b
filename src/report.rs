use std::fmt;
use std::fs;
use std::path::Path;

use chrono::{DateTime, Local};
use log::{error, info};
use serde::Serialize;

use crate::clock::Timestamp;
use crate::error::{OpenFieldError, Result};
use crate::session::SessionController;
use crate::zone::Zone;

/// Floor for the effective duration so percentages never divide by zero
pub const MIN_EFFECTIVE_SECS: f64 = 0.001;

pub const REPORT_HEADER: &str = "--- Open Field Test Report ---";

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ZoneShare {
    pub zone: Zone,
    pub seconds: f64,
    pub percent: f64,
}

/// Immutable summary of a session at the moment it was generated
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportRecord {
    pub animal_id: String,
    pub generated_at: DateTime<Local>,
    pub configured_secs: u32,
    pub effective_secs: f64,
    /// Always Corner, Lateral, Center in that order
    pub zones: Vec<ZoneShare>,
}

impl ReportRecord {
    pub fn zone(&self, zone: Zone) -> Option<&ZoneShare> {
        self.zones.iter().find(|z| z.zone == zone)
    }

    /// Pie chart series restricted to zones with recorded time.
    /// `None` means nothing was recorded and there is nothing to chart.
    pub fn pie_series(&self) -> Option<Vec<(Zone, f64)>> {
        let series: Vec<(Zone, f64)> = self
            .zones
            .iter()
            .filter(|z| z.seconds > 0.0)
            .map(|z| (z.zone, z.seconds))
            .collect();
        (!series.is_empty()).then_some(series)
    }

    pub fn to_text(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for ReportRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{REPORT_HEADER}")?;
        writeln!(f)?;
        writeln!(f, "Animal ID: {}", self.animal_id)?;
        writeln!(f, "Date/Time: {}", self.generated_at.format("%Y-%m-%d %H:%M:%S"))?;
        writeln!(f, "Programmed Test Duration: {} seconds", self.configured_secs)?;
        writeln!(f, "Effective Test Duration: {:.2} seconds", self.effective_secs)?;
        writeln!(f)?;
        writeln!(f, "Accumulated Time per Zone:")?;
        for share in &self.zones {
            writeln!(
                f,
                "  {}: {:.2} seconds ({:.2}%)",
                share.zone, share.seconds, share.percent
            )?;
        }
        writeln!(f)
    }
}

/// Summarize the current or last session. Reads state only.
pub fn generate(
    controller: &SessionController,
    now: Timestamp,
    generated_at: DateTime<Local>,
) -> Result<ReportRecord> {
    let session = controller.session().ok_or(OpenFieldError::NotStarted)?;
    let effective_secs = session.effective_secs(now).max(MIN_EFFECTIVE_SECS);
    let snapshot = controller.snapshot(session.stopped_at.unwrap_or(now));

    let zones = snapshot
        .iter()
        .map(|(zone, seconds)| ZoneShare {
            zone,
            seconds,
            percent: seconds / effective_secs * 100.0,
        })
        .collect();

    Ok(ReportRecord {
        animal_id: session.animal_id.clone(),
        generated_at,
        configured_secs: session.configured_secs,
        effective_secs,
        zones,
    })
}

/// Write report text verbatim to `path`
pub fn export<P: AsRef<Path>>(text: &str, path: P) -> Result<()> {
    let path = path.as_ref();
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|source| OpenFieldError::ExportIo {
            path: path.to_path_buf(),
            source,
        })?;
    }
    fs::write(path, text).map_err(|source| {
        error!("report export to {} failed: {source}", path.display());
        OpenFieldError::ExportIo {
            path: path.to_path_buf(),
            source,
        }
    })?;
    info!("report exported to {}", path.display());
    Ok(())
}

/// Default export file name, e.g. `openfield_A1_20261019_142501.txt`
pub fn default_file_name(animal_id: &str, at: DateTime<Local>) -> String {
    let safe_id: String = animal_id
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect();
    format!("openfield_{}_{}.txt", safe_id, at.format("%Y%m%d_%H%M%S"))
}
