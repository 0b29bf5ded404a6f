//! CSV test log
//!
//! One header line, then one row per record tick:
//!
//! ```text
//! Time(s),CH0_Vol(V),...,CH3_Hydraulic_Pressure,sigma_a(kPa),...,Volume Percentage(%)
//! 12.001,0.412,...
//! ```
//!
//! Time is seconds since recording started. Non-finite metrics (no water
//! in the drain tank yet) are written as `NaN`/`inf`.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use triax_core::constants::acquisition::CHANNEL_COUNT;
use triax_core::{Channel, DerivedMetrics};

use crate::error::StationResult;

/// Metric column headings, in [`DerivedMetrics::as_array`] order
pub const METRIC_LABELS: [&str; 5] = [
    "sigma_a(kPa)",
    "epsilon_a(%)",
    "Discharged Volume(mm3)",
    "Discharged Water(mm3)",
    "Volume Percentage(%)",
];

/// Column count of every row
pub const COLUMN_COUNT: usize = 1 + 2 * CHANNEL_COUNT + METRIC_LABELS.len();

/// Header line, without the trailing newline
pub fn header() -> String {
    let mut columns = Vec::with_capacity(COLUMN_COUNT);
    columns.push("Time(s)");
    columns.extend(Channel::ALL.iter().map(|c| c.input_label()));
    columns.extend(Channel::ALL.iter().map(|c| c.physical_label()));
    columns.extend(METRIC_LABELS);
    columns.join(",")
}

/// Open log file
pub struct CsvRecorder {
    path: PathBuf,
    out: BufWriter<File>,
    rows: u64,
}

impl CsvRecorder {
    /// Create or truncate `path` and write the header
    pub fn create(path: impl AsRef<Path>) -> StationResult<Self> {
        let path = path.as_ref().to_path_buf();
        let mut out = BufWriter::new(File::create(&path)?);
        writeln!(out, "{}", header())?;
        out.flush()?;
        Ok(Self { path, out, rows: 0 })
    }

    /// Append one row and flush it to disk
    pub fn write_row(
        &mut self,
        time_s: f64,
        inputs: &[f32; CHANNEL_COUNT],
        physicals: &[f32; CHANNEL_COUNT],
        metrics: &DerivedMetrics,
    ) -> StationResult<()> {
        write!(self.out, "{}", time_s)?;
        for value in inputs.iter().chain(physicals.iter()).chain(metrics.as_array().iter()) {
            write!(self.out, ",{}", value)?;
        }
        writeln!(self.out)?;
        self.out.flush()?;
        self.rows += 1;
        Ok(())
    }

    /// Rows written so far
    pub fn rows(&self) -> u64 {
        self.rows
    }

    /// File being written
    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn header_matches_log_format() {
        assert_eq!(
            header(),
            "Time(s),CH0_Vol(V),CH1_Vol(V),CH2_Vol(V),CH3_Vol(V),\
             CH0_Load_Cell_(Odo),CH1_Displacement_Gauge,CH2_Load_Cell_(Tank),\
             CH3_Hydraulic_Pressure,sigma_a(kPa),epsilon_a(%),Discharged Volume(mm3),\
             Discharged Water(mm3),Volume Percentage(%)"
        );
        assert_eq!(header().split(',').count(), COLUMN_COUNT);
    }

    #[test]
    fn rows_have_every_column() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("run.csv");
        let mut recorder = CsvRecorder::create(&path).unwrap();

        let metrics = DerivedMetrics { volume_percentage: f32::NAN, ..DerivedMetrics::default() };
        recorder.write_row(1.5, &[1.0, 2.0, 3.0, 4.0], &[5.0, 6.0, 7.0, 8.0], &metrics).unwrap();

        let text = fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 2);
        let row: Vec<&str> = lines[1].split(',').collect();
        assert_eq!(row.len(), COLUMN_COUNT);
        assert_eq!(row[0], "1.5");
        assert_eq!(row[8], "8");
        assert_eq!(row[13], "NaN");
        assert_eq!(recorder.rows(), 1);
    }

    #[test]
    fn create_truncates() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("run.csv");
        fs::write(&path, "old contents\n").unwrap();

        CsvRecorder::create(&path).unwrap();
        let text = fs::read_to_string(&path).unwrap();
        assert_eq!(text, format!("{}\n", header()));
    }
}
