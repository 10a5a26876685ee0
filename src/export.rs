//! Writing parsed data for plotting and processing tools.

use std::fs::File;
use std::io::BufWriter;
use std::path::Path;
use std::str::FromStr;
use std::sync::Arc;

use anyhow::{Context, Result};
use arrow::array::{ArrayRef, Float64Array, Int64Array, UInt32Array};
use arrow::datatypes::{Field, Schema};
use arrow::record_batch::RecordBatch;
use parquet::arrow::ArrowWriter;
use serde::Serialize;

use crate::data::model::{Sip256Log, SpectrumRecord};
use crate::error::SipError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Csv,
    Json,
    Parquet,
}

impl ExportFormat {
    /// Guess the format from an output file extension.
    pub fn from_path(path: &Path) -> Option<Self> {
        path.extension()?.to_str()?.parse().ok()
    }
}

impl FromStr for ExportFormat {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "csv" => Ok(ExportFormat::Csv),
            "json" => Ok(ExportFormat::Json),
            "parquet" | "pq" => Ok(ExportFormat::Parquet),
            other => Err(format!("unknown export format: {other}")),
        }
    }
}

// ---------------------------------------------------------------------------
// Flat rows
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
struct SpectrumRow {
    frequency: f64,
    amplitude: f64,
    phase: f64,
    amplitude_error: Option<f64>,
    phase_error: Option<f64>,
}

fn spectrum_rows(record: &SpectrumRecord) -> Vec<SpectrumRow> {
    (0..record.len())
        .map(|i| SpectrumRow {
            frequency: record.frequency()[i],
            amplitude: record.amplitude()[i],
            phase: record.phase()[i],
            amplitude_error: record.amplitude_error().map(|e| e[i]),
            phase_error: record.phase_error().map(|e| e[i]),
        })
        .collect()
}

/// One sweep sample with the reading and remote unit it belongs to.
#[derive(Debug, Serialize)]
struct SweepRecord {
    reading: i64,
    electrode_a: Option<u32>,
    electrode_b: Option<u32>,
    remote_unit: Option<u32>,
    frequency: f64,
    resistance: f64,
    phase: f64,
    resistance_error: f64,
    phase_error: f64,
    calibrated: f64,
    current: f64,
    k_factor: f64,
    gain: Option<f64>,
    timestamp: i64,
}

fn sweep_records(log: &Sip256Log) -> Vec<SweepRecord> {
    let mut out = Vec::with_capacity(log.row_count());
    for reading in &log.readings {
        for unit in &reading.remote_units {
            for row in &unit.rows {
                out.push(SweepRecord {
                    reading: reading.number,
                    electrode_a: reading.electrodes.map(|e| e.a),
                    electrode_b: reading.electrodes.map(|e| e.b),
                    remote_unit: unit.id,
                    frequency: row.frequency,
                    resistance: row.resistance,
                    phase: row.phase,
                    resistance_error: row.resistance_error,
                    phase_error: row.phase_error,
                    calibrated: row.calibrated,
                    current: row.current,
                    k_factor: row.k_factor,
                    gain: row.gain,
                    timestamp: row.timestamp,
                });
            }
        }
    }
    out
}

// ---------------------------------------------------------------------------
// Public entry-points
// ---------------------------------------------------------------------------

/// Write one spectrum.
pub fn export_spectrum(
    record: &SpectrumRecord,
    path: &Path,
    format: ExportFormat,
) -> std::result::Result<(), SipError> {
    let result = match format {
        ExportFormat::Csv => write_csv(path, &spectrum_rows(record)),
        ExportFormat::Json => write_json(path, record),
        ExportFormat::Parquet => write_parquet(path, spectrum_columns(record)),
    };
    result.map_err(|source| SipError::Export {
        path: path.to_path_buf(),
        source,
    })
}

/// Write a SIP256 log. CSV and Parquet get one row per sweep sample; JSON
/// keeps the header and the nesting.
pub fn export_sip256(
    log: &Sip256Log,
    path: &Path,
    format: ExportFormat,
) -> std::result::Result<(), SipError> {
    let result = match format {
        ExportFormat::Csv => write_csv(path, &sweep_records(log)),
        ExportFormat::Json => write_json(path, log),
        ExportFormat::Parquet => write_parquet(path, sweep_columns(&sweep_records(log))),
    };
    result.map_err(|source| SipError::Export {
        path: path.to_path_buf(),
        source,
    })
}

// ---------------------------------------------------------------------------
// Writers
// ---------------------------------------------------------------------------

fn write_csv<T: Serialize>(path: &Path, rows: &[T]) -> Result<()> {
    let mut writer = csv::Writer::from_path(path).context("creating CSV file")?;
    for row in rows {
        writer.serialize(row).context("writing CSV row")?;
    }
    writer.flush().context("flushing CSV file")?;
    Ok(())
}

fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let file = File::create(path).context("creating JSON file")?;
    serde_json::to_writer_pretty(BufWriter::new(file), value).context("writing JSON")?;
    Ok(())
}

fn spectrum_columns(record: &SpectrumRecord) -> Vec<(&'static str, ArrayRef)> {
    let mut columns: Vec<(&'static str, ArrayRef)> = vec![
        ("frequency", Arc::new(Float64Array::from(record.frequency().to_vec())) as ArrayRef),
        ("amplitude", Arc::new(Float64Array::from(record.amplitude().to_vec())) as ArrayRef),
        ("phase", Arc::new(Float64Array::from(record.phase().to_vec())) as ArrayRef),
    ];
    if let Some(errors) = record.amplitude_error() {
        columns.push(("amplitude_error", Arc::new(Float64Array::from(errors.to_vec())) as ArrayRef));
    }
    if let Some(errors) = record.phase_error() {
        columns.push(("phase_error", Arc::new(Float64Array::from(errors.to_vec())) as ArrayRef));
    }
    columns
}

fn sweep_columns(rows: &[SweepRecord]) -> Vec<(&'static str, ArrayRef)> {
    fn f64s(rows: &[SweepRecord], get: impl Fn(&SweepRecord) -> f64) -> ArrayRef {
        Arc::new(Float64Array::from(rows.iter().map(get).collect::<Vec<_>>()))
    }
    fn ids(rows: &[SweepRecord], get: impl Fn(&SweepRecord) -> Option<u32>) -> ArrayRef {
        Arc::new(UInt32Array::from(rows.iter().map(get).collect::<Vec<_>>()))
    }

    vec![
        (
            "reading",
            Arc::new(Int64Array::from(rows.iter().map(|r| r.reading).collect::<Vec<_>>())) as ArrayRef,
        ),
        ("electrode_a", ids(rows, |r| r.electrode_a)),
        ("electrode_b", ids(rows, |r| r.electrode_b)),
        ("remote_unit", ids(rows, |r| r.remote_unit)),
        ("frequency", f64s(rows, |r| r.frequency)),
        ("resistance", f64s(rows, |r| r.resistance)),
        ("phase", f64s(rows, |r| r.phase)),
        ("resistance_error", f64s(rows, |r| r.resistance_error)),
        ("phase_error", f64s(rows, |r| r.phase_error)),
        ("calibrated", f64s(rows, |r| r.calibrated)),
        ("current", f64s(rows, |r| r.current)),
        ("k_factor", f64s(rows, |r| r.k_factor)),
        (
            "gain",
            Arc::new(Float64Array::from(rows.iter().map(|r| r.gain).collect::<Vec<_>>())) as ArrayRef,
        ),
        (
            "timestamp",
            Arc::new(Int64Array::from(rows.iter().map(|r| r.timestamp).collect::<Vec<_>>())) as ArrayRef,
        ),
    ]
}

fn write_parquet(path: &Path, columns: Vec<(&'static str, ArrayRef)>) -> Result<()> {
    let fields: Vec<Field> = columns
        .iter()
        .map(|(name, array)| Field::new(*name, array.data_type().clone(), array.null_count() > 0))
        .collect();
    let schema = Arc::new(Schema::new(fields));
    let arrays = columns.into_iter().map(|(_, array)| array).collect();
    let batch = RecordBatch::try_new(schema.clone(), arrays).context("building record batch")?;

    let file = File::create(path).context("creating parquet file")?;
    let mut writer = ArrowWriter::try_new(file, schema, None).context("creating parquet writer")?;
    writer.write(&batch).context("writing parquet batch")?;
    writer.close().context("closing parquet writer")?;
    Ok(())
}
