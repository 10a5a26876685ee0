use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;

use crate::error::Diagnostic;

// ---------------------------------------------------------------------------
// HeaderValue – one entry of a file header
// ---------------------------------------------------------------------------

/// Value of a bracketed header entry or of a `[Begin X]` … `[End X]` block.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum HeaderValue {
    Integer(i64),
    Float(f64),
    /// Rows collected inside a block. Rows are kept as read, so the matrix
    /// may be ragged; check [`HeaderValue::is_rectangular`] before indexing.
    Matrix(Vec<Vec<f64>>),
}

impl HeaderValue {
    /// Scalar entries as `f64`; `None` for matrices.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            HeaderValue::Float(v) => Some(*v),
            HeaderValue::Integer(i) => Some(*i as f64),
            HeaderValue::Matrix(_) => None,
        }
    }

    pub fn as_matrix(&self) -> Option<&[Vec<f64>]> {
        match self {
            HeaderValue::Matrix(rows) => Some(rows),
            _ => None,
        }
    }

    /// True for scalars and for matrices whose rows all have the same width.
    pub fn is_rectangular(&self) -> bool {
        match self {
            HeaderValue::Matrix(rows) => rows.windows(2).all(|w| w[0].len() == w[1].len()),
            _ => true,
        }
    }
}

impl fmt::Display for HeaderValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HeaderValue::Integer(i) => write!(f, "{i}"),
            HeaderValue::Float(v) => write!(f, "{v}"),
            HeaderValue::Matrix(rows) => {
                let width = rows.first().map_or(0, Vec::len);
                write!(f, "<{}x{} matrix>", rows.len(), width)
            }
        }
    }
}

/// Flattened file header: block names and scalar tokens share one namespace.
pub type HeaderBlock = BTreeMap<String, HeaderValue>;

// ---------------------------------------------------------------------------
// SpectrumRecord – a single frequency sweep
// ---------------------------------------------------------------------------

/// How the phase column of a [`SpectrumRecord`] is expressed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum PhaseConvention {
    /// As written by Fuchs-family devices: degrees, positive when leading.
    DeviceDegrees,
    /// Negative values lead. Device degrees are converted to radians when a
    /// record is normalized; the delimited-text dialect is only negated.
    Normalized,
}

/// One sample handed to [`SpectrumRecord::push`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sample {
    pub frequency: f64,
    pub amplitude: f64,
    pub phase: f64,
    pub amplitude_error: Option<f64>,
    pub phase_error: Option<f64>,
}

impl Sample {
    pub fn new(frequency: f64, amplitude: f64, phase: f64) -> Self {
        Sample {
            frequency,
            amplitude,
            phase,
            amplitude_error: None,
            phase_error: None,
        }
    }

    pub fn with_errors(mut self, amplitude_error: f64, phase_error: f64) -> Self {
        self.amplitude_error = Some(amplitude_error);
        self.phase_error = Some(phase_error);
        self
    }
}

/// Frequency, amplitude and phase columns of one spectrum.
///
/// Columns are private so that every column always has the same length.
/// Frequencies keep the order the device wrote them in.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SpectrumRecord {
    frequency: Vec<f64>,
    amplitude: Vec<f64>,
    phase: Vec<f64>,
    amplitude_error: Option<Vec<f64>>,
    phase_error: Option<Vec<f64>>,
    convention: PhaseConvention,
}

impl SpectrumRecord {
    pub fn new(convention: PhaseConvention) -> Self {
        SpectrumRecord {
            frequency: Vec::new(),
            amplitude: Vec::new(),
            phase: Vec::new(),
            amplitude_error: None,
            phase_error: None,
            convention,
        }
    }

    /// A record that also carries amplitude and phase error columns.
    pub fn with_errors(convention: PhaseConvention) -> Self {
        SpectrumRecord {
            amplitude_error: Some(Vec::new()),
            phase_error: Some(Vec::new()),
            ..SpectrumRecord::new(convention)
        }
    }

    /// Append a sample. Error values are stored only when the record has
    /// error columns; a missing error on such a record is stored as NaN.
    pub fn push(&mut self, sample: Sample) {
        self.frequency.push(sample.frequency);
        self.amplitude.push(sample.amplitude);
        self.phase.push(sample.phase);
        if let Some(errors) = self.amplitude_error.as_mut() {
            errors.push(sample.amplitude_error.unwrap_or(f64::NAN));
        }
        if let Some(errors) = self.phase_error.as_mut() {
            errors.push(sample.phase_error.unwrap_or(f64::NAN));
        }
    }

    /// Drop the first sample, if any.
    pub fn remove_first(&mut self) {
        if self.frequency.is_empty() {
            return;
        }
        self.frequency.remove(0);
        self.amplitude.remove(0);
        self.phase.remove(0);
        for col in [self.amplitude_error.as_mut(), self.phase_error.as_mut()]
            .into_iter()
            .flatten()
        {
            col.remove(0);
        }
    }

    /// Convert device degrees to negative-lead radians. Error phases are
    /// converted to radians without a sign change. Already normalized
    /// records are returned unchanged.
    pub fn normalized(mut self) -> Self {
        if self.convention == PhaseConvention::DeviceDegrees {
            let to_rad = std::f64::consts::PI / 180.0;
            self.phase.iter_mut().for_each(|p| *p *= -to_rad);
            if let Some(errors) = self.phase_error.as_mut() {
                errors.iter_mut().for_each(|p| *p *= to_rad);
            }
            self.convention = PhaseConvention::Normalized;
        }
        self
    }

    pub fn frequency(&self) -> &[f64] {
        &self.frequency
    }

    pub fn amplitude(&self) -> &[f64] {
        &self.amplitude
    }

    pub fn phase(&self) -> &[f64] {
        &self.phase
    }

    pub fn amplitude_error(&self) -> Option<&[f64]> {
        self.amplitude_error.as_deref()
    }

    pub fn phase_error(&self) -> Option<&[f64]> {
        self.phase_error.as_deref()
    }

    pub fn convention(&self) -> PhaseConvention {
        self.convention
    }

    pub fn len(&self) -> usize {
        self.frequency.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frequency.is_empty()
    }
}

// ---------------------------------------------------------------------------
// SIP256 reading hierarchy
// ---------------------------------------------------------------------------

/// Current electrodes (A, B) of one injection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct ElectrodePair {
    pub a: u32,
    pub b: u32,
}

/// One sample of a remote unit's frequency sweep.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SweepRow {
    pub frequency: f64,
    /// Apparent resistivity (Ohm m).
    pub resistance: f64,
    /// Phase in degrees, as written by the device.
    pub phase: f64,
    /// Resistivity error in percent.
    pub resistance_error: f64,
    pub phase_error: f64,
    /// 1.0 when the device applied a calibration, 0.0 otherwise.
    pub calibrated: f64,
    /// Injected current (mA).
    pub current: f64,
    pub k_factor: f64,
    pub gain: Option<f64>,
    /// Seconds since the epoch, device-local time taken as UTC.
    pub timestamp: i64,
}

impl SweepRow {
    /// The nine-column row used by older processing scripts:
    /// eight measured columns followed by the timestamp.
    pub fn to_legacy_row(&self) -> [f64; 9] {
        [
            self.frequency,
            self.resistance,
            self.phase,
            self.resistance_error,
            self.phase_error,
            self.calibrated,
            self.current,
            self.k_factor,
            self.timestamp as f64,
        ]
    }
}

/// Sweep data of one remote unit. `id` is `None` for rows recorded before
/// any `Remote Unit` marker (direct readings).
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RemoteUnitGroup {
    pub id: Option<u32>,
    pub rows: Vec<SweepRow>,
}

/// One current injection.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReadingGroup {
    pub number: i64,
    pub electrodes: Option<ElectrodePair>,
    pub remote_units: Vec<RemoteUnitGroup>,
}

/// Parse result of a SIP256 `.res` file.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Sip256Log {
    pub header: HeaderBlock,
    pub readings: Vec<ReadingGroup>,
    #[serde(skip)]
    pub diagnostics: Vec<Diagnostic>,
}

impl Sip256Log {
    /// Electrode pairs in reading order; readings without a pair are skipped.
    pub fn electrode_pairs(&self) -> Vec<ElectrodePair> {
        self.readings.iter().filter_map(|r| r.electrodes).collect()
    }

    /// Remote-unit ids, one list per reading.
    pub fn remote_unit_ids(&self) -> Vec<Vec<u32>> {
        self.readings
            .iter()
            .map(|r| r.remote_units.iter().filter_map(|u| u.id).collect())
            .collect()
    }

    /// Per reading, per remote unit, the sweep as legacy nine-column rows.
    pub fn matrices(&self) -> Vec<Vec<Vec<[f64; 9]>>> {
        self.readings
            .iter()
            .map(|r| {
                r.remote_units
                    .iter()
                    .map(|u| u.rows.iter().map(SweepRow::to_legacy_row).collect())
                    .collect()
            })
            .collect()
    }

    /// Total number of sweep rows over all readings.
    pub fn row_count(&self) -> usize {
        self.readings
            .iter()
            .flat_map(|r| &r.remote_units)
            .map(|u| u.rows.len())
            .sum()
    }
}

// ---------------------------------------------------------------------------
// Frequency labels
// ---------------------------------------------------------------------------

/// Short human-readable frequency label (`"5 kHz"`, `"100 mHz"`, `"2.5 Hz"`).
pub fn format_frequency(freq: f64) -> String {
    if freq > 1e3 {
        format!("{} kHz", (freq / 1e3).round_ties_even() as i64)
    } else if freq < 1.0 {
        format!("{} mHz", (freq * 1e3).round_ties_even() as i64)
    } else if freq < 10.0 {
        format!("{freq:3.1} Hz")
    } else if freq < 100.0 {
        format!("{freq:4.1} Hz")
    } else {
        format!("{} Hz", freq.round_ties_even() as i64)
    }
}
