//! Readers for the single-spectrum dialects.
//!
//! Every reader takes the full decoded file text. Phases are returned the
//! way the device wrote them; [`super::loader::load`] normalizes them.

use log::{debug, info};

use super::header::HeaderAssembler;
use super::model::{HeaderBlock, PhaseConvention, Sample, SpectrumRecord};
use super::tokenizer::{classify, numbered_lines, LineKind};
use crate::config::LoadOptions;
use crate::error::Diagnostic;

/// Output of one single-spectrum reader.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedSpectrum {
    pub record: SpectrumRecord,
    pub header: HeaderBlock,
    pub diagnostics: Vec<Diagnostic>,
}

// ---------------------------------------------------------------------------
// SIP Fuchs III / SIP-Quad
// ---------------------------------------------------------------------------

// Column offsets of the Fuchs III data table. The table has no
// self-describing schema; rows carry the geometric factor used by the
// device next to the frequency, resistance and phase (degrees) columns.
const FUCHS3_K_COLUMN: usize = 9;
const FUCHS3_FREQ_COLUMN: usize = 11;
const FUCHS3_AMP_COLUMN: usize = 12;
const FUCHS3_PHASE_COLUMN: usize = 13;
/// Rows with this many fields or fewer are not data rows.
const FUCHS3_MIN_FIELDS: usize = 12;

/// Read a SIP Fuchs III or SIP-Quad file.
///
/// Header lines are assembled until the first line mentioning `Current`;
/// everything after it is the data table, which ends at the first blank
/// line or at end of input. Amplitudes are divided by the per-row device
/// k-factor and multiplied by `options.k`.
pub fn parse_fuchs3(text: &str, options: &LoadOptions) -> ParsedSpectrum {
    let mut assembler = HeaderAssembler::new();
    let mut table = Vec::new();
    let mut in_table = false;

    for (line_no, line) in numbered_lines(text) {
        if in_table {
            if classify(line) == LineKind::Blank {
                break;
            }
            table.push((line_no, line));
            continue;
        }
        if line.is_empty() {
            continue;
        }
        let starts_table = line.contains("Current");
        assembler.feed(line_no, classify(line));
        if starts_table {
            in_table = true;
        }
    }

    let (header, mut diagnostics) = assembler.finish();

    if options.k != 1.0 {
        log::log!(
            options.progress_level(),
            "Geometric value changed to: {}",
            options.k
        );
    }

    let mut record = SpectrumRecord::new(PhaseConvention::DeviceDegrees);
    for (line_no, line) in table {
        let fields: Vec<&str> = line.split_whitespace().collect();
        if fields.len() <= FUCHS3_MIN_FIELDS {
            continue;
        }
        match fuchs3_row(&fields, options.k) {
            Ok(Some(sample)) => record.push(sample),
            Ok(None) => debug!("line {line_no}: no frequency, skipped"),
            Err(reason) => diagnostics.push(Diagnostic::malformed(line_no, reason)),
        }
    }

    ParsedSpectrum {
        record,
        header,
        diagnostics,
    }
}

/// `Ok(None)` marks a dropout row (frequency missing or not finite).
fn fuchs3_row(fields: &[&str], k: f64) -> Result<Option<Sample>, String> {
    let frequency = match fields[FUCHS3_FREQ_COLUMN].parse::<f64>() {
        Ok(f) if f.is_finite() => f,
        _ => return Ok(None),
    };
    let column = |idx: usize, name: &str| -> Result<f64, String> {
        let raw = fields
            .get(idx)
            .ok_or_else(|| format!("missing {name} column"))?;
        raw.parse()
            .map_err(|_| format!("{name} column {raw:?} is not a number"))
    };
    let amplitude = column(FUCHS3_AMP_COLUMN, "amplitude")?;
    let phase = column(FUCHS3_PHASE_COLUMN, "phase")?;
    let row_k = column(FUCHS3_K_COLUMN, "k-factor")?;
    if row_k == 0.0 {
        return Err("device k-factor is zero".to_string());
    }
    Ok(Some(Sample::new(frequency, amplitude / row_k * k, phase)))
}

// ---------------------------------------------------------------------------
// Radic SIP-Fuchs
// ---------------------------------------------------------------------------

/// Tab-separated columns: frequency, resistance, phase (°), resistance
/// error, phase error (°).
const RADIC_FIELDS: usize = 5;

/// Read a Radic SIP-Fuchs `.res` file.
///
/// The table starts after the first line containing `Freq` (the second one
/// with `options.read_second`) and ends at the first row with fewer than
/// five tab-separated fields. With `options.del_last` the first sample is
/// dropped.
pub fn parse_radic_sip_fuchs(text: &str, options: &LoadOptions) -> ParsedSpectrum {
    let mut record = SpectrumRecord::with_errors(PhaseConvention::DeviceDegrees);
    let mut diagnostics = Vec::new();
    let mut lines = numbered_lines(text).skip(1);

    let markers = if options.read_second { 2 } else { 1 };
    for _ in 0..markers {
        if !lines.any(|(_, line)| line.contains("Freq")) {
            diagnostics.push(Diagnostic::MissingSection { marker: "Freq" });
            return ParsedSpectrum {
                record,
                header: HeaderBlock::new(),
                diagnostics,
            };
        }
    }

    for (line_no, line) in lines {
        let fields: Vec<&str> = line.split('\t').collect();
        if fields.len() < RADIC_FIELDS {
            break;
        }
        let nums: Result<Vec<f64>, _> = fields[..RADIC_FIELDS]
            .iter()
            .map(|f| f.trim().parse::<f64>())
            .collect();
        match nums {
            Ok(n) => record.push(Sample::new(n[0], n[1], n[2]).with_errors(n[3], n[4])),
            Err(e) => diagnostics.push(Diagnostic::malformed(line_no, e.to_string())),
        }
    }

    if options.del_last && !record.is_empty() {
        debug!("dropping leading sample at {} Hz", record.frequency()[0]);
        record.remove_first();
    }

    ParsedSpectrum {
        record,
        header: HeaderBlock::new(),
        diagnostics,
    }
}

// ---------------------------------------------------------------------------
// Delimited text (ZEL device export)
// ---------------------------------------------------------------------------

const TXT_FREQ_COLUMN: usize = 0;
const TXT_AMP_COLUMN: usize = 1;
const TXT_PHASE_COLUMN: usize = 3;

/// Read a whitespace or `;` separated spectrum.
///
/// The first line is a header. Columns are frequency, amplitude, unused,
/// phase; the phase is negated on read so the record is already in the
/// negative-lead convention. Reading stops at the first line with three
/// fields or fewer.
pub fn parse_txt_spectrum(text: &str, options: &LoadOptions) -> ParsedSpectrum {
    let mut record = SpectrumRecord::new(PhaseConvention::Normalized);
    let mut diagnostics = Vec::new();

    for (line_no, line) in numbered_lines(text).skip(1) {
        let spaced = line.replace(';', " ");
        let fields: Vec<&str> = spaced.split_whitespace().collect();
        if fields.len() <= TXT_PHASE_COLUMN {
            break;
        }
        let parse = |idx: usize| fields[idx].parse::<f64>();
        match (
            parse(TXT_FREQ_COLUMN),
            parse(TXT_AMP_COLUMN),
            parse(TXT_PHASE_COLUMN),
        ) {
            (Ok(f), Ok(amp), Ok(phi)) => record.push(Sample::new(f, amp * options.k, -phi)),
            _ => diagnostics.push(Diagnostic::malformed(line_no, "non-numeric column")),
        }
    }

    if options.verbose {
        info!("read {} samples from delimited text", record.len());
    }

    ParsedSpectrum {
        record,
        header: HeaderBlock::new(),
        diagnostics,
    }
}
