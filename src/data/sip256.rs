//! Reader for SIP256 `.res` files: readings → remote units → sweeps.
//!
//! The data section has no grammar. Structure comes from `Reading` and
//! `Remote Unit` marker lines, and rows need repairs for defects the
//! device firmware is known to produce before they can be split into
//! columns.

use std::sync::OnceLock;

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use log::{debug, log};
use regex::Regex;

use super::header::HeaderAssembler;
use super::model::{
    ElectrodePair, HeaderBlock, ReadingGroup, RemoteUnitGroup, Sip256Log, SweepRow,
};
use super::tokenizer::{bracket_token, classify, classify_token, numbered_lines, LineKind};
use crate::config::LoadOptions;
use crate::error::Diagnostic;

// Sweep row layout, from the device's column header:
// Frequency/Hz RA/Ohmm PA/° ERA/% EPA/° Cal? IA/mA K.-F./m Gains Time/h:m:s Date/d.m.y
const MEASURED_COLUMNS: usize = 8;
const GAIN_COLUMN: usize = 8;
const TIME_COLUMN: usize = 9;
const DATE_COLUMN: usize = 10;

// `Reading <n> ... <A> ... <B>` and `Remote Unit <id>`
const READING_NUMBER_FIELD: usize = 1;
const ELECTRODE_A_FIELD: usize = 4;
const ELECTRODE_B_FIELD: usize = 6;
const REMOTE_UNIT_FIELD: usize = 2;

/// Only the leading columns are checked for glued numbers.
const REPAIRED_FIELDS: usize = 6;
const OVERLONG_FIELD: usize = 15;
/// Characters split off the end of an overlong frequency field.
const FREQ_TAIL: usize = 15;
/// Characters split off the end of any other overlong field.
const VALUE_TAIL: usize = 10;

/// Parse a SIP256 file.
pub fn parse_sip256(text: &str, options: &LoadOptions) -> Sip256Log {
    let mut assembler = HeaderAssembler::new();
    let mut lines = numbered_lines(text);

    for (line_no, line) in lines.by_ref() {
        if let Some((token, value)) = bracket_token(line) {
            let token = fix_token(token);
            if token.contains("Messdaten") {
                debug!("line {line_no}: measurement data start ({token})");
                break;
            }
            assembler.feed(line_no, classify_token(token, value));
        } else {
            assembler.feed(line_no, classify(line));
        }
    }

    let (header, diagnostics) = assembler.finish();
    let mut parser = Sip256Parser::new(options.progress_level(), diagnostics);
    for (line_no, line) in lines {
        parser.line(line_no, line);
    }
    parser.finish(header)
}

/// Early SIP256D firmware wrote `FrequencyParameterBegin` / `End`.
fn fix_token(token: String) -> String {
    if token.contains("FrequencyParameterBegin") {
        token.replace("FrequencyParameterBegin", "Begin_FrequencyParameter")
    } else if token.contains("FrequencyParameterEnd") {
        token.replace("FrequencyParameterEnd", "End_FrequencyParameter")
    } else {
        token
    }
}

// ---------------------------------------------------------------------------
// Data section state machine
// ---------------------------------------------------------------------------

struct Sip256Parser {
    level: log::Level,
    readings: Vec<ReadingGroup>,
    reading: Option<ReadingGroup>,
    unit: Option<RemoteUnitGroup>,
    diagnostics: Vec<Diagnostic>,
}

impl Sip256Parser {
    fn new(level: log::Level, diagnostics: Vec<Diagnostic>) -> Self {
        Sip256Parser {
            level,
            readings: Vec::new(),
            reading: None,
            unit: None,
            diagnostics,
        }
    }

    fn line(&mut self, line_no: usize, raw: &str) {
        let line = replace_calibration_tokens(raw);
        let fields: Vec<&str> = line.split_whitespace().collect();
        match classify(&line) {
            LineKind::Reading => self.start_reading(line_no, &fields),
            LineKind::RemoteUnit => self.start_remote_unit(line_no, &fields),
            _ if line.contains("Freq") => {}
            _ if fields.len() > 1 && self.in_measurement() => self.sweep_row(line_no, &line),
            _ => {}
        }
    }

    /// Rows count only inside a reading with a positive number.
    fn in_measurement(&self) -> bool {
        self.reading.as_ref().is_some_and(|r| r.number > 0)
    }

    fn start_reading(&mut self, line_no: usize, fields: &[&str]) {
        let Some(number) = parse_field::<i64>(fields, READING_NUMBER_FIELD) else {
            self.diagnostics
                .push(Diagnostic::malformed(line_no, "reading marker without a number"));
            return;
        };
        self.flush_reading();

        let electrodes = if number > 0 {
            match (
                parse_field::<u32>(fields, ELECTRODE_A_FIELD),
                parse_field::<u32>(fields, ELECTRODE_B_FIELD),
            ) {
                (Some(a), Some(b)) => Some(ElectrodePair { a, b }),
                _ => {
                    self.diagnostics.push(Diagnostic::malformed(
                        line_no,
                        format!("reading {number} has no electrode pair"),
                    ));
                    None
                }
            }
        } else {
            None
        };

        self.reading = Some(ReadingGroup {
            number,
            electrodes,
            remote_units: Vec::new(),
        });
    }

    fn start_remote_unit(&mut self, line_no: usize, fields: &[&str]) {
        if self.reading.is_none() {
            self.diagnostics
                .push(Diagnostic::malformed(line_no, "remote unit outside a reading"));
            return;
        }
        self.flush_unit();
        let id = parse_field::<u32>(fields, REMOTE_UNIT_FIELD);
        if id.is_none() {
            self.diagnostics
                .push(Diagnostic::malformed(line_no, "remote unit marker without an id"));
        }
        self.unit = Some(RemoteUnitGroup {
            id,
            rows: Vec::new(),
        });
    }

    fn sweep_row(&mut self, line_no: usize, line: &str) {
        let fields = repair_fields(line);
        match parse_sweep_row(&fields) {
            Ok(row) => self
                .unit
                .get_or_insert_with(RemoteUnitGroup::default)
                .rows
                .push(row),
            Err(reason) => self.diagnostics.push(Diagnostic::malformed(line_no, reason)),
        }
    }

    fn flush_unit(&mut self) {
        if let (Some(unit), Some(reading)) = (self.unit.take(), self.reading.as_mut()) {
            reading.remote_units.push(unit);
        }
    }

    fn flush_reading(&mut self) {
        self.flush_unit();
        if let Some(reading) = self.reading.take() {
            if reading.number > 0 {
                log!(
                    self.level,
                    "Reading {}: {} RUs",
                    reading.number,
                    reading.remote_units.len()
                );
                self.readings.push(reading);
            }
        }
    }

    fn finish(mut self, header: HeaderBlock) -> Sip256Log {
        self.flush_reading();
        Sip256Log {
            header,
            readings: self.readings,
            diagnostics: self.diagnostics,
        }
    }
}

fn parse_field<T: std::str::FromStr>(fields: &[&str], idx: usize) -> Option<T> {
    fields.get(idx)?.parse().ok()
}

// ---------------------------------------------------------------------------
// Row repairs
// ---------------------------------------------------------------------------

/// `c` (calibrated) and `nc` (not calibrated) become `1` and `0`.
pub fn replace_calibration_tokens(line: &str) -> String {
    line.replace(" nc ", " 0 ").replace(" c ", " 1 ")
}

fn glued_minus() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"([0-9])-").expect("static regex"))
}

/// Split a row into fields, undoing missing delimiters: a digit directly
/// followed by `-`, and numbers glued into one overlong field. A stray
/// `c` in a leading field stands for a calibration pass and becomes `1.0`.
pub fn repair_fields(line: &str) -> Vec<String> {
    let line = glued_minus().replace_all(line, "${1} -");
    let mut fields: Vec<String> = line.split_whitespace().map(str::to_string).collect();

    let mut c = 0;
    while c < REPAIRED_FIELDS && c < fields.len() {
        let len = fields[c].chars().count();
        if len > OVERLONG_FIELD {
            let tail = if c == 0 { FREQ_TAIL } else { VALUE_TAIL };
            if let Some((at, _)) = fields[c].char_indices().nth(len - tail) {
                let rest = fields[c].split_off(at);
                fields.insert(c + 1, rest);
            }
        }
        if fields[c].contains('c') {
            fields[c] = "1.0".to_string();
        }
        c += 1;
    }
    fields
}

fn parse_sweep_row(fields: &[String]) -> Result<SweepRow, String> {
    if fields.len() <= DATE_COLUMN {
        return Err(format!(
            "expected {} fields, found {}",
            DATE_COLUMN + 1,
            fields.len()
        ));
    }
    let mut v = [0.0; MEASURED_COLUMNS];
    for (slot, raw) in v.iter_mut().zip(fields) {
        *slot = raw
            .parse()
            .map_err(|_| format!("{raw:?} is not a number"))?;
    }
    let timestamp = device_timestamp(&fields[TIME_COLUMN], &fields[DATE_COLUMN])?;
    Ok(SweepRow {
        frequency: v[0],
        resistance: v[1],
        phase: v[2],
        resistance_error: v[3],
        phase_error: v[4],
        calibrated: v[5],
        current: v[6],
        k_factor: v[7],
        gain: fields[GAIN_COLUMN].parse().ok(),
        timestamp,
    })
}

/// Seconds since the epoch for a device-local `h:m:s` time and `d/m/y`
/// (or `d.m.y`) date. No timezone is applied.
pub fn device_timestamp(time: &str, date: &str) -> Result<i64, String> {
    let time = NaiveTime::parse_from_str(time, "%H:%M:%S")
        .map_err(|e| format!("bad time {time:?}: {e}"))?;
    let date = NaiveDate::parse_from_str(date, "%d/%m/%Y")
        .or_else(|_| NaiveDate::parse_from_str(date, "%d.%m.%Y"))
        .map_err(|e| format!("bad date {date:?}: {e}"))?;
    Ok(NaiveDateTime::new(date, time).and_utc().timestamp())
}
