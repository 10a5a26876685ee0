use std::path::Path;

use log::{log, warn};

use super::dialect::{self, Dialect};
use super::model::{HeaderBlock, Sip256Log, SpectrumRecord};
use super::sip256;
use super::spectrum::{self, ParsedSpectrum};
use crate::config::LoadOptions;
use crate::error::{Diagnostic, SipError};

// ---------------------------------------------------------------------------
// Public entry-points
// ---------------------------------------------------------------------------

/// A single spectrum with its phase in the negative-lead convention.
#[derive(Debug, Clone, PartialEq)]
pub struct LoadedSpectrum {
    pub dialect: Dialect,
    pub record: SpectrumRecord,
    pub header: HeaderBlock,
    pub diagnostics: Vec<Diagnostic>,
}

/// Load a single-spectrum file. The dialect is sniffed from the first line,
/// falling back to the extension for `.txt` / `.csv`.
///
/// Supported dialects:
/// * SIP Fuchs III and SIP-Quad data tables
/// * Radic SIP-Fuchs `.res` files
/// * delimited text: frequency, amplitude, _, phase
pub fn load(path: &Path, options: &LoadOptions) -> Result<LoadedSpectrum, SipError> {
    let text = read_latin9(path)?;
    load_from_text(&text, path, options)
}

/// Like [`load`] for text that is already decoded; `path` is only used for
/// extension sniffing and messages.
pub fn load_from_text(
    text: &str,
    path: &Path,
    options: &LoadOptions,
) -> Result<LoadedSpectrum, SipError> {
    let first_line = text.lines().next().unwrap_or("");
    let entry =
        dialect::detect(first_line, path).ok_or_else(|| SipError::UnsupportedFormat {
            path: path.to_path_buf(),
            first_line: first_line.to_string(),
        })?;

    log!(options.progress_level(), "Reading {} file", entry.dialect);
    let parsed = (entry.read)(text, options);
    report(&parsed.diagnostics, options);

    Ok(LoadedSpectrum {
        dialect: entry.dialect,
        record: parsed.record.normalized(),
        header: parsed.header,
        diagnostics: parsed.diagnostics,
    })
}

/// Load a SIP256 `.res` file with its reading / remote-unit hierarchy.
pub fn load_sip256(path: &Path, options: &LoadOptions) -> Result<Sip256Log, SipError> {
    let text = read_latin9(path)?;
    log!(options.progress_level(), "Reading SIP256 file {}", path.display());
    let parsed = sip256::parse_sip256(&text, options);
    report(&parsed.diagnostics, options);
    Ok(parsed)
}

// ---------------------------------------------------------------------------
// Per-dialect readers on paths (phase left as written by the device)
// ---------------------------------------------------------------------------

pub fn read_fuchs3_file(path: &Path, options: &LoadOptions) -> Result<ParsedSpectrum, SipError> {
    read_with(path, options, spectrum::parse_fuchs3)
}

pub fn read_radic_sip_fuchs_file(
    path: &Path,
    options: &LoadOptions,
) -> Result<ParsedSpectrum, SipError> {
    read_with(path, options, spectrum::parse_radic_sip_fuchs)
}

pub fn read_txt_spectrum_file(
    path: &Path,
    options: &LoadOptions,
) -> Result<ParsedSpectrum, SipError> {
    read_with(path, options, spectrum::parse_txt_spectrum)
}

fn read_with(
    path: &Path,
    options: &LoadOptions,
    read: dialect::ReadFn,
) -> Result<ParsedSpectrum, SipError> {
    let text = read_latin9(path)?;
    let parsed = read(&text, options);
    report(&parsed.diagnostics, options);
    Ok(parsed)
}

// ---------------------------------------------------------------------------
// Decoding
// ---------------------------------------------------------------------------

/// Read a whole file as ISO-8859-15. The handle is closed before parsing.
pub fn read_latin9(path: &Path) -> Result<String, SipError> {
    let bytes = std::fs::read(path).map_err(|e| SipError::io(path, e))?;
    Ok(decode_latin9(&bytes))
}

/// Decode ISO-8859-15 bytes, replacing anything undecodable.
pub fn decode_latin9(bytes: &[u8]) -> String {
    let (text, had_errors) = encoding_rs::ISO_8859_15.decode_without_bom_handling(bytes);
    if had_errors {
        log::debug!("replaced undecodable bytes while decoding ISO-8859-15");
    }
    text.into_owned()
}

fn report(diagnostics: &[Diagnostic], options: &LoadOptions) {
    if options.verbose {
        for d in diagnostics {
            warn!("{d}");
        }
    } else if !diagnostics.is_empty() {
        log::debug!("{} lines skipped", diagnostics.len());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::PhaseConvention;

    #[test]
    fn test_decode_latin9_specials() {
        // 0xA4 is the euro sign in Latin-9, 0xB0 the degree sign
        assert_eq!(decode_latin9(b"PA/\xB0 \xA4"), "PA/° €");
    }

    #[test]
    fn test_unsupported_format() {
        let err = load_from_text("garbage\n", Path::new("x.bin"), &LoadOptions::default())
            .unwrap_err();
        assert!(matches!(err, SipError::UnsupportedFormat { ref first_line, .. } if first_line == "garbage"));
    }

    #[test]
    fn test_device_degrees_are_normalized() {
        let text = "SIP-Fuchs\nFreq\n10\t1\t180\t0\t90\n";
        let opts = LoadOptions {
            del_last: false,
            ..LoadOptions::default()
        };
        let loaded = load_from_text(text, Path::new("a.res"), &opts).unwrap();
        assert_eq!(loaded.dialect, Dialect::SipFuchs);
        assert_eq!(loaded.record.convention(), PhaseConvention::Normalized);
        assert!((loaded.record.phase()[0] + std::f64::consts::PI).abs() < 1e-12);
        assert!((loaded.record.phase_error().unwrap()[0] - std::f64::consts::FRAC_PI_2).abs() < 1e-12);
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let err = load(Path::new("/nonexistent/dir/file.res"), &LoadOptions::default())
            .unwrap_err();
        assert!(matches!(err, SipError::Io { .. }));
    }
}
