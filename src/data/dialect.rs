//! First-line dialect sniffing.

use std::fmt;
use std::path::Path;

use serde::Serialize;

use super::spectrum::{self, ParsedSpectrum};
use crate::config::LoadOptions;

/// Known single-spectrum file layouts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Dialect {
    FuchsIII,
    SipQuad,
    SipFuchs,
    DelimitedText,
}

impl fmt::Display for Dialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Dialect::FuchsIII => "SIP Fuchs III",
            Dialect::SipQuad => "SIP Quad",
            Dialect::SipFuchs => "SIP Fuchs",
            Dialect::DelimitedText => "delimited text",
        };
        f.write_str(name)
    }
}

/// Reader for an already decoded file.
pub type ReadFn = fn(&str, &LoadOptions) -> ParsedSpectrum;

/// One row of the detection table.
pub struct DialectEntry {
    pub dialect: Dialect,
    /// Tested against the first line and the file path.
    pub matches: fn(&str, &Path) -> bool,
    pub read: ReadFn,
}

impl fmt::Debug for DialectEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DialectEntry")
            .field("dialect", &self.dialect)
            .finish_non_exhaustive()
    }
}

/// Detection order. Signatures are plain substrings and a first line may
/// contain more than one; the earlier entry wins.
pub const DIALECTS: &[DialectEntry] = &[
    DialectEntry {
        dialect: Dialect::FuchsIII,
        matches: is_fuchs3,
        read: spectrum::parse_fuchs3,
    },
    DialectEntry {
        dialect: Dialect::SipQuad,
        matches: is_quad,
        read: spectrum::parse_fuchs3,
    },
    DialectEntry {
        dialect: Dialect::SipFuchs,
        matches: is_sip_fuchs,
        read: spectrum::parse_radic_sip_fuchs,
    },
    DialectEntry {
        dialect: Dialect::DelimitedText,
        matches: has_text_extension,
        read: spectrum::parse_txt_spectrum,
    },
];

fn is_fuchs3(first_line: &str, _: &Path) -> bool {
    first_line.contains("SIP Fuchs III")
}

fn is_quad(first_line: &str, _: &Path) -> bool {
    first_line.contains("SIP-Quad")
}

fn is_sip_fuchs(first_line: &str, _: &Path) -> bool {
    first_line.contains("SIP-Fuchs")
}

fn has_text_extension(_: &str, path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| e.eq_ignore_ascii_case("txt") || e.eq_ignore_ascii_case("csv"))
        .unwrap_or(false)
}

/// First entry of [`DIALECTS`] matching `first_line` / `path`.
pub fn detect(first_line: &str, path: &Path) -> Option<&'static DialectEntry> {
    detect_in(DIALECTS, first_line, path)
}

/// First entry of `table` that matches.
pub fn detect_in<'t>(
    table: &'t [DialectEntry],
    first_line: &str,
    path: &Path,
) -> Option<&'t DialectEntry> {
    table.iter().find(|entry| (entry.matches)(first_line, path))
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case("SIP Fuchs III  Version 3.1", "data.res", Some(Dialect::FuchsIII))]
    #[test_case("SIP-Quad 1.4", "data.res", Some(Dialect::SipQuad))]
    #[test_case("SIP-Fuchs Software rev.: 070903", "data.res", Some(Dialect::SipFuchs))]
    #[test_case("freq amp x phase", "spectrum.TXT", Some(Dialect::DelimitedText))]
    #[test_case("freq;amp;x;phase", "spectrum.csv", Some(Dialect::DelimitedText))]
    #[test_case("freq amp x phase", "spectrum.dat", None)]
    fn test_detect(first_line: &str, file: &str, expected: Option<Dialect>) {
        let found = detect(first_line, Path::new(file)).map(|e| e.dialect);
        assert_eq!(found, expected);
    }

    #[test]
    fn test_signature_beats_extension() {
        let found = detect("SIP-Quad", Path::new("quad.txt")).map(|e| e.dialect);
        assert_eq!(found, Some(Dialect::SipQuad));
    }

    #[test]
    fn test_order_decides_ambiguous_lines() {
        let line = "SIP-Quad export of SIP-Fuchs data";
        let path = Path::new("x.res");
        assert_eq!(detect(line, path).unwrap().dialect, Dialect::SipQuad);

        let reversed: Vec<DialectEntry> = DIALECTS
            .iter()
            .rev()
            .map(|e| DialectEntry {
                dialect: e.dialect,
                matches: e.matches,
                read: e.read,
            })
            .collect();
        assert_eq!(
            detect_in(&reversed, line, path).unwrap().dialect,
            Dialect::SipFuchs
        );
        // unambiguous lines do not care about order
        assert_eq!(
            detect_in(&reversed, "SIP Fuchs III", path).unwrap().dialect,
            Dialect::FuchsIII
        );
    }
}
