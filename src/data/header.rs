//! `[Begin X]` / `[End X]` header assembly.

use log::debug;

use super::model::{HeaderBlock, HeaderValue};
use super::tokenizer::LineKind;
use crate::error::Diagnostic;

#[derive(Debug, Default)]
enum State {
    #[default]
    Idle,
    InBlock { name: String, rows: Vec<Vec<f64>> },
}

/// Builds a [`HeaderBlock`] from classified lines.
#[derive(Debug, Default)]
pub struct HeaderAssembler {
    header: HeaderBlock,
    state: State,
    diagnostics: Vec<Diagnostic>,
}

impl HeaderAssembler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one classified line.
    pub fn feed(&mut self, line_no: usize, kind: LineKind<'_>) {
        match kind {
            LineKind::BlockOpen(name) => {
                if let State::InBlock { name: open, .. } = &self.state {
                    debug!("line {line_no}: block {open} left open by [Begin {name}]");
                    self.close_block();
                }
                // a repeated block name starts over; the old rows are replaced on close
                self.state = State::InBlock {
                    name,
                    rows: Vec::new(),
                };
            }
            LineKind::BlockClose(name) => {
                if matches!(self.state, State::Idle) {
                    self.diagnostics.push(Diagnostic::malformed(
                        line_no,
                        format!("[End {name}] without an open block"),
                    ));
                } else {
                    self.close_block();
                }
            }
            LineKind::Entry { token, value } => self.entry(line_no, token, value),
            LineKind::Data(line) => self.row(line_no, line),
            LineKind::Reading | LineKind::RemoteUnit | LineKind::Blank => {}
        }
    }

    fn entry(&mut self, line_no: usize, token: String, value: &str) {
        if let State::InBlock { name, .. } = &self.state {
            self.diagnostics.push(Diagnostic::malformed(
                line_no,
                format!("entry [{token}] inside block {name}"),
            ));
            return;
        }
        match parse_scalar(value) {
            Some(Ok(v)) => {
                self.header.insert(token, v);
            }
            Some(Err(())) => self.diagnostics.push(Diagnostic::HeaderParse {
                line: line_no,
                token,
                value: value.to_string(),
            }),
            None => {}
        }
    }

    fn row(&mut self, line_no: usize, line: &str) {
        let State::InBlock { rows, .. } = &mut self.state else {
            return;
        };
        match parse_row(line) {
            Ok(row) if row.is_empty() => {}
            Ok(row) => rows.push(row),
            Err(field) => self.diagnostics.push(Diagnostic::malformed(
                line_no,
                format!("non-numeric field {field:?} in header block"),
            )),
        }
    }

    fn close_block(&mut self) {
        if let State::InBlock { name, rows } = std::mem::take(&mut self.state) {
            self.header.insert(name, HeaderValue::Matrix(rows));
        }
    }

    /// Whether a `[Begin X]` block is currently open.
    pub fn in_block(&self) -> bool {
        matches!(self.state, State::InBlock { .. })
    }

    /// Finalize; a block still open at end of input is kept.
    pub fn finish(mut self) -> (HeaderBlock, Vec<Diagnostic>) {
        self.close_block();
        (self.header, self.diagnostics)
    }
}

/// `None` for an empty value, otherwise float when it contains a `.`,
/// integer when not.
fn parse_scalar(value: &str) -> Option<Result<HeaderValue, ()>> {
    if value.is_empty() {
        return None;
    }
    let parsed = if value.contains('.') {
        value.parse().map(HeaderValue::Float).map_err(|_| ())
    } else {
        value.parse().map(HeaderValue::Integer).map_err(|_| ())
    };
    Some(parsed)
}

/// Whitespace-split floats; the first bad field is returned as error.
pub(crate) fn parse_row(line: &str) -> Result<Vec<f64>, &str> {
    line.split_whitespace()
        .map(|f| f.parse::<f64>().map_err(|_| f))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::tokenizer::{classify, numbered_lines};

    fn assemble(text: &str) -> (HeaderBlock, Vec<Diagnostic>) {
        let mut asm = HeaderAssembler::new();
        for (no, line) in numbered_lines(text) {
            asm.feed(no, classify(line));
        }
        asm.finish()
    }

    #[test]
    fn test_scalars_and_blocks() {
        let (header, diags) = assemble(
            "[Number of Readings] 3\n\
             [Spacing] 2.5\n\
             [Begin Layout]\n\
             1 0.0 0.0\n\
             2 1.0 0.0\n\
             [End Layout]\n",
        );
        assert!(diags.is_empty());
        assert_eq!(header["Number_of_Readings"], HeaderValue::Integer(3));
        assert_eq!(header["Spacing"], HeaderValue::Float(2.5));
        assert_eq!(
            header["Layout"],
            HeaderValue::Matrix(vec![vec![1.0, 0.0, 0.0], vec![2.0, 1.0, 0.0]])
        );
    }

    #[test]
    fn test_bad_scalar_is_reported_and_skipped() {
        let (header, diags) = assemble("[Operator] Smith\n[Empty]\n");
        assert!(header.is_empty());
        assert_eq!(diags.len(), 1);
        assert!(matches!(&diags[0], Diagnostic::HeaderParse { token, .. } if token == "Operator"));
    }

    #[test]
    fn test_ragged_block_is_kept() {
        let (header, _) = assemble("[Begin A]\n1 2 3\n4 5\n[End A]\n");
        assert!(!header["A"].is_rectangular());
        assert_eq!(header["A"].as_matrix().unwrap().len(), 2);
    }

    #[test]
    fn test_second_begin_overwrites() {
        let (header, _) = assemble("[Begin A]\n1 2\n[End A]\n[Begin A]\n3 4\n[End A]\n");
        assert_eq!(header["A"], HeaderValue::Matrix(vec![vec![3.0, 4.0]]));
    }

    #[test]
    fn test_entry_inside_block_is_ignored() {
        let (header, diags) = assemble("[Begin A]\n[Gain] 2\n1 2\n[End A]\n");
        assert!(!header.contains_key("Gain"));
        assert_eq!(diags.len(), 1);
        assert_eq!(diags[0].line(), Some(2));
    }

    #[test]
    fn test_unclosed_block_finalized_at_eof() {
        let (header, _) = assemble("[Begin A]\n1 2\n");
        assert_eq!(header["A"], HeaderValue::Matrix(vec![vec![1.0, 2.0]]));
    }

    #[test]
    fn test_bad_row_dropped() {
        let (header, diags) = assemble("[Begin A]\n1 x\n3 4\n[End A]\n");
        assert_eq!(header["A"], HeaderValue::Matrix(vec![vec![3.0, 4.0]]));
        assert_eq!(diags.len(), 1);
    }
}
