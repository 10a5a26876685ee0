//! Dialect-independent line classification.

/// Classification of one input line.
#[derive(Debug, Clone, PartialEq)]
pub enum LineKind<'a> {
    /// `[Begin X]` – payload is the block name `X`.
    BlockOpen(String),
    /// `[End X]`
    BlockClose(String),
    /// `[Token] value` – value is the trimmed text after the last `]`.
    Entry { token: String, value: &'a str },
    /// Line starting with `Reading`.
    Reading,
    /// Line starting with `Remote Unit`.
    RemoteUnit,
    /// Shorter than two characters.
    Blank,
    /// Anything else; split on whitespace by the consumer.
    Data(&'a str),
}

/// Iterate lines with their 1-based line numbers; `\n` and `\r\n` are
/// stripped.
pub fn numbered_lines(text: &str) -> impl Iterator<Item = (usize, &str)> {
    text.lines().enumerate().map(|(i, l)| (i + 1, l))
}

/// Split a bracketed header line into its token and the text after the
/// closing bracket. Spaces inside the token become underscores.
pub fn bracket_token(line: &str) -> Option<(String, &str)> {
    let inner = line.trim_start().strip_prefix('[')?;
    let (token, value) = match inner.rfind(']') {
        Some(end) => (&inner[..end], &inner[end + 1..]),
        None => (inner.trim_end(), ""),
    };
    Some((token.replace(' ', "_"), value.trim()))
}

/// Classify an already extracted bracket token.
pub fn classify_token(token: String, value: &str) -> LineKind<'_> {
    if let Some(name) = token.strip_prefix("Begin_") {
        LineKind::BlockOpen(name.to_string())
    } else if let Some(name) = token.strip_prefix("End_") {
        LineKind::BlockClose(name.to_string())
    } else {
        LineKind::Entry { token, value }
    }
}

/// Classify one line.
pub fn classify(line: &str) -> LineKind<'_> {
    classify_with(line, |token| token)
}

/// Classify one line, passing bracket tokens through `rewrite` first so a
/// reader can repair known firmware misspellings.
pub fn classify_with(line: &str, rewrite: impl FnOnce(String) -> String) -> LineKind<'_> {
    if let Some((token, value)) = bracket_token(line) {
        return classify_token(rewrite(token), value);
    }
    if line.starts_with("Reading") {
        LineKind::Reading
    } else if line.starts_with("Remote Unit") {
        LineKind::RemoteUnit
    } else if line.len() < 2 {
        LineKind::Blank
    } else {
        LineKind::Data(line)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_block_markers() {
        assert_eq!(
            classify("[Begin Frequency Parameter]"),
            LineKind::BlockOpen("Frequency_Parameter".into())
        );
        assert_eq!(classify("  [End Layout]"), LineKind::BlockClose("Layout".into()));
    }

    #[test]
    fn test_entry_value_after_last_bracket() {
        assert_eq!(
            classify("[Number of [Readings]] 12 "),
            LineKind::Entry {
                token: "Number_of_[Readings]".into(),
                value: "12"
            }
        );
    }

    #[test]
    fn test_unterminated_bracket_has_empty_value() {
        assert_eq!(
            classify("[Messdaten SIP256"),
            LineKind::Entry {
                token: "Messdaten_SIP256".into(),
                value: ""
            }
        );
    }

    #[test]
    fn test_markers_blank_and_data() {
        assert_eq!(classify("Reading 3 / 1 2 5 3 7"), LineKind::Reading);
        assert_eq!(classify("Remote Unit 4"), LineKind::RemoteUnit);
        assert_eq!(classify(""), LineKind::Blank);
        assert_eq!(classify("x"), LineKind::Blank);
        assert_eq!(classify("1.0 2.0"), LineKind::Data("1.0 2.0"));
    }

    #[test]
    fn test_rewrite_hook() {
        let kind = classify_with("[FrequencyParameterBegin]", |t| {
            t.replace("FrequencyParameterBegin", "Begin_FrequencyParameter")
        });
        assert_eq!(kind, LineKind::BlockOpen("FrequencyParameter".into()));
    }

    #[test]
    fn test_numbered_lines_strip_crlf() {
        let lines: Vec<_> = numbered_lines("a\r\nb\n").collect();
        assert_eq!(lines, vec![(1, "a"), (2, "b")]);
    }
}
