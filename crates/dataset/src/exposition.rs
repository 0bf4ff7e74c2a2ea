//! Text Exposition Format Parser
//!
//! Turns sample lines such as
//!
//! ```text
//! http_requests_total{method="post",code="200"} 1027 1395066363000
//! ```
//!
//! into label sets. The metric name is stored under `__name__`; the sample
//! value and timestamp are not part of an alert's identity and are skipped.

use alert_model::{LabelSet, METRIC_NAME_LABEL};

use crate::error::{ParseError, ParseErrorKind};

/// Parse every sample line in `input`, skipping blanks and `#` lines
pub fn parse(input: &[u8]) -> Result<Vec<LabelSet>, ParseError> {
    let text = std::str::from_utf8(input).map_err(|e| {
        let line = input[..e.valid_up_to()].iter().filter(|b| **b == b'\n').count() + 1;
        ParseError {
            line,
            kind: ParseErrorKind::InvalidUtf8,
        }
    })?;

    let mut out = Vec::new();
    for (idx, raw) in text.lines().enumerate() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let labels = parse_line(line).map_err(|kind| ParseError {
            line: idx + 1,
            kind,
        })?;
        out.push(labels);
    }
    Ok(out)
}

fn parse_line(line: &str) -> Result<LabelSet, ParseErrorKind> {
    let mut cur = Cursor::new(line);
    let mut labels = LabelSet::new();

    let name = cur.take_while(is_metric_name_char);
    if name.is_empty() || name.starts_with(|c: char| c.is_ascii_digit()) {
        return Err(ParseErrorKind::InvalidMetricName);
    }
    labels.insert(METRIC_NAME_LABEL, name);

    cur.skip_ws();
    if cur.eat('{') {
        parse_labels(&mut cur, &mut labels)?;
    }

    cur.skip_ws();
    if cur.rest().is_empty() {
        return Err(ParseErrorKind::MissingValue);
    }
    Ok(labels)
}

fn parse_labels(cur: &mut Cursor<'_>, labels: &mut LabelSet) -> Result<(), ParseErrorKind> {
    loop {
        cur.skip_ws();
        if cur.eat('}') {
            return Ok(());
        }

        let name = cur.take_while(is_label_name_char);
        if name.is_empty() || name.starts_with(|c: char| c.is_ascii_digit()) {
            return Err(ParseErrorKind::InvalidLabelName);
        }
        cur.skip_ws();
        cur.expect('=')?;
        cur.skip_ws();
        cur.expect('"')?;
        let value = parse_quoted(cur)?;

        if labels.contains(name) {
            return Err(ParseErrorKind::DuplicateLabel(name.to_string()));
        }
        labels.insert(name, value);

        cur.skip_ws();
        if cur.eat(',') {
            continue;
        }
        cur.expect('}')?;
        return Ok(());
    }
}

/// Read a label value after its opening quote, consuming the closing quote
fn parse_quoted(cur: &mut Cursor<'_>) -> Result<String, ParseErrorKind> {
    let mut value = String::new();
    loop {
        match cur.bump() {
            None => return Err(ParseErrorKind::UnterminatedValue),
            Some('"') => return Ok(value),
            Some('\\') => match cur.bump() {
                Some('\\') => value.push('\\'),
                Some('"') => value.push('"'),
                Some('n') => value.push('\n'),
                Some(other) => return Err(ParseErrorKind::InvalidEscape(other)),
                None => return Err(ParseErrorKind::UnterminatedValue),
            },
            Some(c) => value.push(c),
        }
    }
}

fn is_metric_name_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_' || c == ':'
}

fn is_label_name_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

struct Cursor<'a> {
    src: &'a str,
    pos: usize,
}

impl<'a> Cursor<'a> {
    fn new(src: &'a str) -> Self {
        Self { src, pos: 0 }
    }

    fn rest(&self) -> &'a str {
        let src: &'a str = self.src;
        &src[self.pos..]
    }

    fn peek(&self) -> Option<char> {
        self.rest().chars().next()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += c.len_utf8();
        Some(c)
    }

    fn eat(&mut self, want: char) -> bool {
        if self.peek() == Some(want) {
            self.pos += want.len_utf8();
            true
        } else {
            false
        }
    }

    fn expect(&mut self, want: char) -> Result<(), ParseErrorKind> {
        if self.eat(want) {
            Ok(())
        } else {
            Err(ParseErrorKind::Expected(want))
        }
    }

    fn skip_ws(&mut self) {
        self.take_while(|c| c == ' ' || c == '\t');
    }

    fn take_while(&mut self, pred: impl Fn(char) -> bool) -> &'a str {
        let rest = self.rest();
        let len = rest.find(|c: char| !pred(c)).unwrap_or(rest.len());
        self.pos += len;
        &rest[..len]
    }
}
