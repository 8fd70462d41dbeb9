use crate::error;
use crate::lang::{normalize, Error, LineNumber};
use std::collections::BTreeMap;
use std::ops::Bound;

type Result<T> = std::result::Result<T, Error>;

/// ## Program storage
///
/// Numbered lines of normalized statement text, plus the DATA cache: a
/// flattened, program-order list of the literal items of every DATA
/// statement, with a read cursor. The cache is rebuilt lazily whenever
/// the program has changed.
#[derive(Debug, Default)]
pub struct Program {
    lines: BTreeMap<LineNumber, String>,
    data: Vec<(LineNumber, String)>,
    data_cursor: usize,
    data_stale: bool,
}

impl Program {
    pub fn new() -> Program {
        Program::default()
    }

    /// Store a line, replacing any existing one. Empty text deletes,
    /// matching how a bare line number is typed to remove a line.
    /// Line zero is reserved and ignored.
    pub fn store(&mut self, number: LineNumber, text: &str) {
        if number == 0 {
            return;
        }
        let text = text.trim();
        if text.is_empty() {
            self.lines.remove(&number);
        } else {
            self.lines.insert(number, normalize(text));
        }
        self.data_stale = true;
    }

    pub fn delete(&mut self, number: LineNumber) {
        self.lines.remove(&number);
        self.data_stale = true;
    }

    pub fn clear(&mut self) {
        self.lines.clear();
        self.data.clear();
        self.data_cursor = 0;
        self.data_stale = false;
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn has_line(&self, number: LineNumber) -> bool {
        self.lines.contains_key(&number)
    }

    pub fn text(&self, number: LineNumber) -> Option<&str> {
        self.lines.get(&number).map(|s| s.as_str())
    }

    pub fn first_line(&self) -> Option<LineNumber> {
        self.lines.keys().next().copied()
    }

    pub fn line_after(&self, number: LineNumber) -> Option<LineNumber> {
        self.lines
            .range((Bound::Excluded(number), Bound::Unbounded))
            .next()
            .map(|(n, _)| *n)
    }

    pub fn lines(&self) -> impl Iterator<Item = (LineNumber, &str)> {
        self.lines.iter().map(|(n, s)| (*n, s.as_str()))
    }

    /// Listing for a range of lines, `"<number> <text>"` per entry.
    pub fn list(&self, from: Option<LineNumber>, to: Option<LineNumber>) -> Vec<String> {
        let from = from.unwrap_or(0);
        let to = to.unwrap_or(LineNumber::max_value());
        if from > to {
            return vec![];
        }
        self.lines
            .range(from..=to)
            .map(|(n, s)| format!("{} {}", n, s))
            .collect()
    }

    /// Pull the next DATA item in program order.
    pub fn read_data(&mut self) -> Result<String> {
        self.refresh_data();
        match self.data.get(self.data_cursor) {
            Some((_, item)) => {
                self.data_cursor += 1;
                Ok(item.clone())
            }
            None => Err(error!(Runtime; "Out of data")),
        }
    }

    /// Reposition the DATA cursor to the first item at or after the
    /// given line, or to the start when no line is given.
    pub fn restore_data(&mut self, line: Option<LineNumber>) {
        self.refresh_data();
        self.data_cursor = match line {
            None => 0,
            Some(line) => self
                .data
                .iter()
                .position(|(n, _)| *n >= line)
                .unwrap_or_else(|| self.data.len()),
        };
    }

    /// Raw cursor value, saved when a timer interrupt fires and put
    /// back by the handler's RETURN.
    pub fn data_cursor(&self) -> usize {
        self.data_cursor
    }

    pub fn set_data_cursor(&mut self, cursor: usize) {
        self.data_cursor = cursor;
    }

    fn refresh_data(&mut self) {
        if !self.data_stale {
            return;
        }
        self.data.clear();
        self.data_cursor = 0;
        self.data_stale = false;
        let mut items = vec![];
        for (number, text) in &self.lines {
            for statement in split_statements(text) {
                if let Some(list) = data_list(statement) {
                    for item in split_items(list) {
                        items.push((*number, item));
                    }
                }
            }
        }
        self.data = items;
    }
}

/// Split a line on `:` at the top level; colons inside string literals
/// do not separate statements.
fn split_statements(text: &str) -> Vec<&str> {
    let mut out = vec![];
    let mut start = 0;
    let mut quoted = false;
    for (index, ch) in text.char_indices() {
        match ch {
            '"' => quoted = !quoted,
            ':' if !quoted => {
                out.push(&text[start..index]);
                start = index + 1;
            }
            _ => {}
        }
    }
    out.push(&text[start..]);
    out
}

/// The item list of a DATA statement, or None for anything else.
fn data_list(statement: &str) -> Option<&str> {
    let trimmed = statement.trim_start();
    if trimmed.len() < 4 || !trimmed.as_bytes()[..4].eq_ignore_ascii_case(b"DATA") {
        return None;
    }
    let rest = &trimmed[4..];
    match rest.chars().next() {
        None => Some(rest),
        Some(c) if c.is_ascii_alphanumeric() || c == '_' || c == '$' || c == '%' => None,
        Some(_) => Some(rest),
    }
}

/// Comma-separated items; quoted items keep embedded commas and shed
/// their quotes, unquoted items are trimmed raw text.
fn split_items(list: &str) -> Vec<String> {
    let mut out = vec![];
    let mut item = String::new();
    let mut chars = list.chars().peekable();
    let mut quoted = false;
    while let Some(ch) = chars.next() {
        match ch {
            '"' => {
                if quoted && chars.peek() == Some(&'"') {
                    chars.next();
                    item.push('"');
                } else {
                    quoted = !quoted;
                }
            }
            ',' if !quoted => {
                out.push(finish_item(&item));
                item.clear();
            }
            _ => item.push(ch),
        }
    }
    out.push(finish_item(&item));
    out
}

fn finish_item(item: &str) -> String {
    item.trim().to_string()
}
