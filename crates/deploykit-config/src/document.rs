use crate::format::ValueFormatter;
use crate::ConfigError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Section name -> (key -> decoded value).
pub type SectionMap = BTreeMap<String, BTreeMap<String, String>>;

/// One classified line of a config document.
///
/// Every variant keeps the exact source text (including a trailing `\r`) so
/// that lines untouched by a mutation are written back byte for byte.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Line {
    SectionHeader {
        name: String,
        raw: String,
    },
    KeyValue {
        key: String,
        value: String,
        raw: String,
    },
    Opaque(String),
}

impl Line {
    fn classify(raw: String, formatter: &dyn ValueFormatter) -> Self {
        let content = raw.strip_suffix('\r').unwrap_or(&raw);
        if let Some(name) = content.strip_prefix('[').and_then(|s| s.strip_suffix(']')) {
            return Line::SectionHeader {
                name: name.to_owned(),
                raw,
            };
        }
        if let Some((key, value)) = formatter.split_entry(content) {
            let (key, value) = (key.to_owned(), value.to_owned());
            return Line::KeyValue { key, value, raw };
        }
        Line::Opaque(raw)
    }

    pub fn raw(&self) -> &str {
        match self {
            Line::SectionHeader { raw, .. } | Line::KeyValue { raw, .. } | Line::Opaque(raw) => {
                raw
            }
        }
    }

    fn raw_mut(&mut self) -> &mut String {
        match self {
            Line::SectionHeader { raw, .. } | Line::KeyValue { raw, .. } | Line::Opaque(raw) => {
                raw
            }
        }
    }
}

/// Which branch of the upsert policy a [`Document::set`] call took.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SetOutcome {
    /// The key existed in the section and was rewritten in place.
    Updated,
    /// The section existed; the key was added as its last line.
    Inserted,
    /// Neither existed; a new section was appended.
    CreatedSection,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Scope {
    Outside,
    Inside,
}

/// Result of scanning for a section/key pair.
#[derive(Debug, Default)]
struct Lookup {
    /// Index of the canonical section header.
    header: Option<usize>,
    /// Exclusive end of the canonical section span.
    end: usize,
    /// Index of the first matching key line inside the span.
    key: Option<usize>,
}

/// An ordered, lossless model of a section/key-value config file.
///
/// Built fresh from text for every operation; [`Display`](fmt::Display)
/// serializes it back. Only the first header with a given name is addressed
/// by `get`/`set`/`remove`, and its span ends at the next header line.
pub struct Document<'f> {
    formatter: &'f dyn ValueFormatter,
    lines: Vec<Line>,
    final_newline: bool,
    crlf: bool,
    modified: bool,
}

impl<'f> Document<'f> {
    pub fn parse(text: &str, formatter: &'f dyn ValueFormatter) -> Self {
        let final_newline = text.ends_with('\n');
        let body = text.strip_suffix('\n').unwrap_or(text);
        let lines: Vec<Line> = if text.is_empty() {
            Vec::new()
        } else {
            body.split('\n')
                .map(|raw| Line::classify(raw.to_owned(), formatter))
                .collect()
        };
        let crlf = lines.first().is_some_and(|l| l.raw().ends_with('\r'));

        Self {
            formatter,
            lines,
            final_newline,
            crlf,
            modified: false,
        }
    }

    pub fn empty(formatter: &'f dyn ValueFormatter) -> Self {
        Self::parse("", formatter)
    }

    pub fn lines(&self) -> &[Line] {
        &self.lines
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Whether any mutation changed the document since it was parsed.
    pub fn is_modified(&self) -> bool {
        self.modified
    }

    /// Two-state scan over the canonical section of `section`.
    fn lookup(&self, section: &str, key: &str) -> Lookup {
        let mut scope = Scope::Outside;
        let mut found = Lookup {
            end: self.lines.len(),
            ..Lookup::default()
        };

        for (idx, line) in self.lines.iter().enumerate() {
            match (scope, line) {
                (Scope::Outside, Line::SectionHeader { name, .. }) if name == section => {
                    scope = Scope::Inside;
                    found.header = Some(idx);
                }
                (Scope::Inside, Line::SectionHeader { .. }) => {
                    found.end = idx;
                    break;
                }
                (Scope::Inside, Line::KeyValue { key: k, .. }) if k == key => {
                    if found.key.is_none() {
                        found.key = Some(idx);
                    }
                }
                _ => {}
            }
        }

        found
    }

    /// Decoded value of the first `key` in the canonical `[section]`.
    pub fn get(&self, section: &str, key: &str) -> Option<String> {
        let idx = self.lookup(section, key).key?;
        match &self.lines[idx] {
            Line::KeyValue { value, .. } => Some(self.formatter.decode(value).to_owned()),
            _ => None,
        }
    }

    /// Upsert `key` in `[section]`.
    pub fn set(
        &mut self,
        section: &str,
        key: &str,
        value: &str,
    ) -> Result<SetOutcome, ConfigError> {
        if section.is_empty() {
            return Err(ConfigError::EmptySection);
        }
        if key.is_empty() {
            return Err(ConfigError::EmptyKey);
        }

        let entry = self.formatter.render(key, value);
        let found = self.lookup(section, key);

        let outcome = match found {
            Lookup { key: Some(idx), .. } => {
                self.replace_line(idx, entry);
                SetOutcome::Updated
            }
            Lookup {
                header: Some(_),
                end,
                ..
            } => {
                self.insert_line(end, entry);
                SetOutcome::Inserted
            }
            Lookup { header: None, .. } => {
                if self.lines.is_empty() {
                    self.final_newline = true;
                } else {
                    self.insert_line(self.lines.len(), String::new());
                }
                self.insert_line(self.lines.len(), format!("[{section}]"));
                self.insert_line(self.lines.len(), entry);
                SetOutcome::CreatedSection
            }
        };

        Ok(outcome)
    }

    /// Drop the first `key` line of `[section]`. Returns whether a line was removed.
    pub fn remove(&mut self, section: &str, key: &str) -> bool {
        let Some(idx) = self.lookup(section, key).key else {
            return false;
        };

        self.lines.remove(idx);
        if idx == self.lines.len() && !self.final_newline {
            // The new last line must not keep a dangling carriage return.
            if let Some(last) = self.lines.last_mut() {
                if last.raw().ends_with('\r') {
                    last.raw_mut().pop();
                }
            }
        }
        self.modified = true;
        true
    }

    /// Every section (or only `section`) as a map; later duplicates win.
    pub fn get_all(&self, section: Option<&str>) -> SectionMap {
        let mut out = SectionMap::new();
        let mut current: Option<&str> = None;

        for line in &self.lines {
            match line {
                Line::SectionHeader { name, .. } => {
                    current = Some(name.as_str());
                    if section.is_none_or(|s| s == name) {
                        out.entry(name.clone()).or_default();
                    }
                }
                Line::KeyValue { key, value, .. } => {
                    let Some(name) = current else { continue };
                    if section.is_some_and(|s| s != name) {
                        continue;
                    }
                    out.entry(name.to_owned())
                        .or_default()
                        .insert(key.clone(), self.formatter.decode(value).to_owned());
                }
                Line::Opaque(_) => {}
            }
        }

        out
    }

    fn replace_line(&mut self, idx: usize, mut text: String) {
        if self.lines[idx].raw().ends_with('\r') {
            text.push('\r');
        }
        if self.lines[idx].raw() == text {
            return;
        }
        self.lines[idx] = Line::classify(text, self.formatter);
        self.modified = true;
    }

    fn insert_line(&mut self, idx: usize, mut text: String) {
        let at_end = idx == self.lines.len();
        if self.crlf {
            if at_end && !self.final_newline {
                // Keep the document ending without a line terminator.
                if let Some(last) = self.lines.last_mut() {
                    if !last.raw().ends_with('\r') {
                        last.raw_mut().push('\r');
                    }
                }
            } else {
                text.push('\r');
            }
        }
        self.lines.insert(idx, Line::classify(text, self.formatter));
        self.modified = true;
    }
}

impl fmt::Display for Document<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (idx, line) in self.lines.iter().enumerate() {
            if idx > 0 {
                f.write_str("\n")?;
            }
            f.write_str(line.raw())?;
        }
        if self.final_newline && !self.lines.is_empty() {
            f.write_str("\n")?;
        }
        Ok(())
    }
}

impl fmt::Debug for Document<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Document")
            .field("formatter", &self.formatter.name())
            .field("lines", &self.lines)
            .field("final_newline", &self.final_newline)
            .field("crlf", &self.crlf)
            .finish_non_exhaustive()
    }
}
