//! Task file format
//!
//! The task file is a JSON array of flat records, pretty-printed with
//! four-space indentation:
//!
//! ```text
//! [
//!     {
//!         "id": "1",
//!         "title": "Buy milk",
//!         "due": "2025-12-25",
//!         "priority": "low",
//!         "group": "",
//!         "done": false
//!     }
//! ]
//! ```
//!
//! Writing always produces exactly this layout. Reading is lenient: the file is
//! parsed as JSON when possible, otherwise records are recovered one at a time
//! and, inside a broken record, one field line at a time. Problems become
//! [`LoadWarning`]s; loading itself never fails.

use std::collections::HashSet;
use std::fmt;

use serde_json::{Map, Value};
use thiserror::Error;

use crate::domain::{Field, Task, TaskDraft, TaskId, ValidationError};

/// Escapes a string for embedding between double quotes in the task file.
///
/// Quote, backslash and newline become `\"`, `\\` and `\n`; every other
/// character is copied unchanged.
pub fn escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            other => out.push(other),
        }
    }
    out
}

/// Renders the full task file for `tasks`, in order
pub fn render(tasks: &[Task]) -> String {
    let mut out = String::from("[\n");

    for (i, task) in tasks.iter().enumerate() {
        let separator = if i + 1 == tasks.len() { "" } else { "," };
        out.push_str(&format!(
            concat!(
                "    {{\n",
                "        \"id\": \"{}\",\n",
                "        \"title\": \"{}\",\n",
                "        \"due\": \"{}\",\n",
                "        \"priority\": \"{}\",\n",
                "        \"group\": \"{}\",\n",
                "        \"done\": {}\n",
                "    }}{}\n",
            ),
            task.id,
            escape(&task.title),
            task.due,
            task.priority,
            escape(&task.group),
            task.done,
            separator,
        ));
    }

    out.push_str("]\n");
    out
}

/// Tasks recovered from a task file, with everything that looked wrong
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LoadReport {
    pub tasks: Vec<Task>,
    pub warnings: Vec<LoadWarning>,
}

/// What went wrong while reading part of a task file
#[derive(Debug, Clone, Error, PartialEq)]
pub enum WarningKind {
    #[error("file is not valid JSON ({0}); recovering records individually")]
    MalformedDocument(String),

    #[error("expected an array of task records")]
    NotAnArray,

    #[error("entry is not a task record")]
    NotARecord,

    #[error("record has no closing brace and was dropped")]
    UnclosedRecord,

    #[error("missing ':' after field '{0}'")]
    MissingSeparator(Field),

    #[error("could not read value of field '{0}'")]
    UnreadableValue(Field),

    #[error("could not read line")]
    UnreadableLine,

    #[error("field '{field}' should be {expected}, found {found}")]
    WrongType {
        field: Field,
        expected: &'static str,
        found: &'static str,
    },

    #[error("unknown field '{0}' ignored")]
    UnknownField(String),

    #[error("field '{0}' is missing, using {1}")]
    Defaulted(Field, &'static str),

    #[error("record skipped: field '{0}' is missing")]
    MissingRequired(Field),

    #[error("record skipped: {0}")]
    Invalid(ValidationError),

    #[error("task has no ID, assigned {0}")]
    IdAssigned(TaskId),

    #[error("task ID '{previous}' is invalid or already in use, assigned {assigned}")]
    IdReplaced { previous: String, assigned: TaskId },

    #[error("record skipped: no task IDs left to assign")]
    IdsExhausted,

    #[error("no task records found")]
    NoRecords,
}

/// A non-fatal problem found while loading, with where it was found
#[derive(Debug, Clone, PartialEq)]
pub struct LoadWarning {
    /// 1-based record number, if the problem belongs to a record
    pub record: Option<usize>,
    /// 1-based line number, when known
    pub line: Option<usize>,
    pub kind: WarningKind,
}

impl fmt::Display for LoadWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.record, self.line) {
            (Some(record), Some(line)) => write!(f, "record {} (line {}): {}", record, line, self.kind),
            (Some(record), None) => write!(f, "record {}: {}", record, self.kind),
            (None, Some(line)) => write!(f, "line {}: {}", line, self.kind),
            (None, None) => write!(f, "{}", self.kind),
        }
    }
}

/// Parses a task file leniently. Never fails; see [`LoadReport::warnings`].
pub fn parse(text: &str) -> LoadReport {
    let mut loader = Loader::default();

    if !text.trim().is_empty() {
        match serde_json::from_str::<Value>(text) {
            Ok(Value::Array(items)) => {
                for (i, item) in items.into_iter().enumerate() {
                    let at = Location::record(i + 1);
                    match item {
                        Value::Object(map) => loader.record(map, at),
                        _ => loader.warn(at, WarningKind::NotARecord),
                    }
                }
            }
            Ok(Value::Object(map)) => loader.record(map, Location::record(1)),
            Ok(_) => loader.warn(Location::default(), WarningKind::NotAnArray),
            Err(e) => {
                loader.warn(Location::default(), WarningKind::MalformedDocument(e.to_string()));
                loader.recover(text);
            }
        }
    }

    loader.finish()
}

#[derive(Debug, Clone, Copy, Default)]
struct Location {
    record: Option<usize>,
    line: Option<usize>,
}

impl Location {
    fn record(record: usize) -> Self {
        Self {
            record: Some(record),
            line: None,
        }
    }

    fn at_line(self, line: usize) -> Self {
        Self {
            line: Some(line),
            ..self
        }
    }
}

/// Raw field values collected from one record
#[derive(Debug, Default)]
struct RecordFields {
    id: Option<String>,
    title: Option<String>,
    due: Option<String>,
    priority: Option<String>,
    group: Option<String>,
    done: Option<bool>,
}

#[derive(Debug)]
enum IdState {
    Kept,
    Missing,
    Replaced(String),
}

#[derive(Debug)]
struct Accepted {
    task: Task,
    id: IdState,
    at: Location,
}

#[derive(Debug, Default)]
struct Loader {
    accepted: Vec<Accepted>,
    used_ids: HashSet<TaskId>,
    warnings: Vec<LoadWarning>,
    records: usize,
}

impl Loader {
    fn warn(&mut self, at: Location, kind: WarningKind) {
        self.warnings.push(LoadWarning {
            record: at.record,
            line: at.line,
            kind,
        });
    }

    /// Handles one parsed record
    fn record(&mut self, map: Map<String, Value>, at: Location) {
        let mut fields = RecordFields::default();
        for (key, value) in map {
            self.field(&mut fields, &key, value, at);
        }
        self.accept(fields, at);
    }

    /// Stores one key/value pair of a record
    fn field(&mut self, fields: &mut RecordFields, key: &str, value: Value, at: Location) {
        let Some(field) = Field::from_key(key) else {
            self.warn(at, WarningKind::UnknownField(key.to_string()));
            return;
        };

        if field == Field::Done {
            let done = match value {
                Value::Bool(done) => done,
                other => {
                    self.warn(
                        at,
                        WarningKind::WrongType {
                            field,
                            expected: "true or false",
                            found: describe(&other),
                        },
                    );
                    false
                }
            };
            fields.done = Some(done);
            return;
        }

        let text = match value {
            Value::String(s) => s,
            // Older files may carry numeric IDs
            Value::Number(n) if field == Field::Id => n.to_string(),
            other => {
                self.warn(
                    at,
                    WarningKind::WrongType {
                        field,
                        expected: "a string",
                        found: describe(&other),
                    },
                );
                return;
            }
        };

        match field {
            Field::Id => fields.id = Some(text),
            Field::Title => fields.title = Some(text),
            Field::Due => fields.due = Some(text),
            Field::Priority => fields.priority = Some(text),
            Field::Group => fields.group = Some(text),
            Field::Done => {}
        }
    }

    /// Validates collected fields and keeps the task if possible
    fn accept(&mut self, fields: RecordFields, at: Location) {
        self.records += 1;

        let required = [
            (Field::Title, fields.title.is_some()),
            (Field::Due, fields.due.is_some()),
            (Field::Priority, fields.priority.is_some()),
        ];
        if required.iter().any(|(_, present)| !present) {
            for (field, present) in required {
                if !present {
                    self.warn(at, WarningKind::MissingRequired(field));
                }
            }
            return;
        }

        let title = fields.title.unwrap_or_default();
        let due = fields.due.unwrap_or_default();
        let priority = fields.priority.unwrap_or_default();

        let group = fields.group.unwrap_or_else(|| {
            self.warn(at, WarningKind::Defaulted(Field::Group, "no group"));
            String::new()
        });
        let done = fields.done.unwrap_or_else(|| {
            self.warn(at, WarningKind::Defaulted(Field::Done, "false"));
            false
        });

        let (id, id_state) = match fields.id {
            None => (TaskId::FIRST, IdState::Missing),
            Some(raw) => match raw.parse::<TaskId>() {
                Ok(id) if !self.used_ids.contains(&id) => (id, IdState::Kept),
                _ => (TaskId::FIRST, IdState::Replaced(raw)),
            },
        };

        let draft = TaskDraft {
            title,
            due,
            priority,
            group,
            done,
        };

        match draft.validate(id) {
            Ok(task) => {
                if let IdState::Kept = id_state {
                    self.used_ids.insert(task.id);
                }
                self.accepted.push(Accepted {
                    task,
                    id: id_state,
                    at,
                });
            }
            Err(e) => self.warn(at, WarningKind::Invalid(e)),
        }
    }

    /// Recovers records from text that is not valid JSON
    fn recover(&mut self, text: &str) {
        let mut number = 0;

        for segment in split_records(text) {
            match segment {
                Segment::Closed { text, line } => {
                    number += 1;
                    let at = Location::record(number).at_line(line);
                    match serde_json::from_str::<Map<String, Value>>(text) {
                        Ok(map) => self.record(map, at),
                        Err(_) => {
                            let fields = self.record_entries(text, line, at);
                            self.accept(fields, at);
                        }
                    }
                }
                Segment::Unclosed { line } => {
                    self.warn(Location::default().at_line(line), WarningKind::UnclosedRecord)
                }
            }
        }
    }

    /// Reads a broken record one `"key": value` entry at a time
    fn record_entries(&mut self, text: &str, first_line: usize, at: Location) -> RecordFields {
        let mut fields = RecordFields::default();

        // Strip the braces; both are single bytes
        let body = &text[1..text.len() - 1];

        for (entry, line) in split_entries(body, first_line) {
            let at = at.at_line(line);

            match serde_json::from_str::<Map<String, Value>>(&format!("{{{}}}", entry)) {
                Ok(map) => {
                    for (key, value) in map {
                        self.field(&mut fields, &key, value, at);
                    }
                }
                Err(_) => {
                    let kind = match leading_key(entry) {
                        Some((field, rest)) if !rest.trim_start().starts_with(':') => {
                            WarningKind::MissingSeparator(field)
                        }
                        Some((field, _)) => WarningKind::UnreadableValue(field),
                        None => WarningKind::UnreadableLine,
                    };
                    self.warn(at, kind);
                }
            }
        }

        fields
    }

    /// Assigns IDs where needed and produces the report
    fn finish(mut self) -> LoadReport {
        if self.records == 0 {
            self.warn(Location::default(), WarningKind::NoRecords);
        }

        let mut next = TaskId::next_after(self.used_ids.iter().copied());
        let mut tasks = Vec::with_capacity(self.accepted.len());

        for Accepted { mut task, id, at } in std::mem::take(&mut self.accepted) {
            if !matches!(id, IdState::Kept) {
                let Some(assigned) = next else {
                    self.warn(at, WarningKind::IdsExhausted);
                    continue;
                };
                task.id = assigned;
                next = assigned.next();

                let kind = match id {
                    IdState::Replaced(previous) => WarningKind::IdReplaced { previous, assigned },
                    _ => WarningKind::IdAssigned(assigned),
                };
                self.warn(at, kind);
            }
            tasks.push(task);
        }

        LoadReport {
            tasks,
            warnings: self.warnings,
        }
    }
}

fn describe(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// Returns the known field an entry starts with, and the text after its key
fn leading_key(entry: &str) -> Option<(Field, &str)> {
    let rest = entry.strip_prefix('"')?;
    Field::ALL.into_iter().find_map(|field| {
        rest.strip_prefix(field.key())
            .and_then(|r| r.strip_prefix('"'))
            .map(|r| (field, r))
    })
}

/// Tracks string literals while scanning a task file.
///
/// A string also ends at a raw newline, which the writer never produces, so
/// one unterminated string cannot swallow the rest of the file.
#[derive(Debug, Default)]
struct Strings {
    inside: bool,
    escaped: bool,
}

impl Strings {
    /// Feeds one character; returns true if it is part of a string literal
    fn feed(&mut self, c: char) -> bool {
        if c == '\n' {
            self.inside = false;
            self.escaped = false;
            return false;
        }

        if self.inside {
            if self.escaped {
                self.escaped = false;
            } else if c == '\\' {
                self.escaped = true;
            } else if c == '"' {
                self.inside = false;
            }
            return true;
        }

        if c == '"' {
            self.inside = true;
            return true;
        }
        false
    }
}

#[derive(Debug, PartialEq)]
enum Segment<'a> {
    /// Text of a record including its braces, and the line it starts on
    Closed { text: &'a str, line: usize },
    /// A record that was still open at the next record or at end of input
    Unclosed { line: usize },
}

/// Splits text into brace-delimited records.
///
/// Braces inside strings are ignored. Inside a record, a `{` in value position
/// (after `:` or inside an array) opens a nested object; any other `{`
/// abandons the open record and starts a new one.
fn split_records(text: &str) -> Vec<Segment<'_>> {
    let mut segments = Vec::new();
    let mut open: Option<(usize, usize)> = None;
    // Arrays and objects nested in the open record
    let mut nested: Vec<char> = Vec::new();
    let mut strings = Strings::default();
    let mut previous = ' ';
    let mut line = 1;

    for (i, c) in text.char_indices() {
        if c == '\n' {
            line += 1;
        }
        if strings.feed(c) {
            previous = '"';
            continue;
        }
        if c.is_whitespace() {
            continue;
        }

        match c {
            '{' if open.is_some() && (previous == ':' || nested.last() == Some(&'[')) => {
                nested.push('{');
            }
            '{' => {
                if let Some((_, start_line)) = open {
                    segments.push(Segment::Unclosed { line: start_line });
                }
                open = Some((i, line));
                nested.clear();
            }
            '[' if open.is_some() => nested.push('['),
            ']' if nested.last() == Some(&'[') => {
                nested.pop();
            }
            '}' => match nested.iter().rposition(|&n| n == '{') {
                Some(pos) => nested.truncate(pos),
                None => {
                    nested.clear();
                    if let Some((start, start_line)) = open.take() {
                        segments.push(Segment::Closed {
                            text: &text[start..=i],
                            line: start_line,
                        });
                    }
                }
            },
            _ => {}
        }
        previous = c;
    }

    if let Some((_, start_line)) = open {
        segments.push(Segment::Unclosed { line: start_line });
    }

    segments
}

/// Splits a record body into `"key": value` entries, each with its line.
///
/// Entries end at a comma or a line break outside strings and nested values,
/// so both the one-field-per-line layout and compact records work.
fn split_entries(body: &str, first_line: usize) -> Vec<(&str, usize)> {
    let mut entries = Vec::new();
    let mut strings = Strings::default();
    let mut depth = 0usize;
    let mut start = 0;
    let mut start_line = first_line;
    let mut line = first_line;

    for (i, c) in body.char_indices() {
        let in_string = strings.feed(c);

        if !in_string && depth == 0 && (c == ',' || c == '\n') {
            push_entry(&mut entries, &body[start..i], start_line);
            // Both separators are single bytes
            start = i + 1;
            start_line = if c == '\n' { line + 1 } else { line };
        } else if !in_string {
            match c {
                '{' | '[' => depth += 1,
                '}' | ']' => depth = depth.saturating_sub(1),
                _ => {}
            }
        }

        if c == '\n' {
            line += 1;
        }
    }
    push_entry(&mut entries, &body[start..], start_line);

    entries
}

fn push_entry<'a>(entries: &mut Vec<(&'a str, usize)>, raw: &'a str, line: usize) {
    let entry = raw.trim();
    if entry.is_empty() {
        return;
    }
    let leading = &raw[..raw.len() - raw.trim_start().len()];
    entries.push((entry, line + leading.matches('\n').count()));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Priority;
    use proptest::prelude::*;

    fn task(id: u32, title: &str, due: &str, priority: &str, group: &str, done: bool) -> Task {
        TaskDraft::new(title, due, priority)
            .group(group)
            .done(done)
            .validate(TaskId::new(id).unwrap())
            .unwrap()
    }

    fn kinds(report: &LoadReport) -> Vec<&WarningKind> {
        report.warnings.iter().map(|w| &w.kind).collect()
    }

    const SINGLE: &str = r#"[
    {
        "id": "1",
        "title": "Buy milk",
        "due": "2025-12-25",
        "priority": "low",
        "group": "",
        "done": false
    }
]
"#;

    #[test]
    fn escape_plain_text_is_unchanged() {
        assert_eq!(escape("test"), "test");
        assert_eq!(escape("Купить молоко"), "Купить молоко");
    }

    #[test]
    fn escape_quotes_and_backslashes_independently() {
        assert_eq!(escape("\"quote\\\""), "\\\"quote\\\\\\\"");
        assert_eq!(escape("\\\\double\\"), "\\\\\\\\double\\\\");
    }

    #[test]
    fn escape_newline_as_two_characters() {
        let escaped = escape("line\nbreak");
        assert_eq!(escaped, "line\\nbreak");
        assert!(!escaped.contains('\n'));
    }

    #[test]
    fn render_matches_layout() {
        let rendered = render(&[task(1, "Buy milk", "2025-12-25", "low", "", false)]);
        assert_eq!(rendered, SINGLE);
    }

    #[test]
    fn render_separates_records_with_commas() {
        let rendered = render(&[
            task(1, "a", "2025-01-01", "low", "", false),
            task(2, "b", "2025-01-02", "high", "work", true),
        ]);

        assert!(rendered.contains("    },\n    {\n"));
        assert!(rendered.ends_with("        \"done\": true\n    }\n]\n"));

        // The output is plain JSON
        let value: Value = serde_json::from_str(&rendered).unwrap();
        assert_eq!(value.as_array().unwrap().len(), 2);
        assert_eq!(value[1]["id"], "2");
    }

    #[test]
    fn render_empty_collection() {
        assert_eq!(render(&[]), "[\n]\n");
    }

    #[test]
    fn parse_single_task() {
        let report = parse(SINGLE);

        assert!(report.warnings.is_empty(), "{:?}", report.warnings);
        assert_eq!(report.tasks.len(), 1);
        let t = &report.tasks[0];
        assert_eq!(t.id.get(), 1);
        assert_eq!(t.title, "Buy milk");
        assert_eq!(t.due.to_string(), "2025-12-25");
        assert_eq!(t.priority, Priority::Low);
        assert_eq!(t.group, "");
        assert!(!t.done);
    }

    #[test]
    fn parse_keeps_file_order() {
        let tasks = vec![
            task(3, "c", "2025-01-03", "mid", "", true),
            task(1, "a", "2025-01-01", "low", "work", false),
            task(2, "b", "2025-01-02", "high", "home", false),
        ];
        let report = parse(&render(&tasks));
        assert_eq!(report.tasks, tasks);
    }

    #[test]
    fn parse_tolerates_compact_layout() {
        let text = r#"[{"id":"1","title":"a","due":"2025-01-01","priority":"low","group":"","done":true}]"#;
        let report = parse(text);
        assert!(report.warnings.is_empty());
        assert!(report.tasks[0].done);
    }

    #[test]
    fn empty_inputs_warn_without_failing() {
        for text in ["", "   \n", "[]", "[\n]\n"] {
            let report = parse(text);
            assert!(report.tasks.is_empty(), "{text:?}");
            assert_eq!(kinds(&report), vec![&WarningKind::NoRecords], "{text:?}");
        }
    }

    #[test]
    fn garbage_yields_empty_collection_and_warnings() {
        let report = parse("this is not json at all");
        assert!(report.tasks.is_empty());
        assert!(matches!(report.warnings[0].kind, WarningKind::MalformedDocument(_)));
        assert_eq!(report.warnings.last().unwrap().kind, WarningKind::NoRecords);
    }

    #[test]
    fn missing_separator_skips_only_that_field() {
        let text = r#"[
    {
        "id": "1",
        "title": "Buy milk",
        "due": "2025-12-25",
        "priority": "low",
        "group" "home",
        "done": true
    },
    {
        "id": "2",
        "title": "Walk dog",
        "due": "2025-12-26",
        "priority": "mid",
        "group": "home",
        "done": false
    }
]
"#;
        let report = parse(text);

        assert_eq!(report.tasks.len(), 2);
        assert_eq!(report.tasks[0].group, "");
        assert!(report.tasks[0].done);
        assert_eq!(report.tasks[1].title, "Walk dog");

        let separator = report
            .warnings
            .iter()
            .find(|w| w.kind == WarningKind::MissingSeparator(Field::Group))
            .expect("separator warning");
        assert_eq!(separator.line, Some(7));
        assert_eq!(separator.record, Some(1));

        assert!(kinds(&report).contains(&&WarningKind::Defaulted(Field::Group, "no group")));
    }

    #[test]
    fn missing_required_field_skips_record() {
        let text = r#"[
    {
        "id": "1",
        "title" "Broken",
        "due": "2025-12-25",
        "priority": "low",
        "group": "",
        "done": false
    },
    {
        "id": "2",
        "title": "Fine",
        "due": "2025-12-26",
        "priority": "high",
        "group": "",
        "done": false
    }
]"#;
        let report = parse(text);

        assert_eq!(report.tasks.len(), 1);
        assert_eq!(report.tasks[0].title, "Fine");
        assert!(kinds(&report).contains(&&WarningKind::MissingRequired(Field::Title)));
    }

    #[test]
    fn invalid_values_are_rejected_not_normalized() {
        let text = r#"[
    {"id": "1", "title": "Bad priority", "due": "2025-12-25", "priority": "urgent", "group": "", "done": false},
    {"id": "2", "title": "Bad date", "due": "2025-02-30", "priority": "low", "group": "", "done": false},
    {"id": "3", "title": "Good", "due": "2025-02-28", "priority": "low", "group": "", "done": false}
]"#;
        let report = parse(text);

        assert_eq!(report.tasks.len(), 1);
        assert_eq!(report.tasks[0].title, "Good");

        let invalid: Vec<_> = report
            .warnings
            .iter()
            .filter_map(|w| match &w.kind {
                WarningKind::Invalid(e) => Some((w.record, e.field())),
                _ => None,
            })
            .collect();
        assert_eq!(invalid, vec![(Some(1), Field::Priority), (Some(2), Field::Due)]);
    }

    #[test]
    fn bad_done_value_defaults_to_false() {
        let text = r#"[{"id": "1", "title": "a", "due": "2025-01-01", "priority": "low", "group": "", "done": "yes"}]"#;
        let report = parse(text);

        assert!(!report.tasks[0].done);
        assert_eq!(
            kinds(&report),
            vec![&WarningKind::WrongType {
                field: Field::Done,
                expected: "true or false",
                found: "a string",
            }]
        );
    }

    #[test]
    fn duplicate_and_missing_ids_get_fresh_ones() {
        let text = r#"[
    {"id": "4", "title": "a", "due": "2025-01-01", "priority": "low", "group": "", "done": false},
    {"id": "4", "title": "b", "due": "2025-01-01", "priority": "low", "group": "", "done": false},
    {"title": "c", "due": "2025-01-01", "priority": "low", "group": "", "done": false},
    {"id": 2, "title": "d", "due": "2025-01-01", "priority": "low", "group": "", "done": false}
]"#;
        let report = parse(text);

        let ids: Vec<u32> = report.tasks.iter().map(|t| t.id.get()).collect();
        assert_eq!(ids, vec![4, 5, 6, 2]);
        assert!(kinds(&report).contains(&&WarningKind::IdReplaced {
            previous: "4".to_string(),
            assigned: TaskId::new(5).unwrap(),
        }));
        assert!(kinds(&report).contains(&&WarningKind::IdAssigned(TaskId::new(6).unwrap())));
    }

    #[test]
    fn unknown_fields_are_ignored() {
        let text = r#"[{"id": "1", "title": "a", "due": "2025-01-01", "priority": "low", "group": "", "done": false, "tags": []}]"#;
        let report = parse(text);
        assert_eq!(report.tasks.len(), 1);
        assert_eq!(kinds(&report), vec![&WarningKind::UnknownField("tags".to_string())]);
    }

    #[test]
    fn unclosed_record_is_dropped() {
        let text = "[\n    {\n        \"id\": \"1\",\n        \"title\": \"a\",\n";
        let report = parse(text);

        assert!(report.tasks.is_empty());
        assert!(report
            .warnings
            .iter()
            .any(|w| w.kind == WarningKind::UnclosedRecord && w.line == Some(2)));
    }

    #[test]
    fn escaped_text_survives_recovery() {
        let text = r#"[
    {
        "id": "1",
        "title": "say \"hi\" {now}\nthen \\ leave",
        "due": "2025-01-01",
        "priority": "low",
        "group": "",
        "done": false
    },
    {
        "id": "2"
        "title": "missing comma above",
    }
]"#;
        let report = parse(text);

        assert_eq!(report.tasks[0].title, "say \"hi\" {now}\nthen \\ leave");
    }

    #[test]
    fn compact_record_keeps_fields_around_missing_separator() {
        let text = r#"[{"id": "1", "title": "a", "due": "2025-01-01", "priority": "low", "group" "home", "done": true},
{"id": "2", "title": "ok", "due": "2025-01-02", "priority": "mid", "group": "", "done": false}]
"#;
        let report = parse(text);

        assert_eq!(report.tasks.len(), 2);
        let first = &report.tasks[0];
        assert_eq!(first.id.get(), 1);
        assert_eq!(first.due.to_string(), "2025-01-01");
        assert_eq!(first.group, "");
        assert!(first.done);

        let separator = report
            .warnings
            .iter()
            .find(|w| w.kind == WarningKind::MissingSeparator(Field::Group))
            .expect("separator warning");
        assert_eq!((separator.record, separator.line), (Some(1), Some(1)));
    }

    #[test]
    fn compact_record_blames_the_broken_field() {
        let text = r#"[{"id": "1", "title" "x", "due": "2025-01-01", "priority": "low", "group": "", "done": false},
{"id": "2", "title": "ok", "due": "2025-01-02", "priority": "mid", "group": "", "done": false}]"#;
        let report = parse(text);

        let titles: Vec<&str> = report.tasks.iter().map(|t| t.title.as_str()).collect();
        assert_eq!(titles, vec!["ok"]);

        let record_one: Vec<&WarningKind> = report
            .warnings
            .iter()
            .filter(|w| w.record == Some(1))
            .map(|w| &w.kind)
            .collect();
        assert_eq!(
            record_one,
            vec![
                &WarningKind::MissingSeparator(Field::Title),
                &WarningKind::MissingRequired(Field::Title),
            ]
        );
    }

    #[test]
    fn two_fields_on_one_line_are_read_separately() {
        let text = r#"[
    {
        "id": "1",
        "title": "a",
        "due": "2025-01-01", "priority": "high",
        "group" "home", "done": true
    }
"#;
        let report = parse(text);

        assert_eq!(report.tasks.len(), 1);
        let task = &report.tasks[0];
        assert_eq!(task.priority, Priority::High);
        assert!(task.done);
        assert_eq!(task.group, "");

        let separator = report
            .warnings
            .iter()
            .find(|w| w.kind == WarningKind::MissingSeparator(Field::Group))
            .expect("separator warning");
        assert_eq!(separator.line, Some(6));
    }

    #[test]
    fn nested_value_stays_inside_its_record() {
        let text = r#"[
    {
        "id": "1",
        "title": "a",
        "meta": {"x": 1, "y": [{"z": 2}]},
        "due": "2025-01-01",
        "priority": "low",
        "group" "",
        "done": false
    }
"#;
        let report = parse(text);

        assert_eq!(report.tasks.len(), 1);
        assert_eq!(report.tasks[0].title, "a");
        assert!(kinds(&report).contains(&&WarningKind::UnknownField("meta".to_string())));
        assert!(!kinds(&report).contains(&&WarningKind::UnclosedRecord));
    }

    #[test]
    fn split_entries_handles_both_layouts() {
        let compact = r#""id": "1", "title": "a, b", "meta": {"x": 1, "y": 2}"#;
        assert_eq!(
            split_entries(compact, 4),
            vec![
                (r#""id": "1""#, 4),
                (r#""title": "a, b""#, 4),
                (r#""meta": {"x": 1, "y": 2}"#, 4),
            ]
        );

        let pretty = "\n        \"id\": \"1\",\n        \"title\": \"a\"\n    ";
        assert_eq!(
            split_entries(pretty, 2),
            vec![("\"id\": \"1\"", 3), ("\"title\": \"a\"", 4)]
        );
    }

    #[test]
    fn split_records_ignores_braces_in_strings() {
        let text = "[{\"title\": \"a } b\"}, {\"title\": \"c\"}]";
        let segments = split_records(text);
        assert_eq!(
            segments,
            vec![
                Segment::Closed {
                    text: "{\"title\": \"a } b\"}",
                    line: 1
                },
                Segment::Closed {
                    text: "{\"title\": \"c\"}",
                    line: 1
                },
            ]
        );
    }

    #[test]
    fn warning_display_includes_location() {
        let warning = LoadWarning {
            record: Some(2),
            line: Some(9),
            kind: WarningKind::MissingSeparator(Field::Due),
        };
        assert_eq!(warning.to_string(), "record 2 (line 9): missing ':' after field 'due'");
    }

    fn arb_text() -> impl Strategy<Value = String> {
        // Printable text plus the characters the escaping rule covers
        "[a-zA-Z0-9 \"\\\\\n{}:,\\[\\]äß€]{0,24}"
    }

    fn arb_task() -> impl Strategy<Value = (String, (u16, u8, u8), u8, String, bool)> {
        (
            arb_text().prop_filter("title must not be blank", |t| !t.trim().is_empty()),
            (1u16..=9999, 1u8..=12, 1u8..=28),
            0u8..3,
            arb_text(),
            any::<bool>(),
        )
    }

    proptest! {
        #[test]
        fn render_then_parse_round_trips(cases in prop::collection::vec(arb_task(), 0..8)) {
            let tasks: Vec<Task> = cases
                .into_iter()
                .enumerate()
                .map(|(i, (title, (y, m, d), p, group, done))| {
                    let due = format!("{:04}-{:02}-{:02}", y, m, d);
                    let priority = ["low", "mid", "high"][p as usize];
                    task(i as u32 + 1, &title, &due, priority, &group, done)
                })
                .collect();

            let report = parse(&render(&tasks));
            prop_assert_eq!(report.tasks, tasks.clone());

            let no_records: Vec<_> = report.warnings.iter().filter(|w| w.kind != WarningKind::NoRecords).collect();
            prop_assert!(no_records.is_empty(), "unexpected warnings: {:?}", no_records);
        }
    }
}
