//! Log entries and the loader that turns a JSON-per-line file into them.
//!
//! Each line is decoded independently into a [`Record`]. Malformed lines are
//! skipped rather than ending ingestion, and records that lack the usual
//! timestamp/level/message keys are still admitted with empty values.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

use chrono::{DateTime, TimeZone, Utc};
use serde_json::{Map, Value};
use tracing::{info, warn};

const TIMESTAMP_KEYS: [&str; 3] = ["time", "timestamp", "ts"];
const LEVEL_KEYS: [&str; 2] = ["level", "lvl"];
const MESSAGE_KEYS: [&str; 2] = ["message", "msg"];

/// A single decoded log record
#[derive(Clone, Debug, PartialEq)]
pub struct LogEntry {
    pub timestamp: Option<DateTime<Utc>>,
    pub level: String,
    pub message: String,
    /// The whole decoded record, used for queries and the detail pane
    pub fields: Map<String, Value>,
}

impl LogEntry {
    /// Build an entry from a decoded JSON object
    pub fn from_fields(fields: Map<String, Value>) -> Self {
        let timestamp = first_present(&fields, &TIMESTAMP_KEYS).and_then(parse_timestamp);
        let level = first_present(&fields, &LEVEL_KEYS)
            .map(value_text)
            .unwrap_or_default();
        let message = first_present(&fields, &MESSAGE_KEYS)
            .map(value_text)
            .unwrap_or_default();

        Self { timestamp, level, message, fields }
    }

    /// Whether the message carries ANSI escape sequences
    pub fn has_ansi(&self) -> bool {
        self.message.contains('\x1b')
    }
}

fn first_present<'a>(fields: &'a Map<String, Value>, keys: &[&str]) -> Option<&'a Value> {
    keys.iter().find_map(|key| fields.get(*key))
}

fn value_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

/// Timestamps are either RFC 3339 strings or epoch milliseconds
fn parse_timestamp(value: &Value) -> Option<DateTime<Utc>> {
    match value {
        Value::String(s) => DateTime::parse_from_rfc3339(s)
            .ok()
            .map(|dt| dt.with_timezone(&Utc)),
        Value::Number(n) => {
            let millis = n.as_i64().or_else(|| n.as_f64().map(|f| f as i64))?;
            Utc.timestamp_millis_opt(millis).single()
        }
        _ => None,
    }
}

/// Why a line was not admitted
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SkipReason {
    /// The line is not valid JSON
    Malformed(String),
    /// Valid JSON, but not an object
    NotAnObject,
}

impl std::fmt::Display for SkipReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SkipReason::Malformed(err) => write!(f, "malformed JSON: {}", err),
            SkipReason::NotAnObject => write!(f, "record is not a JSON object"),
        }
    }
}

/// Outcome of decoding one line
#[derive(Debug)]
pub enum Record {
    Parsed(LogEntry),
    Skipped(SkipReason),
}

impl Record {
    /// Decode one line; invalid UTF-8 counts as malformed
    pub fn decode(line: &[u8]) -> Self {
        match serde_json::from_slice::<Value>(line) {
            Ok(Value::Object(fields)) => Record::Parsed(LogEntry::from_fields(fields)),
            Ok(_) => Record::Skipped(SkipReason::NotAnObject),
            Err(err) => Record::Skipped(SkipReason::Malformed(err.to_string())),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("unable to locate file {}", path.display())]
    NotFound { path: PathBuf },
    #[error("failed to read {}: {source}", path.display())]
    Io { path: PathBuf, source: std::io::Error },
}

/// Immutable, ordered entries in file order
#[derive(Debug, Default)]
pub struct EntryStore {
    entries: Vec<LogEntry>,
}

impl EntryStore {
    pub fn new(entries: Vec<LogEntry>) -> Self {
        Self { entries }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&LogEntry> {
        self.entries.get(index)
    }

    pub fn iter(&self) -> impl Iterator<Item = &LogEntry> {
        self.entries.iter()
    }
}

/// Result of loading a file: the entries plus what was dropped along the way
#[derive(Debug)]
pub struct LoadReport {
    pub store: EntryStore,
    /// 1-based line numbers paired with the reason each was skipped
    pub skipped: Vec<(usize, SkipReason)>,
}

impl LoadReport {
    /// Summary for the status line, if anything was skipped
    pub fn summary(&self) -> Option<String> {
        match self.skipped.len() {
            0 => None,
            1 => Some("Skipped 1 malformed record".to_string()),
            n => Some(format!("Skipped {} malformed records", n)),
        }
    }
}

/// Decode records from any buffered reader.
///
/// Lines are read as raw bytes. Invalid UTF-8 is a malformed record like any
/// other; only I/O failures end the read.
pub fn read_entries<R: BufRead>(mut reader: R) -> std::io::Result<LoadReport> {
    let mut entries = Vec::new();
    let mut skipped = Vec::new();
    let mut buf = Vec::new();
    let mut line_no = 0usize;

    loop {
        buf.clear();
        if reader.read_until(b'\n', &mut buf)? == 0 {
            break;
        }
        line_no += 1;

        let line = buf.trim_ascii();
        if line.is_empty() {
            continue;
        }
        match Record::decode(line) {
            Record::Parsed(entry) => entries.push(entry),
            Record::Skipped(reason) => {
                warn!(line = line_no, %reason, "Skipping log record");
                skipped.push((line_no, reason));
            }
        }
    }

    Ok(LoadReport { store: EntryStore::new(entries), skipped })
}

/// Load a log file from disk
pub fn load(path: &Path) -> Result<LoadReport, LoadError> {
    let file = File::open(path).map_err(|source| {
        if source.kind() == std::io::ErrorKind::NotFound {
            LoadError::NotFound { path: path.to_path_buf() }
        } else {
            LoadError::Io { path: path.to_path_buf(), source }
        }
    })?;

    let report = read_entries(BufReader::new(file)).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    info!(
        path = %path.display(),
        entries = report.store.len(),
        skipped = report.skipped.len(),
        "Loaded log file"
    );
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Cursor, Write};

    #[test]
    fn test_decode_rfc3339_entry() {
        let line = r#"{"time":"2021-03-04T05:06:07Z","level":"info","message":"started","port":8080}"#;
        let Record::Parsed(entry) = Record::decode(line.as_bytes()) else {
            panic!("expected parsed record");
        };
        assert_eq!(entry.level, "info");
        assert_eq!(entry.message, "started");
        assert_eq!(
            entry.timestamp,
            Some(Utc.with_ymd_and_hms(2021, 3, 4, 5, 6, 7).unwrap())
        );
        assert_eq!(entry.fields.get("port"), Some(&Value::from(8080)));
    }

    #[test]
    fn test_decode_epoch_millis() {
        let Record::Parsed(entry) = Record::decode(br#"{"time":1000,"level":"warn","message":"x"}"#) else {
            panic!("expected parsed record");
        };
        assert_eq!(entry.timestamp, Utc.timestamp_millis_opt(1000).single());
    }

    #[test]
    fn test_missing_fields_are_defaulted() {
        let Record::Parsed(entry) = Record::decode(br#"{"user":"bob"}"#) else {
            panic!("expected parsed record");
        };
        assert_eq!(entry.timestamp, None);
        assert_eq!(entry.level, "");
        assert_eq!(entry.message, "");
        assert_eq!(entry.fields.len(), 1);
    }

    #[test]
    fn test_alternate_keys() {
        let Record::Parsed(entry) = Record::decode(br#"{"ts":"bogus","lvl":"debug","msg":42}"#) else {
            panic!("expected parsed record");
        };
        assert_eq!(entry.timestamp, None);
        assert_eq!(entry.level, "debug");
        assert_eq!(entry.message, "42");
    }

    #[test]
    fn test_non_object_is_skipped() {
        assert!(matches!(Record::decode(b"[1,2]"), Record::Skipped(SkipReason::NotAnObject)));
        assert!(matches!(Record::decode(b"{nope"), Record::Skipped(SkipReason::Malformed(_))));
    }

    #[test]
    fn test_malformed_line_does_not_truncate() {
        let input = "{\"level\":\"info\",\"message\":\"a\"}\n\
                     not json\n\
                     \n\
                     {\"level\":\"error\",\"message\":\"b\"}\n";
        let report = read_entries(Cursor::new(input)).unwrap();

        assert_eq!(report.store.len(), 2);
        assert_eq!(report.store.get(1).unwrap().message, "b");
        assert_eq!(report.skipped.len(), 1);
        assert_eq!(report.skipped[0].0, 2);
        assert_eq!(report.summary().as_deref(), Some("Skipped 1 malformed record"));
    }

    #[test]
    fn test_invalid_utf8_line_is_skipped() {
        let mut input = b"{\"level\":\"info\",\"message\":\"a\"}\n".to_vec();
        input.extend_from_slice(b"{\"message\":\"\xff\xfe\"}\n");
        input.extend_from_slice(b"{\"level\":\"error\",\"message\":\"b\"}\r\n");
        let report = read_entries(Cursor::new(input)).unwrap();

        assert_eq!(report.store.len(), 2);
        assert_eq!(report.store.get(0).unwrap().message, "a");
        assert_eq!(report.store.get(1).unwrap().message, "b");
        assert_eq!(report.skipped.len(), 1);
        assert_eq!(report.skipped[0].0, 2);
        assert!(matches!(report.skipped[0].1, SkipReason::Malformed(_)));
    }

    #[test]
    fn test_load_file_with_invalid_utf8() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"\xff\xff not json\n{\"level\":\"info\",\"message\":\"ok\"}").unwrap();

        let report = load(file.path()).unwrap();
        assert_eq!(report.store.len(), 1);
        assert_eq!(report.summary().as_deref(), Some("Skipped 1 malformed record"));
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, r#"{{"level":"info","message":"one"}}"#).unwrap();
        writeln!(file, r#"{{"level":"info","message":"two"}}"#).unwrap();

        let report = load(file.path()).unwrap();
        assert_eq!(report.store.len(), 2);
        assert!(report.summary().is_none());
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = load(&dir.path().join("absent.log")).unwrap_err();
        assert!(matches!(err, LoadError::NotFound { .. }));
        assert!(err.to_string().starts_with("unable to locate file"));
    }
}
