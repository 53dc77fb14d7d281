use crate::core::error::LoadError;
use crate::core::model::{CommentColumn, QuestionColumn, ResponseTable};
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use csv::{ReaderBuilder, StringRecord};
use std::collections::HashSet;
use std::fs;
use std::path::Path;
use tracing::debug;

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%Y/%m/%d %H:%M:%S",
    "%m/%d/%Y %H:%M:%S",
    "%m/%d/%Y %H:%M",
];

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%m/%d/%Y", "%Y/%m/%d"];

/// Which header index plays which role. Every other column is a question.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct ColumnRoles {
    pub timestamp: usize,
    pub comment: Option<usize>,
}

impl ColumnRoles {
    pub fn infer(headers: &[String]) -> ColumnRoles {
        let timestamp = headers
            .iter()
            .position(|h| h.to_lowercase().starts_with("timestamp"))
            .unwrap_or(0);
        let comment = headers.iter().enumerate().position(|(i, h)| {
            let lower = h.to_lowercase();
            i != timestamp && (lower.contains("optional") || lower.contains("comment"))
        });
        ColumnRoles { timestamp, comment }
    }

    fn is_question(&self, idx: usize) -> bool {
        idx != self.timestamp && Some(idx) != self.comment
    }
}

pub fn load(path: &Path) -> Result<ResponseTable, LoadError> {
    let bytes = fs::read(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse(&bytes, path)
}

fn parse(bytes: &[u8], path: &Path) -> Result<ResponseTable, LoadError> {
    if bytes.iter().all(|b| b.is_ascii_whitespace()) {
        return Err(LoadError::Empty {
            path: path.to_path_buf(),
        });
    }
    let csv_err = |source: csv::Error| LoadError::Csv {
        path: path.to_path_buf(),
        source,
    };

    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(bytes);
    let headers = unique_headers(reader.headers().map_err(csv_err)?);
    if headers.is_empty() {
        return Err(LoadError::Empty {
            path: path.to_path_buf(),
        });
    }

    let mut cells: Vec<Vec<Option<String>>> = vec![Vec::new(); headers.len()];
    let mut rows = 0usize;
    for record in reader.records() {
        let record = record.map_err(csv_err)?;
        if record.len() > headers.len() {
            return Err(LoadError::RaggedRow {
                line: record.position().map(|p| p.line()).unwrap_or(0),
                expected: headers.len(),
                found: record.len(),
            });
        }
        for (i, column) in cells.iter_mut().enumerate() {
            let cell = record
                .get(i)
                .filter(|s| !s.trim().is_empty())
                .map(str::to_string);
            column.push(cell);
        }
        rows += 1;
    }

    let roles = ColumnRoles::infer(&headers);
    let mut columns: Vec<Option<Vec<Option<String>>>> = cells.into_iter().map(Some).collect();

    let raw_ts = columns[roles.timestamp].take().unwrap_or_default();
    let timestamps: Vec<Option<NaiveDateTime>> = raw_ts
        .iter()
        .map(|c| c.as_deref().and_then(parse_timestamp))
        .collect();
    let unparsed_ts = raw_ts
        .iter()
        .zip(&timestamps)
        .filter(|(raw, parsed)| raw.is_some() && parsed.is_none())
        .count();
    if unparsed_ts > 0 {
        debug!(
            column = %headers[roles.timestamp],
            cells = unparsed_ts,
            "timestamp cells could not be parsed"
        );
    }

    let comments = roles.comment.map(|idx| CommentColumn {
        name: headers[idx].clone(),
        values: columns[idx].take().unwrap_or_default(),
    });

    let mut questions = Vec::new();
    for (idx, name) in headers.iter().enumerate() {
        if !roles.is_question(idx) {
            continue;
        }
        let raw = columns[idx].take().unwrap_or_default();
        let values: Vec<Option<f64>> = raw.iter().map(|c| c.as_deref().and_then(parse_score)).collect();
        let dropped = raw
            .iter()
            .zip(&values)
            .filter(|(raw, parsed)| raw.is_some() && parsed.is_none())
            .count();
        if dropped > 0 {
            debug!(column = %name, cells = dropped, "non-numeric cells treated as missing");
        }
        questions.push(QuestionColumn {
            name: name.clone(),
            values,
        });
    }

    debug!(
        rows,
        timestamp = %headers[roles.timestamp],
        comment = roles.comment.map(|i| headers[i].as_str()).unwrap_or("-"),
        questions = questions.len(),
        "loaded response table"
    );

    Ok(ResponseTable {
        rows,
        timestamp_name: headers[roles.timestamp].clone(),
        timestamps,
        comments,
        questions,
    })
}

/// Trimmed header names, with repeats suffixed `.1`, `.2`, ... in order.
fn unique_headers(record: &StringRecord) -> Vec<String> {
    let mut seen = HashSet::new();
    record
        .iter()
        .map(|raw| {
            let base = raw.trim().to_string();
            let mut name = base.clone();
            let mut n = 1;
            while !seen.insert(name.clone()) {
                name = format!("{}.{}", base, n);
                n += 1;
            }
            name
        })
        .collect()
}

pub fn parse_score(cell: &str) -> Option<f64> {
    cell.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}

pub fn parse_timestamp(cell: &str) -> Option<NaiveDateTime> {
    let s = cell.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.naive_local());
    }
    for fmt in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(dt);
        }
    }
    for fmt in DATE_FORMATS {
        if let Ok(d) = NaiveDate::parse_from_str(s, fmt) {
            return d.and_hms_opt(0, 0, 0);
        }
    }
    None
}
