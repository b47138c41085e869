use crate::errors::{AppError, AppResult};
use crate::ingest::csv_records::parse_records;
use crate::models::{IssueRow, IssueStatus, IssueType};
use chrono::NaiveDate;
use once_cell::sync::Lazy;
use std::collections::{BTreeMap, HashMap};
use std::path::Path;

pub const REQUIRED_HEADERS: [&str; 5] = ["Issue key", "Issue Type", "Summary", "Status", "Parent key"];

pub const OPTIONAL_HEADER_DEFAULTS: [(&str, &str); 7] = [
    ("Story Points", ""),
    ("Assignee", ""),
    ("Updated", ""),
    ("Due date", ""),
    ("Blocks", "0"),
    ("Blocked Days", "0"),
    ("Scope Changes (14d)", "0"),
];

const DATE_FORMATS: [&str; 3] = ["%Y-%m-%d", "%m/%d/%Y", "%Y/%m/%d"];

const STATUS_ALIASES: &[(&str, IssueStatus)] = &[
    ("done", IssueStatus::Done),
    ("closed", IssueStatus::Done),
    ("resolved", IssueStatus::Done),
    ("blocked", IssueStatus::Blocked),
    ("in progress", IssueStatus::InProgress),
    ("in-progress", IssueStatus::InProgress),
    ("inprogress", IssueStatus::InProgress),
    ("doing", IssueStatus::InProgress),
    ("to do", IssueStatus::NotStarted),
    ("todo", IssueStatus::NotStarted),
    ("backlog", IssueStatus::NotStarted),
    ("not started", IssueStatus::NotStarted),
    ("open", IssueStatus::NotStarted),
];

static STATUS_TABLE: Lazy<BTreeMap<&'static str, &'static IssueStatus>> = Lazy::new(|| {
    STATUS_ALIASES
        .iter()
        .map(|(alias, status)| (*alias, status))
        .collect()
});

pub fn normalize_status(raw: &str) -> IssueStatus {
    let trimmed = raw.trim();
    if let Some(status) = STATUS_TABLE.get(trimmed.to_lowercase().as_str()) {
        return (*status).clone();
    }
    if trimmed.is_empty() {
        IssueStatus::Unknown
    } else {
        IssueStatus::Other(trimmed.to_string())
    }
}

/// Lenient non-negative integer: accepts `"5"`, `"5.0"`, `" 3 "`. Anything unusable is 0.
pub fn parse_count(raw: &str) -> u32 {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return 0;
    }
    if let Ok(value) = trimmed.parse::<i64>() {
        return value.clamp(0, i64::from(u32::MAX)) as u32;
    }
    match trimmed.parse::<f64>() {
        Ok(value) if value.is_finite() => value.trunc().clamp(0.0, f64::from(u32::MAX)) as u32,
        _ => 0,
    }
}

pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    DATE_FORMATS
        .iter()
        .find_map(|format| NaiveDate::parse_from_str(trimmed, format).ok())
}

/// Column positions resolved from the header record.
#[derive(Debug, Clone)]
pub struct HeaderIndex {
    columns: HashMap<String, usize>,
}

impl HeaderIndex {
    pub fn from_header(header: &[String]) -> AppResult<Self> {
        let columns = header
            .iter()
            .enumerate()
            .map(|(idx, name)| (name.clone(), idx))
            .collect::<HashMap<_, _>>();
        let missing = REQUIRED_HEADERS
            .iter()
            .copied()
            .filter(|name| !columns.contains_key(*name))
            .collect::<Vec<_>>();
        if !missing.is_empty() {
            return Err(AppError::missing_headers(&missing));
        }
        Ok(Self { columns })
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.columns.contains_key(name)
    }

    fn field<'a>(&self, record: &'a [String], name: &str) -> &'a str {
        match self.columns.get(name) {
            Some(idx) => record.get(*idx).map(String::as_str).unwrap_or(""),
            None => OPTIONAL_HEADER_DEFAULTS
                .iter()
                .find(|(header, _)| *header == name)
                .map(|(_, default)| *default)
                .unwrap_or(""),
        }
    }
}

/// Returns `None` for records without an issue key.
pub fn normalize_record(index: &HeaderIndex, record: &[String]) -> Option<IssueRow> {
    let key = index.field(record, "Issue key").trim();
    if key.is_empty() {
        return None;
    }
    let parent_key = index.field(record, "Parent key").trim();

    Some(IssueRow {
        key: key.to_string(),
        issue_type: IssueType::parse(index.field(record, "Issue Type")),
        summary: index.field(record, "Summary").trim().to_string(),
        status: normalize_status(index.field(record, "Status")),
        parent_key: (!parent_key.is_empty()).then(|| parent_key.to_string()),
        story_points: parse_count(index.field(record, "Story Points")),
        assignee: index.field(record, "Assignee").trim().to_string(),
        updated: index.field(record, "Updated").trim().to_string(),
        due_date: parse_date(index.field(record, "Due date")),
        blocks: parse_count(index.field(record, "Blocks")),
        blocked_days: parse_count(index.field(record, "Blocked Days")),
        scope_changes_14d: parse_count(index.field(record, "Scope Changes (14d)")),
    })
}

pub fn read_issue_rows(text: &str) -> AppResult<Vec<IssueRow>> {
    let mut records = parse_records(text).into_iter();
    let header = records
        .next()
        .ok_or_else(|| AppError::Input("CSV has no headers.".to_string()))?;
    let index = HeaderIndex::from_header(&header)?;

    let absent = OPTIONAL_HEADER_DEFAULTS
        .iter()
        .filter(|(name, _)| !index.has_column(name))
        .map(|(name, _)| *name)
        .collect::<Vec<_>>();
    if !absent.is_empty() {
        tracing::debug!(columns = ?absent, "optional columns absent; using defaults");
    }

    let mut rows = Vec::new();
    let mut skipped = 0usize;
    for record in records {
        match normalize_record(&index, &record) {
            Some(row) => rows.push(row),
            None => skipped += 1,
        }
    }
    if skipped > 0 {
        tracing::debug!(skipped, "skipped records without an issue key");
    }
    tracing::info!(rows = rows.len(), "normalized issue rows");
    Ok(rows)
}

pub fn load_issue_rows(path: &Path) -> AppResult<Vec<IssueRow>> {
    let text = std::fs::read_to_string(path).map_err(|error| {
        AppError::Io(format!("failed reading {}: {}", path.to_string_lossy(), error))
    })?;
    read_issue_rows(&text)
}

#[cfg(test)]
mod tests {
    use super::{normalize_status, parse_count, parse_date, read_issue_rows};
    use crate::errors::AppError;
    use crate::models::{IssueStatus, IssueType};
    use chrono::NaiveDate;

    #[test]
    fn status_lookup_is_case_insensitive() {
        assert_eq!(normalize_status("CLOSED"), IssueStatus::Done);
        assert_eq!(normalize_status(" Blocked "), IssueStatus::Blocked);
        assert_eq!(normalize_status("In-Progress"), IssueStatus::InProgress);
        assert_eq!(normalize_status("Backlog"), IssueStatus::NotStarted);
        assert_eq!(normalize_status(""), IssueStatus::Unknown);
        assert_eq!(
            normalize_status(" In Review "),
            IssueStatus::Other("In Review".to_string())
        );
    }

    #[test]
    fn counts_fall_back_to_zero() {
        assert_eq!(parse_count("5"), 5);
        assert_eq!(parse_count(" 5.9 "), 5);
        assert_eq!(parse_count(""), 0);
        assert_eq!(parse_count("n/a"), 0);
        assert_eq!(parse_count("NaN"), 0);
        assert_eq!(parse_count("-3"), 0);
    }

    #[test]
    fn dates_accept_three_formats() {
        let expected = NaiveDate::from_ymd_opt(2026, 2, 13);
        assert_eq!(parse_date("2026-02-13"), expected);
        assert_eq!(parse_date("02/13/2026"), expected);
        assert_eq!(parse_date("2026/02/13"), expected);
        assert_eq!(parse_date("13.02.2026"), None);
        assert_eq!(parse_date("  "), None);
    }

    #[test]
    fn rejects_missing_required_headers() {
        let error = read_issue_rows("Issue key,Issue Type,Summary\nA-1,Story,x\n")
            .expect_err("missing headers");
        match error {
            AppError::Input(message) => {
                assert!(message.contains("Status"));
                assert!(message.contains("Parent key"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn optional_columns_default_and_blank_keys_skip() {
        let csv = "Issue key,Issue Type,Summary,Status,Parent key\n\
                   INIT-1,Initiative,Payments,Open,\n\
                   ,Story,orphan,Done,INIT-1\n\
                   STORY-1,story,Card flow,done,INIT-1\n";
        let rows = read_issue_rows(csv).expect("rows");
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].parent_key, None);
        assert_eq!(rows[1].issue_type, IssueType::Story);
        assert_eq!(rows[1].status, IssueStatus::Done);
        assert_eq!(rows[1].parent_key.as_deref(), Some("INIT-1"));
        assert_eq!(rows[1].story_points, 0);
        assert_eq!(rows[1].blocks, 0);
        assert_eq!(rows[1].due_date, None);
    }

    #[test]
    fn short_rows_and_bad_fields_do_not_fail() {
        let csv = "Issue key,Issue Type,Summary,Status,Parent key,Story Points,Due date,Blocks\n\
                   S-1,Story,x,Doing,I-1,lots,someday,2\n\
                   S-2,Story,y,Doing\n";
        let rows = read_issue_rows(csv).expect("rows");
        assert_eq!(rows[0].story_points, 0);
        assert_eq!(rows[0].due_date, None);
        assert_eq!(rows[0].blocks, 2);
        assert_eq!(rows[1].parent_key, None);
        assert_eq!(rows[1].blocks, 0);
    }
}
