use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IssueType {
    Initiative,
    Epic,
    Story,
    SubTask,
    Task,
    Other(String),
}

impl IssueType {
    pub fn parse(raw: &str) -> Self {
        let trimmed = raw.trim();
        match trimmed.to_ascii_lowercase().as_str() {
            "initiative" => Self::Initiative,
            "epic" => Self::Epic,
            "story" => Self::Story,
            "sub-task" | "subtask" => Self::SubTask,
            "task" => Self::Task,
            _ => Self::Other(trimmed.to_string()),
        }
    }

    pub fn is_initiative(&self) -> bool {
        matches!(self, Self::Initiative)
    }

    /// Only leaf-ish work items contribute story points to progress.
    pub fn carries_points(&self) -> bool {
        matches!(self, Self::Story | Self::SubTask | Self::Task)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IssueStatus {
    Done,
    Blocked,
    InProgress,
    NotStarted,
    Unknown,
    Other(String),
}

/// One normalized record from the tracker export.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssueRow {
    pub key: String,
    pub issue_type: IssueType,
    pub summary: String,
    pub status: IssueStatus,
    pub parent_key: Option<String>,
    pub story_points: u32,
    pub assignee: String,
    pub updated: String,
    pub due_date: Option<NaiveDate>,
    pub blocks: u32,
    pub blocked_days: u32,
    pub scope_changes_14d: u32,
}

impl IssueRow {
    pub fn new(key: impl Into<String>, issue_type: IssueType) -> Self {
        Self {
            key: key.into(),
            issue_type,
            summary: String::new(),
            status: IssueStatus::Unknown,
            parent_key: None,
            story_points: 0,
            assignee: String::new(),
            updated: String::new(),
            due_date: None,
            blocks: 0,
            blocked_days: 0,
            scope_changes_14d: 0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Band {
    Green,
    Yellow,
    Red,
}

impl Band {
    pub const ALL: [Band; 3] = [Band::Green, Band::Yellow, Band::Red];

    pub fn from_dcs(dcs: u32) -> Self {
        if dcs >= 80 {
            Self::Green
        } else if dcs >= 60 {
            Self::Yellow
        } else {
            Self::Red
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Green => "Green",
            Self::Yellow => "Yellow",
            Self::Red => "Red",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PortfolioMeta {
    pub week_ending: String,
    pub total_initiatives: usize,
    pub source: String,
}

/// Finalized per-initiative entry of the weekly snapshot.
///
/// `dcs_prior` is a synthetic estimate derived from current-week volatility, so `delta` is
/// a heuristic trend rather than a measured week-over-week change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InitiativeRecord {
    pub id: String,
    pub name: String,
    pub dcs_current: u32,
    pub dcs_prior: u32,
    pub band: Band,
    pub blocked_days: u32,
    pub scope_changes_14d: u32,
    pub days_stagnant: u32,
    pub dependency_count: u32,
    pub critical_dependency: bool,
    pub days_to_target: i64,
    #[serde(default)]
    pub status_notes: Vec<String>,
}

impl InitiativeRecord {
    pub fn delta(&self) -> i64 {
        i64::from(self.dcs_current) - i64::from(self.dcs_prior)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    pub portfolio: PortfolioMeta,
    pub initiatives: Vec<InitiativeRecord>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DriverScores {
    pub confidence_risk: u8,
    pub blocked: u8,
    pub scope_volatility: u8,
    pub dependencies: u8,
    pub due_proximity: u8,
    pub stagnation: u8,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeatmapRow {
    pub initiative: String,
    pub scores: DriverScores,
}
