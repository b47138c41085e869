use crate::hierarchy::HierarchyIndex;
use crate::models::{IssueRow, IssueStatus};
use chrono::NaiveDate;
use std::collections::HashMap;

pub const MAX_STATUS_NOTES: usize = 2;
pub const NO_BLOCKERS_NOTE: &str = "No significant blockers detected in snapshot.";
pub const CRITICAL_BLOCKS_THRESHOLD: u32 = 3;

/// Rolled-up signals for one initiative.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InitiativeAggregate {
    pub id: String,
    pub name: String,
    pub total_points: u32,
    pub done_points: u32,
    /// Worst single blockage observed, not the cumulative total.
    pub blocked_days: u32,
    pub scope_changes_14d: u32,
    pub dependency_count: u32,
    pub critical_dependency: bool,
    pub has_blocked_items: bool,
    pub due_date: Option<NaiveDate>,
    pub status_notes: Vec<String>,
}

impl InitiativeAggregate {
    fn seeded(id: &str, name: String, due_date: Option<NaiveDate>) -> Self {
        Self {
            id: id.to_string(),
            name,
            total_points: 0,
            done_points: 0,
            blocked_days: 0,
            scope_changes_14d: 0,
            dependency_count: 0,
            critical_dependency: false,
            has_blocked_items: false,
            due_date,
            status_notes: Vec::new(),
        }
    }

    pub fn placeholder(id: &str) -> Self {
        Self::seeded(id, format!("{id} (unresolved title)"), None)
    }

    pub fn pct_done(&self) -> f64 {
        if self.total_points == 0 {
            0.0
        } else {
            f64::from(self.done_points) / f64::from(self.total_points)
        }
    }

    fn fold(&mut self, row: &IssueRow) {
        if let Some(due) = row.due_date {
            if self.due_date.map_or(true, |current| due < current) {
                self.due_date = Some(due);
            }
        }

        if row.issue_type.carries_points() {
            self.total_points = self.total_points.saturating_add(row.story_points);
            if row.status == IssueStatus::Done {
                self.done_points = self.done_points.saturating_add(row.story_points);
            }
        }

        self.blocked_days = self.blocked_days.max(row.blocked_days);
        self.scope_changes_14d = self.scope_changes_14d.saturating_add(row.scope_changes_14d);
        self.dependency_count = self.dependency_count.saturating_add(row.blocks);
        if row.blocks >= CRITICAL_BLOCKS_THRESHOLD {
            self.critical_dependency = true;
        }

        if row.status == IssueStatus::Blocked {
            self.has_blocked_items = true;
            if !row.summary.is_empty() {
                self.status_notes.push(format!("Blocked: {}", row.summary));
            }
        }
    }

    /// Caps notes for the snapshot, substituting a fixed note when nothing was blocked.
    pub fn snapshot_notes(&self) -> Vec<String> {
        if self.status_notes.is_empty() {
            return vec![NO_BLOCKERS_NOTE.to_string()];
        }
        self.status_notes
            .iter()
            .take(MAX_STATUS_NOTES)
            .cloned()
            .collect()
    }
}

/// Folds every resolvable row into its initiative. Output order is explicit initiatives in
/// input order, followed by placeholders in first-reference order.
pub fn aggregate_initiatives(rows: &[IssueRow]) -> Vec<InitiativeAggregate> {
    let index = HierarchyIndex::new(rows);
    let mut table: Vec<InitiativeAggregate> = Vec::new();
    let mut positions: HashMap<String, usize> = HashMap::new();

    for row in rows.iter().filter(|row| row.issue_type.is_initiative()) {
        let aggregate = InitiativeAggregate::seeded(&row.key, row.summary.clone(), row.due_date);
        match positions.get(&row.key) {
            Some(&pos) => table[pos] = aggregate,
            None => {
                positions.insert(row.key.clone(), table.len());
                table.push(aggregate);
            }
        }
    }

    let mut unresolved = 0usize;
    for row in rows {
        let Some(initiative_key) = index.resolve(&row.key) else {
            unresolved += 1;
            tracing::debug!(issue_key = %row.key, "row has no resolvable initiative; dropped from rollups");
            continue;
        };
        let pos = match positions.get(&initiative_key) {
            Some(&pos) => pos,
            None => {
                tracing::warn!(initiative = %initiative_key, "initiative referenced but not exported; synthesizing placeholder");
                table.push(InitiativeAggregate::placeholder(&initiative_key));
                positions.insert(initiative_key, table.len() - 1);
                table.len() - 1
            }
        };
        table[pos].fold(row);
    }

    tracing::info!(
        initiatives = table.len(),
        unresolved_rows = unresolved,
        "aggregated rows into initiatives"
    );
    table
}
