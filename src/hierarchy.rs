use crate::models::IssueRow;
use std::collections::{HashMap, HashSet};

/// Upper bound on parent hops before a walk is abandoned as unresolved.
pub const MAX_PARENT_HOPS: usize = 20;

/// Parent-pointer index over one export. Resolution walks child → parent links until it
/// reaches an Initiative.
#[derive(Debug)]
pub struct HierarchyIndex<'a> {
    rows: HashMap<&'a str, &'a IssueRow>,
}

impl<'a> HierarchyIndex<'a> {
    pub fn new(rows: &'a [IssueRow]) -> Self {
        // Later duplicates win, matching a plain key → row table.
        let rows = rows.iter().map(|row| (row.key.as_str(), row)).collect();
        Self { rows }
    }

    pub fn get(&self, key: &str) -> Option<&'a IssueRow> {
        self.rows.get(key).copied()
    }

    /// Returns the owning initiative key, or `None` when the walk dead-ends, cycles, or
    /// exceeds [`MAX_PARENT_HOPS`]. A parent key that names no row in the export is
    /// treated as a dangling initiative reference and returned as-is.
    pub fn resolve(&self, issue_key: &str) -> Option<String> {
        let mut current = issue_key;
        let mut visited = HashSet::new();

        for _ in 0..MAX_PARENT_HOPS {
            if !visited.insert(current) {
                return None;
            }

            let Some(row) = self.get(current) else {
                return (current != issue_key).then(|| current.to_string());
            };
            if row.issue_type.is_initiative() {
                return Some(row.key.clone());
            }
            current = row.parent_key.as_deref()?;
        }

        None
    }
}
