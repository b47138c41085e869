//! Per-initiative risk drivers, normalized to 0-10 (10 = highest risk intensity).

use crate::ingest::csv_records::{format_record, parse_records};
use crate::models::{DriverScores, HeatmapRow, InitiativeRecord, Snapshot};
use std::cmp::Reverse;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Driver {
    ConfidenceRisk,
    Blocked,
    ScopeVolatility,
    Dependencies,
    DueProximity,
    Stagnation,
}

impl Driver {
    pub const ALL: [Driver; 6] = [
        Driver::ConfidenceRisk,
        Driver::Blocked,
        Driver::ScopeVolatility,
        Driver::Dependencies,
        Driver::DueProximity,
        Driver::Stagnation,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Self::ConfidenceRisk => "Confidence Risk",
            Self::Blocked => "Blocked",
            Self::ScopeVolatility => "Scope Volatility",
            Self::Dependencies => "Dependencies",
            Self::DueProximity => "Due Proximity",
            Self::Stagnation => "Stagnation",
        }
    }

    /// Value at which the linear drivers saturate; `None` for step-function drivers.
    pub fn full_scale(self) -> Option<f64> {
        match self {
            Self::ConfidenceRisk => Some(60.0),
            Self::Blocked => Some(5.0),
            Self::ScopeVolatility => Some(5.0),
            Self::Dependencies => Some(6.0),
            Self::DueProximity => None,
            Self::Stagnation => Some(6.0),
        }
    }
}

impl DriverScores {
    pub fn get(&self, driver: Driver) -> u8 {
        match driver {
            Driver::ConfidenceRisk => self.confidence_risk,
            Driver::Blocked => self.blocked,
            Driver::ScopeVolatility => self.scope_volatility,
            Driver::Dependencies => self.dependencies,
            Driver::DueProximity => self.due_proximity,
            Driver::Stagnation => self.stagnation,
        }
    }
}

const CRITICAL_DEPENDENCY_BUMP: u8 = 2;

/// Linear rescale of `value` over `[0, max_value]` onto 0..=10, ties rounding to even.
pub fn score_0_10(value: f64, max_value: f64) -> u8 {
    if max_value <= 0.0 {
        return 0;
    }
    ((value / max_value).clamp(0.0, 1.0) * 10.0).round_ties_even() as u8
}

fn linear(driver: Driver, value: f64) -> u8 {
    driver
        .full_scale()
        .map(|max_value| score_0_10(value, max_value))
        .unwrap_or(0)
}

pub fn due_proximity(days_to_target: i64) -> u8 {
    match days_to_target {
        d if d <= 7 => 10,
        d if d <= 14 => 7,
        d if d <= 21 => 4,
        _ => 1,
    }
}

pub fn driver_scores(record: &InitiativeRecord) -> DriverScores {
    let confidence_gap = 100.0 - f64::from(record.dcs_current);
    let mut dependencies = linear(Driver::Dependencies, f64::from(record.dependency_count));
    if record.critical_dependency {
        dependencies = (dependencies + CRITICAL_DEPENDENCY_BUMP).min(10);
    }

    DriverScores {
        confidence_risk: linear(Driver::ConfidenceRisk, confidence_gap),
        blocked: linear(Driver::Blocked, f64::from(record.blocked_days)),
        scope_volatility: linear(Driver::ScopeVolatility, f64::from(record.scope_changes_14d)),
        dependencies,
        due_proximity: due_proximity(record.days_to_target),
        stagnation: linear(Driver::Stagnation, f64::from(record.days_stagnant)),
    }
}

/// Heatmap rows worst-first by (Confidence Risk, Due Proximity, Blocked); ties keep
/// snapshot order.
pub fn build_heatmap(snapshot: &Snapshot) -> Vec<HeatmapRow> {
    let mut rows = snapshot
        .initiatives
        .iter()
        .map(|record| HeatmapRow {
            initiative: record.name.clone(),
            scores: driver_scores(record),
        })
        .collect::<Vec<_>>();
    rows.sort_by_key(|row| {
        Reverse((
            row.scores.confidence_risk,
            row.scores.due_proximity,
            row.scores.blocked,
        ))
    });
    rows
}

pub fn heatmap_header() -> Vec<&'static str> {
    std::iter::once("Initiative")
        .chain(Driver::ALL.iter().map(|driver| driver.label()))
        .collect()
}

pub fn render_heatmap_csv(rows: &[HeatmapRow]) -> String {
    let mut out = format_record(&heatmap_header());
    for row in rows {
        let mut fields = vec![row.initiative.clone()];
        fields.extend(Driver::ALL.iter().map(|driver| row.scores.get(*driver).to_string()));
        out.push_str(&format_record(&fields));
    }
    out
}

/// Portfolio-wide intensity per driver, highest first; equal totals keep driver order.
pub fn driver_totals(rows: &[HeatmapRow]) -> Vec<(Driver, u32)> {
    let mut totals = Driver::ALL
        .iter()
        .map(|driver| {
            let total = rows
                .iter()
                .map(|row| u32::from(row.scores.get(*driver)))
                .sum::<u32>();
            (*driver, total)
        })
        .collect::<Vec<_>>();
    totals.sort_by_key(|(_, total)| Reverse(*total));
    totals
}

pub fn render_heatmap_summary(week_ending: &str, rows: &[HeatmapRow]) -> String {
    let mut lines = vec![
        format!("# Portfolio Heatmap Summary — Week Ending {week_ending}"),
        String::new(),
        "## Highest Portfolio Risk Drivers (aggregate intensity)".to_string(),
    ];
    for (driver, total) in driver_totals(rows) {
        lines.push(format!("- **{}**: {}", driver.label(), total));
    }
    lines.push(String::new());
    lines.push("## Top 3 Initiatives by Combined Risk (from heatmap)".to_string());
    for row in rows.iter().take(3) {
        let s = &row.scores;
        lines.push(format!(
            "- **{}** | Confidence {} | Due {} | Blocked {} | Scope {} | Deps {} | Stagnation {}",
            row.initiative,
            s.confidence_risk,
            s.due_proximity,
            s.blocked,
            s.scope_volatility,
            s.dependencies,
            s.stagnation
        ));
    }
    lines.push(String::new());
    lines.push("> Scores are normalized 0–10 per driver (10 = highest risk intensity).".to_string());
    lines.join("\n")
}

/// Reads a heatmap CSV back into rows. Cells that are not integers in 0..=10 read as 0.
pub fn parse_heatmap_csv(text: &str) -> Vec<HeatmapRow> {
    let mut records = parse_records(text).into_iter();
    let Some(header) = records.next() else {
        return Vec::new();
    };
    let column = |label: &str| header.iter().position(|name| name == label);
    let initiative_col = column("Initiative");
    let driver_cols = Driver::ALL.map(|driver| column(driver.label()));

    records
        .map(|record| {
            let cell = |idx: Option<usize>| idx.and_then(|idx| record.get(idx)).map(String::as_str).unwrap_or("");
            let score = |idx: Option<usize>| cell(idx).trim().parse::<u8>().ok().filter(|v| *v <= 10).unwrap_or(0);
            HeatmapRow {
                initiative: cell(initiative_col).to_string(),
                scores: DriverScores {
                    confidence_risk: score(driver_cols[0]),
                    blocked: score(driver_cols[1]),
                    scope_volatility: score(driver_cols[2]),
                    dependencies: score(driver_cols[3]),
                    due_proximity: score(driver_cols[4]),
                    stagnation: score(driver_cols[5]),
                },
            }
        })
        .collect()
}
