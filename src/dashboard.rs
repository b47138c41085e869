use crate::brief::band_counts;
use crate::errors::{AppError, AppResult};
use crate::heatmap::Driver;
use crate::models::{Band, HeatmapRow, InitiativeRecord, Snapshot};

const DECLINES_SHOWN: usize = 3;

#[derive(Debug, Clone, PartialEq)]
pub struct Kpis {
    pub week_ending: String,
    pub initiatives: usize,
    pub average_dcs: f64,
    pub band_counts: [(Band, usize); 3],
    pub worst_dcs: u32,
    pub best_dcs: u32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DashboardView {
    pub kpis: Kpis,
    pub largest_declines: Vec<InitiativeRecord>,
    pub heatmap: Option<Vec<HeatmapRow>>,
    pub drilldown: InitiativeRecord,
}

/// Read-only view over a snapshot and, when available, its heatmap.
///
/// An empty snapshot is an operator error rather than a blank dashboard.
pub fn build_dashboard(
    snapshot: &Snapshot,
    heatmap: Option<Vec<HeatmapRow>>,
    selected: Option<&str>,
) -> AppResult<DashboardView> {
    let initiatives = &snapshot.initiatives;
    if initiatives.is_empty() {
        return Err(AppError::EmptySnapshot(
            "No initiatives found in snapshot. Check the JSON path.".to_string(),
        ));
    }

    let total: u32 = initiatives.iter().map(|i| i.dcs_current).sum();
    let kpis = Kpis {
        week_ending: snapshot.portfolio.week_ending.clone(),
        initiatives: initiatives.len(),
        average_dcs: f64::from(total) / initiatives.len() as f64,
        band_counts: band_counts(initiatives),
        worst_dcs: initiatives.iter().map(|i| i.dcs_current).min().unwrap_or(0),
        best_dcs: initiatives.iter().map(|i| i.dcs_current).max().unwrap_or(0),
    };

    let mut largest_declines = initiatives.clone();
    largest_declines.sort_by_key(InitiativeRecord::delta);
    largest_declines.truncate(DECLINES_SHOWN);

    let drilldown = match selected {
        Some(name) => initiatives
            .iter()
            .find(|i| i.name == name)
            .ok_or_else(|| AppError::Cli(format!("no initiative named {name:?} in snapshot")))?,
        None => &initiatives[0],
    };

    Ok(DashboardView {
        kpis,
        largest_declines,
        heatmap,
        drilldown: drilldown.clone(),
    })
}

fn render_heatmap_matrix(rows: &[HeatmapRow], lines: &mut Vec<String>) {
    let name_width = rows
        .iter()
        .map(|row| row.initiative.chars().count())
        .chain(std::iter::once("Initiative".len()))
        .max()
        .unwrap_or(0);
    let mut header = format!("{:<name_width$}", "Initiative");
    for driver in Driver::ALL {
        header.push_str(&format!(" | {}", driver.label()));
    }
    lines.push(header);
    for row in rows {
        let mut line = format!("{:<name_width$}", row.initiative);
        for driver in Driver::ALL {
            let width = driver.label().chars().count();
            line.push_str(&format!(" | {:>width$}", row.scores.get(driver)));
        }
        lines.push(line);
    }
}

pub fn render_dashboard(view: &DashboardView) -> String {
    let kpis = &view.kpis;
    let count = |band: Band| {
        kpis.band_counts
            .iter()
            .find(|(b, _)| *b == band)
            .map_or(0, |(_, n)| *n)
    };

    let mut lines = vec![
        "Portfolio Dashboard".to_string(),
        format!("Week Ending: {}", kpis.week_ending),
        format!("Initiatives: {}", kpis.initiatives),
        format!("Avg Confidence: {:.1}", kpis.average_dcs),
        format!(
            "Bands: G:{}  Y:{}  R:{}",
            count(Band::Green),
            count(Band::Yellow),
            count(Band::Red)
        ),
        format!("Worst / Best: {} / {}", kpis.worst_dcs, kpis.best_dcs),
        String::new(),
        "Largest Declines (Top 3)".to_string(),
    ];
    for item in &view.largest_declines {
        lines.push(format!(
            "- {} | DCS {} | delta {} | target {}d",
            item.name,
            item.dcs_current,
            item.delta(),
            item.days_to_target
        ));
    }
    lines.push(String::new());

    lines.push("Risk Driver Heatmap (0-10)".to_string());
    match view.heatmap.as_deref() {
        None => lines.push("(no heatmap supplied)".to_string()),
        Some([]) => lines.push("WARNING: Heatmap CSV is empty. Check file path.".to_string()),
        Some(rows) => render_heatmap_matrix(rows, &mut lines),
    }
    lines.push(String::new());

    let item = &view.drilldown;
    let critical = if item.critical_dependency { " (critical)" } else { "" };
    lines.push(format!("Initiative Drilldown: {}", item.name));
    lines.push(format!(
        "Confidence: {} ({} / prior {})",
        item.band.as_str(),
        item.dcs_current,
        item.dcs_prior
    ));
    lines.push(format!("Days to target: {}", item.days_to_target));
    lines.push(format!("Blocked days: {}", item.blocked_days));
    lines.push(format!("Scope changes (14d): {}", item.scope_changes_14d));
    lines.push(format!("Dependencies: {}{}", item.dependency_count, critical));
    lines.push(format!("Stagnation (days): {}", item.days_stagnant));
    lines.push("Notes:".to_string());
    if item.status_notes.is_empty() {
        lines.push("- (none)".to_string());
    }
    for note in &item.status_notes {
        lines.push(format!("- {note}"));
    }

    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::{build_dashboard, render_dashboard};
    use crate::errors::AppError;
    use crate::heatmap::build_heatmap;
    use crate::models::{Band, InitiativeRecord, PortfolioMeta, Snapshot};

    fn record(name: &str, dcs_current: u32, dcs_prior: u32) -> InitiativeRecord {
        InitiativeRecord {
            id: name.to_string(),
            name: name.to_string(),
            dcs_current,
            dcs_prior,
            band: Band::from_dcs(dcs_current),
            blocked_days: 0,
            scope_changes_14d: 0,
            days_stagnant: 1,
            dependency_count: 2,
            critical_dependency: true,
            days_to_target: 12,
            status_notes: vec![],
        }
    }

    fn snapshot(initiatives: Vec<InitiativeRecord>) -> Snapshot {
        Snapshot {
            portfolio: PortfolioMeta {
                week_ending: "2026-02-06".to_string(),
                total_initiatives: initiatives.len(),
                source: "csv_transform".to_string(),
            },
            initiatives,
        }
    }

    #[test]
    fn empty_snapshot_is_a_hard_stop() {
        let error = build_dashboard(&snapshot(vec![]), None, None).expect_err("empty");
        match error {
            AppError::EmptySnapshot(message) => assert!(message.contains("No initiatives found")),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn kpis_and_declines() {
        let snap = snapshot(vec![
            record("Alpha", 90, 90),
            record("Beta", 40, 48),
            record("Gamma", 65, 69),
            record("Delta", 71, 70),
        ]);
        let view = build_dashboard(&snap, None, None).expect("view");
        assert_eq!(view.kpis.initiatives, 4);
        assert!((view.kpis.average_dcs - 66.5).abs() < 1e-9);
        assert_eq!(view.kpis.worst_dcs, 40);
        assert_eq!(view.kpis.best_dcs, 90);
        let declines = view
            .largest_declines
            .iter()
            .map(|i| i.name.as_str())
            .collect::<Vec<_>>();
        assert_eq!(declines, vec!["Beta", "Gamma", "Alpha"]);
        assert_eq!(view.drilldown.name, "Alpha");
    }

    #[test]
    fn unknown_drilldown_is_rejected() {
        let snap = snapshot(vec![record("Alpha", 90, 90)]);
        assert!(build_dashboard(&snap, None, Some("Omega")).is_err());
    }

    #[test]
    fn renders_heatmap_and_drilldown() {
        let snap = snapshot(vec![record("Alpha", 90, 90), record("Beta", 40, 48)]);
        let heatmap = build_heatmap(&snap);
        let view = build_dashboard(&snap, Some(heatmap), Some("Beta")).expect("view");
        let text = render_dashboard(&view);
        assert!(text.contains("Avg Confidence: 65.0"));
        assert!(text.contains("Bands: G:1  Y:0  R:1"));
        assert!(text.contains("Initiative | Confidence Risk | Blocked"));
        assert!(text.contains("Initiative Drilldown: Beta"));
        assert!(text.contains("Confidence: Red (40 / prior 48)"));
        assert!(text.contains("Dependencies: 2 (critical)"));
        assert!(text.ends_with("Notes:\n- (none)"));

        let empty = build_dashboard(&snap, Some(vec![]), None).expect("view");
        assert!(render_dashboard(&empty).contains("Heatmap CSV is empty"));
    }
}
