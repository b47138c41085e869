//! Executive brief: ranks initiatives by a weighted risk heuristic and renders a short,
//! decision-oriented Markdown narrative.

use crate::errors::{AppError, AppResult};
use crate::models::{Band, InitiativeRecord, Snapshot};
use std::cmp::Ordering;

pub const TOP_RISKS: usize = 3;
pub const TOP_POSITIVES: usize = 3;
const MAX_PROMPTS: usize = 2;
const FALLBACK_PROMPT: &str = "Continue current plan; monitor trend";

struct DecisionRule {
    applies: fn(&InitiativeRecord) -> bool,
    prompt: &'static str,
}

/// Evaluated in order; the first two that apply are shown.
const DECISION_RULES: &[DecisionRule] = &[
    DecisionRule {
        applies: |i| i.scope_changes_14d >= 2,
        prompt: "Freeze scope / lock acceptance criteria",
    },
    DecisionRule {
        applies: |i| i.blocked_days >= 2 || i.days_stagnant >= 4,
        prompt: "Remove blocker or re-route critical path",
    },
    DecisionRule {
        applies: |i| i.critical_dependency || i.dependency_count >= 4,
        prompt: "Escalate dependency alignment / sequence work",
    },
    DecisionRule {
        applies: |i| i.days_to_target <= 14 && i.dcs_current < 80,
        prompt: "Decide: add capacity vs reduce deliverable surface area vs accept slip",
    },
];

const PROMPT_SUMMARY: [&str; 3] = [
    "- Scope: Where volatility is increasing, decide whether to freeze scope or re-baseline commitments.",
    "- Dependencies: For critical path dependencies, align sequencing and escalation paths explicitly.",
    "- Capacity: For near-term targets with declining confidence, choose: add capacity vs reduce surface area vs accept slip.",
];

const CLOSING_NOTE: &str = "> Note: This brief is derived from scored operational signals. Root-cause validation may require qualitative follow-up with owners.";

/// Ordering score for risk selection only; never persisted.
pub fn risk_rank(item: &InitiativeRecord) -> f64 {
    let fall = (-item.delta()).max(0) as f64 * 3.0;
    let due = match item.days_to_target {
        d if d <= 7 => 18.0,
        d if d <= 14 => 10.0,
        _ => 0.0,
    };
    let blocked = f64::from(item.blocked_days.min(10)) * 4.0;
    let stagnant = f64::from(item.days_stagnant.min(10)) * 2.5;
    let deps = f64::from(item.dependency_count.min(10)) * 2.0
        + if item.critical_dependency { 6.0 } else { 0.0 };
    let low_score = (100.0 - f64::from(item.dcs_current)) * 0.6;

    fall + due + blocked + stagnant + deps + low_score
}

pub fn top_risks(initiatives: &[InitiativeRecord]) -> Vec<&InitiativeRecord> {
    let mut ranked = initiatives.iter().collect::<Vec<_>>();
    ranked.sort_by(|a, b| risk_rank(b).partial_cmp(&risk_rank(a)).unwrap_or(Ordering::Equal));
    ranked.truncate(TOP_RISKS);
    ranked
}

pub fn positive_momentum(initiatives: &[InitiativeRecord]) -> Vec<&InitiativeRecord> {
    let mut positives = initiatives
        .iter()
        .filter(|i| i.delta() > 0 || (i.band == Band::Green && i.dcs_current >= 85))
        .collect::<Vec<_>>();
    positives.sort_by(|a, b| (b.delta(), b.dcs_current).cmp(&(a.delta(), a.dcs_current)));
    positives.truncate(TOP_POSITIVES);
    positives
}

pub fn decision_prompt(item: &InitiativeRecord) -> String {
    let prompts = DECISION_RULES
        .iter()
        .filter(|rule| (rule.applies)(item))
        .map(|rule| rule.prompt)
        .take(MAX_PROMPTS)
        .collect::<Vec<_>>();
    if prompts.is_empty() {
        FALLBACK_PROMPT.to_string()
    } else {
        prompts.join("; ")
    }
}

pub fn trend_arrow(delta: i64) -> String {
    match delta.cmp(&0) {
        Ordering::Greater => format!("↑ +{delta}"),
        Ordering::Less => format!("↓ {delta}"),
        Ordering::Equal => "→ 0".to_string(),
    }
}

fn driver_annotations(item: &InitiativeRecord) -> String {
    let mut drivers = Vec::new();
    if item.blocked_days >= 2 {
        drivers.push(format!("blocked {}d", item.blocked_days));
    }
    if item.scope_changes_14d >= 2 {
        drivers.push(format!("scope changes {}/14d", item.scope_changes_14d));
    }
    if item.days_stagnant >= 4 {
        drivers.push(format!("stagnant {}d", item.days_stagnant));
    }
    if item.dependency_count >= 4 || item.critical_dependency {
        let critical = if item.critical_dependency { " (critical)" } else { "" };
        drivers.push(format!("deps {}{}", item.dependency_count, critical));
    }
    if drivers.is_empty() {
        "signal review needed".to_string()
    } else {
        drivers.join(", ")
    }
}

pub fn band_counts(initiatives: &[InitiativeRecord]) -> [(Band, usize); 3] {
    Band::ALL.map(|band| (band, initiatives.iter().filter(|i| i.band == band).count()))
}

/// First initiative with the smallest delta, and first with the largest.
fn biggest_movers(initiatives: &[InitiativeRecord]) -> Option<(&InitiativeRecord, &InitiativeRecord)> {
    let first = initiatives.first()?;
    let (drop, gain) = initiatives
        .iter()
        .skip(1)
        .fold((first, first), |(drop, gain), item| {
            (
                if item.delta() < drop.delta() { item } else { drop },
                if item.delta() > gain.delta() { item } else { gain },
            )
        });
    Some((drop, gain))
}

fn headline(item: &InitiativeRecord) -> String {
    format!(
        "**{}** — {} (**{} {}**)",
        item.name,
        item.band.as_str(),
        item.dcs_current,
        trend_arrow(item.delta())
    )
}

pub fn render_brief(snapshot: &Snapshot) -> AppResult<String> {
    let initiatives = &snapshot.initiatives;
    let (drop, gain) = biggest_movers(initiatives).ok_or_else(|| {
        AppError::EmptySnapshot("snapshot has no initiatives; nothing to brief".to_string())
    })?;
    let counts = band_counts(initiatives);
    let count_of = |band: Band| counts.iter().find(|(b, _)| *b == band).map_or(0, |(_, n)| *n);

    let mut lines = vec![
        format!(
            "# Weekly Executive Brief — Week Ending {}",
            snapshot.portfolio.week_ending
        ),
        String::new(),
        "## Portfolio Snapshot".to_string(),
        format!("- Total initiatives: **{}**", initiatives.len()),
        format!(
            "- Confidence bands: **Green {}** / **Yellow {}** / **Red {}**",
            count_of(Band::Green),
            count_of(Band::Yellow),
            count_of(Band::Red)
        ),
        format!(
            "- Largest decline: **{}** ({}, {} {})",
            drop.name,
            drop.band.as_str(),
            drop.dcs_current,
            trend_arrow(drop.delta())
        ),
        format!(
            "- Largest improvement: **{}** ({}, {} {})",
            gain.name,
            gain.band.as_str(),
            gain.dcs_current,
            trend_arrow(gain.delta())
        ),
        String::new(),
        "## Top Emerging Risks (Decision-Oriented)".to_string(),
    ];

    for item in top_risks(initiatives) {
        lines.push(format!(
            "- {} | Drivers: {} | Target: {}d",
            headline(item),
            driver_annotations(item),
            item.days_to_target
        ));
        lines.push(format!("  - Decision prompt: *{}*", decision_prompt(item)));
        if let Some(note) = item.status_notes.first() {
            lines.push(format!("  - Context: {note}"));
        }
    }
    lines.push(String::new());

    lines.push("## Notable Positive Momentum".to_string());
    let positives = positive_momentum(initiatives);
    if positives.is_empty() {
        lines.push(
            "- No significant positive movement this week; focus on stabilizing top risks."
                .to_string(),
        );
    }
    for item in positives {
        lines.push(format!("- {} | Target: {}d", headline(item), item.days_to_target));
    }
    lines.push(String::new());

    lines.push("## Decision Prompts Summary".to_string());
    lines.extend(PROMPT_SUMMARY.iter().map(ToString::to_string));
    lines.push(String::new());
    lines.push(CLOSING_NOTE.to_string());

    tracing::info!(
        week_ending = %snapshot.portfolio.week_ending,
        initiatives = initiatives.len(),
        "rendered executive brief"
    );
    Ok(lines.join("\n"))
}
