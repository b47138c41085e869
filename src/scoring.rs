//! Delivery confidence score (DCS) and the derived snapshot signals.
//!
//! Every formula here is a fixed heuristic; identical inputs always score identically.

use crate::aggregate::InitiativeAggregate;
use crate::models::{Band, InitiativeRecord};
use chrono::NaiveDate;

/// Stand-in horizon when no due date is known anywhere under an initiative.
pub const DEFAULT_DAYS_TO_TARGET: i64 = 21;

const PROGRESS_WEIGHT: f64 = 30.0;
const BLOCKED_DAY_PENALTY: u32 = 5;
const BLOCKED_DAYS_CAP: u32 = 25;
const SCOPE_CHANGE_PENALTY: u32 = 4;
const SCOPE_CAP: u32 = 20;
const DEPENDENCY_PENALTY: u32 = 3;
const DEPENDENCY_CAP: u32 = 15;
const CRITICAL_DEPENDENCY_PENALTY: u32 = 5;
const BLOCKED_ITEM_PENALTY: u32 = 8;
const PRIOR_DRIFT_CAP: u32 = 8;

/// Inputs of the DCS formula, independent of how they were rolled up.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConfidenceSignals {
    pub pct_done: f64,
    pub blocked_days: u32,
    pub scope_changes_14d: u32,
    pub dependency_count: u32,
    pub critical_dependency: bool,
    pub days_to_target: i64,
    pub has_blocked_items: bool,
}

impl ConfidenceSignals {
    pub fn from_aggregate(aggregate: &InitiativeAggregate, week_ending: NaiveDate) -> Self {
        Self {
            pct_done: aggregate.pct_done(),
            blocked_days: aggregate.blocked_days,
            scope_changes_14d: aggregate.scope_changes_14d,
            dependency_count: aggregate.dependency_count,
            critical_dependency: aggregate.critical_dependency,
            days_to_target: days_to_target(aggregate.due_date, week_ending),
            has_blocked_items: aggregate.has_blocked_items,
        }
    }
}

pub fn days_to_target(due_date: Option<NaiveDate>, week_ending: NaiveDate) -> i64 {
    due_date
        .map(|due| (due - week_ending).num_days())
        .unwrap_or(DEFAULT_DAYS_TO_TARGET)
}

fn due_pressure_penalty(days_to_target: i64, pct_done: f64) -> u32 {
    if days_to_target <= 7 && pct_done < 0.8 {
        15
    } else if days_to_target <= 14 && pct_done < 0.6 {
        10
    } else {
        0
    }
}

pub fn dcs_from_signals(signals: &ConfidenceSignals) -> u32 {
    let pct_done = signals.pct_done.clamp(0.0, 1.0);
    let progress = ((1.0 - pct_done) * PROGRESS_WEIGHT).round_ties_even() as u32;
    let blocked = signals
        .blocked_days
        .saturating_mul(BLOCKED_DAY_PENALTY)
        .min(BLOCKED_DAYS_CAP);
    let scope = signals
        .scope_changes_14d
        .saturating_mul(SCOPE_CHANGE_PENALTY)
        .min(SCOPE_CAP);
    let mut dependencies = signals
        .dependency_count
        .saturating_mul(DEPENDENCY_PENALTY)
        .min(DEPENDENCY_CAP);
    if signals.critical_dependency {
        dependencies += CRITICAL_DEPENDENCY_PENALTY;
    }
    let due = due_pressure_penalty(signals.days_to_target, signals.pct_done);
    let blocked_item = if signals.has_blocked_items {
        BLOCKED_ITEM_PENALTY
    } else {
        0
    };

    let penalty = progress + blocked + scope + dependencies + due + blocked_item;
    100u32.saturating_sub(penalty)
}

/// Synthetic "prior week" score. Volatility implies last week looked better than it was;
/// this is an estimate for trend display, not measured history.
pub fn estimated_prior_dcs(dcs_current: u32, scope_changes_14d: u32, has_blocked_items: bool) -> u32 {
    let blocked_bump = if has_blocked_items { 2 } else { 0 };
    let drift = scope_changes_14d
        .saturating_mul(2)
        .saturating_add(blocked_bump)
        .min(PRIOR_DRIFT_CAP);
    (dcs_current + drift).min(100)
}

pub fn days_stagnant(total_points: u32, pct_done: f64, days_to_target: i64) -> u32 {
    if total_points > 0 && pct_done < 0.3 && days_to_target <= 14 {
        4
    } else if pct_done < 0.8 {
        1
    } else {
        0
    }
}

/// Freezes one aggregate into its snapshot record.
pub fn score_initiative(aggregate: &InitiativeAggregate, week_ending: NaiveDate) -> InitiativeRecord {
    let signals = ConfidenceSignals::from_aggregate(aggregate, week_ending);
    let dcs_current = dcs_from_signals(&signals);
    let dcs_prior = estimated_prior_dcs(
        dcs_current,
        aggregate.scope_changes_14d,
        aggregate.has_blocked_items,
    );

    InitiativeRecord {
        id: aggregate.id.clone(),
        name: aggregate.name.clone(),
        dcs_current,
        dcs_prior,
        band: Band::from_dcs(dcs_current),
        blocked_days: aggregate.blocked_days,
        scope_changes_14d: aggregate.scope_changes_14d,
        days_stagnant: days_stagnant(
            aggregate.total_points,
            signals.pct_done,
            signals.days_to_target,
        ),
        dependency_count: aggregate.dependency_count,
        critical_dependency: aggregate.critical_dependency,
        days_to_target: signals.days_to_target,
        status_notes: aggregate.snapshot_notes(),
    }
}
