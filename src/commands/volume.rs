//! Weekly volume commands

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};

use super::periodization::get_or_init_state;
use super::CommandError;
use crate::db::AppState;
use crate::models::{MuscleGroup, PhaseType};
use crate::volume::{self, SetRange, VolumeVerdict};

/// Classify this week's set counts under the current phase, one verdict per
/// supplied muscle group
pub async fn assess_weekly_volume(
    state: &AppState,
    weekly_sets: &BTreeMap<MuscleGroup, u32>,
    now: DateTime<Utc>,
) -> Result<Vec<VolumeVerdict>, CommandError> {
    let periodization = get_or_init_state(state, now).await?;
    let phase = periodization.current_phase.phase_type;
    Ok(weekly_sets
        .iter()
        .map(|(group, sets)| volume::classify_volume(*group, phase, *sets))
        .collect())
}

/// Phase-adjusted targets for every muscle group
pub async fn get_volume_targets(
    state: &AppState,
    now: DateTime<Utc>,
) -> Result<(PhaseType, BTreeMap<MuscleGroup, SetRange>), CommandError> {
    let periodization = get_or_init_state(state, now).await?;
    let phase = periodization.current_phase.phase_type;
    let targets = MuscleGroup::ALL
        .iter()
        .map(|group| (*group, volume::get_volume_target(*group, phase)))
        .collect();
    Ok((phase, targets))
}
