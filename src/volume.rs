//! Weekly volume targets per muscle group
//!
//! Static evidence-backed set counts, adjusted per periodization phase, and a
//! classifier that turns a measured weekly set count into a verdict.

use serde::{Deserialize, Serialize};

use crate::models::{MuscleGroup, PhaseType};
use crate::series::PerformanceSeries;
use crate::trend;

/// ---------------------------------------------------------------------------
/// Reference Table
/// ---------------------------------------------------------------------------

/// Weekly hard sets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SetRange {
  pub min: u32,
  pub optimal: u32,
  pub max: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct VolumeTarget {
  pub muscle_group: MuscleGroup,
  pub sets: SetRange,
  pub citation: &'static str,
}

const SCHOENFELD_2017: &str =
  "Schoenfeld, Ogborn & Krieger (2017), J Sports Sci 35(11): 10+ weekly sets per muscle maximize hypertrophy";
const BAZ_VALLE_2022: &str =
  "Baz-Valle et al. (2022), J Hum Kinet 81: 12-20 weekly sets as the practical hypertrophy range";
const PELLAND_2024: &str =
  "Pelland et al. (2024): diminishing returns of weekly set volume past ~20 sets";

/// Reference targets for the hypertrophy phase
pub const VOLUME_TARGETS: [VolumeTarget; 6] = [
  VolumeTarget {
    muscle_group: MuscleGroup::Chest,
    sets: SetRange { min: 10, optimal: 15, max: 20 },
    citation: SCHOENFELD_2017,
  },
  VolumeTarget {
    muscle_group: MuscleGroup::Back,
    sets: SetRange { min: 10, optimal: 16, max: 22 },
    citation: BAZ_VALLE_2022,
  },
  VolumeTarget {
    muscle_group: MuscleGroup::Legs,
    sets: SetRange { min: 12, optimal: 16, max: 20 },
    citation: SCHOENFELD_2017,
  },
  VolumeTarget {
    muscle_group: MuscleGroup::Shoulders,
    sets: SetRange { min: 8, optimal: 12, max: 16 },
    citation: BAZ_VALLE_2022,
  },
  VolumeTarget {
    muscle_group: MuscleGroup::Arms,
    sets: SetRange { min: 8, optimal: 12, max: 16 },
    citation: PELLAND_2024,
  },
  VolumeTarget {
    muscle_group: MuscleGroup::Core,
    sets: SetRange { min: 6, optimal: 10, max: 14 },
    citation: BAZ_VALLE_2022,
  },
];

/// Adjusted bounds never drop below these
pub const FLOOR: SetRange = SetRange { min: 4, optimal: 6, max: 10 };

pub fn reference_target(muscle_group: MuscleGroup) -> &'static VolumeTarget {
  match muscle_group {
    MuscleGroup::Chest => &VOLUME_TARGETS[0],
    MuscleGroup::Back => &VOLUME_TARGETS[1],
    MuscleGroup::Legs => &VOLUME_TARGETS[2],
    MuscleGroup::Shoulders => &VOLUME_TARGETS[3],
    MuscleGroup::Arms => &VOLUME_TARGETS[4],
    MuscleGroup::Core => &VOLUME_TARGETS[5],
  }
}

/// Sets removed from every bound in a phase
pub fn phase_adjustment(phase: PhaseType) -> u32 {
  match phase {
    PhaseType::Hypertrophy => 0,
    PhaseType::Strength => 2,
    PhaseType::Deload | PhaseType::Power => 4,
  }
}

/// Phase-adjusted target. Returns a copy; the reference table is never touched.
pub fn get_volume_target(muscle_group: MuscleGroup, phase: PhaseType) -> SetRange {
  let base = reference_target(muscle_group).sets;
  let delta = phase_adjustment(phase);
  SetRange {
    min: base.min.saturating_sub(delta).max(FLOOR.min),
    optimal: base.optimal.saturating_sub(delta).max(FLOOR.optimal),
    max: base.max.saturating_sub(delta).max(FLOOR.max),
  }
}

/// ---------------------------------------------------------------------------
/// Classification
/// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VolumeStatus {
  BelowMinimum,
  WithinRange,
  AboveMaximum,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VolumeAction {
  Increase,
  Maintain,
  Reduce,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Urgency {
  Low,
  Medium,
  High,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VolumeVerdict {
  pub muscle_group: MuscleGroup,
  pub phase: PhaseType,
  pub weekly_sets: u32,
  pub target: SetRange,
  pub status: VolumeStatus,
  pub action: VolumeAction,
  pub urgency: Urgency,
  pub citation: String,
  pub message: String,
}

/// Classify a measured weekly set count against the phase target.
///
/// Exceeding the maximum is a soft warning, capped at medium urgency. Falling
/// short is high urgency below half the minimum, except during a deload.
pub fn classify_volume(muscle_group: MuscleGroup, phase: PhaseType, weekly_sets: u32) -> VolumeVerdict {
  let target = get_volume_target(muscle_group, phase);
  let citation = reference_target(muscle_group).citation.to_string();

  let (status, action, urgency, message) = if weekly_sets < target.min {
    let urgency = if phase == PhaseType::Deload {
      Urgency::Low
    } else if (weekly_sets as f64) < target.min as f64 * 0.5 {
      Urgency::High
    } else {
      Urgency::Medium
    };
    (
      VolumeStatus::BelowMinimum,
      VolumeAction::Increase,
      urgency,
      format!(
        "{} sets of {} this week, below the {} minimum of {}: add {} sets",
        weekly_sets,
        muscle_group,
        phase,
        target.min,
        target.optimal - weekly_sets
      ),
    )
  } else if weekly_sets > target.max {
    let urgency = if weekly_sets as f64 > target.max as f64 * 1.25 {
      Urgency::Medium
    } else {
      Urgency::Low
    };
    (
      VolumeStatus::AboveMaximum,
      VolumeAction::Reduce,
      urgency,
      format!(
        "{} sets of {} this week, above the {} maximum of {}: trim toward {}",
        weekly_sets, muscle_group, phase, target.max, target.optimal
      ),
    )
  } else {
    (
      VolumeStatus::WithinRange,
      VolumeAction::Maintain,
      Urgency::Low,
      format!(
        "{} sets of {} is within the {} range ({}-{})",
        weekly_sets, muscle_group, phase, target.min, target.max
      ),
    )
  };

  VolumeVerdict {
    muscle_group,
    phase,
    weekly_sets,
    target,
    status,
    action,
    urgency,
    citation,
    message,
  }
}

/// Weekly change of set volume as a fraction of its mean
pub fn volume_progression(weekly_sets: &PerformanceSeries) -> f64 {
  trend::weekly_fraction_slope(weekly_sets)
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_hypertrophy_uses_reference() {
    assert_eq!(
      get_volume_target(MuscleGroup::Chest, PhaseType::Hypertrophy),
      SetRange { min: 10, optimal: 15, max: 20 }
    );
  }

  #[test]
  fn test_strength_subtracts_two() {
    assert_eq!(
      get_volume_target(MuscleGroup::Back, PhaseType::Strength),
      SetRange { min: 8, optimal: 14, max: 20 }
    );
  }

  #[test]
  fn test_deload_subtracts_four_with_floors() {
    assert_eq!(
      get_volume_target(MuscleGroup::Legs, PhaseType::Deload),
      SetRange { min: 8, optimal: 12, max: 16 }
    );
    // Core: 6/10/14 - 4 = 2/6/10, min floored at 4
    assert_eq!(
      get_volume_target(MuscleGroup::Core, PhaseType::Deload),
      SetRange { min: 4, optimal: 6, max: 10 }
    );
    assert_eq!(
      get_volume_target(MuscleGroup::Arms, PhaseType::Power),
      SetRange { min: 4, optimal: 8, max: 12 }
    );
  }

  #[test]
  fn test_adjustment_never_mutates_table() {
    let _ = get_volume_target(MuscleGroup::Chest, PhaseType::Deload);
    assert_eq!(reference_target(MuscleGroup::Chest).sets.min, 10);
  }

  #[test]
  fn test_every_group_respects_floors() {
    for group in MuscleGroup::ALL {
      for phase in [PhaseType::Hypertrophy, PhaseType::Strength, PhaseType::Deload, PhaseType::Power] {
        let t = get_volume_target(group, phase);
        assert!(t.min >= FLOOR.min && t.optimal >= FLOOR.optimal && t.max >= FLOOR.max);
        assert!(t.min <= t.optimal && t.optimal <= t.max);
      }
    }
  }

  #[test]
  fn test_classify_below_minimum() {
    let v = classify_volume(MuscleGroup::Chest, PhaseType::Hypertrophy, 4);
    assert_eq!(v.status, VolumeStatus::BelowMinimum);
    assert_eq!(v.action, VolumeAction::Increase);
    assert_eq!(v.urgency, Urgency::High);
    assert!(!v.citation.is_empty());

    let v = classify_volume(MuscleGroup::Chest, PhaseType::Hypertrophy, 8);
    assert_eq!(v.urgency, Urgency::Medium);
  }

  #[test]
  fn test_classify_increase_low_in_deload() {
    let v = classify_volume(MuscleGroup::Chest, PhaseType::Deload, 0);
    assert_eq!(v.action, VolumeAction::Increase);
    assert_eq!(v.urgency, Urgency::Low);
  }

  #[test]
  fn test_classify_within_range() {
    let v = classify_volume(MuscleGroup::Legs, PhaseType::Hypertrophy, 16);
    assert_eq!(v.status, VolumeStatus::WithinRange);
    assert_eq!(v.action, VolumeAction::Maintain);
    assert_eq!(v.urgency, Urgency::Low);
  }

  #[test]
  fn test_reduce_never_above_medium() {
    for sets in 21..80 {
      let v = classify_volume(MuscleGroup::Chest, PhaseType::Hypertrophy, sets);
      assert_eq!(v.action, VolumeAction::Reduce);
      assert!(v.urgency <= Urgency::Medium);
    }
  }

  #[test]
  fn test_volume_progression_rising() {
    use crate::series::TimePoint;
    use crate::trend::MS_PER_WEEK;
    let series = PerformanceSeries::new(
      [10.0, 12.0, 14.0]
        .iter()
        .enumerate()
        .map(|(i, v)| TimePoint::new((i as f64 * MS_PER_WEEK) as i64, *v))
        .collect(),
    );
    assert!((volume_progression(&series) - 2.0 / 12.0).abs() < 1e-9);
  }
}
