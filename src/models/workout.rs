use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::series::Timestamped;

/// ---------------------------------------------------------------------------
/// Sets and Sessions
/// ---------------------------------------------------------------------------

/// One recorded set. Immutable once logged.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Set {
  pub weight: f64,
  pub reps: u32,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub rpe: Option<f64>,
}

impl Set {
  pub fn new(weight: f64, reps: u32) -> Self {
    Self { weight, reps, rpe: None }
  }

  pub fn with_rpe(mut self, rpe: f64) -> Self {
    self.rpe = Some(rpe);
    self
  }

  /// weight x reps
  pub fn volume(&self) -> f64 {
    self.weight * self.reps as f64
  }
}

/// One exercise's performance within one workout
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExerciseSession {
  pub date: DateTime<Utc>,
  pub sets: Vec<Set>,
}

impl ExerciseSession {
  pub fn new(date: DateTime<Utc>, sets: Vec<Set>) -> Self {
    Self { date, sets }
  }

  /// The set maximizing weight x reps. Ties keep the earliest set.
  pub fn best_set(&self) -> Option<BestSet> {
    let mut best: Option<(usize, &Set)> = None;
    for (idx, set) in self.sets.iter().enumerate() {
      match best {
        Some((_, current)) if set.volume() <= current.volume() => {}
        _ => best = Some((idx, set)),
      }
    }
    best.map(|(index, set)| BestSet { index, set: *set })
  }

  /// Mean RPE over the sets that carry one
  pub fn average_rpe(&self) -> Option<f64> {
    let rated: Vec<f64> = self.sets.iter().filter_map(|s| s.rpe).collect();
    if rated.is_empty() {
      None
    } else {
      Some(rated.iter().sum::<f64>() / rated.len() as f64)
    }
  }
}

impl Timestamped for ExerciseSession {
  fn timestamp_ms(&self) -> i64 {
    self.date.timestamp_millis()
  }
}

/// Best set of a session, with its position in the session
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BestSet {
  pub index: usize,
  pub set: Set,
}

impl BestSet {
  pub fn weight(&self) -> f64 {
    self.set.weight
  }

  pub fn reps(&self) -> u32 {
    self.set.reps
  }
}

/// Estimated one-rep max (Epley). A single rep is its own max.
pub fn estimate_one_rep_max(weight: f64, reps: u32) -> f64 {
  if reps <= 1 {
    weight
  } else {
    weight * (1.0 + reps as f64 / 30.0)
  }
}

/// ---------------------------------------------------------------------------
/// Classification enums
/// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExerciseType {
  /// Multi-joint lifts (squat, bench, row)
  Compound,
  /// Single-joint lifts (curl, raise, extension)
  Isolation,
}

impl std::fmt::Display for ExerciseType {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    match self {
      Self::Compound => write!(f, "compound"),
      Self::Isolation => write!(f, "isolation"),
    }
  }
}

impl std::str::FromStr for ExerciseType {
  type Err = String;
  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s {
      "compound" => Ok(Self::Compound),
      "isolation" => Ok(Self::Isolation),
      _ => Err(format!("Unknown exercise type: {}", s)),
    }
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExperienceLevel {
  Novice,
  Intermediate,
  Advanced,
}

impl ExperienceLevel {
  /// Expected-gain multiplier, shrinking with training age
  pub fn gain_multiplier(&self) -> f64 {
    match self {
      Self::Novice => 1.0,
      Self::Intermediate => 0.7,
      Self::Advanced => 0.4,
    }
  }
}

impl std::str::FromStr for ExperienceLevel {
  type Err = String;
  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s {
      "novice" | "beginner" => Ok(Self::Novice),
      "intermediate" => Ok(Self::Intermediate),
      "advanced" => Ok(Self::Advanced),
      _ => Err(format!("Unknown experience level: {}", s)),
    }
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MuscleGroup {
  Chest,
  Back,
  Legs,
  Shoulders,
  Arms,
  Core,
}

impl MuscleGroup {
  pub const ALL: [MuscleGroup; 6] = [
    Self::Chest,
    Self::Back,
    Self::Legs,
    Self::Shoulders,
    Self::Arms,
    Self::Core,
  ];

  pub fn as_str(&self) -> &'static str {
    match self {
      Self::Chest => "chest",
      Self::Back => "back",
      Self::Legs => "legs",
      Self::Shoulders => "shoulders",
      Self::Arms => "arms",
      Self::Core => "core",
    }
  }
}

impl std::fmt::Display for MuscleGroup {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.write_str(self.as_str())
  }
}

impl std::str::FromStr for MuscleGroup {
  type Err = String;
  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s.to_lowercase().as_str() {
      "chest" => Ok(Self::Chest),
      "back" => Ok(Self::Back),
      "legs" => Ok(Self::Legs),
      "shoulders" => Ok(Self::Shoulders),
      "arms" => Ok(Self::Arms),
      "core" => Ok(Self::Core),
      _ => Err(format!("Unknown muscle group: {}", s)),
    }
  }
}
