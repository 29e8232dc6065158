use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// ---------------------------------------------------------------------------
/// Phase Types
/// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PhaseType {
  Hypertrophy,
  Strength,
  Deload,
  /// Valid block, but never entered by the default transitions
  Power,
}

impl std::fmt::Display for PhaseType {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    match self {
      Self::Hypertrophy => write!(f, "hypertrophy"),
      Self::Strength => write!(f, "strength"),
      Self::Deload => write!(f, "deload"),
      Self::Power => write!(f, "power"),
    }
  }
}

impl std::str::FromStr for PhaseType {
  type Err = String;
  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s {
      "hypertrophy" => Ok(Self::Hypertrophy),
      "strength" => Ok(Self::Strength),
      "deload" => Ok(Self::Deload),
      "power" => Ok(Self::Power),
      _ => Err(format!("Unknown phase type: {}", s)),
    }
  }
}

/// Static template for a phase type
struct PhaseTemplate {
  total_weeks: u32,
  volume_multiplier: f64,
  intensity_range: (f64, f64),
  rep_range: (u32, u32),
  goals: &'static [&'static str],
  research_backing: &'static str,
}

impl PhaseType {
  fn template(&self) -> PhaseTemplate {
    match self {
      Self::Hypertrophy => PhaseTemplate {
        total_weeks: 6,
        volume_multiplier: 1.0,
        intensity_range: (65.0, 75.0),
        rep_range: (8, 12),
        goals: &[
          "Accumulate weekly sets near the optimal volume target",
          "Increase muscle cross-sectional area",
          "Build work capacity for the strength block",
        ],
        research_backing: "Schoenfeld, Ogborn & Krieger (2017): graded dose-response between weekly sets and hypertrophy",
      },
      Self::Strength => PhaseTemplate {
        total_weeks: 4,
        volume_multiplier: 0.8,
        intensity_range: (80.0, 90.0),
        rep_range: (3, 6),
        goals: &[
          "Convert accumulated muscle into maximal strength",
          "Train heavy compound lifts at 80-90% 1RM",
        ],
        research_backing: "Rhea & Alderman (2004): periodized programs outperform non-periodized for strength",
      },
      Self::Deload => PhaseTemplate {
        total_weeks: 1,
        volume_multiplier: 0.5,
        intensity_range: (50.0, 65.0),
        rep_range: (6, 10),
        goals: &["Dissipate accumulated fatigue", "Maintain movement patterns"],
        research_backing: "Bell et al. (2023): planned deloads reduce fatigue while preserving adaptations",
      },
      Self::Power => PhaseTemplate {
        total_weeks: 3,
        volume_multiplier: 0.7,
        intensity_range: (70.0, 85.0),
        rep_range: (1, 5),
        goals: &["Maximize rate of force development", "Move moderate loads explosively"],
        research_backing: "Cormie, McGuigan & Newton (2011): power training at moderate loads improves force-velocity",
      },
    }
  }

  pub fn research_backing(&self) -> &'static str {
    self.template().research_backing
  }
}

/// Longest block a customization may ask for
pub const MAX_PHASE_WEEKS: u32 = 52;

/// Per-phase overrides of the template
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct PhaseCustomization {
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub total_weeks: Option<u32>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub volume_multiplier: Option<f64>,
}

/// ---------------------------------------------------------------------------
/// Periodization Phase
/// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PeriodizationPhase {
  pub id: Uuid,
  #[serde(rename = "type")]
  pub phase_type: PhaseType,
  pub week_number: u32,
  pub total_weeks: u32,
  pub volume_multiplier: f64,
  pub intensity_range: (f64, f64),
  pub rep_range: (u32, u32),
  pub start_date: DateTime<Utc>,
  pub end_date: DateTime<Utc>,
  pub goals: Vec<String>,
  pub research_backing: String,
}

impl PeriodizationPhase {
  /// Create a phase of `phase_type` starting at `start`
  pub fn new(phase_type: PhaseType, start: DateTime<Utc>) -> Self {
    Self::customized(phase_type, start, None)
  }

  /// Create a phase, applying any overrides
  pub fn customized(
    phase_type: PhaseType,
    start: DateTime<Utc>,
    customization: Option<&PhaseCustomization>,
  ) -> Self {
    let template = phase_type.template();
    let total_weeks = customization
      .and_then(|c| c.total_weeks)
      .filter(|w| *w > 0)
      .unwrap_or(template.total_weeks);
    let volume_multiplier = customization
      .and_then(|c| c.volume_multiplier)
      .unwrap_or(template.volume_multiplier);

    Self {
      id: Uuid::new_v4(),
      phase_type,
      week_number: 1,
      total_weeks,
      volume_multiplier,
      intensity_range: template.intensity_range,
      rep_range: template.rep_range,
      start_date: start,
      end_date: start
        .checked_add_signed(Duration::weeks(total_weeks as i64))
        .unwrap_or(DateTime::<Utc>::MAX_UTC),
      goals: template.goals.iter().map(|g| g.to_string()).collect(),
      research_backing: template.research_backing.to_string(),
    }
  }

  /// Weeks elapsed, rounded up: any part of a week counts as that week
  pub fn age_weeks(&self, now: DateTime<Utc>) -> i64 {
    let elapsed_ms = (now - self.start_date).num_milliseconds();
    let week_ms = Duration::weeks(1).num_milliseconds();
    (elapsed_ms as f64 / week_ms as f64).ceil() as i64
  }
}
