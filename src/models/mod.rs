pub mod phase;
pub mod workout;

pub use phase::{PeriodizationPhase, PhaseCustomization, PhaseType};
pub use workout::{
  estimate_one_rep_max, BestSet, ExerciseSession, ExerciseType, ExperienceLevel, MuscleGroup, Set,
};
