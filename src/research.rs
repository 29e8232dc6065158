//! Evidence lookup and capability gaps
//!
//! `Analysis<T>` separates "computed, and the answer is zero" from "not
//! computed at all". Anything this crate cannot yet answer says so.

use serde::{Deserialize, Serialize};

use crate::models::{MuscleGroup, PhaseType};
use crate::progression::{COMPOUND_WEEKLY_RATE, ISOLATION_WEEKLY_RATE};
use crate::volume;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", content = "value", rename_all = "snake_case")]
pub enum Analysis<T> {
    Computed(T),
    Unavailable { capability: String, reason: String },
}

impl<T> Analysis<T> {
    pub fn unavailable(capability: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Unavailable {
            capability: capability.into(),
            reason: reason.into(),
        }
    }

    pub fn is_computed(&self) -> bool {
        matches!(self, Self::Computed(_))
    }

    pub fn computed(&self) -> Option<&T> {
        match self {
            Self::Computed(value) => Some(value),
            Self::Unavailable { .. } => None,
        }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Analysis<U> {
        match self {
            Self::Computed(value) => Analysis::Computed(f(value)),
            Self::Unavailable { capability, reason } => Analysis::Unavailable { capability, reason },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResearchTopic {
    VolumeTargets,
    ProgressionRates,
    Periodization,
    PlateauDetection,
    /// Free-text question
    Query(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Citation {
    pub reference: String,
    pub applies_to: String,
}

/// Citations backing a topic
pub fn evidence_for(topic: &ResearchTopic) -> Analysis<Vec<Citation>> {
    match topic {
        ResearchTopic::VolumeTargets => {
            let mut citations: Vec<Citation> = Vec::new();
            for group in MuscleGroup::ALL {
                let reference = volume::reference_target(group).citation;
                match citations.iter_mut().find(|c| c.reference == reference) {
                    Some(existing) => {
                        existing.applies_to = format!("{}, {}", existing.applies_to, group)
                    }
                    None => citations.push(Citation {
                        reference: reference.to_string(),
                        applies_to: group.to_string(),
                    }),
                }
            }
            Analysis::Computed(citations)
        }
        ResearchTopic::ProgressionRates => Analysis::Computed(vec![
            Citation {
                reference: format!(
                    "Compound lifts: {:.2}%/week; isolation lifts: {:.2}%/week (conservative intermediate gains, ACSM 2009 progression models)",
                    COMPOUND_WEEKLY_RATE * 100.0,
                    ISOLATION_WEEKLY_RATE * 100.0
                ),
                applies_to: "progression".to_string(),
            },
        ]),
        ResearchTopic::Periodization => Analysis::Computed(
            [
                PhaseType::Hypertrophy,
                PhaseType::Strength,
                PhaseType::Deload,
                PhaseType::Power,
            ]
            .iter()
            .map(|p| Citation {
                reference: p.research_backing().to_string(),
                applies_to: p.to_string(),
            })
            .collect(),
        ),
        ResearchTopic::PlateauDetection => Analysis::unavailable(
            "plateau evidence",
            "plateau thresholds are fixed legacy constants with no cited source",
        ),
        ResearchTopic::Query(q) => Analysis::unavailable(
            "research query engine",
            format!("free-text evidence search is not implemented (query: {:?})", q),
        ),
    }
}
