//! Static reference tables for the planner.
//!
//! This module provides the built-in goal texts, metabolic stage guide,
//! chronotype start-time recommendations and the feeling/difficulty scales
//! offered when logging a completed fast.

use crate::Protocol;
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Informational goal attached to every fast of a protocol
pub fn goal_for(protocol: Protocol) -> &'static str {
    match protocol {
        Protocol::H12 => "Support the circadian rhythm",
        Protocol::H16 => "Improve insulin sensitivity",
        Protocol::H24 => "Trigger autophagy and cellular repair",
        Protocol::H36 => "Deep metabolic reset",
        Protocol::H48 => "Intensive cellular regeneration",
        Protocol::H72 => "Maximal autophagy and immune reset",
    }
}

// ============================================================================
// Fasting stages
// ============================================================================

/// A metabolic stage reached after a minimum number of fasting hours
#[derive(Clone, Debug)]
pub struct FastingStage {
    pub min_hours: u32,
    pub name: &'static str,
    pub tip: &'static str,
}

/// Stage guide, ordered by threshold - built once and reused
static FASTING_STAGES: Lazy<Vec<FastingStage>> = Lazy::new(build_stages);

fn build_stages() -> Vec<FastingStage> {
    let table: [(u32, &str, &str); 20] = [
        (0, "Digestion", "Insulin rises while cells take up glucose from the last meal."),
        (2, "Storage", "Surplus glucose is stored as glycogen in the liver and muscles."),
        (4, "Decline", "Blood sugar and insulin fall; the body draws on glycogen."),
        (6, "Mobilisation", "Glucagon releases stored glucose to keep energy stable."),
        (8, "Adaptation", "Glycogen runs low and the body prepares to burn fat."),
        (10, "Transition", "Glycogen is nearly gone; fat is mobilised and growth hormone rises."),
        (12, "Ketogenesis", "The liver starts turning fat into ketones."),
        (14, "Fat burning", "Ketosis is under way and ketones fuel the brain."),
        (16, "Cleanup", "Ketosis and autophagy run side by side."),
        (18, "Repair", "Autophagy intensifies, repairing cells and lowering inflammation."),
        (20, "Optimisation", "Deep ketosis; elevated growth hormone protects muscle."),
        (24, "Deepening", "Cellular repair continues at full speed on fat and ketones."),
        (28, "Growth hormone peak", "Growth hormone approaches its peak, sparing muscle."),
        (32, "Autophagy peak", "Cellular recycling is at its most intense."),
        (36, "Sustain", "Autophagy stays high and keeps clearing cellular debris."),
        (42, "Regeneration", "Growth hormone peaks and immune renewal begins."),
        (48, "Activation", "Falling IGF-1 prompts stem cells toward self-renewal."),
        (54, "Preparation", "Old immune cells are cleared to make room for new ones."),
        (60, "Immune cleanup", "Removal of damaged immune cells is at its maximum."),
        (66, "Reset", "The immune system is primed for renewal once you eat again."),
    ];

    table
        .into_iter()
        .map(|(min_hours, name, tip)| FastingStage {
            min_hours,
            name,
            tip,
        })
        .collect()
}

/// Get a reference to the cached stage guide
pub fn fasting_stages() -> &'static [FastingStage] {
    &FASTING_STAGES
}

/// The latest stage whose threshold has been reached
///
/// Returns `None` before the fast has started (negative elapsed time).
pub fn stage_for(elapsed_hours: f64) -> Option<&'static FastingStage> {
    if elapsed_hours < 0.0 {
        return None;
    }
    fasting_stages()
        .iter()
        .rev()
        .find(|stage| elapsed_hours >= f64::from(stage.min_hours))
}

// ============================================================================
// Chronotype recommendations
// ============================================================================

/// A person's natural daily rhythm
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Chronotype {
    Morning,
    Intermediate,
    Evening,
}

impl FromStr for Chronotype {
    type Err = crate::Error;

    fn from_str(s: &str) -> crate::Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "morning" => Ok(Chronotype::Morning),
            "intermediate" => Ok(Chronotype::Intermediate),
            "evening" => Ok(Chronotype::Evening),
            _ => Err(crate::Error::InvalidSettings(format!(
                "Unknown chronotype: {}",
                s
            ))),
        }
    }
}

impl fmt::Display for Chronotype {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Chronotype::Morning => "morning",
            Chronotype::Intermediate => "intermediate",
            Chronotype::Evening => "evening",
        };
        f.write_str(name)
    }
}

/// Suggested start hour for a protocol given the person's chronotype
pub fn recommended_start_hour(protocol: Protocol, chronotype: Chronotype) -> u32 {
    let (morning, intermediate, evening) = match protocol {
        Protocol::H12 => (19, 20, 21),
        Protocol::H16 => (15, 18, 20),
        Protocol::H24 | Protocol::H48 => (14, 14, 15),
        Protocol::H36 | Protocol::H72 => (18, 19, 20),
    };
    match chronotype {
        Chronotype::Morning => morning,
        Chronotype::Intermediate => intermediate,
        Chronotype::Evening => evening,
    }
}

// ============================================================================
// Feeling scales
// ============================================================================

/// Mood symbols offered when logging a fast, with their labels
pub const FEELINGS: [(&str, &str); 6] = [
    ("💪", "Energetic"),
    ("🧠", "Focused"),
    ("😊", "Good"),
    ("🥱", "Tired"),
    ("🍽️", "Hungry"),
    ("🎉", "Proud"),
];

/// Label for a difficulty rating (1..=5)
pub fn difficulty_label(difficulty: u8) -> Option<&'static str> {
    match difficulty {
        1 => Some("Very easy"),
        2 => Some("Easy"),
        3 => Some("Moderate"),
        4 => Some("Hard"),
        5 => Some("Very hard"),
        _ => None,
    }
}
