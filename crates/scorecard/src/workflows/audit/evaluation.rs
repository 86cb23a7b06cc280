use serde::Serialize;

pub const MIN_DISPLAY_SCORE: i32 = 0;
pub const MAX_DISPLAY_SCORE: i32 = 100;

const OPTIMIZED_FLOOR: u8 = 80;
const IMPROVEMENT_FLOOR: u8 = 50;

const LEAKING_MESSAGE: &str = "Your business is currently leaking significant revenue through manual processes. We can help you automate these workflows.";
const FOUNDATION_MESSAGE: &str = "You have a solid foundation, but there are advanced optimization opportunities available to scale further.";

/// Clamps a running score into the 0-100 band shown to users and persisted.
pub fn display_score(running_score: i32) -> u8 {
    running_score.clamp(MIN_DISPLAY_SCORE, MAX_DISPLAY_SCORE) as u8
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ScoreTier {
    Optimized,
    RoomForImprovement,
    CriticalInefficiency,
}

impl ScoreTier {
    pub const fn of(display_score: u8) -> Self {
        if display_score >= OPTIMIZED_FLOOR {
            Self::Optimized
        } else if display_score >= IMPROVEMENT_FLOOR {
            Self::RoomForImprovement
        } else {
            Self::CriticalInefficiency
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Optimized => "Optimized",
            Self::RoomForImprovement => "Room for Improvement",
            Self::CriticalInefficiency => "Critical Inefficiency",
        }
    }
}

/// Two-bucket message split at 50; deliberately independent of [`ScoreTier`].
pub fn message_of(display_score: u8) -> &'static str {
    if display_score < IMPROVEMENT_FLOOR {
        LEAKING_MESSAGE
    } else {
        FOUNDATION_MESSAGE
    }
}

/// Everything the results view needs, derived locally from the running score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct AuditResult {
    pub display_score: u8,
    pub tier: ScoreTier,
    pub tier_label: &'static str,
    pub message: &'static str,
}

impl AuditResult {
    pub fn from_running_score(running_score: i32) -> Self {
        let display_score = display_score(running_score);
        let tier = ScoreTier::of(display_score);
        Self {
            display_score,
            tier,
            tier_label: tier.label(),
            message: message_of(display_score),
        }
    }
}
