//! Turning a classification response into a motion primitive.
//!
//! The classifier answers in free text.  Only the first line counts: it is
//! uppercased and checked against a fixed, ordered rule list, and the first
//! rule whose label appears in it wins.  There is no confidence scoring; a
//! line that matches nothing falls back to a cautious forward step.
//!
//! | Decision | Primitive | Speed | Duration (s) |
//! |---|---|---|---|
//! | `FORWARD` | forward | 1.0 | 2.0 |
//! | `SLOW` | forward | 1.0 | 1.0 |
//! | `OBSTACLE_LEFT` | left | 1.0 | 1.0 |
//! | `OBSTACLE_RIGHT` | right | 1.0 | 1.0 |
//! | no match | forward | 1.0 | 1.0 |
//! | `BLOCKED` | see [`escalate`] | | |

use std::fmt;

use strider_bridge::Direction;

/// The label extracted from a classification response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Decision {
    Forward,
    Slow,
    ObstacleLeft,
    ObstacleRight,
    Blocked,
    /// Nothing matched; treated as a cautious forward step.
    Unknown,
}

/// Match order matters: the first label found in the token wins.
const RULES: [(&str, Decision); 5] = [
    ("FORWARD", Decision::Forward),
    ("SLOW", Decision::Slow),
    ("OBSTACLE_LEFT", Decision::ObstacleLeft),
    ("OBSTACLE_RIGHT", Decision::ObstacleRight),
    ("BLOCKED", Decision::Blocked),
];

impl Decision {
    /// The fixed motion plan for this decision, or `None` for
    /// [`Decision::Blocked`], which goes through [`escalate`] instead.
    pub fn plan(self) -> Option<MotionPlan> {
        let (direction, duration_s) = match self {
            Decision::Forward => (Direction::Forward, 2.0),
            Decision::Slow | Decision::Unknown => (Direction::Forward, 1.0),
            Decision::ObstacleLeft => (Direction::StrafeLeft, 1.0),
            Decision::ObstacleRight => (Direction::StrafeRight, 1.0),
            Decision::Blocked => return None,
        };
        Some(MotionPlan {
            direction,
            speed: 1.0,
            duration_s,
        })
    }
}

impl fmt::Display for Decision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Decision::Forward => "FORWARD",
            Decision::Slow => "SLOW",
            Decision::ObstacleLeft => "OBSTACLE_LEFT",
            Decision::ObstacleRight => "OBSTACLE_RIGHT",
            Decision::Blocked => "BLOCKED",
            Decision::Unknown => "UNKNOWN",
        };
        f.write_str(label)
    }
}

/// Uppercased first line of a response.
pub fn decision_token(response: &str) -> String {
    response.lines().next().unwrap_or_default().to_uppercase()
}

/// Classify a free-text response.
pub fn parse_decision(response: &str) -> Decision {
    let token = decision_token(response);
    RULES
        .iter()
        .find(|(label, _)| token.contains(label))
        .map(|&(_, decision)| decision)
        .unwrap_or(Decision::Unknown)
}

/// A motion primitive with its speed and command window.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MotionPlan {
    pub direction: Direction,
    pub speed: f64,
    pub duration_s: f64,
}

/// What to do after the `n`-th consecutive `BLOCKED` decision.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Escalation {
    Turn(MotionPlan),
    /// Stop the robot and end the run.
    GiveUp,
}

/// Consecutive-blocked count at which the loop gives up.
pub const ESCALATION_CEILING: u32 = 5;

/// Escalation policy: two left turns, two right turns, then give up.
pub fn escalate(consecutive_blocked: u32) -> Escalation {
    let direction = match consecutive_blocked {
        0..=2 => Direction::TurnLeft,
        3..=4 => Direction::TurnRight,
        _ => return Escalation::GiveUp,
    };
    Escalation::Turn(MotionPlan {
        direction,
        speed: 1.0,
        duration_s: 1.0,
    })
}
