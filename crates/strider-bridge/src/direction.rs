//! Symbolic direction tokens and their velocity vectors.
//!
//! | Tokens (case-insensitive) | Vector |
//! |---|---|
//! | `forward`, `fwd`, `front` | `(+speed, 0, 0)` |
//! | `back`, `backward`, `reverse` | `(-speed, 0, 0)` |
//! | `left`, `strafe_left` | `(0, +speed, 0)` |
//! | `right`, `strafe_right` | `(0, -speed, 0)` |
//! | `turn_left`, `yaw_left`, `rotate_left` | `(0, 0, +yaw_rate)` |
//! | `turn_right`, `yaw_right`, `rotate_right` | `(0, 0, -yaw_rate)` |
//! | `stop`, `halt` | `(0, 0, 0)` |

use std::fmt;
use std::str::FromStr;

use strider_types::{StriderError, Twist};

/// A motion primitive the base understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    Forward,
    Backward,
    StrafeLeft,
    StrafeRight,
    TurnLeft,
    TurnRight,
    Stop,
}

impl Direction {
    /// Canonical token, accepted back by [`FromStr`].
    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::Forward => "forward",
            Direction::Backward => "back",
            Direction::StrafeLeft => "left",
            Direction::StrafeRight => "right",
            Direction::TurnLeft => "turn_left",
            Direction::TurnRight => "turn_right",
            Direction::Stop => "stop",
        }
    }

    /// Velocity vector for this primitive at the given speed and yaw rate.
    pub fn to_twist(self, speed: f64, yaw_rate: f64) -> Twist {
        match self {
            Direction::Forward => Twist::new(speed, 0.0, 0.0),
            Direction::Backward => Twist::new(-speed, 0.0, 0.0),
            Direction::StrafeLeft => Twist::new(0.0, speed, 0.0),
            Direction::StrafeRight => Twist::new(0.0, -speed, 0.0),
            Direction::TurnLeft => Twist::new(0.0, 0.0, yaw_rate),
            Direction::TurnRight => Twist::new(0.0, 0.0, -yaw_rate),
            Direction::Stop => Twist::ZERO,
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Direction {
    type Err = StriderError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "forward" | "fwd" | "front" => Ok(Direction::Forward),
            "back" | "backward" | "reverse" => Ok(Direction::Backward),
            "left" | "strafe_left" => Ok(Direction::StrafeLeft),
            "right" | "strafe_right" => Ok(Direction::StrafeRight),
            "turn_left" | "yaw_left" | "rotate_left" => Ok(Direction::TurnLeft),
            "turn_right" | "yaw_right" | "rotate_right" => Ok(Direction::TurnRight),
            "stop" | "halt" => Ok(Direction::Stop),
            _ => Err(StriderError::InvalidDirection(s.to_string())),
        }
    }
}

/// Translate a direction token into a velocity vector.
///
/// # Errors
///
/// Returns [`StriderError::InvalidDirection`] for tokens outside the table.
pub fn direction_to_command(token: &str, speed: f64, yaw_rate: f64) -> Result<Twist, StriderError> {
    Ok(token.parse::<Direction>()?.to_twist(speed, yaw_rate))
}
