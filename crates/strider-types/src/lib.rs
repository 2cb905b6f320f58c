use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Planar base velocity: forward/lateral speed in the body frame plus yaw rate.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Twist {
    /// Forward velocity (m/s), positive ahead of the robot.
    pub vx: f64,
    /// Lateral velocity (m/s), positive to the robot's left.
    pub vy: f64,
    /// Yaw rate (rad/s), positive counter-clockwise.
    pub yaw_rate: f64,
}

impl Twist {
    pub const ZERO: Twist = Twist {
        vx: 0.0,
        vy: 0.0,
        yaw_rate: 0.0,
    };

    pub fn new(vx: f64, vy: f64, yaw_rate: f64) -> Self {
        Self { vx, vy, yaw_rate }
    }

    pub fn is_zero(&self) -> bool {
        self.vx == 0.0 && self.vy == 0.0 && self.yaw_rate == 0.0
    }
}

/// World pose of the robot base.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Pose {
    /// Base position in the world frame (metres).
    pub position: [f64; 3],
    pub orientation_xyzw: [f64; 4],
    /// Roll, pitch, yaw (radians).
    pub orientation_euler_rad: [f64; 3],
    pub orientation_yaw_rad: f64,
}

impl Pose {
    /// Build a pose for a base that only rotates about the vertical axis.
    pub fn planar(position: [f64; 3], yaw_rad: f64) -> Self {
        let half = yaw_rad * 0.5;
        Self {
            position,
            orientation_xyzw: [0.0, 0.0, half.sin(), half.cos()],
            orientation_euler_rad: [0.0, 0.0, yaw_rad],
            orientation_yaw_rad: yaw_rad,
        }
    }
}

/// Lightweight digest of the camera state, computed once per render tick.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SensorSummary {
    /// Configured camera resolution as `(width, height)`.
    pub resolution: (u32, u32),
    pub has_frame: bool,
    /// Per-channel RGBA mean over the latest frame.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rgba_mean: Option<[f64; 4]>,
}

impl SensorSummary {
    /// A summary that carries only the configured resolution.
    pub fn empty(resolution: (u32, u32)) -> Self {
        Self {
            resolution,
            has_frame: false,
            rgba_mean: None,
        }
    }
}

/// Robot and sensor state published by the physics side once per render tick.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StateSnapshot {
    pub timestamp: DateTime<Utc>,
    /// `None` when the pose could not be read on this tick.
    pub pose: Option<Pose>,
    /// The command vector that was in effect when the snapshot was taken.
    pub active_command: Twist,
    pub sensor_summary: SensorSummary,
}

/// A raw RGBA8 image frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CameraFrame {
    /// Frame width in pixels.
    pub width: u32,
    /// Frame height in pixels.
    pub height: u32,
    /// Row-major RGBA8 pixel data, `width * height * 4` bytes.
    pub data: Vec<u8>,
}

impl CameraFrame {
    pub const CHANNELS: usize = 4;

    /// `true` when the buffer length matches the declared dimensions and the
    /// frame is not empty.
    pub fn is_well_formed(&self) -> bool {
        let expected = self.width as usize * self.height as usize * Self::CHANNELS;
        expected > 0 && self.data.len() == expected
    }
}

/// The command a producer call actually applied to the bridge.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AppliedCommand {
    pub vx: f64,
    pub vy: f64,
    pub yaw_rate: f64,
    /// Effective command window after clamping (seconds).
    pub duration_s: f64,
}

impl AppliedCommand {
    pub fn twist(&self) -> Twist {
        Twist::new(self.vx, self.vy, self.yaw_rate)
    }
}

/// Global error type spanning command validation, hardware faults, and
/// external collaborator failures.
#[derive(Error, Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum StriderError {
    #[error("Unknown direction '{0}'. Use one of: forward/back/left/right/turn_left/turn_right/stop")]
    InvalidDirection(String),

    #[error("No camera frame available")]
    NoCameraFrame,

    #[error("Hardware Fault on {component}: {details}")]
    HardwareFault { component: String, details: String },

    #[error("Classification Failed: {0}")]
    ClassificationFailed(String),

    #[error("Transport Error: {0}")]
    Transport(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn planar_pose_quaternion_matches_yaw() {
        let pose = Pose::planar([1.0, 2.0, 0.8], std::f64::consts::FRAC_PI_2);
        let [x, y, z, w] = pose.orientation_xyzw;
        assert!(x.abs() < 1e-12 && y.abs() < 1e-12);
        assert!((z - (std::f64::consts::FRAC_PI_4).sin()).abs() < 1e-12);
        assert!((w - (std::f64::consts::FRAC_PI_4).cos()).abs() < 1e-12);
        assert_eq!(pose.orientation_euler_rad[2], pose.orientation_yaw_rad);
    }

    #[test]
    fn twist_zero_is_zero() {
        assert!(Twist::ZERO.is_zero());
        assert!(!Twist::new(0.0, 0.0, 0.1).is_zero());
    }

    #[test]
    fn camera_frame_well_formed_checks_length() {
        let ok = CameraFrame {
            width: 2,
            height: 2,
            data: vec![0u8; 16],
        };
        assert!(ok.is_well_formed());

        let short = CameraFrame {
            width: 2,
            height: 2,
            data: vec![0u8; 12],
        };
        assert!(!short.is_well_formed());

        let empty = CameraFrame {
            width: 0,
            height: 0,
            data: Vec::new(),
        };
        assert!(!empty.is_well_formed());
    }

    #[test]
    fn empty_summary_omits_mean_in_json() {
        let summary = SensorSummary::empty((512, 256));
        let json = serde_json::to_string(&summary).unwrap();
        assert!(json.contains("\"has_frame\":false"));
        assert!(!json.contains("rgba_mean"));
    }

    #[test]
    fn snapshot_json_carries_active_command() {
        let snapshot = StateSnapshot {
            timestamp: Utc::now(),
            pose: Some(Pose::planar([0.0, 0.0, 0.8], 0.0)),
            active_command: Twist::new(1.0, 0.0, 0.0),
            sensor_summary: SensorSummary::empty((4, 4)),
        };
        let json = serde_json::to_string(&snapshot).unwrap();
        assert!(json.contains("\"active_command\":{\"vx\":1.0"));
        let back: StateSnapshot = serde_json::from_str(&json).unwrap();
        assert_eq!(back, snapshot);
    }

    #[test]
    fn strider_error_display() {
        let err = StriderError::InvalidDirection("diagonal".to_string());
        assert!(err.to_string().contains("diagonal"));

        let err2 = StriderError::HardwareFault {
            component: "front_rgb".to_string(),
            details: "buffer unavailable".to_string(),
        };
        assert!(err2.to_string().contains("front_rgb"));
    }
}
