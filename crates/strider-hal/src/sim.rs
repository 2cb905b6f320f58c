//! In-process simulated drivers for headless runs and CI.
//!
//! [`SimRobot`] is a kinematic planar base: each physics step it integrates
//! the body-frame velocity target into its world pose.  [`SimCamera`]
//! renders a synthetic horizon image at the configured resolution.
//! Together they let the full stack run without a physics engine.
//!
//! # Example
//!
//! ```rust
//! use strider_hal::robot::LocomotionController;
//! use strider_hal::sim::SimRobot;
//! use strider_types::Twist;
//!
//! let mut robot = SimRobot::new("spot", [0.0, 0.0, 0.8]);
//! robot.initialize().unwrap();
//! for _ in 0..500 {
//!     robot.forward(0.002, Twist::new(1.0, 0.0, 0.0)).unwrap();
//! }
//! let pose = robot.world_pose().unwrap();
//! assert!((pose.position[0] - 1.0).abs() < 1e-9);
//! ```

use std::f64::consts::{PI, TAU};

use strider_types::{CameraFrame, Pose, StriderError, Twist};

use crate::camera::Camera;
use crate::robot::LocomotionController;

// ────────────────────────────────────────────────────────────────────────────
// Simulated base
// ────────────────────────────────────────────────────────────────────────────

/// A kinematic base that follows its velocity target exactly.
pub struct SimRobot {
    id: String,
    spawn: [f64; 3],
    position: [f64; 3],
    yaw: f64,
    initialized: bool,
}

impl SimRobot {
    /// Create a base at `spawn`, facing +X.
    pub fn new(id: impl Into<String>, spawn: [f64; 3]) -> Self {
        Self {
            id: id.into(),
            spawn,
            position: spawn,
            yaw: 0.0,
            initialized: false,
        }
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }
}

/// Wrap an angle into `(-π, π]`.
fn wrap_angle(rad: f64) -> f64 {
    let wrapped = (rad + PI).rem_euclid(TAU) - PI;
    if wrapped == -PI { PI } else { wrapped }
}

impl LocomotionController for SimRobot {
    fn id(&self) -> &str {
        &self.id
    }

    fn initialize(&mut self) -> Result<(), StriderError> {
        self.initialized = true;
        Ok(())
    }

    fn forward(&mut self, dt: f64, target: Twist) -> Result<(), StriderError> {
        if !self.initialized {
            return Err(StriderError::HardwareFault {
                component: self.id.clone(),
                details: "forward() called before initialize()".to_string(),
            });
        }
        let (s, c) = self.yaw.sin_cos();
        self.position[0] += (target.vx * c - target.vy * s) * dt;
        self.position[1] += (target.vx * s + target.vy * c) * dt;
        self.yaw = wrap_angle(self.yaw + target.yaw_rate * dt);
        Ok(())
    }

    fn world_pose(&self) -> Result<Pose, StriderError> {
        Ok(Pose::planar(self.position, self.yaw))
    }

    fn reset(&mut self) {
        self.position = self.spawn;
        self.yaw = 0.0;
        self.initialized = false;
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Simulated camera
// ────────────────────────────────────────────────────────────────────────────

const SKY: [u8; 4] = [135, 206, 235, 255];
const GROUND: [u8; 3] = [96, 96, 96];

/// A camera that renders a fixed sky/ground horizon image.
pub struct SimCamera {
    id: String,
    width: u32,
    height: u32,
    captures: u64,
}

impl SimCamera {
    /// Create a simulated camera with the given identifier and resolution.
    pub fn new(id: impl Into<String>, resolution: (u32, u32)) -> Self {
        Self {
            id: id.into(),
            width: resolution.0,
            height: resolution.1,
            captures: 0,
        }
    }

    /// Number of frames captured so far.
    pub fn captures(&self) -> u64 {
        self.captures
    }
}

impl Camera for SimCamera {
    fn id(&self) -> &str {
        &self.id
    }

    fn resolution(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    fn capture(&mut self) -> Result<CameraFrame, StriderError> {
        let (w, h) = (self.width as usize, self.height as usize);
        let mut data = Vec::with_capacity(w * h * CameraFrame::CHANNELS);
        for row in 0..h {
            let pixel = if row < h / 2 {
                SKY
            } else {
                // Ground darkens toward the horizon.
                let depth = (row - h / 2) as f64 / (h - h / 2).max(1) as f64;
                let shade = |c: u8| (c as f64 * (0.5 + 0.5 * depth)) as u8;
                [shade(GROUND[0]), shade(GROUND[1]), shade(GROUND[2]), 255]
            };
            for _ in 0..w {
                data.extend_from_slice(&pixel);
            }
        }
        self.captures += 1;
        Ok(CameraFrame {
            width: self.width,
            height: self.height,
            data,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn forward_before_initialize_is_a_fault() {
        let mut robot = SimRobot::new("spot", [0.0, 0.0, 0.8]);
        let err = robot.forward(0.01, Twist::new(1.0, 0.0, 0.0)).unwrap_err();
        assert!(matches!(err, StriderError::HardwareFault { component, .. } if component == "spot"));
    }

    #[test]
    fn strafe_moves_along_body_y() {
        let mut robot = SimRobot::new("spot", [0.0, 0.0, 0.8]);
        robot.initialize().unwrap();
        robot.forward(1.0, Twist::new(0.0, 0.5, 0.0)).unwrap();
        let pose = robot.world_pose().unwrap();
        assert!(pose.position[0].abs() < 1e-12);
        assert!((pose.position[1] - 0.5).abs() < 1e-12);
        assert!((pose.position[2] - 0.8).abs() < 1e-12);
    }

    #[test]
    fn forward_follows_heading_after_turn() {
        let mut robot = SimRobot::new("spot", [0.0, 0.0, 0.8]);
        robot.initialize().unwrap();
        robot
            .forward(1.0, Twist::new(0.0, 0.0, std::f64::consts::FRAC_PI_2))
            .unwrap();
        robot.forward(2.0, Twist::new(1.0, 0.0, 0.0)).unwrap();
        let pose = robot.world_pose().unwrap();
        assert!(pose.position[0].abs() < 1e-9);
        assert!((pose.position[1] - 2.0).abs() < 1e-9);
        assert!((pose.orientation_yaw_rad - std::f64::consts::FRAC_PI_2).abs() < 1e-12);
    }

    #[test]
    fn yaw_wraps_into_half_open_range() {
        assert!((wrap_angle(3.0 * PI / 2.0) - (-PI / 2.0)).abs() < 1e-12);
        assert!((wrap_angle(-PI) - PI).abs() < 1e-12);
        assert!((wrap_angle(0.25) - 0.25).abs() < 1e-12);
    }

    #[test]
    fn reset_returns_to_spawn_uninitialized() {
        let mut robot = SimRobot::new("spot", [1.0, 2.0, 0.8]);
        robot.initialize().unwrap();
        robot.forward(1.0, Twist::new(1.0, 1.0, 1.0)).unwrap();
        robot.reset();
        assert!(!robot.is_initialized());
        let pose = robot.world_pose().unwrap();
        assert_eq!(pose.position, [1.0, 2.0, 0.8]);
        assert_eq!(pose.orientation_yaw_rad, 0.0);
    }

    #[test]
    fn sim_camera_renders_well_formed_frames() {
        let mut cam = SimCamera::new("front_rgb", (8, 4));
        let frame = cam.capture().unwrap();
        assert!(frame.is_well_formed());
        assert_eq!(&frame.data[..4], &SKY);
        assert_eq!(frame.data[frame.data.len() - 1], 255);
        assert_eq!(cam.captures(), 1);
    }
}
