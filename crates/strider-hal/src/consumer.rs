//! [`PhysicsStepConsumer`] – the real-time side of the bridge.
//!
//! Driven by the tick loop, once per physics step:
//!
//! ```text
//!   Uninitialized ──first tick──▶ Running ──reset requested──▶ Resetting
//!        ▲                                                       │
//!        └───────────────────────────────────────────────────────┘
//! ```
//!
//! * **Uninitialized** – bring the robot and camera up, then go to Running.
//! * **Running** – read [`CommandBridge::get_command`] and hand it to the
//!   robot as this step's target.  Nothing is accumulated between ticks, so
//!   an expired command simply reads back as zero on the next tick.
//! * **Resetting** – reset the world and fall back to Uninitialized so the
//!   next tick re-initialises.
//!
//! After world advancement, on the render cadence, [`publish`] captures the
//! pose and the latest camera frame and publishes a fresh [`StateSnapshot`].
//! Sensor failures only degrade that snapshot; they never stop the loop.
//!
//! [`publish`]: PhysicsStepConsumer::publish

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use chrono::Utc;
use strider_bridge::CommandBridge;
use strider_types::{CameraFrame, SensorSummary, StateSnapshot, Twist};
use tracing::{debug, info, warn};

use crate::camera::Camera;
use crate::robot::LocomotionController;

/// Lifecycle state of the consumer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConsumerState {
    Uninitialized,
    Running,
    Resetting,
}

/// Cloneable handle used to request a world reset from any thread.
#[derive(Debug, Clone, Default)]
pub struct ResetHandle(Arc<AtomicBool>);

impl ResetHandle {
    /// Ask the consumer to reset the world on its next tick.
    pub fn request(&self) {
        self.0.store(true, Ordering::Release);
    }

    fn take(&self) -> bool {
        self.0.swap(false, Ordering::AcqRel)
    }
}

/// Reads the bridge every tick and publishes state on the render cadence.
pub struct PhysicsStepConsumer<R, C> {
    bridge: Arc<CommandBridge>,
    robot: R,
    camera: C,
    state: ConsumerState,
    reset: ResetHandle,
}

impl<R: LocomotionController, C: Camera> PhysicsStepConsumer<R, C> {
    pub fn new(bridge: Arc<CommandBridge>, robot: R, camera: C) -> Self {
        Self {
            bridge,
            robot,
            camera,
            state: ConsumerState::Uninitialized,
            reset: ResetHandle::default(),
        }
    }

    pub fn state(&self) -> ConsumerState {
        self.state
    }

    pub fn reset_handle(&self) -> ResetHandle {
        self.reset.clone()
    }

    pub fn robot(&self) -> &R {
        &self.robot
    }

    /// Run one physics step of `dt` seconds.
    pub fn on_physics_step(&mut self, dt: f64) -> ConsumerState {
        match self.state {
            ConsumerState::Uninitialized => self.initialize(),
            _ if self.reset.take() => {
                self.state = ConsumerState::Resetting;
                info!(robot = self.robot.id(), "world reset requested");
                self.robot.reset();
                self.state = ConsumerState::Uninitialized;
            }
            _ => {
                let target = self.bridge.get_command();
                if let Err(e) = self.robot.forward(dt, target) {
                    warn!(robot = self.robot.id(), error = %e, "controller step failed");
                }
            }
        }
        self.state
    }

    fn initialize(&mut self) {
        if let Err(e) = self.robot.initialize() {
            warn!(robot = self.robot.id(), error = %e, "robot initialisation failed; retrying next tick");
            return;
        }
        if let Err(e) = self.camera.initialize() {
            warn!(camera = self.camera.id(), error = %e, "camera initialisation failed");
        }
        self.state = ConsumerState::Running;
        info!(robot = self.robot.id(), "robot initialised");
    }

    /// Capture pose and camera, publish a snapshot to the bridge, and return
    /// a copy of it.
    pub fn publish(&mut self) -> StateSnapshot {
        let active_command: Twist = self.bridge.get_command();

        let sensor_summary = match self.camera.capture() {
            Ok(frame) => {
                let summary = summarize(self.camera.resolution(), &frame);
                self.bridge.set_camera_frame(frame);
                summary
            }
            Err(e) => {
                debug!(camera = self.camera.id(), error = %e, "camera capture failed");
                SensorSummary::empty(self.camera.resolution())
            }
        };

        let pose = match self.robot.world_pose() {
            Ok(pose) => Some(pose),
            Err(e) => {
                debug!(robot = self.robot.id(), error = %e, "pose read failed");
                None
            }
        };

        let snapshot = StateSnapshot {
            timestamp: Utc::now(),
            pose,
            active_command,
            sensor_summary,
        };
        self.bridge.publish_state(snapshot.clone());
        snapshot
    }
}

/// Per-channel mean over a frame.  Malformed frames count as no frame.
pub fn summarize(resolution: (u32, u32), frame: &CameraFrame) -> SensorSummary {
    if !frame.is_well_formed() {
        return SensorSummary::empty(resolution);
    }
    let mut sums = [0u64; 4];
    for px in frame.data.chunks_exact(CameraFrame::CHANNELS) {
        for (sum, &c) in sums.iter_mut().zip(px) {
            *sum += c as u64;
        }
    }
    let n = (frame.data.len() / CameraFrame::CHANNELS) as f64;
    SensorSummary {
        resolution,
        has_frame: true,
        rgba_mean: Some(sums.map(|s| s as f64 / n)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::{SimCamera, SimRobot};
    use strider_types::{Pose, StriderError};

    struct BrokenCamera;

    impl Camera for BrokenCamera {
        fn id(&self) -> &str {
            "broken"
        }

        fn resolution(&self) -> (u32, u32) {
            (4, 4)
        }

        fn capture(&mut self) -> Result<CameraFrame, StriderError> {
            Err(StriderError::HardwareFault {
                component: "broken".to_string(),
                details: "no buffer".to_string(),
            })
        }
    }

    struct BlindRobot(SimRobot);

    impl LocomotionController for BlindRobot {
        fn id(&self) -> &str {
            "blind"
        }
        fn initialize(&mut self) -> Result<(), StriderError> {
            self.0.initialize()
        }
        fn forward(&mut self, dt: f64, target: Twist) -> Result<(), StriderError> {
            self.0.forward(dt, target)
        }
        fn world_pose(&self) -> Result<Pose, StriderError> {
            Err(StriderError::HardwareFault {
                component: "blind".to_string(),
                details: "pose unavailable".to_string(),
            })
        }
        fn reset(&mut self) {
            self.0.reset()
        }
    }

    fn consumer() -> PhysicsStepConsumer<SimRobot, SimCamera> {
        PhysicsStepConsumer::new(
            Arc::new(CommandBridge::new()),
            SimRobot::new("spot", [0.0, 0.0, 0.8]),
            SimCamera::new("front_rgb", (8, 4)),
        )
    }

    #[test]
    fn first_tick_initialises_without_moving() {
        let mut c = consumer();
        c.bridge.set_command(Twist::new(1.0, 0.0, 0.0), 10.0);
        assert_eq!(c.on_physics_step(0.5), ConsumerState::Running);
        assert_eq!(c.robot().world_pose().unwrap().position[0], 0.0);
    }

    #[test]
    fn running_tick_applies_current_command() {
        let mut c = consumer();
        c.on_physics_step(0.01);
        c.bridge.set_command(Twist::new(1.0, 0.0, 0.0), 10.0);
        c.on_physics_step(0.5);
        assert!((c.robot().world_pose().unwrap().position[0] - 0.5).abs() < 1e-12);
    }

    #[test]
    fn expired_command_stops_motion_without_cancel() {
        let mut c = consumer();
        c.on_physics_step(0.01);
        c.bridge.set_command(Twist::new(1.0, 0.0, 0.0), -1.0);
        std::thread::sleep(std::time::Duration::from_millis(1));
        c.on_physics_step(0.5);
        c.on_physics_step(0.5);
        assert_eq!(c.robot().world_pose().unwrap().position[0], 0.0);
    }

    #[test]
    fn reset_returns_to_uninitialized_then_reinitialises() {
        let mut c = consumer();
        c.on_physics_step(0.01);
        c.bridge.set_command(Twist::new(1.0, 0.0, 0.0), 10.0);
        c.on_physics_step(1.0);

        c.reset_handle().request();
        assert_eq!(c.on_physics_step(0.01), ConsumerState::Uninitialized);
        assert_eq!(c.robot().world_pose().unwrap().position[0], 0.0);
        assert!(!c.robot().is_initialized());

        assert_eq!(c.on_physics_step(0.01), ConsumerState::Running);
        assert!(c.robot().is_initialized());
    }

    #[test]
    fn reset_request_is_consumed_once() {
        let mut c = consumer();
        c.on_physics_step(0.01);
        c.reset_handle().request();
        c.on_physics_step(0.01);
        c.on_physics_step(0.01);
        assert_eq!(c.on_physics_step(0.01), ConsumerState::Running);
    }

    #[test]
    fn publish_stores_snapshot_and_frame() {
        let mut c = consumer();
        c.on_physics_step(0.01);
        c.bridge.set_command(Twist::new(0.0, 0.0, 0.8), 10.0);
        let snapshot = c.publish();

        assert_eq!(snapshot.active_command, Twist::new(0.0, 0.0, 0.8));
        assert!(snapshot.sensor_summary.has_frame);
        assert_eq!(snapshot.sensor_summary.resolution, (8, 4));
        assert!(snapshot.pose.is_some());
        assert_eq!(c.bridge.read_state(), Some(snapshot));
        assert!(c.bridge.camera_frame().is_some());
    }

    #[test]
    fn camera_failure_degrades_summary() {
        let mut c = PhysicsStepConsumer::new(
            Arc::new(CommandBridge::new()),
            SimRobot::new("spot", [0.0, 0.0, 0.8]),
            BrokenCamera,
        );
        c.on_physics_step(0.01);
        let snapshot = c.publish();
        assert!(!snapshot.sensor_summary.has_frame);
        assert!(snapshot.sensor_summary.rgba_mean.is_none());
        assert!(c.bridge.camera_frame().is_none());
        // The loop keeps ticking.
        assert_eq!(c.on_physics_step(0.01), ConsumerState::Running);
    }

    #[test]
    fn pose_failure_degrades_snapshot() {
        let mut c = PhysicsStepConsumer::new(
            Arc::new(CommandBridge::new()),
            BlindRobot(SimRobot::new("spot", [0.0, 0.0, 0.8])),
            SimCamera::new("front_rgb", (2, 2)),
        );
        c.on_physics_step(0.01);
        let snapshot = c.publish();
        assert!(snapshot.pose.is_none());
        assert!(snapshot.sensor_summary.has_frame);
    }

    #[test]
    fn summarize_computes_channel_means() {
        let frame = CameraFrame {
            width: 2,
            height: 1,
            data: vec![0, 10, 100, 255, 20, 30, 200, 255],
        };
        let summary = summarize((2, 1), &frame);
        assert_eq!(summary.rgba_mean, Some([10.0, 20.0, 150.0, 255.0]));
    }

    #[test]
    fn summarize_rejects_malformed_frame() {
        let frame = CameraFrame {
            width: 4,
            height: 4,
            data: vec![0; 7],
        };
        assert!(!summarize((4, 4), &frame).has_frame);
    }
}
