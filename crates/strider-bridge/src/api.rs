//! The command producer API.
//!
//! [`RobotControl`] is the seam every controller talks to: the navigation
//! loop, a debug endpoint, or any other producer.  [`CommandApi`] is the
//! in-process implementation that writes straight into a shared
//! [`CommandBridge`].  Remote transports implement the same trait.
//!
//! Each call is a single atomic bridge operation; a producer never leaves a
//! half-applied command behind.

use std::sync::Arc;

use async_trait::async_trait;
use strider_types::{AppliedCommand, CameraFrame, StateSnapshot, StriderError, Twist};
use tracing::{debug, info};

use crate::bridge::CommandBridge;
use crate::direction::direction_to_command;

/// Operations an external controller may perform on the robot.
#[async_trait]
pub trait RobotControl: Send + Sync {
    /// Move in `direction` for `duration_s` seconds.
    ///
    /// # Errors
    ///
    /// Returns [`StriderError::InvalidDirection`] for unknown tokens; the
    /// bridge is left untouched in that case.
    async fn set_command(
        &self,
        direction: &str,
        duration_s: f64,
        speed: f64,
        yaw_rate: f64,
    ) -> Result<AppliedCommand, StriderError>;

    /// Apply a raw velocity vector, bypassing direction translation.
    async fn set_base_command(
        &self,
        vx: f64,
        vy: f64,
        yaw_rate: f64,
        duration_s: f64,
    ) -> Result<AppliedCommand, StriderError>;

    /// Halt immediately.  Equivalent to `set_base_command(0, 0, 0, 0)`.
    async fn stop(&self) -> Result<(), StriderError> {
        self.set_base_command(0.0, 0.0, 0.0, 0.0).await.map(|_| ())
    }

    /// The latest published state, if the physics side has published one.
    async fn get_state(&self) -> Result<Option<StateSnapshot>, StriderError>;

    /// The latest camera frame.
    ///
    /// # Errors
    ///
    /// Returns [`StriderError::NoCameraFrame`] until the first frame lands.
    async fn get_camera_image(&self) -> Result<Arc<CameraFrame>, StriderError>;
}

/// In-process [`RobotControl`] backed by a shared [`CommandBridge`].
#[derive(Clone)]
pub struct CommandApi {
    bridge: Arc<CommandBridge>,
}

impl CommandApi {
    pub fn new(bridge: Arc<CommandBridge>) -> Self {
        Self { bridge }
    }

    /// Return the bridge this API writes to.
    pub fn bridge(&self) -> &Arc<CommandBridge> {
        &self.bridge
    }

    fn apply(&self, twist: Twist, duration_s: f64) -> AppliedCommand {
        let window = self.bridge.set_command(twist, duration_s);
        AppliedCommand {
            vx: twist.vx,
            vy: twist.vy,
            yaw_rate: twist.yaw_rate,
            duration_s: window.as_secs_f64(),
        }
    }
}

#[async_trait]
impl RobotControl for CommandApi {
    async fn set_command(
        &self,
        direction: &str,
        duration_s: f64,
        speed: f64,
        yaw_rate: f64,
    ) -> Result<AppliedCommand, StriderError> {
        let twist = direction_to_command(direction, speed, yaw_rate)?;
        let applied = self.apply(twist, duration_s);
        info!(direction, ?applied, "move command applied");
        Ok(applied)
    }

    async fn set_base_command(
        &self,
        vx: f64,
        vy: f64,
        yaw_rate: f64,
        duration_s: f64,
    ) -> Result<AppliedCommand, StriderError> {
        let applied = self.apply(Twist::new(vx, vy, yaw_rate), duration_s);
        debug!(?applied, "base command applied");
        Ok(applied)
    }

    async fn get_state(&self) -> Result<Option<StateSnapshot>, StriderError> {
        Ok(self.bridge.read_state())
    }

    async fn get_camera_image(&self) -> Result<Arc<CameraFrame>, StriderError> {
        self.bridge.camera_frame().ok_or(StriderError::NoCameraFrame)
    }
}
