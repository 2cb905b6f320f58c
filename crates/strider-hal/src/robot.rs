//! Generic `LocomotionController` trait for a velocity-commanded legged base.
//!
//! The rest of the system only ever talks to this trait, so the simulated
//! base in [`sim`][crate::sim] can be swapped for a physics-engine policy or
//! a real robot driver without touching the tick loop or the bridge.

use strider_types::{Pose, StriderError, Twist};

/// A mobile base that tracks a planar velocity target.
pub trait LocomotionController: Send {
    /// Stable identifier, e.g. `"spot"`.
    fn id(&self) -> &str;

    /// Bring the controller up.  Called on the first tick and after every
    /// world reset.
    fn initialize(&mut self) -> Result<(), StriderError>;

    /// Advance the controller by one physics step of `dt` seconds, tracking
    /// `target` for this step only.
    ///
    /// # Errors
    ///
    /// Returns [`StriderError::HardwareFault`] when the step cannot be
    /// applied (e.g. the controller has not been initialised).
    fn forward(&mut self, dt: f64, target: Twist) -> Result<(), StriderError>;

    /// The base's current world pose.
    fn world_pose(&self) -> Result<Pose, StriderError>;

    /// Return the base to its spawn state.  The controller must be
    /// re-initialised afterwards.
    fn reset(&mut self);
}
