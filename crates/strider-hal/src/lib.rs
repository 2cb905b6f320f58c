//! `strider-hal` – robot-side drivers and the real-time tick.
//!
//! # Modules
//!
//! - [`robot`] – [`LocomotionController`][robot::LocomotionController]: a
//!   velocity-commanded base.
//! - [`camera`] – [`Camera`][camera::Camera]: an RGBA image source.
//! - [`sim`] – kinematic [`SimRobot`][sim::SimRobot] and synthetic
//!   [`SimCamera`][sim::SimCamera] for headless runs.
//! - [`consumer`] – [`PhysicsStepConsumer`][consumer::PhysicsStepConsumer]:
//!   reads the bridge every tick and publishes state snapshots.
//! - [`ticker`] – [`TickLoop`][ticker::TickLoop]: fixed-rate runner on its
//!   own thread.

pub mod camera;
pub mod consumer;
pub mod robot;
pub mod sim;
pub mod ticker;

pub use camera::Camera;
pub use consumer::{ConsumerState, PhysicsStepConsumer, ResetHandle};
pub use robot::LocomotionController;
pub use sim::{SimCamera, SimRobot};
pub use ticker::{TickConfig, TickLoop};
