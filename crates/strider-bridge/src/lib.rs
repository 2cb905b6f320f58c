//! `strider-bridge` – the meeting point of the two timelines.
//!
//! The physics tick and the (much slower) decision loop never talk to each
//! other directly.  They share exactly one object, the [`CommandBridge`],
//! whose lock is only ever held for a value copy.
//!
//! # Modules
//!
//! - [`bridge`] – [`CommandBridge`][bridge::CommandBridge]: the time-windowed
//!   velocity command plus the latest state snapshot and camera frame.
//! - [`direction`] – [`Direction`][direction::Direction] and
//!   [`direction_to_command`][direction::direction_to_command]: the fixed
//!   synonym table mapping tokens such as `"turn_left"` to velocity vectors.
//! - [`api`] – [`RobotControl`][api::RobotControl], the producer-facing
//!   trait, and [`CommandApi`][api::CommandApi], its in-process
//!   implementation.

pub mod api;
pub mod bridge;
pub mod direction;

pub use api::{CommandApi, RobotControl};
pub use bridge::{CommandBridge, VelocityCommand};
pub use direction::{Direction, direction_to_command};
