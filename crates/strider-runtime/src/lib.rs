//! `strider-runtime` – the navigation brain.
//!
//! Reads camera frames through [`RobotControl`][strider_bridge::RobotControl],
//! asks a vision model what it sees, and turns the answer into motion
//! primitives.
//!
//! # Modules
//!
//! - [`nav_loop`] – [`NavLoop`][nav_loop::NavLoop]: the observe–classify–act
//!   cycle with blocked-path escalation and a step budget.
//! - [`decision`] – response parsing and the fixed decision → primitive
//!   policy.
//! - [`vision_driver`] – [`VisionDriver`][vision_driver::VisionDriver]: an
//!   Ollama `/api/generate` client behind the
//!   [`Classifier`][vision_driver::Classifier] seam.
//! - [`telemetry`] – [`init_tracing`][telemetry::init_tracing]: console logs
//!   plus optional OTLP span export.

pub mod decision;
pub mod nav_loop;
pub mod telemetry;
pub mod vision_driver;

pub use decision::{Decision, Escalation, MotionPlan, escalate, parse_decision};
pub use nav_loop::{NavConfig, NavLoop, NavProgress, NavState, NavSummary, StepOutcome, Termination};
pub use telemetry::{LogFormat, TracerProviderGuard, init_tracing};
pub use vision_driver::{Classifier, NAVIGATION_PROMPT, SYSTEM_PROMPT, VisionDriver, VisionError};
