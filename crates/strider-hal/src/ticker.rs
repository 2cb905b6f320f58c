//! Fixed-rate tick runner.
//!
//! Advances a [`PhysicsStepConsumer`] at `physics_hz` on a dedicated OS
//! thread and publishes state every `render_every` physics ticks.  Pacing is
//! wall-clock only; it never changes the `dt` handed to the controller.

use std::io;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use tracing::{debug, info, warn};

use crate::camera::Camera;
use crate::consumer::PhysicsStepConsumer;
use crate::robot::LocomotionController;

/// Ticks of lag tolerated before the pacer gives up catching up.
const MAX_LAG_TICKS: u32 = 50;

/// Tick cadence for the physics and render timelines.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TickConfig {
    /// Physics step length.
    pub physics_dt: Duration,
    /// Publish state every this many physics ticks (at least 1).
    pub render_every: u32,
}

impl TickConfig {
    /// Derive a cadence from physics and render rates in Hz.
    ///
    /// Non-positive or non-finite rates fall back to the defaults.
    pub fn from_rates(physics_hz: f64, render_hz: f64) -> Self {
        let default = Self::default();
        if !(physics_hz.is_finite() && physics_hz > 0.0) {
            return default;
        }
        let physics_dt = Duration::from_secs_f64(1.0 / physics_hz);
        let render_every = if render_hz.is_finite() && render_hz > 0.0 {
            (physics_hz / render_hz).round().max(1.0) as u32
        } else {
            default.render_every
        };
        Self {
            physics_dt,
            render_every,
        }
    }
}

impl Default for TickConfig {
    /// 500 Hz physics, 50 Hz render.
    fn default() -> Self {
        Self {
            physics_dt: Duration::from_millis(2),
            render_every: 10,
        }
    }
}

/// Owns a consumer and drives it tick by tick.
pub struct TickLoop<R, C> {
    consumer: PhysicsStepConsumer<R, C>,
    config: TickConfig,
    ticks: u64,
}

impl<R, C> TickLoop<R, C>
where
    R: LocomotionController + 'static,
    C: Camera + 'static,
{
    pub fn new(consumer: PhysicsStepConsumer<R, C>, config: TickConfig) -> Self {
        Self {
            consumer,
            config,
            ticks: 0,
        }
    }

    pub fn consumer(&self) -> &PhysicsStepConsumer<R, C> {
        &self.consumer
    }

    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    /// Advance one physics tick, publishing state when the render cadence is
    /// due.  Returns `true` when state was published.
    pub fn step(&mut self) -> bool {
        self.consumer
            .on_physics_step(self.config.physics_dt.as_secs_f64());
        self.ticks += 1;
        if self.ticks % self.config.render_every.max(1) as u64 == 0 {
            self.consumer.publish();
            true
        } else {
            false
        }
    }

    /// Tick at the configured rate until `shutdown` is raised.  Returns the
    /// number of ticks run.
    pub fn run(mut self, shutdown: Arc<AtomicBool>) -> u64 {
        let dt = self.config.physics_dt;
        info!(
            physics_dt_ms = dt.as_secs_f64() * 1e3,
            render_every = self.config.render_every,
            "physics loop started"
        );
        let mut next = Instant::now() + dt;
        while !shutdown.load(Ordering::Acquire) {
            self.step();

            let now = Instant::now();
            if now < next {
                thread::sleep(next - now);
                next += dt;
            } else if now - next > dt * MAX_LAG_TICKS {
                warn!(lag_ms = (now - next).as_millis() as u64, "physics loop overrun; resynchronising");
                next = now + dt;
            } else {
                next += dt;
            }
        }
        debug!(ticks = self.ticks, "physics loop stopped");
        self.ticks
    }

    /// Run the loop on a named OS thread.
    pub fn spawn(self, shutdown: Arc<AtomicBool>) -> io::Result<JoinHandle<u64>> {
        thread::Builder::new()
            .name("strider-physics".to_string())
            .spawn(move || self.run(shutdown))
    }
}
