//! [`CommandBridge`] – the only state shared between the physics tick and
//! external command producers.
//!
//! The bridge holds three values behind a single [`Mutex`]:
//!
//! * the current [`VelocityCommand`] (last write wins, no queueing),
//! * the most recently published [`StateSnapshot`],
//! * the latest [`CameraFrame`] (overwritten, no history).
//!
//! Every operation takes the lock for a constant-time copy and releases it
//! before returning.  Nothing here performs I/O or waits on another
//! component, so a stalled producer can never hold up the physics tick.
//!
//! # Expiry
//!
//! A command carries an `expires_at` deadline on the monotonic clock.  There
//! is no timer and no cancel operation: [`CommandBridge::get_command`] simply
//! reports [`Twist::ZERO`] once the deadline has passed, so a command whose
//! issuer died silently lapses to a standstill.
//!
//! # Example
//!
//! ```
//! use strider_bridge::CommandBridge;
//! use strider_types::Twist;
//!
//! let bridge = CommandBridge::new();
//! bridge.set_command(Twist::new(0.5, 0.0, 0.0), 1.0);
//! assert_eq!(bridge.get_command(), Twist::new(0.5, 0.0, 0.0));
//!
//! // Negative windows clamp to zero: the command is already over.
//! bridge.set_command(Twist::new(0.5, 0.0, 0.0), -3.0);
//! std::thread::sleep(std::time::Duration::from_millis(1));
//! assert_eq!(bridge.get_command(), Twist::ZERO);
//! ```

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use strider_types::{CameraFrame, StateSnapshot, Twist};
use tracing::trace;

// ────────────────────────────────────────────────────────────────────────────
// VelocityCommand
// ────────────────────────────────────────────────────────────────────────────

/// A velocity target together with the end of its command window.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VelocityCommand {
    pub twist: Twist,
    pub expires_at: Instant,
}

impl VelocityCommand {
    /// Build a command issued at `now` that stays active for `duration_s`
    /// seconds.
    ///
    /// Negative, NaN, infinite, or otherwise unrepresentable windows clamp
    /// to zero, so `expires_at >= now` always holds.
    pub fn issued_at(twist: Twist, duration_s: f64, now: Instant) -> Self {
        let window = clamp_window(duration_s);
        let expires_at = now.checked_add(window).unwrap_or(now);
        Self { twist, expires_at }
    }

    /// The vector in effect at `now`: the stored twist until the window
    /// closes, [`Twist::ZERO`] strictly after it.
    pub fn effective_at(&self, now: Instant) -> Twist {
        if now > self.expires_at {
            Twist::ZERO
        } else {
            self.twist
        }
    }
}

/// Clamp a requested window to a non-negative [`Duration`].
pub fn clamp_window(duration_s: f64) -> Duration {
    if !duration_s.is_finite() {
        return Duration::ZERO;
    }
    Duration::try_from_secs_f64(duration_s.max(0.0)).unwrap_or(Duration::ZERO)
}

// ────────────────────────────────────────────────────────────────────────────
// CommandBridge
// ────────────────────────────────────────────────────────────────────────────

struct BridgeState {
    command: VelocityCommand,
    snapshot: Option<StateSnapshot>,
    camera: Option<Arc<CameraFrame>>,
}

/// Thread-safe command/state store shared by producers and the tick loop.
///
/// Share it with `Arc<CommandBridge>`; all methods take `&self`.
pub struct CommandBridge {
    inner: Mutex<BridgeState>,
}

impl Default for CommandBridge {
    fn default() -> Self {
        Self::new()
    }
}

impl CommandBridge {
    /// Create a bridge holding an already-expired zero command and no state.
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(BridgeState {
                command: VelocityCommand::issued_at(Twist::ZERO, 0.0, Instant::now()),
                snapshot: None,
                camera: None,
            }),
        }
    }

    // The guarded values are always written whole, so a panic in another
    // holder cannot leave them half-updated.
    fn lock(&self) -> MutexGuard<'_, BridgeState> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Replace the current command with `twist` for `duration_s` seconds.
    ///
    /// Returns the effective window after clamping.
    pub fn set_command(&self, twist: Twist, duration_s: f64) -> Duration {
        let now = Instant::now();
        let command = VelocityCommand::issued_at(twist, duration_s, now);
        self.lock().command = command;
        trace!(?twist, duration_s, "command replaced");
        command.expires_at.duration_since(now)
    }

    /// The vector the robot should track right now.
    pub fn get_command(&self) -> Twist {
        self.get_command_at(Instant::now())
    }

    /// [`get_command`][Self::get_command] evaluated at an explicit instant.
    pub fn get_command_at(&self, now: Instant) -> Twist {
        self.lock().command.effective_at(now)
    }

    /// A copy of the stored command, including its deadline.
    pub fn current_command(&self) -> VelocityCommand {
        self.lock().command
    }

    /// Replace the last published snapshot.
    pub fn publish_state(&self, snapshot: StateSnapshot) {
        self.lock().snapshot = Some(snapshot);
    }

    /// A copy of the last published snapshot, or `None` before the first
    /// publish.
    pub fn read_state(&self) -> Option<StateSnapshot> {
        self.lock().snapshot.clone()
    }

    /// Replace the latest camera frame.
    pub fn set_camera_frame(&self, frame: CameraFrame) {
        self.lock().camera = Some(Arc::new(frame));
    }

    /// The latest camera frame.  Frames are immutable once stored, so the
    /// returned handle is as good as a copy.
    pub fn camera_frame(&self) -> Option<Arc<CameraFrame>> {
        self.lock().camera.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;
    use strider_types::SensorSummary;

    fn snapshot(vx: f64) -> StateSnapshot {
        StateSnapshot {
            timestamp: chrono::Utc::now(),
            pose: None,
            active_command: Twist::new(vx, 0.0, 0.0),
            sensor_summary: SensorSummary::empty((4, 4)),
        }
    }

    #[test]
    fn negative_duration_clamps_to_zero() {
        let now = Instant::now();
        for d in [-0.001, -1.0, -1e9, f64::NEG_INFINITY] {
            let cmd = VelocityCommand::issued_at(Twist::new(1.0, 0.0, 0.0), d, now);
            assert_eq!(cmd.expires_at, now);
            assert_eq!(
                cmd.effective_at(now + Duration::from_nanos(1)),
                Twist::ZERO,
                "duration {d} must already be expired"
            );
        }
    }

    #[test]
    fn non_finite_duration_clamps_to_zero() {
        assert_eq!(clamp_window(f64::NAN), Duration::ZERO);
        assert_eq!(clamp_window(f64::INFINITY), Duration::ZERO);
        assert_eq!(clamp_window(1.5), Duration::from_millis(1500));
    }

    #[test]
    fn command_active_until_deadline_then_zero() {
        let now = Instant::now();
        let twist = Twist::new(0.3, -0.2, 0.8);
        let cmd = VelocityCommand::issued_at(twist, 2.0, now);
        assert_eq!(cmd.effective_at(now), twist);
        assert_eq!(cmd.effective_at(now + Duration::from_secs(2)), twist);
        assert_eq!(
            cmd.effective_at(now + Duration::from_secs(2) + Duration::from_nanos(1)),
            Twist::ZERO
        );
    }

    #[test]
    fn bridge_reports_zero_after_expiry() {
        let bridge = CommandBridge::new();
        bridge.set_command(Twist::new(1.0, 0.0, 0.0), 0.02);
        assert_eq!(bridge.get_command(), Twist::new(1.0, 0.0, 0.0));
        thread::sleep(Duration::from_millis(40));
        assert_eq!(bridge.get_command(), Twist::ZERO);
    }

    #[test]
    fn get_command_at_uses_stored_deadline() {
        let bridge = CommandBridge::new();
        bridge.set_command(Twist::new(0.0, 0.0, 0.8), 1.0);
        let deadline = bridge.current_command().expires_at;
        assert_eq!(bridge.get_command_at(deadline), Twist::new(0.0, 0.0, 0.8));
        assert_eq!(
            bridge.get_command_at(deadline + Duration::from_millis(1)),
            Twist::ZERO
        );
    }

    #[test]
    fn fresh_bridge_is_idle() {
        let bridge = CommandBridge::new();
        thread::sleep(Duration::from_millis(1));
        assert_eq!(bridge.get_command(), Twist::ZERO);
        assert!(bridge.read_state().is_none());
        assert!(bridge.camera_frame().is_none());
    }

    #[test]
    fn last_write_wins() {
        let bridge = CommandBridge::new();
        bridge.set_command(Twist::new(1.0, 0.0, 0.0), 5.0);
        bridge.set_command(Twist::new(0.0, -1.0, 0.0), 5.0);
        assert_eq!(bridge.get_command(), Twist::new(0.0, -1.0, 0.0));
    }

    #[test]
    fn set_command_returns_clamped_window() {
        let bridge = CommandBridge::new();
        assert_eq!(bridge.set_command(Twist::ZERO, -2.0), Duration::ZERO);
        assert_eq!(
            bridge.set_command(Twist::ZERO, 0.25),
            Duration::from_millis(250)
        );
    }

    #[test]
    fn read_state_returns_independent_copy() {
        let bridge = CommandBridge::new();
        bridge.publish_state(snapshot(1.0));
        let mut copy = bridge.read_state().unwrap();
        copy.active_command.vx = 42.0;
        assert_eq!(bridge.read_state().unwrap().active_command.vx, 1.0);
    }

    #[test]
    fn camera_frame_is_latest_wins() {
        let bridge = CommandBridge::new();
        bridge.set_camera_frame(CameraFrame {
            width: 1,
            height: 1,
            data: vec![1, 1, 1, 255],
        });
        bridge.set_camera_frame(CameraFrame {
            width: 1,
            height: 1,
            data: vec![2, 2, 2, 255],
        });
        assert_eq!(bridge.camera_frame().unwrap().data, vec![2, 2, 2, 255]);
    }

    #[test]
    fn concurrent_writers_never_produce_torn_commands() {
        let bridge = Arc::new(CommandBridge::new());
        let writers: Vec<_> = (1..=8)
            .map(|id| {
                let bridge = Arc::clone(&bridge);
                thread::spawn(move || {
                    let v = id as f64;
                    for _ in 0..2_000 {
                        bridge.set_command(Twist::new(v, -v, 2.0 * v), 10.0);
                    }
                })
            })
            .collect();

        let reader = {
            let bridge = Arc::clone(&bridge);
            thread::spawn(move || {
                for _ in 0..5_000 {
                    let t = bridge.get_command();
                    if t.is_zero() {
                        continue;
                    }
                    assert_eq!(t.vy, -t.vx, "torn command observed: {t:?}");
                    assert_eq!(t.yaw_rate, 2.0 * t.vx, "torn command observed: {t:?}");
                }
            })
        };

        for w in writers {
            w.join().unwrap();
        }
        reader.join().unwrap();

        // After every writer is done, a final write is the only visible one.
        bridge.set_command(Twist::new(9.0, -9.0, 18.0), 10.0);
        assert_eq!(bridge.get_command(), Twist::new(9.0, -9.0, 18.0));
    }

    #[test]
    fn concurrent_publishers_never_produce_torn_snapshots() {
        let bridge = Arc::new(CommandBridge::new());
        let publisher = {
            let bridge = Arc::clone(&bridge);
            thread::spawn(move || {
                for i in 0..2_000 {
                    let v = i as f64;
                    let mut s = snapshot(v);
                    s.active_command.vy = v;
                    bridge.publish_state(s);
                }
            })
        };
        for _ in 0..2_000 {
            if let Some(s) = bridge.read_state() {
                assert_eq!(s.active_command.vx, s.active_command.vy);
            }
        }
        publisher.join().unwrap();
    }
}
