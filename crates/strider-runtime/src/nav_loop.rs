//! [`NavLoop`] – the vision-driven navigation agent.
//!
//! Each step:
//!
//! 1. **Observe** – fetch the latest camera frame.  No frame means back off
//!    and retry without consuming a step.
//! 2. **Locate** – read the state snapshot and log the pose.  Best-effort:
//!    failures are logged and the step continues.
//! 3. **Classify** – send the frame and [`NAVIGATION_PROMPT`] to the
//!    [`Classifier`] under a deadline.  A failure or empty reply backs off
//!    and retries without consuming a step.
//! 4. **Decide** – count the step and map the reply to a [`Decision`].
//! 5. **Act** – issue the planned primitive, or on `BLOCKED` escalate:
//!    two left turns, two right turns, then stop and end the run.
//!
//! The loop ends after `max_steps` counted steps or on the terminal stop.
//! There is no cancellation path; the caller stops the robot on interrupt.

use std::time::Duration;

use strider_bridge::{Direction, RobotControl};
use strider_types::{AppliedCommand, StriderError};
use tokio::time::{sleep, timeout};
use tracing::{Instrument, debug, info, info_span, warn};
use uuid::Uuid;

use crate::decision::{Decision, Escalation, MotionPlan, escalate, parse_decision};
use crate::vision_driver::{Classifier, NAVIGATION_PROMPT, VisionError};

// ─────────────────────────────────────────────────────────────────────────────
// Configuration
// ─────────────────────────────────────────────────────────────────────────────

/// Configuration bundle for [`NavLoop`].
#[derive(Debug, Clone)]
pub struct NavConfig {
    /// Counted steps before the loop ends.
    pub max_steps: u32,
    /// Pause after every counted step.
    pub step_interval: Duration,
    /// Pause before retrying a failed observe or classify.
    pub retry_backoff: Duration,
    /// Pause after the terminal stop so the robot settles.
    pub stop_settle: Duration,
    /// Deadline for one classification.
    pub classification_timeout: Duration,
    /// Turn rate handed to every primitive (rad/s).
    pub yaw_rate: f64,
    /// Instruction sent with each frame.
    pub instruction: String,
}

impl Default for NavConfig {
    fn default() -> Self {
        Self {
            max_steps: 100,
            step_interval: Duration::from_secs(1),
            retry_backoff: Duration::from_secs(1),
            stop_settle: Duration::from_secs(2),
            classification_timeout: Duration::from_secs(60),
            yaw_rate: 0.8,
            instruction: NAVIGATION_PROMPT.to_string(),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Progress and outcomes
// ─────────────────────────────────────────────────────────────────────────────

/// Counters carried across steps.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct NavProgress {
    pub step_count: u32,
    /// Estimated metres travelled: `duration × speed` of every forward step.
    pub distance_moved: f64,
    pub consecutive_blocked: u32,
}

/// Where the loop is in its decision state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavState {
    Running,
    /// Escalating after this many consecutive `BLOCKED` decisions.
    BlockedEscalating(u32),
    /// Gave up; the robot has been stopped.
    Stopped,
}

/// Result of one [`NavLoop::step`].
#[derive(Debug, Clone, PartialEq)]
pub enum StepOutcome {
    /// Observe or classify failed; no step was consumed.
    Retry(StriderError),
    /// A decision was made and its primitive issued.  A rejected command is
    /// reported in `result` but still counts as a step.
    Commanded {
        decision: Decision,
        plan: MotionPlan,
        result: Result<AppliedCommand, StriderError>,
    },
    /// The escalation ceiling was reached and the robot stopped.
    Stopped,
}

/// Why [`NavLoop::run`] returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Termination {
    MaxSteps,
    Blocked,
}

/// Final report of a run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NavSummary {
    pub run_id: Uuid,
    pub progress: NavProgress,
    pub termination: Termination,
}

// ─────────────────────────────────────────────────────────────────────────────
// NavLoop
// ─────────────────────────────────────────────────────────────────────────────

/// Drives a robot from camera classifications.
pub struct NavLoop<R, C> {
    control: R,
    classifier: C,
    config: NavConfig,
    progress: NavProgress,
    state: NavState,
    run_id: Uuid,
}

impl<R: RobotControl, C: Classifier> NavLoop<R, C> {
    pub fn new(control: R, classifier: C, config: NavConfig) -> Self {
        Self {
            control,
            classifier,
            config,
            progress: NavProgress::default(),
            state: NavState::Running,
            run_id: Uuid::new_v4(),
        }
    }

    pub fn progress(&self) -> NavProgress {
        self.progress
    }

    pub fn state(&self) -> NavState {
        self.state
    }

    pub fn run_id(&self) -> Uuid {
        self.run_id
    }

    /// `true` once the step budget is spent or the loop has given up.
    pub fn is_finished(&self) -> bool {
        self.state == NavState::Stopped || self.progress.step_count >= self.config.max_steps
    }

    /// Run one observe–classify–act step.
    pub async fn step(&mut self) -> StepOutcome {
        if self.state == NavState::Stopped {
            return StepOutcome::Stopped;
        }

        // ── Observe ──────────────────────────────────────────────────────────
        let frame = match self.control.get_camera_image().await {
            Ok(frame) => frame,
            Err(e) => {
                warn!(error = %e, "no camera frame; retrying");
                sleep(self.config.retry_backoff).await;
                return StepOutcome::Retry(e);
            }
        };

        // ── Locate (best effort) ─────────────────────────────────────────────
        match self.control.get_state().await {
            Ok(Some(snapshot)) => match snapshot.pose {
                Some(pose) => info!(
                    x = pose.position[0],
                    y = pose.position[1],
                    z = pose.position[2],
                    yaw_deg = pose.orientation_yaw_rad.to_degrees(),
                    "pose"
                ),
                None => debug!("state snapshot carries no pose"),
            },
            Ok(None) => debug!("no state published yet"),
            Err(e) => warn!(error = %e, "state read failed"),
        }

        // ── Classify ─────────────────────────────────────────────────────────
        let deadline = self.config.classification_timeout;
        let reply = timeout(
            deadline,
            self.classifier.classify(&frame, &self.config.instruction),
        )
        .await
        .unwrap_or(Err(VisionError::Timeout(deadline)));
        let reply = match reply {
            Ok(text) if !text.trim().is_empty() => text,
            Ok(_) => return self.retry(VisionError::BadResponse("empty response".into())).await,
            Err(e) => return self.retry(e).await,
        };

        // ── Decide ───────────────────────────────────────────────────────────
        self.progress.step_count += 1;
        let decision = parse_decision(&reply);
        info!(
            step = self.progress.step_count,
            max_steps = self.config.max_steps,
            %decision,
            analysis = %reply,
            "classified"
        );

        let plan = match decision.plan() {
            Some(plan) => {
                self.progress.consecutive_blocked = 0;
                self.state = NavState::Running;
                plan
            }
            None => {
                self.progress.consecutive_blocked += 1;
                let n = self.progress.consecutive_blocked;
                self.state = NavState::BlockedEscalating(n);
                match escalate(n) {
                    Escalation::Turn(plan) => {
                        warn!(consecutive_blocked = n, direction = %plan.direction, "path blocked; turning");
                        plan
                    }
                    Escalation::GiveUp => return self.give_up().await,
                }
            }
        };

        // ── Act ──────────────────────────────────────────────────────────────
        let result = self
            .control
            .set_command(
                plan.direction.as_str(),
                plan.duration_s,
                plan.speed,
                self.config.yaw_rate,
            )
            .await;
        match &result {
            Ok(applied) => {
                if plan.direction == Direction::Forward {
                    self.progress.distance_moved += plan.duration_s * plan.speed;
                }
                debug!(
                    direction = %plan.direction,
                    duration_s = applied.duration_s,
                    distance_moved = self.progress.distance_moved,
                    "command applied"
                );
            }
            Err(e) => warn!(direction = %plan.direction, error = %e, "command rejected"),
        }

        sleep(self.config.step_interval).await;
        StepOutcome::Commanded {
            decision,
            plan,
            result,
        }
    }

    /// Step until finished.  The robot is stopped before returning.
    pub async fn run(mut self) -> NavSummary {
        let span = info_span!("nav_loop", run_id = %self.run_id);
        async move {
            info!(max_steps = self.config.max_steps, "navigation started");
            while !self.is_finished() {
                self.step().await;
            }

            let termination = if self.state == NavState::Stopped {
                Termination::Blocked
            } else {
                if let Err(e) = self.control.stop().await {
                    warn!(error = %e, "final stop failed");
                }
                Termination::MaxSteps
            };
            info!(
                steps = self.progress.step_count,
                distance_moved = self.progress.distance_moved,
                ?termination,
                "navigation finished"
            );
            NavSummary {
                run_id: self.run_id,
                progress: self.progress,
                termination,
            }
        }
        .instrument(span)
        .await
    }

    async fn retry(&self, e: VisionError) -> StepOutcome {
        warn!(error = %e, "classification failed; retrying");
        sleep(self.config.retry_backoff).await;
        StepOutcome::Retry(e.into())
    }

    async fn give_up(&mut self) -> StepOutcome {
        warn!(
            consecutive_blocked = self.progress.consecutive_blocked,
            "still blocked after escalation; stopping"
        );
        if let Err(e) = self.control.stop().await {
            warn!(error = %e, "stop failed");
        }
        self.state = NavState::Stopped;
        sleep(self.config.stop_settle).await;
        StepOutcome::Stopped
    }
}
