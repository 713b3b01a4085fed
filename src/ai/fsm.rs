//! Finite State Machine for AI Behavior
//!
//! States are plain tags (`Copy` enums) and the agent itself implements the
//! Enter / Execute / Exit hooks through [`Stateful`]. No state objects are
//! allocated per transition.
//!
//! # Design Principles
//!
//! - **Single entry point**: every transition goes through
//!   [`Stateful::change_state`], which runs `Exit(old)` to completion before
//!   `Enter(new)` begins
//! - **State-owned timers**: a state may schedule at most one
//!   [`DelayedTask`]; leaving the state cancels it, and a task that somehow
//!   outlives its activation is dropped instead of fired
//! - **No nesting**: a change requested while a transition is running is
//!   deferred until that transition completes
//!
//! # Example
//!
//! ```ignore
//! #[derive(Debug, Clone, Copy, PartialEq, Eq)]
//! enum Guard { Idle, Alert }
//!
//! impl StateTag for Guard {
//!     fn name(self) -> &'static str { ... }
//! }
//!
//! impl<C: ?Sized> Stateful<C> for Sentry {
//!     type State = Guard;
//!     type Task = ();
//!     // machine(), on_enter(), on_execute(), on_exit(), on_task()
//! }
//!
//! sentry.start(&mut ctx);
//! sentry.run_state(dt, &mut ctx);
//! ```

use std::fmt;

// ============================================================================
// State Tag
// ============================================================================

/// A named state of an agent.
pub trait StateTag: Copy + Eq + fmt::Debug {
    /// State name for events and logging.
    fn name(self) -> &'static str;

    /// Terminal states refuse every outgoing transition.
    fn is_terminal(self) -> bool {
        false
    }
}

// ============================================================================
// Transition
// ============================================================================

/// Per-tick transition decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition<S> {
    /// Stay in the current state.
    None,
    /// Change to another state.
    To(S),
}

// ============================================================================
// Delayed Task
// ============================================================================

/// A "wait N seconds, then act" task owned by one state activation.
#[derive(Debug, Clone)]
pub struct DelayedTask<S, A> {
    owner: S,
    epoch: u64,
    remaining: f32,
    action: A,
}

impl<S: Copy, A> DelayedTask<S, A> {
    /// State that scheduled the task
    #[must_use]
    #[inline]
    pub fn owner(&self) -> S {
        self.owner
    }

    /// Seconds until the task fires
    #[must_use]
    #[inline]
    pub fn remaining(&self) -> f32 {
        self.remaining
    }

    /// Scheduled action
    #[must_use]
    #[inline]
    pub fn action(&self) -> &A {
        &self.action
    }
}

// ============================================================================
// State Machine
// ============================================================================

/// Bookkeeping for one agent's FSM.
///
/// The machine only records which state is active; behaviour lives in the
/// [`Stateful`] implementation of the agent that embeds it.
#[derive(Debug, Clone)]
pub struct StateMachine<S, A = ()> {
    current: S,
    /// Incremented on every Enter
    epoch: u64,
    time_in_state: f32,
    task: Option<DelayedTask<S, A>>,
    started: bool,
    transitioning: bool,
    deferred: Option<S>,
}

impl<S: StateTag, A> StateMachine<S, A> {
    /// Create a machine; `initial` is entered by [`Stateful::start`].
    #[must_use]
    pub fn new(initial: S) -> Self {
        Self {
            current: initial,
            epoch: 0,
            time_in_state: 0.0,
            task: None,
            started: false,
            transitioning: false,
            deferred: None,
        }
    }

    /// Active state
    #[must_use]
    #[inline]
    pub fn current(&self) -> S {
        self.current
    }

    /// Check if the active state is `state`.
    #[must_use]
    #[inline]
    pub fn is_in(&self, state: S) -> bool {
        self.current == state
    }

    /// Activation counter; differs for every Enter.
    #[must_use]
    #[inline]
    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    /// Seconds spent in the active state
    #[must_use]
    #[inline]
    pub fn time_in_state(&self) -> f32 {
        self.time_in_state
    }

    /// True once the initial state has been entered.
    #[must_use]
    #[inline]
    pub fn is_started(&self) -> bool {
        self.started
    }

    /// True while Exit/Enter hooks are running.
    #[must_use]
    #[inline]
    pub fn is_transitioning(&self) -> bool {
        self.transitioning
    }

    /// Pending task, if any
    #[must_use]
    pub fn task(&self) -> Option<&DelayedTask<S, A>> {
        self.task.as_ref()
    }

    /// Check if a task is waiting to fire.
    #[must_use]
    pub fn has_pending_task(&self) -> bool {
        self.task.is_some()
    }

    /// Schedule `action` after `delay` seconds on behalf of the active state.
    ///
    /// Replaces any task the state already had.
    pub fn schedule(&mut self, delay: f32, action: A) {
        self.task = Some(DelayedTask {
            owner: self.current,
            epoch: self.epoch,
            remaining: delay.max(0.0),
            action,
        });
    }

    /// Drop the pending task without firing it.
    pub fn cancel_task(&mut self) -> bool {
        self.task.take().is_some()
    }

    /// Advance time by `dt` and return the task action if it is due.
    ///
    /// A due task whose owner or activation no longer matches is discarded.
    pub fn advance(&mut self, dt: f32) -> Option<A> {
        self.time_in_state += dt;

        let due = match self.task.as_mut() {
            Some(task) => {
                task.remaining -= dt;
                task.remaining <= 0.0
            }
            None => false,
        };
        if !due {
            return None;
        }

        let task = self.task.take()?;
        if task.owner == self.current && task.epoch == self.epoch {
            Some(task.action)
        } else {
            log::trace!(
                "dropping stale task of {} (now in {})",
                task.owner.name(),
                self.current.name()
            );
            None
        }
    }

    fn begin(&mut self) {
        self.started = true;
        self.epoch += 1;
        self.time_in_state = 0.0;
    }

    fn commit(&mut self, next: S) {
        self.task = None;
        self.current = next;
        self.begin();
    }

    /// Point a machine at `state` without running hooks.
    ///
    /// Used when a pooled agent is revived in place.
    pub fn reset(&mut self, state: S) {
        self.current = state;
        self.task = None;
        self.started = false;
        self.transitioning = false;
        self.deferred = None;
        self.time_in_state = 0.0;
    }
}

// ============================================================================
// Stateful
// ============================================================================

/// Enter / Execute / Exit hooks of an agent driven by a [`StateMachine`].
///
/// `C` is whatever context the agent needs while running hooks.
pub trait Stateful<C: ?Sized> {
    /// State tag type
    type State: StateTag;
    /// Delayed task payload
    type Task;

    /// The embedded machine
    fn machine(&self) -> &StateMachine<Self::State, Self::Task>;

    /// The embedded machine (mutable)
    fn machine_mut(&mut self) -> &mut StateMachine<Self::State, Self::Task>;

    /// Called once per activation, after the previous state exited.
    fn on_enter(&mut self, state: Self::State, ctx: &mut C);

    /// Called once per tick while `state` is active.
    fn on_execute(&mut self, state: Self::State, dt: f32, ctx: &mut C)
    -> Transition<Self::State>;

    /// Called once per deactivation, before the next state enters.
    fn on_exit(&mut self, state: Self::State, ctx: &mut C);

    /// Called when a task scheduled by the active state comes due.
    fn on_task(&mut self, task: Self::Task, ctx: &mut C) -> Transition<Self::State>;

    /// Enter the initial state if that has not happened yet.
    fn start(&mut self, ctx: &mut C) {
        if self.machine().is_started() {
            return;
        }
        let initial = self.machine().current();
        let machine = self.machine_mut();
        machine.transitioning = true;
        machine.begin();
        self.on_enter(initial, ctx);
        self.machine_mut().transitioning = false;
        self.apply_deferred(ctx);
    }

    /// Change state through the single serialisation point.
    ///
    /// Returns `false` for `old == new`, for terminal states, and for
    /// requests made mid-transition (those are applied right after it).
    fn change_state(&mut self, next: Self::State, ctx: &mut C) -> bool {
        // Exit must never run for a state that was not entered
        self.start(ctx);

        let machine = self.machine_mut();
        if machine.transitioning {
            debug_assert!(
                machine.deferred.is_none(),
                "two state changes requested during one transition"
            );
            machine.deferred = Some(next);
            return false;
        }

        let current = machine.current;
        if current == next {
            return false;
        }
        if current.is_terminal() {
            log::trace!("{} is terminal, ignoring {}", current.name(), next.name());
            return false;
        }

        log::debug!("{} -> {}", current.name(), next.name());
        machine.transitioning = true;
        self.on_exit(current, ctx);

        self.machine_mut().commit(next);
        self.on_enter(next, ctx);
        self.machine_mut().transitioning = false;

        self.apply_deferred(ctx);
        true
    }

    /// Apply a change that was requested during the last transition.
    fn apply_deferred(&mut self, ctx: &mut C) {
        if let Some(deferred) = self.machine_mut().deferred.take() {
            self.change_state(deferred, ctx);
        }
    }

    /// Run one tick: fire a due task, then execute the active state.
    fn run_state(&mut self, dt: f32, ctx: &mut C) {
        self.start(ctx);

        if let Some(task) = self.machine_mut().advance(dt) {
            if let Transition::To(next) = self.on_task(task, ctx) {
                self.change_state(next, ctx);
            }
        }

        let state = self.machine().current();
        if let Transition::To(next) = self.on_execute(state, dt, ctx) {
            self.change_state(next, ctx);
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
