//! Application lifecycle state machine
//!
//! ```text
//!            Ready                     AllWindowsClosed (quit policy)
//! Starting ─────────▶ Running ───────────────────────────────▶ Closing
//!     │                  │  ▲  Activate with no windows -> CreateWindow
//!     │                  └──┘  WindowOpened / WindowClosed
//!     └───────────── QuitRequested (any state) ─────────────────▶ Closing
//! ```
//!
//! The machine is pure: it only returns the actions the host must perform.

use serde::Serialize;
use std::fmt;

use crate::models::errors::{AppError, AppResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LifecycleState {
    Starting,
    Running,
    Closing,
}

impl LifecycleState {
    pub fn as_str(&self) -> &'static str {
        match self {
            LifecycleState::Starting => "starting",
            LifecycleState::Running => "running",
            LifecycleState::Closing => "closing",
        }
    }
}

impl fmt::Display for LifecycleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Triggers delivered by the host
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleEvent {
    /// Host finished initialising and can create windows
    Ready,
    WindowOpened,
    WindowClosed { remaining: usize },
    AllWindowsClosed,
    /// Dock icon clicked / app re-activated
    Activate { open_windows: usize },
    QuitRequested,
}

/// Work the host must perform for a transition
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleAction {
    RegisterScheme,
    CreateWindow,
    Quit,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transition {
    pub from: LifecycleState,
    pub to: LifecycleState,
    pub actions: Vec<LifecycleAction>,
}

#[derive(Debug, Clone)]
pub struct Lifecycle {
    state: LifecycleState,
    quit_on_last_window: bool,
}

impl Lifecycle {
    pub fn new(quit_on_last_window: bool) -> Self {
        Self {
            state: LifecycleState::Starting,
            quit_on_last_window,
        }
    }

    pub fn state(&self) -> LifecycleState {
        self.state
    }

    /// Apply a trigger. Rejected triggers leave the state unchanged.
    pub fn apply(&mut self, event: LifecycleEvent) -> AppResult<Transition> {
        use LifecycleAction::*;
        use LifecycleEvent::*;
        use LifecycleState::*;

        let from = self.state;
        let (to, actions) = match (from, event) {
            (Starting, Ready) => (Running, vec![RegisterScheme, CreateWindow]),

            (Running, WindowOpened) => (Running, vec![]),
            (Running, WindowClosed { remaining }) if remaining > 0 => (Running, vec![]),
            (Running, WindowClosed { .. }) | (Running, AllWindowsClosed) => {
                if self.quit_on_last_window {
                    (Closing, vec![Quit])
                } else {
                    (Running, vec![])
                }
            }
            (Running, Activate { open_windows: 0 }) => (Running, vec![CreateWindow]),
            (Running, Activate { .. }) => (Running, vec![]),

            (Starting, QuitRequested) | (Running, QuitRequested) => (Closing, vec![Quit]),

            // Windows torn down during shutdown are expected; Quit fires once.
            (Closing, QuitRequested)
            | (Closing, WindowClosed { .. })
            | (Closing, AllWindowsClosed) => (Closing, vec![]),

            (state, event) => {
                return Err(AppError::invalid_transition(format!(
                    "{:?} is not accepted while {}",
                    event, state
                )));
            }
        };

        self.state = to;
        Ok(Transition { from, to, actions })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::errors::ErrorCode;

    fn running(quit_on_last_window: bool) -> Lifecycle {
        let mut lifecycle = Lifecycle::new(quit_on_last_window);
        lifecycle.apply(LifecycleEvent::Ready).unwrap();
        lifecycle
    }

    #[test]
    fn test_ready_registers_scheme_then_creates_window() {
        let mut lifecycle = Lifecycle::new(true);
        let t = lifecycle.apply(LifecycleEvent::Ready).unwrap();
        assert_eq!(t.from, LifecycleState::Starting);
        assert_eq!(t.to, LifecycleState::Running);
        assert_eq!(
            t.actions,
            vec![LifecycleAction::RegisterScheme, LifecycleAction::CreateWindow]
        );
    }

    #[test]
    fn test_second_ready_rejected() {
        let mut lifecycle = running(true);
        let err = lifecycle.apply(LifecycleEvent::Ready).unwrap_err();
        assert_eq!(err.code, ErrorCode::LifecycleInvalidTransition);
        assert_eq!(lifecycle.state(), LifecycleState::Running);
    }

    #[test]
    fn test_last_window_closed_quits() {
        let mut lifecycle = running(true);
        let t = lifecycle
            .apply(LifecycleEvent::WindowClosed { remaining: 0 })
            .unwrap();
        assert_eq!(t.to, LifecycleState::Closing);
        assert_eq!(t.actions, vec![LifecycleAction::Quit]);
    }

    #[test]
    fn test_last_window_closed_keeps_running_without_quit_policy() {
        let mut lifecycle = running(false);
        let t = lifecycle.apply(LifecycleEvent::AllWindowsClosed).unwrap();
        assert_eq!(t.to, LifecycleState::Running);
        assert!(t.actions.is_empty());

        let t = lifecycle
            .apply(LifecycleEvent::Activate { open_windows: 0 })
            .unwrap();
        assert_eq!(t.actions, vec![LifecycleAction::CreateWindow]);
    }

    #[test]
    fn test_activate_with_open_window_is_noop() {
        let mut lifecycle = running(false);
        let t = lifecycle
            .apply(LifecycleEvent::Activate { open_windows: 1 })
            .unwrap();
        assert!(t.actions.is_empty());
    }

    #[test]
    fn test_quit_fires_once() {
        let mut lifecycle = running(true);
        let first = lifecycle.apply(LifecycleEvent::QuitRequested).unwrap();
        assert_eq!(first.actions, vec![LifecycleAction::Quit]);
        let second = lifecycle.apply(LifecycleEvent::QuitRequested).unwrap();
        assert!(second.actions.is_empty());
        assert_eq!(lifecycle.state(), LifecycleState::Closing);
    }

    #[test]
    fn test_window_events_before_ready_rejected() {
        let mut lifecycle = Lifecycle::new(true);
        assert!(lifecycle.apply(LifecycleEvent::WindowOpened).is_err());
        assert!(lifecycle
            .apply(LifecycleEvent::Activate { open_windows: 0 })
            .is_err());
        assert_eq!(lifecycle.state(), LifecycleState::Starting);
    }

    #[test]
    fn test_closing_rejects_activate() {
        let mut lifecycle = running(true);
        lifecycle.apply(LifecycleEvent::QuitRequested).unwrap();
        assert!(lifecycle
            .apply(LifecycleEvent::Activate { open_windows: 0 })
            .is_err());
    }
}
