//! Per-collection fetch state.

use serde::Serialize;

/// Lifecycle of one asynchronous collection fetch.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(tag = "state", content = "value", rename_all = "snake_case")]
pub enum LoadState<T> {
    #[default]
    Idle,
    Loading,
    Ready(T),
    Failed(String),
}

impl<T> LoadState<T> {
    pub fn value(&self) -> Option<&T> {
        match self {
            LoadState::Ready(v) => Some(v),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            LoadState::Failed(msg) => Some(msg.as_str()),
            _ => None,
        }
    }

    pub fn readiness(&self) -> Readiness {
        match self {
            LoadState::Idle | LoadState::Loading => Readiness::Loading,
            LoadState::Ready(_) => Readiness::Ready,
            LoadState::Failed(_) => Readiness::Failed,
        }
    }

    /// Turn a fetch outcome into a state.
    pub fn from_result<E: std::fmt::Display>(result: Result<T, E>) -> Self {
        match result {
            Ok(v) => LoadState::Ready(v),
            Err(e) => LoadState::Failed(e.to_string()),
        }
    }
}

/// Combined state of several fetches feeding one screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Readiness {
    Loading,
    Failed,
    Ready,
}

impl Readiness {
    /// Loading while anything is still loading, failed if anything failed,
    /// otherwise ready. No inputs means ready.
    pub fn combine(states: impl IntoIterator<Item = Readiness>) -> Readiness {
        let mut failed = false;
        for state in states {
            match state {
                Readiness::Loading => return Readiness::Loading,
                Readiness::Failed => failed = true,
                Readiness::Ready => {}
            }
        }
        if failed {
            Readiness::Failed
        } else {
            Readiness::Ready
        }
    }
}
