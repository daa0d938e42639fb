//! Optimistic favorite state.
//!
//! The page flips the heart immediately, issues the write, and reconciles
//! with [`FavoriteState::settle`] once the backend answers. While a write is
//! in flight further toggles are ignored.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FavoriteIntent {
    Add,
    Remove,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum FavoriteState {
    /// Not yet loaded.
    #[default]
    Idle,
    /// A write is in flight. `previous` is the state before the toggle.
    Pending {
        intent: FavoriteIntent,
        previous: bool,
    },
    Settled(bool),
}

impl FavoriteState {
    /// What the UI should show, optimistic while a write is pending.
    #[must_use]
    pub fn is_favorited(&self) -> bool {
        match self {
            FavoriteState::Idle => false,
            FavoriteState::Pending { intent, .. } => *intent == FavoriteIntent::Add,
            FavoriteState::Settled(value) => *value,
        }
    }

    #[must_use]
    pub fn is_pending(&self) -> bool {
        matches!(self, FavoriteState::Pending { .. })
    }

    /// Starts a toggle and returns the write to issue, or `None` if one is
    /// already pending.
    pub fn begin_toggle(&mut self) -> Option<FavoriteIntent> {
        if self.is_pending() {
            return None;
        }
        let previous = self.is_favorited();
        let intent = if previous {
            FavoriteIntent::Remove
        } else {
            FavoriteIntent::Add
        };
        *self = FavoriteState::Pending { intent, previous };
        Some(intent)
    }

    /// Records the authoritative value.
    pub fn settle(&mut self, value: bool) {
        *self = FavoriteState::Settled(value);
    }

    /// Abandons a pending write and restores the pre-toggle value.
    pub fn revert(&mut self) {
        if let FavoriteState::Pending { previous, .. } = *self {
            *self = FavoriteState::Settled(previous);
        }
    }
}
