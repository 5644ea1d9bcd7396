//! Unit lifecycle status.

/// Lifecycle of every AST unit. Transitions are monotonic except that
/// `NeverEmit` is terminal and can be entered from any state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum Status {
    Unbroadcasted,
    Broadcasted,
    Processed,
    NeverEmit,
}

impl Status {
    /// `true` once the unit has left `Unbroadcasted`, i.e. after its first
    /// `broadcast()`, u.status != UNBROADCASTED").
    pub fn has_broadcast(&self) -> bool {
        !matches!(self, Status::Unbroadcasted)
    }

    /// Validates a requested transition against the monotonic lifecycle.
    /// `NeverEmit` is reachable from any state and, once entered, rejects
    /// every further transition.
    pub fn can_transition_to(&self, next: Status) -> bool {
        use Status::*;
        if *self == NeverEmit {
            return false;
        }
        if next == NeverEmit {
            return true;
        }
        matches!(
            (self, next),
            (Unbroadcasted, Broadcasted) | (Broadcasted, Processed) | (Unbroadcasted, Unbroadcasted) | (Broadcasted, Broadcasted) | (Processed, Processed)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn never_emit_is_terminal() {
        assert!(Status::Unbroadcasted.can_transition_to(Status::NeverEmit));
        assert!(!Status::NeverEmit.can_transition_to(Status::Broadcasted));
    }

    #[test]
    fn forward_transitions_allowed() {
        assert!(Status::Unbroadcasted.can_transition_to(Status::Broadcasted));
        assert!(Status::Broadcasted.can_transition_to(Status::Processed));
        assert!(!Status::Processed.can_transition_to(Status::Unbroadcasted));
    }
}
