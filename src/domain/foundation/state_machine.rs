//! State machine trait for lifecycle status enums.

use super::ValidationError;

/// Trait for status enums whose values move through a constrained transition set.
///
/// Implementors list the legal targets for each state and get a validated
/// `transition_to` for free.
pub trait StateMachine: Sized + Copy + PartialEq + std::fmt::Debug {
    /// Returns all valid target states from the current state.
    fn valid_transitions(&self) -> Vec<Self>;

    /// Returns true if transition from self to target is valid.
    fn can_transition_to(&self, target: &Self) -> bool {
        self.valid_transitions().contains(target)
    }

    /// Performs transition with validation, returning error if invalid.
    fn transition_to(&self, target: Self) -> Result<Self, ValidationError> {
        if self.can_transition_to(&target) {
            Ok(target)
        } else {
            Err(ValidationError::invalid_format(
                "status",
                format!("Cannot transition from {:?} to {:?}", self, target),
            ))
        }
    }

    /// Checks if current state is terminal (no valid outgoing transitions).
    fn is_terminal(&self) -> bool {
        self.valid_transitions().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    enum Lamp {
        Off,
        On,
        Broken,
    }

    impl StateMachine for Lamp {
        fn valid_transitions(&self) -> Vec<Self> {
            match self {
                Lamp::Off => vec![Lamp::On, Lamp::Broken],
                Lamp::On => vec![Lamp::Off, Lamp::Broken],
                Lamp::Broken => vec![],
            }
        }
    }

    #[test]
    fn transition_to_succeeds_for_listed_target() {
        assert_eq!(Lamp::Off.transition_to(Lamp::On), Ok(Lamp::On));
    }

    #[test]
    fn transition_to_fails_for_unlisted_target() {
        let err = Lamp::Broken.transition_to(Lamp::On).unwrap_err();
        assert!(err.to_string().contains("Cannot transition from Broken to On"));
    }

    #[test]
    fn terminal_state_has_no_targets() {
        assert!(Lamp::Broken.is_terminal());
        assert!(!Lamp::On.is_terminal());
    }
}
