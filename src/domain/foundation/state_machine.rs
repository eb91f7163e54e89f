//! State machine trait for lifecycle status enums.

use super::ValidationError;

/// A status enum with a fixed set of allowed transitions.
///
/// Implementors list their edges; checked transitions and terminal
/// detection come with the trait.
pub trait StateMachine: Sized + Copy + PartialEq + std::fmt::Debug {
    /// Returns true if moving from self to target is allowed.
    fn can_transition_to(&self, target: &Self) -> bool;

    /// All states reachable in one step from self.
    fn valid_transitions(&self) -> Vec<Self>;

    /// Checked transition.
    fn transition_to(&self, target: Self) -> Result<Self, ValidationError> {
        if self.can_transition_to(&target) {
            Ok(target)
        } else {
            Err(ValidationError::invalid_format(
                "state_transition",
                format!("Cannot transition from {:?} to {:?}", self, target),
            ))
        }
    }

    /// A state with no outgoing transitions.
    fn is_terminal(&self) -> bool {
        self.valid_transitions().is_empty()
    }
}
