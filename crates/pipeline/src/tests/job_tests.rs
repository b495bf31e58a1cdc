use crate::JobState::*;

// -------------------- JobState --------------------

#[test]
fn legal_transitions() {
    assert!(Configured.can_transition_to(Submitted));
    assert!(Submitted.can_transition_to(Running));
    assert!(Running.can_transition_to(Succeeded));
    assert!(Running.can_transition_to(Failed));
}

#[test]
fn illegal_transitions() {
    assert!(!Configured.can_transition_to(Running));
    assert!(!Submitted.can_transition_to(Succeeded));
    assert!(!Succeeded.can_transition_to(Submitted));
    assert!(!Failed.can_transition_to(Running));
    assert!(!Running.can_transition_to(Running));
}

#[test]
fn terminal_states() {
    assert!(Succeeded.is_terminal());
    assert!(Failed.is_terminal());
    assert!(!Running.is_terminal());
}

#[test]
fn display_is_upper_case() {
    assert_eq!(Configured.to_string(), "CONFIGURED");
    assert_eq!(Succeeded.to_string(), "SUCCEEDED");
}
