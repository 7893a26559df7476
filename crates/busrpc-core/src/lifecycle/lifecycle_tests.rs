#![allow(non_snake_case)]

use super::*;

#[test]
fn DeliveryState___default___is_received() {
    assert_eq!(DeliveryState::default(), DeliveryState::Received);
}

#[test]
fn DeliveryState___happy_path___walks_to_acknowledged() {
    let path = [
        DeliveryState::Received,
        DeliveryState::Decoded,
        DeliveryState::Translated,
        DeliveryState::Dispatched,
        DeliveryState::Published,
        DeliveryState::Acknowledged,
    ];

    for pair in path.windows(2) {
        assert!(
            pair[0].can_transition_to(pair[1]),
            "{:?} should be able to transition to {:?}",
            pair[0],
            pair[1]
        );
    }
    assert!(DeliveryState::Acknowledged.is_completed());
}

#[test]
fn DeliveryState___untranslatable_request___error_response_path_reaches_acknowledged() {
    let path = [
        DeliveryState::Received,
        DeliveryState::Decoded,
        DeliveryState::Dispatched,
        DeliveryState::Published,
        DeliveryState::Acknowledged,
    ];

    for pair in path.windows(2) {
        assert!(pair[0].can_transition_to(pair[1]), "{} -> {}", pair[0], pair[1]);
    }
    assert!(!DeliveryState::Decoded.can_transition_to(DeliveryState::Published));
}

#[test]
fn DeliveryState___received_to_rejected___malformed_path_allowed() {
    let state = DeliveryState::Received;

    let can_transition = state.can_transition_to(DeliveryState::Rejected);

    assert!(can_transition);
}

#[test]
fn DeliveryState___dispatched_to_acknowledged___skipping_publish_not_allowed() {
    let state = DeliveryState::Dispatched;

    let can_transition = state.can_transition_to(DeliveryState::Acknowledged);

    assert!(!can_transition);
}

#[test]
fn DeliveryState___terminal_states___cannot_transition() {
    let terminals = [
        DeliveryState::Acknowledged,
        DeliveryState::Rejected,
        DeliveryState::Requeued,
    ];
    let all = [
        DeliveryState::Received,
        DeliveryState::Decoded,
        DeliveryState::Translated,
        DeliveryState::Dispatched,
        DeliveryState::Published,
        DeliveryState::Acknowledged,
        DeliveryState::Rejected,
        DeliveryState::Requeued,
    ];

    for from in terminals {
        assert!(from.is_terminal());
        for to in all {
            assert!(!from.can_transition_to(to), "{from} -> {to} should be refused");
        }
    }
}

#[test]
fn DeliveryState___requeued___is_terminal_but_not_completed() {
    let state = DeliveryState::Requeued;

    assert!(state.is_terminal());
    assert!(!state.is_completed());
}

#[test]
fn DeliveryState___serialize___uses_snake_case() {
    let json = serde_json::to_string(&DeliveryState::Acknowledged).unwrap();

    assert_eq!(json, r#""acknowledged""#);
}

#[test]
fn DeliveryState___description___non_empty_for_all() {
    for state in [DeliveryState::Received, DeliveryState::Requeued] {
        assert!(!state.description().is_empty());
    }
}
