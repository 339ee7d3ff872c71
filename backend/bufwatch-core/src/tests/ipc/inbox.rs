// Unit tests for the per-kind inbox
// Claim-once and overwrite semantics

use crate::ipc::inbox::Inbox;
use crate::ipc::message::{Message, MessageKind};

fn response(symbols: &[&str]) -> Message {
    Message::GetObservedSymbolsResponse {
        symbols: symbols.iter().map(|s| s.to_string()).collect(),
    }
}

/// **VALUE**: Verifies a stored message is handed out exactly once.
///
/// **WHY THIS MATTERS**: A reply claimed twice would answer two different requests.
///
/// **BUG THIS CATCHES**: Would catch `take` returning a clone instead of removing.
#[test]
fn given_stored_message_when_taken_twice_then_second_take_is_none() {
    // GIVEN: One stored response
    let mut inbox = Inbox::new();
    inbox.store(MessageKind::GetObservedSymbolsResponse, response(&["x"]));

    // WHEN: Taking it twice
    let first = inbox.take(MessageKind::GetObservedSymbolsResponse);
    let second = inbox.take(MessageKind::GetObservedSymbolsResponse);

    // THEN: First is the message, second is absent
    assert_eq!(first, Some(response(&["x"])));
    assert_eq!(second, None);
    assert!(inbox.is_empty());
}

/// **VALUE**: Verifies the newer message wins when a slot is stored twice.
///
/// **WHY THIS MATTERS**: The slot holds at most one entry; the older one must be
/// discarded, never returned alongside.
///
/// **BUG THIS CATCHES**: Would catch first-write-wins or accumulating semantics.
#[test]
fn given_two_stores_of_same_kind_when_taken_then_returns_latest_only() {
    // GIVEN: Two responses stored into the same slot
    let mut inbox = Inbox::new();
    let replaced_first = inbox.store(MessageKind::GetObservedSymbolsResponse, response(&["m1"]));
    let replaced_second = inbox.store(MessageKind::GetObservedSymbolsResponse, response(&["m2"]));

    // WHEN: Taking the slot
    let taken = inbox.take(MessageKind::GetObservedSymbolsResponse);

    // THEN: Only m2 comes out; m1 was reported as replaced
    assert_eq!(replaced_first, None);
    assert_eq!(replaced_second, Some(response(&["m1"])));
    assert_eq!(taken, Some(response(&["m2"])));
    assert_eq!(inbox.take(MessageKind::GetObservedSymbolsResponse), None);
}

/// **VALUE**: Verifies slots of different kinds are independent.
///
/// **WHY THIS MATTERS**: A plot request decoded while waiting for a reply must not
/// displace the reply.
///
/// **BUG THIS CATCHES**: Would catch a single shared slot.
#[test]
fn given_messages_of_different_kinds_when_taken_then_each_slot_is_separate() {
    // GIVEN: A response and a plot request
    let mut inbox = Inbox::new();
    let plot = Message::PlotBufferRequest {
        buffer_name: "buf".to_string(),
    };
    inbox.store(MessageKind::GetObservedSymbolsResponse, response(&["x"]));
    inbox.store(MessageKind::PlotBufferRequest, plot.clone());

    // THEN: Both are present
    assert_eq!(inbox.len(), 2);
    assert!(inbox.contains(MessageKind::PlotBufferRequest));

    // WHEN: Taking the plot request
    let taken = inbox.take(MessageKind::PlotBufferRequest);

    // THEN: The response is untouched
    assert_eq!(taken, Some(plot));
    assert!(inbox.contains(MessageKind::GetObservedSymbolsResponse));
    assert!(!inbox.contains(MessageKind::PlotBufferRequest));
}

/// **VALUE**: Verifies an empty slot reads as absent rather than failing.
///
/// **WHY THIS MATTERS**: "Not yet received" is the normal state while polling.
///
/// **BUG THIS CATCHES**: Would catch a panic on a missing key.
#[test]
fn given_empty_inbox_when_taken_then_returns_none() {
    let mut inbox = Inbox::new();

    for kind in MessageKind::ALL {
        assert_eq!(inbox.take(kind), None);
    }
}

/// **VALUE**: Verifies `clear` empties every slot.
///
/// **WHY THIS MATTERS**: Shutdown clears the inbox so nothing leaks into a later session.
///
/// **BUG THIS CATCHES**: Would catch a partial clear.
#[test]
fn given_filled_inbox_when_cleared_then_is_empty() {
    let mut inbox = Inbox::new();
    inbox.store(MessageKind::GetObservedSymbolsResponse, response(&["x"]));
    inbox.store(MessageKind::GetObservedSymbols, Message::GetObservedSymbols);

    inbox.clear();

    assert!(inbox.is_empty());
    assert_eq!(inbox.len(), 0);
}
