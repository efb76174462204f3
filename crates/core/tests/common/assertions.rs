//! Assertion helpers over published job messages.

use sc_core::state::notifier::Subscription;
use sc_protocol::ipc::JobMessage;
use std::time::Duration;

/// Receive messages until a terminal one arrives or the stream closes.
///
/// Panics if nothing arrives for five seconds.
#[allow(dead_code)]
pub async fn collect_until_terminal(subscription: &mut Subscription) -> Vec<JobMessage> {
    let mut messages = Vec::new();
    loop {
        let next = tokio::time::timeout(Duration::from_secs(5), subscription.recv())
            .await
            .expect("timed out waiting for job messages");
        let Some(message) = next else {
            break;
        };
        let terminal = message.is_terminal();
        messages.push(message);
        if terminal {
            break;
        }
    }
    messages
}

/// Progress percentages in publication order.
#[allow(dead_code)]
pub fn progress_values(messages: &[JobMessage]) -> Vec<u8> {
    messages
        .iter()
        .filter_map(|message| match message {
            JobMessage::Progress { data, .. } => Some(data.progress),
            _ => None,
        })
        .collect()
}

/// Assert that a message sequence opens with `connected` and ends with a
/// single terminal message.
#[allow(dead_code)]
pub fn assert_message_sequence(messages: &[JobMessage]) {
    assert!(!messages.is_empty(), "Message sequence is empty");

    assert!(
        matches!(messages[0], JobMessage::Connected { .. }),
        "First message should be Connected, got: {:?}",
        messages[0]
    );

    let terminals = messages.iter().filter(|m| m.is_terminal()).count();
    assert_eq!(terminals, 1, "Expected exactly one terminal message");
    assert!(
        messages.last().is_some_and(JobMessage::is_terminal),
        "Last message should be terminal, got: {:?}",
        messages.last()
    );
}

/// Assert that progress never decreases.
#[allow(dead_code)]
pub fn assert_monotonic(values: &[u8]) {
    for pair in values.windows(2) {
        assert!(
            pair[0] <= pair[1],
            "Progress went backwards: {} -> {} in {values:?}",
            pair[0],
            pair[1]
        );
    }
}
