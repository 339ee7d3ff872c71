use crate::bridge_tests::helpers::connect_peer;

use bufwatch_core::error::ipc::IpcError;
use bufwatch_core::ipc::{ConnectionManager, ConnectionState, FrameSource};

use std::time::Duration;

use tokio::io::AsyncWriteExt;

const READ_TIMEOUT: Duration = Duration::from_millis(500);

/// **VALUE**: Verifies an accept timeout leaves the manager listening.
///
/// **WHY THIS MATTERS**: The caller decides whether to wait again; the listener must
/// survive a slow window start.
///
/// **BUG THIS CATCHES**: Would catch a timeout that drops the listener or closes the manager.
#[tokio::test]
async fn given_no_client_when_accept_times_out_then_still_listening() {
    // GIVEN: A listening manager
    let mut manager = ConnectionManager::new(READ_TIMEOUT);
    let addr = manager.listen("127.0.0.1", 29601).await.unwrap();

    // WHEN: Nobody connects
    let accepted = manager.accept(Duration::from_millis(200)).await.unwrap();

    // THEN: Not accepted, still listening on the same address
    assert!(!accepted);
    assert_eq!(manager.state(), ConnectionState::Listening);
    assert_eq!(manager.local_addr(), Some(addr));
}

/// **VALUE**: Verifies operations without a connection fail fast with NotConnected.
///
/// **WHY THIS MATTERS**: The bridge relies on this to turn "no window" into an error
/// rather than a hang.
///
/// **BUG THIS CATCHES**: Would catch `channel_mut` handing out a stale channel.
#[test]
fn given_unbound_manager_when_channel_requested_then_not_connected() {
    let mut manager = ConnectionManager::new(READ_TIMEOUT);

    let result = manager.channel_mut();

    assert!(matches!(result, Err(IpcError::NotConnected { .. })));
    assert_eq!(manager.state(), ConnectionState::Unbound);
}

/// **VALUE**: Verifies accept on an unbound manager is rejected.
///
/// **WHY THIS MATTERS**: Accepting without a listener is a caller bug, not a timeout.
///
/// **BUG THIS CATCHES**: Would catch accept silently returning `Ok(false)`.
#[tokio::test]
async fn given_unbound_manager_when_accept_called_then_not_listening() {
    let mut manager = ConnectionManager::new(READ_TIMEOUT);

    let result = manager.accept(Duration::from_millis(50)).await;

    assert!(matches!(result, Err(IpcError::NotListening { .. })));
}

/// **VALUE**: Verifies accepted bytes are readable through the channel and close is final.
///
/// **WHY THIS MATTERS**: The channel is the only way frames reach the bridge.
///
/// **BUG THIS CATCHES**: Would catch a channel that loses bytes or a close that can be undone.
#[tokio::test]
async fn given_connected_peer_when_bytes_sent_then_channel_reads_them_until_closed() {
    // GIVEN: A connected peer
    let mut manager = ConnectionManager::new(READ_TIMEOUT);
    manager.listen("127.0.0.1", 29602).await.unwrap();
    let peer_task = tokio::spawn(connect_peer(29602));
    assert!(manager.accept(Duration::from_secs(5)).await.unwrap());
    let mut peer = peer_task.await.unwrap();
    assert_eq!(manager.state(), ConnectionState::Connected);

    // WHEN: The peer writes four bytes
    peer.write_all(&[1, 2, 3, 4]).await.unwrap();
    let channel = manager.channel_mut().unwrap();
    assert!(channel.wait_readable(Duration::from_secs(2)).await.unwrap());
    let bytes = channel.read_exact(4).await.unwrap();

    // THEN: Exactly those bytes come out
    assert_eq!(bytes, vec![1, 2, 3, 4]);
    assert!(channel.peer().ip().is_loopback());

    // WHEN: Closing twice
    manager.close();
    manager.close();

    // THEN: Closed, and no channel is handed out again
    assert_eq!(manager.state(), ConnectionState::Closed);
    assert!(matches!(
        manager.channel_mut(),
        Err(IpcError::NotConnected { .. })
    ));
}

/// **VALUE**: Verifies a frame that stops arriving midway times out instead of blocking.
///
/// **WHY THIS MATTERS**: A stalled window must not freeze the debugger.
///
/// **BUG THIS CATCHES**: Would catch `read_exact` waiting without a deadline.
#[tokio::test]
async fn given_partial_frame_when_read_exact_then_times_out() {
    // GIVEN: A peer that sends two of the four bytes requested
    let mut manager = ConnectionManager::new(Duration::from_millis(200));
    manager.listen("127.0.0.1", 29603).await.unwrap();
    let peer_task = tokio::spawn(connect_peer(29603));
    assert!(manager.accept(Duration::from_secs(5)).await.unwrap());
    let mut peer = peer_task.await.unwrap();
    peer.write_all(&[9, 9]).await.unwrap();

    // WHEN: Reading four bytes
    let channel = manager.channel_mut().unwrap();
    let result = channel.read_exact(4).await;

    // THEN: Timeout, which counts as a protocol violation
    let err = result.expect_err("short read must time out");
    assert!(matches!(err, IpcError::Timeout { .. }));
    assert!(err.is_protocol_violation());
}
