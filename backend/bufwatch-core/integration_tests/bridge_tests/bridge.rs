use crate::bridge_tests::helpers::{
    connect_peer, peer_receives_nothing, plot_request, receive_message, recorded,
    recording_callback, send_message, send_raw, start_bridge_with, start_test_bridge,
    symbols_response, test_config,
};

use bufwatch_core::Bridge;
use bufwatch_core::error::BridgeError;
use bufwatch_core::error::ipc::IpcError;
use bufwatch_core::ipc::{ConnectionState, Message};

use std::net::TcpListener as StdTcpListener;
use std::path::PathBuf;
use std::time::{Duration, Instant};

/// **VALUE**: Verifies `start()` listens, spawns the window and accepts it.
///
/// **WHY THIS MATTERS**: Every other operation requires this handshake to succeed.
///
/// **BUG THIS CATCHES**: Would catch a bridge that reports success without a client,
/// or a readiness probe that ignores the companion process.
#[tokio::test]
async fn given_window_connects_when_start_called_then_bridge_is_ready() {
    // GIVEN/WHEN: A bridge started with a fake window
    let (mut bridge, _peer, _plots) = start_test_bridge(29581).await;

    // THEN: Connected, companion spawned and alive
    assert_eq!(bridge.state(), ConnectionState::Connected);
    assert!(bridge.companion_pid().is_some(), "Companion should be spawned");
    assert!(bridge.is_ready(), "Connected bridge with live companion is ready");
}

/// **VALUE**: End-to-end symbol query: request out, reply in, symbols returned in order.
///
/// **WHY THIS MATTERS**: This is the synchronous request/response path the debugger
/// uses on every stop.
///
/// **BUG THIS CATCHES**: Would catch a wrong request frame, a reply decoded with the
/// wrong shape, or lost ordering.
#[tokio::test]
async fn given_window_replies_when_get_observed_symbols_then_returns_reply() {
    // GIVEN: A started bridge whose window answers one query
    let (mut bridge, mut peer, _plots) = start_test_bridge(29582).await;
    let window = tokio::spawn(async move {
        let request = receive_message(&mut peer).await;
        send_message(&mut peer, &symbols_response(&["x", "y", "z"])).await;
        (request, peer)
    });

    // WHEN: Querying observed symbols
    let symbols = bridge.get_observed_symbols().await;

    // THEN: The window saw the request and the reply came back intact
    let (request, _peer) = window.await.unwrap();
    assert_eq!(request, Message::GetObservedSymbols);
    assert_eq!(symbols, vec!["x", "y", "z"]);
}

/// **VALUE**: Verifies `set_available_symbols` sends one frame and expects nothing back.
///
/// **WHY THIS MATTERS**: It is fire-and-forget; the bridge must neither wait for nor
/// echo anything.
///
/// **BUG THIS CATCHES**: Would catch a wrong tag, a reordered list, or a stray frame.
#[tokio::test]
async fn given_symbols_when_set_available_symbols_then_window_receives_them_once() {
    // GIVEN: A started bridge
    let (mut bridge, mut peer, _plots) = start_test_bridge(29583).await;

    // WHEN: Publishing available symbols
    bridge
        .set_available_symbols(&["a", "b"])
        .await
        .expect("Send should succeed");

    // THEN: Exactly that frame arrives, followed by silence
    let received = receive_message(&mut peer).await;
    assert_eq!(
        received,
        Message::SetAvailableSymbols {
            symbols: vec!["a".to_string(), "b".to_string()]
        }
    );
    assert!(peer_receives_nothing(&mut peer, Duration::from_millis(300)).await);
}

/// **VALUE**: Two plot requests before one tick give two callbacks, in order.
///
/// **WHY THIS MATTERS**: The user may click several buffers between debugger polls;
/// each click must plot.
///
/// **BUG THIS CATCHES**: Would catch the single inbox slot swallowing the first request,
/// or a tick that dispatches at most one request.
#[tokio::test]
async fn given_two_plot_requests_when_one_tick_runs_then_callback_gets_both_in_order() {
    // GIVEN: Two plot requests already written by the window
    let (mut bridge, mut peer, plots) = start_test_bridge(29584).await;
    send_message(&mut peer, &plot_request("buf1")).await;
    send_message(&mut peer, &plot_request("buf2")).await;

    // WHEN: Running a single tick
    let dispatched = bridge.run_event_loop().await.expect("Tick should succeed");

    // THEN: Callback saw buf1 then buf2
    assert_eq!(dispatched, 2);
    assert_eq!(recorded(&plots), vec!["buf1", "buf2"]);
}

/// **VALUE**: Plot requests that arrive while waiting for a reply are kept for the next tick.
///
/// **WHY THIS MATTERS**: The synchronous query reads everything that is queued; plot
/// requests decoded on the way must not be lost.
///
/// **BUG THIS CATCHES**: Would catch the query path discarding non-reply frames.
#[tokio::test]
async fn given_plot_requests_before_reply_when_querying_then_next_tick_dispatches_them() {
    // GIVEN: A window that sends two plot requests ahead of its reply
    let (mut bridge, mut peer, plots) = start_test_bridge(29585).await;
    let window = tokio::spawn(async move {
        let _request = receive_message(&mut peer).await;
        send_message(&mut peer, &plot_request("p1")).await;
        send_message(&mut peer, &plot_request("p2")).await;
        send_message(&mut peer, &symbols_response(&["s"])).await;
        peer
    });

    // WHEN: Querying, then ticking once
    let symbols = bridge.get_observed_symbols().await;
    let _peer = window.await.unwrap();
    let dispatched = bridge.run_event_loop().await.unwrap();

    // THEN: Reply returned, both plot requests dispatched in order
    assert_eq!(symbols, vec!["s"]);
    assert_eq!(dispatched, 2);
    assert_eq!(recorded(&plots), vec!["p1", "p2"]);
}

/// **VALUE**: A window that hangs up before replying yields an empty list, not an error.
///
/// **WHY THIS MATTERS**: The window can be closed by the user at any time.
///
/// **BUG THIS CATCHES**: Would catch a panic or an endless wait on EOF.
#[tokio::test]
async fn given_window_closes_before_reply_when_get_observed_symbols_then_returns_empty() {
    // GIVEN: A window that reads the request and hangs up
    let (mut bridge, mut peer, _plots) = start_test_bridge(29586).await;
    let window = tokio::spawn(async move {
        let _request = receive_message(&mut peer).await;
        drop(peer);
    });

    // WHEN: Querying observed symbols
    let symbols = bridge.get_observed_symbols().await;
    window.await.unwrap();

    // THEN: Empty result and the connection is closed
    assert!(symbols.is_empty());
    assert_eq!(bridge.state(), ConnectionState::Closed);
    assert!(!bridge.is_ready());
}

/// **VALUE**: A window that never replies cannot block the host past the deadline.
///
/// **WHY THIS MATTERS**: The debugger UI freezes while this call runs.
///
/// **BUG THIS CATCHES**: Would catch an unbounded wait on read timeouts.
#[tokio::test]
async fn given_silent_window_when_get_observed_symbols_then_returns_empty_at_deadline() {
    // GIVEN: A bridge with a 500 ms deadline and a window that never answers
    let mut config = test_config(29587);
    config.timeouts.response_ms = 500;
    config.timeouts.read_ms = 200;
    let (mut bridge, _peer, _plots) = start_bridge_with(config).await;

    // WHEN: Querying observed symbols
    let started = Instant::now();
    let symbols = bridge.get_observed_symbols().await;
    let elapsed = started.elapsed();

    // THEN: Empty after roughly the deadline, connection still usable
    assert!(symbols.is_empty());
    assert!(elapsed >= Duration::from_millis(450), "Returned too early: {elapsed:?}");
    assert!(elapsed < Duration::from_secs(3), "Overran deadline: {elapsed:?}");
    assert_eq!(bridge.state(), ConnectionState::Connected);
}

/// **VALUE**: An unknown tag drops what is buffered but later frames still decode.
///
/// **WHY THIS MATTERS**: One corrupt frame must not cost the whole debugging session.
///
/// **BUG THIS CATCHES**: Would catch a bridge that tears down the connection on a bad
/// tag, or one that stays desynchronized afterwards.
#[tokio::test]
async fn given_unknown_tag_when_ticking_then_buffered_bytes_dropped_and_later_frames_decode() {
    // GIVEN: A bad tag followed by a frame, in one write
    let (mut bridge, mut peer, plots) = start_test_bridge(29588).await;
    let mut corrupt = vec![0xEE];
    corrupt.extend(plot_request("lost").encode().unwrap());
    send_raw(&mut peer, &corrupt).await;

    // WHEN: Ticking
    let first = bridge.run_event_loop().await.unwrap();

    // THEN: Nothing dispatched, still connected
    assert_eq!(first, 0);
    assert_eq!(bridge.state(), ConnectionState::Connected);

    // WHEN: The window sends a good frame afterwards
    send_message(&mut peer, &plot_request("after")).await;
    let second = bridge.run_event_loop().await.unwrap();

    // THEN: It decodes normally
    assert_eq!(second, 1);
    assert_eq!(recorded(&plots), vec!["after"]);
}

/// **VALUE**: An absurd length prefix is rejected without waiting for the bytes.
///
/// **WHY THIS MATTERS**: A corrupt prefix could otherwise stall every tick.
///
/// **BUG THIS CATCHES**: Would catch the length limit not being applied on the socket path.
#[tokio::test]
async fn given_oversized_length_when_ticking_then_frame_dropped_quickly() {
    // GIVEN: A plot request claiming a 4 GiB name
    let (mut bridge, mut peer, plots) = start_test_bridge(29589).await;
    send_raw(&mut peer, &[3, 0xFF, 0xFF, 0xFF, 0xFF]).await;

    // WHEN: Ticking
    let started = Instant::now();
    let dispatched = bridge.run_event_loop().await.unwrap();

    // THEN: Dropped immediately, nothing plotted, connection kept
    assert_eq!(dispatched, 0);
    assert!(started.elapsed() < Duration::from_millis(900));
    assert!(recorded(&plots).is_empty());
    assert_eq!(bridge.state(), ConnectionState::Connected);
}

/// **VALUE**: A tick with nothing to read returns after the tick timeout with zero dispatches.
///
/// **WHY THIS MATTERS**: The host calls this continuously; it must never block long.
///
/// **BUG THIS CATCHES**: Would catch a tick that waits on the per-read timeout instead.
#[tokio::test]
async fn given_idle_window_when_ticking_then_returns_zero_after_tick_timeout() {
    // GIVEN: A quiet window
    let (mut bridge, _peer, plots) = start_test_bridge(29590).await;

    // WHEN: Ticking
    let started = Instant::now();
    let dispatched = bridge.run_event_loop().await.unwrap();

    // THEN: Nothing dispatched, bounded by the 200 ms tick
    assert_eq!(dispatched, 0);
    assert!(started.elapsed() < Duration::from_millis(800));
    assert!(recorded(&plots).is_empty());
}

/// **VALUE**: After the window hangs up, the next tick closes and later ticks fail fast.
///
/// **WHY THIS MATTERS**: The host decides whether to relaunch based on this signal.
///
/// **BUG THIS CATCHES**: Would catch ticks that keep waiting on a dead socket.
#[tokio::test]
async fn given_window_hung_up_when_ticking_then_closes_and_then_fails_fast() {
    // GIVEN: A plot request followed by a hang-up
    let (mut bridge, mut peer, plots) = start_test_bridge(29591).await;
    send_message(&mut peer, &plot_request("last")).await;
    drop(peer);
    tokio::time::sleep(Duration::from_millis(50)).await;

    // WHEN: Ticking twice
    let first = bridge.run_event_loop().await;
    let second = bridge.run_event_loop().await;

    // THEN: The last request is still plotted, then NotConnected
    assert_eq!(first.unwrap(), 1);
    assert_eq!(recorded(&plots), vec!["last"]);
    assert_eq!(bridge.state(), ConnectionState::Closed);
    assert!(matches!(second, Err(IpcError::NotConnected { .. })));
}

/// **VALUE**: Operations on a bridge that never started fail fast.
///
/// **WHY THIS MATTERS**: Calling into an absent connection must not block or panic.
///
/// **BUG THIS CATCHES**: Would catch an `unwrap()` on the missing channel.
#[tokio::test]
async fn given_unstarted_bridge_when_operations_called_then_fail_fast() {
    // GIVEN: A bridge that was never started
    let (callback, _plots) = recording_callback();
    let mut bridge = Bridge::new(test_config(29592), callback);

    // WHEN: Calling the protocol operations
    let sent = bridge.set_available_symbols(&["a"]).await;
    let symbols = bridge.get_observed_symbols().await;
    let tick = bridge.run_event_loop().await;

    // THEN: Errors or empty results, never a hang
    assert!(matches!(sent, Err(IpcError::NotConnected { .. })));
    assert!(symbols.is_empty());
    assert!(matches!(tick, Err(IpcError::NotConnected { .. })));
    assert!(!bridge.is_ready());
}

/// **VALUE**: A busy port is reported as a bind failure.
///
/// **WHY THIS MATTERS**: A second debugger session on the same port must get a clear error.
///
/// **BUG THIS CATCHES**: Would catch a silent retry or a panic on bind.
#[tokio::test]
async fn given_port_in_use_when_start_called_then_returns_bind_error() {
    // GIVEN: The port is already taken
    let _blocker = StdTcpListener::bind("127.0.0.1:29593").expect("Port should be free");
    let (callback, _plots) = recording_callback();
    let mut bridge = Bridge::new(test_config(29593), callback);

    // WHEN: Starting
    let result = bridge.start().await;

    // THEN: Bind error, no companion launched
    assert!(matches!(result, Err(BridgeError::Ipc(IpcError::Bind { .. }))));
    assert!(bridge.companion_pid().is_none());
}

/// **VALUE**: A missing companion program fails `start()` and leaves the bridge inert.
///
/// **WHY THIS MATTERS**: A broken install must surface as an error, not a hang.
///
/// **BUG THIS CATCHES**: Would catch start() waiting for a client that can never come.
#[tokio::test]
async fn given_missing_companion_when_start_called_then_returns_spawn_error() {
    // GIVEN: A companion path that does not exist
    let mut config = test_config(29594);
    config.companion.program = PathBuf::from("/nonexistent/bufwatch-window");
    let (callback, _plots) = recording_callback();
    let mut bridge = Bridge::new(config, callback);

    // WHEN: Starting
    let result = bridge.start().await;

    // THEN: Spawn error, bridge closed
    assert!(matches!(result, Err(BridgeError::Spawn(_))));
    assert_eq!(bridge.state(), ConnectionState::Closed);
}

/// **VALUE**: A client wait that times out keeps listening; the caller can retry.
///
/// **WHY THIS MATTERS**: A slow window start should not force relaunching everything.
///
/// **BUG THIS CATCHES**: Would catch a timeout that closes the listener.
#[tokio::test]
async fn given_no_client_when_start_times_out_then_wait_for_client_can_retry() {
    // GIVEN: A short connect timeout and no window
    let mut config = test_config(29595);
    config.timeouts.connect_ms = 300;
    let (callback, _plots) = recording_callback();
    let mut bridge = Bridge::new(config, callback);

    // WHEN: Starting without a client
    let result = bridge.start().await;

    // THEN: NotConnected, still listening
    assert!(matches!(
        result,
        Err(BridgeError::Ipc(IpcError::NotConnected { .. }))
    ));
    assert_eq!(bridge.state(), ConnectionState::Listening);

    // WHEN: A window connects and the caller retries
    let peer_task = tokio::spawn(connect_peer(29595));
    let retried = bridge.wait_for_client().await;
    let _peer = peer_task.await.unwrap();

    // THEN: Connected
    assert!(retried.is_ok());
    assert_eq!(bridge.state(), ConnectionState::Connected);
}

/// **VALUE**: `shutdown()` terminates the companion and closes the connection.
///
/// **WHY THIS MATTERS**: Detaching the debugger must not leave a stray window behind.
///
/// **BUG THIS CATCHES**: Would catch a shutdown that only drops the socket.
#[tokio::test]
async fn given_running_bridge_when_shutdown_then_companion_terminated() {
    // GIVEN: A running bridge
    let (mut bridge, _peer, _plots) = start_test_bridge(29596).await;
    assert!(bridge.is_ready());

    // WHEN: Shutting down
    let terminated = bridge.shutdown().await;

    // THEN: Process gone, connection closed
    assert!(terminated, "Companion should be terminated");
    assert!(bridge.companion_pid().is_none());
    assert_eq!(bridge.state(), ConnectionState::Closed);
    assert!(!bridge.is_ready());
}

/// **VALUE**: A response left over from a timed-out query is not returned for the next one.
///
/// **WHY THIS MATTERS**: Returning the previous stop's symbols would show stale data.
///
/// **BUG THIS CATCHES**: Would catch the inbox handing out an old reply.
#[tokio::test]
async fn given_late_reply_when_querying_again_then_returns_fresh_reply() {
    // GIVEN: A first query that times out before the window answers
    let mut config = test_config(29597);
    config.timeouts.response_ms = 300;
    config.timeouts.read_ms = 100;
    let (mut bridge, mut peer, _plots) = start_bridge_with(config).await;

    let first = bridge.get_observed_symbols().await;
    assert!(first.is_empty());

    // GIVEN: The late answer arrives, then gets buffered by a tick
    let _first_request = receive_message(&mut peer).await;
    send_message(&mut peer, &symbols_response(&["stale"])).await;
    bridge.run_event_loop().await.unwrap();

    // WHEN: Querying again with a window that answers freshly
    let window = tokio::spawn(async move {
        let _second_request = receive_message(&mut peer).await;
        send_message(&mut peer, &symbols_response(&["fresh"])).await;
        peer
    });
    let second = bridge.get_observed_symbols().await;
    let _peer = window.await.unwrap();

    // THEN: Only the fresh answer is returned
    assert_eq!(second, vec!["fresh"]);
}

/// **VALUE**: An invalid config is rejected before anything is bound or spawned.
///
/// **WHY THIS MATTERS**: Configs built in code skip the validation `load` performs.
///
/// **BUG THIS CATCHES**: Would catch `start()` running with a zero tick or empty program.
#[tokio::test]
async fn given_invalid_config_when_start_called_then_returns_config_error() {
    // GIVEN: A zero tick timeout
    let mut config = test_config(29598);
    config.timeouts.tick_ms = 0;
    let (callback, _plots) = recording_callback();
    let mut bridge = Bridge::new(config, callback);

    // WHEN: Starting
    let result = bridge.start().await;

    // THEN: Config error, nothing bound or launched
    assert!(matches!(result, Err(BridgeError::Config(_))));
    assert_eq!(bridge.state(), ConnectionState::Unbound);
    assert!(bridge.local_addr().is_none());
    assert!(bridge.companion_pid().is_none());
}
