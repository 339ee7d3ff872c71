use bufwatch_core::PlotStatus;
use bufwatch_core::config::{BridgeConfig, CompanionConfig};
use bufwatch_core::ipc::{ConnectionState, Message};

use bufwatch_host::session::HostSession;

use std::io::{Read, Write};
use std::net::TcpStream;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

// ============================================================================
// Integration tests for the blocking host facade
// A std thread plays the companion window over a plain TcpStream
// ============================================================================

fn session_config(port: u16) -> BridgeConfig {
    let mut config = BridgeConfig::default();
    config.listen.port = port;
    config.companion = CompanionConfig {
        program: PathBuf::from("sleep"),
        args: vec!["30".to_string()],
    };
    config.timeouts.connect_ms = 5_000;
    config.timeouts.read_ms = 1_000;
    config.timeouts.response_ms = 3_000;
    config
}

fn recording_session(config: BridgeConfig) -> (HostSession, Arc<Mutex<Vec<String>>>) {
    let plots = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&plots);

    let session = HostSession::new(config, move |buffer_name: &str| {
        sink.lock().unwrap().push(buffer_name.to_string());
        PlotStatus::Plotted
    })
    .expect("Session should build");

    (session, plots)
}

/// Connect from a background thread, retrying while the session is still binding.
fn spawn_window<F>(port: u16, script: F) -> thread::JoinHandle<()>
where
    F: FnOnce(TcpStream) + Send + 'static,
{
    thread::spawn(move || {
        for _ in 0..100 {
            if let Ok(stream) = TcpStream::connect(("127.0.0.1", port)) {
                stream
                    .set_read_timeout(Some(Duration::from_secs(3)))
                    .unwrap();
                script(stream);
                return;
            }
            thread::sleep(Duration::from_millis(20));
        }
        panic!("Could not connect to session on port {port}");
    })
}

fn write_frame(stream: &mut TcpStream, message: &Message) {
    stream.write_all(&message.encode().unwrap()).unwrap();
    stream.flush().unwrap();
}

/// **VALUE**: Full blocking round trip: start, publish, query, plot.
///
/// **WHY THIS MATTERS**: This is the sequence a debugger extension runs on every stop.
///
/// **BUG THIS CATCHES**: Would catch the facade losing work between `block_on` calls,
/// such as bytes read in one call not being decoded in the next.
#[test]
fn given_window_when_driving_session_then_symbols_and_plots_flow() {
    // GIVEN: A window that reads two frames, answers the query and asks for a plot
    let (mut session, plots) = recording_session(session_config(29611));
    let window = spawn_window(29611, |mut stream| {
        // SetAvailableSymbols ["a"]: tag, count, len, byte
        let mut published = [0u8; 10];
        stream.read_exact(&mut published).unwrap();
        assert_eq!(published, [2, 1, 0, 0, 0, 1, 0, 0, 0, b'a']);

        // GetObservedSymbols: tag only
        let mut request = [0u8; 1];
        stream.read_exact(&mut request).unwrap();
        assert_eq!(request, [0]);

        write_frame(
            &mut stream,
            &Message::GetObservedSymbolsResponse {
                symbols: vec!["a".to_string()],
            },
        );
        write_frame(
            &mut stream,
            &Message::PlotBufferRequest {
                buffer_name: "a".to_string(),
            },
        );

        // Stay connected until the host has ticked
        thread::sleep(Duration::from_millis(500));
    });

    // WHEN: Driving the session like a host would
    assert!(session.start(), "Session should start");
    assert!(session.is_window_ready());
    session.set_available_symbols(&["a"]);
    let observed = session.get_observed_symbols();
    let mut dispatched = 0;
    for _ in 0..10 {
        dispatched += session.run_event_loop();
        if dispatched > 0 {
            break;
        }
    }
    window.join().unwrap();

    // THEN: Reply returned and the plot request reached the callback
    assert_eq!(observed, vec!["a"]);
    assert_eq!(dispatched, 1);
    assert_eq!(*plots.lock().unwrap(), vec!["a"]);
    assert!(session.shutdown());
}

/// **VALUE**: A session whose window cannot be launched reports `false` and stays inert.
///
/// **WHY THIS MATTERS**: The host shows "viewer unavailable" instead of crashing.
///
/// **BUG THIS CATCHES**: Would catch a panic, or later calls blocking on the dead session.
#[test]
fn given_missing_window_program_when_started_then_false_and_calls_return_quickly() {
    // GIVEN: A companion that does not exist
    let mut config = session_config(29612);
    config.companion.program = PathBuf::from("/nonexistent/bufwatch-window");
    let (mut session, plots) = recording_session(config);

    // WHEN: Starting and calling every operation
    let started = session.start();
    session.set_available_symbols(&["a"]);
    let observed = session.get_observed_symbols();
    let dispatched = session.run_event_loop();

    // THEN: Everything degrades to empty results
    assert!(!started);
    assert!(!session.is_window_ready());
    assert!(observed.is_empty());
    assert_eq!(dispatched, 0);
    assert!(plots.lock().unwrap().is_empty());
    assert_eq!(session.state(), ConnectionState::Closed);
}

/// **VALUE**: The window closing is observed through `is_window_ready`.
///
/// **WHY THIS MATTERS**: The host's tick loop stops on exactly this signal.
///
/// **BUG THIS CATCHES**: Would catch readiness that only checks the process and
/// ignores the socket.
#[test]
fn given_window_disconnects_when_ticking_then_not_ready() {
    // GIVEN: A window that connects and leaves at once
    let (mut session, _plots) = recording_session(session_config(29613));
    let window = spawn_window(29613, drop);
    assert!(session.start());
    window.join().unwrap();

    // WHEN: Ticking until the hang-up is seen
    for _ in 0..10 {
        session.run_event_loop();
        if !session.is_window_ready() {
            break;
        }
    }

    // THEN: Not ready, connection closed
    assert!(!session.is_window_ready());
    assert_eq!(session.state(), ConnectionState::Closed);
}
