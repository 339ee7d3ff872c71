//! Test helpers for bridge integration tests.
//!
//! The companion window is stood in for by two pieces:
//! - a real `sleep` process, so liveness probes and kills act on a real PID
//! - a plain tokio `TcpStream` that plays the window's side of the protocol

use bufwatch_core::config::{BridgeConfig, CompanionConfig, LimitsConfig};
use bufwatch_core::error::ipc::IpcError;
use bufwatch_core::ipc::{FrameSource, Message};
use bufwatch_core::{Bridge, PlotStatus};

use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;

/// How long a peer read may take before the test gives up.
const PEER_READ_TIMEOUT: Duration = Duration::from_secs(3);

pub type RecordedPlots = Arc<Mutex<Vec<String>>>;

/// Bridge config pointing at `port`, with `sleep 30` as the companion.
pub fn test_config(port: u16) -> BridgeConfig {
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

/// Plot callback that records every buffer name it is given.
pub fn recording_callback() -> (impl FnMut(&str) -> PlotStatus + Send + 'static, RecordedPlots) {
    let plots = RecordedPlots::default();
    let sink = Arc::clone(&plots);

    let callback = move |buffer_name: &str| {
        sink.lock().unwrap().push(buffer_name.to_string());
        PlotStatus::Plotted
    };

    (callback, plots)
}

pub fn recorded(plots: &RecordedPlots) -> Vec<String> {
    plots.lock().unwrap().clone()
}

/// Connect to the bridge, retrying while it is still binding.
pub async fn connect_peer(port: u16) -> TcpStream {
    for _ in 0..100 {
        if let Ok(stream) = TcpStream::connect(("127.0.0.1", port)).await {
            return stream;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    panic!("Could not connect to bridge on port {port}");
}

/// Start a bridge with `config` and connect a fake window to it.
pub async fn start_bridge_with(config: BridgeConfig) -> (Bridge, TcpStream, RecordedPlots) {
    let port = config.listen.port;
    let (callback, plots) = recording_callback();
    let mut bridge = Bridge::new(config, callback);

    let peer_task = tokio::spawn(connect_peer(port));
    bridge.start().await.expect("Bridge should start");
    let peer = peer_task.await.expect("Peer task panicked");

    (bridge, peer, plots)
}

pub async fn start_test_bridge(port: u16) -> (Bridge, TcpStream, RecordedPlots) {
    start_bridge_with(test_config(port)).await
}

pub async fn send_message(peer: &mut TcpStream, message: &Message) {
    let frame = message.encode().expect("Failed to encode frame");
    send_raw(peer, &frame).await;
}

pub async fn send_raw(peer: &mut TcpStream, bytes: &[u8]) {
    peer.write_all(bytes).await.expect("Failed to write to bridge");
    peer.flush().await.expect("Failed to flush to bridge");
}

/// The window's view of the stream, decoded with the same catalog as the bridge.
pub struct PeerReader<'a>(pub &'a mut TcpStream);

impl FrameSource for PeerReader<'_> {
    async fn read_exact(&mut self, count: usize) -> Result<Vec<u8>, IpcError> {
        let mut buffer = vec![0u8; count];
        match tokio::time::timeout(PEER_READ_TIMEOUT, self.0.read_exact(&mut buffer)).await {
            Ok(result) => {
                result?;
                Ok(buffer)
            }
            Err(_) => panic!("Peer timed out waiting for {count} bytes"),
        }
    }
}

pub async fn receive_message(peer: &mut TcpStream) -> Message {
    Message::read_from(&mut PeerReader(peer), &LimitsConfig::default())
        .await
        .expect("Failed to decode frame from bridge")
}

/// True if the bridge wrote nothing within `wait`.
pub async fn peer_receives_nothing(peer: &mut TcpStream, wait: Duration) -> bool {
    let mut byte = [0u8; 1];
    matches!(
        tokio::time::timeout(wait, peer.read(&mut byte)).await,
        Err(_)
    )
}

pub fn plot_request(name: &str) -> Message {
    Message::PlotBufferRequest {
        buffer_name: name.to_string(),
    }
}

pub fn symbols_response(symbols: &[&str]) -> Message {
    Message::GetObservedSymbolsResponse {
        symbols: symbols.iter().map(|s| s.to_string()).collect(),
    }
}
