// Unit tests for the message catalog
// Tag values, per-kind payload shapes, and exact consumption

use super::MemorySource;

use crate::config::LimitsConfig;
use crate::ipc::message::{Message, MessageKind};

/// **VALUE**: Pins the numeric tag of every kind.
///
/// **WHY THIS MATTERS**: Tags are the wire contract with the companion window.
///
/// **BUG THIS CATCHES**: Would catch reordering the enum variants.
#[test]
fn given_message_kinds_when_tagged_then_use_wire_values() {
    assert_eq!(MessageKind::GetObservedSymbols.tag(), 0);
    assert_eq!(MessageKind::GetObservedSymbolsResponse.tag(), 1);
    assert_eq!(MessageKind::SetAvailableSymbols.tag(), 2);
    assert_eq!(MessageKind::PlotBufferRequest.tag(), 3);
}

/// **VALUE**: Verifies the observed-symbols request is a bare tag.
///
/// **WHY THIS MATTERS**: The window reads no payload for this kind; extra bytes would
/// be taken as the start of the next frame.
///
/// **BUG THIS CATCHES**: Would catch an encoder that appends an empty list.
#[test]
fn given_get_observed_symbols_when_encoded_then_is_single_tag_byte() {
    // WHEN: Encoding the request
    let frame = Message::GetObservedSymbols.encode().unwrap();

    // THEN: Only the tag
    assert_eq!(frame, vec![0]);
}

/// **VALUE**: Verifies each kind decodes with its own payload shape.
///
/// **WHY THIS MATTERS**: This is the round-trip law for frames; a kind decoded with
/// another kind's shape would desynchronize the stream.
///
/// **BUG THIS CATCHES**: Would catch a decode arm wired to the wrong reader.
#[tokio::test]
async fn given_every_kind_when_encoded_and_read_back_then_matches() {
    let limits = LimitsConfig::default();
    let messages = vec![
        Message::GetObservedSymbols,
        Message::GetObservedSymbolsResponse {
            symbols: vec!["x".to_string(), "y".to_string(), "x".to_string()],
        },
        Message::SetAvailableSymbols {
            symbols: vec!["a".to_string(), "b".to_string()],
        },
        Message::PlotBufferRequest {
            buffer_name: "frame.data".to_string(),
        },
    ];

    for message in messages {
        // GIVEN: An encoded frame
        let mut source = MemorySource::new(message.encode().unwrap());

        // WHEN: Reading it back
        let decoded = Message::read_from(&mut source, &limits).await.unwrap();

        // THEN: Same message, same kind, nothing left over
        assert_eq!(decoded, message);
        assert_eq!(decoded.kind(), message.kind());
        assert_eq!(source.remaining(), 0);
    }
}

/// **VALUE**: Verifies decoding stops exactly at the end of one frame.
///
/// **WHY THIS MATTERS**: Frames are packed back to back on one stream.
///
/// **BUG THIS CATCHES**: Would catch a decoder that over-reads into the next frame.
#[tokio::test]
async fn given_two_frames_back_to_back_when_read_then_both_decode_in_order() {
    // GIVEN: Two plot requests in one buffer
    let limits = LimitsConfig::default();
    let mut bytes = Message::PlotBufferRequest {
        buffer_name: "buf1".to_string(),
    }
    .encode()
    .unwrap();
    bytes.extend(
        Message::PlotBufferRequest {
            buffer_name: "buf2".to_string(),
        }
        .encode()
        .unwrap(),
    );
    let mut source = MemorySource::new(bytes);

    // WHEN: Reading two frames
    let first = Message::read_from(&mut source, &limits).await.unwrap();
    let second = Message::read_from(&mut source, &limits).await.unwrap();

    // THEN: buf1 then buf2
    assert_eq!(
        first,
        Message::PlotBufferRequest {
            buffer_name: "buf1".to_string()
        }
    );
    assert_eq!(
        second,
        Message::PlotBufferRequest {
            buffer_name: "buf2".to_string()
        }
    );
}

/// **VALUE**: Verifies `decode` trusts the given kind and reads only that payload.
///
/// **WHY THIS MATTERS**: The bridge reads the tag itself and hands the rest to `decode`.
///
/// **BUG THIS CATCHES**: Would catch `decode` re-reading a tag.
#[tokio::test]
async fn given_payload_without_tag_when_decoded_then_uses_given_kind() {
    // GIVEN: A bare string payload
    let limits = LimitsConfig::default();
    let mut source = MemorySource::new(vec![3, 0, 0, 0, b'i', b'm', b'g']);

    // WHEN: Decoding as a plot request
    let decoded = Message::decode(MessageKind::PlotBufferRequest, &mut source, &limits)
        .await
        .unwrap();

    // THEN: Buffer name is the payload
    assert_eq!(
        decoded,
        Message::PlotBufferRequest {
            buffer_name: "img".to_string()
        }
    );
}

/// **VALUE**: Verifies the Display names used in log lines.
///
/// **WHY THIS MATTERS**: Dropped-frame warnings name the kind involved.
///
/// **BUG THIS CATCHES**: Would catch a Display impl that prints numeric tags.
#[test]
fn given_kind_when_displayed_then_prints_variant_name() {
    assert_eq!(
        MessageKind::PlotBufferRequest.to_string(),
        "PlotBufferRequest"
    );
    assert_eq!(
        MessageKind::GetObservedSymbolsResponse.to_string(),
        "GetObservedSymbolsResponse"
    );
}
