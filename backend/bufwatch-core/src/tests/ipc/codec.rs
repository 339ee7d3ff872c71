// Unit tests for the wire codec
// Byte layout, length limits, and short-read reporting

use super::MemorySource;

use crate::config::LimitsConfig;
use crate::error::ipc::IpcError;
use crate::ipc::codec::{MessageComposer, read_kind, read_string, read_string_list, read_u32};
use crate::ipc::message::MessageKind;

/// **VALUE**: Pins the exact byte layout of a string.
///
/// **WHY THIS MATTERS**: The companion window is built separately; both ends must agree
/// on a little-endian `u32` length followed by raw bytes with no terminator.
///
/// **BUG THIS CATCHES**: Would catch a switch to big-endian, a different prefix width,
/// or an appended NUL byte.
#[test]
fn given_string_when_pushed_then_writes_le_length_and_raw_bytes() {
    // GIVEN: An empty composer
    let mut composer = MessageComposer::new();

    // WHEN: Pushing a string
    composer.push_str("img").unwrap();

    // THEN: Length prefix is 3 (little-endian) followed by the bytes
    assert_eq!(composer.as_bytes(), &[3, 0, 0, 0, b'i', b'm', b'g']);
}

/// **VALUE**: Pins the byte layout of a string sequence, including order and duplicates.
///
/// **WHY THIS MATTERS**: Symbol lists are shown in the order the debugger reports them.
///
/// **BUG THIS CATCHES**: Would catch sorting, de-duplication or a missing count prefix.
#[test]
fn given_string_list_when_pushed_then_writes_count_then_each_string_in_order() {
    // GIVEN: A list with a duplicate entry
    let symbols = ["b", "a", "b"];
    let mut composer = MessageComposer::new();

    // WHEN: Pushing the list
    composer.push_str_list(&symbols).unwrap();

    // THEN: Count 3, then each string in the original order
    assert_eq!(
        composer.as_bytes(),
        &[3, 0, 0, 0, 1, 0, 0, 0, b'b', 1, 0, 0, 0, b'a', 1, 0, 0, 0, b'b']
    );
}

/// **VALUE**: Verifies strings and sequences decode back to the values that were encoded.
///
/// **WHY THIS MATTERS**: This is the round-trip law for the primitives every frame uses.
///
/// **BUG THIS CATCHES**: Would catch an encoder and decoder that disagree on prefixes.
#[tokio::test]
async fn given_encoded_primitives_when_decoded_then_values_match() {
    // GIVEN: A string, an empty string and a sequence, back to back
    let limits = LimitsConfig::default();
    let symbols = vec!["frame".to_string(), "Ω mask".to_string(), String::new()];
    let mut composer = MessageComposer::new();
    composer.push_str("buffer_0").unwrap();
    composer.push_str("").unwrap();
    composer.push_str_list(&symbols).unwrap();
    let mut source = MemorySource::new(composer.into_bytes());

    // WHEN: Decoding them in the same order
    let first = read_string(&mut source, &limits).await.unwrap();
    let empty = read_string(&mut source, &limits).await.unwrap();
    let list = read_string_list(&mut source, &limits).await.unwrap();

    // THEN: Every value matches and nothing is left over
    assert_eq!(first, "buffer_0");
    assert_eq!(empty, "");
    assert_eq!(list, symbols);
    assert_eq!(source.remaining(), 0, "Decoder must not under-read");
}

/// **VALUE**: Verifies integers are decoded little-endian.
///
/// **WHY THIS MATTERS**: Prefixes above 255 are the first place a byte-order mismatch shows.
///
/// **BUG THIS CATCHES**: Would catch `from_be_bytes` sneaking into the decoder.
#[tokio::test]
async fn given_le_bytes_when_read_u32_then_decodes_little_endian() {
    // GIVEN: 0x01020304 in little-endian order
    let mut source = MemorySource::new(vec![0x04, 0x03, 0x02, 0x01]);

    // WHEN: Reading a u32
    let value = read_u32(&mut source).await.unwrap();

    // THEN: Value is 0x01020304
    assert_eq!(value, 0x0102_0304);
}

/// **VALUE**: Verifies a string length above the configured limit is rejected up front.
///
/// **WHY THIS MATTERS**: A corrupt prefix could otherwise make the bridge wait for, or
/// allocate, gigabytes that will never arrive.
///
/// **BUG THIS CATCHES**: Would catch the limit check being skipped or done after reading.
#[tokio::test]
async fn given_length_above_limit_when_read_string_then_returns_malformed() {
    // GIVEN: A 16-byte limit and a prefix announcing 17 bytes
    let limits = LimitsConfig {
        max_string_bytes: 16,
        ..LimitsConfig::default()
    };
    let mut source = MemorySource::new(vec![17, 0, 0, 0, b'x']);

    // WHEN: Reading the string
    let result = read_string(&mut source, &limits).await;

    // THEN: Malformed, and the payload byte was not consumed
    assert!(matches!(result, Err(IpcError::Malformed { .. })));
    assert_eq!(source.remaining(), 1);
}

/// **VALUE**: Verifies a sequence count above the configured limit is rejected.
///
/// **WHY THIS MATTERS**: Same hazard as oversized strings, one level up.
///
/// **BUG THIS CATCHES**: Would catch a missing count check in `read_string_list`.
#[tokio::test]
async fn given_count_above_limit_when_read_string_list_then_returns_malformed() {
    // GIVEN: A limit of 2 and a count of 3
    let limits = LimitsConfig {
        max_sequence_len: 2,
        ..LimitsConfig::default()
    };
    let mut source = MemorySource::new(vec![3, 0, 0, 0]);

    // WHEN: Reading the list
    let result = read_string_list(&mut source, &limits).await;

    // THEN: Malformed
    let err = result.expect_err("count above limit must fail");
    assert!(err.is_protocol_violation());
}

/// **VALUE**: Verifies a truncated string reports an error instead of a padded value.
///
/// **WHY THIS MATTERS**: A silently shortened symbol name would be plotted under the wrong name.
///
/// **BUG THIS CATCHES**: Would catch a decoder that returns partial data.
#[tokio::test]
async fn given_truncated_payload_when_read_string_then_reports_short_read() {
    // GIVEN: A prefix of 5 with only 2 bytes behind it
    let limits = LimitsConfig::default();
    let mut source = MemorySource::new(vec![5, 0, 0, 0, b'a', b'b']);

    // WHEN: Reading the string
    let result = read_string(&mut source, &limits).await;

    // THEN: Error from the source
    assert!(matches!(result, Err(IpcError::ConnectionClosed { .. })));
}

/// **VALUE**: Verifies every defined tag decodes and anything else is rejected.
///
/// **WHY THIS MATTERS**: An out-of-set tag must never reach payload decoding.
///
/// **BUG THIS CATCHES**: Would catch renumbered tags or a catch-all that accepts junk.
#[tokio::test]
async fn given_tags_when_read_kind_then_accepts_only_known_values() {
    for kind in MessageKind::ALL {
        // GIVEN: A known tag
        let mut source = MemorySource::new(vec![kind.tag()]);

        // WHEN/THEN: It decodes to the same kind
        assert_eq!(read_kind(&mut source).await.unwrap(), kind);
    }

    // GIVEN: An unknown tag
    let mut source = MemorySource::new(vec![0xEE]);

    // WHEN: Reading it
    let result = read_kind(&mut source).await;

    // THEN: UnknownKind carrying the tag
    assert!(matches!(result, Err(IpcError::UnknownKind { tag: 0xEE, .. })));
}

/// **VALUE**: Verifies invalid UTF-8 is replaced instead of failing the frame.
///
/// **WHY THIS MATTERS**: Names are opaque bytes on the wire; one odd symbol must not
/// drop a whole symbol list.
///
/// **BUG THIS CATCHES**: Would catch a strict `String::from_utf8` in the decoder.
#[tokio::test]
async fn given_invalid_utf8_when_read_string_then_replaces_bytes() {
    // GIVEN: Two bytes where the second is not valid UTF-8
    let limits = LimitsConfig::default();
    let mut source = MemorySource::new(vec![2, 0, 0, 0, b'a', 0xFF]);

    // WHEN: Reading the string
    let value = read_string(&mut source, &limits).await.unwrap();

    // THEN: Replacement character stands in for the bad byte
    assert_eq!(value, "a\u{FFFD}");
}
