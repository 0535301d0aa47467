//! Message-set framing tests.

use thorwire::protocol::{decode_messages, encode_messages, BinaryWriter, MINIMUM_MESSAGE_SIZE};
use thorwire::{Message, WireError};

fn encode(messages: &[Message]) -> Vec<u8> {
    let mut writer = BinaryWriter::new();
    encode_messages(&mut writer, messages).unwrap();
    writer.into_inner().to_vec()
}

fn sample_messages() -> Vec<Message> {
    vec![
        Message::new(b"first".to_vec()).with_key(b"k1".to_vec()),
        Message::new(b"second".to_vec()),
        Message {
            key: Some(Vec::new()),
            value: None,
            ..Message::default()
        },
    ]
}

/// Byte range of each encoded message (offset field through value).
fn message_ranges(set: &[u8]) -> Vec<std::ops::Range<usize>> {
    let mut ranges = Vec::new();
    let mut pos = 0;
    while pos + MINIMUM_MESSAGE_SIZE <= set.len() {
        let size = i32::from_be_bytes([set[pos + 8], set[pos + 9], set[pos + 10], set[pos + 11]]);
        let end = pos + MINIMUM_MESSAGE_SIZE + size as usize;
        ranges.push(pos..end);
        pos = end;
    }
    ranges
}

#[test]
fn round_trip_preserves_fields() {
    let messages = sample_messages();
    let decoded = decode_messages(&encode(&messages), 4).unwrap();
    assert_eq!(decoded.len(), messages.len());
    for (got, want) in decoded.iter().zip(&messages) {
        assert_eq!(got.magic, want.magic);
        assert_eq!(got.attributes, want.attributes);
        assert_eq!(got.key, want.key);
        assert_eq!(got.value, want.value);
        assert_eq!(got.partition_id, 4);
    }
}

#[test]
fn empty_set_round_trips() {
    let set = encode(&[]);
    assert!(set.is_empty());
    assert!(decode_messages(&set, 0).unwrap().is_empty());
}

#[test]
fn encoded_layout() {
    let set = encode(&[Message::new(b"v".to_vec())]);
    // offset(8) size(4) crc(4) magic(1) attributes(1) key(4) value(4+1)
    assert_eq!(set.len(), 27);
    assert_eq!(&set[0..8], &[0u8; 8]);
    assert_eq!(&set[8..12], &15i32.to_be_bytes());
    assert_eq!(&set[12..16], &crc32fast::hash(&set[16..]).to_be_bytes());
    assert_eq!(&set[18..22], &(-1i32).to_be_bytes());
    assert_eq!(&set[22..27], &[0, 0, 0, 1, b'v']);
}

#[test]
fn broker_offsets_are_decoded() {
    let mut set = encode(&sample_messages());
    for (i, range) in message_ranges(&set.clone()).into_iter().enumerate() {
        let offset = 100 + i as i64;
        set[range.start..range.start + 8].copy_from_slice(&offset.to_be_bytes());
    }
    let offsets: Vec<i64> = decode_messages(&set, 0)
        .unwrap()
        .iter()
        .map(|m| m.offset)
        .collect();
    assert_eq!(offsets, vec![100, 101, 102]);
}

#[test]
fn flipped_value_bit_fails_integrity() {
    let messages = sample_messages();
    let clean = encode(&messages);
    let first = message_ranges(&clean)[0].clone();
    // Every bit of the first message's value ("first", the last 5 bytes).
    for byte in first.end - 5..first.end {
        for bit in 0..8 {
            let mut set = clean.clone();
            set[byte] ^= 1 << bit;
            match decode_messages(&set, 0) {
                Err(WireError::CrcMismatch { offset }) => assert_eq!(offset, 0),
                other => panic!("byte {} bit {}: expected CrcMismatch, got {:?}", byte, bit, other),
            }
        }
    }
}

#[test]
fn truncated_third_message_yields_two() {
    let set = encode(&sample_messages());
    let third = message_ranges(&set)[2].clone();
    for cut in third.start + 1..third.end {
        let decoded = decode_messages(&set[..cut], 0).unwrap();
        assert_eq!(decoded.len(), 2, "cut at {}", cut);
        assert_eq!(decoded[0].value.as_deref(), Some(&b"first"[..]));
        assert_eq!(decoded[1].value.as_deref(), Some(&b"second"[..]));
    }
}

#[test]
fn compressed_message_is_unsupported() {
    for codec in [1u8, 2, 3] {
        let message = Message {
            attributes: codec,
            ..Message::new(b"zipped".to_vec())
        };
        match decode_messages(&encode(&[message]), 0) {
            Err(WireError::UnsupportedCodec(id)) => assert_eq!(id, codec),
            other => panic!("codec {}: expected UnsupportedCodec, got {:?}", codec, other),
        }
    }
}

#[test]
fn attribute_bits_outside_codec_mask_are_ignored() {
    let message = Message {
        attributes: 0x04,
        ..Message::new(b"plain".to_vec())
    };
    let decoded = decode_messages(&encode(&[message]), 0).unwrap();
    assert_eq!(decoded[0].attributes, 0x04);
    assert_eq!(decoded[0].value.as_deref(), Some(&b"plain"[..]));
}

#[test]
fn message_too_short_for_checksum_is_malformed() {
    let mut set = vec![0u8; 8];
    set.extend_from_slice(&2i32.to_be_bytes());
    set.extend_from_slice(&[0xAA, 0xBB]);
    assert!(matches!(decode_messages(&set, 0), Err(WireError::Protocol(_))));
}
