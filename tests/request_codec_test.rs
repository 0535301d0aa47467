//! Request encoding and response decoding for the seven request kinds.

use thorwire::protocol::{
    self, correlation_id_of, encode_messages, BinaryReader, BinaryWriter, ConsumerMetadataRequest,
    Fetch, FetchRequest, MetadataRequest, Offset, OffsetCommit, OffsetCommitRequest, OffsetFetch,
    OffsetFetchRequest, OffsetRequest, ProduceRequest, EARLIEST_TIME, LATEST_TIME,
};
use thorwire::{
    ErrorCode, KafkaRequest, Message, MessageCodec, OffsetPosition, Payload, RequestHeader,
    WireError,
};

fn encode<R: KafkaRequest>(request: &R) -> Vec<u8> {
    protocol::frame(request).unwrap().to_vec()
}

/// Checks the frame length and header, returning a reader over the body.
fn open_frame<'a>(bytes: &'a [u8], api_key: i16, correlation_id: i32, client_id: &str) -> BinaryReader<'a> {
    let mut r = BinaryReader::new(bytes);
    assert_eq!(r.read_i32().unwrap() as usize, bytes.len() - 4);
    assert_eq!(r.read_i16().unwrap(), api_key);
    assert_eq!(r.read_i16().unwrap(), 0);
    assert_eq!(r.read_i32().unwrap(), correlation_id);
    assert_eq!(r.read_string().unwrap().as_deref(), Some(client_id));
    r
}

#[test]
fn metadata_request_layout() {
    let request = MetadataRequest::new(RequestHeader::new(7, "MK"), vec!["test".to_string()]);
    let bytes = encode(&request);

    let mut expected = Vec::new();
    expected.extend_from_slice(&[0, 3]); // api key
    expected.extend_from_slice(&[0, 0]); // api version
    expected.extend_from_slice(&[0, 0, 0, 7]); // correlation id
    expected.extend_from_slice(&[0, 2, b'M', b'K']);
    expected.extend_from_slice(&[0, 0, 0, 1]); // topic count
    expected.extend_from_slice(&[0, 4, b't', b'e', b's', b't']);
    let mut framed = (expected.len() as i32).to_be_bytes().to_vec();
    framed.extend_from_slice(&expected);

    assert_eq!(bytes, framed);
}

#[test]
fn default_header_uses_default_client_id() {
    let bytes = encode(&MetadataRequest::default());
    let mut r = open_frame(&bytes, 3, 1, protocol::DEFAULT_CLIENT_ID);
    assert_eq!(r.read_i32().unwrap(), 0);
    assert!(!r.has_data());
}

#[test]
fn metadata_response_decodes_brokers_and_topics() {
    let mut w = BinaryWriter::new();
    w.put_i32(7);
    w.put_i32(2);
    for (id, host, port) in [(1, "kafka-1", 9092), (2, "kafka-2", 9093)] {
        w.put_i32(id);
        w.put_string(Some(host)).unwrap();
        w.put_i32(port);
    }
    w.put_i32(1);
    w.put_i16(0);
    w.put_string(Some("events")).unwrap();
    w.put_i32(2);
    // partition 0: leader 2
    w.put_i16(0);
    w.put_i32(0);
    w.put_i32(2);
    w.put_i32_array(&[2, 1]);
    w.put_i32_array(&[2]);
    // partition 1: no leader
    w.put_i16(5);
    w.put_i32(1);
    w.put_i32(-1);
    w.put_i32_array(&[1, 2]);
    w.put_i32_array(&[]);

    let request = MetadataRequest::default();
    let response = request.decode(w.as_slice()).unwrap();
    assert_eq!(response.len(), 1);
    let metadata = &response[0];
    assert_eq!(metadata.correlation_id, 7);
    assert_eq!(metadata.brokers.len(), 2);
    assert_eq!(metadata.brokers[1].address(), "kafka-2:9093");

    let topic = &metadata.topics[0];
    assert_eq!(topic.name, "events");
    assert_eq!(topic.error, ErrorCode::NoError);
    assert_eq!(topic.partitions[0].replicas, vec![2, 1]);
    assert_eq!(topic.partitions[0].isrs, vec![2]);
    assert_eq!(topic.partitions[1].error, ErrorCode::LeaderNotAvailable);

    assert_eq!(metadata.leader_for("events", 0).map(|b| b.broker_id), Some(2));
    assert!(metadata.leader_for("events", 1).is_none());
    assert!(metadata.leader_for("missing", 0).is_none());
}

#[test]
fn produce_request_groups_by_topic_and_partition() {
    let request = ProduceRequest::new(
        RequestHeader::new(11, "p"),
        vec![
            Payload::new("a", 0, vec![Message::new(b"a0-1".to_vec())]),
            Payload::new("b", 3, vec![Message::new(b"b3".to_vec())]),
            Payload::new("a", 1, vec![Message::new(b"a1".to_vec())]),
            Payload::new("a", 0, vec![Message::new(b"a0-2".to_vec())]),
        ],
    );
    let bytes = encode(&request);
    let mut r = open_frame(&bytes, 0, 11, "p");
    assert_eq!(r.read_i16().unwrap(), 1); // acks
    assert_eq!(r.read_i32().unwrap(), 1000); // timeout
    assert_eq!(r.read_i32().unwrap(), 2);

    let mut seen = Vec::new();
    for _ in 0..2 {
        let topic = r.read_string().unwrap().unwrap();
        let partitions = r.read_i32().unwrap();
        for _ in 0..partitions {
            let partition = r.read_i32().unwrap();
            let size = r.read_i32().unwrap() as usize;
            let set = r.read_slice(size).unwrap();
            let values: Vec<Vec<u8>> = protocol::decode_messages(set, partition)
                .unwrap()
                .into_iter()
                .filter_map(|m| m.value)
                .collect();
            seen.push((topic.clone(), partition, values));
        }
    }
    assert!(!r.has_data());
    assert_eq!(
        seen,
        vec![
            ("a".to_string(), 0, vec![b"a0-1".to_vec(), b"a0-2".to_vec()]),
            ("a".to_string(), 1, vec![b"a1".to_vec()]),
            ("b".to_string(), 3, vec![b"b3".to_vec()]),
        ]
    );
}

#[test]
fn produce_rejects_compressed_payloads() {
    let mut payload = Payload::new("t", 0, vec![Message::new(b"x".to_vec())]);
    payload.codec = MessageCodec::Gzip;
    let request = ProduceRequest::new(RequestHeader::default(), vec![payload]);
    let mut w = BinaryWriter::new();
    assert!(matches!(
        request.encode(&mut w),
        Err(WireError::UnsupportedCodec(1))
    ));
    assert!(w.is_empty());
}

#[test]
fn produce_response_decodes() {
    let mut w = BinaryWriter::new();
    w.put_i32(11);
    w.put_i32(1);
    w.put_string(Some("a")).unwrap();
    w.put_i32(2);
    w.put_i32(0);
    w.put_i16(0);
    w.put_i64(42);
    w.put_i32(1);
    w.put_i16(6);
    w.put_i64(-1);

    let responses = ProduceRequest::default().decode(w.as_slice()).unwrap();
    assert_eq!(responses.len(), 2);
    assert_eq!(responses[0].topic, "a");
    assert_eq!(responses[0].offset, 42);
    assert_eq!(responses[1].partition_id, 1);
    assert_eq!(responses[1].error, ErrorCode::NotLeaderForPartition);
}

#[test]
fn fetch_request_layout() {
    let request = FetchRequest::new(
        RequestHeader::new(3, "c"),
        vec![Fetch::new("t", 2, 500), Fetch::new("t", 1, 7)],
    );
    let bytes = encode(&request);
    let mut r = open_frame(&bytes, 1, 3, "c");
    assert_eq!(r.read_i32().unwrap(), -1); // replica id
    assert_eq!(r.read_i32().unwrap(), protocol::DEFAULT_MAX_WAIT_TIME);
    assert_eq!(r.read_i32().unwrap(), protocol::DEFAULT_MIN_BYTES);
    assert_eq!(r.read_i32().unwrap(), 1);
    assert_eq!(r.read_string().unwrap().as_deref(), Some("t"));
    assert_eq!(r.read_i32().unwrap(), 2);
    for (partition, offset) in [(2, 500i64), (1, 7)] {
        assert_eq!(r.read_i32().unwrap(), partition);
        assert_eq!(r.read_i64().unwrap(), offset);
        assert_eq!(r.read_i32().unwrap(), protocol::DEFAULT_MAX_BYTES);
    }
    assert!(!r.has_data());
}

#[test]
fn fetch_response_decodes_message_sets_with_partial_tail() {
    let mut set = BinaryWriter::new();
    encode_messages(
        &mut set,
        &[Message::new(b"one".to_vec()), Message::new(b"two".to_vec())],
    ).unwrap();
    // The broker cut the set short mid-message.
    let set = &set.as_slice()[..set.len() - 3];

    let mut w = BinaryWriter::new();
    w.put_i32(3);
    w.put_i32(1);
    w.put_string(Some("t")).unwrap();
    w.put_i32(2);
    w.put_i32(0);
    w.put_i16(0);
    w.put_i64(99);
    w.put_bytes(Some(set)).unwrap();
    w.put_i32(1);
    w.put_i16(1);
    w.put_i64(-1);
    w.put_i32(0);

    let responses = FetchRequest::default().decode(w.as_slice()).unwrap();
    assert_eq!(responses.len(), 2);
    assert_eq!(responses[0].high_water_mark, 99);
    assert_eq!(responses[0].messages.len(), 1);
    assert_eq!(responses[0].messages[0].value.as_deref(), Some(&b"one"[..]));
    assert_eq!(responses[0].messages[0].partition_id, 0);
    assert_eq!(responses[1].error, ErrorCode::OffsetOutOfRange);
    assert!(responses[1].messages.is_empty());
}

#[test]
fn offset_request_and_response() {
    let request = OffsetRequest::new(
        RequestHeader::new(5, "o"),
        vec![Offset::latest("t", 0), Offset::earliest("t", 1)],
    );
    let bytes = encode(&request);
    let mut r = open_frame(&bytes, 2, 5, "o");
    assert_eq!(r.read_i32().unwrap(), -1);
    assert_eq!(r.read_i32().unwrap(), 1);
    assert_eq!(r.read_string().unwrap().as_deref(), Some("t"));
    assert_eq!(r.read_i32().unwrap(), 2);
    for (partition, time) in [(0, LATEST_TIME), (1, EARLIEST_TIME)] {
        assert_eq!(r.read_i32().unwrap(), partition);
        assert_eq!(r.read_i64().unwrap(), time);
        assert_eq!(r.read_i32().unwrap(), 1);
    }
    assert!(!r.has_data());

    let mut w = BinaryWriter::new();
    w.put_i32(5);
    w.put_i32(1);
    w.put_string(Some("t")).unwrap();
    w.put_i32(1);
    w.put_i32(0);
    w.put_i16(0);
    w.put_i32(2);
    w.put_i64(120);
    w.put_i64(0);
    let responses = request.decode(w.as_slice()).unwrap();
    assert_eq!(responses.len(), 1);
    assert_eq!(responses[0].offsets, vec![120, 0]);
}

#[test]
fn oversized_commit_metadata_fails_to_encode() {
    let request = OffsetCommitRequest::new(
        RequestHeader::new(9, "oc"),
        "group-1",
        vec![OffsetCommit::new("t", 0, 5).with_metadata("m".repeat(40_000))],
    );
    assert!(matches!(protocol::frame(&request), Err(WireError::Protocol(_))));
}

#[test]
fn offset_commit_request_and_response() {
    let request = OffsetCommitRequest::new(
        RequestHeader::new(8, "oc"),
        "group-1",
        vec![
            OffsetCommit::new("t", 0, 10).with_metadata("m"),
            OffsetCommit::new("u", 4, 20),
        ],
    );
    let bytes = encode(&request);
    let mut r = open_frame(&bytes, 8, 8, "oc");
    assert_eq!(r.read_string().unwrap().as_deref(), Some("group-1"));
    assert_eq!(r.read_i32().unwrap(), 2);
    for (topic, partition, offset, metadata) in [("t", 0, 10i64, Some("m")), ("u", 4, 20, None)] {
        assert_eq!(r.read_string().unwrap().as_deref(), Some(topic));
        assert_eq!(r.read_i32().unwrap(), 1);
        assert_eq!(r.read_i32().unwrap(), partition);
        assert_eq!(r.read_i64().unwrap(), offset);
        assert_eq!(r.read_i64().unwrap(), -1);
        assert_eq!(r.read_string().unwrap().as_deref(), metadata);
    }
    assert!(!r.has_data());

    let mut w = BinaryWriter::new();
    w.put_i32(8);
    w.put_i32(1);
    w.put_string(Some("t")).unwrap();
    w.put_i32(1);
    w.put_i32(0);
    w.put_i16(12);
    let responses = request.decode(w.as_slice()).unwrap();
    assert_eq!(responses[0].topic, "t");
    assert_eq!(responses[0].error, ErrorCode::OffsetMetadataTooLarge);
}

#[test]
fn offset_fetch_request_and_response() {
    let request = OffsetFetchRequest::new(
        RequestHeader::new(9, "of"),
        "group-1",
        vec![OffsetFetch::new("t", 0), OffsetFetch::new("t", 3)],
    );
    let bytes = encode(&request);
    let mut r = open_frame(&bytes, 9, 9, "of");
    assert_eq!(r.read_string().unwrap().as_deref(), Some("group-1"));
    assert_eq!(r.read_i32().unwrap(), 1);
    assert_eq!(r.read_string().unwrap().as_deref(), Some("t"));
    assert_eq!(r.read_i32().unwrap(), 2);
    assert_eq!(r.read_i32().unwrap(), 0);
    assert_eq!(r.read_i32().unwrap(), 3);
    assert!(!r.has_data());

    let mut w = BinaryWriter::new();
    w.put_i32(9);
    w.put_i32(1);
    w.put_string(Some("t")).unwrap();
    w.put_i32(2);
    w.put_i32(0);
    w.put_i64(41);
    w.put_string(Some("meta")).unwrap();
    w.put_i16(0);
    w.put_i32(3);
    w.put_i64(-1);
    w.put_string(None).unwrap();
    w.put_i16(3);
    let responses = request.decode(w.as_slice()).unwrap();
    assert_eq!(responses.len(), 2);
    assert_eq!(responses[0].position(), OffsetPosition::new(0, 41));
    assert_eq!(responses[0].metadata.as_deref(), Some("meta"));
    assert_eq!(responses[1].metadata, None);
    assert_eq!(responses[1].error, ErrorCode::UnknownTopicOrPartition);
}

#[test]
fn consumer_metadata_request_and_response() {
    let request = ConsumerMetadataRequest::new(RequestHeader::new(10, "cm"), "group-1");
    let bytes = encode(&request);
    let mut r = open_frame(&bytes, 10, 10, "cm");
    assert_eq!(r.read_string().unwrap().as_deref(), Some("group-1"));
    assert!(!r.has_data());

    let mut w = BinaryWriter::new();
    w.put_i32(10);
    w.put_i16(0);
    w.put_i32(3);
    w.put_string(Some("coord")).unwrap();
    w.put_i32(9094);
    let responses = request.decode(w.as_slice()).unwrap();
    assert_eq!(responses.len(), 1);
    assert_eq!(responses[0].coordinator().address(), "coord:9094");
    assert!(responses[0].error.is_ok());
}

#[test]
fn correlation_id_is_peeked_from_response_body() {
    assert_eq!(correlation_id_of(&[0, 0, 1, 2, 9, 9]).unwrap(), 258);
    assert!(correlation_id_of(&[0, 1]).is_err());
}

#[test]
fn truncated_response_is_an_error() {
    let mut w = BinaryWriter::new();
    w.put_i32(1);
    w.put_i32(1);
    w.put_string(Some("t")).unwrap();
    w.put_i32(1);
    w.put_i32(0);
    let err = ProduceRequest::default().decode(w.as_slice()).unwrap_err();
    assert!(matches!(err, WireError::Truncated { .. }));
}

#[test]
fn error_codes_map_both_ways() {
    for code in [-1i16, 0, 1, 5, 14, 16] {
        assert_eq!(ErrorCode::from(code).code(), code);
    }
    assert_eq!(ErrorCode::from(13), ErrorCode::Unrecognized(13));
    assert_eq!(OffsetPosition::new(2, 9).to_string(), "PartitionId:2, Offset:9");
}
