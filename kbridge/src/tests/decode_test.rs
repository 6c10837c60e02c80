use super::*;
use crate::decode::{DecodePipeline, Decoded};

#[fixture]
fn pipeline() -> DecodePipeline<TaggedCodec> {
    DecodePipeline::new(Arc::new(TaggedCodec))
}

#[rstest]
#[tokio::test]
async fn absent_bytes_resolve_to_empty(pipeline: DecodePipeline<TaggedCodec>) {
    let decoded = pipeline.resolve(None).await;

    assert_eq!(decoded, Decoded::Empty);
    assert_eq!(decoded.into_string(), "");
}

#[rstest]
#[tokio::test]
async fn schema_miss_falls_back_to_raw_text(pipeline: DecodePipeline<TaggedCodec>) {
    let decoded = pipeline.resolve(Some(br#"{"id":1}"#.as_slice())).await;

    assert_eq!(decoded, Decoded::Raw(r#"{"id":1}"#.to_owned()));
}

#[rstest]
#[tokio::test]
async fn schema_hit_wins_over_raw_text(pipeline: DecodePipeline<TaggedCodec>) {
    let decoded = pipeline.resolve(Some(b"\0order".as_slice())).await;

    assert_eq!(decoded, Decoded::Schema("ORDER".to_owned()));
}

#[rstest]
#[tokio::test]
async fn empty_schema_result_counts_as_miss(pipeline: DecodePipeline<TaggedCodec>) {
    let decoded = pipeline.resolve(Some(b"\0".as_slice())).await;

    assert_eq!(decoded, Decoded::Raw("\0".to_owned()));
}

#[rstest]
#[case::empty(b"".as_slice(), "")]
#[case::text(b"hello".as_slice(), "hello")]
#[case::invalid_utf8(b"a\xffb".as_slice(), "a\u{fffd}b")]
#[tokio::test]
async fn raw_text_is_lossy_utf8(
    pipeline: DecodePipeline<TaggedCodec>,
    #[case] bytes: &[u8],
    #[case] expected: &str,
) {
    assert_eq!(pipeline.text(Some(bytes)).await, expected);
}

#[rstest]
#[tokio::test]
async fn capture_applies_fallback_to_every_field(pipeline: DecodePipeline<TaggedCodec>) {
    let raw = RawRecord {
        topic: "orders".to_owned(),
        partition: 2,
        offset: 7,
        timestamp: Some(1_700_000_000_000),
        key: None,
        payload: Some(b"\0paid".to_vec()),
        headers: vec![
            ("trace".to_owned(), Some(b"abc".to_vec())),
            ("schema".to_owned(), Some(b"\0v1".to_vec())),
            ("empty".to_owned(), None),
        ],
    };

    let msg = CapturedMessage::capture(raw, &pipeline).await;

    assert_eq!(msg.key, None);
    assert_eq!(msg.value, "PAID");
    assert_eq!(msg.headers["trace"], "abc");
    assert_eq!(msg.headers["schema"], "V1");
    assert_eq!(msg.headers["empty"], "");
    assert_eq!((msg.partition, msg.offset), (2, 7));
    assert_eq!(msg.timestamp, Some(1_700_000_000_000));
}

#[rstest]
#[tokio::test]
async fn present_key_is_decoded(pipeline: DecodePipeline<TaggedCodec>) {
    let raw = RawRecord {
        key: Some(b"order-1".to_vec()),
        ..Default::default()
    };

    let msg = CapturedMessage::capture(raw, &pipeline).await;

    assert_eq!(msg.key.as_deref(), Some("order-1"));
    assert_eq!(msg.value, "");
}

#[test]
fn null_key_serializes_as_null() {
    let msg = CapturedMessage {
        key: None,
        value: r#"{"id":1}"#.to_owned(),
        headers: Default::default(),
        topic: "orders".to_owned(),
        partition: 0,
        offset: 0,
        timestamp: None,
    };

    let json = serde_json::to_value(&msg).unwrap();

    assert!(json["key"].is_null());
    assert_eq!(json["value"], r#"{"id":1}"#);
}
