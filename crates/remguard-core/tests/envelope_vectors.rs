//! Call lane envelope and value mapping tests.

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

use std::time::{Duration, Instant};

use remguard_core::protocol::convert::{value_from_json, value_to_json, MAX_CONTAINER_ENTRIES};
use remguard_core::protocol::envelope::{reply_ok_json, reply_rejected_json, CallEnvelope};
use remguard_core::{PrimitiveKind, RejectReason, Table, Value};
use serde_json::json;

#[test]
fn parse_envelope_min() {
    let env = CallEnvelope::parse(r#"{"v":1,"endpoint":"ping"}"#).unwrap();
    assert_eq!(env.endpoint, "ping");
    assert!(env.id.is_none());
    assert!(env.decode_args().unwrap().is_empty());
}

#[test]
fn parse_envelope_full() {
    let env = CallEnvelope::parse(
        r#"{"v":1,"endpoint":"fire","id":9,"args":[150,"ok",{"$type":"Vector3","x":1,"y":2,"z":3}]}"#,
    )
    .unwrap();
    assert_eq!(env.id, Some(9));
    let args = env.decode_args().unwrap();
    assert_eq!(args.len(), 3);
    assert_eq!(args[0], Value::Number(150.0));
    assert_eq!(args[1], Value::from("ok"));
    assert_eq!(args[2].type_tag(), "Vector3");
    assert_eq!(args[2].kind(), PrimitiveKind::Other);
}

#[test]
fn unknown_envelope_fields_are_rejected() {
    let err = CallEnvelope::parse(r#"{"v":1,"endpoint":"x","extra":true}"#).unwrap_err();
    assert_eq!(err.client_code().as_str(), "BAD_REQUEST");
}

#[test]
fn wrong_version_is_rejected() {
    assert!(CallEnvelope::parse(r#"{"v":2,"endpoint":"x"}"#).is_err());
}

#[test]
fn args_must_be_an_array() {
    let env = CallEnvelope::parse(r#"{"v":1,"endpoint":"x","args":{"a":1}}"#).unwrap();
    assert!(env.decode_args().is_err());
}

#[test]
fn buffer_objects_decode_from_base64() {
    let v = value_from_json(json!({"$type": "buffer", "data": "aGVsbG8="})).unwrap();
    match v {
        Value::Buffer(b) => assert_eq!(&b[..], b"hello"),
        other => panic!("expected buffer, got {other:?}"),
    }
    assert!(value_from_json(json!({"$type": "buffer", "data": "!!"})).is_err());
}

#[test]
fn arrays_become_one_based_tables() {
    let v = value_from_json(json!([10, [20]])).unwrap();
    let t = v.as_table().unwrap();
    assert_eq!(t.get(&Value::from(1.0)), Some(Value::Number(10.0)));
    let nested = t.get(&Value::from(2.0)).unwrap();
    assert!(nested.is_table());
}

#[test]
fn cyclic_tables_are_not_encoded() {
    let t = Table::new();
    t.set("me", t.clone());
    assert!(value_to_json(&Value::from(t)).is_err());
}

#[test]
fn shared_subtables_encode_twice() {
    let shared = Table::from_list([Value::from(1.0)]);
    let root = Table::new();
    root.set("a", shared.clone());
    root.set("b", shared);
    let out = value_to_json(&Value::from(root)).unwrap();
    assert_eq!(out, json!({"a": [1.0], "b": [1.0]}));
}

#[test]
fn reply_frames() {
    let ok = reply_ok_json(3, &[Value::from("hi")]).unwrap();
    let parsed: serde_json::Value = serde_json::from_str(&ok).unwrap();
    assert_eq!(parsed["ok"], json!(true));
    assert_eq!(parsed["values"], json!(["hi"]));

    let rejected: serde_json::Value =
        serde_json::from_str(&reply_rejected_json(4, RejectReason::Throttled)).unwrap();
    assert_eq!(rejected["ok"], json!(false));
    assert_eq!(rejected["reason"], json!("THROTTLED"));
}

fn wide_object(n: usize) -> String {
    let fields: Vec<String> = (0..n).map(|i| format!("\"k{i}\":{i}")).collect();
    format!("{{{}}}", fields.join(","))
}

#[test]
fn containers_at_the_entry_limit_decode() {
    let frame = format!(
        r#"{{"v":1,"endpoint":"x","args":[{}]}}"#,
        wide_object(MAX_CONTAINER_ENTRIES)
    );
    let args = CallEnvelope::parse(&frame).unwrap().decode_args().unwrap();
    let t = args[0].as_table().unwrap();
    assert_eq!(t.len(), MAX_CONTAINER_ENTRIES);
    assert_eq!(t.get(&Value::from("k7")), Some(Value::Number(7.0)));
}

#[test]
fn oversized_containers_are_refused() {
    let object = format!(
        r#"{{"v":1,"endpoint":"x","args":[{}]}}"#,
        wide_object(MAX_CONTAINER_ENTRIES + 1)
    );
    let err = CallEnvelope::parse(&object).unwrap().decode_args().unwrap_err();
    assert_eq!(err.client_code().as_str(), "BAD_REQUEST");

    let list = vec![0; MAX_CONTAINER_ENTRIES + 1];
    assert!(value_from_json(json!(list)).is_err());
}

#[test]
fn many_wide_objects_decode_in_linear_time() {
    // 256 objects at the entry limit; a per-insert key search would make
    // this take seconds.
    let objects: Vec<String> = (0..256).map(|_| wide_object(MAX_CONTAINER_ENTRIES)).collect();
    let frame = format!(r#"{{"v":1,"endpoint":"x","args":[{}]}}"#, objects.join(","));
    let env = CallEnvelope::parse(&frame).unwrap();

    let started = Instant::now();
    let args = env.decode_args().unwrap();
    assert_eq!(args.len(), 256);
    assert!(
        started.elapsed() < Duration::from_secs(3),
        "decode took {:?}",
        started.elapsed()
    );
}
