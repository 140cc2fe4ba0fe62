#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

mod common;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;

use remguard_core::error::{GuardError, Result};
use remguard_core::{HostObject, PrimitiveKind, RejectReason, Table, Value};
use remguard_gateway::filter::{Filters, TextFilter};
use remguard_gateway::policy::{
    validate_number, Bounds, EndpointOptions, PolicySet, ValueValidator,
};

fn policy(opts: EndpointOptions) -> PolicySet {
    PolicySet::from_options(opts).unwrap()
}

#[test]
fn invalid_numbers_blocked_only_when_enabled() {
    let strict = policy(EndpointOptions { block_invalid_numbers: Some(true), ..Default::default() });
    for n in [f64::NAN, f64::INFINITY, f64::NEG_INFINITY] {
        assert_eq!(validate_number(n, &strict), Err(RejectReason::InvalidNumber));
    }
    for n in [0.0, -3.5, 1e300, f64::MIN_POSITIVE] {
        assert_eq!(validate_number(n, &strict), Ok(()));
    }

    let lax = policy(EndpointOptions::default());
    assert_eq!(validate_number(f64::NAN, &lax), Ok(()));
    assert_eq!(validate_number(f64::INFINITY, &lax), Ok(()));
}

#[test]
fn range_boundaries_are_inclusive() {
    let p = policy(EndpointOptions {
        num_range: Some(Bounds::new(0.0, 100.0)),
        ..Default::default()
    });
    assert_eq!(validate_number(0.0, &p), Ok(()));
    assert_eq!(validate_number(100.0, &p), Ok(()));
    assert_eq!(validate_number(-0.001, &p), Err(RejectReason::OutOfRange));
    assert_eq!(validate_number(100.001, &p), Err(RejectReason::OutOfRange));
    // NaN is never inside a range.
    assert_eq!(validate_number(f64::NAN, &p), Err(RejectReason::OutOfRange));
}

#[test]
fn sign_flags() {
    let no_neg = policy(EndpointOptions { allow_negatives: Some(false), ..Default::default() });
    assert_eq!(validate_number(-1.0, &no_neg), Err(RejectReason::SignNotAllowed));
    assert_eq!(validate_number(0.0, &no_neg), Ok(()));
    assert_eq!(validate_number(1.0, &no_neg), Ok(()));

    let no_pos = policy(EndpointOptions { allow_positives: Some(false), ..Default::default() });
    assert_eq!(validate_number(1.0, &no_pos), Err(RejectReason::SignNotAllowed));
    assert_eq!(validate_number(0.0, &no_pos), Ok(()));
    assert_eq!(validate_number(-1.0, &no_pos), Ok(()));
}

#[test]
fn both_sign_flags_false_normalize_to_true() {
    let p = policy(EndpointOptions {
        allow_negatives: Some(false),
        allow_positives: Some(false),
        ..Default::default()
    });
    assert!(p.allow_negatives);
    assert!(p.allow_positives);
    assert_eq!(validate_number(-5.0, &p), Ok(()));
}

#[test]
fn contradictory_options_are_config_errors() {
    let inverted = PolicySet::from_options(EndpointOptions {
        num_range: Some(Bounds::new(5.0, 1.0)),
        ..Default::default()
    });
    assert!(matches!(inverted, Err(GuardError::Config(_))));

    let inverted_len = PolicySet::from_options(EndpointOptions {
        str_range: Some(Bounds::new(10, 2)),
        ..Default::default()
    });
    assert!(matches!(inverted_len, Err(GuardError::Config(_))));

    let negative_cooldown = PolicySet::from_options(EndpointOptions {
        cooldown: Some(-1.0),
        ..Default::default()
    });
    assert!(matches!(negative_cooldown, Err(GuardError::Config(_))));

    let nan_bound = PolicySet::from_options(EndpointOptions {
        num_range: Some(Bounds::new(f64::NAN, 1.0)),
        ..Default::default()
    });
    assert!(matches!(nan_bound, Err(GuardError::Config(_))));
}

#[tokio::test]
async fn string_length_range() {
    let p = policy(EndpointOptions { str_range: Some(Bounds::new(1, 4)), ..Default::default() });
    let filters = Filters::none();
    let v = ValueValidator::new(&p, &filters);
    assert_eq!(v.validate_string("a").await, Ok(()));
    assert_eq!(v.validate_string("abcd").await, Ok(()));
    assert_eq!(v.validate_string("").await, Err(RejectReason::LengthOutOfRange));
    assert_eq!(v.validate_string("abcde").await, Err(RejectReason::LengthOutOfRange));
}

#[tokio::test]
async fn content_filter_flags_and_fails_closed() {
    let p = policy(EndpointOptions { filtering_strings: Some(true), ..Default::default() });
    let filters = common::filters();
    let v = ValueValidator::new(&p, &filters);
    assert_eq!(v.validate_string("hello there").await, Ok(()));
    assert_eq!(
        v.validate_string("you BadWord you").await,
        Err(RejectReason::ContentRejected)
    );

    struct Broken;
    #[async_trait]
    impl TextFilter for Broken {
        async fn filter_text(&self, _s: &str) -> Result<String> {
            Err(GuardError::Filter("service down".into()))
        }
    }
    let broken = Filters::none().with_text_filter(Arc::new(Broken), Duration::from_millis(50));
    let v = ValueValidator::new(&p, &broken);
    assert_eq!(v.validate_string("hello").await, Err(RejectReason::ContentRejected));

    struct Slow;
    #[async_trait]
    impl TextFilter for Slow {
        async fn filter_text(&self, s: &str) -> Result<String> {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok(s.to_string())
        }
    }
    let slow = Filters::none().with_text_filter(Arc::new(Slow), Duration::from_millis(20));
    let v = ValueValidator::new(&p, &slow);
    assert_eq!(v.validate_string("hello").await, Err(RejectReason::ContentRejected));
}

#[tokio::test]
async fn allowed_types_and_host_tags() {
    let p = policy(EndpointOptions {
        allowed_types: Some(vec![PrimitiveKind::Number, PrimitiveKind::Other]),
        allowed_types_of: Some(vec!["number".into(), "Vector3".into()]),
        ..Default::default()
    });
    let filters = Filters::none();
    let v = ValueValidator::new(&p, &filters);

    let vec3 = Value::Host(HostObject::new("Vector3", serde_json::json!({"x": 0})));
    let cframe = Value::Host(HostObject::new("CFrame", serde_json::Value::Null));

    assert_eq!(v.validate_value(&Value::from(3.0)).await, Ok(()));
    assert_eq!(v.validate_value(&vec3).await, Ok(()));
    assert_eq!(v.validate_value(&cframe).await, Err(RejectReason::TypeNotAllowed));
    assert_eq!(v.validate_value(&Value::from("s")).await, Err(RejectReason::TypeNotAllowed));
    assert_eq!(
        v.validate_value(&Value::from(Table::new())).await,
        Err(RejectReason::TypeNotAllowed)
    );
}

#[tokio::test]
async fn type_check_runs_before_leaf_checks() {
    let p = policy(EndpointOptions {
        allowed_types: Some(vec![PrimitiveKind::String]),
        num_range: Some(Bounds::new(0.0, 1.0)),
        ..Default::default()
    });
    let filters = Filters::none();
    let v = ValueValidator::new(&p, &filters);
    assert_eq!(v.validate_value(&Value::from(50.0)).await, Err(RejectReason::TypeNotAllowed));
}

#[tokio::test]
async fn buffer_size_limit() {
    let p = policy(EndpointOptions { buffer_size_limit: Some(1024), ..Default::default() });
    let filters = common::filters();
    let v = ValueValidator::new(&p, &filters);

    let mut small = 512u32.to_le_bytes().to_vec();
    small.extend_from_slice(b"payload");
    assert_eq!(v.validate_value(&Value::Buffer(Bytes::from(small))).await, Ok(()));

    let mut bomb = (64 * 1024 * 1024u32).to_le_bytes().to_vec();
    bomb.extend_from_slice(b"tiny");
    assert_eq!(
        v.validate_value(&Value::Buffer(Bytes::from(bomb))).await,
        Err(RejectReason::BufferRejected)
    );

    // Size lookup fails: no header.
    assert_eq!(
        v.validate_value(&Value::Buffer(Bytes::from_static(b"ab"))).await,
        Err(RejectReason::BufferRejected)
    );

    // Raw length alone already over the limit.
    let mut raw = 16u32.to_le_bytes().to_vec();
    raw.resize(2048, 0);
    assert_eq!(
        v.validate_value(&Value::Buffer(Bytes::from(raw))).await,
        Err(RejectReason::BufferRejected)
    );
}
