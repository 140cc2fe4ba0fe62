#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

use std::time::Duration;

use remguard_gateway::app_state::AppState;
use remguard_gateway::config;
use remguard_gateway::dispatch::{EndpointKind, ViolationMode};
use remguard_gateway::policy::PolicySet;

#[test]
fn deny_unknown_fields_nested() {
    let bad = r#"
version: 1
gateway:
  listen: "0.0.0.0:8080"
endpoints:
  - name: "fire"
    kind: event
    handler: sink
    optionz: { CoolDown: 1 } # typo should fail
"#;

    let err = config::load_from_str(bad).expect_err("must fail");
    assert_eq!(err.client_code().as_str(), "BAD_REQUEST");
}

#[test]
fn ok_minimal_config() {
    let ok = r#"
version: 1
endpoints:
  - name: "fire"
    kind: event
    handler: sink
"#;
    let cfg = config::load_from_str(ok).expect("must parse");
    assert_eq!(cfg.version, 1);
    assert_eq!(cfg.endpoints[0].name, "fire");
    assert_eq!(cfg.endpoints[0].kind, EndpointKind::Event);
    assert_eq!(cfg.gateway.max_inflight_calls, 64);
}

#[test]
fn unknown_option_keys_are_ignored() {
    let ok = r#"
version: 1
endpoints:
  - name: "fire"
    kind: function
    handler: echo
    options:
      NumRange: { min: 0, max: 100 }
      CoolDown: 0.25
      Handling: Kick
      KickMsg: "bye"
      SomeFutureOption: true
"#;
    let cfg = config::load_from_str(ok).expect("must parse");
    let policy = PolicySet::from_options(cfg.endpoints[0].options.clone()).unwrap();
    assert_eq!(policy.numeric_range.unwrap().max, 100.0);
    assert_eq!(policy.cooldown, Some(Duration::from_millis(250)));
    assert_eq!(policy.violation_mode, ViolationMode::Kick);
    assert_eq!(policy.kick_message, "bye");
}

#[test]
fn duplicate_endpoint_names_fail() {
    let bad = r#"
version: 1
endpoints:
  - { name: "a", kind: event, handler: sink }
  - { name: "a", kind: function, handler: echo }
"#;
    assert!(config::load_from_str(bad).is_err());
}

#[test]
fn empty_endpoints_fail() {
    assert!(config::load_from_str("version: 1\n").is_err());
}

#[test]
fn unknown_primitive_kind_fails() {
    let bad = r#"
version: 1
endpoints:
  - name: "a"
    kind: event
    handler: sink
    options: { AllowedTypes: ["number", "vector"] }
"#;
    assert!(config::load_from_str(bad).is_err());
}

#[test]
fn inverted_range_fails_at_startup() {
    let cfg = config::load_from_str(
        r#"
version: 1
endpoints:
  - name: "a"
    kind: event
    handler: sink
    options: { NumRange: { min: 10, max: 1 } }
"#,
    )
    .unwrap();
    let err = AppState::new(cfg).err().expect("must fail");
    assert_eq!(err.client_code().as_str(), "CONFIG_INVALID");
}

#[test]
fn unknown_handler_fails_at_startup() {
    let cfg = config::load_from_str(
        r#"
version: 1
endpoints:
  - { name: "a", kind: event, handler: nope }
"#,
    )
    .unwrap();
    assert!(AppState::new(cfg).is_err());
}

#[test]
fn app_state_registers_endpoints() {
    let cfg = config::load_from_str(
        r#"
version: 1
endpoints:
  - { name: "a", kind: event, handler: sink }
  - { name: "b", kind: function, handler: echo, options: { FilteringStrings: true, BufferSizeLimit: 64 } }
"#,
    )
    .unwrap();
    let state = AppState::new(cfg).unwrap();
    let d = state.dispatcher();
    assert!(d.endpoint("a").is_some());
    assert!(d.endpoint("b").is_some());
    assert!(state.disconnect_endpoint("a"));
    assert!(d.endpoint("a").is_none());
    assert!(!state.disconnect_endpoint("a"));
}
