//! Integration tests for a consumer and an editor sharing one params file.

mod common;

use common::TestEnv;
use opparams::{ParamStore, Refresh, Schema, StoreConfig};
use serde_json::json;
use std::time::Duration;

fn config(env: &TestEnv, refresh_interval: Duration) -> StoreConfig {
    StoreConfig {
        refresh_interval,
        retry_delay: Duration::from_millis(1),
        ..StoreConfig::at(env.params_path())
    }
}

#[test]
fn test_live_key_sees_edit_after_interval() {
    let env = TestEnv::new();
    let mut consumer = ParamStore::open(Schema::builtin(), config(&env, Duration::from_millis(50)));
    let mut editor = ParamStore::open(Schema::builtin(), config(&env, Duration::from_millis(50)));

    editor.put("camera_offset", 0.12);

    // still inside the interval
    assert_eq!(consumer.get_f64("camera_offset"), Some(0.06));

    std::thread::sleep(Duration::from_millis(60));
    assert_eq!(consumer.get_f64("camera_offset"), Some(0.12));
}

#[test]
fn test_non_live_key_needs_force() {
    let env = TestEnv::new();
    let mut consumer = ParamStore::open(Schema::builtin(), config(&env, Duration::ZERO));
    let mut editor = ParamStore::open(Schema::builtin(), config(&env, Duration::ZERO));

    editor.put("non_live_param", true);

    assert_eq!(consumer.get_bool("non_live_param"), Some(false));
    assert_eq!(
        consumer.get_with("non_live_param", Refresh::Force),
        Some(json!(true))
    );
}

#[test]
fn test_editor_opedit_and_library_consumer() {
    let env = TestEnv::new();
    let mut consumer = ParamStore::open(Schema::builtin(), config(&env, Duration::ZERO));

    env.opedit()
        .args(["set", "camera_offset", "0.3"])
        .assert()
        .success();

    assert_eq!(consumer.get_f64("camera_offset"), Some(0.3));
    assert_eq!(consumer.stats().reads, 1);
}

#[test]
fn test_delete_propagates_on_forced_refresh() {
    let env = TestEnv::new();
    let mut consumer = ParamStore::open(Schema::builtin(), config(&env, Duration::ZERO));
    let mut editor = ParamStore::open(Schema::builtin(), config(&env, Duration::ZERO));

    editor.put("custom", "x");
    assert_eq!(consumer.get_with("custom", Refresh::Force), Some(json!("x")));

    assert!(editor.delete("custom"));
    assert_eq!(consumer.get_with("custom", Refresh::Force), None);
}
