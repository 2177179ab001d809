//! Integration tests for automation configuration files.

use std::path::PathBuf;

use smart_clicker::config::AutomationConfig;
use smart_clicker::models::Action;
use smart_clicker::AppError;

fn sample_config() -> AutomationConfig {
    AutomationConfig {
        interval_seconds: 0.25,
        activate_window: false,
        retry_count: 5,
        debug_mode: true,
        loop_actions: false,
        actions: vec![
            Action::ClickText {
                text: "Sign in".to_string(),
                required: true,
            },
            Action::ClickTemplate {
                template_path: PathBuf::from("buttons/ok.png"),
                threshold: 0.9,
                required: false,
            },
            Action::ClickPosition {
                x: -4,
                y: 120,
                required: false,
            },
            Action::TypeText {
                text: "Hello World".to_string(),
                required: true,
            },
            Action::Wait { duration_seconds: 2.5 },
        ],
    }
}

#[test]
fn test_save_and_reload_preserves_everything() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("automation_config.json");

    let config = sample_config();
    config.save(&path).unwrap();
    let loaded = AutomationConfig::load(&path).unwrap();

    assert_eq!(loaded, config);
}

#[test]
fn test_saved_file_uses_external_field_names() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.json");
    sample_config().save(&path).unwrap();

    let json: serde_json::Value = serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
    assert_eq!(json["interval"], 0.25);
    assert_eq!(json["retry_count"], 5);
    assert_eq!(json["actions"][0]["type"], "click_text");
    assert_eq!(json["actions"][1]["template"], "buttons/ok.png");
    assert_eq!(json["actions"][4]["duration"], 2.5);
}

#[test]
fn test_minimal_file_gets_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("minimal.json");
    std::fs::write(
        &path,
        r#"{"actions": [{"type": "click_template", "template": "a.png"}, {"type": "wait"}]}"#,
    )
    .unwrap();

    let config = AutomationConfig::load(&path).unwrap();
    assert_eq!(config.interval_seconds, 1.0);
    assert!(config.activate_window);
    assert_eq!(config.retry_count, 3);
    assert!(!config.debug_mode);
    assert!(config.loop_actions);
    assert_eq!(
        config.actions,
        vec![
            Action::ClickTemplate {
                template_path: PathBuf::from("a.png"),
                threshold: 0.8,
                required: false,
            },
            Action::Wait { duration_seconds: 1.0 },
        ]
    );
}

#[test]
fn test_invalid_files_are_config_errors() {
    let dir = tempfile::tempdir().unwrap();
    let cases = [
        ("unknown_kind.json", r#"{"actions": [{"type": "double_click", "x": 1, "y": 2}]}"#),
        ("empty.json", r#"{"actions": []}"#),
        ("threshold.json", r#"{"actions": [{"type": "click_template", "template": "a.png", "threshold": 1.5}]}"#),
        ("retries.json", r#"{"retry_count": 0, "actions": [{"type": "wait"}]}"#),
        ("not_json.json", "interval = 1"),
    ];

    for (name, contents) in cases {
        let path = dir.path().join(name);
        std::fs::write(&path, contents).unwrap();
        let err = AutomationConfig::load(&path).unwrap_err();
        assert!(matches!(err, AppError::ConfigError(_)), "{}: {:?}", name, err);
    }

    let err = AutomationConfig::load(&dir.path().join("missing.json")).unwrap_err();
    assert!(matches!(err, AppError::ConfigError(_)));
}
