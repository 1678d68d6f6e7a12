//! Unit tests for configuration module
//!
//! Tests configuration parsing, validation, and partial files.

use super::*;
use anyhow::Result;
use std::fs;
use tempfile::tempdir;

#[test]
fn test_default_configuration_is_valid() {
    let config = PanelConfig::default();

    assert_eq!(config.panel.height, 40);
    assert_eq!(config.layout.margin, 3);
    assert_eq!(config.layout.padding, 3);
    assert_eq!(config.cursor.size, 24);
    assert_eq!(config.cursor.image, "default");
    assert!(config.cursor.theme.is_none());
    assert!(config.plugins.commands.is_empty());

    assert!(config.validate().is_ok());
}

#[test]
fn test_configuration_from_file() -> Result<()> {
    let dir = tempdir()?;
    let file_path = dir.path().join("ledge.toml");

    let test_config = r#"
[panel]
height = 32
namespace = "bar"
background = [0.0, 0.0, 0.0, 0.5]

[layout]
margin = 4
padding = 8

[cursor]
theme = "Adwaita"
size = 32
image = "left_ptr"

[plugins]
commands = ["clock", "battery --compact"]
"#;
    fs::write(&file_path, test_config)?;

    let config = PanelConfig::load(&file_path)?;

    assert_eq!(config.panel.height, 32);
    assert_eq!(config.panel.namespace, "bar");
    assert_eq!(config.panel.background, [0.0, 0.0, 0.0, 0.5]);
    assert_eq!(config.layout, LayoutConfig { margin: 4, padding: 8 });
    assert_eq!(config.cursor.theme.as_deref(), Some("Adwaita"));
    assert_eq!(config.cursor.size, 32);
    assert_eq!(config.cursor.image, "left_ptr");
    assert_eq!(config.plugins.commands, vec!["clock", "battery --compact"]);

    Ok(())
}

#[test]
fn test_partial_configuration_uses_defaults() -> Result<()> {
    let dir = tempdir()?;
    let file_path = dir.path().join("partial.toml");

    fs::write(&file_path, "[layout]\npadding = 10\n")?;

    let config = PanelConfig::load(&file_path)?;

    assert_eq!(config.layout.padding, 10);
    assert_eq!(config.layout.margin, 3);
    assert_eq!(config.panel, StripConfig::default());
    assert_eq!(config.cursor, CursorConfig::default());

    Ok(())
}

#[test]
fn test_empty_file_is_default() -> Result<()> {
    let dir = tempdir()?;
    let file_path = dir.path().join("empty.toml");
    fs::write(&file_path, "")?;

    assert_eq!(PanelConfig::load(&file_path)?, PanelConfig::default());
    Ok(())
}

#[test]
fn test_missing_file_is_an_error() {
    let dir = tempdir().unwrap();
    let result = PanelConfig::load(dir.path().join("does-not-exist.toml"));
    assert!(result.is_err());
}

#[test]
fn test_malformed_file_is_an_error() -> Result<()> {
    let dir = tempdir()?;
    let file_path = dir.path().join("broken.toml");
    fs::write(&file_path, "[panel\nheight = ")?;

    let err = PanelConfig::load(&file_path).unwrap_err();
    assert!(format!("{:#}", err).contains("Failed to parse config file"));
    Ok(())
}

#[test]
fn test_validation_rejects_zero_height() {
    let mut config = PanelConfig::default();
    config.panel.height = 0;
    assert!(config.validate().is_err());
}

#[test]
fn test_validation_rejects_negative_spacing() {
    let mut config = PanelConfig::default();
    config.layout.margin = -1;
    assert!(config.validate().is_err());

    let mut config = PanelConfig::default();
    config.layout.padding = -5;
    assert!(config.validate().is_err());
}

#[test]
fn test_validation_rejects_bad_cursor_and_colour() {
    let mut config = PanelConfig::default();
    config.cursor.size = 0;
    assert!(config.validate().is_err());

    let mut config = PanelConfig::default();
    config.panel.background = [1.5, 0.0, 0.0, 1.0];
    assert!(config.validate().is_err());

    let mut config = PanelConfig::default();
    config.panel.namespace.clear();
    assert!(config.validate().is_err());
}

#[test]
fn test_invalid_values_in_file_fail_load() -> Result<()> {
    let dir = tempdir()?;
    let file_path = dir.path().join("invalid.toml");
    fs::write(&file_path, "[panel]\nheight = 0\n")?;

    assert!(PanelConfig::load(&file_path).is_err());
    Ok(())
}

#[test]
fn test_save_then_load() -> Result<()> {
    let dir = tempdir()?;
    let file_path = dir.path().join("saved.toml");

    let mut config = PanelConfig::default();
    config.panel.height = 48;
    config.plugins.commands.push("weston-simple-shm".to_string());
    config.save(&file_path)?;

    let loaded = PanelConfig::load(&file_path)?;
    assert_eq!(loaded, config);
    Ok(())
}

#[test]
#[serial_test::serial]
fn test_home_expansion() -> Result<()> {
    let dir = tempdir()?;
    let previous = std::env::var_os("HOME");
    std::env::set_var("HOME", dir.path());

    let expanded = expand_home("~/.config/ledge/ledge.toml");

    match previous {
        Some(home) => std::env::set_var("HOME", home),
        None => std::env::remove_var("HOME"),
    }

    assert_eq!(expanded?, dir.path().join(".config/ledge/ledge.toml"));
    assert_eq!(
        expand_home("/etc/ledge.toml")?,
        PathBuf::from("/etc/ledge.toml")
    );
    Ok(())
}
