//! Property-based tests for configuration module
//!
//! These tests use proptest to generate random configurations and verify
//! validation boundaries and TOML round-trips.

use super::*;
use proptest::prelude::*;

prop_compose! {
    fn valid_strip_config()(
        height in 1u32..512u32,
        namespace in "[a-z][a-z0-9-]{0,15}",
        r in 0.0f32..=1.0f32,
        g in 0.0f32..=1.0f32,
        b in 0.0f32..=1.0f32,
        a in 0.0f32..=1.0f32,
    ) -> StripConfig {
        StripConfig {
            height,
            namespace,
            background: [r, g, b, a],
        }
    }
}

prop_compose! {
    fn valid_layout_config()(
        margin in 0i32..64i32,
        padding in 0i32..64i32,
    ) -> LayoutConfig {
        LayoutConfig { margin, padding }
    }
}

prop_compose! {
    fn valid_panel_config()(
        panel in valid_strip_config(),
        layout in valid_layout_config(),
        size in 1u32..128u32,
        commands in prop::collection::vec("[a-z]{1,10}", 0..4),
    ) -> PanelConfig {
        PanelConfig {
            panel,
            layout,
            cursor: CursorConfig { size, ..CursorConfig::default() },
            plugins: PluginsConfig { commands },
        }
    }
}

proptest! {
    #[test]
    fn prop_generated_configs_validate(config in valid_panel_config()) {
        prop_assert!(config.validate().is_ok());
    }

    #[test]
    fn prop_toml_roundtrip_preserves_config(config in valid_panel_config()) {
        let text = toml::to_string(&config).unwrap();
        let parsed: PanelConfig = toml::from_str(&text).unwrap();
        prop_assert_eq!(parsed, config);
    }

    #[test]
    fn prop_negative_spacing_is_rejected(
        margin in -100i32..0i32,
        padding in 0i32..64i32,
        swap in any::<bool>(),
    ) {
        let mut config = PanelConfig::default();
        if swap {
            config.layout = LayoutConfig { margin: padding, padding: margin };
        } else {
            config.layout = LayoutConfig { margin, padding };
        }
        prop_assert!(config.validate().is_err());
    }
}
