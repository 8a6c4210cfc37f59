use serde::Deserialize;
use serde::Serialize;

/// Chat input configuration, deserialized from the host's config file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComposerConfig {
    /// Exact-match shortcut triggers, e.g. `/blog`. Order is presentation
    /// order in the host's autocomplete popup.
    #[serde(default)]
    pub shortcuts: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn parses_shortcut_list() {
        let config: ComposerConfig = toml::from_str("shortcuts = [\"/blog\", \"/email\"]").unwrap();
        assert_eq!(
            config.shortcuts,
            vec!["/blog".to_string(), "/email".to_string()]
        );
    }

    #[test]
    fn missing_fields_default_to_empty() {
        let config: ComposerConfig = toml::from_str("").unwrap();
        assert_eq!(config, ComposerConfig::default());
    }
}
