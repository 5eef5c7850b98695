use serde::de::Error;
use serde::{Deserialize, Serialize};

/// Engine configuration
///
/// Serializable so it can be loaded from JSON or TOML alongside the host's
/// own settings.
///
/// # Example
///
/// ```rust
/// use seqset::Config;
///
/// let config = Config::default();
/// assert_eq!(config.alignment, 8);
///
/// let json = r#"{ "alignment": 16, "crossings": false }"#;
/// let config = Config::from_json(json).unwrap();
/// assert!(config.normalize);
/// assert!(!config.crossings);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Byte boundary every packed sequence and the trailing box are padded to.
    /// Must be a power of two between 1 and 64.
    #[serde(default = "Config::default_alignment")]
    pub alignment: usize,

    /// Merge adjacent value-continuous sequences when building sets
    #[serde(default = "Config::default_normalize")]
    pub normalize: bool,

    /// Insert crossing / turning-point instants when synchronizing linear values
    #[serde(default = "Config::default_crossings")]
    pub crossings: bool,
}

impl Config {
    const fn default_alignment() -> usize {
        8
    }

    const fn default_normalize() -> bool {
        true
    }

    const fn default_crossings() -> bool {
        true
    }

    pub fn with_alignment(mut self, alignment: usize) -> Self {
        self.alignment = alignment;
        self
    }

    pub fn with_normalize(mut self, normalize: bool) -> Self {
        self.normalize = normalize;
        self
    }

    pub fn with_crossings(mut self, crossings: bool) -> Self {
        self.crossings = crossings;
        self
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<(), String> {
        if !self.alignment.is_power_of_two() || self.alignment > 64 {
            return Err(format!(
                "Alignment must be a power of two between 1 and 64, got {}",
                self.alignment
            ));
        }
        Ok(())
    }

    /// Load configuration from JSON string
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        let config: Config = serde_json::from_str(json)?;
        if let Err(e) = config.validate() {
            return Err(Error::custom(e));
        }
        Ok(config)
    }

    /// Save configuration as JSON string
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Load configuration from TOML string (requires toml feature)
    #[cfg(feature = "toml")]
    pub fn from_toml(toml_str: &str) -> Result<Self, toml::de::Error> {
        let config: Config = toml::from_str(toml_str)?;
        if let Err(e) = config.validate() {
            return Err(toml::de::Error::custom(e));
        }
        Ok(config)
    }

    /// Save configuration as TOML string (requires toml feature)
    #[cfg(feature = "toml")]
    pub fn to_toml(&self) -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            alignment: Self::default_alignment(),
            normalize: Self::default_normalize(),
            crossings: Self::default_crossings(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_from_empty_json() {
        let config = Config::from_json("{}").unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_rejects_bad_alignment() {
        assert!(Config::default().with_alignment(12).validate().is_err());
        assert!(Config::default().with_alignment(128).validate().is_err());
        assert!(Config::from_json(r#"{ "alignment": 3 }"#).is_err());
        assert!(Config::default().with_alignment(1).validate().is_ok());
    }

    #[test]
    fn test_json_round_trip() {
        let config = Config::default().with_normalize(false).with_alignment(16);
        let json = config.to_json().unwrap();
        assert_eq!(Config::from_json(&json).unwrap(), config);
    }

    #[cfg(feature = "toml")]
    #[test]
    fn test_toml_round_trip() {
        let config = Config::default().with_crossings(false);
        let text = config.to_toml().unwrap();
        assert_eq!(Config::from_toml(&text).unwrap(), config);
    }
}
