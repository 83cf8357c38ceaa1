use serde::{Deserialize, Serialize};

use crate::error::ReconError;

pub const DEFAULT_LOCALE: &str = "en-US";
pub const DEFAULT_GROUP_DIR: &str = "productOfferingGroup";
pub const DEFAULT_CATEGORY_DIR: &str = "productOfferingCategory";

/// Engine settings shared by every operation.
///
/// ```toml
/// locale = "ru-RU"
/// group_dir = "productOfferingGroup"
/// category_dir = "productOfferingCategory"
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EngineConfig {
    /// Locale stamped on every localized value the builders create.
    pub locale: String,
    /// Archive directory holding bundle documents.
    pub group_dir: String,
    /// Archive directory holding category documents.
    pub category_dir: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            locale: DEFAULT_LOCALE.into(),
            group_dir: DEFAULT_GROUP_DIR.into(),
            category_dir: DEFAULT_CATEGORY_DIR.into(),
        }
    }
}

impl EngineConfig {
    pub fn from_toml(input: &str) -> Result<Self, ReconError> {
        let config: EngineConfig =
            toml::from_str(input).map_err(|e| ReconError::ConfigParse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ReconError> {
        if self.locale.trim().is_empty() {
            return Err(ReconError::ConfigValidation("locale must not be empty".into()));
        }

        for (key, dir) in [("group_dir", &self.group_dir), ("category_dir", &self.category_dir)] {
            if dir.trim().is_empty() {
                return Err(ReconError::ConfigValidation(format!("{key} must not be empty")));
            }
            if dir.contains('/') || dir.contains('\\') {
                return Err(ReconError::ConfigValidation(format!(
                    "{key} must be a single directory name, got '{dir}'"
                )));
            }
        }

        Ok(())
    }
}
