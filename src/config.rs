//! Toolkit configuration, loadable from TOML.
//!
//! ```toml
//! default_language = "en"
//! padding_table_id = 0x49
//! language_table_alignment = 0x200
//!
//! [languages]
//! en = 0x44
//! fr = 0x45
//! es = 0x48
//! ```

use std::fs;
use std::path::Path;

use indexmap::IndexMap;
use serde::Deserialize;

use crate::error::ScriptError;

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct ScriptConfig {
    /// Language name -> text table id, in output order.
    pub languages: IndexMap<String, u8>,
    /// Language used when a per-language entry omits one.
    pub default_language: String,
    /// Table id reserved for the alignment filler.
    pub padding_table_id: u8,
    /// Serialized language tables are padded to a multiple of this.
    pub language_table_alignment: usize,
    /// Result slot the textbox commands write to unless told otherwise.
    pub default_result_variable: u16,
}

impl Default for ScriptConfig {
    fn default() -> Self {
        let mut languages = IndexMap::new();
        languages.insert("en".to_string(), 0x44);
        languages.insert("fr".to_string(), 0x45);
        // 0x46 and 0x47 are not known to hold dialogue.
        languages.insert("es".to_string(), 0x48);

        ScriptConfig {
            languages,
            default_language: "en".to_string(),
            padding_table_id: 0x49,
            language_table_alignment: 0x200,
            default_result_variable: 0x1000,
        }
    }
}

impl ScriptConfig {
    pub fn from_toml_str(source: &str) -> Result<Self, ScriptError> {
        let config: ScriptConfig = toml::from_str(source)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self, ScriptError> {
        let source = fs::read_to_string(path)
            .map_err(|err| ScriptError::Config(format!("{}: {}", path.display(), err)))?;
        Self::from_toml_str(&source)
    }

    /// Reject settings no language table can be built with.
    pub fn validate(&self) -> Result<(), ScriptError> {
        if self.languages.is_empty() {
            return Err(ScriptError::Config(
                "at least one language must be configured".to_string(),
            ));
        }
        if !self.languages.contains_key(&self.default_language) {
            return Err(ScriptError::Config(format!(
                "default language '{}' is not one of the configured languages",
                self.default_language
            )));
        }
        if self.language_table_alignment == 0 {
            return Err(ScriptError::Config(
                "language_table_alignment must be positive".to_string(),
            ));
        }
        if self
            .languages
            .values()
            .any(|table_id| *table_id == self.padding_table_id)
        {
            return Err(ScriptError::Config(
                "the padding table id cannot also be a language table".to_string(),
            ));
        }
        Ok(())
    }

    pub fn language_id(&self, name: &str) -> Option<u8> {
        self.languages.get(name).copied()
    }

    pub fn is_language_table(&self, table_id: u8) -> bool {
        self.languages.values().any(|id| *id == table_id)
    }
}
