use serde::{Deserialize, Serialize};

use crate::parsing::{decode_document, extract_abstract};

/// Default abstract keywords identifying an exoplanet program.
pub const DEFAULT_KEYWORDS: &[&str] = &["exoplanet", "extra solar", "mini neptune"];

/// Abstract keyword screen for exoplanet programs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExoplanetScreen {
    keywords: Vec<String>,
}

impl Default for ExoplanetScreen {
    fn default() -> Self {
        Self::new(DEFAULT_KEYWORDS.iter().map(|k| k.to_string()))
    }
}

impl ExoplanetScreen {
    pub fn new(keywords: impl IntoIterator<Item = String>) -> Self {
        Self {
            keywords: keywords
                .into_iter()
                .map(|k| k.trim().to_lowercase())
                .filter(|k| !k.is_empty())
                .collect(),
        }
    }

    pub fn keywords(&self) -> &[String] {
        &self.keywords
    }

    /// `true` when the document abstract mentions any keyword
    /// (case-insensitive). A document without an abstract never passes.
    pub fn is_exoplanet_program(&self, document: &[u8]) -> bool {
        let text = decode_document(document);
        match extract_abstract(&text) {
            Some(abstract_text) => {
                let lowered = abstract_text.to_lowercase();
                self.keywords.iter().any(|k| lowered.contains(k.as_str()))
            }
            None => false,
        }
    }
}
