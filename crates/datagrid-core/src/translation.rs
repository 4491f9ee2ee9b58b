//! Translation hook used by row preparation

use std::collections::HashMap;

/// Translates display strings for columns with translation enabled
pub trait Translator: Send + Sync {
    fn translate(&self, text: &str) -> String;
}

/// Lookup table translator; unknown strings pass through
#[derive(Debug, Clone, Default)]
pub struct MapTranslator {
    entries: HashMap<String, String>,
}

impl MapTranslator {
    pub fn new(entries: HashMap<String, String>) -> Self {
        Self { entries }
    }

    pub fn insert(&mut self, source: impl Into<String>, target: impl Into<String>) {
        self.entries.insert(source.into(), target.into());
    }
}

impl Translator for MapTranslator {
    fn translate(&self, text: &str) -> String {
        self.entries
            .get(text)
            .cloned()
            .unwrap_or_else(|| text.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_text_passes_through() {
        let mut translator = MapTranslator::default();
        translator.insert("yes", "ja");
        assert_eq!(translator.translate("yes"), "ja");
        assert_eq!(translator.translate("no"), "no");
    }
}
