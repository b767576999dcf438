//! Method names with special meaning to the normalizer.

use std::collections::HashSet;

/// Translation helpers recognized out of the box.
pub const DEFAULT_TRANSLATION_METHODS: &[&str] = &["t", "t!", "translate", "translate!"];

/// Receiverless calls that mark every following `def` as private.
pub const DEFAULT_VISIBILITY_TOGGLES: &[&str] = &["private"];

/// The set of call shapes the normalizer treats specially.
///
/// Extra names (from `translationMethods` in `.glotrc.json`, or from a
/// framework-specific engine) are added on top of the defaults; the defaults
/// can't be removed.
#[derive(Debug, Clone)]
pub struct CallShapes {
    translation_methods: HashSet<String>,
    visibility_toggles: HashSet<String>,
}

impl Default for CallShapes {
    fn default() -> Self {
        Self {
            translation_methods: DEFAULT_TRANSLATION_METHODS
                .iter()
                .map(|s| s.to_string())
                .collect(),
            visibility_toggles: DEFAULT_VISIBILITY_TOGGLES
                .iter()
                .map(|s| s.to_string())
                .collect(),
        }
    }
}

impl CallShapes {
    pub fn with_translation_methods<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.translation_methods
            .extend(names.into_iter().map(Into::into));
        self
    }

    #[cfg(test)]
    pub fn with_visibility_toggles<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.visibility_toggles
            .extend(names.into_iter().map(Into::into));
        self
    }

    pub fn is_translation_method(&self, name: &str) -> bool {
        self.translation_methods.contains(name)
    }

    pub fn is_visibility_toggle(&self, name: &str) -> bool {
        self.visibility_toggles.contains(name)
    }
}
