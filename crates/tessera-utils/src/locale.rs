//! UI and content language settings plus a per-instance translation registry.

use std::collections::HashMap;
use std::rc::Rc;

use smol_str::SmolStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LanguageDirection {
    #[default]
    Ltr,
    Rtl,
}

const RTL_LANGUAGES: &[&str] = &["ar", "ckb", "dv", "fa", "he", "ku", "ug", "ur", "yi"];

/// Direction of a language code such as `"en"` or `"ar"`.
pub fn language_direction(language: &str) -> LanguageDirection {
    if RTL_LANGUAGES.contains(&language) {
        LanguageDirection::Rtl
    } else {
        LanguageDirection::Ltr
    }
}

/// Translations for one language, keyed by the source message.
#[derive(Debug, Clone, Default)]
pub struct Translations {
    messages: HashMap<SmolStr, SmolStr>,
}

impl Translations {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, message: &str, translation: &str) -> Self {
        self.register(message, translation);
        self
    }

    pub fn register(&mut self, message: &str, translation: &str) {
        self.messages
            .insert(SmolStr::new(message), SmolStr::new(translation));
    }

    fn lookup(&self, message: &str) -> Option<&str> {
        self.messages.get(message).map(SmolStr::as_str)
    }
}

/// Language settings of one editor instance.
///
/// Cheap to clone; the translation table is shared.
#[derive(Debug, Clone)]
pub struct Locale {
    ui_language: SmolStr,
    content_language: SmolStr,
    translations: Rc<Translations>,
}

impl Locale {
    pub fn new(ui_language: &str, content_language: Option<&str>) -> Self {
        Self {
            ui_language: SmolStr::new(ui_language),
            content_language: SmolStr::new(content_language.unwrap_or(ui_language)),
            translations: Rc::new(Translations::default()),
        }
    }

    pub fn with_translations(mut self, translations: Translations) -> Self {
        self.translations = Rc::new(translations);
        self
    }

    pub fn ui_language(&self) -> &str {
        &self.ui_language
    }

    pub fn content_language(&self) -> &str {
        &self.content_language
    }

    pub fn ui_language_direction(&self) -> LanguageDirection {
        language_direction(&self.ui_language)
    }

    pub fn content_language_direction(&self) -> LanguageDirection {
        language_direction(&self.content_language)
    }

    /// Translate `message` and fill `%0`, `%1`, ... with `values`.
    pub fn t(&self, message: &str, values: &[&str]) -> String {
        let mut text = self
            .translations
            .lookup(message)
            .unwrap_or(message)
            .to_owned();
        for (index, value) in values.iter().enumerate() {
            text = text.replace(&format!("%{index}"), value);
        }
        text
    }
}

impl Default for Locale {
    fn default() -> Self {
        Self::new("en", None)
    }
}
