use std::collections::HashMap;

use hookline_core::config::MessagesConfig;

use crate::interaction::Interaction;

pub const DEFAULT_LOCALE: &str = "en-US";

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum TextKey {
    CommandNameMissing,
    CommandNotFound,
    NotAuthorized,
}

impl TextKey {
    pub const ALL: [Self; 3] = [Self::CommandNameMissing, Self::CommandNotFound, Self::NotAuthorized];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::CommandNameMissing => "command_name_missing",
            Self::CommandNotFound => "command_not_found",
            Self::NotAuthorized => "not_authorized",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|key| key.as_str() == raw)
    }

    fn default_text(self) -> &'static str {
        match self {
            Self::CommandNameMissing => "command name not provided 👎",
            Self::CommandNotFound => "command not found 👎",
            Self::NotAuthorized => "you are not cool enough 🦑",
        }
    }
}

/// User-facing text for handled outcomes, rendered for a specific interaction.
pub trait TextCatalog: Send + Sync {
    fn text(&self, key: TextKey, interaction: &Interaction) -> String;
}

/// Per-locale message tables. Lookup tries the user's locale, then the guild's, then the
/// default locale; each locale also falls back to its primary language (`pt-BR` -> `pt`).
#[derive(Clone, Debug)]
pub struct LocalizedText {
    default_locale: String,
    locales: HashMap<String, HashMap<TextKey, String>>,
}

impl Default for LocalizedText {
    fn default() -> Self {
        Self::new()
    }
}

impl LocalizedText {
    pub fn new() -> Self {
        let defaults =
            TextKey::ALL.into_iter().map(|key| (key, key.default_text().to_owned())).collect();
        Self {
            default_locale: DEFAULT_LOCALE.to_owned(),
            locales: HashMap::from([(DEFAULT_LOCALE.to_owned(), defaults)]),
        }
    }

    pub fn with_locale<I>(mut self, locale: impl Into<String>, entries: I) -> Self
    where
        I: IntoIterator<Item = (TextKey, String)>,
    {
        self.locales.entry(locale.into()).or_default().extend(entries);
        self
    }

    /// Builds the catalog from `[messages."<locale>"]` tables. Keys are validated when the
    /// config loads; anything unrecognized here is skipped.
    pub fn from_config(config: &MessagesConfig) -> Self {
        config.locales.iter().fold(Self::new(), |catalog, (locale, entries)| {
            let parsed = entries
                .iter()
                .filter_map(|(key, text)| TextKey::parse(key).map(|key| (key, text.clone())));
            catalog.with_locale(locale.clone(), parsed)
        })
    }

    pub fn locale_count(&self) -> usize {
        self.locales.len()
    }

    fn lookup(&self, locale: &str, key: TextKey) -> Option<&str> {
        let exact = self.locales.get(locale).and_then(|entries| entries.get(&key));
        let primary = || {
            let (language, _) = locale.split_once('-')?;
            self.locales.get(language).and_then(|entries| entries.get(&key))
        };
        exact.or_else(primary).map(String::as_str)
    }

    pub fn resolve(&self, key: TextKey, preferred: &[&str]) -> &str {
        preferred
            .iter()
            .copied()
            .chain(std::iter::once(self.default_locale.as_str()))
            .find_map(|locale| self.lookup(locale, key))
            .unwrap_or_else(|| key.default_text())
    }
}

impl TextCatalog for LocalizedText {
    fn text(&self, key: TextKey, interaction: &Interaction) -> String {
        let preferred: Vec<&str> =
            [interaction.locale.as_deref(), interaction.guild_locale.as_deref()]
                .into_iter()
                .flatten()
                .collect();
        self.resolve(key, &preferred).to_owned()
    }
}
