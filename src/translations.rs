//! User-facing messages, overridable from the `[translations]` config table.

use std::collections::HashMap;

macro_rules! translations {
    ($($variant:ident => $identifier:literal, $default:literal;)*) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum Translation {
            $($variant,)*
        }

        impl Translation {
            pub const ALL: &'static [Translation] = &[$(Translation::$variant,)*];

            /// Key in the translations table.
            pub fn identifier(self) -> &'static str {
                match self {
                    $(Translation::$variant => $identifier,)*
                }
            }

            pub fn default_text(self) -> &'static str {
                match self {
                    $(Translation::$variant => $default,)*
                }
            }
        }
    };
}

translations! {
    PublicChestCloseMessage => "PUBLIC_CHEST_CLOSE_MESSAGE",
        "This was a public Ender Chest. Remember that your items aren't saved.";
    EnderChestsDisabled => "ENDER_CHESTS_DISABLED",
        "Ender Chests have been disabled, because chests cannot be saved or loaded.";
    PublicChestTitle => "PUBLIC_CHEST_TITLE", "Ender Chest (Public Chest)";
    PrivateChestTitle => "PRIVATE_CHEST_TITLE", "Ender Chest (%s)";
    DefaultChestTitle => "DEFAULT_CHEST_TITLE", "Editing the default Ender Chest...";
    NoPermission => "NO_PERMISSION", "You don't have permission to do this.";
    PlayerNotSeenOnServer => "PLAYER_NOT_SEEN_ON_SERVER",
        "The player %s was never seen on this server.";
}

#[derive(Debug, Clone)]
pub struct Translations {
    texts: HashMap<Translation, String>,
}

impl Default for Translations {
    fn default() -> Self {
        Self {
            texts: Translation::ALL
                .iter()
                .map(|&t| (t, t.default_text().to_owned()))
                .collect(),
        }
    }
}

impl Translations {
    /// Reads every known message from `table`. Missing or non-text entries keep their default.
    pub fn load(table: &toml::Table) -> Self {
        let mut translations = Self::default();
        for &translation in Translation::ALL {
            match table.get(translation.identifier()) {
                Some(toml::Value::String(text)) => {
                    translations.texts.insert(translation, text.clone());
                }
                Some(other) => tracing::warn!(
                    "Translation {} is a {}, not text; using the default.",
                    translation.identifier(),
                    other.type_str()
                ),
                None => {}
            }
        }
        translations
    }

    /// Writes every message into `table`, so the config file lists all of them.
    pub fn save(&self, table: &mut toml::Table) {
        for &translation in Translation::ALL {
            table.insert(
                translation.identifier().to_owned(),
                toml::Value::String(self.get(translation).to_owned()),
            );
        }
    }

    pub fn get(&self, translation: Translation) -> &str {
        self.texts
            .get(&translation)
            .map(String::as_str)
            .unwrap_or_else(|| translation.default_text())
    }

    /// The message with its `%s` placeholder replaced by `arg`.
    pub fn format(&self, translation: Translation, arg: &str) -> String {
        self.get(translation).replacen("%s", arg, 1)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn identifiers_are_unique() {
        let mut seen = std::collections::HashSet::new();
        for translation in Translation::ALL {
            assert!(seen.insert(translation.identifier()));
        }
        assert_eq!(seen.len(), 7);
    }

    #[test]
    fn load_overrides_and_defaults() {
        let table: toml::Table = toml::from_str(
            r#"
            NO_PERMISSION = "Nope."
            PUBLIC_CHEST_TITLE = 12
            UNKNOWN = "ignored"
            "#,
        )
        .unwrap();

        let translations = Translations::load(&table);
        assert_eq!(translations.get(Translation::NoPermission), "Nope.");
        assert_eq!(
            translations.get(Translation::PublicChestTitle),
            "Ender Chest (Public Chest)"
        );
        assert_eq!(
            translations.format(Translation::PlayerNotSeenOnServer, "Steve"),
            "The player Steve was never seen on this server."
        );
    }

    #[test]
    fn save_then_load() {
        let mut table = toml::Table::new();
        table.insert("NO_PERMISSION".into(), "Denied".into());
        let translations = Translations::load(&table);

        let mut saved = toml::Table::new();
        translations.save(&mut saved);
        assert_eq!(saved.len(), Translation::ALL.len());
        assert_eq!(saved["NO_PERMISSION"].as_str(), Some("Denied"));
        assert_eq!(saved["PRIVATE_CHEST_TITLE"].as_str(), Some("Ender Chest (%s)"));

        let reloaded = Translations::load(&saved);
        for &translation in Translation::ALL {
            assert_eq!(reloaded.get(translation), translations.get(translation));
        }
    }
}
