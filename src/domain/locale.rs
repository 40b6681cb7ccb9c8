#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub enum Locale {
    De,
    En,
    Fr,
}

impl Locale {
    /// Unknown or missing language tags default to English.
    pub fn parse_or_default(tag: Option<&str>) -> Locale {
        match tag.map(|tag| tag.trim().to_lowercase()).as_deref() {
            Some("de") => Locale::De,
            Some("fr") => Locale::Fr,
            _ => Locale::En,
        }
    }

    /// Language name the completion provider is instructed to answer in.
    pub fn language_name(&self) -> &'static str {
        match self {
            Locale::De => "German",
            Locale::En => "English",
            Locale::Fr => "French",
        }
    }

    pub fn writing_instruction(&self) -> &'static str {
        match self {
            Locale::De => "Write exclusively in German (Deutsch).",
            Locale::En => "Write exclusively in English.",
            Locale::Fr => "Write exclusively in French (Français).",
        }
    }
}

impl AsRef<str> for Locale {
    fn as_ref(&self) -> &str {
        match self {
            Locale::De => "de",
            Locale::En => "en",
            Locale::Fr => "fr",
        }
    }
}
