use unicode_segmentation::UnicodeSegmentation;

const MAX_CHAR_LENGTH: usize = 256;
const FORBIDDEN_CHARS: [char; 9] = ['/', '{', '}', '"', '>', '<', '\\', '(', ')'];
const FALLBACK_FIRST_NAME: &str = "Celestial Voyager";

#[derive(Debug, Clone, serde::Serialize)]
pub struct SubscriberName(String);

impl SubscriberName {
    pub fn parse(name: String) -> Result<SubscriberName, String> {
        let is_empty_or_whitespace = name.trim().is_empty();
        let is_too_long = name.graphemes(true).count() > MAX_CHAR_LENGTH;
        let contains_forbidden_chars = name.chars().any(|char| FORBIDDEN_CHARS.contains(&char));

        if is_empty_or_whitespace || is_too_long || contains_forbidden_chars {
            return Err(format!("{} is not a valid subscriber name", name));
        }

        Ok(Self(name.trim().to_string()))
    }

    pub fn first_name(&self) -> &str {
        self.0.split_whitespace().next().unwrap_or(FALLBACK_FIRST_NAME)
    }

    /// Name used to address the subscriber in generated content. Billing
    /// stores whatever the checkout form sent, so anything unusable falls back
    /// to a neutral salutation instead of failing the send.
    pub fn salutation(full_name: Option<&str>) -> String {
        full_name
            .and_then(|name| SubscriberName::parse(name.to_string()).ok())
            .map(|name| name.first_name().to_string())
            .unwrap_or_else(|| FALLBACK_FIRST_NAME.to_string())
    }
}

impl AsRef<str> for SubscriberName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
