use once_cell::sync::Lazy;
use regex::Regex;

const WHATSAPP_PREFIX: &str = "whatsapp:";

static PHONE_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\+?[1-9][0-9]{7,14}$").expect("Invalid phone number pattern."));

/// Destination for the SMS and WhatsApp channels: an optional leading `+`
/// followed by 8 to 15 digits, the first of which is not zero.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct PhoneNumber(String);

impl PhoneNumber {
    pub fn parse(phone: String) -> Result<PhoneNumber, String> {
        let candidate = phone.trim();
        let candidate = candidate.strip_prefix(WHATSAPP_PREFIX).unwrap_or(candidate);

        if !PHONE_PATTERN.is_match(candidate) {
            return Err(format!("{} is not a valid E.164 phone number", phone));
        }

        Ok(Self(candidate.to_string()))
    }

    pub fn as_whatsapp(&self) -> String {
        whatsapp_address(&self.0)
    }
}

impl AsRef<str> for PhoneNumber {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Prefixes an address with `whatsapp:` exactly once.
pub fn whatsapp_address(address: &str) -> String {
    let address = address.trim();

    if address.starts_with(WHATSAPP_PREFIX) {
        address.to_string()
    } else {
        format!("{}{}", WHATSAPP_PREFIX, address)
    }
}
