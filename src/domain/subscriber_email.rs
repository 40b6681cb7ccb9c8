use validator::validate_email;

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct SubscriberEmail(String);

impl SubscriberEmail {
    /// Accepts `local@domain.tld` addresses only. `validator` alone lets dotless
    /// hosts such as `user@localhost` through, which no mail provider will route.
    pub fn parse(email: String) -> Result<SubscriberEmail, String> {
        let email = email.trim().to_string();
        let has_dotted_domain = email
            .rsplit_once('@')
            .map(|(_, domain)| {
                domain
                    .split('.')
                    .filter(|segment| !segment.is_empty())
                    .count()
                    >= 2
                    && !domain.starts_with('.')
                    && !domain.ends_with('.')
            })
            .unwrap_or(false);

        if !validate_email(&email) || !has_dotted_domain {
            return Err(format!("{} email is not valid", email));
        }

        Ok(Self(email))
    }
}

impl AsRef<str> for SubscriberEmail {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
