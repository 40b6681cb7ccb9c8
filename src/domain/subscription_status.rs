#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub enum SubscriptionStatus {
    Inactive,
    Basic,
    Premium,
}

impl SubscriptionStatus {
    pub fn is_active(&self) -> bool {
        matches!(self, SubscriptionStatus::Basic | SubscriptionStatus::Premium)
    }

    pub fn is_premium(&self) -> bool {
        matches!(self, SubscriptionStatus::Premium)
    }

    pub fn parse(status: String) -> Result<SubscriptionStatus, String> {
        match status.trim().to_lowercase().as_str() {
            "inactive" => Ok(SubscriptionStatus::Inactive),
            "basic" => Ok(SubscriptionStatus::Basic),
            "premium" => Ok(SubscriptionStatus::Premium),
            _ => Err(format!("{} is not a valid subscription status", status)),
        }
    }

    /// Statuses the billing layer writes that this service does not know about
    /// (`canceled`, `past_due`, ...) never entitle anyone to messages.
    pub fn parse_or_inactive(status: Option<String>) -> SubscriptionStatus {
        status
            .and_then(|status| SubscriptionStatus::parse(status).ok())
            .unwrap_or(SubscriptionStatus::Inactive)
    }
}

impl AsRef<str> for SubscriptionStatus {
    fn as_ref(&self) -> &str {
        match self {
            SubscriptionStatus::Inactive => "inactive",
            SubscriptionStatus::Basic => "basic",
            SubscriptionStatus::Premium => "premium",
        }
    }
}
