use chrono::{DateTime, Duration, Utc};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Cadence {
    Daily,
    Weekly,
    Monthly,
}

impl Cadence {
    /// Unrecognized cadences are scheduled like daily ones.
    pub fn parse_or_daily(cadence: &str) -> Cadence {
        match cadence.trim().to_lowercase().as_str() {
            "weekly" => Cadence::Weekly,
            "monthly" => Cadence::Monthly,
            _ => Cadence::Daily,
        }
    }
}

impl AsRef<str> for Cadence {
    fn as_ref(&self) -> &str {
        match self {
            Cadence::Daily => "daily",
            Cadence::Weekly => "weekly",
            Cadence::Monthly => "monthly",
        }
    }
}

/// Minimum time that has to pass after a message before the next one is due.
///
/// Every window is shorter than its nominal period so that a batch which
/// starts a little late never skips anybody. The price is that send times
/// drift earlier over many cycles.
#[derive(Debug, Clone, Copy)]
pub struct CadencePolicy {
    pub daily: Duration,
    pub weekly: Duration,
    pub monthly: Duration,
}

impl Default for CadencePolicy {
    fn default() -> Self {
        Self {
            daily: Duration::hours(23),
            // 6.5 days
            weekly: Duration::hours(156),
            monthly: Duration::days(29),
        }
    }
}

impl CadencePolicy {
    pub fn window(&self, cadence: Cadence) -> Duration {
        match cadence {
            Cadence::Daily => self.daily,
            Cadence::Weekly => self.weekly,
            Cadence::Monthly => self.monthly,
        }
    }

    pub fn is_due(
        &self,
        last_sent_at: Option<DateTime<Utc>>,
        cadence: Cadence,
        now: DateTime<Utc>,
    ) -> bool {
        match last_sent_at {
            None => true,
            Some(last_sent_at) => now - last_sent_at >= self.window(cadence),
        }
    }
}
