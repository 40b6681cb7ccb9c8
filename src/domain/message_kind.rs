use crate::domain::cadence::Cadence;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageKind {
    DailyHoroscope,
    WeeklyForecast,
    MonthlyReading,
}

impl MessageKind {
    pub fn parse(kind: String) -> Result<MessageKind, String> {
        match kind.as_str() {
            "daily_horoscope" => Ok(MessageKind::DailyHoroscope),
            "weekly_forecast" => Ok(MessageKind::WeeklyForecast),
            "monthly_reading" => Ok(MessageKind::MonthlyReading),
            _ => Err(format!("{} is not a valid message kind", kind)),
        }
    }

    pub fn email_subject(&self) -> &'static str {
        match self {
            MessageKind::DailyHoroscope => "Your daily horoscope ✨",
            MessageKind::WeeklyForecast => "Your weekly forecast ✨",
            MessageKind::MonthlyReading => "Your monthly reading ✨",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            MessageKind::DailyHoroscope => "daily horoscope",
            MessageKind::WeeklyForecast => "weekly forecast",
            MessageKind::MonthlyReading => "monthly reading",
        }
    }
}

impl From<Cadence> for MessageKind {
    fn from(cadence: Cadence) -> Self {
        match cadence {
            Cadence::Daily => MessageKind::DailyHoroscope,
            Cadence::Weekly => MessageKind::WeeklyForecast,
            Cadence::Monthly => MessageKind::MonthlyReading,
        }
    }
}

impl AsRef<str> for MessageKind {
    fn as_ref(&self) -> &str {
        match self {
            MessageKind::DailyHoroscope => "daily_horoscope",
            MessageKind::WeeklyForecast => "weekly_forecast",
            MessageKind::MonthlyReading => "monthly_reading",
        }
    }
}

impl std::fmt::Display for MessageKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_ref())
    }
}
