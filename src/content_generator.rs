use chrono::NaiveDate;

use crate::completion_client::CompletionClient;
use crate::domain::cadence::Cadence;
use crate::domain::subscriber::Subscriber;
use crate::domain::subscriber_name::SubscriberName;

const NOT_SPECIFIED: &str = "not specified";

pub struct ContentGenerator {
    completion_client: CompletionClient,
}

impl ContentGenerator {
    pub fn new(completion_client: CompletionClient) -> Self {
        Self { completion_client }
    }

    /// Generates the next message for `subscriber`, using `today` as the
    /// reference date. Provider failures are logged and yield an empty string.
    #[tracing::instrument(
        name = "Generating horoscope content",
        skip(self, subscriber),
        fields(
            subscriber_id = %subscriber.id,
            message_kind = %subscriber.message_kind()
        )
    )]
    pub async fn generate(&self, subscriber: &Subscriber, today: NaiveDate) -> String {
        let system_prompt = build_system_prompt(subscriber);
        let prompt = build_prompt(subscriber, today);

        match self.completion_client.complete(&system_prompt, &prompt).await {
            Ok(content) => content,
            Err(err) => {
                tracing::error!("Content generation failed: {:?}", err);
                String::new()
            }
        }
    }
}

pub fn build_system_prompt(subscriber: &Subscriber) -> String {
    format!(
        "You are Luraaya, a sensitive and poetic astrologer. Respond strictly in {}. \
         Do not include any words in any other language.",
        subscriber.locale.language_name()
    )
}

/// Sentence range requested for a tier and cadence. Premium readings run one
/// sentence longer at every cadence.
pub fn sentence_range(cadence: Cadence, premium: bool) -> (u8, u8) {
    let (min, max) = match cadence {
        Cadence::Daily => (3, 4),
        Cadence::Weekly => (5, 7),
        Cadence::Monthly => (9, 11),
    };

    if premium {
        (min + 1, max + 1)
    } else {
        (min, max)
    }
}

pub fn build_prompt(subscriber: &Subscriber, today: NaiveDate) -> String {
    let name = SubscriberName::salutation(subscriber.full_name.as_deref());
    let premium = subscriber.status.is_premium();
    let (min_sentences, max_sentences) = sentence_range(subscriber.cadence, premium);
    let period = match subscriber.cadence {
        Cadence::Daily => "today",
        Cadence::Weekly => "the coming week",
        Cadence::Monthly => "the coming month, including long-term developments of Pluto, Saturn and Uranus",
    };

    let mut prompt = format!(
        "Create an individual {kind} for the following person based on their astrological data.\n\
         \n\
         Name: {name}\n\
         Gender: {sex}\n\
         Birth date: {birth_date}\n\
         Birth time: {birth_time} (if not available, ignore houses)\n\
         Birth place: {birth_place}\n\
         Frequency: {cadence}\n\
         Language: {language}. {writing_instruction}\n\
         \n\
         Connect the birth chart with the current planetary transits for {period}. \
         Use astrological terms but explain them in plain, elegant language. \
         Address {name} directly: the name stands alone on the first line, followed by a line break. \
         Start directly with the message, without introduction or conclusion.\n",
        kind = subscriber.message_kind().label(),
        name = name,
        sex = text_or_unspecified(subscriber.sex.as_deref()),
        birth_date = subscriber
            .date_of_birth
            .map(|date| date.format("%Y-%m-%d").to_string())
            .unwrap_or_else(|| NOT_SPECIFIED.to_string()),
        birth_time = subscriber
            .time_of_birth
            .map(|time| time.format("%H:%M").to_string())
            .unwrap_or_else(|| NOT_SPECIFIED.to_string()),
        birth_place = text_or_unspecified(subscriber.place_of_birth.as_deref()),
        cadence = subscriber.cadence.as_ref(),
        language = subscriber.locale.as_ref(),
        writing_instruction = subscriber.locale.writing_instruction(),
        period = period,
    );

    if premium {
        prompt.push_str(
            "Go deeper than a basic reading: name the most significant transit aspects \
             and describe how they interact with each other.\n",
        );
    }

    prompt.push_str(&format!(
        "\nLength: {}-{} sentences.\n",
        min_sentences, max_sentences
    ));

    if subscriber.channel.is_short_format() {
        prompt.push_str(
            "The message is delivered as a text message: keep it under 1500 characters \
             in 2-3 short paragraphs.\n",
        );
    }

    prompt.push_str(&format!(
        "\nThe reading must reflect the planetary positions of the current date. \
         Use {} as the reference date.",
        today.format("%Y-%m-%d")
    ));

    prompt
}

fn text_or_unspecified(value: Option<&str>) -> &str {
    match value.map(str::trim) {
        Some(value) if !value.is_empty() => value,
        _ => NOT_SPECIFIED,
    }
}
