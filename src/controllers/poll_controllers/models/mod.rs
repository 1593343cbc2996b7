use axum::{
    async_trait,
    extract::{rejection::JsonRejection, FromRequest, Request},
    Json,
};
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use mongodb::bson;
use serde::{
    de::{DeserializeOwned, Error as _},
    Deserialize, Deserializer, Serialize,
};

use crate::models::poll_models::{Poll, PollOption, Vote};
use crate::utils::error::AppError;

fn default_require_voter_name() -> bool {
    true
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct CreatePollRequest {
    pub question: String,
    pub options: Vec<String>,
    #[serde(deserialize_with = "deserialize_end_date")]
    pub end_date: DateTime<Utc>,
    #[serde(default = "default_require_voter_name")]
    pub require_voter_name: bool,
}

/// Offset-less forms, read as UTC.
const NAIVE_DATETIME_FORMATS: [&str; 6] = [
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
];

#[derive(Deserialize)]
#[serde(untagged)]
enum RawDate {
    Millis(i64),
    Text(String),
}

/// Accepts epoch milliseconds, RFC 3339, or a date / date-time without offset.
pub fn parse_date_text(text: &str) -> Option<DateTime<Utc>> {
    let text = text.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Some(naive) = NAIVE_DATETIME_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(text, format).ok())
    {
        return Some(naive.and_utc());
    }
    NaiveDate::parse_from_str(text, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

fn deserialize_end_date<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
where
    D: Deserializer<'de>,
{
    match RawDate::deserialize(deserializer)? {
        RawDate::Millis(millis) => DateTime::<Utc>::from_timestamp_millis(millis)
            .ok_or_else(|| D::Error::custom(format!("endDate {millis} is out of range"))),
        RawDate::Text(text) => parse_date_text(&text)
            .ok_or_else(|| D::Error::custom(format!("endDate '{text}' is not a date"))),
    }
}

#[derive(Deserialize, Debug, Default)]
#[serde(rename_all = "camelCase")]
pub struct CastVoteRequest {
    #[serde(default)]
    pub voter_name: Option<String>,
}

#[derive(Serialize, Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct VoteResponse {
    pub id: String,
    pub voter_name: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Serialize, Deserialize, Debug)]
pub struct OptionResponse {
    pub id: String,
    pub text: String,
    pub votes: i64,
    pub voters: Vec<VoteResponse>,
}

#[derive(Serialize, Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct PollResponse {
    pub id: String,
    pub question: String,
    pub options: Vec<OptionResponse>,
    pub created_at: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub is_active: bool,
    pub require_voter_name: bool,
}

pub fn to_chrono(dt: bson::DateTime) -> DateTime<Utc> {
    DateTime::<Utc>::from(dt.to_system_time())
}

pub fn to_bson_date(dt: DateTime<Utc>) -> bson::DateTime {
    bson::DateTime::from_millis(dt.timestamp_millis())
}

impl From<Vote> for VoteResponse {
    fn from(vote: Vote) -> Self {
        VoteResponse {
            id: vote.id.to_hex(),
            voter_name: vote.voter_name,
            timestamp: to_chrono(vote.timestamp),
        }
    }
}

impl From<PollOption> for OptionResponse {
    fn from(option: PollOption) -> Self {
        OptionResponse {
            id: option.id.to_hex(),
            text: option.text,
            votes: option.votes,
            voters: option.voters.into_iter().map(VoteResponse::from).collect(),
        }
    }
}

impl From<Poll> for PollResponse {
    fn from(poll: Poll) -> Self {
        PollResponse {
            id: poll.id.to_hex(),
            question: poll.question,
            options: poll.options.into_iter().map(OptionResponse::from).collect(),
            created_at: to_chrono(poll.created_at),
            end_date: to_chrono(poll.end_date),
            is_active: poll.is_active,
            require_voter_name: poll.require_voter_name,
        }
    }
}

/// `Json` that rejects with a 400 instead of axum's 422 when the body does
/// not deserialize into `T`.
pub struct JsonBody<T>(pub T);

#[async_trait]
impl<T, S> FromRequest<S> for JsonBody<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(JsonBody(value)),
            Err(rejection) => Err(AppError::BadRequest(rejection_message(rejection))),
        }
    }
}

fn rejection_message(rejection: JsonRejection) -> String {
    format!("Invalid request body: {}", rejection.body_text())
}
