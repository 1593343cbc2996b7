use std::sync::Arc;

use axum::{
    body::Body,
    http::{Method, Request, StatusCode},
    Router,
};
use chrono::{Duration, Utc};
use http_body_util::BodyExt;
use async_trait::async_trait;
use mongodb::bson::oid::ObjectId;
use polls_backend::{
    app,
    db::{InMemoryPollRepository, PollRepository},
    models::poll_models::{Poll, VoteUpdate},
    state::AppState,
    utils::error::AppResult,
};
use serde_json::{json, Value};
use tower::ServiceExt;

fn test_app() -> Router {
    app(AppState::new(Arc::new(InMemoryPollRepository::new())))
}

async fn send(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

async fn create(app: &Router, body: Value) -> Value {
    let (status, poll) = send(app, Method::POST, "/api/polls", Some(body)).await;
    assert_eq!(status, StatusCode::CREATED);
    poll
}

fn in_one_hour() -> String {
    (Utc::now() + Duration::hours(1)).to_rfc3339()
}

fn option_id(poll: &Value, index: usize) -> String {
    poll["options"][index]["id"].as_str().unwrap().to_string()
}

async fn fetch(app: &Router, poll: &Value) -> Value {
    let uri = format!("/api/polls/{}", poll["id"].as_str().unwrap());
    let (status, poll) = send(app, Method::GET, &uri, None).await;
    assert_eq!(status, StatusCode::OK);
    poll
}

async fn vote(app: &Router, poll: &Value, option: &str, voter_name: Option<&str>) -> (StatusCode, Value) {
    let uri = format!("/api/polls/{}/vote/{option}", poll["id"].as_str().unwrap());
    let body = voter_name.map(|name| json!({ "voterName": name }));
    send(app, Method::POST, &uri, body).await
}

#[tokio::test]
async fn tea_or_coffee_scenario() {
    let app = test_app();
    let poll = create(
        &app,
        json!({
            "question": "Tea or coffee?",
            "options": ["Tea", "Coffee"],
            "endDate": in_one_hour(),
            "requireVoterName": true,
        }),
    )
    .await;

    assert_eq!(poll["isActive"], true);
    assert_eq!(poll["options"].as_array().unwrap().len(), 2);
    assert_eq!(poll["options"][0]["votes"], 0);
    assert_eq!(poll["options"][1]["votes"], 0);
    assert!(poll.get("_id").is_none());
    assert!(poll.get("__v").is_none());

    let tea = option_id(&poll, 0);
    let coffee = option_id(&poll, 1);

    let (status, body) = vote(&app, &poll, &tea, Some("Alice")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, Value::Null);

    let (status, body) = vote(&app, &poll, &coffee, Some("Alice")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "You have already voted on this poll");

    let current = fetch(&app, &poll).await;
    assert_eq!(current["options"][0]["votes"], 1);
    assert_eq!(current["options"][0]["voters"][0]["voterName"], "Alice");
    assert!(current["options"][0]["voters"][0]["id"].is_string());
    assert_eq!(current["options"][1]["votes"], 0);

    let uri = format!("/api/polls/{}/close", poll["id"].as_str().unwrap());
    let (status, closed) = send(&app, Method::PATCH, &uri, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(closed["isActive"], false);

    let (status, body) = vote(&app, &poll, &tea, Some("Bob")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Poll is no longer active");

    let current = fetch(&app, &poll).await;
    assert_eq!(current["options"][0]["votes"], 1);
}

#[tokio::test]
async fn create_defaults_and_lists_in_order() {
    let app = test_app();
    let first = create(
        &app,
        json!({ "question": "First?", "options": ["a", "b", "c"], "endDate": in_one_hour() }),
    )
    .await;
    let second = create(
        &app,
        json!({ "question": "Second?", "options": [], "endDate": in_one_hour(), "requireVoterName": false }),
    )
    .await;

    assert_eq!(first["requireVoterName"], true);
    assert_eq!(first["options"].as_array().unwrap().len(), 3);
    assert!(first["options"]
        .as_array()
        .unwrap()
        .iter()
        .all(|o| o["votes"] == 0 && o["voters"].as_array().unwrap().is_empty()));
    assert_eq!(second["requireVoterName"], false);
    assert!(second["createdAt"].is_string());

    let (status, polls) = send(&app, Method::GET, "/api/polls", None).await;
    assert_eq!(status, StatusCode::OK);
    let ids: Vec<_> = polls.as_array().unwrap().iter().map(|p| p["id"].clone()).collect();
    assert_eq!(ids, vec![first["id"].clone(), second["id"].clone()]);
}

#[tokio::test]
async fn malformed_creation_payloads_are_bad_requests() {
    let app = test_app();
    let payloads = [
        json!({ "question": "No options?", "endDate": in_one_hour() }),
        json!({ "question": "Not a list?", "options": "Tea", "endDate": in_one_hour() }),
        json!({ "options": ["Tea"], "endDate": in_one_hour() }),
        json!({ "question": "No end?", "options": ["Tea"] }),
        json!({ "question": "", "options": ["Tea"], "endDate": in_one_hour() }),
        json!({ "question": "Blank label?", "options": ["Tea", ""], "endDate": in_one_hour() }),
    ];

    for payload in payloads {
        let (status, _) = send(&app, Method::POST, "/api/polls", Some(payload.clone())).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "payload {payload}");
    }

    let (_, polls) = send(&app, Method::GET, "/api/polls", None).await;
    assert!(polls.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn unknown_polls_are_not_found() {
    let app = test_app();
    let missing = "65f0c0ffee0000000000beef";

    for uri in [format!("/api/polls/{missing}"), "/api/polls/not-an-id".to_string()] {
        let (status, body) = send(&app, Method::GET, &uri, None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"], "NOT_FOUND");
    }

    let uri = format!("/api/polls/{missing}/vote/{missing}");
    let (status, _) = send(&app, Method::POST, &uri, Some(json!({ "voterName": "Alice" }))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let uri = format!("/api/polls/{missing}/close");
    let (status, _) = send(&app, Method::PATCH, &uri, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn vote_rejections_leave_tallies_untouched() {
    let app = test_app();
    let poll = create(
        &app,
        json!({ "question": "Pick one", "options": ["A", "B"], "endDate": in_one_hour() }),
    )
    .await;
    let a = option_id(&poll, 0);

    let (status, body) = vote(&app, &poll, &a, None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Voter name is required for this poll");

    let (status, body) = vote(&app, &poll, &a, Some("")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Voter name is required for this poll");

    let (status, body) = vote(&app, &poll, "65f0c0ffee0000000000beef", Some("Alice")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Invalid option id");

    let (status, _) = vote(&app, &poll, "garbage", Some("Alice")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let current = fetch(&app, &poll).await;
    for option in current["options"].as_array().unwrap() {
        assert_eq!(option["votes"], 0);
        assert!(option["voters"].as_array().unwrap().is_empty());
    }
}

#[tokio::test]
async fn distinct_voters_accumulate_in_arrival_order() {
    let app = test_app();
    let poll = create(
        &app,
        json!({ "question": "Best day?", "options": ["Mon", "Fri"], "endDate": in_one_hour() }),
    )
    .await;
    let friday = option_id(&poll, 1);
    let voters = ["Ann", "Ben", "Cat", "Dan", "Eve"];

    for name in voters {
        let (status, _) = vote(&app, &poll, &friday, Some(name)).await;
        assert_eq!(status, StatusCode::OK);
    }

    let current = fetch(&app, &poll).await;
    assert_eq!(current["options"][1]["votes"], voters.len());
    let recorded: Vec<_> = current["options"][1]["voters"]
        .as_array()
        .unwrap()
        .iter()
        .map(|v| v["voterName"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(recorded, voters);
    assert_eq!(current["options"][0]["votes"], 0);
}

#[tokio::test]
async fn anonymous_polls_count_votes_without_voters() {
    let app = test_app();
    let poll = create(
        &app,
        json!({
            "question": "Anonymous?",
            "options": ["Yes", "No"],
            "endDate": in_one_hour(),
            "requireVoterName": false,
        }),
    )
    .await;
    let yes = option_id(&poll, 0);

    let (status, _) = vote(&app, &poll, &yes, None).await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = vote(&app, &poll, &yes, Some("Zed")).await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = vote(&app, &poll, &yes, Some("Zed")).await;
    assert_eq!(status, StatusCode::OK);

    let current = fetch(&app, &poll).await;
    assert_eq!(current["options"][0]["votes"], 3);
    assert_eq!(current["options"][0]["voters"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn expired_polls_reject_votes_but_stay_active() {
    let app = test_app();
    let poll = create(
        &app,
        json!({
            "question": "Too late?",
            "options": ["Yes"],
            "endDate": (Utc::now() - Duration::minutes(5)).to_rfc3339(),
        }),
    )
    .await;
    let yes = option_id(&poll, 0);

    let (status, body) = vote(&app, &poll, &yes, Some("Alice")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Poll is no longer active");

    let current = fetch(&app, &poll).await;
    assert_eq!(current["isActive"], true);
    assert_eq!(current["options"][0]["votes"], 0);
}

#[tokio::test]
async fn closing_twice_is_harmless() {
    let app = test_app();
    let poll = create(
        &app,
        json!({ "question": "Close me", "options": ["x"], "endDate": in_one_hour() }),
    )
    .await;
    let uri = format!("/api/polls/{}/close", poll["id"].as_str().unwrap());

    for _ in 0..2 {
        let (status, closed) = send(&app, Method::PATCH, &uri, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(closed["isActive"], false);
        assert_eq!(closed["id"], poll["id"]);
    }
}

#[tokio::test]
async fn end_date_accepts_millis_and_offsetless_forms() {
    let app = test_app();
    let millis = (Utc::now() + Duration::hours(1)).timestamp_millis();
    let cases = [
        (json!(millis), millis),
        (json!("2099-01-01"), 4_070_908_800_000),
        (json!("2099-01-01T12:00"), 4_070_952_000_000),
        (json!("2099-01-01T12:00:00"), 4_070_952_000_000),
        (json!("2099-01-01T12:00:00Z"), 4_070_952_000_000),
    ];

    for (end_date, expected) in cases {
        let poll = create(
            &app,
            json!({ "question": "When?", "options": ["Now"], "endDate": end_date }),
        )
        .await;
        let stored = chrono::DateTime::parse_from_rfc3339(poll["endDate"].as_str().unwrap()).unwrap();
        assert_eq!(stored.timestamp_millis(), expected, "endDate {end_date}");
    }

    let (status, _) = send(
        &app,
        Method::POST,
        "/api/polls",
        Some(json!({ "question": "When?", "options": ["Now"], "endDate": "someday" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn millisecond_end_date_polls_take_votes() {
    let app = test_app();
    let poll = create(
        &app,
        json!({
            "question": "Epoch?",
            "options": ["Yes"],
            "endDate": (Utc::now() + Duration::hours(1)).timestamp_millis(),
            "requireVoterName": false,
        }),
    )
    .await;

    let (status, _) = vote(&app, &poll, &option_id(&poll, 0), None).await;
    assert_eq!(status, StatusCode::OK);
}

/// Lets another request close the poll, or just lose the write, between a
/// vote's read and its guarded update.
struct RacingRepository {
    inner: InMemoryPollRepository,
    close_first: bool,
}

#[async_trait]
impl PollRepository for RacingRepository {
    async fn insert(&self, poll: Poll) -> AppResult<Poll> {
        self.inner.insert(poll).await
    }

    async fn find_all(&self) -> AppResult<Vec<Poll>> {
        self.inner.find_all().await
    }

    async fn find_by_id(&self, id: ObjectId) -> AppResult<Option<Poll>> {
        self.inner.find_by_id(id).await
    }

    async fn record_vote(&self, update: &VoteUpdate) -> AppResult<bool> {
        if self.close_first {
            self.inner.close(update.poll_id).await?;
            return self.inner.record_vote(update).await;
        }
        Ok(false)
    }

    async fn close(&self, id: ObjectId) -> AppResult<Option<Poll>> {
        self.inner.close(id).await
    }
}

fn racing_app(close_first: bool) -> Router {
    app(AppState::new(Arc::new(RacingRepository {
        inner: InMemoryPollRepository::new(),
        close_first,
    })))
}

#[tokio::test]
async fn lost_race_reports_the_rule_that_now_fails() {
    let app = racing_app(true);
    let poll = create(
        &app,
        json!({ "question": "Race?", "options": ["Go"], "endDate": in_one_hour() }),
    )
    .await;

    let (status, body) = vote(&app, &poll, &option_id(&poll, 0), Some("Alice")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Poll is no longer active");

    let current = fetch(&app, &poll).await;
    assert_eq!(current["isActive"], false);
    assert_eq!(current["options"][0]["votes"], 0);
}

#[tokio::test]
async fn lost_race_without_a_failing_rule_asks_for_retry() {
    let app = racing_app(false);
    let poll = create(
        &app,
        json!({ "question": "Race?", "options": ["Go"], "endDate": in_one_hour() }),
    )
    .await;

    let (status, body) = vote(&app, &poll, &option_id(&poll, 0), Some("Alice")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Vote could not be recorded, please retry");
}
