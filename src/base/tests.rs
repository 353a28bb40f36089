use mockito::{Matcher, Server};
use serde_json::json;

use super::*;

const API_KEY: &str = "secret";
const WORKSPACE: &str = "envision";
const PROJECT_ID: u64 = 2817;

fn base_for(server: &Server) -> Base {
    Base::new(Config::new(API_KEY, WORKSPACE, PROJECT_ID).with_base_url(server.url()))
}

#[test]
fn exposes_project_id_from_config() {
    let config = Config::new(API_KEY, WORKSPACE, PROJECT_ID);
    let base = Base::new(config.clone());
    assert!(base.config().is_valid());
    assert_eq!(base.project_id(), config.project_id());
}

#[test]
fn invalid_response_error_combines_field_messages() {
    let err = invalid_response_error("error", &json!({ "field": ["test error"] }));
    assert_eq!(err.to_string(), "error field test error");

    let err = invalid_response_error(
        "Unable to update task.",
        &json!({ "title": ["can't be blank", "is too short"], "column_id": ["is invalid"] }),
    );
    assert_eq!(
        err.to_string(),
        "Unable to update task. title can't be blank, title is too short, column_id is invalid"
    );
}

#[test]
fn invalid_response_error_falls_back_to_message() {
    let err = invalid_response_error("error", &json!("test error"));
    assert_eq!(err.to_string(), "error");

    let err = invalid_response_error("error", &json!({ "field": "not a list" }));
    assert_eq!(err.to_string(), "error");

    let err = invalid_response_error("error", &Value::Null);
    assert_eq!(err.to_string(), "error");
}

#[tokio::test]
async fn rejects_bad_parameters_before_any_request() {
    let mut server = Server::new_async().await;
    let never = server
        .mock("POST", Matcher::Any)
        .expect(0)
        .create_async()
        .await;
    let base = base_for(&server);

    let err = base.post("test", RequestOptions::default()).await.unwrap_err();
    assert_eq!(err.to_string(), "url must be a path starting with '/'.");

    let err = base
        .post("/test", RequestOptions::body(json!("wrong options")))
        .await
        .unwrap_err();
    assert_eq!(err.to_string(), "options body must be a JSON object.");

    never.assert_async().await;
}

#[tokio::test]
async fn get_sends_api_token_and_returns_records() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("GET", "/user/workspaces.json")
        .match_header("x-kanbanery-apitoken", API_KEY)
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"[{"type":"Workspace","name":"envision","projects":[]}]"#)
        .create_async()
        .await;

    let payload = base_for(&server)
        .get("/user/workspaces.json", RequestOptions::default())
        .await
        .unwrap();

    let records = payload.into_list().unwrap();
    assert_eq!(records[0]["type"], "Workspace");
    mock.assert_async().await;
}

#[tokio::test]
async fn get_fails_with_status_line_when_not_200() {
    let mut server = Server::new_async().await;
    server
        .mock("GET", "/test")
        .with_status(404)
        .create_async()
        .await;

    let err = base_for(&server)
        .get("/test", RequestOptions::default())
        .await
        .unwrap_err();
    assert_eq!(err.to_string(), "404 Not Found");
    assert!(err.is_not_found());
}

#[tokio::test]
async fn post_requires_201() {
    let mut server = Server::new_async().await;
    server
        .mock("POST", "/projects/2817/tasks.json")
        .with_status(200)
        .with_body("{}")
        .create_async()
        .await;

    let err = base_for(&server)
        .post(
            "/projects/2817/tasks.json",
            RequestOptions::body(json!({ "task": { "title": "Testing" } })),
        )
        .await
        .unwrap_err();
    assert_eq!(err.to_string(), "200 OK");
}

#[tokio::test]
async fn post_returns_created_record() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("POST", "/projects/2817/tasks.json")
        .match_body(Matcher::PartialJson(json!({
            "task": { "title": "Testing", "task_type_name": "Work Package" }
        })))
        .with_status(201)
        .with_header("content-type", "application/json")
        .with_body(r#"{"id":7,"title":"Testing","type":"Task"}"#)
        .create_async()
        .await;

    let record = base_for(&server)
        .post(
            "/projects/2817/tasks.json",
            RequestOptions::body(json!({
                "task": { "title": "Testing", "task_type_name": "Work Package" }
            })),
        )
        .await
        .unwrap()
        .into_object()
        .unwrap();

    assert_eq!(record["title"], "Testing");
    assert_eq!(record["type"], "Task");
    mock.assert_async().await;
}

#[tokio::test]
async fn put_keeps_error_body_on_failure() {
    let mut server = Server::new_async().await;
    server
        .mock("PUT", "/tasks/2.json")
        .with_status(422)
        .with_header("content-type", "application/json")
        .with_body(r#"{"title":["can't be blank"]}"#)
        .create_async()
        .await;

    let err = base_for(&server)
        .put("/tasks/2.json", RequestOptions::body(json!({ "task": {} })))
        .await
        .unwrap_err();

    match err {
        Error::Status { code, status, body } => {
            assert_eq!(code, 422);
            assert_eq!(status, "422 Unprocessable Entity");
            assert_eq!(body, Some(json!({ "title": ["can't be blank"] })));
        }
        other => panic!("expected status error, got {other:?}"),
    }
}

#[tokio::test]
async fn scalar_body_is_rejected() {
    let mut server = Server::new_async().await;
    server
        .mock("GET", "/tasks/1.json")
        .with_status(200)
        .with_body("42")
        .create_async()
        .await;

    let err = base_for(&server)
        .get("/tasks/1.json", RequestOptions::default())
        .await
        .unwrap_err();
    assert!(matches!(err, Error::UnexpectedPayload(_)));
}

#[tokio::test]
async fn finds_project_id_by_name() {
    let mut server = Server::new_async().await;
    server
        .mock("GET", "/user/workspaces.json")
        .with_status(200)
        .with_body(
            json!([
                { "name": "other", "projects": [{ "id": 1, "name": "Envision Integration" }] },
                { "name": "envision", "projects": [
                    { "id": 99, "name": "Marketing" },
                    { "id": 2817, "name": "Envision Integration" }
                ]}
            ])
            .to_string(),
        )
        .create_async()
        .await;
    let base = base_for(&server);

    assert_eq!(
        base.project_id_for("Envision Integration").await.unwrap(),
        Some(PROJECT_ID)
    );
    assert_eq!(base.project_id_for("Invalid Project").await.unwrap(), None);
}

#[tokio::test]
async fn get_forwards_query_parameters() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("GET", "/projects/2817/tasks.json")
        .match_query(Matcher::UrlEncoded("page".into(), "2".into()))
        .with_status(200)
        .with_body("[]")
        .create_async()
        .await;

    let records = base_for(&server)
        .get(
            "/projects/2817/tasks.json",
            RequestOptions::default().query("page", "2"),
        )
        .await
        .unwrap()
        .into_list()
        .unwrap();

    assert!(records.is_empty());
    mock.assert_async().await;
}

#[tokio::test]
async fn skewed_date_header_rectifies_timestamps() {
    use crate::util::time::{format_timestamp, parse_timestamp, CLOCK_SKEW_SECS};
    use chrono::{Duration, Utc};

    let skew = Duration::seconds(CLOCK_SKEW_SECS);
    let date = (Utc::now() + skew)
        .format("%a, %d %b %Y %H:%M:%S GMT")
        .to_string();
    let sent = parse_http_date(&date).unwrap();

    let mut server = Server::new_async().await;
    server
        .mock("GET", "/tasks/42.json")
        .with_status(200)
        .with_header("date", &date)
        .with_body(json!({ "id": 42, "updated_at": format_timestamp(sent) }).to_string())
        .create_async()
        .await;

    let record = base_for(&server)
        .get("/tasks/42.json", RequestOptions::default())
        .await
        .unwrap()
        .into_object()
        .unwrap();

    assert_eq!(parse_timestamp(&record["updated_at"]), Some(sent - skew));
    assert_eq!(record["id"], 42);
}
