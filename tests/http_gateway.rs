//! HTTP gateway and chat stream against a mock task service.

use std::sync::Arc;

use futures_util::StreamExt;
use pretty_assertions::assert_eq;
use serde_json::json;
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use taskdeck::chat::{ChatClient, ChatError, ChatEvent, ChatRequest, ChatTranscript};
use taskdeck::controller::{TaskController, TaskError};
use taskdeck::gateway::{GatewayError, HttpGateway, TaskGateway};
use taskdeck::model::filter::StatusFilter;
use taskdeck::model::task::{Priority, TaskDraft, TaskPatch};
use taskdeck::notify::{Severity, ToastQueue};

fn task_json(id: i64, title: &str, completed: bool) -> serde_json::Value {
    json!({
        "id": id,
        "user_id": "u1",
        "title": title,
        "description": "",
        "completed": completed,
        "priority": "medium",
        "due_date": null,
        "created_at": "2025-12-13T10:00:00",
        "updated_at": "2025-12-13T10:00:00"
    })
}

fn gateway(server: &MockServer) -> HttpGateway {
    HttpGateway::new(server.uri(), "u1", Some("tok".to_string()))
}

#[tokio::test]
async fn list_accepts_bare_array_and_sends_bearer() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/u1/tasks"))
        .and(query_param("status", "all"))
        .and(header("authorization", "Bearer tok"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            task_json(2, "second", false),
            task_json(1, "first", true),
        ])))
        .mount(&server)
        .await;

    let tasks = gateway(&server).list(StatusFilter::All).await.unwrap();
    let titles: Vec<&str> = tasks.iter().map(|t| t.title.as_str()).collect();
    assert_eq!(titles, vec!["second", "first"]);
    assert!(tasks[1].completed);
    assert_eq!(tasks[0].owner, "u1");
}

#[tokio::test]
async fn list_accepts_wrapped_object() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/u1/tasks"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({ "tasks": [task_json(7, "wrapped", false)] })),
        )
        .mount(&server)
        .await;

    let tasks = gateway(&server).list(StatusFilter::Pending).await.unwrap();
    assert_eq!(tasks.len(), 1);
    assert_eq!(tasks[0].id, 7);
}

#[tokio::test]
async fn create_posts_draft() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/u1/tasks"))
        .and(body_json(json!({ "title": "Buy milk", "priority": "high" })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "id": 9,
            "user_id": "u1",
            "title": "Buy milk",
            "completed": false,
            "priority": "high",
            "created_at": "2025-12-13T10:00:00",
            "updated_at": "2025-12-13T10:00:00"
        })))
        .mount(&server)
        .await;

    let draft = TaskDraft {
        priority: Some(Priority::High),
        ..TaskDraft::new("Buy milk")
    };
    let task = gateway(&server).create(&draft).await.unwrap();
    assert_eq!(task.id, 9);
    assert_eq!(task.priority, Priority::High);
    assert_eq!(task.description, None);
}

#[tokio::test]
async fn errors_carry_detail_or_status() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path("/api/u1/tasks/3"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({ "detail": "Title too long" })))
        .mount(&server)
        .await;
    Mock::given(method("PATCH"))
        .and(path("/api/u1/tasks/3/complete"))
        .respond_with(ResponseTemplate::new(502).set_body_string("bad gateway"))
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/api/u1/tasks/4"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({ "detail": "Task not found" })))
        .mount(&server)
        .await;

    let gw = gateway(&server);
    let err = gw.update(3, &TaskPatch::completed(true)).await.unwrap_err();
    assert_eq!(
        err,
        GatewayError::Http {
            status: 400,
            message: "Title too long".into()
        }
    );

    let err = gw.toggle_complete(3).await.unwrap_err();
    assert_eq!(err.to_string(), "HTTP 502: Bad Gateway");

    let err = gw.delete(4).await.unwrap_err();
    assert_eq!(err, GatewayError::NotFound("Task not found".into()));
}

#[tokio::test]
async fn controller_prunes_task_missing_on_server() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/u1/tasks"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([task_json(4, "gone soon", false)])))
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/api/u1/tasks/4"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({ "detail": "Task not found" })))
        .mount(&server)
        .await;

    let toasts = Arc::new(ToastQueue::new());
    let ctl = TaskController::new(gateway(&server), Arc::clone(&toasts));
    assert_eq!(ctl.load().await.unwrap(), 1);

    let err = ctl.delete(4).await.unwrap_err();
    assert!(matches!(err, TaskError::NotFound { id: 4, .. }));
    assert!(ctl.tasks().is_empty());
    let toast = toasts.all().pop().unwrap();
    assert_eq!(toast.severity, Severity::Warning);
    assert_eq!(toast.message, "Task #4 was already deleted");
}

#[tokio::test]
async fn failed_load_reports_and_clears() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/u1/tasks"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let toasts = Arc::new(ToastQueue::new());
    let ctl = TaskController::new(gateway(&server), Arc::clone(&toasts));
    assert!(matches!(ctl.load().await, Err(TaskError::Fetch(_))));
    assert!(ctl.tasks().is_empty());
    assert_eq!(
        toasts.all()[0].message,
        "Failed to load tasks: HTTP 503: Service Unavailable"
    );
}

fn sse(events: &[serde_json::Value]) -> String {
    events.iter().map(|e| format!("data: {e}\n\n")).collect()
}

#[tokio::test]
async fn chat_stream_decodes_events() {
    let server = MockServer::start().await;
    let body = sse(&[
        json!({ "type": "conversation_id", "conversation_id": 12 }),
        json!({ "type": "tool_call", "tool": "add_task", "parameters": { "title": "Call mom" } }),
        json!({ "type": "tool_result", "tool": "add_task", "result": { "task_id": 5 } }),
        json!({ "type": "content", "content": "Added " }),
        json!({ "type": "content", "content": "it." }),
        json!({ "type": "heartbeat" }),
        json!({ "type": "done", "full_response": "Added it." }),
    ]);
    Mock::given(method("POST"))
        .and(path("/api/u1/chat/stream"))
        .and(header("authorization", "Bearer tok"))
        .and(body_json(json!({ "message": "remind me to call mom" })))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("content-type", "text/event-stream")
                .set_body_string(body),
        )
        .mount(&server)
        .await;

    let client = ChatClient::new(server.uri(), "u1", Some("tok".to_string()));
    let request = ChatRequest::new("  remind me to call mom ", None).unwrap();
    let events: Vec<ChatEvent> = client
        .stream(&request)
        .await
        .unwrap()
        .map(|e| e.unwrap())
        .collect()
        .await;
    assert_eq!(events.len(), 7);
    assert_eq!(events[5], ChatEvent::Unknown);

    let mut transcript = ChatTranscript::new();
    transcript.begin(&request.message);
    for event in &events {
        transcript.apply(event);
    }
    assert_eq!(transcript.conversation_id, Some(12));
    let reply = transcript.last_reply().unwrap();
    assert_eq!(reply.text, "Added it.");
    assert_eq!(reply.tools.len(), 1);
    assert_eq!(reply.tools[0].tool, "add_task");
}

#[tokio::test]
async fn chat_http_error_surfaces_before_stream() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/u1/chat/stream"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({ "detail": "Not authenticated" })))
        .mount(&server)
        .await;

    let client = ChatClient::new(server.uri(), "u1", None);
    let request = ChatRequest::new("hi", None).unwrap();
    let Err(err) = client.stream(&request).await else {
        panic!("expected an error");
    };
    assert_eq!(
        err,
        ChatError::Gateway(GatewayError::Http {
            status: 401,
            message: "Not authenticated".into()
        })
    );
}
