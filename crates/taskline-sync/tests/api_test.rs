use taskline_sync::api::{ChatApi, HttpChatApi, ThreadPatch};
use taskline_sync::error::SyncError;
use taskline_types::ThreadStatus;

const THREAD_BODY: &str = r#"{
    "id": "t1",
    "title": "Bug Report",
    "status": "ACTIVE",
    "created_at": "2024-01-01T00:00:00Z",
    "updated_at": "2024-01-01T00:00:00Z",
    "unread_count": 0
}"#;

#[tokio::test]
async fn test_create_thread_posts_title() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/api/threads")
        .match_body(mockito::Matcher::PartialJson(serde_json::json!({
            "title": "Bug Report"
        })))
        .with_status(201)
        .with_header("content-type", "application/json")
        .with_body(THREAD_BODY)
        .create_async()
        .await;

    let api = HttpChatApi::new(server.url());
    let thread = api.create_thread("Bug Report", None).await.unwrap();

    assert_eq!(thread.id, "t1");
    assert_eq!(thread.status, ThreadStatus::Active);
    mock.assert_async().await;
}

#[tokio::test]
async fn test_list_threads_parses_array() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("GET", "/api/threads")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(format!("[{}]", THREAD_BODY))
        .create_async()
        .await;

    let api = HttpChatApi::new(server.url());
    let threads = api.list_threads().await.unwrap();

    assert_eq!(threads.len(), 1);
    assert_eq!(threads[0].title, "Bug Report");
}

#[tokio::test]
async fn test_non_2xx_preserves_status_and_body() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("GET", "/api/threads")
        .with_status(503)
        .with_body("maintenance window")
        .create_async()
        .await;

    let api = HttpChatApi::new(server.url());
    let error = api.list_threads().await.unwrap_err();

    match error {
        SyncError::Status { status, body } => {
            assert_eq!(status.as_u16(), 503);
            assert_eq!(body, "maintenance window");
        }
        other => panic!("Expected Status error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_list_messages_passes_before_cursor() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("GET", "/api/threads/t1/messages")
        .match_query(mockito::Matcher::UrlEncoded(
            "before".into(),
            "m42".into(),
        ))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body("[]")
        .create_async()
        .await;

    let api = HttpChatApi::new(server.url());
    let messages = api.list_messages("t1", Some("m42")).await.unwrap();

    assert!(messages.is_empty());
    mock.assert_async().await;
}

#[tokio::test]
async fn test_update_thread_patches_only_set_fields() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("PATCH", "/api/threads/t1")
        .match_body(mockito::Matcher::Json(serde_json::json!({
            "status": "ARCHIVED"
        })))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(THREAD_BODY)
        .create_async()
        .await;

    let api = HttpChatApi::new(server.url());
    let patch = ThreadPatch {
        status: Some(ThreadStatus::Archived),
        ..Default::default()
    };
    api.update_thread("t1", &patch).await.unwrap();

    mock.assert_async().await;
}

#[tokio::test]
async fn test_mark_notifications_read_posts() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/api/threads/t1/read")
        .with_status(204)
        .create_async()
        .await;

    let api = HttpChatApi::new(server.url());
    api.mark_notifications_read("t1").await.unwrap();

    mock.assert_async().await;
}

#[tokio::test]
async fn test_send_message_returns_canonical_message() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("POST", "/api/threads/t1/messages")
        .match_body(mockito::Matcher::PartialJson(serde_json::json!({
            "content": "hello"
        })))
        .with_status(201)
        .with_header("content-type", "application/json")
        .with_body(
            r#"{
                "id": "m1",
                "thread_id": "t1",
                "role": "user",
                "content": "hello",
                "created_at": "2024-01-01T00:00:00Z"
            }"#,
        )
        .create_async()
        .await;

    let api = HttpChatApi::new(server.url());
    let message = api.send_message("t1", "hello", &[]).await.unwrap();

    assert_eq!(message.id, "m1");
    assert_eq!(message.content, "hello");
}
