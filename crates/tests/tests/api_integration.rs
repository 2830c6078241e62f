use std::fs;

use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use axum::Router;
use coco_api::build_app;
use coco_core::ChatReply;
use coco_training::{run_training, TrainingInputs};
use serde_json::json;
use tempfile::TempDir;
use tower::ServiceExt;

fn trained_app() -> (TempDir, Router) {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path();

    fs::write(
        root.join("intents.csv"),
        "text,label\nda dầu mụn nên dùng gì,product_advice\nserum giá bao nhiêu,pricing\n",
    )
    .unwrap();
    fs::write(
        root.join("entities.jsonl"),
        "{\"label\": \"SKIN\", \"pattern\": \"mụn\"}\n{\"label\": \"PRODUCT\", \"pattern\": \"serum\"}\n",
    )
    .unwrap();
    fs::write(
        root.join("rules.json"),
        json!({
            "rules": [{"if": {"intent": "pricing"}, "reply": "Giá tham khảo 250k."}],
            "defaults": {"_fallback": "Xin lỗi, mình chưa hiểu."}
        })
        .to_string(),
    )
    .unwrap();

    let artifacts = root.join("artifacts");
    run_training(&TrainingInputs {
        intents_csv: root.join("intents.csv"),
        entities_jsonl: root.join("entities.jsonl"),
        rules_json: root.join("rules.json"),
        outdir: artifacts.clone(),
    })
    .expect("training should succeed");

    // rules.json sits beside the artifacts directory
    let app = build_app(&artifacts, None).expect("app should build");
    (dir, app)
}

async fn post_chat(app: Router, body: String) -> axum::response::Response {
    let request = Request::builder()
        .method("POST")
        .uri("/chat")
        .header("content-type", "application/json")
        .body(Body::from(body))
        .unwrap();
    app.oneshot(request).await.unwrap()
}

#[tokio::test]
async fn home_reports_running() {
    let (_dir, app) = trained_app();

    let response = app
        .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let parsed: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(parsed["message"], "CocoBot API is running");
}

#[tokio::test]
async fn health_lists_labels_and_metrics() {
    let (_dir, app) = trained_app();

    let response = app
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers().contains_key("x-request-id"));

    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let parsed: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(parsed["status"], "ok");
    assert_eq!(parsed["labels"], json!(["pricing", "product_advice"]));
    assert_eq!(parsed["rules"], 1);
    assert!(parsed.get("metrics").is_some());
}

#[tokio::test]
async fn chat_answers_pricing_query() {
    let (_dir, app) = trained_app();

    let response = post_chat(app, json!({"message": "serum này giá sao"}).to_string()).await;
    assert_eq!(response.status(), StatusCode::OK);

    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let reply: ChatReply = serde_json::from_slice(&body).unwrap();
    assert_eq!(reply.intent, "pricing");
    assert_eq!(reply.entities, vec!["PRODUCT:serum"]);
    assert_eq!(reply.reply, "Giá tham khảo 250k.");
}

#[tokio::test]
async fn chat_falls_back_for_unruled_intent() {
    let (_dir, app) = trained_app();

    let response = post_chat(app, json!({"message": "Da dầu MỤN nên dùng gì"}).to_string()).await;
    assert_eq!(response.status(), StatusCode::OK);

    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let reply: ChatReply = serde_json::from_slice(&body).unwrap();
    assert_eq!(reply.intent, "product_advice");
    assert_eq!(reply.entities, vec!["SKIN:mụn"]);
    assert_eq!(reply.reply, "Xin lỗi, mình chưa hiểu.");
}

#[tokio::test]
async fn chat_rejects_body_without_message() {
    let (_dir, app) = trained_app();

    let response = post_chat(app, json!({"text": "serum"}).to_string()).await;
    assert!(response.status().is_client_error());
}

#[test]
fn app_requires_trained_artifacts() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("rules.json"), "{}").unwrap();

    let err = build_app(dir.path().join("artifacts"), None).err().unwrap();
    assert!(err.to_string().contains("failed loading artifacts"));
}
