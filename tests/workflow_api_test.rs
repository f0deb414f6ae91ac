use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use bytes::Bytes;
use http_body_util::BodyExt;
use sea_orm::{ConnectOptions, Database};
use serde_json::{Value, json};
use tower::ServiceExt;

use invoice_flow::config::AppConfig;
use invoice_flow::infrastructure::database::run_migrations;
use invoice_flow::services::file_service::FileService;
use invoice_flow::services::object_store::MemoryObjectStore;
use invoice_flow::services::reconciler::Reconciler;
use invoice_flow::services::status_table::SeaOrmStatusTable;
use invoice_flow::{AppState, create_app};

const BOUNDARY: &str = "---------------------------123456789012345678901234567";

async fn setup_app() -> (Router, Arc<MemoryObjectStore>) {
    // A single connection keeps every query on the same in-memory database
    let mut opt = ConnectOptions::new("sqlite::memory:");
    opt.max_connections(1).sqlx_logging(false);
    let db = Database::connect(opt).await.unwrap();
    run_migrations(&db).await.unwrap();

    let store = Arc::new(MemoryObjectStore::default());
    let table = Arc::new(SeaOrmStatusTable::new(db.clone()));
    let reconciler = Arc::new(Reconciler::new(store.clone(), table.clone()));
    let files = Arc::new(FileService::new(
        store.clone(),
        table,
        AppConfig::development(),
    ));

    let state = AppState {
        db,
        files,
        reconciler,
        config: AppConfig::development(),
    };
    (create_app(state), store)
}

fn multipart_upload(filename: &str, content: &str) -> Request<Body> {
    let body = format!(
        "--{boundary}\r\n\
        Content-Disposition: form-data; name=\"file\"; filename=\"{filename}\"\r\n\
        Content-Type: application/pdf\r\n\r\n\
        {content}\r\n\
        --{boundary}--\r\n",
        boundary = BOUNDARY,
        filename = filename,
        content = content,
    );
    Request::builder()
        .method("POST")
        .uri("/upload")
        .header(
            "Content-Type",
            format!("multipart/form-data; boundary={}", BOUNDARY),
        )
        .body(Body::from(body))
        .unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn post_json(uri: &str, payload: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("Content-Type", "application/json")
        .body(Body::from(payload.to_string()))
        .unwrap()
}

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn test_upload_then_list() {
    let (app, _store) = setup_app().await;

    let response = app
        .clone()
        .oneshot(multipart_upload("facture-01.pdf", "%PDF-1.4 invoice body"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["uploaded"], 1);
    assert_eq!(json["results"][0]["ok"], true);

    let response = app.clone().oneshot(get("/files")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["total"], 1);
    assert_eq!(json["items"][0]["name"], "facture-01.pdf");
    assert_eq!(json["items"][0]["status"], "to_do");

    let response = app.clone().oneshot(get("/objects")).await.unwrap();
    let json = body_json(response).await;
    assert_eq!(json.as_array().unwrap().len(), 1);
    assert_eq!(json[0]["name"], "facture-01.pdf");
}

#[tokio::test]
async fn test_upload_rejects_non_pdf_content() {
    let (app, _store) = setup_app().await;

    // Extension says pdf, magic bytes say otherwise
    let response = app
        .clone()
        .oneshot(multipart_upload("fake.pdf", "MZ not a pdf"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["uploaded"], 0);
    assert_eq!(json["results"][0]["ok"], false);

    let response = app.clone().oneshot(get("/objects")).await.unwrap();
    let json = body_json(response).await;
    assert!(json.as_array().unwrap().is_empty());

    let response = app.clone().oneshot(get("/files")).await.unwrap();
    let json = body_json(response).await;
    assert_eq!(json["total"], 0);
}

#[tokio::test]
async fn test_status_save_collapses_duplicates_and_filters_apply() {
    let (app, _store) = setup_app().await;

    for name in ["a.pdf", "b.pdf"] {
        let response = app
            .clone()
            .oneshot(multipart_upload(name, "%PDF-1.4 body"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    let response = app.clone().oneshot(get("/files?sort_by=name")).await.unwrap();
    let json = body_json(response).await;
    let first_id = json["items"][0]["id"].as_i64().unwrap();

    // Restaging the same id keeps only the last change
    let response = app
        .clone()
        .oneshot(post_json(
            "/workflow/status",
            json!({
                "changes": [
                    {"id": first_id, "status": "to_pay"},
                    {"id": first_id, "status": "to_archive"}
                ]
            }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["updated"], 1);

    let response = app
        .clone()
        .oneshot(get("/files?status=to_archive"))
        .await
        .unwrap();
    let json = body_json(response).await;
    assert_eq!(json["total"], 1);
    assert_eq!(json["items"][0]["id"].as_i64().unwrap(), first_id);

    let response = app
        .clone()
        .oneshot(get("/files?search=A.PDF"))
        .await
        .unwrap();
    let json = body_json(response).await;
    assert_eq!(json["total"], 1);
}

#[tokio::test]
async fn test_empty_status_batch_is_a_no_op() {
    let (app, _store) = setup_app().await;

    let response = app
        .clone()
        .oneshot(post_json("/workflow/status", json!({"changes": []})))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["updated"], 0);
}

#[tokio::test]
async fn test_bulk_delete_rejects_empty_selection() {
    let (app, store) = setup_app().await;
    store.seed("keep.pdf", Bytes::from_static(b"%PDF-1.4")).await;

    let response = app
        .clone()
        .oneshot(post_json("/files/delete", json!({"names": []})))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_json(response).await;
    assert!(json["error"].as_str().unwrap().contains("at least one"));

    // Nothing was removed
    let response = app.clone().oneshot(get("/objects")).await.unwrap();
    let json = body_json(response).await;
    assert_eq!(json.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_bulk_delete_leaves_rows_for_reconciliation() {
    let (app, _store) = setup_app().await;

    for name in ["a.pdf", "b.pdf"] {
        app.clone()
            .oneshot(multipart_upload(name, "%PDF-1.4 body"))
            .await
            .unwrap();
    }

    let response = app
        .clone()
        .oneshot(post_json("/files/delete", json!({"names": ["a.pdf"]})))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["deleted"], 1);

    // The row survives the blob until the reconciler runs
    let response = app.clone().oneshot(get("/files")).await.unwrap();
    let json = body_json(response).await;
    assert_eq!(json["total"], 2);

    let response = app
        .clone()
        .oneshot(post_json("/workflow/reconcile", json!({})))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["inserted"], 0);
    assert_eq!(json["deleted"], 1);
    assert_eq!(json["failed"], 0);

    let response = app.clone().oneshot(get("/files")).await.unwrap();
    let json = body_json(response).await;
    assert_eq!(json["total"], 1);
    assert_eq!(json["items"][0]["name"], "b.pdf");
}

#[tokio::test]
async fn test_single_delete_removes_blob_and_row() {
    let (app, _store) = setup_app().await;

    app.clone()
        .oneshot(multipart_upload("only.pdf", "%PDF-1.4 body"))
        .await
        .unwrap();

    let response = app.clone().oneshot(get("/files")).await.unwrap();
    let json = body_json(response).await;
    let id = json["items"][0]["id"].as_i64().unwrap();

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("DELETE")
                .uri(format!("/files/{}", id))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let response = app.clone().oneshot(get("/objects")).await.unwrap();
    let json = body_json(response).await;
    assert!(json.as_array().unwrap().is_empty());

    let response = app.clone().oneshot(get("/files")).await.unwrap();
    let json = body_json(response).await;
    assert_eq!(json["total"], 0);
}

#[tokio::test]
async fn test_reconcile_adopts_stray_blobs_but_not_placeholders() {
    let (app, store) = setup_app().await;
    store
        .seed("stray.pdf", Bytes::from_static(b"%PDF-1.4 out of band"))
        .await;
    store
        .seed(".emptyFolderPlaceholder", Bytes::from_static(b""))
        .await;

    let response = app
        .clone()
        .oneshot(post_json("/workflow/reconcile", json!({})))
        .await
        .unwrap();
    let json = body_json(response).await;
    assert_eq!(json["inserted"], 1);
    assert_eq!(json["deleted"], 0);

    let response = app.clone().oneshot(get("/files")).await.unwrap();
    let json = body_json(response).await;
    assert_eq!(json["total"], 1);
    assert_eq!(json["items"][0]["name"], "stray.pdf");
    assert_eq!(json["items"][0]["status"], "to_do");

    // The placeholder is also hidden from the raw object listing
    let response = app.clone().oneshot(get("/objects")).await.unwrap();
    let json = body_json(response).await;
    assert_eq!(json.as_array().unwrap().len(), 1);
    assert_eq!(json[0]["name"], "stray.pdf");
}

#[tokio::test]
async fn test_download_round_trip() {
    let (app, _store) = setup_app().await;

    app.clone()
        .oneshot(multipart_upload("invoice.pdf", "%PDF-1.4 the content"))
        .await
        .unwrap();

    let response = app
        .clone()
        .oneshot(get("/download/invoice.pdf"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers().get("content-type").unwrap(),
        "application/pdf"
    );
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    assert_eq!(&bytes[..], b"%PDF-1.4 the content");

    let response = app.clone().oneshot(get("/download/ghost.pdf")).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_statuses_endpoint_reports_fixed_progress_table() {
    let (app, _store) = setup_app().await;

    let response = app.clone().oneshot(get("/workflow/statuses")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    let stages = json.as_array().unwrap();
    assert_eq!(stages.len(), 6);

    let progress: Vec<u64> = stages
        .iter()
        .map(|s| s["progress"].as_u64().unwrap())
        .collect();
    assert_eq!(progress, [0, 20, 40, 60, 80, 100]);
    assert_eq!(stages[0]["status"], "to_do");
    assert_eq!(stages[5]["status"], "to_archive");
}

#[tokio::test]
async fn test_pagination_and_sorting() {
    let (app, _store) = setup_app().await;

    for name in ["c.pdf", "a.pdf", "b.pdf"] {
        app.clone()
            .oneshot(multipart_upload(name, "%PDF-1.4 body"))
            .await
            .unwrap();
    }

    let response = app
        .clone()
        .oneshot(get("/files?sort_by=name&order=desc&page=1&per_page=2"))
        .await
        .unwrap();
    let json = body_json(response).await;
    assert_eq!(json["total"], 3);
    assert_eq!(json["items"][0]["name"], "c.pdf");
    assert_eq!(json["items"][1]["name"], "b.pdf");

    let response = app
        .clone()
        .oneshot(get("/files?sort_by=name&order=desc&page=2&per_page=2"))
        .await
        .unwrap();
    let json = body_json(response).await;
    assert_eq!(json["items"].as_array().unwrap().len(), 1);
    assert_eq!(json["items"][0]["name"], "a.pdf");
}
