//! End-to-end routing behavior: interception, partition resolution,
//! authentication, and error surfaces.

mod common;

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use tower::ServiceExt;

use common::{basic_auth, body_bytes, body_json, test_app, PASSWORD};

#[tokio::test]
async fn test_enumerate_with_credentials_reaches_backend() {
    let (app, storage) = test_app();
    let req = Request::builder()
        .uri("/camli/enumerate-blobs")
        .header(header::AUTHORIZATION, basic_auth(PASSWORD))
        .body(Body::empty())
        .unwrap();

    let resp = app.oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let json = body_json(resp).await;
    assert_eq!(json["blobs"], serde_json::json!([]));
    assert_eq!(storage.call_count(), 1);
}

#[tokio::test]
async fn test_enumerate_without_credentials_never_reaches_backend() {
    let (app, storage) = test_app();
    let req = Request::builder()
        .uri("/camli/enumerate-blobs")
        .body(Body::empty())
        .unwrap();

    let resp = app.oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    assert!(resp.headers().contains_key(header::WWW_AUTHENTICATE));
    assert_eq!(storage.call_count(), 0);
}

#[tokio::test]
async fn test_wrong_password_rejected() {
    let (app, storage) = test_app();
    let req = Request::builder()
        .uri("/camli/enumerate-blobs")
        .header(header::AUTHORIZATION, basic_auth("wrong"))
        .body(Body::empty())
        .unwrap();

    let resp = app.oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(storage.call_count(), 0);
}

#[tokio::test]
async fn test_upload_to_unknown_partition_never_reaches_backend() {
    let (app, storage) = test_app();
    let req = Request::builder()
        .method("POST")
        .uri("/partition-unknown/camli/upload")
        .header(header::AUTHORIZATION, basic_auth(PASSWORD))
        .body(Body::empty())
        .unwrap();

    let resp = app.oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body = body_bytes(resp).await;
    assert_eq!(&body[..], b"Unconfigured partition.");
    assert_eq!(storage.call_count(), 0);
}

#[tokio::test]
async fn test_interceptor_claims_configured_partition_path() {
    let (app, storage) = test_app();
    let req = Request::builder()
        .uri("/partition-queue-indexer/camli/enumerate-blobs")
        .header(header::AUTHORIZATION, basic_auth(PASSWORD))
        .body(Body::empty())
        .unwrap();

    let resp = app.oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(storage.call_count(), 1);
}

#[tokio::test]
async fn test_bogus_prefix_is_client_error() {
    let (app, storage) = test_app();
    let req = Request::builder()
        .uri("/bogus-foo/camli/stat")
        .body(Body::empty())
        .unwrap();

    let resp = app.oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert_eq!(storage.call_count(), 0);
}

#[tokio::test]
async fn test_unsupported_method_action_combination() {
    let (app, _) = test_app();
    let req = Request::builder()
        .method("DELETE")
        .uri("/camli/sha1-0beec7b5")
        .header(header::AUTHORIZATION, basic_auth(PASSWORD))
        .body(Body::empty())
        .unwrap();

    let resp = app.oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body = body_bytes(resp).await;
    assert_eq!(&body[..], b"Unsupported blob path or method.");
}

#[tokio::test]
async fn test_upload_to_read_only_queue_partition_rejected() {
    let (app, storage) = test_app();
    let req = Request::builder()
        .method("POST")
        .uri("/partition-queue-indexer/camli/upload")
        .header(header::AUTHORIZATION, basic_auth(PASSWORD))
        .body(Body::empty())
        .unwrap();

    let resp = app.oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
    assert_eq!(storage.call_count(), 0);
}

#[tokio::test]
async fn test_remove_from_main_partition_rejected() {
    let (app, storage) = test_app();
    let req = Request::builder()
        .method("POST")
        .uri("/camli/remove")
        .header(header::AUTHORIZATION, basic_auth(PASSWORD))
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(Body::from("blob1=sha1-aa11"))
        .unwrap();

    let resp = app.oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
    assert_eq!(storage.call_count(), 0);
}

#[tokio::test]
async fn test_root_page_is_served() {
    let (app, _) = test_app();
    let req = Request::builder().uri("/").body(Body::empty()).unwrap();

    let resp = app.oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let body = body_bytes(resp).await;
    assert!(std::str::from_utf8(&body).unwrap().contains("blobstored"));
}

#[tokio::test]
async fn test_responses_carry_request_id() {
    let (app, _) = test_app();
    let req = Request::builder().uri("/").body(Body::empty()).unwrap();

    let resp = app.oneshot(req).await.unwrap();
    assert!(resp.headers().contains_key("x-request-id"));
}

#[tokio::test]
async fn test_client_request_id_is_echoed() {
    let (app, _) = test_app();
    let req = Request::builder()
        .uri("/")
        .header("x-request-id", "caller-chosen-id")
        .body(Body::empty())
        .unwrap();

    let resp = app.oneshot(req).await.unwrap();
    assert_eq!(resp.headers()["x-request-id"], "caller-chosen-id");
}
