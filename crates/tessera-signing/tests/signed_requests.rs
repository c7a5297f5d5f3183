//! End-to-end signing tests against a verifying HTTP server
//!
//! The server recomputes the signature from the transmitted Date, Digest
//! and target, so these tests catch any drift between what the client
//! signs and what it actually puts on the wire.

use axum::body::Bytes;
use axum::extract::OriginalUri;
use axum::http::{HeaderMap, Method, StatusCode};
use axum::routing::get;
use axum::Router;

use tessera_signing::{Credentials, RequestSigner, SigningClient};

const KEY_ID: &str = "svc-1";
const SECRET: &[u8] = b"integration test secret";

async fn verify(
    method: Method,
    OriginalUri(uri): OriginalUri,
    headers: HeaderMap,
    body: Bytes,
) -> StatusCode {
    let signer = RequestSigner::new(Credentials::new(KEY_ID, SECRET.to_vec()).unwrap());

    let Some(date) = headers.get("date").and_then(|v| v.to_str().ok()) else {
        return StatusCode::UNAUTHORIZED;
    };
    let target = uri
        .path_and_query()
        .map(|pq| pq.as_str().to_string())
        .unwrap_or_else(|| uri.path().to_string());

    let body = (!body.is_empty()).then(|| body.to_vec());
    let expected = signer.sign(method.as_str(), &target, date, body.as_deref());

    let digest = headers.get("digest").and_then(|v| v.to_str().ok());
    if digest != expected.digest.as_deref() {
        return StatusCode::UNAUTHORIZED;
    }
    match headers.get("authorization").and_then(|v| v.to_str().ok()) {
        Some(received) if received == expected.authorization => StatusCode::OK,
        _ => StatusCode::UNAUTHORIZED,
    }
}

async fn spawn_server() -> String {
    let app = Router::new().route("/accounts", get(verify).post(verify));
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{addr}")
}

fn client(secret: &[u8]) -> SigningClient {
    SigningClient::new(Credentials::new(KEY_ID, secret.to_vec()).unwrap())
}

#[tokio::test]
async fn test_get_authenticates() {
    let base = spawn_server().await;
    let client = client(SECRET);

    let response = client
        .send(
            client
                .http()
                .get(format!("{base}/accounts"))
                .query(&[("filter", "bob")]),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_post_with_body_authenticates() {
    let base = spawn_server().await;
    let client = client(SECRET);

    let response = client
        .send(
            client
                .http()
                .post(format!("{base}/accounts"))
                .body("{\"filter\":\"bob\"}"),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_explicit_date_is_transmitted_and_signed() {
    let base = spawn_server().await;
    let client = client(SECRET);

    let response = client
        .send(
            client
                .http()
                .get(format!("{base}/accounts"))
                .header("Date", "Tue, 01 Jan 2030 00:00:00 GMT"),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_wrong_secret_is_rejected() {
    let base = spawn_server().await;
    let client = client(b"some other secret");

    let response = client
        .send(client.http().get(format!("{base}/accounts")))
        .await
        .unwrap();
    // Pass-through semantics: the non-success status comes back uninterpreted
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_tampered_body_is_rejected() {
    let base = spawn_server().await;
    let signer = RequestSigner::new(Credentials::new(KEY_ID, SECRET.to_vec()).unwrap());

    // Sign one body, transmit another; the server's digest check must fail
    let signed = signer.sign(
        "POST",
        "/accounts",
        "Tue, 01 Jan 2030 00:00:00 GMT",
        Some(b"{\"filter\":\"bob\"}"),
    );
    let response = reqwest::Client::new()
        .post(format!("{base}/accounts"))
        .header("Date", signed.date)
        .header("Digest", signed.digest.unwrap())
        .header("Authorization", signed.authorization)
        .body("{\"filter\":\"mallory\"}")
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}
