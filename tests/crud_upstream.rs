//! CRUD routes against HTTP session and engine backends.

use std::time::Duration;

use axum::http::StatusCode;
use secrecy::SecretString;

use api_gateway::config::GatewayConfig;
use api_gateway::http::HttpServer;
use api_gateway::security::TotpVerifier;

mod common;

const SESSION_BODY: &str =
    r#"{"user":{"name":"Ada","email":"ada@example.com"},"expires":"2030-01-01T00:00:00.000Z"}"#;

fn crud_config(secret_env: &str, session: std::net::SocketAddr, engine: std::net::SocketAddr) -> GatewayConfig {
    let mut config = GatewayConfig::default();
    config.auth.totp.secret_env = secret_env.to_string();
    config.auth.totp.window = 1;
    config.auth.session.url = format!("http://{}/api/auth/session", session);
    config.crud.engine_url = format!("http://{}", engine);
    config
}

fn current_code(secret: &str) -> String {
    let mut totp = GatewayConfig::default().auth.totp;
    totp.window = 1;
    TotpVerifier::from_config(SecretString::new(secret.to_string()), &totp).generate()
}

#[tokio::test]
async fn test_totp_request_reaches_engine() {
    std::env::set_var("CRUD_UPSTREAM_SECRET_TOTP", "upstream-secret");
    let (session, sessions_seen) = common::start_recording_backend(StatusCode::OK, vec![], "{}").await;
    let (engine, engine_seen) = common::start_recording_backend(
        StatusCode::CREATED,
        vec![("content-type", "application/json")],
        r#"{"id":1,"name":"x"}"#,
    )
    .await;
    let gateway = common::start_gateway(
        HttpServer::new(crud_config("CRUD_UPSTREAM_SECRET_TOTP", session, engine)).unwrap(),
    )
    .await;
    let code = current_code("upstream-secret");

    let res = common::client()
        .post(gateway.url("/api/rest/users?select=id"))
        .header("totp", code)
        .header("content-type", "application/json")
        .body(r#"{"name":"x"}"#)
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::CREATED);
    assert_eq!(res.text().await.unwrap(), r#"{"id":1,"name":"x"}"#);
    assert!(sessions_seen.lock().unwrap().is_empty());

    let seen = engine_seen.lock().unwrap();
    assert_eq!(seen.len(), 1);
    assert_eq!(seen[0].method, "POST");
    assert_eq!(seen[0].uri, "/users?select=id");
    assert_eq!(&seen[0].body[..], br#"{"name":"x"}"#);
    assert_eq!(seen[0].headers["content-type"], "application/json");
    assert!(seen[0].headers.get("totp").is_none());
}

#[tokio::test]
async fn test_cookie_session_reaches_engine() {
    std::env::set_var("CRUD_UPSTREAM_SECRET_SESSION", "upstream-secret");
    let (session, sessions_seen) = common::start_recording_backend(
        StatusCode::OK,
        vec![("content-type", "application/json")],
        SESSION_BODY,
    )
    .await;
    let (engine, engine_seen) = common::start_recording_backend(StatusCode::OK, vec![], "[]").await;
    let gateway = common::start_gateway(
        HttpServer::new(crud_config("CRUD_UPSTREAM_SECRET_SESSION", session, engine)).unwrap(),
    )
    .await;

    let res = common::client()
        .get(gateway.url("/api/rest/users"))
        .header("cookie", "next-auth.session-token=abc")
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::OK);

    let sessions = sessions_seen.lock().unwrap();
    assert_eq!(sessions.len(), 1);
    assert_eq!(sessions[0].uri, "/api/auth/session");
    assert_eq!(sessions[0].headers["cookie"], "next-auth.session-token=abc");

    let seen = engine_seen.lock().unwrap();
    assert_eq!(seen.len(), 1);
    assert_eq!(seen[0].uri, "/users");
}

#[tokio::test]
async fn test_empty_session_is_rejected() {
    std::env::set_var("CRUD_UPSTREAM_SECRET_EMPTY", "upstream-secret");
    let (session, _) = common::start_recording_backend(StatusCode::OK, vec![], "{}").await;
    let (engine, engine_seen) = common::start_recording_backend(StatusCode::OK, vec![], "[]").await;
    let gateway = common::start_gateway(
        HttpServer::new(crud_config("CRUD_UPSTREAM_SECRET_EMPTY", session, engine)).unwrap(),
    )
    .await;

    let res = common::client()
        .delete(gateway.url("/api/rest/users/1"))
        .header("cookie", "next-auth.session-token=expired")
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(res.text().await.unwrap(), r#"{"message":"You must be logged in."}"#);
    assert!(engine_seen.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_engine_down() {
    std::env::set_var("CRUD_UPSTREAM_SECRET_DOWN", "upstream-secret");
    let (session, _) = common::start_recording_backend(StatusCode::OK, vec![], SESSION_BODY).await;
    let engine = common::closed_port().await;
    let gateway = common::start_gateway(
        HttpServer::new(crud_config("CRUD_UPSTREAM_SECRET_DOWN", session, engine)).unwrap(),
    )
    .await;

    let res = common::client()
        .get(gateway.url("/api/rest/users"))
        .header("cookie", "next-auth.session-token=abc")
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::BAD_GATEWAY);
    assert_eq!(res.text().await.unwrap(), r#"{"message":"CRUD engine unavailable."}"#);
}

#[tokio::test]
async fn test_session_authority_error() {
    std::env::set_var("CRUD_UPSTREAM_SECRET_ERROR", "upstream-secret");
    let (session, _) =
        common::start_recording_backend(StatusCode::INTERNAL_SERVER_ERROR, vec![], "boom").await;
    let (engine, engine_seen) = common::start_recording_backend(StatusCode::OK, vec![], "[]").await;
    let gateway = common::start_gateway(
        HttpServer::new(crud_config("CRUD_UPSTREAM_SECRET_ERROR", session, engine)).unwrap(),
    )
    .await;

    let res = common::client()
        .get(gateway.url("/api/rest/users"))
        .header("cookie", "next-auth.session-token=abc")
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert!(engine_seen.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_reload_keeps_totp_header_name() {
    std::env::set_var("CRUD_UPSTREAM_SECRET_RENAME", "upstream-secret");
    let (session, _) = common::start_recording_backend(StatusCode::OK, vec![], "{}").await;
    let (engine, engine_seen) = common::start_recording_backend(StatusCode::OK, vec![], "[]").await;
    let config = crud_config("CRUD_UPSTREAM_SECRET_RENAME", session, engine);
    let gateway = common::start_gateway(HttpServer::new(config.clone()).unwrap()).await;

    let mut renamed = config.clone();
    renamed.auth.totp.header = "x-otp".to_string();
    gateway.updates.send(renamed).unwrap();
    tokio::time::sleep(Duration::from_millis(100)).await;

    let client = common::client();
    let res = client
        .get(gateway.url("/api/rest/users"))
        .header("x-otp", current_code("upstream-secret"))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    assert!(engine_seen.lock().unwrap().is_empty());

    let res = client
        .get(gateway.url("/api/rest/users"))
        .header("totp", current_code("upstream-secret"))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    let seen = engine_seen.lock().unwrap();
    assert_eq!(seen.len(), 1);
    assert!(seen[0].headers.get("totp").is_none());
    assert!(seen[0].headers.get("x-otp").is_none());
}
