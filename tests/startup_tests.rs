//! Tests for startup validation and the library server entry point.

use std::process::{Command, Stdio};
use std::sync::Arc;

use quillpost::rate_limit::RateLimitConfig;
use quillpost::{ServerConfig, db::Database, start_server};

fn run_binary(jwt_secret: Option<&str>) -> (bool, String) {
    let mut command = Command::new(env!("CARGO_BIN_EXE_quillpost"));
    command
        .env_remove("JWT_SECRET")
        .env("DATABASE_PATH", ":memory:")
        .stderr(Stdio::piped())
        .stdout(Stdio::piped());
    if let Some(secret) = jwt_secret {
        command.env("JWT_SECRET", secret);
    }

    let output = command.output().expect("Failed to run binary");

    // tracing logs to stdout by default
    let combined = format!(
        "{}{}",
        String::from_utf8_lossy(&output.stdout),
        String::from_utf8_lossy(&output.stderr)
    );
    (output.status.success(), combined)
}

#[test]
fn test_missing_jwt_secret_exits_with_error() {
    let (success, output) = run_binary(None);

    assert!(!success, "Should exit with error when JWT_SECRET is missing");
    assert!(
        output.contains("JWT_SECRET") && output.contains("required"),
        "Should mention JWT_SECRET is required, got: {}",
        output
    );
}

#[test]
fn test_short_jwt_secret_exits_with_error() {
    let (success, output) = run_binary(Some("too-short"));

    assert!(!success, "Should exit with error when JWT_SECRET is short");
    assert!(
        output.contains("shorter than"),
        "Should mention the secret is too short, got: {}",
        output
    );
}

#[tokio::test]
async fn test_start_server_accepts_connections() {
    let db = Database::open(":memory:").await.unwrap();
    let config = ServerConfig {
        db,
        jwt_secret: b"test-jwt-secret-that-is-long-enough".to_vec(),
        access_token_secs: 1800,
        refresh_token_secs: 3600,
        secure_cookies: false,
        no_signup: false,
        rate_limit: Arc::new(RateLimitConfig::default()),
    };

    let (handle, addr) = start_server(config, 0).await.unwrap();
    assert_ne!(addr.port(), 0);

    tokio::net::TcpStream::connect(addr)
        .await
        .expect("Server should accept connections");

    handle.abort();
}
