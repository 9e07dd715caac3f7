use anyhow::{Context, Result};
use jotpad::{
    api::{ApiClient, DEFAULT_TIMEOUT},
    schedule::ManualScheduler,
    session::{Credential, Lifetime, MemoryStorage, SessionStore, StorageArea},
    Error,
    shell::{Console, Shell},
};
use secrecy::SecretString;
use serde_json::json;
use std::{io::Cursor, sync::Arc};
use wiremock::{
    matchers::{body_json, header, method, path},
    Mock, MockServer, ResponseTemplate,
};

async fn run_shell(
    server: &MockServer,
    session: Arc<SessionStore>,
    start: &str,
    input: &str,
) -> Result<String> {
    let console = Console::new(Cursor::new(input.as_bytes().to_vec()), Vec::new());
    let api = ApiClient::new(&server.uri(), DEFAULT_TIMEOUT)?;
    let mut shell = Shell::new(console, api, session, Arc::new(ManualScheduler::new()));
    shell.run(start).await.context("shell run failed")?;

    let (_, output) = shell.into_console().into_inner();
    String::from_utf8(output).context("shell output is not UTF-8")
}

async fn mount_login(server: &MockServer, email: &str, otp: &str, token: &str) {
    Mock::given(method("POST"))
        .and(path("/login/send-otp"))
        .and(body_json(json!({ "email": email })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .expect(1)
        .mount(server)
        .await;
    Mock::given(method("POST"))
        .and(path("/login/verify-otp"))
        .and(body_json(json!({ "email": email, "otp": otp })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "token": token })))
        .expect(1)
        .mount(server)
        .await;
}

async fn mount_dashboard(server: &MockServer, token: &str, notes: serde_json::Value) {
    let bearer = format!("Bearer {token}");
    Mock::given(method("GET"))
        .and(path("/me"))
        .and(header("Authorization", bearer.as_str()))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "name": "Ada", "email": "ada@example.com" })),
        )
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path("/notes"))
        .and(header("Authorization", bearer.as_str()))
        .respond_with(ResponseTemplate::new(200).set_body_json(notes))
        .mount(server)
        .await;
}

#[tokio::test]
async fn sign_in_manage_notes_and_log_out() -> Result<()> {
    let server = MockServer::start().await;
    mount_login(&server, "ada@example.com", "123456", "tok-1").await;
    mount_dashboard(&server, "tok-1", json!([])).await;
    Mock::given(method("POST"))
        .and(path("/notes"))
        .and(body_json(json!({ "content": "buy milk" })))
        .respond_with(
            ResponseTemplate::new(201).set_body_json(json!({ "_id": "n1", "content": "buy milk" })),
        )
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/notes/n1"))
        .and(header("Authorization", "Bearer tok-1"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    let dir = tempfile::tempdir()?;
    let session = Arc::new(SessionStore::open(dir.path()));
    let input = "ada@example.com\n123456\ny\nadd buy milk\nlist\ndelete 1\ny\nlogout\n";
    let output = run_shell(&server, session.clone(), "/", input).await?;

    for expected in [
        "OTP sent to your email!",
        "Keep me logged in? [y/N] ",
        "Login successful!",
        "Welcome, Ada!",
        "ada@example.com",
        "No notes yet. Add one!",
        "Note added.",
        "1. buy milk",
        "Are you sure you want to delete this note? [y/N] ",
        "Note deleted.",
        "You have been logged out!",
    ] {
        assert!(output.contains(expected), "missing {expected:?} in:\n{output}");
    }
    assert!(!output.contains("tok-1"));
    assert!(!session.is_present());
    assert!(!SessionStore::open(dir.path()).is_present());
    Ok(())
}

#[tokio::test]
async fn keep_logged_in_survives_a_restart() -> Result<()> {
    let server = MockServer::start().await;
    mount_login(&server, "ada@example.com", "654321", "tok-keep").await;
    mount_dashboard(&server, "tok-keep", json!([{ "_id": "n1", "content": "first" }])).await;

    let dir = tempfile::tempdir()?;
    let session = Arc::new(SessionStore::open(dir.path()));
    let output = run_shell(&server, session, "/login", "ada@example.com\n654321\ny\nquit\n").await?;
    assert!(output.contains("1. first"));

    let reopened = SessionStore::open(dir.path());
    assert_eq!(reopened.current_lifetime(), Some(Lifetime::Persistent));
    assert_eq!(reopened.current_account_id().as_deref(), Some("ada@example.com"));
    Ok(())
}

#[tokio::test]
async fn declining_keep_logged_in_stays_in_memory() -> Result<()> {
    let server = MockServer::start().await;
    mount_login(&server, "ada@example.com", "111111", "tok-tab").await;
    mount_dashboard(&server, "tok-tab", json!([])).await;

    let dir = tempfile::tempdir()?;
    let session = Arc::new(SessionStore::open(dir.path()));
    run_shell(&server, session.clone(), "/", "ada@example.com\n111111\nn\nquit\n").await?;

    assert_eq!(session.current_lifetime(), Some(Lifetime::Ephemeral));
    assert!(!SessionStore::open(dir.path()).is_present());
    Ok(())
}

#[tokio::test]
async fn resend_is_refused_during_cooldown() -> Result<()> {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/login/send-otp"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let session = Arc::new(SessionStore::in_memory());
    let output = run_shell(&server, session, "/", "ada@example.com\n:resend\n").await?;

    assert!(output.contains("Resend OTP in 30s"), "{output}");
    Ok(())
}

#[tokio::test]
async fn rejected_code_shows_server_message() -> Result<()> {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/login/send-otp"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/login/verify-otp"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({ "message": "OTP expired" })))
        .expect(1)
        .mount(&server)
        .await;

    let session = Arc::new(SessionStore::in_memory());
    let output = run_shell(&server, session.clone(), "/", "ada@example.com\n000000\nn\n").await?;

    assert!(output.contains("OTP expired"), "{output}");
    assert!(!output.contains("Login successful!"));
    assert!(!session.is_present());
    Ok(())
}

#[tokio::test]
async fn empty_email_is_rejected_without_a_request() -> Result<()> {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let session = Arc::new(SessionStore::in_memory());
    let output = run_shell(&server, session, "/", "\n:quit\n").await?;

    assert!(output.contains("Please enter your email!"));
    Ok(())
}

#[tokio::test]
async fn guarded_dashboard_without_session_shows_login() -> Result<()> {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let session = Arc::new(SessionStore::in_memory());
    let output = run_shell(&server, session, "/dashboard", "").await?;

    assert!(output.contains("Email: "));
    assert!(!output.contains("Welcome"));
    Ok(())
}

#[tokio::test]
async fn register_sends_the_user_back_to_login() -> Result<()> {
    let server = MockServer::start().await;
    let session = Arc::new(SessionStore::in_memory());
    let output = run_shell(&server, session, "/login", ":register\n").await?;

    assert!(output.contains("Registration is not available here."));
    assert_eq!(output.matches("Email: ").count(), 2);
    Ok(())
}

#[tokio::test]
async fn expired_token_returns_to_login() -> Result<()> {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/me"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/notes"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&server)
        .await;

    let session = Arc::new(SessionStore::in_memory());
    session.persist_session(
        SecretString::from("tok-stale"),
        "ada@example.com",
        Lifetime::Persistent,
    )?;

    let output = run_shell(&server, session.clone(), "/dashboard", "").await?;

    assert!(output.contains("Your session has expired. Please sign in again."));
    assert!(output.contains("Email: "));
    assert!(!session.is_present());
    Ok(())
}

#[tokio::test]
async fn signed_in_user_skips_login() -> Result<()> {
    let server = MockServer::start().await;
    mount_dashboard(&server, "tok-1", json!([])).await;

    let session = Arc::new(SessionStore::in_memory());
    session.persist_session(SecretString::from("tok-1"), "ada@example.com", Lifetime::Ephemeral)?;

    let output = run_shell(&server, session, "/login", "help\nquit\n").await?;

    assert!(!output.contains("Email: "));
    assert!(output.contains("Welcome, Ada!"));
    assert!(output.contains("delete <n>"));
    Ok(())
}

/// A persistent area whose record is unreadable and cannot be removed.
struct StuckFile;

impl StorageArea for StuckFile {
    fn load(&self) -> Result<Option<Credential>, Error> {
        Err(Error::Storage("malformed session record".to_string()))
    }

    fn store(&self, _credential: &Credential) -> Result<(), Error> {
        Err(Error::Storage("read-only file system".to_string()))
    }

    fn clear(&self) -> Result<(), Error> {
        Err(Error::Storage("read-only file system".to_string()))
    }
}

#[tokio::test]
async fn login_is_refused_when_the_old_session_cannot_be_removed() -> Result<()> {
    let server = MockServer::start().await;
    mount_login(&server, "ada@example.com", "222222", "tok-new").await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(0)
        .mount(&server)
        .await;

    let session = Arc::new(SessionStore::new(
        Box::new(StuckFile),
        Box::new(MemoryStorage::new()),
    ));
    let output = run_shell(&server, session.clone(), "/", "ada@example.com\n222222\nn\n").await?;

    assert!(output.contains("Login failed: Storage error: read-only file system"), "{output}");
    assert!(!output.contains("Login successful!"));
    assert!(!session.is_present());
    assert_eq!(output.matches("Email: ").count(), 2);
    Ok(())
}
