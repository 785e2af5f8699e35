use super::*;
use crate::identity::directory::{EmailMatch, InMemoryDirectory, DEMO_PASSWORD};
use crate::identity::session::{MemorySlot, SessionStore, SESSION_KEY};
use crate::notices::NoticeLevel;

struct Fixture {
    auth: Arc<AuthController>,
    slot: Arc<MemorySlot>,
    notices: Arc<NoticeBoard>,
}

fn fixture() -> Fixture {
    let hasher = CredentialHasher::fast_insecure();
    let dir = InMemoryDirectory::new(hasher.clone(), EmailMatch::Exact);
    dir.seed_demo().unwrap();
    let slot = Arc::new(MemorySlot::new());
    let sessions = Arc::new(SessionStore::open(Box::new(slot.clone())));
    let notices = Arc::new(NoticeBoard::default());
    let auth = Arc::new(AuthController::new(Arc::new(dir), sessions, notices.clone(), hasher));
    Fixture { auth, slot, notices }
}

#[tokio::test]
async fn login_with_known_email_and_password() {
    let f = fixture();
    assert_eq!(f.auth.state(), AuthState::Anonymous);
    let ev = f.auth.login(&LoginRequest { email: "staff@example.com".into(), password: DEMO_PASSWORD.into() }).await.unwrap();
    assert_eq!(ev.redirect(), "/staff/dashboard");
    assert_eq!(f.auth.current().unwrap().email, "staff@example.com");
    assert_eq!(f.auth.state(), AuthState::Authenticated);
    assert!(f.slot.raw(SESSION_KEY).unwrap().contains("staff@example.com"));
    assert_eq!(f.notices.peek_last().unwrap().level, NoticeLevel::Success);
}

#[tokio::test]
async fn wrong_password_leaves_session_unchanged() {
    let f = fixture();
    assert!(f.auth.login_ok("student@example.com", DEMO_PASSWORD).await);
    let before = f.auth.current();
    let err = f.auth.login(&LoginRequest { email: "admin@example.com".into(), password: "nope".into() }).await.unwrap_err();
    assert_eq!(err.http_status(), 401);
    assert_eq!(f.auth.current(), before);
    assert!(f.slot.raw(SESSION_KEY).unwrap().contains("student@example.com"));
}

#[tokio::test]
async fn unknown_email_and_wrong_password_look_the_same() {
    let f = fixture();
    let unknown = f.auth.login(&LoginRequest { email: "ghost@example.com".into(), password: DEMO_PASSWORD.into() }).await.unwrap_err();
    let wrong = f.auth.login(&LoginRequest { email: "staff@example.com".into(), password: "bad".into() }).await.unwrap_err();
    assert_eq!(unknown, wrong);
    assert_eq!(unknown.message(), INVALID_CREDENTIALS);
    assert!(f.auth.current().is_none());
    assert!(f.slot.raw(SESSION_KEY).is_none());
}

#[tokio::test]
async fn empty_fields_are_validation_errors() {
    let f = fixture();
    let err = f.auth.login(&LoginRequest { email: "  ".into(), password: "x".into() }).await.unwrap_err();
    assert_eq!(err.http_status(), 400);
    let err = f.auth
        .register(&RegisterRequest { name: "".into(), email: "n@example.com".into(), password: "x".into(), role: Role::Student })
        .await
        .unwrap_err();
    assert_eq!(err.http_status(), 400);
    assert_eq!(f.auth.directory().len(), 3);
}

#[tokio::test]
async fn register_duplicate_email_fails_without_growth() {
    let f = fixture();
    let ok = f.auth.register_ok("Someone", "staff@example.com", "pw", Role::Staff).await;
    assert!(!ok);
    assert_eq!(f.auth.directory().len(), 3);
    assert!(f.auth.current().is_none());
    assert_eq!(f.notices.peek_last().unwrap().message, "Email already registered");
}

#[tokio::test]
async fn register_new_email_logs_in() {
    let f = fixture();
    let ev = f.auth
        .register(&RegisterRequest { name: "New Student".into(), email: "new@example.com".into(), password: "hunter2".into(), role: Role::Student })
        .await
        .unwrap();
    assert_eq!(ev.redirect(), "/student/dashboard");
    assert_eq!(f.auth.directory().len(), 4);
    let me = f.auth.current().unwrap();
    assert_eq!(me.email, "new@example.com");
    let ids: Vec<String> = f.auth.directory().list().into_iter().map(|i| i.id).collect();
    assert_eq!(ids.iter().filter(|id| **id == me.id).count(), 1);

    // the new identity has its own credential, not the demo password
    f.auth.logout().await;
    assert!(!f.auth.login_ok("new@example.com", DEMO_PASSWORD).await);
    assert!(f.auth.login_ok("new@example.com", "hunter2").await);
}

#[tokio::test]
async fn padded_email_registers_and_logs_in_with_the_same_string() {
    let f = fixture();
    let padded = "  ada@example.com ";
    assert!(f.auth.register_ok("Ada", padded, "analytical", Role::Student).await);
    assert_eq!(f.auth.current().unwrap().email, "ada@example.com");
    f.auth.logout().await;
    assert!(f.auth.login_ok(padded, "analytical").await);
    f.auth.logout().await;
    assert!(f.auth.login_ok("ada@example.com", "analytical").await);
    assert!(!f.auth.register_ok("Ada again", "ada@example.com", "x", Role::Student).await);
}

#[tokio::test]
async fn logout_is_idempotent() {
    let f = fixture();
    assert!(f.auth.login_ok("admin@example.com", DEMO_PASSWORD).await);
    let first = f.auth.logout().await;
    let second = f.auth.logout().await;
    assert_eq!(first, second);
    assert_eq!(first.redirect(), "/login");
    assert!(f.auth.current().is_none());
    assert!(f.slot.raw(SESSION_KEY).is_none());
    assert_eq!(f.auth.state(), AuthState::Anonymous);
}

#[tokio::test]
async fn concurrent_registrations_of_same_email_admit_one() {
    let f = fixture();
    let a = f.auth.clone();
    let b = f.auth.clone();
    let (ra, rb) = tokio::join!(
        async move { a.register_ok("A", "race@example.com", "pw", Role::Student).await },
        async move { b.register_ok("B", "race@example.com", "pw", Role::Staff).await },
    );
    assert!(ra ^ rb);
    assert_eq!(f.auth.directory().len(), 4);
}

#[tokio::test(start_paused = true)]
async fn reports_authenticating_during_round_trip() {
    let hasher = CredentialHasher::fast_insecure();
    let dir = InMemoryDirectory::new(hasher.clone(), EmailMatch::Exact);
    dir.seed_demo().unwrap();
    let sessions = Arc::new(SessionStore::open(Box::new(MemorySlot::new())));
    let auth = Arc::new(
        AuthController::new(Arc::new(dir), sessions, Arc::new(NoticeBoard::default()), hasher)
            .with_latency(Duration::from_millis(1000)),
    );
    let task = {
        let auth = auth.clone();
        tokio::spawn(async move { auth.login_ok("student@example.com", DEMO_PASSWORD).await })
    };
    tokio::time::sleep(Duration::from_millis(10)).await;
    assert_eq!(auth.state(), AuthState::Authenticating);
    assert!(task.await.unwrap());
    assert_eq!(auth.state(), AuthState::Authenticated);
}
