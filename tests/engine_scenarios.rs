//! End-to-end transaction engine scenarios (spec.md §8, S1–S6), driven
//! against the in-process [`test_util::MockPed`].

use std::time::Duration;

use ngenius_ped::{
    config::EngineConfig,
    engine::TransactionEngine,
    session::PedSession,
    transport::TransportConfig,
    value::Frame,
};
use test_util::MockPed;
use tokio::time::Instant;

const IDLE: &str = r#"{"inProgress":false,"complete":true,"displayText":"SYSTEM IDLE"}"#;

fn engine(mock: &MockPed) -> TransactionEngine {
    let session = PedSession::new(mock.endpoint.clone(), TransportConfig::default());
    TransactionEngine::new(session, EngineConfig::transaction_defaults())
}

fn sale_payload() -> Frame {
    Frame::empty().with("amount", "1000").with("sourceid", "001").with("type", "eposSale")
}

#[tokio::test(start_paused = true)]
async fn s1_happy_sale() {
    let replies = vec![
        IDLE.to_owned(),
        IDLE.to_owned(),
        "{}".to_owned(),
        r#"{"inProgress":true}"#.to_owned(),
        r#"{"inProgress":true}"#.to_owned(),
        r#"{"complete":true}"#.to_owned(),
        r#"{"success":true,"declined":false,"authCode":"A1","rrn":"R1","panMasked":"****1234"}"#.to_owned(),
    ];
    let mock = MockPed::start(replies).await;
    let mut eng = engine(&mock);

    let result = eng
        .run("001", &sale_payload(), Duration::from_secs(3), Duration::from_secs(120))
        .await
        .expect("no transport error");

    assert_eq!(result.get_bool("success"), Some(true));
    assert_eq!(result.get_str("authCode"), Some("A1"));

    let commands = mock.commands();
    assert_eq!(commands.iter().filter(|c| c.starts_with("startTransaction")).count(), 1);
    assert_eq!(commands.iter().filter(|c| c.starts_with("cancelTransaction")).count(), 0);
}

#[tokio::test(start_paused = true)]
async fn s2_busy_then_progress() {
    let busy = r#"{"error":"Previous command still in progress"}"#;
    let replies = vec![
        IDLE.to_owned(),
        IDLE.to_owned(),
        "{}".to_owned(),
        busy.to_owned(),
        busy.to_owned(),
        busy.to_owned(),
        busy.to_owned(),
        r#"{"inProgress":true}"#.to_owned(),
        r#"{"complete":true}"#.to_owned(),
        r#"{"success":true,"declined":false}"#.to_owned(),
    ];
    let mock = MockPed::start(replies).await;
    let mut eng = engine(&mock);

    let start = Instant::now();
    let result = eng
        .run("002", &sale_payload(), Duration::from_secs(3), Duration::from_secs(120))
        .await
        .expect("no transport error");
    let elapsed = start.elapsed();

    assert_eq!(result.get_bool("success"), Some(true));
    // Four busy sleeps 1000+2000+4000+8000 = 15000ms, plus at least one
    // 3000ms poll interval after the counter resets.
    assert!(elapsed >= Duration::from_millis(18_000));
}

#[tokio::test(start_paused = true)]
async fn s3_parameter_prompt_checkcard_overrides_default() {
    let prompt = r#"{"parameter":"checkcard","parameterType":"alphanumeric","amount":"500","inProgress":true}"#;
    let replies = vec![
        IDLE.to_owned(),
        IDLE.to_owned(),
        "{}".to_owned(),
        prompt.to_owned(),
        r#"{"complete":true}"#.to_owned(),
        r#"{"success":true,"declined":false}"#.to_owned(),
    ];
    let mock = MockPed::start(replies).await;
    let mut eng = engine(&mock);

    eng.run("003", &sale_payload(), Duration::from_secs(1), Duration::from_secs(120))
        .await
        .expect("no transport error");

    let commands = mock.commands();
    let update = commands
        .iter()
        .find(|c| c.starts_with("updateTransaction"))
        .expect("an updateTransaction must have been sent");
    assert!(update.contains("\"parameterValue\":\"continue\""));
}

#[tokio::test(start_paused = true)]
async fn s4_empty_status_resilience() {
    let replies = vec![
        IDLE.to_owned(),
        IDLE.to_owned(),
        "{}".to_owned(),
        String::new(),
        String::new(),
        r#"{"complete":true}"#.to_owned(),
        r#"{"success":true,"declined":false}"#.to_owned(),
    ];
    let mock = MockPed::start(replies).await;
    let mut eng = engine(&mock);

    let start = Instant::now();
    let result = eng
        .run("004", &sale_payload(), Duration::from_secs(3), Duration::from_secs(120))
        .await
        .expect("no transport error");
    let elapsed = start.elapsed();

    assert_eq!(result.get_bool("success"), Some(true));
    // get_status's own linear backoff: 1000ms then 2000ms before the third
    // attempt finally returns a non-empty frame.
    assert!(elapsed >= Duration::from_millis(3000));
}

#[tokio::test(start_paused = true)]
async fn s5_phase_timeout_emits_single_cancel_and_result() {
    let replies = vec![
        IDLE.to_owned(),
        IDLE.to_owned(),
        "{}".to_owned(),
        r#"{"inProgress":true}"#.to_owned(),
        r#"{"inProgress":true}"#.to_owned(),
        r#"{"inProgress":true}"#.to_owned(),
        r#"{"inProgress":true}"#.to_owned(),
        r#"{"inProgress":true}"#.to_owned(),
        r#"{"inProgress":true}"#.to_owned(),
        "{}".to_owned(), // final re-check get_status after deadline
        r#"{"declined":true,"success":false}"#.to_owned(),
    ];
    let mock = MockPed::start(replies).await;
    let mut eng = engine(&mock);

    let result = eng
        .run("005", &sale_payload(), Duration::from_secs(1), Duration::from_secs(5))
        .await
        .expect("no transport error");

    assert_eq!(result.get_bool("success"), Some(false));
    let commands = mock.commands();
    assert_eq!(commands.iter().filter(|c| c.starts_with("cancelTransaction")).count(), 1);
    assert_eq!(commands.iter().filter(|c| c.starts_with("getResult")).count(), 1);
}

#[tokio::test(start_paused = true)]
async fn s6_crash_recovery_issues_single_get_result() {
    let replies = vec![r#"{"success":true,"declined":false,"sourceId":"20240101000000001"}"#.to_owned()];
    let mock = MockPed::start(replies).await;
    let mut eng = engine(&mock);

    let result = eng.check_last_transaction_result("20240101000000001").await;

    assert_eq!(result.get_bool("success"), Some(true));
    let commands = mock.commands();
    assert_eq!(commands.len(), 1);
    assert!(commands[0].starts_with("getResult(20240101000000001)"));
}
