//! Integration tests: deadline-aware execution against a local HTTP server.

mod common;

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use common::test_server::{self, Reply};
use ctxreq_core::config::{ClientConfig, RetryConfig};
use ctxreq_core::{
    execute, execute_async, Client, ContextError, ExecContext, Method, RequestError,
};

fn client(max_attempts: u32, base_delay_secs: f64) -> Client {
    Client::new(&ClientConfig {
        retry: Some(RetryConfig {
            max_attempts,
            base_delay_secs,
            max_delay_secs: 5,
        }),
        ..ClientConfig::default()
    })
}

#[test]
fn responsive_endpoint_succeeds_within_budget() {
    let server = test_server::start(|_| Reply::json(200, r#"{"ok":true}"#));
    let ctx = ExecContext::with_timeout(Duration::from_secs(5));
    let mut req = Client::default().get(server.at("/"));

    execute(&ctx, &mut req).expect("execute");

    let resp = req.response().expect("response populated");
    assert_eq!(resp.status(), 200);
    assert!(!resp.is_synthesized());
    assert_eq!(resp.header("content-type"), Some("application/json"));
    let body: serde_json::Value = resp.json().unwrap();
    assert_eq!(body["ok"], true);
    assert!(req.last_error().is_none());
    assert_eq!(req.attempt_count(), 1);
}

#[test]
fn slow_server_returns_the_budget_error() {
    let server = test_server::start(|_| Reply::status(200).after(Duration::from_secs(2)));
    let ctx = ExecContext::with_timeout(Duration::from_secs(1));
    let mut req = Client::default().get(server.at("/"));

    let start = Instant::now();
    let err = execute(&ctx, &mut req).unwrap_err();
    let elapsed = start.elapsed();

    assert!(
        matches!(err, RequestError::Context(ContextError::DeadlineExceeded)),
        "expected budget error, got {err}"
    );
    assert_eq!(err.context_error(), ctx.err());
    assert!(elapsed >= Duration::from_millis(900), "returned too early: {elapsed:?}");
    assert!(elapsed < Duration::from_millis(1500), "returned too late: {elapsed:?}");
    assert_eq!(req.retryable(), Some(false));
    assert_eq!(req.attempt_count(), 1);
    assert!(req.response().is_none());
}

#[test]
fn already_expired_context_performs_no_io() {
    let server = test_server::start(|_| Reply::status(200));
    let ctx = ExecContext::with_timeout(Duration::from_millis(1));
    std::thread::sleep(Duration::from_millis(10));
    let mut req = Client::default().get(server.at("/"));

    let err = execute(&ctx, &mut req).unwrap_err();
    assert!(matches!(err, RequestError::Context(ContextError::DeadlineExceeded)));
    std::thread::sleep(Duration::from_millis(50));
    assert_eq!(server.hits(), 0);
}

#[test]
fn cancel_from_another_thread_aborts_in_flight_attempt() {
    let server = test_server::start(|_| Reply::status(200).after(Duration::from_secs(3)));
    let ctx = ExecContext::background();
    let remote = ctx.clone();
    let canceller = std::thread::spawn(move || {
        std::thread::sleep(Duration::from_millis(200));
        remote.cancel();
    });
    let mut req = Client::default().get(server.at("/"));

    let start = Instant::now();
    let err = execute(&ctx, &mut req).unwrap_err();
    assert!(matches!(err, RequestError::Context(ContextError::Canceled)));
    assert!(start.elapsed() < Duration::from_secs(1));
    canceller.join().unwrap();
}

#[test]
fn server_error_is_a_status_error_retried_by_default_policy() {
    let server = test_server::start(|_| Reply::status(500));
    let ctx = ExecContext::with_timeout(Duration::from_secs(10));
    let mut req = client(3, 0.01).get(server.at("/"));

    let err = execute(&ctx, &mut req).unwrap_err();
    assert!(matches!(err, RequestError::Status { code: 500 }));
    assert_eq!(req.attempt_count(), 3);
    assert_eq!(server.hits(), 3);
    assert_eq!(req.response().unwrap().status(), 500);
}

#[test]
fn client_error_is_not_retried() {
    let server = test_server::start(|_| Reply::status(404));
    let ctx = ExecContext::with_timeout(Duration::from_secs(10));
    let mut req = client(5, 0.01).get(server.at("/missing"));

    let err = execute(&ctx, &mut req).unwrap_err();
    assert!(matches!(err, RequestError::Status { code: 404 }));
    assert_eq!(server.hits(), 1);
}

#[test]
fn throttled_then_success() {
    let calls = Arc::new(AtomicUsize::new(0));
    let seen = Arc::clone(&calls);
    let server = test_server::start(move |_| {
        if seen.fetch_add(1, Ordering::SeqCst) == 0 {
            Reply::status(503)
        } else {
            Reply::json(200, "{}")
        }
    });
    let ctx = ExecContext::with_timeout(Duration::from_secs(10));
    let mut req = client(5, 0.01).get(server.at("/"));

    execute(&ctx, &mut req).expect("second attempt succeeds");
    assert_eq!(req.attempt_count(), 2);
    assert_eq!(req.response().unwrap().status(), 200);
}

#[test]
fn connection_refused_is_a_retryable_transport_error() {
    let ctx = ExecContext::with_timeout(Duration::from_secs(10));
    let mut req = client(2, 0.01).get(test_server::closed_port_url());

    let err = execute(&ctx, &mut req).unwrap_err();
    assert!(matches!(err, RequestError::Transport(_)), "got {err}");
    assert_eq!(req.retryable(), Some(true));
    assert_eq!(req.attempt_count(), 2);
    let placeholder = req.response().expect("placeholder response");
    assert_eq!(placeholder.status(), 0);
    assert!(placeholder.body().is_empty());
    assert!(placeholder.is_synthesized());
}

#[test]
fn empty_reply_is_a_transport_error() {
    let server = test_server::start(|_| Reply::Hangup);
    let ctx = ExecContext::with_timeout(Duration::from_secs(10));
    let mut req = client(1, 0.01).get(server.at("/"));

    let err = execute(&ctx, &mut req).unwrap_err();
    assert!(matches!(err, RequestError::Transport(_)), "got {err}");
    assert_eq!(req.retryable(), Some(true));
}

#[test]
fn body_cut_short_after_success_status_is_a_transport_error() {
    let server = test_server::start(|_| Reply::truncated(100, "hello", Duration::ZERO));
    let ctx = ExecContext::with_timeout(Duration::from_secs(10));
    let mut req = client(1, 0.01).get(server.at("/"));

    let err = execute(&ctx, &mut req).unwrap_err();
    assert!(matches!(err, RequestError::Transport(_)), "got {err}");
    assert_eq!(req.retryable(), Some(true));
    let resp = req.response().expect("placeholder response");
    assert_eq!(resp.status(), 0);
    assert!(resp.is_synthesized());
    assert!(resp.body().is_empty());
}

#[test]
fn body_stalling_past_transport_timeout_is_a_transport_error() {
    let server = test_server::start(|_| Reply::truncated(100, "hello", Duration::from_secs(2)));
    let cfg = ClientConfig {
        request_timeout_ms: Some(300),
        retry: Some(RetryConfig {
            max_attempts: 1,
            base_delay_secs: 0.01,
            max_delay_secs: 1,
        }),
        ..ClientConfig::default()
    };
    let ctx = ExecContext::with_timeout(Duration::from_secs(10));
    let mut req = Client::new(&cfg).get(server.at("/"));

    let err = execute(&ctx, &mut req).unwrap_err();
    assert!(matches!(err, RequestError::Transport(_)), "got {err}");
    assert_eq!(req.retryable(), Some(true));
    assert_eq!(req.response().unwrap().status(), 0);
    assert!(ctx.err().is_none());
}

#[test]
fn backoff_on_ungated_request_stays_within_budget() {
    let server = test_server::start(|_| Reply::status(503));
    let ctx = ExecContext::with_timeout(Duration::from_millis(300));
    let mut req = Client::default().get(server.at("/"));

    let start = Instant::now();
    let err = execute(&ctx, &mut req).unwrap_err();
    let elapsed = start.elapsed();

    assert!(err.is_budget_error(), "got {err}");
    assert!(elapsed < Duration::from_millis(400), "overran budget: {elapsed:?}");
    // 250ms backoff fits once; the 500ms one does not.
    assert_eq!(req.attempt_count(), 2);
    assert_eq!(server.hits(), 2);
}

#[test]
fn cancel_during_backoff_makes_no_further_attempt() {
    let server = test_server::start(|_| Reply::status(503));
    let ctx = ExecContext::background();
    let remote = ctx.clone();
    let canceller = std::thread::spawn(move || {
        std::thread::sleep(Duration::from_millis(200));
        remote.cancel();
    });
    let mut req = client(5, 2.0).get(server.at("/"));

    let start = Instant::now();
    let err = execute(&ctx, &mut req).unwrap_err();
    assert!(
        matches!(err, RequestError::Context(ContextError::Canceled)),
        "got {err}"
    );
    assert!(start.elapsed() < Duration::from_secs(1));
    assert_eq!(req.attempt_count(), 1);
    assert_eq!(server.hits(), 1);
    canceller.join().unwrap();
}

#[test]
fn transport_timeout_is_not_mistaken_for_budget_expiry() {
    let server = test_server::start(|_| Reply::status(200).after(Duration::from_secs(1)));
    let cfg = ClientConfig {
        request_timeout_ms: Some(100),
        retry: Some(RetryConfig {
            max_attempts: 1,
            base_delay_secs: 0.01,
            max_delay_secs: 1,
        }),
        ..ClientConfig::default()
    };
    let ctx = ExecContext::with_timeout(Duration::from_secs(10));
    let mut req = Client::new(&cfg).get(server.at("/"));

    let err = execute(&ctx, &mut req).unwrap_err();
    assert!(matches!(err, RequestError::Transport(_)), "got {err}");
    assert!(!err.is_budget_error());
    assert!(ctx.err().is_none());
}

#[test]
fn redirect_loop_yields_synthesized_status_response() {
    let server = test_server::start(|_| Reply::status(301).header("Location", "/again"));
    let cfg = ClientConfig {
        max_redirects: 2,
        ..ClientConfig::default()
    };
    let ctx = ExecContext::with_timeout(Duration::from_secs(10));
    let mut req = Client::new(&cfg).get(server.at("/"));

    let err = execute(&ctx, &mut req).unwrap_err();
    assert!(matches!(err, RequestError::Status { code: 301 }), "got {err}");
    let resp = req.response().unwrap();
    assert_eq!(resp.status(), 301);
    assert!(resp.is_synthesized());
    assert!(resp.body().is_empty());
    assert_eq!(req.attempt_count(), 1);
}

#[test]
fn gated_retry_stops_when_backoff_would_outlast_budget() {
    let server = test_server::start(|_| Reply::status(503));
    let cfg = ClientConfig {
        retry: Some(RetryConfig {
            max_attempts: 10,
            base_delay_secs: 0.4,
            max_delay_secs: 30,
        }),
        ..ClientConfig::default()
    };
    let ctx = ExecContext::with_timeout(Duration::from_secs(1));
    // Backoff is 0.4s then 0.8s: the second retry cannot fit in what is left.
    let mut req = Client::new(&cfg).request_in(&ctx, Method::Get, server.at("/"));

    let start = Instant::now();
    let err = execute(&ctx, &mut req).unwrap_err();
    assert!(
        matches!(err, RequestError::DeadlineWouldExceedBeforeRetry),
        "got {err}"
    );
    assert!(err.is_budget_error());
    assert_eq!(server.hits(), 2);
    assert_eq!(req.attempt_count(), 2);
    assert!(start.elapsed() < Duration::from_secs(1));
    assert!(ctx.err().is_none());
}

#[tokio::test]
async fn execute_async_hands_back_the_request() {
    let server = test_server::start(|_| Reply::json(200, "[1,2,3]"));
    let ctx = ExecContext::with_timeout(Duration::from_secs(5));
    let req = Client::default().get(server.at("/"));

    let (req, res) = execute_async(ctx, req).await.expect("task ran");
    res.expect("request succeeded");
    let items: Vec<u32> = req.response().unwrap().json().unwrap();
    assert_eq!(items, vec![1, 2, 3]);
}
