use super::*;
use crate::core::retry::NoJitter;
use crate::utils::test_utils::{
    test_dispatcher, FixedJitter, RecordingSleeper, ScriptedTransport,
};
use std::num::NonZeroU32;
use std::time::Duration;

fn policy(attempts: u32, base_ms: u64) -> RetryPolicy {
    RetryPolicy::new(
        NonZeroU32::new(attempts).unwrap(),
        Duration::from_millis(base_ms),
        Duration::from_millis(1000),
    )
}

fn descriptor() -> RequestDescriptor {
    RequestDescriptor::post_json(
        Url::parse("https://api.test.com/v1/models/m:generateContent?key=secret").unwrap(),
        "{}".to_string(),
    )
}

#[test]
fn classify_maps_statuses() {
    assert!(matches!(
        AttemptOutcome::classify(Ok(HttpReply::new(204, ""))),
        AttemptOutcome::Success(_)
    ));
    assert_eq!(
        AttemptOutcome::classify(Ok(HttpReply::new(429, ""))),
        AttemptOutcome::RetryableFailure(RetryCause::Throttled { status: 429 })
    );
    assert_eq!(
        AttemptOutcome::classify(Ok(HttpReply::new(503, ""))),
        AttemptOutcome::RetryableFailure(RetryCause::Server { status: 503 })
    );
    assert_eq!(
        AttemptOutcome::classify(Ok(HttpReply::new(404, "missing"))),
        AttemptOutcome::FatalFailure {
            status: 404,
            body: "missing".to_string()
        }
    );
    assert!(matches!(
        AttemptOutcome::classify(Err(TransportError::new("refused"))),
        AttemptOutcome::RetryableFailure(RetryCause::Transport(_))
    ));
}

#[test]
fn classify_trusts_status_over_body_read_failures() {
    assert_eq!(
        AttemptOutcome::classify(Err(TransportError::after_status(200, "truncated"))),
        AttemptOutcome::UnreadableSuccess {
            status: 200,
            message: "truncated".to_string()
        }
    );
    assert_eq!(
        AttemptOutcome::classify(Err(TransportError::after_status(503, "truncated"))),
        AttemptOutcome::RetryableFailure(RetryCause::Server { status: 503 })
    );
    assert_eq!(
        AttemptOutcome::classify(Err(TransportError::after_status(401, "truncated"))),
        AttemptOutcome::FatalFailure {
            status: 401,
            body: String::new()
        }
    );
}

#[tokio::test]
async fn unreadable_success_body_is_never_retried() {
    let transport = ScriptedTransport::new(vec![
        Err(TransportError::after_status(200, "body cut short")),
        Ok(HttpReply::new(200, "{}")),
    ]);
    let sleeper = RecordingSleeper::new();
    let dispatcher = test_dispatcher(transport.clone(), sleeper.clone());

    let err = dispatcher
        .dispatch(&descriptor(), &policy(3, 10))
        .await
        .expect_err("unreadable body should fail");

    assert!(matches!(err, DispatchError::Decode(_)));
    assert_eq!(transport.call_count(), 1);
    assert!(sleeper.recorded().is_empty());
}

#[test]
fn redacted_target_hides_query() {
    assert_eq!(
        descriptor().redacted_target(),
        "https://api.test.com/v1/models/m:generateContent"
    );
}

#[tokio::test]
async fn success_after_retries_sleeps_exponentially() {
    let transport = ScriptedTransport::statuses(&[503, 429, 200]);
    let sleeper = RecordingSleeper::new();
    let dispatcher = test_dispatcher(transport.clone(), sleeper.clone());

    let reply = dispatcher
        .dispatch(&descriptor(), &policy(5, 1000))
        .await
        .expect("third attempt should succeed");

    assert_eq!(reply.status, 200);
    assert_eq!(transport.call_count(), 3);
    assert_eq!(
        sleeper.recorded(),
        vec![Duration::from_millis(1000), Duration::from_millis(2000)]
    );
}

#[tokio::test]
async fn jitter_is_added_to_each_backoff() {
    let transport = ScriptedTransport::statuses(&[500, 500, 200]);
    let sleeper = RecordingSleeper::new();
    let dispatcher = Dispatcher::new(
        transport.clone(),
        sleeper.clone(),
        Arc::new(FixedJitter(Duration::from_millis(250))),
    );

    dispatcher
        .dispatch(&descriptor(), &policy(5, 100))
        .await
        .expect("should succeed");

    assert_eq!(
        sleeper.recorded(),
        vec![Duration::from_millis(350), Duration::from_millis(450)]
    );
}

#[tokio::test]
async fn exhaustion_makes_exactly_max_attempts() {
    let transport = ScriptedTransport::statuses(&[500, 502, 429, 503, 500, 200]);
    let sleeper = RecordingSleeper::new();
    let dispatcher = test_dispatcher(transport.clone(), sleeper.clone());

    let err = dispatcher
        .dispatch(&descriptor(), &policy(4, 10))
        .await
        .expect_err("budget should be exhausted");

    assert_eq!(transport.call_count(), 4);
    assert_eq!(
        err,
        DispatchError::ExhaustedRetries {
            attempts: 4,
            last: RetryCause::Server { status: 503 },
        }
    );
    // No trailing delay after the final attempt.
    assert_eq!(
        sleeper.recorded(),
        vec![
            Duration::from_millis(10),
            Duration::from_millis(20),
            Duration::from_millis(40)
        ]
    );
}

#[tokio::test]
async fn total_wait_is_sum_of_backoffs_plus_bounded_jitter() {
    let attempts = 5;
    let base = Duration::from_millis(100);
    let jitter = Duration::from_millis(30);
    let transport = ScriptedTransport::statuses(&[503; 5]);
    let sleeper = RecordingSleeper::new();
    let dispatcher = Dispatcher::new(
        transport.clone(),
        sleeper.clone(),
        Arc::new(FixedJitter(jitter)),
    );

    dispatcher
        .dispatch(&descriptor(), &policy(attempts, 100))
        .await
        .expect_err("every attempt fails");

    let backoff: Duration = (0..attempts - 1).map(|i| base * 2u32.pow(i)).sum();
    assert_eq!(backoff, Duration::from_millis(1500));
    assert_eq!(sleeper.total(), backoff + jitter * (attempts - 1));
    assert_eq!(transport.call_count(), attempts as usize);
}

#[tokio::test]
async fn rejected_status_stops_after_one_call() {
    let transport = ScriptedTransport::new(vec![
        Ok(HttpReply::new(400, "bad request")),
        Ok(HttpReply::new(200, "{}")),
    ]);
    let sleeper = RecordingSleeper::new();
    let dispatcher = test_dispatcher(transport.clone(), sleeper.clone());

    let err = dispatcher
        .dispatch(&descriptor(), &policy(5, 1000))
        .await
        .expect_err("400 is fatal");

    assert_eq!(transport.call_count(), 1);
    assert!(sleeper.recorded().is_empty());
    assert_eq!(
        err,
        DispatchError::Rejected {
            status: 400,
            body: "bad request".to_string()
        }
    );
    assert!(err.to_string().contains("400"));
}

#[tokio::test]
async fn transport_errors_retry_without_backoff() {
    let transport = ScriptedTransport::new(vec![
        Err(TransportError::new("connection refused")),
        Ok(HttpReply::new(200, "ok")),
    ]);
    let sleeper = RecordingSleeper::new();
    let dispatcher = test_dispatcher(transport.clone(), sleeper.clone());

    let reply = dispatcher
        .dispatch(&descriptor(), &policy(3, 1000))
        .await
        .expect("second attempt succeeds");

    assert_eq!(reply.body, "ok");
    assert_eq!(transport.call_count(), 2);
    assert!(sleeper.recorded().is_empty());
}

#[tokio::test]
async fn transport_error_on_final_attempt_is_exhaustion() {
    let transport = ScriptedTransport::new(vec![
        Ok(HttpReply::new(500, "")),
        Err(TransportError::new("reset by peer")),
    ]);
    let sleeper = RecordingSleeper::new();
    let dispatcher = test_dispatcher(transport.clone(), sleeper.clone());

    let err = dispatcher
        .dispatch(&descriptor(), &policy(2, 5))
        .await
        .expect_err("should be exhausted");

    assert_eq!(transport.call_count(), 2);
    match &err {
        DispatchError::ExhaustedRetries { attempts, last } => {
            assert_eq!(*attempts, 2);
            assert!(matches!(last, RetryCause::Transport(_)));
        }
        other => panic!("expected exhaustion, got {other:?}"),
    }
    assert!(err.source().is_some());
    assert_eq!(sleeper.recorded(), vec![Duration::from_millis(5)]);
}

#[tokio::test]
async fn single_attempt_policy_never_sleeps() {
    let transport = ScriptedTransport::statuses(&[503]);
    let sleeper = RecordingSleeper::new();
    let dispatcher = test_dispatcher(transport.clone(), sleeper.clone());

    let err = dispatcher
        .dispatch(&descriptor(), &RetryPolicy::single_attempt())
        .await
        .expect_err("single 503 exhausts the budget");

    assert_eq!(transport.call_count(), 1);
    assert!(sleeper.recorded().is_empty());
    assert!(matches!(err, DispatchError::ExhaustedRetries { attempts: 1, .. }));
}

#[tokio::test]
async fn each_dispatch_uses_a_fresh_counter() {
    let transport = ScriptedTransport::statuses(&[500, 200, 500, 200]);
    let sleeper = RecordingSleeper::new();
    let dispatcher = test_dispatcher(transport.clone(), sleeper.clone());
    let policy = policy(2, 10);

    dispatcher.dispatch(&descriptor(), &policy).await.unwrap();
    dispatcher.dispatch(&descriptor(), &policy).await.unwrap();

    assert_eq!(transport.call_count(), 4);
    assert_eq!(
        sleeper.recorded(),
        vec![Duration::from_millis(10), Duration::from_millis(10)]
    );
}

async fn read_http_request(stream: &mut tokio::net::TcpStream) -> Result<String, String> {
    use tokio::io::AsyncReadExt;

    let mut buffer = Vec::new();
    let mut header_end = None;
    while header_end.is_none() {
        let mut chunk = [0_u8; 1024];
        let read = stream
            .read(&mut chunk)
            .await
            .map_err(|err| err.to_string())?;
        if read == 0 {
            return Err("Unexpected EOF while reading HTTP headers".to_string());
        }
        buffer.extend_from_slice(&chunk[..read]);
        header_end = buffer
            .windows(4)
            .position(|window| window == b"\r\n\r\n")
            .map(|index| index + 4);
    }

    let header_end = header_end.expect("header end should exist");
    let header_text =
        std::str::from_utf8(&buffer[..header_end]).map_err(|err| err.to_string())?;
    let content_length = header_text
        .split("\r\n")
        .filter_map(|line| line.split_once(':'))
        .find(|(name, _)| name.trim().eq_ignore_ascii_case("content-length"))
        .and_then(|(_, value)| value.trim().parse::<usize>().ok())
        .unwrap_or(0);

    let mut body = buffer[header_end..].to_vec();
    while body.len() < content_length {
        let mut chunk = [0_u8; 1024];
        let read = stream
            .read(&mut chunk)
            .await
            .map_err(|err| err.to_string())?;
        if read == 0 {
            break;
        }
        body.extend_from_slice(&chunk[..read]);
    }

    let request_line = header_text.split("\r\n").next().unwrap_or_default();
    Ok(request_line.to_string())
}

#[tokio::test]
async fn reqwest_transport_retries_against_live_server() {
    use tokio::io::AsyncWriteExt;
    use tokio::net::TcpListener;

    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("listener should bind");
    let addr = listener.local_addr().expect("local addr should resolve");

    let server_task = tokio::spawn(async move {
        let mut request_lines = Vec::new();
        for (status, reason, body) in [
            (429, "Too Many Requests", "slow down"),
            (200, "OK", r#"{"ok":true}"#),
        ] {
            let (mut stream, _) = listener.accept().await.map_err(|err| err.to_string())?;
            request_lines.push(read_http_request(&mut stream).await?);
            let response = format!(
                "HTTP/1.1 {status} {reason}\r\nContent-Type: application/json\r\n\
                 Content-Length: {}\r\nConnection: close\r\n\r\n{body}",
                body.len()
            );
            stream
                .write_all(response.as_bytes())
                .await
                .map_err(|err| err.to_string())?;
            stream.shutdown().await.map_err(|err| err.to_string())?;
        }
        Ok::<_, String>(request_lines)
    });

    let url = Url::parse(&format!(
        "http://{addr}/v1beta/models/test:generateContent?key=abc"
    ))
    .unwrap();
    let sleeper = RecordingSleeper::new();
    let dispatcher = Dispatcher::new(
        Arc::new(ReqwestTransport::default()),
        sleeper.clone(),
        Arc::new(NoJitter),
    );

    let reply = dispatcher
        .dispatch(
            &RequestDescriptor::post_json(url, r#"{"contents":[]}"#.to_string()),
            &policy(3, 1),
        )
        .await
        .expect("second attempt should succeed");

    assert_eq!(reply.status, 200);
    assert_eq!(reply.body, r#"{"ok":true}"#);
    assert_eq!(sleeper.recorded(), vec![Duration::from_millis(1)]);

    let request_lines = server_task
        .await
        .expect("server task should join")
        .expect("server should succeed");
    assert_eq!(request_lines.len(), 2);
    for line in request_lines {
        assert_eq!(
            line,
            "POST /v1beta/models/test:generateContent?key=abc HTTP/1.1"
        );
    }
}

#[tokio::test]
async fn reqwest_transport_does_not_resend_after_truncated_success() {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio::io::AsyncWriteExt;
    use tokio::net::TcpListener;

    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("listener should bind");
    let addr = listener.local_addr().expect("local addr should resolve");
    let hits = Arc::new(AtomicUsize::new(0));

    let server_hits = Arc::clone(&hits);
    let server_task = tokio::spawn(async move {
        loop {
            let Ok((mut stream, _)) = listener.accept().await else {
                break;
            };
            if read_http_request(&mut stream).await.is_err() {
                continue;
            }
            server_hits.fetch_add(1, Ordering::SeqCst);
            // Promises 100 bytes, delivers 4.
            let response = "HTTP/1.1 200 OK\r\nContent-Type: application/json\r\n\
                            Content-Length: 100\r\nConnection: close\r\n\r\n{\"ok";
            let _ = stream.write_all(response.as_bytes()).await;
            let _ = stream.shutdown().await;
        }
    });

    let url = Url::parse(&format!(
        "http://{addr}/v1beta/models/test:generateContent?key=abc"
    ))
    .unwrap();
    let sleeper = RecordingSleeper::new();
    let dispatcher = Dispatcher::new(
        Arc::new(ReqwestTransport::default()),
        sleeper.clone(),
        Arc::new(NoJitter),
    );

    let result = dispatcher
        .dispatch(
            &RequestDescriptor::post_json(url, r#"{"contents":[]}"#.to_string()),
            &policy(3, 1),
        )
        .await;
    server_task.abort();

    assert!(
        matches!(result, Err(DispatchError::Decode(_))),
        "unexpected result: {result:?}"
    );
    assert_eq!(hits.load(Ordering::SeqCst), 1);
    assert!(sleeper.recorded().is_empty());
}
