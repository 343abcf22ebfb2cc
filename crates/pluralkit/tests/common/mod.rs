#![allow(dead_code)]

use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use pluralkit::{ClientConfig, Error};
use serde_json::{json, Value};
use wiremock::{MockServer, Request, ResponseTemplate};

pub const INTERVAL: Duration = Duration::from_millis(200);
/// Arrival times can be a little closer together than start times.
pub const JITTER: Duration = Duration::from_millis(50);

pub fn config(server: &MockServer) -> ClientConfig {
    ClientConfig::new()
        .token("test-token")
        .base_url(server.uri().parse().unwrap())
        .min_interval(INTERVAL)
}

pub fn member_id(n: usize) -> String {
    let mut n = n;
    let mut id = String::new();
    for _ in 0..5 {
        id.insert(0, (b'a' + (n % 26) as u8) as char);
        n /= 26;
    }
    id
}

pub fn member(n: usize) -> Value {
    json!({
        "id": member_id(n),
        "system": "abcde",
        "name": format!("Member {n}"),
        "privacy": null
    })
}

/// Answers `GET .../members` like the server would for a system with `total` members.
pub fn member_pages(total: usize) -> impl Fn(&Request) -> ResponseTemplate + Send + Sync {
    move |request: &Request| {
        let param = |key: &str| {
            request
                .url
                .query_pairs()
                .find(|(k, _)| k == key)
                .and_then(|(_, v)| v.parse::<usize>().ok())
        };
        let limit = param("limit").unwrap_or(total);
        let offset = param("offset").unwrap_or(0);
        let page: Vec<Value> = (offset..total.min(offset + limit)).map(member).collect();
        ResponseTemplate::new(200).set_body_json(page)
    }
}

/// Wraps a responder and records when each request arrived.
pub fn timed<F>(log: Arc<Mutex<Vec<Instant>>>, respond: F) -> impl Fn(&Request) -> ResponseTemplate + Send + Sync
where
    F: Fn(&Request) -> ResponseTemplate + Send + Sync,
{
    move |request: &Request| {
        log.lock().unwrap().push(Instant::now());
        respond(request)
    }
}

pub fn assert_spaced(arrivals: &[Instant]) {
    for pair in arrivals.windows(2) {
        let gap = pair[1] - pair[0];
        assert!(gap + JITTER >= INTERVAL, "requests only {gap:?} apart");
    }
}

pub fn assert_not_found(result: Result<impl std::fmt::Debug, Error>) {
    match result {
        Err(e) => assert!(e.is_not_found(), "expected a not found error, got {e:?}"),
        Ok(value) => panic!("expected an error, got {value:?}"),
    }
}
