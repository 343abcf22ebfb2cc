mod common;

use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use pluralkit::model::{GroupId, Member, MemberId, Model};
use pluralkit::{BlockingClient, ClientConfig, Error};
use serde_json::json;
use wiremock::matchers::{body_json, method, path, query_param};
use wiremock::{Mock, MockServer, Request, ResponseTemplate};

use common::*;

/// The blocking client may not live on a runtime thread.
async fn blocking<T, F>(config: ClientConfig, f: F) -> T
where
    T: Send + 'static,
    F: FnOnce(BlockingClient) -> T + Send + 'static,
{
    tokio::task::spawn_blocking(move || f(BlockingClient::new(config).unwrap()))
        .await
        .unwrap()
}

#[tokio::test(flavor = "multi_thread")]
async fn test_get_system() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/systems/abcde"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "abcde",
            "name": "Test System"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let system = blocking(config(&server), |client| client.get_system("abcde")).await.unwrap();
    assert_eq!(system.name.as_deref(), Some("Test System"));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_members_are_paged_lazily() {
    let server = MockServer::start().await;
    let arrivals = Arc::new(Mutex::new(Vec::new()));
    Mock::given(path("/systems/abcde/members"))
        .and(query_param("limit", "100"))
        .respond_with(timed(arrivals.clone(), member_pages(250)))
        .expect(3)
        .mount(&server)
        .await;

    let counts = blocking(config(&server), |client| {
        let mut members = client.get_members("abcde");
        // only the first page is fetched for the first entry
        let first = members.next().unwrap().unwrap();
        let rest = members.collect::<Result<Vec<Member>, Error>>().unwrap();
        (first.name, rest.len())
    })
    .await;

    assert_eq!(counts, ("Member 0".to_string(), 249));
    assert_spaced(&arrivals.lock().unwrap());
}

#[tokio::test(flavor = "multi_thread")]
async fn test_retries_after_rate_limit() {
    let server = MockServer::start().await;
    let arrivals = Arc::new(Mutex::new(Vec::new()));
    let seen = arrivals.clone();
    Mock::given(path("/members/abcde"))
        .respond_with(timed(arrivals.clone(), move |_: &Request| {
            if seen.lock().unwrap().len() == 1 {
                ResponseTemplate::new(429).insert_header("Retry-After", "1")
            } else {
                ResponseTemplate::new(200).set_body_json(json!({ "id": "abcde", "name": "A" }))
            }
        }))
        .expect(2)
        .mount(&server)
        .await;

    let elapsed = blocking(config(&server), |client| {
        let start = Instant::now();
        client.get_member("abcde").unwrap();
        start.elapsed()
    })
    .await;

    assert!(elapsed >= Duration::from_secs(1));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_group_membership() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/groups/grpaa/members/add"))
        .and(body_json(json!(["gaznz", "abcde"])))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/groups/grpaa/members/overwrite"))
        .and(body_json(json!([])))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    blocking(config(&server), |client| {
        let group = GroupId::parse("grpaa").unwrap();
        client.add_group_members(&group, ["gaznz", "abcde"]).unwrap();
        client.set_group_members(&group, Vec::<MemberId>::new()).unwrap();
    })
    .await;
}

#[tokio::test(flavor = "multi_thread")]
async fn test_update_system_settings() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/systems/@me/settings"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "timezone": "UTC",
            "pings_enabled": true,
            "latch_timeout": null,
            "member_default_private": false,
            "group_default_private": false,
            "show_private_info": true,
            "member_limit": 1000,
            "group_limit": 250
        })))
        .mount(&server)
        .await;
    Mock::given(method("PATCH"))
        .and(path("/systems/@me/settings"))
        .and(body_json(json!({ "timezone": "Europe/Oslo" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "timezone": "Europe/Oslo",
            "pings_enabled": true
        })))
        .expect(1)
        .mount(&server)
        .await;

    let settings = blocking(config(&server), |client| {
        let mut settings = client.get_system_settings().unwrap();
        settings.timezone = "europe/oslo".parse().unwrap();
        client.update_system_settings(&mut settings).unwrap();
        settings
    })
    .await;

    assert_eq!(settings.timezone.name(), "Europe/Oslo");
    assert!(!settings.is_dirty());
}

#[tokio::test(flavor = "multi_thread")]
async fn test_invalid_input_sends_nothing() {
    let server = MockServer::start().await;
    Mock::given(wiremock::matchers::any())
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    blocking(config(&server), |client| {
        assert!(matches!(client.delete_member("abc1e"), Err(Error::Validation(_))));
        assert!(matches!(
            client.remove_member_groups("gaznz", Vec::<GroupId>::new()),
            Err(Error::Validation(_))
        ));
        let mut draft = Member::new("Draft");
        assert!(matches!(client.update_member(&mut draft), Err(Error::Validation(_))));
    })
    .await;
}
