//! Web API Feed Tests
//!
//! Discovery and feed content against a local fixture site.

mod common;

use axum::http::header::AUTHORIZATION;
use axum::http::StatusCode;
use serde_json::{json, Value};

use common::{bearer, create_test_server, register_and_login, FixtureSite};
use feedling::feed::FeedRepository;

#[tokio::test]
async fn test_discover_feeds() {
    let site = FixtureSite::start().await;
    let (server, _db) = create_test_server().await;
    let (token, _) = register_and_login(&server, "alice").await;

    let response = server
        .get("/api/feeds/discover")
        .add_query_param("url", site.url("/"))
        .add_header(AUTHORIZATION, bearer(&token))
        .await;

    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(
        body["data"]["feeds"],
        json!([
            { "title": "Main Feed", "href": site.url("/feed.xml") },
            { "title": "Atom Feed", "href": site.url("/atom.xml") }
        ])
    );
}

#[tokio::test]
async fn test_discover_resolves_path_relative_href() {
    let site = FixtureSite::start().await;
    let (server, _db) = create_test_server().await;
    let (token, _) = register_and_login(&server, "alice").await;

    let response = server
        .get("/api/feeds/discover")
        .add_query_param("url", site.url("/blog/"))
        .add_header(AUTHORIZATION, bearer(&token))
        .await;

    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["data"]["feeds"][0]["href"], site.url("/blog/rss.xml"));
    assert_eq!(body["data"]["feeds"][0]["title"], "");
}

#[tokio::test]
async fn test_discover_no_feeds_is_distinct() {
    let site = FixtureSite::start().await;
    let (server, _db) = create_test_server().await;
    let (token, _) = register_and_login(&server, "alice").await;

    let response = server
        .get("/api/feeds/discover")
        .add_query_param("url", site.url("/plain"))
        .add_header(AUTHORIZATION, bearer(&token))
        .await;

    response.assert_status(StatusCode::NOT_FOUND);
    let body: Value = response.json();
    assert_eq!(body["error"]["code"], "NO_FEEDS_FOUND");
}

#[tokio::test]
async fn test_discover_unreachable_page() {
    let site = FixtureSite::start().await;
    let (server, _db) = create_test_server().await;
    let (token, _) = register_and_login(&server, "alice").await;

    let response = server
        .get("/api/feeds/discover")
        .add_query_param("url", site.url("/missing"))
        .add_header(AUTHORIZATION, bearer(&token))
        .await;

    response.assert_status(StatusCode::BAD_GATEWAY);
    let body: Value = response.json();
    assert_eq!(body["error"]["code"], "FETCH_FAILED");
}

#[tokio::test]
async fn test_discover_invalid_url() {
    let (server, _db) = create_test_server().await;
    let (token, _) = register_and_login(&server, "alice").await;

    for url in ["", "not a url", "ftp://example.com/feed.xml"] {
        server
            .get("/api/feeds/discover")
            .add_query_param("url", url)
            .add_header(AUTHORIZATION, bearer(&token))
            .await
            .assert_status(StatusCode::UNPROCESSABLE_ENTITY);
    }
}

#[tokio::test]
async fn test_discover_requires_auth() {
    let site = FixtureSite::start().await;
    let (server, _db) = create_test_server().await;

    server
        .get("/api/feeds/discover")
        .add_query_param("url", site.url("/"))
        .await
        .assert_status(StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_feed_content_rss() {
    let site = FixtureSite::start().await;
    let (server, _db) = create_test_server().await;
    let (token, _) = register_and_login(&server, "alice").await;

    let response = server
        .get("/api/feeds/content")
        .add_query_param("url", site.url("/feed.xml"))
        .add_header(AUTHORIZATION, bearer(&token))
        .await;

    response.assert_status_ok();
    let body: Value = response.json();
    let feed = &body["data"];
    assert_eq!(feed["title"], "Fixture Feed");
    assert_eq!(feed["description"], "A feed served by the test fixture");
    assert_eq!(feed["items"].as_array().unwrap().len(), 2);
    assert_eq!(feed["items"][0]["title"], "First Post");
    assert_eq!(feed["items"][0]["description"], "Hello world");
    assert_eq!(feed["items"][1]["title"], "Second Post");
}

#[tokio::test]
async fn test_feed_content_atom() {
    let site = FixtureSite::start().await;
    let (server, _db) = create_test_server().await;
    let (token, _) = register_and_login(&server, "alice").await;

    let response = server
        .get("/api/feeds/content")
        .add_query_param("url", site.url("/atom.xml"))
        .add_header(AUTHORIZATION, bearer(&token))
        .await;

    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["data"]["title"], "Fixture Atom");
    assert_eq!(body["data"]["items"][0]["description"], "Entry summary");
}

#[tokio::test]
async fn test_feed_content_not_a_feed() {
    let site = FixtureSite::start().await;
    let (server, _db) = create_test_server().await;
    let (token, _) = register_and_login(&server, "alice").await;

    let response = server
        .get("/api/feeds/content")
        .add_query_param("url", site.url("/broken.xml"))
        .add_header(AUTHORIZATION, bearer(&token))
        .await;

    response.assert_status(StatusCode::BAD_GATEWAY);
}

#[tokio::test]
async fn test_feed_content_marks_stored_feed_checked() {
    let site = FixtureSite::start().await;
    let (server, db) = create_test_server().await;
    let (token, _) = register_and_login(&server, "alice").await;
    let feed_url = site.url("/feed.xml");

    server
        .post("/api/subscriptions")
        .add_header(AUTHORIZATION, bearer(&token))
        .json(&json!({ "feeds": [{ "title": "Main Feed", "href": feed_url }] }))
        .await
        .assert_status_ok();

    let repo = FeedRepository::new(db.pool());
    let before = repo.get_by_url(&feed_url).await.unwrap().unwrap();
    assert!(before.last_checked.is_none());

    server
        .get("/api/feeds/content")
        .add_query_param("url", &feed_url)
        .add_header(AUTHORIZATION, bearer(&token))
        .await
        .assert_status_ok();

    let after = repo.get_by_url(&feed_url).await.unwrap().unwrap();
    assert!(after.last_checked.is_some());
}
