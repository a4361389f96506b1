//! Test helpers for web API integration tests.
//!
//! Provides an in-process API server over an in-memory database and a
//! fixture site on 127.0.0.1 serving HTML pages and feeds.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::Arc;

use axum::http::header::CONTENT_TYPE;
use axum::response::Html;
use axum::routing::get;
use axum::Router;
use axum_test::TestServer;
use serde_json::{json, Value};
use tokio::net::TcpListener;

use feedling::config::FetchConfig;
use feedling::web::{create_app, AppState};
use feedling::{Database, FeedFetcher, RequestGate, TokenCodec};

/// JWT secret used by every test server.
pub const TEST_SECRET: &str = "test-secret-key-for-testing-only";

/// Token lifetime used by every test server.
pub const TEST_TOKEN_EXPIRY_SECS: u64 = 3600;

/// Fetch settings for tests: loopback fixtures must be reachable.
pub fn test_fetch_config() -> FetchConfig {
    FetchConfig {
        allow_private_hosts: true,
        connect_timeout_secs: 5,
        read_timeout_secs: 5,
        total_timeout_secs: 5,
        ..FetchConfig::default()
    }
}

/// Create a test server with an in-memory database.
pub async fn create_test_server() -> (TestServer, Database) {
    let db = Database::open_in_memory()
        .await
        .expect("Failed to create test database");

    let codec = TokenCodec::new(TEST_SECRET, TEST_TOKEN_EXPIRY_SECS).expect("codec");
    let fetcher = FeedFetcher::new(&test_fetch_config()).expect("fetcher");
    let app_state = Arc::new(AppState::new(
        db.clone(),
        fetcher,
        Arc::new(RequestGate::new(codec)),
    ));

    let router = create_app(app_state, &[]);
    let server = TestServer::new(router).expect("Failed to create test server");

    (server, db)
}

/// Register a user and return the response body.
pub async fn register_user(server: &TestServer, username: &str, email: &str, password: &str) -> Value {
    server
        .post("/api/auth/register")
        .json(&json!({
            "username": username,
            "email": email,
            "password": password
        }))
        .await
        .json::<Value>()
}

/// Register a user and return (token, user id).
pub async fn register_and_login(server: &TestServer, username: &str) -> (String, i64) {
    let body = register_user(
        server,
        username,
        &format!("{username}@example.com"),
        "password123",
    )
    .await;
    let token = body["data"]["token"]
        .as_str()
        .expect("token in register response")
        .to_string();
    let id = body["data"]["user"]["id"].as_i64().expect("user id");
    (token, id)
}

/// Authorization header value for a token.
pub fn bearer(token: &str) -> String {
    format!("Bearer {}", token)
}

pub const RSS_FEED: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<rss version="2.0">
  <channel>
    <title>Fixture Feed</title>
    <link>https://fixture.example/</link>
    <description>A feed served by the test fixture</description>
    <item>
      <title>First Post</title>
      <link>https://fixture.example/first</link>
      <description>&lt;p&gt;Hello &lt;b&gt;world&lt;/b&gt;&lt;/p&gt;</description>
      <pubDate>Mon, 01 Jan 2024 00:00:00 +0000</pubDate>
    </item>
    <item>
      <title>Second Post</title>
      <link>https://fixture.example/second</link>
    </item>
  </channel>
</rss>"#;

pub const ATOM_FEED: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<feed xmlns="http://www.w3.org/2005/Atom">
  <title>Fixture Atom</title>
  <id>urn:uuid:60a76c80-d399-11d9-b93C-0003939e0af6</id>
  <updated>2024-01-01T00:00:00Z</updated>
  <entry>
    <title>Atom Entry</title>
    <id>urn:uuid:1225c695-cfb8-4ebb-aaaa-80da344efa6a</id>
    <updated>2024-01-01T00:00:00Z</updated>
    <summary>Entry summary</summary>
  </entry>
</feed>"#;

/// A local site serving pages and feeds for discovery tests.
pub struct FixtureSite {
    pub addr: SocketAddr,
}

impl FixtureSite {
    /// Start the site on an ephemeral loopback port.
    ///
    /// Routes:
    /// - `/` page with a relative RSS link, an absolute Atom link and a stylesheet
    /// - `/blog/` page with a path-relative link (`rss.xml`)
    /// - `/plain` page with no feed links
    /// - `/feed.xml`, `/atom.xml`, `/blog/rss.xml` feeds
    /// - `/broken.xml` a body that is not a feed
    /// - anything else is 404
    pub async fn start() -> Self {
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind fixture site");
        let addr = listener.local_addr().expect("fixture addr");

        let index = format!(
            r#"<!DOCTYPE html>
<html><head>
  <title>Fixture</title>
  <link rel="stylesheet" type="text/css" href="/style.css">
  <link rel="alternate" type="application/rss+xml" title="Main Feed" href="/feed.xml">
  <link rel="alternate" type="application/atom+xml" title="Atom Feed" href="http://{addr}/atom.xml">
</head><body><p>Welcome</p></body></html>"#
        );
        let blog = r#"<html><head>
  <link rel="alternate" type="application/rss+xml" title="" href="rss.xml">
</head><body></body></html>"#;

        let rss = || async { ([(CONTENT_TYPE, "application/rss+xml")], RSS_FEED) };

        let app = Router::new()
            .route("/", get(move || async move { Html(index) }))
            .route("/blog/", get(move || async move { Html(blog) }))
            .route(
                "/plain",
                get(|| async { Html("<html><body><p>No feeds here</p></body></html>") }),
            )
            .route("/feed.xml", get(rss))
            .route("/blog/rss.xml", get(rss))
            .route(
                "/atom.xml",
                get(|| async { ([(CONTENT_TYPE, "application/atom+xml")], ATOM_FEED) }),
            )
            .route(
                "/broken.xml",
                get(|| async { ([(CONTENT_TYPE, "application/xml")], "this is not a feed") }),
            );

        tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });

        Self { addr }
    }

    /// Absolute URL for a path on this site.
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }
}
