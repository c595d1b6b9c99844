use std::time::Duration;

use axum::{
    body::{to_bytes, Body, Bytes},
    http::{header, Method, Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use tower::ServiceExt;
use yatube::{
    connect_db,
    data_formats::{PostRequest, RegisterRequest},
    db_helpers::{create_group_in_db, create_post_in_db, delete_group_in_db, insert_user},
    make_router,
    models::User,
    page_cache::PageCache,
    AppState, TokenSigner,
};

struct TestApp {
    state: AppState,
    router: Router,
}

async fn spawn_app(index_ttl: Duration) -> TestApp {
    let pool = connect_db("sqlite::memory:", 1).await.unwrap();
    let state = AppState::new(pool, TokenSigner::new("test-secret", 1), index_ttl);
    TestApp {
        router: make_router(state.clone()),
        state,
    }
}

impl TestApp {
    async fn raw(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Bytes) {
        let mut request = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            request = request.header(header::AUTHORIZATION, format!("Token {token}"));
        }
        let request = match body {
            Some(body) => request
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(serde_json::to_vec(&body).unwrap()))
                .unwrap(),
            None => request.body(Body::empty()).unwrap(),
        };

        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, bytes)
    }

    async fn call(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let (status, bytes) = self.raw(method, uri, token, body).await;
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, value)
    }

    async fn get(&self, uri: &str, token: Option<&str>) -> (StatusCode, Value) {
        self.call(Method::GET, uri, token, None).await
    }

    /// Seeds a user directly and hands back a token for them.
    async fn user(&self, username: &str) -> (User, String) {
        let request = RegisterRequest {
            email: format!("{username}@example.com"),
            password: "not-a-real-hash".to_owned(),
            username: username.to_owned(),
        };
        let user = insert_user(&self.state.pool, &request).await.unwrap();
        let token = self.state.tokens.issue(user.id).unwrap();
        (user, token)
    }

    async fn post(&self, author: &User, text: &str, group: Option<&str>) -> i64 {
        let request = PostRequest {
            text: text.to_owned(),
            group: group.map(str::to_owned),
            image: None,
        };
        create_post_in_db(&self.state.pool, author.id, request)
            .await
            .unwrap()
            .id
    }
}

fn texts(page: &Value) -> Vec<&str> {
    page["posts"]
        .as_array()
        .unwrap()
        .iter()
        .map(|post| post["text"].as_str().unwrap())
        .collect()
}

#[tokio::test]
async fn health_check_is_alive() {
    let app = spawn_app(Duration::from_secs(20)).await;
    let (status, body) = app.raw(Method::GET, "/check_health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(&body[..], b"alive");
}

#[tokio::test]
async fn register_then_login_issue_working_tokens() {
    let app = spawn_app(Duration::from_secs(20)).await;
    let (status, body) = app
        .call(
            Method::POST,
            "/users",
            None,
            Some(json!({"user": {"email": "leo@example.com", "password": "hunter2", "username": "leo"}})),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["user"]["username"], "leo");

    let (status, body) = app
        .call(
            Method::POST,
            "/users/login",
            None,
            Some(json!({"user": {"email": "leo@example.com", "password": "hunter2"}})),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    let token = body["user"]["token"].as_str().unwrap().to_owned();

    let (status, body) = app
        .call(
            Method::POST,
            "/create",
            Some(&token),
            Some(json!({"post": {"text": "first"}})),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["post"]["author"], "leo");

    let (status, _) = app
        .call(
            Method::POST,
            "/users/login",
            None,
            Some(json!({"user": {"email": "leo@example.com", "password": "wrong"}})),
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn duplicate_username_is_unprocessable() {
    let app = spawn_app(Duration::from_secs(20)).await;
    app.user("leo").await;
    let (status, body) = app
        .call(
            Method::POST,
            "/users",
            None,
            Some(json!({"user": {"email": "other@example.com", "password": "pw", "username": "leo"}})),
        )
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(body["errors"]["body"].is_array());
}

#[tokio::test]
async fn creating_a_post_requires_a_token() {
    let app = spawn_app(Duration::from_secs(20)).await;
    let (status, _) = app
        .call(
            Method::POST,
            "/create",
            None,
            Some(json!({"post": {"text": "anonymous"}})),
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = app
        .call(
            Method::POST,
            "/create",
            Some("garbage"),
            Some(json!({"post": {"text": "anonymous"}})),
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn post_with_group_shows_up_in_group_feed() {
    let app = spawn_app(Duration::from_secs(20)).await;
    let (_, token) = app.user("leo").await;
    create_group_in_db(&app.state.pool, "Cats", "cats", "All about cats")
        .await
        .unwrap();

    let (status, body) = app
        .call(
            Method::POST,
            "/create",
            Some(&token),
            Some(json!({"post": {"text": "meow", "group": "cats"}})),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["post"]["group"]["slug"], "cats");

    let (status, page) = app.get("/group/cats", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(texts(&page), vec!["meow"]);
    assert_eq!(page["group"]["title"], "Cats");

    let (status, _) = app.get("/group/dogs", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (_, groups) = app.get("/groups", None).await;
    assert_eq!(groups["groups"][0]["slug"], "cats");
}

#[tokio::test]
async fn unknown_group_on_create_is_unprocessable() {
    let app = spawn_app(Duration::from_secs(20)).await;
    let (_, token) = app.user("leo").await;
    let (status, _) = app
        .call(
            Method::POST,
            "/create",
            Some(&token),
            Some(json!({"post": {"text": "meow", "group": "nope"}})),
        )
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn index_pages_hold_ten_posts_newest_first() {
    let app = spawn_app(Duration::from_secs(20)).await;
    let (leo, _) = app.user("leo").await;
    for n in 1..=13 {
        app.post(&leo, &format!("post {n}"), None).await;
    }

    let (status, first) = app.get("/", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(first["posts"].as_array().unwrap().len(), 10);
    assert_eq!(texts(&first)[0], "post 13");
    assert_eq!(first["totalPages"], 2);
    assert_eq!(first["postsCount"], 13);

    let (_, second) = app.get("/?page=2", None).await;
    assert_eq!(texts(&second), vec!["post 3", "post 2", "post 1"]);

    let (status, beyond) = app.get("/?page=3", None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(beyond["posts"].as_array().unwrap().is_empty());
    assert_eq!(beyond["page"], 3);

    let (_, fallback) = app.get("/?page=abc", None).await;
    assert_eq!(fallback["page"], 1);
}

#[tokio::test]
async fn follow_feed_only_has_followed_authors() {
    let app = spawn_app(Duration::from_secs(20)).await;
    let (_, a_token) = app.user("a").await;
    let (b, _) = app.user("b").await;
    let (c, c_token) = app.user("c").await;

    let (status, body) = app
        .call(Method::POST, "/profile/b/follow", Some(&a_token), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["profile"]["following"], true);

    app.post(&b, "from b", None).await;
    app.post(&c, "from c", None).await;

    let (status, feed) = app.get("/follow", Some(&a_token)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(texts(&feed), vec!["from b"]);

    let (_, feed) = app.get("/follow", Some(&c_token)).await;
    assert!(texts(&feed).is_empty());

    let (status, _) = app.get("/follow", None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (_, profile) = app.get("/profile/b", Some(&a_token)).await;
    assert_eq!(profile["author"]["following"], true);
    assert_eq!(profile["author"]["postsCount"], 1);
    let (_, profile) = app.get("/profile/b", None).await;
    assert_eq!(profile["author"]["following"], false);

    let (_, body) = app
        .call(Method::POST, "/profile/b/unfollow", Some(&a_token), None)
        .await;
    assert_eq!(body["profile"]["following"], false);
    let (_, feed) = app.get("/follow", Some(&a_token)).await;
    assert!(texts(&feed).is_empty());
}

#[tokio::test]
async fn following_yourself_is_ignored() {
    let app = spawn_app(Duration::from_secs(20)).await;
    let (a, a_token) = app.user("a").await;
    app.post(&a, "mine", None).await;

    let (status, body) = app
        .call(Method::POST, "/profile/a/follow", Some(&a_token), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["profile"]["following"], false);

    let (_, feed) = app.get("/follow", Some(&a_token)).await;
    assert!(texts(&feed).is_empty());

    let (status, _) = app
        .call(Method::POST, "/profile/ghost/follow", Some(&a_token), None)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn index_is_served_stale_until_cache_is_cleared() {
    let app = spawn_app(Duration::from_secs(20)).await;
    let (leo, token) = app.user("leo").await;
    app.post(&leo, "old", None).await;

    let (_, before) = app.raw(Method::GET, "/", None, None).await;

    let (status, _) = app
        .call(
            Method::POST,
            "/create",
            Some(&token),
            Some(json!({"post": {"text": "new"}})),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);

    let (_, cached) = app.raw(Method::GET, "/", None, None).await;
    assert_eq!(before, cached);

    app.state.index_cache.clear().await;
    let (_, fresh) = app.get("/", None).await;
    assert_eq!(texts(&fresh), vec!["new", "old"]);
}

#[tokio::test]
async fn index_refreshes_after_ttl() {
    let app = spawn_app(Duration::from_millis(200)).await;
    let (leo, _) = app.user("leo").await;
    app.post(&leo, "old", None).await;

    let (_, before) = app.get("/", None).await;
    assert_eq!(texts(&before), vec!["old"]);
    app.post(&leo, "new", None).await;

    tokio::time::sleep(Duration::from_millis(400)).await;
    let (_, after) = app.get("/", None).await;
    assert_eq!(texts(&after), vec!["new", "old"]);
}

#[tokio::test]
async fn walking_index_pages_keeps_cache_bounded() {
    let pool = connect_db("sqlite::memory:", 1).await.unwrap();
    let mut state = AppState::new(pool, TokenSigner::new("test-secret", 1), Duration::from_secs(20));
    state.index_cache = PageCache::with_capacity(3);
    let app = TestApp {
        router: make_router(state.clone()),
        state,
    };
    let (leo, _) = app.user("leo").await;
    app.post(&leo, "only", None).await;

    for page in 1..=20 {
        let (status, _) = app.get(&format!("/?page={page}"), None).await;
        assert_eq!(status, StatusCode::OK);
    }

    assert_eq!(app.state.index_cache.len().await, 3);
    let (_, latest) = app.get("/?page=20", None).await;
    assert_eq!(latest["page"], 20);
}

#[tokio::test]
async fn only_the_author_can_edit_a_post() {
    let app = spawn_app(Duration::from_secs(20)).await;
    let (leo, leo_token) = app.user("leo").await;
    let (_, other_token) = app.user("other").await;
    let post_id = app.post(&leo, "draft", None).await;
    let uri = format!("/posts/{post_id}/edit");

    let (status, body) = app
        .call(
            Method::PUT,
            &uri,
            Some(&other_token),
            Some(json!({"post": {"text": "hijacked"}})),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert!(body["errors"]["body"].is_array());

    let (_, before_edit) = app.get(&format!("/posts/{post_id}"), None).await;

    let (status, body) = app
        .call(
            Method::PUT,
            &uri,
            Some(&leo_token),
            Some(json!({"post": {"text": "final"}})),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["post"]["text"], "final");
    assert_eq!(body["post"]["pubDate"], before_edit["post"]["pubDate"]);

    let (status, _) = app
        .call(
            Method::PUT,
            "/posts/999/edit",
            Some(&leo_token),
            Some(json!({"post": {"text": "final"}})),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn post_detail_lists_comments_and_author_count() {
    let app = spawn_app(Duration::from_secs(20)).await;
    let (leo, _) = app.user("leo").await;
    let (_, reader_token) = app.user("reader").await;
    let post_id = app.post(&leo, "hello", None).await;
    app.post(&leo, "again", None).await;

    let (status, body) = app
        .call(
            Method::POST,
            &format!("/posts/{post_id}/comment"),
            Some(&reader_token),
            Some(json!({"comment": {"text": "nice"}})),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["comment"]["author"], "reader");

    let (status, detail) = app.get(&format!("/posts/{post_id}"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(detail["post"]["text"], "hello");
    assert_eq!(detail["comments"][0]["text"], "nice");
    assert_eq!(detail["authorPostsCount"], 2);

    let (status, _) = app
        .call(
            Method::POST,
            &format!("/posts/{post_id}/comment"),
            Some(&reader_token),
            Some(json!({"comment": {"text": "   "}})),
        )
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn missing_things_are_not_found() {
    let app = spawn_app(Duration::from_secs(20)).await;
    let (status, body) = app.get("/posts/42", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body["errors"]["body"][0].is_string());

    let (status, _) = app.get("/profile/ghost", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, body) = app.get("/no/such/page", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body["errors"]["body"].is_array());
}

#[tokio::test]
async fn deleting_a_group_keeps_its_posts() {
    let app = spawn_app(Duration::from_secs(20)).await;
    let (leo, _) = app.user("leo").await;
    create_group_in_db(&app.state.pool, "Cats", "cats", "")
        .await
        .unwrap();
    let post_id = app.post(&leo, "meow", Some("cats")).await;

    delete_group_in_db(&app.state.pool, "cats").await.unwrap();

    let (status, detail) = app.get(&format!("/posts/{post_id}"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(detail["post"]["group"].is_null());
    let (status, _) = app.get("/group/cats", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn deleting_yourself_removes_your_posts() {
    let app = spawn_app(Duration::from_secs(20)).await;
    let (leo, leo_token) = app.user("leo").await;
    let (other, _) = app.user("other").await;
    let post_id = app.post(&leo, "bye", None).await;
    app.post(&other, "stays", None).await;

    let (status, _) = app
        .call(Method::DELETE, "/user", Some(&leo_token), None)
        .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = app.get(&format!("/posts/{post_id}"), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (_, page) = app.get("/profile/other", None).await;
    assert_eq!(texts(&page), vec!["stays"]);
    let (status, _) = app.get("/profile/leo", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
