mod common;

use serde_json::Value;

async fn add_comment(
    app: &common::TestApp,
    token: &str,
    post_id: i64,
    text: &str,
) -> reqwest::Response {
    app.client
        .post(app.url(&format!("/posts/{}/comments", post_id)))
        .bearer_auth(token)
        .json(&serde_json::json!({ "text": text }))
        .send()
        .await
        .unwrap()
}

#[tokio::test]
async fn comments_are_listed_chronologically() {
    let app = common::spawn_app().await;
    let (_a, a_token) = common::create_test_user(&app, "thread_a").await;
    let (_b, b_token) = common::create_test_user(&app, "thread_b").await;

    let post_id = common::create_post(&app, &a_token, "Thread", &common::ts(-1), true, None).await;

    for text in ["first", "second", "third"] {
        let resp = add_comment(&app, &b_token, post_id, text).await;
        assert_eq!(resp.status(), 200);
    }

    let resp = app
        .client
        .get(app.url(&format!("/posts/{}/comments", post_id)))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    let items = body["data"].as_array().unwrap();
    assert_eq!(items.len(), 3);
    let texts: Vec<&str> = items.iter().map(|c| c["text"].as_str().unwrap()).collect();
    assert_eq!(texts, vec!["first", "second", "third"]);
}

#[tokio::test]
async fn empty_comment_is_rejected_and_nothing_is_stored() {
    let app = common::spawn_app().await;
    let (_a, a_token) = common::create_test_user(&app, "empty_a").await;

    let post_id = common::create_post(&app, &a_token, "Quiet", &common::ts(-1), true, None).await;

    let resp = add_comment(&app, &a_token, post_id, "").await;
    assert_eq!(resp.status(), 400);

    assert_eq!(common::comment_rows(&app.db, post_id).await, 0);

    let resp = app
        .client
        .get(app.url(&format!("/posts/{}", post_id)))
        .send()
        .await
        .unwrap();
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["data"]["comment_count"], 0);
}

#[tokio::test]
async fn commenting_requires_authentication() {
    let app = common::spawn_app().await;
    let (_a, a_token) = common::create_test_user(&app, "gate_a").await;

    let post_id = common::create_post(&app, &a_token, "Gated", &common::ts(-1), true, None).await;

    let resp = app
        .client
        .post(app.url(&format!("/posts/{}/comments", post_id)))
        .json(&serde_json::json!({ "text": "anonymous?" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 401);
}

#[tokio::test]
async fn commenting_on_missing_post_is_not_found() {
    let app = common::spawn_app().await;
    let (_a, token) = common::create_test_user(&app, "void_a").await;

    let resp = add_comment(&app, &token, 999999, "hello?").await;
    assert_eq!(resp.status(), 404);
}

#[tokio::test]
async fn author_can_edit_own_comment_without_touching_created_at() {
    let app = common::spawn_app().await;
    let (_a, a_token) = common::create_test_user(&app, "editc_a").await;

    let post_id = common::create_post(&app, &a_token, "Editable", &common::ts(-1), true, None).await;
    let resp = add_comment(&app, &a_token, post_id, "tpyo").await;
    let body: Value = resp.json().await.unwrap();
    let comment_id = body["data"]["id"].as_i64().unwrap();
    let created_at = body["data"]["created_at"].as_str().unwrap().to_string();

    let resp = app
        .client
        .put(app.url(&format!("/posts/{}/comments/{}", post_id, comment_id)))
        .bearer_auth(&a_token)
        .json(&serde_json::json!({ "text": "typo" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["data"]["text"], "typo");
    assert_eq!(body["data"]["created_at"], created_at.as_str());
}

#[tokio::test]
async fn non_author_comment_mutations_are_forbidden() {
    let app = common::spawn_app().await;
    let (_a, a_token) = common::create_test_user(&app, "ownc_a").await;
    let (_b, b_token) = common::create_test_user(&app, "ownc_b").await;

    let post_id = common::create_post(&app, &a_token, "Contested", &common::ts(-1), true, None).await;
    let resp = add_comment(&app, &a_token, post_id, "untouchable").await;
    let body: Value = resp.json().await.unwrap();
    let comment_id = body["data"]["id"].as_i64().unwrap();

    let resp = app
        .client
        .put(app.url(&format!("/posts/{}/comments/{}", post_id, comment_id)))
        .bearer_auth(&b_token)
        .json(&serde_json::json!({ "text": "vandalized" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 403);

    let resp = app
        .client
        .delete(app.url(&format!("/posts/{}/comments/{}", post_id, comment_id)))
        .bearer_auth(&b_token)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 403);

    // The comment is unchanged.
    let resp = app
        .client
        .get(app.url(&format!("/posts/{}/comments", post_id)))
        .send()
        .await
        .unwrap();
    let body: Value = resp.json().await.unwrap();
    let items = body["data"].as_array().unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0]["text"], "untouchable");
}

#[tokio::test]
async fn author_can_delete_own_comment() {
    let app = common::spawn_app().await;
    let (_a, a_token) = common::create_test_user(&app, "delc_a").await;

    let post_id = common::create_post(&app, &a_token, "Shrinking", &common::ts(-1), true, None).await;
    let resp = add_comment(&app, &a_token, post_id, "fleeting").await;
    let body: Value = resp.json().await.unwrap();
    let comment_id = body["data"]["id"].as_i64().unwrap();

    let resp = app
        .client
        .delete(app.url(&format!("/posts/{}/comments/{}", post_id, comment_id)))
        .bearer_auth(&a_token)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);

    assert_eq!(common::comment_rows(&app.db, post_id).await, 0);
}

#[tokio::test]
async fn comment_addressed_under_wrong_post_is_not_found() {
    let app = common::spawn_app().await;
    let (_a, token) = common::create_test_user(&app, "pair_a").await;

    let post_one = common::create_post(&app, &token, "One", &common::ts(-1), true, None).await;
    let post_two = common::create_post(&app, &token, "Two", &common::ts(-1), true, None).await;

    let resp = add_comment(&app, &token, post_one, "belongs to one").await;
    let body: Value = resp.json().await.unwrap();
    let comment_id = body["data"]["id"].as_i64().unwrap();

    let resp = app
        .client
        .put(app.url(&format!("/posts/{}/comments/{}", post_two, comment_id)))
        .bearer_auth(&token)
        .json(&serde_json::json!({ "text": "misdirected" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 404);

    let resp = app
        .client
        .delete(app.url(&format!("/posts/{}/comments/{}", post_two, comment_id)))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 404);

    // Still attached to its real post, unmodified.
    let resp = app
        .client
        .get(app.url(&format!("/posts/{}/comments", post_one)))
        .send()
        .await
        .unwrap();
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["data"][0]["text"], "belongs to one");
}
