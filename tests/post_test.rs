mod common;

use serde_json::Value;

#[tokio::test]
async fn create_and_get_post() {
    let app = common::spawn_app().await;
    let (user_id, token) = common::create_test_user(&app, "author").await;

    let resp = app
        .client
        .post(app.url("/posts"))
        .bearer_auth(&token)
        .json(&serde_json::json!({
            "title": "First post",
            "text": "Hello, **world**!",
            "pub_date": common::ts(-1),
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    let post_id = body["data"]["id"].as_i64().unwrap();
    assert_eq!(body["data"]["author_id"].as_i64().unwrap() as i32, user_id);
    assert_eq!(body["data"]["comment_count"], 0);

    let resp = app
        .client
        .get(app.url(&format!("/posts/{}", post_id)))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["data"]["title"], "First post");
    assert!(body["data"]["text_html"]
        .as_str()
        .unwrap()
        .contains("<strong>world</strong>"));
}

#[tokio::test]
async fn scheduled_post_is_persisted_but_not_in_feed() {
    let app = common::spawn_app().await;
    let (_user_id, token) = common::create_test_user(&app, "scheduler").await;

    let post_id = common::create_post(&app, &token, "From the future", &common::ts(1), true, None).await;

    // Persisted: the author can open it.
    let resp = app
        .client
        .get(app.url(&format!("/posts/{}", post_id)))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);

    // Absent from the feed until pub_date elapses.
    assert!(!common::feed_ids(&app).await.contains(&post_id));

    // And hidden from anonymous readers on the detail page too.
    let resp = app
        .client
        .get(app.url(&format!("/posts/{}", post_id)))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 404);
}

#[tokio::test]
async fn unpublished_post_is_visible_only_to_author() {
    let app = common::spawn_app().await;
    let (_a_id, a_token) = common::create_test_user(&app, "drafter").await;
    let (_b_id, b_token) = common::create_test_user(&app, "reader").await;

    let post_id = common::create_post(&app, &a_token, "Draft", &common::ts(-1), false, None).await;

    let resp = app
        .client
        .get(app.url(&format!("/posts/{}", post_id)))
        .bearer_auth(&a_token)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);

    let resp = app
        .client
        .get(app.url(&format!("/posts/{}", post_id)))
        .bearer_auth(&b_token)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 404);

    let resp = app
        .client
        .get(app.url(&format!("/posts/{}", post_id)))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 404);
}

#[tokio::test]
async fn non_owner_update_is_forbidden_and_post_unchanged() {
    let app = common::spawn_app().await;
    let (_a_id, a_token) = common::create_test_user(&app, "owner_u").await;
    let (_b_id, b_token) = common::create_test_user(&app, "intruder_u").await;

    let post_id = common::create_post(&app, &a_token, "Mine", &common::ts(-1), true, None).await;

    let resp = app
        .client
        .put(app.url(&format!("/posts/{}", post_id)))
        .bearer_auth(&b_token)
        .json(&serde_json::json!({
            "title": "Hijacked",
            "text": "gotcha",
            "pub_date": common::ts(-1),
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 403);

    let resp = app
        .client
        .get(app.url(&format!("/posts/{}", post_id)))
        .send()
        .await
        .unwrap();
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["data"]["title"], "Mine");
}

#[tokio::test]
async fn non_owner_delete_is_forbidden_and_post_remains() {
    let app = common::spawn_app().await;
    let (_a_id, a_token) = common::create_test_user(&app, "owner_d").await;
    let (_b_id, b_token) = common::create_test_user(&app, "intruder_d").await;

    let post_id = common::create_post(&app, &a_token, "Keep me", &common::ts(-1), true, None).await;

    let resp = app
        .client
        .delete(app.url(&format!("/posts/{}", post_id)))
        .bearer_auth(&b_token)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 403);

    let resp = app
        .client
        .get(app.url(&format!("/posts/{}", post_id)))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
}

#[tokio::test]
async fn deleting_a_post_cascades_to_its_comments() {
    let app = common::spawn_app().await;
    let (_a_id, a_token) = common::create_test_user(&app, "cascade_a").await;
    let (_b_id, b_token) = common::create_test_user(&app, "cascade_b").await;

    let post_id = common::create_post(&app, &a_token, "Doomed", &common::ts(-1), true, None).await;

    for text in ["first!", "second!"] {
        let resp = app
            .client
            .post(app.url(&format!("/posts/{}/comments", post_id)))
            .bearer_auth(&b_token)
            .json(&serde_json::json!({ "text": text }))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), 200);
    }
    assert_eq!(common::comment_rows(&app.db, post_id).await, 2);

    let resp = app
        .client
        .delete(app.url(&format!("/posts/{}", post_id)))
        .bearer_auth(&a_token)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);

    let resp = app
        .client
        .get(app.url(&format!("/posts/{}", post_id)))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 404);

    assert_eq!(common::comment_rows(&app.db, post_id).await, 0);
}

#[tokio::test]
async fn owner_can_update_own_post() {
    let app = common::spawn_app().await;
    let (_id, token) = common::create_test_user(&app, "reviser").await;

    let post_id = common::create_post(&app, &token, "Rough cut", &common::ts(-1), true, None).await;

    let resp = app
        .client
        .put(app.url(&format!("/posts/{}", post_id)))
        .bearer_auth(&token)
        .json(&serde_json::json!({
            "title": "Final cut",
            "text": "polished",
            "pub_date": common::ts(-2),
            "is_published": true,
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["data"]["title"], "Final cut");
}

#[tokio::test]
async fn unknown_category_reference_is_rejected() {
    let app = common::spawn_app().await;
    let (_id, token) = common::create_test_user(&app, "badref").await;

    let resp = app
        .client
        .post(app.url("/posts"))
        .bearer_auth(&token)
        .json(&serde_json::json!({
            "title": "Orphan",
            "text": "text",
            "pub_date": common::ts(-1),
            "category_id": 999999,
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);
}

#[tokio::test]
async fn creating_posts_requires_authentication() {
    let app = common::spawn_app().await;

    let resp = app
        .client
        .post(app.url("/posts"))
        .json(&serde_json::json!({
            "title": "Anonymous",
            "text": "text",
            "pub_date": common::ts(-1),
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 401);
}
