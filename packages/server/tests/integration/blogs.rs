use sea_orm::ConnectionTrait;
use serde_json::json;

use crate::common::{TestApp, blog_form, routes};

mod listing {
    use super::*;

    #[tokio::test]
    async fn empty_store_lists_no_blogs() {
        let app = TestApp::spawn().await;

        let res = app.get(routes::BLOGS).await;

        assert_eq!(res.status, 200);
        assert_eq!(res.body, json!([]));
        assert_eq!(res.cache_control.as_deref(), Some("private, max-age=300"));
    }

    #[tokio::test]
    async fn lists_every_created_blog() {
        let app = TestApp::spawn().await;
        app.create_blog("First", "one", &["a"]).await;
        app.create_blog("Second", "two", &[]).await;

        let res = app.get(routes::BLOGS).await;

        assert_eq!(res.status, 200);
        let titles: Vec<&str> = res
            .body
            .as_array()
            .expect("list should be an array")
            .iter()
            .map(|b| b["title"].as_str().unwrap())
            .collect();
        assert_eq!(titles.len(), 2);
        assert!(titles.contains(&"First"));
        assert!(titles.contains(&"Second"));
    }

    #[tokio::test]
    async fn index_alias_serves_the_list() {
        let app = TestApp::spawn().await;
        app.create_blog("Only", "one", &[]).await;

        let res = app.get("/Blogs/Index").await;

        assert_eq!(res.status, 200);
        assert_eq!(res.body.as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn root_redirects_to_the_list() {
        let app = TestApp::spawn().await;

        let res = app.get(routes::HOME).await;

        assert_eq!(res.status, 303);
        assert_eq!(res.location.as_deref(), Some(routes::BLOGS));
    }
}

mod not_found {
    use super::*;

    #[tokio::test]
    async fn details_of_a_missing_blog_is_not_found() {
        let app = TestApp::spawn().await;

        let res = app.get(&routes::details(9999)).await;

        assert_eq!(res.status, 404);
        assert_eq!(res.body["code"], "NOT_FOUND");
    }

    #[tokio::test]
    async fn edit_form_of_a_missing_blog_is_not_found() {
        let app = TestApp::spawn().await;

        let res = app.get(&routes::edit(9999)).await;

        assert_eq!(res.status, 404);
        assert_eq!(res.body["code"], "NOT_FOUND");
    }

    #[tokio::test]
    async fn delete_form_of_a_missing_blog_is_not_found() {
        let app = TestApp::spawn().await;

        let res = app.get(&routes::delete(9999)).await;

        assert_eq!(res.status, 404);
        assert_eq!(res.body["code"], "NOT_FOUND");
    }
}

mod creation {
    use super::*;

    #[tokio::test]
    async fn create_form_offers_two_empty_comment_slots() {
        let app = TestApp::spawn().await;

        let res = app.get(routes::CREATE).await;

        assert_eq!(res.status, 200);
        assert_eq!(res.body["model"]["blog"]["title"], "");
        assert_eq!(
            res.body["model"]["comments"],
            json!([{ "id": 0, "content": "" }, { "id": 0, "content": "" }])
        );
        assert_eq!(res.body["errors"], json!([]));
        assert_eq!(res.body["antiforgery_token"].as_str().unwrap().len(), 64);
    }

    #[tokio::test]
    async fn creates_the_blog_and_every_comment() {
        let app = TestApp::spawn().await;

        let res = app
            .post_form(
                routes::CREATE,
                &blog_form(0, "Hello", "World", &["first", "second", "third"]),
            )
            .await;

        assert_eq!(res.status, 303, "{}", res.text);
        assert_eq!(res.location.as_deref(), Some(routes::BLOGS));
        assert_eq!(app.blog_count().await, 1);
        assert_eq!(app.comment_count().await, 3);

        let details = app.get(routes::BLOGS).await;
        let id = details.body[0]["id"].as_i64().unwrap() as i32;
        let comments = app.comments_of(id).await;
        assert_eq!(comments.len(), 3);
        assert!(comments.iter().all(|c| c.blog_id == id));
        let contents: Vec<&str> = comments.iter().map(|c| c.content.as_str()).collect();
        assert_eq!(contents, vec!["first", "second", "third"]);
    }

    #[tokio::test]
    async fn creates_a_blog_without_comments() {
        let app = TestApp::spawn().await;

        let res = app
            .post_form(routes::CREATE, &blog_form(0, "Lonely", "No comments", &[]))
            .await;

        assert_eq!(res.status, 303, "{}", res.text);
        assert_eq!(app.blog_count().await, 1);
        assert_eq!(app.comment_count().await, 0);
    }

    #[tokio::test]
    async fn missing_fields_rerender_the_form_without_writing() {
        let app = TestApp::spawn().await;
        let form = blog_form(0, "", "Body", &["ok", "  "]);

        let res = app.post_form(routes::CREATE, &form).await;

        assert_eq!(res.status, 422, "{}", res.text);
        assert_eq!(
            res.error_fields(),
            vec!["blog.title".to_string(), "comments[1].content".to_string()]
        );
        assert_eq!(res.body["model"]["blog"]["content"], "Body");
        assert_eq!(res.body["model"]["comments"][0]["content"], "ok");
        assert!(res.body["antiforgery_token"].is_string());
        assert_eq!(app.blog_count().await, 0);
        assert_eq!(app.comment_count().await, 0);
    }

    #[tokio::test]
    async fn malformed_body_is_a_validation_error() {
        let app = TestApp::spawn().await;
        let token = app.antiforgery_token().await;

        let res = app
            .post_with_token(routes::CREATE, &json!({ "blog": "not an object" }), &token)
            .await;

        assert_eq!(res.status, 400);
        assert_eq!(res.body["code"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn failure_after_the_blog_insert_leaves_no_rows() {
        let app = TestApp::spawn().await;
        let token = app.antiforgery_token().await;

        // The blog insert succeeds; the first comment insert then fails.
        app.db
            .execute_unprepared("DROP TABLE comment")
            .await
            .expect("Failed to drop comment table");

        let res = app
            .post_with_token(
                routes::CREATE,
                &blog_form(0, "Doomed", "Never stored", &["a", "b"]),
                &token,
            )
            .await;

        assert_eq!(res.status, 422, "{}", res.text);
        assert_eq!(res.error_fields(), vec!["".to_string()]);
        assert_eq!(
            res.body["errors"][0]["message"],
            "An error occurred while creating the blog and comments."
        );
        assert_eq!(res.body["model"]["blog"]["title"], "Doomed");
        assert_eq!(app.blog_count().await, 0);
    }
}

mod antiforgery {
    use super::*;

    #[tokio::test]
    async fn post_without_token_is_rejected() {
        let app = TestApp::spawn().await;
        // The cookie is set, but the header is missing.
        app.antiforgery_token().await;

        let res = app
            .post_without_token(routes::CREATE, &blog_form(0, "T", "C", &[]))
            .await;

        assert_eq!(res.status, 400);
        assert_eq!(res.body["code"], "ANTIFORGERY_TOKEN_INVALID");
        assert_eq!(app.blog_count().await, 0);
    }

    #[tokio::test]
    async fn post_without_cookie_is_rejected() {
        let app = TestApp::spawn().await;

        let res = app
            .post_with_token(routes::CREATE, &blog_form(0, "T", "C", &[]), "deadbeef")
            .await;

        assert_eq!(res.status, 400);
        assert_eq!(res.body["code"], "ANTIFORGERY_TOKEN_INVALID");
    }

    #[tokio::test]
    async fn mismatched_token_is_rejected() {
        let app = TestApp::spawn().await;
        let token = app.antiforgery_token().await;
        let forged = token.chars().rev().collect::<String>();

        let res = app
            .post_with_token(routes::CREATE, &blog_form(0, "T", "C", &[]), &forged)
            .await;

        assert_eq!(res.status, 400);
        assert_eq!(res.body["code"], "ANTIFORGERY_TOKEN_INVALID");
        assert_eq!(app.blog_count().await, 0);
    }

    #[tokio::test]
    async fn delete_requires_a_token() {
        let app = TestApp::spawn().await;
        let id = app.create_blog("Keep", "me", &["c"]).await;

        let res = app.post_without_token(&routes::delete(id), &json!({})).await;

        assert_eq!(res.status, 400);
        assert_eq!(app.blog_count().await, 1);
    }
}

mod editing {
    use super::*;

    #[tokio::test]
    async fn create_details_and_edit_form_round_trip() {
        let app = TestApp::spawn().await;
        let id = app.create_blog("Title", "Content", &["one", "two"]).await;

        let details = app.get(&routes::details(id)).await;
        assert_eq!(details.status, 200);
        assert_eq!(details.body["blog"]["id"], id);
        assert_eq!(details.body["blog"]["title"], "Title");
        assert_eq!(details.body["blog"]["content"], "Content");
        assert_eq!(details.body["comments"][0]["content"], "one");
        assert_eq!(details.body["comments"][1]["content"], "two");

        let form = app.get(&routes::edit(id)).await;
        assert_eq!(form.status, 200);
        assert_eq!(form.body["model"], details.body);
        assert_eq!(form.body["model"]["blog"]["concurrency_token"], 0);
    }

    #[tokio::test]
    async fn edit_overwrites_blog_and_matching_comments() {
        let app = TestApp::spawn().await;
        let id = app.create_blog("Old", "Old body", &["c1", "c2"]).await;
        let mut model = app.get(&routes::edit(id)).await.body["model"].clone();
        model["blog"]["title"] = json!("New");
        model["blog"]["content"] = json!("New body");
        model["comments"][1]["content"] = json!("c2 edited");

        let res = app.post_form(&routes::edit(id), &model).await;

        assert_eq!(res.status, 303, "{}", res.text);
        assert_eq!(res.location.as_deref(), Some(routes::BLOGS));
        let details = app.get(&routes::details(id)).await;
        assert_eq!(details.body["blog"]["title"], "New");
        assert_eq!(details.body["blog"]["content"], "New body");
        assert_eq!(details.body["blog"]["concurrency_token"], 1);
        assert_eq!(details.body["comments"][0]["content"], "c1");
        assert_eq!(details.body["comments"][1]["content"], "c2 edited");
    }

    #[tokio::test]
    async fn edit_ignores_comments_that_do_not_exist() {
        let app = TestApp::spawn().await;
        let id = app.create_blog("Blog", "Body", &["kept"]).await;
        let mut model = app.get(&routes::edit(id)).await.body["model"].clone();
        model["comments"] = json!([
            model["comments"][0].clone(),
            { "id": 0, "content": "new via edit" },
            { "id": 9999, "content": "ghost" },
        ]);

        let res = app.post_form(&routes::edit(id), &model).await;

        assert_eq!(res.status, 303, "{}", res.text);
        assert_eq!(app.comment_count().await, 1);
        let comments = app.comments_of(id).await;
        assert_eq!(comments[0].content, "kept");
    }

    #[tokio::test]
    async fn edit_does_not_touch_comments_of_other_blogs() {
        let app = TestApp::spawn().await;
        let first = app.create_blog("First", "Body", &["mine"]).await;
        let second = app.create_blog("Second", "Body", &["theirs"]).await;
        let foreign_id = app.comments_of(second).await[0].id;

        let mut model = app.get(&routes::edit(first)).await.body["model"].clone();
        model["comments"] = json!([{ "id": foreign_id, "content": "hijacked" }]);
        let res = app.post_form(&routes::edit(first), &model).await;

        assert_eq!(res.status, 303, "{}", res.text);
        assert_eq!(app.comments_of(second).await[0].content, "theirs");
    }

    #[tokio::test]
    async fn route_id_must_match_the_submitted_id() {
        let app = TestApp::spawn().await;
        let id = app.create_blog("Blog", "Body", &[]).await;

        let res = app
            .post_form(&routes::edit(id), &blog_form(id + 1, "X", "Y", &[]))
            .await;

        assert_eq!(res.status, 404);
        assert_eq!(res.body["code"], "NOT_FOUND");
        let details = app.get(&routes::details(id)).await;
        assert_eq!(details.body["blog"]["title"], "Blog");
    }

    #[tokio::test]
    async fn editing_a_missing_blog_is_not_found() {
        let app = TestApp::spawn().await;

        let res = app
            .post_form(&routes::edit(9999), &blog_form(9999, "X", "Y", &[]))
            .await;

        assert_eq!(res.status, 404);
        assert_eq!(res.body["code"], "NOT_FOUND");
    }

    #[tokio::test]
    async fn invalid_edit_rerenders_the_form() {
        let app = TestApp::spawn().await;
        let id = app.create_blog("Blog", "Body", &[]).await;

        let res = app
            .post_form(&routes::edit(id), &blog_form(id, "Blog", "", &[]))
            .await;

        assert_eq!(res.status, 422);
        assert_eq!(res.error_fields(), vec!["blog.content".to_string()]);
        let details = app.get(&routes::details(id)).await;
        assert_eq!(details.body["blog"]["content"], "Body");
    }

    #[tokio::test]
    async fn edit_without_a_concurrency_token_is_rejected() {
        let app = TestApp::spawn().await;
        let id = app.create_blog("Blog", "Body", &[]).await;
        let mut model = app.get(&routes::edit(id)).await.body["model"].clone();
        model["blog"]["title"] = json!("Untracked");
        model["blog"]
            .as_object_mut()
            .unwrap()
            .remove("concurrency_token");

        let res = app.post_form(&routes::edit(id), &model).await;

        assert_eq!(res.status, 422, "{}", res.text);
        assert_eq!(
            res.error_fields(),
            vec!["blog.concurrency_token".to_string()]
        );
        let details = app.get(&routes::details(id)).await;
        assert_eq!(details.body["blog"]["title"], "Blog");
        assert_eq!(details.body["blog"]["concurrency_token"], 0);
    }

    #[tokio::test]
    async fn second_edit_from_the_same_state_is_a_conflict() {
        let app = TestApp::spawn().await;
        let id = app.create_blog("Original", "Body", &["c"]).await;

        let mut alice = app.get(&routes::edit(id)).await.body["model"].clone();
        let mut bob = app.get(&routes::edit(id)).await.body["model"].clone();
        alice["blog"]["title"] = json!("Alice");
        bob["blog"]["title"] = json!("Bob");
        bob["comments"][0]["content"] = json!("Bob's comment");

        let first = app.post_form(&routes::edit(id), &alice).await;
        assert_eq!(first.status, 303, "{}", first.text);

        let second = app.post_form(&routes::edit(id), &bob).await;
        assert_eq!(second.status, 409, "{}", second.text);
        assert_eq!(
            second.error_fields(),
            vec!["blog.concurrency_token".to_string()]
        );
        assert_eq!(
            second.body["errors"][0]["message"],
            "The blog has been updated by another user."
        );
        assert_eq!(second.body["model"]["blog"]["title"], "Bob");

        let details = app.get(&routes::details(id)).await;
        assert_eq!(details.body["blog"]["title"], "Alice");
        assert_eq!(details.body["comments"][0]["content"], "c");
    }
}

mod deletion {
    use super::*;

    #[tokio::test]
    async fn delete_form_shows_the_blog() {
        let app = TestApp::spawn().await;
        let id = app.create_blog("Doomed", "Body", &[]).await;

        let res = app.get(&routes::delete(id)).await;

        assert_eq!(res.status, 200);
        assert_eq!(res.body["blog"]["title"], "Doomed");
        assert!(res.body["antiforgery_token"].is_string());
    }

    #[tokio::test]
    async fn delete_removes_the_blog_and_its_comments() {
        let app = TestApp::spawn().await;
        let doomed = app.create_blog("Doomed", "Body", &["a", "b"]).await;
        let kept = app.create_blog("Kept", "Body", &["c"]).await;

        let res = app.post_form(&routes::delete(doomed), &json!({})).await;

        assert_eq!(res.status, 303, "{}", res.text);
        assert_eq!(res.location.as_deref(), Some(routes::BLOGS));
        assert_eq!(app.get(&routes::details(doomed)).await.status, 404);
        assert!(app.comments_of(doomed).await.is_empty());
        assert_eq!(app.blog_count().await, 1);
        assert_eq!(app.comments_of(kept).await.len(), 1);
    }

    #[tokio::test]
    async fn deleting_a_missing_blog_still_redirects() {
        let app = TestApp::spawn().await;
        app.create_blog("Survivor", "Body", &["c"]).await;

        let res = app.post_form(&routes::delete(9999), &json!({})).await;

        assert_eq!(res.status, 303);
        assert_eq!(res.location.as_deref(), Some(routes::BLOGS));
        assert_eq!(app.blog_count().await, 1);
        assert_eq!(app.comment_count().await, 1);
    }

    #[tokio::test]
    async fn deleting_twice_is_harmless() {
        let app = TestApp::spawn().await;
        let id = app.create_blog("Once", "Body", &[]).await;

        let first = app.post_form(&routes::delete(id), &json!({})).await;
        let second = app.post_form(&routes::delete(id), &json!({})).await;

        assert_eq!(first.status, 303);
        assert_eq!(second.status, 303);
        assert_eq!(app.blog_count().await, 0);
    }
}
