use std::collections::HashSet;

use sea_orm::{ColumnTrait, ConnectionTrait, EntityTrait, PaginatorTrait, QueryFilter};
use serde_json::json;

use server::entity::advertisement;

use crate::common::{TestApp, TestResponse, classified_body, routes, words};

async fn stored_text(app: &TestApp, reference: &str) -> String {
    advertisement::Entity::find()
        .filter(advertisement::Column::ReferenceNumber.eq(reference))
        .one(&app.db)
        .await
        .unwrap()
        .expect("advertisement should exist")
        .ad_text
}

fn extra_words_line(body: &serde_json::Value) -> serde_json::Value {
    body["items"]
        .as_array()
        .unwrap()
        .iter()
        .find(|item| item["kind"] == "extra_words")
        .cloned()
        .expect("breakdown should have an extra-words line")
}

mod catalog {
    use super::*;

    #[tokio::test]
    async fn only_active_newspapers_are_listed() {
        let app = TestApp::spawn().await;

        let res = app.get(routes::NEWSPAPERS).await;

        assert_eq!(res.status, 200);
        let names: Vec<&str> = res
            .body
            .as_array()
            .unwrap()
            .iter()
            .map(|paper| paper["name"].as_str().unwrap())
            .collect();
        assert!(names.contains(&"Daily Mirror"));
        assert!(!names.contains(&"Closed Weekly"));

        let mirror = res
            .body
            .as_array()
            .unwrap()
            .iter()
            .find(|paper| paper["name"] == "Daily Mirror")
            .unwrap();
        assert_eq!(mirror["ad_types"].as_array().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn quote_counts_only_words_that_will_be_stored() {
        let app = TestApp::spawn().await;
        let newspaper_id = app.newspaper_id("Daily Mirror").await;

        let res = app
            .post(
                routes::QUOTES,
                &json!({
                    "newspaper_id": newspaper_id,
                    "ad_type": "classified",
                    "text": words(80),
                }),
            )
            .await;

        assert_eq!(res.status, 200, "{}", res.text);
        assert_eq!(res.body["max_words"], 65);
        assert_eq!(res.body["breakdown"]["billable_words"], 65);
        assert_eq!(extra_words_line(&res.body["breakdown"])["quantity"], 45.0);
        assert_eq!(res.body["breakdown"]["total"], 2350.0);
    }

    #[tokio::test]
    async fn casual_quote_without_size_is_rejected() {
        let app = TestApp::spawn().await;
        let newspaper_id = app.newspaper_id("Daily Mirror").await;

        let res = app
            .post(
                routes::QUOTES,
                &json!({"newspaper_id": newspaper_id, "ad_type": "casual"}),
            )
            .await;

        assert_eq!(res.status, 400);
        assert_eq!(res.body["code"], "VALIDATION_ERROR");
    }
}

mod submission {
    use super::*;

    #[tokio::test]
    async fn long_text_is_truncated_to_the_word_limit() {
        let app = TestApp::spawn().await;
        let newspaper_id = app.newspaper_id("Daily Mirror").await;

        let (reference, token, body) = app.submit(&classified_body(newspaper_id, &words(80))).await;

        assert_eq!(reference, "0000700000000001");
        assert_eq!(body["price"], 2350.0);
        assert_eq!(extra_words_line(&body["breakdown"])["quantity"], 45.0);

        let tracked = app.track(&reference, &token).await;
        assert_eq!(tracked.status, 200, "{}", tracked.text);
        assert_eq!(tracked.body["status"], "Pending");
        assert_eq!(tracked.body["ad_text"], words(65));
        assert_eq!(tracked.body["attempts"], 1);
    }

    #[tokio::test]
    async fn priority_text_is_stored_with_the_marker() {
        let app = TestApp::spawn().await;
        let newspaper_id = app.newspaper_id("Daily Mirror").await;
        let mut body = classified_body(newspaper_id, "Toyota Axio for sale");
        body["priority"] = json!(true);

        let (reference, token, submitted) = app.submit(&body).await;

        assert_eq!(submitted["price"], 1400.0);
        assert_eq!(stored_text(&app, &reference).await, "0Toyota Axio for sale");
        let tracked = app.track(&reference, &token).await;
        assert_eq!(tracked.body["ad_text"], "Toyota Axio for sale");
        assert_eq!(tracked.body["priority"], true);
    }

    #[tokio::test]
    async fn echoed_priority_text_is_not_marked_twice() {
        let app = TestApp::spawn().await;
        let newspaper_id = app.newspaper_id("Daily Mirror").await;
        let mut body = classified_body(newspaper_id, "Toyota Axio for sale");
        body["priority"] = json!(true);
        let (reference, token, _) = app.submit(&body).await;

        let tracked = app.track(&reference, &token).await;
        let shown = tracked.body["ad_text"].as_str().unwrap().to_string();
        let res = app
            .customer_action(
                &reference,
                "resubmit",
                &json!({"ad_text": format!("{shown} cheap")}),
                &token,
            )
            .await;
        assert_eq!(res.status, 200, "{}", res.text);
        assert_eq!(stored_text(&app, &reference).await, "0Toyota Axio for sale cheap");

        let res = app
            .customer_action(
                &reference,
                "resubmit",
                &json!({"ad_text": "Toyota Axio for sale cheap"}),
                &token,
            )
            .await;
        assert_eq!(res.status, 400);
        assert_eq!(stored_text(&app, &reference).await, "0Toyota Axio for sale cheap");
    }

    #[tokio::test]
    async fn wizard_draft_is_finalized_and_submitted() {
        let app = TestApp::spawn().await;
        let newspaper_id = app.newspaper_id("Daily Mirror").await;

        let res = app
            .post(
                routes::DRAFTS,
                &json!({"patches": [
                    {"op": "select_newspaper", "newspaper_id": newspaper_id},
                    {"op": "select_ad_type", "ad_type": "classified"},
                    {"op": "set_text", "text": words(80)},
                    {"op": "set_extras", "background_tint": false, "post_to_web": false, "priority": false},
                    {"op": "set_advertiser", "name": "Nimal Perera", "email": "nimal@example.lk", "phone": "0771234567"},
                    {"op": "set_schedule", "classification": "Vehicles", "subcategory": null, "publish_date": "2026-11-01"}
                ]}),
            )
            .await;

        assert_eq!(res.status, 201, "{}", res.text);
        assert_eq!(res.body["reference_number"], "0000700000000001");
        assert_eq!(res.body["price"], 2350.0);
        assert_eq!(stored_text(&app, "0000700000000001").await, words(65));
    }

    #[tokio::test]
    async fn incomplete_draft_stores_nothing() {
        let app = TestApp::spawn().await;
        let newspaper_id = app.newspaper_id("Daily Mirror").await;

        let res = app
            .post(
                routes::DRAFTS,
                &json!({"patches": [
                    {"op": "select_newspaper", "newspaper_id": newspaper_id},
                    {"op": "select_ad_type", "ad_type": "casual"},
                    {"op": "set_classified_options", "publish_in_english": true}
                ]}),
            )
            .await;

        assert_eq!(res.status, 400);
        assert_eq!(res.body["code"], "VALIDATION_ERROR");
        assert_eq!(advertisement::Entity::find().count(&app.db).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn confirmation_email_carries_the_tracking_link() {
        let app = TestApp::spawn().await;
        let newspaper_id = app.newspaper_id("Daily Mirror").await;

        let (reference, token, body) = app
            .submit(&classified_body(newspaper_id, "Room for rent in Nugegoda"))
            .await;

        assert_eq!(
            body["tracking_link"],
            format!("http://portal.test/track/{reference}?token={token}")
        );
        let sent = app.wait_for_emails(1).await;
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].to, "nimal@example.lk");
        assert!(sent[0].subject.contains(&reference));
        assert!(sent[0].html.contains(&token));
    }

    #[tokio::test]
    async fn invalid_submission_is_rejected_and_not_stored() {
        let app = TestApp::spawn().await;
        let newspaper_id = app.newspaper_id("Daily Mirror").await;
        let mut body = classified_body(newspaper_id, "Room for rent");
        body["advertiser"]["email"] = json!("not-an-email");

        let res = app.post(routes::ADVERTISEMENTS, &body).await;

        assert_eq!(res.status, 400);
        assert_eq!(res.body["code"], "VALIDATION_ERROR");

        let (reference, _) = app.submit_classified("Room for rent").await;
        assert_eq!(reference, "0000700000000001");
    }

    #[tokio::test]
    async fn unknown_newspaper_is_not_found() {
        let app = TestApp::spawn().await;

        let res = app
            .post(routes::ADVERTISEMENTS, &classified_body(9999, "Room for rent"))
            .await;

        assert_eq!(res.status, 404);
        assert_eq!(res.body["code"], "NOT_FOUND");
    }

    #[tokio::test]
    async fn malformed_json_is_a_validation_error() {
        let app = TestApp::spawn().await;

        let res = app
            .client
            .post(app.url(routes::ADVERTISEMENTS))
            .header("Content-Type", "application/json")
            .body("{\"newspaper_id\": ")
            .send()
            .await
            .unwrap();
        let res = TestResponse::from_response(res).await;

        assert_eq!(res.status, 400);
        assert_eq!(res.body["code"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn concurrent_submissions_get_distinct_references() {
        let app = TestApp::spawn().await;
        let newspaper_id = app.newspaper_id("Daily Mirror").await;

        let mut tasks = tokio::task::JoinSet::new();
        for i in 0..10 {
            let client = app.client.clone();
            let url = app.url(routes::ADVERTISEMENTS);
            let body = classified_body(newspaper_id, &format!("Concurrent ad number {i}"));
            tasks.spawn(async move { client.post(url).json(&body).send().await.unwrap() });
        }

        let mut references = HashSet::new();
        while let Some(res) = tasks.join_next().await {
            let res = TestResponse::from_response(res.unwrap()).await;
            assert_eq!(res.status, 201, "{}", res.text);
            let reference = res.body["reference_number"].as_str().unwrap().to_string();
            assert_eq!(reference.len(), 16);
            assert!(reference.starts_with("00007"));
            references.insert(reference);
        }

        let expected: HashSet<String> = (1..=10).map(|n| format!("00007{n:011}")).collect();
        assert_eq!(references, expected);
    }

    #[tokio::test]
    async fn taken_reference_ends_in_service_unavailable() {
        let app = TestApp::spawn().await;
        let newspaper_id = app.newspaper_id("Daily Mirror").await;
        for sql in [
            "CREATE TABLE reference_claim (reference TEXT NOT NULL UNIQUE)",
            "CREATE TRIGGER claim_reference BEFORE INSERT ON advertisement \
             BEGIN INSERT INTO reference_claim (reference) VALUES (NEW.reference_number); END",
            "INSERT INTO reference_claim (reference) VALUES ('0000700000000001')",
        ] {
            app.db.execute_unprepared(sql).await.unwrap();
        }

        let res = app
            .post(routes::ADVERTISEMENTS, &classified_body(newspaper_id, "Car for sale"))
            .await;

        assert_eq!(res.status, 503, "{}", res.text);
        assert_eq!(res.body["code"], "REFERENCE_EXHAUSTED");
        assert_eq!(advertisement::Entity::find().count(&app.db).await.unwrap(), 0);
    }
}
