use serde_json::json;

use crate::common::{TestApp, classified_body, routes, token_from_link};

mod auth {
    use super::*;

    #[tokio::test]
    async fn wrong_password_is_rejected() {
        let app = TestApp::spawn().await;

        let res = app
            .post(
                routes::LOGIN,
                &json!({"username": "editor", "password": "wrong-password"}),
            )
            .await;

        assert_eq!(res.status, 401);
        assert_eq!(res.body["code"], "INVALID_CREDENTIALS");
    }

    #[tokio::test]
    async fn queue_requires_a_bearer_token() {
        let app = TestApp::spawn().await;

        let res = app.get(routes::ADMIN_ADVERTISEMENTS).await;
        assert_eq!(res.status, 401);
        assert_eq!(res.body["code"], "TOKEN_MISSING");

        let res = app
            .get_with_token(routes::ADMIN_ADVERTISEMENTS, "garbage")
            .await;
        assert_eq!(res.status, 401);
        assert_eq!(res.body["code"], "TOKEN_INVALID");
    }
}

mod queue {
    use super::*;

    #[tokio::test]
    async fn list_filters_by_status_and_paginates() {
        let app = TestApp::spawn().await;
        let (first, _) = app.submit_classified("Room for rent in Nugegoda").await;
        app.submit_classified("House for sale in Kandy").await;
        app.submit_classified("Tutor wanted for grade five").await;
        let res = app.admin_decide(&first, &json!({"status": "Declined"})).await;
        assert_eq!(res.status, 200, "{}", res.text);
        let token = app.admin_token().await;

        let res = app
            .get_with_token(
                &format!("{}?status=Pending&per_page=1", routes::ADMIN_ADVERTISEMENTS),
                &token,
            )
            .await;

        assert_eq!(res.status, 200, "{}", res.text);
        assert_eq!(res.body["data"].as_array().unwrap().len(), 1);
        assert_eq!(res.body["data"][0]["status"], "Pending");
        assert_eq!(res.body["pagination"]["total"], 2);
        assert_eq!(res.body["pagination"]["total_pages"], 2);
    }

    #[tokio::test]
    async fn detail_lists_the_admin_actions_available() {
        let app = TestApp::spawn().await;
        let (reference, _) = app.submit_classified("Room for rent in Nugegoda").await;
        let token = app.admin_token().await;

        let res = app
            .get_with_token(&routes::admin_advertisement(&reference), &token)
            .await;

        assert_eq!(res.status, 200, "{}", res.text);
        assert_eq!(res.body["newspaper"]["name"], "Daily Mirror");
        assert_eq!(res.body["advertiser"]["email"], "nimal@example.lk");
        assert_eq!(res.body["classified"]["publish_in_sinhala"], true);
        assert_eq!(
            res.body["available_actions"],
            json!(["decline", "request_revision", "request_image_change", "approve"])
        );
    }

    #[tokio::test]
    async fn unknown_reference_is_not_found() {
        let app = TestApp::spawn().await;
        let token = app.admin_token().await;

        let res = app
            .get_with_token(&routes::admin_advertisement("0000700000009999"), &token)
            .await;

        assert_eq!(res.status, 404);
        assert_eq!(res.body["code"], "NOT_FOUND");
    }
}

mod decisions {
    use super::*;

    #[tokio::test]
    async fn echoed_priority_text_can_be_approved() {
        let app = TestApp::spawn().await;
        let newspaper_id = app.newspaper_id("Daily Mirror").await;
        let mut body = classified_body(newspaper_id, "Toyota Axio for sale");
        body["priority"] = json!(true);
        let (reference, _, _) = app.submit(&body).await;
        let token = app.admin_token().await;

        let detail = app
            .get_with_token(&routes::admin_advertisement(&reference), &token)
            .await;
        assert_eq!(detail.body["ad_text"], "Toyota Axio for sale");
        assert_eq!(detail.body["review_history"][0]["ad_text"], "Toyota Axio for sale");

        let res = app
            .admin_decide(
                &reference,
                &json!({"status": "Approved", "ad_text": detail.body["ad_text"]}),
            )
            .await;
        assert_eq!(res.status, 200, "{}", res.text);
        assert_eq!(res.body["status"], "Approved");
    }

    #[tokio::test]
    async fn approving_unchanged_text_adds_no_review_row() {
        let app = TestApp::spawn().await;
        let (reference, _) = app.submit_classified("Room for rent in Nugegoda").await;

        let res = app.admin_decide(&reference, &json!({"status": "Approved"})).await;

        assert_eq!(res.status, 200, "{}", res.text);
        assert_eq!(res.body["from"], "Pending");
        assert_eq!(res.body["status"], "Approved");

        let token = app.admin_token().await;
        let detail = app
            .get_with_token(&routes::admin_advertisement(&reference), &token)
            .await;
        assert_eq!(detail.body["review_history"].as_array().unwrap().len(), 1);
        let statuses = detail.body["status_history"].as_array().unwrap();
        assert_eq!(statuses.len(), 2);
        assert_eq!(statuses[1]["action"], "approve");
        assert_eq!(statuses[1]["actor"], "editor");
    }

    #[tokio::test]
    async fn approving_edited_text_is_rejected() {
        let app = TestApp::spawn().await;
        let (reference, _) = app.submit_classified("Room for rent in Nugegoda").await;

        let res = app
            .admin_decide(
                &reference,
                &json!({"status": "Approved", "ad_text": "Room for rent in Maharagama"}),
            )
            .await;

        assert_eq!(res.status, 400);
        assert_eq!(res.body["code"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn deciding_a_final_ad_is_an_invalid_transition() {
        let app = TestApp::spawn().await;
        let (reference, _) = app.submit_classified("Room for rent in Nugegoda").await;
        app.admin_decide(&reference, &json!({"status": "Declined"})).await;

        let res = app.admin_decide(&reference, &json!({"status": "Approved"})).await;

        assert_eq!(res.status, 409);
        assert_eq!(res.body["code"], "INVALID_TRANSITION");
    }

    #[tokio::test]
    async fn revision_round_trip_through_the_emailed_link() {
        let app = TestApp::spawn().await;
        let (reference, _) = app.submit_classified("Room for rent in Nugegoda").await;
        app.wait_for_emails(1).await;

        let res = app
            .admin_decide(
                &reference,
                &json!({"status": "Revision", "ad_text": "Furnished room for rent, Nugegoda"}),
            )
            .await;
        assert_eq!(res.status, 200, "{}", res.text);
        assert_eq!(res.body["status"], "Revision");

        let sent = app.wait_for_emails(2).await;
        assert_eq!(sent.len(), 2);
        let link = sent[1]
            .html
            .split('"')
            .find(|part| part.contains("token="))
            .unwrap();
        let token = token_from_link(link);

        let tracked = app.track(&reference, &token).await;
        assert_eq!(tracked.status, 200, "{}", tracked.text);
        assert_eq!(tracked.body["suggested_text"], "Furnished room for rent, Nugegoda");
        assert_eq!(tracked.body["ad_text"], "Room for rent in Nugegoda");

        let res = app
            .customer_action(&reference, "confirm", &json!({}), &token)
            .await;
        assert_eq!(res.status, 200, "{}", res.text);
        assert_eq!(res.body["status"], "Approved");

        let tracked = app.track(&reference, &token).await;
        assert_eq!(tracked.body["ad_text"], "Furnished room for rent, Nugegoda");
        assert_eq!(tracked.body["attempts"], 3);
        assert!(tracked.body["suggested_text"].is_null());
    }

    #[tokio::test]
    async fn revision_without_changed_text_is_rejected() {
        let app = TestApp::spawn().await;
        let (reference, _) = app.submit_classified("Room for rent in Nugegoda").await;

        let res = app.admin_decide(&reference, &json!({"status": "Revision"})).await;

        assert_eq!(res.status, 400);
        assert_eq!(res.body["code"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn price_change_is_recorded_with_its_reason() {
        let app = TestApp::spawn().await;
        let (reference, token) = app.submit_classified("Room for rent in Nugegoda").await;

        let res = app
            .admin_decide(
                &reference,
                &json!({"status": "Approved", "new_price": 1500.0, "reason": "Bold heading"}),
            )
            .await;
        assert_eq!(res.status, 200, "{}", res.text);
        assert_eq!(res.body["price"], 1500.0);

        let tracked = app.track(&reference, &token).await;
        assert_eq!(tracked.body["price"], 1500.0);
        assert_eq!(tracked.body["latest_price_change"]["previous_price"], 1000.0);
        assert_eq!(tracked.body["latest_price_change"]["reason"], "Bold heading");
    }

    #[tokio::test]
    async fn price_change_needs_a_reason() {
        let app = TestApp::spawn().await;
        let (reference, _) = app.submit_classified("Room for rent in Nugegoda").await;

        let res = app
            .admin_decide(&reference, &json!({"status": "Approved", "new_price": 1500.0}))
            .await;

        assert_eq!(res.status, 400);
        assert_eq!(res.body["code"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn image_change_is_answered_without_leaving_update_image() {
        let app = TestApp::spawn().await;
        let (reference, token) = app.submit_classified("Room for rent in Nugegoda").await;

        let res = app
            .admin_decide(
                &reference,
                &json!({"status": "UpdateImage", "image_change_requested": true}),
            )
            .await;
        assert_eq!(res.status, 200, "{}", res.text);
        assert_eq!(res.body["status"], "UpdateImage");

        let res = app
            .customer_action(
                &reference,
                "resubmit",
                &json!({"image_url": "http://cdn.test/room.jpg"}),
                &token,
            )
            .await;
        assert_eq!(res.status, 200, "{}", res.text);
        assert_eq!(res.body["status"], "UpdateImage");

        let tracked = app.track(&reference, &token).await;
        assert_eq!(tracked.body["image_url"], "http://cdn.test/room.jpg");
        assert_eq!(tracked.body["image_change_requested"], false);
        assert_eq!(tracked.body["attempts"], 3);
        let reviews = tracked.body["review_history"].as_array().unwrap();
        assert_eq!(reviews[2]["resulting_status"], "UpdateImage");
        assert_eq!(reviews[2]["reviewer"], serde_json::Value::Null);

        let res = app.admin_decide(&reference, &json!({"status": "Approved"})).await;
        assert_eq!(res.status, 200, "{}", res.text);
        assert_eq!(res.body["status"], "Approved");
    }
}
