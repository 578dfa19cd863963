use chrono::{Duration, Utc};
use sea_orm::sea_query::Expr;
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter};
use serde_json::json;

use server::entity::tracking_token;

use crate::common::{TestApp, routes};

mod tokens {
    use super::*;

    #[tokio::test]
    async fn missing_token_is_rejected() {
        let app = TestApp::spawn().await;
        let (reference, _) = app.submit_classified("Room for rent in Nugegoda").await;

        let res = app.get(&routes::track(&reference)).await;

        assert_eq!(res.status, 400);
        assert_eq!(res.body["code"], "MISSING_TOKEN");
    }

    #[tokio::test]
    async fn token_of_one_ad_does_not_open_another() {
        let app = TestApp::spawn().await;
        let (first, first_token) = app.submit_classified("Room for rent in Nugegoda").await;
        let (second, second_token) = app.submit_classified("House for sale in Kandy").await;

        let res = app.track(&second, &first_token).await;
        assert_eq!(res.status, 403);
        assert_eq!(res.body["code"], "INVALID_TOKEN");

        assert_eq!(app.track(&first, &first_token).await.status, 200);
        assert_eq!(app.track(&second, &second_token).await.status, 200);
    }

    #[tokio::test]
    async fn expired_token_is_rejected() {
        let app = TestApp::spawn().await;
        let (reference, token) = app.submit_classified("Room for rent in Nugegoda").await;

        tracking_token::Entity::update_many()
            .col_expr(
                tracking_token::Column::ExpiresAt,
                Expr::value(Utc::now() - Duration::hours(1)),
            )
            .filter(tracking_token::Column::ReferenceNumber.eq(reference.as_str()))
            .exec(&app.db)
            .await
            .unwrap();

        let res = app.track(&reference, &token).await;

        assert_eq!(res.status, 403);
        assert_eq!(res.body["code"], "EXPIRED_TOKEN");
    }

    #[tokio::test]
    async fn header_token_is_accepted() {
        let app = TestApp::spawn().await;
        let (reference, token) = app.submit_classified("Room for rent in Nugegoda").await;

        let res = app
            .client
            .get(app.url(&routes::track(&reference)))
            .header("X-Tracking-Token", &token)
            .send()
            .await
            .unwrap();

        assert_eq!(res.status().as_u16(), 200);
    }
}

mod actions {
    use super::*;

    #[tokio::test]
    async fn resubmitting_before_review_opens_a_new_attempt() {
        let app = TestApp::spawn().await;
        let (reference, token) = app.submit_classified("Room for rent in Nugegoda").await;

        let res = app
            .customer_action(
                &reference,
                "resubmit",
                &json!({"ad_text": "Furnished room for rent in Nugegoda"}),
                &token,
            )
            .await;

        assert_eq!(res.status, 200, "{}", res.text);
        assert_eq!(res.body["ok"], true);
        assert_eq!(res.body["status"], "Resubmitted");

        let tracked = app.track(&reference, &token).await;
        assert_eq!(tracked.body["status"], "Resubmitted");
        assert_eq!(tracked.body["attempts"], 2);
        assert_eq!(tracked.body["ad_text"], "Furnished room for rent in Nugegoda");
        assert_eq!(tracked.body["review_history"].as_array().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn resubmitting_unchanged_text_is_rejected() {
        let app = TestApp::spawn().await;
        let (reference, token) = app.submit_classified("Room for rent in Nugegoda").await;

        let res = app
            .customer_action(
                &reference,
                "resubmit",
                &json!({"ad_text": "Room for rent in Nugegoda"}),
                &token,
            )
            .await;

        assert_eq!(res.status, 400);
        assert_eq!(res.body["ok"], false);
        assert_eq!(res.body["error"]["code"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn cancel_with_invalid_token_changes_nothing() {
        let app = TestApp::spawn().await;
        let (reference, token) = app.submit_classified("Room for rent in Nugegoda").await;

        let res = app
            .customer_action(&reference, "cancel", &json!({}), "not-the-token")
            .await;

        assert_eq!(res.status, 403);
        assert_eq!(res.body["ok"], false);
        assert!(res.body["status"].is_null());
        assert_eq!(res.body["error"]["code"], "INVALID_TOKEN");

        let tracked = app.track(&reference, &token).await;
        assert_eq!(tracked.body["status"], "Pending");
        assert_eq!(tracked.body["status_history"].as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn cancel_revokes_the_tracking_link() {
        let app = TestApp::spawn().await;
        let (reference, token) = app.submit_classified("Room for rent in Nugegoda").await;

        let res = app
            .customer_action(&reference, "cancel", &json!({}), &token)
            .await;
        assert_eq!(res.status, 200, "{}", res.text);
        assert_eq!(res.body["status"], "Cancelled");

        let res = app.track(&reference, &token).await;
        assert_eq!(res.status, 403);
        assert_eq!(res.body["code"], "INVALID_TOKEN");
    }

    #[tokio::test]
    async fn confirm_without_a_suggestion_is_an_invalid_transition() {
        let app = TestApp::spawn().await;
        let (reference, token) = app.submit_classified("Room for rent in Nugegoda").await;

        let res = app
            .customer_action(&reference, "confirm", &json!({}), &token)
            .await;

        assert_eq!(res.status, 409);
        assert_eq!(res.body["ok"], false);
        assert_eq!(res.body["error"]["code"], "INVALID_TRANSITION");
    }

    #[tokio::test]
    async fn pending_ad_offers_customer_actions() {
        let app = TestApp::spawn().await;
        let (reference, token) = app.submit_classified("Room for rent in Nugegoda").await;

        let tracked = app.track(&reference, &token).await;

        assert_eq!(tracked.body["available_actions"], json!(["resubmit", "cancel"]));
        assert!(tracked.body["suggested_text"].is_null());
    }
}

mod payment {
    use super::*;

    async fn approved_ad(app: &TestApp) -> (String, String) {
        let (reference, token) = app.submit_classified("Room for rent in Nugegoda").await;
        let res = app
            .admin_decide(&reference, &json!({"status": "Approved"}))
            .await;
        assert_eq!(res.status, 200, "{}", res.text);
        (reference, token)
    }

    #[tokio::test]
    async fn slip_moves_the_ad_to_payment_pending() {
        let app = TestApp::spawn().await;
        let (reference, token) = approved_ad(&app).await;

        let res = app.upload_slip(&reference, &token, b"slip-bytes".to_vec()).await;

        assert_eq!(res.status, 200, "{}", res.text);
        assert_eq!(res.body["status"], "PaymentPending");

        let tracked = app.track(&reference, &token).await;
        let slip_url = tracked.body["payment"]["slip_url"].as_str().unwrap();
        assert_eq!(tracked.body["payment"]["amount"], 1000.0);

        let path = slip_url
            .split_once("/api/v1")
            .map(|(_, path)| format!("/api/v1{path}"))
            .unwrap();
        let slip = app.get(&path).await;
        assert_eq!(slip.status, 200);
        assert_eq!(slip.bytes, b"slip-bytes");
        assert_eq!(slip.content_type.as_deref(), Some("image/png"));
    }

    #[tokio::test]
    async fn storage_failure_leaves_the_ad_approved() {
        let app = TestApp::spawn().await;
        let (reference, token) = approved_ad(&app).await;
        app.images.set_failing(true);

        let res = app.upload_slip(&reference, &token, b"slip-bytes".to_vec()).await;

        assert_eq!(res.status, 502);
        assert_eq!(res.body["ok"], false);
        assert_eq!(res.body["error"]["code"], "UPSTREAM_ERROR");
        assert!(res.body["error"]["detail"].is_null());

        let tracked = app.track(&reference, &token).await;
        assert_eq!(tracked.body["status"], "Approved");
        assert!(tracked.body["payment"].is_null());

        app.images.set_failing(false);
        let retry = app.upload_slip(&reference, &token, b"slip-bytes".to_vec()).await;
        assert_eq!(retry.status, 200, "{}", retry.text);
        assert_eq!(retry.body["status"], "PaymentPending");
    }

    #[tokio::test]
    async fn slip_before_approval_is_an_invalid_transition() {
        let app = TestApp::spawn().await;
        let (reference, token) = app.submit_classified("Room for rent in Nugegoda").await;

        let res = app.upload_slip(&reference, &token, b"slip-bytes".to_vec()).await;

        assert_eq!(res.status, 409);
        assert_eq!(res.body["error"]["code"], "INVALID_TRANSITION");
    }
}
