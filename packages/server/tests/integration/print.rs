use serde_json::json;

use crate::common::{TestApp, classified_body, routes};

/// Submit to `newspaper`, approve and pay. Returns `(reference, tracking token)`.
async fn paid_ad(app: &TestApp, newspaper: &str) -> (String, String) {
    let newspaper_id = app.newspaper_id(newspaper).await;
    let mut body = classified_body(newspaper_id, "Toyota Axio 2016 for sale, call after 6pm");
    body["priority"] = json!(true);
    let (reference, token, _) = app.submit(&body).await;

    let res = app.admin_decide(&reference, &json!({"status": "Approved"})).await;
    assert_eq!(res.status, 200, "{}", res.text);
    let res = app.upload_slip(&reference, &token, b"slip-bytes".to_vec()).await;
    assert_eq!(res.status, 200, "{}", res.text);
    (reference, token)
}

async fn admin_status_of(app: &TestApp, reference: &str) -> serde_json::Value {
    let token = app.admin_token().await;
    let res = app
        .get_with_token(&routes::admin_advertisement(reference), &token)
        .await;
    assert_eq!(res.status, 200, "{}", res.text);
    res.body
}

#[tokio::test]
async fn paid_ad_is_rendered_and_sent_to_print() {
    let app = TestApp::spawn().await;
    let (reference, token) = paid_ad(&app, "Daily Mirror").await;
    let admin = app.admin_token().await;

    let res = app
        .post_with_token(&routes::admin_print(&reference), &json!({}), &admin)
        .await;

    assert_eq!(res.status, 200, "{}", res.text);
    assert_eq!(res.content_type.as_deref(), Some("application/pdf"));
    assert!(res.bytes.starts_with(b"%PDF"));
    lopdf::Document::load_mem(&res.bytes).expect("print output should be a valid PDF");

    let detail = admin_status_of(&app, &reference).await;
    assert_eq!(detail["status"], "Print");
    assert!(detail["print_url"].as_str().unwrap().ends_with(".pdf"));

    let tracked = app.track(&reference, &token).await;
    assert_eq!(tracked.status, 403);
}

#[tokio::test]
async fn print_through_the_status_endpoint() {
    let app = TestApp::spawn().await;
    let (reference, _) = paid_ad(&app, "Daily Mirror").await;

    let res = app.admin_decide(&reference, &json!({"status": "Print"})).await;

    assert_eq!(res.status, 200, "{}", res.text);
    assert_eq!(res.body["from"], "PaymentPending");
    assert_eq!(res.body["status"], "Print");
    assert_eq!(res.body["available_actions"], json!([]));
}

#[tokio::test]
async fn missing_template_returns_no_pdf() {
    let app = TestApp::spawn().await;
    let (reference, _) = paid_ad(&app, "The Island").await;
    let admin = app.admin_token().await;

    let res = app
        .post_with_token(&routes::admin_print(&reference), &json!({}), &admin)
        .await;

    assert_eq!(res.status, 404);
    assert_eq!(res.body["code"], "TEMPLATE_NOT_FOUND");
    assert!(!res.bytes.starts_with(b"%PDF"));

    let detail = admin_status_of(&app, &reference).await;
    assert_eq!(detail["status"], "PaymentPending");
    assert!(detail["print_url"].is_null());
}

#[tokio::test]
async fn newspaper_without_publisher_cannot_print() {
    let app = TestApp::spawn().await;
    let (reference, _) = paid_ad(&app, "Divaina").await;
    let admin = app.admin_token().await;

    let res = app
        .post_with_token(&routes::admin_print(&reference), &json!({}), &admin)
        .await;

    assert_eq!(res.status, 404);
    assert_eq!(res.body["code"], "NO_PUBLISHER");
    assert_eq!(admin_status_of(&app, &reference).await["status"], "PaymentPending");
}

#[tokio::test]
async fn unpaid_ad_cannot_be_printed() {
    let app = TestApp::spawn().await;
    let (reference, _) = app.submit_classified("Room for rent in Nugegoda").await;
    let admin = app.admin_token().await;

    let res = app
        .post_with_token(&routes::admin_print(&reference), &json!({}), &admin)
        .await;

    assert_eq!(res.status, 409);
    assert_eq!(res.body["code"], "INVALID_TRANSITION");
}
