use std::net::SocketAddr;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use layout::{LayoutEngine, PublisherRegistry};
use lopdf::content::{Content, Operation};
use lopdf::{Document, Object, Stream, dictionary};
use reqwest::Client;
use sea_orm::{ConnectOptions, Database, DatabaseConnection};
use serde_json::{Value, json};
use tempfile::TempDir;

use server::config::{
    AppConfig, AuthConfig, CatalogConfig, CorsConfig, DatabaseConfig, MailConfig, PrintConfig,
    ServerConfig, TrackingConfig, UploadsConfig,
};
use server::services::image_host::{FilesystemImageHost, ImageHost, ImageHostError};
use server::services::mailer::{MailError, Mailer};
use server::services::tokens::TokenService;
use server::state::AppState;

pub const ADMIN_USERNAME: &str = "editor";
pub const ADMIN_PASSWORD: &str = "editor-password";

/// Daily Mirror prints through the `wijeya` templates, The Island through
/// `upali` which has no templates, Divaina has no publisher at all.
const CATALOG: &str = r#"
[[newspaper]]
name = "Daily Mirror"
serial = 7
publisher = "wijeya"
edition_key = "daily_mirror"
english_combo_price = 300.0
tamil_combo_price = 250.0

[[newspaper.ad_type]]
ad_type = "classified"
base_price = 1000.0
count_first_words = 20
additional_word_price = 30.0
tint_price = 200.0
priority_price = 400.0
max_words = 65

[[newspaper.ad_type]]
ad_type = "casual"
size_matrix = { column_cm = { full = 150.0, bw = 100.0 }, full_page = { full = 90000.0, bw = 60000.0 } }

[[newspaper]]
name = "The Island"
serial = 9
publisher = "upali"
edition_key = "island"

[[newspaper.ad_type]]
ad_type = "classified"
base_price = 900.0
count_first_words = 20
additional_word_price = 25.0
max_words = 50

[[newspaper]]
name = "Divaina"
serial = 21
edition_key = "divaina"

[[newspaper.ad_type]]
ad_type = "classified"
base_price = 700.0
count_first_words = 20
max_words = 50

[[newspaper]]
name = "Closed Weekly"
serial = 30
edition_key = "closed_weekly"
active = false
"#;

const PUBLISHERS: &str = r#"
[default]
columns = [60.0, 140.0, 220.0, 300.0, 380.0]
rows = [640.0, 620.0, 600.0, 580.0, 560.0]

[publishers.wijeya]
columns = [52.0, 128.0, 204.0, 280.0, 356.0]
rows = [612.0, 594.0, 576.0, 558.0, 540.0, 522.0, 504.0, 486.0, 468.0, 450.0, 432.0, 414.0, 396.0]

[publishers.wijeya.fields]
reference = { x = 430.0, y = 798.0 }
price = { x = 430.0, y = 762.0 }
name = { x = 96.0, y = 270.0 }

[[publishers.wijeya.annotations]]
when = "priority"
x = 328.0
y = 352.0
"#;

pub mod routes {
    pub const NEWSPAPERS: &str = "/api/v1/newspapers";
    pub const QUOTES: &str = "/api/v1/quotes";
    pub const ADVERTISEMENTS: &str = "/api/v1/advertisements";
    pub const DRAFTS: &str = "/api/v1/advertisements/drafts";
    pub const LOGIN: &str = "/api/v1/auth/login";
    pub const ADMIN_ADVERTISEMENTS: &str = "/api/v1/admin/advertisements";

    pub fn track(reference: &str) -> String {
        format!("/api/v1/track/{reference}")
    }

    pub fn track_action(reference: &str, action: &str) -> String {
        format!("/api/v1/track/{reference}/{action}")
    }

    pub fn admin_advertisement(reference: &str) -> String {
        format!("/api/v1/admin/advertisements/{reference}")
    }

    pub fn admin_status(reference: &str) -> String {
        format!("/api/v1/admin/advertisements/{reference}/status")
    }

    pub fn admin_print(reference: &str) -> String {
        format!("/api/v1/admin/advertisements/{reference}/print")
    }
}

/// Email captured instead of being sent.
#[derive(Debug, Clone)]
pub struct SentEmail {
    pub to: String,
    pub subject: String,
    pub html: String,
}

#[derive(Default)]
pub struct RecordingMailer {
    sent: Mutex<Vec<SentEmail>>,
}

impl RecordingMailer {
    pub fn sent(&self) -> Vec<SentEmail> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl Mailer for RecordingMailer {
    async fn send(&self, to: &str, subject: &str, html: &str) -> Result<(), MailError> {
        self.sent.lock().unwrap().push(SentEmail {
            to: to.to_string(),
            subject: subject.to_string(),
            html: html.to_string(),
        });
        Ok(())
    }
}

/// Filesystem host whose uploads can be switched to fail.
pub struct FlakyImageHost {
    inner: FilesystemImageHost,
    failing: AtomicBool,
}

impl FlakyImageHost {
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }
}

#[async_trait]
impl ImageHost for FlakyImageHost {
    async fn upload(&self, data: &[u8], filename: &str) -> Result<String, ImageHostError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(ImageHostError::Io(std::io::Error::other("storage unavailable")));
        }
        self.inner.upload(data, filename).await
    }

    async fn fetch(&self, key: &str) -> Result<Option<Vec<u8>>, ImageHostError> {
        self.inner.fetch(key).await
    }
}

/// A running test server.
pub struct TestApp {
    pub addr: SocketAddr,
    pub client: Client,
    pub db: DatabaseConnection,
    pub mailer: Arc<RecordingMailer>,
    pub images: Arc<FlakyImageHost>,
    pub tokens: TokenService,
    _uploads: TempDir,
    _templates: TempDir,
}

/// Parsed HTTP response for test assertions.
pub struct TestResponse {
    pub status: u16,
    pub content_type: Option<String>,
    pub bytes: Vec<u8>,
    /// Raw response body as text.
    pub text: String,
    /// Parsed JSON body, or `Null` if the response is not valid JSON.
    pub body: Value,
}

impl TestResponse {
    pub async fn from_response(res: reqwest::Response) -> Self {
        let status = res.status().as_u16();
        let content_type = res
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let bytes = res.bytes().await.expect("Failed to read body").to_vec();
        let text = String::from_utf8_lossy(&bytes).into_owned();
        let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        Self {
            status,
            content_type,
            bytes,
            text,
            body,
        }
    }
}

/// Single-page PDF with an empty content stream.
pub fn blank_template() -> Vec<u8> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let content = Content {
        operations: vec![Operation::new("n", vec![])],
    };
    let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode().unwrap()));
    let page_id = doc.add_object(dictionary! {
        "Type" => "Page",
        "Parent" => pages_id,
        "Contents" => content_id,
        "MediaBox" => vec![0.into(), 0.into(), 595.into(), 842.into()],
    });
    let pages = dictionary! {
        "Type" => "Pages",
        "Kids" => vec![page_id.into()],
        "Count" => 1,
        "Resources" => dictionary! {},
    };
    doc.objects.insert(pages_id, Object::Dictionary(pages));
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);
    let mut out = Vec::new();
    doc.save_to(&mut out).unwrap();
    out
}

fn write_templates(dir: &Path) {
    std::fs::create_dir_all(dir.join("wijeya")).unwrap();
    std::fs::write(dir.join("wijeya/classified.pdf"), blank_template()).unwrap();
}

impl TestApp {
    pub async fn spawn() -> Self {
        let mut opts = ConnectOptions::new("sqlite::memory:");
        opts.max_connections(1).min_connections(1).sqlx_logging(false);
        let db = Database::connect(opts)
            .await
            .expect("Failed to open SQLite database");
        server::database::sync_schema(&db)
            .await
            .expect("Failed to sync schema");

        let catalog = server::seed::Catalog::from_toml_str(CATALOG).unwrap();
        server::seed::seed_catalog(&db, &catalog).await.unwrap();

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind to random port");
        let addr = listener.local_addr().unwrap();

        let uploads = TempDir::new().unwrap();
        let templates = TempDir::new().unwrap();
        write_templates(templates.path());

        let config = AppConfig {
            server: ServerConfig {
                host: "127.0.0.1".to_string(),
                port: 0,
                cors: CorsConfig {
                    allow_origins: vec![],
                    max_age: 3600,
                },
            },
            database: DatabaseConfig {
                url: "sqlite::memory:".to_string(),
                max_connections: 1,
            },
            auth: AuthConfig {
                jwt_secret: "test-secret-for-integration-tests".to_string(),
                bootstrap_admin_username: Some(ADMIN_USERNAME.to_string()),
                bootstrap_admin_password: Some(ADMIN_PASSWORD.to_string()),
            },
            tracking: TrackingConfig {
                token_salt: "test-salt".to_string(),
                token_ttl_hours: 24,
                public_base_url: "http://portal.test".to_string(),
            },
            mail: MailConfig {
                enabled: false,
                smtp_host: "localhost".to_string(),
                smtp_port: 25,
                username: None,
                password: None,
                from: "Classifieds <noreply@portal.test>".to_string(),
            },
            uploads: UploadsConfig {
                dir: uploads.path().to_path_buf(),
                max_size: 1024 * 1024,
                public_base_url: format!("http://{addr}/api/v1"),
            },
            print: PrintConfig {
                template_dir: templates.path().to_path_buf(),
                publishers_file: templates.path().join("publishers.toml"),
                strict_publishers: false,
            },
            catalog: CatalogConfig { catalog_file: None },
        };

        server::seed::seed_admin(&db, &config.auth).await.unwrap();

        let mailer = Arc::new(RecordingMailer::default());
        let images = Arc::new(FlakyImageHost {
            inner: FilesystemImageHost::new(
                config.uploads.dir.clone(),
                config.uploads.max_size,
                config.uploads.public_base_url.clone(),
            )
            .await
            .unwrap(),
            failing: AtomicBool::new(false),
        });
        let publishers = PublisherRegistry::from_toml_str(PUBLISHERS).unwrap();
        let layout = LayoutEngine::from_dir(&config.print.template_dir, publishers);
        let tokens = TokenService::from_config(&config.tracking);

        let state = AppState {
            db: db.clone(),
            tokens: tokens.clone(),
            mailer: mailer.clone(),
            images: images.clone(),
            layout: Arc::new(layout),
            config: Arc::new(config),
        };

        let app = server::build_router(state);
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            addr,
            client: Client::new(),
            db,
            mailer,
            images,
            tokens,
            _uploads: uploads,
            _templates: templates,
        }
    }

    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    pub async fn get(&self, path: &str) -> TestResponse {
        let res = self
            .client
            .get(self.url(path))
            .send()
            .await
            .expect("Failed to send GET request");
        TestResponse::from_response(res).await
    }

    pub async fn post(&self, path: &str, body: &Value) -> TestResponse {
        let res = self
            .client
            .post(self.url(path))
            .json(body)
            .send()
            .await
            .expect("Failed to send POST request");
        TestResponse::from_response(res).await
    }

    pub async fn get_with_token(&self, path: &str, token: &str) -> TestResponse {
        let res = self
            .client
            .get(self.url(path))
            .header("Authorization", format!("Bearer {token}"))
            .send()
            .await
            .expect("Failed to send GET request");
        TestResponse::from_response(res).await
    }

    pub async fn post_with_token(&self, path: &str, body: &Value, token: &str) -> TestResponse {
        let res = self
            .client
            .post(self.url(path))
            .header("Authorization", format!("Bearer {token}"))
            .json(body)
            .send()
            .await
            .expect("Failed to send POST request");
        TestResponse::from_response(res).await
    }

    /// GET a customer route with the tracking token in the query string.
    pub async fn track(&self, reference: &str, token: &str) -> TestResponse {
        let res = self
            .client
            .get(self.url(&routes::track(reference)))
            .query(&[("token", token)])
            .send()
            .await
            .expect("Failed to send GET request");
        TestResponse::from_response(res).await
    }

    /// POST a customer action with the tracking token in the header.
    pub async fn customer_action(
        &self,
        reference: &str,
        action: &str,
        body: &Value,
        token: &str,
    ) -> TestResponse {
        let res = self
            .client
            .post(self.url(&routes::track_action(reference, action)))
            .header("X-Tracking-Token", token)
            .json(body)
            .send()
            .await
            .expect("Failed to send POST request");
        TestResponse::from_response(res).await
    }

    pub async fn upload_slip(&self, reference: &str, token: &str, bytes: Vec<u8>) -> TestResponse {
        let part = reqwest::multipart::Part::bytes(bytes)
            .file_name("slip.png")
            .mime_str("image/png")
            .expect("Failed to set MIME type");
        let form = reqwest::multipart::Form::new().part("slip", part);
        let res = self
            .client
            .post(self.url(&routes::track_action(reference, "payment")))
            .header("X-Tracking-Token", token)
            .multipart(form)
            .send()
            .await
            .expect("Failed to send multipart request");
        TestResponse::from_response(res).await
    }

    /// Log in as the bootstrap admin and return the bearer token.
    pub async fn admin_token(&self) -> String {
        let res = self
            .post(
                routes::LOGIN,
                &json!({"username": ADMIN_USERNAME, "password": ADMIN_PASSWORD}),
            )
            .await;
        assert_eq!(res.status, 200, "Login failed: {}", res.text);
        res.body["token"]
            .as_str()
            .expect("Login response should contain a token")
            .to_string()
    }

    /// Id of a seeded newspaper by name.
    pub async fn newspaper_id(&self, name: &str) -> i64 {
        let res = self.get(routes::NEWSPAPERS).await;
        assert_eq!(res.status, 200, "list_newspapers failed: {}", res.text);
        res.body
            .as_array()
            .unwrap()
            .iter()
            .find(|paper| paper["name"] == name)
            .unwrap_or_else(|| panic!("newspaper {name} not listed"))["id"]
            .as_i64()
            .unwrap()
    }

    /// Submit a booking and return `(reference, tracking token, response body)`.
    pub async fn submit(&self, body: &Value) -> (String, String, Value) {
        let res = self.post(routes::ADVERTISEMENTS, body).await;
        assert_eq!(res.status, 201, "submit failed: {}", res.text);
        let reference = res.body["reference_number"].as_str().unwrap().to_string();
        let token = token_from_link(res.body["tracking_link"].as_str().unwrap());
        (reference, token, res.body)
    }

    /// Submit a plain classified ad to the Daily Mirror.
    pub async fn submit_classified(&self, text: &str) -> (String, String) {
        let newspaper_id = self.newspaper_id("Daily Mirror").await;
        let (reference, token, _) = self.submit(&classified_body(newspaper_id, text)).await;
        (reference, token)
    }

    pub async fn admin_decide(&self, reference: &str, body: &Value) -> TestResponse {
        let token = self.admin_token().await;
        self.post_with_token(&routes::admin_status(reference), body, &token)
            .await
    }

    /// Emails sent so far, waiting up to a second for at least `count`.
    pub async fn wait_for_emails(&self, count: usize) -> Vec<SentEmail> {
        for _ in 0..50 {
            let sent = self.mailer.sent();
            if sent.len() >= count {
                return sent;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
        self.mailer.sent()
    }
}

pub fn token_from_link(link: &str) -> String {
    link.split_once("token=")
        .map(|(_, token)| token.to_string())
        .unwrap_or_else(|| panic!("no token in {link}"))
}

/// `n` distinct words.
pub fn words(n: usize) -> String {
    (1..=n)
        .map(|i| format!("word{i}"))
        .collect::<Vec<_>>()
        .join(" ")
}

pub fn classified_body(newspaper_id: i64, text: &str) -> Value {
    json!({
        "newspaper_id": newspaper_id,
        "advertiser": {
            "name": "Nimal Perera",
            "email": "nimal@example.lk",
            "phone": "0771234567",
            "address": "12 Galle Road, Colombo"
        },
        "classification": "Vehicles",
        "subcategory": "Cars",
        "publish_date": "2026-11-01",
        "ad_text": text,
        "priority": false,
        "detail": {
            "ad_type": "classified",
            "publish_in_english": false,
            "publish_in_tamil": false
        }
    })
}
