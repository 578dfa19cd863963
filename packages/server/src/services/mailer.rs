use std::sync::Arc;

use async_trait::async_trait;
use common::AdStatus;
use lettre::message::header::ContentType;
use lettre::message::Mailbox;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use thiserror::Error;
use tracing::{info, warn};

use crate::config::MailConfig;

#[derive(Debug, Error)]
pub enum MailError {
    #[error("invalid address: {0}")]
    Address(String),
    #[error("failed to build email: {0}")]
    Build(#[from] lettre::error::Error),
    #[error("SMTP error: {0}")]
    Smtp(#[from] lettre::transport::smtp::Error),
}

#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, to: &str, subject: &str, html: &str) -> Result<(), MailError>;
}

/// Sends through an SMTP relay with STARTTLS.
pub struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
}

impl SmtpMailer {
    pub fn new(config: &MailConfig) -> Result<Self, MailError> {
        let from: Mailbox = config
            .from
            .parse()
            .map_err(|e| MailError::Address(format!("{}: {e}", config.from)))?;

        let mut builder = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.smtp_host)?
            .port(config.smtp_port);
        if let (Some(username), Some(password)) = (&config.username, &config.password) {
            builder = builder.credentials(Credentials::new(username.clone(), password.clone()));
        }

        Ok(Self {
            transport: builder.build(),
            from,
        })
    }
}

#[async_trait]
impl Mailer for SmtpMailer {
    async fn send(&self, to: &str, subject: &str, html: &str) -> Result<(), MailError> {
        let to: Mailbox = to
            .parse()
            .map_err(|e| MailError::Address(format!("{to}: {e}")))?;
        let email = Message::builder()
            .from(self.from.clone())
            .to(to)
            .subject(subject)
            .header(ContentType::TEXT_HTML)
            .body(html.to_string())?;

        self.transport.send(email).await?;
        Ok(())
    }
}

/// Logs emails instead of sending them. Used when mail is disabled.
pub struct LogMailer;

#[async_trait]
impl Mailer for LogMailer {
    async fn send(&self, to: &str, subject: &str, html: &str) -> Result<(), MailError> {
        info!(to, subject, bytes = html.len(), "Email not sent (mail disabled)");
        Ok(())
    }
}

/// Send without waiting; failures are only logged.
pub fn send_in_background(mailer: Arc<dyn Mailer>, to: String, subject: String, html: String) {
    tokio::spawn(async move {
        if let Err(e) = mailer.send(&to, &subject, &html).await {
            warn!(to = %to, error = %e, "Failed to send email");
        }
    });
}

fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

/// Confirmation sent right after submission.
pub fn confirmation_email(reference: &str, tracking_link: &str, price: f64) -> (String, String) {
    let subject = format!("Your advertisement {reference} was received");
    let html = format!(
        "<p>Thank you for your booking.</p>\
         <p>Reference number: <strong>{reference}</strong><br>Price: {price:.2}</p>\
         <p>Follow the review of your advertisement here: \
         <a href=\"{link}\">{link}</a></p>\
         <p>Keep this link private; anyone holding it can change your booking.</p>",
        link = escape_html(tracking_link),
    );
    (subject, html)
}

/// Notification of a review decision.
pub fn status_email(reference: &str, status: AdStatus, tracking_link: Option<&str>) -> (String, String) {
    let subject = format!("Advertisement {reference}: {}", status.label());
    let next = match status {
        AdStatus::Revision => "An editor suggested changes to your text. Please review them.",
        AdStatus::UpdateImage => "Please upload a new image for your advertisement.",
        AdStatus::Approved => "Your advertisement was approved. Please proceed to payment.",
        AdStatus::Declined => "Your advertisement was declined.",
        _ => "The status of your advertisement changed.",
    };
    let link = tracking_link
        .map(|l| format!("<p><a href=\"{0}\">{0}</a></p>", escape_html(l)))
        .unwrap_or_default();
    let html = format!(
        "<p>Reference number: <strong>{reference}</strong></p><p>{next}</p>{link}"
    );
    (subject, html)
}
