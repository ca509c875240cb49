//! Outbound mail: message formatting and the relay client.

use async_trait::async_trait;
use chrono::{DateTime, Local};
use serde::Serialize;
use thiserror::Error;

use crate::validate::SanitizedSubmission;

// Formatted message handed to the mail service, dropped after sending
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OutboundMessage {
    pub from: String,
    pub to: String,
    pub reply_to: String,
    pub subject: String,
    pub html: String,
    pub text: String,
}

#[derive(Debug, Error)]
pub enum MailError {
    #[error("mail credentials are not configured")]
    NotConfigured,

    #[error("mail relay request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("mail relay rejected message with status {status}: {body}")]
    Rejected { status: u16, body: String },

    #[error("mail relay did not answer within {0:?}")]
    Timeout(std::time::Duration),
}

/// Opaque capability to deliver one message, at most once.
#[async_trait]
pub trait MailSender: Send + Sync {
    async fn send(&self, message: &OutboundMessage) -> Result<(), MailError>;
}

// Sender and recipient of every contact mail
#[derive(Debug, Clone, Default)]
pub struct Mailbox {
    pub from: String,
    pub to: String,
}

impl OutboundMessage {
    pub fn build(
        submission: &SanitizedSubmission,
        mailbox: &Mailbox,
        sent_at: DateTime<Local>,
    ) -> Self {
        let time = sent_at.format("%Y-%m-%d %H:%M:%S %Z").to_string();

        Self {
            from: mailbox.from.clone(),
            to: mailbox.to.clone(),
            reply_to: submission.email.clone(),
            subject: format!("Portfolio Contact Message from {}", submission.name),
            html: render_html(submission, &time),
            text: render_text(submission, &time),
        }
    }
}

fn render_html(submission: &SanitizedSubmission, time: &str) -> String {
    let name = escape_html(&submission.name);
    let email = escape_html(&submission.email);
    let message = escape_html(&submission.message);

    format!(
        r#"<div style="font-family: Arial, sans-serif; max-width: 600px; margin: 0 auto; padding: 20px; background-color: #f8f9fa; border-radius: 10px;">
  <h2 style="color: #4f46e5; margin-bottom: 20px;">New Contact Message</h2>
  <div style="background-color: white; padding: 20px; border-radius: 8px; margin-bottom: 20px;">
    <h3 style="color: #333; margin-bottom: 15px;">Contact Details</h3>
    <div style="margin-bottom: 15px;">
      <strong style="color: #666;">Name:</strong>
      <span style="color: #333; margin-left: 10px;">{name}</span>
    </div>
    <div style="margin-bottom: 15px;">
      <strong style="color: #666;">Email:</strong>
      <span style="color: #333; margin-left: 10px;">{email}</span>
    </div>
    <div style="margin-bottom: 15px;">
      <strong style="color: #666;">Message:</strong>
      <div style="color: #333; margin-top: 10px; line-height: 1.6; white-space: pre-wrap;">{message}</div>
    </div>
  </div>
  <div style="text-align: center; color: #666; font-size: 12px;">
    <p>This message was sent from your portfolio website contact form.</p>
    <p>Time: {time}</p>
  </div>
</div>
"#
    )
}

fn render_text(submission: &SanitizedSubmission, time: &str) -> String {
    format!(
        "New Contact Message\n\nName: {}\nEmail: {}\nMessage: {}\n\nSent from portfolio website at {}\n",
        submission.name, submission.email, submission.message, time
    )
}

pub fn escape_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// Sends mail through an HTTP relay that takes the message as JSON and
/// authenticates with basic auth.
pub struct HttpMailer {
    client: reqwest::Client,
    endpoint: String,
    credentials: Option<(String, String)>,
}

impl HttpMailer {
    pub fn new(
        client: reqwest::Client,
        endpoint: String,
        user: Option<String>,
        pass: Option<String>,
    ) -> Self {
        let credentials = user.zip(pass);
        Self {
            client,
            endpoint,
            credentials,
        }
    }

    pub fn is_configured(&self) -> bool {
        self.credentials.is_some()
    }
}

#[async_trait]
impl MailSender for HttpMailer {
    async fn send(&self, message: &OutboundMessage) -> Result<(), MailError> {
        let (user, pass) = self.credentials.as_ref().ok_or(MailError::NotConfigured)?;

        let res = self
            .client
            .post(&self.endpoint)
            .basic_auth(user, Some(pass))
            .json(message)
            .send()
            .await?;

        let status = res.status();
        if status.is_success() {
            return Ok(());
        }

        let body = res.text().await.unwrap_or_default();
        Err(MailError::Rejected {
            status: status.as_u16(),
            body,
        })
    }
}
