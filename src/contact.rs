//! Contact request handling: rate limit, validate, format, send.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use chrono::Local;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, error, info, warn};

use crate::error::ErrorBody;
use crate::mail::{MailError, MailSender, Mailbox, OutboundMessage};
use crate::metrics::{
    MAIL_FAILURES, MAIL_LATENCY, MAIL_SENT, REQUEST_TOTAL, SUBMISSIONS_RATE_LIMITED,
    SUBMISSIONS_REJECTED,
};
use crate::rate_limit::RateLimiter;
use crate::validate::{Submission, ValidationError, validate};

pub const CONFIRMATION: &str =
    "Thank you for reaching out! Your message has been sent successfully. I'll get back to you soon.";
pub const RATE_LIMITED: &str = "Too many contact form submissions, please try again later.";
pub const MAIL_FAILURE: &str =
    "Something went wrong while sending your message. Please try again later or contact me directly.";

// What happened to one submission
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContactOutcome {
    Sent,
    RateLimited,
    BadRequest(ValidationError),
    MailFailure,
}

impl IntoResponse for ContactOutcome {
    fn into_response(self) -> Response {
        match self {
            ContactOutcome::Sent => {
                Json(serde_json::json!({ "message": CONFIRMATION })).into_response()
            }
            ContactOutcome::RateLimited => {
                (StatusCode::TOO_MANY_REQUESTS, Json(ErrorBody::new(RATE_LIMITED))).into_response()
            }
            ContactOutcome::BadRequest(reason) => {
                (StatusCode::BAD_REQUEST, Json(ErrorBody::new(reason.to_string()))).into_response()
            }
            ContactOutcome::MailFailure => (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorBody::new(MAIL_FAILURE)),
            )
                .into_response(),
        }
    }
}

pub struct ContactService {
    limiter: Arc<RateLimiter>,
    mailer: Arc<dyn MailSender>,
    mailbox: Mailbox,
    send_timeout: Duration,
    verbose_errors: bool,
}

impl ContactService {
    pub fn new(
        limiter: Arc<RateLimiter>,
        mailer: Arc<dyn MailSender>,
        mailbox: Mailbox,
        send_timeout: Duration,
    ) -> Self {
        Self {
            limiter,
            mailer,
            mailbox,
            send_timeout,
            verbose_errors: false,
        }
    }

    // Log full mail error chains (development mode)
    pub fn verbose_errors(mut self, on: bool) -> Self {
        self.verbose_errors = on;
        self
    }

    pub async fn handle(&self, client_id: &str, submission: &Submission) -> ContactOutcome {
        REQUEST_TOTAL.inc();

        if !self.limiter.allow(client_id) {
            SUBMISSIONS_RATE_LIMITED.inc();
            info!(client = %client_id, "contact submission rate limited");
            return ContactOutcome::RateLimited;
        }

        let clean = match validate(submission) {
            Ok(clean) => clean,
            Err(reason) => {
                SUBMISSIONS_REJECTED.inc();
                debug!(client = %client_id, %reason, "contact submission rejected");
                return ContactOutcome::BadRequest(reason);
            }
        };

        let message = OutboundMessage::build(&clean, &self.mailbox, Local::now());

        let start = Instant::now();
        let sent = match tokio::time::timeout(self.send_timeout, self.mailer.send(&message)).await {
            Ok(result) => result,
            Err(_) => Err(MailError::Timeout(self.send_timeout)),
        };
        MAIL_LATENCY.observe(start.elapsed().as_secs_f64());

        match sent {
            Ok(()) => {
                MAIL_SENT.inc();
                info!(client = %client_id, "contact message sent");
                ContactOutcome::Sent
            }
            Err(err) => {
                MAIL_FAILURES.inc();
                error!(client = %client_id, error = %err, "email send failed");
                if self.verbose_errors {
                    warn!(error = ?err, "email send failure details");
                }
                ContactOutcome::MailFailure
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingMailer {
        sent: Mutex<Vec<OutboundMessage>>,
    }

    #[async_trait]
    impl MailSender for RecordingMailer {
        async fn send(&self, message: &OutboundMessage) -> Result<(), MailError> {
            self.sent.lock().unwrap().push(message.clone());
            Ok(())
        }
    }

    struct FailingMailer;

    #[async_trait]
    impl MailSender for FailingMailer {
        async fn send(&self, _: &OutboundMessage) -> Result<(), MailError> {
            Err(MailError::Rejected {
                status: 535,
                body: "auth failed for secret-user".into(),
            })
        }
    }

    struct StalledMailer;

    #[async_trait]
    impl MailSender for StalledMailer {
        async fn send(&self, _: &OutboundMessage) -> Result<(), MailError> {
            tokio::time::sleep(Duration::from_secs(3600)).await;
            Ok(())
        }
    }

    fn service(mailer: Arc<dyn MailSender>, max: u32) -> ContactService {
        ContactService::new(
            Arc::new(RateLimiter::new(max, Duration::from_secs(900))),
            mailer,
            Mailbox {
                from: "owner@example.com".into(),
                to: "owner@example.com".into(),
            },
            Duration::from_millis(50),
        )
    }

    fn valid() -> Submission {
        Submission {
            name: Some(" Grace ".into()),
            email: Some("grace@example.com ".into()),
            message: Some("Hello there".into()),
        }
    }

    #[tokio::test]
    async fn valid_submission_is_sent_with_reply_to() {
        let mailer = Arc::new(RecordingMailer::default());
        let svc = service(mailer.clone(), 5);

        assert_eq!(svc.handle("1.2.3.4", &valid()).await, ContactOutcome::Sent);

        let sent = mailer.sent.lock().unwrap();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].reply_to, "grace@example.com");
        assert_eq!(sent[0].subject, "Portfolio Contact Message from Grace");
    }

    #[tokio::test]
    async fn rate_limit_is_checked_before_validation() {
        let mailer = Arc::new(RecordingMailer::default());
        let svc = service(mailer.clone(), 1);

        let outcome = svc.handle("1.2.3.4", &Submission::default()).await;
        assert_eq!(outcome, ContactOutcome::BadRequest(ValidationError::MissingField));

        // the invalid attempt used up the only slot
        assert_eq!(svc.handle("1.2.3.4", &valid()).await, ContactOutcome::RateLimited);
        assert!(mailer.sent.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn mail_failure_is_isolated() {
        let svc = service(Arc::new(FailingMailer), 5);
        assert_eq!(svc.handle("1.2.3.4", &valid()).await, ContactOutcome::MailFailure);
    }

    #[tokio::test]
    async fn stalled_mailer_times_out() {
        let svc = service(Arc::new(StalledMailer), 5);
        assert_eq!(svc.handle("1.2.3.4", &valid()).await, ContactOutcome::MailFailure);
    }
}
