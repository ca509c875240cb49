use lazy_static::lazy_static;
use prometheus::{Counter, Gauge, Histogram, register_counter, register_gauge, register_histogram};


lazy_static! {
    pub static ref REQUEST_TOTAL: Counter =
        register_counter!("contact_requests_total", "Total number of contact submissions").unwrap();
    pub static ref SUBMISSIONS_RATE_LIMITED: Counter =
        register_counter!("contact_rate_limited_total", "Submissions refused by the rate limiter").unwrap();
    pub static ref SUBMISSIONS_REJECTED: Counter =
        register_counter!("contact_rejected_total", "Submissions that failed validation").unwrap();
    pub static ref MAIL_SENT: Counter =
        register_counter!("contact_sent_total", "Contact messages handed to the mail service").unwrap();
    pub static ref MAIL_FAILURES: Counter =
        register_counter!("contact_mail_failures_total", "Mail sends that failed or timed out").unwrap();
    pub static ref MAIL_LATENCY: Histogram = register_histogram!(
        "contact_mail_latency_seconds",
        "Mail send latency in seconds"
    )
    .unwrap();
    pub static ref RATE_LIMIT_ENTRIES: Gauge =
        register_gauge!("contact_rate_limit_entries", "Clients currently tracked by the rate limiter").unwrap();
}
