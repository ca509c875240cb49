use clap::{Parser, ValueEnum};
use std::time::Duration;

// Deployment mode, controls log format, error verbosity and CORS origins
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Development,
    Production,
}

// CLI argument structure, every flag can also come from the environment
#[derive(Parser, Debug, Clone)]
#[command(name = "portfolio-contact")]
#[command(about = "Contact form backend for the portfolio site")]
pub struct Args {
    // Port to run the server on
    #[arg(short, long, env = "PORT", default_value_t = 3000)]
    pub port: u16,

    // development or production
    #[arg(long, env = "APP_ENV", value_enum, default_value_t = Mode::Development)]
    pub mode: Mode,

    // Mail account the relay authenticates as, also the default sender/recipient
    #[arg(long, env = "EMAIL_USER")]
    pub email_user: Option<String>,

    #[arg(long, env = "EMAIL_PASS", hide_env_values = true)]
    pub email_pass: Option<String>,

    // Recipient override (defaults to email_user)
    #[arg(long, env = "MAIL_TO")]
    pub mail_to: Option<String>,

    // HTTP mail relay endpoint
    #[arg(long, env = "MAIL_API_URL", default_value = "http://localhost:8025/api/send")]
    pub mail_api_url: String,

    // Mail send timeout in seconds
    #[arg(long, env = "MAIL_TIMEOUT_SECS", default_value_t = 10)]
    pub mail_timeout: u64,

    // Rate limit max submissions per window
    #[arg(long, env = "RATE_LIMIT_MAX", default_value_t = 5)]
    pub rate_limit: u32,

    // Rate limit window in seconds
    #[arg(long, env = "RATE_LIMIT_WINDOW_SECS", default_value_t = 900)]
    pub rate_window: u64,

    // How often expired rate limit entries are swept, in seconds
    #[arg(long, env = "RATE_LIMIT_SWEEP_SECS", default_value_t = 300)]
    pub sweep_interval: u64,

    // Allowed CORS origins in production (comma-separated)
    #[arg(long, env = "ALLOWED_ORIGINS", default_value = "https://yourdomain.com")]
    pub allowed_origins: String,

    // Key the rate limiter on the first X-Forwarded-For hop
    #[arg(long, env = "TRUST_PROXY")]
    pub trust_proxy: bool,
}

impl Args {
    pub fn is_production(&self) -> bool {
        self.mode == Mode::Production
    }

    pub fn rate_window(&self) -> Duration {
        Duration::from_secs(self.rate_window)
    }

    pub fn mail_timeout(&self) -> Duration {
        Duration::from_secs(self.mail_timeout)
    }

    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval)
    }

    // Origins the browser may call us from
    pub fn cors_origins(&self) -> Vec<String> {
        match self.mode {
            Mode::Production => self
                .allowed_origins
                .split(',')
                .map(|s| s.trim()) // remove spaces
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect(),
            Mode::Development => vec![
                format!("http://localhost:{}", self.port),
                format!("http://127.0.0.1:{}", self.port),
            ],
        }
    }

    // Where the contact mail lands
    pub fn recipient(&self) -> Option<String> {
        self.mail_to.clone().or_else(|| self.email_user.clone())
    }
}
