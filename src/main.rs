use clap::Parser; // for cli
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::{error, info, warn};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use portfolio_contact::{
    app,
    config::Args,
    contact::ContactService,
    mail::{HttpMailer, Mailbox},
    rate_limit::{RateLimiter, sweeper},
    state::AppState,
};

// this is main async function with tokio
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // .env is optional
    dotenvy::dotenv().ok();
    let args = Args::parse();

    init_tracing(args.is_production());

    let mailer = HttpMailer::new(
        reqwest::Client::new(),
        args.mail_api_url.clone(),
        args.email_user.clone(),
        args.email_pass.clone(),
    );
    if !mailer.is_configured() {
        warn!("EMAIL_USER/EMAIL_PASS not set, contact submissions will fail to send");
    }
    let mailbox = Mailbox {
        from: args.email_user.clone().unwrap_or_default(),
        to: args.recipient().unwrap_or_default(),
    };

    let limiter = Arc::new(RateLimiter::new(args.rate_limit, args.rate_window()));
    let contact = ContactService::new(limiter.clone(), Arc::new(mailer), mailbox, args.mail_timeout())
        .verbose_errors(!args.is_production());

    let mut state = AppState::new(contact);
    state.trust_proxy = args.trust_proxy;
    let state = Arc::new(state);

    // spawn the background sweeper
    tokio::spawn(sweeper(limiter, args.sweep_interval()));

    let router = app(state, &args.cors_origins());

    let addr = SocketAddr::from(([0, 0, 0, 0], args.port));
    let listener = match tokio::net::TcpListener::bind(addr).await {
        Ok(listener) => listener,
        Err(err) => {
            if err.kind() == std::io::ErrorKind::AddrInUse {
                error!(port = args.port, "port is already in use");
            } else {
                error!(error = %err, "failed to bind listener");
            }
            return Err(err.into());
        }
    };

    info!("Server is running on http://localhost:{}", args.port);
    info!("Contact form endpoint: http://localhost:{}/contact", args.port);
    info!("Health check: http://localhost:{}/health", args.port);
    info!(
        "Rate limit: {} submissions per {} seconds",
        args.rate_limit, args.rate_window
    );
    if !args.is_production() {
        info!("Development mode enabled");
    }

    axum::serve(
        listener,
        router.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    info!("Process terminated");
    Ok(())
}

// JSON logs in production, human readable otherwise
fn init_tracing(production: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let registry = tracing_subscriber::registry().with(filter);

    if production {
        registry.with(fmt::layer().json()).init();
    } else {
        registry.with(fmt::layer().compact()).init();
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            error!(error = %err, "failed to listen for SIGINT");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(err) => {
                error!(error = %err, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("SIGINT received, shutting down gracefully"),
        _ = terminate => info!("SIGTERM received, shutting down gracefully"),
    }
}
