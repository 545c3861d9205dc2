use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use radar_core::digest::DigestLinks;
use radar_events::delivery::email::MailTransport;
use radar_events::{
    BatchProcessor, ChannelDispatcher, ChatWebhookChannel, EmailChannel, EmailConfig, MailQueue,
    MailWorker, PgStore, SmtpMailer,
};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use radar_api::config::ServerConfig;
use radar_api::rate_limit::RateLimitPolicy;
use radar_api::router::build_app_router;
use radar_api::state::{AppState, OutboundMail};

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    // --- Tracing ---
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "radar_api=debug,radar_events=debug,tower_http=debug".into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // --- Configuration ---
    let config = ServerConfig::from_env();
    tracing::info!(
        host = %config.host,
        port = %config.port,
        environment = ?config.environment,
        "Loaded server configuration"
    );

    // --- Database ---
    let database_url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");

    let pool = radar_db::create_pool(&database_url)
        .await
        .expect("Failed to connect to database");
    tracing::info!("Database connection pool created");

    radar_db::health_check(&pool)
        .await
        .expect("Database health check failed");

    radar_db::run_migrations(&pool)
        .await
        .expect("Failed to run database migrations");
    tracing::info!("Database migrations applied");

    // --- Delivery channels ---
    let links = DigestLinks::from_base_url(&config.public_base_url);
    let mut dispatcher = ChannelDispatcher::new();

    let mail_cancel = CancellationToken::new();
    let mut mail_handle = None;
    let mut outbound_mail = None;

    match EmailConfig::from_env() {
        Some(email_config) => {
            let mailer: Arc<dyn MailTransport> =
                Arc::new(SmtpMailer::new(&email_config).expect("Invalid SMTP configuration"));
            let (queue, receiver) = MailQueue::bounded(email_config.queue_capacity);
            mail_handle = Some(tokio::spawn(MailWorker::run(
                mailer,
                receiver,
                mail_cancel.clone(),
            )));

            let sender = email_config.sender();
            dispatcher = dispatcher.with_channel(Arc::new(EmailChannel::new(
                queue.clone(),
                sender.clone(),
                links.clone(),
            )));
            outbound_mail = Some(OutboundMail {
                queue,
                from: sender,
            });
            tracing::info!(smtp_host = %email_config.smtp_host, "Email delivery enabled");
        }
        None => tracing::warn!("SMTP_HOST not set, email delivery disabled"),
    }

    let chat = ChatWebhookChannel::new(
        links,
        Duration::from_secs(config.chat_webhook_timeout_secs),
    )
    .expect("Failed to build chat webhook client");
    dispatcher = dispatcher.with_channel(Arc::new(chat));

    // --- Pipeline ---
    let store = Arc::new(PgStore::new(pool.clone()));
    let processor = BatchProcessor::new(store.clone(), store.clone(), store, dispatcher);

    // --- Rate limiting ---
    let rate_limit = RateLimitPolicy::from_config(&config).expect("Invalid rate limit configuration");

    // --- App state ---
    let state = AppState {
        pool,
        config: Arc::new(config.clone()),
        processor: Arc::new(processor),
        rate_limit: Arc::new(rate_limit),
        mail: outbound_mail,
    };

    let app = build_app_router(state, &config);

    // --- Start server ---
    let addr = SocketAddr::new(
        config.host.parse().expect("Invalid HOST address"),
        config.port,
    );
    tracing::info!(%addr, "Starting server");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind to address");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("Server error");

    // --- Post-shutdown cleanup ---
    tracing::info!("Server stopped accepting connections, draining mail queue");

    mail_cancel.cancel();
    if let Some(handle) = mail_handle {
        let _ = tokio::time::timeout(Duration::from_secs(10), handle).await;
        tracing::info!("Mail worker stopped");
    }

    tracing::info!("Graceful shutdown complete");
}

/// Wait for a termination signal to initiate graceful shutdown.
///
/// Handles both SIGINT (Ctrl-C) and SIGTERM (on Unix).
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl-C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("Received SIGINT (Ctrl-C), starting graceful shutdown");
        }
        () = terminate => {
            tracing::info!("Received SIGTERM, starting graceful shutdown");
        }
    }
}
