//! Digest delivery by email.
//!
//! [`EmailChannel`] renders a digest and hands it to the bounded
//! [`MailQueue`]; from the dispatcher's point of view the attempt succeeds
//! once the mail is queued. [`MailWorker`] drains the queue in the
//! background through a [`MailTransport`] (SMTP in production) and logs
//! transport failures.

use std::sync::Arc;

use async_trait::async_trait;
use lettre::message::header::ContentType;
use lettre::message::Mailbox;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use radar_core::channels::ChannelKind;
use radar_core::digest::{render_email, DigestLinks, PRODUCT_NAME};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use super::{DeliveryChannel, DeliveryError};
use crate::aggregator::Digest;

// ---------------------------------------------------------------------------
// Error
// ---------------------------------------------------------------------------

/// Error type for email delivery failures.
#[derive(Debug, thiserror::Error)]
pub enum EmailError {
    /// SMTP transport-level failure (authentication, connection, etc.).
    #[error("SMTP transport error: {0}")]
    Transport(#[from] lettre::transport::smtp::Error),

    /// The recipient or sender address could not be parsed.
    #[error("Email address parse error: {0}")]
    Address(#[from] lettre::address::AddressError),

    /// The MIME message could not be assembled.
    #[error("Email build error: {0}")]
    Build(String),

    /// The queue is at capacity; the mail was dropped.
    #[error("Mail queue is full")]
    QueueFull,

    /// The worker has shut down.
    #[error("Mail queue is closed")]
    QueueClosed,
}

// ---------------------------------------------------------------------------
// EmailConfig
// ---------------------------------------------------------------------------

/// Default SMTP port (STARTTLS).
const DEFAULT_SMTP_PORT: u16 = 587;

/// Default sender address when `SMTP_FROM` is not set.
const DEFAULT_FROM_ADDRESS: &str = "no-reply@radar.iodev.org";

/// Default number of mails that may wait for the SMTP worker.
const DEFAULT_QUEUE_CAPACITY: usize = 256;

/// Configuration for the SMTP mail transport.
#[derive(Debug, Clone)]
pub struct EmailConfig {
    /// SMTP server hostname.
    pub smtp_host: String,
    /// SMTP server port (defaults to 587).
    pub smtp_port: u16,
    /// Sender address.
    pub from_address: String,
    /// Sender display name.
    pub from_name: String,
    /// Optional SMTP username.
    pub smtp_user: Option<String>,
    /// Optional SMTP password.
    pub smtp_password: Option<String>,
    /// Capacity of the outgoing mail queue.
    pub queue_capacity: usize,
}

impl EmailConfig {
    /// Load configuration from environment variables.
    ///
    /// Returns `None` if `SMTP_HOST` is not set, signalling that email
    /// delivery is not configured and should be skipped.
    ///
    /// | Variable              | Required | Default                     |
    /// |-----------------------|----------|-----------------------------|
    /// | `SMTP_HOST`           | yes      |                             |
    /// | `SMTP_PORT`           | no       | `587`                       |
    /// | `SMTP_FROM`           | no       | `no-reply@radar.iodev.org`  |
    /// | `SMTP_FROM_NAME`      | no       | `Server Radar`              |
    /// | `SMTP_USER`           | no       |                             |
    /// | `SMTP_PASSWORD`       | no       |                             |
    /// | `MAIL_QUEUE_CAPACITY` | no       | `256`                       |
    pub fn from_env() -> Option<Self> {
        let smtp_host = std::env::var("SMTP_HOST").ok()?;
        Some(Self {
            smtp_host,
            smtp_port: std::env::var("SMTP_PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(DEFAULT_SMTP_PORT),
            from_address: std::env::var("SMTP_FROM")
                .unwrap_or_else(|_| DEFAULT_FROM_ADDRESS.to_string()),
            from_name: std::env::var("SMTP_FROM_NAME").unwrap_or_else(|_| PRODUCT_NAME.to_string()),
            smtp_user: std::env::var("SMTP_USER").ok(),
            smtp_password: std::env::var("SMTP_PASSWORD").ok(),
            queue_capacity: std::env::var("MAIL_QUEUE_CAPACITY")
                .ok()
                .and_then(|c| c.parse().ok())
                .filter(|c| *c > 0)
                .unwrap_or(DEFAULT_QUEUE_CAPACITY),
        })
    }

    /// The `From` header value, e.g. `"Server Radar" <no-reply@radar.iodev.org>`.
    pub fn sender(&self) -> String {
        let name = self.from_name.trim();
        if name.is_empty() {
            self.from_address.clone()
        } else {
            format!("\"{name}\" <{}>", self.from_address)
        }
    }
}

// ---------------------------------------------------------------------------
// Transport
// ---------------------------------------------------------------------------

/// A plain-text mail ready for the transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutgoingMail {
    pub from: String,
    pub to: String,
    pub subject: String,
    pub text: String,
}

/// Something that can actually send a mail.
#[async_trait]
pub trait MailTransport: Send + Sync {
    async fn send(&self, mail: &OutgoingMail) -> Result<(), EmailError>;
}

/// Async SMTP transport built once from [`EmailConfig`].
pub struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
}

impl SmtpMailer {
    pub fn new(config: &EmailConfig) -> Result<Self, EmailError> {
        let mut builder = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.smtp_host)?
            .port(config.smtp_port);

        if let (Some(user), Some(pass)) = (&config.smtp_user, &config.smtp_password) {
            builder = builder.credentials(Credentials::new(user.clone(), pass.clone()));
        }

        Ok(Self {
            transport: builder.build(),
        })
    }
}

#[async_trait]
impl MailTransport for SmtpMailer {
    async fn send(&self, mail: &OutgoingMail) -> Result<(), EmailError> {
        let message = Message::builder()
            .from(mail.from.parse::<Mailbox>()?)
            .to(mail.to.parse::<Mailbox>()?)
            .subject(mail.subject.clone())
            .header(ContentType::TEXT_PLAIN)
            .body(mail.text.clone())
            .map_err(|e| EmailError::Build(e.to_string()))?;

        self.transport.send(message).await?;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Queue and worker
// ---------------------------------------------------------------------------

/// Sending half of the outgoing mail queue. Cheap to clone.
#[derive(Clone)]
pub struct MailQueue {
    sender: mpsc::Sender<OutgoingMail>,
}

impl MailQueue {
    /// Create a queue holding at most `capacity` pending mails.
    pub fn bounded(capacity: usize) -> (Self, mpsc::Receiver<OutgoingMail>) {
        let (sender, receiver) = mpsc::channel(capacity);
        (Self { sender }, receiver)
    }

    /// Queue a mail without waiting.
    pub fn enqueue(&self, mail: OutgoingMail) -> Result<(), EmailError> {
        self.sender.try_send(mail).map_err(|e| match e {
            mpsc::error::TrySendError::Full(_) => EmailError::QueueFull,
            mpsc::error::TrySendError::Closed(_) => EmailError::QueueClosed,
        })
    }
}

/// Background task draining the mail queue.
pub struct MailWorker;

impl MailWorker {
    /// Send queued mails until cancelled or until every [`MailQueue`] handle
    /// is dropped.
    ///
    /// On cancellation the queue is closed and mails already waiting are
    /// still sent before returning.
    pub async fn run(
        transport: Arc<dyn MailTransport>,
        mut receiver: mpsc::Receiver<OutgoingMail>,
        cancel: CancellationToken,
    ) {
        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    tracing::info!("Mail worker cancelled, draining queue");
                    break;
                }
                next = receiver.recv() => match next {
                    Some(mail) => Self::send_one(transport.as_ref(), &mail).await,
                    None => {
                        tracing::info!("Mail queue closed, mail worker shutting down");
                        return;
                    }
                }
            }
        }

        receiver.close();
        while let Some(mail) = receiver.recv().await {
            Self::send_one(transport.as_ref(), &mail).await;
        }
    }

    async fn send_one(transport: &dyn MailTransport, mail: &OutgoingMail) {
        match transport.send(mail).await {
            Ok(()) => tracing::info!(to = %mail.to, subject = %mail.subject, "Email sent"),
            Err(e) => tracing::error!(to = %mail.to, error = %e, "Failed to send email"),
        }
    }
}

// ---------------------------------------------------------------------------
// EmailChannel
// ---------------------------------------------------------------------------

/// Delivers email digests by queueing them.
pub struct EmailChannel {
    queue: MailQueue,
    sender: String,
    links: DigestLinks,
}

impl EmailChannel {
    pub fn new(queue: MailQueue, sender: String, links: DigestLinks) -> Self {
        Self {
            queue,
            sender,
            links,
        }
    }
}

#[async_trait]
impl DeliveryChannel for EmailChannel {
    fn kind(&self) -> ChannelKind {
        ChannelKind::Email
    }

    async fn deliver(&self, digest: &Digest) -> Result<(), DeliveryError> {
        let rendered = render_email(&digest.rows, &self.links);
        self.queue.enqueue(OutgoingMail {
            from: self.sender.clone(),
            to: digest.recipient.clone(),
            subject: rendered.subject,
            text: rendered.text,
        })?;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use assert_matches::assert_matches;
    use radar_core::availability::AvailabilityEvent;
    use radar_core::digest::DigestRow;

    use super::*;

    #[derive(Default)]
    struct CapturingTransport {
        sent: Mutex<Vec<OutgoingMail>>,
    }

    #[async_trait]
    impl MailTransport for CapturingTransport {
        async fn send(&self, mail: &OutgoingMail) -> Result<(), EmailError> {
            self.sent.lock().unwrap().push(mail.clone());
            Ok(())
        }
    }

    fn mail(to: &str) -> OutgoingMail {
        OutgoingMail {
            from: "\"Server Radar\" <no-reply@radar.test>".to_string(),
            to: to.to_string(),
            subject: "subject".to_string(),
            text: "text".to_string(),
        }
    }

    fn config(name: &str) -> EmailConfig {
        EmailConfig {
            smtp_host: "smtp.test".to_string(),
            smtp_port: DEFAULT_SMTP_PORT,
            from_address: "no-reply@radar.test".to_string(),
            from_name: name.to_string(),
            smtp_user: None,
            smtp_password: None,
            queue_capacity: 4,
        }
    }

    #[test]
    fn from_env_returns_none_without_smtp_host() {
        std::env::remove_var("SMTP_HOST");
        assert!(EmailConfig::from_env().is_none());
    }

    #[test]
    fn sender_includes_display_name_when_set() {
        assert_eq!(config("Server Radar").sender(), "\"Server Radar\" <no-reply@radar.test>");
        assert_eq!(config("  ").sender(), "no-reply@radar.test");
    }

    #[test]
    fn sender_parses_as_mailbox() {
        let mailbox: Mailbox = config("Server Radar").sender().parse().unwrap();
        assert_eq!(mailbox.email.to_string(), "no-reply@radar.test");
    }

    #[test]
    fn email_error_display_build() {
        let err = EmailError::Build("missing body".to_string());
        assert_eq!(err.to_string(), "Email build error: missing body");
    }

    #[test]
    fn full_queue_rejects_mail() {
        let (queue, _receiver) = MailQueue::bounded(1);
        queue.enqueue(mail("a@example.org")).unwrap();
        assert_matches!(queue.enqueue(mail("b@example.org")), Err(EmailError::QueueFull));
    }

    #[test]
    fn closed_queue_rejects_mail() {
        let (queue, receiver) = MailQueue::bounded(1);
        drop(receiver);
        assert_matches!(queue.enqueue(mail("a@example.org")), Err(EmailError::QueueClosed));
    }

    #[tokio::test]
    async fn worker_sends_queued_mail_and_drains_on_cancel() {
        let transport = Arc::new(CapturingTransport::default());
        let (queue, receiver) = MailQueue::bounded(8);
        let cancel = CancellationToken::new();

        queue.enqueue(mail("a@example.org")).unwrap();
        queue.enqueue(mail("b@example.org")).unwrap();
        cancel.cancel();

        MailWorker::run(transport.clone(), receiver, cancel).await;

        let sent = transport.sent.lock().unwrap();
        let recipients: Vec<_> = sent.iter().map(|m| m.to.as_str()).collect();
        assert_eq!(recipients, vec!["a@example.org", "b@example.org"]);
    }

    #[tokio::test]
    async fn worker_stops_when_all_queues_are_dropped() {
        let transport = Arc::new(CapturingTransport::default());
        let (queue, receiver) = MailQueue::bounded(8);
        queue.enqueue(mail("a@example.org")).unwrap();
        drop(queue);

        MailWorker::run(transport.clone(), receiver, CancellationToken::new()).await;

        assert_eq!(transport.sent.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn channel_renders_and_queues_digest() {
        let (queue, mut receiver) = MailQueue::bounded(4);
        let channel = EmailChannel::new(
            queue,
            config("Server Radar").sender(),
            DigestLinks::from_base_url("https://radar.test"),
        );
        let digest = Digest {
            user_id: 1,
            channel: ChannelKind::Email,
            recipient: "user@example.org".to_string(),
            rows: vec![DigestRow {
                alert_name: "arm".to_string(),
                resource_type_name: "cax11".to_string(),
                location_name: "fsn1".to_string(),
                state: AvailabilityEvent::Available,
            }],
        };

        channel.deliver(&digest).await.unwrap();

        let queued = receiver.recv().await.unwrap();
        assert_eq!(queued.to, "user@example.org");
        assert_eq!(queued.subject, "Cloud Alert - 1 Change");
        assert!(queued.text.contains("Server Type: cax11"));
        assert_eq!(queued.from, "\"Server Radar\" <no-reply@radar.test>");
    }
}
