// src/services/lead_notifier.rs
//! Best-effort lead emails over an authenticated SMTP relay.
//!
//! `LeadNotifier::notify` never returns an error. Every way it can go wrong is
//! logged and folded into a [`NotifyOutcome`], so the chat path can record the
//! result and move on.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use lettre::message::header::ContentType;
use lettre::message::{Mailbox, Message};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Tokio1Executor};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::config::SmtpSettings;

pub const LEAD_SUBJECT: &str = "📩 New Lead from Chatbot";
pub const IMPLICIT_TLS_PORT: u16 = 465;
const SMTP_TIMEOUT: Duration = Duration::from_secs(10);

/// Contact information caught in a chat message, plus where it came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LeadEvent {
    pub raw_text: String,
    pub page_url: String,
    pub session_id: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TlsMode {
    /// TLS from the first byte (SMTPS).
    Implicit,
    /// Plaintext connection upgraded with STARTTLS.
    StartTls,
}

impl TlsMode {
    pub fn for_port(port: u16) -> Self {
        if port == IMPLICIT_TLS_PORT {
            TlsMode::Implicit
        } else {
            TlsMode::StartTls
        }
    }
}

#[derive(Clone)]
pub struct RelayTarget {
    pub host: String,
    pub port: u16,
    pub tls: TlsMode,
    pub username: String,
    pub password: String,
}

impl fmt::Debug for RelayTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RelayTarget")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("tls", &self.tls)
            .field("username", &self.username)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboundEmail {
    pub from: String,
    pub to: String,
    pub subject: String,
    pub body: String,
}

#[derive(Debug, Error)]
pub enum MailError {
    #[error("invalid address '{address}': {reason}")]
    Address { address: String, reason: String },
    #[error("failed to build message: {0}")]
    Build(String),
    #[error("SMTP transport error: {0}")]
    Transport(String),
}

/// Delivers one composed email through a relay.
#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, relay: &RelayTarget, email: OutboundEmail) -> Result<(), MailError>;
}

/// `lettre`-backed SMTP delivery.
#[derive(Debug, Default, Clone, Copy)]
pub struct SmtpMailer;

fn parse_mailbox(address: &str) -> Result<Mailbox, MailError> {
    address.parse().map_err(|e| MailError::Address {
        address: address.to_string(),
        reason: format!("{e}"),
    })
}

#[async_trait]
impl Mailer for SmtpMailer {
    async fn send(&self, relay: &RelayTarget, email: OutboundEmail) -> Result<(), MailError> {
        let message = Message::builder()
            .from(parse_mailbox(&email.from)?)
            .to(parse_mailbox(&email.to)?)
            .subject(email.subject)
            .header(ContentType::TEXT_PLAIN)
            .body(email.body)
            .map_err(|e| MailError::Build(e.to_string()))?;

        let builder = match relay.tls {
            TlsMode::Implicit => AsyncSmtpTransport::<Tokio1Executor>::relay(&relay.host),
            TlsMode::StartTls => AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&relay.host),
        }
        .map_err(|e| MailError::Transport(format!("relay '{}': {e}", relay.host)))?;

        let transport = builder
            .port(relay.port)
            .credentials(Credentials::new(
                relay.username.clone(),
                relay.password.clone(),
            ))
            .timeout(Some(SMTP_TIMEOUT))
            .build();

        transport
            .send(message)
            .await
            .map_err(|e| MailError::Transport(e.to_string()))?;

        debug!("SMTP delivered via {}:{} ({:?})", relay.host, relay.port, relay.tls);
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    /// Names of the environment variables that were unset or empty.
    MissingConfig(Vec<&'static str>),
    InvalidPort(String),
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::MissingConfig(keys) => write!(f, "missing {}", keys.join(", ")),
            SkipReason::InvalidPort(raw) => write!(f, "invalid SMTP_PORT '{raw}'"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NotifyOutcome {
    Sent,
    Skipped(SkipReason),
    Failed(String),
}

impl NotifyOutcome {
    pub fn label(&self) -> &'static str {
        match self {
            NotifyOutcome::Sent => "sent",
            NotifyOutcome::Skipped(_) => "skipped",
            NotifyOutcome::Failed(_) => "failed",
        }
    }
}

#[derive(Clone)]
pub struct LeadNotifier {
    settings: SmtpSettings,
    mailer: Arc<dyn Mailer>,
}

impl fmt::Debug for LeadNotifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LeadNotifier")
            .field("host", &self.settings.host)
            .field("port", &self.settings.port)
            .field("lead_to", &self.settings.lead_to)
            .finish_non_exhaustive()
    }
}

impl LeadNotifier {
    pub fn new(settings: SmtpSettings, mailer: Arc<dyn Mailer>) -> Self {
        Self { settings, mailer }
    }

    /// Notifier that delivers through a real SMTP relay.
    pub fn smtp(settings: SmtpSettings) -> Self {
        Self::new(settings, Arc::new(SmtpMailer))
    }

    pub fn compose(event: &LeadEvent, from: &str, to: &str) -> OutboundEmail {
        OutboundEmail {
            from: from.to_string(),
            to: to.to_string(),
            subject: LEAD_SUBJECT.to_string(),
            body: format!(
                "Chatbot lead captured\n\nSession: {}\nPage: {}\nMessage: {}\n",
                event.session_id, event.page_url, event.raw_text
            ),
        }
    }

    pub async fn notify(&self, event: &LeadEvent) -> NotifyOutcome {
        let s = &self.settings;
        let (host, port_raw, username, password, lead_to) = match (
            s.host.as_deref(),
            s.port.as_deref(),
            s.username.as_deref(),
            s.password.as_deref(),
            s.lead_to.as_deref(),
        ) {
            (Some(h), Some(p), Some(u), Some(pw), Some(to)) => (h, p, u, pw, to),
            _ => {
                let missing = [
                    ("SMTP_HOST", s.host.is_none()),
                    ("SMTP_PORT", s.port.is_none()),
                    ("SMTP_USER", s.username.is_none()),
                    ("SMTP_PASS", s.password.is_none()),
                    ("LEAD_TO_EMAIL", s.lead_to.is_none()),
                ]
                .into_iter()
                .filter_map(|(key, absent)| absent.then_some(key))
                .collect::<Vec<_>>();
                let reason = SkipReason::MissingConfig(missing);
                warn!("Lead email skipped: {reason}");
                return NotifyOutcome::Skipped(reason);
            }
        };

        let port = match port_raw.trim().parse::<u16>() {
            Ok(port) => port,
            Err(_) => {
                let reason = SkipReason::InvalidPort(port_raw.to_string());
                warn!("Lead email skipped: {reason}");
                return NotifyOutcome::Skipped(reason);
            }
        };

        let relay = RelayTarget {
            host: host.to_string(),
            port,
            tls: TlsMode::for_port(port),
            username: username.to_string(),
            password: password.to_string(),
        };
        let from = s.from_address.as_deref().unwrap_or(username);
        let email = Self::compose(event, from, lead_to);

        match self.mailer.send(&relay, email).await {
            Ok(()) => {
                info!(session_id = %event.session_id, "Lead email sent to {lead_to}");
                NotifyOutcome::Sent
            }
            Err(e) => {
                warn!(session_id = %event.session_id, "Lead email error: {e}");
                NotifyOutcome::Failed(e.to_string())
            }
        }
    }
}
