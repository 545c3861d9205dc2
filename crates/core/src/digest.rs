//! Digest content and rendering.
//!
//! A digest summarizes every match for one user in one batch. Rows are sorted
//! before rendering so the output does not depend on match order.

use std::fmt::Write;

use crate::alert::NotificationEnvelope;
use crate::availability::AvailabilityEvent;

/// Product name used in greetings and signatures.
pub const PRODUCT_NAME: &str = "Server Radar";

/// One line of a digest.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DigestRow {
    pub alert_name: String,
    pub resource_type_name: String,
    pub location_name: String,
    pub state: AvailabilityEvent,
}

impl From<&NotificationEnvelope> for DigestRow {
    fn from(envelope: &NotificationEnvelope) -> Self {
        Self {
            alert_name: envelope.alert_name.clone(),
            resource_type_name: envelope.change.resource_type_name.clone(),
            location_name: envelope.change.location_name.clone(),
            state: envelope.change.event_type,
        }
    }
}

/// Links embedded in rendered digests.
#[derive(Debug, Clone)]
pub struct DigestLinks {
    /// Page showing current availability.
    pub status_url: String,
    /// Page where users manage their alerts.
    pub manage_url: String,
}

impl DigestLinks {
    /// Derive both links from the public base URL of the site.
    pub fn from_base_url(base_url: &str) -> Self {
        let base = base_url.trim_end_matches('/');
        Self {
            status_url: format!("{base}/cloud-status"),
            manage_url: format!("{base}/alerts"),
        }
    }
}

/// Subject and body of a digest email.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedEmail {
    pub subject: String,
    pub text: String,
}

fn sorted(rows: &[DigestRow]) -> Vec<&DigestRow> {
    let mut sorted: Vec<&DigestRow> = rows.iter().collect();
    sorted.sort();
    sorted
}

/// Email subject line for a digest with `count` rows.
pub fn email_subject(count: usize) -> String {
    let plural = if count == 1 { "" } else { "s" };
    format!("Cloud Alert - {count} Change{plural}")
}

/// Render the plain-text digest email.
pub fn render_email(rows: &[DigestRow], links: &DigestLinks) -> RenderedEmail {
    let which = if rows.len() > 1 {
        "some of your cloud alerts has"
    } else {
        "one of your cloud alerts has"
    };

    let mut text = format!("Hi there,\n\ngood news! The availability for {which} changed.\n\n");

    for row in sorted(rows) {
        let _ = write!(
            text,
            "          Alert: {}\n    Server Type: {}\n       Location: {}\n         Status: {}\n\n",
            row.alert_name,
            row.resource_type_name,
            row.location_name,
            row.state.describe(),
        );
    }

    let _ = write!(
        text,
        "View current availability status directly:\n\n  {status}\n\n\
         Please note that {PRODUCT_NAME} may notice availability changes with a delay\n\
         of up to 2 minutes and the server you are looking for may not be available\n\
         anymore when you check.\n\n\
         Fingers crossed!\n\n\
         Cheers,\n{PRODUCT_NAME}\n--\n\n\
         You are receiving this because you have set up cloud alerts.\n\
         To manage your alerts, visit: {manage}",
        status = links.status_url,
        manage = links.manage_url,
    );

    RenderedEmail {
        subject: email_subject(rows.len()),
        text,
    }
}

/// Render the chat (Discord markdown) digest message.
pub fn render_chat(rows: &[DigestRow], links: &DigestLinks) -> String {
    let mut message = String::from("**Cloud Alert**\n\n");

    for row in sorted(rows) {
        let marker = match row.state {
            AvailabilityEvent::Available => "\u{2705}",
            AvailabilityEvent::Unavailable => "\u{274c}",
        };
        let _ = writeln!(
            message,
            "{marker} **{}** {} in **{}** (Alert: {})",
            row.resource_type_name,
            row.state.describe(),
            row.location_name,
            row.alert_name,
        );
    }

    let _ = write!(
        message,
        "\n[View current availability status]({})",
        links.status_url
    );
    message
}
