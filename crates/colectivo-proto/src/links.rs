//! Outbound links for the contact and donation buttons.
//!
//! Nothing here talks to a network: every action resolves to a URL that the
//! user opens (or copies).  A method without a configured destination
//! resolves to `#` so the button stays harmless.

use crate::config::LinksConfig;

pub const PLACEHOLDER: &str = "#";

/// Ways a visitor can reach or support the collective.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkMethod {
    WhatsApp,
    PayPal,
    Patreon,
    Pse,
}

impl LinkMethod {
    pub const ALL: [LinkMethod; 4] = [
        LinkMethod::WhatsApp,
        LinkMethod::PayPal,
        LinkMethod::Patreon,
        LinkMethod::Pse,
    ];

    pub fn label(self) -> &'static str {
        match self {
            LinkMethod::WhatsApp => "WhatsApp",
            LinkMethod::PayPal => "PayPal",
            LinkMethod::Patreon => "Patreon",
            LinkMethod::Pse => "PSE",
        }
    }
}

/// `https://wa.me/<digits>?text=<percent-encoded message>`.
///
/// Formatting characters in the phone number (`+`, spaces, dashes,
/// parentheses) are dropped.  No digits at all yields the placeholder.
pub fn whatsapp_link(phone: &str, message: &str) -> String {
    let digits: String = phone.chars().filter(char::is_ascii_digit).collect();
    if digits.is_empty() {
        return PLACEHOLDER.to_string();
    }
    if message.trim().is_empty() {
        return format!("https://wa.me/{}", digits);
    }
    format!("https://wa.me/{}?text={}", digits, urlencoding::encode(message))
}

/// Resolve the destination for `method`, falling back to `#`.
pub fn method_link(method: LinkMethod, links: &LinksConfig) -> String {
    match method {
        LinkMethod::WhatsApp => whatsapp_link(&links.whatsapp_phone, &links.whatsapp_message),
        LinkMethod::PayPal => or_placeholder(&links.paypal_url),
        LinkMethod::Patreon => or_placeholder(&links.patreon_url),
        LinkMethod::Pse => or_placeholder(&links.pse_url),
    }
}

/// WhatsApp handoff carrying the visitor's own question, for when the chat
/// falls through to a human.
pub fn handoff_link(links: &LinksConfig, question: Option<&str>) -> String {
    match question.map(str::trim).filter(|q| !q.is_empty()) {
        Some(q) => whatsapp_link(
            &links.whatsapp_phone,
            &format!("{}: {}", links.whatsapp_message, q),
        ),
        None => method_link(LinkMethod::WhatsApp, links),
    }
}

fn or_placeholder(url: &str) -> String {
    let url = url.trim();
    if url.is_empty() {
        PLACEHOLDER.to_string()
    } else {
        url.to_string()
    }
}
