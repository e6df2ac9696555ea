//! Read-only extraction of display fields from fetched messages

use crate::error::{Error, Result};
use crate::sanitize::html_to_text;
use crate::session::FetchedMessage;
use mail_parser::{Addr, Address, Message, MessageParser, MessagePartId, MimeHeaders, PartType};
use serde::Serialize;
use tracing::{debug, warn};

/// How a message's top-level content type is rendered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContentKind {
    /// `text/plain`, or no Content-Type at all. Rendered verbatim.
    PlainText,
    /// `multipart/*`. HTML parts are sanitized to text.
    Multipart { subtype: String },
    /// Anything else. Rendered as an empty body.
    Unsupported { mime_type: String },
}

/// One row of an account's message table.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MessageSummary {
    pub date: String,
    pub from: String,
    pub subject: String,
}

/// Everything shown for a selected message.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MessageDetail {
    pub date: String,
    pub from: String,
    pub subject: String,
    pub body: String,
}

impl MessageDetail {
    /// The four fields separated by blank lines.
    #[must_use]
    pub fn to_text(&self) -> String {
        format!(
            "{}\n\n{}\n\n{}\n\n{}",
            self.date, self.from, self.subject, self.body
        )
    }
}

/// Parse the raw bytes of a fetched message.
///
/// # Errors
///
/// Returns [`Error::Content`] if the bytes are not a parseable message.
pub fn parse(message: &FetchedMessage) -> Result<Message<'_>> {
    MessageParser::default()
        .parse(message.raw())
        .ok_or_else(|| Error::Content(format!("Message {} could not be parsed", message.position())))
}

/// Date, sender and subject of a message.
///
/// # Errors
///
/// Returns [`Error::Content`] if the message cannot be parsed.
pub fn summarize(message: &FetchedMessage) -> Result<MessageSummary> {
    let parsed = parse(message)?;
    Ok(MessageSummary {
        date: date(&parsed),
        from: from(&parsed),
        subject: subject(&parsed),
    })
}

/// All display fields of a message, including the sanitized body.
///
/// A body that cannot be rendered comes back empty or partial rather
/// than failing the whole message.
///
/// # Errors
///
/// Returns [`Error::Content`] if the message cannot be parsed.
pub fn render(message: &FetchedMessage) -> Result<MessageDetail> {
    let parsed = parse(message)?;
    Ok(MessageDetail {
        date: date(&parsed),
        from: from(&parsed),
        subject: subject(&parsed),
        body: body(&parsed),
    })
}

/// The sent timestamp in RFC 2822 form, keeping the sender's offset.
/// Empty when the header is missing or names an impossible time.
#[must_use]
pub fn date(message: &Message<'_>) -> String {
    let Some(sent) = message.date() else {
        return String::new();
    };

    chrono::DateTime::parse_from_rfc3339(&sent.to_rfc3339()).map_or(String::new(), |dt| dt.to_rfc2822())
}

/// Every sender address, concatenated without a separator.
#[must_use]
pub fn from(message: &Message<'_>) -> String {
    let Some(address) = message.from() else {
        return String::new();
    };

    match address {
        Address::List(list) => list.iter().map(render_address).collect(),
        Address::Group(groups) => groups
            .iter()
            .flat_map(|group| group.addresses.iter())
            .map(render_address)
            .collect(),
    }
}

fn render_address(addr: &Addr<'_>) -> String {
    match (addr.name.as_deref(), addr.address.as_deref()) {
        (Some(name), Some(email)) if !name.is_empty() => format!("{name} <{email}>"),
        (_, Some(email)) => email.to_string(),
        (Some(name), None) => name.to_string(),
        (None, None) => String::new(),
    }
}

/// The subject line verbatim, or empty.
#[must_use]
pub fn subject(message: &Message<'_>) -> String {
    message.subject().unwrap_or_default().to_string()
}

/// Classify the top-level content type.
#[must_use]
pub fn content_kind(message: &Message<'_>) -> ContentKind {
    let Some(content_type) = message.root_part().content_type() else {
        return ContentKind::PlainText;
    };

    let ctype = content_type.ctype().to_ascii_lowercase();
    let subtype = content_type.subtype().unwrap_or_default().to_ascii_lowercase();

    match (ctype.as_str(), subtype.as_str()) {
        ("text", "plain") => ContentKind::PlainText,
        ("multipart", _) => ContentKind::Multipart { subtype },
        _ => ContentKind::Unsupported {
            mime_type: format!("{ctype}/{subtype}"),
        },
    }
}

/// The readable body text.
///
/// Degrades to whatever was rendered before a content error; the error
/// itself is logged.
#[must_use]
pub fn body(message: &Message<'_>) -> String {
    let mut text = String::new();
    if let Err(e) = write_body(message, &mut text) {
        warn!("Body rendering degraded: {}", e);
    }
    text
}

/// Like [`body`], but surfaces content errors instead of degrading.
///
/// # Errors
///
/// Returns [`Error::Content`] if the MIME structure is inconsistent.
pub fn try_body(message: &Message<'_>) -> Result<String> {
    let mut text = String::new();
    write_body(message, &mut text)?;
    Ok(text)
}

fn write_body(message: &Message<'_>, out: &mut String) -> Result<()> {
    let root = message.root_part();

    match content_kind(message) {
        ContentKind::PlainText => {
            let text = root
                .text_contents()
                .ok_or_else(|| Error::Content("text/plain body is not text".into()))?;
            out.push_str(text);
        }
        ContentKind::Multipart { subtype } => {
            let PartType::Multipart(children) = &root.body else {
                return Err(Error::Content(format!(
                    "multipart/{subtype} message has no parts"
                )));
            };

            let mut plain = Vec::new();
            let html_parts = write_html_parts(message, children, out, &mut plain)?;
            if html_parts == 0 {
                for text in plain {
                    out.push_str(text);
                }
            }
        }
        ContentKind::Unsupported { mime_type } => {
            debug!("No renderable body for {}", mime_type);
        }
    }

    Ok(())
}

/// Sanitize every HTML part under `ids` into `out`, in document order.
/// Plain-text parts are collected into `plain` as a fallback. Returns
/// the number of HTML parts written.
fn write_html_parts<'m>(
    message: &'m Message<'_>,
    ids: &[MessagePartId],
    out: &mut String,
    plain: &mut Vec<&'m str>,
) -> Result<usize> {
    let mut written = 0;

    for &id in ids {
        let part = usize::try_from(id)
            .ok()
            .and_then(|index| message.parts.get(index))
            .ok_or_else(|| Error::Content(format!("MIME part {id} is missing")))?;

        match &part.body {
            PartType::Html(markup) => {
                out.push_str(&html_to_text(markup));
                written += 1;
            }
            PartType::Text(text) => plain.push(text.as_ref()),
            PartType::Multipart(nested) => {
                written += write_html_parts(message, nested, out, plain)?;
            }
            PartType::Binary(_) | PartType::InlineBinary(_) | PartType::Message(_) => {}
        }
    }

    Ok(written)
}
