use std::borrow::Cow;
use std::fmt;
use std::sync::Arc;

/// Payload of the frame sent to every subscriber as soon as it starts streaming.
pub const WELCOME_PAYLOAD: &str = r#"{"message": "Connected"}"#;

/// An immutable notification payload.
///
/// The hub never looks inside the payload; cloning is a reference count bump so
/// the same message can be queued for every subscriber without copying it.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Message(Arc<str>);

impl Message {
    pub fn new(payload: impl Into<Arc<str>>) -> Self {
        Self(payload.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for Message {
    fn from(payload: String) -> Self {
        Self::new(payload)
    }
}

impl From<&str> for Message {
    fn from(payload: &str) -> Self {
        Self::new(payload)
    }
}

/// Rewrites CRLF and lone CR line breaks as LF. Borrows when there is nothing to rewrite.
pub(crate) fn normalize_line_breaks(payload: &str) -> Cow<'_, str> {
    if payload.contains('\r') {
        Cow::Owned(payload.replace("\r\n", "\n").replace('\r', "\n"))
    } else {
        Cow::Borrowed(payload)
    }
}

/// Frames a payload as a single event-stream event: one `data:` line per payload
/// line followed by a blank line.
///
/// A single-line payload becomes exactly `data: <payload>\n\n`.
pub fn frame(payload: &str) -> String {
    let payload = normalize_line_breaks(payload);
    let mut framed = String::with_capacity(payload.len() + 8);
    for line in payload.split('\n') {
        framed.push_str("data: ");
        framed.push_str(line);
        framed.push('\n');
    }
    framed.push('\n');
    framed
}

/// The frame sent when a connection enters the streaming state.
pub fn welcome_frame() -> String {
    frame(WELCOME_PAYLOAD)
}
