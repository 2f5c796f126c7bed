use crate::domain::SenderId;

/// Cross-transport incoming message.
///
/// Transport-specific fields stay in the adapter.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InboundMessage {
    pub sender: SenderId,
    pub text: String,
}

impl InboundMessage {
    pub fn new(sender: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            sender: SenderId(sender.into()),
            text: text.into(),
        }
    }
}

/// Everything a session connector reports to the relay loop.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SessionEvent {
    /// Session authenticated and accepting traffic.
    Ready,
    /// Pairing payload to render for the operator (QR-based transports only).
    QrCode(String),
    AuthFailure(String),
    Disconnected(String),
    Message(InboundMessage),
}

impl SessionEvent {
    pub fn kind(&self) -> &'static str {
        match self {
            SessionEvent::Ready => "ready",
            SessionEvent::QrCode(_) => "qr",
            SessionEvent::AuthFailure(_) => "auth_failure",
            SessionEvent::Disconnected(_) => "disconnected",
            SessionEvent::Message(_) => "message",
        }
    }
}
