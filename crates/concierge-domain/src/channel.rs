//! Source channel module - where an interaction arrived from

/// Channel through which an interaction reached the hub
///
/// Each channel carries a different raw payload shape (call transcripts,
/// email bodies, chat logs, ticket threads) and gets its own normalization
/// rule. The set is closed; unrecognized channel strings are rejected at
/// the gateway edge rather than mapped to a catch-all.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SourceChannel {
    /// Phone call transcript
    Call,

    /// Email message
    Email,

    /// Live chat log
    Chat,

    /// Help-desk ticket thread
    Ticket,
}

impl SourceChannel {
    /// Get the channel name as a string
    pub fn as_str(&self) -> &'static str {
        match self {
            SourceChannel::Call => "call",
            SourceChannel::Email => "email",
            SourceChannel::Chat => "chat",
            SourceChannel::Ticket => "ticket",
        }
    }

    /// Parse a channel from a string (internal use)
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "call" => Some(SourceChannel::Call),
            "email" => Some(SourceChannel::Email),
            "chat" => Some(SourceChannel::Chat),
            "ticket" => Some(SourceChannel::Ticket),
            _ => None,
        }
    }
}

impl std::str::FromStr for SourceChannel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| format!("Invalid source channel: {}", s))
    }
}

impl std::fmt::Display for SourceChannel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
