use async_trait::async_trait;

use crate::{
    domain::{ChatId, MessageRef},
    Result,
};

/// Capabilities / limits of a messenger implementation.
#[derive(Clone, Copy, Debug)]
pub struct MessagingCapabilities {
    pub max_message_len: usize,
}

/// Outbound side of the chat transport.
#[async_trait]
pub trait MessagingPort: Send + Sync {
    fn capabilities(&self) -> MessagingCapabilities;

    /// Send plain text. Returns the last message sent when the text had to be split.
    async fn send_text(&self, chat_id: ChatId, text: &str) -> Result<MessageRef>;
}

/// Split `text` into chunks of at most `limit` bytes, preferring line breaks.
///
/// Blank chunks are dropped, so empty or whitespace-only text yields nothing.
pub fn split_text_chunks(text: &str, limit: usize) -> Vec<String> {
    let limit = limit.max(1);
    if text.trim().is_empty() {
        return Vec::new();
    }
    if text.len() <= limit {
        return vec![text.to_string()];
    }

    let mut out = Vec::new();
    let mut rest = text;
    while rest.len() > limit {
        let mut cut = limit;
        while !rest.is_char_boundary(cut) {
            cut -= 1;
        }
        if cut == 0 {
            // A single char wider than `limit`; emit it whole.
            cut = rest.chars().next().map(char::len_utf8).unwrap_or(rest.len());
        }
        if let Some(nl) = rest[..cut].rfind('\n') {
            if nl > 0 {
                cut = nl;
            }
        }
        if !rest[..cut].trim().is_empty() {
            out.push(rest[..cut].to_string());
        }
        rest = rest[cut..].strip_prefix('\n').unwrap_or(&rest[cut..]);
    }
    if !rest.trim().is_empty() {
        out.push(rest.to_string());
    }
    out
}
