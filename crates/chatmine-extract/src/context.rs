//! Context windows around a target message.
//!
//! A window grows outward from the target on each side until it holds at
//! least `MIN_CONTEXT_MESSAGES` messages *and* `MIN_CONTEXT_CHARS` characters,
//! or runs out of transcript. Windows feed classifier prompts and the
//! agreement deduplicator.

use chatmine_core::config::{MIN_CONTEXT_CHARS, MIN_CONTEXT_MESSAGES};
use chatmine_core::{ContextMessage, Error, MessageContext, MessageId, ParsedMessage, Result};

/// Compute the context window for `messages[target_index]`.
pub fn compute_window(messages: &[ParsedMessage], target_index: usize) -> Result<MessageContext> {
    let target = messages.get(target_index).ok_or(Error::IndexOutOfRange {
        index: target_index,
        len: messages.len(),
    })?;

    let mut before = collect_side(messages[..target_index].iter().rev());
    before.reverse();
    let after = collect_side(messages[target_index + 1..].iter());

    Ok(MessageContext {
        first_message_id: before.first().map_or(target.id, |m| m.id),
        last_message_id: after.last().map_or(target.id, |m| m.id),
        target_message_id: target.id,
        before,
        after,
    })
}

/// Walk outward, stopping once both minimums hold.
fn collect_side<'a>(walk: impl Iterator<Item = &'a ParsedMessage>) -> Vec<ContextMessage> {
    let mut side = Vec::new();
    let mut chars = 0usize;

    for msg in walk {
        if side.len() >= MIN_CONTEXT_MESSAGES && chars >= MIN_CONTEXT_CHARS {
            break;
        }
        chars += msg.content.chars().count();
        side.push(ContextMessage::from(msg));
    }

    side
}

/// True if `message_id` lies inside the window, excluding the target itself.
pub fn is_in_window(message_id: MessageId, window: &MessageContext) -> bool {
    message_id != window.target_message_id
        && window.first_message_id <= message_id
        && message_id <= window.last_message_id
}
