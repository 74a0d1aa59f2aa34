//! ============================================================================
//! Conversation State - Bounded sliding window of prior turns
//! ============================================================================
//! Pure functions over caller-owned history. The pipeline is stateless
//! between calls; the CLI session (or each HTTP request payload) persists
//! and re-supplies the window.
//!
//! Capping counts raw messages, not user/assistant pairs, so an odd cap can
//! split a pair at the eviction boundary. Kept as-is pending product intent.
//! ============================================================================

use crate::types::ConversationTurn;

/// Append the completed user/assistant exchange to the history
pub fn append(
    mut history: Vec<ConversationTurn>,
    user_turn: ConversationTurn,
    assistant_turn: ConversationTurn,
) -> Vec<ConversationTurn> {
    history.push(user_turn);
    history.push(assistant_turn);
    history
}

/// Keep only the `max_len` most recent messages, oldest evicted first
pub fn cap(mut history: Vec<ConversationTurn>, max_len: usize) -> Vec<ConversationTurn> {
    let len = history.len();
    if len > max_len {
        history.drain(0..len - max_len);
    }
    history
}
