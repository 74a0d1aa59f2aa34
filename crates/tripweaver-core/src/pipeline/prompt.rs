//! ============================================================================
//! Prompt Assembler - Final generation request
//! ============================================================================
//! Merges the system persona, the caller's conversation history verbatim,
//! and one user message carrying the truncated query, the truncated summary,
//! and the two-step reasoning/itinerary instructions. History is never
//! summarized or cut mid-turn here; windowing happens in `history::cap`.
//! ============================================================================

use crate::text::truncate;
use crate::types::{ConversationTurn, PromptMessage, Role};

/// Longest query text carried into a prompt, in characters
pub const QUERY_MAX: usize = 800;

/// Longest summary text carried into the final prompt, in characters
pub const SUMMARY_MAX: usize = 3000;

/// Exact refusal text for queries outside the travel domain.
/// The generation must return this string verbatim, nothing else.
pub const OUT_OF_DOMAIN_REFUSAL: &str = "I'm a travel assistant for Vietnam, so I can't help \
with that. Ask me about destinations, itineraries, or places to visit!";

const SYSTEM_PROMPT: &str = "You are an expert travel agent. Your goal is to create a clear, \
actionable, and LOGISTICALLY REALISTIC travel itinerary. Prioritize the user's enjoyment and \
avoid excessive travel time on short trips. The final output must be clean and user-facing.";

/// Build the full message sequence for the final generation call
pub fn build_chat_prompt(
    query: &str,
    summary: &str,
    history: &[ConversationTurn],
) -> Vec<PromptMessage> {
    let mut messages = Vec::with_capacity(history.len() + 2);
    messages.push(PromptMessage::new(Role::System, SYSTEM_PROMPT));
    messages.extend(history.iter().map(PromptMessage::from));

    let user_content = format!(
        "User query: {}\n\n\
         I have found a summary of relevant information:\n{}\n\n\
         Please follow these two steps to answer the user's query:\n\n\
         **Step 1: Reasoning & Feasibility Check (Internal Thought).** \
         First, think step-by-step (2-4 sentences). Analyze the summary and evaluate logistics. \
         If the places are in distant cities, recommend focusing on one region for short trips.\n\n\
         **Step 2: Final Itinerary (User-Facing Answer).** \
         Based ONLY on your reasoning in Step 1, create a concise 2-3 step travel itinerary. \
         Write in a friendly and helpful tone. State place names clearly. DO NOT include node \
         IDs or internal reasoning.\n\n\
         If the query is unrelated to travel in Vietnam, ignore the steps above and reply with \
         exactly this sentence and nothing else: \"{}\"",
        truncate(query, QUERY_MAX),
        truncate(summary, SUMMARY_MAX),
        OUT_OF_DOMAIN_REFUSAL
    );
    messages.push(PromptMessage::new(Role::User, user_content));

    messages
}
