//! Topical modes: greeting, system instruction and suggestion set per
//! category.

use agripulse_core::Turn;

use crate::conversation::SharedConversation;

/// Categories offered on the home screen.
pub const CATEGORIES: &[&str] = &[
    "FARMING",
    "WEATHER",
    "MARKET PRICES",
    "GOVT SCHEMES",
    "SOIL HEALTH",
    "CROP DISEASE",
    "LIVESTOCK",
];

/// Suggested follow-up prompts, keyed by category.
const SUGGESTIONS: &[(&str, &[&str])] = &[
    (
        "FARMING",
        &[
            "Best crops to grow this season",
            "How to prepare the field before sowing",
            "Organic farming tips for beginners",
            "How much water does wheat need?",
        ],
    ),
    (
        "WEATHER",
        &[
            "Will it rain this week?",
            "How to protect crops from frost",
            "Best time to spray pesticide based on weather",
            "Monsoon forecast for my region",
        ],
    ),
    (
        "MARKET PRICES",
        &[
            "Today's wheat price in the mandi",
            "Where can I sell onions at a good price?",
            "What is the MSP for paddy?",
            "Should I store my crop or sell now?",
        ],
    ),
    (
        "GOVT SCHEMES",
        &[
            "How to apply for PM-KISAN",
            "Crop insurance under PMFBY",
            "Subsidy for drip irrigation",
            "How to get a Kisan Credit Card",
        ],
    ),
    (
        "SOIL HEALTH",
        &[
            "How to get my soil tested",
            "How to improve soil fertility naturally",
            "Which fertilizer suits my soil?",
            "How to read a Soil Health Card",
        ],
    ),
    (
        "CROP DISEASE",
        &[
            "Yellow leaves on my paddy, what to do?",
            "How to control aphids organically",
            "Treatment for wheat rust",
            "How to prevent fungal disease in tomatoes",
        ],
    ),
];

/// Suggestion set for a mode. Lookup is case-insensitive; modes without an
/// entry have none.
pub fn suggestions_for(mode: &str) -> &'static [&'static str] {
    let mode = mode.trim();
    SUGGESTIONS
        .iter()
        .find(|(label, _)| label.eq_ignore_ascii_case(mode))
        .map(|(_, set)| *set)
        .unwrap_or(&[])
}

/// Synthesized assistant greeting for a freshly selected mode.
pub fn greeting(label: &str) -> String {
    format!(
        "Namaste! 🙏 You have selected **{}**. Ask me anything about {} and I will do my best to help.",
        label, label
    )
}

const GENERIC_INSTRUCTION: &str = "You are AgriPulse, a friendly agriculture assistant for farmers in rural India. \
Answer questions about crops, weather, soil, livestock, market prices and government schemes in simple, practical language. \
Reply in the same language the user writes in (Hindi or English). Keep answers short and use markdown lists where helpful.";

/// System instruction for a dispatch in the given mode.
pub fn system_instruction(mode: Option<&str>) -> String {
    match mode {
        Some(mode) => format!(
            "You are AgriPulse, an agriculture assistant for farmers in rural India. \
The user has chosen the {} category, so focus your answers on {}. \
Use simple, practical language and reply in the same language the user writes in (Hindi or English). \
Keep answers short and use markdown lists where helpful.",
            mode, mode
        ),
        None => GENERIC_INSTRUCTION.to_string(),
    }
}

/// Tracks the active mode of a conversation.
#[derive(Debug, Clone)]
pub struct ModeSelector {
    conversation: SharedConversation,
}

impl ModeSelector {
    pub fn new(conversation: SharedConversation) -> Self {
        Self { conversation }
    }

    /// Activate `label`: reset the transcript to a single greeting and open
    /// the chat view.
    pub fn select_mode(&self, label: &str) {
        self.conversation.set_active_mode(Some(label.to_string()));
        self.conversation
            .reset(Some(Turn::assistant(greeting(label))));
        self.conversation.set_chat_open(true);
        tracing::info!(mode = %label, "Mode selected");
    }

    /// Unset the mode and close the chat view. The transcript is left as is.
    pub fn clear_mode(&self) {
        self.conversation.set_active_mode(None);
        self.conversation.set_chat_open(false);
        tracing::debug!("Mode cleared");
    }

    pub fn active_mode(&self) -> Option<String> {
        self.conversation.active_mode()
    }

    /// Suggestions offered right after the greeting of a freshly selected
    /// mode; empty once the user has said anything.
    pub fn suggestions(&self) -> &'static [&'static str] {
        let conv = self.conversation.snapshot();
        match conv.active_mode() {
            Some(mode) if conv.len() == 1 => suggestions_for(mode),
            _ => &[],
        }
    }
}
