//! Prompt templates rendered into the string payload sent to a backend.
//!
//! Pure formatting: no state and no error conditions.

use crate::types::{ConversationHistory, Turn};

/// Instruction for the fixed-field image analysis. Sent verbatim.
pub const ANALYSIS_PROMPT: &str = "Analyze this image and provide a detailed description of:
1. If a person is present, identify:
   - Age range (e.g., \"Age: 18-25 years\")
   - Gender (\"Male\" or \"Female\")
   - Clothing type, color, and accessories
2. Describe the surrounding environment (indoor/outdoor, objects, time of day if possible)

Respond in this format:
Age: XX-XX years
Gender: Male/Female
Clothing: [description]
Environment: [description]";

const IMAGE_CHAT_PREAMBLE: &str = "You are an AI assistant that can analyze images. \
The user has uploaded an image and is asking you questions about it.
Provide helpful, accurate, and detailed responses about what you can see in the image.
If the user asks about something not visible in the image, politely let them know.";

/// Prompt for the local text chat: the whole history as `You:`/`Bot:` lines,
/// then the new message awaiting a bot continuation.
pub fn local_chat_prompt(history: &[Turn], message: &str) -> String {
    let mut prompt = String::new();
    for turn in history {
        prompt.push_str(&format!("You: {}\nBot: {}\n", turn.user, turn.bot));
    }
    prompt.push_str(&format!("You: {}\nBot:", message));
    prompt
}

/// Prompt for the cloud text chat: only the trailing `window` turns as
/// `Human:`/`Assistant:` lines, bounding the prompt size.
pub fn cloud_chat_prompt(history: &ConversationHistory, message: &str, window: usize) -> String {
    let mut prompt = String::new();
    for turn in history.window(window) {
        prompt.push_str(&format!("Human: {}\nAssistant: {}\n", turn.user, turn.bot));
    }
    prompt.push_str(&format!("Human: {}\nAssistant:", message));
    prompt
}

/// Prompt for a free-form question about an uploaded image.
pub fn image_chat_prompt(question: &str) -> String {
    format!("{}\n\nUser question: {}", IMAGE_CHAT_PREAMBLE, question)
}
