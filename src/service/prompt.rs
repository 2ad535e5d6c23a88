use crate::models::chat::Message;

const ASSISTANT_CUE: &str = "Assistant:";

/// Renders the whole transcript as `Role: text` lines followed by an
/// `Assistant:` cue for the model to continue from.
pub fn render_prompt(messages: &[Message]) -> String {
    let mut prompt = String::new();
    for message in messages {
        prompt.push_str(message.role.label());
        prompt.push_str(": ");
        prompt.push_str(message.text.as_deref().unwrap_or(""));
        prompt.push('\n');
    }
    prompt.push_str(ASSISTANT_CUE);
    prompt
}
