use crate::llm::{ChatMessage, ChatRequest};

pub const SYSTEM_PROMPT: &str = "\
You are a Semitic linguistics assistant for a beginner Hebrew learner.

CRITICAL RULES:
1. The input is ONE modern Hebrew word.
2. Identify its root and core meaning.
3. Provide a short classical Hebrew example with reference.
4. Provide Arabic cognate if it exists, otherwise write exactly: Arabic cognate root = none
5. If Arabic cognate exists:
   - Give EXACTLY 3 Arabic examples
   - Each with precise English gloss
6. Use simple Latin transliteration (no diacritics).
7. Do NOT guess roots. If unsure, say root unknown.
8. Do NOT list derived words in the main text.

Derived words must:
- Be ONLY modern, common Hebrew
- Exactly 2 to 4 items
- Each has: Hebrew - transliteration - one or two English meanings
- No archaic or biblical forms
";

/// Marker the model is asked to put in front of the derived-words JSON array.
pub const DERIVED_MARKER: &str = "DERIVED_JSON:";

pub fn user_prompt(word: &str) -> String {
    format!(
        "\
Word: {word}

Return:

MAIN TEXT in this format:

[Hebrew word] root = [Hebrew root (K-W-N)] core meaning = \"...\"
classical Hebrew text example: ... (as in ...)

Arabic cognate root [Arabic root (K-W-N)] = \"...\"
Arabic examples:
* gloss: Arabic (translit)
* gloss: Arabic (translit)
* gloss: Arabic (translit)

OR if none:
Arabic cognate root = none

Then output ONLY this JSON block:

{DERIVED_MARKER}
[
  {{
    \"hebrew\": \"...\",
    \"translit\": \"...\",
    \"english\": \"...\"
  }}
]
"
    )
}

pub fn explanation_request(model: &str, temperature: f32, word: &str) -> ChatRequest {
    ChatRequest {
        model: model.to_owned(),
        messages: vec![ChatMessage::system(SYSTEM_PROMPT), ChatMessage::user(user_prompt(word))],
        temperature,
    }
}

#[cfg(test)]
mod tests {
    use super::{explanation_request, user_prompt, DERIVED_MARKER};

    #[test]
    fn user_prompt_names_the_word_and_the_marker() {
        let prompt = user_prompt("מכין");
        assert!(prompt.starts_with("Word: מכין\n"));
        assert!(prompt.contains(DERIVED_MARKER));
        assert!(prompt.contains("\"hebrew\": \"...\""));
    }

    #[test]
    fn request_has_system_then_user_message() {
        let request = explanation_request("deepseek-chat", 0.2, "שלום");
        let roles: Vec<&str> = request.messages.iter().map(|m| m.role.as_str()).collect();
        assert_eq!(roles, vec!["system", "user"]);
        assert_eq!(request.model, "deepseek-chat");
    }
}
