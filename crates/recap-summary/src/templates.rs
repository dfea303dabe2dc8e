//! Built-in prompt text for the summarizer.

pub const CONVERSATION_PLACEHOLDER: &str = "<conversation>";
pub const SCHEMA_PLACEHOLDER: &str = "<output_schema>";

pub const DEFAULT_SUMMARY_PROMPT: &str = r#"You maintain long-term memory for a conversational assistant.

Read the conversations below, oldest first. Write one consolidated summary that captures:
- what the user asked about and what was resolved
- facts the user shared about themselves, their work or their preferences
- open questions or follow-ups the assistant should remember

Do not invent details that are not present in the conversations. Keep names, numbers and dates exactly as written.

The conversations:
<conversation>

Respond with a single JSON object that follows this JSON schema. Output JSON only, without commentary:
<output_schema>
"#;

/// Fill both placeholders of `template` in one left-to-right pass.
///
/// Substituted values are never rescanned, so placeholder text inside a
/// conversation or schema is left alone. Templates missing a placeholder get
/// the value appended so the model still sees it.
pub fn render(template: &str, conversation: &str, schema: &str) -> String {
    let mut prompt = String::with_capacity(template.len() + conversation.len() + schema.len());
    let mut rest = template;
    let mut saw_conversation = false;
    let mut saw_schema = false;

    loop {
        let next = [
            (rest.find(CONVERSATION_PLACEHOLDER), CONVERSATION_PLACEHOLDER, conversation),
            (rest.find(SCHEMA_PLACEHOLDER), SCHEMA_PLACEHOLDER, schema),
        ]
        .into_iter()
        .filter_map(|(at, placeholder, value)| at.map(|at| (at, placeholder, value)))
        .min_by_key(|(at, _, _)| *at);

        let Some((at, placeholder, value)) = next else {
            prompt.push_str(rest);
            break;
        };

        prompt.push_str(&rest[..at]);
        prompt.push_str(value);
        if placeholder == CONVERSATION_PLACEHOLDER {
            saw_conversation = true;
        } else {
            saw_schema = true;
        }
        rest = &rest[at + placeholder.len()..];
    }

    if !saw_conversation {
        prompt.push_str("\n\nThe conversations:\n");
        prompt.push_str(conversation);
    }
    if !saw_schema {
        prompt.push_str("\n\nFollow this output JSON schema:\n");
        prompt.push_str(schema);
    }

    prompt
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_default_template() {
        let prompt = render(DEFAULT_SUMMARY_PROMPT, "[CONV]", "{SCHEMA}");
        assert!(prompt.contains("[CONV]"));
        assert!(prompt.contains("{SCHEMA}"));
        assert!(!prompt.contains(CONVERSATION_PLACEHOLDER));
        assert!(!prompt.contains(SCHEMA_PLACEHOLDER));
    }

    #[test]
    fn test_render_appends_missing_placeholders() {
        let prompt = render("Summarize.", "[CONV]", "{SCHEMA}");
        assert!(prompt.starts_with("Summarize."));
        assert!(prompt.find("[CONV]") < prompt.find("{SCHEMA}"));
    }

    #[test]
    fn test_placeholder_text_in_values_is_not_substituted() {
        let conversation = "what does <output_schema> mean?";
        let schema = "{\"note\": \"see <conversation>\"}";
        let prompt = render(DEFAULT_SUMMARY_PROMPT, conversation, schema);

        assert!(prompt.contains(conversation));
        assert!(prompt.contains(schema));
        assert_eq!(prompt.matches(schema).count(), 1);
        assert_eq!(prompt.matches(conversation).count(), 1);
    }

    #[test]
    fn test_repeated_placeholder_is_filled_each_time() {
        let prompt = render("<conversation>|<output_schema>|<conversation>", "C", "S");
        assert_eq!(prompt, "C|S|C");
    }
}
