//! Prompt templates for the two LLM-backed stages. The templates
//! themselves live in `src/prompts/*.txt` and are embedded at compile time
//! so the pipeline has no runtime filesystem dependency.

const AI_ATTRIBUTION_SYSTEM: &str = include_str!("../prompts/ai_attribution_system.txt");
const AI_ATTRIBUTION_USER: &str = include_str!("../prompts/ai_attribution_user.txt");
const EMOTION_SYSTEM: &str = include_str!("../prompts/emotion_system.txt");
const EMOTION_USER: &str = include_str!("../prompts/emotion_user.txt");

pub fn ai_attribution_system_prompt() -> &'static str {
    AI_ATTRIBUTION_SYSTEM
}

pub fn ai_attribution_user_prompt(candidates: &[String], segments_block: &str) -> String {
    AI_ATTRIBUTION_USER
        .replace("{candidates}", &candidates.join(", "))
        .replace("{segments}", segments_block)
}

pub fn emotion_system_prompt() -> &'static str {
    EMOTION_SYSTEM
}

pub fn emotion_user_prompt(lines_block: &str) -> String {
    EMOTION_USER.replace("{lines}", lines_block)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn templates_substitute_placeholders() {
        let user = ai_attribution_user_prompt(&["Elena".to_string(), "Marcus".to_string()], "1: ...");
        assert!(user.contains("Elena, Marcus"));
        assert!(user.contains("1: ..."));

        let emotion = emotion_user_prompt("1: hi");
        assert!(emotion.contains("1: hi"));
    }
}
