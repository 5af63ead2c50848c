//! Chat-template prompt construction.
//!
//! The downstream model was fine-tuned on ChatML, so the delimiters and the
//! newlines between them must match byte for byte.

const IM_START: &str = "<|im_start|>";
const IM_END: &str = "<|im_end|>";

/// Build the ChatML prompt for a single system/user turn, leaving the
/// assistant turn open for the model to complete.
pub fn build_prompt(context: &str, question: &str) -> String {
    format!(
        "{IM_START}system\n{context}{IM_END}\n{IM_START}user\n{question}{IM_END}\n{IM_START}assistant"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_template_is_exact() {
        let prompt = build_prompt("You are terse.", "2+2?");
        assert_eq!(
            prompt,
            "<|im_start|>system\nYou are terse.<|im_end|>\n<|im_start|>user\n2+2?<|im_end|>\n<|im_start|>assistant"
        );
    }

    #[test]
    fn test_deterministic() {
        let a = build_prompt("ctx\nwith lines", "q?");
        let b = build_prompt("ctx\nwith lines", "q?");
        assert_eq!(a.as_bytes(), b.as_bytes());
    }

    #[test]
    fn test_empty_fields() {
        assert_eq!(
            build_prompt("", ""),
            "<|im_start|>system\n<|im_end|>\n<|im_start|>user\n<|im_end|>\n<|im_start|>assistant"
        );
    }
}
