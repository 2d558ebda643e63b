//! Separates the model's reasoning segment from its final answer.

pub const THINK_OPEN: &str = "<think>";
pub const THINK_CLOSE: &str = "</think>";

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ParsedResponse {
    pub thinking: String,
    pub answer: String,
}

impl ParsedResponse {
    /// The thinking segment, or `None` when the model produced none
    pub fn thinking_opt(&self) -> Option<String> {
        if self.thinking.is_empty() {
            None
        } else {
            Some(self.thinking.clone())
        }
    }
}

/// Split a complete response on the first `<think>`/`</think>` pair.
///
/// Both markers must be present, otherwise the whole text is the answer.
/// Only the first pair counts: the thinking segment stops at the next marker of
/// either kind, and the answer stops at a second `</think>` if one exists.
pub fn split_response(text: &str) -> ParsedResponse {
    let (Some((_, after_open)), Some((_, after_close))) =
        (text.split_once(THINK_OPEN), text.split_once(THINK_CLOSE))
    else {
        return ParsedResponse {
            thinking: String::new(),
            answer: text.to_string(),
        };
    };

    let thinking = first_segment(first_segment(after_open, THINK_OPEN), THINK_CLOSE);
    let answer = first_segment(after_close, THINK_CLOSE);

    ParsedResponse {
        thinking: thinking.trim().to_string(),
        answer: answer.trim().to_string(),
    }
}

fn first_segment<'a>(text: &'a str, marker: &str) -> &'a str {
    text.split(marker).next().unwrap_or(text)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_both_markers() {
        let parsed = split_response("<think>\n  check the bounds  \n</think>\n\nUse `i < len`.\n");
        assert_eq!(parsed.thinking, "check the bounds");
        assert_eq!(parsed.answer, "Use `i < len`.");
        assert_eq!(parsed.thinking_opt().as_deref(), Some("check the bounds"));
    }

    #[test]
    fn test_no_markers() {
        let text = "  Just an answer.\n";
        let parsed = split_response(text);
        assert_eq!(parsed.thinking, "");
        assert_eq!(parsed.answer, text);
        assert_eq!(parsed.thinking_opt(), None);
    }

    #[test]
    fn test_only_one_marker_is_whole_answer() {
        let text = "<think>unterminated reasoning";
        assert_eq!(split_response(text).answer, text);

        let text = "stray </think> close";
        let parsed = split_response(text);
        assert_eq!(parsed.answer, text);
        assert!(parsed.thinking.is_empty());
    }

    #[test]
    fn test_empty_thinking() {
        let parsed = split_response("<think></think>answer");
        assert_eq!(parsed.thinking_opt(), None);
        assert_eq!(parsed.answer, "answer");
    }

    #[test]
    fn test_text_before_open_marker_is_dropped() {
        let parsed = split_response("preamble <think>reason</think> answer");
        assert_eq!(parsed.thinking, "reason");
        assert_eq!(parsed.answer, "answer");
    }

    #[test]
    fn test_repeated_pairs_use_first_only() {
        let parsed = split_response("<think>a</think> first <think>b</think> second");
        assert_eq!(parsed.thinking, "a");
        assert_eq!(parsed.answer, "first <think>b");
    }

    #[test]
    fn test_nested_open_marker_cuts_thinking() {
        let parsed = split_response("<think>outer <think>inner</think> done");
        assert_eq!(parsed.thinking, "outer");
        assert_eq!(parsed.answer, "done");
    }

    #[test]
    fn test_close_before_open() {
        let parsed = split_response("x</think>y<think>z");
        assert_eq!(parsed.thinking, "z");
        assert_eq!(parsed.answer, "y<think>z");
    }
}
