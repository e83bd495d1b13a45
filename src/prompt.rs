use regex::{Captures, Regex};
use std::collections::HashMap;
use std::sync::OnceLock;

use crate::models::Sample;

/// Instruction sent with every uploaded image.
pub const IMAGE_ANALYSIS_PROMPT: &str = "\
You are an advanced AI agent capable of combining natural language processing and image recognition technology.
Your task is to recognize objects in an image, describe them, and answer questions based on the image content.
You utilize a neural encoder-decoder model with a Late Fusion encoder, enabling you to interpret both image and text inputs.

The basic workflow is:
1. Given an image (I), a question (Q), and the history of previous questions and answers (H), detect objects in the image.
2. Generate accurate, meaningful, and grammatically correct responses to the current question based on the detected objects and the conversation history.
3. Engage in meaningful dialogue about the image, answering follow-up questions based on the visual content.

Make sure to provide detailed responses when needed, especially when the user asks specific questions about the image or its objects.";

/// Template for resource usage suggestions, filled from the latest sample.
pub const SUGGESTION_TEMPLATE: &str = "\
You are a systems performance assistant.
The machine currently reports:
- CPU usage: {cpu}%
- Memory usage: {mem}%
- Disk usage: {disk}%
Explain what these readings mean and suggest concrete steps to improve performance or free up resources.";

fn placeholder() -> &'static Regex {
    static PLACEHOLDER: OnceLock<Regex> = OnceLock::new();
    PLACEHOLDER.get_or_init(|| Regex::new(r"\{([a-z_]+)\}").expect("placeholder pattern is valid"))
}

/// Replaces `{name}` placeholders with values from `vars`. Unknown
/// placeholders are left untouched.
pub fn render(template: &str, vars: &HashMap<&str, String>) -> String {
    placeholder()
        .replace_all(template, |caps: &Captures| {
            vars.get(&caps[1])
                .cloned()
                .unwrap_or_else(|| caps[0].to_string())
        })
        .into_owned()
}

pub fn suggestion_prompt(sample: &Sample) -> String {
    let vars = HashMap::from([
        ("cpu", format!("{:.1}", sample.cpu_pct)),
        ("mem", format!("{:.1}", sample.mem_pct)),
        ("disk", format!("{:.1}", sample.disk_pct)),
    ]);
    render(SUGGESTION_TEMPLATE, &vars)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_replaces_known_placeholders() {
        let vars = HashMap::from([("name", "disk".to_string())]);
        assert_eq!(render("{name} is {state}", &vars), "disk is {state}");
    }

    #[test]
    fn test_suggestion_prompt_contains_sample_values() {
        let sample = Sample {
            cpu_pct: 85.0,
            mem_pct: 50.25,
            disk_pct: 60.0,
            timestamp: 0.0,
        };
        let prompt = suggestion_prompt(&sample);
        assert!(prompt.contains("CPU usage: 85.0%"));
        assert!(prompt.contains("Memory usage: 50.2%") || prompt.contains("Memory usage: 50.3%"));
        assert!(prompt.contains("Disk usage: 60.0%"));
        assert!(!prompt.contains('{'));
    }

    #[test]
    fn test_image_prompt_describes_the_workflow() {
        assert!(IMAGE_ANALYSIS_PROMPT.starts_with("You are an advanced AI agent"));
        assert!(IMAGE_ANALYSIS_PROMPT.contains("Late Fusion encoder"));
        let steps: Vec<&str> = IMAGE_ANALYSIS_PROMPT
            .lines()
            .filter(|line| line.starts_with(|c: char| c.is_ascii_digit()))
            .collect();
        assert_eq!(steps.len(), 3);
        assert!(!IMAGE_ANALYSIS_PROMPT.contains('{'));
    }
}
