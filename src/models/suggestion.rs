use serde::Serialize;

/// One prompt/response pair from the suggestions action.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SuggestionRecord {
    pub prompt_text: String,
    pub response_text: String,
}

/// Latest image chatbot result.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ImageAnalysis {
    pub analysis: String,
    pub answer: Option<String>,
}
