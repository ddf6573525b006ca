//! Structured-output extraction
//!
//! Models wrap JSON in prose or code fences; the object is located by its
//! outermost braces and deserialized into the requested record.

use crate::core::error::ParseError;
use serde::de::DeserializeOwned;

/// Extract JSON object from LLM response (handles surrounding text)
pub fn extract_json(response: &str) -> Result<&str, ParseError> {
    let start = response
        .find('{')
        .ok_or_else(|| ParseError::new("No JSON found in response", response))?;
    let end = response
        .rfind('}')
        .ok_or_else(|| ParseError::new("No closing brace found in response", response))?;
    if end < start {
        return Err(ParseError::new("Unbalanced braces in response", response));
    }
    Ok(&response[start..=end])
}

/// Deserialize the JSON object embedded in a response
pub fn parse_structured<T: DeserializeOwned>(response: &str) -> Result<T, ParseError> {
    let json_str = extract_json(response)?;
    serde_json::from_str(json_str)
        .map_err(|e| ParseError::new(format!("Failed to parse structured output: {}", e), response))
}
