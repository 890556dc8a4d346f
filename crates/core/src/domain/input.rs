// Job Input Model

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Input accepted by /start_job and /provide_input
///
/// Purchasers send either plain text or an object such as
/// `{"text": "..."}`. Objects without a `text` field are kept as
/// compact JSON text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum InputData {
    Text(String),
    Structured(serde_json::Value),
}

impl InputData {
    /// Flatten into the free text handed to the agent
    pub fn into_text(self) -> String {
        match self {
            InputData::Text(text) => text,
            InputData::Structured(value) => match value.get("text").and_then(|v| v.as_str()) {
                Some(text) => text.to_string(),
                None => match value {
                    serde_json::Value::String(s) => s,
                    serde_json::Value::Null => String::new(),
                    other => other.to_string(),
                },
            },
        }
    }
}

impl From<&str> for InputData {
    fn from(s: &str) -> Self {
        InputData::Text(s.to_string())
    }
}

/// Hex-encoded SHA-256 digest
///
/// Used both for the input hash registered with the payment request and
/// for the result hash submitted on completion.
pub fn input_hash(text: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(text.as_bytes());
    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_plain_text_input() {
        let input: InputData = serde_json::from_value(json!("analyze $NMKR")).unwrap();
        assert_eq!(input.into_text(), "analyze $NMKR");
    }

    #[test]
    fn test_object_with_text_field() {
        let input: InputData =
            serde_json::from_value(json!({"text": "Write a story about a robot"})).unwrap();
        assert_eq!(input.into_text(), "Write a story about a robot");
    }

    #[test]
    fn test_object_without_text_field() {
        let input: InputData = serde_json::from_value(json!({"topic": "ada"})).unwrap();
        assert_eq!(input.into_text(), r#"{"topic":"ada"}"#);
    }

    #[test]
    fn test_null_input_is_empty() {
        let input: InputData = serde_json::from_value(json!(null)).unwrap();
        assert_eq!(input.into_text(), "");
    }

    #[test]
    fn test_input_hash_known_value() {
        assert_eq!(
            input_hash("abc"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }
}
