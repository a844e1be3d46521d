//! Generative-model client used both to name crops and to estimate nutrition.

use std::io::Cursor;
use std::time::Duration;

use base64::{engine::general_purpose::STANDARD as B64, Engine as _};
use image::{ImageFormat, RgbImage};
use log::debug;
use serde_json::{json, Map, Value};
use url::Url;

use super::{Nutrition, NutritionLookup};
use crate::classify::Classifier;
use crate::error::PlatescanError;

const SERVICE: &str = "Gemini";

const RECOGNIZE_PROMPT: &str = "Identify the food item in this image. Be specific. \
Reply with the name of the item only (for example 'paneer butter masala', 'rice', \
'chapati', 'green salad').";

/// Connection settings for [`GeminiClient`].
#[derive(Clone, Debug)]
pub struct GeminiConfig {
    pub api_key: String,
    pub base_url: String,
    pub model: String,
    pub timeout: Duration,
}

impl Default for GeminiConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            base_url: "https://generativelanguage.googleapis.com/v1beta".to_string(),
            model: "gemini-2.0-flash-lite".to_string(),
            timeout: Duration::from_secs(30),
        }
    }
}

pub struct GeminiClient {
    config: GeminiConfig,
    agent: ureq::Agent,
}

impl GeminiClient {
    pub fn new(config: GeminiConfig) -> Self {
        let agent_config = ureq::Agent::config_builder()
            .timeout_global(Some(config.timeout))
            .build();
        let agent: ureq::Agent = agent_config.into();
        Self { config, agent }
    }

    fn endpoint(&self) -> Result<Url, PlatescanError> {
        let mut url = Url::parse(&format!(
            "{}/models/{}:generateContent",
            self.config.base_url.trim_end_matches('/'),
            self.config.model
        ))
        .map_err(|source| PlatescanError::InvalidConfig {
            message: format!("invalid Gemini base URL: {source}"),
        })?;
        url.query_pairs_mut().append_pair("key", &self.config.api_key);
        Ok(url)
    }

    /// Sends one user turn and returns the concatenated reply text.
    fn generate(&self, parts: Vec<Value>) -> Result<String, PlatescanError> {
        let url = self.endpoint()?;
        let body = json!({ "contents": [{ "parts": parts }] });

        let mut response = self
            .agent
            .post(url.as_str())
            .send_json(&body)
            .map_err(|source| PlatescanError::Http {
                service: SERVICE,
                message: source.to_string(),
            })?;
        let reply: Value =
            response
                .body_mut()
                .read_json()
                .map_err(|source| PlatescanError::ApiResponse {
                    service: SERVICE,
                    message: source.to_string(),
                })?;

        reply_text(&reply).ok_or_else(|| PlatescanError::ApiResponse {
            service: SERVICE,
            message: "reply contains no text".to_string(),
        })
    }
}

impl Classifier for GeminiClient {
    fn classify(&self, crop: &RgbImage) -> Result<String, PlatescanError> {
        let mut jpeg = Cursor::new(Vec::new());
        crop.write_to(&mut jpeg, ImageFormat::Jpeg)
            .map_err(|source| PlatescanError::ImageEncode {
                path: "<memory>".into(),
                source,
            })?;

        let text = self.generate(vec![
            json!({ "text": RECOGNIZE_PROMPT }),
            json!({ "inline_data": {
                "mime_type": "image/jpeg",
                "data": B64.encode(jpeg.into_inner()),
            }}),
        ])?;

        let label = text.trim().trim_matches(|c| c == '\'' || c == '"').trim();
        if label.is_empty() {
            return Err(PlatescanError::ApiResponse {
                service: SERVICE,
                message: "empty label".to_string(),
            });
        }
        debug!("Gemini named crop '{}'", label);
        Ok(label.to_string())
    }
}

impl NutritionLookup for GeminiClient {
    fn lookup(&self, food: &str) -> Result<Option<Nutrition>, PlatescanError> {
        let prompt = format!(
            "Give me the nutritional value of {food} per 100 grams. \
             Respond ONLY with valid JSON: \
             {{\"calories\": num, \"protein\": num, \"carbs\": num, \"fat\": num}}"
        );
        let text = self.generate(vec![json!({ "text": prompt })])?;

        let Some(object) = extract_json_object(&text) else {
            debug!("no JSON object in Gemini reply for '{}'", food);
            return Ok(None);
        };
        match serde_json::from_str::<Map<String, Value>>(object) {
            Ok(map) => Ok(Some(numeric_entries(map))),
            Err(err) => {
                debug!("unparseable nutrition JSON for '{}': {}", food, err);
                Ok(None)
            }
        }
    }
}

/// Joins the text parts of the first candidate.
fn reply_text(reply: &Value) -> Option<String> {
    let parts = reply
        .get("candidates")?
        .get(0)?
        .get("content")?
        .get("parts")?
        .as_array()?;
    let text: String = parts
        .iter()
        .filter_map(|p| p.get("text").and_then(Value::as_str))
        .collect();
    (!text.is_empty()).then_some(text)
}

/// The first `{ ... }` span in `text`, ending at the first closing brace.
pub fn extract_json_object(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let len = text[start..].find('}')?;
    Some(&text[start..=start + len])
}

/// Keeps numeric values, accepting numbers sent as strings.
fn numeric_entries(map: Map<String, Value>) -> Nutrition {
    map.into_iter()
        .filter_map(|(key, value)| {
            let number = match &value {
                Value::Number(n) => n.as_f64(),
                Value::String(s) => s.trim().parse::<f64>().ok(),
                _ => None,
            };
            number.map(|n| (key, n))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_first_object_from_fenced_reply() {
        let text = "```json\n{\"calories\": 130, \"protein\": 2.7}\n```";
        assert_eq!(
            extract_json_object(text),
            Some("{\"calories\": 130, \"protein\": 2.7}")
        );
    }

    #[test]
    fn extraction_stops_at_first_closing_brace() {
        assert_eq!(extract_json_object("a {x} b {y}"), Some("{x}"));
        assert_eq!(extract_json_object("no braces"), None);
        assert_eq!(extract_json_object("} {"), None);
    }

    #[test]
    fn reply_text_joins_parts() {
        let reply = json!({
            "candidates": [{"content": {"parts": [{"text": "green "}, {"text": "salad"}]}}]
        });
        assert_eq!(reply_text(&reply).as_deref(), Some("green salad"));
        assert_eq!(reply_text(&json!({"candidates": []})), None);
    }

    #[test]
    fn numeric_entries_skip_non_numbers() {
        let map: Map<String, Value> = serde_json::from_str(
            r#"{"calories": 130, "protein": "2.7", "fat": null, "note": "approx"}"#,
        )
        .unwrap();
        let nutrition = numeric_entries(map);
        assert_eq!(nutrition.len(), 2);
        assert_eq!(nutrition["protein"], 2.7);
    }

    #[test]
    fn endpoint_includes_model_and_key() {
        let client = GeminiClient::new(GeminiConfig {
            api_key: "abc".to_string(),
            ..Default::default()
        });
        let url = client.endpoint().unwrap();
        assert!(url
            .path()
            .ends_with("/models/gemini-2.0-flash-lite:generateContent"));
        assert_eq!(url.query(), Some("key=abc"));
    }
}
