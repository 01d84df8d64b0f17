use std::time::Duration;

use reqwest::Client;
use serde_json::Value;

use crate::{Error, Result};

/// Sends a chat completion request that asks for a JSON object and returns the raw content.
///
/// Only transport and envelope problems are errors here; whether the content is usable JSON is
/// decided by the caller.
pub async fn complete(
	client: &Client,
	cfg: &scout_config::LlmProviderConfig,
	messages: &[Value],
) -> Result<String> {
	let url = format!("{}{}", cfg.api_base, cfg.path);
	let body = serde_json::json!({
		"model": cfg.model,
		"temperature": cfg.temperature,
		"messages": messages,
		"response_format": { "type": "json_object" },
	});
	let res = client
		.post(url)
		.timeout(Duration::from_millis(cfg.timeout_ms))
		.headers(crate::auth_headers(&cfg.api_key, &cfg.default_headers)?)
		.json(&body)
		.send()
		.await?;
	let json: Value = res.error_for_status()?.json().await?;

	extract_content(&json)
}

fn extract_content(json: &Value) -> Result<String> {
	json.get("choices")
		.and_then(|v| v.as_array())
		.and_then(|arr| arr.first())
		.and_then(|choice| choice.get("message"))
		.and_then(|msg| msg.get("content"))
		.and_then(|c| c.as_str())
		.map(str::to_string)
		.ok_or_else(|| Error::InvalidResponse {
			message: "Reasoning response is missing message content.".to_string(),
		})
}

/// Pulls the outermost JSON object out of model text, tolerating code fences and chatter.
pub fn strip_to_json_object(content: &str) -> Option<&str> {
	let start = content.find('{')?;
	let end = content.rfind('}')?;

	(end > start).then(|| &content[start..=end])
}
