use crate::{
    client::{HttpModelClient, malformed},
    error::CandidateError,
    provider::Provider,
    types::Payload,
};

const ANTHROPIC_VERSION: &str = "2023-06-01";
const MAX_TOKENS: u32 = 4096;

pub(super) async fn create_message(
    client: &HttpModelClient,
    api_key: &str,
    payload: &Payload,
    prompt: &str,
    model: &str,
) -> Result<String, CandidateError> {
    let config = Provider::Anthropic.config();

    let request = client
        .http
        .post(config.api_url)
        .header("x-api-key", api_key)
        .header("anthropic-version", ANTHROPIC_VERSION)
        .json(&serde_json::json!({
            "model": model,
            "max_tokens": MAX_TOKENS,
            "system": prompt,
            "messages": [
                {
                    "role": "user",
                    "content": payload.user_prompt(),
                },
            ],
            "temperature": 0.3,
        }));

    let response = client.send_json(request).await?;
    response_text(&response).ok_or_else(|| malformed(&response))
}

fn response_text(response: &serde_json::Value) -> Option<String> {
    let blocks = response["content"].as_array()?;
    Some(
        blocks
            .iter()
            .filter(|block| block["type"] == "text")
            .filter_map(|block| block["text"].as_str())
            .collect(),
    )
}
