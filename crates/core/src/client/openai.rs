use crate::{
    client::{HttpModelClient, malformed},
    error::CandidateError,
    provider::Provider,
    types::Payload,
};

/// OpenAI-compatible chat completions, shared by OpenAI and xAI.
pub(super) async fn chat_completion(
    client: &HttpModelClient,
    provider: Provider,
    api_key: &str,
    payload: &Payload,
    prompt: &str,
    model: &str,
) -> Result<String, CandidateError> {
    let config = provider.config();

    let request = client
        .http
        .post(config.api_url)
        .header("Authorization", format!("Bearer {}", api_key))
        .json(&serde_json::json!({
            "model": model,
            "messages": [
                {
                    "role": "system",
                    "content": prompt,
                },
                {
                    "role": "user",
                    "content": payload.user_prompt(),
                },
            ],
            "temperature": 0.3,
        }));

    let response = client.send_json(request).await?;

    // Extract content from response
    response["choices"][0]["message"]["content"]
        .as_str()
        .map(str::to_string)
        .ok_or_else(|| malformed(&response))
}
