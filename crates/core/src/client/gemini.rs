use base64::Engine;
use tokio::fs;

use crate::{
    client::{HttpModelClient, malformed},
    error::{CandidateError, CandidateErrorKind},
    provider::Provider,
    types::Payload,
};

/// Largest video sent inline in a `generateContent` request.
const MAX_INLINE_BYTES: u64 = 20 * 1024 * 1024;

pub(super) async fn generate(
    client: &HttpModelClient,
    api_key: &str,
    payload: &Payload,
    prompt: &str,
    model: &str,
) -> Result<String, CandidateError> {
    let config = Provider::Gemini.config();

    let mut parts = vec![serde_json::json!({ "text": payload.user_prompt() })];
    if let Payload::Video { path, mime_type } = payload {
        let size = fs::metadata(path)
            .await
            .map_err(|e| unreadable_video(path, e))?
            .len();
        if size > MAX_INLINE_BYTES {
            return Err(CandidateError::new(
                CandidateErrorKind::Unsupported,
                format!(
                    "video is {} MiB, inline limit is {} MiB",
                    size / (1024 * 1024),
                    MAX_INLINE_BYTES / (1024 * 1024)
                ),
            ));
        }

        let bytes = fs::read(path).await.map_err(|e| unreadable_video(path, e))?;
        parts.push(serde_json::json!({
            "inlineData": {
                "mimeType": mime_type,
                "data": base64::engine::general_purpose::STANDARD.encode(bytes),
            }
        }));
    }

    let request = client
        .http
        .post(format!("{}/{}:generateContent", config.api_url, model))
        .header("x-goog-api-key", api_key)
        .json(&serde_json::json!({
            "systemInstruction": { "parts": [{ "text": prompt }] },
            "contents": [{ "role": "user", "parts": parts }],
            "generationConfig": { "temperature": 0.3 },
        }));

    let response = client.send_json(request).await?;
    response_text(&response).ok_or_else(|| malformed(&response))
}

fn unreadable_video(path: &std::path::Path, e: std::io::Error) -> CandidateError {
    CandidateError::new(
        CandidateErrorKind::Unsupported,
        format!("cannot read {}: {}", path.display(), e),
    )
}

/// Concatenate the text parts of the first candidate.
fn response_text(response: &serde_json::Value) -> Option<String> {
    let parts = response["candidates"][0]["content"]["parts"].as_array()?;
    let text: String = parts
        .iter()
        .filter_map(|part| part["text"].as_str())
        .collect();
    Some(text)
}
