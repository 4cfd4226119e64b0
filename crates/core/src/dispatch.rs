//! Ordered model fallback.
//!
//! Candidates are tried strictly in rank order, each at most once per dispatch.
//! The first usable response wins; otherwise every attempt is reported back.

use std::sync::Arc;

use tracing::{info, warn};

use crate::{
    client::ModelClient,
    error::{CandidateError, CandidateErrorKind, CandidateFailure},
    types::{CandidateList, DispatchResult, Payload},
};

/// Responses shorter than this (after trimming) are treated as empty.
pub const DEFAULT_MIN_RESPONSE_CHARS: usize = 10;

pub struct Dispatcher {
    client: Arc<dyn ModelClient>,
    min_response_chars: usize,
}

impl Dispatcher {
    pub fn new(client: Arc<dyn ModelClient>) -> Self {
        Self {
            client,
            min_response_chars: DEFAULT_MIN_RESPONSE_CHARS,
        }
    }

    pub fn with_min_response_chars(mut self, min_response_chars: usize) -> Self {
        self.min_response_chars = min_response_chars.max(1);
        self
    }

    pub async fn dispatch(
        &self,
        payload: &Payload,
        prompt: &str,
        candidates: &CandidateList,
    ) -> DispatchResult {
        let mut attempts = Vec::with_capacity(candidates.len());

        for candidate in candidates.iter() {
            info!(model = %candidate.model, rank = candidate.rank, "trying model");

            let outcome = self
                .client
                .call(payload, prompt, &candidate.model)
                .await
                .and_then(|response| self.check_response(response));

            match outcome {
                Ok(response) => {
                    info!(model = %candidate.model, rank = candidate.rank, "model answered");
                    return DispatchResult::Success {
                        model_used: candidate.model.clone(),
                        response,
                    };
                }
                Err(e) => {
                    warn!(
                        model = %candidate.model,
                        rank = candidate.rank,
                        kind = %e.kind,
                        "model failed: {}",
                        e.message
                    );
                    attempts.push(CandidateFailure {
                        model: candidate.model.clone(),
                        kind: e.kind,
                        message: e.message,
                    });
                }
            }
        }

        DispatchResult::Failure { attempts }
    }

    fn check_response(&self, response: String) -> Result<String, CandidateError> {
        let len = response.trim().chars().count();
        if len < self.min_response_chars {
            return Err(CandidateError::new(
                CandidateErrorKind::EmptyResponse,
                format!("response had {} characters", len),
            ));
        }
        Ok(response)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use async_trait::async_trait;

    use super::*;

    /// Answers from a fixed script keyed by model name and records call order.
    struct Scripted {
        script: Vec<(&'static str, Result<&'static str, CandidateErrorKind>)>,
        calls: Mutex<Vec<String>>,
    }

    impl Scripted {
        fn new(script: Vec<(&'static str, Result<&'static str, CandidateErrorKind>)>) -> Arc<Self> {
            Arc::new(Self {
                script,
                calls: Mutex::new(Vec::new()),
            })
        }

        fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl ModelClient for Scripted {
        async fn call(
            &self,
            _payload: &Payload,
            _prompt: &str,
            model: &str,
        ) -> Result<String, CandidateError> {
            self.calls.lock().unwrap().push(model.to_string());
            match self.script.iter().find(|(m, _)| *m == model) {
                Some((_, Ok(text))) => Ok(text.to_string()),
                Some((_, Err(kind))) => Err(CandidateError::new(*kind, "scripted failure")),
                None => Err(CandidateError::new(CandidateErrorKind::Unsupported, "unscripted")),
            }
        }
    }

    fn payload() -> Payload {
        Payload::Transcript {
            video_name: "clip".to_string(),
            text: "hello".to_string(),
        }
    }

    fn candidates(models: &[&str]) -> CandidateList {
        let fallbacks: Vec<String> = models[1..].iter().map(|m| m.to_string()).collect();
        CandidateList::new(models[0], &fallbacks).unwrap()
    }

    #[tokio::test]
    async fn primary_success_short_circuits() {
        let client = Scripted::new(vec![
            ("a", Ok("a perfectly fine brief")),
            ("b", Ok("should never be asked")),
        ]);
        let dispatcher = Dispatcher::new(client.clone());

        let result = dispatcher
            .dispatch(&payload(), "prompt", &candidates(&["a", "b"]))
            .await;

        match result {
            DispatchResult::Success {
                model_used,
                response,
            } => {
                assert_eq!(model_used, "a");
                assert_eq!(response, "a perfectly fine brief");
            }
            DispatchResult::Failure { .. } => panic!("expected success"),
        }
        assert_eq!(client.calls(), vec!["a"]);
    }

    #[tokio::test]
    async fn stops_at_first_success_after_failures() {
        let client = Scripted::new(vec![
            ("a", Err(CandidateErrorKind::Auth)),
            ("b", Err(CandidateErrorKind::Quota)),
            ("c", Ok("the brief from c")),
            ("d", Ok("the brief from d")),
        ]);
        let dispatcher = Dispatcher::new(client.clone());

        let result = dispatcher
            .dispatch(&payload(), "prompt", &candidates(&["a", "b", "c", "d"]))
            .await;

        assert!(matches!(
            result,
            DispatchResult::Success { ref model_used, .. } if model_used == "c"
        ));
        assert_eq!(client.calls(), vec!["a", "b", "c"]);
    }

    #[tokio::test]
    async fn exhaustion_reports_every_candidate_in_order() {
        let client = Scripted::new(vec![
            ("a", Err(CandidateErrorKind::Network)),
            ("b", Err(CandidateErrorKind::Api(500))),
            ("c", Err(CandidateErrorKind::MalformedResponse)),
        ]);
        let dispatcher = Dispatcher::new(client.clone());

        let result = dispatcher
            .dispatch(&payload(), "prompt", &candidates(&["a", "b", "c"]))
            .await;

        let DispatchResult::Failure { attempts } = result else {
            panic!("expected failure");
        };
        let summary: Vec<_> = attempts.iter().map(|a| (a.model.as_str(), a.kind)).collect();
        assert_eq!(
            summary,
            vec![
                ("a", CandidateErrorKind::Network),
                ("b", CandidateErrorKind::Api(500)),
                ("c", CandidateErrorKind::MalformedResponse),
            ]
        );
        assert_eq!(client.calls(), vec!["a", "b", "c"]);
    }

    #[tokio::test]
    async fn short_responses_fall_through() {
        let client = Scripted::new(vec![("a", Ok("   ok  ")), ("b", Ok("a usable brief body"))]);
        let dispatcher = Dispatcher::new(client.clone());

        let result = dispatcher
            .dispatch(&payload(), "prompt", &candidates(&["a", "b"]))
            .await;

        assert!(matches!(
            result,
            DispatchResult::Success { ref model_used, .. } if model_used == "b"
        ));
    }

    #[tokio::test]
    async fn whitespace_only_is_empty_even_with_threshold_one() {
        let client = Scripted::new(vec![("a", Ok(" \n\t "))]);
        let dispatcher = Dispatcher::new(client).with_min_response_chars(0);

        let result = dispatcher
            .dispatch(&payload(), "prompt", &candidates(&["a"]))
            .await;

        let DispatchResult::Failure { attempts } = result else {
            panic!("expected failure");
        };
        assert_eq!(attempts[0].kind, CandidateErrorKind::EmptyResponse);
    }
}
