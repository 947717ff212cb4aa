//! Concurrent multi-backend composition.

use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;
use studymate_core::types::{AnswerKind, BackendResponse, ComposedAnswer};
use studymate_core::{Error, Result};
use tracing::{info, warn};

use crate::backend::Backend;

/// Ask every backend concurrently and merge what comes back.
///
/// Each call runs in its own task under `timeout`; a panic, error, timeout
/// or blank reply becomes a failed [`BackendResponse`] without touching the
/// other calls. One success is returned verbatim; several are joined as
/// labeled sections in invocation order.
pub async fn compose(
    question: &str,
    context: &str,
    backends: &[Arc<dyn Backend>],
    timeout: Duration,
) -> Result<ComposedAnswer> {
    if question.trim().is_empty() {
        return Err(Error::EmptyQuestion);
    }
    if backends.is_empty() {
        return Err(Error::NoBackendsSelected);
    }

    let calls = backends.iter().map(|backend| {
        let backend = Arc::clone(backend);
        let label = backend.label().to_string();
        let question = question.to_string();
        let context = context.to_string();
        let task = tokio::spawn(async move {
            tokio::time::timeout(timeout, backend.answer(&question, &context)).await
        });
        async move {
            match task.await {
                Ok(Ok(Ok(text))) if !text.trim().is_empty() => BackendResponse::ok(label, text),
                Ok(Ok(Ok(_))) => BackendResponse::failed(label, "empty response"),
                Ok(Ok(Err(e))) => BackendResponse::failed(label, format!("{e:#}")),
                Ok(Err(_)) => BackendResponse::failed(label, format!("timed out after {}s", timeout.as_secs())),
                Err(e) => BackendResponse::failed(label, format!("task failed: {e}")),
            }
        }
    });
    let responses = join_all(calls).await;

    for r in responses.iter().filter(|r| !r.success) {
        warn!(backend = %r.model_label, error = r.error.as_deref().unwrap_or(""), "backend failed");
    }
    let successes: Vec<&BackendResponse> = responses.iter().filter(|r| r.success).collect();
    info!(requested = responses.len(), succeeded = successes.len(), "backends settled");

    match successes.as_slice() {
        [] => Err(Error::AllBackendsFailed {
            failures: responses
                .iter()
                .map(|r| Error::backend(&r.model_label, r.error.as_deref().unwrap_or_default()))
                .collect(),
        }),
        [only] => {
            let (text, contributors) = (only.text.clone(), vec![only.model_label.clone()]);
            Ok(ComposedAnswer { text, kind: AnswerKind::Single, contributors, responses })
        }
        many => {
            let contributors: Vec<String> = many.iter().map(|r| r.model_label.clone()).collect();
            let mut text = format!("**Comprehensive Answer (Combined from {}):**\n\n", contributors.join(", "));
            for r in many {
                text.push_str(&format!("**{} Insights:**\n{}\n\n", r.model_label, r.text));
            }
            Ok(ComposedAnswer { text, kind: AnswerKind::Combined, contributors, responses })
        }
    }
}
