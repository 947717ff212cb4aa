use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use studymate_answer::{compose, Backend, BackendSelection, BackendSet, ExtractiveBackend};
use studymate_core::types::AnswerKind;
use studymate_core::Error;

struct Fixed {
    label: &'static str,
    reply: Result<&'static str, &'static str>,
    delay: Duration,
}

impl Fixed {
    fn ok(label: &'static str, text: &'static str) -> Arc<dyn Backend> {
        Arc::new(Self { label, reply: Ok(text), delay: Duration::ZERO })
    }

    fn err(label: &'static str, detail: &'static str) -> Arc<dyn Backend> {
        Arc::new(Self { label, reply: Err(detail), delay: Duration::ZERO })
    }

    fn slow(label: &'static str, text: &'static str, delay: Duration) -> Arc<dyn Backend> {
        Arc::new(Self { label, reply: Ok(text), delay })
    }
}

#[async_trait]
impl Backend for Fixed {
    fn label(&self) -> &str { self.label }

    async fn answer(&self, _question: &str, _context: &str) -> anyhow::Result<String> {
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        self.reply.map(str::to_string).map_err(|e| anyhow::anyhow!(e))
    }
}

struct Panics;

#[async_trait]
impl Backend for Panics {
    fn label(&self) -> &str { "Panics" }

    async fn answer(&self, _question: &str, _context: &str) -> anyhow::Result<String> {
        panic!("backend blew up")
    }
}

const WAIT: Duration = Duration::from_secs(5);

#[tokio::test]
async fn single_success_is_returned_verbatim() {
    let backends = vec![Fixed::err("OpenAI", "401 unauthorized"), Fixed::ok("Gemini", "Photosynthesis makes sugar.")];
    let answer = compose("What is photosynthesis?", "ctx", &backends, WAIT).await.expect("answer");
    assert_eq!(answer.text, "Photosynthesis makes sugar.");
    assert_eq!(answer.kind, AnswerKind::Single);
    assert_eq!(answer.contributors, vec!["Gemini"]);
    assert_eq!(answer.responses.len(), 2);
    assert!(!answer.responses[0].success);
    assert_eq!(answer.responses[0].error.as_deref(), Some("401 unauthorized"));
}

#[tokio::test]
async fn multiple_successes_are_combined_in_invocation_order() {
    let backends = vec![Fixed::ok("OpenAI", "First view."), Fixed::err("Gemini", "quota"), Fixed::ok("Fast AI", "Second view.")];
    let answer = compose("Explain osmosis", "ctx", &backends, WAIT).await.expect("answer");
    assert_eq!(answer.kind, AnswerKind::Combined);
    assert_eq!(answer.contributors, vec!["OpenAI", "Fast AI"]);
    assert_eq!(
        answer.text,
        "**Comprehensive Answer (Combined from OpenAI, Fast AI):**\n\n\
         **OpenAI Insights:**\nFirst view.\n\n\
         **Fast AI Insights:**\nSecond view.\n\n"
    );
}

#[tokio::test]
async fn all_failures_are_reported_together() {
    let backends = vec![Fixed::err("OpenAI", "no key"), Fixed::ok("Gemini", "   ")];
    let err = compose("Explain osmosis", "ctx", &backends, WAIT).await.unwrap_err();
    match err {
        Error::AllBackendsFailed { failures } => {
            assert_eq!(failures.len(), 2);
            assert!(matches!(&failures[0], Error::Backend { label, detail } if label == "OpenAI" && detail == "no key"));
            assert!(matches!(&failures[1], Error::Backend { label, detail } if label == "Gemini" && detail == "empty response"));
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn timeout_and_panic_are_isolated() {
    let backends: Vec<Arc<dyn Backend>> = vec![
        Fixed::slow("Slow", "too late", Duration::from_secs(30)),
        Arc::new(Panics),
        Fixed::ok("Fast AI", "On time."),
    ];
    let answer = compose("Explain osmosis", "ctx", &backends, Duration::from_millis(100)).await.expect("answer");
    assert_eq!(answer.text, "On time.");
    let slow = &answer.responses[0];
    assert!(!slow.success);
    assert!(slow.error.as_deref().unwrap_or("").contains("timed out"));
    assert!(!answer.responses[1].success);
    assert!(answer.responses[2].success);
}

#[tokio::test]
async fn backends_run_concurrently() {
    let delay = Duration::from_millis(300);
    let backends = vec![Fixed::slow("A", "a", delay), Fixed::slow("B", "b", delay), Fixed::slow("C", "c", delay)];
    let started = Instant::now();
    let answer = compose("Explain osmosis", "ctx", &backends, WAIT).await.expect("answer");
    assert_eq!(answer.contributors.len(), 3);
    assert!(started.elapsed() < Duration::from_millis(800), "took {:?}", started.elapsed());
}

#[tokio::test]
async fn blank_question_and_empty_selection_are_rejected() {
    let backends = vec![Fixed::ok("A", "a")];
    assert!(matches!(compose("  ", "ctx", &backends, WAIT).await, Err(Error::EmptyQuestion)));
    assert!(matches!(compose("Why?", "ctx", &[], WAIT).await, Err(Error::NoBackendsSelected)));
}

#[test]
fn selection_matches_labels_case_insensitively() {
    let set = BackendSet::new(WAIT)
        .with(Fixed::ok("OpenAI", "a"))
        .with(Fixed::ok("Gemini", "b"))
        .with(Arc::new(ExtractiveBackend::default()));
    assert_eq!(set.labels(), vec!["OpenAI", "Gemini", "Fast AI"]);

    let all = set.select(&BackendSelection::All).expect("all");
    assert_eq!(all.len(), 3);

    let some = set.select(&BackendSelection::only(["fast ai", "openai", "Claude"])).expect("some");
    let labels: Vec<&str> = some.iter().map(|b| b.label()).collect();
    assert_eq!(labels, vec!["OpenAI", "Fast AI"]);

    assert!(matches!(set.select(&BackendSelection::only(["Claude"])), Err(Error::NoBackendsSelected)));
}

#[test]
fn settings_without_keys_yield_only_local_backend() {
    let settings = studymate_core::config::BackendSettings::default();
    let set = BackendSet::from_settings(&settings, Default::default(), None, 3).expect("set");
    assert_eq!(set.labels(), vec!["Fast AI"]);
    assert_eq!(set.timeout(), Duration::from_secs(30));
}

#[test]
fn settings_with_keys_configure_remote_backends() {
    let mut settings = studymate_core::config::BackendSettings::default();
    settings.openai.api_key = Some("sk-test".into());
    settings.gemini.api_key = Some("   ".into());
    let set = BackendSet::from_settings(&settings, Default::default(), None, 3).expect("set");
    assert_eq!(set.labels(), vec!["OpenAI", "Fast AI"]);
}
