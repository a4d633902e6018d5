use std::collections::VecDeque;
use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use grcpilot_core::{AppResult, UserIdentity};
use grcpilot_domain::{
    AiAuditLogEntry, AiFeature, FallbackShape, IngestionTarget, InferenceFailure,
    InferenceRequest, InferenceResult, PLAIN_TEXT_INSTRUCTION, ParsedResponse, PromptContext,
    STRUCTURED_RESPONSE_INSTRUCTION,
};
use serde_json::json;
use tokio::sync::Mutex;

use super::AiAssistantService;
use crate::{
    AiAuditLogQuery, AiAuditLogRepository, AiAuditRecorder, AuditLogBridge, CurrentUserProvider,
    InferenceEndpoint, PromptDispatcher,
};

struct ScriptedEndpoint {
    replies: Mutex<VecDeque<Result<String, InferenceFailure>>>,
    models: Result<Vec<String>, InferenceFailure>,
    wire_prompts: Mutex<Vec<String>>,
}

impl ScriptedEndpoint {
    fn replying(replies: Vec<Result<String, InferenceFailure>>) -> Arc<Self> {
        Arc::new(Self {
            replies: Mutex::new(replies.into()),
            models: Ok(vec!["llama3.2:latest".to_owned()]),
            wire_prompts: Mutex::new(Vec::new()),
        })
    }

    fn with_models(models: Result<Vec<String>, InferenceFailure>) -> Arc<Self> {
        Arc::new(Self {
            replies: Mutex::new(VecDeque::new()),
            models,
            wire_prompts: Mutex::new(Vec::new()),
        })
    }
}

#[async_trait]
impl InferenceEndpoint for ScriptedEndpoint {
    async fn generate(&self, request: &InferenceRequest) -> Result<String, InferenceFailure> {
        self.wire_prompts.lock().await.push(request.wire_prompt());
        self.replies
            .lock()
            .await
            .pop_front()
            .unwrap_or_else(|| Err(InferenceFailure::Transport("no scripted reply".to_owned())))
    }

    async fn list_models(&self) -> Result<Vec<String>, InferenceFailure> {
        self.models.clone()
    }
}

#[derive(Default)]
struct TestLog {
    entries: Mutex<Vec<AiAuditLogEntry>>,
}

#[async_trait]
impl AiAuditLogRepository for TestLog {
    async fn prepend_entry(&self, entry: AiAuditLogEntry) -> AppResult<()> {
        self.entries.lock().await.insert(0, entry);
        Ok(())
    }

    async fn list_entries(&self, _query: AiAuditLogQuery) -> AppResult<Vec<AiAuditLogEntry>> {
        Ok(self.entries.lock().await.clone())
    }
}

struct TestSession(RwLock<Option<UserIdentity>>);

impl CurrentUserProvider for TestSession {
    fn current_user(&self) -> Option<UserIdentity> {
        self.0.read().ok().and_then(|user| user.clone())
    }
}

struct Harness {
    service: AiAssistantService,
    endpoint: Arc<ScriptedEndpoint>,
    log: Arc<TestLog>,
    subscription: crate::AuditSubscription,
}

impl Harness {
    fn new(endpoint: Arc<ScriptedEndpoint>, user: Option<UserIdentity>) -> Self {
        let log = Arc::new(TestLog::default());
        let session = Arc::new(TestSession(RwLock::new(user)));
        let bridge = AuditLogBridge::new();
        let subscription = bridge.subscribe(Arc::new(AiAuditRecorder::new(log.clone(), session)));
        let dispatcher = PromptDispatcher::new(endpoint.clone(), "llama3.2");

        Self {
            service: AiAssistantService::new(dispatcher, bridge),
            endpoint,
            log,
            subscription,
        }
    }

    async fn finish(self) -> Vec<AiAuditLogEntry> {
        let Self {
            service,
            log,
            subscription,
            ..
        } = self;
        drop(service);
        subscription.drained().await;
        let entries = log.entries.lock().await.clone();
        entries
    }
}

fn auditor() -> Option<UserIdentity> {
    Some(UserIdentity::new("U-42", "Morgan Lee", None))
}

fn connection_refused() -> InferenceFailure {
    InferenceFailure::EndpointUnavailable {
        endpoint: "http://localhost:11434".to_owned(),
    }
}

#[tokio::test]
async fn free_text_feature_is_cleaned_and_audited() {
    let endpoint = ScriptedEndpoint::replying(vec![Ok(
        "### INSIGHTS\n- **Vendor risk** is rising".to_owned()
    )]);
    let harness = Harness::new(endpoint, auditor());
    let context = PromptContext::new().with("risk_data", "R-12 vendor lock-in");

    let outcome = harness
        .service
        .run_feature(AiFeature::RiskInsights, &context)
        .await;
    assert_eq!(
        outcome.result,
        InferenceResult::PlainText("INSIGHTS\n• Vendor risk is rising".to_owned())
    );

    let wire_prompts = harness.endpoint.wire_prompts.lock().await.clone();
    assert_eq!(wire_prompts.len(), 1);
    assert!(wire_prompts[0].contains("R-12 vendor lock-in"));
    assert!(wire_prompts[0].ends_with(PLAIN_TEXT_INSTRUCTION));

    let entries = harness.finish().await;
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].module(), "Risk Register");
    assert_eq!(entries[0].action(), "Strategic Insights");
    assert_eq!(entries[0].user_name(), "Morgan Lee");
    assert_eq!(entries[0].model_id(), "llama3.2");
    assert_eq!(entries[0].response_text(), "INSIGHTS\n• Vendor risk is rising");
    assert!(entries[0].prompt_text().contains("R-12 vendor lock-in"));
}

#[tokio::test]
async fn structured_feature_extracts_json_and_requests_json_only() {
    let endpoint = ScriptedEndpoint::replying(vec![Ok(
        "Here you go: {\"score\": 64, \"gaps\": [\"No MFA\"], \"recommendations\": []} Thanks!"
            .to_owned(),
    )]);
    let harness = Harness::new(endpoint, auditor());
    let context = PromptContext::new()
        .with("policy_name", "Access Control")
        .with("framework", "NIST CSF");

    let outcome = harness
        .service
        .run_feature(AiFeature::PolicyGap, &context)
        .await;
    assert_eq!(
        outcome.structured(),
        Some(&ParsedResponse::Structured(json!({
            "score": 64,
            "gaps": ["No MFA"],
            "recommendations": [],
        })))
    );

    let wire_prompts = harness.endpoint.wire_prompts.lock().await.clone();
    assert!(wire_prompts[0].ends_with(STRUCTURED_RESPONSE_INSTRUCTION));

    let entries = harness.finish().await;
    assert_eq!(entries.len(), 1);
    assert!(!entries[0].prompt_text().contains(STRUCTURED_RESPONSE_INSTRUCTION));
}

#[tokio::test]
async fn malformed_score_response_is_tagged_as_placeholder() {
    let endpoint = ScriptedEndpoint::replying(vec![Ok(
        "{\"healthScore\": 81, \"summary\": \"cut off".to_owned()
    )]);
    let harness = Harness::new(endpoint, auditor());
    let context = PromptContext::new().with("asset_data", "[]");

    let outcome = harness
        .service
        .run_feature(AiFeature::AssetPortfolio, &context)
        .await;

    let Some(ParsedResponse::FallbackGuessed { shape, value }) = outcome.structured() else {
        panic!("expected guessed fallback, got {:?}", outcome.result);
    };
    assert_eq!(*shape, FallbackShape::HealthScore);
    assert_eq!(value["healthScore"], json!(75));
    harness.finish().await;
}

#[tokio::test]
async fn connection_refused_degrades_to_unavailable_message() {
    let endpoint = ScriptedEndpoint::replying(vec![Err(connection_refused())]);
    let harness = Harness::new(endpoint, auditor());
    let context = PromptContext::new().with("risk_data", "R-1");

    let outcome = harness
        .service
        .run_feature(AiFeature::RiskInsights, &context)
        .await;

    assert!(outcome.result.is_failure());
    let display = outcome.display_text();
    assert!(display.starts_with("Risk analysis unavailable: "));
    assert!(display.contains("not running"));

    let entries = harness.finish().await;
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].response_text(), display);
}

#[tokio::test]
async fn failure_without_signed_in_user_is_not_logged() {
    let endpoint = ScriptedEndpoint::replying(vec![Err(connection_refused())]);
    let harness = Harness::new(endpoint, None);

    let outcome = harness
        .service
        .run_feature(AiFeature::Incident, &PromptContext::new())
        .await;

    assert!(outcome.display_text().starts_with("Incident analysis unavailable"));
    assert!(harness.finish().await.is_empty());
}

#[tokio::test]
async fn audit_log_lists_newest_first() {
    let endpoint = ScriptedEndpoint::replying(vec![
        Ok("one".to_owned()),
        Ok("two".to_owned()),
        Ok("three".to_owned()),
    ]);
    let harness = Harness::new(endpoint, auditor());

    for feature in [
        AiFeature::BoardReport,
        AiFeature::AuditRootCause,
        AiFeature::Incident,
    ] {
        harness
            .service
            .run_feature(feature, &PromptContext::new())
            .await;
    }

    let entries = harness.finish().await;
    let responses: Vec<&str> = entries.iter().map(AiAuditLogEntry::response_text).collect();
    assert_eq!(responses, vec!["three", "two", "one"]);
    assert!(entries[0].id() > entries[1].id());
    assert!(entries[1].id() > entries[2].id());
}

#[tokio::test]
async fn tabular_ingestion_returns_records_and_audits_count() {
    let endpoint = ScriptedEndpoint::replying(vec![Ok(
        "[{\"title\": \"Phishing\"}, {\"title\": \"Ransomware\"}]".to_owned(),
    )]);
    let harness = Harness::new(endpoint, auditor());

    let outcome = harness
        .service
        .ingest_tabular(IngestionTarget::Risk, "title\nPhishing\nRansomware")
        .await;
    assert_eq!(
        outcome.structured().map(|parsed| parsed.value().clone()),
        Some(json!([{"title": "Phishing"}, {"title": "Ransomware"}]))
    );

    let wire_prompts = harness.endpoint.wire_prompts.lock().await.clone();
    assert!(wire_prompts[0].contains("convert it to the Risk module format"));

    let entries = harness.finish().await;
    assert_eq!(entries[0].module(), "Bulk Ingestion");
    assert_eq!(entries[0].action(), "Risk Import");
    assert_eq!(entries[0].response_text(), "Mapped 2 records");
}

#[tokio::test]
async fn endpoint_check_matches_model_by_substring() {
    let harness = Harness::new(
        ScriptedEndpoint::with_models(Ok(vec![
            "mistral:7b".to_owned(),
            "llama3.2:latest".to_owned(),
        ])),
        auditor(),
    );

    let health = harness.service.check_endpoint().await;
    assert!(health.is_operational());
    assert_eq!(health.available_models.len(), 2);
    harness.finish().await;
}

#[tokio::test]
async fn endpoint_check_reports_unreachable_endpoint() {
    let harness = Harness::new(
        ScriptedEndpoint::with_models(Err(connection_refused())),
        auditor(),
    );

    let health = harness.service.check_endpoint().await;
    assert!(!health.is_reachable());
    assert!(!health.model_available);
    assert_eq!(health.failure, Some(connection_refused()));
    assert!(harness.finish().await.is_empty());
}

#[tokio::test]
async fn every_run_is_audited_even_in_a_long_burst() {
    let replies = (0..300).map(|index| Ok(format!("insight {index}"))).collect();
    let harness = Harness::new(ScriptedEndpoint::replying(replies), auditor());

    for _ in 0..300 {
        harness
            .service
            .run_feature(AiFeature::BoardReport, &PromptContext::new())
            .await;
    }

    let entries = harness.finish().await;
    assert_eq!(entries.len(), 300);
    assert_eq!(entries[0].response_text(), "insight 299");
    assert_eq!(entries[299].response_text(), "insight 0");
}
