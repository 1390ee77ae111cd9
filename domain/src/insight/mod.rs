//! On-demand insights over a bug report.
//!
//! Every method follows the same path: a fixed system prompt, a user prompt
//! rendered from the report, one chat call through the retry policy and a strict
//! JSON decode. Unlike recording analysis, a malformed answer is an error here.

pub mod prompts;

use crate::error::Error;
use log::*;
use report_ai::context::build_context;
use report_ai::traits::chat;
use report_ai::types::chat::{ChatRequest, Message};
use report_ai::types::insight::{
    DuplicateDetectionResult, InsightKind, InsightResult, LogSummaryResult, ReproStepsResult,
    RootCauseResult, SearchQueryResult, SeverityResult, SmartReplyResult,
    StakeholderSummaryResult, SuggestedFixResult, TagsResult, MAX_REPLIES,
};
use report_ai::types::report::{CandidateReport, ReportContext, ThreadComment};
use report_ai::{extract_json, Error as AiError, ParseError, RetryPolicy};
use serde::de::DeserializeOwned;
use std::sync::Arc;

/// User prompt body when a report has nothing to render.
const EMPTY_CONTEXT: &str = "No report details were provided.";

pub struct InsightEngine {
    provider: Arc<dyn chat::Provider>,
    retry: RetryPolicy,
    max_tokens: u32,
    temperature: f32,
}

impl InsightEngine {
    /// Engine over `provider`, using the provider's own retry policy.
    pub fn new(provider: Arc<dyn chat::Provider>) -> Self {
        let retry = provider.default_retry_policy();
        Self {
            provider,
            retry,
            max_tokens: ChatRequest::DEFAULT_MAX_TOKENS,
            temperature: ChatRequest::DEFAULT_TEMPERATURE,
        }
    }

    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub async fn classify_severity(&self, ctx: &ReportContext) -> Result<SeverityResult, Error> {
        self.infer(InsightKind::Severity, prompts::SEVERITY, context_prompt(ctx))
            .await
    }

    pub async fn generate_repro_steps(&self, ctx: &ReportContext) -> Result<ReproStepsResult, Error> {
        self.infer(InsightKind::ReproSteps, prompts::REPRO_STEPS, context_prompt(ctx))
            .await
    }

    pub async fn analyze_root_cause(&self, ctx: &ReportContext) -> Result<RootCauseResult, Error> {
        self.infer(InsightKind::RootCause, prompts::ROOT_CAUSE, context_prompt(ctx))
            .await
    }

    /// Tags come back trimmed, lowercased and without duplicates.
    pub async fn auto_tag(&self, ctx: &ReportContext) -> Result<TagsResult, Error> {
        let mut result: TagsResult = self
            .infer(InsightKind::Tags, prompts::TAGS, context_prompt(ctx))
            .await?;

        let mut tags: Vec<String> = Vec::with_capacity(result.tags.len());
        for tag in result.tags.iter().map(|t| t.trim().to_lowercase()) {
            if !tag.is_empty() && !tags.contains(&tag) {
                tags.push(tag);
            }
        }
        result.tags = tags;
        Ok(result)
    }

    pub async fn summarize_logs(&self, ctx: &ReportContext) -> Result<LogSummaryResult, Error> {
        self.infer(InsightKind::LogSummary, prompts::LOG_SUMMARY, context_prompt(ctx))
            .await
    }

    pub async fn generate_stakeholder_summary(
        &self,
        ctx: &ReportContext,
    ) -> Result<StakeholderSummaryResult, Error> {
        self.infer(
            InsightKind::StakeholderSummary,
            prompts::STAKEHOLDER_SUMMARY,
            context_prompt(ctx),
        )
        .await
    }

    pub async fn suggest_fix(&self, ctx: &ReportContext) -> Result<SuggestedFixResult, Error> {
        self.infer(InsightKind::SuggestedFix, prompts::SUGGESTED_FIX, context_prompt(ctx))
            .await
    }

    /// Rank `candidates` as possible duplicates of the report.
    ///
    /// No candidates means no duplicates, and no inference call is made. Matches
    /// below the similarity threshold or citing an unknown id are dropped.
    pub async fn detect_duplicates(
        &self,
        ctx: &ReportContext,
        candidates: &[CandidateReport],
    ) -> Result<DuplicateDetectionResult, Error> {
        if candidates.is_empty() {
            debug!("No duplicate candidates, skipping inference");
            return Ok(DuplicateDetectionResult::default());
        }

        let user = format!(
            "{}\n\n## Existing Reports\n{}",
            context_prompt(ctx),
            render_candidates(candidates)
        );
        let result: DuplicateDetectionResult = self
            .infer(InsightKind::Duplicates, prompts::DUPLICATES, user)
            .await?;
        Ok(result.retain_valid(candidates.iter().map(|c| c.id.as_str())))
    }

    /// Draft between one and [`MAX_REPLIES`] replies to `comment`.
    pub async fn suggest_replies(
        &self,
        ctx: &ReportContext,
        comment: &str,
        thread: &[ThreadComment],
    ) -> Result<SmartReplyResult, Error> {
        let mut user = context_prompt(ctx);
        if !thread.is_empty() {
            user.push_str("\n\n## Discussion\n");
            user.push_str(&render_thread(thread));
        }
        user.push_str("\n\n## New Comment\n");
        user.push_str(comment.trim());

        let raw = self.complete(InsightKind::SmartReply, prompts::SMART_REPLY, user).await?;
        let mut result: SmartReplyResult = decode_strict(&raw)?;

        result.replies = result
            .replies
            .into_iter()
            .map(|reply| reply.trim().to_string())
            .filter(|reply| !reply.is_empty())
            .take(MAX_REPLIES)
            .collect();
        if result.replies.is_empty() {
            warn!("Model returned no usable replies");
            return Err(AiError::from(ParseError::new("response contained no replies", &raw)).into());
        }
        Ok(result)
    }

    /// Turn a natural-language search into structured filters.
    pub async fn parse_search_query(&self, query: &str) -> Result<SearchQueryResult, Error> {
        let query = query.trim();
        if query.is_empty() {
            return Err(Error::config("search query is empty"));
        }
        self.infer(
            InsightKind::SearchQuery,
            prompts::SEARCH_QUERY,
            format!("## Search Query\n{}", query),
        )
        .await
    }

    /// Run one insight that needs nothing but the report.
    pub async fn generate(&self, kind: InsightKind, ctx: &ReportContext) -> Result<InsightResult, Error> {
        Ok(match kind {
            InsightKind::Severity => InsightResult::Severity(self.classify_severity(ctx).await?),
            InsightKind::ReproSteps => InsightResult::ReproSteps(self.generate_repro_steps(ctx).await?),
            InsightKind::RootCause => InsightResult::RootCause(self.analyze_root_cause(ctx).await?),
            InsightKind::Tags => InsightResult::Tags(self.auto_tag(ctx).await?),
            InsightKind::LogSummary => InsightResult::LogSummary(self.summarize_logs(ctx).await?),
            InsightKind::StakeholderSummary => {
                InsightResult::StakeholderSummary(self.generate_stakeholder_summary(ctx).await?)
            }
            InsightKind::SuggestedFix => InsightResult::SuggestedFix(self.suggest_fix(ctx).await?),
            InsightKind::Duplicates | InsightKind::SmartReply | InsightKind::SearchQuery => {
                return Err(Error::config(format!(
                    "{} needs input beyond the report and cannot run on its own",
                    kind
                )))
            }
        })
    }

    /// Run `kinds` one after another. Calls share the provider's quota, so they
    /// are never issued concurrently. A failure is recorded and the batch moves on.
    pub async fn run_all(
        &self,
        ctx: &ReportContext,
        kinds: &[InsightKind],
    ) -> Vec<(InsightKind, Result<InsightResult, Error>)> {
        let mut results = Vec::with_capacity(kinds.len());
        for kind in kinds {
            let result = self.generate(*kind, ctx).await;
            if let Err(e) = &result {
                warn!("{} insight failed: {}", kind, e);
            }
            results.push((*kind, result));
        }
        results
    }

    async fn infer<T: DeserializeOwned>(
        &self,
        kind: InsightKind,
        system: &str,
        user: String,
    ) -> Result<T, Error> {
        let raw = self.complete(kind, system, user).await?;
        decode_strict(&raw)
    }

    async fn complete(&self, kind: InsightKind, system: &str, user: String) -> Result<String, Error> {
        let request = ChatRequest::new(prompts::with_json_rule(system), Message::user(user))
            .with_max_tokens(self.max_tokens)
            .with_temperature(self.temperature);

        debug!(
            "Generating {} insight with {}",
            kind,
            self.provider.provider_id()
        );

        let (provider, request) = (&self.provider, &request);
        let raw = self
            .retry
            .run_with_hint(
                move || provider.complete(request.clone()),
                |e| provider.retry_delay_hint(e),
            )
            .await?;
        Ok(raw)
    }
}

fn decode_strict<T: DeserializeOwned>(raw: &str) -> Result<T, Error> {
    extract_json(raw).map_err(|e| {
        warn!("{}", e);
        Error::from(AiError::from(e))
    })
}

fn context_prompt(ctx: &ReportContext) -> String {
    let context = build_context(ctx);
    if context.is_empty() {
        EMPTY_CONTEXT.to_string()
    } else {
        context
    }
}

/// `1. [id] "title" — description`, numbered from one.
fn render_candidates(candidates: &[CandidateReport]) -> String {
    candidates
        .iter()
        .enumerate()
        .map(|(i, candidate)| {
            let description = candidate
                .description
                .as_deref()
                .map(str::trim)
                .filter(|d| !d.is_empty())
                .unwrap_or("No description");
            format!(
                "{}. [{}] \"{}\" — {}",
                i + 1,
                candidate.id,
                candidate.title,
                description
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn render_thread(thread: &[ThreadComment]) -> String {
    thread
        .iter()
        .map(|comment| format!("- {}: {}", comment.author, comment.body.trim()))
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{DomainErrorKind, ExternalErrorKind, InternalErrorKind};
    use async_trait::async_trait;
    use report_ai::types::insight::{Priority, Severity};
    use std::collections::VecDeque;
    use std::sync::Mutex;
    use std::time::Duration;

    /// Chat provider that answers from a script and records every request.
    #[derive(Default)]
    struct ScriptedProvider {
        answers: Mutex<VecDeque<Result<String, AiError>>>,
        requests: Mutex<Vec<ChatRequest>>,
    }

    impl ScriptedProvider {
        fn answering(answers: Vec<Result<String, AiError>>) -> Arc<Self> {
            Arc::new(Self {
                answers: Mutex::new(answers.into()),
                requests: Mutex::new(Vec::new()),
            })
        }

        fn calls(&self) -> usize {
            self.requests.lock().unwrap().len()
        }

        fn last_user_prompt(&self) -> String {
            let requests = self.requests.lock().unwrap();
            requests.last().unwrap().messages[1].content.text()
        }
    }

    #[async_trait]
    impl chat::Provider for ScriptedProvider {
        async fn complete(&self, request: ChatRequest) -> Result<String, AiError> {
            self.requests.lock().unwrap().push(request);
            self.answers
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Err(AiError::Provider("script exhausted".to_string())))
        }

        fn provider_id(&self) -> &'static str {
            "scripted"
        }

        async fn verify_credentials(&self) -> Result<bool, AiError> {
            Ok(true)
        }

        fn default_retry_policy(&self) -> RetryPolicy {
            RetryPolicy::new(Duration::from_millis(1)).without_jitter()
        }
    }

    fn ok(text: &str) -> Result<String, AiError> {
        Ok(text.to_string())
    }

    fn report() -> ReportContext {
        ReportContext {
            title: Some("Checkout button does nothing".to_string()),
            description: Some("Clicking Pay has no effect on Safari".to_string()),
            ..Default::default()
        }
    }

    fn candidate(id: &str, title: &str, description: Option<&str>) -> CandidateReport {
        CandidateReport {
            id: id.to_string(),
            title: title.to_string(),
            description: description.map(str::to_string),
        }
    }

    #[tokio::test]
    async fn test_classify_severity_decodes_fenced_answer() {
        let provider = ScriptedProvider::answering(vec![ok(
            "```json\n{\"severity\": \"high\", \"priority\": \"p1\", \"reasoning\": \"Checkout is blocked.\"}\n```",
        )]);
        let engine = InsightEngine::new(provider.clone());

        let result = engine.classify_severity(&report()).await.unwrap();
        assert_eq!(result.severity, Severity::High);
        assert_eq!(result.priority, Priority::P1);

        let requests = provider.requests.lock().unwrap();
        let system = requests[0].system_text().unwrap();
        assert!(system.contains("data loss"));
        assert!(system.ends_with("No markdown, no commentary."));
        assert!(requests[0].messages[1]
            .content
            .text()
            .starts_with("## Title\nCheckout button does nothing"));
    }

    #[tokio::test]
    async fn test_classify_severity_rejects_prose() {
        let provider = ScriptedProvider::answering(vec![ok(
            "This looks like a high severity problem with checkout.",
        )]);
        let engine = InsightEngine::new(provider.clone());

        let err = engine.classify_severity(&report()).await.unwrap_err();
        assert_eq!(
            err.error_kind,
            DomainErrorKind::Internal(InternalErrorKind::Parse)
        );
        assert_eq!(provider.calls(), 1);
    }

    #[tokio::test]
    async fn test_empty_candidates_skip_inference() {
        let provider = ScriptedProvider::answering(vec![]);
        let engine = InsightEngine::new(provider.clone());

        let result = engine.detect_duplicates(&report(), &[]).await.unwrap();
        assert!(result.duplicates.is_empty());
        assert_eq!(provider.calls(), 0);
    }

    #[tokio::test]
    async fn test_duplicates_render_candidates_and_filter_matches() {
        let provider = ScriptedProvider::answering(vec![ok(
            r#"{"duplicates": [
                {"reportId": "r-1", "title": "Pay button dead", "similarity": 92, "reasoning": "Same button"},
                {"reportId": "r-2", "title": "Slow cart", "similarity": 30, "reasoning": "Different symptom"},
                {"reportId": "r-9", "title": "Invented", "similarity": 80, "reasoning": "Not in list"}
            ]}"#,
        )]);
        let engine = InsightEngine::new(provider.clone());
        let candidates = [
            candidate("r-1", "Pay button dead", Some("Nothing happens on click")),
            candidate("r-2", "Slow cart", None),
        ];

        let result = engine.detect_duplicates(&report(), &candidates).await.unwrap();
        assert_eq!(result.duplicates.len(), 1);
        assert_eq!(result.duplicates[0].report_id, "r-1");

        let prompt = provider.last_user_prompt();
        assert!(prompt.contains(
            "## Existing Reports\n1. [r-1] \"Pay button dead\" — Nothing happens on click\n2. [r-2] \"Slow cart\" — No description"
        ));
    }

    #[tokio::test]
    async fn test_suggest_replies_renders_thread_and_caps_replies() {
        let provider = ScriptedProvider::answering(vec![ok(
            r#"{"replies": ["Which Safari version?", "  ", "Thanks, looking now.", "Fixed in 2.3.", "Extra"]}"#,
        )]);
        let engine = InsightEngine::new(provider.clone());
        let thread = [ThreadComment {
            author: "dana".to_string(),
            body: "Also seeing this on iOS".to_string(),
        }];

        let result = engine
            .suggest_replies(&report(), "Any update?", &thread)
            .await
            .unwrap();
        assert_eq!(
            result.replies,
            vec!["Which Safari version?", "Thanks, looking now.", "Fixed in 2.3."]
        );

        let prompt = provider.last_user_prompt();
        assert!(prompt.contains("## Discussion\n- dana: Also seeing this on iOS"));
        assert!(prompt.ends_with("## New Comment\nAny update?"));
    }

    #[tokio::test]
    async fn test_suggest_replies_requires_one_reply() {
        let provider = ScriptedProvider::answering(vec![ok(r#"{"replies": []}"#)]);
        let engine = InsightEngine::new(provider);

        let err = engine
            .suggest_replies(&report(), "Any update?", &[])
            .await
            .unwrap_err();
        assert_eq!(
            err.error_kind,
            DomainErrorKind::Internal(InternalErrorKind::Parse)
        );
    }

    #[tokio::test]
    async fn test_auto_tag_normalizes_tags() {
        let provider =
            ScriptedProvider::answering(vec![ok(r#"{"tags": ["Checkout", " safari ", "checkout", ""]}"#)]);
        let engine = InsightEngine::new(provider);

        let result = engine.auto_tag(&report()).await.unwrap();
        assert_eq!(result.tags, vec!["checkout", "safari"]);
    }

    #[tokio::test]
    async fn test_parse_search_query() {
        let provider = ScriptedProvider::answering(vec![ok(
            r#"{"keywords": "login", "severity": "critical", "tags": ["auth"], "createdAfter": "2026-01-01"}"#,
        )]);
        let engine = InsightEngine::new(provider.clone());

        let result = engine
            .parse_search_query("critical login bugs since January")
            .await
            .unwrap();
        assert_eq!(result.keywords, "login");
        assert_eq!(result.severity, Some(Severity::Critical));
        assert_eq!(result.created_after.as_deref(), Some("2026-01-01"));
        assert_eq!(result.priority, None);
        assert_eq!(
            provider.last_user_prompt(),
            "## Search Query\ncritical login bugs since January"
        );
    }

    #[tokio::test]
    async fn test_rate_limit_is_retried_then_reported() {
        let throttled = || {
            Err(AiError::RateLimited {
                retry_after_seconds: None,
                message: "429".to_string(),
            })
        };
        let provider = ScriptedProvider::answering(vec![throttled(), throttled(), throttled()]);
        let engine = InsightEngine::new(provider.clone());

        let err = engine.summarize_logs(&report()).await.unwrap_err();
        assert_eq!(
            err.error_kind,
            DomainErrorKind::External(ExternalErrorKind::RateLimitExceeded)
        );
        assert_eq!(provider.calls(), 3);
    }

    #[tokio::test]
    async fn test_network_failure_is_not_reinterpreted() {
        let provider = ScriptedProvider::answering(vec![Err(AiError::Network(
            "connection reset".to_string(),
        ))]);
        let engine = InsightEngine::new(provider.clone());

        let err = engine.suggest_fix(&report()).await.unwrap_err();
        assert_eq!(
            err.error_kind,
            DomainErrorKind::External(ExternalErrorKind::Network)
        );
        assert_eq!(provider.calls(), 1);
    }

    #[tokio::test]
    async fn test_run_all_is_sequential_and_keeps_failures() {
        let provider = ScriptedProvider::answering(vec![
            ok(r#"{"severity": "low", "priority": "p3", "reasoning": "Cosmetic"}"#),
            ok("not json"),
            ok(r#"{"summary": "No errors logged."}"#),
        ]);
        let engine = InsightEngine::new(provider.clone());

        let results = engine
            .run_all(
                &report(),
                &[
                    InsightKind::Severity,
                    InsightKind::RootCause,
                    InsightKind::LogSummary,
                    InsightKind::Duplicates,
                ],
            )
            .await;

        assert_eq!(results.len(), 4);
        assert!(matches!(results[0].1, Ok(InsightResult::Severity(_))));
        assert!(results[1].1.is_err());
        assert!(matches!(results[2].1, Ok(InsightResult::LogSummary(_))));
        assert_eq!(
            results[3].1.as_ref().unwrap_err().error_kind,
            DomainErrorKind::Internal(InternalErrorKind::Config)
        );
        assert_eq!(provider.calls(), 3);
    }

    #[tokio::test]
    async fn test_empty_report_uses_placeholder() {
        let provider = ScriptedProvider::answering(vec![ok(r#"{"summary": "Nothing to report."}"#)]);
        let engine = InsightEngine::new(provider.clone());

        engine
            .generate_stakeholder_summary(&ReportContext::default())
            .await
            .unwrap();
        assert_eq!(provider.last_user_prompt(), EMPTY_CONTEXT);
    }
}
