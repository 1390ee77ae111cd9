//! Types for on-demand report insights.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Minimum similarity score for a report to count as a duplicate.
pub const DUPLICATE_THRESHOLD: f64 = 50.0;

/// Maximum number of suggested replies returned.
pub const MAX_REPLIES: usize = 3;

/// Fixed analysis categories the insight engine can produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InsightKind {
    Severity,
    ReproSteps,
    RootCause,
    Tags,
    LogSummary,
    StakeholderSummary,
    SuggestedFix,
    Duplicates,
    SmartReply,
    SearchQuery,
}

impl InsightKind {
    /// Kinds computed from the report context alone, in display order.
    pub const CONTEXT_ONLY: [InsightKind; 7] = [
        InsightKind::Severity,
        InsightKind::ReproSteps,
        InsightKind::RootCause,
        InsightKind::Tags,
        InsightKind::LogSummary,
        InsightKind::StakeholderSummary,
        InsightKind::SuggestedFix,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            InsightKind::Severity => "severity",
            InsightKind::ReproSteps => "repro_steps",
            InsightKind::RootCause => "root_cause",
            InsightKind::Tags => "tags",
            InsightKind::LogSummary => "log_summary",
            InsightKind::StakeholderSummary => "stakeholder_summary",
            InsightKind::SuggestedFix => "suggested_fix",
            InsightKind::Duplicates => "duplicates",
            InsightKind::SmartReply => "smart_reply",
            InsightKind::SearchQuery => "search_query",
        }
    }

    /// Whether the kind needs input beyond the report context.
    pub fn needs_extra_input(&self) -> bool {
        matches!(
            self,
            InsightKind::Duplicates | InsightKind::SmartReply | InsightKind::SearchQuery
        )
    }
}

impl fmt::Display for InsightKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, PartialEq, Eq)]
pub struct InsightKindParseError(pub String);

impl fmt::Display for InsightKindParseError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "unknown insight kind: {}", self.0)
    }
}

impl std::error::Error for InsightKindParseError {}

impl FromStr for InsightKind {
    type Err = InsightKindParseError;

    fn from_str(kind: &str) -> Result<InsightKind, Self::Err> {
        match kind.to_lowercase().replace('-', "_").as_str() {
            "severity" => Ok(InsightKind::Severity),
            "repro_steps" => Ok(InsightKind::ReproSteps),
            "root_cause" => Ok(InsightKind::RootCause),
            "tags" => Ok(InsightKind::Tags),
            "log_summary" => Ok(InsightKind::LogSummary),
            "stakeholder_summary" => Ok(InsightKind::StakeholderSummary),
            "suggested_fix" => Ok(InsightKind::SuggestedFix),
            "duplicates" => Ok(InsightKind::Duplicates),
            "smart_reply" => Ok(InsightKind::SmartReply),
            "search_query" => Ok(InsightKind::SearchQuery),
            _ => Err(InsightKindParseError(kind.to_string())),
        }
    }
}

/// Impact of a bug on users.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Critical,
    High,
    Medium,
    Low,
}

/// Expected response time for a bug.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    P0,
    P1,
    P2,
    P3,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeverityResult {
    pub severity: Severity,
    pub priority: Priority,
    pub reasoning: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReproStepsResult {
    pub steps: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RootCauseResult {
    pub analysis: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagsResult {
    pub tags: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogSummaryResult {
    pub summary: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StakeholderSummaryResult {
    pub summary: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SuggestedFixResult {
    pub suggestion: String,
}

/// A previously filed report judged similar to the one under analysis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DuplicateCandidate {
    pub report_id: String,
    pub title: String,
    /// 0–100.
    pub similarity: f64,
    pub reasoning: String,
}

/// An empty list is a meaningful answer: no duplicates were found.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DuplicateDetectionResult {
    pub duplicates: Vec<DuplicateCandidate>,
}

impl DuplicateDetectionResult {
    /// Drop matches below [`DUPLICATE_THRESHOLD`] and matches citing reports that
    /// were not offered as candidates. Scores are clamped into 0–100.
    pub fn retain_valid<'a>(mut self, known_ids: impl IntoIterator<Item = &'a str>) -> Self {
        let known: Vec<&str> = known_ids.into_iter().collect();
        self.duplicates = self
            .duplicates
            .into_iter()
            .map(|mut candidate| {
                candidate.similarity = candidate.similarity.clamp(0.0, 100.0);
                candidate
            })
            .filter(|candidate| candidate.similarity >= DUPLICATE_THRESHOLD)
            .filter(|candidate| known.contains(&candidate.report_id.as_str()))
            .collect();
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SmartReplyResult {
    pub replies: Vec<String>,
}

/// Structured filters recovered from a natural-language search query.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchQueryResult {
    #[serde(default)]
    pub keywords: String,
    #[serde(default)]
    pub severity: Option<Severity>,
    #[serde(default)]
    pub priority: Option<Priority>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub status: Option<String>,
    /// ISO 8601 date.
    #[serde(default)]
    pub created_after: Option<String>,
    /// ISO 8601 date.
    #[serde(default)]
    pub created_before: Option<String>,
}

/// Result of any context-only insight, tagged by kind.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", content = "result", rename_all = "snake_case")]
pub enum InsightResult {
    Severity(SeverityResult),
    ReproSteps(ReproStepsResult),
    RootCause(RootCauseResult),
    Tags(TagsResult),
    LogSummary(LogSummaryResult),
    StakeholderSummary(StakeholderSummaryResult),
    SuggestedFix(SuggestedFixResult),
    Duplicates(DuplicateDetectionResult),
    SmartReply(SmartReplyResult),
    SearchQuery(SearchQueryResult),
}

impl InsightResult {
    pub fn kind(&self) -> InsightKind {
        match self {
            InsightResult::Severity(_) => InsightKind::Severity,
            InsightResult::ReproSteps(_) => InsightKind::ReproSteps,
            InsightResult::RootCause(_) => InsightKind::RootCause,
            InsightResult::Tags(_) => InsightKind::Tags,
            InsightResult::LogSummary(_) => InsightKind::LogSummary,
            InsightResult::StakeholderSummary(_) => InsightKind::StakeholderSummary,
            InsightResult::SuggestedFix(_) => InsightKind::SuggestedFix,
            InsightResult::Duplicates(_) => InsightKind::Duplicates,
            InsightResult::SmartReply(_) => InsightKind::SmartReply,
            InsightResult::SearchQuery(_) => InsightKind::SearchQuery,
        }
    }
}
