//! Final verdict payload and its nested analysis structures.
//!
//! These mirror the wire shapes produced by the adjudication stage. Everything
//! beyond the core fields (`conclusion`, `confidence_score`, `summary`,
//! `evidence_list`, `reasoning_chain`) is optional and depends on the analysis
//! depth the remote pipeline ran at.

use serde::{Deserialize, Serialize};

/// Verdict categories for a verified claim.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Conclusion {
    /// The claim is accurate and corroborated.
    True,
    /// The claim is refuted by the evidence.
    False,
    /// Evidence is insufficient or contradictory.
    Uncertain,
    /// No objective basis exists to check the claim.
    Unverifiable,
    /// Partly accurate with exaggerations or omissions.
    PartiallyTrue,
    /// Literally defensible but steering toward a wrong conclusion.
    Misleading,
}

/// Credibility tier assigned to an evidence source.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceCredibility {
    High,
    Medium,
    Low,
}

/// How directly a piece of evidence bears on the claim.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EvidenceType {
    Primary,
    Secondary,
    Hearsay,
}

/// Editorial stance of an evidence source toward the claim.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceStance {
    Neutral,
    Supportive,
    Opposing,
    Unclear,
}

/// One evidence record cited by the verdict.
///
/// `evidence_id` values are unique within a single [`VerifyResult`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Evidence {
    pub evidence_id: String,
    pub source_url: String,
    pub source_domain: String,
    pub source_credibility: SourceCredibility,
    #[serde(default)]
    pub source_category: String,
    #[serde(default)]
    pub publish_time: Option<String>,
    pub title: String,
    pub content_snippet: String,
    /// Relevance to the claim, in `[0, 1]`.
    pub relevance_score: f64,
    pub evidence_type: EvidenceType,
    /// Whether this evidence supports (rather than opposes) the claim.
    pub supports: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_key_source: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key_insight: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub importance_note: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_stance: Option<SourceStance>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub potential_bias: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deep_analysis: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unique_value: Option<String>,
}

/// A key source the verdict explicitly leaned on.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct KeySourceCited {
    pub evidence_id: String,
    pub title: String,
    pub domain: String,
    pub credibility: String,
    pub key_insight: String,
    pub why_important: String,
}

/// One axis of the multi-dimensional breakdown.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DimensionalAnalysis {
    pub analysis: String,
    pub key_points: Vec<String>,
    /// Confidence for this axis alone, in `[0, 1]`.
    pub confidence: f64,
}

/// Four-axis breakdown of the claim.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MultiDimensionalAnalysis {
    pub factual_dimension: DimensionalAnalysis,
    pub contextual_dimension: DimensionalAnalysis,
    pub motivational_dimension: DimensionalAnalysis,
    pub impact_dimension: DimensionalAnalysis,
}

/// Paired readings of the claim from complementary angles.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct MultiAngleReasoning {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub literal_meaning: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deep_implication: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub direct_evidence: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub indirect_evidence: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub short_term: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub long_term: Option<String>,
}

/// Summaries of the stream of opinion found during search.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Perspectives {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub supporting: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub opposing: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub neutral: Option<String>,
}

/// One executed search query and the reasoning behind it.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SearchQueryReasoning {
    pub query: String,
    pub reasoning: String,
}

/// Analysis produced by the evidence-gathering stage.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SearchAnalysis {
    #[serde(default)]
    pub key_findings: Vec<String>,
    #[serde(default)]
    pub conflict_points: Vec<String>,
    #[serde(default)]
    pub evidence_gaps: Vec<String>,
    #[serde(default)]
    pub analysis_reasoning: String,
    #[serde(default)]
    pub perspectives: Perspectives,
    #[serde(default)]
    pub search_reasoning_chain: Vec<SearchQueryReasoning>,
}

/// Per-source weighting applied while resolving conflicting evidence.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct KeySourceAssessment {
    pub domain: String,
    pub assessment: String,
    pub weight: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reliability_concerns: Option<String>,
}

/// How the adjudication stage weighed the evidence pool.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EvidenceEvaluation {
    #[serde(default)]
    pub key_sources_assessment: Vec<KeySourceAssessment>,
    #[serde(default)]
    pub conflict_resolution: String,
    #[serde(default)]
    pub weight_analysis: Vec<String>,
    /// Overall strength of the evidence pool, in `[0, 1]`.
    #[serde(default)]
    pub evidence_strength: f64,
    #[serde(default)]
    pub coverage_assessment: String,
    #[serde(default)]
    pub overall_quality: String,
}

/// Claims from the input classified by verification outcome.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Findings {
    #[serde(default)]
    pub verified_claims: Vec<String>,
    #[serde(default)]
    pub refuted_claims: Vec<String>,
    #[serde(default)]
    pub uncertain_claims: Vec<String>,
    #[serde(default)]
    pub nuanced_claims: Vec<String>,
}

/// One link in the evidence chain backing the verdict.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EvidenceChainEntry {
    pub evidence_id: String,
    pub source_ref: String,
    pub source_domain: String,
    pub source_credibility: String,
    pub is_key_source: bool,
    pub supports: bool,
    pub weight: f64,
    pub reason: String,
}

/// Pipeline bookkeeping attached to a verdict.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ResultMetadata {
    pub parser_task_id: String,
    pub search_task_id: String,
    pub verdict_task_id: String,
    pub total_sources: u32,
    pub key_sources_count: u32,
    pub analysis_depth: String,
}

/// The final aggregated verdict delivered on the terminal `complete` event.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct VerifyResult {
    pub verdict_id: String,
    pub conclusion: Conclusion,
    /// Overall confidence in the conclusion, in `[0, 1]`.
    pub confidence_score: f64,
    pub summary: String,
    #[serde(default)]
    pub evidence_list: Vec<Evidence>,
    #[serde(default)]
    pub reasoning_chain: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dimensional_analysis: Option<MultiDimensionalAnalysis>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub multi_angle_reasoning: Option<MultiAngleReasoning>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key_sources_cited: Option<Vec<KeySourceCited>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub search_analysis: Option<SearchAnalysis>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub evidence_evaluation: Option<EvidenceEvaluation>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub findings: Option<Findings>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub evidence_chain: Option<Vec<EvidenceChainEntry>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<ResultMetadata>,
}
