//! Request and response bodies of the Brain's JSON API.
//!
//! Field names follow the wire format (snake_case). Optional response fields
//! default the way the Brain defaults them.

use serde::{Deserialize, Serialize};

/// Agent family used when the caller does not pick one.
pub const DEFAULT_AGENT: &str = "auto";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
}

impl HealthResponse {
    pub fn is_ok(&self) -> bool {
        self.status == "ok"
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VibeRequest {
    pub vibe: String,
    #[serde(default)]
    pub workspace_path: String,
    #[serde(default = "default_agent")]
    pub agent: String,
}

impl VibeRequest {
    pub fn new(vibe: impl Into<String>) -> Self {
        Self {
            vibe: vibe.into(),
            workspace_path: String::new(),
            agent: default_agent(),
        }
    }

    pub fn with_workspace(mut self, workspace_path: impl Into<String>) -> Self {
        self.workspace_path = workspace_path.into();
        self
    }

    pub fn with_agent(mut self, agent: impl Into<String>) -> Self {
        self.agent = agent.into();
        self
    }
}

/// Result of a generation request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PromptResponse {
    pub prompt: String,
    #[serde(default)]
    pub context_summary: String,
    #[serde(default)]
    pub model_used: String,
    #[serde(default)]
    pub generation_time_ms: u64,
    #[serde(default)]
    pub agent_used: String,
    #[serde(default)]
    pub quality_score: f64,
    #[serde(default)]
    pub quality_grade: String,
    #[serde(default = "default_security_verdict")]
    pub security_verdict: String,
    #[serde(default)]
    pub prompt_fingerprint: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Agent {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentsResponse {
    #[serde(alias = "families")]
    pub agents: Vec<Agent>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InstalledModel {
    pub name: String,
    #[serde(default)]
    pub size_mb: u64,
}

/// Installed models. `error` is set when the Brain could not list them; the
/// list is then empty.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelsResponse {
    #[serde(default)]
    pub models: Vec<InstalledModel>,
    #[serde(default)]
    pub current: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectModelResponse {
    pub status: String,
    pub model: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogEntry {
    pub name: String,
    #[serde(default)]
    pub desc: String,
    /// Human-readable download size (e.g. "3.3 GB")
    #[serde(default)]
    pub size: String,
    #[serde(default)]
    pub installed: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogResponse {
    pub catalog: Vec<CatalogEntry>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScoreDimensions {
    #[serde(default)]
    pub role_clarity: f64,
    #[serde(default)]
    pub task_clarity: f64,
    #[serde(default)]
    pub structure: f64,
    #[serde(default)]
    pub security: f64,
    #[serde(default)]
    pub actionability: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreResponse {
    pub total_score: f64,
    pub grade: String,
    #[serde(default)]
    pub dimensions: ScoreDimensions,
    #[serde(default)]
    pub fingerprint: String,
}

/// Template-based prompt build that skips the language model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptimizeRequest {
    pub vibe: String,
    #[serde(default = "default_agent")]
    pub family: String,
    #[serde(default)]
    pub tech_stack: String,
    #[serde(default)]
    pub language: String,
}

impl OptimizeRequest {
    pub fn new(vibe: impl Into<String>) -> Self {
        Self {
            vibe: vibe.into(),
            family: default_agent(),
            tech_stack: String::new(),
            language: String::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptimizeResponse {
    pub prompt: String,
    pub family: String,
    pub quality_score: f64,
    pub quality_grade: String,
    #[serde(default)]
    pub fingerprint: String,
    #[serde(default)]
    pub sanitized_issues: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatternSummary {
    pub name: String,
    pub category: String,
    #[serde(default)]
    pub role: String,
    #[serde(default)]
    pub capabilities_count: u32,
    #[serde(default)]
    pub tags: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KnowledgeBase {
    pub total_patterns: u32,
    #[serde(default)]
    pub categories: Vec<String>,
    #[serde(default)]
    pub patterns: Vec<PatternSummary>,
}

/// Full pattern as served for a single category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryPattern {
    pub name: String,
    #[serde(default)]
    pub role: String,
    #[serde(default)]
    pub task_template: String,
    #[serde(default)]
    pub capabilities: Vec<String>,
    #[serde(default)]
    pub rules: Vec<String>,
    #[serde(default)]
    pub output_format: String,
}

/// Extra requirements the Brain adds for a category. Empty for categories
/// without enhancement rules.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryEnhancements {
    #[serde(default)]
    pub must_include: Vec<String>,
    #[serde(default)]
    pub output_sections: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KnowledgeCategory {
    pub category: String,
    #[serde(default)]
    pub patterns: Vec<CategoryPattern>,
    #[serde(default)]
    pub enhancements: CategoryEnhancements,
}

fn default_agent() -> String {
    DEFAULT_AGENT.to_string()
}

fn default_security_verdict() -> String {
    "PASS".to_string()
}
