//! Skill-gap analysis (`/skills/*`)

use crate::api::careers::Demand;
use crate::client::{ApiClient, ApiRequest};
use crate::error::ApiError;

/// Priority shares the High/Medium/Low vocabulary of job demand.
pub type Priority = Demand;

#[derive(Debug, serde::Serialize, serde::Deserialize, Clone, PartialEq)]
pub struct SkillGap {
    pub skill_name: String,
    pub current_level: f64,
    pub target_level: f64,
    pub priority: Priority,
    #[serde(default)]
    pub estimated_effort: Option<String>,
    pub gap_score: f64,
    /// "not-started", "in-progress", or "completed"
    pub status: String,
}

#[derive(Debug, serde::Serialize, serde::Deserialize, Clone, PartialEq)]
pub struct SkillRadarPoint {
    pub skill: String,
    pub current: f64,
    pub target: f64,
}

#[derive(Debug, serde::Serialize, serde::Deserialize, Clone, PartialEq)]
pub struct SkillAnalysis {
    pub total_skills: i64,
    pub high_priority_count: i64,
    pub in_progress_count: i64,
    pub completed_count: i64,
    pub overall_gap_score: f64,
    #[serde(default)]
    pub radar_data: Vec<SkillRadarPoint>,
    #[serde(default)]
    pub skill_gaps: Vec<SkillGap>,
}

#[derive(Debug, serde::Serialize, serde::Deserialize, Clone, PartialEq)]
pub struct PrioritySkill {
    pub skill: String,
    pub priority: Priority,
    #[serde(default)]
    pub effort: Option<String>,
}

impl ApiClient {
    pub async fn skill_analysis(&self) -> Result<SkillAnalysis, ApiError> {
        self.request(&ApiRequest::get("/skills/analysis")).await
    }

    pub async fn skill_gaps(&self) -> Result<Vec<SkillGap>, ApiError> {
        self.request(&ApiRequest::get("/skills/gaps")).await
    }

    pub async fn priority_skills(&self) -> Result<Vec<PrioritySkill>, ApiError> {
        self.request(&ApiRequest::get("/skills/priority")).await
    }
}
