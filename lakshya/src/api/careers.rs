//! Career matches, readiness scoring, and dashboard analytics (`/careers/*`). All read-only.

use crate::client::{ApiClient, ApiRequest};
use crate::error::ApiError;
use std::collections::HashMap;
use std::fmt;

#[derive(Debug, serde::Serialize, serde::Deserialize, Clone, Copy, PartialEq, Eq)]
pub enum Demand {
    High,
    Medium,
    Low,
}

impl fmt::Display for Demand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Demand::High => write!(f, "High"),
            Demand::Medium => write!(f, "Medium"),
            Demand::Low => write!(f, "Low"),
        }
    }
}

#[derive(Debug, serde::Serialize, serde::Deserialize, Clone, PartialEq)]
pub struct CareerMatch {
    // matches computed on the fly are positional, and come back without an id
    #[serde(default)]
    pub id: Option<i64>,
    pub role: String,
    pub match_percentage: f64,
    pub demand: Demand,
    #[serde(default)]
    pub salary_range: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    /// Comma-separated skills the role asks for
    #[serde(default)]
    pub skills: Option<String>,
}

#[derive(Debug, serde::Serialize, serde::Deserialize, Clone, PartialEq)]
pub struct ReadinessScore {
    pub overall_score: f64,
    pub technical_skills_score: f64,
    pub soft_skills_score: f64,
    pub experience_score: f64,
    #[serde(default)]
    pub breakdown: HashMap<String, f64>,
}

#[derive(Debug, serde::Serialize, serde::Deserialize, Clone, PartialEq)]
pub struct DashboardStats {
    pub readiness_score: f64,
    pub readiness_score_change: f64,
    pub skills_acquired: i64,
    pub skills_change: i64,
    pub learning_hours: i64,
    pub hours_change: i64,
    pub career_matches_count: i64,
}

#[derive(Debug, serde::Serialize, serde::Deserialize, Clone, PartialEq)]
pub struct CareerTrend {
    pub month: String,
    pub score: f64,
}

#[derive(Debug, serde::Serialize, serde::Deserialize, Clone, PartialEq)]
pub struct ActivityPoint {
    pub day: String,
    pub hours: f64,
}

impl ApiClient {
    pub async fn career_matches(&self) -> Result<Vec<CareerMatch>, ApiError> {
        self.request(&ApiRequest::get("/careers/matches")).await
    }

    pub async fn career_match(&self, match_id: i64) -> Result<CareerMatch, ApiError> {
        self.request(&ApiRequest::get(format!("/careers/matches/{match_id}")))
            .await
    }

    pub async fn readiness_score(&self) -> Result<ReadinessScore, ApiError> {
        self.request(&ApiRequest::get("/careers/readiness")).await
    }

    pub async fn dashboard_stats(&self) -> Result<DashboardStats, ApiError> {
        self.request(&ApiRequest::get("/careers/dashboard-stats"))
            .await
    }

    pub async fn career_trends(&self) -> Result<Vec<CareerTrend>, ApiError> {
        self.request(&ApiRequest::get("/careers/trends")).await
    }

    pub async fn activity(&self) -> Result<Vec<ActivityPoint>, ApiError> {
        self.request(&ApiRequest::get("/careers/activity")).await
    }
}

#[test]
fn test_career_match_without_id() {
    let m: CareerMatch = serde_json::from_value(serde_json::json!({
        "role": "Data Analyst",
        "match_percentage": 64.0,
        "demand": "High",
        "salary_range": "6-12 LPA",
        "skills": "SQL, Python, Excel"
    }))
    .unwrap();
    assert_eq!(m.id, None);
    assert_eq!(m.demand, Demand::High);
    assert_eq!(m.demand.to_string(), "High");
    assert!(serde_json::from_value::<CareerMatch>(serde_json::json!({
        "role": "x", "match_percentage": 1, "demand": "Extreme"
    }))
    .is_err());
}
