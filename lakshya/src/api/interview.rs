//! Interview preparation question bank (`/interview/*`). All read-only.

use crate::client::{ApiClient, ApiRequest};
use crate::error::ApiError;

#[derive(Debug, serde::Serialize, serde::Deserialize, Clone, Copy, PartialEq, Eq)]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
}

#[derive(Debug, serde::Serialize, serde::Deserialize, Clone, PartialEq)]
pub struct InterviewQuestion {
    pub id: i64,
    pub question: String,
    /// Technical, Behavioral, or Problem Solving
    pub category: String,
    pub difficulty: Difficulty,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub answered: bool,
    #[serde(default)]
    pub rating: Option<f64>,
}

#[derive(Debug, serde::Serialize, serde::Deserialize, Clone, PartialEq)]
pub struct InterviewCategory {
    pub category: String,
    pub count: i64,
    #[serde(default)]
    pub answered_count: i64,
    #[serde(default)]
    pub questions: Vec<InterviewQuestion>,
}

#[derive(Debug, serde::Serialize, serde::Deserialize, Clone, PartialEq)]
pub struct InterviewStats {
    pub total_questions: i64,
    #[serde(alias = "answered")]
    pub answered_count: i64,
    pub average_rating: f64,
    pub time_invested: String,
}

impl ApiClient {
    pub async fn interview_questions(&self) -> Result<Vec<InterviewQuestion>, ApiError> {
        self.request(&ApiRequest::get("/interview/questions")).await
    }

    pub async fn interview_question(&self, question_id: i64) -> Result<InterviewQuestion, ApiError> {
        self.request(&ApiRequest::get(format!(
            "/interview/questions/{question_id}"
        )))
        .await
    }

    pub async fn interview_categories(&self) -> Result<Vec<InterviewCategory>, ApiError> {
        self.request(&ApiRequest::get("/interview/categories")).await
    }

    /// Category names contain spaces ("Problem Solving"), so they go out percent-encoded.
    pub async fn interview_category(&self, category: &str) -> Result<InterviewCategory, ApiError> {
        let req = ApiRequest::get(format!(
            "/interview/categories/{}",
            urlencoding::encode(category)
        ));
        self.request(&req).await
    }

    pub async fn interview_stats(&self) -> Result<InterviewStats, ApiError> {
        self.request(&ApiRequest::get("/interview/stats")).await
    }
}

#[test]
fn test_interview_stats_accepts_both_spellings() {
    let a: InterviewStats = serde_json::from_value(serde_json::json!({
        "total_questions": 20, "answered": 5, "average_rating": 3.5, "time_invested": "2h"
    }))
    .unwrap();
    let b: InterviewStats = serde_json::from_value(serde_json::json!({
        "total_questions": 20, "answered_count": 5, "average_rating": 3.5, "time_invested": "2h"
    }))
    .unwrap();
    assert_eq!(a, b);
    assert_eq!(a.answered_count, 5);
}
