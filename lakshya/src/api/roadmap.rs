//! Learning roadmap and course progress (`/roadmap/*`)

use crate::api::check_percentage;
use crate::client::{ApiClient, ApiRequest};
use crate::error::ApiError;
use std::fmt;
use std::str::FromStr;

#[derive(Debug, serde::Serialize, serde::Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum CourseStatus {
    NotStarted,
    InProgress,
    Completed,
    Locked,
}

impl FromStr for CourseStatus {
    type Err = ApiError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "not-started" => Ok(CourseStatus::NotStarted),
            "in-progress" => Ok(CourseStatus::InProgress),
            "completed" => Ok(CourseStatus::Completed),
            "locked" => Ok(CourseStatus::Locked),
            _ => Err(ApiError::InvalidRequest(format!("unknown course status: {s}"))),
        }
    }
}

impl fmt::Display for CourseStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            CourseStatus::NotStarted => "not-started",
            CourseStatus::InProgress => "in-progress",
            CourseStatus::Completed => "completed",
            CourseStatus::Locked => "locked",
        };
        write!(f, "{s}")
    }
}

#[derive(Debug, serde::Serialize, serde::Deserialize, Clone, PartialEq)]
pub struct Course {
    pub id: i64,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    pub duration: String,
    pub topics: i64,
    pub status: CourseStatus,
    #[serde(default)]
    pub progress: Option<f64>,
}

#[derive(Debug, serde::Serialize, serde::Deserialize, Clone, PartialEq)]
pub struct RoadmapStage {
    /// Foundation, Intermediate, Advanced
    pub stage: String,
    pub description: String,
    #[serde(default)]
    pub progress: f64,
    #[serde(default)]
    pub courses: Vec<Course>,
}

#[derive(Debug, serde::Serialize, serde::Deserialize, Clone, PartialEq, Eq)]
pub struct Milestone {
    #[serde(default)]
    pub id: Option<i64>,
    pub title: String,
    pub completed: bool,
    #[serde(default, alias = "date")]
    pub target_date: Option<String>,
}

#[derive(Debug, serde::Serialize, serde::Deserialize, Clone, PartialEq, Default)]
pub struct RoadmapStats {
    #[serde(default)]
    pub courses_completed: f64,
    #[serde(default)]
    pub courses_in_progress: f64,
    #[serde(default)]
    pub hours_invested: f64,
    #[serde(default)]
    pub overall_progress: f64,
}

#[derive(Debug, serde::Serialize, serde::Deserialize, Clone, PartialEq)]
pub struct LearningRoadmap {
    #[serde(default)]
    pub stages: Vec<RoadmapStage>,
    #[serde(default)]
    pub milestones: Vec<Milestone>,
    #[serde(default)]
    pub stats: RoadmapStats,
}

/// Recommendation entries carry at least a title and a reason; the rest depends on where the
/// recommendation came from.
#[derive(Debug, serde::Serialize, serde::Deserialize, Clone, PartialEq, Eq)]
pub struct RecommendedCourse {
    #[serde(default)]
    pub id: Option<i64>,
    pub title: String,
    pub reason: String,
    #[serde(default)]
    pub impact: Option<String>,
    #[serde(default)]
    pub provider: Option<String>,
    #[serde(default)]
    pub duration: Option<String>,
    #[serde(default)]
    pub level: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
}

#[derive(Debug, serde::Serialize, serde::Deserialize, Clone, PartialEq)]
pub struct CourseProgressUpdate {
    pub course_id: i64,
    pub progress: f64,
    pub status: CourseStatus,
}

impl ApiClient {
    pub async fn learning_roadmap(&self) -> Result<LearningRoadmap, ApiError> {
        self.request(&ApiRequest::get("/roadmap")).await
    }

    pub async fn recommended_courses(&self) -> Result<Vec<RecommendedCourse>, ApiError> {
        self.request(&ApiRequest::get("/roadmap/recommended")).await
    }

    /// Returns the updated course, or `None` if the server does not know the course.
    pub async fn update_course_progress(
        &self,
        course_id: i64,
        progress: f64,
        status: CourseStatus,
    ) -> Result<Option<Course>, ApiError> {
        check_percentage("progress", progress)?;
        let body = CourseProgressUpdate {
            course_id,
            progress,
            status,
        };
        let req = ApiRequest::put(format!("/roadmap/courses/{course_id}")).json(&body)?;
        match self.send(&req).await? {
            Some(val) if !val.is_null() => Ok(Some(serde_json::from_value(val)?)),
            _ => Ok(None),
        }
    }
}

#[test]
fn test_course_status_wire_format() {
    assert_eq!(
        serde_json::to_value(CourseStatus::InProgress).unwrap(),
        serde_json::json!("in-progress")
    );
    assert_eq!(
        CourseStatus::from_str("not-started").unwrap(),
        CourseStatus::NotStarted
    );
    assert_eq!(CourseStatus::Locked.to_string(), "locked");
    assert!(CourseStatus::from_str("done").is_err());
}

#[test]
fn test_roadmap_decodes_with_defaults() {
    let roadmap: LearningRoadmap = serde_json::from_value(serde_json::json!({
        "stages": [{
            "stage": "Foundation",
            "description": "Core programming",
            "progress": 50,
            "courses": [{
                "id": 1, "title": "Python Basics", "duration": "4 weeks",
                "topics": 12, "status": "completed", "progress": 100
            }]
        }],
        "milestones": [{"id": 1, "title": "First project", "completed": false}]
    }))
    .unwrap();
    assert_eq!(roadmap.stages[0].courses[0].status, CourseStatus::Completed);
    assert_eq!(roadmap.milestones[0].target_date, None);
    assert_eq!(roadmap.stats, RoadmapStats::default());
}
