//! User profile, onboarding, skills, and preferences (`/users/*`)

use crate::api::check_percentage;
use crate::client::{ApiClient, ApiRequest};
use crate::error::ApiError;

#[derive(Debug, serde::Serialize, serde::Deserialize, Clone, PartialEq, Eq)]
pub struct User {
    pub id: i64,
    pub email: String,
    pub name: String,
    pub role: String,
    #[serde(default)]
    pub education: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, serde::Serialize, serde::Deserialize, Clone, PartialEq)]
pub struct UserWithSkills {
    pub id: i64,
    pub email: String,
    pub name: String,
    pub role: String,
    #[serde(default)]
    pub education: Option<String>,
    #[serde(default)]
    pub skills: Vec<UserSkill>,
    #[serde(default)]
    pub preferences: Vec<UserPreference>,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, serde::Serialize, serde::Deserialize, Clone, PartialEq)]
pub struct UserSkill {
    pub id: i64,
    pub user_id: i64,
    pub skill_name: String,
    /// 0 to 100
    pub proficiency: f64,
    pub created_at: String,
}

#[derive(Debug, serde::Serialize, serde::Deserialize, Clone, PartialEq, Eq)]
pub struct UserPreference {
    pub id: i64,
    pub user_id: i64,
    #[serde(default)]
    pub interest: Option<String>,
    #[serde(default)]
    pub goal: Option<String>,
    pub created_at: String,
}

#[derive(Debug, serde::Serialize, serde::Deserialize, Clone, PartialEq, Eq, Default)]
pub struct UserUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub education: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
}

#[derive(Debug, serde::Serialize, serde::Deserialize, Clone, PartialEq, Eq)]
pub struct OnboardingRequest {
    pub education: String,
    pub skills: Vec<String>,
    pub interests: Vec<String>,
    pub goals: Vec<String>,
}

#[derive(Debug, serde::Serialize, serde::Deserialize, Clone, PartialEq)]
pub struct UserSkillCreate {
    pub skill_name: String,
    pub proficiency: f64,
}

#[derive(Debug, serde::Serialize, serde::Deserialize, Clone, PartialEq, Default)]
pub struct UserSkillUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub skill_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub proficiency: Option<f64>,
}

#[derive(Debug, serde::Serialize, serde::Deserialize, Clone, PartialEq, Eq, Default)]
pub struct PreferenceCreate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub interest: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub goal: Option<String>,
}

impl ApiClient {
    pub async fn profile(&self) -> Result<UserWithSkills, ApiError> {
        self.request(&ApiRequest::get("/users/me")).await
    }

    pub async fn update_profile(&self, data: &UserUpdate) -> Result<User, ApiError> {
        self.request(&ApiRequest::put("/users/me").json(data)?)
            .await
    }

    pub async fn complete_onboarding(&self, data: &OnboardingRequest) -> Result<User, ApiError> {
        self.request(&ApiRequest::post("/users/onboarding").json(data)?)
            .await
    }

    pub async fn skills(&self) -> Result<Vec<UserSkill>, ApiError> {
        self.request(&ApiRequest::get("/users/skills")).await
    }

    pub async fn add_skill(&self, data: &UserSkillCreate) -> Result<UserSkill, ApiError> {
        check_percentage("proficiency", data.proficiency)?;
        self.request(&ApiRequest::post("/users/skills").json(data)?)
            .await
    }

    pub async fn update_skill(
        &self,
        skill_id: i64,
        data: &UserSkillUpdate,
    ) -> Result<UserSkill, ApiError> {
        if let Some(p) = data.proficiency {
            check_percentage("proficiency", p)?;
        }
        let req = ApiRequest::put(format!("/users/skills/{skill_id}")).json(data)?;
        self.request(&req).await
    }

    /// Server answers 204 No Content.
    pub async fn delete_skill(&self, skill_id: i64) -> Result<(), ApiError> {
        self.send(&ApiRequest::delete(format!("/users/skills/{skill_id}")))
            .await?;
        Ok(())
    }

    pub async fn preferences(&self) -> Result<Vec<UserPreference>, ApiError> {
        self.request(&ApiRequest::get("/users/preferences")).await
    }

    pub async fn add_preference(
        &self,
        data: &PreferenceCreate,
    ) -> Result<UserPreference, ApiError> {
        self.request(&ApiRequest::post("/users/preferences").json(data)?)
            .await
    }
}

#[test]
fn test_user_with_skills_decodes() {
    let val = serde_json::json!({
        "id": 3,
        "email": "a@x.com",
        "name": "Asha",
        "role": "student",
        "education": null,
        "skills": [{
            "id": 1, "user_id": 3, "skill_name": "Python", "proficiency": 72.5,
            "created_at": "2024-01-02T10:00:00"
        }],
        "created_at": "2024-01-01T00:00:00",
        "updated_at": "2024-01-01T00:00:00"
    });
    let profile: UserWithSkills = serde_json::from_value(val).unwrap();
    assert_eq!(profile.education, None);
    assert_eq!(profile.skills[0].skill_name, "Python");
    assert!(profile.preferences.is_empty());
}

#[test]
fn test_partial_updates_omit_unset_fields() {
    let update = UserUpdate {
        education: Some("B.Tech".to_string()),
        ..Default::default()
    };
    assert_eq!(
        serde_json::to_value(&update).unwrap(),
        serde_json::json!({"education": "B.Tech"})
    );
}
