mod common;

use common::*;
use lakshya::api::auth::ChangePasswordRequest;
use lakshya::api::roadmap::CourseStatus;
use lakshya::api::users::{OnboardingRequest, PreferenceCreate, UserSkillCreate, UserUpdate};
use lakshya::ApiError;
use serde_json::json;

#[tokio::test]
async fn test_profile_and_onboarding_wrappers() {
    let transport = FakeTransport::scripted(vec![
        json_response(200, user_json(1, "a@x.com")),
        json_response(200, user_json(1, "a@x.com")),
        json_response(201, json!({
            "id": 5, "user_id": 1, "skill_name": "SQL", "proficiency": 55.0,
            "created_at": "2024-02-01T00:00:00"
        })),
        json_response(201, json!({
            "id": 2, "user_id": 1, "interest": "Data Science", "goal": null,
            "created_at": "2024-02-01T00:00:00"
        })),
    ]);
    let (client, _) = client_with(transport.clone(), signed_in_store("AT1", Some("RT1")));

    client
        .update_profile(&UserUpdate {
            name: Some("Asha V".to_string()),
            ..Default::default()
        })
        .await
        .unwrap();
    client
        .complete_onboarding(&OnboardingRequest {
            education: "B.Tech".to_string(),
            skills: vec!["Python".to_string()],
            interests: vec!["Data".to_string()],
            goals: vec!["Analyst".to_string()],
        })
        .await
        .unwrap();
    let skill = client
        .add_skill(&UserSkillCreate {
            skill_name: "SQL".to_string(),
            proficiency: 55.0,
        })
        .await
        .unwrap();
    assert_eq!(skill.id, 5);
    let pref = client
        .add_preference(&PreferenceCreate {
            interest: Some("Data Science".to_string()),
            goal: None,
        })
        .await
        .unwrap();
    assert_eq!(pref.goal, None);

    assert_eq!(
        transport.endpoints(),
        vec![
            "PUT /users/me",
            "POST /users/onboarding",
            "POST /users/skills",
            "POST /users/preferences"
        ]
    );
    let reqs = transport.requests();
    assert_eq!(reqs[0].body, Some(json!({"name": "Asha V"})));
    assert_eq!(reqs[3].body, Some(json!({"interest": "Data Science"})));
}

#[tokio::test]
async fn test_client_side_validation() {
    let transport = FakeTransport::scripted(vec![]);
    let (client, _) = client_with(transport.clone(), signed_in_store("AT1", Some("RT1")));

    let err = client
        .add_skill(&UserSkillCreate {
            skill_name: "SQL".to_string(),
            proficiency: 120.0,
        })
        .await
        .unwrap_err();
    assert!(matches!(err, ApiError::InvalidRequest(_)));
    let err = client
        .update_course_progress(1, -5.0, CourseStatus::InProgress)
        .await
        .unwrap_err();
    assert!(matches!(err, ApiError::InvalidRequest(_)));
    let err = client
        .change_password(&ChangePasswordRequest {
            current_password: "old-secret".to_string(),
            new_password: "abc".to_string(),
        })
        .await
        .unwrap_err();
    assert!(matches!(err, ApiError::InvalidRequest(_)));
    assert!(transport.requests().is_empty());
}

#[tokio::test]
async fn test_interview_category_is_path_encoded() {
    let transport = FakeTransport::scripted(vec![json_response(
        200,
        json!({
            "category": "Problem Solving",
            "count": 1,
            "answered_count": 0,
            "questions": [{
                "id": 9, "question": "Reverse a linked list", "category": "Problem Solving",
                "difficulty": "Medium", "tags": ["lists"], "answered": false, "rating": null
            }]
        }),
    )]);
    let (client, _) = client_with(transport.clone(), signed_in_store("AT1", Some("RT1")));

    let cat = client.interview_category("Problem Solving").await.unwrap();
    assert_eq!(cat.questions[0].id, 9);
    assert_eq!(
        transport.endpoints(),
        vec!["GET /interview/categories/Problem%20Solving"]
    );
}

#[tokio::test]
async fn test_read_only_wrappers() {
    let transport = FakeTransport::scripted(vec![
        json_response(200, json!([{
            "role": "Data Analyst", "match_percentage": 64.5, "demand": "High"
        }])),
        json_response(200, json!({
            "overall_score": 62, "technical_skills_score": 70, "soft_skills_score": 55,
            "experience_score": 40, "breakdown": {"Python": 80}
        })),
        json_response(200, json!({
            "total_skills": 4, "high_priority_count": 2, "in_progress_count": 1,
            "completed_count": 1, "overall_gap_score": 35.5,
            "radar_data": [{"skill": "SQL", "current": 40, "target": 80}],
            "skill_gaps": [{
                "skill_name": "SQL", "current_level": 40, "target_level": 80,
                "priority": "High", "estimated_effort": "3 weeks",
                "gap_score": 40, "status": "in-progress"
            }]
        })),
        json_response(200, json!([
            {"title": "TypeScript Advanced", "reason": "Boosts your score", "impact": "High"}
        ])),
        json_response(200, json!({
            "message": "Try the SQL course next.", "suggestions": ["Open roadmap"]
        })),
    ]);
    let (client, _) = client_with(transport.clone(), signed_in_store("AT1", Some("RT1")));

    let matches = client.career_matches().await.unwrap();
    assert_eq!(matches[0].role, "Data Analyst");
    let readiness = client.readiness_score().await.unwrap();
    assert_eq!(readiness.breakdown["Python"], 80.0);
    let analysis = client.skill_analysis().await.unwrap();
    assert_eq!(analysis.skill_gaps[0].estimated_effort.as_deref(), Some("3 weeks"));
    let recommended = client.recommended_courses().await.unwrap();
    assert_eq!(recommended[0].impact.as_deref(), Some("High"));
    let reply = client.send_chat_message("what next?").await.unwrap();
    assert_eq!(reply.suggestions, vec!["Open roadmap".to_string()]);

    assert_eq!(
        transport.endpoints(),
        vec![
            "GET /careers/matches",
            "GET /careers/readiness",
            "GET /skills/analysis",
            "GET /roadmap/recommended",
            "POST /chat"
        ]
    );
    assert_eq!(
        transport.requests()[4].body,
        Some(json!({"message": "what next?"}))
    );
}

#[tokio::test]
async fn test_chat_reply_with_null_suggestions() {
    let transport = FakeTransport::scripted(vec![json_response(
        200,
        json!({"message": "hi", "suggestions": null}),
    )]);
    let (client, _) = client_with(transport.clone(), signed_in_store("AT1", Some("RT1")));

    let reply = client.send_chat_message("hello").await.unwrap();
    assert_eq!(reply.message, "hi");
    assert!(reply.suggestions.is_empty());
}
