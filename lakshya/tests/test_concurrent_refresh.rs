mod common;

use common::*;
use lakshya::api::roadmap::CourseStatus;
use serde_json::json;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// Minimal stand-in for the backend: one valid access token at a time, refresh tokens that
/// rotate on use.
struct FakeServer {
    access: Mutex<String>,
    refresh: Mutex<String>,
    refreshes: AtomicUsize,
}

impl FakeServer {
    fn new(access: &str, refresh: &str) -> Arc<Self> {
        Arc::new(FakeServer {
            access: Mutex::new(access.to_string()),
            refresh: Mutex::new(refresh.to_string()),
            refreshes: AtomicUsize::new(0),
        })
    }

    fn handle(&self, req: &Recorded) -> lakshya::HttpResponse {
        if req.endpoint == "/auth/refresh" {
            let presented = req.body.as_ref().unwrap()["refresh_token"]
                .as_str()
                .unwrap()
                .to_string();
            let mut refresh = self.refresh.lock().unwrap();
            if presented != *refresh {
                return detail(401, "Invalid refresh token");
            }
            let n = self.refreshes.fetch_add(1, Ordering::SeqCst) + 1;
            let new_access = format!("AT{}", n + 1);
            let new_refresh = format!("RT{}", n + 1);
            *self.access.lock().unwrap() = new_access.clone();
            *refresh = new_refresh.clone();
            return json_response(200, token_json(&new_access, &new_refresh));
        }
        let expected = format!("Bearer {}", self.access.lock().unwrap());
        if req.authorization.as_deref() != Some(expected.as_str()) {
            return detail(401, "Could not validate credentials");
        }
        match req.endpoint.as_str() {
            "/users/me" => json_response(200, profile_json()),
            "/careers/trends" => json_response(200, json!([{"month": "Jan", "score": 40}])),
            "/careers/activity" => json_response(200, json!([{"day": "Mon", "hours": 1.5}])),
            "/roadmap/courses/3" => json_response(
                200,
                json!({
                    "id": 3, "title": "SQL", "duration": "2 weeks", "topics": 8,
                    "status": "in-progress", "progress": 40
                }),
            ),
            _ => detail(404, "Not Found"),
        }
    }
}

fn client_for(server: &Arc<FakeServer>) -> (lakshya::ApiClient, Arc<FakeTransport>, Arc<AtomicUsize>) {
    let s = server.clone();
    let transport = FakeTransport::new(move |req| Ok(s.handle(req)));
    let (client, logouts) = client_with(transport.clone(), signed_in_store("AT1", Some("RT1")));
    (client, transport, logouts)
}

#[tokio::test]
async fn test_concurrent_401s_share_one_refresh() {
    // the server no longer accepts AT1, but RT1 is still good
    let server = FakeServer::new("stale-on-server", "RT1");
    let (client, transport, logouts) = client_for(&server);

    let (profile, trends, activity) = futures::join!(
        client.profile(),
        client.career_trends(),
        client.activity()
    );
    assert_eq!(profile.unwrap().id, 1);
    assert_eq!(trends.unwrap()[0].month, "Jan");
    assert_eq!(activity.unwrap()[0].hours, 1.5);

    assert_eq!(server.refreshes.load(Ordering::SeqCst), 1);
    let refresh_calls = transport
        .endpoints()
        .iter()
        .filter(|e| e.as_str() == "POST /auth/refresh")
        .count();
    assert_eq!(refresh_calls, 1);
    // three originals, one refresh, three retries
    assert_eq!(transport.requests().len(), 7);
    assert_eq!(client.session().access_token().as_deref(), Some("AT2"));
    assert_eq!(client.session().refresh_token().as_deref(), Some("RT2"));
    assert_eq!(logouts.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_concurrent_terminal_failure() {
    // nothing the client holds is valid anymore
    let server = FakeServer::new("other", "other-refresh");
    let (client, _transport, logouts) = client_for(&server);

    let (a, b) = futures::join!(client.career_trends(), client.activity());
    assert_eq!(a.unwrap_err().status(), Some(401));
    assert_eq!(b.unwrap_err().status(), Some(401));
    assert!(!client.session().is_authenticated());
    // the refresh is rejected, so neither caller gets a retry
    assert_eq!(server.refreshes.load(Ordering::SeqCst), 0);
    assert!(logouts.load(Ordering::SeqCst) >= 1);
}

#[tokio::test]
async fn test_sequential_calls_after_refresh_use_new_token() {
    let server = FakeServer::new("fresh", "RT1");
    let (client, transport, _) = client_for(&server);

    let course = client
        .update_course_progress(3, 40.0, CourseStatus::InProgress)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(course.status, CourseStatus::InProgress);
    client.career_trends().await.unwrap();

    let reqs = transport.requests();
    assert_eq!(reqs.len(), 4);
    assert_eq!(
        reqs[0].body,
        Some(json!({"course_id": 3, "progress": 40.0, "status": "in-progress"}))
    );
    assert_eq!(reqs[3].authorization.as_deref(), Some("Bearer AT2"));
    assert_eq!(server.refreshes.load(Ordering::SeqCst), 1);
}
