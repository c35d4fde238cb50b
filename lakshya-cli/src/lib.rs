use anyhow::anyhow;
pub use anyhow::Result;
use lazy_static::lazy_static;
use regex::Regex;
use serde_json::Value;
use std::str::FromStr;

use lakshya::auth::parse_token_claims;

pub use lakshya::*;

pub mod pretty;

/// Represents fields/content specified on the command line.
///
/// Sort of like HTTPie. Body values (JSON) are `key=value`, extra request headers are
/// `Name:value`. Only single-level body values are allowed, not JSON Pointer assignment.
#[derive(Debug, PartialEq, Eq, Clone)]
pub enum ArgField {
    Body(String, serde_json::Value),
    Header(String, String),
}

impl FromStr for ArgField {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        lazy_static! {
            static ref BODY_RE: Regex = Regex::new(r"^([a-zA-Z_][a-zA-Z0-9_]*)=(.*)$").unwrap();
        }
        lazy_static! {
            static ref HEADER_RE: Regex = Regex::new(r"^([A-Za-z0-9-]+):(.*)$").unwrap();
        }
        if let Some(captures) = BODY_RE.captures(s) {
            let key = captures[1].to_string();
            let val =
                Value::from_str(&captures[2]).unwrap_or(Value::String(captures[2].to_string()));
            let val = match val {
                Value::String(s) if s.is_empty() => Value::Null,
                _ => val,
            };
            Ok(ArgField::Body(key, val))
        } else if let Some(captures) = HEADER_RE.captures(s) {
            Ok(ArgField::Header(
                captures[1].to_string(),
                captures[2].trim().to_string(),
            ))
        } else {
            Err(anyhow!("could not parse as a field assignment: {}", s))
        }
    }
}

#[test]
fn test_argfield() {
    use serde_json::json;
    assert_eq!(
        ArgField::from_str("a=3").unwrap(),
        ArgField::Body("a".to_string(), json!(3)),
    );
    assert_eq!(
        ArgField::from_str("skill_name=\"SQL\"").unwrap(),
        ArgField::Body("skill_name".to_string(), Value::String("SQL".to_string()))
    );
    assert_eq!(
        ArgField::from_str("skill_name=SQL").unwrap(),
        ArgField::Body("skill_name".to_string(), Value::String("SQL".to_string()))
    );
    assert_eq!(
        ArgField::from_str("education=").unwrap(),
        ArgField::Body("education".to_string(), Value::Null),
    );
    assert_eq!(
        ArgField::from_str("X-Request-Id: abc=1").unwrap(),
        ArgField::Header("X-Request-Id".to_string(), "abc=1".to_string()),
    );

    assert!(ArgField::from_str("a").is_err());
    assert!(ArgField::from_str("").is_err());
    assert!(ArgField::from_str("asdf.fee").is_err());

    assert!(ArgField::from_str("message=\"other value\"").is_ok());
}

/// Collects the body fields into a JSON object, or `None` if there were none.
pub fn value_from_fields(fields: &[ArgField]) -> Option<Value> {
    let mut map = serde_json::map::Map::new();
    for f in fields.iter() {
        if let ArgField::Body(k, v) = f {
            map.insert(k.clone(), v.clone());
        }
    }
    if map.is_empty() {
        None
    } else {
        Some(Value::Object(map))
    }
}

/// Builds a raw pipeline request from a method name, endpoint path, and CLI fields.
pub fn request_from_fields(method: &str, endpoint: &str, fields: &[ArgField]) -> Result<ApiRequest> {
    let method = reqwest_method(method)?;
    let endpoint = if endpoint.starts_with('/') {
        endpoint.to_string()
    } else {
        format!("/{endpoint}")
    };
    let mut req = ApiRequest::new(method, endpoint);
    if let Some(body) = value_from_fields(fields) {
        req = req.json(&body)?;
    }
    for f in fields.iter() {
        if let ArgField::Header(k, v) = f {
            req = req.header(k, v)?;
        }
    }
    Ok(req)
}

fn reqwest_method(s: &str) -> Result<lakshya::client::Method> {
    match s.to_ascii_lowercase().as_str() {
        "get" => Ok(lakshya::client::Method::GET),
        "post" => Ok(lakshya::client::Method::POST),
        "put" => Ok(lakshya::client::Method::PUT),
        "patch" => Ok(lakshya::client::Method::PATCH),
        "delete" => Ok(lakshya::client::Method::DELETE),
        _ => Err(anyhow!("unknown method: {}", s)),
    }
}

#[test]
fn test_request_from_fields() {
    use serde_json::json;
    let fields = vec![
        ArgField::from_str("proficiency=80").unwrap(),
        ArgField::from_str("X-Trace:t1").unwrap(),
    ];
    let req = request_from_fields("put", "users/skills/3", &fields).unwrap();
    assert_eq!(req.method().as_str(), "PUT");
    assert_eq!(req.endpoint(), "/users/skills/3");
    assert_eq!(req.body(), Some(&json!({"proficiency": 80})));
    assert_eq!(req.headers()["x-trace"], "t1");

    let req = request_from_fields("GET", "/careers/matches", &[]).unwrap();
    assert_eq!(req.body(), None);
    assert!(request_from_fields("fetch", "/x", &[]).is_err());
}

/// Human-readable description of the stored session, one line per fact.
///
/// "authenticated" follows `SessionStore::is_authenticated`; the user line is reported on
/// its own, since a stored token can outlive a readable user record.
pub fn session_summary(session: &SessionStore) -> Vec<String> {
    let mut lines = vec![];
    let token = match session.access_token() {
        Some(t) => t,
        None => {
            lines.push("authenticated: no".to_string());
            return lines;
        }
    };
    lines.push("authenticated: yes".to_string());
    match session.user() {
        Some(user) => lines.push(format!(
            "user: {} <{}> (id {}, {})",
            user.name, user.email, user.id, user.role
        )),
        None => lines.push("user: <missing or unreadable>".to_string()),
    }
    if session.refresh_token().is_none() {
        lines.push("refresh token: <none>".to_string());
    }
    match parse_token_claims(&token) {
        Ok(claims) => {
            if let Some(sub) = &claims.sub {
                lines.push(format!("token subject: {}", sub));
            }
            if let Some(exp) = claims.expiry_display() {
                let note = if claims.is_expired() {
                    " (expired; will refresh on next request)"
                } else {
                    ""
                };
                lines.push(format!("access token expires: {}{}", exp, note));
            }
        }
        Err(e) => lines.push(format!("access token: <opaque> ({})", e)),
    }
    lines
}

#[test]
fn test_session_summary() {
    use lakshya::session::{ACCESS_TOKEN_KEY, REFRESH_TOKEN_KEY, USER_KEY};
    use std::sync::Arc;

    let store = SessionStore::open_ephemeral();
    assert_eq!(session_summary(&store), vec!["authenticated: no"]);

    // token present, user record corrupt
    let backend = Arc::new(MemoryStore::new());
    backend
        .set_many(&[
            (ACCESS_TOKEN_KEY, "opaque-token".to_string()),
            (REFRESH_TOKEN_KEY, "RT1".to_string()),
            (USER_KEY, "{not json".to_string()),
        ])
        .unwrap();
    let store = SessionStore::new(backend);
    assert!(store.is_authenticated());
    let lines = session_summary(&store);
    assert_eq!(lines[0], "authenticated: yes");
    assert_eq!(lines[1], "user: <missing or unreadable>");
    assert!(lines[2].starts_with("access token: <opaque>"));

    let user: lakshya::api::users::User = serde_json::from_value(serde_json::json!({
        "id": 1, "email": "a@x.com", "name": "Asha", "role": "student",
        "created_at": "2024-01-01T00:00:00", "updated_at": "2024-01-01T00:00:00"
    }))
    .unwrap();
    let store = SessionStore::open_ephemeral();
    store.set_session("opaque-token", "RT1", &user).unwrap();
    let lines = session_summary(&store);
    assert_eq!(lines[1], "user: Asha <a@x.com> (id 1, student)");
}
