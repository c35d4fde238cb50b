use anyhow::anyhow;
pub use anyhow::Result;
use serde_json::Value;
use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;

/// The unverified payload of an access or refresh token.
///
/// Only for display and diagnostics: the server alone decides whether a token is valid.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenClaims {
    pub sub: Option<String>,
    pub exp: Option<i64>,
    pub token_type: Option<String>,
}

impl TokenClaims {
    pub fn expires_at(&self) -> Option<OffsetDateTime> {
        self.exp
            .and_then(|exp| OffsetDateTime::from_unix_timestamp(exp).ok())
    }

    pub fn is_expired_at(&self, now: OffsetDateTime) -> bool {
        match self.expires_at() {
            Some(exp) => exp <= now,
            None => false,
        }
    }

    /// Expiry as an RFC 3339 timestamp, for display.
    pub fn expiry_display(&self) -> Option<String> {
        self.expires_at().and_then(|t| t.format(&Rfc3339).ok())
    }

    pub fn is_expired(&self) -> bool {
        self.is_expired_at(OffsetDateTime::now_utc())
    }
}

/// Decodes the claims segment of a JWT (base64url middle segment) without checking the
/// signature.
pub fn parse_token_claims(jwt: &str) -> Result<TokenClaims> {
    let second_b64 = jwt.split('.').nth(1).ok_or(anyhow!("couldn't parse JWT"))?;
    let second_json: Vec<u8> = base64::decode_config(second_b64, base64::URL_SAFE_NO_PAD)?;
    let obj: Value = serde_json::from_slice(&second_json)?;
    if !obj.is_object() {
        return Err(anyhow!("JWT payload is not an object"));
    }
    // "sub" is the numeric user id, which some encoders emit as a string
    let sub = match &obj["sub"] {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    };
    Ok(TokenClaims {
        sub,
        exp: obj["exp"].as_i64(),
        token_type: obj["type"].as_str().map(|s| s.to_string()),
    })
}

#[test]
fn test_parse_token_claims() {
    assert!(parse_token_claims(".").is_err());
    assert!(parse_token_claims("eyJhbGciOiJIUzI1NiIsInR5cCI6IkpXVCJ9").is_err());

    // {"sub": "42", "exp": 1700000000, "type": "access"}
    let payload = base64::encode_config(
        r#"{"sub": "42", "exp": 1700000000, "type": "access"}"#,
        base64::URL_SAFE_NO_PAD,
    );
    let jwt = format!("eyJhbGciOiJIUzI1NiIsInR5cCI6IkpXVCJ9.{payload}.c2ln");
    let claims = parse_token_claims(&jwt).unwrap();
    assert_eq!(claims.sub.as_deref(), Some("42"));
    assert_eq!(claims.exp, Some(1700000000));
    assert_eq!(claims.token_type.as_deref(), Some("access"));
    assert!(claims.is_expired_at(OffsetDateTime::from_unix_timestamp(1700000000).unwrap()));
    assert!(!claims.is_expired_at(OffsetDateTime::from_unix_timestamp(1699999999).unwrap()));
    assert_eq!(
        claims.expiry_display().as_deref(),
        Some("2023-11-14T22:13:20Z")
    );

    // numeric subject, no expiry
    let payload = base64::encode_config(r#"{"sub": 7}"#, base64::URL_SAFE_NO_PAD);
    let claims = parse_token_claims(&format!("x.{payload}.y")).unwrap();
    assert_eq!(claims.sub.as_deref(), Some("7"));
    assert_eq!(claims.expires_at(), None);
    assert!(!claims.is_expired_at(OffsetDateTime::now_utc()));
}
