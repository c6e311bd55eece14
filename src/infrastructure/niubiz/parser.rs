//! Tolerant readers for gateway responses.
//!
//! The authorization schema has drifted across API versions and casings. Each
//! logical field is resolved through an ordered table of JSON paths; the
//! first path that yields a value wins. Supporting a new schema variant means
//! adding a row.

use crate::domain::checkout::AuthorizationOutcome;
use crate::error::{CheckoutError, Result};
use serde_json::Value;
use tracing::warn;

/// Action code the gateway uses for an approved operation in every schema.
pub const APPROVED_ACTION_CODE: &str = "000";

type JsonPath = &'static [&'static str];

#[derive(Debug, Clone, Copy)]
enum Expect {
    Equals(&'static str),
    EqualsIgnoreCase(&'static str),
}

impl Expect {
    fn matches(&self, value: &str) -> bool {
        match self {
            Self::Equals(expected) => value == *expected,
            Self::EqualsIgnoreCase(expected) => value.eq_ignore_ascii_case(expected),
        }
    }
}

#[derive(Debug)]
struct ApprovalRule {
    path: JsonPath,
    expect: Expect,
}

const APPROVAL_RULES: &[ApprovalRule] = &[
    ApprovalRule {
        path: &["order", "actionCode"],
        expect: Expect::Equals(APPROVED_ACTION_CODE),
    },
    ApprovalRule {
        path: &["dataMap", "ACTION_CODE"],
        expect: Expect::Equals(APPROVED_ACTION_CODE),
    },
    ApprovalRule {
        path: &["dataMap", "STATUS"],
        expect: Expect::EqualsIgnoreCase("Authorized"),
    },
    // legacy
    ApprovalRule {
        path: &["data", "ACTION_CODE"],
        expect: Expect::Equals(APPROVED_ACTION_CODE),
    },
    ApprovalRule {
        path: &["actionCode"],
        expect: Expect::Equals(APPROVED_ACTION_CODE),
    },
];

const AUTHORIZATION_CODE_PATHS: &[JsonPath] = &[
    &["order", "authorizationCode"],
    &["dataMap", "AUTHORIZATION_CODE"],
    &["data", "AUTHORIZATION_CODE"],
    &["authorizationCode"],
];

const MASKED_CARD_PATHS: &[JsonPath] = &[&["dataMap", "CARD"], &["data", "CARD", "CARDNUMBER"]];

const SESSION_KEY_FIELDS: &[&str] = &["sessionKey", "sessionkey"];

fn lookup<'a>(root: &'a Value, path: &[&str]) -> Option<&'a Value> {
    path.iter().try_fold(root, |node, key| node.get(*key))
}

/// Non-empty string at `path`; anything else counts as absent.
fn lookup_str<'a>(root: &'a Value, path: &[&str]) -> Option<&'a str> {
    lookup(root, path)
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
}

fn first_present(root: &Value, paths: &[JsonPath]) -> Option<String> {
    paths
        .iter()
        .find_map(|path| lookup_str(root, path))
        .map(str::to_string)
}

/// Reads an authorization response body. Denial by default: a body that does
/// not parse, or matches no approval rule, yields `approved = false`. The raw
/// body is always carried through for audit.
pub fn parse_authorization(body: &str) -> AuthorizationOutcome {
    let root: Value = match serde_json::from_str(body) {
        Ok(root) => root,
        Err(e) => {
            warn!(error = %e, "Unparseable authorization response, treating as declined");
            return AuthorizationOutcome::denied(body);
        }
    };

    let approved = APPROVAL_RULES.iter().any(|rule| {
        lookup_str(&root, rule.path).is_some_and(|value| rule.expect.matches(value))
    });

    AuthorizationOutcome {
        approved,
        authorization_code: first_present(&root, AUTHORIZATION_CODE_PATHS),
        masked_card: first_present(&root, MASKED_CARD_PATHS),
        raw_response: body.to_string(),
    }
}

/// Extracts the session key, accepting either casing of the field name.
pub fn parse_session_key(body: &str) -> Result<String> {
    let root: Value = serde_json::from_str(body).map_err(|e| {
        CheckoutError::InvalidGatewayResponse(format!("invalid session response: {}", e))
    })?;

    SESSION_KEY_FIELDS
        .iter()
        .find_map(|field| root.get(*field))
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|key| !key.is_empty())
        .map(str::to_string)
        .ok_or_else(|| {
            CheckoutError::InvalidGatewayResponse("invalid session response".to_string())
        })
}

/// Security token bodies are raw text, sometimes wrapped in quotes.
pub fn parse_security_token(body: &str) -> Result<String> {
    let token = body.trim().trim_matches('"');
    if token.is_empty() {
        return Err(CheckoutError::InvalidGatewayResponse(
            "empty security token".to_string(),
        ));
    }
    Ok(token.to_string())
}
