//! Types shared by every OpsGenie resource.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Fields a typed model does not name explicitly. Kept so that rendering a
/// response shows everything the API returned.
pub type Extra = BTreeMap<String, Value>;

/// Envelope for synchronous responses: `{"data": ..., "took": ..., "requestId": ...}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiResponse<T> {
    pub data: T,
    #[serde(default)]
    pub took: f64,
    #[serde(default)]
    pub request_id: String,
}

/// Envelope for list responses that are not paged.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListResponse<T> {
    #[serde(default = "Vec::new")]
    pub data: Vec<T>,
    #[serde(default)]
    pub took: f64,
    #[serde(default)]
    pub request_id: String,
}

/// Response to requests OpsGenie processes asynchronously. The request id
/// can be passed to `getRequestStatus`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AsyncResponse {
    #[serde(default)]
    pub result: String,
    #[serde(default)]
    pub took: f64,
    #[serde(default)]
    pub request_id: String,
}

/// Body shared by alert and incident actions.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ActionRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdentifierType {
    Id,
    Alias,
    Tiny,
    Name,
}

impl IdentifierType {
    pub fn as_str(&self) -> &'static str {
        match self {
            IdentifierType::Id => "id",
            IdentifierType::Alias => "alias",
            IdentifierType::Tiny => "tiny",
            IdentifierType::Name => "name",
        }
    }
}

impl fmt::Display for IdentifierType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A resource reference: the value goes into the URL path, the type into the
/// `identifierType` query parameter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identifier {
    pub value: String,
    pub kind: IdentifierType,
}

impl Identifier {
    pub fn new(value: impl Into<String>, kind: IdentifierType) -> Self {
        Self {
            value: value.into(),
            kind,
        }
    }

    pub fn id(value: impl Into<String>) -> Self {
        Self::new(value, IdentifierType::Id)
    }

    pub fn name(value: impl Into<String>) -> Self {
        Self::new(value, IdentifierType::Name)
    }

    pub fn path_segment(&self) -> String {
        urlencoding::encode(&self.value).into_owned()
    }

    /// Builds `{prefix}/{value}{suffix}?identifierType={kind}`.
    pub fn path(&self, prefix: &str, suffix: &str) -> String {
        self.path_with_query(prefix, suffix, "identifierType")
    }

    /// Same as [`Identifier::path`] for endpoints that name the type
    /// parameter differently (e.g. `scheduleIdentifierType`).
    pub fn path_with_query(&self, prefix: &str, suffix: &str, param: &str) -> String {
        format!(
            "{prefix}/{}{suffix}?{param}={}",
            self.path_segment(),
            self.kind
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResponderType {
    User,
    Team,
    Escalation,
    Schedule,
}

impl FromStr for ResponderType {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "user" => Ok(ResponderType::User),
            "team" => Ok(ResponderType::Team),
            "escalation" => Ok(ResponderType::Escalation),
            "schedule" => Ok(ResponderType::Schedule),
            other => Err(format!(
                "unknown responder type '{other}', expected one of: user, team, escalation, schedule"
            )),
        }
    }
}

/// Someone who can be notified about an alert or incident.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Responder {
    #[serde(rename = "type")]
    pub kind: ResponderType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
}

impl Responder {
    /// Users are addressed by username, every other responder by name.
    pub fn named(kind: ResponderType, value: impl Into<String>) -> Self {
        let value = value.into();
        let (name, username) = match kind {
            ResponderType::User => (None, Some(value)),
            _ => (Some(value), None),
        };
        Self {
            kind,
            id: None,
            name,
            username,
        }
    }
}

/// Reference to a team by id or name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TeamRef {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl TeamRef {
    pub fn from_identifier(identifier: &Identifier) -> Self {
        match identifier.kind {
            IdentifierType::Id => Self {
                id: Some(identifier.value.clone()),
                name: None,
            },
            _ => Self {
                id: None,
                name: Some(identifier.value.clone()),
            },
        }
    }
}

/// Reference to a user by id or username.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRef {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identifier_path_encodes_value_and_type() {
        let identifier = Identifier::new("db/primary down", IdentifierType::Alias);
        assert_eq!(
            identifier.path("/v2/alerts", "/acknowledge"),
            "/v2/alerts/db%2Fprimary%20down/acknowledge?identifierType=alias"
        );
    }

    #[test]
    fn identifier_path_with_custom_parameter() {
        let identifier = Identifier::name("primary");
        assert_eq!(
            identifier.path_with_query("/v2/schedules", "/on-calls", "scheduleIdentifierType"),
            "/v2/schedules/primary/on-calls?scheduleIdentifierType=name"
        );
    }

    #[test]
    fn user_responders_use_username() {
        let responder = Responder::named(ResponderType::User, "jane@example.com");
        let value = serde_json::to_value(&responder).unwrap();
        assert_eq!(
            value,
            serde_json::json!({"type": "user", "username": "jane@example.com"})
        );
    }

    #[test]
    fn team_responders_use_name() {
        let responder = Responder::named(ResponderType::Team, "ops");
        let value = serde_json::to_value(&responder).unwrap();
        assert_eq!(value, serde_json::json!({"type": "team", "name": "ops"}));
    }

    #[test]
    fn responder_type_parsing_is_case_insensitive() {
        assert_eq!("Team".parse::<ResponderType>(), Ok(ResponderType::Team));
        assert_eq!(" schedule ".parse::<ResponderType>(), Ok(ResponderType::Schedule));
        assert!("group".parse::<ResponderType>().is_err());
    }

    #[test]
    fn empty_action_request_serializes_to_empty_object() {
        let body = serde_json::to_string(&ActionRequest::default()).unwrap();
        assert_eq!(body, "{}");
    }

    #[test]
    fn team_ref_follows_identifier_type() {
        assert_eq!(
            TeamRef::from_identifier(&Identifier::id("42")),
            TeamRef {
                id: Some("42".to_string()),
                name: None
            }
        );
        assert_eq!(
            TeamRef::from_identifier(&Identifier::name("ops")),
            TeamRef {
                id: None,
                name: Some("ops".to_string())
            }
        );
    }
}
