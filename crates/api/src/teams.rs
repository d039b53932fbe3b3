//! Team API (`/v2/teams`).

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::Result;
use crate::models::{ApiResponse, AsyncResponse, Extra, Identifier, ListResponse, UserRef};
use crate::pagination::ListParams;
use crate::ApiClient;

const TEAMS: &str = "/v2/teams";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TeamMember {
    pub user: UserRef,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
}

impl TeamMember {
    pub fn with_username(username: impl Into<String>, role: Option<String>) -> Self {
        Self {
            user: UserRef {
                id: None,
                username: Some(username.into()),
            },
            role,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct TeamRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub members: Vec<TeamMember>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Team {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(flatten)]
    pub extra: Extra,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreatedTeam {
    pub id: String,
    #[serde(default)]
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TeamLogs {
    #[serde(default)]
    pub offset: Option<String>,
    #[serde(default)]
    pub logs: Vec<Value>,
}

impl ApiClient {
    pub async fn create_team(&self, request: &TeamRequest) -> Result<ApiResponse<CreatedTeam>> {
        self.post(TEAMS, request).await
    }

    pub async fn get_team(&self, identifier: &Identifier) -> Result<ApiResponse<Team>> {
        self.get(&identifier.path(TEAMS, "")).await
    }

    /// The team endpoint only accepts ids for updates.
    pub async fn update_team(
        &self,
        team_id: &str,
        request: &TeamRequest,
    ) -> Result<ApiResponse<CreatedTeam>> {
        self.patch(
            &format!("{TEAMS}/{}", urlencoding::encode(team_id)),
            request,
        )
        .await
    }

    pub async fn delete_team(&self, identifier: &Identifier) -> Result<AsyncResponse> {
        self.delete(&identifier.path(TEAMS, "")).await
    }

    pub async fn list_teams(&self) -> Result<ListResponse<Team>> {
        self.get(TEAMS).await
    }

    pub async fn list_team_logs(
        &self,
        identifier: &Identifier,
        params: &ListParams,
    ) -> Result<ApiResponse<TeamLogs>> {
        let path = identifier.path(TEAMS, "/logs");
        let query = params.to_query();
        let path = if query.is_empty() {
            path
        } else {
            format!("{path}&{query}")
        };
        self.get(&path).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn members_are_sent_by_username() {
        let request = TeamRequest {
            name: Some("ops".to_string()),
            description: None,
            members: vec![TeamMember::with_username(
                "jane@example.com",
                Some("admin".to_string()),
            )],
        };
        assert_eq!(
            serde_json::to_value(&request).unwrap(),
            serde_json::json!({
                "name": "ops",
                "members": [{"user": {"username": "jane@example.com"}, "role": "admin"}]
            })
        );
    }
}
