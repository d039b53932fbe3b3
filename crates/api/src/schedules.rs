//! Schedule API (`/v2/schedules`).

use serde::{Deserialize, Serialize};
use serde_json::Value;
use url::form_urlencoded;

use crate::error::Result;
use crate::models::{ApiResponse, AsyncResponse, Extra, Identifier, ListResponse, TeamRef};
use crate::pagination::with_query;
use crate::ApiClient;

const SCHEDULES: &str = "/v2/schedules";

/// Body of create and update calls. Update sends only the fields that are set.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timezone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enabled: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub owner_team: Option<TeamRef>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Schedule {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub timezone: Option<String>,
    #[serde(default)]
    pub enabled: bool,
    #[serde(flatten)]
    pub extra: Extra,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreatedSchedule {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub enabled: bool,
}

#[derive(Debug, Clone, Default)]
pub struct OnCallParams {
    pub flat: bool,
    /// RFC 3339 point in time; the API defaults to now.
    pub date: Option<String>,
}

impl ApiClient {
    pub async fn create_schedule(
        &self,
        request: &ScheduleRequest,
    ) -> Result<ApiResponse<CreatedSchedule>> {
        self.post(SCHEDULES, request).await
    }

    pub async fn get_schedule(&self, identifier: &Identifier) -> Result<ApiResponse<Schedule>> {
        self.get(&identifier.path(SCHEDULES, "")).await
    }

    pub async fn update_schedule(
        &self,
        identifier: &Identifier,
        request: &ScheduleRequest,
    ) -> Result<ApiResponse<CreatedSchedule>> {
        self.patch(&identifier.path(SCHEDULES, ""), request).await
    }

    pub async fn delete_schedule(&self, identifier: &Identifier) -> Result<AsyncResponse> {
        self.delete(&identifier.path(SCHEDULES, "")).await
    }

    pub async fn list_schedules(&self, expand_rotations: bool) -> Result<ListResponse<Schedule>> {
        let query = if expand_rotations { "expand=rotation" } else { "" };
        self.get(&with_query(SCHEDULES, query)).await
    }

    /// Returns the schedule as an iCalendar document.
    pub async fn export_schedule(&self, identifier: &Identifier) -> Result<String> {
        self.get_text(&identifier.path(SCHEDULES, ".ics")).await
    }

    pub async fn who_is_on_call(
        &self,
        identifier: &Identifier,
        params: &OnCallParams,
    ) -> Result<ApiResponse<Value>> {
        let mut path =
            identifier.path_with_query(SCHEDULES, "/on-calls", "scheduleIdentifierType");
        let extra = {
            let mut serializer = form_urlencoded::Serializer::new(String::new());
            if params.flat {
                serializer.append_pair("flat", "true");
            }
            if let Some(date) = params.date.as_deref() {
                serializer.append_pair("date", date);
            }
            serializer.finish()
        };
        if !extra.is_empty() {
            path = format!("{path}&{extra}");
        }
        self.get(&path).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn update_request_sends_only_set_fields() {
        let request = ScheduleRequest {
            enabled: Some(false),
            ..Default::default()
        };
        assert_eq!(
            serde_json::to_value(&request).unwrap(),
            serde_json::json!({"enabled": false})
        );
    }

    #[test]
    fn owner_team_is_nested() {
        let request = ScheduleRequest {
            name: Some("primary".to_string()),
            owner_team: Some(TeamRef {
                id: None,
                name: Some("ops".to_string()),
            }),
            ..Default::default()
        };
        assert_eq!(
            serde_json::to_value(&request).unwrap(),
            serde_json::json!({"name": "primary", "ownerTeam": {"name": "ops"}})
        );
    }
}
