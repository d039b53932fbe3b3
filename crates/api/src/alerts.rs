//! Alert API (`/v2/alerts`).

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use url::form_urlencoded;

use crate::error::Result;
use crate::models::{
    ActionRequest, ApiResponse, AsyncResponse, Extra, Identifier, ListResponse, Responder,
    TeamRef, UserRef,
};
use crate::pagination::{with_query, ListParams, OffsetPage};
use crate::ApiClient;

const ALERTS: &str = "/v2/alerts";

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CreateAlertRequest {
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alias: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub responders: Vec<Responder>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub visible_to: Vec<Responder>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub actions: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub details: BTreeMap<String, String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub entity: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub priority: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Alert {
    pub id: String,
    #[serde(default)]
    pub tiny_id: Option<String>,
    #[serde(default)]
    pub alias: Option<String>,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub acknowledged: bool,
    #[serde(default)]
    pub priority: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(flatten)]
    pub extra: Extra,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlertCount {
    pub count: u64,
}

/// Filters accepted by `GET /v2/alerts`.
#[derive(Debug, Clone, Default)]
pub struct ListAlertsParams {
    pub list: ListParams,
    pub search_identifier: Option<String>,
    pub search_identifier_type: Option<String>,
}

/// Body for the tag, detail, escalation, owner, team and responder actions.
/// `action` carries the shared user/source/note fields.
#[derive(Debug, Clone, Serialize)]
pub struct AlertActionBody<T: Serialize> {
    #[serde(flatten)]
    pub payload: T,
    #[serde(flatten)]
    pub action: ActionRequest,
}

#[derive(Debug, Clone, Serialize)]
pub struct TagsPayload {
    pub tags: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct DetailsPayload {
    pub details: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SnoozePayload {
    pub end_time: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct EscalationPayload {
    pub escalation: TeamRef,
}

#[derive(Debug, Clone, Serialize)]
pub struct OwnerPayload {
    pub owner: UserRef,
}

#[derive(Debug, Clone, Serialize)]
pub struct TeamPayload {
    pub team: TeamRef,
}

#[derive(Debug, Clone, Serialize)]
pub struct ResponderPayload {
    pub responder: Responder,
}

/// Removal calls carry their arguments in the query string.
#[derive(Debug, Clone, Default)]
pub struct RemovalParams {
    pub values: Vec<String>,
    pub action: ActionRequest,
}

impl RemovalParams {
    fn query(&self, key: &str) -> String {
        let mut serializer = form_urlencoded::Serializer::new(String::new());
        serializer.append_pair(key, &self.values.join(","));
        append_action(&mut serializer, &self.action);
        serializer.finish()
    }
}

fn append_action(serializer: &mut form_urlencoded::Serializer<'_, String>, action: &ActionRequest) {
    if let Some(user) = action.user.as_deref() {
        serializer.append_pair("user", user);
    }
    if let Some(source) = action.source.as_deref() {
        serializer.append_pair("source", source);
    }
    if let Some(note) = action.note.as_deref() {
        serializer.append_pair("note", note);
    }
}

/// Appends extra query pairs to a path that already carries `identifierType`.
fn and_query(path: String, query: &str) -> String {
    if query.is_empty() {
        path
    } else {
        format!("{path}&{query}")
    }
}

impl ApiClient {
    pub async fn create_alert(&self, request: &CreateAlertRequest) -> Result<AsyncResponse> {
        self.post(ALERTS, request).await
    }

    pub async fn get_alert(&self, identifier: &Identifier) -> Result<ApiResponse<Alert>> {
        self.get(&identifier.path(ALERTS, "")).await
    }

    pub async fn list_alerts(&self, params: &ListAlertsParams) -> Result<OffsetPage<Alert>> {
        let query = {
            let mut serializer = form_urlencoded::Serializer::new(String::new());
            params.list.append_to(&mut serializer);
            if let Some(search) = params.search_identifier.as_deref() {
                serializer.append_pair("searchIdentifier", search);
            }
            if let Some(kind) = params.search_identifier_type.as_deref() {
                serializer.append_pair("searchIdentifierType", kind);
            }
            serializer.finish()
        };
        self.get(&with_query(ALERTS, &query)).await
    }

    pub async fn count_alerts(&self, query: Option<&str>) -> Result<ApiResponse<AlertCount>> {
        let query = {
            let mut serializer = form_urlencoded::Serializer::new(String::new());
            if let Some(query) = query {
                serializer.append_pair("query", query);
            }
            serializer.finish()
        };
        self.get(&with_query("/v2/alerts/count", &query)).await
    }

    pub async fn acknowledge_alert(
        &self,
        identifier: &Identifier,
        action: &ActionRequest,
    ) -> Result<AsyncResponse> {
        self.post(&identifier.path(ALERTS, "/acknowledge"), action)
            .await
    }

    pub async fn unacknowledge_alert(
        &self,
        identifier: &Identifier,
        action: &ActionRequest,
    ) -> Result<AsyncResponse> {
        self.post(&identifier.path(ALERTS, "/unacknowledge"), action)
            .await
    }

    pub async fn close_alert(
        &self,
        identifier: &Identifier,
        action: &ActionRequest,
    ) -> Result<AsyncResponse> {
        self.post(&identifier.path(ALERTS, "/close"), action).await
    }

    pub async fn delete_alert(
        &self,
        identifier: &Identifier,
        action: &ActionRequest,
    ) -> Result<AsyncResponse> {
        let query = {
            let mut serializer = form_urlencoded::Serializer::new(String::new());
            append_action(&mut serializer, action);
            serializer.finish()
        };
        self.delete(&and_query(identifier.path(ALERTS, ""), &query))
            .await
    }

    pub async fn add_alert_note(
        &self,
        identifier: &Identifier,
        action: &ActionRequest,
    ) -> Result<AsyncResponse> {
        self.post(&identifier.path(ALERTS, "/notes"), action).await
    }

    pub async fn list_alert_notes(
        &self,
        identifier: &Identifier,
        params: &ListParams,
    ) -> Result<OffsetPage<Value>> {
        self.get(&and_query(
            identifier.path(ALERTS, "/notes"),
            &params.to_query(),
        ))
        .await
    }

    pub async fn add_alert_tags(
        &self,
        identifier: &Identifier,
        body: &AlertActionBody<TagsPayload>,
    ) -> Result<AsyncResponse> {
        self.post(&identifier.path(ALERTS, "/tags"), body).await
    }

    pub async fn remove_alert_tags(
        &self,
        identifier: &Identifier,
        params: &RemovalParams,
    ) -> Result<AsyncResponse> {
        self.delete(&and_query(
            identifier.path(ALERTS, "/tags"),
            &params.query("tags"),
        ))
        .await
    }

    pub async fn add_alert_details(
        &self,
        identifier: &Identifier,
        body: &AlertActionBody<DetailsPayload>,
    ) -> Result<AsyncResponse> {
        self.post(&identifier.path(ALERTS, "/details"), body).await
    }

    pub async fn remove_alert_details(
        &self,
        identifier: &Identifier,
        params: &RemovalParams,
    ) -> Result<AsyncResponse> {
        self.delete(&and_query(
            identifier.path(ALERTS, "/details"),
            &params.query("keys"),
        ))
        .await
    }

    pub async fn snooze_alert(
        &self,
        identifier: &Identifier,
        body: &AlertActionBody<SnoozePayload>,
    ) -> Result<AsyncResponse> {
        self.post(&identifier.path(ALERTS, "/snooze"), body).await
    }

    pub async fn escalate_alert(
        &self,
        identifier: &Identifier,
        body: &AlertActionBody<EscalationPayload>,
    ) -> Result<AsyncResponse> {
        self.post(&identifier.path(ALERTS, "/escalate"), body).await
    }

    pub async fn assign_alert(
        &self,
        identifier: &Identifier,
        body: &AlertActionBody<OwnerPayload>,
    ) -> Result<AsyncResponse> {
        self.post(&identifier.path(ALERTS, "/assign"), body).await
    }

    pub async fn add_alert_team(
        &self,
        identifier: &Identifier,
        body: &AlertActionBody<TeamPayload>,
    ) -> Result<AsyncResponse> {
        self.post(&identifier.path(ALERTS, "/teams"), body).await
    }

    pub async fn add_alert_responder(
        &self,
        identifier: &Identifier,
        body: &AlertActionBody<ResponderPayload>,
    ) -> Result<AsyncResponse> {
        self.post(&identifier.path(ALERTS, "/responders"), body)
            .await
    }

    /// `field` is one of `priority`, `message` or `description`; the body is
    /// `{field: value}`.
    pub async fn update_alert_field(
        &self,
        identifier: &Identifier,
        field: &str,
        value: &str,
    ) -> Result<AsyncResponse> {
        let mut body = serde_json::Map::new();
        body.insert(field.to_string(), Value::String(value.to_string()));
        self.put(&identifier.path(ALERTS, &format!("/{field}")), &body)
            .await
    }

    pub async fn execute_alert_action(
        &self,
        identifier: &Identifier,
        action_name: &str,
        action: &ActionRequest,
    ) -> Result<AsyncResponse> {
        let suffix = format!("/actions/{}", urlencoding::encode(action_name));
        self.post(&identifier.path(ALERTS, &suffix), action).await
    }

    pub async fn list_alert_logs(
        &self,
        identifier: &Identifier,
        params: &ListParams,
    ) -> Result<OffsetPage<Value>> {
        self.get(&and_query(
            identifier.path(ALERTS, "/logs"),
            &params.to_query(),
        ))
        .await
    }

    pub async fn list_alert_recipients(
        &self,
        identifier: &Identifier,
    ) -> Result<ListResponse<Value>> {
        self.get(&identifier.path(ALERTS, "/recipients")).await
    }

    pub async fn attach_file(
        &self,
        identifier: &Identifier,
        file_name: &str,
        content: Vec<u8>,
        user: Option<&str>,
        index_file: Option<&str>,
    ) -> Result<AsyncResponse> {
        let mut fields = Vec::new();
        if let Some(user) = user {
            fields.push(("user", user.to_string()));
        }
        if let Some(index_file) = index_file {
            fields.push(("indexFile", index_file.to_string()));
        }
        self.upload(
            &identifier.path(ALERTS, "/attachments"),
            file_name,
            content,
            &fields,
        )
        .await
    }

    pub async fn list_alert_attachments(
        &self,
        identifier: &Identifier,
    ) -> Result<ListResponse<Value>> {
        self.get(&identifier.path(ALERTS, "/attachments")).await
    }

    pub async fn get_request_status(&self, request_id: &str) -> Result<ApiResponse<Value>> {
        self.get(&format!(
            "/v2/alerts/requests/{}",
            urlencoding::encode(request_id)
        ))
        .await
    }
}
