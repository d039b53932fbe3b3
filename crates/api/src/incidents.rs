//! Incident API (`/v1/incidents`).

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::models::{ApiResponse, AsyncResponse, Extra, Identifier, Responder};
use crate::pagination::{with_query, ListParams, OffsetPage};
use crate::ApiClient;

const INCIDENTS: &str = "/v1/incidents";

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CreateIncidentRequest {
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub responders: Vec<Responder>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub details: BTreeMap<String, String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub priority: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub service_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notify_stakeholders: Option<bool>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Incident {
    pub id: String,
    #[serde(default)]
    pub tiny_id: Option<String>,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub priority: Option<String>,
    #[serde(flatten)]
    pub extra: Extra,
}

/// Body of close/resolve/reopen/note calls.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct IncidentNote {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

impl ApiClient {
    pub async fn create_incident(&self, request: &CreateIncidentRequest) -> Result<AsyncResponse> {
        self.post("/v1/incidents/create", request).await
    }

    pub async fn get_incident(&self, identifier: &Identifier) -> Result<ApiResponse<Incident>> {
        self.get(&identifier.path(INCIDENTS, "")).await
    }

    pub async fn list_incidents(&self, params: &ListParams) -> Result<OffsetPage<Incident>> {
        self.get(&with_query(INCIDENTS, &params.to_query())).await
    }

    pub async fn close_incident(
        &self,
        identifier: &Identifier,
        body: &IncidentNote,
    ) -> Result<AsyncResponse> {
        self.post(&identifier.path(INCIDENTS, "/close"), body).await
    }

    pub async fn delete_incident(&self, identifier: &Identifier) -> Result<AsyncResponse> {
        self.delete(&identifier.path(INCIDENTS, "")).await
    }

    pub async fn resolve_incident(
        &self,
        identifier: &Identifier,
        body: &IncidentNote,
    ) -> Result<AsyncResponse> {
        self.post(&identifier.path(INCIDENTS, "/resolve"), body)
            .await
    }

    pub async fn reopen_incident(
        &self,
        identifier: &Identifier,
        body: &IncidentNote,
    ) -> Result<AsyncResponse> {
        self.post(&identifier.path(INCIDENTS, "/reopen"), body)
            .await
    }

    pub async fn add_incident_note(
        &self,
        identifier: &Identifier,
        body: &IncidentNote,
    ) -> Result<AsyncResponse> {
        self.post(&identifier.path(INCIDENTS, "/notes"), body).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_request_omits_unset_fields() {
        let request = CreateIncidentRequest {
            message: "checkout down".to_string(),
            service_id: Some("svc-1".to_string()),
            ..Default::default()
        };
        assert_eq!(
            serde_json::to_value(&request).unwrap(),
            serde_json::json!({"message": "checkout down", "serviceId": "svc-1"})
        );
    }

    #[test]
    fn empty_note_is_an_empty_object() {
        assert_eq!(serde_json::to_string(&IncidentNote::default()).unwrap(), "{}");
    }
}
