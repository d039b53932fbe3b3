//! Integration API (`/v2/integrations`).

use serde::{Deserialize, Serialize};
use url::form_urlencoded;

use crate::error::Result;
use crate::models::{ApiResponse, AsyncResponse, Extra, ListResponse};
use crate::pagination::with_query;
use crate::ApiClient;

const INTEGRATIONS: &str = "/v2/integrations";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Integration {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default, rename = "type")]
    pub kind: Option<String>,
    #[serde(default)]
    pub enabled: bool,
    #[serde(flatten)]
    pub extra: Extra,
}

#[derive(Debug, Clone, Default)]
pub struct IntegrationFilter {
    pub kind: Option<String>,
    pub team_id: Option<String>,
    pub team_name: Option<String>,
}

impl IntegrationFilter {
    fn to_query(&self) -> String {
        let mut serializer = form_urlencoded::Serializer::new(String::new());
        if let Some(kind) = self.kind.as_deref() {
            serializer.append_pair("type", kind);
        }
        if let Some(team_id) = self.team_id.as_deref() {
            serializer.append_pair("teamId", team_id);
        }
        if let Some(team_name) = self.team_name.as_deref() {
            serializer.append_pair("teamName", team_name);
        }
        serializer.finish()
    }
}

fn integration_path(id: &str, suffix: &str) -> String {
    format!("{INTEGRATIONS}/{}{suffix}", urlencoding::encode(id))
}

impl ApiClient {
    pub async fn get_integration(&self, id: &str) -> Result<ApiResponse<Integration>> {
        self.get(&integration_path(id, "")).await
    }

    pub async fn list_integrations(
        &self,
        filter: &IntegrationFilter,
    ) -> Result<ListResponse<Integration>> {
        self.get(&with_query(INTEGRATIONS, &filter.to_query())).await
    }

    pub async fn enable_integration(&self, id: &str) -> Result<ApiResponse<Integration>> {
        self.post(&integration_path(id, "/enable"), &serde_json::json!({}))
            .await
    }

    pub async fn disable_integration(&self, id: &str) -> Result<ApiResponse<Integration>> {
        self.post(&integration_path(id, "/disable"), &serde_json::json!({}))
            .await
    }

    pub async fn delete_integration(&self, id: &str) -> Result<AsyncResponse> {
        self.delete(&integration_path(id, "")).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn filter_only_includes_set_fields() {
        assert_eq!(IntegrationFilter::default().to_query(), "");
        let filter = IntegrationFilter {
            kind: Some("API".to_string()),
            team_name: Some("ops team".to_string()),
            ..Default::default()
        };
        assert_eq!(filter.to_query(), "type=API&teamName=ops+team");
    }
}
