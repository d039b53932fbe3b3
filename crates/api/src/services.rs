//! Service API (`/v1/services`).

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::models::{ApiResponse, AsyncResponse, Extra};
use crate::pagination::{with_query, ListParams, OffsetPage};
use crate::ApiClient;

const SERVICES: &str = "/v1/services";

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CreateServiceRequest {
    pub name: String,
    pub team_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// `TEAM_MEMBERS` or `OPSGENIE_USERS`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub visibility: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Service {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub team_id: Option<String>,
    #[serde(flatten)]
    pub extra: Extra,
}

fn service_path(id: &str) -> String {
    format!("{SERVICES}/{}", urlencoding::encode(id))
}

impl ApiClient {
    pub async fn create_service(&self, request: &CreateServiceRequest) -> Result<AsyncResponse> {
        self.post(SERVICES, request).await
    }

    pub async fn get_service(&self, id: &str) -> Result<ApiResponse<Service>> {
        self.get(&service_path(id)).await
    }

    pub async fn delete_service(&self, id: &str) -> Result<AsyncResponse> {
        self.delete(&service_path(id)).await
    }

    pub async fn list_services(&self, params: &ListParams) -> Result<OffsetPage<Service>> {
        self.get(&with_query(SERVICES, &params.to_query())).await
    }
}
