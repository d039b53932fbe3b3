//! Heartbeat API (`/v2/heartbeats`).

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::models::{ApiResponse, AsyncResponse, Extra, TeamRef};
use crate::ApiClient;

const HEARTBEATS: &str = "/v2/heartbeats";

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AddHeartbeatRequest {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub interval: u32,
    /// `minutes`, `hours` or `days`.
    pub interval_unit: String,
    pub enabled: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub owner_team: Option<TeamRef>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alert_message: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub alert_tags: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alert_priority: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Heartbeat {
    pub name: String,
    #[serde(default)]
    pub enabled: bool,
    #[serde(default)]
    pub expired: bool,
    #[serde(flatten)]
    pub extra: Extra,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HeartbeatList {
    #[serde(default)]
    pub heartbeats: Vec<Heartbeat>,
}

fn heartbeat_path(name: &str, suffix: &str) -> String {
    format!("{HEARTBEATS}/{}{suffix}", urlencoding::encode(name))
}

impl ApiClient {
    pub async fn ping_heartbeat(&self, name: &str) -> Result<AsyncResponse> {
        self.get(&heartbeat_path(name, "/ping")).await
    }

    pub async fn add_heartbeat(
        &self,
        request: &AddHeartbeatRequest,
    ) -> Result<ApiResponse<Heartbeat>> {
        self.post(HEARTBEATS, request).await
    }

    pub async fn get_heartbeat(&self, name: &str) -> Result<ApiResponse<Heartbeat>> {
        self.get(&heartbeat_path(name, "")).await
    }

    pub async fn enable_heartbeat(&self, name: &str) -> Result<ApiResponse<Heartbeat>> {
        self.post(&heartbeat_path(name, "/enable"), &serde_json::json!({}))
            .await
    }

    pub async fn disable_heartbeat(&self, name: &str) -> Result<ApiResponse<Heartbeat>> {
        self.post(&heartbeat_path(name, "/disable"), &serde_json::json!({}))
            .await
    }

    pub async fn delete_heartbeat(&self, name: &str) -> Result<AsyncResponse> {
        self.delete(&heartbeat_path(name, "")).await
    }

    pub async fn list_heartbeats(&self) -> Result<ApiResponse<HeartbeatList>> {
        self.get(HEARTBEATS).await
    }
}
