//! User API (`/v2/users`).

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::models::{ApiResponse, AsyncResponse, Extra};
use crate::pagination::{with_query, ListParams, OffsetPage, Paginator};
use crate::ApiClient;

const USERS: &str = "/v2/users";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UserRole {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default)]
    pub name: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CreateUserRequest {
    pub username: String,
    pub full_name: String,
    pub role: UserRole,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time_zone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub locale: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub invitation_disabled: Option<bool>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub full_name: String,
    #[serde(default)]
    pub role: Option<UserRole>,
    #[serde(default)]
    pub time_zone: Option<String>,
    #[serde(default)]
    pub locale: Option<String>,
    #[serde(default)]
    pub blocked: bool,
    #[serde(default)]
    pub verified: bool,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(flatten)]
    pub extra: Extra,
}

impl ApiClient {
    pub async fn create_user(&self, request: &CreateUserRequest) -> Result<ApiResponse<User>> {
        self.post(USERS, request).await
    }

    /// `identifier` is a user id or username.
    pub async fn get_user(&self, identifier: &str) -> Result<ApiResponse<User>> {
        self.get(&format!("{USERS}/{}", urlencoding::encode(identifier)))
            .await
    }

    pub async fn delete_user(&self, identifier: &str) -> Result<AsyncResponse> {
        self.delete(&format!("{USERS}/{}", urlencoding::encode(identifier)))
            .await
    }

    pub async fn list_users(&self, params: &ListParams) -> Result<OffsetPage<User>> {
        self.get(&with_query(USERS, &params.to_query())).await
    }
}

/// Walks every page of `/v2/users`, optionally filtered by a query.
pub struct UserPages<'a> {
    client: &'a ApiClient,
    query: Option<String>,
}

impl<'a> UserPages<'a> {
    pub fn new(client: &'a ApiClient, query: Option<String>) -> Self {
        Self { client, query }
    }
}

#[async_trait]
impl Paginator<User> for UserPages<'_> {
    async fn fetch_page(&self, offset: u32, limit: u32) -> Result<OffsetPage<User>> {
        let params = ListParams {
            query: self.query.clone(),
            limit: Some(limit),
            offset: Some(offset),
            ..ListParams::default()
        };
        self.client.list_users(&params).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_request_nests_role() {
        let request = CreateUserRequest {
            username: "jane@example.com".to_string(),
            full_name: "Jane Doe".to_string(),
            role: UserRole {
                id: None,
                name: "User".to_string(),
            },
            ..Default::default()
        };
        assert_eq!(
            serde_json::to_value(&request).unwrap(),
            serde_json::json!({
                "username": "jane@example.com",
                "fullName": "Jane Doe",
                "role": {"name": "User"}
            })
        );
    }
}
