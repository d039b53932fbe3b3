//! Escalation API (`/v2/escalations`).

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::models::{
    ApiResponse, AsyncResponse, Extra, Identifier, ListResponse, Responder, TeamRef,
};
use crate::ApiClient;

const ESCALATIONS: &str = "/v2/escalations";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EscalationDelay {
    pub time_amount: u32,
    #[serde(default = "minutes")]
    pub time_unit: String,
}

fn minutes() -> String {
    "minutes".to_string()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EscalationRule {
    /// `if-not-acked` or `if-not-closed`.
    pub condition: String,
    /// `default`, `next`, `previous`, `users`, `admins` or `all`.
    pub notify_type: String,
    pub delay: EscalationDelay,
    pub recipient: Responder,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CreateEscalationRequest {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub rules: Vec<EscalationRule>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub owner_team: Option<TeamRef>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Escalation {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(flatten)]
    pub extra: Extra,
}

impl ApiClient {
    pub async fn create_escalation(
        &self,
        request: &CreateEscalationRequest,
    ) -> Result<ApiResponse<Escalation>> {
        self.post(ESCALATIONS, request).await
    }

    pub async fn get_escalation(&self, identifier: &Identifier) -> Result<ApiResponse<Escalation>> {
        self.get(&identifier.path(ESCALATIONS, "")).await
    }

    pub async fn delete_escalation(&self, identifier: &Identifier) -> Result<AsyncResponse> {
        self.delete(&identifier.path(ESCALATIONS, "")).await
    }

    pub async fn list_escalations(&self) -> Result<ListResponse<Escalation>> {
        self.get(ESCALATIONS).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ResponderType;

    #[test]
    fn rule_serializes_with_delay_and_recipient() {
        let rule = EscalationRule {
            condition: "if-not-acked".to_string(),
            notify_type: "default".to_string(),
            delay: EscalationDelay {
                time_amount: 5,
                time_unit: minutes(),
            },
            recipient: Responder::named(ResponderType::Schedule, "primary"),
        };
        assert_eq!(
            serde_json::to_value(&rule).unwrap(),
            serde_json::json!({
                "condition": "if-not-acked",
                "notifyType": "default",
                "delay": {"timeAmount": 5, "timeUnit": "minutes"},
                "recipient": {"type": "schedule", "name": "primary"}
            })
        );
    }
}
