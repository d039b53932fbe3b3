use anyhow::{Context, Result};
use clap::{Args, Subcommand};
use lamp_api::escalations::{CreateEscalationRequest, EscalationDelay, EscalationRule};
use lamp_api::models::TeamRef;

use super::args::{pair_responders, NamedIdentifierArgs};
use super::CommandContext;

#[derive(Subcommand, Debug, Clone)]
#[command(rename_all = "camelCase")]
pub enum EscalationCommand {
    /// Create an escalation
    CreateEscalation(CreateEscalationArgs),
    /// Get an escalation
    GetEscalation(NamedIdentifierArgs),
    /// Delete an escalation
    DeleteEscalation(NamedIdentifierArgs),
    /// List escalations
    ListEscalations,
}

#[derive(Args, Debug, Clone)]
pub struct CreateEscalationArgs {
    #[arg(long)]
    pub name: String,
    #[arg(long)]
    pub description: Option<String>,
    /// Name of the team owning the escalation
    #[arg(long = "ownerTeam")]
    pub owner_team: Option<String>,
    /// Comma separated recipients, one rule each
    #[arg(long, value_delimiter = ',', required = true)]
    pub recipients: Vec<String>,
    /// Comma separated recipient types: user, team or schedule
    #[arg(long = "recipientTypes", value_delimiter = ',', required = true)]
    pub recipient_types: Vec<String>,
    #[arg(long, default_value = "if-not-acked", value_parser = ["if-not-acked", "if-not-closed"])]
    pub condition: String,
    #[arg(
        long = "notifyType",
        default_value = "default",
        value_parser = ["default", "next", "previous", "users", "admins", "all"]
    )]
    pub notify_type: String,
    /// Minutes to wait before each rule fires
    #[arg(long, default_value_t = 0)]
    pub delay: u32,
}

impl CreateEscalationArgs {
    pub fn request(&self) -> Result<CreateEscalationRequest> {
        let recipients = pair_responders(
            &self.recipients,
            &self.recipient_types,
            ("--recipients", "--recipientTypes"),
        )?;
        let rules = recipients
            .into_iter()
            .map(|recipient| EscalationRule {
                condition: self.condition.clone(),
                notify_type: self.notify_type.clone(),
                delay: EscalationDelay {
                    time_amount: self.delay,
                    time_unit: "minutes".to_string(),
                },
                recipient,
            })
            .collect();

        Ok(CreateEscalationRequest {
            name: self.name.clone(),
            description: self.description.clone(),
            rules,
            owner_team: self.owner_team.clone().map(|name| TeamRef {
                id: None,
                name: Some(name),
            }),
        })
    }
}

pub async fn execute(command: EscalationCommand, ctx: &CommandContext<'_>) -> Result<()> {
    match command {
        EscalationCommand::CreateEscalation(args) => {
            let request = args.request()?;
            let response = ctx
                .client
                .create_escalation(&request)
                .await
                .context("Failed to create escalation")?;
            ctx.renderer.render(&response)
        }
        EscalationCommand::GetEscalation(args) => {
            let identifier = args.identifier()?;
            let response = ctx
                .client
                .get_escalation(&identifier)
                .await
                .with_context(|| format!("Failed to get escalation {}", identifier.value))?;
            ctx.renderer.render(&response)
        }
        EscalationCommand::DeleteEscalation(args) => {
            let identifier = args.identifier()?;
            let response = ctx
                .client
                .delete_escalation(&identifier)
                .await
                .context("Failed to delete escalation")?;
            ctx.renderer.render(&response)
        }
        EscalationCommand::ListEscalations => {
            let response = ctx
                .client
                .list_escalations()
                .await
                .context("Failed to list escalations")?;
            ctx.renderer.render(&response)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn one_rule_per_recipient() {
        let args = CreateEscalationArgs {
            name: "night".to_string(),
            description: None,
            owner_team: Some("ops".to_string()),
            recipients: vec!["primary".to_string(), "ops".to_string()],
            recipient_types: vec!["schedule".to_string(), "team".to_string()],
            condition: "if-not-acked".to_string(),
            notify_type: "default".to_string(),
            delay: 5,
        };
        let value = serde_json::to_value(args.request().unwrap()).unwrap();
        assert_eq!(value["rules"].as_array().unwrap().len(), 2);
        assert_eq!(value["rules"][0]["recipient"]["type"], "schedule");
        assert_eq!(value["rules"][1]["delay"]["timeAmount"], 5);
        assert_eq!(value["ownerTeam"]["name"], "ops");
    }
}
