use anyhow::{Context, Result};
use clap::{ArgAction, Args, Subcommand};
use lamp_api::heartbeats::AddHeartbeatRequest;
use lamp_api::models::TeamRef;

use super::args::PRIORITIES;
use super::CommandContext;

#[derive(Subcommand, Debug, Clone)]
#[command(rename_all = "camelCase")]
pub enum HeartbeatCommand {
    /// Send a ping for a heartbeat
    PingHeartbeat(HeartbeatNameArgs),
    /// Add a heartbeat
    AddHeartbeat(AddHeartbeatArgs),
    /// Get a heartbeat
    GetHeartbeat(HeartbeatNameArgs),
    /// Enable a heartbeat
    EnableHeartbeat(HeartbeatNameArgs),
    /// Disable a heartbeat
    DisableHeartbeat(HeartbeatNameArgs),
    /// Delete a heartbeat
    DeleteHeartbeat(HeartbeatNameArgs),
    /// List heartbeats
    ListHeartbeats,
}

#[derive(Args, Debug, Clone)]
pub struct HeartbeatNameArgs {
    #[arg(long)]
    pub name: String,
}

#[derive(Args, Debug, Clone)]
pub struct AddHeartbeatArgs {
    #[arg(long)]
    pub name: String,
    #[arg(long)]
    pub description: Option<String>,
    /// Time without a ping after which the heartbeat expires
    #[arg(long)]
    pub interval: u32,
    #[arg(long = "intervalUnit", default_value = "minutes", value_parser = ["minutes", "hours", "days"])]
    pub interval_unit: String,
    #[arg(long, default_value_t = true, action = ArgAction::Set)]
    pub enabled: bool,
    /// Name of the team owning the heartbeat
    #[arg(long = "ownerTeam")]
    pub owner_team: Option<String>,
    /// Message of the alert created when the heartbeat expires
    #[arg(long = "alertMessage")]
    pub alert_message: Option<String>,
    #[arg(long = "alertTags", value_delimiter = ',')]
    pub alert_tags: Vec<String>,
    #[arg(long = "alertPriority", value_parser = PRIORITIES)]
    pub alert_priority: Option<String>,
}

impl From<AddHeartbeatArgs> for AddHeartbeatRequest {
    fn from(args: AddHeartbeatArgs) -> Self {
        Self {
            name: args.name,
            description: args.description,
            interval: args.interval,
            interval_unit: args.interval_unit,
            enabled: args.enabled,
            owner_team: args.owner_team.map(|name| TeamRef {
                id: None,
                name: Some(name),
            }),
            alert_message: args.alert_message,
            alert_tags: args.alert_tags,
            alert_priority: args.alert_priority,
        }
    }
}

pub async fn execute(command: HeartbeatCommand, ctx: &CommandContext<'_>) -> Result<()> {
    match command {
        HeartbeatCommand::PingHeartbeat(args) => {
            let response = ctx
                .client
                .ping_heartbeat(&args.name)
                .await
                .with_context(|| format!("Failed to ping heartbeat {}", args.name))?;
            ctx.renderer.render(&response)
        }
        HeartbeatCommand::AddHeartbeat(args) => {
            let request = AddHeartbeatRequest::from(args);
            let response = ctx
                .client
                .add_heartbeat(&request)
                .await
                .with_context(|| format!("Failed to add heartbeat {}", request.name))?;
            ctx.renderer.render(&response)
        }
        HeartbeatCommand::GetHeartbeat(args) => {
            let response = ctx
                .client
                .get_heartbeat(&args.name)
                .await
                .with_context(|| format!("Failed to get heartbeat {}", args.name))?;
            ctx.renderer.render(&response)
        }
        HeartbeatCommand::EnableHeartbeat(args) => {
            let response = ctx
                .client
                .enable_heartbeat(&args.name)
                .await
                .with_context(|| format!("Failed to enable heartbeat {}", args.name))?;
            ctx.renderer.render(&response)
        }
        HeartbeatCommand::DisableHeartbeat(args) => {
            let response = ctx
                .client
                .disable_heartbeat(&args.name)
                .await
                .with_context(|| format!("Failed to disable heartbeat {}", args.name))?;
            ctx.renderer.render(&response)
        }
        HeartbeatCommand::DeleteHeartbeat(args) => {
            let response = ctx
                .client
                .delete_heartbeat(&args.name)
                .await
                .with_context(|| format!("Failed to delete heartbeat {}", args.name))?;
            ctx.renderer.render(&response)
        }
        HeartbeatCommand::ListHeartbeats => {
            let response = ctx
                .client
                .list_heartbeats()
                .await
                .context("Failed to list heartbeats")?;
            ctx.renderer.render(&response)
        }
    }
}
