use anyhow::{Context, Result};
use clap::{Args, Subcommand};
use lamp_api::integrations::IntegrationFilter;

use super::CommandContext;

#[derive(Subcommand, Debug, Clone)]
#[command(rename_all = "camelCase")]
pub enum IntegrationCommand {
    /// Get an integration
    GetIntegration(IntegrationIdArgs),
    /// List integrations
    ListIntegrations(ListIntegrationsArgs),
    /// Enable an integration
    EnableIntegration(IntegrationIdArgs),
    /// Disable an integration
    DisableIntegration(IntegrationIdArgs),
    /// Delete an integration
    DeleteIntegration(IntegrationIdArgs),
}

#[derive(Args, Debug, Clone)]
pub struct IntegrationIdArgs {
    #[arg(long)]
    pub id: String,
}

#[derive(Args, Debug, Clone)]
pub struct ListIntegrationsArgs {
    /// Integration type, e.g. API or Email
    #[arg(long = "type")]
    pub kind: Option<String>,
    #[arg(long = "teamId", conflicts_with = "team_name")]
    pub team_id: Option<String>,
    #[arg(long = "teamName")]
    pub team_name: Option<String>,
}

pub async fn execute(command: IntegrationCommand, ctx: &CommandContext<'_>) -> Result<()> {
    match command {
        IntegrationCommand::GetIntegration(args) => {
            let response = ctx
                .client
                .get_integration(&args.id)
                .await
                .with_context(|| format!("Failed to get integration {}", args.id))?;
            ctx.renderer.render(&response)
        }
        IntegrationCommand::ListIntegrations(args) => {
            let filter = IntegrationFilter {
                kind: args.kind,
                team_id: args.team_id,
                team_name: args.team_name,
            };
            let response = ctx
                .client
                .list_integrations(&filter)
                .await
                .context("Failed to list integrations")?;
            ctx.renderer.render(&response)
        }
        IntegrationCommand::EnableIntegration(args) => {
            let response = ctx
                .client
                .enable_integration(&args.id)
                .await
                .with_context(|| format!("Failed to enable integration {}", args.id))?;
            ctx.renderer.render(&response)
        }
        IntegrationCommand::DisableIntegration(args) => {
            let response = ctx
                .client
                .disable_integration(&args.id)
                .await
                .with_context(|| format!("Failed to disable integration {}", args.id))?;
            ctx.renderer.render(&response)
        }
        IntegrationCommand::DeleteIntegration(args) => {
            let response = ctx
                .client
                .delete_integration(&args.id)
                .await
                .with_context(|| format!("Failed to delete integration {}", args.id))?;
            ctx.renderer.render(&response)
        }
    }
}
