use anyhow::{Context, Result};
use clap::{Args, Subcommand};
use lamp_api::services::CreateServiceRequest;

use super::args::ListArgs;
use super::CommandContext;

#[derive(Subcommand, Debug, Clone)]
#[command(rename_all = "camelCase")]
pub enum ServiceCommand {
    /// Create a service
    CreateService(CreateServiceArgs),
    /// Get a service
    GetService(ServiceIdArgs),
    /// Delete a service
    DeleteService(ServiceIdArgs),
    /// List services
    ListServices(ListServicesArgs),
}

#[derive(Args, Debug, Clone)]
pub struct CreateServiceArgs {
    #[arg(long)]
    pub name: String,
    /// Id of the team owning the service
    #[arg(long = "teamId")]
    pub team_id: String,
    #[arg(long)]
    pub description: Option<String>,
    #[arg(long, value_parser = ["TEAM_MEMBERS", "OPSGENIE_USERS"])]
    pub visibility: Option<String>,
}

#[derive(Args, Debug, Clone)]
pub struct ServiceIdArgs {
    #[arg(long)]
    pub id: String,
}

#[derive(Args, Debug, Clone)]
pub struct ListServicesArgs {
    #[arg(long)]
    pub query: Option<String>,
    #[command(flatten)]
    pub list: ListArgs,
}

pub async fn execute(command: ServiceCommand, ctx: &CommandContext<'_>) -> Result<()> {
    match command {
        ServiceCommand::CreateService(args) => {
            let request = CreateServiceRequest {
                name: args.name,
                team_id: args.team_id,
                description: args.description,
                visibility: args.visibility,
            };
            let response = ctx
                .client
                .create_service(&request)
                .await
                .context("Failed to create service")?;
            ctx.renderer.render(&response)
        }
        ServiceCommand::GetService(args) => {
            let response = ctx
                .client
                .get_service(&args.id)
                .await
                .with_context(|| format!("Failed to get service {}", args.id))?;
            ctx.renderer.render(&response)
        }
        ServiceCommand::DeleteService(args) => {
            let response = ctx
                .client
                .delete_service(&args.id)
                .await
                .with_context(|| format!("Failed to delete service {}", args.id))?;
            ctx.renderer.render(&response)
        }
        ServiceCommand::ListServices(args) => {
            let response = ctx
                .client
                .list_services(&args.list.params(args.query))
                .await
                .context("Failed to list services")?;
            ctx.renderer.render(&response)
        }
    }
}
