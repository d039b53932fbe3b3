use anyhow::{Context, Result};
use clap::{Args, Subcommand};
use lamp_api::incidents::{CreateIncidentRequest, IncidentNote};
use tracing::info;

use super::args::{parse_details, IncidentIdentifierArgs, ListArgs, ResponderArgs, PRIORITIES};
use super::CommandContext;

#[derive(Subcommand, Debug, Clone)]
#[command(rename_all = "camelCase")]
pub enum IncidentCommand {
    /// Create an incident
    CreateIncident(CreateIncidentArgs),
    /// Get an incident
    GetIncident(IncidentIdentifierArgs),
    /// List incidents
    ListIncidents(ListIncidentsArgs),
    /// Close an incident
    CloseIncident(IncidentNoteArgs),
    /// Delete an incident
    DeleteIncident(IncidentIdentifierArgs),
    /// Resolve an incident
    ResolveIncident(IncidentNoteArgs),
    /// Reopen a resolved incident
    ReopenIncident(IncidentNoteArgs),
    /// Add a note to an incident
    AddNoteToIncident(AddIncidentNoteArgs),
}

#[derive(Args, Debug, Clone)]
pub struct CreateIncidentArgs {
    #[arg(long)]
    pub message: String,
    #[arg(long)]
    pub description: Option<String>,
    #[command(flatten)]
    pub responders: ResponderArgs,
    /// Comma separated tags
    #[arg(long, value_delimiter = ',')]
    pub tags: Vec<String>,
    /// Custom property as key=value, repeatable
    #[arg(long)]
    pub details: Vec<String>,
    #[arg(long, value_parser = PRIORITIES)]
    pub priority: Option<String>,
    #[arg(long)]
    pub note: Option<String>,
    /// Impacted service
    #[arg(long = "serviceId")]
    pub service_id: Option<String>,
    /// Notify the stakeholders of the impacted service
    #[arg(long = "notifyStakeholders")]
    pub notify_stakeholders: bool,
}

impl CreateIncidentArgs {
    pub fn request(&self) -> Result<CreateIncidentRequest> {
        Ok(CreateIncidentRequest {
            message: self.message.clone(),
            description: self.description.clone(),
            responders: self.responders.responders()?,
            tags: self.tags.clone(),
            details: parse_details(&self.details)?,
            priority: self.priority.clone(),
            note: self.note.clone(),
            service_id: self.service_id.clone(),
            notify_stakeholders: self.notify_stakeholders.then_some(true),
        })
    }
}

#[derive(Args, Debug, Clone)]
pub struct ListIncidentsArgs {
    /// Search query, e.g. status=open
    #[arg(long)]
    pub query: Option<String>,
    #[command(flatten)]
    pub list: ListArgs,
}

#[derive(Args, Debug, Clone)]
pub struct IncidentNoteArgs {
    #[command(flatten)]
    pub incident: IncidentIdentifierArgs,
    #[arg(long)]
    pub note: Option<String>,
}

#[derive(Args, Debug, Clone)]
pub struct AddIncidentNoteArgs {
    #[command(flatten)]
    pub incident: IncidentIdentifierArgs,
    #[arg(long)]
    pub note: String,
}

pub async fn execute(command: IncidentCommand, ctx: &CommandContext<'_>) -> Result<()> {
    match command {
        IncidentCommand::CreateIncident(args) => {
            let request = args.request()?;
            let response = ctx
                .client
                .create_incident(&request)
                .await
                .context("Failed to create incident")?;
            info!(request_id = %response.request_id, "Incident creation requested");
            ctx.renderer.render(&response)
        }
        IncidentCommand::GetIncident(args) => {
            let identifier = args.identifier()?;
            let response = ctx
                .client
                .get_incident(&identifier)
                .await
                .with_context(|| format!("Failed to get incident {}", identifier.value))?;
            ctx.renderer.render(&response)
        }
        IncidentCommand::ListIncidents(args) => {
            let response = ctx
                .client
                .list_incidents(&args.list.params(args.query))
                .await
                .context("Failed to list incidents")?;
            ctx.renderer.render(&response)
        }
        IncidentCommand::CloseIncident(args) => {
            let identifier = args.incident.identifier()?;
            let response = ctx
                .client
                .close_incident(&identifier, &IncidentNote { note: args.note })
                .await
                .context("Failed to close incident")?;
            ctx.renderer.render(&response)
        }
        IncidentCommand::DeleteIncident(args) => {
            let identifier = args.identifier()?;
            let response = ctx
                .client
                .delete_incident(&identifier)
                .await
                .context("Failed to delete incident")?;
            info!(incident = %identifier.value, "Incident deletion requested");
            ctx.renderer.render(&response)
        }
        IncidentCommand::ResolveIncident(args) => {
            let identifier = args.incident.identifier()?;
            let response = ctx
                .client
                .resolve_incident(&identifier, &IncidentNote { note: args.note })
                .await
                .context("Failed to resolve incident")?;
            ctx.renderer.render(&response)
        }
        IncidentCommand::ReopenIncident(args) => {
            let identifier = args.incident.identifier()?;
            let response = ctx
                .client
                .reopen_incident(&identifier, &IncidentNote { note: args.note })
                .await
                .context("Failed to reopen incident")?;
            ctx.renderer.render(&response)
        }
        IncidentCommand::AddNoteToIncident(args) => {
            let identifier = args.incident.identifier()?;
            let body = IncidentNote {
                note: Some(args.note),
            };
            let response = ctx
                .client
                .add_incident_note(&identifier, &body)
                .await
                .context("Failed to add note to incident")?;
            ctx.renderer.render(&response)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn notify_stakeholders_is_only_sent_when_requested() {
        let args = CreateIncidentArgs {
            message: "checkout down".to_string(),
            description: None,
            responders: ResponderArgs::default(),
            tags: Vec::new(),
            details: Vec::new(),
            priority: None,
            note: None,
            service_id: Some("svc-1".to_string()),
            notify_stakeholders: false,
        };
        let value = serde_json::to_value(args.request().unwrap()).unwrap();
        assert!(value.get("notifyStakeholders").is_none());

        let args = CreateIncidentArgs {
            notify_stakeholders: true,
            ..args
        };
        let value = serde_json::to_value(args.request().unwrap()).unwrap();
        assert_eq!(value["notifyStakeholders"], true);
    }
}
