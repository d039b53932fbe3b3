use std::path::PathBuf;

use anyhow::{anyhow, Context, Result};
use clap::{Args, Subcommand};
use lamp_api::alerts::{
    AlertActionBody, CreateAlertRequest, DetailsPayload, EscalationPayload, ListAlertsParams,
    OwnerPayload, RemovalParams, ResponderPayload, SnoozePayload, TagsPayload, TeamPayload,
};
use lamp_api::models::{Responder, ResponderType, UserRef};
use tracing::info;

use super::args::{
    pair_responders, parse_details, rfc3339, ActionArgs, AlertIdentifierArgs, EscalationRefArgs,
    ListArgs, ResponderArgs, TeamRefArgs, PRIORITIES,
};
use super::CommandContext;

#[derive(Subcommand, Debug, Clone)]
#[command(rename_all = "camelCase")]
pub enum AlertCommand {
    /// Create an alert
    CreateAlert(CreateAlertArgs),
    /// Get an alert
    GetAlert(AlertIdentifierArgs),
    /// List alerts
    ListAlerts(ListAlertsArgs),
    /// Count alerts matching a query
    CountAlerts(QueryArgs),
    /// Acknowledge an alert
    Acknowledge(AlertActionArgs),
    /// Remove the acknowledgement of an alert
    Unacknowledge(AlertActionArgs),
    /// Close an alert
    CloseAlert(AlertActionArgs),
    /// Delete an alert
    DeleteAlert(AlertActionArgs),
    /// Add a note to an alert
    AddNote(AddNoteArgs),
    /// List the notes of an alert
    ListAlertNotes(AlertListArgs),
    /// Add tags to an alert
    AddTags(TagsArgs),
    /// Remove tags from an alert
    RemoveTags(TagsArgs),
    /// Add custom properties to an alert
    AddDetails(AddDetailsArgs),
    /// Remove custom properties from an alert
    RemoveDetails(RemoveDetailsArgs),
    /// Snooze an alert until the given time
    Snooze(SnoozeArgs),
    /// Escalate an alert to the next level of an escalation
    EscalateToNext(EscalateArgs),
    /// Assign an alert to a user
    AssignOwner(AssignOwnerArgs),
    /// Add a team to an alert
    AddTeam(AddTeamArgs),
    /// Add a responder to an alert
    AddResponder(AddResponderArgs),
    /// Change the priority of an alert
    UpdatePriority(UpdatePriorityArgs),
    /// Change the message of an alert
    UpdateMessage(UpdateMessageArgs),
    /// Change the description of an alert
    UpdateDescription(UpdateDescriptionArgs),
    /// Run a custom action on an alert
    ExecuteAction(ExecuteActionArgs),
    /// List the activity log of an alert
    ListAlertLogs(AlertListArgs),
    /// List the recipients of an alert
    ListAlertRecipients(AlertIdentifierArgs),
    /// Attach a file to an alert
    AttachFile(AttachFileArgs),
    /// List the attachments of an alert
    ListAttachments(AlertIdentifierArgs),
    /// Get the status of an asynchronous alert request
    GetRequestStatus(RequestStatusArgs),
}

#[derive(Args, Debug, Clone)]
pub struct CreateAlertArgs {
    /// Alert message
    #[arg(long)]
    pub message: String,
    /// Client-defined identifier used for de-duplication
    #[arg(long)]
    pub alias: Option<String>,
    #[arg(long)]
    pub description: Option<String>,
    #[command(flatten)]
    pub responders: ResponderArgs,
    /// Comma separated names of teams and users that can see the alert
    #[arg(long = "visibleTo", value_delimiter = ',')]
    pub visible_to: Vec<String>,
    /// Comma separated types of the --visibleTo entries: user or team
    #[arg(long = "visibleToTypes", value_delimiter = ',')]
    pub visible_to_types: Vec<String>,
    /// Comma separated custom actions
    #[arg(long, value_delimiter = ',')]
    pub actions: Vec<String>,
    /// Comma separated tags
    #[arg(long, value_delimiter = ',')]
    pub tags: Vec<String>,
    /// Custom property as key=value, repeatable
    #[arg(long = "details")]
    pub details: Vec<String>,
    #[arg(long)]
    pub entity: Option<String>,
    #[arg(long)]
    pub source: Option<String>,
    #[arg(long, value_parser = PRIORITIES)]
    pub priority: Option<String>,
    #[arg(long)]
    pub note: Option<String>,
}

impl CreateAlertArgs {
    pub fn request(&self, user: Option<String>) -> Result<CreateAlertRequest> {
        Ok(CreateAlertRequest {
            message: self.message.clone(),
            alias: self.alias.clone(),
            description: self.description.clone(),
            responders: self.responders.responders()?,
            visible_to: pair_responders(
                &self.visible_to,
                &self.visible_to_types,
                ("--visibleTo", "--visibleToTypes"),
            )?,
            actions: self.actions.clone(),
            tags: self.tags.clone(),
            details: parse_details(&self.details)?,
            entity: self.entity.clone(),
            source: self.source.clone(),
            priority: self.priority.clone(),
            user,
            note: self.note.clone(),
        })
    }
}

#[derive(Args, Debug, Clone)]
pub struct QueryArgs {
    /// Search query, e.g. status=open
    #[arg(long)]
    pub query: Option<String>,
}

#[derive(Args, Debug, Clone)]
pub struct ListAlertsArgs {
    /// Search query, e.g. status=open
    #[arg(long)]
    pub query: Option<String>,
    #[command(flatten)]
    pub list: ListArgs,
    /// Id or name of a saved search
    #[arg(long = "searchIdentifier")]
    pub search_identifier: Option<String>,
    #[arg(long = "searchIdentifierType", value_parser = ["id", "name"])]
    pub search_identifier_type: Option<String>,
}

#[derive(Args, Debug, Clone)]
pub struct AlertActionArgs {
    #[command(flatten)]
    pub alert: AlertIdentifierArgs,
    #[command(flatten)]
    pub action: ActionArgs,
}

#[derive(Args, Debug, Clone)]
pub struct AddNoteArgs {
    #[command(flatten)]
    pub alert: AlertIdentifierArgs,
    #[arg(long)]
    pub note: String,
    #[arg(long)]
    pub source: Option<String>,
}

#[derive(Args, Debug, Clone)]
pub struct AlertListArgs {
    #[command(flatten)]
    pub alert: AlertIdentifierArgs,
    #[command(flatten)]
    pub list: ListArgs,
}

#[derive(Args, Debug, Clone)]
pub struct TagsArgs {
    #[command(flatten)]
    pub alert: AlertIdentifierArgs,
    /// Comma separated tags
    #[arg(long, value_delimiter = ',', required = true)]
    pub tags: Vec<String>,
    #[command(flatten)]
    pub action: ActionArgs,
}

#[derive(Args, Debug, Clone)]
pub struct AddDetailsArgs {
    #[command(flatten)]
    pub alert: AlertIdentifierArgs,
    /// Custom property as key=value, repeatable
    #[arg(long, required = true)]
    pub details: Vec<String>,
    #[command(flatten)]
    pub action: ActionArgs,
}

#[derive(Args, Debug, Clone)]
pub struct RemoveDetailsArgs {
    #[command(flatten)]
    pub alert: AlertIdentifierArgs,
    /// Comma separated property keys
    #[arg(long, value_delimiter = ',', required = true)]
    pub keys: Vec<String>,
    #[command(flatten)]
    pub action: ActionArgs,
}

#[derive(Args, Debug, Clone)]
pub struct SnoozeArgs {
    #[command(flatten)]
    pub alert: AlertIdentifierArgs,
    /// RFC 3339 time the snooze ends, e.g. 2024-03-10T12:00:00Z
    #[arg(long = "endTime", value_parser = rfc3339)]
    pub end_time: String,
    #[command(flatten)]
    pub action: ActionArgs,
}

#[derive(Args, Debug, Clone)]
pub struct EscalateArgs {
    #[command(flatten)]
    pub alert: AlertIdentifierArgs,
    #[command(flatten)]
    pub escalation: EscalationRefArgs,
    #[command(flatten)]
    pub action: ActionArgs,
}

#[derive(Args, Debug, Clone)]
pub struct AssignOwnerArgs {
    #[command(flatten)]
    pub alert: AlertIdentifierArgs,
    /// Username of the new owner
    #[arg(long)]
    pub owner: String,
    #[command(flatten)]
    pub action: ActionArgs,
}

#[derive(Args, Debug, Clone)]
pub struct AddTeamArgs {
    #[command(flatten)]
    pub alert: AlertIdentifierArgs,
    #[command(flatten)]
    pub team: TeamRefArgs,
    #[command(flatten)]
    pub action: ActionArgs,
}

#[derive(Args, Debug, Clone)]
pub struct AddResponderArgs {
    #[command(flatten)]
    pub alert: AlertIdentifierArgs,
    /// user, team, escalation or schedule
    #[arg(long = "responderType")]
    pub responder_type: ResponderType,
    /// Responder name (username for users)
    #[arg(long)]
    pub responder: String,
    #[command(flatten)]
    pub action: ActionArgs,
}

#[derive(Args, Debug, Clone)]
pub struct UpdatePriorityArgs {
    #[command(flatten)]
    pub alert: AlertIdentifierArgs,
    #[arg(long, value_parser = PRIORITIES)]
    pub priority: String,
}

#[derive(Args, Debug, Clone)]
pub struct UpdateMessageArgs {
    #[command(flatten)]
    pub alert: AlertIdentifierArgs,
    #[arg(long)]
    pub message: String,
}

#[derive(Args, Debug, Clone)]
pub struct UpdateDescriptionArgs {
    #[command(flatten)]
    pub alert: AlertIdentifierArgs,
    #[arg(long)]
    pub description: String,
}

#[derive(Args, Debug, Clone)]
pub struct ExecuteActionArgs {
    #[command(flatten)]
    pub alert: AlertIdentifierArgs,
    /// Name of the custom action
    #[arg(long = "action")]
    pub action_name: String,
    #[command(flatten)]
    pub action: ActionArgs,
}

#[derive(Args, Debug, Clone)]
pub struct AttachFileArgs {
    #[command(flatten)]
    pub alert: AlertIdentifierArgs,
    #[arg(long = "filePath")]
    pub file_path: PathBuf,
    /// Name of the index file inside a zip attachment
    #[arg(long = "indexFile")]
    pub index_file: Option<String>,
}

#[derive(Args, Debug, Clone)]
pub struct RequestStatusArgs {
    #[arg(long = "requestId")]
    pub request_id: String,
}

pub async fn execute(command: AlertCommand, ctx: &CommandContext<'_>) -> Result<()> {
    match command {
        AlertCommand::CreateAlert(args) => create_alert(ctx, args).await,
        AlertCommand::GetAlert(args) => {
            let identifier = args.identifier()?;
            let response = ctx
                .client
                .get_alert(&identifier)
                .await
                .with_context(|| format!("Failed to get alert {}", identifier.value))?;
            ctx.renderer.render(&response)
        }
        AlertCommand::ListAlerts(args) => {
            let params = ListAlertsParams {
                list: args.list.params(args.query),
                search_identifier: args.search_identifier,
                search_identifier_type: args.search_identifier_type,
            };
            let response = ctx
                .client
                .list_alerts(&params)
                .await
                .context("Failed to list alerts")?;
            ctx.renderer.render(&response)
        }
        AlertCommand::CountAlerts(args) => {
            let response = ctx
                .client
                .count_alerts(args.query.as_deref())
                .await
                .context("Failed to count alerts")?;
            ctx.renderer.render(&response)
        }
        AlertCommand::Acknowledge(args) => {
            let identifier = args.alert.identifier()?;
            let response = ctx
                .client
                .acknowledge_alert(&identifier, &args.action.request(ctx.user()))
                .await
                .context("Failed to acknowledge alert")?;
            ctx.renderer.render(&response)
        }
        AlertCommand::Unacknowledge(args) => {
            let identifier = args.alert.identifier()?;
            let response = ctx
                .client
                .unacknowledge_alert(&identifier, &args.action.request(ctx.user()))
                .await
                .context("Failed to unacknowledge alert")?;
            ctx.renderer.render(&response)
        }
        AlertCommand::CloseAlert(args) => {
            let identifier = args.alert.identifier()?;
            let response = ctx
                .client
                .close_alert(&identifier, &args.action.request(ctx.user()))
                .await
                .context("Failed to close alert")?;
            ctx.renderer.render(&response)
        }
        AlertCommand::DeleteAlert(args) => {
            let identifier = args.alert.identifier()?;
            let response = ctx
                .client
                .delete_alert(&identifier, &args.action.request(ctx.user()))
                .await
                .context("Failed to delete alert")?;
            info!(alert = %identifier.value, "Alert deletion requested");
            ctx.renderer.render(&response)
        }
        AlertCommand::AddNote(args) => {
            let identifier = args.alert.identifier()?;
            let action = ActionArgs {
                source: args.source,
                note: Some(args.note),
            }
            .request(ctx.user());
            let response = ctx
                .client
                .add_alert_note(&identifier, &action)
                .await
                .context("Failed to add note to alert")?;
            ctx.renderer.render(&response)
        }
        AlertCommand::ListAlertNotes(args) => {
            let identifier = args.alert.identifier()?;
            let response = ctx
                .client
                .list_alert_notes(&identifier, &args.list.params(None))
                .await
                .context("Failed to list alert notes")?;
            ctx.renderer.render(&response)
        }
        AlertCommand::AddTags(args) => {
            let identifier = args.alert.identifier()?;
            let body = AlertActionBody {
                payload: TagsPayload { tags: args.tags },
                action: args.action.request(ctx.user()),
            };
            let response = ctx
                .client
                .add_alert_tags(&identifier, &body)
                .await
                .context("Failed to add tags to alert")?;
            ctx.renderer.render(&response)
        }
        AlertCommand::RemoveTags(args) => {
            let identifier = args.alert.identifier()?;
            let params = RemovalParams {
                values: args.tags,
                action: args.action.request(ctx.user()),
            };
            let response = ctx
                .client
                .remove_alert_tags(&identifier, &params)
                .await
                .context("Failed to remove tags from alert")?;
            ctx.renderer.render(&response)
        }
        AlertCommand::AddDetails(args) => {
            let identifier = args.alert.identifier()?;
            let body = AlertActionBody {
                payload: DetailsPayload {
                    details: parse_details(&args.details)?,
                },
                action: args.action.request(ctx.user()),
            };
            let response = ctx
                .client
                .add_alert_details(&identifier, &body)
                .await
                .context("Failed to add details to alert")?;
            ctx.renderer.render(&response)
        }
        AlertCommand::RemoveDetails(args) => {
            let identifier = args.alert.identifier()?;
            let params = RemovalParams {
                values: args.keys,
                action: args.action.request(ctx.user()),
            };
            let response = ctx
                .client
                .remove_alert_details(&identifier, &params)
                .await
                .context("Failed to remove details from alert")?;
            ctx.renderer.render(&response)
        }
        AlertCommand::Snooze(args) => {
            let identifier = args.alert.identifier()?;
            let body = AlertActionBody {
                payload: SnoozePayload {
                    end_time: args.end_time,
                },
                action: args.action.request(ctx.user()),
            };
            let response = ctx
                .client
                .snooze_alert(&identifier, &body)
                .await
                .context("Failed to snooze alert")?;
            ctx.renderer.render(&response)
        }
        AlertCommand::EscalateToNext(args) => {
            let identifier = args.alert.identifier()?;
            let body = AlertActionBody {
                payload: EscalationPayload {
                    escalation: args.escalation.reference(),
                },
                action: args.action.request(ctx.user()),
            };
            let response = ctx
                .client
                .escalate_alert(&identifier, &body)
                .await
                .context("Failed to escalate alert")?;
            ctx.renderer.render(&response)
        }
        AlertCommand::AssignOwner(args) => {
            let identifier = args.alert.identifier()?;
            let body = AlertActionBody {
                payload: OwnerPayload {
                    owner: UserRef {
                        id: None,
                        username: Some(args.owner),
                    },
                },
                action: args.action.request(ctx.user()),
            };
            let response = ctx
                .client
                .assign_alert(&identifier, &body)
                .await
                .context("Failed to assign alert")?;
            ctx.renderer.render(&response)
        }
        AlertCommand::AddTeam(args) => {
            let identifier = args.alert.identifier()?;
            let body = AlertActionBody {
                payload: TeamPayload {
                    team: args.team.reference(),
                },
                action: args.action.request(ctx.user()),
            };
            let response = ctx
                .client
                .add_alert_team(&identifier, &body)
                .await
                .context("Failed to add team to alert")?;
            ctx.renderer.render(&response)
        }
        AlertCommand::AddResponder(args) => {
            let identifier = args.alert.identifier()?;
            let body = AlertActionBody {
                payload: ResponderPayload {
                    responder: Responder::named(args.responder_type, args.responder),
                },
                action: args.action.request(ctx.user()),
            };
            let response = ctx
                .client
                .add_alert_responder(&identifier, &body)
                .await
                .context("Failed to add responder to alert")?;
            ctx.renderer.render(&response)
        }
        AlertCommand::UpdatePriority(args) => {
            update_field(ctx, &args.alert, "priority", &args.priority).await
        }
        AlertCommand::UpdateMessage(args) => {
            update_field(ctx, &args.alert, "message", &args.message).await
        }
        AlertCommand::UpdateDescription(args) => {
            update_field(ctx, &args.alert, "description", &args.description).await
        }
        AlertCommand::ExecuteAction(args) => {
            let identifier = args.alert.identifier()?;
            let response = ctx
                .client
                .execute_alert_action(
                    &identifier,
                    &args.action_name,
                    &args.action.request(ctx.user()),
                )
                .await
                .with_context(|| format!("Failed to execute action '{}'", args.action_name))?;
            ctx.renderer.render(&response)
        }
        AlertCommand::ListAlertLogs(args) => {
            let identifier = args.alert.identifier()?;
            let response = ctx
                .client
                .list_alert_logs(&identifier, &args.list.params(None))
                .await
                .context("Failed to list alert logs")?;
            ctx.renderer.render(&response)
        }
        AlertCommand::ListAlertRecipients(args) => {
            let identifier = args.identifier()?;
            let response = ctx
                .client
                .list_alert_recipients(&identifier)
                .await
                .context("Failed to list alert recipients")?;
            ctx.renderer.render(&response)
        }
        AlertCommand::AttachFile(args) => attach_file(ctx, args).await,
        AlertCommand::ListAttachments(args) => {
            let identifier = args.identifier()?;
            let response = ctx
                .client
                .list_alert_attachments(&identifier)
                .await
                .context("Failed to list alert attachments")?;
            ctx.renderer.render(&response)
        }
        AlertCommand::GetRequestStatus(args) => {
            let response = ctx
                .client
                .get_request_status(&args.request_id)
                .await
                .with_context(|| format!("Failed to get status of request {}", args.request_id))?;
            ctx.renderer.render(&response)
        }
    }
}

async fn create_alert(ctx: &CommandContext<'_>, args: CreateAlertArgs) -> Result<()> {
    let request = args.request(ctx.user())?;
    let response = ctx
        .client
        .create_alert(&request)
        .await
        .context("Failed to create alert")?;
    info!(request_id = %response.request_id, "Alert creation requested");
    ctx.renderer.render(&response)
}

async fn update_field(
    ctx: &CommandContext<'_>,
    alert: &AlertIdentifierArgs,
    field: &str,
    value: &str,
) -> Result<()> {
    let identifier = alert.identifier()?;
    let response = ctx
        .client
        .update_alert_field(&identifier, field, value)
        .await
        .with_context(|| format!("Failed to update alert {field}"))?;
    ctx.renderer.render(&response)
}

async fn attach_file(ctx: &CommandContext<'_>, args: AttachFileArgs) -> Result<()> {
    let identifier = args.alert.identifier()?;
    let file_name = args
        .file_path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .ok_or_else(|| anyhow!("{} is not a file", args.file_path.display()))?;
    let content = tokio::fs::read(&args.file_path)
        .await
        .with_context(|| format!("Failed to read {}", args.file_path.display()))?;
    let user = ctx.user();

    let response = ctx
        .client
        .attach_file(
            &identifier,
            &file_name,
            content,
            user.as_deref(),
            args.index_file.as_deref(),
        )
        .await
        .with_context(|| format!("Failed to attach {file_name}"))?;
    ctx.renderer.render(&response)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_args() -> CreateAlertArgs {
        CreateAlertArgs {
            message: "disk full".to_string(),
            alias: None,
            description: None,
            responders: ResponderArgs::default(),
            visible_to: Vec::new(),
            visible_to_types: Vec::new(),
            actions: Vec::new(),
            tags: Vec::new(),
            details: Vec::new(),
            entity: None,
            source: None,
            priority: None,
            note: None,
        }
    }

    #[test]
    fn unset_flags_stay_out_of_the_request() {
        let request = create_args().request(None).unwrap();
        assert_eq!(
            serde_json::to_value(&request).unwrap(),
            serde_json::json!({"message": "disk full"})
        );
    }

    #[test]
    fn create_request_carries_responders_and_details() {
        let mut args = create_args();
        args.responders = ResponderArgs {
            responders: vec!["ops".to_string()],
            responder_types: vec!["team".to_string()],
        };
        args.details = vec!["host=db1".to_string()];
        args.priority = Some("P2".to_string());

        let request = args.request(Some("jane@example.com".to_string())).unwrap();
        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(value["responders"][0]["name"], "ops");
        assert_eq!(value["details"]["host"], "db1");
        assert_eq!(value["priority"], "P2");
        assert_eq!(value["user"], "jane@example.com");
    }

    #[test]
    fn create_request_rejects_unbalanced_responders() {
        let mut args = create_args();
        args.responders = ResponderArgs {
            responders: vec!["ops".to_string(), "dba".to_string()],
            responder_types: vec!["team".to_string()],
        };
        assert!(args.request(None).is_err());
    }
}
