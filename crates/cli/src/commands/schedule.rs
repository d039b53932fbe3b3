use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{ArgAction, Args, Subcommand};
use lamp_api::models::{Identifier, TeamRef};
use lamp_api::schedules::{OnCallParams, ScheduleRequest};
use serde::Serialize;
use tracing::info;

use super::args::{rfc3339, NamedIdentifierArgs};
use super::CommandContext;

#[derive(Subcommand, Debug, Clone)]
#[command(rename_all = "camelCase")]
pub enum ScheduleCommand {
    /// Create a schedule
    CreateSchedule(CreateScheduleArgs),
    /// Get a schedule
    GetSchedule(NamedIdentifierArgs),
    /// Update a schedule
    UpdateSchedule(UpdateScheduleArgs),
    /// Delete a schedule
    DeleteSchedule(NamedIdentifierArgs),
    /// List schedules
    ListSchedules(ListSchedulesArgs),
    /// Export a schedule as an iCalendar file
    ExportSchedule(ExportScheduleArgs),
    /// Show who is on call for a schedule
    WhoIsOnCall(WhoIsOnCallArgs),
}

#[derive(Args, Debug, Clone)]
pub struct ScheduleFields {
    #[arg(long)]
    pub description: Option<String>,
    /// IANA time zone, e.g. Europe/Berlin
    #[arg(long)]
    pub timezone: Option<String>,
    #[arg(long, action = ArgAction::Set)]
    pub enabled: Option<bool>,
    /// Name of the team owning the schedule
    #[arg(long = "ownerTeam")]
    pub owner_team: Option<String>,
}

impl ScheduleFields {
    fn request(&self, name: Option<String>) -> ScheduleRequest {
        ScheduleRequest {
            name,
            description: self.description.clone(),
            timezone: self.timezone.clone(),
            enabled: self.enabled,
            owner_team: self.owner_team.clone().map(|name| TeamRef {
                id: None,
                name: Some(name),
            }),
        }
    }
}

#[derive(Args, Debug, Clone)]
pub struct CreateScheduleArgs {
    #[arg(long)]
    pub name: String,
    #[command(flatten)]
    pub fields: ScheduleFields,
}

#[derive(Args, Debug, Clone)]
pub struct UpdateScheduleArgs {
    /// Id of the schedule to update
    #[arg(long)]
    pub id: String,
    /// New schedule name
    #[arg(long)]
    pub name: Option<String>,
    #[command(flatten)]
    pub fields: ScheduleFields,
}

#[derive(Args, Debug, Clone)]
pub struct ListSchedulesArgs {
    /// Include rotations in the result
    #[arg(long)]
    pub expand: bool,
}

#[derive(Args, Debug, Clone)]
pub struct ExportScheduleArgs {
    #[command(flatten)]
    pub schedule: NamedIdentifierArgs,
    /// Directory the .ics file is written to
    #[arg(long, default_value = ".")]
    pub path: PathBuf,
}

#[derive(Args, Debug, Clone)]
pub struct WhoIsOnCallArgs {
    #[command(flatten)]
    pub schedule: NamedIdentifierArgs,
    /// Return only the on-call usernames
    #[arg(long)]
    pub flat: bool,
    /// RFC 3339 point in time, defaults to now
    #[arg(long, value_parser = rfc3339)]
    pub date: Option<String>,
}

#[derive(Serialize)]
struct ExportedSchedule {
    file: String,
    bytes: usize,
}

pub async fn execute(command: ScheduleCommand, ctx: &CommandContext<'_>) -> Result<()> {
    match command {
        ScheduleCommand::CreateSchedule(args) => {
            let request = args.fields.request(Some(args.name));
            let response = ctx
                .client
                .create_schedule(&request)
                .await
                .context("Failed to create schedule")?;
            info!(schedule = %response.data.id, "Schedule created");
            ctx.renderer.render(&response)
        }
        ScheduleCommand::GetSchedule(args) => {
            let identifier = args.identifier()?;
            let response = ctx
                .client
                .get_schedule(&identifier)
                .await
                .with_context(|| format!("Failed to get schedule {}", identifier.value))?;
            ctx.renderer.render(&response)
        }
        ScheduleCommand::UpdateSchedule(args) => {
            let request = args.fields.request(args.name);
            let response = ctx
                .client
                .update_schedule(&Identifier::id(args.id.as_str()), &request)
                .await
                .with_context(|| format!("Failed to update schedule {}", args.id))?;
            ctx.renderer.render(&response)
        }
        ScheduleCommand::DeleteSchedule(args) => {
            let identifier = args.identifier()?;
            let response = ctx
                .client
                .delete_schedule(&identifier)
                .await
                .context("Failed to delete schedule")?;
            ctx.renderer.render(&response)
        }
        ScheduleCommand::ListSchedules(args) => {
            let response = ctx
                .client
                .list_schedules(args.expand)
                .await
                .context("Failed to list schedules")?;
            ctx.renderer.render(&response)
        }
        ScheduleCommand::ExportSchedule(args) => {
            let identifier = args.schedule.identifier()?;
            let calendar = ctx
                .client
                .export_schedule(&identifier)
                .await
                .with_context(|| format!("Failed to export schedule {}", identifier.value))?;
            let file = ics_path(&args.path, &identifier.value);
            tokio::fs::write(&file, calendar.as_bytes())
                .await
                .with_context(|| format!("Failed to write {}", file.display()))?;
            info!(file = %file.display(), "Schedule exported");
            ctx.renderer.render(&ExportedSchedule {
                file: file.display().to_string(),
                bytes: calendar.len(),
            })
        }
        ScheduleCommand::WhoIsOnCall(args) => {
            let identifier = args.schedule.identifier()?;
            let params = OnCallParams {
                flat: args.flat,
                date: args.date,
            };
            let response = ctx
                .client
                .who_is_on_call(&identifier, &params)
                .await
                .context("Failed to get on-call participants")?;
            ctx.renderer.render(&response)
        }
    }
}

/// `<dir>/<schedule>.ics`, with path separators in the schedule name replaced.
fn ics_path(directory: &Path, schedule: &str) -> PathBuf {
    let stem: String = schedule
        .chars()
        .map(|c| if matches!(c, '/' | '\\') { '_' } else { c })
        .collect();
    directory.join(format!("{stem}.ics"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ics_file_is_named_after_schedule() {
        assert_eq!(
            ics_path(Path::new("/tmp/out"), "primary"),
            PathBuf::from("/tmp/out/primary.ics")
        );
        assert_eq!(
            ics_path(Path::new("."), "ops/night"),
            PathBuf::from("./ops_night.ics")
        );
    }

    #[test]
    fn update_leaves_unset_fields_out() {
        let fields = ScheduleFields {
            description: None,
            timezone: Some("Europe/Berlin".to_string()),
            enabled: None,
            owner_team: None,
        };
        assert_eq!(
            serde_json::to_value(fields.request(None)).unwrap(),
            serde_json::json!({"timezone": "Europe/Berlin"})
        );
    }
}
