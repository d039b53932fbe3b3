use anyhow::Result;
use clap::Subcommand;
use lamp_api::ApiClient;
use lamp_output::OutputRenderer;

use crate::invocation::{InvocationContext, USER};

pub mod alert;
pub mod args;
pub mod escalation;
pub mod heartbeat;
pub mod incident;
pub mod integration;
pub mod logs;
pub mod schedule;
pub mod service;
pub mod team;
pub mod user;

/// Every command, flattened so that subcommands sit directly under `lamp`.
#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    #[command(flatten)]
    Alert(alert::AlertCommand),
    #[command(flatten)]
    Incident(incident::IncidentCommand),
    #[command(flatten)]
    Schedule(schedule::ScheduleCommand),
    #[command(flatten)]
    Team(team::TeamCommand),
    #[command(flatten)]
    User(user::UserCommand),
    #[command(flatten)]
    Escalation(escalation::EscalationCommand),
    #[command(flatten)]
    Integration(integration::IntegrationCommand),
    #[command(flatten)]
    Heartbeat(heartbeat::HeartbeatCommand),
    #[command(flatten)]
    Service(service::ServiceCommand),
    #[command(flatten)]
    Logs(logs::LogsCommand),
}

pub struct CommandContext<'a> {
    pub client: &'a ApiClient,
    pub renderer: &'a OutputRenderer,
    pub invocation: &'a InvocationContext,
}

impl CommandContext<'_> {
    /// The global `--user`, only when it was explicitly given.
    pub fn user(&self) -> Option<String> {
        self.invocation.get_val(USER).map(str::to_string)
    }
}

pub async fn execute(command: Command, ctx: &CommandContext<'_>) -> Result<()> {
    match command {
        Command::Alert(command) => alert::execute(command, ctx).await,
        Command::Incident(command) => incident::execute(command, ctx).await,
        Command::Schedule(command) => schedule::execute(command, ctx).await,
        Command::Team(command) => team::execute(command, ctx).await,
        Command::User(command) => user::execute(command, ctx).await,
        Command::Escalation(command) => escalation::execute(command, ctx).await,
        Command::Integration(command) => integration::execute(command, ctx).await,
        Command::Heartbeat(command) => heartbeat::execute(command, ctx).await,
        Command::Service(command) => service::execute(command, ctx).await,
        Command::Logs(command) => logs::execute(command, ctx).await,
    }
}
