use anyhow::{Context, Result};
use clap::{Args, Subcommand};
use lamp_api::teams::{TeamMember, TeamRequest};
use tracing::info;

use super::args::{ListArgs, NamedIdentifierArgs};
use super::CommandContext;

#[derive(Subcommand, Debug, Clone)]
#[command(rename_all = "camelCase")]
pub enum TeamCommand {
    /// Create a team
    CreateTeam(CreateTeamArgs),
    /// Get a team
    GetTeam(NamedIdentifierArgs),
    /// Update a team
    UpdateTeam(UpdateTeamArgs),
    /// Delete a team
    DeleteTeam(NamedIdentifierArgs),
    /// List teams
    ListTeams,
    /// List the activity log of a team
    ListTeamLogs(TeamLogsArgs),
}

#[derive(Args, Debug, Clone)]
pub struct MemberArgs {
    /// Comma separated usernames added with the user role
    #[arg(long, value_delimiter = ',')]
    pub members: Vec<String>,
    /// Comma separated usernames added with the admin role
    #[arg(long, value_delimiter = ',')]
    pub admins: Vec<String>,
}

impl MemberArgs {
    fn members(&self) -> Vec<TeamMember> {
        let admins = self
            .admins
            .iter()
            .map(|username| TeamMember::with_username(username.trim(), Some("admin".to_string())));
        let users = self
            .members
            .iter()
            .map(|username| TeamMember::with_username(username.trim(), Some("user".to_string())));
        admins.chain(users).collect()
    }
}

#[derive(Args, Debug, Clone)]
pub struct CreateTeamArgs {
    #[arg(long)]
    pub name: String,
    #[arg(long)]
    pub description: Option<String>,
    #[command(flatten)]
    pub members: MemberArgs,
}

#[derive(Args, Debug, Clone)]
pub struct UpdateTeamArgs {
    /// Id of the team to update
    #[arg(long)]
    pub id: String,
    /// New team name
    #[arg(long)]
    pub name: Option<String>,
    #[arg(long)]
    pub description: Option<String>,
    // Replaces the member list when given.
    #[command(flatten)]
    pub members: MemberArgs,
}

#[derive(Args, Debug, Clone)]
pub struct TeamLogsArgs {
    #[command(flatten)]
    pub team: NamedIdentifierArgs,
    #[command(flatten)]
    pub list: ListArgs,
}

pub async fn execute(command: TeamCommand, ctx: &CommandContext<'_>) -> Result<()> {
    match command {
        TeamCommand::CreateTeam(args) => {
            let request = TeamRequest {
                name: Some(args.name),
                description: args.description,
                members: args.members.members(),
            };
            let response = ctx
                .client
                .create_team(&request)
                .await
                .context("Failed to create team")?;
            info!(team = %response.data.id, "Team created");
            ctx.renderer.render(&response)
        }
        TeamCommand::GetTeam(args) => {
            let identifier = args.identifier()?;
            let response = ctx
                .client
                .get_team(&identifier)
                .await
                .with_context(|| format!("Failed to get team {}", identifier.value))?;
            ctx.renderer.render(&response)
        }
        TeamCommand::UpdateTeam(args) => {
            let request = TeamRequest {
                name: args.name,
                description: args.description,
                members: args.members.members(),
            };
            let response = ctx
                .client
                .update_team(&args.id, &request)
                .await
                .with_context(|| format!("Failed to update team {}", args.id))?;
            ctx.renderer.render(&response)
        }
        TeamCommand::DeleteTeam(args) => {
            let identifier = args.identifier()?;
            let response = ctx
                .client
                .delete_team(&identifier)
                .await
                .context("Failed to delete team")?;
            ctx.renderer.render(&response)
        }
        TeamCommand::ListTeams => {
            let response = ctx
                .client
                .list_teams()
                .await
                .context("Failed to list teams")?;
            ctx.renderer.render(&response)
        }
        TeamCommand::ListTeamLogs(args) => {
            let identifier = args.team.identifier()?;
            let response = ctx
                .client
                .list_team_logs(&identifier, &args.list.params(None))
                .await
                .context("Failed to list team logs")?;
            ctx.renderer.render(&response)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn admins_come_before_users() {
        let args = MemberArgs {
            members: vec!["bob@example.com".to_string()],
            admins: vec![" alice@example.com".to_string()],
        };
        let members = args.members();
        assert_eq!(members.len(), 2);
        assert_eq!(
            members[0],
            TeamMember::with_username("alice@example.com", Some("admin".to_string()))
        );
        assert_eq!(members[1].role.as_deref(), Some("user"));
    }

    #[test]
    fn no_members_means_no_member_list() {
        let args = MemberArgs {
            members: Vec::new(),
            admins: Vec::new(),
        };
        let request = TeamRequest {
            name: Some("ops".to_string()),
            description: None,
            members: args.members(),
        };
        assert_eq!(
            serde_json::to_value(&request).unwrap(),
            serde_json::json!({"name": "ops"})
        );
    }
}
