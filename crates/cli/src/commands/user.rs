use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Args, Subcommand};
use lamp_api::pagination::collect_pages;
use lamp_api::users::{CreateUserRequest, User, UserPages, UserRole};
use serde::Serialize;
use tracing::info;

use super::args::ListArgs;
use super::CommandContext;

pub const EXPORT_FILE: &str = "result.csv";
const EXPORT_PAGE_SIZE: u32 = 100;

#[derive(Subcommand, Debug, Clone)]
#[command(rename_all = "camelCase")]
pub enum UserCommand {
    /// Create a user
    CreateUser(CreateUserArgs),
    /// Get a user
    GetUser(UserIdentifierArgs),
    /// Delete a user
    DeleteUser(UserIdentifierArgs),
    /// List users
    ListUsers(ListUsersArgs),
    /// Export every user to result.csv
    ExportUsers(ExportUsersArgs),
}

#[derive(Args, Debug, Clone)]
pub struct CreateUserArgs {
    /// Email address of the user
    #[arg(long)]
    pub username: String,
    #[arg(long = "fullName")]
    pub full_name: String,
    /// Role name, e.g. User, Admin or a custom role
    #[arg(long)]
    pub role: String,
    #[arg(long)]
    pub timezone: Option<String>,
    #[arg(long)]
    pub locale: Option<String>,
    /// Do not send an invitation email
    #[arg(long = "invitationDisabled")]
    pub invitation_disabled: bool,
}

#[derive(Args, Debug, Clone)]
pub struct UserIdentifierArgs {
    /// User id or username
    #[arg(long)]
    pub identifier: String,
}

#[derive(Args, Debug, Clone)]
pub struct ListUsersArgs {
    #[arg(long)]
    pub query: Option<String>,
    #[command(flatten)]
    pub list: ListArgs,
}

#[derive(Args, Debug, Clone)]
pub struct ExportUsersArgs {
    #[arg(long)]
    pub query: Option<String>,
    /// Directory result.csv is written to
    #[arg(long, default_value = ".")]
    pub path: PathBuf,
}

#[derive(Serialize)]
struct ExportedUsers {
    file: String,
    users: usize,
}

#[derive(Serialize)]
struct UserRow<'a> {
    id: &'a str,
    username: &'a str,
    full_name: &'a str,
    role: &'a str,
    time_zone: &'a str,
    locale: &'a str,
    blocked: bool,
    verified: bool,
    created_at: &'a str,
}

impl<'a> From<&'a User> for UserRow<'a> {
    fn from(user: &'a User) -> Self {
        Self {
            id: &user.id,
            username: &user.username,
            full_name: &user.full_name,
            role: user.role.as_ref().map_or("", |role| role.name.as_str()),
            time_zone: user.time_zone.as_deref().unwrap_or(""),
            locale: user.locale.as_deref().unwrap_or(""),
            blocked: user.blocked,
            verified: user.verified,
            created_at: user.created_at.as_deref().unwrap_or(""),
        }
    }
}

pub async fn execute(command: UserCommand, ctx: &CommandContext<'_>) -> Result<()> {
    match command {
        UserCommand::CreateUser(args) => {
            let request = CreateUserRequest {
                username: args.username,
                full_name: args.full_name,
                role: UserRole {
                    id: None,
                    name: args.role,
                },
                time_zone: args.timezone,
                locale: args.locale,
                invitation_disabled: args.invitation_disabled.then_some(true),
            };
            let response = ctx
                .client
                .create_user(&request)
                .await
                .context("Failed to create user")?;
            info!(user = %response.data.id, "User created");
            ctx.renderer.render(&response)
        }
        UserCommand::GetUser(args) => {
            let response = ctx
                .client
                .get_user(&args.identifier)
                .await
                .with_context(|| format!("Failed to get user {}", args.identifier))?;
            ctx.renderer.render(&response)
        }
        UserCommand::DeleteUser(args) => {
            let response = ctx
                .client
                .delete_user(&args.identifier)
                .await
                .with_context(|| format!("Failed to delete user {}", args.identifier))?;
            ctx.renderer.render(&response)
        }
        UserCommand::ListUsers(args) => {
            let response = ctx
                .client
                .list_users(&args.list.params(args.query))
                .await
                .context("Failed to list users")?;
            ctx.renderer.render(&response)
        }
        UserCommand::ExportUsers(args) => {
            let pages = UserPages::new(ctx.client, args.query);
            let users = collect_pages(&pages, EXPORT_PAGE_SIZE, None)
                .await
                .context("Failed to list users")?;

            let file = args.path.join(EXPORT_FILE);
            write_users_csv(&file, &users)?;
            info!(file = %file.display(), users = users.len(), "Users exported");

            ctx.renderer.render(&ExportedUsers {
                file: file.display().to_string(),
                users: users.len(),
            })
        }
    }
}

fn write_users_csv(path: &Path, users: &[User]) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)
        .with_context(|| format!("Failed to create {}", path.display()))?;
    for user in users {
        writer.serialize(UserRow::from(user))?;
    }
    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn user(id: &str, username: &str, role: Option<&str>) -> User {
        serde_json::from_value(serde_json::json!({
            "id": id,
            "username": username,
            "fullName": "Test User",
            "role": role.map(|name| serde_json::json!({"name": name})),
            "verified": true,
        }))
        .unwrap()
    }

    #[test]
    fn writes_header_and_one_row_per_user() {
        let dir = tempdir().unwrap();
        let path = dir.path().join(EXPORT_FILE);
        let users = vec![
            user("1", "jane@example.com", Some("Admin")),
            user("2", "john@example.com", None),
        ];

        write_users_csv(&path, &users).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(
            lines[0],
            "id,username,full_name,role,time_zone,locale,blocked,verified,created_at"
        );
        assert_eq!(
            lines[1],
            "1,jane@example.com,Test User,Admin,,,false,true,"
        );
        assert_eq!(lines[2], "2,john@example.com,Test User,,,,false,true,");
        assert_eq!(lines.len(), 3);
    }

    #[test]
    fn missing_directory_is_an_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("missing").join(EXPORT_FILE);
        assert!(write_users_csv(&path, &[]).is_err());
    }
}
