//! Arguments shared by several command families.

use std::collections::BTreeMap;

use anyhow::{anyhow, bail, Result};
use clap::Args;
use lamp_api::models::{ActionRequest, Identifier, IdentifierType, Responder, ResponderType, TeamRef};
use lamp_api::pagination::ListParams;

pub const PRIORITIES: [&str; 5] = ["P1", "P2", "P3", "P4", "P5"];

#[derive(Args, Debug, Clone)]
#[group(required = true, multiple = false)]
pub struct AlertIdentifierArgs {
    /// Alert id
    #[arg(long)]
    pub id: Option<String>,
    /// Alert alias
    #[arg(long)]
    pub alias: Option<String>,
    /// Alert tiny id
    #[arg(long = "tinyId")]
    pub tiny_id: Option<String>,
}

impl AlertIdentifierArgs {
    pub fn identifier(&self) -> Result<Identifier> {
        pick([
            (self.id.as_deref(), IdentifierType::Id),
            (self.alias.as_deref(), IdentifierType::Alias),
            (self.tiny_id.as_deref(), IdentifierType::Tiny),
        ])
        .ok_or_else(|| anyhow!("One of --id, --alias or --tinyId is required"))
    }
}

#[derive(Args, Debug, Clone)]
#[group(required = true, multiple = false)]
pub struct IncidentIdentifierArgs {
    /// Incident id
    #[arg(long)]
    pub id: Option<String>,
    /// Incident tiny id
    #[arg(long = "tinyId")]
    pub tiny_id: Option<String>,
}

impl IncidentIdentifierArgs {
    pub fn identifier(&self) -> Result<Identifier> {
        pick([
            (self.id.as_deref(), IdentifierType::Id),
            (self.tiny_id.as_deref(), IdentifierType::Tiny),
        ])
        .ok_or_else(|| anyhow!("One of --id or --tinyId is required"))
    }
}

/// `--id` or `--name`, used by schedules, teams and escalations.
#[derive(Args, Debug, Clone)]
#[group(required = true, multiple = false)]
pub struct NamedIdentifierArgs {
    /// Resource id
    #[arg(long)]
    pub id: Option<String>,
    /// Resource name
    #[arg(long)]
    pub name: Option<String>,
}

impl NamedIdentifierArgs {
    pub fn identifier(&self) -> Result<Identifier> {
        pick([
            (self.id.as_deref(), IdentifierType::Id),
            (self.name.as_deref(), IdentifierType::Name),
        ])
        .ok_or_else(|| anyhow!("One of --id or --name is required"))
    }
}

fn pick<const N: usize>(candidates: [(Option<&str>, IdentifierType); N]) -> Option<Identifier> {
    candidates
        .into_iter()
        .find_map(|(value, kind)| value.map(|value| Identifier::new(value, kind)))
}

#[derive(Args, Debug, Clone, Default)]
pub struct ActionArgs {
    /// Source of the action
    #[arg(long)]
    pub source: Option<String>,
    /// Note attached to the action
    #[arg(long)]
    pub note: Option<String>,
}

impl ActionArgs {
    pub fn request(&self, user: Option<String>) -> ActionRequest {
        ActionRequest {
            user,
            source: self.source.clone(),
            note: self.note.clone(),
        }
    }
}

#[derive(Args, Debug, Clone, Default)]
pub struct ListArgs {
    /// Maximum number of results
    #[arg(long)]
    pub limit: Option<u32>,
    /// Index of the first result
    #[arg(long)]
    pub offset: Option<u32>,
    /// Field to sort by
    #[arg(long)]
    pub sort: Option<String>,
    /// Sort order
    #[arg(long, value_parser = ["asc", "desc"])]
    pub order: Option<String>,
}

impl ListArgs {
    pub fn params(&self, query: Option<String>) -> ListParams {
        ListParams {
            query,
            limit: self.limit,
            offset: self.offset,
            sort: self.sort.clone(),
            order: self.order.clone(),
        }
    }
}

#[derive(Args, Debug, Clone, Default)]
pub struct ResponderArgs {
    /// Comma separated responder names (usernames for users)
    #[arg(long, value_delimiter = ',')]
    pub responders: Vec<String>,
    /// Comma separated responder types, one per responder: user, team,
    /// escalation or schedule
    #[arg(long = "responderTypes", value_delimiter = ',')]
    pub responder_types: Vec<String>,
}

impl ResponderArgs {
    pub fn responders(&self) -> Result<Vec<Responder>> {
        pair_responders(
            &self.responders,
            &self.responder_types,
            ("--responders", "--responderTypes"),
        )
    }
}

/// `--teamId` or `--teamName`.
#[derive(Args, Debug, Clone)]
#[group(required = true, multiple = false)]
pub struct TeamRefArgs {
    #[arg(long = "teamId")]
    pub team_id: Option<String>,
    #[arg(long = "teamName")]
    pub team_name: Option<String>,
}

impl TeamRefArgs {
    pub fn reference(&self) -> TeamRef {
        TeamRef {
            id: self.team_id.clone(),
            name: self.team_name.clone(),
        }
    }
}

/// `--escalationId` or `--escalationName`.
#[derive(Args, Debug, Clone)]
#[group(required = true, multiple = false)]
pub struct EscalationRefArgs {
    #[arg(long = "escalationId")]
    pub escalation_id: Option<String>,
    #[arg(long = "escalationName")]
    pub escalation_name: Option<String>,
}

impl EscalationRefArgs {
    pub fn reference(&self) -> TeamRef {
        TeamRef {
            id: self.escalation_id.clone(),
            name: self.escalation_name.clone(),
        }
    }
}

/// Zips names with their types. Both lists must have the same length.
pub fn pair_responders(
    names: &[String],
    kinds: &[String],
    flags: (&str, &str),
) -> Result<Vec<Responder>> {
    if names.len() != kinds.len() {
        bail!(
            "{} and {} must have equal counts (got {} and {})",
            flags.1,
            flags.0,
            kinds.len(),
            names.len()
        );
    }

    names
        .iter()
        .zip(kinds)
        .map(|(name, kind)| {
            let kind: ResponderType = kind.parse().map_err(|err: String| anyhow!(err))?;
            Ok(Responder::named(kind, name.trim()))
        })
        .collect()
}

/// Parses repeated `key=value` pairs.
pub fn parse_details(entries: &[String]) -> Result<BTreeMap<String, String>> {
    let mut details = BTreeMap::new();
    for entry in entries {
        let (key, value) = entry
            .split_once('=')
            .ok_or_else(|| anyhow!("Invalid detail '{entry}', expected key=value"))?;
        let key = key.trim();
        if key.is_empty() {
            bail!("Invalid detail '{entry}', key must not be empty");
        }
        details.insert(key.to_string(), value.to_string());
    }
    Ok(details)
}

/// clap value parser for RFC 3339 timestamps.
pub fn rfc3339(value: &str) -> std::result::Result<String, String> {
    chrono::DateTime::parse_from_rfc3339(value)
        .map(|_| value.to_string())
        .map_err(|err| format!("'{value}' is not an RFC 3339 timestamp: {err}"))
}
