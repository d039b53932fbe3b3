use std::collections::BTreeMap;

use clap::parser::ValueSource;
use clap::{Arg, ArgAction, ArgMatches};

pub const API_KEY: &str = "apiKey";
pub const CONFIG: &str = "config";
pub const VERBOSE: &str = "verbose";
pub const USER: &str = "user";
pub const OUTPUT_FORMAT: &str = "output-format";
pub const PRETTY: &str = "pretty";

/// Flags accepted by every command, before or after the subcommand name.
pub fn global_args() -> Vec<Arg> {
    vec![
        Arg::new(API_KEY)
            .long(API_KEY)
            .env(lamp_config::API_KEY_ENV)
            .hide_env_values(true)
            .global(true)
            .help("OpsGenie API key"),
        Arg::new(CONFIG)
            .long(CONFIG)
            .env(lamp_config::CONFIG_PATH_ENV)
            .global(true)
            .help("Path to the config file (defaults to ~/.lamp/lamp.yaml)"),
        Arg::new(VERBOSE)
            .short('v')
            .long(VERBOSE)
            .action(ArgAction::SetTrue)
            .global(true)
            .help("Enable debug logging"),
        Arg::new(USER)
            .long(USER)
            .global(true)
            .help("User recorded as the actor of alert actions"),
        Arg::new(OUTPUT_FORMAT)
            .long(OUTPUT_FORMAT)
            .default_value("json")
            .global(true)
            .help("Output format: json or yaml"),
        Arg::new(PRETTY)
            .long(PRETTY)
            .action(ArgAction::SetTrue)
            .global(true)
            .help("Indent JSON output"),
    ]
}

/// Flags explicitly supplied for one invocation, either on the command line
/// or through a bound environment variable. Defaulted flags are not recorded.
#[derive(Debug, Clone, Default)]
pub struct InvocationContext {
    values: BTreeMap<String, String>,
}

impl InvocationContext {
    /// The innermost subcommand wins over its parents. Multiple values are
    /// joined with commas.
    pub fn from_matches(matches: &ArgMatches) -> Self {
        let mut layers = vec![matches];
        let mut current = matches;
        while let Some((_, sub)) = current.subcommand() {
            layers.push(sub);
            current = sub;
        }

        let mut values = BTreeMap::new();
        for layer in layers.into_iter().rev() {
            for id in layer.ids() {
                let name = id.as_str();
                if values.contains_key(name) || !explicitly_set(layer, name) {
                    continue;
                }
                if let Ok(Some(raw)) = layer.try_get_raw(name) {
                    let joined = raw
                        .map(|value| value.to_string_lossy().into_owned())
                        .collect::<Vec<_>>()
                        .join(",");
                    values.insert(name.to_string(), joined);
                }
            }
        }

        Self { values }
    }

    /// `Some` only when the flag was explicitly supplied. Callers leave the
    /// corresponding request field unset on `None`.
    pub fn get_val(&self, name: &str) -> Option<&str> {
        self.values.get(name).map(String::as_str)
    }

    pub fn is_set(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }
}

fn explicitly_set(matches: &ArgMatches, name: &str) -> bool {
    matches!(
        matches.value_source(name),
        Some(ValueSource::CommandLine | ValueSource::EnvVariable)
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Command;

    fn command() -> Command {
        Command::new("lamp")
            .args(global_args())
            .subcommand(
                Command::new("getAlert")
                    .arg(Arg::new("id").long("id"))
                    .arg(Arg::new("source").long("source").default_value("lamp")),
            )
    }

    fn parse(args: &[&str]) -> InvocationContext {
        let matches = command()
            .try_get_matches_from(args)
            .expect("arguments should parse");
        InvocationContext::from_matches(&matches)
    }

    #[test]
    fn explicit_flags_are_present() {
        let ctx = parse(&["lamp", "getAlert", "--id", "42", "--user", "jane"]);
        assert_eq!(ctx.get_val("id"), Some("42"));
        assert_eq!(ctx.get_val(USER), Some("jane"));
    }

    #[test]
    fn defaulted_flags_are_absent() {
        let ctx = parse(&["lamp", "getAlert", "--id", "42"]);
        assert_eq!(ctx.get_val("source"), None);
        assert_eq!(ctx.get_val(OUTPUT_FORMAT), None);
        assert!(!ctx.is_set(PRETTY));
        assert!(!ctx.is_set(VERBOSE));
    }

    #[test]
    fn unknown_flags_are_absent() {
        let ctx = parse(&["lamp", "getAlert"]);
        assert_eq!(ctx.get_val("tinyId"), None);
    }

    #[test]
    fn global_flags_before_subcommand_are_seen() {
        let ctx = parse(&["lamp", "--output-format", "yaml", "-v", "getAlert", "--id", "1"]);
        assert_eq!(ctx.get_val(OUTPUT_FORMAT), Some("yaml"));
        assert!(ctx.is_set(VERBOSE));
    }

    #[test]
    fn global_flags_after_subcommand_are_seen() {
        let ctx = parse(&["lamp", "getAlert", "--id", "1", "--pretty"]);
        assert!(ctx.is_set(PRETTY));
        assert_eq!(ctx.get_val(PRETTY), Some("true"));
    }

    #[test]
    fn explicit_default_value_counts_as_present() {
        let ctx = parse(&["lamp", "getAlert", "--source", "lamp"]);
        assert_eq!(ctx.get_val("source"), Some("lamp"));
    }
}
