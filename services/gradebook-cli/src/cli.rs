//! Command-line parsing
//!
//! Global flags (`--config <path>`, `--base-url <url>`) may appear anywhere;
//! the first remaining word is the command.

use anyhow::{Context, Result, anyhow, bail};
use chrono::NaiveDate;
use gradebook_client::models::{NotificationFilterStatus, ThemeMode};

pub const USAGE: &str = "\
usage: gradebook [--config <path>] [--base-url <url>] <command>

commands:
  login <login>                 sign in (password from GRADEBOOK_PASSWORD or prompt)
  logout                        sign out on this device
  whoami                        show the signed-in user
  dashboard                     today's summary
  subjects                      subjects with grade averages
  grades <subject-id>           grade history of one subject
  schedule [day|week] [DATE]    lessons; DATE is YYYY-MM-DD, default today
  notifications [all|read|unread]
  read <notification-id>        mark one notification read
  read-all                      mark every notification read
  settings [sync]               show settings, optionally pulled from the server
  settings theme <system|light|dark>
  settings notifications <on|off>";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScheduleScope {
    Day,
    Week,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SettingsAction {
    Show,
    Sync,
    Theme(ThemeMode),
    Notifications(bool),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Login { login: String },
    Logout,
    Whoami,
    Dashboard,
    Subjects,
    Grades { subject_id: String },
    Schedule { scope: ScheduleScope, date: Option<NaiveDate> },
    Notifications { filter: NotificationFilterStatus },
    Read { notification_id: String },
    ReadAll,
    Settings(SettingsAction),
    Help,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cli {
    pub config: Option<String>,
    pub base_url: Option<String>,
    pub command: Command,
}

/// Parse arguments, excluding the program name.
pub fn parse<I>(args: I) -> Result<Cli>
where
    I: IntoIterator<Item = String>,
{
    let mut config = None;
    let mut base_url = None;
    let mut words = Vec::new();

    let mut args = args.into_iter();
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--config" => {
                config = Some(args.next().context("--config requires a path")?);
            }
            "--base-url" => {
                base_url = Some(args.next().context("--base-url requires a URL")?);
            }
            "-h" | "--help" => words.insert(0, "help".to_string()),
            flag if flag.starts_with("--") => bail!("unknown option: {flag}"),
            _ => words.push(arg),
        }
    }

    let command = parse_command(&words)?;
    Ok(Cli {
        config,
        base_url,
        command,
    })
}

fn parse_command(words: &[String]) -> Result<Command> {
    let mut words = words.iter().map(String::as_str);
    let Some(name) = words.next() else {
        return Ok(Command::Help);
    };
    let rest: Vec<&str> = words.collect();

    let command = match (name, rest.as_slice()) {
        ("help", _) => Command::Help,
        ("login", [login]) => Command::Login {
            login: login.to_string(),
        },
        ("login", _) => bail!("login takes exactly one argument: <login>"),
        ("logout", []) => Command::Logout,
        ("whoami", []) => Command::Whoami,
        ("dashboard", []) => Command::Dashboard,
        ("subjects", []) => Command::Subjects,
        ("grades", [subject_id]) => Command::Grades {
            subject_id: subject_id.to_string(),
        },
        ("grades", _) => bail!("grades takes exactly one argument: <subject-id>"),
        ("schedule", args) => parse_schedule(args)?,
        ("notifications", []) => Command::Notifications {
            filter: NotificationFilterStatus::All,
        },
        ("notifications", [filter]) => Command::Notifications {
            filter: filter.parse().map_err(|e: String| anyhow!(e))?,
        },
        ("read", [id]) => Command::Read {
            notification_id: id.to_string(),
        },
        ("read-all", []) => Command::ReadAll,
        ("settings", args) => Command::Settings(parse_settings(args)?),
        (name, []) => bail!("unknown command: {name}"),
        (name, _) => bail!("unexpected arguments for {name}"),
    };
    Ok(command)
}

fn parse_schedule(args: &[&str]) -> Result<Command> {
    let mut scope = ScheduleScope::Day;
    let mut date = None;
    for arg in args {
        match *arg {
            "day" => scope = ScheduleScope::Day,
            "week" => scope = ScheduleScope::Week,
            other => {
                let parsed = NaiveDate::parse_from_str(other, "%Y-%m-%d")
                    .with_context(|| format!("invalid date {other:?}, expected YYYY-MM-DD"))?;
                date = Some(parsed);
            }
        }
    }
    Ok(Command::Schedule { scope, date })
}

fn parse_settings(args: &[&str]) -> Result<SettingsAction> {
    match args {
        [] => Ok(SettingsAction::Show),
        ["sync"] => Ok(SettingsAction::Sync),
        ["theme", mode] => Ok(SettingsAction::Theme(
            mode.parse().map_err(|e: String| anyhow!(e))?,
        )),
        ["notifications", "on"] => Ok(SettingsAction::Notifications(true)),
        ["notifications", "off"] => Ok(SettingsAction::Notifications(false)),
        _ => bail!("usage: settings [sync | theme <mode> | notifications <on|off>]"),
    }
}
