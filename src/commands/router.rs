//! Maps slash-command text onto registered commands.
//!
//! Two invocation styles are accepted:
//! - `/deploy web api true` where the slash command is itself a registered
//!   command and the text holds its arguments.
//! - `/infra deploy web api true` where the first word of the text names
//!   the command.
//!
//! Routing never talks to a provider. It either answers immediately (help,
//! unknown command, bad arguments) or produces an [`Invocation`].

use std::collections::BTreeMap;

use tracing::{debug, warn};

use crate::types::{Invocation, SlackCommand, SlackResponse};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArgSpec {
    Required(&'static str),
    Optional {
        name: &'static str,
        default: &'static str,
    },
}

impl ArgSpec {
    pub fn name(&self) -> &'static str {
        match self {
            ArgSpec::Required(name) => *name,
            ArgSpec::Optional { name, .. } => *name,
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct CommandSpec {
    pub name: &'static str,
    pub args: &'static [ArgSpec],
    pub description: &'static str,
}

impl CommandSpec {
    pub fn usage(&self) -> String {
        let mut usage = self.name.to_string();
        for arg in self.args {
            match arg {
                ArgSpec::Required(name) => usage.push_str(&format!(" <{}>", name)),
                ArgSpec::Optional { name, default } => {
                    usage.push_str(&format!(" [{}={}]", name, default))
                }
            }
        }
        usage
    }

    /// Binds whitespace-separated words to the declared arguments in order.
    pub fn bind(&self, words: &[&str]) -> Option<BTreeMap<String, String>> {
        if words.len() > self.args.len() {
            return None;
        }

        let mut bound = BTreeMap::new();
        for (i, arg) in self.args.iter().enumerate() {
            let value = match (words.get(i), arg) {
                (Some(word), _) => word.to_string(),
                (None, ArgSpec::Optional { default, .. }) => default.to_string(),
                (None, ArgSpec::Required(_)) => return None,
            };
            bound.insert(arg.name().to_string(), value);
        }
        Some(bound)
    }
}

pub const SERVERS: CommandSpec = CommandSpec {
    name: "servers",
    args: &[ArgSpec::Required("command")],
    description: "Manage servers infrastructure. Valid commands are `stop`, `start`, or `status`",
};

pub const DEPLOY: CommandSpec = CommandSpec {
    name: "deploy",
    args: &[
        ArgSpec::Required("stack"),
        ArgSpec::Required("app"),
        ArgSpec::Optional {
            name: "migrate",
            default: "false",
        },
    ],
    description: "Trigger an application deploy",
};

pub const COMMANDS: &[CommandSpec] = &[SERVERS, DEPLOY];

pub fn find_command(name: &str) -> Option<&'static CommandSpec> {
    COMMANDS.iter().find(|spec| spec.name == name)
}

#[derive(Debug, Clone, PartialEq)]
pub enum Routed {
    /// Answer without touching any provider.
    Respond(SlackResponse),
    /// Run the command and answer with its result.
    Invoke(Invocation),
}

pub fn route(command: &SlackCommand) -> Routed {
    let words: Vec<&str> = command.text.split_whitespace().collect();
    let slash_name = command.command.trim().trim_start_matches('/');

    let (name, args) = if find_command(slash_name).is_some() {
        (slash_name, &words[..])
    } else {
        match words.split_first() {
            Some((first, rest)) => (*first, rest),
            None => ("help", &words[..]),
        }
    };

    if name == "help" {
        return Routed::Respond(help_response());
    }

    let Some(spec) = find_command(name) else {
        warn!("Unknown command: {}", name);
        return Routed::Respond(SlackResponse::ephemeral(format!(
            "Unknown command `{}`\n{}",
            name,
            help_text()
        )));
    };

    match spec.bind(args) {
        Some(bound) => {
            debug!("Routed {} with {:?}", spec.name, bound);
            Routed::Invoke(Invocation {
                command: spec.name.to_string(),
                args: bound,
                user_id: command.user_id.clone(),
                user_name: command.user_name.clone(),
            })
        }
        None => {
            warn!("Bad arguments for {}: {:?}", spec.name, args);
            Routed::Respond(SlackResponse::ephemeral(format!(
                "Usage: {}",
                spec.usage()
            )))
        }
    }
}

pub fn help_text() -> String {
    let lines: Vec<String> = COMMANDS
        .iter()
        .map(|spec| format!("`{}` - {}", spec.usage(), spec.description))
        .collect();
    format!("Available commands:\n{}", lines.join("\n"))
}

fn help_response() -> SlackResponse {
    SlackResponse::ephemeral(help_text())
}
