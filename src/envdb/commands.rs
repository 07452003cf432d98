//! Environment store commands.
//!
//! Every operation is a named entry in [`COMMANDS`]. The interactive prompt
//! and the `mce-env` flags both go through [`Session::dispatch`], so a flag
//! like `--update-status hub pass` is exactly the prompt line
//! `status hub pass`.
//!
//! A record can be referenced by cluster name or by its number in the most
//! recent listing (`3` or `#3`).

use crossterm::style::Stylize;
use std::io::{BufRead, Write};
use std::process::ExitStatus;
use std::str::FromStr;
use strum::IntoEnumIterator;
use tracing::debug;

use super::format::{format_connection, format_env_details, format_env_line, format_stats, list_header};
use super::{EnvStatus, EnvStore, EnvironmentRecord};
use crate::error::Result;
use crate::notify::LoginCommand;

/// Whether the prompt loop should keep going
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

type Handler = fn(&mut Session<'_>, &[String]) -> Result<Flow>;

/// Runs an `oc login` attached to the terminal
pub type LoginRunner<'a> = Box<dyn FnMut(&LoginCommand) -> std::io::Result<ExitStatus> + 'a>;

pub struct CommandSpec {
    pub name: &'static str,
    pub aliases: &'static [&'static str],
    pub usage: &'static str,
    pub summary: &'static str,
    handler: Handler,
}

pub static COMMANDS: &[CommandSpec] = &[
    CommandSpec {
        name: "list",
        aliases: &["ls"],
        usage: "list [PLATFORM] [status=STATUS]",
        summary: "List environments, most recently used first",
        handler: cmd_list,
    },
    CommandSpec {
        name: "search",
        aliases: &["find"],
        usage: "search QUERY",
        summary: "Search names, platforms, notes, Jira and Polarion references",
        handler: cmd_search,
    },
    CommandSpec {
        name: "stats",
        aliases: &[],
        usage: "stats",
        summary: "Counts by platform and status",
        handler: cmd_stats,
    },
    CommandSpec {
        name: "show",
        aliases: &["s"],
        usage: "show REF",
        summary: "Details and login command",
        handler: cmd_show,
    },
    CommandSpec {
        name: "login",
        aliases: &["l"],
        usage: "login REF",
        summary: "Run oc login against the hub cluster",
        handler: cmd_login,
    },
    CommandSpec {
        name: "status",
        aliases: &["u"],
        usage: "status REF STATUS [NOTES...]",
        summary: "Set test status (pass, fail, blocked, in_progress, unknown)",
        handler: cmd_status,
    },
    CommandSpec {
        name: "notes",
        aliases: &["n"],
        usage: "notes REF NOTES...",
        summary: "Replace notes",
        handler: cmd_notes,
    },
    CommandSpec {
        name: "delete",
        aliases: &["d", "rm"],
        usage: "delete REF",
        summary: "Forget an environment",
        handler: cmd_delete,
    },
    CommandSpec {
        name: "help",
        aliases: &["h", "?"],
        usage: "help",
        summary: "Show commands",
        handler: cmd_help,
    },
    CommandSpec {
        name: "quit",
        aliases: &["q", "exit"],
        usage: "quit",
        summary: "Leave",
        handler: cmd_quit,
    },
];

/// Look up a command by name or alias
pub fn find(name: &str) -> Option<&'static CommandSpec> {
    COMMANDS
        .iter()
        .find(|c| c.name == name || c.aliases.contains(&name))
}

/// One user's conversation with the store
pub struct Session<'a> {
    store: &'a mut EnvStore,
    out: &'a mut dyn Write,
    /// Present in interactive mode; used for confirmations
    input: Option<&'a mut dyn BufRead>,
    login: LoginRunner<'a>,
    listing: Vec<String>,
    misses: usize,
}

impl<'a> Session<'a> {
    /// Non-interactive session: no confirmations, `oc login` attached
    pub fn new(store: &'a mut EnvStore, out: &'a mut dyn Write) -> Self {
        Self {
            store,
            out,
            input: None,
            login: Box::new(|cmd: &LoginCommand| crate::executor::run_attached(cmd)),
            listing: Vec::new(),
            misses: 0,
        }
    }

    pub fn with_input(mut self, input: &'a mut dyn BufRead) -> Self {
        self.input = Some(input);
        self
    }

    pub fn with_login(mut self, login: LoginRunner<'a>) -> Self {
        self.login = login;
        self
    }

    /// Lookups and updates that found nothing, plus usage errors
    pub fn misses(&self) -> usize {
        self.misses
    }

    /// Run one command line split into words
    pub fn dispatch(&mut self, words: &[String]) -> Result<Flow> {
        let Some((name, args)) = words.split_first() else {
            return Ok(Flow::Continue);
        };
        match find(name) {
            Some(command) => {
                debug!("Dispatching {} {:?}", command.name, args);
                (command.handler)(self, args)
            }
            None => {
                writeln!(self.out, "Unknown command '{name}'. Type 'help' for commands.")?;
                self.misses += 1;
                Ok(Flow::Continue)
            }
        }
    }

    /// Prompt loop until `quit` or end of input
    pub fn run_interactive(&mut self) -> Result<()> {
        writeln!(
            self.out,
            "\n{}\n{}\n{}",
            "=".repeat(80),
            "MCE ENVIRONMENT SELECTOR".bold(),
            "=".repeat(80)
        )?;
        self.dispatch(&["list".to_string()])?;
        writeln!(self.out, "\nType 'help' for commands, 'quit' to leave.")?;

        loop {
            write!(self.out, "\nmce-env> ")?;
            self.out.flush()?;
            let Some(line) = self.read_line()? else {
                writeln!(self.out)?;
                return Ok(());
            };
            let words: Vec<String> = line.split_whitespace().map(str::to_string).collect();
            if self.dispatch(&words)? == Flow::Quit {
                return Ok(());
            }
        }
    }

    fn read_line(&mut self) -> Result<Option<String>> {
        let Some(input) = self.input.as_mut() else {
            return Ok(None);
        };
        let mut line = String::new();
        if input.read_line(&mut line)? == 0 {
            return Ok(None);
        }
        Ok(Some(line.trim().to_string()))
    }

    /// Ask yes/no; non-interactive sessions always proceed
    fn confirm(&mut self, question: &str) -> Result<bool> {
        if self.input.is_none() {
            return Ok(true);
        }
        write!(self.out, "{question} (y/n): ")?;
        self.out.flush()?;
        Ok(self
            .read_line()?
            .is_some_and(|answer| answer.eq_ignore_ascii_case("y")))
    }

    /// Cluster name for `reference`, a name or a listing number
    fn resolve(&self, reference: &str) -> Option<String> {
        let number = reference.strip_prefix('#').unwrap_or(reference);
        if let Ok(n) = number.parse::<usize>() {
            if let Some(name) = n.checked_sub(1).and_then(|i| self.listing.get(i)) {
                return Some(name.clone());
            }
            if reference.starts_with('#') {
                return None;
            }
        }
        Some(reference.to_string())
    }

    fn usage(&mut self, command: &str) -> Result<Flow> {
        if let Some(spec) = find(command) {
            writeln!(self.out, "Usage: {}", spec.usage)?;
        }
        self.misses += 1;
        Ok(Flow::Continue)
    }

    fn not_found(&mut self, reference: &str) -> Result<Flow> {
        writeln!(self.out, "{}", format!("❌ Environment {reference} not found").red())?;
        self.misses += 1;
        Ok(Flow::Continue)
    }

    fn print_listing(&mut self, heading: String, names: Vec<String>, lines: Vec<String>) -> Result<()> {
        if names.is_empty() {
            writeln!(self.out, "\n❌ No environments found matching your criteria.")?;
        } else {
            writeln!(self.out, "\n{heading}")?;
            writeln!(self.out, "{}", list_header())?;
            for line in lines {
                writeln!(self.out, "{line}")?;
            }
            writeln!(self.out, "{}", "-".repeat(80))?;
        }
        self.listing = names;
        Ok(())
    }
}

fn numbered(envs: &[&EnvironmentRecord]) -> (Vec<String>, Vec<String>) {
    envs.iter()
        .enumerate()
        .map(|(i, e)| (e.cluster_name.clone(), format_env_line(e, Some(i + 1))))
        .unzip()
}

fn parse_status(raw: &str) -> Option<EnvStatus> {
    EnvStatus::from_str(&raw.to_lowercase()).ok()
}

fn status_choices() -> String {
    EnvStatus::iter()
        .map(|s| s.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

fn cmd_list(session: &mut Session<'_>, args: &[String]) -> Result<Flow> {
    let mut platform = None;
    let mut status = None;
    for arg in args {
        match arg.strip_prefix("status=") {
            Some(raw) => match parse_status(raw) {
                Some(s) => status = Some(s),
                None => {
                    writeln!(session.out, "Invalid status '{raw}'. Choose from: {}", status_choices())?;
                    return session.usage("list");
                }
            },
            None => platform = Some(arg.trim_start_matches("platform=").to_string()),
        }
    }

    let (names, lines) = numbered(&session.store.list(platform.as_deref(), status));
    let heading = format!("📋 Total: {} environments", names.len());
    session.print_listing(heading, names, lines)?;
    Ok(Flow::Continue)
}

fn cmd_search(session: &mut Session<'_>, args: &[String]) -> Result<Flow> {
    let query = args.join(" ");
    if query.is_empty() {
        return session.usage("search");
    }
    let (names, lines) = numbered(&session.store.search(&query));
    let heading = format!("🔍 Found {} results for '{}':", names.len(), query);
    session.print_listing(heading, names, lines)?;
    Ok(Flow::Continue)
}

fn cmd_stats(session: &mut Session<'_>, _args: &[String]) -> Result<Flow> {
    let text = format_stats(&session.store.stats());
    writeln!(session.out, "{text}")?;
    Ok(Flow::Continue)
}

fn lookup(session: &mut Session<'_>, reference: &str) -> Result<Option<EnvironmentRecord>> {
    match session.resolve(reference) {
        Some(name) => session.store.get(&name),
        None => Ok(None),
    }
}

fn cmd_show(session: &mut Session<'_>, args: &[String]) -> Result<Flow> {
    let [reference] = args else {
        return session.usage("show");
    };
    let Some(env) = lookup(session, reference)? else {
        return session.not_found(reference);
    };
    writeln!(session.out, "{}", format_env_details(&env, None))?;
    writeln!(session.out, "{}", format_connection(&env))?;
    Ok(Flow::Continue)
}

fn cmd_login(session: &mut Session<'_>, args: &[String]) -> Result<Flow> {
    let [reference] = args else {
        return session.usage("login");
    };
    let Some(env) = lookup(session, reference)? else {
        return session.not_found(reference);
    };
    let Some(cluster) = env.data.cluster.as_ref() else {
        writeln!(session.out, "{}", format_connection(&env))?;
        session.misses += 1;
        return Ok(Flow::Continue);
    };
    let command = cluster.login_command();
    writeln!(session.out, "\n🔐 Logging in to {}...", command.api_url)?;
    session.out.flush()?;
    match (session.login)(&command) {
        Ok(status) if status.success() => {}
        Ok(status) => {
            writeln!(session.out, "{}", format!("❌ oc login exited with {status}").red())?;
            session.misses += 1;
        }
        Err(e) => {
            writeln!(session.out, "{}", format!("❌ Could not run oc: {e}").red())?;
            session.misses += 1;
        }
    }
    Ok(Flow::Continue)
}

fn cmd_status(session: &mut Session<'_>, args: &[String]) -> Result<Flow> {
    let [reference, raw_status, notes @ ..] = args else {
        return session.usage("status");
    };
    let Some(status) = parse_status(raw_status) else {
        writeln!(
            session.out,
            "Invalid status '{raw_status}'. Choose from: {}",
            status_choices()
        )?;
        return session.usage("status");
    };
    let Some(name) = session.resolve(reference) else {
        return session.not_found(reference);
    };
    let notes = notes.join(" ");
    if !session.store.update(&name, Some(status), Some(&notes))? {
        return session.not_found(&name);
    }
    writeln!(session.out, "{}", format!("✅ Updated {name} to {status}").green())?;
    Ok(Flow::Continue)
}

fn cmd_notes(session: &mut Session<'_>, args: &[String]) -> Result<Flow> {
    let [reference, notes @ ..] = args else {
        return session.usage("notes");
    };
    let notes = notes.join(" ");
    if notes.is_empty() {
        return session.usage("notes");
    }
    let Some(name) = session.resolve(reference) else {
        return session.not_found(reference);
    };
    if !session.store.update(&name, None, Some(&notes))? {
        return session.not_found(&name);
    }
    writeln!(session.out, "{}", format!("✅ Added notes to {name}").green())?;
    Ok(Flow::Continue)
}

fn cmd_delete(session: &mut Session<'_>, args: &[String]) -> Result<Flow> {
    let [reference] = args else {
        return session.usage("delete");
    };
    let Some(name) = session.resolve(reference) else {
        return session.not_found(reference);
    };
    if !session.confirm(&format!("Delete {name}?"))? {
        writeln!(session.out, "Kept {name}")?;
        return Ok(Flow::Continue);
    }
    if !session.store.delete(&name)? {
        return session.not_found(&name);
    }
    writeln!(session.out, "{}", format!("✅ Deleted {name}").green())?;
    Ok(Flow::Continue)
}

fn cmd_help(session: &mut Session<'_>, _args: &[String]) -> Result<Flow> {
    writeln!(session.out, "\nCommands (REF is a cluster name or a number from the last listing):")?;
    for command in COMMANDS {
        writeln!(session.out, "  {:32} {}", command.usage, command.summary)?;
    }
    Ok(Flow::Continue)
}

fn cmd_quit(_session: &mut Session<'_>, _args: &[String]) -> Result<Flow> {
    Ok(Flow::Quit)
}
