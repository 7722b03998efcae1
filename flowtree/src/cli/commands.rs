//! Command dispatch

use std::io::{self, Read};
use std::path::Path;

use clap::CommandFactory;
use clap_complete::generate;
use tracing::{debug, instrument};

use crate::application::{
    parse_script, replay, replay_strict, IoResultExt, Outcome, ReplayStep, Session,
};
use crate::cli::args::{Cli, Commands, ConfigCommands};
use crate::cli::error::{CliError, CliResult};
use crate::cli::output;
use crate::config::{global_config_path, Settings};
use crate::domain::Event;
use crate::render::{render_layout, render_tree};

pub fn execute_command(cli: &Cli) -> CliResult<()> {
    match &cli.command {
        Some(Commands::Replay {
            file,
            layout,
            truncate,
            verbose,
            strict,
        }) => {
            let settings = Settings::load(cli.config.as_deref())?;
            let script = read_script(file.as_deref())?;
            let options = ReplayOptions {
                truncate: *truncate,
                strict: *strict,
            };
            let (session, steps) = run_replay(&script, &settings, options)?;
            if *verbose {
                print_steps(&steps);
            }
            print_session(&session, *layout);
            Ok(())
        }
        Some(Commands::Config { command }) => _config(command, cli.config.as_deref()),
        Some(Commands::Completion { shell }) => {
            let mut cmd = Cli::command();
            let name = cmd.get_name().to_string();
            generate(*shell, &mut cmd, name, &mut io::stdout());
            Ok(())
        }
        None => Err(CliError::InvalidArgs(
            "no command given, see `flowtree --help`".to_string(),
        )),
    }
}

/// Flags of the replay command that shape the session.
#[derive(Debug, Clone, Copy, Default)]
pub struct ReplayOptions {
    /// Force truncate mode on at start, whatever the settings say
    pub truncate: bool,
    /// Abort on events targeting unknown nodes
    pub strict: bool,
}

/// Builds a session from settings and replays `script` into it.
#[instrument(level = "debug", skip(script, settings))]
pub fn run_replay(
    script: &str,
    settings: &Settings,
    options: ReplayOptions,
) -> CliResult<(Session, Vec<ReplayStep>)> {
    let mut session = Session::from_settings(settings);
    let events = parse_script(script)?;
    debug!(events = events.len(), "script parsed");

    if options.truncate {
        session.apply(Event::SetTruncateMode(true));
    }
    let steps = if options.strict {
        replay_strict(&mut session, events)?
    } else {
        replay(&mut session, events)
    };
    Ok((session, steps))
}

fn read_script(file: Option<&Path>) -> CliResult<String> {
    let script = match file {
        Some(path) => std::fs::read_to_string(path).with_path_context("read script", path)?,
        None => {
            let mut buf = String::new();
            io::stdin()
                .read_to_string(&mut buf)
                .with_context("read script from stdin")?;
            buf
        }
    };
    Ok(script)
}

fn print_steps(steps: &[ReplayStep]) {
    for step in steps {
        match step.outcome {
            Outcome::Applied => output::success(&format!("{:>4}: {}", step.line, step.event)),
            Outcome::Ignored(reason) => {
                output::failure(&format!("{:>4}: {} ({:?})", step.line, step.event, reason))
            }
        }
    }
}

fn print_session(session: &Session, with_layout: bool) {
    output::header("tree");
    output::info(&render_tree(session.tree().root()));
    if with_layout {
        output::header("layout");
        output::info(&render_layout(&session.layout()));
    }
    if let Some(edit) = session.edit() {
        output::warning(&format!("edit of {} still open: {:?}", edit.node, edit.buffer));
    }
}

#[instrument]
fn _config(command: &ConfigCommands, local: Option<&Path>) -> CliResult<()> {
    match command {
        ConfigCommands::Show => {
            let settings = Settings::load(local)?;
            output::info(&settings.to_toml()?);
        }
        ConfigCommands::Template => output::info(&Settings::template()),
        ConfigCommands::Path => match global_config_path() {
            Some(path) => output::info(&path.display()),
            None => output::warning("no home directory, global config disabled"),
        },
    }
    Ok(())
}
