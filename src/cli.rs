// src/cli.rs
use anyhow::Result;
use clap::{Arg, ArgAction, Command};
use std::{env, path::PathBuf};

use crate::infra::t;

pub mod commands;

/// Pre-parses the command line arguments to find the language setting.
/// This allows i18n to be initialized before the full CLI is built.
/// It looks for a `--lang <VALUE>` argument.
fn pre_parse_language() -> String {
    let args: Vec<String> = env::args().collect();
    if let Some(pos) = args.iter().position(|arg| arg == "--lang") {
        if let Some(lang) = args.get(pos + 1) {
            return lang.clone();
        }
    }
    // Fallback to system language detection
    sys_locale::get_locale().unwrap_or_else(|| "en".to_string())
}

fn build_cli(locale: &str) -> Command {
    Command::new("cascade-runner")
        .author(env!("CARGO_PKG_AUTHORS"))
        .version(env!("CARGO_PKG_VERSION"))
        .about(t!("cli.about", locale = locale).to_string())
        .arg(
            Arg::new("lang")
                .long("lang")
                .help(t!("cli.lang", locale = locale).to_string())
                .value_name("LANGUAGE")
                .global(true)
                .action(ArgAction::Set),
        )
        .subcommand(
            Command::new("run")
                .about(t!("cli.run_about", locale = locale).to_string())
                .arg(
                    Arg::new("project-dir")
                        .long("project-dir")
                        .help(t!("cli.arg_project_dir", locale = locale).to_string())
                        .value_name("PROJECT_DIR")
                        .default_value(".")
                        .value_parser(clap::value_parser!(PathBuf))
                        .action(ArgAction::Set),
                )
                .arg(
                    Arg::new("config")
                        .short('c')
                        .long("config")
                        .help(t!("cli.arg_config", locale = locale).to_string())
                        .value_name("CONFIG")
                        .default_value("Cascade.toml")
                        .value_parser(clap::value_parser!(PathBuf))
                        .action(ArgAction::Set),
                )
                .arg(
                    Arg::new("suite")
                        .short('s')
                        .long("suite")
                        .help(t!("cli.arg_suite", locale = locale).to_string())
                        .value_name("SUITE")
                        .action(ArgAction::Set),
                )
                .arg(
                    Arg::new("module")
                        .short('m')
                        .long("module")
                        .help(t!("cli.arg_module", locale = locale).to_string())
                        .value_name("MODULE")
                        .action(ArgAction::Set),
                )
                .arg(
                    Arg::new("test")
                        .short('t')
                        .long("test")
                        .help(t!("cli.arg_test", locale = locale).to_string())
                        .value_name("TEST")
                        .action(ArgAction::Set),
                )
                .arg(
                    Arg::new("action")
                        .short('a')
                        .long("action")
                        .help(t!("cli.arg_action", locale = locale).to_string())
                        .value_name("ACTION")
                        .action(ArgAction::Set)
                        .conflicts_with("test"),
                )
                .arg(
                    Arg::new("modules")
                        .long("modules")
                        .help(t!("cli.arg_modules", locale = locale).to_string())
                        .value_name("MODULES")
                        .value_delimiter(',')
                        .action(ArgAction::Append),
                )
                .arg(
                    Arg::new("range")
                        .long("range")
                        .help(t!("cli.arg_range", locale = locale).to_string())
                        .value_name("START..END")
                        .action(ArgAction::Set)
                        .requires("module"),
                )
                .arg(
                    Arg::new("platform")
                        .short('p')
                        .long("platform")
                        .help(t!("cli.arg_platform", locale = locale).to_string())
                        .value_name("PLATFORM")
                        .action(ArgAction::Set),
                )
                .arg(
                    Arg::new("stop-on-failure")
                        .long("stop-on-failure")
                        .help(t!("cli.arg_stop_on_failure", locale = locale).to_string())
                        .action(ArgAction::SetTrue),
                )
                .arg(
                    Arg::new("no-watch")
                        .long("no-watch")
                        .help(t!("cli.arg_no_watch", locale = locale).to_string())
                        .action(ArgAction::SetTrue),
                ),
        )
        .subcommand(
            Command::new("init")
                .about(t!("cli.init_about", locale = locale).to_string())
                .arg(
                    Arg::new("project-dir")
                        .long("project-dir")
                        .help(t!("cli.arg_project_dir", locale = locale).to_string())
                        .value_name("PROJECT_DIR")
                        .default_value(".")
                        .value_parser(clap::value_parser!(PathBuf))
                        .action(ArgAction::Set),
                )
                .arg(
                    Arg::new("non-interactive")
                        .long("non-interactive")
                        .help("Create a default project skeleton without launching the interactive wizard.")
                        .action(ArgAction::SetTrue),
                ),
        )
}

pub async fn run() -> Result<()> {
    // Pre-parse language and initialize i18n first.
    let language = pre_parse_language();
    rust_i18n::set_locale(&language);

    let matches = build_cli(&language).get_matches();

    match matches.subcommand() {
        Some(("run", run_matches)) => {
            let project_dir = run_matches
                .get_one::<PathBuf>("project-dir")
                .unwrap() // Has default
                .clone();
            let config = run_matches
                .get_one::<PathBuf>("config")
                .unwrap() // Has default
                .clone();
            let request = commands::run::RunRequest {
                suite: run_matches.get_one::<String>("suite").cloned(),
                module: run_matches.get_one::<String>("module").cloned(),
                test: run_matches.get_one::<String>("test").cloned(),
                action: run_matches.get_one::<String>("action").cloned(),
                modules: run_matches
                    .get_many::<String>("modules")
                    .map(|values| values.cloned().collect()),
                range: run_matches.get_one::<String>("range").cloned(),
                platform: run_matches.get_one::<String>("platform").cloned(),
                stop_on_failure: run_matches.get_flag("stop-on-failure"),
                no_watch: run_matches.get_flag("no-watch"),
            };
            commands::run::execute(project_dir, config, request).await?;
        }
        Some(("init", init_matches)) => {
            let project_dir = init_matches
                .get_one::<PathBuf>("project-dir")
                .unwrap() // Has default
                .clone();
            let non_interactive = init_matches.get_flag("non-interactive");

            // Show language detection message if it was auto-detected
            if env::args().all(|arg| arg != "--lang") {
                println!(
                    "{}",
                    t!("cli.system_language_detected", locale = &language, lang = &language)
                );
            }
            commands::init::run_init_wizard(&project_dir, &language, non_interactive)?;
        }
        _ => {
            // This case handles when no subcommand is given.
            // Clap will have already printed help info.
        }
    }
    Ok(())
}
