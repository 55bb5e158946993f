// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

mod config;
mod logging;
mod runtime;

use anyhow::{Context, Result};
use config::Config;
use reports_app::{AppState, Conversation};
use reports_client::Client;
use reports_tui::UiOptions;
use runtime::HttpRuntime;
use std::env;
use std::path::PathBuf;
use time::{OffsetDateTime, UtcOffset};

fn main() {
    // Must run before any thread is spawned; later lookups fail on Unix.
    let clock_offset = UtcOffset::current_local_offset().unwrap_or(UtcOffset::UTC);
    if let Err(error) = run(clock_offset) {
        eprintln!("{error:#}");
        std::process::exit(1);
    }
}

fn run(clock_offset: UtcOffset) -> Result<()> {
    let options = parse_cli_args(env::args().skip(1), Config::default_path()?)?;
    if options.show_help {
        print_help();
        return Ok(());
    }

    if options.print_config_path {
        println!("{}", options.config_path.display());
        return Ok(());
    }

    if options.print_example {
        print!("{}", Config::example_config(&options.config_path));
        return Ok(());
    }

    let config = Config::load(&options.config_path).with_context(|| {
        format!(
            "load config {}; run `reports-assistant --print-example-config` to generate a template",
            options.config_path.display()
        )
    })?;

    let log_file = config.log_file()?;
    logging::init(config.log_level(), &log_file).with_context(|| {
        format!(
            "set up logging to {}; set [log] file to a writable path",
            log_file.display()
        )
    })?;

    let base_url = config.backend_base_url();
    let client = Client::new(&base_url, config.backend_timeout()?).with_context(|| {
        format!(
            "invalid [backend] config in {}; fix base_url or set {}",
            options.config_path.display(),
            config::BACKEND_URL_ENV
        )
    })?;
    tracing::info!(
        base_url = client.base_url(),
        timeout_ms = u64::try_from(client.timeout().as_millis()).unwrap_or(u64::MAX),
        "backend configured"
    );

    if options.check_only {
        client.health().with_context(|| {
            format!(
                "backend check failed for {}; start the API server or point [backend] base_url at it",
                client.base_url()
            )
        })?;
        println!("ok: backend at {} is reachable", client.base_url());
        return Ok(());
    }

    let now = OffsetDateTime::now_utc().to_offset(clock_offset);
    let conversation = if config.show_welcome() {
        Conversation::with_welcome(now)
    } else {
        Conversation::new()
    };
    let mut state = AppState::new(conversation);
    let mut runtime = HttpRuntime::new(client);
    reports_tui::run_app(
        &mut state,
        &mut runtime,
        UiOptions {
            history_limit: config.history_limit(),
            clock_offset,
        },
    )
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct CliOptions {
    config_path: PathBuf,
    print_config_path: bool,
    print_example: bool,
    check_only: bool,
    show_help: bool,
}

fn parse_cli_args<I, S>(args: I, default_config_path: PathBuf) -> Result<CliOptions>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut options = CliOptions {
        config_path: default_config_path,
        print_config_path: false,
        print_example: false,
        check_only: false,
        show_help: false,
    };

    let mut iter = args.into_iter();
    while let Some(arg) = iter.next() {
        match arg.as_ref() {
            "--config" => {
                let value = iter
                    .next()
                    .ok_or_else(|| anyhow::anyhow!("--config requires a file path"))?;
                options.config_path = PathBuf::from(value.as_ref());
            }
            "--print-config-path" => {
                options.print_config_path = true;
            }
            "--print-example-config" => {
                options.print_example = true;
            }
            "--check" => {
                options.check_only = true;
            }
            "--help" | "-h" => {
                options.show_help = true;
            }
            unknown => {
                return Err(anyhow::anyhow!(
                    "unknown argument {unknown:?}; run with --help to see supported options"
                ));
            }
        }
    }

    Ok(options)
}

fn print_help() {
    println!("reports-assistant");
    println!("  --config <path>          Use a specific config path");
    println!("  --print-config-path      Print resolved config path");
    println!("  --print-example-config   Print a v1 config template");
    println!("  --check                  Validate config + logging + backend reachability");
    println!("  --help                   Show this help");
}
