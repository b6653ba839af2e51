// Copyright 2025-present Harīṣh Tummalachērla
// SPDX-License-Identifier: Apache-2.0

use clap::Parser;
use polyrank::config::EngineConfig;
use polyrank::logging::{init_logging, parse_level};

mod cli;
use cli::commands::{self, CliError, EvaluateArgs, RankArgs};
use cli::{Cli, Commands};

fn load_config(cli: &Cli) -> Result<EngineConfig, CliError> {
    Ok(match &cli.config {
        Some(path) => EngineConfig::load(path)?,
        None => EngineConfig::default(),
    })
}

fn run(cli: Cli) -> Result<(), CliError> {
    let config = load_config(&cli)?;
    // the subscriber has to exist before the remaining overrides can warn
    let logging = config
        .clone()
        .with_overrides_from(|name| match name {
            "POLYRANK_LOG_JSON" => std::env::var(name).ok(),
            _ => None,
        })
        .logging;
    let level = cli.log_level.as_deref().unwrap_or(&logging.level);
    init_logging(parse_level(level), cli.log_json || logging.json);
    let config = config.with_env_overrides();

    match cli.command {
        Commands::Build {
            input,
            output,
            damping,
        } => commands::run_build(&input, &output, damping),
        Commands::Inspect { snapshot, term } => commands::run_inspect(&snapshot, &term),
        Commands::Rank {
            snapshot,
            query,
            request,
            model,
            params,
            ensemble,
            combination,
            top_k,
            explain,
            format,
        } => commands::run_rank(
            RankArgs {
                snapshot,
                query,
                request,
                model,
                params,
                ensemble,
                combination,
                top_k,
                explain,
                format,
            },
            config,
        ),
        Commands::Evaluate {
            snapshot,
            topics,
            qrels,
            model,
            params,
            metrics,
            depth,
            output,
            format,
        } => commands::run_evaluate(
            EvaluateArgs {
                snapshot,
                topics,
                qrels,
                model,
                params,
                metrics,
                depth,
                output,
                format,
            },
            config,
        ),
    }
}

fn main() {
    if let Err(err) = run(Cli::parse()) {
        eprintln!("❌ {}", err);
        std::process::exit(err.exit_code());
    }
}
