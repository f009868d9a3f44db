//! Reaction Tracker - CLI entry point.

use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use tracing_subscriber::{fmt, EnvFilter};

use reaction_tracker::{
    cli::Args,
    config::{validate_config, Config},
    error::{exit_codes, Error, Result},
    output::{print_banner, print_error, print_info, print_run_summary, render_events},
    progress,
    run::{execute_run, RunContext},
    session::ExportSession,
};

#[tokio::main]
async fn main() -> ExitCode {
    match run().await {
        Ok(()) => ExitCode::from(exit_codes::SUCCESS as u8),
        Err(e) => {
            print_error(&format!("{}", e));
            match e {
                Error::Config(_) | Error::ConfigValidation { .. } | Error::MissingConfig(_) => {
                    ExitCode::from(exit_codes::CONFIG_ERROR as u8)
                }
                Error::Session(_)
                | Error::Unauthorized(_)
                | Error::ChatNotFound(_)
                | Error::Export(_) => ExitCode::from(exit_codes::SESSION_ERROR as u8),
                Error::Download(_) => ExitCode::from(exit_codes::DOWNLOAD_ERROR as u8),
                Error::RunActive => ExitCode::from(exit_codes::ABORT as u8),
                _ => ExitCode::from(exit_codes::UNEXPECTED_ERROR as u8),
            }
        }
    }
}

async fn run() -> Result<()> {
    // Parse CLI arguments
    let args = Args::parse();

    // Set up logging
    let log_level = if args.debug { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));

    fmt().with_env_filter(filter).with_target(false).init();

    if !args.json {
        print_banner();
    }

    // Load configuration, tolerating an absent default file
    let mut config = if args.config.exists() {
        Config::load(&args.config)?
    } else {
        Config::default()
    };

    // Merge CLI arguments and validate
    args.merge_into_config(&mut config);
    validate_config(&config)?;
    let request = args.to_request()?;

    // Open the chat export backing this run
    let session = Arc::new(ExportSession::open(&args.export)?);
    if !args.json {
        print_info(&format!(
            "Loaded export: {}",
            session.chat().display_name()
        ));
    }

    let context = Arc::new(RunContext::new());
    let options = config.run_options();
    let (publisher, mut events) = progress::channel();

    // Run the pipeline as its own task while this one renders progress.
    let run_task = tokio::spawn({
        let context = Arc::clone(&context);
        let session = Arc::clone(&session);
        let request = request.clone();
        let options = options.clone();
        let publisher = publisher.clone();
        async move { execute_run(&context, session.as_ref(), &request, &options, &publisher).await }
    });
    drop(publisher);

    let _terminal = render_events(&mut events, args.json).await;

    let result = run_task
        .await
        .map_err(|e| Error::Session(format!("run task failed: {}", e)))??;

    if args.json {
        println!("{}", serde_json::to_string(&result)?);
    } else {
        print_run_summary(&result);
    }

    Ok(())
}
