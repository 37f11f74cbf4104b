//! nrnotify - Entry Point
//!
//! Records a deployment with New Relic from a CI build.
//!
//! ```text
//! nrnotify --build-result=SUCCESS --notifications=notifications.json
//! nrnotify --api-key=<credential id> --application-id=<id> [--revision=${GIT_COMMIT}]
//! nrnotify --list-applications --api-key=<credential id>
//! nrnotify --list-credentials
//! ```

use std::collections::HashMap;
use std::env;
use std::sync::Arc;

use anyhow::Context;
use colored::Colorize;
use tracing::error;

use nrnotify::credentials::{CredentialStore, OwnerScope};
use nrnotify::dispatch::DeploymentDispatcher;
use nrnotify::filesys::file::File;
use nrnotify::http::newrelic::NewRelicClient;
use nrnotify::logs::init_logging;
use nrnotify::models::{BuildResult, DispatchOutcome};
use nrnotify::settings::Settings;
use nrnotify::steps::{
    application_choices, credential_choices, BuildContext, DeploymentNotifier, NotifyStep,
};
use nrnotify::template::Environment;
use nrnotify::utils::version_info;

#[tokio::main]
async fn main() {
    // Parse command line arguments
    let mut cli_args: HashMap<String, String> = HashMap::new();

    for arg in env::args().skip(1) {
        if let Some((key, value)) = arg.split_once('=') {
            // Handle --key=value format
            let clean_key = key.trim_start_matches('-');
            cli_args.insert(clean_key.to_string(), value.to_string());
        } else if arg.starts_with("--") {
            // Handle standalone flags like --version
            let clean_key = arg.trim_start_matches('-');
            cli_args.insert(clean_key.to_string(), "true".to_string());
        }
    }

    // Print version and exit
    if cli_args.contains_key("version") {
        match serde_json::to_string_pretty(&version_info()) {
            Ok(json) => println!("{}", json),
            Err(e) => eprintln!("Unable to print version: {}", e),
        }
        return;
    }

    let settings_path = arg_or_env(&cli_args, "settings", "NRNOTIFY_SETTINGS")
        .unwrap_or_else(|| "settings.json".to_string());
    let settings = match Settings::load(&File::new(settings_path)).await {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("{} {}", "[ERROR]".red(), e);
            std::process::exit(1);
        }
    };

    // Initialize logging
    let guard = match init_logging(settings.log_options()) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("Failed to initialize logging: {e}");
            None
        }
    };

    let code = match run(&cli_args, &settings).await {
        Ok(()) => 0,
        Err(e) => {
            error!("{:#}", e);
            eprintln!("{} {:#}", "FATAL:".red().bold(), e);
            1
        }
    };

    // flush the file sink before exiting
    drop(guard);
    std::process::exit(code);
}

async fn run(cli_args: &HashMap<String, String>, settings: &Settings) -> anyhow::Result<()> {
    let client = Arc::new(
        NewRelicClient::new(&settings.client_options())
            .context("Unable to create the New Relic client")?,
    );

    let credentials_path = cli_args
        .get("credentials")
        .map(Into::into)
        .unwrap_or_else(|| settings.credentials_file.clone());
    let store = Arc::new(CredentialStore::load(&File::new(credentials_path)).await?);

    let owner = match arg_or_env(cli_args, "owner", "JOB_NAME") {
        Some(job) => OwnerScope::job(job),
        None => OwnerScope::global(),
    };

    if cli_args.contains_key("list-credentials") {
        for id in credential_choices(&store, &owner, &*client) {
            println!("{}", id);
        }
        return Ok(());
    }

    if cli_args.contains_key("list-applications") {
        let credential_id = cli_args
            .get("api-key")
            .context("--list-applications requires --api-key=<credential id>")?;
        let applications =
            application_choices(&*client, &*store, &owner, credential_id).await?;
        for application in applications {
            println!("{}\t{}", application.id, application.name);
        }
        return Ok(());
    }

    let build_result: BuildResult = arg_or_env(cli_args, "build-result", "BUILD_RESULT")
        .map(|s| s.parse::<BuildResult>())
        .transpose()
        .map_err(anyhow::Error::msg)?
        .unwrap_or_default();

    let ctx = BuildContext::new(build_result, owner, Environment::from_process());
    let dispatcher = DeploymentDispatcher::new(client, store);

    let outcome = match (cli_args.get("api-key"), cli_args.get("application-id")) {
        (Some(api_key), Some(application_id)) => {
            let mut step = NotifyStep::new(api_key, application_id);
            step.set_description(cli_args.get("description").cloned());
            step.set_revision(cli_args.get("revision").cloned());
            step.set_changelog(cli_args.get("changelog").cloned());
            step.set_user(cli_args.get("user").cloned());
            step.run(&dispatcher, &ctx).await?
        }
        (None, None) => {
            let path = cli_args
                .get("notifications")
                .map(Into::into)
                .unwrap_or_else(|| settings.notifications_file.clone());
            let notifier = DeploymentNotifier::from_file(&File::new(path)).await?;
            notifier.perform(&dispatcher, &ctx).await?
        }
        _ => anyhow::bail!("--api-key and --application-id must be given together"),
    };

    print_summary(&outcome);
    Ok(())
}

fn arg_or_env(cli_args: &HashMap<String, String>, key: &str, var: &str) -> Option<String> {
    cli_args
        .get(key)
        .cloned()
        .or_else(|| env::var(var).ok())
        .filter(|value| !value.trim().is_empty())
}

fn print_summary(outcome: &DispatchOutcome) {
    if outcome.is_skipped() {
        println!("{} no deployment recorded for an unsuccessful build", "[SKIPPED]".yellow());
        return;
    }
    for result in outcome.succeeded() {
        println!("{} {}", "[NOTIFIED]".green(), result.application_id);
    }
}
