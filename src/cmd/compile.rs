//! Compile command: `orgcompile` or `orgcompile compile`.

use anyhow::{Context, Result};
use console::style;
use orgcompile::compile::{CompileOutcome, ContainerLifecycle, Inventory, Namespace};
use orgcompile::config::Config;
use orgcompile::remote::ToolingApi;
use orgcompile::ui::CompileUI;
use orgcompile::ui::icons::{CHECK, CROSS};
use std::path::PathBuf;
use std::sync::Arc;

use super::super::Cli;

pub async fn cmd_compile(cli: &Cli, project_dir: PathBuf) -> Result<CompileOutcome> {
    let config = Config::new(project_dir, super::cli_overrides(cli))?;
    let client = config.tooling_client();

    println!("{}", style("Compile All Apex Classes & Triggers").bold());
    println!();
    if let Some(org) = client.target_org() {
        println!("Target org: {}", style(org).cyan());
    }

    let namespace = Namespace::resolve(&config.project_dir);
    if let Some(prefix) = namespace.prefix() {
        println!("Using namespace: {}", style(prefix).cyan());
    }
    println!();

    let api: Arc<dyn ToolingApi> = Arc::new(client);
    let inventory = Inventory::fetch(api.as_ref(), &namespace)
        .await
        .context("Failed to query classes and triggers")?;
    println!(
        "Found {} classes and {} triggers",
        inventory.classes.len(),
        inventory.triggers.len()
    );
    println!();

    let ui = (!inventory.is_empty())
        .then(|| Arc::new(CompileUI::new(inventory.len() as u64, config.verbose())));
    let lifecycle = ContainerLifecycle::new(api, config.compile_settings()).with_ui(ui);

    let outcome = lifecycle.run(&inventory).await?;
    report_outcome(&outcome);
    Ok(outcome)
}

fn report_outcome(outcome: &CompileOutcome) {
    match outcome {
        CompileOutcome::NothingToCompile => {
            println!("Nothing to compile.");
        }
        CompileOutcome::Completed {
            classes, triggers, ..
        } => {
            println!();
            println!(
                "{}Compiled {} classes and {} triggers.",
                CHECK,
                style(classes).green().bold(),
                style(triggers).green().bold()
            );
        }
        CompileOutcome::Unsuccessful { state, report, .. } => {
            eprintln!();
            eprintln!("{}Compilation {}", CROSS, style(state).red().bold());
            for section in report.sections() {
                eprintln!();
                eprintln!("{}", section);
            }
        }
    }
}
