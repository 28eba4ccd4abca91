mod cli;

use anyhow::{Context, Result};
use clap::Parser;
use cli::{Cli, Commands, StateFormat};
use install_release::config::{state_file_path, ConfigStore};
use install_release::install::{self, GetOptions};
use install_release::ui::{self, Theme};
use install_release::{
    ArchiveInstaller, ForgeClients, PlatformProfile, StateStore, UpgradeOrchestrator,
};
use std::sync::Arc;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    setup_logging(&cli)?;

    let theme = Theme::default();
    let config = ConfigStore::load_default().context("Failed to load configuration")?;

    match cli.command {
        Commands::Get {
            url,
            tag,
            name,
            keywords,
            approve,
        } => {
            let clients = ForgeClients::from_config(&config)?;
            let options = GetOptions {
                tag,
                name,
                keywords,
                include_prerelease: config.pre_release(),
            };

            let resolved = install::resolve(&clients, PlatformProfile::current(), &url, &options)
                .await
                .with_context(|| format!("Could not resolve a release for {}", url))?;
            ui::print_resolved(&theme, &resolved);

            if !approve && !ui::confirm(&theme, "Install this tool")? {
                println!("Installation cancelled");
                return Ok(());
            }

            let installer = installer(cli.quiet)?;
            let mut state = StateStore::open(state_file_path());
            let path = install::install_resolved(
                &resolved,
                &installer,
                &config.install_path(),
                &mut state,
            )
            .await
            .with_context(|| format!("Failed to install {}", resolved.name()))?;

            println!(
                "{}",
                theme
                    .success
                    .apply_to(format!("Installed: {} ({})", resolved.name(), path.display()))
            );
        }

        Commands::Upgrade { force, skip_prompt } => {
            let mut state = StateStore::open(state_file_path());
            if state.is_empty() {
                println!("No installed tools found");
                return Ok(());
            }

            let clients = Arc::new(ForgeClients::from_config(&config)?);
            let orchestrator = UpgradeOrchestrator::new(clients, PlatformProfile::current().clone())
                .include_prerelease(config.pre_release())
                .force(force);

            let candidates = orchestrator.check_all(&state).await;
            if candidates.is_empty() {
                println!("All tools are onto latest version");
                return Ok(());
            }

            ui::print_candidates(&theme, &candidates);
            if !skip_prompt && !ui::confirm(&theme, "\nUpgrade these tools,")? {
                println!("Upgrade cancelled");
                return Ok(());
            }

            let installer = installer(cli.quiet)?;
            let report = orchestrator
                .apply_all(candidates, &mut state, &installer, &config.install_path())
                .await;
            ui::print_report(&theme, &report);
            if !report.is_clean() {
                tracing::warn!("{} tool(s) failed to upgrade", report.failures.len());
            }
        }

        Commands::Ls { hold } => {
            let state = StateStore::open(state_file_path());
            ui::print_installed(&theme, &install::list(&state, hold));
        }

        Commands::Rm { name } => {
            let mut state = StateStore::open(state_file_path());
            let removed = install::remove(&mut state, &name, &config.install_path())?;
            tracing::info!("Removed state entry {}", removed.key);
            println!("{}", theme.success.apply_to(format!("Removed: {}", name)));
        }

        Commands::Hold { name, unset } => {
            let mut state = StateStore::open(state_file_path());
            install::hold(&mut state, &name, !unset)?;
            if unset {
                println!("Unheld updates for {}", name);
            } else {
                println!("Held updates for {}", name);
            }
        }

        Commands::Config {
            token,
            gitlab_token,
            path,
            pre_release,
        } => {
            let mut config = config;
            let mut changed = false;

            if let Some(token) = token {
                config.set_token(&token)?;
                println!("Updated GitHub token");
                changed = true;
            }
            if let Some(token) = gitlab_token {
                config.set_gitlab_token(&token)?;
                println!("Updated GitLab token");
                changed = true;
            }
            if let Some(path) = path {
                config.set_path(&path)?;
                println!("Updated path to {}", path);
                changed = true;
            }
            if let Some(pre_release) = pre_release {
                config.set_pre_release(pre_release)?;
                if pre_release {
                    println!("Enabled pre-release updates");
                } else {
                    println!("Disabled pre-release updates");
                }
                changed = true;
            }

            if !changed {
                show_config(&config);
            }
        }

        Commands::State { format } => {
            let state = StateStore::open(state_file_path());
            let snapshot = state.snapshot();
            if snapshot.is_empty() {
                println!("No state found");
                return Ok(());
            }
            let rendered = match format {
                StateFormat::Json => serde_json::to_string_pretty(&snapshot)?,
                StateFormat::Yaml => serde_yaml::to_string(&snapshot)?,
            };
            println!("{}", rendered.trim_end());
        }
    }

    Ok(())
}

fn setup_logging(cli: &Cli) -> Result<()> {
    use tracing_subscriber::{fmt, EnvFilter};

    let level = if cli.quiet {
        "error"
    } else if cli.verbose == 0 {
        "warn"
    } else if cli.verbose == 1 {
        "info"
    } else {
        "debug"
    };

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .with_thread_names(false)
        .init();

    Ok(())
}

fn installer(quiet: bool) -> Result<ArchiveInstaller> {
    let installer = ArchiveInstaller::new()?;
    Ok(if quiet { installer.quiet() } else { installer })
}

fn show_config(config: &ConfigStore) {
    let mask = |token: Option<String>| match token {
        Some(t) if t.chars().count() > 4 => format!("{}****", t.chars().take(4).collect::<String>()),
        Some(_) => "****".to_string(),
        None => "(not set)".to_string(),
    };

    println!("--- install-release configuration ---");
    println!("  config file : {}", config.path().display());
    println!("  state file  : {}", state_file_path().display());
    println!("  path        : {}", config.install_path().display());
    println!("  pre_release : {}", config.pre_release());
    println!("  token       : {}", mask(config.token()));
    println!("  gitlab_token: {}", mask(config.gitlab_token()));
}
