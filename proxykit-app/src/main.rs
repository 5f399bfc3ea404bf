use anyhow::{Context as _, Result};
use clap::Parser;
use cli::{Cli, Commands, ContainersCmd, CredentialsCmd, GenerateArgs, IpsArgs};
use controller::GenerateOverrides;
use proxykit_common::ProxyKitError;
use proxykit_common::observability::{LogConfig, LogFormat, init_logging};
use proxykit_config::ProxyKitConfigLoader;
use std::process::ExitCode;
use std::time::Duration;
use wiring::App;

mod banner;
mod cli;
mod controller;
mod refresh;
mod refresher;
mod render;
#[cfg(test)]
mod testing;
mod wiring;

const DEFAULT_CONFIG_FILE: &str = "proxykit.yaml";

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli).await {
        Ok(code) => code,
        Err(e) => {
            tracing::error!(error = %format!("{e:#}"), "app.failed");
            eprintln!("proxykit: {e:#}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<ExitCode> {
    // 1) Load config (env wins)
    let loader = match &cli.config {
        Some(path) => ProxyKitConfigLoader::new().with_file(path),
        None => ProxyKitConfigLoader::new().with_optional_file(DEFAULT_CONFIG_FILE),
    };
    let cfg = loader.load().context("loading configuration")?;

    let log_path = init_logging(LogConfig {
        emit_stderr: cli.verbose,
        format: if cli.log_json {
            LogFormat::Json
        } else {
            LogFormat::Text
        },
        default_filter: if cli.verbose { "debug" } else { "info" },
        ..LogConfig::default()
    })?;
    tracing::debug!(path = %log_path.display(), "app.logging.ready");

    let mut app = wiring::build_from_config(cfg, !cli.no_containers).await?;
    let outcome = execute(&mut app, cli.command).await;
    app.shutdown().await?;
    outcome
}

/// Run one command. Failures end up on the banner; the exit code follows it.
async fn execute(app: &mut App, command: Commands) -> Result<ExitCode> {
    let ctl = &mut app.controller;
    match command {
        Commands::Credentials(CredentialsCmd::Set { username, password }) => {
            let _ = ctl.save_credentials(&username, &password).await;
        }
        Commands::Credentials(CredentialsCmd::Show) => {
            println!("{}", render::credential_status(&ctl.credential_status().await));
        }
        Commands::Credentials(CredentialsCmd::Clear) => {
            let _ = ctl.clear_credentials().await;
        }
        Commands::Generate(GenerateArgs {
            count,
            region,
            print,
        }) => {
            let overrides = GenerateOverrides {
                count,
                region: region.as_deref(),
            };
            if let Ok(doc) = ctl.generate(overrides).await {
                if print {
                    println!("{}", doc.to_json()?);
                }
            }
        }
        Commands::Export(args) => {
            if let Ok(path) = ctl.export(&args.dir).await {
                println!("{}", path.display());
            }
        }
        Commands::Containers(cmd) => containers(app, cmd).await,
        Commands::Ips(args) => ips(app, args).await?,
        Commands::Message { json } => {
            let message: serde_json::Value =
                serde_json::from_str(&json).context("message is not valid JSON")?;
            let reply = app.background.dispatch_json(message).await;
            println!("{}", serde_json::to_string_pretty(&reply)?);
        }
    }

    let failed = match app.controller.banner().current() {
        Some(b) => {
            eprintln!("{}", render::banner(&b));
            b.kind == banner::BannerKind::Error
        }
        None => false,
    };
    Ok(if failed {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    })
}

async fn containers(app: &mut App, cmd: ContainersCmd) {
    let ctl = &app.controller;
    match cmd {
        ContainersCmd::List => match ctl.list_containers().await {
            Ok(list) => print!("{}", render::containers(&list)),
            Err(ProxyKitError::HostCapabilityUnavailable(_)) => {
                println!("{}", render::CONTAINERS_UNAVAILABLE)
            }
            Err(e) => ctl.banner().error(format!("Error: {e}")),
        },
        ContainersCmd::Create { name, color } => {
            if let Ok(c) = ctl.create_container(name, color).await {
                println!("{}", c.cookie_store_id);
            }
        }
        ContainersCmd::Remove { id } => {
            let _ = ctl.remove_container(&id).await;
        }
        ContainersCmd::RemoveAll { yes } => {
            if !yes {
                ctl.banner()
                    .info("Refusing to delete all containers without --yes");
                return;
            }
            let _ = ctl.remove_all_containers().await;
        }
        ContainersCmd::Open { id, url } => {
            let _ = ctl.open_in_container(&id, url.as_deref()).await;
        }
        ContainersCmd::Switch { id, url } => {
            let _ = ctl.switch_to_container(&id, url.as_deref()).await;
        }
    }
}

async fn ips(app: &mut App, args: IpsArgs) -> Result<()> {
    let refresh = app.controller.refresh().clone();
    let cancel = app.cancel_token().child_token();

    if let Some(id) = &args.id {
        let report = refresh.refresh_one(id, &cancel).await;
        print!("{}", render::report(id, &report));
        return Ok(());
    }

    if !args.watch {
        match refresh.containers().await {
            Ok(list) => {
                let rows = refresh.refresh_batch(list, &cancel).await;
                print!("{}", render::container_rows(None, &rows));
            }
            Err(ProxyKitError::HostCapabilityUnavailable(_)) => {
                println!("{}", render::CONTAINERS_UNAVAILABLE)
            }
            Err(e) => app.controller.banner().error(format!("Error: {e}")),
        }
        return Ok(());
    }

    let every = Duration::from_secs(app.config.ui.refresh_interval_secs);
    let refresher = refresher::spawn_refresher(refresh, every, cancel.clone());
    let mut snapshots = refresher.snapshots.clone();
    let mut completed = 0u32;
    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            changed = snapshots.changed() => {
                if changed.is_err() {
                    break;
                }
                let snap = snapshots.borrow_and_update().clone();
                if snap.unavailable {
                    println!("{}", render::CONTAINERS_UNAVAILABLE);
                    break;
                }
                print!("{}", render::container_rows(Some(snap.tick), &snap.rows));
                if snap.complete {
                    completed += 1;
                    if args.ticks.is_some_and(|n| completed >= n) {
                        break;
                    }
                }
            }
        }
    }
    cancel.cancel();
    refresher.join().await;
    Ok(())
}
