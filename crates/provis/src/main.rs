mod cli;
mod config;
mod dirs;
mod progress;

use anyhow::{Context, Result, bail};
use clap::Parser;
use provis_fetch::{CancellationToken, ReqwestClient};
use provis_install::{InstallReport, Pipeline, StageOutcome};
use tracing_subscriber::EnvFilter;

use crate::cli::{App, ClasspathArg, Commands, InstallArg, VersionsArg};
use crate::config::Settings;
use crate::progress::BarSink;

#[tokio::main]
async fn main() -> Result<()> {
    let app = App::parse();
    init_logging(app.verbose);

    let mut settings = config::load(app.config.as_deref()).context("failed to load configuration")?;
    if app.root.is_some() {
        settings.root = app.root.clone();
    }

    match app.cmd {
        Commands::Install(arg) => install(settings, arg).await,
        Commands::Versions(arg) => versions(settings, arg).await,
        Commands::Classpath(arg) => classpath(settings, arg),
    }
}

fn init_logging(verbose: u8) {
    let default = match verbose {
        0 => "provis=info",
        1 => "provis=debug",
        _ => "provis=trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn pipeline(settings: Settings) -> Result<Pipeline<ReqwestClient>> {
    let Some(root) = settings.root() else {
        bail!("no data directory found; pass --root");
    };
    let client = ReqwestClient::new(&settings.installer.user_agent).context("failed to build HTTP client")?;
    tracing::debug!(root = %root.display(), "installation root");
    Ok(Pipeline::new(client, settings.installer, root))
}

async fn install(mut settings: Settings, arg: InstallArg) -> Result<()> {
    if let Some(loader_version) = arg.loader_version {
        settings.installer.loader_version = loader_version;
    }
    settings.installer.addon_slugs.extend(arg.addons);
    settings.installer.verify_hashes |= arg.verify;
    let pipeline = pipeline(settings)?;

    let cancel = CancellationToken::new();
    let on_interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("interrupted, stopping after the current file");
            on_interrupt.cancel();
        }
    });

    let sink = BarSink::new();
    match pipeline.install_with(&arg.version_id, &sink, &cancel).await {
        Ok(report) => {
            sink.finish("done");
            print_report(&report);
            Ok(())
        }
        Err(e) => {
            sink.abandon("failed");
            Err(e).with_context(|| format!("failed to install {}", arg.version_id))
        }
    }
}

fn print_report(report: &InstallReport) {
    println!("Installed {}", report.loader.as_deref().unwrap_or(&report.version));
    println!(
        "  libraries: {} downloaded, {} failed",
        report.libraries.downloaded, report.libraries.failed
    );
    match &report.natives {
        StageOutcome::AlreadySatisfied => println!("  natives:   already extracted"),
        StageOutcome::Done(natives) => println!(
            "  natives:   {} files from {} archives, {} failed",
            natives.extracted, natives.archives, natives.failed
        ),
    }
    println!(
        "  assets:    {} objects, {} downloaded, {} failed",
        report.assets.objects, report.assets.downloaded, report.assets.failed
    );
    let addons = &report.addons;
    if !addons.installed.is_empty() {
        println!("  add-ons:   installed {}", addons.installed.join(", "));
    }
    if !addons.already_present.is_empty() {
        println!("  add-ons:   already present {}", addons.already_present.join(", "));
    }
    if !addons.failed.is_empty() {
        println!("  add-ons:   FAILED {}", addons.failed.join(", "));
    }
}

async fn versions(settings: Settings, arg: VersionsArg) -> Result<()> {
    let pipeline = pipeline(settings)?;
    let index = pipeline.versions().await.context("failed to fetch the version index")?;

    if let Some(latest) = &index.latest {
        if let Some(release) = &latest.release {
            println!("latest release: {release}");
        }
    }
    for version in &index.versions {
        let kind = version.kind.as_deref().unwrap_or("unknown");
        if arg.all || kind == "release" {
            println!("{:<24} {kind}", version.id);
        }
    }
    Ok(())
}

fn classpath(settings: Settings, arg: ClasspathArg) -> Result<()> {
    let pipeline = pipeline(settings)?;
    let classpath = pipeline.classpath(&arg.version_id)?;
    let joined = std::env::join_paths(&classpath).context("classpath entry contains a separator")?;
    println!("{}", joined.to_string_lossy());
    Ok(())
}
