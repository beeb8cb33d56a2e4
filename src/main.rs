//! mediasrv - serve a web asset tree and backend commands on loopback.

mod cli;

use anyhow::{Context, Result};
use clap::{ColorChoice, Parser};
use cli::Cli;
use crossbeam::channel;
use mediasrv::config::Config;
use mediasrv::host::{BundleBackend, HostContext, SharedAddons};
use mediasrv::{MediaServer, debug, log, logger};
use std::path::{Path, PathBuf};
use std::sync::Arc;

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Set global color override based on CLI option
    match cli.color {
        ColorChoice::Always => owo_colors::set_override(true),
        ColorChoice::Never => owo_colors::set_override(false),
        ColorChoice::Auto => {} // owo-colors auto-detects TTY
    }

    let mut config = Config::load(&cli.config)
        .with_context(|| format!("failed to load config `{}`", cli.config.display()))?;
    apply_cli(&mut config, &cli)?;
    logger::set_verbose(config.serve.dev_mode);

    let server = MediaServer::from_config(&config.serve, host_context(&config)?)?;

    let (shutdown_tx, shutdown_rx) = channel::bounded::<()>(1);
    ctrlc::set_handler(move || {
        let _ = shutdown_tx.try_send(());
    })
    .context("failed to set Ctrl+C handler")?;

    server.start()?;
    let port = server.get_port()?;
    log!("serve"; "http://127.0.0.1:{}", port);
    debug!("serve"; "web root: {}", config.serve.web_root.display());
    debug!("serve"; "addons: {}", config.addons.folder.display());

    // Blocks until Ctrl+C; a closed channel means the handler is gone too
    let _ = shutdown_rx.recv();
    log!("serve"; "shutting down...");
    server.shutdown();
    Ok(())
}

/// Apply CLI flags on top of the loaded config.
fn apply_cli(config: &mut Config, cli: &Cli) -> Result<()> {
    if let Some(port) = cli.port {
        config.serve.port = port;
    }
    if let Some(dir) = &cli.web_root {
        config.serve.web_root = absolute(dir)?;
    }
    if let Some(dir) = &cli.export_dir {
        config.serve.export_dir = Some(absolute(dir)?);
    }
    if cli.verbose {
        config.serve.dev_mode = true;
    }
    Ok(())
}

/// Build the standalone host: addons from config, bundle-only backend.
fn host_context(config: &Config) -> Result<HostContext> {
    let addons = SharedAddons::new(config.addons.folder.clone())
        .with_exports(config.addons.web_exports.clone());
    let backend = BundleBackend::load(config.backend.i18n.as_deref()).with_context(|| {
        let path = config.backend.i18n.as_deref().unwrap_or(Path::new(""));
        format!("failed to read i18n bundle `{}`", path.display())
    })?;

    Ok(HostContext::new(Arc::new(backend)).with_addons(Arc::new(addons)))
}

fn absolute(path: &Path) -> Result<PathBuf> {
    std::path::absolute(path).with_context(|| format!("invalid path `{}`", path.display()))
}
