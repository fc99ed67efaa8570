pub mod cli;
pub mod commands;
pub mod config;
pub mod datastore;
pub mod dialog;
pub mod list;
pub mod persistence;
pub mod render;
pub mod sidebar;
pub mod stack;

use std::ffi::OsString;

use anyhow::Context;
use clap::Parser;
use tracing::{debug, info};

#[tracing::instrument(skip_all)]
pub fn run(raw_args: Vec<OsString>) -> anyhow::Result<()> {
    let cli = cli::GlobalCli::parse_from(raw_args);

    cli::init_tracing(cli.verbose, cli.quiet)?;

    info!(
        verbose = cli.verbose,
        quiet = cli.quiet,
        "starting errands CLI"
    );

    let mut cfg = config::Config::load(cli.errandsrc.as_deref())?;
    cfg.apply_overrides(
        cli.rc_overrides
            .into_iter()
            .map(|kv| (kv.key, kv.value)),
    );

    let data_dir = config::resolve_data_dir(&cfg, cli.data.as_deref())
        .context("failed to resolve data directory")?;

    let store = datastore::DataStore::open(&data_dir)
        .with_context(|| format!("failed to open datastore at {}", data_dir.display()))?;

    let mut sidebar =
        sidebar::ListSidebar::load_with_tasks(store).context("failed to load lists")?;
    let renderer = render::Renderer::new(&cfg)?;

    let command = match cli.command {
        Some(command) => command,
        None => {
            let name = cfg
                .get("default.command")
                .unwrap_or_else(|| "lists".to_string());
            debug!(command = %name, "no explicit command, using default");
            cli::Command::from_default(&name)?
        }
    };

    commands::dispatch(&mut sidebar, &renderer, command)?;

    info!("done");
    Ok(())
}
