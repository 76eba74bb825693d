pub mod activity;
pub mod analytics;
pub mod cli;
pub mod commands;
pub mod config;
pub mod datetime;
pub mod render;
pub mod snapshot;
pub mod task;
pub mod view;

use std::ffi::OsString;

use anyhow::Context;
use chrono::Utc;
use clap::Parser;
use tracing::info;

#[tracing::instrument(skip_all)]
pub fn run(
  raw_args: Vec<OsString>
) -> anyhow::Result<()> {
  let cli = cli::GlobalCli::parse_from(
    raw_args
  );

  cli::init_tracing(
    cli.verbose,
    cli.quiet
  )?;

  info!(
    verbose = cli.verbose,
    quiet = cli.quiet,
    "starting cherry CLI"
  );

  let cfg = config::Config::load(
    cli.config.as_deref()
  )?;

  // Every derivation downstream takes
  // this instant explicitly; nothing
  // below reads the clock again.
  let wall = Utc::now();
  let now = match cli.now.as_deref() {
    | Some(expr) => {
      datetime::parse_date_expr(
        expr, wall
      )
      .context(
        "failed to parse --now"
      )?
    }
    | None => wall
  };

  let data_dir =
    config::resolve_data_dir(
      &cfg,
      cli.data.as_deref()
    )
    .context(
      "failed to resolve data \
       directory"
    )?;

  let store =
    snapshot::SnapshotStore::open(
      &data_dir
    )
    .with_context(|| {
      format!(
        "failed to open snapshot \
         store at {}",
        data_dir.display()
      )
    })?;

  let mut renderer =
    render::Renderer::new(&cfg)?;

  let command = cli
    .command
    .unwrap_or(cli::Command::List {
      view:     None,
      status:   None,
      priority: None,
      sort:     view::SortKey::CreatedAt,
      order:    view::SortOrder::Desc,
      json:     false
    });

  commands::dispatch(
    &store,
    &cfg,
    &mut renderer,
    command,
    now
  )?;

  info!("done");
  Ok(())
}
