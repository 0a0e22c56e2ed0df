pub mod api;
pub mod cli;
pub mod commands;
pub mod config;
pub mod error;
pub mod features;
pub mod http;
pub mod notifier;
pub mod optimistic;
pub mod render;
pub mod sequence;
pub mod session;
pub mod store;
pub mod token;
pub mod watchdog;

use std::ffi::OsString;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tracing::{
  debug,
  info
};

#[tracing::instrument(skip_all)]
pub fn run(
  raw_args: Vec<OsString>
) -> anyhow::Result<()> {
  let pre =
    cli::preprocess_args(&raw_args);
  let cli = cli::GlobalCli::parse_from(
    pre.cleaned_args
  );

  cli::init_tracing(
    cli.verbose,
    cli.quiet
  )?;

  info!(
    verbose = cli.verbose,
    quiet = cli.quiet,
    "starting tideline"
  );
  debug!(?pre.rc_overrides, "preprocessed rc overrides");

  let mut cfg = config::Config::load(
    cli.config.as_deref()
  )?;
  cfg.apply_overrides(
    pre.rc_overrides.into_iter().chain(
      cli
        .rc_overrides
        .into_iter()
        .map(|kv| (kv.key, kv.value))
    )
  );
  let settings =
    config::ClientSettings::from_config(
      &cfg
    )
    .context("invalid configuration")?;

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
    store::FileTokenStore::open(
      &data_dir
    )
    .with_context(|| {
      format!(
        "failed to open token store at \
         {}",
        data_dir.display()
      )
    })?;
  let session =
    session::SessionContext::new(
      store,
      settings.countdown_secs
    );
  let transport =
    http::ReqwestTransport::new(
      settings.timeout
    )?;

  let app = commands::App {
    client:    http::ApiClient::new(
      settings.base_url.as_str(),
      session,
      transport
    ),
    renderer:  render::Renderer::new(
      settings.color
    ),
    watchdog:  watchdog::WatchdogSettings {
      poll_interval: settings
        .poll_interval,
      login_path:    settings
        .login_path
        .clone()
    },
    navigator: Arc::new(
      commands::TerminalNavigator
    )
  };
  debug!(base_url = %app.client.base_url(), "api client ready");

  let runtime =
    tokio::runtime::Builder::new_current_thread()
      .enable_all()
      .build()
      .context(
        "failed to build async runtime"
      )?;
  runtime.block_on(commands::dispatch(
    &app,
    cli.command
  ))?;

  info!("done");
  Ok(())
}
