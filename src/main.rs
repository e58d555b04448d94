use std::env::args;
use std::error::Error;
use std::path::Path;

use rtsp_restream_server::app::config::AppConfig;
use rtsp_restream_server::app::App;
use rtsp_restream_server::hooks::{AuthCallbacks, Callbacks};

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
  tracing_subscriber::fmt()
    .with_env_filter(tracing_subscriber::EnvFilter::from_env("LOG"))
    .pretty()
    .init();

  let config_file = args()
    .nth(1)
    .unwrap_or("restream.yaml".to_string());
  let config_file = Path::new(&config_file);

  let config = if config_file.exists() {
    AppConfig::from_file(config_file)?
  } else {
    AppConfig::default()
  };
  tracing::debug!(?config, "read configuration");

  let callbacks = Callbacks {
    first_player_connected: Some(Box::new(|user, path| {
      tracing::info!(user, path, "first player connected");
    })),
    last_player_disconnected: Some(Box::new(|path| {
      tracing::info!(path, "last player disconnected");
    })),
    recorder_connected: Some(Box::new(|user, path| {
      tracing::info!(user, path, "recorder connected");
    })),
    recorder_disconnected: Some(Box::new(|path| {
      tracing::info!(path, "recorder disconnected");
    })),
  };

  let app = App::start(config, callbacks, AuthCallbacks::default());

  tokio::signal::ctrl_c().await?;
  tracing::info!("interrupted, shutting down");
  app.stop().await;

  Ok(())
}
