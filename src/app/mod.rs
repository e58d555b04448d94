pub mod config;

use std::sync::Arc;

use crate::app::config::AppConfig;
use crate::engine::{EngineEventTx, EventDispatcher};
use crate::hooks::{AuthCallbacks, Callbacks};
use crate::session::admission::AdmissionPolicy;
use crate::session::coordinator::SessionCoordinator;
use crate::session::ClientIdGenerator;
use crate::statics::StaticPattern;

/// Wires the restream core together: the limits from the
/// configuration, the coordinator, and the dispatcher the host engine
/// feeds its connection events into.
pub struct App {
  config: AppConfig,
  auth: Arc<AuthCallbacks>,
  client_id_generator: ClientIdGenerator,
  coordinator: Arc<SessionCoordinator>,
  dispatcher: EventDispatcher,
  event_tx: EngineEventTx,
}

impl App {

  pub fn start(config: AppConfig, callbacks: Callbacks, auth: AuthCallbacks) -> App {
    let admission = AdmissionPolicy::new(config.max_paths_count, config.max_clients_per_path);
    let coordinator = Arc::new(SessionCoordinator::new(admission, callbacks));
    let (dispatcher, event_tx) = EventDispatcher::start(coordinator.clone());

    for pattern in StaticPattern::ALL {
      tracing::debug!(path = pattern.path(), "mounting static pattern");
    }
    tracing::info!(
      port = config.static_port,
      "RTSP static server running",
    );
    tracing::info!(
      port = config.restream_port,
      use_tls = config.use_tls,
      fallback = %config.fallback_url(),
      "RTSP restream server running",
    );

    Self {
      config,
      auth: Arc::new(auth),
      client_id_generator: ClientIdGenerator::new(),
      coordinator,
      dispatcher,
      event_tx,
    }
  }

  /// Direct handle on the coordinator, for synchronous queries such as
  /// the mount table's new-path check.
  pub fn coordinator(&self) -> Arc<SessionCoordinator> {
    self.coordinator.clone()
  }

  /// Cloneable event handle for the host engine.
  pub fn event_tx(&self) -> EngineEventTx {
    self.event_tx.clone()
  }

  /// Handle the engine mints connection ids from.
  pub fn client_ids(&self) -> ClientIdGenerator {
    self.client_id_generator.clone()
  }

  /// The injected auth policy, for the engine's auth layer.
  pub fn auth(&self) -> Arc<AuthCallbacks> {
    self.auth.clone()
  }

  pub fn config(&self) -> &AppConfig {
    &self.config
  }

  /// Block until the engine hangs up all of its event senders.
  pub async fn serve(self) {
    let Self {
      dispatcher,
      event_tx,
      ..
    } = self;
    drop(event_tx);
    dispatcher.join().await;
  }

  /// Stop dispatching without waiting for the engine.
  pub async fn stop(self) {
    let Self { dispatcher, .. } = self;
    dispatcher.stop().await;
  }

}
