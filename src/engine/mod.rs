//! Boundary to the external RTSP engine.
//!
//! The engine owns the wire protocol, transport negotiation and media
//! forwarding. It reports connection lifecycle events through this
//! channel and consults the coordinator before committing stateful
//! requests: the two pre-check events carry a reply channel the
//! dispatcher answers with the admission decision. Events for a single
//! connection must be sent in program order (play before teardown
//! before closed for a session); the dispatcher is a single consumer,
//! so the order it receives is the order the coordinator sees.

use std::sync::Arc;

use tokio::select;
use tokio::sync::mpsc;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;

use crate::auth::RequestContext;
use crate::session::admission::AdmissionError;
use crate::session::coordinator::SessionCoordinator;
use crate::session::{ClientId, SessionId, StreamPath};

pub type AdmissionReplyTx = oneshot::Sender<Result<(), AdmissionError>>;
pub type AdmissionReplyRx = oneshot::Receiver<Result<(), AdmissionError>>;

pub enum EngineEvent {
  ClientConnected {
    client: ClientId,
  },
  PrePlay {
    client: ClientId,
    path: StreamPath,
    session_id: SessionId,
    reply_tx: AdmissionReplyTx,
  },
  Play {
    client: ClientId,
    path: StreamPath,
    session_id: SessionId,
    ctx: RequestContext,
  },
  PreRecord {
    client: ClientId,
    path: StreamPath,
    session_id: SessionId,
    reply_tx: AdmissionReplyTx,
  },
  Record {
    client: ClientId,
    path: StreamPath,
    session_id: SessionId,
    ctx: RequestContext,
  },
  Teardown {
    client: ClientId,
    path: StreamPath,
    session_id: SessionId,
  },
  ClientClosed {
    client: ClientId,
  },
}

pub type EngineEventTx = mpsc::UnboundedSender<EngineEvent>;
pub type EngineEventRx = mpsc::UnboundedReceiver<EngineEvent>;

/// Drains engine events into the coordinator, one at a time.
pub struct EventDispatcher {
  stop_tx: oneshot::Sender<()>,
  worker: JoinHandle<()>,
}

impl EventDispatcher {

  /// Spawn the dispatcher task. The returned sender may be cloned
  /// freely across the engine's connection handlers; the task runs
  /// until every sender is dropped or `stop` is called.
  pub fn start(coordinator: Arc<SessionCoordinator>) -> (Self, EngineEventTx) {
    let (event_tx, event_rx) = mpsc::unbounded_channel();
    let (stop_tx, stop_rx) = oneshot::channel();
    let worker = tokio::spawn(Self::run(coordinator, event_rx, stop_rx));

    (
      Self {
        stop_tx,
        worker,
      },
      event_tx,
    )
  }

  /// Wait until the engine hangs up all of its event senders.
  pub async fn join(self) {
    let Self { stop_tx, worker } = self;
    let _ = worker.await;
    drop(stop_tx);
  }

  /// Stop dispatching without waiting for the engine.
  pub async fn stop(self) {
    let Self { stop_tx, worker } = self;
    let _ = stop_tx.send(());
    let _ = worker.await;
  }

  async fn run(
    coordinator: Arc<SessionCoordinator>,
    mut event_rx: EngineEventRx,
    mut stop_rx: oneshot::Receiver<()>,
  ) {
    loop {
      select! {
        event = event_rx.recv() => {
          match event {
            Some(event) => Self::dispatch(&coordinator, event),
            None => break,
          }
        },
        _ = &mut stop_rx => {
          break;
        },
      }
    }
  }

  fn dispatch(coordinator: &SessionCoordinator, event: EngineEvent) {
    match event {
      EngineEvent::ClientConnected { client } => {
        coordinator.on_client_connected(client);
      },
      EngineEvent::PrePlay { client, path, session_id, reply_tx } => {
        let decision = coordinator.pre_play(client, &path, &session_id);
        let _ = reply_tx.send(decision);
      },
      EngineEvent::Play { client, path, session_id, ctx } => {
        coordinator.on_play(client, &path, &session_id, &ctx);
      },
      EngineEvent::PreRecord { client, path, session_id, reply_tx } => {
        let decision = coordinator.pre_record(client, &path, &session_id);
        let _ = reply_tx.send(decision);
      },
      EngineEvent::Record { client, path, session_id, ctx } => {
        coordinator.on_record(client, &path, &session_id, &ctx);
      },
      EngineEvent::Teardown { client, path, session_id } => {
        coordinator.on_teardown(client, &path, &session_id);
      },
      EngineEvent::ClientClosed { client } => {
        coordinator.on_client_closed(client);
      },
    }
  }

}
