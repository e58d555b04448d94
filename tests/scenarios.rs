//! Lifecycle scenarios for the path and session state machine, driven
//! the way the engine drives it: admission pre-checks, play and record
//! commits, teardowns, and connection closures in arbitrary order.

use std::sync::{Arc, Mutex};

use rtsp_restream_server::app::config::AppConfig;
use rtsp_restream_server::app::App;
use rtsp_restream_server::auth::{RequestContext, Token};
use rtsp_restream_server::engine::EngineEvent;
use rtsp_restream_server::hooks::{AuthCallbacks, Callbacks};
use rtsp_restream_server::session::admission::{AdmissionError, AdmissionPolicy};
use rtsp_restream_server::session::coordinator::SessionCoordinator;
use rtsp_restream_server::session::ClientIdGenerator;

use tokio::sync::oneshot;

#[derive(Debug, Clone, PartialEq, Eq)]
enum Emission {
  FirstPlayer(String, String),
  LastPlayer(String),
  Recorder(String, String),
  RecorderGone(String),
}

type Emissions = Arc<Mutex<Vec<Emission>>>;

fn recording_callbacks() -> (Callbacks, Emissions) {
  let emissions: Emissions = Arc::new(Mutex::new(Vec::new()));

  let callbacks = Callbacks {
    first_player_connected: Some(Box::new({
      let emissions = emissions.clone();
      move |user, path| {
        emissions
          .lock()
          .unwrap()
          .push(Emission::FirstPlayer(user.to_string(), path.to_string()));
      }
    })),
    last_player_disconnected: Some(Box::new({
      let emissions = emissions.clone();
      move |path| {
        emissions
          .lock()
          .unwrap()
          .push(Emission::LastPlayer(path.to_string()));
      }
    })),
    recorder_connected: Some(Box::new({
      let emissions = emissions.clone();
      move |user, path| {
        emissions
          .lock()
          .unwrap()
          .push(Emission::Recorder(user.to_string(), path.to_string()));
      }
    })),
    recorder_disconnected: Some(Box::new({
      let emissions = emissions.clone();
      move |path| {
        emissions
          .lock()
          .unwrap()
          .push(Emission::RecorderGone(path.to_string()));
      }
    })),
  };

  (callbacks, emissions)
}

fn coordinator(
  max_paths_count: u32,
  max_clients_per_path: u32,
) -> (SessionCoordinator, Emissions, ClientIdGenerator) {
  let (callbacks, emissions) = recording_callbacks();
  let coordinator = SessionCoordinator::new(
    AdmissionPolicy::new(max_paths_count, max_clients_per_path),
    callbacks,
  );
  (coordinator, emissions, ClientIdGenerator::new())
}

fn taken(emissions: &Emissions) -> Vec<Emission> {
  std::mem::take(&mut *emissions.lock().unwrap())
}

#[test]
fn single_player_lifecycle() {
  let (coordinator, emissions, ids) = coordinator(0, 0);
  let ctx = RequestContext::anonymous();
  let c1 = ids.generate();

  assert_eq!(coordinator.pre_play(c1, "/a", "s1"), Ok(()));
  coordinator.on_play(c1, "/a", "s1", &ctx);
  assert_eq!(
    taken(&emissions),
    vec![Emission::FirstPlayer("".to_string(), "/a".to_string())],
  );

  coordinator.on_teardown(c1, "/a", "s1");
  assert_eq!(taken(&emissions), vec![Emission::LastPlayer("/a".to_string())]);

  coordinator.on_client_closed(c1);
  assert_eq!(taken(&emissions), vec![]);
}

#[test]
fn second_player_joins_and_leaves_silently() {
  let (coordinator, emissions, ids) = coordinator(0, 0);
  let ctx = RequestContext::anonymous();
  let c1 = ids.generate();
  let c2 = ids.generate();

  coordinator.on_play(c1, "/a", "s1", &ctx);
  coordinator.on_play(c2, "/a", "s2", &ctx);
  assert_eq!(
    taken(&emissions),
    vec![Emission::FirstPlayer("".to_string(), "/a".to_string())],
  );

  coordinator.on_teardown(c1, "/a", "s1");
  assert_eq!(taken(&emissions), vec![]);

  coordinator.on_teardown(c2, "/a", "s2");
  assert_eq!(taken(&emissions), vec![Emission::LastPlayer("/a".to_string())]);
}

#[test]
fn recorder_and_player_on_the_same_path() {
  let (coordinator, emissions, ids) = coordinator(0, 0);
  let ctx = RequestContext::anonymous();
  let recorder = ids.generate();
  let player = ids.generate();

  coordinator.on_record(recorder, "/a", "s1", &ctx);
  coordinator.on_play(player, "/a", "s2", &ctx);
  assert_eq!(
    taken(&emissions),
    vec![
      Emission::Recorder("".to_string(), "/a".to_string()),
      Emission::FirstPlayer("".to_string(), "/a".to_string()),
    ],
  );

  // The recorder's connection drops; the path survives through the
  // player still referencing it.
  coordinator.on_client_closed(recorder);
  assert_eq!(
    taken(&emissions),
    vec![Emission::RecorderGone("/a".to_string())],
  );

  coordinator.on_teardown(player, "/a", "s2");
  assert_eq!(taken(&emissions), vec![Emission::LastPlayer("/a".to_string())]);
}

#[test]
fn player_admission_stops_at_the_cap() {
  // A limit of three keeps one slot for the publisher and admits two
  // players; the third is turned away with 403.
  let (coordinator, _emissions, ids) = coordinator(0, 3);
  let ctx = RequestContext::anonymous();
  let c1 = ids.generate();
  let c2 = ids.generate();
  let c3 = ids.generate();

  assert_eq!(coordinator.pre_play(c1, "/a", "s1"), Ok(()));
  coordinator.on_play(c1, "/a", "s1", &ctx);
  assert_eq!(coordinator.pre_play(c2, "/a", "s2"), Ok(()));
  coordinator.on_play(c2, "/a", "s2", &ctx);

  let refused = coordinator.pre_play(c3, "/a", "s3");
  assert_eq!(refused, Err(AdmissionError::PlayerLimitReached));
  assert_eq!(refused.unwrap_err().status_code(), 403);
}

#[test]
fn second_recorder_is_turned_away() {
  let (coordinator, emissions, ids) = coordinator(0, 0);
  let ctx = RequestContext::anonymous();
  let c1 = ids.generate();
  let c2 = ids.generate();

  assert_eq!(coordinator.pre_record(c1, "/a", "s1"), Ok(()));
  coordinator.on_record(c1, "/a", "s1", &ctx);

  let refused = coordinator.pre_record(c2, "/a", "s2");
  assert_eq!(refused, Err(AdmissionError::RecorderPresent));
  assert_eq!(refused.unwrap_err().status_code(), 503);

  // The refusal left no trace: tearing down the original recorder is
  // the only remaining transition.
  coordinator.on_teardown(c1, "/a", "s1");
  assert_eq!(
    taken(&emissions),
    vec![
      Emission::Recorder("".to_string(), "/a".to_string()),
      Emission::RecorderGone("/a".to_string()),
    ],
  );
}

#[test]
fn abrupt_close_drains_the_play_session() {
  let (coordinator, emissions, ids) = coordinator(0, 0);
  let ctx = RequestContext::anonymous();
  let c1 = ids.generate();

  coordinator.on_play(c1, "/a", "s1", &ctx);
  coordinator.on_client_closed(c1);
  assert_eq!(
    taken(&emissions),
    vec![
      Emission::FirstPlayer("".to_string(), "/a".to_string()),
      Emission::LastPlayer("/a".to_string()),
    ],
  );

  // Both entries are gone: a second close is a no-op and a new play on
  // the same path starts a fresh population.
  coordinator.on_client_closed(c1);
  assert_eq!(taken(&emissions), vec![]);

  let c2 = ids.generate();
  coordinator.on_play(c2, "/a", "s2", &ctx);
  assert_eq!(
    taken(&emissions),
    vec![Emission::FirstPlayer("".to_string(), "/a".to_string())],
  );
}

#[test]
fn closing_player_leaves_recorder_with_residual_self_play() {
  let (coordinator, emissions, ids) = coordinator(0, 0);
  let ctx = RequestContext::anonymous();
  let recorder = ids.generate();
  let player = ids.generate();

  // The recorder also watches its own stream.
  coordinator.on_record(recorder, "/a", "rec", &ctx);
  coordinator.on_play(recorder, "/a", "self", &ctx);
  coordinator.on_play(player, "/a", "s2", &ctx);
  taken(&emissions);

  // The second player tears down its session and drops the
  // connection. The recorder is now the only reference and its own
  // play session is drained with it.
  coordinator.on_teardown(player, "/a", "s2");
  coordinator.on_client_closed(player);
  assert_eq!(taken(&emissions), vec![Emission::LastPlayer("/a".to_string())]);

  coordinator.on_client_closed(recorder);
  assert_eq!(
    taken(&emissions),
    vec![Emission::RecorderGone("/a".to_string())],
  );
}

#[test]
fn emissions_balance_once_the_paths_drain() {
  let (coordinator, emissions, ids) = coordinator(0, 0);
  let operator = RequestContext::new(Token::new("operator"));
  let viewer = RequestContext::anonymous();

  let publisher = ids.generate();
  let viewers: Vec<_> = (0..3).map(|_| ids.generate()).collect();

  coordinator.on_record(publisher, "/a", "rec/a", &operator);
  coordinator.on_record(publisher, "/b", "rec/b", &operator);
  for (n, viewer_id) in viewers.iter().enumerate() {
    coordinator.on_play(*viewer_id, "/a", &format!("s{}", n), &viewer);
  }
  coordinator.on_play(viewers[0], "/b", "s0b", &viewer);

  // Wind everything down: sessions first, connections after, in an
  // order that leaves the publisher last.
  coordinator.on_teardown(viewers[0], "/a", "s0");
  coordinator.on_teardown(viewers[1], "/a", "s1");
  coordinator.on_teardown(viewers[2], "/a", "s2");
  coordinator.on_client_closed(viewers[2]);
  coordinator.on_client_closed(viewers[1]);
  coordinator.on_teardown(viewers[0], "/b", "s0b");
  coordinator.on_client_closed(viewers[0]);
  coordinator.on_teardown(publisher, "/b", "rec/b");
  coordinator.on_client_closed(publisher);

  let emitted = taken(&emissions);
  let count = |f: &dyn Fn(&Emission) -> bool| emitted.iter().filter(|e| f(*e)).count();

  let first = count(&|e| matches!(e, Emission::FirstPlayer(..)));
  let last = count(&|e| matches!(e, Emission::LastPlayer(..)));
  let recorder = count(&|e| matches!(e, Emission::Recorder(..)));
  let recorder_gone = count(&|e| matches!(e, Emission::RecorderGone(..)));

  assert_eq!(first, last);
  assert_eq!(recorder, recorder_gone);
  assert_eq!(first, 2);
  assert_eq!(recorder, 2);

  // Connect notifications carry the user; disconnects only the path.
  assert!(emitted
    .iter()
    .all(|e| match e {
      Emission::Recorder(user, _) => user == "operator",
      Emission::FirstPlayer(user, _) => user.is_empty(),
      _ => true,
    }));
}

#[tokio::test]
async fn engine_events_flow_through_the_dispatcher() {
  let (callbacks, emissions) = recording_callbacks();
  let app = App::start(
    AppConfig::default(),
    callbacks,
    AuthCallbacks::default(),
  );

  let event_tx = app.event_tx();
  let ids = app.client_ids();
  let publisher = ids.generate();
  let viewer = ids.generate();

  let (reply_tx, reply_rx) = oneshot::channel();
  event_tx
    .send(EngineEvent::ClientConnected { client: publisher })
    .unwrap();
  event_tx
    .send(EngineEvent::PreRecord {
      client: publisher,
      path: "/cam".to_string(),
      session_id: "rec1".to_string(),
      reply_tx,
    })
    .unwrap();
  assert_eq!(reply_rx.await.unwrap(), Ok(()));

  event_tx
    .send(EngineEvent::Record {
      client: publisher,
      path: "/cam".to_string(),
      session_id: "rec1".to_string(),
      ctx: RequestContext::new(Token::new("operator")),
    })
    .unwrap();

  let (reply_tx, reply_rx) = oneshot::channel();
  event_tx
    .send(EngineEvent::PrePlay {
      client: viewer,
      path: "/cam".to_string(),
      session_id: "s1".to_string(),
      reply_tx,
    })
    .unwrap();
  assert_eq!(reply_rx.await.unwrap(), Ok(()));

  event_tx
    .send(EngineEvent::Play {
      client: viewer,
      path: "/cam".to_string(),
      session_id: "s1".to_string(),
      ctx: RequestContext::anonymous(),
    })
    .unwrap();
  event_tx
    .send(EngineEvent::Teardown {
      client: viewer,
      path: "/cam".to_string(),
      session_id: "s1".to_string(),
    })
    .unwrap();
  event_tx
    .send(EngineEvent::ClientClosed { client: viewer })
    .unwrap();
  event_tx
    .send(EngineEvent::ClientClosed { client: publisher })
    .unwrap();

  // Hanging up ends the dispatch loop once the queue is drained.
  drop(event_tx);
  app.serve().await;

  assert_eq!(
    taken(&emissions),
    vec![
      Emission::Recorder("operator".to_string(), "/cam".to_string()),
      Emission::FirstPlayer("".to_string(), "/cam".to_string()),
      Emission::LastPlayer("/cam".to_string()),
      Emission::RecorderGone("/cam".to_string()),
    ],
  );
}
