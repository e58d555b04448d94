pub mod admission;
pub mod coordinator;
pub mod state;

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Handle to one live transport connection.
///
/// Issued through [`ClientIdGenerator`] when the engine accepts a
/// connection. Stable and unique for the connection lifetime; may be
/// recycled after the connection closes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ClientId(u64);

impl fmt::Display for ClientId {

  fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
    write!(f, "#{}", self.0)
  }

}

#[derive(Clone, Default)]
pub struct ClientIdGenerator {
  next: Arc<AtomicU64>,
}

impl ClientIdGenerator {

  pub fn new() -> Self {
    Self::default()
  }

  pub fn generate(&self) -> ClientId {
    ClientId(self.next.fetch_add(1, Ordering::Relaxed))
  }

}

/// RTSP session identifier as issued by the engine. The core never
/// generates one; it only compares them.
pub type SessionId = String;
pub type SessionIdRef = str;

/// Absolute path component of the RTSP URL, naming one stream.
pub type StreamPath = String;
pub type StreamPathRef = str;
