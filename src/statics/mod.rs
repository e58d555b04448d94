//! Fixed test patterns served by the static helper server.
//!
//! Paths without a live publisher are pointed at one of these synthetic
//! streams instead of going dark. The patterns are mounted play-only
//! and shared between all of their viewers.

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StaticPattern {
  Bars,
  White,
  Black,
  Red,
  Green,
  Blue,
}

impl StaticPattern {

  pub const ALL: [StaticPattern; 6] = [
    StaticPattern::Bars,
    StaticPattern::White,
    StaticPattern::Black,
    StaticPattern::Red,
    StaticPattern::Green,
    StaticPattern::Blue,
  ];

  /// Mount path on the static server.
  pub fn path(&self) -> &'static str {
    match self {
      StaticPattern::Bars => "/bars",
      StaticPattern::White => "/white",
      StaticPattern::Black => "/black",
      StaticPattern::Red => "/red",
      StaticPattern::Green => "/green",
      StaticPattern::Blue => "/blue",
    }
  }

  fn test_source_pattern(&self) -> &'static str {
    match self {
      StaticPattern::Bars => "smpte100",
      StaticPattern::White => "white",
      StaticPattern::Black => "black",
      StaticPattern::Red => "red",
      StaticPattern::Green => "green",
      StaticPattern::Blue => "blue",
    }
  }

  /// Launch description the engine mounts for this pattern: an H.264
  /// baseline stream generated from a test source.
  pub fn launch(&self) -> String {
    format!(
      "( videotestsrc pattern={} ! \
       x264enc ! video/x-h264, profile=baseline ! \
       rtph264pay name=pay0 pt=96 config-interval=-1 )",
      self.test_source_pattern(),
    )
  }

}

impl fmt::Display for StaticPattern {

  fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
    write!(f, "{}", &self.path()[1..])
  }

}
