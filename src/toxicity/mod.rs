// Toxicity scoring: trait-based abstraction for swappable providers.
//
// The ToxicityScorer trait defines the interface. PerspectiveScorer implements
// it using Google's Perspective API. The moderation pipeline only sees the
// trait, so tests substitute in-process scorers and a future provider can
// replace Perspective without touching the rest of the request flow.

pub mod perspective;
pub mod traits;
