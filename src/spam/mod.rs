// Spam detection: the only check that can reject a submission outright.
//
// SpamChecker mirrors the ToxicityScorer seam: Akismet is the production
// implementation, tests plug in fakes.

pub mod akismet;
pub mod traits;
