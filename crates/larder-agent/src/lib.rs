//! The language-model-backed parts of Larder.
//!
//! - [`carbon`]: per-unit carbon estimates for a product name.
//! - [`expiry`]: groups soon-to-expire stock and prices its carbon impact.
//! - [`alert`]: the daily expiry email.
//! - [`responder`]: the inventory assistant behind the chatbot.
//! - [`clients`]: HTTP implementations of the `larder-core` service traits.
//!
//! Everything here is generic over the traits in [`larder_core`], so tests
//! run against fakes and the server wires in the real clients.

pub mod alert;
pub mod carbon;
pub mod clients;
pub mod expiry;
pub mod responder;

#[cfg(test)]
mod fakes;

pub use alert::{AlertConfig, AlertOutcome, DailyAlert};
pub use carbon::CarbonEstimator;
pub use expiry::{ExpiryAggregator, ExpiryGroup, ExpirySummary};
pub use responder::{ModelReply, QueryResponder};
