//! Best-effort carbon-footprint estimates.

use std::sync::{Arc, LazyLock};

use larder_core::service::TextGenerator;
use regex::Regex;

static NUMBER: LazyLock<Regex> =
  LazyLock::new(|| Regex::new(r"\d+\.?\d*").expect("valid number pattern"));

/// The prompt sent for `product_name`.
pub fn carbon_prompt(product_name: &str) -> String {
  format!(
    "What is the estimated average carbon footprint (in kg of CO2 equivalent) \
     for one unit of '{product_name}'? Provide only the number."
  )
}

/// The first unsigned decimal number in `text`, if any. A match too large
/// for `f64` yields `None`.
pub fn first_number(text: &str) -> Option<f64> {
  NUMBER
    .find(text)
    .and_then(|m| m.as_str().parse::<f64>().ok())
    .filter(|v| v.is_finite())
}

/// Asks a [`TextGenerator`] how much CO2e one unit of a product costs.
pub struct CarbonEstimator<G> {
  generator: Arc<G>,
}

impl<G> Clone for CarbonEstimator<G> {
  fn clone(&self) -> Self { Self { generator: Arc::clone(&self.generator) } }
}

impl<G: TextGenerator> CarbonEstimator<G> {
  pub fn new(generator: Arc<G>) -> Self { Self { generator } }

  /// kg CO2e per unit of `product_name`, or `None` when the generator is
  /// unconfigured, the call fails, or the reply holds no number. Never
  /// retried.
  pub async fn estimate(&self, product_name: &str) -> Option<f64> {
    let prompt = carbon_prompt(product_name);
    match self.generator.generate(&prompt).await {
      Ok(reply) => {
        let value = first_number(&reply);
        if value.is_none() {
          tracing::debug!(product = product_name, %reply, "no number in carbon estimate");
        }
        value
      }
      Err(e) => {
        tracing::warn!(product = product_name, "carbon estimate unavailable: {e}");
        None
      }
    }
  }
}
