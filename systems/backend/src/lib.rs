#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! In-process simulated backend answering panel-configured probes.
//!
//! The backend owns one assigned category and replies to each dispatched
//! probe with that category's wire name and a status rolled from the panel
//! entry matching it. Latency requested by the panel (or falling back to the
//! environment default) is reported as the reply's service time rather than
//! blocking the caller.

use std::time::Duration;

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rollout_reef_core::{Category, PanelValues, ProbeError, ProbeReply, ProbeTransport, StatusCode};
use thiserror::Error;

/// Quoted empty-array literal an unconfigured panel sends instead of `[]`.
const EMPTY_PANEL_LITERAL: &str = "\"[]\"";

/// Errors raised while decoding a probe payload.
#[derive(Debug, Error)]
pub enum PayloadError {
    /// The payload was not a JSON array of panel entries.
    #[error("payload is not a panel entry array: {0}")]
    Json(#[from] serde_json::Error),
}

/// Decodes the serialized panel payload, tolerating the empty-panel literal.
pub fn decode_panel_payload(payload: &str) -> Result<Vec<PanelValues>, PayloadError> {
    let trimmed = payload.trim();
    if trimmed.is_empty() || trimmed == EMPTY_PANEL_LITERAL {
        return Ok(Vec::new());
    }
    Ok(serde_json::from_str(trimmed)?)
}

/// Configuration parameters required to construct the simulated backend.
#[derive(Clone, Copy, Debug)]
pub struct Config {
    category: Category,
    env_error_rate: u32,
    env_latency_seconds: f64,
    rng_seed: u64,
}

impl Config {
    /// Creates a new configuration for a backend serving `category`.
    ///
    /// `env_error_rate` and `env_latency_seconds` are the environment-style
    /// defaults used when the panel carries no entry for the category.
    #[must_use]
    pub const fn new(
        category: Category,
        env_error_rate: u32,
        env_latency_seconds: f64,
        rng_seed: u64,
    ) -> Self {
        Self {
            category,
            env_error_rate,
            env_latency_seconds,
            rng_seed,
        }
    }
}

/// Probe transport that simulates one backend rollout track in process.
#[derive(Debug)]
pub struct SimulatedBackend {
    category: Category,
    env_error_rate: u32,
    env_latency_seconds: f64,
    rng: ChaCha8Rng,
}

impl SimulatedBackend {
    /// Creates a new simulated backend using the supplied configuration.
    #[must_use]
    pub fn new(config: Config) -> Self {
        Self {
            category: config.category,
            env_error_rate: config.env_error_rate,
            env_latency_seconds: config.env_latency_seconds,
            rng: ChaCha8Rng::seed_from_u64(config.rng_seed),
        }
    }

    /// Category this backend answers for.
    #[must_use]
    pub const fn category(&self) -> Category {
        self.category
    }

    fn roll_status(&mut self, params: Option<&PanelValues>) -> StatusCode {
        let panel_forced = match params {
            Some(values) if values.return_500 > 0 => {
                values.return_500 >= self.rng.gen_range(0..100u32)
            }
            _ => false,
        };
        if panel_forced {
            return StatusCode::ServerError;
        }

        if self.env_error_rate > 0 && self.rng.gen_range(0..100u32) < self.env_error_rate {
            return StatusCode::ServerError;
        }

        StatusCode::Ok
    }

    fn service_delay(&self, params: Option<&PanelValues>) -> Duration {
        let requested = params
            .map(|values| f64::from(values.delay_length))
            .filter(|seconds| *seconds > 0.0)
            .unwrap_or(self.env_latency_seconds);
        Duration::from_secs_f64(requested.max(0.0))
    }
}

impl ProbeTransport for SimulatedBackend {
    fn dispatch(&mut self, payload: &str) -> Result<ProbeReply, ProbeError> {
        let entries = decode_panel_payload(payload).map_err(|error| {
            tracing::error!(%error, "rejecting malformed probe payload");
            ProbeError::MalformedPayload {
                detail: error.to_string(),
            }
        })?;

        let params = entries
            .iter()
            .find(|values| values.category == self.category);
        let service_time = self.service_delay(params);
        let status = self.roll_status(params);

        match status {
            StatusCode::Ok => tracing::info!(
                status = status.as_u16(),
                category = self.category.wire_name(),
                service_seconds = service_time.as_secs_f64(),
                "probe served"
            ),
            StatusCode::ServerError => tracing::error!(
                status = status.as_u16(),
                category = self.category.wire_name(),
                service_seconds = service_time.as_secs_f64(),
                "probe answered with simulated failure"
            ),
        }

        Ok(ProbeReply {
            status: status.as_u16(),
            body: format!("\"{}\"", self.category.wire_name()),
            service_time,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn backend(category: Category, error_rate: u32, latency: f64) -> SimulatedBackend {
        SimulatedBackend::new(Config::new(category, error_rate, latency, 0x5eed))
    }

    #[test]
    fn decodes_the_empty_panel_literal_as_no_entries() {
        assert!(decode_panel_payload("\"[]\"").expect("tolerated").is_empty());
        assert!(decode_panel_payload("").expect("tolerated").is_empty());
        assert!(decode_panel_payload("  ").expect("tolerated").is_empty());
    }

    #[test]
    fn rejects_payloads_that_are_not_entry_arrays() {
        assert!(decode_panel_payload("{\"category\":\"blue\"}").is_err());
        assert!(decode_panel_payload("[{\"category\":\"octo\"}]").is_err());
    }

    #[test]
    fn replies_with_the_assigned_category_body() {
        let mut backend = backend(Category::Yellow, 0, 0.0);
        let reply = backend.dispatch("\"[]\"").expect("dispatch succeeds");

        assert_eq!(reply.status, 200);
        assert_eq!(reply.body, "\"yellow\"");
        assert_eq!(reply.service_time, Duration::ZERO);
    }

    #[test]
    fn a_full_error_rate_always_answers_500() {
        let mut backend = backend(Category::Blue, 0, 0.0);
        let payload =
            r#"[{"category":"blue","return500":100,"delayPercent":100,"delayLength":0}]"#;

        for _ in 0..32 {
            let reply = backend.dispatch(payload).expect("dispatch succeeds");
            assert_eq!(reply.status, 500);
        }
    }

    #[test]
    fn a_zero_error_rate_never_answers_500() {
        let mut backend = backend(Category::Blue, 0, 0.0);
        let payload = r#"[{"category":"blue","return500":0,"delayPercent":0,"delayLength":0}]"#;

        for _ in 0..32 {
            let reply = backend.dispatch(payload).expect("dispatch succeeds");
            assert_eq!(reply.status, 200);
        }
    }

    #[test]
    fn panel_delay_maps_onto_the_service_time() {
        let mut backend = backend(Category::Blue, 0, 0.0);
        let payload = r#"[{"category":"blue","return500":0,"delayPercent":100,"delayLength":4}]"#;

        let reply = backend.dispatch(payload).expect("dispatch succeeds");
        assert_eq!(reply.service_time, Duration::from_secs(4));
    }

    #[test]
    fn environment_latency_backstops_an_unconfigured_category() {
        let mut backend = backend(Category::Blue, 0, 1.5);
        let payload =
            r#"[{"category":"yellow","return500":0,"delayPercent":0,"delayLength":9}]"#;

        let reply = backend.dispatch(payload).expect("dispatch succeeds");
        assert_eq!(reply.service_time, Duration::from_secs_f64(1.5));
    }

    #[test]
    fn environment_error_rate_applies_without_a_panel_entry() {
        let mut backend = backend(Category::Blue, 100, 0.0);
        let reply = backend.dispatch("\"[]\"").expect("dispatch succeeds");
        assert_eq!(reply.status, 500);
    }

    #[test]
    fn seeded_backends_replay_identically() {
        let payload = r#"[{"category":"blue","return500":50,"delayPercent":100,"delayLength":0}]"#;

        let mut first = backend(Category::Blue, 0, 0.0);
        let mut second = backend(Category::Blue, 0, 0.0);
        for _ in 0..64 {
            let a = first.dispatch(payload).expect("dispatch succeeds");
            let b = second.dispatch(payload).expect("dispatch succeeds");
            assert_eq!(a.status, b.status, "seeded rolls diverged");
        }
    }
}
