#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Deterministic traffic system driving the simulated-request stream.
//!
//! The system dispatches probes through the transport port whenever the
//! scheduler fires the spawn task, tracks in-flight probes until their
//! service time elapses, and turns completed replies into `SpawnSprite`
//! commands. Nothing suppresses overlapping in-flight probes: completions
//! apply in arrival order, and response reordering across probes with
//! different injected delays is accepted. A failed or undecodable probe
//! records nothing and is never retried.

use std::{mem, time::Duration};

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rollout_reef_core::{Category, Command, Event, ProbeTransport, ResolutionTier, StatusCode};

/// Configuration parameters required to construct the traffic system.
#[derive(Clone, Copy, Debug)]
pub struct Config {
    rng_seed: u64,
}

impl Config {
    /// Creates a new configuration using the provided seed.
    #[must_use]
    pub const fn new(rng_seed: u64) -> Self {
        Self { rng_seed }
    }
}

#[derive(Clone, Debug)]
struct PendingProbe {
    sent_at: Duration,
    completes_at: Duration,
    status: u16,
    body: String,
}

/// Pure system that dispatches probes and drains their completions into
/// spawn commands.
#[derive(Debug)]
pub struct Traffic {
    clock: Duration,
    pending: Vec<PendingProbe>,
    rng: ChaCha8Rng,
}

impl Traffic {
    /// Creates a new traffic system using the supplied configuration.
    #[must_use]
    pub fn new(config: Config) -> Self {
        Self {
            clock: Duration::ZERO,
            pending: Vec::new(),
            rng: ChaCha8Rng::seed_from_u64(config.rng_seed),
        }
    }

    /// Number of probes currently awaiting completion.
    #[must_use]
    pub fn in_flight(&self) -> usize {
        self.pending.len()
    }

    /// Consumes world events, advancing the probe clock and draining every
    /// completion whose service time has elapsed into spawn commands.
    pub fn handle(&mut self, events: &[Event], out: &mut Vec<Command>) {
        let mut accumulated = Duration::ZERO;
        for event in events {
            if let Event::TimeAdvanced { dt } = event {
                accumulated = accumulated.saturating_add(*dt);
            }
        }

        if accumulated.is_zero() {
            return;
        }

        self.clock = self.clock.saturating_add(accumulated);
        self.drain_completions(out);
    }

    /// Dispatches one probe carrying the panel payload, recording the send
    /// time so the eventual completion can report a round trip.
    pub fn dispatch_probe(&mut self, payload: &str, transport: &mut dyn ProbeTransport) {
        match transport.dispatch(payload) {
            Ok(reply) => {
                self.pending.push(PendingProbe {
                    sent_at: self.clock,
                    completes_at: self.clock.saturating_add(reply.service_time),
                    status: reply.status,
                    body: reply.body,
                });
            }
            Err(error) => {
                // Lossy by design: no sprite, no sample, no retry.
                tracing::debug!(%error, "dropping failed probe");
            }
        }
    }

    fn drain_completions(&mut self, out: &mut Vec<Command>) {
        let clock = self.clock;
        let (due, pending): (Vec<PendingProbe>, Vec<PendingProbe>) = mem::take(&mut self.pending)
            .into_iter()
            .partition(|probe| probe.completes_at <= clock);
        self.pending = pending;

        let mut due = due;
        due.sort_by_key(|probe| probe.completes_at);

        for probe in due {
            let Some(status) = StatusCode::from_u16(probe.status) else {
                tracing::debug!(status = probe.status, "dropping reply with unknown status");
                continue;
            };

            let Some(category) = decode_category(&probe.body) else {
                tracing::debug!(body = %probe.body, "dropping reply with undecodable body");
                continue;
            };

            let tier = self.next_tier();
            let lane = self.rng.gen::<f32>();
            out.push(Command::SpawnSprite {
                category,
                status,
                tier,
                lane,
                round_trip: probe.completes_at.saturating_sub(probe.sent_at),
            });
        }
    }

    fn next_tier(&mut self) -> ResolutionTier {
        let index = self.rng.gen_range(0..ResolutionTier::ALL.len());
        ResolutionTier::ALL[index]
    }
}

/// Decodes a reply body (a JSON string naming the category) into a category.
fn decode_category(body: &str) -> Option<Category> {
    let name: String = serde_json::from_str(body).ok()?;
    Category::from_wire(&name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_quoted_category_bodies() {
        assert_eq!(decode_category("\"blue\""), Some(Category::Blue));
        assert_eq!(decode_category("\"yellow\""), Some(Category::Yellow));
        assert_eq!(decode_category("\"octo\""), None);
        assert_eq!(decode_category("blue"), None, "bare tokens are not JSON");
    }

    #[test]
    fn handling_without_elapsed_time_drains_nothing() {
        let mut traffic = Traffic::new(Config::new(1));
        let mut out = Vec::new();
        traffic.handle(&[], &mut out);
        assert!(out.is_empty());
        assert_eq!(traffic.in_flight(), 0);
    }
}
