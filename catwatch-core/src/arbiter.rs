//! Presence arbitration
//!
//! [`PresenceArbiter`] is fed one [`TickResult`] per tick and keeps the stable
//! `cat_detected` flag. It emits [`Action`]s when the flag changes and never
//! performs I/O itself, so a failed dispatch cannot roll back a transition.

use crate::config::{PresenceConfig, SuppressionPolicy};
use crate::types::{Detection, TickResult};
use std::collections::VecDeque;
use std::time::{Duration, Instant};
use tracing::{debug, info};

/// Side effect requested by the arbiter, in dispatch order
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    /// Text notification about the triggering sighting
    Notify(Detection),
    ActivateActuator,
    DeactivateActuator,
    /// Capture and send a photo burst; carries the triggering sighting
    CaptureBurst(Detection),
}

/// Externally observable arbiter state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ArbiterState {
    /// Stable presence flag
    pub cat_detected: bool,
    /// Time of the last positive tick while active
    pub active_since: Option<Instant>,
    pub last_person_seen_at: Option<Instant>,
}

#[derive(Debug, Clone)]
struct HistoryEntry {
    person: bool,
    best_cat: Option<Detection>,
}

impl HistoryEntry {
    /// Cat without a person in the same tick
    fn votes_cat(&self) -> bool {
        self.best_cat.is_some() && !self.person
    }
}

/// Debouncing presence state machine
#[derive(Debug, Clone)]
pub struct PresenceArbiter {
    config: PresenceConfig,
    state: ArbiterState,
    history: VecDeque<HistoryEntry>,
}

impl PresenceArbiter {
    pub fn new(config: PresenceConfig) -> Self {
        let capacity = config.policy.history_capacity();
        Self {
            config,
            state: ArbiterState::default(),
            history: VecDeque::with_capacity(capacity),
        }
    }

    pub fn config(&self) -> &PresenceConfig {
        &self.config
    }

    pub fn state(&self) -> ArbiterState {
        self.state
    }

    pub fn is_active(&self) -> bool {
        self.state.cat_detected
    }

    pub fn history_len(&self) -> usize {
        self.history.len()
    }

    /// Advance the state machine by one tick
    pub fn update(&mut self, tick: TickResult, now: Instant) -> Vec<Action> {
        let sighting = self.effective_sighting(tick, now);

        match (self.state.cat_detected, sighting) {
            (false, None) => Vec::new(),
            (false, Some(detection)) => {
                self.state.cat_detected = true;
                self.state.active_since = Some(now);
                info!("Cat confirmed with confidence {:.2}", detection.confidence);
                vec![
                    Action::Notify(detection.clone()),
                    Action::ActivateActuator,
                    Action::CaptureBurst(detection),
                ]
            }
            (true, Some(_)) => {
                self.state.active_since = Some(now);
                Vec::new()
            }
            (true, None) => match self.state.active_since {
                Some(since) if now.saturating_duration_since(since) < self.config.min_hold() => {
                    Vec::new()
                }
                _ => {
                    self.state.cat_detected = false;
                    self.state.active_since = None;
                    info!("Cat no longer in frame");
                    vec![Action::DeactivateActuator]
                }
            },
        }
    }

    /// Apply the suppression policy; `Some` carries the sighting that makes
    /// this tick effectively present.
    fn effective_sighting(&mut self, tick: TickResult, now: Instant) -> Option<Detection> {
        match self.config.policy {
            SuppressionPolicy::RecencyWindow { ignore_person_window_secs } => {
                self.recency_window(tick, now, Duration::from_secs(ignore_person_window_secs))
            }
            SuppressionPolicy::HistoryMajority { window, majority } => {
                self.history_majority(tick, now, window, majority)
            }
        }
    }

    fn recency_window(&mut self, tick: TickResult, now: Instant, window: Duration) -> Option<Detection> {
        let person = tick.person_present_raw();
        if person {
            self.state.last_person_seen_at = Some(now);
        }

        let cat = tick.into_best_cat()?;

        if let Some(seen_at) = self.state.last_person_seen_at {
            let elapsed = now.saturating_duration_since(seen_at);
            if elapsed < window {
                debug!(
                    "Ignoring cats: {:.1} seconds remaining",
                    (window - elapsed).as_secs_f64()
                );
                return None;
            }
        }

        if person {
            return None;
        }

        Some(cat)
    }

    fn history_majority(
        &mut self,
        tick: TickResult,
        now: Instant,
        window: usize,
        majority: usize,
    ) -> Option<Detection> {
        let person = tick.person_present_raw();
        if person {
            self.state.last_person_seen_at = Some(now);
        }

        // A zero window still keeps the current tick
        let capacity = window.max(1);
        while self.history.len() >= capacity {
            self.history.pop_front();
        }
        self.history.push_back(HistoryEntry {
            person,
            best_cat: tick.into_best_cat(),
        });

        if self.history.iter().any(|entry| entry.person) {
            debug!("Person in recent history, cat presence vetoed");
            return None;
        }

        let cat_count = self.history.iter().filter(|entry| entry.votes_cat()).count();
        if cat_count < majority {
            return None;
        }

        // Newest voting sighting; the current tick when it voted.
        self.history
            .iter()
            .rev()
            .filter(|entry| entry.votes_cat())
            .find_map(|entry| entry.best_cat.clone())
    }
}
