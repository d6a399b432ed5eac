// SPDX-License-Identifier: MIT OR Apache-2.0
//! Bounded typewriter.
//!
//! Reveals a fixed text one character at a time, then stops. Unlike the
//! scripted sequencer there is no deleting, pausing, or looping; the only
//! extra signal is a completion flag, which flips one step AFTER the last
//! character so the full text is visible for one interval before the caret
//! logic reacts to it.

use crate::driver::{Driver, Stepper};
use crate::scheduler::Scheduler;
use std::sync::Arc;

/// State machine revealing a fixed text one character at a time.
#[derive(Debug, Clone)]
pub struct TypewriterState {
    /// Full text being revealed.
    text: String,
    /// Revealed prefix length, in bytes.
    revealed: usize,
    /// Delay between characters, in milliseconds.
    speed_ms: u64,
    /// Set on the step after the last character.
    complete: bool,
}

impl TypewriterState {
    /// Machine with nothing revealed yet.
    pub fn new(text: impl Into<String>, speed_ms: u64) -> Self {
        Self {
            text: text.into(),
            revealed: 0,
            speed_ms,
            complete: false,
        }
    }

    /// Advance one micro-step: reveal a character, or flip the completion
    /// flag once nothing is left. `None` once complete.
    pub fn step(&mut self) -> Option<u64> {
        if self.complete {
            return None;
        }
        match self.text[self.revealed..].chars().next() {
            Some(ch) => {
                self.revealed += ch.len_utf8();
                Some(self.speed_ms)
            }
            None => {
                self.complete = true;
                tracing::debug!("Typewriter complete: {:?}", self.text);
                None
            }
        }
    }

    /// Revealed prefix of the text.
    pub fn text(&self) -> &str {
        &self.text[..self.revealed]
    }

    /// Whether the step after the last character has run.
    pub fn is_complete(&self) -> bool {
        self.complete
    }
}

impl Stepper for TypewriterState {
    fn step(&mut self) -> Option<u64> {
        TypewriterState::step(self)
    }
}

/// Spawned typewriter: a [`TypewriterState`] driven on a scheduler.
pub struct Typewriter {
    driver: Driver<TypewriterState>,
}

impl Typewriter {
    /// Start revealing `text`, first character `delay_ms` from now and one
    /// every `speed_ms` after that.
    pub fn spawn(
        scheduler: Arc<dyn Scheduler>,
        text: impl Into<String>,
        speed_ms: u64,
        delay_ms: u64,
    ) -> Self {
        let state = TypewriterState::new(text, speed_ms);
        tracing::debug!(
            "Spawning typewriter: {:?}, speed {speed_ms}ms, delay {delay_ms}ms",
            state.text
        );
        Self {
            driver: Driver::spawn(scheduler, state, delay_ms),
        }
    }

    /// Revealed prefix after the most recent completed micro-step.
    pub fn text(&self) -> String {
        self.driver.with(|state| state.text().to_owned())
    }

    /// Whether the step after the last character has run.
    pub fn is_complete(&self) -> bool {
        self.driver.with(TypewriterState::is_complete)
    }

    /// Stop all pending advances. Idempotent; [`text`](Self::text) keeps
    /// returning the frozen value.
    pub fn cancel(&self) {
        self.driver.cancel();
    }
}
