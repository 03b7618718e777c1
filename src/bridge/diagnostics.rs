//! Publish-frequency diagnostics for each sensor topic.

use std::{
    collections::{HashMap, VecDeque},
    time::{Duration, Instant},
};

/// How far back samples are kept for the frequency estimate.
const WINDOW: Duration = Duration::from_secs(10);

/// Allowed relative deviation from the expected rate.
const TOLERANCE: f64 = 0.1;

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Status {
    /// No samples observed in the window
    Stale,
    Ok,
    /// Measured rate outside the tolerance band
    OutOfRange,
}

impl Status {
    pub fn as_str(&self) -> &'static str {
        match self {
            Status::Stale => "stale",
            Status::Ok => "ok",
            Status::OutOfRange => "out of range",
        }
    }
}

/// Tracks the measured publish frequency of a single topic.
#[derive(Debug)]
pub struct FrequencyStatus {
    expected_hz: f64,
    ticks: VecDeque<Instant>,
}

impl FrequencyStatus {
    pub fn new(expected_hz: f64) -> Self {
        Self {
            expected_hz,
            ticks: VecDeque::new(),
        }
    }

    /// Records one published sample.
    pub fn tick(&mut self) {
        let now = Instant::now();
        self.ticks.push_back(now);
        while let Some(front) = self.ticks.front() {
            if now.duration_since(*front) <= WINDOW {
                break;
            }
            self.ticks.pop_front();
        }
    }

    /// Measured frequency over the sample window in Hz.
    pub fn measured_hz(&self) -> f64 {
        if self.ticks.len() < 2 {
            return 0.0;
        }
        let span = self
            .ticks
            .back()
            .unwrap()
            .duration_since(*self.ticks.front().unwrap());
        if span.is_zero() {
            return 0.0;
        }
        (self.ticks.len() - 1) as f64 / span.as_secs_f64()
    }

    pub fn status(&self) -> Status {
        if self.ticks.is_empty() {
            return Status::Stale;
        }
        let measured = self.measured_hz();
        if measured < self.expected_hz * (1.0 - TOLERANCE)
            || measured > self.expected_hz * (1.0 + TOLERANCE)
        {
            return Status::OutOfRange;
        }
        Status::Ok
    }
}

/// Per-topic frequency trackers for every publisher of the bridge.
#[derive(Debug, Default)]
pub struct Diagnostics {
    topics: HashMap<String, FrequencyStatus>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a topic with its expected publish rate.
    pub fn add_topic(&mut self, name: &str, expected_hz: f64) {
        self.topics
            .insert(name.to_string(), FrequencyStatus::new(expected_hz));
    }

    /// Records one published sample on the given topic.
    pub fn tick(&mut self, name: &str) {
        if let Some(status) = self.topics.get_mut(name) {
            status.tick();
        }
    }

    /// Measured frequency of every registered topic.
    pub fn frequencies(&self) -> HashMap<String, f64> {
        self.topics
            .iter()
            .map(|(name, status)| (name.clone(), status.measured_hz()))
            .collect()
    }

    /// Status string of every registered topic.
    pub fn statuses(&self) -> HashMap<String, String> {
        self.topics
            .iter()
            .map(|(name, status)| (name.clone(), status.status().as_str().to_string()))
            .collect()
    }
}
