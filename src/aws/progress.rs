//! Deployment progress as a monotonically increasing percentage.

use crate::error::Phase;

pub const VPC_WEIGHT: f64 = 10.0;
/// Weight of one subnet tier; three tiers make up 30.
pub const SUBNET_TIER_WEIGHT: f64 = 10.0;
pub const INTERNET_GATEWAY_WEIGHT: f64 = 10.0;
pub const ROUTE_TABLE_WEIGHT: f64 = 10.0;
pub const ASSOCIATION_WEIGHT: f64 = 10.0;
pub const NAT_GATEWAY_WEIGHT: f64 = 20.0;
pub const ENDPOINT_WEIGHT: f64 = 10.0;

type Observer = Box<dyn FnMut(Phase, f64)>;

/// Progress over a sequence of weighted phases.
///
/// Each phase's weight is split evenly across its planned steps. The last
/// step lands exactly on the phase boundary, and a phase with no steps jumps
/// its whole weight at once.
pub struct Progress {
    percent: f64,
    phase: Phase,
    phase_start: f64,
    phase_weight: f64,
    steps: usize,
    completed: usize,
    observer: Option<Observer>,
}

impl Default for Progress {
    fn default() -> Self {
        Progress::new()
    }
}

impl std::fmt::Debug for Progress {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Progress")
            .field("percent", &self.percent)
            .field("phase", &self.phase)
            .field("steps", &self.steps)
            .field("completed", &self.completed)
            .finish()
    }
}

impl Progress {
    pub fn new() -> Progress {
        Progress {
            percent: 0.0,
            phase: Phase::Vpc,
            phase_start: 0.0,
            phase_weight: 0.0,
            steps: 0,
            completed: 0,
            observer: None,
        }
    }

    /// Progress that calls `observer` with every new percentage.
    pub fn with_observer(observer: impl FnMut(Phase, f64) + 'static) -> Progress {
        Progress {
            observer: Some(Box::new(observer)),
            ..Progress::new()
        }
    }

    pub fn percent(&self) -> f64 {
        self.percent
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Start a phase of `weight` percent made of `steps` steps.
    pub fn begin(&mut self, phase: Phase, weight: f64, steps: usize) {
        // close an unfinished previous phase so the next one starts on its boundary
        let start = self.phase_start + self.phase_weight;
        self.phase = phase;
        self.phase_start = start;
        self.phase_weight = weight;
        self.steps = steps;
        self.completed = 0;
        log::debug!("Phase {phase}: {steps} steps, weight {weight}");
        if steps == 0 {
            self.report(start + weight);
        } else {
            self.report(start);
        }
    }

    /// Mark one step of the current phase done.
    pub fn step(&mut self) {
        if self.completed >= self.steps {
            log::warn!("Phase {} has no steps left", self.phase);
            return;
        }
        self.completed += 1;
        let value = if self.completed == self.steps {
            self.phase_start + self.phase_weight
        } else {
            self.phase_start + self.phase_weight * self.completed as f64 / self.steps as f64
        };
        self.report(value);
    }

    fn report(&mut self, value: f64) {
        if value <= self.percent {
            return;
        }
        self.percent = value;
        log::info!("[{:5.1}%] {}", value, self.phase);
        if let Some(observer) = self.observer.as_mut() {
            observer(self.phase, value);
        }
    }
}
