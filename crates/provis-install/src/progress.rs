//! Weighted progress across pipeline stages.

use std::fmt;

/// Receiver for pipeline progress. Both methods are called from the
/// pipeline's driving task only, never concurrently.
pub trait ProgressSink: Send + Sync {
    /// Overall completion in `[0, 1]`, non-decreasing within one install.
    fn progress(&self, fraction: f64);

    fn status(&self, message: &str);
}

/// Sink that discards everything.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoProgress;

impl ProgressSink for NoProgress {
    fn progress(&self, _fraction: f64) {}

    fn status(&self, _message: &str) {}
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Stage {
    Resolve,
    Libraries,
    Natives,
    Assets,
    Loader,
    Addons,
}

impl Stage {
    pub const ALL: [Stage; 6] = [
        Stage::Resolve,
        Stage::Libraries,
        Stage::Natives,
        Stage::Assets,
        Stage::Loader,
        Stage::Addons,
    ];

    /// Share of the overall progress bar owned by this stage.
    pub fn weight(self) -> f64 {
        match self {
            Stage::Resolve => 0.05,
            Stage::Libraries => 0.20,
            Stage::Natives => 0.05,
            Stage::Assets => 0.45,
            Stage::Loader => 0.15,
            Stage::Addons => 0.10,
        }
    }

    /// Where this stage's slice starts.
    pub fn offset(self) -> f64 {
        Stage::ALL
            .iter()
            .take_while(|stage| **stage != self)
            .map(|stage| stage.weight())
            .sum()
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Resolve => "resolve",
            Stage::Libraries => "libraries",
            Stage::Natives => "natives",
            Stage::Assets => "assets",
            Stage::Loader => "loader",
            Stage::Addons => "addons",
        };
        f.write_str(name)
    }
}

/// Maps stage-local fractions onto the overall bar and forwards them to a
/// sink, never letting the reported value go backwards.
pub struct Reporter<'a> {
    sink: &'a dyn ProgressSink,
    stage: Stage,
    last: f64,
}

impl<'a> Reporter<'a> {
    pub fn new(sink: &'a dyn ProgressSink) -> Self {
        Self {
            sink,
            stage: Stage::Resolve,
            last: 0.0,
        }
    }

    pub fn stage(&self) -> Stage {
        self.stage
    }

    pub fn last(&self) -> f64 {
        self.last
    }

    pub fn enter(&mut self, stage: Stage) {
        self.stage = stage;
        self.emit(stage.offset());
    }

    /// Progress within the current stage.
    pub fn fraction(&mut self, fraction: f64) {
        let fraction = if fraction.is_finite() { fraction.clamp(0.0, 1.0) } else { 0.0 };
        self.emit(self.stage.offset() + self.stage.weight() * fraction);
    }

    pub fn count(&mut self, done: usize, total: usize) {
        if total == 0 {
            self.fraction(1.0);
        } else {
            self.fraction(done as f64 / total as f64);
        }
    }

    pub fn finish_stage(&mut self) {
        self.fraction(1.0);
    }

    pub fn status(&self, message: &str) {
        self.sink.status(message);
    }

    /// Emit exactly `1.0`, regardless of floating-point drift in the slices.
    pub fn complete(&mut self) {
        self.last = 1.0;
        self.sink.progress(1.0);
    }

    fn emit(&mut self, value: f64) {
        let value = value.min(1.0);
        if value <= self.last {
            return;
        }
        self.last = value;
        self.sink.progress(value);
    }
}
