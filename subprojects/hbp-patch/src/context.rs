//! Per-run scratch state shared by the analyze and patch passes.

use std::collections::BTreeSet;

/// Transient state for one analysis or patch run.
///
/// Collects the ordered trace log and the set of patch units that actually
/// rewrote bytes. Allocated fresh per run; never shared between runs. Log
/// attribution is an explicit parameter rather than ambient "current unit"
/// state, so trace lines always name the unit that produced them.
#[derive(Debug, Default)]
pub struct PatchContext {
    log: Vec<String>,
    applied: BTreeSet<&'static str>,
}

impl PatchContext {
    /// Create an empty context.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a trace line, prefixed with the active unit id if any.
    pub fn log(&mut self, unit: Option<&str>, message: impl AsRef<str>) {
        let message = message.as_ref();
        match unit {
            Some(id) => self.log.push(format!("{id}: {message}")),
            None => self.log.push(message.to_owned()),
        }
    }

    /// Record that a unit rewrote at least one match.
    pub fn mark_applied(&mut self, id: &'static str) {
        self.applied.insert(id);
    }

    /// Units that rewrote bytes during this run.
    pub fn applied(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.applied.iter().copied()
    }

    /// Whether any unit rewrote bytes.
    pub fn any_applied(&self) -> bool {
        !self.applied.is_empty()
    }

    /// The trace lines collected so far.
    pub fn lines(&self) -> &[String] {
        &self.log
    }

    /// Consume the context, returning the ordered trace log.
    pub fn into_log(self) -> Vec<String> {
        self.log
    }
}
