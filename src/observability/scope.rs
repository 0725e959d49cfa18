//! ObservationScope for paired begin/complete logging
//!
//! - `{name}_BEGIN` at TRACE on creation
//! - `{name}_COMPLETE` at INFO on `complete`
//! - `{name}_FAILED` at ERROR on `fail`
//! - `{name}_INCOMPLETE` at WARN when dropped unresolved, e.g. when a
//!   future is cancelled mid-operation

use std::time::Instant;

use super::logger::Logger;

pub struct ObservationScope {
    name: &'static str,
    resolved: bool,
    fields: Vec<(&'static str, String)>,
    started: Instant,
}

impl ObservationScope {
    pub fn new(name: &'static str) -> Self {
        Self::with_fields(name, Vec::new())
    }

    /// Create a scope whose fields are repeated on every line it logs
    pub fn with_fields(name: &'static str, fields: Vec<(&'static str, String)>) -> Self {
        let scope = Self {
            name,
            resolved: false,
            fields,
            started: Instant::now(),
        };
        Logger::trace(&format!("{}_BEGIN", name), &scope.field_refs());
        scope
    }

    fn field_refs(&self) -> Vec<(&str, &str)> {
        self.fields.iter().map(|(k, v)| (*k, v.as_str())).collect()
    }

    fn elapsed_ms(&self) -> String {
        self.started.elapsed().as_millis().to_string()
    }

    pub fn complete(self) {
        self.complete_with_fields(&[]);
    }

    pub fn complete_with_fields(mut self, extra_fields: &[(&str, &str)]) {
        self.resolved = true;
        let elapsed = self.elapsed_ms();
        let mut fields = self.field_refs();
        fields.push(("elapsed_ms", elapsed.as_str()));
        fields.extend(extra_fields.iter().copied());
        Logger::info(&format!("{}_COMPLETE", self.name), &fields);
    }

    /// Log failure with the error's code and message
    pub fn fail(mut self, code: &str, reason: &str) {
        self.resolved = true;
        let mut fields = self.field_refs();
        fields.push(("code", code));
        fields.push(("reason", reason));
        Logger::error(&format!("{}_FAILED", self.name), &fields);
    }

    pub fn is_resolved(&self) -> bool {
        self.resolved
    }
}

impl Drop for ObservationScope {
    fn drop(&mut self) {
        if !self.resolved {
            let mut fields = self.field_refs();
            fields.push(("reason", "scope dropped without completion"));
            Logger::warn(&format!("{}_INCOMPLETE", self.name), &fields);
        }
    }
}
