//! Iterator options in LevelDB's vocabulary

use serde::Deserialize;

/// Bounds, direction and projection of a scan.
///
/// `start`/`end` are the legacy bounds: `start` is where iteration begins,
/// so in reverse mode it is the upper bound. `gt`/`gte`/`lt`/`lte` take
/// precedence over them.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct IteratorOptions {
    pub gt: Option<String>,
    pub gte: Option<String>,
    pub lt: Option<String>,
    pub lte: Option<String>,
    pub start: Option<String>,
    pub end: Option<String>,
    pub reverse: bool,
    /// Most entries to yield; `None` is unlimited
    pub limit: Option<usize>,
    pub keys: bool,
    pub values: bool,
}

impl Default for IteratorOptions {
    fn default() -> Self {
        Self {
            gt: None,
            gte: None,
            lt: None,
            lte: None,
            start: None,
            end: None,
            reverse: false,
            limit: None,
            keys: true,
            values: true,
        }
    }
}

impl IteratorOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn gt(mut self, key: impl Into<String>) -> Self {
        self.gt = Some(key.into());
        self
    }

    pub fn gte(mut self, key: impl Into<String>) -> Self {
        self.gte = Some(key.into());
        self
    }

    pub fn lt(mut self, key: impl Into<String>) -> Self {
        self.lt = Some(key.into());
        self
    }

    pub fn lte(mut self, key: impl Into<String>) -> Self {
        self.lte = Some(key.into());
        self
    }

    pub fn start(mut self, key: impl Into<String>) -> Self {
        self.start = Some(key.into());
        self
    }

    pub fn end(mut self, key: impl Into<String>) -> Self {
        self.end = Some(key.into());
        self
    }

    pub fn reverse(mut self) -> Self {
        self.reverse = true;
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Yield keys only
    pub fn keys_only(mut self) -> Self {
        self.keys = true;
        self.values = false;
        self
    }

    /// Yield values only
    pub fn values_only(mut self) -> Self {
        self.keys = false;
        self.values = true;
        self
    }
}
