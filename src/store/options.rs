//! Open options

/// How `open` treats existing or missing storage
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OpenOptions {
    /// Create the table and bucket when absent
    pub create_if_missing: bool,
    /// Fail when the table or bucket already exists
    pub error_if_exists: bool,
}

impl Default for OpenOptions {
    fn default() -> Self {
        Self {
            create_if_missing: true,
            error_if_exists: false,
        }
    }
}
