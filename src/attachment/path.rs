//! Key-path helpers shared by extraction and restoration

use crate::codec::Value;

/// Join non-empty path segments with "/"
pub(crate) fn build_key_path(parent: &str, current: &str) -> String {
    match (parent.is_empty(), current.is_empty()) {
        (true, _) => current.to_string(),
        (false, true) => parent.to_string(),
        (false, false) => format!("{}/{}", parent, current),
    }
}

/// Split a key path into the map fields below `root`.
///
/// Returns `None` when the path does not start at `root`.
pub(crate) fn relative_segments(root: &str, key_path: &str) -> Option<Vec<String>> {
    if key_path == root {
        return Some(Vec::new());
    }
    let rest = if root.is_empty() {
        key_path
    } else {
        key_path.strip_prefix(root)?.strip_prefix('/')?
    };
    Some(rest.split('/').map(str::to_string).collect())
}

/// Follow map fields from `root` down to a node
pub(crate) fn node_at_mut<'a>(root: &'a mut Value, segments: &[String]) -> Option<&'a mut Value> {
    let mut node = root;
    for segment in segments {
        node = node.as_map_mut()?.get_mut(segment)?;
    }
    Some(node)
}
