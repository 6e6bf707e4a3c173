//! Typed path traversal over untyped JSON responses.
//!
//! The BI query API and the spreadsheet cell feed both bury the one number
//! we want deep inside nested JSON. Rather than chaining `get()` calls (or
//! letting a missing level panic), extractors describe the route as a slice
//! of [`Step`]s and get back either the leaf value or the exact segment that
//! was missing, which goes straight into a shape-mismatch error.

use serde_json::Value;
use std::fmt;

/// One segment of a JSON path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    /// Object member by key.
    Key(&'static str),
    /// Array element by index from the front.
    Index(usize),
    /// Array element counted from the end: `FromEnd(1)` is the last element.
    FromEnd(usize),
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Step::Key(key) => write!(f, "'{key}'"),
            Step::Index(idx) => write!(f, "[{idx}]"),
            Step::FromEnd(offset) => write!(f, "[len-{offset}]"),
        }
    }
}

/// Walk `path` down from `root`, returning the leaf value.
///
/// On failure the error names the segment that did not resolve, so the
/// resulting shape-mismatch error tells an operator exactly where the
/// third-party schema moved.
pub fn walk<'a>(root: &'a Value, path: &[Step]) -> Result<&'a Value, String> {
    let mut current = root;

    for step in path {
        current = match *step {
            Step::Key(key) => current
                .as_object()
                .and_then(|obj| obj.get(key))
                .ok_or_else(|| format!("{step} not found in response"))?,
            Step::Index(idx) => current
                .as_array()
                .and_then(|arr| arr.get(idx))
                .ok_or_else(|| format!("{step} not found in response"))?,
            Step::FromEnd(offset) => {
                let arr = current
                    .as_array()
                    .ok_or_else(|| format!("{step} applied to a non-array"))?;
                if offset == 0 || offset > arr.len() {
                    return Err(format!(
                        "{step} out of bounds for array of length {}",
                        arr.len()
                    ));
                }
                &arr[arr.len() - offset]
            }
        };
    }

    Ok(current)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_walk_keys_and_indices() {
        let doc = json!({"results": [{"result": {"value": 42}}]});
        let leaf = walk(
            &doc,
            &[
                Step::Key("results"),
                Step::Index(0),
                Step::Key("result"),
                Step::Key("value"),
            ],
        )
        .unwrap();
        assert_eq!(leaf.as_u64(), Some(42));
    }

    #[test]
    fn test_walk_from_end() {
        let doc = json!({"entry": [1, 2, 3, 4, 5]});
        let leaf = walk(&doc, &[Step::Key("entry"), Step::FromEnd(5)]).unwrap();
        assert_eq!(leaf.as_u64(), Some(1));

        let leaf = walk(&doc, &[Step::Key("entry"), Step::FromEnd(1)]).unwrap();
        assert_eq!(leaf.as_u64(), Some(5));
    }

    #[test]
    fn test_missing_key_names_the_segment() {
        let doc = json!({"results": []});
        let err = walk(&doc, &[Step::Key("result")]).unwrap_err();
        assert!(err.contains("'result'"), "got: {err}");
    }

    #[test]
    fn test_index_out_of_bounds_names_the_segment() {
        let doc = json!({"results": []});
        let err = walk(&doc, &[Step::Key("results"), Step::Index(0)]).unwrap_err();
        assert!(err.contains("[0]"), "got: {err}");
    }

    #[test]
    fn test_from_end_past_start_is_an_error() {
        let doc = json!([1, 2, 3]);
        let err = walk(&doc, &[Step::FromEnd(5)]).unwrap_err();
        assert!(err.contains("length 3"), "got: {err}");
    }

    #[test]
    fn test_empty_path_returns_root() {
        let doc = json!(7);
        assert_eq!(walk(&doc, &[]).unwrap().as_u64(), Some(7));
    }
}
