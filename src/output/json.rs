//! JSON serialization for measurement summaries.

use crate::statistics::Summary;

/// Serialize a summary to a compact JSON string.
///
/// # Errors
///
/// Returns an error if serialization fails (should not happen for
/// `Summary`).
pub fn to_json(summary: &Summary) -> Result<String, serde_json::Error> {
    serde_json::to_string(summary)
}

/// Serialize a summary to a pretty-printed JSON string.
///
/// # Errors
///
/// Returns an error if serialization fails (should not happen for
/// `Summary`).
pub fn to_json_pretty(summary: &Summary) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::statistics::SampleStore;

    fn make_summary() -> Summary {
        let mut store = SampleStore::with_capacity(4).unwrap();
        store.add_batch(&[30, 10, 40, 20]).unwrap();
        Summary::from_store(&mut store)
    }

    #[test]
    fn test_to_json() {
        let json = to_json(&make_summary()).unwrap();
        assert!(json.contains("\"count\":4"));
        assert!(json.contains("\"min\":10"));
        assert!(json.contains("\"percentiles\""));
    }

    #[test]
    fn test_to_json_pretty() {
        let json = to_json_pretty(&make_summary()).unwrap();
        assert!(json.contains('\n'));
        assert!(json.contains("median"));
    }

    #[test]
    fn summary_round_trips() {
        let summary = make_summary();
        let json = to_json(&summary).unwrap();
        let back: Summary = serde_json::from_str(&json).unwrap();
        assert_eq!(back.count, summary.count);
        assert_eq!(back.min, summary.min);
    }
}
