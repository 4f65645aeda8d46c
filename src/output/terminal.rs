//! Human-readable report formatting.

use colored::Colorize;

use crate::statistics::{SampleStore, Summary, PERCENTILES};

/// Format the detailed-statistics view of a summary.
///
/// Sample count, extremes, central moments, and the fixed percentile set,
/// labeled with the operation and context being reported.
pub fn format_detailed(label: &str, summary: &Summary) -> String {
    if summary.count == 0 {
        return format!("{}: No data\n", label);
    }

    let mut out = String::new();
    out.push_str(&format!(
        "\n=== {} {} ===\n",
        "Detailed Statistics:".bold(),
        label.cyan().bold()
    ));
    out.push_str(&format!("Sample count:   {}\n", summary.count));
    out.push_str(&format!("Min:            {}\n", summary.min));
    out.push_str(&format!("Max:            {}\n", summary.max));
    out.push_str(&format!("Mean:           {:.2}\n", summary.mean));
    out.push_str(&format!("Median (50%):   {:.2}\n", summary.median));
    out.push_str(&format!("Std Dev:        {:.2}\n", summary.std_dev));
    out.push_str(&format!("Variance:       {:.2}\n", summary.variance));
    out.push_str("\nPercentiles:\n");
    for (&p, &value) in PERCENTILES.iter().zip(summary.percentiles.iter()) {
        out.push_str(&format!("  {:>4}th:       {:.2}\n", p as u32, value));
    }
    out
}

/// Format every sample for raw-data export.
///
/// Comma-separated in the store's current order, `per_line` samples per
/// row. A read-only projection; the store is not mutated.
pub fn format_samples(label: &str, store: &SampleStore, per_line: usize) -> String {
    if store.is_empty() {
        return format!("{}: No data\n", label);
    }
    let per_line = per_line.max(1);

    let mut out = String::new();
    out.push_str(&format!("\n=== All Samples: {} ===\n", label));
    for (i, value) in store.as_slice().iter().enumerate() {
        out.push_str(&value.to_string());
        if i + 1 < store.len() {
            out.push_str(", ");
        }
        if (i + 1) % per_line == 0 {
            out.push('\n');
        }
    }
    if store.len() % per_line != 0 {
        out.push('\n');
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::statistics::SampleStore;

    fn summary_of(values: &[u64]) -> Summary {
        let mut store = SampleStore::with_capacity(values.len()).unwrap();
        store.add_batch(values).unwrap();
        Summary::from_store(&mut store)
    }

    #[test]
    fn detailed_view_lists_all_fields() {
        let text = format_detailed("cpuid", &summary_of(&[30, 10, 40, 20]));
        assert!(text.contains("Sample count:   4"));
        assert!(text.contains("Min:            10"));
        assert!(text.contains("Max:            40"));
        assert!(text.contains("Median (50%):   25.00"));
        assert!(text.contains("95th"));
    }

    #[test]
    fn empty_summary_prints_no_data() {
        let mut store = SampleStore::with_capacity(1).unwrap();
        let summary = Summary::from_store(&mut store);
        assert_eq!(format_detailed("vmcall", &summary), "vmcall: No data\n");
    }

    #[test]
    fn samples_view_wraps_lines() {
        let mut store = SampleStore::with_capacity(5).unwrap();
        store.add_batch(&[1, 2, 3, 4, 5]).unwrap();
        let text = format_samples("raw", &store, 2);
        assert!(text.contains("1, 2"));
        assert!(text.ends_with('\n'));
        // Store order is untouched.
        assert_eq!(store.as_slice(), &[1, 2, 3, 4, 5]);
    }
}
