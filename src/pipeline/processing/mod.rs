// Core engines: completeness filter, field normalizer, duplicate resolver

pub mod completeness;
pub mod dedupe;
pub mod normalize;

/// Percentage with two decimals, or `0%` when there is nothing to divide by
pub fn format_rate(count: usize, total: usize) -> String {
    if total == 0 {
        return "0%".to_string();
    }
    format!("{:.2}%", count as f64 / total as f64 * 100.0)
}
