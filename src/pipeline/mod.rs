// Record processing pipeline: completeness -> normalize -> dedupe

pub mod processing;

pub use processing::completeness;
pub use processing::dedupe;
pub use processing::normalize;
