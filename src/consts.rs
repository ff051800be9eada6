/// Label of the synthetic grand-total row appended to result tables
pub(crate) const TOTAL_LABEL: &str = "Totalizer";

/// Cumulative share up to which an entity is class A (inclusive)
pub(crate) const CLASS_A_LIMIT: f64 = 0.80;

/// Cumulative share up to which an entity is class B (inclusive)
pub(crate) const CLASS_B_LIMIT: f64 = 0.95;

/// Year assigned to rows without a usable year
pub(crate) const FALLBACK_YEAR: i32 = 2024;

/// Month assigned to rows without a usable month
pub(crate) const FALLBACK_MONTH: u32 = 1;

/// Default number of rows in the shared-clients ranking
pub(crate) const DEFAULT_TOP_SHARED: usize = 20;

/// Max length of sheet-like names inside an export bundle
pub(crate) const EXPORT_NAME_LIMIT: usize = 31;

pub(crate) const MONTH_ABBREVIATIONS: [&str; 12] = [
    "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
];
