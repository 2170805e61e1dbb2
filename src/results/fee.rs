//! Minimum processing fee

/// Share of declared value charged as processing fee.
pub const MPF_RATE: f64 = 0.003_464;

/// Lowest fee charged (currency A).
pub const MPF_FLOOR: f64 = 33.58;

/// Highest fee charged (currency A).
pub const MPF_CEILING: f64 = 634.62;

/// Customs processing fee estimate for a declared value in currency A.
pub fn minimum_processing_fee(declared_value: f64) -> f64 {
    (declared_value * MPF_RATE).clamp(MPF_FLOOR, MPF_CEILING)
}
