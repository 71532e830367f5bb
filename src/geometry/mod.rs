//! Crop and output-transform geometry for the fixed 16:9 landscape policy.

/// Policy constants and the crop geometry calculator.
pub mod crop;
