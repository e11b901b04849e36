//! Default instructions sent along with uploaded images

/// One vitals image (pulse oximeter, BP monitor ...)
pub const VITALS_SINGLE: &str = "Analyze this pulse oximeter or vital signs reading. \
Extract all measurements including heart rate, SpO2, blood pressure, and any other visible health metrics. \
Provide detailed observations.";

/// Several images analyzed together
pub const VITALS_COMBINED: &str = "Analyze these medical images together. \
Extract all visible measurements including heart rate, SpO2, blood pressure, temperature, and any other health metrics. \
Provide a concise combined summary.";

/// Instruction for a batch of `count` files
pub fn default_instruction(count: usize) -> &'static str {
    if count > 1 {
        VITALS_COMBINED
    } else {
        VITALS_SINGLE
    }
}
