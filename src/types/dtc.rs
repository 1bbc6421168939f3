//! Diagnostic trouble code records

use serde::{Deserialize, Serialize};

/// A single entry of the DTC table.
///
/// All descriptive fields are free text; a field whose column is missing from
/// the source table is the empty string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DtcRecord {
    /// Normalized code (trimmed, upper-case), e.g. `P0141`
    pub code: String,
    pub meaning: String,
    pub possible_cause: String,
    pub fix_suggestion: String,
    pub urgency: String,
}

/// Normalize a code for use as a table key.
pub fn normalize_code(raw: &str) -> String {
    raw.trim().to_uppercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_code() {
        assert_eq!(normalize_code("  p0141 "), "P0141");
        assert_eq!(normalize_code("P0300"), "P0300");
        assert_eq!(normalize_code("   "), "");
    }
}
