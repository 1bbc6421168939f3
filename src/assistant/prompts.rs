//! Prompt templates sent to the LLM

use crate::types::DtcRecord;

/// Prompt for a code found in the table: explain the stored fields.
pub fn known_dtc_prompt(record: &DtcRecord) -> String {
    format!(
        "You are a professional car assistant. Explain the DTC code in a **friendly, easy-to-read way**.\n\
         Include the following details neatly in separate lines: Meaning, Possible Causes, Fix Suggestion, Urgency.\n\
         Use emojis and bullets to highlight key points. Keep it concise and cool (6-8 lines).\n\n\
         DTC Code: {}\n\
         Meaning: {}\n\
         Possible Causes: {}\n\
         Fix Suggestion: {}\n\
         Urgency: {}",
        record.code, record.meaning, record.possible_cause, record.fix_suggestion, record.urgency
    )
}

/// Prompt for an unknown or absent code: work from the user's own words.
pub fn free_text_prompt(user_message: &str) -> String {
    format!(
        "You are a professional car assistant. The user reported the following info:\n\
         \"{user_message}\"\n\n\
         Provide a **concise, friendly, helpful response** (6-8 lines), highlighting key points \
         with emojis or bullets. Include meaning, possible causes, fix suggestions, and urgency if possible."
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_prompt_embeds_record() {
        let record = DtcRecord {
            code: "P0141".into(),
            meaning: "O2 heater".into(),
            possible_cause: "Heater open".into(),
            fix_suggestion: "Replace sensor".into(),
            urgency: "Medium".into(),
        };
        let prompt = known_dtc_prompt(&record);
        assert!(prompt.contains("(6-8 lines)"));
        assert!(prompt.contains("\n\nDTC Code: P0141\nMeaning: O2 heater\n"));
        assert!(prompt.contains("Possible Causes: Heater open\n"));
        assert!(prompt.contains("Fix Suggestion: Replace sensor\n"));
        assert!(prompt.ends_with("Urgency: Medium"));
    }

    #[test]
    fn test_free_text_prompt_quotes_message() {
        let prompt = free_text_prompt("Car shakes at 80 km/h");
        assert!(prompt.contains("\n\"Car shakes at 80 km/h\"\n\n"));
        assert!(prompt.contains("highlighting key points with emojis"));
    }
}
