//! Label and description rules

use super::vocab::MAX_LABEL_LENGTH;

/// Labels are single-line and bounded in length; the empty label is allowed
pub fn is_valid_label(label: &str) -> bool {
    label.chars().count() <= MAX_LABEL_LENGTH && !label.contains(['\n', '\r'])
}

/// Descriptions may span lines but must not be blank
pub fn is_valid_description(description: &str) -> bool {
    !description.trim().is_empty() && description.chars().count() <= MAX_LABEL_LENGTH
}
