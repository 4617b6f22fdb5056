use regex::Regex;
use std::sync::LazyLock;

use crate::core::shared::action_result::ActionError;

static CYCLE_TIME_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[0-9]{2,}:[0-5][0-9]:[0-5][0-9]$").expect("Invalid cycle time regex")
});

static EMAIL_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[a-zA-Z0-9.!#$%&'*+/=?^_`{|}~-]+@[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?(?:\.[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?)*$")
        .expect("Invalid email regex")
});

/// `HH:MM:SS`, minutes and seconds below 60. Hours may exceed two digits.
pub fn validate_cycle_time(value: &str) -> Result<(), ActionError> {
    if CYCLE_TIME_REGEX.is_match(value) {
        Ok(())
    } else {
        Err(ActionError::Invalid(format!(
            "Target cycle time must be formatted as HH:MM:SS, got {value:?}"
        )))
    }
}

pub fn validate_email(value: &str) -> Result<(), ActionError> {
    if value.len() <= 254 && EMAIL_REGEX.is_match(value) {
        Ok(())
    } else {
        Err(ActionError::Invalid(format!("Invalid email address: {value}")))
    }
}
