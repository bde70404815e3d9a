//! Validation helpers for DTOs.

use validator::ValidationError;

/// Longest display name accepted from the participant.
pub const MAX_PLAYER_NAME_LEN: usize = 64;

/// Validates that a display name is non-blank, at most [`MAX_PLAYER_NAME_LEN`]
/// characters and free of control characters.
///
/// # Examples
///
/// ```ignore
/// validate_player_name("Ada")      // Ok
/// validate_player_name("   ")      // Err - blank
/// validate_player_name("Ada\nBob") // Err - control character
/// ```
pub fn validate_player_name(name: &str) -> Result<(), ValidationError> {
    if name.trim().is_empty() {
        let mut err = ValidationError::new("player_name_blank");
        err.message = Some("Player name must not be blank".into());
        return Err(err);
    }

    let len = name.chars().count();
    if len > MAX_PLAYER_NAME_LEN {
        let mut err = ValidationError::new("player_name_length");
        err.message = Some(
            format!("Player name must be at most {MAX_PLAYER_NAME_LEN} characters (got {len})")
                .into(),
        );
        return Err(err);
    }

    if name.chars().any(char::is_control) {
        let mut err = ValidationError::new("player_name_format");
        err.message = Some("Player name must not contain control characters".into());
        return Err(err);
    }

    Ok(())
}
