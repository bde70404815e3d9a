/// Relay envelope and typed peer notices.
pub mod peer;
/// Score records exchanged with the score service.
pub mod score;
/// Reusable validation helpers.
pub mod validation;
