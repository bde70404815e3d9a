/// Newest-first peer activity log.
pub mod activity_log;
/// Terminal display, sound and command parsing.
pub mod console;
/// Turn arbiter driving a game session.
pub mod game_service;
/// Relay connection carrying peer notices.
pub mod peer_channel;
/// Timed highlight and tone playback.
pub mod playback;
/// Display, sound and clock ports.
pub mod ports;
/// Remote score submission with local fallback.
pub mod score_gateway;
/// Sequence element generators.
pub mod sequence;
#[cfg(test)]
pub(crate) mod test_support;
