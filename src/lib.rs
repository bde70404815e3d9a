//! Library crate for simon-engine, exposing modules for the binary and integration tests.

pub mod config;
/// Durable slots, the local score cache and the remote score client.
pub mod dao;
/// Wire and storage payloads.
pub mod dto;
/// Engine-level error type.
pub mod error;
/// Game engine, playback, relay channel and the terminal front-end.
pub mod services;
/// Session state, the phase machine and epoch guards.
pub mod state;
