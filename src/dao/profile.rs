use tracing::warn;

use crate::dao::storage::{KeyValueStore, StorageResult};

/// Storage slot holding the participant display name.
pub const USER_NAME_KEY: &str = "userName";
/// Name used when no display name was ever stored.
pub const DEFAULT_PLAYER_NAME: &str = "Mystery player";

/// Read the display name, defaulting when the slot is empty or unreadable.
pub fn load_player_name(store: &dyn KeyValueStore) -> String {
    match store.get(USER_NAME_KEY) {
        Ok(Some(name)) if !name.trim().is_empty() => name,
        Ok(_) => DEFAULT_PLAYER_NAME.to_string(),
        Err(err) => {
            warn!(error = %err, "failed to read player name; using default");
            DEFAULT_PLAYER_NAME.to_string()
        }
    }
}

/// Persist the display name.
pub fn save_player_name(store: &dyn KeyValueStore, name: &str) -> StorageResult<()> {
    store.set(USER_NAME_KEY, name)
}
