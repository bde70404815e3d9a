/// Display-name slot.
pub mod profile;
/// Remote score service client.
pub mod score_api;
/// Local high-score list.
pub mod score_cache;
/// Key/value storage abstraction and backends.
pub mod storage;
