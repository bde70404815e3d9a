//! Remote score service client: submits a finished session and receives the
//! authoritative top-N list in return.

mod error;
mod http;

pub use self::{
    error::{ScoreApiError, ScoreApiResult},
    http::HttpScoreApi,
};

use futures::future::BoxFuture;

use crate::dto::score::ScoreRecord;

/// Abstraction over the remote score store.
pub trait ScoreApi: Send + Sync {
    /// Persist `record` remotely and return the current high-score list.
    fn submit(&self, record: ScoreRecord) -> BoxFuture<'static, ScoreApiResult<Vec<ScoreRecord>>>;
}
