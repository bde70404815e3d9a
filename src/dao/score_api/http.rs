use std::sync::Arc;

use futures::future::BoxFuture;
use reqwest::Client;

use crate::dto::score::ScoreRecord;

use super::{
    ScoreApi,
    error::{ScoreApiError, ScoreApiResult},
};

/// Path of the score endpoint relative to the server base URL.
pub const SCORE_PATH: &str = "api/score";

/// [`ScoreApi`] implementation speaking JSON over HTTP.
#[derive(Clone)]
pub struct HttpScoreApi {
    client: Client,
    endpoint: Arc<str>,
}

impl HttpScoreApi {
    /// Build a client targeting `{base_url}/api/score`.
    pub fn new(base_url: &str) -> ScoreApiResult<Self> {
        let client = Client::builder()
            .build()
            .map_err(|source| ScoreApiError::ClientBuilder { source })?;

        let endpoint = Arc::<str>::from(format!(
            "{}/{}",
            base_url.trim_end_matches('/'),
            SCORE_PATH
        ));

        Ok(Self { client, endpoint })
    }

    /// Full URL of the score endpoint.
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    async fn post_score(&self, record: &ScoreRecord) -> ScoreApiResult<Vec<ScoreRecord>> {
        let url = self.endpoint.to_string();
        let response = self
            .client
            .post(&url)
            .json(record)
            .send()
            .await
            .map_err(|source| ScoreApiError::RequestSend {
                url: url.clone(),
                source,
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(ScoreApiError::RequestStatus { url, status });
        }

        response
            .json::<Vec<ScoreRecord>>()
            .await
            .map_err(|source| ScoreApiError::DecodeResponse { url, source })
    }
}

impl ScoreApi for HttpScoreApi {
    fn submit(&self, record: ScoreRecord) -> BoxFuture<'static, ScoreApiResult<Vec<ScoreRecord>>> {
        let api = self.clone();
        Box::pin(async move { api.post_score(&record).await })
    }
}
