use async_trait::async_trait;
use gloo_net::http::Request;

use super::outcome::SubmissionOutcome;
use super::session::SubmitBatch;
use crate::shared::api_utils::api_url;
use crate::shared::config::ImportConfig;

/// Отправка пакета резервирований.
///
/// Реализация сама разбирает ответ и никогда не возвращает ошибку: любая
/// проблема доставки становится `SubmissionOutcome::TransportFailure`.
#[async_trait(?Send)]
pub trait BatchSubmitter {
    async fn submit(&self, batch: SubmitBatch) -> SubmissionOutcome;
}

/// POST всего пакета одним JSON-запросом
#[derive(Debug, Clone)]
pub struct HttpBatchSubmitter {
    url: String,
    access_token: Option<String>,
}

impl HttpBatchSubmitter {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            access_token: None,
        }
    }

    pub fn from_config(config: &ImportConfig) -> Self {
        Self::new(api_url(&config.endpoint))
    }

    pub fn with_bearer(mut self, access_token: Option<String>) -> Self {
        self.access_token = access_token;
        self
    }
}

#[async_trait(?Send)]
impl BatchSubmitter for HttpBatchSubmitter {
    async fn submit(&self, batch: SubmitBatch) -> SubmissionOutcome {
        let request = batch.into_request();
        log::debug!("POST {} ({} reservations)", self.url, request.len());

        let mut builder = Request::post(&self.url);
        if let Some(token) = &self.access_token {
            builder = builder.header("Authorization", &format!("Bearer {}", token));
        }

        let response = match builder.json(&request) {
            Ok(req) => match req.send().await {
                Ok(response) => response,
                Err(e) => {
                    return SubmissionOutcome::transport(format!("Failed to send request: {}", e))
                }
            },
            Err(e) => {
                return SubmissionOutcome::transport(format!("Failed to serialize request: {}", e))
            }
        };

        let status = response.status();
        match response.text().await {
            Ok(body) => SubmissionOutcome::decode(status, &body),
            Err(e) => SubmissionOutcome::transport(format!("Failed to read response: {}", e)),
        }
    }
}
