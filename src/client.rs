// src/client.rs

use std::collections::HashMap;

use async_trait::async_trait;
use reqwest::{Method, RequestBuilder, Response, StatusCode};
use serde::Deserialize;
use url::Url;

use crate::{
    error::AppError,
    exercises::{effects::ProgressStore, results::Summary, source::ExerciseSource},
    models::{
        exercise::ExerciseRecord,
        progress::{ProgressKey, ProgressSnapshot},
    },
};

/// HTTP client for the exercise service.
///
/// Implements `ExerciseSource` and `ProgressStore`, so a client-side session
/// and `EffectRunner` can use the remote service directly. The service takes
/// the user id from the bearer token; `ProgressKey::user_id` is not sent.
#[derive(Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base: Url,
    token: Option<String>,
}

#[derive(Deserialize)]
struct ErrorBody {
    error: String,
}

impl ApiClient {
    pub fn new(base_url: &str) -> Result<Self, AppError> {
        let base = Url::parse(base_url)
            .map_err(|e| AppError::BadRequest(format!("invalid base url {}: {}", base_url, e)))?;
        Ok(Self {
            http: reqwest::Client::new(),
            base,
            token: None,
        })
    }

    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    fn endpoint(&self, segments: &[&str], difficulty: &str) -> Result<Url, AppError> {
        let mut url = self.base.clone();
        url.path_segments_mut()
            .map_err(|_| AppError::BadRequest(format!("base url cannot be a base: {}", self.base)))?
            .pop_if_empty()
            .extend(segments);
        url.query_pairs_mut().append_pair("difficulty", difficulty);
        Ok(url)
    }

    fn request(&self, method: Method, url: Url) -> RequestBuilder {
        let builder = self.http.request(method, url);
        match &self.token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    /// Grades a full answer map on the server.
    pub async fn grade(
        &self,
        resource_id: &str,
        difficulty: &str,
        answers: &HashMap<String, String>,
    ) -> Result<Summary, AppError> {
        let url = self.endpoint(&["api", "exercises", resource_id, "grade"], difficulty)?;
        let response = self
            .request(Method::POST, url)
            .json(&serde_json::json!({ "answers": answers }))
            .send()
            .await?;
        Ok(check(response).await?.json().await?)
    }
}

/// Maps non-success responses onto `AppError`, keeping the server's message.
async fn check(response: Response) -> Result<Response, AppError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let message = response
        .json::<ErrorBody>()
        .await
        .map(|body| body.error)
        .unwrap_or_else(|_| status.to_string());

    Err(match status {
        StatusCode::NOT_FOUND => AppError::NotFound(message),
        StatusCode::BAD_REQUEST => AppError::BadRequest(message),
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => AppError::AuthError(message),
        _ => AppError::InternalServerError(message),
    })
}

#[async_trait]
impl ExerciseSource for ApiClient {
    async fn fetch(
        &self,
        resource_id: &str,
        difficulty: &str,
    ) -> Result<Vec<ExerciseRecord>, AppError> {
        let url = self.endpoint(&["api", "exercises", resource_id], difficulty)?;
        let response = self.request(Method::GET, url).send().await?;
        match check(response).await {
            Ok(response) => Ok(response.json().await?),
            // The service answers 404 for an empty set.
            Err(AppError::NotFound(_)) => Ok(Vec::new()),
            Err(e) => Err(e),
        }
    }
}

#[async_trait]
impl ProgressStore for ApiClient {
    async fn save(&self, key: &ProgressKey, snapshot: &ProgressSnapshot) -> Result<(), AppError> {
        let url = self.endpoint(&["api", "progress", key.resource_id.as_str()], &key.difficulty)?;
        let response = self.request(Method::PUT, url).json(snapshot).send().await?;
        check(response).await?;
        Ok(())
    }

    async fn load(&self, key: &ProgressKey) -> Result<Option<ProgressSnapshot>, AppError> {
        let url = self.endpoint(&["api", "progress", key.resource_id.as_str()], &key.difficulty)?;
        let response = self.request(Method::GET, url).send().await?;
        match check(response).await {
            Ok(response) => Ok(Some(response.json().await?)),
            Err(AppError::NotFound(_)) => Ok(None),
            Err(e) => Err(e),
        }
    }

    async fn delete(&self, key: &ProgressKey) -> Result<(), AppError> {
        let url = self.endpoint(&["api", "progress", key.resource_id.as_str()], &key.difficulty)?;
        let response = self.request(Method::DELETE, url).send().await?;
        check(response).await?;
        Ok(())
    }
}
