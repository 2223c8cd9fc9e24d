//! JSON document store adapter over HTTP.
//!
//! Documents live under `{base_url}/users/{user_id}/tasks/{task_id}`:
//! - `GET  .../tasks` returns a JSON array of task documents.
//! - `PUT  .../tasks/{id}` upserts one document.
//!
//! The bearer token, when present, is forwarded as-is; obtaining it is the
//! authentication collaborator's job.

use super::{RemoteError, RemoteResult, RemoteTaskStore};
use crate::model::task::Task;
use async_trait::async_trait;
use log::debug;
use reqwest::{Client, Url};
use std::time::Duration;

/// Connection settings for [`HttpRemoteStore`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpRemoteStoreConfig {
    pub base_url: String,
    pub user_id: String,
    pub auth_token: Option<String>,
    /// Transport-level timeout applied to every request.
    pub request_timeout: Duration,
}

/// Remote task store backed by a REST document API.
pub struct HttpRemoteStore {
    client: Client,
    collection_url: Url,
    auth_token: Option<String>,
    request_timeout: Duration,
}

impl HttpRemoteStore {
    pub fn new(config: HttpRemoteStoreConfig) -> RemoteResult<Self> {
        let user_id = config.user_id.trim();
        if user_id.is_empty() {
            return Err(RemoteError::Misconfigured(
                "user_id cannot be empty".to_string(),
            ));
        }

        let mut collection_url = Url::parse(config.base_url.trim()).map_err(|err| {
            RemoteError::Misconfigured(format!("invalid base_url `{}`: {err}", config.base_url))
        })?;
        collection_url
            .path_segments_mut()
            .map_err(|()| {
                RemoteError::Misconfigured(format!(
                    "base_url `{}` cannot carry a path",
                    config.base_url
                ))
            })?
            .pop_if_empty()
            .extend(["users", user_id, "tasks"]);

        let client = Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|err| RemoteError::Misconfigured(format!("http client: {err}")))?;

        Ok(Self {
            client,
            collection_url,
            auth_token: config.auth_token,
            request_timeout: config.request_timeout,
        })
    }

    fn document_url(&self, task: &Task) -> Url {
        let mut url = self.collection_url.clone();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.push(&task.id.to_string());
        }
        url
    }

    fn authorize(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.auth_token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    fn transport_error(&self, err: reqwest::Error) -> RemoteError {
        if err.is_timeout() {
            RemoteError::Timeout(self.request_timeout)
        } else {
            RemoteError::Unavailable(err.to_string())
        }
    }
}

#[async_trait]
impl RemoteTaskStore for HttpRemoteStore {
    async fn put_task(&self, task: &Task) -> RemoteResult<()> {
        let url = self.document_url(task);
        debug!("event=remote_put module=remote status=start task_id={}", task.id);

        let response = self
            .authorize(self.client.put(url).json(task))
            .send()
            .await
            .map_err(|err| self.transport_error(err))?;

        let status = response.status();
        if status.is_success() {
            return Ok(());
        }
        if status.is_server_error() {
            return Err(RemoteError::Unavailable(format!("status {status}")));
        }
        Err(RemoteError::WriteFailed {
            status: Some(status.as_u16()),
            message: response.text().await.unwrap_or_default(),
        })
    }

    async fn get_all(&self) -> RemoteResult<Vec<Task>> {
        let response = self
            .authorize(self.client.get(self.collection_url.clone()))
            .send()
            .await
            .map_err(|err| self.transport_error(err))?;

        let status = response.status();
        if !status.is_success() {
            return Err(RemoteError::Unavailable(format!(
                "listing tasks returned status {status}"
            )));
        }

        response
            .json::<Vec<Task>>()
            .await
            .map_err(|err| RemoteError::InvalidResponse(err.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::{HttpRemoteStore, HttpRemoteStoreConfig};
    use crate::remote::RemoteError;
    use std::time::Duration;

    fn config(base_url: &str, user_id: &str) -> HttpRemoteStoreConfig {
        HttpRemoteStoreConfig {
            base_url: base_url.to_string(),
            user_id: user_id.to_string(),
            auth_token: None,
            request_timeout: Duration::from_secs(1),
        }
    }

    #[test]
    fn collection_url_escapes_user_id() {
        let store = HttpRemoteStore::new(config("https://tasks.example.com/api/", "a b/c")).unwrap();
        assert_eq!(
            store.collection_url.as_str(),
            "https://tasks.example.com/api/users/a%20b%2Fc/tasks"
        );
    }

    #[test]
    fn rejects_blank_user_and_bad_url() {
        assert!(matches!(
            HttpRemoteStore::new(config("https://tasks.example.com", " ")),
            Err(RemoteError::Misconfigured(_))
        ));
        assert!(matches!(
            HttpRemoteStore::new(config("not a url", "uid")),
            Err(RemoteError::Misconfigured(_))
        ));
    }
}
