//! Calls from the widget into the timer API.

use std::sync::Arc;

use async_trait::async_trait;
use reqwest::cookie::{CookieStore, Jar};
use reqwest::Url;
use serde::de::DeserializeOwned;
use timer_common::ajax::{
    ActiveElsewhere, CountdownEnded, StartCountdownData, TabClosed, NONCE_FIELD,
};
use timer_common::{AjaxAction, AjaxEnvelope, TimerBootstrap};

use crate::error::ClientError;

/// The four AJAX actions, one method each.
#[async_trait]
pub trait TimerBackend: Send + Sync {
    /// Returns false when another tab already holds the timer.
    async fn start_countdown(&self, post_id: u64) -> Result<bool, ClientError>;
    /// Returns true when a countdown already runs elsewhere.
    async fn start_button_click(&self, post_id: u64) -> Result<bool, ClientError>;
    /// Returns the completion code, empty unless the quota was met.
    async fn end_countdown(&self, post_id: u64) -> Result<String, ClientError>;
    async fn close_current_tab(&self, post_id: u64) -> Result<(), ClientError>;
}

/// [`TimerBackend`] over HTTP, posting forms to the API's AJAX endpoint.
///
/// The visitor cookie lives in the client's cookie jar, so whatever the
/// server mints on bootstrap is sent with every later call.
pub struct HttpBackend {
    http: reqwest::Client,
    jar: Arc<Jar>,
    base: Url,
    ajax_url: Url,
    nonce: String,
}

impl HttpBackend {
    /// Fetch the bootstrap for `post_id` and build a backend bound to the
    /// visitor it was issued for.
    ///
    /// `base_url` is where the API is mounted; a missing trailing slash is
    /// added. Pass the visitor cookie (`pdt_visitor=...`) of an existing
    /// visitor, or `None` to adopt the one the server mints.
    pub async fn bootstrap(
        base_url: &str,
        post_id: u64,
        visitor_cookie: Option<&str>,
    ) -> Result<(Self, TimerBootstrap), ClientError> {
        let base = normalize_base(base_url)?;

        let jar = Arc::new(Jar::default());
        if let Some(cookie) = visitor_cookie {
            jar.add_cookie_str(cookie, &base);
        }
        let http = reqwest::Client::builder()
            .cookie_provider(Arc::clone(&jar))
            .build()?;

        let url = resolve(&base, &format!("api/v1/posts/{post_id}/timer"))?;
        let bootstrap: TimerBootstrap = decode(http.get(url).send().await?).await?;
        let ajax_url = resolve(&base, &bootstrap.ajax_url)?;

        tracing::debug!(post_id, render = bootstrap.render, "timer bootstrap fetched");

        let backend = Self {
            http,
            jar,
            base,
            ajax_url,
            nonce: bootstrap.nonce.clone(),
        };
        Ok((backend, bootstrap))
    }

    /// `Cookie` header value the backend sends, to persist the visitor.
    pub fn visitor_cookie(&self) -> Option<String> {
        self.jar
            .cookies(&self.base)
            .and_then(|value| value.to_str().ok().map(str::to_string))
    }

    async fn call<T: DeserializeOwned>(
        &self,
        action: AjaxAction,
        post_id: u64,
    ) -> Result<AjaxEnvelope<T>, ClientError> {
        let post_id = post_id.to_string();
        let resp = self
            .http
            .post(self.ajax_url.clone())
            .form(&[
                ("action", action.as_str()),
                ("post_id", post_id.as_str()),
                (NONCE_FIELD, self.nonce.as_str()),
            ])
            .send()
            .await?;
        decode(resp).await
    }
}

#[async_trait]
impl TimerBackend for HttpBackend {
    async fn start_countdown(&self, post_id: u64) -> Result<bool, ClientError> {
        let envelope: AjaxEnvelope<StartCountdownData> =
            self.call(AjaxAction::StartCountdown, post_id).await?;
        Ok(envelope.success)
    }

    async fn start_button_click(&self, post_id: u64) -> Result<bool, ClientError> {
        let envelope: AjaxEnvelope<ActiveElsewhere> =
            self.call(AjaxAction::StartButtonClick, post_id).await?;
        Ok(envelope.data.status)
    }

    async fn end_countdown(&self, post_id: u64) -> Result<String, ClientError> {
        let envelope: AjaxEnvelope<CountdownEnded> =
            self.call(AjaxAction::EndCountdown, post_id).await?;
        Ok(envelope.data.pvt_complete_code)
    }

    async fn close_current_tab(&self, post_id: u64) -> Result<(), ClientError> {
        let _: AjaxEnvelope<TabClosed> = self.call(AjaxAction::CloseCurrentTab, post_id).await?;
        Ok(())
    }
}

fn normalize_base(base_url: &str) -> Result<Url, ClientError> {
    let mut base = Url::parse(base_url).map_err(|e| ClientError::BaseUrl(e.to_string()))?;
    if base.cannot_be_a_base() {
        return Err(ClientError::BaseUrl(format!("{base_url} cannot be a base")));
    }
    if !base.path().ends_with('/') {
        let path = format!("{}/", base.path());
        base.set_path(&path);
    }
    Ok(base)
}

/// Resolve a server path under `base`, keeping any prefix the base carries.
fn resolve(base: &Url, path: &str) -> Result<Url, ClientError> {
    base.join(path.trim_start_matches('/'))
        .map_err(|e| ClientError::BaseUrl(e.to_string()))
}

async fn decode<T: DeserializeOwned>(resp: reqwest::Response) -> Result<T, ClientError> {
    let status = resp.status();
    if !status.is_success() {
        let body = resp.text().await.unwrap_or_default();
        return Err(ClientError::Status { status, body });
    }
    Ok(resp.json().await?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn base_without_trailing_slash_keeps_last_segment() {
        let base = normalize_base("https://blog.test/timer").unwrap();
        assert_eq!(base.as_str(), "https://blog.test/timer/");
        assert_eq!(
            resolve(&base, "api/v1/posts/3/timer").unwrap().as_str(),
            "https://blog.test/timer/api/v1/posts/3/timer"
        );
    }

    #[test]
    fn absolute_server_paths_stay_under_prefix() {
        let base = normalize_base("https://blog.test/timer/").unwrap();
        assert_eq!(
            resolve(&base, "/ajax").unwrap().as_str(),
            "https://blog.test/timer/ajax"
        );

        let root = normalize_base("https://blog.test").unwrap();
        assert_eq!(resolve(&root, "/ajax").unwrap().as_str(), "https://blog.test/ajax");
    }

    #[test]
    fn rejects_unusable_base() {
        assert!(matches!(normalize_base("not a url"), Err(ClientError::BaseUrl(_))));
        assert!(matches!(
            normalize_base("mailto:x@blog.test"),
            Err(ClientError::BaseUrl(_))
        ));
    }

    #[tokio::test]
    async fn non_success_status_is_reported_with_body() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v1/posts/1/timer"))
            .respond_with(ResponseTemplate::new(503).set_body_string("maintenance"))
            .mount(&server)
            .await;

        let err = HttpBackend::bootstrap(&server.uri(), 1, None)
            .await
            .err()
            .unwrap();
        match err {
            ClientError::Status { status, body } => {
                assert_eq!(status, reqwest::StatusCode::SERVICE_UNAVAILABLE);
                assert_eq!(body, "maintenance");
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
