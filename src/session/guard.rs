//! The guarded request path.
//!
//! All outbound calls go through [`SessionGuard::send`] by construction —
//! the guard owns the only `reqwest::Client` — so there is exactly one place
//! where the credential is attached and exactly one place where a 401 ends
//! the session. This replaces the single-entry-point guarantee a browser
//! frontend would get from patching the global fetch function. The sign-in
//! request is the one exception; it uses
//! [`send_unguarded`](SessionGuard::send_unguarded).

use std::sync::Arc;
use std::time::Duration;

use reqwest::header::{AUTHORIZATION, HeaderValue};
use reqwest::{Client, Method, RequestBuilder, Response, StatusCode};
use url::Url;

use crate::error::ApiError;
use crate::session::store::{SessionStore, TOKEN_KEY};

/// Requests whose path contains this segment get the bearer credential.
pub const API_NAMESPACE: &str = "/api/";

/// Where the user is sent when the session ends. In a browser this would be
/// a navigation to the login page; the CLI prints an instruction, and tests
/// count invocations.
pub trait LoginBoundary: Send + Sync {
    fn redirect_to_login(&self);
}

/// Default boundary: tell the user how to sign back in.
#[derive(Debug, Default)]
pub struct PromptLoginBoundary;

impl LoginBoundary for PromptLoginBoundary {
    fn redirect_to_login(&self) {
        eprintln!("Your session has ended. Run `qanouni login` to sign in again.");
    }
}

#[derive(Clone)]
pub struct SessionGuard {
    http: Client,
    api_root: Url,
    store: SessionStore,
    boundary: Arc<dyn LoginBoundary>,
}

impl SessionGuard {
    pub fn new(
        api_root: Url,
        request_timeout: Duration,
        store: SessionStore,
        boundary: Arc<dyn LoginBoundary>,
    ) -> Result<Self, ApiError> {
        let http = Client::builder().timeout(request_timeout).build()?;
        Ok(Self {
            http,
            api_root,
            store,
            boundary,
        })
    }

    pub fn store(&self) -> &SessionStore {
        &self.store
    }

    pub fn api_root(&self) -> &Url {
        &self.api_root
    }

    /// Join an endpoint path under the API root.
    pub fn endpoint(&self, path: &str) -> Result<Url, ApiError> {
        let base = self.api_root.as_str().trim_end_matches('/');
        Ok(Url::parse(&format!(
            "{base}/{}",
            path.trim_start_matches('/')
        ))?)
    }

    /// Start a request against an API endpoint path.
    pub fn request(&self, method: Method, path: &str) -> Result<RequestBuilder, ApiError> {
        Ok(self.http.request(method, self.endpoint(path)?))
    }

    /// Start a request against an arbitrary target. Non-API targets still
    /// pass through [`send`](Self::send) but get no credential attached.
    pub fn request_url(&self, method: Method, url: Url) -> RequestBuilder {
        self.http.request(method, url)
    }

    /// Send a request through the guard.
    ///
    /// If the target path is inside the API namespace and a credential
    /// exists in storage *at this moment* — storage is the source of truth,
    /// not any cached session snapshot — a `Bearer` header is attached.
    ///
    /// A 401 response tears the session down and invokes the login boundary
    /// exactly once, before the response is handed back. The response is
    /// still returned unmodified: a caller racing with teardown may briefly
    /// keep running against a cleared session. There is no retry and no
    /// refresh; a 401 is terminal.
    pub async fn send(&self, builder: RequestBuilder) -> Result<Response, ApiError> {
        let mut request = builder.build()?;

        if request.url().path().contains(API_NAMESPACE)
            && let Some(token) = self.store.get(TOKEN_KEY)?
        {
            let value = HeaderValue::from_str(&format!("Bearer {token}")).map_err(|_| {
                ApiError::InvalidInput(
                    "stored credential contains characters not valid in a header".to_string(),
                )
            })?;
            request.headers_mut().insert(AUTHORIZATION, value);
        }

        let response = self.http.execute(request).await?;

        if response.status() == StatusCode::UNAUTHORIZED {
            tracing::warn!("backend rejected the credential, tearing down session");
            crate::session::teardown(&self.store);
            self.boundary.redirect_to_login();
        }

        Ok(response)
    }

    /// Send outside the unauthorized hook. The sign-in request itself goes
    /// through here: a 401 from it means wrong credentials, not an ended
    /// session, so there is no teardown and no login prompt.
    pub async fn send_unguarded(&self, builder: RequestBuilder) -> Result<Response, ApiError> {
        let request = builder.build()?;
        Ok(self.http.execute(request).await?)
    }

    /// Remove all session state. Safe to call when no session exists.
    pub fn teardown(&self) {
        crate::session::teardown(&self.store);
    }

    /// Invoke the login boundary without a response in hand. Used by the
    /// load-time gate when there is no session to begin with.
    pub fn notify_login_required(&self) {
        self.boundary.redirect_to_login();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoint_joins_under_api_root() {
        let store = SessionStore::new(std::path::Path::new("/tmp/qanouni-test-unused"));
        let guard = SessionGuard::new(
            Url::parse("http://localhost:8000/api").unwrap(),
            Duration::from_secs(5),
            store,
            Arc::new(PromptLoginBoundary),
        )
        .unwrap();

        let url = guard.endpoint("legal/pleading").unwrap();
        assert_eq!(url.as_str(), "http://localhost:8000/api/legal/pleading");

        // Leading slash does not reset to the host root.
        let url = guard.endpoint("/cases").unwrap();
        assert_eq!(url.as_str(), "http://localhost:8000/api/cases");
    }
}
