//! GitLab provider backed by `reqwest`.
//!
//! Requests are issued from the page itself, so the browser attaches the
//! user's session cookie. GraphQL mutations and queries made with a session
//! cookie additionally need the page's CSRF token.
//!
//! No timeout is set: a hung request leaves its element marked and
//! unenriched, and nothing else waits on it.

mod graphql;

use async_trait::async_trait;
use log::debug;
use reqwest::header::ACCEPT;
use reqwest::{Client, RequestBuilder, Response};
use url::Url;

use crate::errors::HostDataError;
use crate::models::{DescendantCounts, EpicRef, IssueLabels};
use crate::provider::HostDataProvider;

use self::graphql::{GraphQlRequest, GraphQlResponse};

/// Header GitLab's Rails frontend reads the CSRF token from.
const CSRF_HEADER: &str = "X-CSRF-Token";

/// Suffix turning an issue/MR page link into its JSON representation.
const JSON_SUFFIX: &str = ".json";

/// Provider talking to the GitLab instance that served the current page.
///
/// # Example
///
/// ```ignore
/// use gitlab_focus_host_data::GitlabProvider;
///
/// let provider = GitlabProvider::new("https://gitlab.com/acme/app/-/issues/1")?
///     .with_csrf_token("token-from-meta-tag");
/// ```
pub struct GitlabProvider {
    client: Client,
    page_url: Url,
    csrf_token: Option<String>,
}

impl GitlabProvider {
    /// Create a provider for the page at `page_url`.
    pub fn new(page_url: &str) -> Result<Self, HostDataError> {
        Self::with_client(page_url, Client::new())
    }

    /// Create a provider with a preconfigured client.
    pub fn with_client(page_url: &str, client: Client) -> Result<Self, HostDataError> {
        Ok(Self {
            client,
            page_url: Url::parse(page_url)?,
            csrf_token: None,
        })
    }

    /// Attach the page's CSRF token to every request.
    pub fn with_csrf_token(mut self, token: impl Into<String>) -> Self {
        self.csrf_token = Some(token.into());
        self
    }

    /// Resolves an item link against the page and appends `.json` to its path.
    pub fn labels_endpoint(&self, item_link: &str) -> Result<Url, HostDataError> {
        let mut url = self.page_url.join(item_link)?;
        let path = format!("{}{}", url.path(), JSON_SUFFIX);
        url.set_path(&path);
        Ok(url)
    }

    fn decorate(&self, request: RequestBuilder) -> RequestBuilder {
        let request = request.header(ACCEPT, "application/json");
        match &self.csrf_token {
            Some(token) => request.header(CSRF_HEADER, token),
            None => request,
        }
    }
}

fn check_status(response: Response) -> Result<Response, HostDataError> {
    let status = response.status();
    if status.is_success() {
        Ok(response)
    } else {
        Err(HostDataError::Status {
            status: status.as_u16(),
            url: response.url().to_string(),
        })
    }
}

#[async_trait(?Send)]
impl HostDataProvider for GitlabProvider {
    async fn fetch_labels(&self, item_link: &str) -> Result<IssueLabels, HostDataError> {
        let url = self.labels_endpoint(item_link)?;
        let endpoint = url.to_string();
        debug!("Fetching labels from {}", endpoint);

        let response = self.decorate(self.client.get(url)).send().await?;
        let body = check_status(response)?.text().await?;

        IssueLabels::from_json(&endpoint, &body)
    }

    async fn fetch_descendant_counts(
        &self,
        epic: &EpicRef,
    ) -> Result<DescendantCounts, HostDataError> {
        let endpoint = epic.graphql_endpoint();
        debug!(
            "Fetching descendant weight of {}&{} from {}",
            epic.group_path, epic.epic_iid, endpoint
        );

        let request = self
            .client
            .post(&endpoint)
            .json(&GraphQlRequest::epic_weight(epic));
        let response = self.decorate(request).send().await?;
        let body = check_status(response)?.text().await?;

        let decoded: GraphQlResponse =
            serde_json::from_str(&body).map_err(|e| HostDataError::decode(&endpoint, e))?;
        decoded.into_counts(epic)
    }
}
