//! Implements the `ExpenseApi` trait with `reqwest` against the real server.

use crate::api::{
    ExpenseApi, BY_CATEGORY, LOGIN, MONTHLY_TREND, SIGNUP, SUMMARY, TRANSACTIONS,
};
use crate::credentials::CredentialStore;
use crate::error::Res;
use crate::model::{
    AnalyticsSummary, AuthResponse, CategoryBreakdown, LoginRequest, MonthlyTrend,
    NewTransaction, SignupRequest, Transaction, TransactionFilter,
};
use crate::Config;
use anyhow::{bail, Context};
use reqwest::{Method, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use tracing::trace;
use url::Url;

/// Talks to the expense tracker API over HTTP. The bearer token is read from the
/// `CredentialStore` for every request, so a login or logout is picked up immediately.
pub(super) struct HttpApi {
    client: reqwest::Client,
    base: Url,
    credentials: CredentialStore,
}

impl HttpApi {
    pub(super) fn new(config: &Config, credentials: CredentialStore) -> Res<Self> {
        let client = reqwest::Client::builder()
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("Unable to create the HTTP client")?;
        Ok(Self {
            client,
            base: config.api_url().clone(),
            credentials,
        })
    }

    fn endpoint(&self, path: &str) -> Res<Url> {
        self.base
            .join(path)
            .with_context(|| format!("Unable to build the URL for '{path}'"))
    }

    fn list_url(&self, filter: &TransactionFilter) -> Res<Url> {
        let mut url = self.endpoint(TRANSACTIONS)?;
        let query = filter.query_string();
        if !query.is_empty() {
            url.set_query(Some(&query));
        }
        Ok(url)
    }

    /// The URL of a single transaction. The id is percent-encoded as one path segment.
    fn transaction_url(&self, id: &str) -> Res<Url> {
        let mut url = self.endpoint(TRANSACTIONS)?;
        url.path_segments_mut()
            .map_err(|_| anyhow::anyhow!("The API URL cannot have path segments"))?
            .push(id);
        Ok(url)
    }

    /// Starts a request, attaching the bearer token when one is stored.
    async fn request(&self, method: Method, url: Url) -> Res<RequestBuilder> {
        trace!("{method} {url}");
        let builder = self.client.request(method, url);
        Ok(match self.credentials.token().await? {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        })
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> Res<T> {
        let url = self.endpoint(path)?;
        let response = send(self.request(Method::GET, url).await?).await?;
        parse(response).await
    }
}

/// Sends the request and turns any non-2xx status into an error that carries the body.
async fn send(builder: RequestBuilder) -> Res<Response> {
    let response = builder.send().await.context("Failed to send request")?;
    if !response.status().is_success() {
        let status = response.status();
        let url = response.url().clone();
        let body = response
            .text()
            .await
            .unwrap_or_else(|_| "Unable to read response body".to_string());
        bail!("Request to {url} failed with status {status}: {body}");
    }
    Ok(response)
}

async fn parse<T: DeserializeOwned>(response: Response) -> Res<T> {
    let url = response.url().clone();
    response
        .json()
        .await
        .with_context(|| format!("Failed to parse the response from {url}"))
}

#[async_trait::async_trait]
impl ExpenseApi for HttpApi {
    async fn login(&self, email: &str, password: &str) -> Res<AuthResponse> {
        let url = self.endpoint(LOGIN)?;
        let body = LoginRequest { email, password };
        let response = send(self.request(Method::POST, url).await?.json(&body)).await?;
        parse(response).await
    }

    async fn signup(&self, name: &str, email: &str, password: &str) -> Res<AuthResponse> {
        let url = self.endpoint(SIGNUP)?;
        let body = SignupRequest {
            name,
            email,
            password,
        };
        let response = send(self.request(Method::POST, url).await?.json(&body)).await?;
        parse(response).await
    }

    async fn list_transactions(&self, filter: &TransactionFilter) -> Res<Vec<Transaction>> {
        let url = self.list_url(filter)?;
        let response = send(self.request(Method::GET, url).await?).await?;
        parse(response).await
    }

    async fn create_transaction(&self, input: &NewTransaction) -> Res<Transaction> {
        let url = self.endpoint(TRANSACTIONS)?;
        let response = send(self.request(Method::POST, url).await?.json(input)).await?;
        parse(response).await
    }

    async fn delete_transaction(&self, id: &str) -> Res<()> {
        let url = self.transaction_url(id)?;
        let _ = send(self.request(Method::DELETE, url).await?).await?;
        Ok(())
    }

    async fn summary(&self) -> Res<AnalyticsSummary> {
        self.get(SUMMARY).await
    }

    async fn by_category(&self) -> Res<CategoryBreakdown> {
        self.get(BY_CATEGORY).await
    }

    async fn monthly_trend(&self) -> Res<MonthlyTrend> {
        self.get(MONTHLY_TREND).await
    }
}
