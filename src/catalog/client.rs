use reqwest::{Client, Method, RequestBuilder};
use serde::{de::DeserializeOwned, Serialize};
use url::Url;

use super::CatalogError;

const API_KEY_HEADER: &str = "X-Api-Key";

/// Thin JSON client shared by the Radarr and Sonarr v3 APIs.
#[derive(Clone, Debug)]
pub struct ArrClient {
    client: Client,
    base_url: Url,
    api_key: String,
}

impl ArrClient {
    pub fn new(client: Client, base_url: Url, api_key: impl Into<String>) -> Self {
        Self {
            client,
            base_url,
            api_key: api_key.into(),
        }
    }

    fn url(&self, path: &str) -> Result<Url, CatalogError> {
        Ok(self.base_url.join(path.trim_start_matches('/'))?)
    }

    fn request(&self, method: Method, path: &str) -> Result<RequestBuilder, CatalogError> {
        let url = self.url(path)?;
        trace!("{} {}", method, url);
        Ok(self.client.request(method, url).header(API_KEY_HEADER, &self.api_key))
    }

    async fn send(&self, request: RequestBuilder) -> Result<reqwest::Response, CatalogError> {
        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(CatalogError::Status {
                status: status.as_u16(),
                body,
            });
        }
        Ok(response)
    }

    pub async fn get<T, Q>(&self, path: &str, query: &Q) -> Result<T, CatalogError>
    where
        T: DeserializeOwned,
        Q: Serialize + ?Sized,
    {
        let request = self.request(Method::GET, path)?.query(query);
        let bytes = self.send(request).await?.bytes().await?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    pub async fn fetch<T: DeserializeOwned>(&self, path: &str) -> Result<T, CatalogError> {
        self.get(path, &[] as &[(&str, &str)]).await
    }

    pub async fn post<B, T>(&self, path: &str, body: &B) -> Result<T, CatalogError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let request = self.request(Method::POST, path)?.json(body);
        let bytes = self.send(request).await?.bytes().await?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    pub async fn delete<Q>(&self, path: &str, query: &Q) -> Result<(), CatalogError>
    where
        Q: Serialize + ?Sized,
    {
        let request = self.request(Method::DELETE, path)?.query(query);
        self.send(request).await?;
        Ok(())
    }
}
