use anyhow::{Context, Result};
use reqwest::{Client, StatusCode};

pub struct ApiClient {
    client: Client,
    base_url: String,
}

/// Status and body of a producer request.
#[derive(Debug, Clone)]
pub struct ApiResponse {
    pub status: StatusCode,
    pub body: String,
}

impl ApiClient {
    pub fn new(client: Client, base_url: String) -> Self {
        Self { client, base_url }
    }

    pub async fn health(&self) -> Result<()> {
        let url = format!("{}/health", self.base_url);

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .context("Failed to reach health endpoint")?;

        if !response.status().is_success() {
            anyhow::bail!("Health check failed: {}", response.status());
        }

        Ok(())
    }

    pub async fn send_fragment(&self, fragment: &str) -> Result<ApiResponse> {
        self.post_form("send", &[("fragment", fragment)])
            .await
            .context("Failed to send fragment")
    }

    pub async fn scan(&self, ids: &str) -> Result<ApiResponse> {
        self.post_form("scans", &[("ids", ids)])
            .await
            .context("Failed to submit scan")
    }

    async fn post_form(&self, path: &str, form: &[(&str, &str)]) -> Result<ApiResponse> {
        let url = format!("{}/{}", self.base_url, path);

        let response = self.client.post(&url).form(form).send().await?;
        let status = response.status();
        let body = response
            .text()
            .await
            .unwrap_or_else(|_| "Unable to read response body".to_string());

        Ok(ApiResponse { status, body })
    }
}
