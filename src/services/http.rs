use serde::de::DeserializeOwned;

pub fn build_client(timeout: std::time::Duration) -> anyhow::Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|e| anyhow::anyhow!("failed to build reqwest client: {e}"))
}

/// Reads a JSON body, turning non-2xx responses into the API's own error message.
pub async fn read_json<T: DeserializeOwned>(
    response: reqwest::Response,
    api: &str,
) -> anyhow::Result<T> {
    let status = response.status();
    let body = response.text().await?;

    if !status.is_success() {
        tracing::debug!(api, %status, "remote call rejected");
        anyhow::bail!("{}", api_error_message(&body));
    }

    serde_json::from_str(&body)
        .map_err(|e| anyhow::anyhow!("failed to parse {api} response: {e}\nraw: {body}"))
}

/// Google APIs wrap failures as `{"error": {"message": ...}}`; anything else is
/// passed through as-is.
pub fn api_error_message(body: &str) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|json| {
            json.get("error")
                .and_then(|e| e.get("message"))
                .and_then(serde_json::Value::as_str)
                .map(ToString::to_string)
        })
        .unwrap_or_else(|| body.trim().to_string())
}

/// Token for the next page; absent and empty tokens both end the listing.
pub fn continuation(next_page_token: Option<String>) -> Option<String> {
    next_page_token.filter(|t| !t.is_empty())
}
