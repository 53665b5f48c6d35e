//! HTTP client that simulates how a chat frontend talks to the relay

use reqwest::Client;

use crate::types::RelayResponse;

/// Build an HTTP client
pub fn build_client() -> Client {
    reqwest::Client::builder()
        .timeout(std::time::Duration::from_secs(30))
        .build()
        .expect("Failed to build reqwest client")
}

/// POST a JSON chat request to the relay
pub async fn send_chat(client: &Client, relay_addr: &str, request_body: serde_json::Value) -> anyhow::Result<RelayResponse> {
    send_raw(client, relay_addr, request_body.to_string()).await
}

/// POST an arbitrary body to the relay's /chat endpoint
pub async fn send_raw(client: &Client, relay_addr: &str, body: String) -> anyhow::Result<RelayResponse> {
    let url = format!("http://{relay_addr}/chat");

    let resp = client
        .post(&url)
        .header("Content-Type", "application/json")
        .body(body)
        .send()
        .await
        .map_err(|e| anyhow::anyhow!("Failed to send request to relay: {}", e))?;

    let status = resp.status().as_u16();
    let headers = resp.headers().clone();
    let body_text = resp
        .text()
        .await
        .map_err(|e| anyhow::anyhow!("Failed to read relay response: {}", e))?;

    let body: serde_json::Value = serde_json::from_str(&body_text).map_err(|e| {
        anyhow::anyhow!(
            "Relay response is not valid JSON: {}: {}",
            e,
            &body_text[..body_text.len().min(500)]
        )
    })?;

    Ok(RelayResponse { status, headers, body })
}

/// Send a CORS preflight to the relay
pub async fn send_preflight(client: &Client, relay_addr: &str) -> anyhow::Result<RelayResponse> {
    let url = format!("http://{relay_addr}/chat");

    let resp = client
        .request(reqwest::Method::OPTIONS, &url)
        .header("Origin", "http://frontend.example")
        .header("Access-Control-Request-Method", "POST")
        .send()
        .await
        .map_err(|e| anyhow::anyhow!("Failed to send OPTIONS to relay: {}", e))?;

    Ok(RelayResponse {
        status: resp.status().as_u16(),
        headers: resp.headers().clone(),
        body: serde_json::Value::Null,
    })
}

/// GET /health; returns the status code and plain-text body
pub async fn send_health(client: &Client, relay_addr: &str) -> anyhow::Result<(u16, String)> {
    let url = format!("http://{relay_addr}/health");

    let resp = client
        .get(&url)
        .send()
        .await
        .map_err(|e| anyhow::anyhow!("Failed to reach relay health endpoint: {}", e))?;

    let status = resp.status().as_u16();
    let body = resp.text().await.unwrap_or_default();
    Ok((status, body))
}
