use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;

use crate::api::{
    client::{is_valid_token_address, MarketDataClient, MarketSnapshot, RateLimitConfig},
    error::ApiError,
    rate_limiter::RateLimiter,
};
use crate::models::TokenMetadata;

use super::{
    mapper::{map_asset_to_metadata, market_cap, price_per_token},
    types::{Asset, GetAssetParams, RpcRequest, RpcResponse, JSONRPC_VERSION, REQUEST_ID},
};

pub const DEFAULT_RPC_URL: &str = "https://mainnet.helius-rpc.com";
pub const WRAPPED_SOL_MINT: &str = "So11111111111111111111111111111111111111112";
const GET_ASSET_METHOD: &str = "getAsset";

/// Helius DAS client. Every call goes through the injected rate limiter.
pub struct HeliusClient {
    rpc_url: String,
    api_key: Option<String>,
    http_client: reqwest::Client,
    rate_limiter: Arc<RateLimiter>,
    rate_limit_backoff: Duration,
}

impl HeliusClient {
    pub fn new(
        rpc_url: impl Into<String>,
        api_key: Option<String>,
        rate_limiter: Arc<RateLimiter>,
        config: RateLimitConfig,
    ) -> Self {
        Self {
            rpc_url: rpc_url.into(),
            api_key,
            http_client: reqwest::Client::new(),
            rate_limiter,
            rate_limit_backoff: config.rate_limit_backoff,
        }
    }

    /// `getAsset` for one mint
    async fn get_asset(&self, address: &str) -> Result<Option<Asset>, ApiError> {
        self.rate_limiter.acquire().await;

        let body = RpcRequest {
            jsonrpc: JSONRPC_VERSION,
            id: REQUEST_ID,
            method: GET_ASSET_METHOD,
            params: GetAssetParams { id: address },
        };

        let mut request = self.http_client.post(&self.rpc_url).json(&body);
        if let Some(key) = &self.api_key {
            request = request.query(&[("api-key", key.as_str())]);
        }

        let response = request.send().await?;

        let status = response.status();
        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(ApiError::RateLimitError(format!(
                "{} rate limited getAsset({})",
                self.provider_name(),
                address
            )));
        }
        if !status.is_success() {
            return Err(ApiError::NetworkError(format!("HTTP {} from {}", status, self.provider_name())));
        }

        let parsed: RpcResponse<Asset> = response.json().await?;
        if let Some(error) = parsed.error {
            return Err(ApiError::RpcError {
                code: error.code,
                message: error.message,
            });
        }

        Ok(parsed.result)
    }

    /// Like `get_asset`, but a 429 costs one fixed pause and yields no data.
    async fn get_asset_or_back_off(&self, address: &str) -> Result<Option<Asset>, ApiError> {
        match self.get_asset(address).await {
            Err(ApiError::RateLimitError(message)) => {
                log::warn!("{}; backing off for {:?}", message, self.rate_limit_backoff);
                tokio::time::sleep(self.rate_limit_backoff).await;
                Ok(None)
            }
            other => other,
        }
    }
}

#[async_trait]
impl MarketDataClient for HeliusClient {
    fn provider_name(&self) -> &str {
        "helius"
    }

    async fn fetch_token_metadata(&self, address: &str) -> Result<TokenMetadata, ApiError> {
        let address = address.trim();
        if !is_valid_token_address(address) {
            return Err(ApiError::InvalidAddress(address.to_string()));
        }

        match self.get_asset_or_back_off(address).await {
            Ok(Some(asset)) => Ok(map_asset_to_metadata(address, &asset)),
            Ok(None) => Ok(TokenMetadata::placeholder(address)),
            Err(e) => {
                log::warn!("Token metadata lookup failed for {}: {}", address, e);
                Ok(TokenMetadata::placeholder(address))
            }
        }
    }

    async fn fetch_reference_price(&self) -> Result<Option<f64>, ApiError> {
        let asset = self.get_asset_or_back_off(WRAPPED_SOL_MINT).await?;
        Ok(asset.as_ref().and_then(price_per_token))
    }

    async fn fetch_market_snapshot(&self, address: &str) -> Result<Option<MarketSnapshot>, ApiError> {
        let Some(sol_asset) = self.get_asset_or_back_off(WRAPPED_SOL_MINT).await? else {
            return Ok(None);
        };
        if price_per_token(&sol_asset).is_none() {
            log::debug!("No SOL price in {} response", self.provider_name());
            return Ok(None);
        }

        let Some(asset) = self.get_asset_or_back_off(address).await? else {
            return Ok(None);
        };
        let Some(current_market_cap) = market_cap(&asset) else {
            log::debug!("Incomplete market data for {}", address);
            return Ok(None);
        };

        Ok(Some(MarketSnapshot {
            address: address.to_string(),
            current_market_cap,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Instant;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::{TcpListener, TcpStream};

    const BONK: &str = "DezXAZ8z7PnrnRJjz3wXBoRgixCa6xjnB7YaB1pPB263";
    const SOL_ASSET: &str =
        r#"{"jsonrpc":"2.0","id":"trades-tracker","result":{"token_info":{"price_info":{"price_per_token":150.0}}}}"#;
    const BONK_ASSET: &str = r#"{"jsonrpc":"2.0","id":"trades-tracker","result":{"token_info":{"supply":1000000000,"decimals":3,"price_info":{"price_per_token":0.5}}}}"#;

    fn client_for(rpc_url: &str, backoff: Duration) -> HeliusClient {
        let config = RateLimitConfig {
            min_interval: Duration::from_millis(1),
            rate_limit_backoff: backoff,
        };
        HeliusClient::new(rpc_url, None, Arc::new(RateLimiter::new(&config)), config)
    }

    /// Nothing listens here; requests fail to connect.
    fn unreachable_client() -> HeliusClient {
        client_for("http://127.0.0.1:9", Duration::from_millis(1))
    }

    async fn read_request(stream: &mut TcpStream) {
        let mut buf = Vec::new();
        let mut chunk = [0u8; 1024];
        loop {
            let n = stream.read(&mut chunk).await.unwrap();
            if n == 0 {
                return;
            }
            buf.extend_from_slice(&chunk[..n]);

            let text = String::from_utf8_lossy(&buf);
            if let Some(end) = text.find("\r\n\r\n") {
                let content_length = text[..end]
                    .lines()
                    .find_map(|line| {
                        let (name, value) = line.split_once(':')?;
                        name.eq_ignore_ascii_case("content-length")
                            .then(|| value.trim().parse::<usize>().ok())
                            .flatten()
                    })
                    .unwrap_or(0);
                if buf.len() >= end + 4 + content_length {
                    return;
                }
            }
        }
    }

    /// Serve `responses` in order, repeating the last one. Returns the RPC
    /// URL and a request counter.
    async fn serve(responses: Vec<(u16, &'static str)>) -> (String, Arc<AtomicUsize>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let url = format!("http://{}", listener.local_addr().unwrap());
        let requests = Arc::new(AtomicUsize::new(0));
        let counter = requests.clone();

        tokio::spawn(async move {
            loop {
                let Ok((mut stream, _)) = listener.accept().await else {
                    return;
                };
                read_request(&mut stream).await;
                let index = counter.fetch_add(1, Ordering::SeqCst);
                let (status, body) = responses[index.min(responses.len() - 1)];
                let response = format!(
                    "HTTP/1.1 {} X\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{}",
                    status,
                    body.len(),
                    body
                );
                let _ = stream.write_all(response.as_bytes()).await;
                let _ = stream.shutdown().await;
            }
        });

        (url, requests)
    }

    #[tokio::test]
    async fn test_invalid_address_is_rejected_without_request() {
        let err = unreachable_client().fetch_token_metadata("not-a-mint").await.unwrap_err();
        assert!(matches!(err, ApiError::InvalidAddress(_)));
    }

    #[tokio::test]
    async fn test_unreachable_provider_falls_back_to_placeholder() {
        let meta = unreachable_client().fetch_token_metadata(BONK).await.unwrap();
        assert_eq!(meta, TokenMetadata::placeholder(BONK));
    }

    #[tokio::test]
    async fn test_snapshot_from_reference_and_token_assets() {
        let (url, requests) = serve(vec![(200, SOL_ASSET), (200, BONK_ASSET)]).await;

        let snapshot = client_for(&url, Duration::from_millis(1))
            .fetch_market_snapshot(BONK)
            .await
            .unwrap()
            .unwrap();

        // 10^9 / 10^3 tokens at $0.5
        assert_eq!(snapshot.current_market_cap, 500_000.0);
        assert_eq!(snapshot.address, BONK);
        assert_eq!(requests.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_rate_limited_snapshot_backs_off_once() {
        let (url, requests) = serve(vec![(429, "")]).await;
        let backoff = Duration::from_millis(50);

        let start = Instant::now();
        let snapshot = client_for(&url, backoff).fetch_market_snapshot(BONK).await.unwrap();

        assert!(snapshot.is_none());
        assert!(start.elapsed() >= backoff);
        assert_eq!(requests.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_server_error_is_a_network_error() {
        let (url, requests) = serve(vec![(500, "")]).await;

        let err = client_for(&url, Duration::from_millis(1))
            .fetch_market_snapshot(BONK)
            .await
            .unwrap_err();

        assert!(matches!(err, ApiError::NetworkError(_)));
        assert_eq!(requests.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_rpc_error_body_is_reported() {
        let body = r#"{"jsonrpc":"2.0","id":"trades-tracker","error":{"code":-32603,"message":"internal"}}"#;
        let (url, requests) = serve(vec![(200, body)]).await;

        let err = client_for(&url, Duration::from_millis(1))
            .fetch_market_snapshot(BONK)
            .await
            .unwrap_err();

        match err {
            ApiError::RpcError { code, message } => {
                assert_eq!(code, -32603);
                assert_eq!(message, "internal");
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(requests.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_reference_price_from_wrapped_sol() {
        let (url, _) = serve(vec![(200, SOL_ASSET)]).await;

        let price = client_for(&url, Duration::from_millis(1))
            .fetch_reference_price()
            .await
            .unwrap();
        assert_eq!(price, Some(150.0));
    }

    #[test]
    fn test_request_body_shape() {
        let body = RpcRequest {
            jsonrpc: JSONRPC_VERSION,
            id: REQUEST_ID,
            method: GET_ASSET_METHOD,
            params: GetAssetParams { id: WRAPPED_SOL_MINT },
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["method"], "getAsset");
        assert_eq!(json["params"]["id"], WRAPPED_SOL_MINT);
        assert_eq!(json["jsonrpc"], "2.0");
    }
}
