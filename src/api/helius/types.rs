use serde::{Deserialize, Serialize};

pub const JSONRPC_VERSION: &str = "2.0";
pub const REQUEST_ID: &str = "trades-tracker";

#[derive(Debug, Serialize)]
pub struct RpcRequest<'a, P> {
    pub jsonrpc: &'static str,
    pub id: &'static str,
    pub method: &'a str,
    pub params: P,
}

#[derive(Debug, Serialize)]
pub struct GetAssetParams<'a> {
    pub id: &'a str,
}

#[derive(Debug, Deserialize)]
pub struct RpcResponse<T> {
    pub result: Option<T>,
    pub error: Option<RpcErrorBody>,
}

#[derive(Debug, Deserialize)]
pub struct RpcErrorBody {
    pub code: i64,
    pub message: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Asset {
    pub id: Option<String>,
    pub content: Option<AssetContent>,
    pub token_info: Option<TokenInfo>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AssetContent {
    pub metadata: Option<AssetMetadata>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AssetMetadata {
    pub name: Option<String>,
    pub symbol: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TokenInfo {
    pub symbol: Option<String>,
    pub supply: Option<u64>,
    pub decimals: Option<u32>,
    pub token_program: Option<String>,
    pub price_info: Option<PriceInfo>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PriceInfo {
    pub price_per_token: Option<f64>,
    pub currency: Option<String>,
}
