use super::types::Asset;
use crate::models::TokenMetadata;

fn non_empty(value: Option<&String>) -> Option<String> {
    value.filter(|s| !s.trim().is_empty()).cloned()
}

/// Map a `getAsset` result to token metadata.
///
/// Assets without a content block get placeholder metadata.
pub fn map_asset_to_metadata(address: &str, asset: &Asset) -> TokenMetadata {
    let Some(content) = asset.content.as_ref() else {
        return TokenMetadata::placeholder(address);
    };

    let metadata = content.metadata.as_ref();
    let token_info = asset.token_info.as_ref();

    let symbol = non_empty(metadata.and_then(|m| m.symbol.as_ref()))
        .or_else(|| non_empty(token_info.and_then(|t| t.symbol.as_ref())))
        .unwrap_or_else(|| "Unknown".to_string());
    let name = non_empty(metadata.and_then(|m| m.name.as_ref()))
        .unwrap_or_else(|| "Unknown".to_string());

    TokenMetadata {
        address: address.to_string(),
        name,
        symbol,
        supply: token_info.and_then(|t| t.supply).unwrap_or(0),
        decimals: token_info.and_then(|t| t.decimals).unwrap_or(0),
        token_type: token_info
            .and_then(|t| t.token_program.clone())
            .unwrap_or_else(|| "Unknown".to_string()),
    }
}

/// USD price per token, if the provider priced it.
pub fn price_per_token(asset: &Asset) -> Option<f64> {
    asset
        .token_info
        .as_ref()?
        .price_info
        .as_ref()?
        .price_per_token
        .filter(|p| p.is_finite() && *p > 0.0)
}

/// `supply / 10^decimals * price_per_token`
pub fn market_cap(asset: &Asset) -> Option<f64> {
    let token_info = asset.token_info.as_ref()?;
    let supply = token_info.supply?;
    let decimals = token_info.decimals?;
    let price = price_per_token(asset)?;

    let circulating = supply as f64 / 10f64.powi(decimals as i32);
    Some(circulating * price)
}
