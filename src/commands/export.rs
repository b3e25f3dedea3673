use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::TrackerError;
use crate::models::{StatusFilter, TradeDocument};
use crate::state::{AppState, TradeSource};

use super::trades::get_trades;

/// Owner recorded on exported demo trades.
const DEMO_USER: &str = "demo";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    Csv,
    Json,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TradeExport {
    pub trades: Vec<TradeDocument>,
    pub export_date: String,
    pub version: String,
}

async fn export_documents(state: &AppState) -> Result<Vec<TradeDocument>, TrackerError> {
    let trades = get_trades(state, StatusFilter::All).await?;
    let owner = {
        let tracker = state.tracker.lock().await;
        tracker
            .source
            .as_ref()
            .and_then(TradeSource::user_id)
            .unwrap_or(DEMO_USER)
            .to_string()
    };

    Ok(trades
        .iter()
        .map(|t| TradeDocument::from_trade(t, &owner))
        .collect())
}

/// Active trades rendered in `format`.
pub async fn render_export(state: &AppState, format: ExportFormat) -> Result<String, TrackerError> {
    let documents = export_documents(state).await?;

    match format {
        ExportFormat::Json => {
            let export = TradeExport {
                trades: documents,
                export_date: Utc::now().to_rfc3339(),
                version: env!("CARGO_PKG_VERSION").to_string(),
            };
            Ok(serde_json::to_string_pretty(&export)?)
        }
        ExportFormat::Csv => {
            let mut writer = csv::Writer::from_writer(Vec::new());
            for document in &documents {
                writer.serialize(document)?;
            }
            let bytes = writer
                .into_inner()
                .map_err(|e| TrackerError::Storage(e.to_string()))?;
            String::from_utf8(bytes).map_err(|e| TrackerError::Storage(e.to_string()))
        }
    }
}

/// Write the active trades to `path`. Returns the number of trades written.
pub async fn export_trades(
    state: &AppState,
    path: &Path,
    format: ExportFormat,
) -> Result<usize, TrackerError> {
    let rendered = render_export(state, format).await?;
    std::fs::write(path, rendered)?;

    let count = state.tracker.lock().await.store.len();
    log::info!("Exported {} trades to {}", count, path.display());
    Ok(count)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::test_support::demo_state;

    #[tokio::test]
    async fn test_json_export_contains_documents() {
        let (state, _dir) = demo_state();
        let raw = render_export(&state, ExportFormat::Json).await.unwrap();

        let export: TradeExport = serde_json::from_str(&raw).unwrap();
        assert_eq!(export.trades.len(), 3);
        assert_eq!(export.trades[0].user_id, "demo");
        assert!(raw.contains("\"marketCapAtEntryValue\""));
    }

    #[tokio::test]
    async fn test_csv_export_has_header_and_rows() {
        let (state, dir) = demo_state();
        let path = dir.path().join("trades.csv");

        let count = export_trades(&state, &path, ExportFormat::Csv).await.unwrap();
        assert_eq!(count, 3);

        let raw = std::fs::read_to_string(&path).unwrap();
        let mut lines = raw.lines();
        assert!(lines.next().unwrap().starts_with("id,ticker,tokenAddress"));
        assert_eq!(lines.count(), 3);
    }
}
