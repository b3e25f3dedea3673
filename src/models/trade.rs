use chrono::{DateTime, SecondsFormat, SubsecRound, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TradeStatus {
    Open,
    Closed,
}

impl TradeStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TradeStatus::Open => "open",
            TradeStatus::Closed => "closed",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "open" => Some(TradeStatus::Open),
            "closed" => Some(TradeStatus::Closed),
            _ => None,
        }
    }

    /// Closed iff a usable exit market cap is present.
    pub fn derive(exit_market_cap: Option<f64>) -> Self {
        match exit_market_cap {
            Some(exit) if exit.is_finite() && exit > 0.0 => TradeStatus::Closed,
            _ => TradeStatus::Open,
        }
    }
}

impl fmt::Display for TradeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trade {
    pub id: String,
    pub ticker: String,
    pub token_address: Option<String>,

    pub entry_market_cap: f64,
    pub exit_market_cap: Option<f64>,

    pub size: f64,      // SOL
    pub sol_price: f64, // USD per SOL at entry

    pub status: TradeStatus,
    pub entry_date: DateTime<Utc>,
    pub exit_date: Option<DateTime<Utc>>,
    pub note: String,

    pub last_known_market_cap: Option<f64>,
    pub last_update_time: Option<DateTime<Utc>>,
}

impl Trade {
    pub fn is_open(&self) -> bool {
        self.status == TradeStatus::Open
    }

    pub fn is_closed(&self) -> bool {
        self.status == TradeStatus::Closed
    }

    /// Position value in USD at entry.
    pub fn entry_usd(&self) -> f64 {
        self.size * self.sol_price
    }
}

/// A validated trade ready to be appended to the store.
#[derive(Debug, Clone)]
pub struct NewTrade {
    pub ticker: String,
    pub token_address: Option<String>,
    pub entry_market_cap: f64,
    pub exit_market_cap: Option<f64>,
    pub size: f64,
    pub sol_price: f64,
    pub note: String,
}

/// Raw form input for a new trade. Market caps and size are kept as typed
/// by the user and parsed during submission.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CreateTradeInput {
    pub token_address: String,
    pub ticker: Option<String>,
    pub entry_market_cap: String,
    pub exit_market_cap: Option<String>,
    pub size: String,
    pub sol_price: Option<f64>,
    pub note: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EditTradeInput {
    pub entry_market_cap: String,
    pub exit_market_cap: Option<String>,
    pub size: String,
    pub note: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StatusFilter {
    #[default]
    All,
    Open,
    Closed,
}

impl StatusFilter {
    pub fn matches(&self, trade: &Trade) -> bool {
        match self {
            StatusFilter::All => true,
            StatusFilter::Open => trade.is_open(),
            StatusFilter::Closed => trade.is_closed(),
        }
    }
}

/// Cached unrealized P/L for an open trade.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnrealizedPnLEntry {
    pub trade_id: String,
    pub current_market_cap: f64,
    pub pnl_percentage: f64,
    pub pnl_usd: f64,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TokenMetadata {
    pub address: String,
    pub name: String,
    pub symbol: String,
    pub supply: u64,
    pub decimals: u32,
    pub token_type: String,
}

impl TokenMetadata {
    /// Placeholder used when the provider knows nothing about a valid address.
    pub fn placeholder(address: &str) -> Self {
        let short = shorten_address(address);
        Self {
            address: address.to_string(),
            name: short.clone(),
            symbol: short,
            supply: 0,
            decimals: 0,
            token_type: "Unknown".to_string(),
        }
    }
}

/// `ABCD...WXYZ`
pub fn shorten_address(address: &str) -> String {
    let chars: Vec<char> = address.chars().collect();
    if chars.len() <= 8 {
        return address.to_string();
    }
    let head: String = chars[..4].iter().collect();
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("{}...{}", head, tail)
}

/// Trade document as stored in the remote collection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TradeDocument {
    pub id: String,
    pub ticker: String,
    pub token_address: Option<String>,
    pub size: f64,
    pub sol_price: f64,
    pub market_cap_at_entry_value: f64,
    pub exit_market_cap: Option<f64>,
    pub status: String,
    pub entry_date: String,
    pub exit_date: Option<String>,
    pub note: String,
    pub user_id: String,
    pub last_known_market_cap: Option<f64>,
    pub last_update_time: Option<String>,
}

impl TradeDocument {
    pub fn from_trade(trade: &Trade, user_id: &str) -> Self {
        Self {
            id: trade.id.clone(),
            ticker: trade.ticker.clone(),
            token_address: trade.token_address.clone(),
            size: trade.size,
            sol_price: trade.sol_price,
            market_cap_at_entry_value: trade.entry_market_cap,
            exit_market_cap: trade.exit_market_cap,
            status: trade.status.as_str().to_string(),
            entry_date: to_iso(&trade.entry_date),
            exit_date: trade.exit_date.as_ref().map(to_iso),
            note: trade.note.clone(),
            user_id: user_id.to_string(),
            last_known_market_cap: trade.last_known_market_cap,
            last_update_time: trade.last_update_time.as_ref().map(to_iso),
        }
    }

    pub fn into_trade(self) -> Result<Trade, String> {
        let stored = TradeStatus::parse(&self.status)
            .ok_or_else(|| format!("Invalid status '{}' on trade {}", self.status, self.id))?;

        // The exit market cap decides the status.
        let status = TradeStatus::derive(self.exit_market_cap);
        if status != stored {
            log::warn!(
                "Trade {} stored as {} but exit market cap says {}",
                self.id,
                stored,
                status
            );
        }
        let exit_date = match status {
            TradeStatus::Closed => self.exit_date.as_deref().map(from_iso).transpose()?,
            TradeStatus::Open => None,
        };

        Ok(Trade {
            ticker: self.ticker,
            token_address: self.token_address,
            entry_market_cap: self.market_cap_at_entry_value,
            exit_market_cap: self.exit_market_cap.filter(|_| status == TradeStatus::Closed),
            size: self.size,
            sol_price: self.sol_price,
            status,
            entry_date: from_iso(&self.entry_date)?,
            exit_date,
            note: self.note,
            last_known_market_cap: self.last_known_market_cap,
            last_update_time: self.last_update_time.as_deref().map(from_iso).transpose()?,
            id: self.id,
        })
    }
}

/// Current time at the millisecond precision documents store.
pub fn now_millis() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(3)
}

pub fn to_iso(date: &DateTime<Utc>) -> String {
    date.to_rfc3339_opts(SecondsFormat::Millis, true)
}

pub fn from_iso(value: &str) -> Result<DateTime<Utc>, String> {
    DateTime::parse_from_rfc3339(value)
        .map(|d| d.with_timezone(&Utc))
        .map_err(|e| format!("Invalid date '{}': {}", value, e))
}
