use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tokio::sync::broadcast;

use crate::db::Database;
use crate::error::TrackerError;
use crate::models::{to_iso, Trade, TradeDocument};
use crate::store::{CollectionChange, TradeRepository};

const CHANGE_CHANNEL_CAPACITY: usize = 64;

const SELECT_COLUMNS: &str = "SELECT id, ticker, token_address, size, sol_price,
        market_cap_at_entry_value, exit_market_cap, status, entry_date, exit_date,
        note, user_id, last_known_market_cap, last_update_time
    FROM trade_documents";

fn map_row_to_document(row: &rusqlite::Row) -> rusqlite::Result<TradeDocument> {
    Ok(TradeDocument {
        id: row.get(0)?,
        ticker: row.get(1)?,
        token_address: row.get(2)?,
        size: row.get(3)?,
        sol_price: row.get(4)?,
        market_cap_at_entry_value: row.get(5)?,
        exit_market_cap: row.get(6)?,
        status: row.get(7)?,
        entry_date: row.get(8)?,
        exit_date: row.get(9)?,
        note: row.get(10)?,
        user_id: row.get(11)?,
        last_known_market_cap: row.get(12)?,
        last_update_time: row.get(13)?,
    })
}

/// Trade collection stored as documents in SQLite, one partition per user.
pub struct SqliteTradeRepository {
    db: Arc<Database>,
    changes: broadcast::Sender<CollectionChange>,
}

impl SqliteTradeRepository {
    pub fn new(db: Arc<Database>) -> Self {
        let (changes, _) = broadcast::channel(CHANGE_CHANNEL_CAPACITY);
        Self { db, changes }
    }

    pub fn get(&self, user_id: &str, id: &str) -> Result<Option<Trade>, TrackerError> {
        let conn = self.db.conn.lock().map_err(|e| TrackerError::Database(e.to_string()))?;

        let mut stmt = conn.prepare(&format!("{} WHERE user_id = ? AND id = ?", SELECT_COLUMNS))?;
        let mut rows = stmt.query_map([user_id, id], map_row_to_document)?;

        match rows.next() {
            Some(doc) => Ok(Some(doc?.into_trade().map_err(TrackerError::Remote)?)),
            None => Ok(None),
        }
    }

    fn notify(&self, user_id: &str, trade_id: Option<&str>) {
        // No receivers is fine; nobody is listening outside the shell.
        let _ = self.changes.send(CollectionChange {
            user_id: user_id.to_string(),
            trade_id: trade_id.map(str::to_string),
        });
    }
}

#[async_trait]
impl TradeRepository for SqliteTradeRepository {
    async fn list(&self, user_id: &str) -> Result<Vec<Trade>, TrackerError> {
        let conn = self.db.conn.lock().map_err(|e| TrackerError::Database(e.to_string()))?;

        let mut stmt = conn.prepare(&format!(
            "{} WHERE user_id = ? ORDER BY entry_date ASC, rowid ASC",
            SELECT_COLUMNS
        ))?;
        let documents = stmt
            .query_map([user_id], map_row_to_document)?
            .collect::<Result<Vec<_>, _>>()?;

        documents
            .into_iter()
            .map(|doc| doc.into_trade().map_err(TrackerError::Remote))
            .collect()
    }

    async fn upsert(&self, user_id: &str, trade: &Trade) -> Result<(), TrackerError> {
        {
            let conn = self.db.conn.lock().map_err(|e| TrackerError::Database(e.to_string()))?;
            let doc = TradeDocument::from_trade(trade, user_id);
            let now = Utc::now().timestamp();

            let updated = conn.execute(
                "INSERT INTO trade_documents (
                    id, user_id, ticker, token_address, size, sol_price,
                    market_cap_at_entry_value, exit_market_cap, status, entry_date, exit_date,
                    note, last_known_market_cap, last_update_time, created_at, updated_at
                ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
                ON CONFLICT(id) DO UPDATE SET
                    ticker = excluded.ticker,
                    token_address = excluded.token_address,
                    size = excluded.size,
                    sol_price = excluded.sol_price,
                    market_cap_at_entry_value = excluded.market_cap_at_entry_value,
                    exit_market_cap = excluded.exit_market_cap,
                    status = excluded.status,
                    entry_date = excluded.entry_date,
                    exit_date = excluded.exit_date,
                    note = excluded.note,
                    last_known_market_cap = excluded.last_known_market_cap,
                    last_update_time = excluded.last_update_time,
                    updated_at = excluded.updated_at
                WHERE trade_documents.user_id = excluded.user_id",
                rusqlite::params![
                    doc.id, doc.user_id, doc.ticker, doc.token_address, doc.size, doc.sol_price,
                    doc.market_cap_at_entry_value, doc.exit_market_cap, doc.status, doc.entry_date,
                    doc.exit_date, doc.note, doc.last_known_market_cap, doc.last_update_time,
                    now, now
                ],
            )?;

            if updated == 0 {
                return Err(TrackerError::Remote(format!(
                    "Trade {} belongs to another user",
                    trade.id
                )));
            }
        }

        self.notify(user_id, Some(&trade.id));
        Ok(())
    }

    async fn delete(&self, user_id: &str, id: &str) -> Result<(), TrackerError> {
        {
            let conn = self.db.conn.lock().map_err(|e| TrackerError::Database(e.to_string()))?;
            conn.execute(
                "DELETE FROM trade_documents WHERE user_id = ? AND id = ?",
                [user_id, id],
            )?;
        }

        self.notify(user_id, Some(id));
        Ok(())
    }

    async fn update_market_snapshot(
        &self,
        user_id: &str,
        id: &str,
        market_cap: f64,
        at: DateTime<Utc>,
    ) -> Result<(), TrackerError> {
        {
            let conn = self.db.conn.lock().map_err(|e| TrackerError::Database(e.to_string()))?;
            conn.execute(
                "UPDATE trade_documents
                 SET last_known_market_cap = ?, last_update_time = ?, updated_at = ?
                 WHERE user_id = ? AND id = ?",
                rusqlite::params![market_cap, to_iso(&at), Utc::now().timestamp(), user_id, id],
            )?;
        }

        self.notify(user_id, Some(id));
        Ok(())
    }

    fn subscribe(&self) -> broadcast::Receiver<CollectionChange> {
        self.changes.subscribe()
    }
}
