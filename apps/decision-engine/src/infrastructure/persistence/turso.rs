//! SQLite-backed ledger using turso.
//!
//! One cycle row plus its trade rows per append, written inside a single
//! transaction so the ledger never holds a cycle without its trades.

use async_trait::async_trait;
use turso::{Builder, Database};

use crate::application::ports::{LedgerError, LedgerPort};
use crate::models::CycleRecord;

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS cycles (
    id         TEXT PRIMARY KEY,
    timestamp  TEXT NOT NULL,
    prompt     TEXT NOT NULL,
    rationale  TEXT NOT NULL,
    reasoning  TEXT NOT NULL
);
CREATE TABLE IF NOT EXISTS trades (
    id              TEXT PRIMARY KEY,
    cycle_id        TEXT NOT NULL REFERENCES cycles(id),
    seq             INTEGER NOT NULL,
    instrument      TEXT NOT NULL,
    operation       TEXT NOT NULL,
    price           TEXT NOT NULL,
    amount          TEXT NOT NULL,
    leverage        INTEGER NOT NULL,
    stop_loss_pct   TEXT,
    take_profit_pct TEXT,
    prediction      TEXT NOT NULL,
    reason          TEXT
);
CREATE INDEX IF NOT EXISTS idx_trades_cycle ON trades(cycle_id);
";

/// [`LedgerPort`] adapter over a local SQLite file.
pub struct TursoLedger {
    db: Database,
}

impl TursoLedger {
    /// Open (or create) the ledger database at `path` and ensure the
    /// schema exists.
    pub async fn open(path: &str) -> Result<Self, LedgerError> {
        let db = Builder::new_local(path)
            .build()
            .await
            .map_err(write_failed)?;
        let conn = db.connect().map_err(write_failed)?;
        for statement in SCHEMA.split(';').filter(|s| !s.trim().is_empty()) {
            conn.execute(statement, ()).await.map_err(write_failed)?;
        }
        Ok(Self { db })
    }
}

#[async_trait]
impl LedgerPort for TursoLedger {
    async fn append(&self, record: &CycleRecord) -> Result<(), LedgerError> {
        let conn = self.db.connect().map_err(write_failed)?;

        conn.execute("BEGIN", ()).await.map_err(write_failed)?;
        let result = insert_cycle(&conn, record).await;
        match result {
            Ok(()) => conn.execute("COMMIT", ()).await.map_err(write_failed)?,
            Err(e) => {
                // Best-effort rollback; the original error is what matters.
                let _ = conn.execute("ROLLBACK", ()).await;
                return Err(e);
            }
        };
        Ok(())
    }
}

async fn insert_cycle(
    conn: &turso::Connection,
    record: &CycleRecord,
) -> Result<(), LedgerError> {
    conn.execute(
        "INSERT INTO cycles (id, timestamp, prompt, rationale, reasoning)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        (
            record.id.clone(),
            record.timestamp.to_rfc3339(),
            record.prompt.clone(),
            record.rationale.clone(),
            record.reasoning.clone(),
        ),
    )
    .await
    .map_err(write_failed)?;

    for (seq, trade) in record.trades.iter().enumerate() {
        let prediction = serde_json::to_string(&trade.prediction).map_err(write_failed)?;
        conn.execute(
            "INSERT INTO trades (id, cycle_id, seq, instrument, operation, price, amount,
                                 leverage, stop_loss_pct, take_profit_pct, prediction, reason)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
            (
                trade.id.clone(),
                record.id.clone(),
                seq as i64,
                trade.instrument.ticker().to_string(),
                trade.operation.to_string(),
                trade.price.to_string(),
                trade.amount.to_string(),
                i64::from(trade.leverage),
                trade.stop_loss_pct.map(|d| d.to_string()),
                trade.take_profit_pct.map(|d| d.to_string()),
                prediction,
                trade.reason.clone(),
            ),
        )
        .await
        .map_err(write_failed)?;
    }
    Ok(())
}

fn write_failed(error: impl std::fmt::Display) -> LedgerError {
    LedgerError::WriteFailed {
        message: error.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::decision::{TrendDirection, TrendPrediction};
    use crate::models::{Instrument, OperationKind, TradeRecord};
    use chrono::Utc;
    use rust_decimal_macros::dec;

    fn trade(id: &str) -> TradeRecord {
        TradeRecord {
            id: id.to_string(),
            instrument: Instrument::Btc,
            operation: OperationKind::Buy,
            price: dec!(50000),
            amount: dec!(0.1),
            leverage: 10,
            stop_loss_pct: Some(dec!(5)),
            take_profit_pct: None,
            prediction: TrendPrediction {
                direction: TrendDirection::Up,
                confidence: dec!(0.8),
                support: dec!(48000),
                resistance: dec!(52000),
                analysis: "breakout".to_string(),
            },
            reason: None,
        }
    }

    fn cycle(id: &str, trades: Vec<TradeRecord>) -> CycleRecord {
        CycleRecord {
            id: id.to_string(),
            timestamp: Utc::now(),
            prompt: "prompt".to_string(),
            rationale: "rationale".to_string(),
            reasoning: "reasoning".to_string(),
            trades,
        }
    }

    async fn count(conn: &turso::Connection, sql: &str) -> i64 {
        let mut rows = conn.query(sql, ()).await.unwrap();
        let row = rows.next().await.unwrap().unwrap();
        match row.get_value(0).unwrap() {
            turso::Value::Integer(n) => n,
            other => panic!("expected integer count, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn append_persists_cycle_and_trades() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ledger.db");
        let ledger = TursoLedger::open(path.to_str().unwrap()).await.unwrap();

        ledger
            .append(&cycle("c1", vec![trade("t1"), trade("t2")]))
            .await
            .unwrap();

        let conn = ledger.db.connect().unwrap();
        assert_eq!(count(&conn, "SELECT COUNT(*) FROM cycles").await, 1);
        assert_eq!(count(&conn, "SELECT COUNT(*) FROM trades").await, 2);
    }

    #[tokio::test]
    async fn duplicate_cycle_id_rolls_back_whole_append() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ledger.db");
        let ledger = TursoLedger::open(path.to_str().unwrap()).await.unwrap();

        ledger.append(&cycle("c1", vec![])).await.unwrap();
        let err = ledger
            .append(&cycle("c1", vec![trade("t1")]))
            .await
            .unwrap_err();
        assert!(matches!(err, LedgerError::WriteFailed { .. }));

        // The failed append left no orphaned trade rows behind.
        let conn = ledger.db.connect().unwrap();
        assert_eq!(count(&conn, "SELECT COUNT(*) FROM trades").await, 0);
    }

    #[tokio::test]
    async fn reopen_keeps_existing_rows() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ledger.db");

        {
            let ledger = TursoLedger::open(path.to_str().unwrap()).await.unwrap();
            ledger.append(&cycle("c1", vec![trade("t1")])).await.unwrap();
        }

        let ledger = TursoLedger::open(path.to_str().unwrap()).await.unwrap();
        let conn = ledger.db.connect().unwrap();
        assert_eq!(count(&conn, "SELECT COUNT(*) FROM cycles").await, 1);
    }
}
