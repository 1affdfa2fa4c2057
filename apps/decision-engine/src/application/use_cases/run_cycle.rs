//! Run Cycle Use Case
//!
//! Drives one full decision cycle:
//! snapshot fan-out → prompt build → oracle invoke (with timeout) → daily
//! loss gate → sequential per-decision processing with running-balance
//! tracking → atomic ledger write.
//!
//! Failure semantics follow the error taxonomy in [`crate::error`]: only
//! oracle and ledger failures (and a fully-failed snapshot step) propagate;
//! risk denials and execution failures are absorbed into trade records.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::application::ports::{
    AccountPort, ExecutionPort, LedgerPort, MarketDataPort, OracleError, OraclePort,
};
use crate::application::services::build_prompt;
use crate::error::CycleError;
use crate::models::{
    AccountState, CycleRecord, Decision, HoldParams, Instrument, MarketSnapshot, Operation,
    OracleProposal, TradeRecord, TradeRecordBuilder,
};
use crate::risk::{RiskLimits, check_buy_risk, check_daily_loss_limit};

/// Placeholder persisted when no decision carried a rationale.
const NO_RATIONALE: &str = "(no rationale provided)";
/// Placeholder persisted when the oracle gave no free-form reasoning.
const NO_REASONING: &str = "(no reasoning provided)";

/// The orchestrator: one instance drives one cycle at a time.
pub struct RunCycleUseCase<M, A, O, E, L>
where
    M: MarketDataPort,
    A: AccountPort,
    O: OraclePort,
    E: ExecutionPort,
    L: LedgerPort,
{
    market_data: Arc<M>,
    account: Arc<A>,
    oracle: Arc<O>,
    execution: Arc<E>,
    ledger: Arc<L>,
    instruments: Vec<Instrument>,
    limits: RiskLimits,
    oracle_timeout: Duration,
}

impl<M, A, O, E, L> RunCycleUseCase<M, A, O, E, L>
where
    M: MarketDataPort,
    A: AccountPort,
    O: OraclePort,
    E: ExecutionPort,
    L: LedgerPort,
{
    /// Create a new use case over the given ports.
    pub fn new(
        market_data: Arc<M>,
        account: Arc<A>,
        oracle: Arc<O>,
        execution: Arc<E>,
        ledger: Arc<L>,
        instruments: Vec<Instrument>,
        limits: RiskLimits,
        oracle_timeout: Duration,
    ) -> Self {
        Self {
            market_data,
            account,
            oracle,
            execution,
            ledger,
            instruments,
            limits,
            oracle_timeout,
        }
    }

    /// Run one full cycle.
    ///
    /// `capital_override` replaces the account's reported equity as the
    /// capital base for risk sizing (simulated/backtest capital).
    ///
    /// Returns the persisted [`CycleRecord`] on success.
    pub async fn execute(
        &self,
        capital_override: Option<Decimal>,
    ) -> Result<CycleRecord, CycleError> {
        let cycle_id = Uuid::new_v4().to_string();
        tracing::info!(cycle_id = %cycle_id, "Cycle started");

        // 1. Snapshot fan-out: per-instrument failures shrink the cycle.
        let snapshots = self.collect_snapshots().await;
        if snapshots.is_empty() {
            tracing::error!(cycle_id = %cycle_id, "All snapshot fetches failed, aborting cycle");
            return Err(CycleError::NoMarketData);
        }

        // 2. Account snapshot, read once. Not re-fetched mid-cycle.
        let account = self.account.get_account_state(capital_override).await?;
        let initial_capital = capital_override.unwrap_or(account.total_equity);

        // 3. Build the prompt and invoke the oracle, exactly once, under a
        //    hard timeout. Timeout or schema rejection is cycle-fatal.
        let prompt = build_prompt(&snapshots, &account, &self.limits);
        let proposal = self.invoke_oracle(&prompt).await?;
        tracing::info!(
            cycle_id = %cycle_id,
            decisions = proposal.decisions.len(),
            "Oracle proposal received"
        );

        // 4. Daily loss gate: a breach blocks all Buy/Sell activity for the
        //    cycle but the decision trail is still persisted.
        let gate = check_daily_loss_limit(account.unrealized_pnl(), initial_capital, &self.limits);
        let trades = if let Some(reason) = gate.reason() {
            tracing::warn!(cycle_id = %cycle_id, reason, "Daily loss limit breached, forcing HOLD");
            proposal
                .decisions
                .iter()
                .map(|d| force_hold(d, reason))
                .collect()
        } else {
            // 5. Sequential processing. The running balance is threaded as
            //    an explicit accumulator: each Buy is checked against the
            //    already-decremented balance, never the stale cycle-start
            //    value.
            self.process_decisions(&proposal, &account, initial_capital)
                .await
        };

        for trade in &trades {
            tracing::info!(
                cycle_id = %cycle_id,
                instrument = %trade.instrument,
                operation = %trade.operation,
                price = %trade.price,
                amount = %trade.amount,
                reason = trade.reason.as_deref().unwrap_or("-"),
                "Trade recorded"
            );
        }

        // 6. Atomic ledger write. Failure here is fatal to the caller.
        let record = build_cycle_record(cycle_id, prompt, &proposal, trades);
        self.ledger.append(&record).await?;
        tracing::info!(cycle_id = %record.id, trades = record.trades.len(), "Cycle complete");
        Ok(record)
    }

    /// Fan out one snapshot fetch per instrument, in parallel. Each fetch
    /// is independently fallible; failures are logged and excluded.
    async fn collect_snapshots(&self) -> Vec<MarketSnapshot> {
        let fetches = self
            .instruments
            .iter()
            .map(|&i| self.market_data.get_snapshot(i));
        futures::future::join_all(fetches)
            .await
            .into_iter()
            .zip(&self.instruments)
            .filter_map(|(result, &instrument)| match result {
                Ok(snapshot) => Some(snapshot),
                Err(e) => {
                    tracing::warn!(%instrument, error = %e, "Snapshot fetch failed, excluding");
                    None
                }
            })
            .collect()
    }

    /// Invoke the oracle once under the configured timeout. An expired
    /// timeout abandons the in-flight request (the adapter carries its own
    /// client-side timeout so no orphaned call outlives the cycle).
    async fn invoke_oracle(&self, prompt: &str) -> Result<OracleProposal, CycleError> {
        match tokio::time::timeout(self.oracle_timeout, self.oracle.propose(prompt)).await {
            Ok(result) => Ok(result?),
            Err(_) => Err(OracleError::Timeout {
                seconds: self.oracle_timeout.as_secs(),
            }
            .into()),
        }
    }

    /// Process decisions strictly sequentially, in input order, threading
    /// the remaining available cash through each step. One decision's
    /// failure never aborts the rest of the batch.
    async fn process_decisions(
        &self,
        proposal: &OracleProposal,
        account: &AccountState,
        total_equity: Decimal,
    ) -> Vec<TradeRecord> {
        let mut remaining = account.available_cash;
        let mut trades = Vec::with_capacity(proposal.decisions.len());

        for decision in &proposal.decisions {
            let (record, new_remaining) = match &decision.operation {
                Operation::Buy(params) => {
                    self.process_buy(decision, params, remaining, total_equity)
                        .await
                }
                Operation::Sell(params) => (self.process_sell(decision, params, account).await, remaining),
                Operation::Hold(params) => (self.process_hold(decision, params).await, remaining),
            };
            remaining = new_remaining;
            trades.push(record);
        }

        trades
    }

    /// Gate and execute a Buy. Returns the record and the updated running
    /// balance (decremented by the *requested* margin on a fill, as the
    /// conservative reservation).
    async fn process_buy(
        &self,
        decision: &Decision,
        params: &crate::models::BuyParams,
        remaining: Decimal,
        total_equity: Decimal,
    ) -> (TradeRecord, Decimal) {
        let builder = TradeRecordBuilder::new(
            decision.instrument,
            decision.operation.kind(),
            decision.prediction.clone(),
        )
        .protective(params.stop_loss_pct, params.take_profit_pct);

        let valid = match params.validated() {
            Ok(valid) => valid,
            Err(reason) => return (builder.blocked(reason).build(), remaining),
        };
        let builder = builder
            .requested(valid.price, valid.amount)
            .leverage(valid.leverage);

        let verdict = check_buy_risk(
            valid.amount,
            valid.price,
            valid.leverage,
            remaining,
            total_equity,
            &self.limits,
        );
        if let Some(reason) = verdict.reason() {
            return (builder.blocked(reason).build(), remaining);
        }

        let fill = self
            .execution
            .buy(
                decision.instrument,
                valid.price,
                valid.amount,
                valid.leverage,
                params.stop_loss_pct,
                params.take_profit_pct,
            )
            .await;

        match fill {
            Ok(fill) => {
                // Reserve the requested margin, not the fill margin. The
                // risk gate already computed this product, so overflow is
                // unreachable here; reserving the whole balance keeps the
                // invariant anyway.
                let reserved = valid.required_margin().unwrap_or(remaining);
                (
                    builder.filled(fill.price, fill.amount).build(),
                    remaining - reserved,
                )
            }
            Err(e) => (builder.failed(e.to_string()).build(), remaining),
        }
    }

    /// Execute a Sell. A "no open position" failure is expected and
    /// non-fatal; the outcome is recorded either way.
    async fn process_sell(
        &self,
        decision: &Decision,
        params: &crate::models::SellParams,
        account: &AccountState,
    ) -> TradeRecord {
        let position = account.position(decision.instrument);
        let builder = TradeRecordBuilder::new(
            decision.instrument,
            decision.operation.kind(),
            decision.prediction.clone(),
        )
        .leverage(position.map_or(0, |p| p.leverage));

        let percentage = match params.percentage {
            Some(p) => p,
            None => {
                return builder
                    .blocked("Sell is missing required field: percentage")
                    .build();
            }
        };

        match self.execution.sell(decision.instrument, percentage).await {
            Ok(fill) => builder.filled(fill.price, fill.amount).build(),
            Err(e) => builder.failed(e.to_string()).build(),
        }
    }

    /// Process a Hold, adjusting protective orders when requested. Holds
    /// never touch capital; gateway outcomes are recorded informationally.
    async fn process_hold(&self, decision: &Decision, params: &HoldParams) -> TradeRecord {
        let builder = TradeRecordBuilder::new(
            decision.instrument,
            decision.operation.kind(),
            decision.prediction.clone(),
        )
        .protective(params.stop_loss_pct, params.take_profit_pct);

        if params.stop_loss_pct.is_none() && params.take_profit_pct.is_none() {
            return builder.build();
        }

        match self
            .execution
            .set_protective(
                decision.instrument,
                params.stop_loss_pct,
                params.take_profit_pct,
            )
            .await
        {
            Ok(()) => builder.build(),
            Err(e) => builder
                .failed(format!("Protective order adjustment failed: {e}"))
                .build(),
        }
    }
}

/// Downgrade a decision to Hold with the gate's block reason.
fn force_hold(decision: &Decision, reason: &str) -> TradeRecord {
    TradeRecordBuilder::new(
        decision.instrument,
        crate::models::OperationKind::Hold,
        decision.prediction.clone(),
    )
    .blocked(format!("Daily loss limit: {reason}"))
    .build()
}

/// Assemble the cycle record: concatenated rationales (or a placeholder),
/// oracle reasoning (or a placeholder), prompt, and the ordered trades.
fn build_cycle_record(
    cycle_id: String,
    prompt: String,
    proposal: &OracleProposal,
    trades: Vec<TradeRecord>,
) -> CycleRecord {
    let rationales: Vec<&str> = proposal
        .decisions
        .iter()
        .map(|d| d.rationale.trim())
        .filter(|r| !r.is_empty())
        .collect();
    let rationale = if rationales.is_empty() {
        NO_RATIONALE.to_string()
    } else {
        rationales.join("\n\n")
    };
    let reasoning = proposal
        .reasoning
        .clone()
        .filter(|r| !r.trim().is_empty())
        .unwrap_or_else(|| NO_REASONING.to_string());

    CycleRecord {
        id: cycle_id,
        timestamp: Utc::now(),
        prompt,
        rationale,
        reasoning,
        trades,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::decision::{TrendDirection, TrendPrediction};

    fn prediction() -> TrendPrediction {
        TrendPrediction {
            direction: TrendDirection::Sideways,
            confidence: Decimal::new(5, 1),
            support: Decimal::ZERO,
            resistance: Decimal::ZERO,
            analysis: String::new(),
        }
    }

    fn hold_decision(rationale: &str) -> Decision {
        Decision {
            instrument: Instrument::Btc,
            operation: Operation::Hold(HoldParams::default()),
            prediction: prediction(),
            rationale: rationale.to_string(),
        }
    }

    #[test]
    fn cycle_record_concatenates_rationales() {
        let proposal = OracleProposal {
            decisions: vec![hold_decision("first"), hold_decision("second")],
            reasoning: Some("macro view".to_string()),
        };
        let record = build_cycle_record("c1".to_string(), "p".to_string(), &proposal, vec![]);
        assert_eq!(record.rationale, "first\n\nsecond");
        assert_eq!(record.reasoning, "macro view");
    }

    #[test]
    fn cycle_record_uses_placeholders() {
        let proposal = OracleProposal {
            decisions: vec![hold_decision("  ")],
            reasoning: None,
        };
        let record = build_cycle_record("c1".to_string(), "p".to_string(), &proposal, vec![]);
        assert_eq!(record.rationale, NO_RATIONALE);
        assert_eq!(record.reasoning, NO_REASONING);
    }

    #[test]
    fn force_hold_tags_block_reason() {
        let record = force_hold(&hold_decision("r"), "loss breach");
        assert_eq!(record.operation, crate::models::OperationKind::Hold);
        assert!(record.reason.as_deref().unwrap().contains("loss breach"));
    }
}
