//! Simulated exchange for paper trading.
//!
//! Implements both [`AccountPort`] and [`ExecutionPort`] over in-memory
//! state. Buys fill at the requested reference price, sells fill at the
//! last mark price. Suitable for dry runs and testing, not production.

use std::collections::HashMap;
use std::sync::RwLock;
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use rust_decimal::Decimal;

use crate::application::ports::{
    AccountError, AccountPort, ExecutionError, ExecutionPort, Fill,
};
use crate::models::{AccountState, Instrument, Position, PositionSide};

#[derive(Debug, Clone)]
struct SimPosition {
    size: Decimal,
    entry_price: Decimal,
    leverage: u32,
}

impl SimPosition {
    fn margin(&self) -> Decimal {
        self.size * self.entry_price / Decimal::from(self.leverage)
    }
}

#[derive(Debug, Default)]
struct SimState {
    cash: Decimal,
    marks: HashMap<Instrument, Decimal>,
    positions: HashMap<Instrument, SimPosition>,
}

/// In-memory exchange double with simple long-only margin accounting.
#[derive(Debug)]
pub struct SimulatedExchange {
    state: RwLock<SimState>,
    next_order_id: AtomicU64,
}

impl SimulatedExchange {
    /// Create a simulator seeded with starting cash.
    #[must_use]
    pub fn new(starting_cash: Decimal) -> Self {
        Self {
            state: RwLock::new(SimState {
                cash: starting_cash,
                ..Default::default()
            }),
            next_order_id: AtomicU64::new(1),
        }
    }

    /// Update the mark price used for sell fills and unrealized PnL.
    pub fn set_mark_price(&self, instrument: Instrument, price: Decimal) {
        let mut state = self.state.write().unwrap();
        state.marks.insert(instrument, price);
    }

    fn order_id(&self) -> String {
        format!("sim-{}", self.next_order_id.fetch_add(1, Ordering::Relaxed))
    }
}

#[async_trait]
impl AccountPort for SimulatedExchange {
    async fn get_account_state(
        &self,
        capital_override: Option<Decimal>,
    ) -> Result<AccountState, AccountError> {
        let state = self.state.read().unwrap();

        let mut positions = Vec::with_capacity(state.positions.len());
        let mut locked_margin = Decimal::ZERO;
        let mut total_pnl = Decimal::ZERO;
        for (&instrument, sim) in &state.positions {
            let mark = state
                .marks
                .get(&instrument)
                .copied()
                .unwrap_or(sim.entry_price);
            let pnl = (mark - sim.entry_price) * sim.size;
            locked_margin += sim.margin();
            total_pnl += pnl;
            positions.push(Position {
                instrument,
                side: PositionSide::Long,
                size: sim.size,
                entry_price: sim.entry_price,
                mark_price: mark,
                leverage: sim.leverage,
                unrealized_pnl: pnl,
            });
        }
        // Deterministic ordering for prompts and records.
        positions.sort_by_key(|p| p.instrument.ticker());

        Ok(AccountState {
            total_equity: capital_override
                .unwrap_or(state.cash + locked_margin + total_pnl),
            available_cash: state.cash,
            positions,
        })
    }
}

#[async_trait]
impl ExecutionPort for SimulatedExchange {
    async fn buy(
        &self,
        instrument: Instrument,
        price: Decimal,
        amount: Decimal,
        leverage: u32,
        _stop_loss_pct: Option<Decimal>,
        _take_profit_pct: Option<Decimal>,
    ) -> Result<Fill, ExecutionError> {
        let mut state = self.state.write().unwrap();

        let margin = amount * price / Decimal::from(leverage);
        if margin > state.cash {
            return Err(ExecutionError::Rejected {
                reason: format!("Insufficient cash: margin {margin} exceeds {}", state.cash),
            });
        }

        state.cash -= margin;
        state.marks.insert(instrument, price);
        state
            .positions
            .entry(instrument)
            .and_modify(|p| {
                // Average the entry; leverage follows the latest order.
                let total = p.size + amount;
                p.entry_price = (p.entry_price * p.size + price * amount) / total;
                p.size = total;
                p.leverage = leverage;
            })
            .or_insert(SimPosition {
                size: amount,
                entry_price: price,
                leverage,
            });

        Ok(Fill {
            order_id: self.order_id(),
            price,
            amount,
        })
    }

    async fn sell(
        &self,
        instrument: Instrument,
        percentage: Decimal,
    ) -> Result<Fill, ExecutionError> {
        let mut state = self.state.write().unwrap();

        let Some(position) = state.positions.get(&instrument).cloned() else {
            return Err(ExecutionError::NoPosition { instrument });
        };

        let mark = state
            .marks
            .get(&instrument)
            .copied()
            .unwrap_or(position.entry_price);
        let close_qty = position.size * percentage / Decimal::ONE_HUNDRED;
        if close_qty <= Decimal::ZERO {
            return Err(ExecutionError::Rejected {
                reason: format!("Close quantity is zero for {percentage}%"),
            });
        }

        let released_margin =
            close_qty * position.entry_price / Decimal::from(position.leverage);
        let realized = (mark - position.entry_price) * close_qty;
        state.cash += released_margin + realized;

        let remaining = position.size - close_qty;
        if remaining <= Decimal::ZERO {
            state.positions.remove(&instrument);
        } else if let Some(p) = state.positions.get_mut(&instrument) {
            p.size = remaining;
        }

        Ok(Fill {
            order_id: self.order_id(),
            price: mark,
            amount: close_qty,
        })
    }

    async fn set_protective(
        &self,
        instrument: Instrument,
        _stop_loss_pct: Option<Decimal>,
        _take_profit_pct: Option<Decimal>,
    ) -> Result<(), ExecutionError> {
        let state = self.state.read().unwrap();
        if state.positions.contains_key(&instrument) {
            Ok(())
        } else {
            Err(ExecutionError::NoPosition { instrument })
        }
    }
}
