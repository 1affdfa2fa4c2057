//! Strict schema validation of oracle output.
//!
//! The oracle's response is untrusted input. This module is the only place
//! where raw JSON becomes [`Decision`] values: enum membership and every
//! numeric range is checked before any field is read by the rest of the
//! pipeline, and the whole batch is rejected on any mismatch rather than
//! coerced.
//!
//! Missing operation-specific required fields are the one deliberate
//! exception: they pass through as `None` so the orchestrator can downgrade
//! just the affected decision to Hold instead of failing the cycle.

use rust_decimal::Decimal;
use serde_json::Value;

use crate::application::ports::OracleError;
use crate::models::decision::LEVERAGE_RANGE;
use crate::models::{
    BuyParams, Decision, HoldParams, Instrument, Operation, OracleProposal, SellParams,
    TrendDirection, TrendPrediction,
};

/// Batch size accepted from a single oracle call.
const DECISION_COUNT_RANGE: std::ops::RangeInclusive<usize> = 1..=5;

/// Validate a raw oracle response body into a proposal.
pub fn validate_proposal(raw: &Value) -> Result<OracleProposal, OracleError> {
    let root = raw
        .as_object()
        .ok_or_else(|| schema_err("response is not a JSON object"))?;

    let reasoning = match root.get("reasoning") {
        None | Some(Value::Null) => None,
        Some(Value::String(s)) => Some(s.clone()),
        Some(_) => return Err(schema_err("reasoning must be a string")),
    };

    let raw_decisions = root
        .get("decisions")
        .and_then(Value::as_array)
        .ok_or_else(|| schema_err("decisions must be an array"))?;

    if !DECISION_COUNT_RANGE.contains(&raw_decisions.len()) {
        return Err(schema_err(format!(
            "expected 1-5 decisions, got {}",
            raw_decisions.len()
        )));
    }

    let mut decisions = Vec::with_capacity(raw_decisions.len());
    let mut seen = Vec::new();
    for (idx, raw_decision) in raw_decisions.iter().enumerate() {
        let decision = validate_decision(raw_decision)
            .map_err(|msg| schema_err(format!("decisions[{idx}]: {msg}")))?;
        if seen.contains(&decision.instrument) {
            return Err(schema_err(format!(
                "duplicate decision for {}",
                decision.instrument
            )));
        }
        seen.push(decision.instrument);
        decisions.push(decision);
    }

    Ok(OracleProposal {
        decisions,
        reasoning,
    })
}

fn validate_decision(raw: &Value) -> Result<Decision, String> {
    let obj = raw.as_object().ok_or("decision is not an object")?;

    let symbol = require_str(obj, "symbol")?;
    let instrument = Instrument::parse(symbol).map_err(|e| e.to_string())?;

    let prediction = validate_prediction(obj.get("prediction").ok_or("missing prediction")?)?;

    let rationale = match obj.get("rationale") {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(_) => return Err("rationale must be a string".to_string()),
    };

    let operation = match require_str(obj, "operation")? {
        "BUY" => Operation::Buy(BuyParams {
            price: optional_positive_decimal(obj, "price")?,
            amount: optional_positive_decimal(obj, "amount")?,
            leverage: optional_leverage(obj)?,
            stop_loss_pct: optional_positive_decimal(obj, "stop_loss_pct")?,
            take_profit_pct: optional_positive_decimal(obj, "take_profit_pct")?,
        }),
        "SELL" => Operation::Sell(SellParams {
            percentage: optional_decimal_in(obj, "percentage", Decimal::ZERO, Decimal::ONE_HUNDRED)?,
        }),
        "HOLD" => Operation::Hold(HoldParams {
            stop_loss_pct: optional_positive_decimal(obj, "stop_loss_pct")?,
            take_profit_pct: optional_positive_decimal(obj, "take_profit_pct")?,
        }),
        other => return Err(format!("unknown operation: {other}")),
    };

    Ok(Decision {
        instrument,
        operation,
        prediction,
        rationale,
    })
}

fn validate_prediction(raw: &Value) -> Result<TrendPrediction, String> {
    let obj = raw.as_object().ok_or("prediction is not an object")?;

    let direction = match require_str(obj, "direction")? {
        "UP" => TrendDirection::Up,
        "DOWN" => TrendDirection::Down,
        "SIDEWAYS" => TrendDirection::Sideways,
        other => return Err(format!("unknown direction: {other}")),
    };

    let confidence = require_decimal(obj, "confidence")?;
    if confidence < Decimal::ZERO || confidence > Decimal::ONE {
        return Err(format!("confidence {confidence} outside 0-1"));
    }

    Ok(TrendPrediction {
        direction,
        confidence,
        support: require_decimal(obj, "support")?,
        resistance: require_decimal(obj, "resistance")?,
        analysis: match obj.get("analysis") {
            Some(Value::String(s)) => s.clone(),
            _ => String::new(),
        },
    })
}

fn schema_err(message: impl Into<String>) -> OracleError {
    OracleError::Schema {
        message: message.into(),
    }
}

fn require_str<'a>(
    obj: &'a serde_json::Map<String, Value>,
    key: &str,
) -> Result<&'a str, String> {
    obj.get(key)
        .and_then(Value::as_str)
        .ok_or_else(|| format!("missing or non-string field: {key}"))
}

fn require_decimal(obj: &serde_json::Map<String, Value>, key: &str) -> Result<Decimal, String> {
    parse_decimal(obj.get(key).ok_or_else(|| format!("missing field: {key}"))?)
        .ok_or_else(|| format!("field {key} is not a number"))
}

/// Accept a JSON number or numeric string; parse via the literal text to
/// avoid f64 round-tripping.
fn parse_decimal(value: &Value) -> Option<Decimal> {
    match value {
        Value::Number(n) => n.to_string().parse().ok(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn optional_decimal(
    obj: &serde_json::Map<String, Value>,
    key: &str,
) -> Result<Option<Decimal>, String> {
    match obj.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(v) => parse_decimal(v)
            .map(Some)
            .ok_or_else(|| format!("field {key} is not a number")),
    }
}

fn optional_positive_decimal(
    obj: &serde_json::Map<String, Value>,
    key: &str,
) -> Result<Option<Decimal>, String> {
    match optional_decimal(obj, key)? {
        Some(v) if v <= Decimal::ZERO => Err(format!("field {key} must be positive, got {v}")),
        other => Ok(other),
    }
}

fn optional_decimal_in(
    obj: &serde_json::Map<String, Value>,
    key: &str,
    min: Decimal,
    max: Decimal,
) -> Result<Option<Decimal>, String> {
    match optional_decimal(obj, key)? {
        Some(v) if v < min || v > max => {
            Err(format!("field {key} must be within {min}-{max}, got {v}"))
        }
        other => Ok(other),
    }
}

fn optional_leverage(obj: &serde_json::Map<String, Value>) -> Result<Option<u32>, String> {
    match obj.get("leverage") {
        None | Some(Value::Null) => Ok(None),
        Some(v) => {
            let leverage = v
                .as_u64()
                .and_then(|l| u32::try_from(l).ok())
                .ok_or("leverage must be an integer")?;
            if !LEVERAGE_RANGE.contains(&leverage) {
                return Err(format!("leverage {leverage} outside 1-30"));
            }
            Ok(Some(leverage))
        }
    }
}
