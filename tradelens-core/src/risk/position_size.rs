//! Fixed-risk position sizing.
//!
//! # Formula
//! ```text
//! risk_per_share = |price - stop|
//! shares         = min(floor(risk_budget / risk_per_share), floor(account / price))
//! dollar_risk    = shares * risk_per_share
//! target(n)      = price + sign * n * risk_per_share
//! ```
//!
//! # Example
//! - Price $100, stop $90, risk $1,000, account $100,000
//! - Risk per share $10 -> 100 shares (affordability cap 1,000)
//! - Dollar risk $1,000; 1R/2R/3R targets $110 / $120 / $130

use crate::config::RiskConfig;
use crate::error::{AnalysisError, Result};
use serde::{Deserialize, Serialize};

/// Relative slack on the share count so float noise in the stop distance
/// cannot round a whole share away.
const SHARE_EPSILON: f64 = 1e-12;

/// Trade side, inferred from which side of the price the stop sits on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Long,
    Short,
}

impl Direction {
    /// Stop below price is a long; above is a short.
    pub fn infer(price: f64, stop_price: f64) -> Self {
        if stop_price < price {
            Self::Long
        } else {
            Self::Short
        }
    }

    /// +1 for long, -1 for short.
    pub fn sign(self) -> f64 {
        match self {
            Self::Long => 1.0,
            Self::Short => -1.0,
        }
    }
}

/// Caller-supplied sizing parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PositionSizeRequest {
    /// Entry price; the series' last close is used when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price: Option<f64>,
    pub stop_price: f64,
    /// Dollars the caller is willing to lose.
    pub risk_amount: f64,
    pub account_size: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProfitTarget {
    pub r_multiple: f64,
    pub price: f64,
    /// Profit at the target for the full position.
    pub profit: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PositionSize {
    pub price: f64,
    pub stop_price: f64,
    pub direction: Direction,
    pub shares: u64,
    pub risk_per_share: f64,
    /// Risk budget after the optional `max_risk_percent` cap.
    pub risk_budget: f64,
    pub dollar_risk: f64,
    /// Dollar exposure, `shares * price`.
    pub position_cost: f64,
    pub account_percent_risked: f64,
    /// True when affordability, not risk, bound the share count.
    pub limited_by_account: bool,
    pub targets: Vec<ProfitTarget>,
}

fn require_positive(name: &'static str, value: f64) -> Result<()> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(AnalysisError::invalid(name, format!("{value} must be positive")))
    }
}

/// Size a position. `last_close` stands in for a missing request price.
pub fn size_position(
    request: &PositionSizeRequest,
    last_close: Option<f64>,
    config: &RiskConfig,
) -> Result<PositionSize> {
    config.validate()?;
    let price = request.price.or(last_close).ok_or_else(|| {
        AnalysisError::invalid("price", "no price given and no bars to take a close from")
    })?;
    require_positive("price", price)?;
    if !request.stop_price.is_finite() || request.stop_price < 0.0 {
        return Err(AnalysisError::invalid(
            "stop_price",
            format!("{} must be a non-negative price", request.stop_price),
        ));
    }
    require_positive("risk_amount", request.risk_amount)?;
    require_positive("account_size", request.account_size)?;

    let risk_per_share = (price - request.stop_price).abs();
    if risk_per_share == 0.0 {
        return Err(AnalysisError::InvalidStop { price });
    }

    let risk_budget = match config.max_risk_percent {
        Some(pct) => request
            .risk_amount
            .min(request.account_size * pct / 100.0),
        None => request.risk_amount,
    };

    let by_risk = (risk_budget / risk_per_share * (1.0 + SHARE_EPSILON)).floor();
    let by_account = (request.account_size / price).floor();
    let shares = by_risk.min(by_account).max(0.0) as u64;
    let direction = Direction::infer(price, request.stop_price);
    let dollar_risk = shares as f64 * risk_per_share;

    let targets = config
        .r_multiples
        .iter()
        .map(|&n| ProfitTarget {
            r_multiple: n,
            price: (price + direction.sign() * n * risk_per_share).max(0.0),
            profit: shares as f64 * n * risk_per_share,
        })
        .collect();

    tracing::debug!(
        price,
        stop = request.stop_price,
        shares,
        ?direction,
        "position sized"
    );

    Ok(PositionSize {
        price,
        stop_price: request.stop_price,
        direction,
        shares,
        risk_per_share,
        risk_budget,
        dollar_risk,
        position_cost: shares as f64 * price,
        account_percent_risked: dollar_risk / request.account_size * 100.0,
        limited_by_account: by_account < by_risk,
        targets,
    })
}
