//! Portfolio positions and their valuation against a [`TickerMap`].
//!
//! All arithmetic is checked [`Decimal`]. A position whose symbol is missing from the
//! mapping, or whose value overflows, keeps its last known valuation (flagged `stale`)
//! instead of dropping to zero.

use crate::{
    error::DataError,
    merge::TickerMap,
    symbol::{self, QuoteAsset, Symbol},
    ticker::TickerRecord,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use smol_str::format_smolstr;
use std::collections::{BTreeSet, HashMap};
use tracing::warn;
use uuid::Uuid;

/// Quote asset assumed for positions entered by base asset code (eg/ `BTC`).
const DEFAULT_QUOTE: QuoteAsset = QuoteAsset::Usdt;

/// One user-entered holding.
#[derive(Debug, Clone, Eq, PartialEq, Deserialize, Serialize)]
pub struct PortfolioPosition {
    #[serde(default = "Uuid::new_v4")]
    pub id: Uuid,
    /// Exchange symbol or base asset code.
    pub symbol: Symbol,
    pub amount: Decimal,
    #[serde(alias = "buyPrice")]
    pub buy_price: Decimal,
}

impl PortfolioPosition {
    /// Construct a validated [`PortfolioPosition`] with a fresh identifier.
    pub fn new(symbol: &str, amount: Decimal, buy_price: Decimal) -> Result<Self, DataError> {
        let position = Self {
            id: Uuid::new_v4(),
            symbol: symbol::normalise(symbol),
            amount,
            buy_price,
        };
        position.validate()?;
        Ok(position)
    }

    /// Check the symbol is non-empty, the amount positive, the buy price non-negative
    /// and the cost basis representable.
    pub fn validate(&self) -> Result<(), DataError> {
        if self.symbol.is_empty() {
            return Err(DataError::InvalidPosition("symbol is empty".to_string()));
        }
        if self.amount <= Decimal::ZERO {
            return Err(DataError::InvalidPosition(format!(
                "amount {} must be positive",
                self.amount
            )));
        }
        if self.buy_price < Decimal::ZERO {
            return Err(DataError::InvalidPosition(format!(
                "buy price {} must not be negative",
                self.buy_price
            )));
        }
        if self.cost_basis().is_none() {
            return Err(DataError::InvalidPosition(format!(
                "cost of {} at {} is out of range",
                self.amount, self.buy_price
            )));
        }
        Ok(())
    }

    /// `amount * buy_price`, `None` on overflow.
    pub fn cost_basis(&self) -> Option<Decimal> {
        self.amount.checked_mul(self.buy_price)
    }

    /// Symbols this position may be priced by, in lookup order.
    pub fn candidate_symbols(&self) -> impl Iterator<Item = Symbol> + '_ {
        let quoted = match QuoteAsset::from_symbol(&self.symbol) {
            Some(_) => None,
            None => Some(format_smolstr!("{}{}", self.symbol, DEFAULT_QUOTE)),
        };
        std::iter::once(self.symbol.clone()).chain(quoted)
    }

    /// Find the [`TickerRecord`] pricing this position.
    pub fn resolve<'a>(&self, mapping: &'a TickerMap) -> Option<&'a TickerRecord> {
        self.candidate_symbols()
            .find_map(|candidate| mapping.get(&candidate))
    }
}

/// Live figures of a priced position.
#[derive(Debug, Clone, Eq, PartialEq, Deserialize, Serialize)]
pub struct PositionQuote {
    pub current_price: Decimal,
    pub current_value: Decimal,
    pub profit: Decimal,
    pub profit_percent: Decimal,
}

impl PositionQuote {
    /// `None` when any figure overflows.
    fn compute(position: &PortfolioPosition, current_price: Decimal) -> Option<Self> {
        let current_value = position.amount.checked_mul(current_price)?;
        let cost_basis = position.cost_basis()?;
        let profit = current_value.checked_sub(cost_basis)?;

        Some(Self {
            current_price,
            current_value,
            profit,
            profit_percent: percent_of(profit, cost_basis),
        })
    }
}

#[derive(Debug, Clone, Eq, PartialEq, Deserialize, Serialize)]
pub struct ValuedPosition {
    pub position: PortfolioPosition,
    /// `None` when the position has never been priced.
    pub quote: Option<PositionQuote>,
    /// `true` when `quote` was carried over because the symbol is missing from the mapping.
    pub stale: bool,
}

#[derive(Debug, Clone, Default, Eq, PartialEq, Deserialize, Serialize)]
pub struct PortfolioTotals {
    /// Cost basis of every priced position.
    pub investment: Decimal,
    pub current_value: Decimal,
    pub profit: Decimal,
    pub profit_percent: Decimal,
    /// Positions excluded from the totals because they were never priced, or because
    /// adding them would overflow.
    pub unpriced: usize,
    /// Positions valued from their last known quote.
    pub stale: usize,
}

#[derive(Debug, Clone, Default, Eq, PartialEq, Deserialize, Serialize)]
pub struct Valuation {
    pub positions: Vec<ValuedPosition>,
    pub totals: PortfolioTotals,
}

impl Valuation {
    pub fn get(&self, id: Uuid) -> Option<&ValuedPosition> {
        self.positions.iter().find(|valued| valued.position.id == id)
    }
}

/// Value `positions` against `mapping`.
///
/// `previous` supplies the last known quote of positions whose symbol is absent from
/// `mapping` or whose value overflows. Idempotent and side effect free.
pub fn valuate(
    positions: &[PortfolioPosition],
    mapping: &TickerMap,
    previous: Option<&Valuation>,
) -> Valuation {
    let previous_quotes = previous
        .map(|valuation| {
            valuation
                .positions
                .iter()
                .filter_map(|valued| Some((valued.position.id, valued.quote.as_ref()?)))
                .collect::<HashMap<_, _>>()
        })
        .unwrap_or_default();

    let positions = positions
        .iter()
        .map(|position| {
            let quote = position
                .resolve(mapping)
                .and_then(|record| quote_position(position, record));

            match quote {
                Some(quote) => ValuedPosition {
                    position: position.clone(),
                    quote: Some(quote),
                    stale: false,
                },
                None => {
                    let quote = previous_quotes.get(&position.id).map(|quote| (*quote).clone());
                    ValuedPosition {
                        position: position.clone(),
                        stale: quote.is_some(),
                        quote,
                    }
                }
            }
        })
        .collect::<Vec<_>>();

    let totals = totals(&positions);
    Valuation { positions, totals }
}

fn quote_position(position: &PortfolioPosition, record: &TickerRecord) -> Option<PositionQuote> {
    let quote = PositionQuote::compute(position, record.last_price);
    if quote.is_none() {
        warn!(
            symbol = %position.symbol,
            price = %record.last_price,
            "position value out of range, keeping last known quote"
        );
    }
    quote
}

fn totals(positions: &[ValuedPosition]) -> PortfolioTotals {
    let mut totals = positions
        .iter()
        .fold(PortfolioTotals::default(), |mut totals, valued| {
            let sums = valued.quote.as_ref().and_then(|quote| {
                let investment = totals
                    .investment
                    .checked_add(valued.position.cost_basis()?)?;
                let current_value = totals.current_value.checked_add(quote.current_value)?;
                Some((investment, current_value))
            });

            match sums {
                Some((investment, current_value)) => {
                    totals.investment = investment;
                    totals.current_value = current_value;
                    if valued.stale {
                        totals.stale += 1;
                    }
                }
                None => totals.unpriced += 1,
            }
            totals
        });

    totals.profit = totals
        .current_value
        .checked_sub(totals.investment)
        .unwrap_or(Decimal::ZERO);
    totals.profit_percent = percent_of(totals.profit, totals.investment);
    totals
}

/// `part / whole * 100`, defined as zero for a zero `whole`.
fn percent_of(part: Decimal, whole: Decimal) -> Decimal {
    if whole.is_zero() {
        return Decimal::ZERO;
    }
    part.checked_div(whole)
        .and_then(|ratio| ratio.checked_mul(Decimal::ONE_HUNDRED))
        .unwrap_or(Decimal::ZERO)
}

/// User positions together with their latest [`Valuation`].
#[derive(Debug, Clone, Default)]
pub struct Portfolio {
    positions: Vec<PortfolioPosition>,
    valuation: Valuation,
}

impl Portfolio {
    /// Construct a [`Portfolio`] from restored positions, dropping any that fail
    /// [`PortfolioPosition::validate`].
    pub fn new(positions: Vec<PortfolioPosition>) -> Self {
        let positions = positions
            .into_iter()
            .filter(|position| match position.validate() {
                Ok(()) => true,
                Err(error) => {
                    warn!(%error, id = %position.id, "dropping invalid stored position");
                    false
                }
            })
            .collect();

        Self {
            positions,
            valuation: Valuation::default(),
        }
    }

    pub fn positions(&self) -> &[PortfolioPosition] {
        &self.positions
    }

    pub fn valuation(&self) -> &Valuation {
        &self.valuation
    }

    /// Add a validated position, returning its identifier.
    pub fn add(&mut self, symbol: &str, amount: Decimal, buy_price: Decimal) -> Result<Uuid, DataError> {
        let position = PortfolioPosition::new(symbol, amount, buy_price)?;
        let id = position.id;
        self.positions.push(position);
        Ok(id)
    }

    pub fn remove(&mut self, id: Uuid) -> Option<PortfolioPosition> {
        let index = self.positions.iter().position(|position| position.id == id)?;
        Some(self.positions.remove(index))
    }

    /// Every symbol any position may be priced by, used for merge retention.
    pub fn held_symbols(&self) -> BTreeSet<Symbol> {
        self.positions
            .iter()
            .flat_map(PortfolioPosition::candidate_symbols)
            .collect()
    }

    /// Recompute the valuation against `mapping`, carrying over last known quotes.
    pub fn revalue(&mut self, mapping: &TickerMap) -> &Valuation {
        self.valuation = valuate(&self.positions, mapping, Some(&self.valuation));
        &self.valuation
    }
}
