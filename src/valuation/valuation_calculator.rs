use rust_decimal::Decimal;

use crate::positions::Position;
use crate::valuation::valuation_model::Valuation;

/// Values a position against a closing price.
///
/// `quantity` is signed, so shorts need no special-casing anywhere: a short
/// whose price falls produces a market value of smaller magnitude than its
/// (negative) cost basis, hence positive unrealized P&L.
pub fn value_position(position: &Position, price: Decimal) -> Valuation {
    let multiplier = Decimal::from(position.multiplier);
    let cost_basis = position.quantity * position.entry_price * multiplier;
    let market_value = position.quantity * price * multiplier;
    Valuation {
        cost_basis,
        market_value,
        unrealized_pnl: market_value - cost_basis,
    }
}
