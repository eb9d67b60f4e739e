use crate::instrument::Pair;

/// A trade represents a matched transaction between two orders.
///
/// # Terminology
/// - **Maker**: The order that was already resting in the book (providing liquidity).
/// - **Taker**: The incoming order that triggered the trade (taking liquidity).
///
/// # Behavior
/// - The trade always executes at the **maker's price** (book price), so any
///   price improvement goes to the taker.
/// - Partial fills may occur: multiple trades can be generated from one order.
///
/// Example:
/// - A buy limit at 105 (taker) matches a resting sell at 102 (maker).
/// - A trade is created at price 102.
#[derive(Debug, Clone, PartialEq, Eq, serde::Deserialize, serde::Serialize)]
pub struct Trade {
    pub taker_order_id: String,
    pub maker_order_id: String,
    pub amount: u64,
    pub price: u64,
    pub instrument: Pair,
}

impl Trade {
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}
