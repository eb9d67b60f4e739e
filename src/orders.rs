use serde::{Deserialize, Serialize};

use crate::{errors::OrderError, instrument::Pair};

/// Represents which side of the market the order is on.
///
/// # Intuition
/// - `Buy` (Bid): resting bids are kept from **highest to lowest price**, a higher
///   bid being more aggressive.
/// - `Sell` (Ask): resting asks are kept from **lowest to highest price**, a lower
///   ask being more aggressive.
///
/// This ordering lets the matcher always meet the **best price first**:
/// - Buyers match with the **lowest ask**
/// - Sellers match with the **highest bid**
///
/// On the wire a side is `"Buy"`/`"Sell"`, or the numeric feed codes `1`/`2`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "SideRepr")]
pub enum Side {
    Buy,  // Bid
    Sell, // Ask
}

impl Side {
    /// The side an incoming order of this side matches against.
    pub fn opposite(self) -> Side {
        match self {
            Side::Buy => Side::Sell,
            Side::Sell => Side::Buy,
        }
    }

    /// `true` if an order of this side at `limit` can trade against a resting
    /// order priced at `resting`.
    #[inline]
    pub fn crosses(self, limit: u64, resting: u64) -> bool {
        match self {
            Side::Buy => resting <= limit,
            Side::Sell => resting >= limit,
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum SideRepr {
    Name(String),
    Code(u8),
}

impl TryFrom<SideRepr> for Side {
    type Error = String;
    fn try_from(repr: SideRepr) -> Result<Self, Self::Error> {
        match repr {
            SideRepr::Name(s) if s.eq_ignore_ascii_case("buy") => Ok(Side::Buy),
            SideRepr::Name(s) if s.eq_ignore_ascii_case("sell") => Ok(Side::Sell),
            SideRepr::Code(1) => Ok(Side::Buy),
            SideRepr::Code(2) => Ok(Side::Sell),
            SideRepr::Name(s) => Err(format!("unknown side: `{}`", s)),
            SideRepr::Code(c) => Err(format!("unknown side code: {}", c)),
        }
    }
}

/// A limit order submitted by a trader.
///
/// - `price` is in ticks, the smallest price increment
/// - `amount` only ever decreases once the order reaches the matcher
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    pub id: String,
    pub side: Side,
    pub price: u64,
    pub amount: u64,
    pub instrument: Pair,
}

impl Order {
    pub fn new(
        id: impl Into<String>,
        side: Side,
        price: u64,
        amount: u64,
        instrument: Pair,
    ) -> Self {
        Self {
            id: id.into(),
            side,
            price,
            amount,
            instrument,
        }
    }

    /// Decodes one order from its JSON form.
    pub fn from_json(msg: &[u8]) -> Result<Order, serde_json::Error> {
        serde_json::from_slice(msg)
    }

    /// Checks the preconditions the matcher relies on.
    pub fn validate(&self) -> Result<(), OrderError> {
        if self.amount == 0 {
            return Err(OrderError::ZeroAmount {
                id: self.id.clone(),
            });
        }
        Ok(())
    }
}
