use crate::{
    errors::OrderError,
    instrument::Pair,
    orders::{Order, Side},
    trade::Trade,
};
use std::collections::VecDeque;
use tracing::{debug, trace};

/// One side of an [`OrderBook`]: resting orders kept in **price-time** priority.
///
/// - Bids are ordered by descending price, asks by ascending price.
/// - Within a price, orders stay in arrival order (FIFO).
///
/// Index 0 is always the best order: best price, earliest arrival.
#[derive(Debug, Clone)]
pub struct BookSide {
    side: Side,
    orders: VecDeque<Order>,
}

impl BookSide {
    pub fn new(side: Side) -> Self {
        Self {
            side,
            orders: VecDeque::new(),
        }
    }

    pub fn side(&self) -> Side {
        self.side
    }

    /// Inserts `order` behind every resting order whose price is at least as
    /// good, and ahead of every strictly worse one.
    ///
    /// Binary search over price: O(log n) comparisons plus the shift.
    ///
    /// # Panics
    /// If `order.side` is not this side's, or `order.amount` is zero.
    pub fn insert(&mut self, order: Order) {
        assert_eq!(
            order.side, self.side,
            "order `{}` routed to the wrong book side",
            order.id
        );
        assert!(order.amount > 0, "order `{}` has a zero amount", order.id);
        let price = order.price;
        let at = match self.side {
            Side::Buy => self.orders.partition_point(|o| o.price >= price),
            Side::Sell => self.orders.partition_point(|o| o.price <= price),
        };
        self.orders.insert(at, order);
    }

    /// Removes and returns the order at `index`, keeping the rest in order.
    ///
    /// # Panics
    /// If `index` is out of range. That can only happen through a bug in the
    /// book itself.
    pub fn remove_at(&mut self, index: usize) -> Order {
        let len = self.orders.len();
        match self.orders.remove(index) {
            Some(order) => order,
            None => panic!("remove_at({index}) on a {:?} side of {len} orders", self.side),
        }
    }

    /// Best resting order, or `None` if the side is empty.
    pub fn best(&self) -> Option<&Order> {
        self.orders.front()
    }

    pub fn get(&self, index: usize) -> Option<&Order> {
        self.orders.get(index)
    }

    pub fn len(&self) -> usize {
        self.orders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.orders.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Order> {
        self.orders.iter()
    }

    /// Sum of resting amounts, saturating at `u64::MAX`.
    pub fn total_amount(&self) -> u64 {
        self.orders
            .iter()
            .fold(0u64, |total, o| total.saturating_add(o.amount))
    }

    /// Aggregated `(price, total amount)` per level, best level first. Level
    /// totals saturate at `u64::MAX`.
    pub fn depth(&self) -> Vec<(u64, u64)> {
        let mut levels: Vec<(u64, u64)> = Vec::new();
        for o in &self.orders {
            match levels.last_mut() {
                Some((price, total)) if *price == o.price => {
                    *total = total.saturating_add(o.amount)
                }
                _ => levels.push((o.price, o.amount)),
            }
        }
        levels
    }
}

/// Matches an **incoming order** against the opposite side of the book,
/// producing a series of [`Trade`]s.
///
/// The walk starts at the best resting order and stops at the first one that
/// no longer crosses, or once the incoming order is filled. Each step fills
/// `min(incoming.amount, resting.amount)` at the resting price:
/// - resting order larger or equal: it is reduced in place (and removed when it
///   hits zero), and the incoming order is done
/// - resting order smaller: it is consumed and removed, and the walk moves on
///   to the next one
///
/// # Example
/// - A buy for 8 at 100 meets asks of 5 @ 99 and 5 @ 100.
/// - It fills 5 @ 99, then 3 @ 100, leaving 2 @ 100 resting.
fn match_incoming_side(incoming: &mut Order, book_side: &mut BookSide) -> Vec<Trade> {
    let mut trades = Vec::with_capacity(1);

    // An empty side, or a best price that doesn't cross, ends this at once.
    while let Some(resting) = book_side.orders.front_mut() {
        if !incoming.side.crosses(incoming.price, resting.price) {
            break;
        }
        let fill = incoming.amount.min(resting.amount);

        trades.push(Trade {
            taker_order_id: incoming.id.clone(),
            maker_order_id: resting.id.clone(),
            amount: fill,
            price: resting.price,
            instrument: incoming.instrument,
        });
        debug!(
            taker = %incoming.id,
            maker = %resting.id,
            amount = fill,
            price = resting.price,
            "fill"
        );

        incoming.amount -= fill;
        resting.amount -= fill;

        if resting.amount == 0 {
            book_side.remove_at(0);
        }
        if incoming.amount == 0 {
            break;
        }
    }
    trades
}

/// An [`OrderBook`] stores the **resting** buy and sell orders of one
/// instrument:
/// - `bids` (buy orders), highest price first
/// - `asks` (sell orders), lowest price first
///
/// It is never left crossed: after every [`OrderBook::process`] the best bid is
/// strictly below the best ask, or one side is empty.
#[derive(Debug, Clone)]
pub struct OrderBook {
    pair: Pair,
    bids: BookSide,
    asks: BookSide,
}

impl OrderBook {
    /// Creates a new, empty [`OrderBook`] for `pair`.
    pub fn new(pair: Pair) -> Self {
        Self {
            pair,
            bids: BookSide::new(Side::Buy),
            asks: BookSide::new(Side::Sell),
        }
    }

    pub fn pair(&self) -> Pair {
        self.pair
    }

    pub fn bids(&self) -> &BookSide {
        &self.bids
    }

    pub fn asks(&self) -> &BookSide {
        &self.asks
    }

    pub fn side(&self, side: Side) -> &BookSide {
        match side {
            Side::Buy => &self.bids,
            Side::Sell => &self.asks,
        }
    }

    fn side_mut(&mut self, side: Side) -> &mut BookSide {
        match side {
            Side::Buy => &mut self.bids,
            Side::Sell => &mut self.asks,
        }
    }

    /// Rests `order` on its own side without attempting to match it.
    ///
    /// A crossing price leaves the book crossed, so outside of
    /// [`OrderBook::process`] this is only for seeding books.
    ///
    /// # Panics
    /// If `order` is for another instrument, or has a zero amount.
    pub fn insert(&mut self, order: Order) {
        assert_eq!(
            order.instrument, self.pair,
            "order `{}` routed to the wrong instrument book",
            order.id
        );
        self.side_mut(order.side).insert(order);
    }

    pub fn remove_at(&mut self, side: Side, index: usize) -> Order {
        self.side_mut(side).remove_at(index)
    }

    pub fn best(&self, side: Side) -> Option<&Order> {
        self.side(side).best()
    }

    /// Matches an incoming **limit** order against the book.
    ///
    /// # Behavior
    /// - A `Buy` walks the `asks` from the lowest price up.
    /// - A `Sell` walks the `bids` from the highest price down.
    /// - Whatever is left unfilled rests on the order's own side, keeping its
    ///   id and its reduced amount.
    ///
    /// Returns the executed trades in the order they happened.
    ///
    /// # Errors
    /// Rejects, without touching the book, an order with a zero amount or for
    /// another instrument.
    pub fn process(&mut self, mut incoming: Order) -> Result<Vec<Trade>, OrderError> {
        incoming.validate()?;
        if incoming.instrument != self.pair {
            return Err(OrderError::WrongInstrument {
                id: incoming.id,
                expected: self.pair,
                got: incoming.instrument,
            });
        }

        let opposite = self.side_mut(incoming.side.opposite());
        let trades = match_incoming_side(&mut incoming, opposite);

        if incoming.amount > 0 {
            trace!(
                id = %incoming.id,
                side = ?incoming.side,
                price = incoming.price,
                amount = incoming.amount,
                "resting"
            );
            self.insert(incoming);
        }
        Ok(trades)
    }
}
