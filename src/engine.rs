use std::{collections::HashMap, sync::Mutex};

use crate::{
    errors::EngineError,
    instrument::Pair,
    orderbook::OrderBook,
    orders::Order,
    trade::Trade,
};

/// Shared entry point for matching: one [`OrderBook`] per instrument, each
/// behind its own lock.
///
/// The set of books is fixed at construction, so looking a book up needs no
/// lock of its own. Orders for different instruments match in parallel, and
/// calls for the same instrument run one at a time, in lock acquisition order.
///
/// Share it between workers with an `Arc`.
pub struct MatchingEngine {
    books: HashMap<Pair, Mutex<OrderBook>>,
}

impl MatchingEngine {
    /// An engine with a book for every [`Pair::supported`] instrument.
    pub fn new() -> Self {
        Self::with_pairs(Pair::supported())
    }

    pub fn with_pairs(pairs: &[Pair]) -> Self {
        Self {
            books: pairs
                .iter()
                .map(|&p| (p, Mutex::new(OrderBook::new(p))))
                .collect(),
        }
    }

    fn book(&self, pair: Pair) -> Result<&Mutex<OrderBook>, EngineError> {
        self.books
            .get(&pair)
            .ok_or_else(|| EngineError::UnknownInstrument(pair.code()))
    }

    /// Runs `f` with the instrument's book locked.
    fn with_book<T>(
        &self,
        pair: Pair,
        f: impl FnOnce(&mut OrderBook) -> T,
    ) -> Result<T, EngineError> {
        let mut book = self
            .book(pair)?
            .lock()
            .map_err(|_| EngineError::Poisoned(pair))?;
        Ok(f(&mut *book))
    }

    /// Matches `order` against its instrument's book and returns the trades.
    ///
    /// Safe to call from any number of threads at once.
    pub fn process(&self, order: Order) -> Result<Vec<Trade>, EngineError> {
        order.validate()?;
        let trades = self.with_book(order.instrument, |book| book.process(order))??;
        Ok(trades)
    }

    /// A copy of the instrument's book as it stands right now.
    pub fn snapshot(&self, pair: Pair) -> Result<OrderBook, EngineError> {
        self.with_book(pair, |book| book.clone())
    }

    pub fn best_bid(&self, pair: Pair) -> Result<Option<u64>, EngineError> {
        self.with_book(pair, |book| book.bids().best().map(|o| o.price))
    }

    pub fn best_ask(&self, pair: Pair) -> Result<Option<u64>, EngineError> {
        self.with_book(pair, |book| book.asks().best().map(|o| o.price))
    }
}

impl Default for MatchingEngine {
    fn default() -> Self {
        MatchingEngine::new()
    }
}
