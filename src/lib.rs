pub mod cli;
pub mod engine;
pub mod errors;
pub mod instrument;
pub mod orderbook;
pub mod orders;
pub mod pipeline;
pub mod simulate;
pub mod trade;
pub mod utils;
