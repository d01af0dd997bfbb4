mod futures;

pub use futures::{imbalance, perpetual_symbol, FuturesClient};
