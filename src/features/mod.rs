//! Series derived from midpoint prices.
//!
//! - [`trade_signs`]: trade direction inferred from midpoint changes

pub mod trade_signs;

pub use trade_signs::derive_trade_signs;
