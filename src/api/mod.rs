//! Client for the private trading API.
//!
//! One generic [`Client::call`] plus one method per remote operation:
//! - reads (`getinfo`, `depth`, `mytrades`, ...) memoize their decoded result per client
//! - writes (`createorder`, `cancelorder`, `makewithdrawal`, ...) are suppressed in
//!   simulation mode and never cached
//! - `getmarket`, `order_buy` and `order_sell` resolve markets by currency pair

mod cache;
mod client;
mod config;
mod policy;
mod types;

pub use client::Client;
pub use config::Config;
pub use policy::NoncePolicy;
pub use types::{DEFAULT_TRADES_LIMIT, MarketId, OrderId, OrderType};
