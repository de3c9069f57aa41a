//! Resilient fetching via raced strategies.
//!
//! The race primitive runs several alternative ways of obtaining the same
//! logical resource concurrently and takes the first qualifying success,
//! cancelling the losers. `ProxyFetcher` builds the concrete strategy list
//! for plain HTTP fetches: a direct request raced against a set of public
//! CORS relays.

mod proxy;
mod race;

pub use proxy::{FetchedResponse, ProxyFetcher};
pub use race::{race, RaceStrategy, DEFAULT_STRATEGY_TIMEOUT};
