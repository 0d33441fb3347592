//! Synthetic strike crossing detection
//!
//! Finds the pair of adjacent strikes whose call/put premium ordering
//! flips, bracketing the index level implied by put-call parity.
//!
//! Three layers:
//! 1. **PremiumBook**: lowest call / highest put per strike for one second
//! 2. **Crossing rule**: adjacency test over the book's common strikes
//! 3. **CrossingMatcher**: second-by-second search from a target time

mod book;
mod config;
mod crossing;
mod matcher;

pub use book::*;
pub use config::*;
pub use crossing::*;
pub use matcher::*;
