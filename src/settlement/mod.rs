//! Settlement-day reconciliation of matched rows

mod reconciler;

pub use reconciler::*;
