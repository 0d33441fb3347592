//! Per-second premium book
//!
//! For one trade second, the extremal premium per strike: the lowest
//! traded call and the highest traded put. Folding more trades into the
//! book only ever lowers a call or raises a put.

use std::collections::BTreeMap;

use rust_decimal::Decimal;

use crate::core::{OptionRight, Strike, TradeRecord};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct PremiumBook {
    calls: BTreeMap<Strike, Decimal>,
    puts: BTreeMap<Strike, Decimal>,
}

impl PremiumBook {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from the trades of a single second
    pub fn from_trades<'a>(trades: impl IntoIterator<Item = &'a TradeRecord>) -> Self {
        let mut book = Self::new();
        for trade in trades {
            book.fold(trade.right, trade.strike, trade.price);
        }
        book
    }

    /// Tighten the book with one traded premium
    pub fn fold(&mut self, right: OptionRight, strike: Strike, price: Decimal) {
        match right {
            OptionRight::Call => {
                let best = self.calls.entry(strike).or_insert(price);
                if price < *best {
                    *best = price;
                }
            }
            OptionRight::Put => {
                let best = self.puts.entry(strike).or_insert(price);
                if price > *best {
                    *best = price;
                }
            }
        }
    }

    pub fn call(&self, strike: Strike) -> Option<Decimal> {
        self.calls.get(&strike).copied()
    }

    pub fn put(&self, strike: Strike) -> Option<Decimal> {
        self.puts.get(&strike).copied()
    }

    /// Strikes with both a call and a put, ascending
    pub fn common_strikes(&self) -> Vec<Strike> {
        self.calls
            .keys()
            .filter(|k| self.puts.contains_key(k))
            .copied()
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.calls.is_empty() && self.puts.is_empty()
    }

    pub fn len(&self) -> usize {
        self.calls.len() + self.puts.len()
    }
}
