//! Adjacent-strike crossing rule
//!
//! Put-call parity puts the fair index level where call and put premiums
//! are equal. On a discrete ladder that level is bracketed by two strikes
//! one tick apart: calls dearer than puts at the lower strike, cheaper at
//! the upper one.
//!
//! Walking common strikes upward:
//! - `call > put` at `s`: the crossing lies above, test `s + tick`
//! - `call < put` at `s`: the crossing lies below, test `s - tick`
//! - `call == put`: no information, move on
//!
//! The first strike that produces a consistent bracket wins.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::book::PremiumBook;
use crate::core::Strike;

/// How the bracket was confirmed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BracketKind {
    /// Both rights traded at `s + tick` and the call was below the put there
    Above,
    /// Only the call traded at `s + tick`, at or below the put at `s`
    AboveCallOnly,
    /// Both rights traded at `s - tick` and the call was above the put there
    Below,
    /// Only the put traded at `s - tick`, at or below the call at `s`
    BelowPutOnly,
}

/// The synthetic strike pair.
///
/// `call_strike` is always `put_strike + tick`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StrikeCrossing {
    pub call_strike: Strike,
    pub call_premium: Decimal,
    pub put_strike: Strike,
    pub put_premium: Decimal,
    pub kind: BracketKind,
}

impl StrikeCrossing {
    /// Strike distance between the two legs
    pub fn gap(&self) -> i64 {
        self.call_strike - self.put_strike
    }
}

/// Apply the crossing rule to one second's book
pub fn find_crossing(book: &PremiumBook, tick: i64) -> Option<StrikeCrossing> {
    for s in book.common_strikes() {
        let (call_s, put_s) = (book.call(s)?, book.put(s)?);

        let found = if call_s > put_s {
            crossing_above(book, s, put_s, tick)
        } else if call_s < put_s {
            crossing_below(book, s, call_s, tick)
        } else {
            None
        };

        if found.is_some() {
            return found;
        }
    }
    None
}

/// Cheap strike `s` (call > put): bracket with `s + tick`
fn crossing_above(book: &PremiumBook, s: Strike, put_s: Decimal, tick: i64) -> Option<StrikeCrossing> {
    let next = s + tick;
    match (book.call(next), book.put(next)) {
        (Some(call_next), Some(put_next)) if call_next < put_next => Some(StrikeCrossing {
            call_strike: next,
            call_premium: call_next,
            put_strike: s,
            put_premium: put_s,
            kind: BracketKind::Above,
        }),
        (Some(call_next), None) if call_next <= put_s => Some(StrikeCrossing {
            call_strike: next,
            call_premium: call_next,
            put_strike: s,
            put_premium: put_s,
            kind: BracketKind::AboveCallOnly,
        }),
        _ => None,
    }
}

/// Expensive strike `s` (call < put): bracket with `s - tick`
fn crossing_below(book: &PremiumBook, s: Strike, call_s: Decimal, tick: i64) -> Option<StrikeCrossing> {
    let prev = s - tick;
    match (book.call(prev), book.put(prev)) {
        (Some(call_prev), Some(put_prev)) if call_prev > put_prev => Some(StrikeCrossing {
            call_strike: s,
            call_premium: call_s,
            put_strike: prev,
            put_premium: put_prev,
            kind: BracketKind::Below,
        }),
        (None, Some(put_prev)) if call_s >= put_prev => Some(StrikeCrossing {
            call_strike: s,
            call_premium: call_s,
            put_strike: prev,
            put_premium: put_prev,
            kind: BracketKind::BelowPutOnly,
        }),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::OptionRight;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn book(calls: &[(Strike, &str)], puts: &[(Strike, &str)]) -> PremiumBook {
        let mut book = PremiumBook::new();
        for &(k, p) in calls {
            book.fold(OptionRight::Call, k, dec(p));
        }
        for &(k, p) in puts {
            book.fold(OptionRight::Put, k, dec(p));
        }
        book
    }

    #[test]
    fn test_cheap_strike_full_bracket() {
        // 17650: C 60 > P 40; 17700: C 35 < P 55
        let b = book(&[(17650, "60"), (17700, "35")], &[(17650, "40"), (17700, "55")]);
        let x = find_crossing(&b, 50).unwrap();

        assert_eq!(x.kind, BracketKind::Above);
        assert_eq!((x.call_strike, x.call_premium), (17700, dec("35")));
        assert_eq!((x.put_strike, x.put_premium), (17650, dec("40")));
    }

    #[test]
    fn test_cheap_strike_call_only_above() {
        // 17700 has only a call, 38 <= put(17650) 40
        let b = book(&[(17650, "60"), (17700, "38")], &[(17650, "40")]);
        let x = find_crossing(&b, 50).unwrap();

        assert_eq!(x.kind, BracketKind::AboveCallOnly);
        assert_eq!((x.call_strike, x.put_strike), (17700, 17650));
    }

    #[test]
    fn test_call_only_above_inconsistent_is_skipped() {
        // call(17700) 45 > put(17650) 40: not a valid bracket
        let b = book(&[(17650, "60"), (17700, "45")], &[(17650, "40")]);
        assert!(find_crossing(&b, 50).is_none());
    }

    #[test]
    fn test_expensive_strike_put_only_below() {
        // 17700: C 35 < P 55, 17650 has only a put at 30 <= 35
        let b = book(&[(17700, "35")], &[(17650, "30"), (17700, "55")]);
        let x = find_crossing(&b, 50).unwrap();

        assert_eq!(x.kind, BracketKind::BelowPutOnly);
        assert_eq!((x.call_strike, x.call_premium), (17700, dec("35")));
        assert_eq!((x.put_strike, x.put_premium), (17650, dec("30")));
    }

    #[test]
    fn test_put_only_below_inconsistent_is_skipped() {
        let b = book(&[(17700, "35")], &[(17650, "36"), (17700, "55")]);
        assert!(find_crossing(&b, 50).is_none());
    }

    #[test]
    fn test_expensive_strike_full_bracket_below() {
        // The ascending walk reaches 17650 first and reports the pair via the
        // above branch; the below branch on 17700 must agree.
        let b = book(&[(17650, "60"), (17700, "35")], &[(17650, "40"), (17700, "55")]);
        let from_below = crossing_below(&b, 17700, dec("35"), 50).unwrap();
        assert_eq!(from_below.kind, BracketKind::Below);
        assert_eq!((from_below.call_strike, from_below.put_strike), (17700, 17650));

        let x = find_crossing(&b, 50).unwrap();
        assert_eq!((x.call_strike, x.put_strike), (from_below.call_strike, from_below.put_strike));
        assert_eq!((x.call_premium, x.put_premium), (from_below.call_premium, from_below.put_premium));
    }

    #[test]
    fn test_equal_premiums_are_not_a_crossing() {
        let b = book(&[(17650, "40")], &[(17650, "40")]);
        assert!(find_crossing(&b, 50).is_none());

        // Equality at 17600 is skipped, crossing found from 17650 instead
        let b = book(
            &[(17600, "50"), (17650, "45"), (17700, "30")],
            &[(17600, "50"), (17650, "35"), (17700, "48")],
        );
        let x = find_crossing(&b, 50).unwrap();
        assert_eq!((x.call_strike, x.put_strike), (17700, 17650));
        assert_eq!(x.kind, BracketKind::Above);
    }

    #[test]
    fn test_no_adjacency_across_gap() {
        // 17650 cheap, 17750 expensive, 17700 absent: no bracket
        let b = book(&[(17650, "60"), (17750, "20")], &[(17650, "40"), (17750, "70")]);
        assert!(find_crossing(&b, 50).is_none());
    }

    #[test]
    fn test_first_common_strike_wins() {
        // Two valid brackets; the lower one is reported
        let b = book(
            &[(17600, "80"), (17650, "30"), (17700, "70"), (17750, "20")],
            &[(17600, "50"), (17650, "60"), (17700, "40"), (17750, "90")],
        );
        let x = find_crossing(&b, 50).unwrap();
        assert_eq!((x.call_strike, x.put_strike), (17650, 17600));
    }

    #[test]
    fn test_crossing_gap_is_one_tick() {
        let b = book(&[(17650, "60"), (17700, "35")], &[(17650, "40"), (17700, "55")]);
        let x = find_crossing(&b, 50).unwrap();
        assert_eq!(x.gap(), 50);
    }
}
