//! Options analytics over a chain snapshot.
//!
//! Pure functions deriving three metrics from a [`ChainSnapshot`]: max pain,
//! put/call ratio and at-the-money implied volatility. All of them return
//! `None` when the snapshot carries no contracts to work with, so callers
//! can map an empty chain to a not-found response.

use crate::gateway::{ChainSnapshot, OptionContract};
use std::collections::BTreeMap;

/// Aggregate open interest at one strike.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StrikeOpenInterest {
    /// Strike price.
    pub strike: f64,
    /// Total open interest across calls and puts.
    pub open_interest: i64,
}

/// Max pain analysis result.
#[derive(Debug, Clone)]
pub struct MaxPainSummary {
    /// Strike with the highest aggregate open interest.
    pub max_pain_strike: f64,
    /// Percent distance of the max pain strike from the current price.
    pub price_difference_percent: f64,
    /// Top strikes by aggregate open interest, descending.
    pub top_strikes: Vec<StrikeOpenInterest>,
}

/// Put/call ratio analysis result.
#[derive(Debug, Clone)]
pub struct PcrSummary {
    /// Total call-side open interest.
    pub call_open_interest: i64,
    /// Total put-side open interest.
    pub put_open_interest: i64,
    /// Put open interest divided by call open interest (0 when call OI is 0).
    pub ratio: f64,
    /// Sentiment reading derived from the ratio.
    pub interpretation: &'static str,
}

/// At-the-money implied volatility result.
#[derive(Debug, Clone)]
pub struct IvSummary {
    /// Strike of the ATM contract.
    pub atm_strike: f64,
    /// Implied volatility of the ATM call, when the call side has data.
    pub atm_call_iv: Option<f64>,
    /// Implied volatility of the ATM put, when the put side has data.
    pub atm_put_iv: Option<f64>,
    /// Average of the available ATM implied volatilities.
    pub average_iv: f64,
    /// Volatility reading derived from the average.
    pub interpretation: &'static str,
}

/// Strikes are bucketed at cent precision when grouping open interest.
fn strike_cents(strike: f64) -> i64 {
    (strike * 100.0).round() as i64
}

/// Computes the max pain strike for a chain.
///
/// Open interest is summed per strike across both sides; the strike with
/// the highest total wins. Ties break toward the lowest strike so the
/// result is deterministic. Returns `None` for a chain with no contracts.
#[must_use]
pub fn max_pain(chain: &ChainSnapshot) -> Option<MaxPainSummary> {
    let mut by_strike: BTreeMap<i64, i64> = BTreeMap::new();
    for contract in chain.calls.iter().chain(chain.puts.iter()) {
        *by_strike.entry(strike_cents(contract.strike)).or_default() +=
            contract.open_interest.unwrap_or(0);
    }

    if by_strike.is_empty() {
        return None;
    }

    // Ascending iteration plus strict comparison keeps the lowest strike
    // on an open-interest tie.
    let (mut max_strike, mut max_oi) = (0i64, i64::MIN);
    for (&strike, &oi) in &by_strike {
        if oi > max_oi {
            max_strike = strike;
            max_oi = oi;
        }
    }

    let mut ranked: Vec<StrikeOpenInterest> = by_strike
        .iter()
        .map(|(&strike, &oi)| StrikeOpenInterest {
            strike: strike as f64 / 100.0,
            open_interest: oi,
        })
        .collect();
    ranked.sort_by(|a, b| {
        b.open_interest
            .cmp(&a.open_interest)
            .then(a.strike.total_cmp(&b.strike))
    });
    ranked.truncate(5);

    let max_pain_strike = max_strike as f64 / 100.0;
    let price_difference_percent = if chain.current_price > 0.0 {
        (max_pain_strike / chain.current_price - 1.0) * 100.0
    } else {
        0.0
    };

    Some(MaxPainSummary {
        max_pain_strike,
        price_difference_percent,
        top_strikes: ranked,
    })
}

/// Computes the put/call open-interest ratio for a chain.
///
/// Returns `None` for a chain with no contracts. A zero call-side open
/// interest yields a ratio of 0 rather than a division error.
#[must_use]
pub fn put_call_ratio(chain: &ChainSnapshot) -> Option<PcrSummary> {
    if chain.calls.is_empty() && chain.puts.is_empty() {
        return None;
    }

    let call_open_interest: i64 = chain
        .calls
        .iter()
        .map(|c| c.open_interest.unwrap_or(0))
        .sum();
    let put_open_interest: i64 = chain
        .puts
        .iter()
        .map(|p| p.open_interest.unwrap_or(0))
        .sum();

    let ratio = if call_open_interest > 0 {
        put_open_interest as f64 / call_open_interest as f64
    } else {
        0.0
    };

    let interpretation = if ratio > 1.0 {
        "Bearish"
    } else if ratio < 0.7 {
        "Bullish"
    } else {
        "Neutral"
    };

    Some(PcrSummary {
        call_open_interest,
        put_open_interest,
        ratio,
        interpretation,
    })
}

/// Selects the contract whose strike is closest to the current price.
///
/// Contracts without an implied volatility are skipped. Ties break toward
/// the first contract in ascending strike order.
fn atm_contract(contracts: &[OptionContract], current_price: f64) -> Option<&OptionContract> {
    let mut best: Option<(&OptionContract, f64)> = None;
    for contract in contracts {
        if contract.implied_volatility.is_none() {
            continue;
        }
        let diff = (contract.strike - current_price).abs();
        let better = match best {
            None => true,
            Some((_, best_diff)) => diff < best_diff,
        };
        if better {
            best = Some((contract, diff));
        }
    }
    best.map(|(contract, _)| contract)
}

/// Computes the at-the-money implied volatility for a chain.
///
/// Each side contributes its contract closest to the current price; the
/// result averages whichever sides have data. Returns `None` when neither
/// side carries an implied volatility.
#[must_use]
pub fn atm_implied_volatility(chain: &ChainSnapshot) -> Option<IvSummary> {
    let call = atm_contract(&chain.calls, chain.current_price);
    let put = atm_contract(&chain.puts, chain.current_price);

    let atm_strike = call.or(put)?.strike;
    let atm_call_iv = call.and_then(|c| c.implied_volatility);
    let atm_put_iv = put.and_then(|p| p.implied_volatility);

    let (sum, count) = [atm_call_iv, atm_put_iv]
        .iter()
        .flatten()
        .fold((0.0, 0u32), |(sum, count), iv| (sum + iv, count + 1));
    let average_iv = sum / f64::from(count);

    let interpretation = if average_iv > 0.30 {
        "High volatility expected"
    } else if average_iv < 0.15 {
        "Low volatility expected"
    } else {
        "Moderate volatility expected"
    };

    Some(IvSummary {
        atm_strike,
        atm_call_iv,
        atm_put_iv,
        average_iv,
        interpretation,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn contract(strike: f64, open_interest: i64, iv: f64) -> OptionContract {
        OptionContract {
            strike,
            last_price: Some(1.0),
            bid: Some(0.9),
            ask: Some(1.1),
            volume: Some(10),
            open_interest: Some(open_interest),
            implied_volatility: Some(iv),
        }
    }

    fn chain(calls: Vec<OptionContract>, puts: Vec<OptionContract>) -> ChainSnapshot {
        ChainSnapshot {
            symbol: "GOOGL".to_string(),
            expiry: NaiveDate::from_ymd_opt(2025, 12, 5).unwrap(),
            current_price: 314.89,
            calls,
            puts,
        }
    }

    #[test]
    fn test_max_pain_highest_aggregate_oi() {
        // 280 sums to 22306 across both sides, beating 330's 19713.
        let chain = chain(
            vec![
                contract(280.0, 11000, 0.4),
                contract(330.0, 19713, 0.3),
                contract(350.0, 5000, 0.28),
            ],
            vec![contract(280.0, 11306, 0.39), contract(300.0, 8000, 0.35)],
        );

        let summary = max_pain(&chain).expect("should compute");
        assert_eq!(summary.max_pain_strike, 280.0);
        assert_eq!(summary.top_strikes[0].strike, 280.0);
        assert_eq!(summary.top_strikes[0].open_interest, 22306);
        assert_eq!(summary.top_strikes[1].strike, 330.0);
        assert_eq!(summary.top_strikes[1].open_interest, 19713);
        // 280 vs 314.89 is roughly -11.08%.
        assert!((summary.price_difference_percent - (-11.08)).abs() < 0.01);
    }

    #[test]
    fn test_max_pain_tie_breaks_to_lowest_strike() {
        let chain = chain(
            vec![contract(300.0, 1000, 0.3), contract(320.0, 1000, 0.3)],
            vec![],
        );

        let summary = max_pain(&chain).expect("should compute");
        assert_eq!(summary.max_pain_strike, 300.0);
    }

    #[test]
    fn test_max_pain_top_strikes_capped_at_five() {
        let calls = (1..=8)
            .map(|i| contract(100.0 + f64::from(i), i64::from(i) * 100, 0.3))
            .collect();
        let chain = chain(calls, vec![]);

        let summary = max_pain(&chain).expect("should compute");
        assert_eq!(summary.top_strikes.len(), 5);
        assert_eq!(summary.top_strikes[0].open_interest, 800);
    }

    #[test]
    fn test_max_pain_empty_chain() {
        let chain = chain(vec![], vec![]);
        assert!(max_pain(&chain).is_none());
    }

    #[test]
    fn test_put_call_ratio_neutral() {
        let chain = chain(
            vec![contract(300.0, 132281, 0.3)],
            vec![contract(300.0, 126457, 0.3)],
        );

        let summary = put_call_ratio(&chain).expect("should compute");
        assert_eq!(summary.call_open_interest, 132281);
        assert_eq!(summary.put_open_interest, 126457);
        assert!((summary.ratio - 0.96).abs() < 0.01);
        assert_eq!(summary.interpretation, "Neutral");
    }

    #[test]
    fn test_put_call_ratio_bearish() {
        let chain = chain(
            vec![contract(300.0, 1000, 0.3)],
            vec![contract(300.0, 1500, 0.3)],
        );
        let summary = put_call_ratio(&chain).expect("should compute");
        assert_eq!(summary.interpretation, "Bearish");
    }

    #[test]
    fn test_put_call_ratio_bullish() {
        let chain = chain(
            vec![contract(300.0, 2000, 0.3)],
            vec![contract(300.0, 500, 0.3)],
        );
        let summary = put_call_ratio(&chain).expect("should compute");
        assert_eq!(summary.interpretation, "Bullish");
    }

    #[test]
    fn test_put_call_ratio_zero_call_oi() {
        let chain = chain(
            vec![contract(300.0, 0, 0.3)],
            vec![contract(300.0, 500, 0.3)],
        );
        let summary = put_call_ratio(&chain).expect("should compute");
        assert_eq!(summary.ratio, 0.0);
        assert_eq!(summary.interpretation, "Bullish");
    }

    #[test]
    fn test_put_call_ratio_empty_chain() {
        let chain = chain(vec![], vec![]);
        assert!(put_call_ratio(&chain).is_none());
    }

    #[test]
    fn test_atm_iv_picks_closest_strike() {
        // Current price 314.89: 315 is the closest strike on both sides.
        let chain = chain(
            vec![
                contract(310.0, 100, 0.25),
                contract(315.0, 100, 0.22),
                contract(320.0, 100, 0.27),
            ],
            vec![contract(315.0, 100, 0.18), contract(305.0, 100, 0.33)],
        );

        let summary = atm_implied_volatility(&chain).expect("should compute");
        assert_eq!(summary.atm_strike, 315.0);
        assert_eq!(summary.atm_call_iv, Some(0.22));
        assert_eq!(summary.atm_put_iv, Some(0.18));
        assert!((summary.average_iv - 0.20).abs() < 1e-9);
        assert_eq!(summary.interpretation, "Moderate volatility expected");
    }

    #[test]
    fn test_atm_iv_high_classification() {
        let chain = chain(
            vec![contract(315.0, 100, 0.45)],
            vec![contract(315.0, 100, 0.40)],
        );
        let summary = atm_implied_volatility(&chain).expect("should compute");
        assert_eq!(summary.interpretation, "High volatility expected");
    }

    #[test]
    fn test_atm_iv_low_classification() {
        let chain = chain(
            vec![contract(315.0, 100, 0.10)],
            vec![contract(315.0, 100, 0.12)],
        );
        let summary = atm_implied_volatility(&chain).expect("should compute");
        assert_eq!(summary.interpretation, "Low volatility expected");
    }

    #[test]
    fn test_atm_iv_single_side() {
        let chain = chain(vec![contract(315.0, 100, 0.28)], vec![]);
        let summary = atm_implied_volatility(&chain).expect("should compute");
        assert_eq!(summary.atm_call_iv, Some(0.28));
        assert_eq!(summary.atm_put_iv, None);
        assert!((summary.average_iv - 0.28).abs() < 1e-9);
    }

    #[test]
    fn test_atm_iv_empty_chain() {
        let chain = chain(vec![], vec![]);
        assert!(atm_implied_volatility(&chain).is_none());
    }

    #[test]
    fn test_atm_iv_tie_breaks_to_first_ascending() {
        // 310 and 320 are equidistant from 315: the lower strike wins.
        let mut c = chain(
            vec![contract(310.0, 100, 0.2), contract(320.0, 100, 0.3)],
            vec![],
        );
        c.current_price = 315.0;

        let summary = atm_implied_volatility(&c).expect("should compute");
        assert_eq!(summary.atm_strike, 310.0);
    }
}
