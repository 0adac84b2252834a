//! Threshold signal evaluation.

use chrono::Utc;
use pulse_core::{Instrument, OrderSide, Quote, TradeSignal};

/// Evaluate trading conditions for one instrument.
///
/// Pure: no side effects, no state. A missing quote never produces a
/// signal. Thresholds are taken as supplied; `buy >= sell` is flagged at
/// configuration time, not here.
pub fn evaluate(quote: Option<&Quote>, instrument: &Instrument) -> Option<TradeSignal> {
    let quote = quote?;

    let side = if quote.price < instrument.buy_threshold {
        OrderSide::Buy
    } else if quote.price > instrument.sell_threshold {
        OrderSide::Sell
    } else {
        return None;
    };

    Some(TradeSignal {
        symbol: instrument.symbol.clone(),
        side,
        trigger_price: quote.price,
        decided_at: Utc::now(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use pulse_core::QuoteSource;
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;

    fn instrument() -> Instrument {
        Instrument::new("FFIE", dec!(0.58), dec!(0.60))
    }

    fn quote(price: Decimal) -> Quote {
        Quote::new("FFIE", price, Utc::now(), QuoteSource::LiveTrade)
    }

    #[test]
    fn test_unavailable_quote_is_never_a_signal() {
        assert!(evaluate(None, &instrument()).is_none());
    }

    #[test]
    fn test_price_below_buy_threshold() {
        let signal = evaluate(Some(&quote(dec!(0.55))), &instrument()).unwrap();
        assert_eq!(signal.side, OrderSide::Buy);
        assert_eq!(signal.trigger_price, dec!(0.55));
    }

    #[test]
    fn test_price_above_sell_threshold() {
        let signal = evaluate(Some(&quote(dec!(0.61))), &instrument()).unwrap();
        assert_eq!(signal.side, OrderSide::Sell);
    }

    #[test]
    fn test_price_inside_band() {
        assert!(evaluate(Some(&quote(dec!(0.59))), &instrument()).is_none());
    }

    #[test]
    fn test_boundary_prices_are_not_signals() {
        // Exactly at a threshold: strict comparison, no signal.
        assert!(evaluate(Some(&quote(dec!(0.58))), &instrument()).is_none());
        assert!(evaluate(Some(&quote(dec!(0.60))), &instrument()).is_none());
    }

    #[test]
    fn test_overlapping_thresholds_buy_wins_below_buy() {
        // buy 0.60 >= sell 0.58: the evaluator applies the rules in order
        // without validating the configuration.
        let inst = Instrument::new("FFIE", dec!(0.60), dec!(0.58));
        let signal = evaluate(Some(&quote(dec!(0.59))), &inst).unwrap();
        assert_eq!(signal.side, OrderSide::Buy);
    }
}
