use tradegene::data::Bar;
use tradegene::engines::evaluation::{Ledger, MarketSimulator, Wallet};
use tradegene::types::{Market, OrderAmount, Side};

fn bar(close: f64) -> Bar<'static> {
    Bar {
        timestamp: 0,
        close,
        features: &[],
    }
}

fn eth_eur() -> Market {
    Market::parse("ETH-EUR").unwrap()
}

fn funded() -> Ledger {
    Wallet::new("EUR", 1000.0, 0.0025).ledger()
}

#[test]
fn test_buy_charges_fee_on_quote_leg() {
    let market = eth_eur();
    let mut ledger = funded();

    let fill = ledger
        .place_order(&market, Side::Buy, OrderAmount::Quote(1000.0), &bar(100.0))
        .unwrap();

    // 0.25% of 1000 EUR, remainder converted at 100
    assert!((fill.fee - 2.5).abs() < 1e-9);
    assert!((fill.amount - 9.975).abs() < 1e-9);
    assert!(ledger.balance("EUR").abs() < 1e-9);
    assert!((ledger.balance("ETH") - 9.975).abs() < 1e-9);
}

#[test]
fn test_round_trip_net_of_fees() {
    let market = eth_eur();
    let mut ledger = funded();

    ledger
        .place_order(&market, Side::Buy, OrderAmount::Quote(1000.0), &bar(100.0))
        .unwrap();
    let sell = ledger
        .place_order(&market, Side::Sell, OrderAmount::Base(9.975), &bar(110.0))
        .unwrap();

    // 9.975 * 110 = 1097.25 gross, minus 0.25%
    assert!((sell.fee - 2.743125).abs() < 1e-9);
    assert!((ledger.balance("EUR") - 1094.506875).abs() < 1e-9);
    assert!(ledger.balance("ETH").abs() < 1e-12);
}

#[test]
fn test_trades_most_recent_first() {
    let market = eth_eur();
    let mut ledger = funded();

    ledger
        .place_order(&market, Side::Buy, OrderAmount::Quote(500.0), &bar(100.0))
        .unwrap();
    ledger
        .place_order(&market, Side::Sell, OrderAmount::Base(1.0), &bar(105.0))
        .unwrap();
    ledger
        .place_order(&market, Side::Buy, OrderAmount::Quote(100.0), &bar(95.0))
        .unwrap();

    let sides: Vec<Side> = ledger.trades(&market).iter().map(|f| f.side).collect();
    assert_eq!(sides, vec![Side::Buy, Side::Sell, Side::Buy]);
    assert_eq!(ledger.last_buy_price(&market), 95.0);
}

#[test]
fn test_last_buy_price_without_buys_is_zero() {
    let ledger = funded();
    assert_eq!(ledger.last_buy_price(&eth_eur()), 0.0);
}

#[test]
fn test_net_worth_values_position_at_close() {
    let market = eth_eur();
    let mut ledger = funded();
    ledger
        .place_order(&market, Side::Buy, OrderAmount::Quote(400.0), &bar(100.0))
        .unwrap();

    // 600 EUR cash + 3.99 ETH
    assert!((ledger.net_worth(&market, 200.0) - (600.0 + 3.99 * 200.0)).abs() < 1e-9);
}

#[test]
fn test_insufficient_balance_leaves_ledger_untouched() {
    let market = eth_eur();
    let mut ledger = funded();

    assert!(ledger
        .place_order(&market, Side::Buy, OrderAmount::Quote(1500.0), &bar(100.0))
        .is_err());
    assert!(ledger
        .place_order(&market, Side::Sell, OrderAmount::Base(1.0), &bar(100.0))
        .is_err());
    assert_eq!(ledger.balance("EUR"), 1000.0);
    assert!(ledger.trades(&market).is_empty());
}

#[test]
fn test_zero_price_rejected() {
    let market = eth_eur();
    let mut ledger = funded();
    assert!(ledger
        .place_order(&market, Side::Buy, OrderAmount::Quote(100.0), &bar(0.0))
        .is_err());
}
