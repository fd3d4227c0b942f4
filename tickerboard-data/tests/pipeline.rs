use rust_decimal_macros::dec;
use std::collections::BTreeSet;
use tickerboard_data::{
    DataError, FavoriteSet, TickerBoard, TickerMap,
    feed::{Snapshot, binance, tonapi},
    merge,
    portfolio::{Portfolio, PortfolioPosition, valuate},
    storage::{LocalStore, StorageKey},
    symbol::Symbol,
    views::{self, QuoteFilter, SortColumn, SortDirection},
};

const SNAPSHOT: &str = r#"[
    {"symbol":"BTCUSDT","lastPrice":"60000.00000000","priceChangePercent":"1.250","quoteVolume":"1234567.89000000","closeTime":1700000000000},
    {"symbol":"ETHUSDT","lastPrice":"3000.00000000","priceChangePercent":"-0.500","quoteVolume":"654321.00000000","closeTime":1700000000000},
    {"symbol":"BTCUPUSDT","lastPrice":"8.00000000","priceChangePercent":"3.000","quoteVolume":"1000.00000000","closeTime":1700000000000},
    {"symbol":"ETHEUR","lastPrice":"2800.00000000","priceChangePercent":"0.100","quoteVolume":"1000.00000000","closeTime":1700000000000},
    {"symbol":"DEADUSDT","lastPrice":"0.00000000","priceChangePercent":"0.000","quoteVolume":"0.00000000","closeTime":1700000000000}
]"#;

const RATES: &str = r#"{"rates":{"TON":{"prices":{"USD":5.2},"diff_24h":{"USD":"+1.23%"}}}}"#;

const LIVE_FRAME: &str = r#"[
    {"e":"24hrTicker","E":1700000001000,"s":"BTCUSDT","c":"60500.00","P":"2.100","q":"1300000.00"},
    {"e":"24hrTicker","E":1700000001000,"s":"SOLUSDT","c":"150.00","P":"-1.000","q":"500000.00"}
]"#;

fn parse_cycle() -> Snapshot {
    Snapshot {
        primary: binance::parse_snapshot(SNAPSHOT.as_bytes()).unwrap(),
        secondary: Some(
            tonapi::parse_rates(RATES.as_bytes(), "TON", "USD", &Symbol::new("TONUSDT")).unwrap(),
        ),
    }
}

#[test]
fn test_snapshot_to_views_and_valuation() {
    let snapshot = parse_cycle();
    assert_eq!(snapshot.primary.len(), 2);

    let mapping = merge::merge(
        &TickerMap::new(),
        Some(snapshot.primary.as_slice()),
        snapshot.secondary.as_deref(),
        &FavoriteSet::new(),
        &BTreeSet::new(),
    );

    assert_eq!(mapping.len(), 3);
    let ton = mapping.get("TONUSDT").unwrap();
    assert_eq!(ton.quote_volume, dec!(0));
    assert_eq!(ton.price_change_percent, Some(dec!(1.23)));
    assert_eq!(ton.display_pair, "TON/USDT");

    let table = views::sort(
        views::filter(&mapping, QuoteFilter::Usdt, &FavoriteSet::new()),
        SortColumn::Volume,
        SortDirection::Descending,
    );
    let rendered = table
        .iter()
        .map(|record| (record.symbol.as_str(), views::format_price(record), views::format_volume(record)))
        .collect::<Vec<_>>();
    assert_eq!(
        rendered,
        vec![
            ("BTCUSDT", "60000.00".to_string(), "1,234,567".to_string()),
            ("ETHUSDT", "3000.00".to_string(), "654,321".to_string()),
            ("TONUSDT", "5.2000".to_string(), "0".to_string()),
        ]
    );

    let positions = vec![
        PortfolioPosition::new("TON", dec!(100), dec!(4)).unwrap(),
        PortfolioPosition::new("ETHUSDT", dec!(2), dec!(2500)).unwrap(),
    ];
    let valuation = valuate(&positions, &mapping, None);
    assert_eq!(valuation.totals.investment, dec!(5400));
    assert_eq!(valuation.totals.current_value, dec!(6520));
    assert_eq!(valuation.totals.profit, dec!(1120));
}

#[test]
fn test_live_updates_then_failed_cycle_retains_data() {
    let board = TickerBoard::default();
    let mut portfolio = Portfolio::default();
    portfolio.add("SOL", dec!(10), dec!(100)).unwrap();
    board.set_held(portfolio.held_symbols());

    board.apply_snapshot(Ok(parse_cycle()));

    let batch = binance::parse_live_frame(LIVE_FRAME).unwrap();
    board.apply_live(&batch);

    let mapping = board.mapping();
    let btc = mapping.get("BTCUSDT").unwrap();
    assert_eq!(btc.last_price, dec!(60500));
    assert_eq!(btc.quote_volume, dec!(1234567.89));
    assert_eq!(mapping.len(), 4);

    let valuation = portfolio.revalue(&mapping).clone();
    assert_eq!(valuation.totals.profit, dec!(500));

    // a cycle whose primary source failed leaves every record in place
    board.apply_snapshot(Err(DataError::Http("timed out".to_string())));
    assert_eq!(*board.mapping(), *mapping);
    assert!(board.last_error().is_some());

    // a later snapshot without SOL keeps it because it is held
    board.apply_snapshot(Ok(parse_cycle()));
    assert!(board.mapping().contains("SOLUSDT"));
    assert_eq!(portfolio.revalue(&board.mapping()).totals.profit, dec!(500));
}

#[test]
fn test_persisted_state_survives_restart() {
    let store = LocalStore::new(
        std::env::temp_dir().join(format!("tickerboard-pipeline-{}", uuid::Uuid::new_v4())),
    );

    let mut portfolio = Portfolio::default();
    let id = portfolio.add("BTC", dec!(0.25), dec!(40000)).unwrap();
    let favorites = ["TONUSDT"].into_iter().collect::<FavoriteSet>();

    store.save(StorageKey::Portfolio, &portfolio.positions()).unwrap();
    store.save(StorageKey::Favorites, &favorites).unwrap();

    let restored = Portfolio::new(store.load_each::<PortfolioPosition>(StorageKey::Portfolio));
    assert_eq!(restored.positions().len(), 1);
    assert_eq!(restored.positions()[0].id, id);
    assert_eq!(store.load::<FavoriteSet>(StorageKey::Favorites), favorites);

    std::fs::remove_dir_all(store.root()).unwrap();
}
