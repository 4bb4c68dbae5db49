use cgt_ledger::domain::DAY_MS;
use cgt_ledger::engine::{MatchError, MatchRule};
use cgt_ledger::{
    dedupe_trades, match_gains, Currency, Decimal, DisposalTotals, MatchOptions, Side, Symbol,
    TickerAliases, TickerRename, TimeMs, Trade, TradeFields,
};

const T0: i64 = 1_650_000_000_000;

fn d(s: &str) -> Decimal {
    Decimal::from_str_canonical(s).unwrap()
}

fn trade(
    id: &str,
    symbol: &str,
    side: Side,
    time_ms: i64,
    qty: &str,
    price: &str,
    commission: &str,
) -> Trade {
    Trade::new(TradeFields {
        time: TimeMs::new(time_ms),
        symbol: Symbol::new(symbol),
        side,
        currency: Currency::new("GBP"),
        qty: d(qty),
        price: d(price),
        commission: d(commission),
        commission_currency: Currency::new("GBP"),
        fx_rate: d("1"),
        trade_id: Some(id.to_string()),
        is_reorganization: false,
        is_reorganization_buy: false,
    })
    .unwrap()
}

fn buy(id: &str, time_ms: i64, qty: &str, price: &str) -> Trade {
    trade(id, "XYZ", Side::Buy, time_ms, qty, price, "0")
}

fn sell(id: &str, time_ms: i64, qty: &str, price: &str) -> Trade {
    trade(id, "XYZ", Side::Sell, time_ms, qty, price, "0")
}

fn run(trades: &[Trade]) -> Result<cgt_ledger::MatchReport, MatchError> {
    match_gains(trades, &TickerAliases::new(), &MatchOptions::default())
}

#[test]
fn test_pooled_average_cost_example() {
    let trades = vec![
        trade("b1", "XYZ", Side::Buy, T0, "100", "10", "1"),
        trade("b2", "XYZ", Side::Buy, T0 + 40 * DAY_MS, "50", "12", "1"),
        trade("s1", "XYZ", Side::Sell, T0 + 100 * DAY_MS, "80", "15", "1"),
    ];
    let report = run(&trades).unwrap();

    assert_eq!(report.disposals.len(), 1);
    let disposal = &report.disposals[0];
    assert_eq!(disposal.buy_matches.len(), 1);
    assert_eq!(disposal.buy_matches[0].rule, MatchRule::Section104);
    assert_eq!(disposal.buy_matches[0].qty, d("80"));
    assert_eq!(disposal.buy_matches[0].cost_in_base, d("854.4"));
    assert!(disposal.buy_matches[0].buy_trade.is_none());
    assert_eq!(disposal.proceeds_in_base(), d("1199"));
    assert_eq!(disposal.profit_in_base(), d("344.6"));
}

#[test]
fn test_second_pool_disposal_keeps_average() {
    let trades = vec![
        trade("b1", "XYZ", Side::Buy, T0, "100", "10", "1"),
        trade("b2", "XYZ", Side::Buy, T0 + 40 * DAY_MS, "50", "12", "1"),
        trade("s1", "XYZ", Side::Sell, T0 + 100 * DAY_MS, "80", "15", "1"),
        trade("s2", "XYZ", Side::Sell, T0 + 200 * DAY_MS, "70", "15", "0"),
    ];
    let report = run(&trades).unwrap();

    assert_eq!(report.disposals.len(), 2);
    assert_eq!(report.disposals[1].cost_in_base(), d("747.6"));
    let totals = DisposalTotals::from_disposals(&report.disposals);
    assert_eq!(totals.cost_in_base, d("1602"));
}

#[test]
fn test_rule_precedence() {
    let trades = vec![
        buy("old", T0, "100", "5"),
        buy("recent", T0 + 90 * DAY_MS, "10", "8"),
        buy("today", T0 + 100 * DAY_MS, "10", "9"),
        sell("s1", T0 + 100 * DAY_MS + 1000, "30", "10"),
    ];
    let report = run(&trades).unwrap();
    let matches = &report.disposals[0].buy_matches;

    let rules: Vec<MatchRule> = matches.iter().map(|m| m.rule).collect();
    assert_eq!(
        rules,
        vec![
            MatchRule::SameDay,
            MatchRule::BedAndBreakfast,
            MatchRule::Section104
        ]
    );
    assert_eq!(matches[0].buy_trade.as_ref().unwrap().identity(), "id:today");
    assert_eq!(matches[0].cost_in_base, d("90"));
    assert_eq!(matches[1].buy_trade.as_ref().unwrap().identity(), "id:recent");
    assert_eq!(matches[1].cost_in_base, d("80"));
    assert_eq!(matches[2].qty, d("10"));
    assert_eq!(matches[2].cost_in_base, d("50"));
}

#[test]
fn test_bed_and_breakfast_window_edges() {
    let sell_time = T0 + 100 * DAY_MS;

    let exactly_30_days = vec![
        buy("pool", T0, "10", "1"),
        buy("edge", sell_time - 30 * DAY_MS, "5", "2"),
        sell("s", sell_time, "5", "3"),
    ];
    let report = run(&exactly_30_days).unwrap();
    assert!(report.disposals[0]
        .buy_matches
        .iter()
        .all(|m| m.rule == MatchRule::Section104));

    let just_inside = vec![
        buy("pool", T0, "10", "1"),
        buy("edge", sell_time - 30 * DAY_MS + 1, "5", "2"),
        sell("s", sell_time, "5", "3"),
    ];
    let report = run(&just_inside).unwrap();
    let matches = &report.disposals[0].buy_matches;
    assert_eq!(matches.len(), 1);
    assert_eq!(matches[0].rule, MatchRule::BedAndBreakfast);
    assert_eq!(matches[0].buy_trade.as_ref().unwrap().identity(), "id:edge");
}

#[test]
fn test_buy_after_sell_is_not_a_thirty_day_match() {
    let sell_time = T0 + 100 * DAY_MS;
    let trades = vec![
        buy("pool", T0, "10", "1"),
        sell("s", sell_time, "5", "3"),
        buy("later", sell_time + 2 * DAY_MS, "5", "2"),
    ];
    let report = run(&trades).unwrap();
    let matches = &report.disposals[0].buy_matches;
    assert_eq!(matches.len(), 1);
    assert_eq!(matches[0].rule, MatchRule::Section104);
}

#[test]
fn test_matched_quantity_equals_sell_quantity() {
    let trades = vec![
        buy("b1", T0, "7", "3"),
        buy("b2", T0 + 10 * DAY_MS, "11", "4"),
        sell("s1", T0 + 12 * DAY_MS, "7", "5"),
        buy("b3", T0 + 50 * DAY_MS, "13", "2"),
        sell("s2", T0 + 50 * DAY_MS, "15", "6"),
        sell("s3", T0 + 300 * DAY_MS, "9", "7"),
    ];
    let report = run(&trades).unwrap();

    assert_eq!(report.disposals.len(), 3);
    for disposal in &report.disposals {
        assert_eq!(disposal.matched_qty(), disposal.qty());
    }
    let costs: Vec<Decimal> = report.disposals.iter().map(|d| d.cost_in_base()).collect();
    assert_eq!(costs, vec![d("21"), d("34"), d("36")]);
    let total_cost: Decimal = costs.iter().sum();
    assert_eq!(total_cost, d("91"));
}

#[test]
fn test_insufficient_holding_fails_the_pass() {
    let trades = vec![buy("b1", T0, "5", "1"), sell("s1", T0 + DAY_MS, "8", "2")];
    match run(&trades) {
        Err(MatchError::InsufficientPool {
            symbol,
            requested,
            available,
        }) => {
            assert_eq!(symbol, Symbol::new("XYZ"));
            assert_eq!(requested, d("3"));
            assert_eq!(available, d("0"));
        }
        other => panic!("Expected InsufficientPool, got {:?}", other),
    }
}

#[test]
fn test_split_inherits_cost_basis() {
    let split_time = T0 + 10 * DAY_MS;
    let mut split_sell = trade("split-out", "XYZ", Side::Sell, split_time, "100", "0", "0");
    split_sell.set_reorganization(true);
    let mut split_buy = trade("split-in", "XYZ", Side::Buy, split_time, "200", "0", "0");
    split_buy.set_reorganization(true);
    split_buy.set_reorganization_buy(true);

    let trades = vec![
        buy("b1", T0, "100", "10"),
        split_sell,
        split_buy,
        sell("s1", T0 + 100 * DAY_MS, "50", "8"),
    ];
    let report = run(&trades).unwrap();

    assert_eq!(report.disposals.len(), 1);
    let disposal = &report.disposals[0];
    assert_eq!(disposal.sell.identity(), "id:s1");
    assert_eq!(disposal.buy_matches[0].rule, MatchRule::Section104);
    assert_eq!(disposal.cost_in_base(), d("250"));
    assert_eq!(disposal.profit_in_base(), d("150"));
}

#[test]
fn test_sells_after_split_cannot_exceed_post_split_holding() {
    let split_time = T0 + 10 * DAY_MS;
    let mut split_sell = trade("split-out", "XYZ", Side::Sell, split_time, "100", "0", "0");
    split_sell.set_reorganization(true);
    let mut split_buy = trade("split-in", "XYZ", Side::Buy, split_time, "200", "0", "0");
    split_buy.set_reorganization(true);
    split_buy.set_reorganization_buy(true);

    let within_window = vec![
        buy("b1", T0, "100", "10"),
        split_sell.clone(),
        split_buy.clone(),
        sell("s1", T0 + 15 * DAY_MS, "50", "8"),
    ];
    let report = run(&within_window).unwrap();
    let matches = &report.disposals[0].buy_matches;
    assert_eq!(matches.len(), 1);
    assert_eq!(matches[0].rule, MatchRule::Section104);
    assert_eq!(matches[0].cost_in_base, d("250"));

    let oversold = vec![
        buy("b1", T0, "100", "10"),
        split_sell,
        split_buy,
        sell("s1", T0 + 15 * DAY_MS, "50", "8"),
        sell("s2", T0 + 100 * DAY_MS, "200", "8"),
    ];
    match run(&oversold) {
        Err(MatchError::InsufficientPool {
            requested,
            available,
            ..
        }) => {
            assert_eq!(requested, d("200"));
            assert_eq!(available, d("150"));
        }
        other => panic!("Expected InsufficientPool, got {:?}", other),
    }
}

#[test]
fn test_rename_links_history_and_reports_current_ticker() {
    let mut aliases = TickerAliases::new();
    aliases.insert(
        Symbol::new("FB"),
        TickerRename::new(TimeMs::new(T0 + 5 * DAY_MS), "META"),
    );
    let trades = vec![
        trade("b1", "FB", Side::Buy, T0, "10", "100", "0"),
        trade("s1", "META", Side::Sell, T0 + 50 * DAY_MS, "10", "200", "0"),
    ];
    let report = match_gains(&trades, &aliases, &MatchOptions::default()).unwrap();

    let disposal = &report.disposals[0];
    assert_eq!(disposal.canonical_symbol, Symbol::new("FB"));
    assert_eq!(disposal.display_symbol, Symbol::new("META"));
    assert_eq!(disposal.cost_in_base(), d("1000"));
    assert!(report.warnings.is_empty());
}

#[test]
fn test_duplicate_import_does_not_change_result() {
    let trades = vec![
        buy("b1", T0, "10", "1"),
        sell("s1", T0 + 40 * DAY_MS, "4", "2"),
    ];
    let mut doubled = trades.clone();
    doubled.extend(trades.clone());

    let once = run(&trades).unwrap();
    let twice = run(&dedupe_trades(doubled)).unwrap();
    assert_eq!(once, twice);
}
