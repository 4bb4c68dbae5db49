//! Rendering of a matching pass for the command line.

use crate::domain::{TaxYear, TickerAliases, TimeMs, Trade};
use crate::engine::{
    match_gains, open_positions, DataWarning, Disposal, DisposalTotals, MatchError, MatchOptions,
    Position,
};
use serde::Serialize;
use std::io::Write;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LedgerReport {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tax_year: Option<String>,
    pub totals: DisposalTotals,
    pub disposals: Vec<Disposal>,
    pub open_positions: Vec<Position>,
    pub warnings: Vec<DataWarning>,
}

/// Run one matching pass and keep the disposals that fall in `tax_year`.
///
/// Matching always sees the full history; the year only filters the output.
/// Open positions are taken at the end of the year, or after the last trade.
pub fn build_report(
    trades: &[Trade],
    aliases: &TickerAliases,
    options: &MatchOptions,
    tax_year: Option<TaxYear>,
) -> Result<LedgerReport, MatchError> {
    let report = match_gains(trades, aliases, options)?;

    let disposals: Vec<Disposal> = match tax_year {
        Some(year) => report
            .disposals
            .into_iter()
            .filter(|d| year.contains(d.date()))
            .collect(),
        None => report.disposals,
    };
    let as_of = tax_year
        .and_then(|year| year.end_exclusive())
        .map(|end| TimeMs::new(end.as_ms() - 1));

    Ok(LedgerReport {
        tax_year: tax_year.map(|year| year.label()),
        totals: DisposalTotals::from_disposals(&disposals),
        open_positions: open_positions(trades, aliases, as_of),
        disposals,
        warnings: report.warnings,
    })
}

const CSV_HEADER: [&str; 11] = [
    "sell_date",
    "symbol",
    "canonical_symbol",
    "sell_trade",
    "sell_qty",
    "proceeds_in_base",
    "rule",
    "matched_qty",
    "cost_in_base",
    "buy_trade",
    "buy_date",
];

/// One row per buy-match; pool matches leave the buy columns empty.
pub fn write_csv<W: Write>(disposals: &[Disposal], writer: W) -> Result<(), csv::Error> {
    let mut wtr = csv::Writer::from_writer(writer);
    wtr.write_record(CSV_HEADER)?;

    for disposal in disposals {
        let sell = &disposal.sell;
        for buy_match in &disposal.buy_matches {
            let (buy_identity, buy_date) = match &buy_match.buy_trade {
                Some(buy) => (buy.identity().to_string(), buy.time().to_string()),
                None => (String::new(), String::new()),
            };
            wtr.write_record([
                sell.time().to_string(),
                disposal.display_symbol.to_string(),
                disposal.canonical_symbol.to_string(),
                sell.identity().to_string(),
                sell.qty().to_canonical_string(),
                disposal.proceeds_in_base().to_canonical_string(),
                buy_match.rule.to_string(),
                buy_match.qty.to_canonical_string(),
                buy_match.cost_in_base.to_canonical_string(),
                buy_identity,
                buy_date,
            ])?;
        }
    }

    wtr.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Currency, Decimal, Side, Symbol, TradeFields};

    fn d(s: &str) -> Decimal {
        Decimal::from_str_canonical(s).unwrap()
    }

    fn trade(id: &str, side: Side, time: TimeMs, qty: &str, price: &str) -> Trade {
        Trade::new(TradeFields {
            time,
            symbol: Symbol::new("VOD"),
            side,
            currency: Currency::new("GBP"),
            qty: d(qty),
            price: d(price),
            commission: Decimal::zero(),
            commission_currency: Currency::new("GBP"),
            fx_rate: d("1"),
            trade_id: Some(id.to_string()),
            is_reorganization: false,
            is_reorganization_buy: false,
        })
        .unwrap()
    }

    fn at(year: i32, month: u32, day: u32) -> TimeMs {
        TimeMs::from_ymd_hms(year, month, day, 12, 0, 0).unwrap()
    }

    fn history() -> Vec<Trade> {
        vec![
            trade("b1", Side::Buy, at(2021, 6, 1), "100", "1"),
            trade("s1", Side::Sell, at(2022, 3, 1), "10", "2"),
            trade("s2", Side::Sell, at(2022, 5, 1), "20", "3"),
        ]
    }

    #[test]
    fn test_tax_year_filters_output_only() {
        let report = build_report(
            &history(),
            &TickerAliases::new(),
            &MatchOptions::default(),
            Some(TaxYear::new(2022)),
        )
        .unwrap();

        assert_eq!(report.tax_year.as_deref(), Some("2022-2023"));
        assert_eq!(report.disposals.len(), 1);
        assert_eq!(report.disposals[0].sell.identity(), "id:s2");
        assert_eq!(report.totals.count, 1);
        assert_eq!(report.totals.proceeds_in_base, d("60"));
        assert_eq!(report.totals.cost_in_base, d("20"));
        assert_eq!(report.open_positions.len(), 1);
        assert_eq!(report.open_positions[0].quantity(), d("70"));
    }

    #[test]
    fn test_without_tax_year_reports_everything() {
        let report = build_report(
            &history(),
            &TickerAliases::new(),
            &MatchOptions::default(),
            None,
        )
        .unwrap();
        assert_eq!(report.tax_year, None);
        assert_eq!(report.totals.count, 2);
        assert_eq!(report.totals.profit_in_base, d("50"));
    }

    #[test]
    fn test_csv_one_row_per_buy_match() {
        let trades = vec![
            trade("b1", Side::Buy, at(2022, 5, 1), "5", "1"),
            trade("b0", Side::Buy, at(2021, 5, 1), "10", "1"),
            trade("s1", Side::Sell, at(2022, 5, 1), "8", "2"),
        ];
        let report = match_gains(&trades, &TickerAliases::new(), &MatchOptions::default()).unwrap();

        let mut out = Vec::new();
        write_csv(&report.disposals, &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("sell_date,symbol,canonical_symbol"));
        assert!(lines[1].contains("Same-day"));
        assert!(lines[1].contains("id:b1"));
        assert!(lines[2].contains("Section 104 Holding"));
        assert!(lines[2].ends_with(",,"));
    }
}
