// tests/scanner_tests.rs

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use volume_crossover::{
    compute_averages, daily_frame, find_crossovers, intraday_frame, AverageVolumeTable, DailyRecord,
    IntradayTick, ScanSettings, SessionFilter,
};

fn day(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn at(date: NaiveDate, h: u32, m: u32, s: u32) -> NaiveDateTime {
    date.and_hms_opt(h, m, s).unwrap()
}

fn averages_for(target: NaiveDate, entries: &[(&str, f64)]) -> AverageVolumeTable {
    let history = target - chrono::Duration::days(1);
    let records: Vec<DailyRecord> = entries
        .iter()
        .map(|(stock, volume)| DailyRecord::new(history, stock, *volume))
        .collect();
    let df = daily_frame(&records).unwrap();
    compute_averages(&df, &[target], &ScanSettings::default()).unwrap()
}

#[test]
fn test_session_filter_boundaries() {
    let target = day(2024, 4, 19);
    let ticks = vec![
        IntradayTick::new(at(target, 9, 14, 59), "ABC", 1.0),
        IntradayTick::new(at(target, 9, 15, 0), "ABC", 1.0),
        IntradayTick::new(at(target, 15, 29, 59), "ABC", 1.0),
        IntradayTick::new(at(day(2024, 4, 18), 23, 59, 59), "ABC", 1.0),
        IntradayTick::new(at(day(2024, 4, 20), 9, 15, 0), "ABC", 1.0),
    ];
    let df = intraday_frame(&ticks).unwrap();
    let market_open = NaiveTime::from_hms_opt(9, 15, 0).unwrap();

    let filtered = SessionFilter::new(&df, target, market_open).filter().unwrap();

    assert_eq!(filtered.height(), 2);
}

#[test]
fn test_first_crossover_found() {
    let target = day(2024, 4, 19);
    let averages = averages_for(target, &[("ABC", 200.0)]);
    let ticks = vec![
        IntradayTick::new(at(target, 9, 15, 0), "ABC", 100.0),
        IntradayTick::new(at(target, 9, 30, 0), "ABC", 100.0),
        IntradayTick::new(at(target, 9, 45, 0), "ABC", 50.0),
        IntradayTick::new(at(target, 9, 50, 0), "ABC", 500.0),
    ];
    let df = intraday_frame(&ticks).unwrap();

    let results = find_crossovers(&df, &averages, target, &ScanSettings::default()).unwrap();

    assert_eq!(results.len(), 1);
    assert_eq!(results[0].stock, "ABC");
    assert_eq!(results[0].target_date, target);
    assert_eq!(results[0].first_crossover, Some(at(target, 9, 45, 0)));
}

#[test]
fn test_no_crossover_is_absent() {
    let target = day(2024, 4, 19);
    let averages = averages_for(target, &[("XYZ", 500.0)]);
    let ticks = vec![
        IntradayTick::new(at(target, 9, 20, 0), "XYZ", 200.0),
        IntradayTick::new(at(target, 10, 0, 0), "XYZ", 300.0),
        IntradayTick::new(at(target, 10, 25, 0), "XYZ", 150.0),
    ];
    let df = intraday_frame(&ticks).unwrap();

    let results = find_crossovers(&df, &averages, target, &ScanSettings::default()).unwrap();

    assert_eq!(results.len(), 1);
    assert_eq!(results[0].first_crossover, None);
}

#[test]
fn test_window_excludes_tick_exactly_sixty_minutes_old() {
    let target = day(2024, 4, 19);
    let averages = averages_for(target, &[("ABC", 240.0)]);

    let ticks = vec![
        IntradayTick::new(at(target, 10, 0, 0), "ABC", 200.0),
        IntradayTick::new(at(target, 10, 5, 0), "ABC", 30.0),
        // 10:00 drops out here, so the sum is 50 and not 250
        IntradayTick::new(at(target, 11, 0, 0), "ABC", 20.0),
    ];
    let df = intraday_frame(&ticks).unwrap();
    let results = find_crossovers(&df, &averages, target, &ScanSettings::default()).unwrap();
    assert_eq!(results[0].first_crossover, None);

    let ticks = vec![
        IntradayTick::new(at(target, 10, 0, 0), "ABC", 200.0),
        IntradayTick::new(at(target, 10, 5, 0), "ABC", 30.0),
        IntradayTick::new(at(target, 10, 59, 59), "ABC", 20.0),
    ];
    let df = intraday_frame(&ticks).unwrap();
    let results = find_crossovers(&df, &averages, target, &ScanSettings::default()).unwrap();
    assert_eq!(results[0].first_crossover, Some(at(target, 10, 59, 59)));
}

#[test]
fn test_unsorted_ticks_are_scanned_in_time_order() {
    let target = day(2024, 4, 19);
    let averages = averages_for(target, &[("ABC", 150.0)]);
    let ticks = vec![
        IntradayTick::new(at(target, 11, 0, 0), "ABC", 100.0),
        IntradayTick::new(at(target, 9, 30, 0), "ABC", 100.0),
        IntradayTick::new(at(target, 10, 0, 0), "ABC", 100.0),
    ];
    let df = intraday_frame(&ticks).unwrap();

    let results = find_crossovers(&df, &averages, target, &ScanSettings::default()).unwrap();
    assert_eq!(results[0].first_crossover, Some(at(target, 10, 0, 0)));
}

#[test]
fn test_pre_market_volume_is_ignored() {
    let target = day(2024, 4, 19);
    let averages = averages_for(target, &[("ABC", 500.0)]);
    let ticks = vec![
        IntradayTick::new(at(target, 9, 0, 0), "ABC", 10_000.0),
        IntradayTick::new(at(target, 9, 20, 0), "ABC", 10.0),
    ];
    let df = intraday_frame(&ticks).unwrap();

    let results = find_crossovers(&df, &averages, target, &ScanSettings::default()).unwrap();
    assert_eq!(results[0].first_crossover, None);
}

#[test]
fn test_stocks_are_scanned_independently() {
    let target = day(2024, 4, 19);
    let averages = averages_for(target, &[("ABC", 100.0), ("XYZ", 100.0)]);
    let ticks = vec![
        IntradayTick::new(at(target, 9, 20, 0), "XYZ", 60.0),
        IntradayTick::new(at(target, 9, 21, 0), "ABC", 60.0),
        IntradayTick::new(at(target, 9, 22, 0), "XYZ", 60.0),
        IntradayTick::new(at(target, 9, 23, 0), "ABC", 30.0),
    ];
    let df = intraday_frame(&ticks).unwrap();

    let results = find_crossovers(&df, &averages, target, &ScanSettings::default()).unwrap();

    let stocks: Vec<&str> = results.iter().map(|r| r.stock.as_str()).collect();
    assert_eq!(stocks, vec!["XYZ", "ABC"]);
    assert_eq!(results[0].first_crossover, Some(at(target, 9, 22, 0)));
    assert_eq!(results[1].first_crossover, None);
}

#[test]
fn test_stock_without_average_still_reported() {
    let target = day(2024, 4, 19);
    let averages = averages_for(target, &[("ABC", 10.0)]);
    let ticks = vec![
        IntradayTick::new(at(target, 9, 20, 0), "NEW", 1_000_000.0),
        IntradayTick::new(at(target, 9, 21, 0), "ABC", 20.0),
    ];
    let df = intraday_frame(&ticks).unwrap();

    let results = find_crossovers(&df, &averages, target, &ScanSettings::default()).unwrap();

    assert_eq!(results.len(), 2);
    assert_eq!(results[0].stock, "NEW");
    assert_eq!(results[0].first_crossover, None);
    assert_eq!(results[1].first_crossover, Some(at(target, 9, 21, 0)));
}

#[test]
fn test_empty_intraday_gives_no_rows() {
    let target = day(2024, 4, 19);
    let averages = averages_for(target, &[("ABC", 10.0)]);
    let df = intraday_frame(&[]).unwrap();

    let results = find_crossovers(&df, &averages, target, &ScanSettings::default()).unwrap();
    assert!(results.is_empty());
}

#[test]
fn test_custom_window_and_open() {
    let target = day(2024, 4, 19);
    let averages = averages_for(target, &[("ABC", 150.0)]);
    let ticks = vec![
        IntradayTick::new(at(target, 9, 0, 0), "ABC", 100.0),
        IntradayTick::new(at(target, 9, 10, 0), "ABC", 100.0),
    ];
    let df = intraday_frame(&ticks).unwrap();

    let settings = ScanSettings {
        rolling_window_minutes: 5,
        market_open: NaiveTime::from_hms_opt(9, 0, 0).unwrap(),
        ..ScanSettings::default()
    };
    let results = find_crossovers(&df, &averages, target, &settings).unwrap();
    assert_eq!(results[0].first_crossover, None);

    let settings = ScanSettings {
        rolling_window_minutes: 15,
        ..settings
    };
    let results = find_crossovers(&df, &averages, target, &settings).unwrap();
    assert_eq!(results[0].first_crossover, Some(at(target, 9, 10, 0)));
}

#[test]
fn test_decimal_window_equal_to_average_is_not_a_crossover() {
    let target = day(2024, 4, 19);
    let averages = averages_for(target, &[("ABC", 0.2)]);
    let ticks = vec![
        IntradayTick::new(at(target, 9, 15, 0), "ABC", 0.1),
        IntradayTick::new(at(target, 9, 45, 0), "ABC", 0.1),
        // 09:15 drops out; the window holds 09:45 and 10:15, summing to 0.2
        IntradayTick::new(at(target, 10, 15, 0), "ABC", 0.1),
    ];
    let df = intraday_frame(&ticks).unwrap();

    let results = find_crossovers(&df, &averages, target, &ScanSettings::default()).unwrap();
    assert_eq!(results[0].first_crossover, None);
}
