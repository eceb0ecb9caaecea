//! Unit tests for the ingestion schedule

use cron::Schedule;
use kpwatch::core::scheduler::cron_expression;
use std::str::FromStr;

fn spacing(interval: u64) -> Vec<i64> {
    let expr = cron_expression(interval).expect("supported interval");
    let schedule = Schedule::from_str(&expr).unwrap();
    let ticks: Vec<_> = schedule.upcoming(chrono::Utc).take(30).collect();
    ticks.windows(2).map(|w| (w[1] - w[0]).num_seconds()).collect()
}

#[test]
fn minute_intervals_use_minute_field() {
    assert_eq!(cron_expression(180).as_deref(), Some("0 */3 * * * *"));
    assert_eq!(cron_expression(60).as_deref(), Some("0 */1 * * * *"));
}

#[test]
fn sub_minute_intervals_use_seconds_field() {
    assert_eq!(cron_expression(30).as_deref(), Some("*/30 * * * * *"));
}

#[test]
fn hour_intervals_use_hour_field() {
    assert_eq!(cron_expression(3600).as_deref(), Some("0 0 */1 * * *"));
    assert_eq!(cron_expression(3 * 3600).as_deref(), Some("0 0 */3 * * *"));
}

#[test]
fn uneven_intervals_are_rejected() {
    // Each of these would tick at irregular spacing across a boundary.
    for interval in [0, 45, 90, 420, 7 * 60, 5 * 3600, 25 * 3600] {
        assert_eq!(cron_expression(interval), None, "interval {}", interval);
    }
}

#[test]
fn supported_intervals_tick_evenly() {
    for interval in [15, 60, 180, 300, 900, 3600, 2 * 3600] {
        let gaps = spacing(interval);
        assert!(
            gaps.iter().all(|gap| *gap == interval as i64),
            "interval {} produced gaps {:?}",
            interval,
            gaps
        );
    }
}
