//! Payment calendar

use serde::Serialize;
use time::{Date, Month};
use whatsub_shared::Subscription;

use crate::dates::parse_billing_day;

/// One day cell of the calendar grid
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CalendarDay {
    pub date: Date,
    pub subscriptions: Vec<Subscription>,
    pub total: f64,
}

/// A month of billing dates laid out for a Sunday-first grid
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CalendarMonth {
    pub year: i32,
    pub month: u8,
    /// Blank cells before the 1st (Sunday = 0)
    pub leading_blank_days: u8,
    pub days: Vec<CalendarDay>,
    /// Sum of native prices billed this month
    pub month_total: f64,
}

/// Records billed on the given UTC day
pub fn payments_on(subscriptions: &[Subscription], day: Date) -> Vec<&Subscription> {
    subscriptions
        .iter()
        .filter(|sub| parse_billing_day(&sub.next_billing_date) == Some(day))
        .collect()
}

/// Sum of native prices for records billed in the given month
pub fn month_total(subscriptions: &[Subscription], year: i32, month: Month) -> f64 {
    subscriptions
        .iter()
        .filter(|sub| {
            parse_billing_day(&sub.next_billing_date)
                .is_some_and(|day| day.year() == year && day.month() == month)
        })
        .map(|sub| sub.price)
        .sum()
}

/// Build the grid for a month. Returns `None` for an invalid year.
pub fn calendar_month(subscriptions: &[Subscription], year: i32, month: Month) -> Option<CalendarMonth> {
    let first = Date::from_calendar_date(year, month, 1).ok()?;
    let length = time::util::days_in_year_month(year, month);

    // Parse once; the grid walks every day of the month
    let dated: Vec<(Date, &Subscription)> = subscriptions
        .iter()
        .filter_map(|sub| parse_billing_day(&sub.next_billing_date).map(|day| (day, sub)))
        .filter(|(day, _)| day.year() == year && day.month() == month)
        .collect();

    let days = (1..=length)
        .filter_map(|n| Date::from_calendar_date(year, month, n).ok())
        .map(|date| {
            let subscriptions: Vec<Subscription> = dated
                .iter()
                .filter(|(day, _)| *day == date)
                .map(|(_, sub)| (*sub).clone())
                .collect();
            let total = subscriptions.iter().map(|s| s.price).sum();
            CalendarDay {
                date,
                subscriptions,
                total,
            }
        })
        .collect();

    Some(CalendarMonth {
        year,
        month: month as u8,
        leading_blank_days: first.weekday().number_days_from_sunday(),
        days,
        month_total: dated.iter().map(|(_, sub)| sub.price).sum(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{approx_eq, subscription_due};
    use time::macros::date;
    use whatsub_shared::BillingCycle;

    fn sample() -> Vec<Subscription> {
        vec![
            subscription_due("1", 15.99, BillingCycle::Monthly, "2025-11-20T00:00:00Z"),
            subscription_due("2", 9.99, BillingCycle::Monthly, "2025-11-20"),
            subscription_due("3", 120.0, BillingCycle::Yearly, "2025-11-03T12:00:00Z"),
            subscription_due("4", 5.0, BillingCycle::Monthly, "2025-12-01"),
            subscription_due("5", 7.0, BillingCycle::Monthly, "n/a"),
        ]
    }

    #[test]
    fn test_payments_on_day() {
        let subs = sample();
        let ids: Vec<&str> = payments_on(&subs, date!(2025 - 11 - 20))
            .iter()
            .map(|s| s.id.as_str())
            .collect();
        assert_eq!(ids, vec!["1", "2"]);
        assert!(payments_on(&subs, date!(2025 - 11 - 21)).is_empty());
    }

    #[test]
    fn test_month_total_uses_native_price() {
        let subs = sample();
        assert!(approx_eq(
            month_total(&subs, 2025, Month::November),
            15.99 + 9.99 + 120.0
        ));
        assert!(approx_eq(month_total(&subs, 2025, Month::December), 5.0));
        assert_eq!(month_total(&subs, 2024, Month::November), 0.0);
    }

    #[test]
    fn test_calendar_month_layout() {
        let subs = sample();
        let cal = calendar_month(&subs, 2025, Month::November).unwrap();

        assert_eq!(cal.year, 2025);
        assert_eq!(cal.month, 11);
        // 2025-11-01 is a Saturday
        assert_eq!(cal.leading_blank_days, 6);
        assert_eq!(cal.days.len(), 30);
        assert_eq!(cal.days[19].date, date!(2025 - 11 - 20));
        assert_eq!(cal.days[19].subscriptions.len(), 2);
        assert!(approx_eq(cal.days[19].total, 25.98));
        assert_eq!(cal.days[2].subscriptions.len(), 1);
        assert!(approx_eq(cal.month_total, 145.98));
    }

    #[test]
    fn test_calendar_february_leap_year() {
        let cal = calendar_month(&[], 2024, Month::February).unwrap();
        assert_eq!(cal.days.len(), 29);
        assert_eq!(cal.month_total, 0.0);
    }
}
