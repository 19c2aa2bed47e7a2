//! Date enumeration helpers for the yearly service generator.

use std::time::SystemTime;

use time::{Date, Duration, Month, PrimitiveDateTime, Time, Weekday, macros::time};

/// Start time of the first Sunday service.
pub const FIRST_SERVICE: Time = time!(8:00);
/// Start time of the second Sunday service.
pub const SECOND_SERVICE: Time = time!(10:45);
/// Start time of a quarantine contingency service.
pub const QUARANTINE_SERVICE: Time = time!(19:00);

/// Quarantine services are Saturdays strictly before this date and Wednesdays
/// strictly after it.
pub fn quarantine_cutoff(year: i32) -> Option<Date> {
    Date::from_calendar_date(year, Month::February, 21).ok()
}

/// Every date of `year` falling on `weekday`, in chronological order.
pub fn weekdays_of_year(year: i32, weekday: Weekday) -> Vec<Date> {
    let Ok(mut date) = Date::from_calendar_date(year, Month::January, 1) else {
        return Vec::new();
    };
    while date.weekday() != weekday {
        match date.next_day() {
            Some(next) => date = next,
            None => return Vec::new(),
        }
    }

    let mut dates = Vec::with_capacity(53);
    while date.year() == year {
        dates.push(date);
        date = match date.checked_add(Duration::weeks(1)) {
            Some(next) => next,
            None => break,
        };
    }
    dates
}

/// All Sundays of `year`.
pub fn sundays_of_year(year: i32) -> Vec<Date> {
    weekdays_of_year(year, Weekday::Sunday)
}

/// Saturdays of `year` strictly before the quarantine cutoff.
pub fn quarantine_saturdays(year: i32) -> Vec<Date> {
    let Some(cutoff) = quarantine_cutoff(year) else {
        return Vec::new();
    };
    weekdays_of_year(year, Weekday::Saturday)
        .into_iter()
        .filter(|date| *date < cutoff)
        .collect()
}

/// Wednesdays of `year` strictly after the quarantine cutoff.
pub fn quarantine_wednesdays(year: i32) -> Vec<Date> {
    let Some(cutoff) = quarantine_cutoff(year) else {
        return Vec::new();
    };
    weekdays_of_year(year, Weekday::Wednesday)
        .into_iter()
        .filter(|date| *date > cutoff)
        .collect()
}

/// The Sunday a quarantine service borrows its group from: the next day for a
/// Saturday, the preceding Sunday for a Wednesday.
pub fn companion_sunday(date: Date) -> Option<Date> {
    match date.weekday() {
        Weekday::Saturday => date.next_day(),
        Weekday::Wednesday => date.checked_sub(Duration::days(3)),
        _ => None,
    }
}

/// Combine a calendar date and a wall-clock time into a persisted instant.
pub fn slot_instant(date: Date, at: Time) -> SystemTime {
    SystemTime::from(PrimitiveDateTime::new(date, at).assume_utc())
}

/// Localized month name matching the frontend's display grouping.
pub fn month_name(month: Month) -> &'static str {
    match month {
        Month::January => "Enero",
        Month::February => "Febrero",
        Month::March => "Marzo",
        Month::April => "Abril",
        Month::May => "Mayo",
        Month::June => "Junio",
        Month::July => "Julio",
        Month::August => "Agosto",
        Month::September => "Septiembre",
        Month::October => "Octubre",
        Month::November => "Noviembre",
        Month::December => "Diciembre",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sundays_of_2026_are_52_and_all_sundays() {
        let sundays = sundays_of_year(2026);
        assert_eq!(sundays.len(), 52);
        assert!(sundays.iter().all(|d| d.weekday() == Weekday::Sunday));
        assert_eq!(sundays[0], Date::from_calendar_date(2026, Month::January, 4).unwrap());
        assert_eq!(
            *sundays.last().unwrap(),
            Date::from_calendar_date(2026, Month::December, 27).unwrap()
        );
    }

    #[test]
    fn leap_week_years_have_53_sundays() {
        // 2028 starts on a Saturday and is a leap year, so both Saturday and
        // Sunday occur 53 times.
        assert_eq!(sundays_of_year(2028).len(), 53);
    }

    #[test]
    fn no_quarantine_saturday_on_or_after_cutoff() {
        let cutoff = quarantine_cutoff(2026).unwrap();
        for date in quarantine_saturdays(2026) {
            assert!(date < cutoff, "{date} is not before the cutoff");
            assert_eq!(date.weekday(), Weekday::Saturday);
        }
        assert_eq!(quarantine_saturdays(2026).len(), 7);
    }

    #[test]
    fn no_quarantine_wednesday_on_or_before_cutoff() {
        let cutoff = quarantine_cutoff(2026).unwrap();
        for date in quarantine_wednesdays(2026) {
            assert!(date > cutoff, "{date} is not after the cutoff");
            assert_eq!(date.weekday(), Weekday::Wednesday);
        }
        assert_eq!(quarantine_wednesdays(2026).len(), 45);
    }

    #[test]
    fn cutoff_day_itself_is_excluded_even_when_it_is_a_saturday() {
        // Feb 21 2026 falls on a Saturday; strictly-before must exclude it.
        let cutoff = Date::from_calendar_date(2026, Month::February, 21).unwrap();
        assert_eq!(cutoff.weekday(), Weekday::Saturday);
        assert!(!quarantine_saturdays(2026).contains(&cutoff));
    }

    #[test]
    fn companion_sunday_for_saturday_is_next_day() {
        let saturday = Date::from_calendar_date(2026, Month::January, 10).unwrap();
        assert_eq!(
            companion_sunday(saturday),
            Some(Date::from_calendar_date(2026, Month::January, 11).unwrap())
        );
    }

    #[test]
    fn companion_sunday_for_wednesday_is_preceding_sunday() {
        let wednesday = Date::from_calendar_date(2026, Month::February, 25).unwrap();
        assert_eq!(
            companion_sunday(wednesday),
            Some(Date::from_calendar_date(2026, Month::February, 22).unwrap())
        );
    }

    #[test]
    fn companion_sunday_rejects_other_weekdays() {
        let monday = Date::from_calendar_date(2026, Month::January, 5).unwrap();
        assert_eq!(companion_sunday(monday), None);
    }
}
