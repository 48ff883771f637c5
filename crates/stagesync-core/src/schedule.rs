//! Server-day boundaries and the suggested resync delay.
//!
//! The game server's day rolls over at 04:00 UTC+8, and published documents
//! also change around 16:00 UTC+8. Nothing in this crate schedules itself;
//! the embedding application decides whether to act on the delay.

use std::time::Duration;

use chrono::{DateTime, Datelike, Days, FixedOffset, NaiveTime, Offset, TimeZone, Utc, Weekday};
use rand::Rng;

/// Server time zone offset in hours
const SERVER_UTC_OFFSET_HOURS: i32 = 8;

/// Hour (server time) at which the game day rolls over
const DAY_ROLLOVER_HOUR: u32 = 4;

/// Server-time hours at which documents are republished
const RESYNC_HOURS: [u32; 2] = [4, 16];

/// Upper bound of the random delay added to each boundary, so clients do not
/// hit the mirrors in lockstep
const MAX_JITTER_SECS: u64 = 10 * 60;

fn server_offset() -> FixedOffset {
    FixedOffset::east_opt(SERVER_UTC_OFFSET_HOURS * 3600).unwrap_or_else(|| Utc.fix())
}

/// Weekday of the game day containing `now`
pub fn server_weekday(now: DateTime<Utc>) -> Weekday {
    let local = now.with_timezone(&server_offset());
    let shifted = local - chrono::Duration::hours(DAY_ROLLOVER_HOUR as i64);
    shifted.weekday()
}

/// Next republish boundary strictly after `now`
pub fn next_boundary(now: DateTime<Utc>) -> DateTime<Utc> {
    let offset = server_offset();
    let local = now.with_timezone(&offset);
    let today = local.date_naive();

    let candidates = RESYNC_HOURS
        .iter()
        .map(|&h| (today, h))
        .chain(std::iter::once((
            today.checked_add_days(Days::new(1)).unwrap_or(today),
            RESYNC_HOURS[0],
        )));

    for (date, hour) in candidates {
        let Some(time) = NaiveTime::from_hms_opt(hour, 0, 0) else {
            continue;
        };
        if let Some(at) = offset.from_local_datetime(&date.and_time(time)).single() {
            if at > local {
                return at.with_timezone(&Utc);
            }
        }
    }
    now + chrono::Duration::hours(12)
}

/// Delay until the next boundary, plus up to ten minutes of jitter
pub fn next_resync_delay(now: DateTime<Utc>) -> Duration {
    let jitter = rand::thread_rng().gen_range(0..=MAX_JITTER_SECS);
    next_resync_delay_with_jitter(now, Duration::from_secs(jitter))
}

pub fn next_resync_delay_with_jitter(now: DateTime<Utc>, jitter: Duration) -> Duration {
    let base = (next_boundary(now) - now).to_std().unwrap_or_default();
    base + jitter
}

#[cfg(test)]
mod tests {
    use super::*;

    fn utc(y: i32, m: u32, d: u32, h: u32, min: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, min, 0).unwrap()
    }

    #[test]
    fn test_next_boundary_morning() {
        // 2026-10-19 01:00 UTC = 09:00 UTC+8, next is 16:00 UTC+8 = 08:00 UTC
        assert_eq!(next_boundary(utc(2026, 10, 19, 1, 0)), utc(2026, 10, 19, 8, 0));
    }

    #[test]
    fn test_next_boundary_rolls_to_next_day() {
        // 2026-10-19 10:00 UTC = 18:00 UTC+8, next is 04:00 UTC+8 tomorrow = 20:00 UTC
        assert_eq!(next_boundary(utc(2026, 10, 19, 10, 0)), utc(2026, 10, 19, 20, 0));
    }

    #[test]
    fn test_boundary_is_strictly_after() {
        // Exactly at 16:00 UTC+8
        assert_eq!(next_boundary(utc(2026, 10, 19, 8, 0)), utc(2026, 10, 19, 20, 0));
    }

    #[test]
    fn test_delay_includes_jitter() {
        let now = utc(2026, 10, 19, 7, 0);
        let delay = next_resync_delay_with_jitter(now, Duration::from_secs(90));
        assert_eq!(delay, Duration::from_secs(3600 + 90));

        let random = next_resync_delay(now);
        assert!(random >= Duration::from_secs(3600));
        assert!(random <= Duration::from_secs(3600 + MAX_JITTER_SECS));
    }

    #[test]
    fn test_server_weekday_rollover() {
        // 2026-10-21 is a Wednesday. 19:00 UTC on the 20th = 03:00 UTC+8 on the 21st,
        // still Tuesday's game day.
        assert_eq!(server_weekday(utc(2026, 10, 20, 19, 0)), Weekday::Tue);
        // 20:30 UTC on the 20th = 04:30 UTC+8 on the 21st
        assert_eq!(server_weekday(utc(2026, 10, 20, 20, 30)), Weekday::Wed);
    }
}
