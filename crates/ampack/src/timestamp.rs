//! # Timestamp Codec
//!
//! Bit-exact encode/decode of MessagePack's reserved `-1` extension
//! (timestamp32/64/96) plus the civil-calendar conversion the Ext hook needs
//! to turn a `Timestamp` into broken-down year/month/day/hour/minute/second.
//!
//! The calendar algorithm is a constant leap-era computation anchored at
//! 2000-03-01, ported from the original `amsgpack` C extension's
//! `days_since_epoch` / `timestamp_to_datetime` (see `original_source/
//! timestamp.h`) rather than reached for from a date-time crate — the
//! encode/decode path has no need for calendar math at all, only
//! `to_utc_parts` does, and keeping that logic self-contained avoids a hard
//! dependency on a date/time crate for everyone who only wants the
//! `(seconds, nanoseconds)` pair.

use bytes::Bytes;

use crate::error::Error;
use crate::value::Timestamp;

/// 2000-03-01, the day immediately after Feb 29 in a mod-400 year.
const LEAPOCH: i64 = 946_684_800 + 86_400 * (31 + 29);
const DAYS_PER_400Y: i64 = 365 * 400 + 97;
const DAYS_PER_100Y: i64 = 365 * 100 + 24;
const DAYS_PER_4Y: i64 = 365 * 4 + 1;
const SECONDS_PER_DAY: i64 = 86_400;

/// March-indexed month lengths (Mar..Feb), matching the leap-era algorithm.
const DAYS_IN_MONTH: [i64; 12] = [31, 30, 31, 30, 31, 31, 30, 31, 30, 31, 31, 29];

pub const MIN_SECONDS: i64 = -62_135_596_800;
pub const MAX_SECONDS_EXCLUSIVE: i64 = 253_402_300_800;

/// Encode a timestamp's wire payload, choosing the smallest of
/// timestamp32/64/96 per the MessagePack timestamp spec. Returns the raw
/// ext payload bytes (4, 8, or 12 of them) — the caller selects
/// fixext4/fixext8/ext8 from the returned length.
pub fn encode(ts: Timestamp) -> Vec<u8> {
    let Timestamp {
        seconds,
        nanoseconds,
    } = ts;

    if nanoseconds == 0 && (0..=u32::MAX as i64).contains(&seconds) {
        return (seconds as u32).to_be_bytes().to_vec();
    }

    if (0..(1i64 << 34)).contains(&seconds) {
        let combined = ((nanoseconds as u64) << 34) | (seconds as u64);
        return combined.to_be_bytes().to_vec();
    }

    let mut out = Vec::with_capacity(12);
    out.extend_from_slice(&nanoseconds.to_be_bytes());
    out.extend_from_slice(&seconds.to_be_bytes());
    out
}

/// Decode a timestamp ext payload of length 4, 8, or 12.
pub fn decode(data: &Bytes) -> Result<Timestamp, Error> {
    match data.len() {
        4 => {
            let seconds = u32::from_be_bytes(data[0..4].try_into().unwrap()) as i64;
            Ok(Timestamp::new(seconds, 0))
        }
        8 => {
            let combined = u64::from_be_bytes(data[0..8].try_into().unwrap());
            let nanoseconds = (combined >> 34) as u32 & 0x3FFF_FFFF;
            let seconds = (combined & 0x3_FFFF_FFFF) as i64;
            Ok(Timestamp::new(seconds, nanoseconds))
        }
        12 => {
            let nanoseconds = u32::from_be_bytes(data[0..4].try_into().unwrap());
            let seconds = i64::from_be_bytes(data[4..12].try_into().unwrap());
            Ok(Timestamp::new(seconds, nanoseconds))
        }
        other => Err(Error::Value(format!(
            "invalid timestamp payload length {other}"
        ))),
    }
}

/// Broken-down UTC time: `(year, month, day, hour, minute, second, micros)`.
/// `month` and `day` are 1-indexed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CivilTime {
    pub year: i64,
    pub month: u32,
    pub day: u32,
    pub hour: u32,
    pub minute: u32,
    pub second: u32,
    pub micros: u32,
}

/// Convert a `Timestamp` to broken-down UTC civil time. Fails outside
/// `[-62135596800, 253402300800)` seconds (year 1..9999 roughly), matching
/// the original implementation's guard.
pub fn to_civil(ts: Timestamp) -> Result<CivilTime, Error> {
    if ts.seconds < MIN_SECONDS || ts.seconds >= MAX_SECONDS_EXCLUSIVE {
        return Err(Error::Value("timestamp out of range".to_string()));
    }

    let mut seconds = ts.seconds;
    let mut micros = 0u32;
    if ts.nanoseconds != 0 {
        micros = (ts.nanoseconds + 500) / 1000;
        if micros == 1_000_000 {
            micros = 0;
            seconds += 1;
        }
    }

    let secs = seconds - LEAPOCH;
    let days = secs.div_euclid(SECONDS_PER_DAY);
    let remsecs = secs.rem_euclid(SECONDS_PER_DAY);

    let qc_cycles = days.div_euclid(DAYS_PER_400Y);
    let mut remdays = days.rem_euclid(DAYS_PER_400Y);

    let mut c_cycles = remdays / DAYS_PER_100Y;
    if c_cycles == 4 {
        c_cycles -= 1;
    }
    remdays -= c_cycles * DAYS_PER_100Y;

    let mut q_cycles = remdays / DAYS_PER_4Y;
    if q_cycles == 25 {
        q_cycles -= 1;
    }
    remdays -= q_cycles * DAYS_PER_4Y;

    let mut remyears = remdays / 365;
    if remyears == 4 {
        remyears -= 1;
    }
    remdays -= remyears * 365;

    let years = remyears + 4 * q_cycles + 100 * c_cycles + 400 * qc_cycles;

    let mut months = 0i64;
    while DAYS_IN_MONTH[months as usize] <= remdays {
        remdays -= DAYS_IN_MONTH[months as usize];
        months += 1;
    }

    let (year, month) = if months >= 10 {
        (years + 1 + 2000, months - 12 + 3)
    } else {
        (years + 2000, months + 3)
    };

    Ok(CivilTime {
        year,
        month: month as u32,
        day: (remdays + 1) as u32,
        hour: (remsecs / 3600) as u32,
        minute: (remsecs / 60 % 60) as u32,
        second: (remsecs % 60) as u32,
        micros,
    })
}

/// Number of days from the epoch (1970-01-01) to the given civil date.
/// `month` is 1-indexed.
fn days_since_epoch(year: i64, month: i64, day: i64) -> i64 {
    let (y, m) = if month <= 2 {
        (year - 1, month + 12)
    } else {
        (year, month)
    };
    let era = y.div_euclid(400);
    let yoe = y - era * 400;
    let doy = (153 * (m - 3) + 2) / 5 + day - 1;
    let doe = yoe * 365 + yoe / 4 - yoe / 100 + doy;
    era * DAYS_PER_400Y + doe - 719_468
}

/// Convert broken-down UTC civil time back into a `Timestamp`.
pub fn from_civil(civil: CivilTime) -> Timestamp {
    let days = days_since_epoch(civil.year, civil.month as i64, civil.day as i64);
    let total_seconds =
        days * SECONDS_PER_DAY + civil.hour as i64 * 3600 + civil.minute as i64 * 60 + civil.second as i64;
    Timestamp::new(total_seconds, civil.micros * 1000)
}

/// Convert to a `chrono::DateTime<Utc>` for embedders who want a richer type
/// than the bare `(seconds, nanoseconds)` pair. Gated behind the `chrono`
/// feature so the dependency is opt-in.
#[cfg(feature = "chrono")]
pub fn to_chrono(ts: Timestamp) -> Result<chrono::DateTime<chrono::Utc>, Error> {
    use chrono::TimeZone;
    match chrono::Utc.timestamp_opt(ts.seconds, ts.nanoseconds) {
        chrono::LocalResult::Single(dt) => Ok(dt),
        _ => Err(Error::Value("timestamp out of range".to_string())),
    }
}

#[cfg(feature = "chrono")]
pub fn from_chrono(dt: chrono::DateTime<chrono::Utc>) -> Timestamp {
    use chrono::Timelike;
    Timestamp::new(dt.timestamp(), dt.nanosecond())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encode_picks_timestamp32() {
        let ts = Timestamp::new(1_752_955_664, 0);
        let bytes = encode(ts);
        assert_eq!(bytes.len(), 4);
    }

    #[test]
    fn encode_picks_timestamp64_for_nanos() {
        let ts = Timestamp::new(1_752_955_664, 500);
        let bytes = encode(ts);
        assert_eq!(bytes.len(), 8);
    }

    #[test]
    fn encode_picks_timestamp96_for_negative_seconds() {
        let ts = Timestamp::new(-1, 0);
        let bytes = encode(ts);
        assert_eq!(bytes.len(), 12);
    }

    #[test]
    fn encode_picks_timestamp96_for_large_seconds() {
        let ts = Timestamp::new(1i64 << 35, 0);
        let bytes = encode(ts);
        assert_eq!(bytes.len(), 12);
    }

    #[test]
    fn roundtrip_all_three_forms() {
        for ts in [
            Timestamp::new(0, 0),
            Timestamp::new(1_752_955_664, 0),
            Timestamp::new(1_752_955_664, 123_456_000),
            Timestamp::new(-62_135_596_800, 0),
            Timestamp::new(253_402_300_799, 999_999_999),
        ] {
            let bytes = encode(ts);
            let decoded = decode(&Bytes::from(bytes)).unwrap();
            assert_eq!(decoded, ts);
        }
    }

    #[test]
    fn known_vector_from_spec() {
        // d7 ff 00 00 00 00 68 7b fb 10 -> fixext8, code 0xff, payload below
        let payload = Bytes::from_static(&[0x00, 0x00, 0x00, 0x00, 0x68, 0x7b, 0xfb, 0x10]);
        let ts = decode(&payload).unwrap();
        let civil = to_civil(ts).unwrap();
        assert_eq!(
            (civil.year, civil.month, civil.day, civil.hour, civil.minute, civil.second),
            (2025, 7, 19, 20, 7, 44)
        );
    }

    #[test]
    fn civil_roundtrip() {
        let ts = Timestamp::new(1_752_955_664, 123_000);
        let civil = to_civil(ts).unwrap();
        let back = from_civil(civil);
        assert_eq!(back, ts);
    }

    #[test]
    fn out_of_range_rejected() {
        assert!(to_civil(Timestamp::new(MIN_SECONDS - 1, 0)).is_err());
        assert!(to_civil(Timestamp::new(MAX_SECONDS_EXCLUSIVE, 0)).is_err());
    }

    #[test]
    fn invalid_payload_length() {
        assert!(decode(&Bytes::from_static(&[0u8; 5])).is_err());
    }

    #[cfg(feature = "chrono")]
    #[test]
    fn chrono_roundtrip() {
        let ts = Timestamp::new(1_752_955_664, 123_000_000);
        let dt = to_chrono(ts).unwrap();
        assert_eq!(from_chrono(dt), ts);
    }
}
