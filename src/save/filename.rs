//! Save file naming.
//!
//! `<base>_<ddd><hh><ssss><cc>`: day of the 365-day year since the epoch,
//! hour of the day, second within the hour and hundredths of a second. Names
//! are unique across saves at least 10 ms apart.

use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

const SECS_PER_DAY: u64 = 86_400;
const SECS_PER_YEAR: u64 = SECS_PER_DAY * 365;

pub fn timestamp_suffix(time: SystemTime) -> String {
    let since_epoch = time.duration_since(UNIX_EPOCH).unwrap_or_default();
    let secs = since_epoch.as_secs() % SECS_PER_YEAR;
    let days = secs / SECS_PER_DAY;
    let secs = secs - days * SECS_PER_DAY;
    let hours = secs / 3600;
    let seconds = secs - hours * 3600;
    let centis = since_epoch.subsec_micros() / 10_000;
    format!("{:03}{:02}{:04}{:02}", days, hours, seconds, centis)
}

pub fn unique_filename(base: &str, time: SystemTime) -> String {
    format!("{}_{}", base, timestamp_suffix(time))
}

/// Path for a new save in `dir`. Appends `_<n>` if the timestamped name is
/// already taken.
pub fn unique_path(dir: &Path, base: &str, extension: &str, time: SystemTime) -> PathBuf {
    let stem = unique_filename(base, time);
    let candidate = dir.join(format!("{}.{}", stem, extension));
    if !candidate.exists() {
        return candidate;
    }
    (1u32..)
        .map(|n| dir.join(format!("{}_{}.{}", stem, n, extension)))
        .find(|path| !path.exists())
        .unwrap_or(candidate)
}
