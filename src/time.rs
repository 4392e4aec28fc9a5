//! Monotonic time on the host's uptime-millisecond base.

/// Current monotonic time in milliseconds.
///
/// On unix targets this reads `CLOCK_MONOTONIC`, the clock behind Android's
/// `SystemClock.uptimeMillis()`, so values are directly comparable with the
/// event timestamps the host attaches to input batches.
#[cfg(unix)]
pub fn uptime_millis() -> i64 {
    let mut ts = libc::timespec {
        tv_sec: 0,
        tv_nsec: 0,
    };
    // Cannot fail for CLOCK_MONOTONIC with a valid timespec pointer.
    unsafe { libc::clock_gettime(libc::CLOCK_MONOTONIC, &mut ts) };
    ts.tv_sec as i64 * 1000 + ts.tv_nsec as i64 / 1_000_000
}

/// Current monotonic time in milliseconds, measured from process start.
#[cfg(not(unix))]
pub fn uptime_millis() -> i64 {
    use once_cell::sync::Lazy;
    use std::time::Instant;

    static ANCHOR: Lazy<Instant> = Lazy::new(Instant::now);
    ANCHOR.elapsed().as_millis() as i64
}
