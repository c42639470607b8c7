//! Tick-domain clock correlation and display formatting.

use std::time::Duration;

use contracts::{Tick, TickAnchor};

/// Ticks elapsed at `tick` relative to the run's zero point.
///
/// The start reference wins when set; otherwise the green anchor is the
/// zero point. Pure tick arithmetic: host scheduling jitter never enters
/// a recorded time.
pub fn elapsed_ticks(tick: Tick, start: Option<&TickAnchor>, green: &TickAnchor) -> u64 {
    let zero = start.map_or(green.tick, |anchor| anchor.tick);
    tick.saturating_sub(zero)
}

/// Format an elapsed duration as `HH:MM:SS.mmm` for the live display.
pub fn format_clock(elapsed: Duration) -> String {
    let ms = elapsed.as_millis();
    let hours = ms / (1000 * 60 * 60);
    let minutes = (ms % (1000 * 60 * 60)) / (1000 * 60);
    let seconds = (ms % (1000 * 60)) / 1000;
    let millis = ms % 1000;
    format!("{hours:02}:{minutes:02}:{seconds:02}.{millis:03}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_elapsed_prefers_start_reference() {
        let green = TickAnchor::now(100);
        let start = TickAnchor::now(150);

        assert_eq!(elapsed_ticks(200, Some(&start), &green), 50);
        assert_eq!(elapsed_ticks(200, None, &green), 100);
    }

    #[test]
    fn test_elapsed_saturates() {
        let green = TickAnchor::now(500);
        // A tick below the zero point never underflows.
        assert_eq!(elapsed_ticks(400, None, &green), 0);
    }

    #[test]
    fn test_format_clock_zero() {
        assert_eq!(format_clock(Duration::ZERO), "00:00:00.000");
    }

    #[test]
    fn test_format_clock_rollover() {
        assert_eq!(format_clock(Duration::from_millis(999)), "00:00:00.999");
        assert_eq!(format_clock(Duration::from_millis(1_000)), "00:00:01.000");
        assert_eq!(format_clock(Duration::from_millis(61_005)), "00:01:01.005");
        assert_eq!(
            format_clock(Duration::from_millis(2 * 3_600_000 + 3 * 60_000 + 4_567)),
            "02:03:04.567"
        );
    }
}
