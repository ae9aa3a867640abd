//! Real-time scheduling for the sampling process
//!
//! Running under `SCHED_FIFO` keeps other processes from preempting the
//! sampler between sending a probe and timestamping its echo. Elevation is
//! best effort: without the needed privileges the run continues at normal
//! priority and the failure is only reported.

use log::{info, warn};
use std::io;

/// Lowest and highest `SCHED_FIFO` priority, e.g. `(1, 99)` on Linux
pub fn priority_range() -> (i32, i32) {
    // SAFETY: both calls only read a scheduler constant.
    unsafe {
        (
            libc::sched_get_priority_min(libc::SCHED_FIFO),
            libc::sched_get_priority_max(libc::SCHED_FIFO),
        )
    }
}

/// Clamps `requested` into `range`, with a warning when it had to move
pub fn clamp_priority(requested: i32, range: (i32, i32)) -> (i32, Option<String>) {
    let (min, max) = range;
    if requested > max {
        (
            max,
            Some(format!(
                "Given priority:   {} > sched_get_priority_max(SCHED_FIFO)! Setting priority to {}.",
                requested, max
            )),
        )
    } else if requested < min {
        (
            min,
            Some(format!(
                "Given priority:   {} < sched_get_priority_min(SCHED_FIFO)! Setting priority to {}.",
                requested, min
            )),
        )
    } else {
        (requested, None)
    }
}

/// Switches the whole process to `SCHED_FIFO` at `priority`
pub fn set_realtime_priority(priority: i32) -> io::Result<()> {
    let param = libc::sched_param {
        sched_priority: priority,
    };
    // SAFETY: `param` is a valid sched_param; pid 0 means the calling process.
    let rc = unsafe { libc::sched_setscheduler(0, libc::SCHED_FIFO, &param) };
    if rc != 0 {
        let err = io::Error::last_os_error();
        warn!("sched_setscheduler(SCHED_FIFO, {}) failed: {}", priority, err);
        return Err(err);
    }
    info!("Running with SCHED_FIFO priority {}", priority);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_priority_in_range_is_kept() {
        assert_eq!(clamp_priority(50, (1, 99)), (50, None));
    }

    #[test]
    fn test_priority_above_max_is_clamped() {
        let (prio, warning) = clamp_priority(150, (1, 99));
        assert_eq!(prio, 99);
        assert!(warning.unwrap().contains("Setting priority to 99"));
    }

    #[test]
    fn test_priority_below_min_is_clamped() {
        let (prio, warning) = clamp_priority(0, (1, 99));
        assert_eq!(prio, 1);
        assert!(warning.is_some());
    }

    #[test]
    fn test_fifo_range_is_ordered() {
        let (min, max) = priority_range();
        assert!(min <= max);
    }
}
