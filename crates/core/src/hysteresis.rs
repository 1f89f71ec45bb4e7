//! Threshold-based alert hysteresis.
//!
//! Once a level is raised it stays raised, without repeat alerts, until a
//! sample comes back above the warning threshold. Recovery resets both
//! levels at once.

use serde::Serialize;

use crate::alert::{AlertEvent, Severity};
use crate::types::Dbm;

/// Alert thresholds. `critical` must not be stronger than `warning`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Thresholds {
    pub warning: Dbm,
    pub critical: Dbm,
}

impl Thresholds {
    /// The band `strength` falls into, ignoring hysteresis.
    pub fn classify(&self, strength: Dbm) -> Severity {
        if strength <= self.critical {
            Severity::Critical
        } else if strength <= self.warning {
            Severity::Warning
        } else {
            Severity::Normal
        }
    }
}

/// Which alert levels have already been announced.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct AlertFlags {
    pub warning_raised: bool,
    pub critical_raised: bool,
}

impl AlertFlags {
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Evaluate one sample. Returns the event to emit, if any.
    ///
    /// The strongest condition is checked first. `None` means the sample
    /// sits in an already-announced band.
    pub fn evaluate(&mut self, strength: Dbm, thresholds: &Thresholds) -> Option<AlertEvent> {
        if strength <= thresholds.critical {
            if self.critical_raised {
                return None;
            }
            self.critical_raised = true;
            self.warning_raised = true;
            Some(AlertEvent::critical(strength))
        } else if strength <= thresholds.warning {
            if self.warning_raised {
                return None;
            }
            self.warning_raised = true;
            Some(AlertEvent::warning(strength))
        } else {
            self.reset();
            Some(AlertEvent::normal(strength))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DEFAULTS: Thresholds = Thresholds {
        warning: -75,
        critical: -85,
    };

    fn severities(samples: &[Dbm]) -> Vec<Option<Severity>> {
        let mut flags = AlertFlags::default();
        samples
            .iter()
            .map(|&s| flags.evaluate(s, &DEFAULTS).map(|e| e.severity))
            .collect()
    }

    #[test]
    fn reference_stream() {
        assert_eq!(
            severities(&[-60, -80, -90, -90, -60]),
            vec![
                Some(Severity::Normal),
                Some(Severity::Warning),
                Some(Severity::Critical),
                None,
                Some(Severity::Normal),
            ]
        );
    }

    #[test]
    fn thresholds_are_inclusive() {
        assert_eq!(severities(&[-75]), vec![Some(Severity::Warning)]);
        assert_eq!(severities(&[-85]), vec![Some(Severity::Critical)]);
        assert_eq!(severities(&[-74]), vec![Some(Severity::Normal)]);
    }

    #[test]
    fn classify_bands() {
        assert_eq!(DEFAULTS.classify(-60), Severity::Normal);
        assert_eq!(DEFAULTS.classify(-75), Severity::Warning);
        assert_eq!(DEFAULTS.classify(-84), Severity::Warning);
        assert_eq!(DEFAULTS.classify(-85), Severity::Critical);
    }

    #[test]
    fn critical_marks_warning_as_raised() {
        let mut flags = AlertFlags::default();
        flags.evaluate(-90, &DEFAULTS);
        assert_eq!(
            flags,
            AlertFlags {
                warning_raised: true,
                critical_raised: true
            }
        );

        // Climbing back into the warning band does not re-announce.
        assert!(flags.evaluate(-80, &DEFAULTS).is_none());
        assert!(flags.critical_raised);
    }

    #[test]
    fn direct_drop_to_critical_skips_warning() {
        assert_eq!(
            severities(&[-60, -95, -80, -95]),
            vec![Some(Severity::Normal), Some(Severity::Critical), None, None]
        );
    }

    #[test]
    fn no_consecutive_critical_without_recovery() {
        let samples = [-90, -80, -88, -76, -99, -70, -90, -86];
        let mut last_critical_pending = false;
        let mut flags = AlertFlags::default();
        for s in samples {
            match flags.evaluate(s, &DEFAULTS).map(|e| e.severity) {
                Some(Severity::Critical) => {
                    assert!(!last_critical_pending, "critical repeated at {s}");
                    last_critical_pending = true;
                }
                Some(Severity::Normal) => last_critical_pending = false,
                _ => {}
            }
        }
    }

    #[test]
    fn recovery_always_resets_both_flags() {
        for start in [
            AlertFlags::default(),
            AlertFlags {
                warning_raised: true,
                critical_raised: false,
            },
            AlertFlags {
                warning_raised: true,
                critical_raised: true,
            },
        ] {
            let mut flags = start;
            let event = flags.evaluate(-50, &DEFAULTS).unwrap();
            assert_eq!(event.severity, Severity::Normal);
            assert_eq!(event.rssi, Some(-50));
            assert_eq!(flags, AlertFlags::default());
        }
    }
}
