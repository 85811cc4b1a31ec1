// policy.rs

use crate::*;

/// Gap between the ON and OFF trip points.
pub const HYSTERESIS_BAND: u32 = 100;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FanCommand {
    On,
    Off,
    Unchanged,
}

impl FanCommand {
    /// Resulting relay state when applied on top of `current`.
    pub fn resolve(self, current: bool) -> bool {
        match self {
            FanCommand::On => true,
            FanCommand::Off => false,
            FanCommand::Unchanged => current,
        }
    }
}

/// Auto mode fan decision with a dead band below `threshold`.
/// Inert under manual control.
pub fn decide(concentration: f32, mode: FanMode, threshold: u32) -> FanCommand {
    if !mode.is_auto() {
        return FanCommand::Unchanged;
    }

    let on_level = threshold as f32;
    let off_level = on_level - HYSTERESIS_BAND as f32;
    if concentration > on_level {
        FanCommand::On
    } else if concentration < off_level {
        FanCommand::Off
    } else {
        FanCommand::Unchanged
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn above_threshold_turns_fan_on() {
        for c in [300.5, 350.0, 1000.0] {
            assert_eq!(decide(c, FanMode::Auto, 300), FanCommand::On);
        }
    }

    #[test]
    fn below_band_turns_fan_off() {
        for c in [0.0, 150.0, 199.9] {
            assert_eq!(decide(c, FanMode::Auto, 300), FanCommand::Off);
        }
    }

    #[test]
    fn inside_band_keeps_state() {
        for c in [200.0, 250.0, 300.0] {
            assert_eq!(decide(c, FanMode::Auto, 300), FanCommand::Unchanged);
            assert!(FanCommand::Unchanged.resolve(true));
            assert!(!FanCommand::Unchanged.resolve(false));
        }
    }

    #[test]
    fn manual_mode_is_inert() {
        for c in [0.0, 250.0, 900.0] {
            assert_eq!(decide(c, FanMode::Manual, 300), FanCommand::Unchanged);
        }
    }

    #[test]
    fn small_threshold_never_switches_off() {
        // off level is negative, only the on trip point remains
        assert_eq!(decide(0.0, FanMode::Auto, 50), FanCommand::Unchanged);
        assert_eq!(decide(51.0, FanMode::Auto, 50), FanCommand::On);
    }
}

// EOF
