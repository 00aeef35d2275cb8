//! Mapping from the user-facing level to the device duty cycle.

/// Highest duty cycle the controller accepts.
pub const MAX_DUTY: u8 = 255;

/// Lowest duty cycle that still turns the actuator.
pub const MIN_DUTY: u8 = 40;

/// Number of discrete levels above "off".
pub const NUM_LEVELS: u8 = 10;

/// Maps a level (0 = off, 10 = max) to the duty cycle byte sent on the wire.
///
/// Levels above [`NUM_LEVELS`] are clamped. The step is integer division of
/// the usable range, so level 10 lands on 250 rather than [`MAX_DUTY`]. The
/// device firmware applies its own limits on top of this.
pub fn to_duty_cycle(level: u8) -> u8 {
    if level == 0 {
        return 0;
    }
    let level = level.min(NUM_LEVELS);
    let step = (MAX_DUTY - MIN_DUTY) / NUM_LEVELS;
    MIN_DUTY + level * step
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_zero_is_off() {
        assert_eq!(to_duty_cycle(0), 0);
    }

    #[test]
    fn test_levels_stay_in_duty_range_and_never_decrease() {
        let mut previous = 0;
        for level in 1..=NUM_LEVELS {
            let duty = to_duty_cycle(level);
            assert!((MIN_DUTY..=MAX_DUTY).contains(&duty), "level {level} -> {duty}");
            assert!(duty >= previous, "level {level} decreased");
            previous = duty;
        }
    }

    #[test]
    fn test_known_steps() {
        assert_eq!(to_duty_cycle(1), 61);
        assert_eq!(to_duty_cycle(5), 145);
        assert_eq!(to_duty_cycle(10), 250);
    }

    #[test]
    fn test_out_of_range_level_is_clamped() {
        assert_eq!(to_duty_cycle(11), to_duty_cycle(10));
        assert_eq!(to_duty_cycle(u8::MAX), to_duty_cycle(10));
    }
}
