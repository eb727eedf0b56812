// config.rs

use crate::cli::Args;
use crate::error::{Result, TimerError};
use log::{debug, info};
use std::ops::RangeInclusive;
use std::time::Duration;

/// Shape of the randomized note workload.
#[derive(Debug, Clone, PartialEq)]
pub struct GeneratorConfig {
    /// Pause before each burst, seconds
    pub rest: RangeInclusive<f64>,
    /// Notes per burst
    pub notes_per_burst: RangeInclusive<u32>,
    pub keys: RangeInclusive<u8>,
    pub velocities: RangeInclusive<u8>,
    /// Delay from a Note On to its scheduled Note Off, seconds
    pub off_delay: RangeInclusive<f64>,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        GeneratorConfig {
            rest: DEFAULT_REST_SECS,
            notes_per_burst: DEFAULT_NOTES_PER_BURST,
            keys: DEFAULT_KEYS,
            velocities: DEFAULT_VELOCITIES,
            off_delay: DEFAULT_OFF_DELAY_SECS,
        }
    }
}

impl GeneratorConfig {
    pub fn validate(&self) -> Result<()> {
        check_seconds("rest", &self.rest)?;
        check_seconds("note-off delay", &self.off_delay)?;
        if self.notes_per_burst.is_empty() {
            return Err(invalid("notes per burst range is empty"));
        }
        if self.keys.is_empty() || *self.keys.end() > 127 {
            return Err(invalid("keys must be a non-empty range within 0..=127"));
        }
        // A velocity 0 Note On would be indistinguishable from a Note Off echo
        if self.velocities.is_empty() || *self.velocities.start() == 0 || *self.velocities.end() > 127 {
            return Err(invalid("velocities must be a non-empty range within 1..=127"));
        }
        Ok(())
    }
}

/// Everything a timed run needs.
#[derive(Debug, Clone, PartialEq)]
pub struct TimerConfig {
    pub duration: Duration,
    pub channel: u8,
    pub seed: Option<u64>,
    /// Drain loop polling resolution
    pub poll_interval: Duration,
    /// How long to wait for outstanding echoes after the last note-off
    pub echo_grace: Duration,
    pub generator: GeneratorConfig,
}

impl Default for TimerConfig {
    fn default() -> Self {
        TimerConfig {
            duration: Duration::from_secs_f64(DEFAULT_DURATION_SECS),
            channel: 0,
            seed: None,
            poll_interval: DEFAULT_POLL_INTERVAL,
            echo_grace: DEFAULT_ECHO_GRACE,
            generator: GeneratorConfig::default(),
        }
    }
}

impl TimerConfig {
    pub fn from_args(args: &Args) -> Result<Self> {
        let duration = parse_duration(args.duration)?;
        debug!("Parsed run duration: {:?}", duration);

        if args.channel > 15 {
            return Err(invalid("MIDI channel must be within 0..=15"));
        }

        if let Some(seed) = args.seed {
            info!("Using fixed RNG seed {}", seed);
        }

        let config = TimerConfig {
            duration,
            channel: args.channel,
            seed: args.seed,
            echo_grace: Duration::from_millis(args.echo_grace_ms),
            ..TimerConfig::default()
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.duration.is_zero() {
            return Err(invalid("duration must be positive"));
        }
        if self.channel > 15 {
            return Err(invalid("MIDI channel must be within 0..=15"));
        }
        if self.poll_interval.is_zero() {
            return Err(invalid("poll interval must be positive"));
        }
        self.generator.validate()
    }
}

fn parse_duration(seconds: f64) -> Result<Duration> {
    if !seconds.is_finite() || seconds <= 0.0 {
        return Err(invalid(format!(
            "duration must be a positive number of seconds, got {}",
            seconds
        )));
    }
    Duration::try_from_secs_f64(seconds).map_err(|e| invalid(e.to_string()))
}

fn check_seconds(name: &str, range: &RangeInclusive<f64>) -> Result<()> {
    let (start, end) = (*range.start(), *range.end());
    if !start.is_finite() || !end.is_finite() || start <= 0.0 || start > end {
        return Err(invalid(format!(
            "{} must be a positive, non-inverted range, got {}..={}",
            name, start, end
        )));
    }
    Ok(())
}

fn invalid(msg: impl Into<String>) -> TimerError {
    TimerError::InvalidConfig(msg.into())
}

pub const DEFAULT_DURATION_SECS: f64 = 60.0;
pub const DEFAULT_REST_SECS: RangeInclusive<f64> = 0.01..=0.5;
pub const DEFAULT_NOTES_PER_BURST: RangeInclusive<u32> = 0..=5;
pub const DEFAULT_KEYS: RangeInclusive<u8> = 10..=100;
pub const DEFAULT_VELOCITIES: RangeInclusive<u8> = 20..=120;
pub const DEFAULT_OFF_DELAY_SECS: RangeInclusive<f64> = 0.1..=1.0;
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(1);
pub const DEFAULT_ECHO_GRACE: Duration = Duration::from_millis(100);

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[test]
    fn test_defaults_are_valid() {
        assert!(TimerConfig::default().validate().is_ok());
    }

    #[test]
    fn test_from_args() {
        let args = Args::parse_from(["miditimer", "--duration", "2.5", "--channel", "3", "--seed", "7"]);
        let config = TimerConfig::from_args(&args).unwrap();
        assert_eq!(config.duration, Duration::from_millis(2500));
        assert_eq!(config.channel, 3);
        assert_eq!(config.seed, Some(7));
        assert_eq!(config.generator, GeneratorConfig::default());
    }

    #[test]
    fn test_rejects_non_positive_duration() {
        for bad in ["0", "-1", "NaN"] {
            let flag = format!("--duration={}", bad);
            let args = Args::parse_from(["miditimer", flag.as_str()]);
            assert!(matches!(
                TimerConfig::from_args(&args),
                Err(TimerError::InvalidConfig(_))
            ));
        }
    }

    #[test]
    fn test_rejects_bad_channel() {
        let args = Args::parse_from(["miditimer", "--channel", "16"]);
        assert!(TimerConfig::from_args(&args).is_err());
    }

    #[test]
    fn test_rejects_zero_velocity() {
        let generator = GeneratorConfig {
            velocities: 0..=10,
            ..GeneratorConfig::default()
        };
        assert!(generator.validate().is_err());
    }

    #[test]
    fn test_rejects_inverted_rest() {
        #[allow(clippy::reversed_empty_ranges)]
        let generator = GeneratorConfig {
            rest: 0.5..=0.1,
            ..GeneratorConfig::default()
        };
        assert!(generator.validate().is_err());
    }
}
