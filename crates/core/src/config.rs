use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{ReporterError, ReporterResult};

/// Reporter configuration. Loaded from an optional config file and
/// environment variables with the prefix `BID_REPORTER__`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ReporterConfig {
    /// Named tracker instance; commands are sent as `<tracker_name>.send`.
    #[serde(default)]
    pub tracker_name: Option<String>,
    /// Fraction of page loads that report, in [0, 1]. Absent means always.
    #[serde(default)]
    pub sampling: Option<SamplingRate>,
    /// Report latency and CPM distribution buckets.
    #[serde(default)]
    pub enable_distribution: bool,
}

/// Sampling rate as supplied by the host page: a number or a numeric string.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum SamplingRate {
    Number(f64),
    Text(String),
}

impl SamplingRate {
    /// Parsed rate, or `None` when the value is not a number.
    pub fn rate(&self) -> Option<f64> {
        match self {
            SamplingRate::Number(n) if !n.is_nan() => Some(*n),
            SamplingRate::Number(_) => None,
            SamplingRate::Text(s) => leading_number(s),
        }
    }
}

/// Longest numeric prefix of `s` after leading whitespace, so `"0.5abc"`
/// reads as 0.5 and `"50%"` as 50. `None` when no digits lead the text.
fn leading_number(s: &str) -> Option<f64> {
    let s = s.trim_start();
    let bytes = s.as_bytes();
    let digits_from = |start: usize| {
        bytes[start..]
            .iter()
            .take_while(|b| b.is_ascii_digit())
            .count()
    };

    let mut end = usize::from(matches!(bytes.first(), Some(b'+' | b'-')));
    if s[end..].starts_with("Infinity") {
        let infinity = if s.starts_with('-') {
            f64::NEG_INFINITY
        } else {
            f64::INFINITY
        };
        return Some(infinity);
    }

    let int_digits = digits_from(end);
    end += int_digits;
    let mut frac_digits = 0;
    if bytes.get(end) == Some(&b'.') {
        frac_digits = digits_from(end + 1);
        if int_digits > 0 || frac_digits > 0 {
            end += 1 + frac_digits;
        }
    }
    if int_digits == 0 && frac_digits == 0 {
        return None;
    }

    if matches!(bytes.get(end), Some(b'e' | b'E')) {
        let mut exp_end = end + 1;
        if matches!(bytes.get(exp_end), Some(b'+' | b'-')) {
            exp_end += 1;
        }
        let exp_digits = digits_from(exp_end);
        if exp_digits > 0 {
            end = exp_end + exp_digits;
        }
    }

    s[..end].parse::<f64>().ok()
}

impl From<f64> for SamplingRate {
    fn from(rate: f64) -> Self {
        SamplingRate::Number(rate)
    }
}

impl From<&str> for SamplingRate {
    fn from(rate: &str) -> Self {
        SamplingRate::Text(rate.to_string())
    }
}

/// Send method for a (possibly named) tracker instance.
pub fn tracker_send(tracker_name: Option<&str>) -> String {
    match tracker_name {
        Some(name) if !name.is_empty() => format!("{name}.send"),
        _ => "send".to_string(),
    }
}

impl ReporterConfig {
    /// Load configuration from an optional file and environment variables.
    pub fn load(path: Option<&Path>) -> ReporterResult<Self> {
        let mut builder = config::Config::builder();
        if let Some(path) = path {
            builder = builder.add_source(config::File::from(path).required(true));
        }
        builder = builder.add_source(
            config::Environment::with_prefix("BID_REPORTER")
                .separator("__")
                .try_parsing(true),
        );

        let config = builder.build()?;
        let loaded: Self = config.try_deserialize()?;
        loaded.validate()?;
        Ok(loaded)
    }

    /// Tracker send method, `<tracker_name>.send` or plain `send`.
    pub fn tracker_send(&self) -> String {
        tracker_send(self.tracker_name.as_deref())
    }

    pub fn validate(&self) -> ReporterResult<()> {
        if let Some(sampling) = &self.sampling {
            match sampling.rate() {
                Some(rate) if (0.0..=1.0).contains(&rate) => {}
                Some(rate) => {
                    return Err(ReporterError::InvalidSampling(format!(
                        "{rate} is outside [0, 1]"
                    )))
                }
                None => {
                    return Err(ReporterError::InvalidSampling(format!(
                        "{sampling:?} is not a number"
                    )))
                }
            }
        }
        Ok(())
    }
}
