//! Endpoint options and their normalized, immutable form.
//!
//! `EndpointOptions` mirrors what a registration (or a config file) says;
//! `PolicySet` is what the guard enforces. Normalization happens exactly once,
//! at registration, and never at call time.

use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use serde::Deserialize;

use remguard_core::error::{GuardError, Result};
use remguard_core::PrimitiveKind;

use crate::dispatch::violation::{Punishment, ViolationMode};

pub const DEFAULT_KICK_MESSAGE: &str = "You have been kicked for sending invalid data.";

/// Inclusive `[min, max]` range.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct Bounds<T> {
    pub min: T,
    pub max: T,
}

impl<T: PartialOrd + Copy> Bounds<T> {
    pub fn new(min: T, max: T) -> Self {
        Self { min, max }
    }

    /// Unordered values (NaN) are never contained.
    pub fn contains(&self, v: T) -> bool {
        v >= self.min && v <= self.max
    }
}

/// Raw registration options. Unset fields take their documented default.
///
/// Unknown keys are ignored when deserializing, so older gateways accept
/// configs written for newer ones.
#[derive(Clone, Default, Deserialize)]
pub struct EndpointOptions {
    #[serde(rename = "BlockImpVal")]
    pub block_invalid_numbers: Option<bool>,
    #[serde(rename = "NumRange")]
    pub num_range: Option<Bounds<f64>>,
    #[serde(rename = "StrRange")]
    pub str_range: Option<Bounds<usize>>,
    #[serde(rename = "AllowNegatives")]
    pub allow_negatives: Option<bool>,
    #[serde(rename = "AllowPositives")]
    pub allow_positives: Option<bool>,
    #[serde(rename = "AllowedTypes")]
    pub allowed_types: Option<Vec<PrimitiveKind>>,
    #[serde(rename = "AllowedTypesOf")]
    pub allowed_types_of: Option<Vec<String>>,
    #[serde(rename = "FilteringStrings")]
    pub filtering_strings: Option<bool>,
    /// Seconds.
    #[serde(rename = "CoolDown")]
    pub cooldown: Option<f64>,
    #[serde(rename = "CheckInTables")]
    pub check_in_tables: Option<bool>,
    #[serde(rename = "BufferSizeLimit")]
    pub buffer_size_limit: Option<usize>,
    #[serde(rename = "Handling")]
    pub handling: Option<ViolationMode>,
    #[serde(rename = "KickMsg")]
    pub kick_msg: Option<String>,
    /// Programmatic only; never read from config.
    #[serde(skip)]
    pub custom_punishment: Option<Arc<dyn Punishment>>,
}

impl EndpointOptions {
    pub fn with_punishment(mut self, p: Arc<dyn Punishment>) -> Self {
        self.custom_punishment = Some(p);
        self
    }
}

impl fmt::Debug for EndpointOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EndpointOptions")
            .field("block_invalid_numbers", &self.block_invalid_numbers)
            .field("num_range", &self.num_range)
            .field("str_range", &self.str_range)
            .field("allow_negatives", &self.allow_negatives)
            .field("allow_positives", &self.allow_positives)
            .field("allowed_types", &self.allowed_types)
            .field("allowed_types_of", &self.allowed_types_of)
            .field("filtering_strings", &self.filtering_strings)
            .field("cooldown", &self.cooldown)
            .field("check_in_tables", &self.check_in_tables)
            .field("buffer_size_limit", &self.buffer_size_limit)
            .field("handling", &self.handling)
            .field("kick_msg", &self.kick_msg)
            .field("custom_punishment", &self.custom_punishment.is_some())
            .finish()
    }
}

/// Normalized per-endpoint policy. Read-only once built.
#[derive(Clone)]
pub struct PolicySet {
    pub block_invalid_numbers: bool,
    pub numeric_range: Option<Bounds<f64>>,
    pub string_length_range: Option<Bounds<usize>>,
    pub allow_negatives: bool,
    pub allow_positives: bool,
    pub allowed_primitive_types: Option<HashSet<PrimitiveKind>>,
    pub allowed_host_types: Option<HashSet<String>>,
    pub filter_string_content: bool,
    pub cooldown: Option<Duration>,
    pub scan_tables: bool,
    pub buffer_size_limit: Option<usize>,
    pub violation_mode: ViolationMode,
    pub kick_message: String,
    pub custom_punishment: Option<Arc<dyn Punishment>>,
}

impl PolicySet {
    /// Apply defaults and reject contradictory settings.
    ///
    /// Both sign flags disabled would reject every non-zero number; that is
    /// corrected to both enabled with a warning instead of failing.
    pub fn from_options(opts: EndpointOptions) -> Result<Self> {
        let mut allow_negatives = opts.allow_negatives.unwrap_or(true);
        let mut allow_positives = opts.allow_positives.unwrap_or(true);
        if !allow_negatives && !allow_positives {
            tracing::warn!(
                "AllowNegatives and AllowPositives are both false; resetting both to true"
            );
            allow_negatives = true;
            allow_positives = true;
        }

        if let Some(r) = &opts.num_range {
            if r.min.is_nan() || r.max.is_nan() {
                return Err(GuardError::Config("NumRange bounds must not be NaN".into()));
            }
            if r.min > r.max {
                return Err(GuardError::Config(format!(
                    "NumRange min ({}) is greater than max ({})",
                    r.min, r.max
                )));
            }
        }
        if let Some(r) = &opts.str_range {
            if r.min > r.max {
                return Err(GuardError::Config(format!(
                    "StrRange min ({}) is greater than max ({})",
                    r.min, r.max
                )));
            }
        }

        let cooldown = match opts.cooldown {
            None => None,
            Some(secs) => Some(Duration::try_from_secs_f64(secs).map_err(|_| {
                GuardError::Config(format!("CoolDown must be a finite number >= 0, got {secs}"))
            })?),
        };

        Ok(Self {
            block_invalid_numbers: opts.block_invalid_numbers.unwrap_or(false),
            numeric_range: opts.num_range,
            string_length_range: opts.str_range,
            allow_negatives,
            allow_positives,
            allowed_primitive_types: opts.allowed_types.map(|v| v.into_iter().collect()),
            allowed_host_types: opts.allowed_types_of.map(|v| v.into_iter().collect()),
            filter_string_content: opts.filtering_strings.unwrap_or(false),
            cooldown,
            scan_tables: opts.check_in_tables.unwrap_or(false),
            buffer_size_limit: opts.buffer_size_limit,
            violation_mode: opts.handling.unwrap_or_default(),
            kick_message: opts
                .kick_msg
                .unwrap_or_else(|| DEFAULT_KICK_MESSAGE.to_string()),
            custom_punishment: opts.custom_punishment,
        })
    }
}

impl fmt::Debug for PolicySet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PolicySet")
            .field("block_invalid_numbers", &self.block_invalid_numbers)
            .field("numeric_range", &self.numeric_range)
            .field("string_length_range", &self.string_length_range)
            .field("allow_negatives", &self.allow_negatives)
            .field("allow_positives", &self.allow_positives)
            .field("allowed_primitive_types", &self.allowed_primitive_types)
            .field("allowed_host_types", &self.allowed_host_types)
            .field("filter_string_content", &self.filter_string_content)
            .field("cooldown", &self.cooldown)
            .field("scan_tables", &self.scan_tables)
            .field("buffer_size_limit", &self.buffer_size_limit)
            .field("violation_mode", &self.violation_mode)
            .field("kick_message", &self.kick_message)
            .field("custom_punishment", &self.custom_punishment.is_some())
            .finish()
    }
}
