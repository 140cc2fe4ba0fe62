//! Leaf-level checks for a single value.
//!
//! Number and length checks are pure. String content and buffer size checks
//! consult external collaborators under a timeout and fail closed.

use tokio::time::timeout;

use remguard_core::{RejectReason, Value};

use crate::filter::Filters;

use super::options::PolicySet;

/// Outcome of a single check.
pub type Check = std::result::Result<(), RejectReason>;

/// Finiteness, range, then sign. Zero passes both sign checks.
pub fn validate_number(n: f64, policy: &PolicySet) -> Check {
    if policy.block_invalid_numbers && !n.is_finite() {
        return Err(RejectReason::InvalidNumber);
    }
    if let Some(range) = &policy.numeric_range {
        if !range.contains(n) {
            return Err(RejectReason::OutOfRange);
        }
    }
    if n < 0.0 && !policy.allow_negatives {
        return Err(RejectReason::SignNotAllowed);
    }
    if n > 0.0 && !policy.allow_positives {
        return Err(RejectReason::SignNotAllowed);
    }
    Ok(())
}

/// Length in bytes against the configured inclusive range.
pub fn validate_string_length(s: &str, policy: &PolicySet) -> Check {
    match &policy.string_length_range {
        Some(range) if !range.contains(s.len()) => Err(RejectReason::LengthOutOfRange),
        _ => Ok(()),
    }
}

/// Allow-list membership for both the coarse kind and the host tag.
pub fn check_type(v: &Value, policy: &PolicySet) -> Check {
    if let Some(kinds) = &policy.allowed_primitive_types {
        if !kinds.contains(&v.kind()) {
            return Err(RejectReason::TypeNotAllowed);
        }
    }
    if let Some(tags) = &policy.allowed_host_types {
        if !tags.contains(v.type_tag()) {
            return Err(RejectReason::TypeNotAllowed);
        }
    }
    Ok(())
}

/// Applies one endpoint's policy to individual values.
pub struct ValueValidator<'a> {
    policy: &'a PolicySet,
    filters: &'a Filters,
}

impl<'a> ValueValidator<'a> {
    pub fn new(policy: &'a PolicySet, filters: &'a Filters) -> Self {
        Self { policy, filters }
    }

    pub fn policy(&self) -> &PolicySet {
        self.policy
    }

    /// Type check plus the leaf checks for the value's kind. Tables only get
    /// the type check here; descending into them is the scanner's job.
    pub async fn validate_value(&self, v: &Value) -> Check {
        check_type(v, self.policy)?;
        match v {
            Value::Number(n) => validate_number(*n, self.policy),
            Value::Str(s) => self.validate_string(s).await,
            Value::Buffer(b) => self.validate_buffer(b).await,
            _ => Ok(()),
        }
    }

    pub async fn validate_string(&self, s: &str) -> Check {
        validate_string_length(s, self.policy)?;
        if !self.policy.filter_string_content {
            return Ok(());
        }
        let Some(filter) = self.filters.text.as_ref() else {
            return Err(RejectReason::ContentRejected);
        };
        match timeout(self.filters.text_timeout, filter.filter_text(s)).await {
            Ok(Ok(filtered)) if filtered == s => Ok(()),
            Ok(Ok(_)) => Err(RejectReason::ContentRejected),
            Ok(Err(e)) => {
                tracing::warn!(error = %e, "text filter failed; rejecting");
                Err(RejectReason::ContentRejected)
            }
            Err(_) => {
                tracing::warn!("text filter timed out; rejecting");
                Err(RejectReason::ContentRejected)
            }
        }
    }

    pub async fn validate_buffer(&self, b: &[u8]) -> Check {
        let Some(limit) = self.policy.buffer_size_limit else {
            return Ok(());
        };
        if b.len() > limit {
            return Err(RejectReason::BufferRejected);
        }
        let Some(inspector) = self.filters.buffers.as_ref() else {
            return Err(RejectReason::BufferRejected);
        };
        match timeout(self.filters.buffer_timeout, inspector.decompressed_size(b)).await {
            Ok(Ok(size)) if size <= limit => Ok(()),
            Ok(Ok(_)) => Err(RejectReason::BufferRejected),
            Ok(Err(e)) => {
                tracing::warn!(error = %e, "buffer size lookup failed; rejecting");
                Err(RejectReason::BufferRejected)
            }
            Err(_) => {
                tracing::warn!("buffer size lookup timed out; rejecting");
                Err(RejectReason::BufferRejected)
            }
        }
    }
}
