//! External collaborators consulted during validation.
//!
//! Both lookups may be slow or fail. Callers wrap them in a timeout and
//! treat any failure as a rejection.

pub mod buffer;
pub mod text;

use std::sync::Arc;
use std::time::Duration;

pub use buffer::{BufferInspector, LengthPrefixedInspector};
pub use text::{TextFilter, WordListFilter};

pub const DEFAULT_FILTER_TIMEOUT: Duration = Duration::from_millis(500);

/// Collaborators available to every endpoint of a dispatcher.
#[derive(Clone)]
pub struct Filters {
    pub text: Option<Arc<dyn TextFilter>>,
    pub text_timeout: Duration,
    pub buffers: Option<Arc<dyn BufferInspector>>,
    pub buffer_timeout: Duration,
}

impl Default for Filters {
    fn default() -> Self {
        Self {
            text: None,
            text_timeout: DEFAULT_FILTER_TIMEOUT,
            buffers: None,
            buffer_timeout: DEFAULT_FILTER_TIMEOUT,
        }
    }
}

impl Filters {
    pub fn none() -> Self {
        Self::default()
    }

    pub fn with_text_filter(mut self, f: Arc<dyn TextFilter>, timeout: Duration) -> Self {
        self.text = Some(f);
        self.text_timeout = timeout;
        self
    }

    pub fn with_buffer_inspector(mut self, i: Arc<dyn BufferInspector>, timeout: Duration) -> Self {
        self.buffers = Some(i);
        self.buffer_timeout = timeout;
        self
    }
}
