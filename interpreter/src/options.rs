use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::error::{DefaultErrorFormatter, ErrorFormatter};

/// How many times self-referential definitions may be entered at once.
pub const DEFAULT_RECURSION_LIMIT: usize = 30;

/// Upper bound for the recursion limit. Deeper nesting would risk the host
/// stack of a default-sized thread.
pub const MAX_RECURSION_LIMIT: usize = 100;

/// Per-render settings.
#[derive(Clone)]
pub struct RenderOptions {
    pub recursion_limit: usize,
    /// Once passed, every further call renders the deadline marker.
    pub deadline: Option<Instant>,
    pub formatter: Arc<dyn ErrorFormatter>,
}

impl RenderOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Clamped to [`MAX_RECURSION_LIMIT`].
    pub fn with_recursion_limit(mut self, limit: usize) -> Self {
        self.recursion_limit = limit.min(MAX_RECURSION_LIMIT);
        self
    }

    /// The limit actually enforced, even when the field was set directly.
    pub fn effective_recursion_limit(&self) -> usize {
        self.recursion_limit.min(MAX_RECURSION_LIMIT)
    }

    pub fn with_deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(deadline);
        self
    }

    /// Deadline relative to now.
    pub fn with_timeout(self, timeout: Duration) -> Self {
        self.with_deadline(Instant::now() + timeout)
    }

    pub fn with_formatter(mut self, formatter: impl ErrorFormatter + 'static) -> Self {
        self.formatter = Arc::new(formatter);
        self
    }
}

impl Default for RenderOptions {
    fn default() -> Self {
        RenderOptions {
            recursion_limit: DEFAULT_RECURSION_LIMIT,
            deadline: None,
            formatter: Arc::new(DefaultErrorFormatter),
        }
    }
}

impl fmt::Debug for RenderOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RenderOptions")
            .field("recursion_limit", &self.recursion_limit)
            .field("deadline", &self.deadline)
            .finish_non_exhaustive()
    }
}
