//! Instrumentation for the comparison pipeline.
//!
//! Spans cover `compare_batch`, `compare_pair`, `compute_metrics` and
//! `write_artifacts`; events carry the measured scores and batch counts.
//! `trace_warn!` surfaces the non-fatal problems an operator must see: a
//! rendered file with no golden, a pair that could not be measured and an
//! artifact that could not be written. Without the `tracing` feature every
//! macro compiles to nothing.

/// Info-level span around one pipeline stage.
///
/// Without `tracing`, call sites still write
/// `let _guard = trace_span!(...).entered();` against `NoopSpan`.
#[cfg(feature = "tracing")]
macro_rules! trace_span {
    ($name:expr $(, $($field:tt)*)?) => {
        tracing::info_span!($name $(, $($field)*)?)
    };
}

#[cfg(not(feature = "tracing"))]
macro_rules! trace_span {
    ($name:expr $(, $($field:tt)*)?) => {
        $crate::trace::NoopSpan
    };
}

/// Info-level event with named fields (scores, counts, artifact paths).
#[cfg(feature = "tracing")]
macro_rules! trace_event {
    ($name:expr, $($key:ident = $value:expr),+ $(,)?) => {
        tracing::info!(name: $name, $($key = $value),+)
    };
    ($name:expr) => {
        tracing::info!(name: $name)
    };
}

#[cfg(not(feature = "tracing"))]
macro_rules! trace_event {
    ($name:expr, $($key:ident = $value:expr),+ $(,)?) => {
        // Field expressions are still evaluated so their inputs count as used.
        let _ = ($($value,)+);
    };
    ($name:expr) => {};
}

/// Warn-level message for a pair or file the run continues past.
#[cfg(feature = "tracing")]
macro_rules! trace_warn {
    ($($arg:tt)+) => {
        tracing::warn!($($arg)+)
    };
}

#[cfg(not(feature = "tracing"))]
macro_rules! trace_warn {
    ($($arg:tt)+) => {{
        if false {
            let _ = format!($($arg)+);
        }
    }};
}

pub(crate) use trace_event;
pub(crate) use trace_span;
pub(crate) use trace_warn;

/// Guard returned by `trace_span!` without the `tracing` feature.
#[cfg(not(feature = "tracing"))]
pub struct NoopSpan;

#[cfg(not(feature = "tracing"))]
impl NoopSpan {
    /// Stands in for `Span::entered()`.
    #[inline]
    pub fn entered(self) -> Self {
        self
    }
}
