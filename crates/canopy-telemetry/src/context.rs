//! Request context for correlating gateway calls with index log lines.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Correlation data for one gateway request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RequestContext {
    /// Unique request identifier.
    pub request_id: Uuid,
    /// Shared by a request and every sub-request it spawns.
    pub correlation_id: Uuid,
    /// The spawning request, for sub-requests.
    pub parent_id: Option<Uuid>,
    /// The authenticated caller, once known.
    pub user_id: Option<Uuid>,
    /// Index operation being performed (e.g. `create_file`).
    pub operation: Option<String>,
    /// When the request started.
    pub started_at: DateTime<Utc>,
}

impl RequestContext {
    /// Start a new, uncorrelated request.
    #[must_use]
    pub fn new() -> Self {
        let id = Uuid::new_v4();
        Self {
            request_id: id,
            correlation_id: id,
            parent_id: None,
            user_id: None,
            operation: None,
            started_at: Utc::now(),
        }
    }

    /// A sub-request sharing this request's correlation id and caller.
    #[must_use]
    pub fn child(&self) -> Self {
        Self {
            request_id: Uuid::new_v4(),
            correlation_id: self.correlation_id,
            parent_id: Some(self.request_id),
            user_id: self.user_id,
            operation: None,
            started_at: Utc::now(),
        }
    }

    /// Continue a correlation started elsewhere (e.g. an inbound header).
    #[must_use]
    pub fn with_correlation_id(mut self, id: Uuid) -> Self {
        self.correlation_id = id;
        self
    }

    /// Record the caller.
    #[must_use]
    pub fn with_user_id(mut self, id: Uuid) -> Self {
        self.user_id = Some(id);
        self
    }

    /// Record the operation name.
    #[must_use]
    pub fn with_operation(mut self, operation: impl Into<String>) -> Self {
        self.operation = Some(operation.into());
        self
    }

    /// Milliseconds since the request started. Zero if the clock went
    /// backwards.
    #[must_use]
    pub fn elapsed_ms(&self) -> i64 {
        Utc::now()
            .signed_duration_since(self.started_at)
            .num_milliseconds()
            .max(0)
    }

    /// A span carrying this context's identifiers.
    #[must_use]
    pub fn span(&self) -> tracing::Span {
        tracing::info_span!(
            "request",
            request_id = %self.request_id,
            correlation_id = %self.correlation_id,
            user_id = self.user_id.map(tracing::field::display),
            operation = self.operation.as_deref(),
        )
    }
}

impl Default for RequestContext {
    fn default() -> Self {
        Self::new()
    }
}

/// Keeps the request span entered and logs completion on drop.
///
/// Holds an entered span, so it must stay on one thread; across `.await`
/// points use `tracing::Instrument` with [`RequestContext::span`] instead.
pub struct RequestGuard {
    context: RequestContext,
    _span: tracing::span::EnteredSpan,
}

impl RequestGuard {
    /// Enter the context's span.
    #[must_use]
    pub fn new(context: RequestContext) -> Self {
        let span = context.span().entered();
        tracing::debug!("request started");
        Self {
            context,
            _span: span,
        }
    }

    /// The guarded context.
    #[must_use]
    pub fn context(&self) -> &RequestContext {
        &self.context
    }
}

impl Drop for RequestGuard {
    fn drop(&mut self) {
        tracing::debug!(elapsed_ms = self.context.elapsed_ms(), "request completed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_context_is_its_own_correlation() {
        let ctx = RequestContext::new();
        assert_eq!(ctx.request_id, ctx.correlation_id);
        assert!(ctx.parent_id.is_none());
        assert!(ctx.user_id.is_none());
    }

    #[test]
    fn test_child_inherits_correlation_and_user() {
        let user = Uuid::new_v4();
        let parent = RequestContext::new()
            .with_user_id(user)
            .with_operation("query_file");
        let child = parent.child();

        assert_ne!(child.request_id, parent.request_id);
        assert_eq!(child.correlation_id, parent.correlation_id);
        assert_eq!(child.parent_id, Some(parent.request_id));
        assert_eq!(child.user_id, Some(user));
        assert!(child.operation.is_none());
    }

    #[test]
    fn test_elapsed() {
        let ctx = RequestContext::new();
        std::thread::sleep(std::time::Duration::from_millis(10));
        assert!(ctx.elapsed_ms() >= 10);
    }

    #[test]
    fn test_guard_exposes_context() {
        let correlation = Uuid::new_v4();
        let guard = RequestGuard::new(
            RequestContext::new()
                .with_correlation_id(correlation)
                .with_operation("share_file"),
        );
        assert_eq!(guard.context().correlation_id, correlation);
    }

    #[test]
    fn test_serialization() {
        let ctx = RequestContext::new().with_operation("move_file");
        let json = serde_json::to_string(&ctx).unwrap();
        assert!(json.contains("\"operation\":\"move_file\""));
        let parsed: RequestContext = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.request_id, ctx.request_id);
    }
}
