/// Rate Limiting System
use crate::{
    config::RateLimitSettings,
    error::{OctaviaError, OctaviaResult},
};
use axum::{
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
};
use governor::{
    clock::{Clock, DefaultClock},
    state::{InMemoryState, NotKeyed},
    Quota, RateLimiter as GovernorLimiter,
};
use std::{num::NonZeroU32, sync::Arc};

/// Global limiter shielding the upstream platform from request floods
#[derive(Clone)]
pub struct RateLimiter {
    limiter: Option<Arc<GovernorLimiter<NotKeyed, InMemoryState, DefaultClock>>>,
}

impl RateLimiter {
    pub fn new(config: &RateLimitSettings) -> Self {
        if !config.enabled {
            return Self { limiter: None };
        }

        let rps = NonZeroU32::new(config.requests_per_second).unwrap_or(NonZeroU32::MIN);
        let burst = NonZeroU32::new(config.burst_size).unwrap_or(rps);
        let quota = Quota::per_second(rps).allow_burst(burst);

        Self {
            limiter: Some(Arc::new(GovernorLimiter::direct(quota))),
        }
    }

    /// Check the global limit
    pub fn check(&self) -> OctaviaResult<()> {
        let Some(limiter) = &self.limiter else {
            return Ok(());
        };

        limiter.check().map_err(|not_until| OctaviaError::RateLimitExceeded {
            retry_after: not_until.wait_time_from(DefaultClock::default().now()),
        })
    }
}

/// Rate limiting middleware
pub async fn rate_limit_middleware(
    State(ctx): State<crate::context::AppContext>,
    request: Request,
    next: Next,
) -> Response {
    match ctx.rate_limiter.check() {
        Ok(()) => next.run(request).await,
        Err(e) => {
            tracing::debug!(path = %request.uri().path(), "Rate limit exceeded");
            e.into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings(enabled: bool, rps: u32, burst: u32) -> RateLimitSettings {
        RateLimitSettings {
            enabled,
            requests_per_second: rps,
            burst_size: burst,
        }
    }

    #[test]
    fn test_rate_limiter_creation() {
        let limiter = RateLimiter::new(&settings(true, 50, 100));
        assert!(limiter.check().is_ok());
    }

    #[test]
    fn test_burst_limit() {
        let limiter = RateLimiter::new(&settings(true, 1, 5));

        // Should allow burst requests
        for _ in 0..5 {
            assert!(limiter.check().is_ok());
        }

        // Should hit rate limit after burst
        assert!(matches!(
            limiter.check(),
            Err(OctaviaError::RateLimitExceeded { .. })
        ));
    }

    #[test]
    fn test_disabled_never_limits() {
        let limiter = RateLimiter::new(&settings(false, 1, 1));
        for _ in 0..100 {
            assert!(limiter.check().is_ok());
        }
    }
}
