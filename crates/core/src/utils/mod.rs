pub mod cancel;
pub mod rate_limiter;
