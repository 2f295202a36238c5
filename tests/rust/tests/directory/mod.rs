//! Server directory integration tests: live fetch, conditional refresh,
//! and cache fallback against a mock directory API.

mod live;
