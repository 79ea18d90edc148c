//! Authentication primitives for the admin surface.
//!
//! - [`jwt`] -- HS256 access-token validation (and generation for tooling).
//!
//! Signing parties never authenticate; they hold capability tokens resolved
//! by the workflow layer.

pub mod jwt;
