//! Well-known role name constants.
//!
//! The identity provider issues these in the JWT `role` claim; the sign-off
//! service only ever checks for [`ROLE_ADMIN`].

pub const ROLE_ADMIN: &str = "admin";
