//! HTTP API: server, routing, and request/response mapping.
//!
//! Public storefront routes (cart, checkout, tracking, custom-order
//! estimates) need no identity; everything under `/api/v1/admin` sits behind
//! JWT auth and the role-based guard.

pub mod app;
pub mod authz;
pub mod context;
pub mod middleware;
