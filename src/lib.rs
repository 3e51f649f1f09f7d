//! Course catalogue service: a REST API exposing CRUD on courses with
//! ownership-based write permission.
//!
//! The crate follows a hexagonal layout: `domain` holds the aggregates,
//! value types, and repository ports; `inbound::http` adapts actix-web
//! requests onto the domain; `outbound::persistence` implements the ports
//! against PostgreSQL via Diesel. `server` wires the pieces together.

pub mod doc;
pub mod domain;
pub mod inbound;
pub mod middleware;
pub mod outbound;
pub mod server;

pub use doc::ApiDoc;
pub use middleware::Trace;
