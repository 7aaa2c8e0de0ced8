//! Data Transfer Objects for REST request/response serialization.
//!
//! All monetary amounts are integer minor currency units (cents); actor
//! identity arrives as an already-verified opaque id plus role.

pub mod bid_dto;
pub mod common_dto;
pub mod message_dto;
pub mod order_dto;
pub mod presence_dto;

pub use bid_dto::*;
pub use common_dto::*;
pub use message_dto::*;
pub use order_dto::*;
pub use presence_dto::*;
