//! Service layer: orchestration of order lifecycle, matching, presence,
//! and chat on top of the domain registry and event bus.

pub mod matching_service;
pub mod message_service;
pub mod order_service;
pub mod presence_service;

pub use matching_service::MatchingService;
pub use message_service::MessageService;
pub use order_service::{CheckoutSpec, OrderService};
pub use presence_service::PresenceService;
