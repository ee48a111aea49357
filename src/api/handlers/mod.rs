//! HTTP request handlers.

pub mod activity_handler;
pub mod auth_handler;
pub mod church_handler;
pub mod dashboard_handler;
pub mod group_handler;
pub mod member_handler;
pub mod transfer_handler;

pub use activity_handler::activity_routes;
pub use auth_handler::{auth_routes, session_routes};
pub use church_handler::{church_admin_routes, church_routes};
pub use dashboard_handler::dashboard_routes;
pub use group_handler::group_routes;
pub use member_handler::member_routes;
pub use transfer_handler::transfer_routes;
