//! The per-user notification feed.

mod core;
mod list_endpoint;
mod mark_read_endpoint;

pub use core::{
    Notification, create_notification_table, list_notifications, mark_notification_read,
};
pub(crate) use core::create_notification;
pub use list_endpoint::list_notifications_endpoint;
pub use mark_read_endpoint::mark_notification_read_endpoint;
