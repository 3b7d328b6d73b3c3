// In-app notifications for any signed-in account.

pub mod handlers;
