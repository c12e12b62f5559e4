pub mod admin;
pub mod catalogues;
