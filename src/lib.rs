pub mod base;
pub mod bridge;
pub mod builtin;
pub mod oracle;
pub mod sim;
pub mod timeq;
pub mod traffic;
pub mod ui;
