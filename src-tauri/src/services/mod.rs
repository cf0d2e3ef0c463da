pub mod actions;
pub mod login_item;
pub mod notifier;
pub mod watcher;
