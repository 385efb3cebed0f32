// Services module - business logic layer

pub mod cart_store;
pub mod notifier;

pub use cart_store::{should_persist, CartStore, LoadOptions};
pub use notifier::{Notifier, RecordingNotifier, TracingNotifier};
