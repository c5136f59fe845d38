pub mod webhook;

pub use webhook::{LoginEvent, WebhookNotifier};
