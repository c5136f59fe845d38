pub mod attempts;
pub mod credentials;
pub mod gate;

pub use attempts::AttemptTracker;
pub use credentials::CredentialStore;
pub use gate::AuthOutcome;
