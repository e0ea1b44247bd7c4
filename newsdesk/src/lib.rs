// Library interface for newsdesk modules
// This allows tests and other binaries to import modules

pub mod agent;
pub mod credentials;
pub mod error;
pub mod llm;
pub mod newsletter;
pub mod prompt;
pub mod search;
pub mod search_params;

pub use error::{FailureKind, NewsletterError};
pub use newsletter::{Newsletter, NewsletterGenerator, NewsletterRequest, NewsletterResult};
