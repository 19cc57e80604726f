//! Chat-completion client used for AI nutrition estimates.

pub mod connection;
pub mod endpoints;

use async_trait::async_trait;

pub use connection::{strip_code_fences, ApiConnectionError};
pub use endpoints::Provider;

/// A text-in, text-out completion backend.
///
/// `Provider` is the production implementation; tests supply canned replies.
#[async_trait]
pub trait CompletionClient: Send + Sync {
    async fn complete(
        &self,
        system_prompt: &str,
        user_prompt: &str,
    ) -> Result<String, ApiConnectionError>;
}
