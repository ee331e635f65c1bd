//! BoxAiProvider -- object-safe dynamic dispatch wrapper for AiProvider.
//!
//! 1. Define an object-safe `AiProviderDyn` trait with boxed futures
//! 2. Blanket-impl `AiProviderDyn` for all `T: AiProvider`
//! 3. `BoxAiProvider` wraps `Box<dyn AiProviderDyn>` and delegates

use std::future::Future;
use std::pin::Pin;

use anonchat_types::chat::Turn;
use anonchat_types::error::AiError;

use super::provider::AiProvider;

/// Object-safe version of [`AiProvider`] with boxed futures.
///
/// This trait exists solely to enable dynamic dispatch (`dyn AiProviderDyn`).
/// A blanket implementation is provided for all types implementing
/// `AiProvider`.
pub trait AiProviderDyn: Send + Sync {
    fn name(&self) -> &str;

    fn model(&self) -> &str;

    fn generate_boxed<'a>(
        &'a self,
        message: &'a str,
        history: &'a [Turn],
    ) -> Pin<Box<dyn Future<Output = Result<String, AiError>> + Send + 'a>>;
}

/// Blanket implementation: any `AiProvider` automatically implements
/// `AiProviderDyn`.
impl<T: AiProvider> AiProviderDyn for T {
    fn name(&self) -> &str {
        AiProvider::name(self)
    }

    fn model(&self) -> &str {
        AiProvider::model(self)
    }

    fn generate_boxed<'a>(
        &'a self,
        message: &'a str,
        history: &'a [Turn],
    ) -> Pin<Box<dyn Future<Output = Result<String, AiError>> + Send + 'a>> {
        Box::pin(self.generate(message, history))
    }
}

/// Type-erased AI provider.
///
/// Since `AiProvider` uses RPITIT, it cannot be used as a trait object
/// directly. `BoxAiProvider` provides equivalent methods that delegate to
/// the inner `AiProviderDyn` trait object, which lets the application state
/// hold whichever backend was configured at startup (or a scripted fake in
/// tests).
pub struct BoxAiProvider {
    inner: Box<dyn AiProviderDyn + Send + Sync>,
}

impl BoxAiProvider {
    /// Wrap a concrete `AiProvider` in a type-erased box.
    pub fn new<T: AiProvider + 'static>(provider: T) -> Self {
        Self {
            inner: Box::new(provider),
        }
    }

    /// Human-readable provider name.
    pub fn name(&self) -> &str {
        self.inner.name()
    }

    /// Model identifier this provider targets.
    pub fn model(&self) -> &str {
        self.inner.model()
    }

    /// Generate a response to `message` given the prior conversation.
    pub async fn generate(&self, message: &str, history: &[Turn]) -> Result<String, AiError> {
        self.inner.generate_boxed(message, history).await
    }
}
