//! Outgoing mappings: runtime action requests to published topic payloads.

use crate::topic::{TopicDescriptor, TranslationError};
use serde_json::Value;
use std::fmt;
use std::sync::Arc;
use twinlink_core::ActionRequest;

type PublishFn = Arc<dyn Fn(&ActionRequest) -> Result<String, TranslationError> + Send + Sync>;

/// A publish topic together with its action translation function.
///
/// A mapping is only ever invoked for actions matching its bound action key;
/// that binding is enforced by the dispatcher's key lookup, not here.
#[derive(Clone)]
pub struct OutgoingMapping {
    descriptor: TopicDescriptor,
    publish: PublishFn,
}

impl OutgoingMapping {
    /// Create a mapping with an arbitrary action translation function.
    pub fn new(
        descriptor: TopicDescriptor,
        publish: impl Fn(&ActionRequest) -> Result<String, TranslationError> + Send + Sync + 'static,
    ) -> Self {
        Self {
            descriptor,
            publish: Arc::new(publish),
        }
    }

    /// Create a mapping whose translation sees only the action body.
    pub fn from_body(
        descriptor: TopicDescriptor,
        encode: impl Fn(&Value) -> Result<String, TranslationError> + Send + Sync + 'static,
    ) -> Self {
        Self::new(descriptor, move |action| encode(&action.body))
    }

    /// Translate an action request into a wire payload.
    ///
    /// # Errors
    ///
    /// Propagates the failure of the caller-supplied translation function.
    pub fn translate(&self, action: &ActionRequest) -> Result<String, TranslationError> {
        (self.publish)(action)
    }

    /// The topic descriptor.
    #[must_use]
    pub fn descriptor(&self) -> &TopicDescriptor {
        &self.descriptor
    }

    /// The publish topic string.
    #[must_use]
    pub fn topic(&self) -> &str {
        self.descriptor.topic()
    }
}

impl fmt::Debug for OutgoingMapping {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OutgoingMapping")
            .field("descriptor", &self.descriptor)
            .finish_non_exhaustive()
    }
}
