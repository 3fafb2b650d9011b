//! Incoming mappings: subscribed topic payloads to ordered domain events.

use crate::topic::{TopicDescriptor, TranslationError};
use serde_json::Value;
use std::fmt;
use std::sync::Arc;
use twinlink_core::DomainEvent;

type SubscribeFn = Arc<dyn Fn(&str) -> Result<Vec<DomainEvent>, TranslationError> + Send + Sync>;

/// A subscribed topic together with its payload translation function.
///
/// Translation produces an ordered sequence of domain events; downstream
/// dispatch forwards them in that order, so dependent updates (a temperature
/// reading before an overheating event derived from it) are representable by
/// ordering. An empty result is valid and drops the message silently.
#[derive(Clone)]
pub struct IncomingMapping {
    descriptor: TopicDescriptor,
    translate: SubscribeFn,
}

impl IncomingMapping {
    /// Create a general mapping with an arbitrary translation function.
    pub fn new(
        descriptor: TopicDescriptor,
        translate: impl Fn(&str) -> Result<Vec<DomainEvent>, TranslationError> + Send + Sync + 'static,
    ) -> Self {
        Self {
            descriptor,
            translate: Arc::new(translate),
        }
    }

    /// Create a mapping that yields exactly one property update per message,
    /// keyed by `key`, with the value produced by `parse`.
    pub fn property(
        key: impl Into<String>,
        descriptor: TopicDescriptor,
        parse: impl Fn(&str) -> Result<Value, TranslationError> + Send + Sync + 'static,
    ) -> Self {
        let key = key.into();
        Self::new(descriptor, move |payload| {
            Ok(vec![DomainEvent::property(key.clone(), parse(payload)?)])
        })
    }

    /// Create a mapping that yields exactly one event notification per
    /// message, keyed by `key`, with the body produced by `parse`.
    pub fn event(
        key: impl Into<String>,
        descriptor: TopicDescriptor,
        parse: impl Fn(&str) -> Result<Value, TranslationError> + Send + Sync + 'static,
    ) -> Self {
        let key = key.into();
        Self::new(descriptor, move |payload| {
            Ok(vec![DomainEvent::event(key.clone(), parse(payload)?)])
        })
    }

    /// Translate a raw payload into domain events.
    ///
    /// # Errors
    ///
    /// Propagates the failure of the caller-supplied translation function.
    pub fn translate(&self, payload: &str) -> Result<Vec<DomainEvent>, TranslationError> {
        (self.translate)(payload)
    }

    /// The topic descriptor.
    #[must_use]
    pub fn descriptor(&self) -> &TopicDescriptor {
        &self.descriptor
    }

    /// The subscribed topic string.
    #[must_use]
    pub fn topic(&self) -> &str {
        self.descriptor.topic()
    }
}

impl fmt::Debug for IncomingMapping {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IncomingMapping")
            .field("descriptor", &self.descriptor)
            .finish_non_exhaustive()
    }
}
