use super::context::HandlerContext;
use super::error::HandlerError;
use crate::domain::bridge::Topic;
use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use tracing::{debug, warn};

/// Native implementation of one bridge topic.
#[async_trait]
pub trait CapabilityHandler: Send + Sync {
    async fn handle(&self, data: Value, ctx: HandlerContext) -> Result<Value, HandlerError>;
}

/// Adapts an async closure into a [`CapabilityHandler`].
pub struct FnHandler<F>(F);

#[async_trait]
impl<F, Fut> CapabilityHandler for FnHandler<F>
where
    F: Fn(Value, HandlerContext) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<Value, HandlerError>> + Send + 'static,
{
    async fn handle(&self, data: Value, ctx: HandlerContext) -> Result<Value, HandlerError> {
        (self.0)(data, ctx).await
    }
}

pub fn handler_fn<F, Fut>(f: F) -> Arc<dyn CapabilityHandler>
where
    F: Fn(Value, HandlerContext) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<Value, HandlerError>> + Send + 'static,
{
    Arc::new(FnHandler(f))
}

/// Topic to handler table. Built mutably at startup, then shared behind an
/// `Arc` and only read.
#[derive(Default, Clone)]
pub struct CapabilityRegistry {
    handlers: HashMap<Topic, Arc<dyn CapabilityHandler>>,
}

impl CapabilityRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Last registration for a topic wins; the replaced handler is returned.
    pub fn register(
        &mut self,
        topic: impl Into<Topic>,
        handler: Arc<dyn CapabilityHandler>,
    ) -> Option<Arc<dyn CapabilityHandler>> {
        let topic = topic.into();
        let previous = self.handlers.insert(topic.clone(), handler);
        if previous.is_some() {
            warn!(%topic, "capability handler replaced");
        } else {
            debug!(%topic, "capability handler registered");
        }
        previous
    }

    pub fn register_fn<F, Fut>(&mut self, topic: impl Into<Topic>, f: F)
    where
        F: Fn(Value, HandlerContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Value, HandlerError>> + Send + 'static,
    {
        self.register(topic, handler_fn(f));
    }

    pub fn get(&self, topic: &Topic) -> Option<Arc<dyn CapabilityHandler>> {
        self.handlers.get(topic).cloned()
    }

    pub fn contains(&self, topic: &Topic) -> bool {
        self.handlers.contains_key(topic)
    }

    /// Registered topics sorted by name.
    pub fn topics(&self) -> Vec<Topic> {
        let mut topics: Vec<Topic> = self.handlers.keys().cloned().collect();
        topics.sort_by(|a, b| a.name().cmp(b.name()));
        topics
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::bridge::CoreTopic;
    use serde_json::json;

    #[test]
    fn last_registration_wins() {
        let mut registry = CapabilityRegistry::new();
        let first = handler_fn(|_, _| async { Ok::<_, HandlerError>(json!(1)) });
        let second = handler_fn(|_, _| async { Ok::<_, HandlerError>(json!(2)) });
        assert!(registry.register(CoreTopic::Alert, first).is_none());
        assert!(registry.register(CoreTopic::Alert, second).is_some());
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn unknown_topic_is_absent() {
        let mut registry = CapabilityRegistry::new();
        registry.register_fn("custom-topic".parse::<Topic>().unwrap(), |_, _| async {
            Ok::<_, HandlerError>(Value::Null)
        });
        assert!(registry.get(&Topic::Custom("missing".into())).is_none());
        assert!(registry.contains(&Topic::Custom("custom-topic".into())));
        assert_eq!(
            registry.topics(),
            vec![Topic::Custom("custom-topic".into())]
        );
    }
}
