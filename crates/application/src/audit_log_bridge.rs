use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use grcpilot_domain::AiInteraction;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

/// Receiver side of the audit channel.
#[async_trait]
pub trait AuditLogSubscriber: Send + Sync {
    /// Handles one published interaction.
    ///
    /// Handlers must swallow their own failures; nothing is propagated back
    /// to the publishing feature.
    async fn on_interaction(&self, interaction: AiInteraction);
}

type SubscriberSenders = Vec<mpsc::UnboundedSender<AiInteraction>>;

/// In-process publish/subscribe channel for AI interactions.
///
/// Handles are cheap to clone and are passed to every call site that
/// publishes. Publishing never blocks and never drops an interaction while a
/// subscriber is attached; an interaction published with no subscriber
/// attached is lost.
#[derive(Clone, Default)]
pub struct AuditLogBridge {
    subscribers: Arc<Mutex<SubscriberSenders>>,
}

impl AuditLogBridge {
    /// Creates a bridge with no subscriber attached.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Publishes one interaction to every attached subscriber, fire-and-forget.
    pub fn publish(&self, interaction: AiInteraction) {
        let mut subscribers = self.lock_subscribers();
        subscribers.retain(|sender| !sender.is_closed());

        let Some((last, others)) = subscribers.split_last() else {
            debug!("no audit subscriber attached; interaction dropped");
            return;
        };
        for sender in others {
            let _ = sender.send(interaction.clone());
        }
        let _ = last.send(interaction);
    }

    /// Attaches a handler that receives every interaction published from now on.
    ///
    /// The handler runs on one spawned task and sees interactions in publish
    /// order, one at a time. Must be called inside a tokio runtime.
    #[must_use]
    pub fn subscribe(&self, handler: Arc<dyn AuditLogSubscriber>) -> AuditSubscription {
        let (sender, mut receiver) = mpsc::unbounded_channel();
        self.lock_subscribers().push(sender);

        let task = tokio::spawn(async move {
            while let Some(interaction) = receiver.recv().await {
                handler.on_interaction(interaction).await;
            }
        });

        AuditSubscription { task }
    }

    /// Returns the number of attached subscribers.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.lock_subscribers()
            .iter()
            .filter(|sender| !sender.is_closed())
            .count()
    }

    fn lock_subscribers(&self) -> MutexGuard<'_, SubscriberSenders> {
        match self.subscribers.lock() {
            Ok(subscribers) => subscribers,
            Err(poisoned) => {
                warn!("audit subscriber list lock was poisoned; recovering");
                poisoned.into_inner()
            }
        }
    }
}

/// Handle to one attached audit handler.
#[derive(Debug)]
pub struct AuditSubscription {
    task: JoinHandle<()>,
}

impl AuditSubscription {
    /// Detaches the handler; interactions still queued are discarded.
    pub fn unsubscribe(self) {
        self.task.abort();
    }

    /// Waits until every bridge handle is dropped and the handler has
    /// processed all queued interactions.
    pub async fn drained(self) {
        if let Err(error) = self.task.await {
            warn!(error = %error, "audit subscriber task ended abnormally");
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use async_trait::async_trait;
    use grcpilot_domain::AiInteraction;
    use tokio::sync::Mutex;

    use super::{AuditLogBridge, AuditLogSubscriber};

    #[derive(Default)]
    struct CollectingSubscriber {
        actions: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl AuditLogSubscriber for CollectingSubscriber {
        async fn on_interaction(&self, interaction: AiInteraction) {
            self.actions.lock().await.push(interaction.action);
        }
    }

    fn interaction(action: &str) -> AiInteraction {
        AiInteraction {
            module: "Reporting".to_owned(),
            action: action.to_owned(),
            prompt_text: "prompt".to_owned(),
            response_text: "response".to_owned(),
            model_id: "llama3.2".to_owned(),
        }
    }

    #[tokio::test]
    async fn publish_without_subscriber_is_lost() {
        let bridge = AuditLogBridge::new();
        bridge.publish(interaction("early"));

        let subscriber = Arc::new(CollectingSubscriber::default());
        let subscription = bridge.subscribe(subscriber.clone());
        bridge.publish(interaction("late"));
        drop(bridge);
        subscription.drained().await;

        assert_eq!(*subscriber.actions.lock().await, vec!["late".to_owned()]);
    }

    #[tokio::test]
    async fn subscriber_sees_interactions_in_publish_order() {
        let bridge = AuditLogBridge::new();
        let subscriber = Arc::new(CollectingSubscriber::default());
        let subscription = bridge.subscribe(subscriber.clone());
        assert_eq!(bridge.subscriber_count(), 1);

        let publisher = bridge.clone();
        for action in ["first", "second", "third"] {
            publisher.publish(interaction(action));
        }
        drop(publisher);
        drop(bridge);
        subscription.drained().await;

        assert_eq!(
            *subscriber.actions.lock().await,
            vec!["first".to_owned(), "second".to_owned(), "third".to_owned()]
        );
    }

    #[tokio::test]
    async fn burst_larger_than_any_buffer_is_fully_delivered() {
        let bridge = AuditLogBridge::new();
        let subscriber = Arc::new(CollectingSubscriber::default());
        let subscription = bridge.subscribe(subscriber.clone());

        let expected: Vec<String> = (0..500).map(|index| format!("E{index}")).collect();
        for action in &expected {
            bridge.publish(interaction(action));
        }
        drop(bridge);
        subscription.drained().await;

        assert_eq!(*subscriber.actions.lock().await, expected);
    }

    #[tokio::test]
    async fn every_subscriber_receives_each_interaction() {
        let bridge = AuditLogBridge::new();
        let first = Arc::new(CollectingSubscriber::default());
        let second = Arc::new(CollectingSubscriber::default());
        let first_subscription = bridge.subscribe(first.clone());
        let second_subscription = bridge.subscribe(second.clone());
        assert_eq!(bridge.subscriber_count(), 2);

        bridge.publish(interaction("shared"));
        drop(bridge);
        first_subscription.drained().await;
        second_subscription.drained().await;

        assert_eq!(*first.actions.lock().await, vec!["shared".to_owned()]);
        assert_eq!(*second.actions.lock().await, vec!["shared".to_owned()]);
    }

    #[tokio::test]
    async fn unsubscribed_handler_stops_counting() {
        let bridge = AuditLogBridge::new();
        let subscription = bridge.subscribe(Arc::new(CollectingSubscriber::default()));
        assert_eq!(bridge.subscriber_count(), 1);

        subscription.unsubscribe();
        tokio::task::yield_now().await;
        for _ in 0..100 {
            if bridge.subscriber_count() == 0 {
                break;
            }
            tokio::time::sleep(std::time::Duration::from_millis(5)).await;
        }

        assert_eq!(bridge.subscriber_count(), 0);
        bridge.publish(interaction("after"));
    }
}
