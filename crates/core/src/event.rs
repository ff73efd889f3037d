//! Domain events — what a task execution looks like from the outside.
//!
//! The loop runner publishes an event per oracle completion, per tool
//! invocation, at termination, and on failed sink deliveries. Status
//! displays and audit logs subscribe and filter; the runner never knows
//! who is listening.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::broadcast;

/// All domain events in the system.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum DomainEvent {
    /// The oracle produced a turn.
    OracleCompleted {
        task_id: String,
        step: u32,
        duration_ms: u64,
        timestamp: DateTime<Utc>,
    },

    /// A tool was invoked.
    ToolInvoked {
        tool_name: String,
        success: bool,
        duration_ms: u64,
        timestamp: DateTime<Utc>,
    },

    /// A task execution reached TERMINATED.
    TaskTerminated {
        task_id: String,
        status: String,
        step_count: u32,
        timestamp: DateTime<Utc>,
    },

    /// A sink failed to deliver a terminal result.
    DeliveryFailed {
        task_id: String,
        sink: String,
        reason: String,
        timestamp: DateTime<Utc>,
    },
}

/// Multi-consumer pub/sub for [`DomainEvent`]s over a broadcast channel.
///
/// Publishing never blocks and never fails: with no subscribers the event
/// is dropped, and a lagging subscriber loses the oldest events rather
/// than stalling the loop.
pub struct EventBus {
    sender: broadcast::Sender<Arc<DomainEvent>>,
}

impl EventBus {
    /// A bus that retains up to `capacity` events per lagging subscriber.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    pub fn publish(&self, event: DomainEvent) {
        // send() errors only when nobody is subscribed.
        let _ = self.sender.send(Arc::new(event));
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Arc<DomainEvent>> {
        self.sender.subscribe()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(256)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn subscribers_receive_published_events() {
        let bus = EventBus::new(16);
        let mut rx = bus.subscribe();

        bus.publish(DomainEvent::ToolInvoked {
            tool_name: "get_price".into(),
            success: true,
            duration_ms: 42,
            timestamp: Utc::now(),
        });

        let event = rx.recv().await.unwrap();
        match event.as_ref() {
            DomainEvent::ToolInvoked {
                tool_name, success, ..
            } => {
                assert_eq!(tool_name, "get_price");
                assert!(success);
            }
            other => panic!("expected ToolInvoked, got {other:?}"),
        }
    }

    #[test]
    fn publishing_without_subscribers_is_a_no_op() {
        let bus = EventBus::new(16);
        bus.publish(DomainEvent::TaskTerminated {
            task_id: "t1".into(),
            status: "success".into(),
            step_count: 2,
            timestamp: Utc::now(),
        });
    }

    #[tokio::test]
    async fn each_subscriber_sees_every_event() {
        let bus = EventBus::new(16);
        let mut a = bus.subscribe();
        let mut b = bus.subscribe();

        bus.publish(DomainEvent::OracleCompleted {
            task_id: "t1".into(),
            step: 1,
            duration_ms: 10,
            timestamp: Utc::now(),
        });

        assert!(matches!(
            a.recv().await.unwrap().as_ref(),
            DomainEvent::OracleCompleted { step: 1, .. }
        ));
        assert!(matches!(
            b.recv().await.unwrap().as_ref(),
            DomainEvent::OracleCompleted { step: 1, .. }
        ));
    }
}
