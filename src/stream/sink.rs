use std::sync::atomic::{AtomicBool, Ordering};

use tokio::sync::mpsc;

use super::StreamEvent;

/// Ordered output channel for one subscriber.
///
/// Writes after the subscriber is gone are dropped, as are writes after
/// `End`.
#[derive(Debug)]
pub struct StreamSink {
    tx: mpsc::UnboundedSender<StreamEvent>,
    ended: AtomicBool,
}

impl StreamSink {
    pub fn new(tx: mpsc::UnboundedSender<StreamEvent>) -> Self {
        Self {
            tx,
            ended: AtomicBool::new(false),
        }
    }

    /// Deliver `event`. Returns false if it was dropped.
    pub fn send(&self, event: StreamEvent) -> bool {
        if self.ended.load(Ordering::SeqCst) || self.tx.is_closed() {
            return false;
        }
        if event.is_end() && self.ended.swap(true, Ordering::SeqCst) {
            return false;
        }
        self.tx.send(event).is_ok()
    }

    /// Send the terminal `End` frame. Idempotent.
    pub fn end(&self) -> bool {
        self.send(StreamEvent::End)
    }

    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }

    /// Resolves once the subscriber has dropped its receiver.
    pub async fn closed(&self) {
        self.tx.closed().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn end_is_delivered_once_and_closes_the_sink() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let sink = StreamSink::new(tx);

        assert!(sink.send(StreamEvent::Content {
            content: "a".into()
        }));
        assert!(sink.end());
        assert!(!sink.end());
        assert!(!sink.send(StreamEvent::Content {
            content: "late".into()
        }));

        assert_eq!(
            rx.try_recv().unwrap(),
            StreamEvent::Content {
                content: "a".into()
            }
        );
        assert_eq!(rx.try_recv().unwrap(), StreamEvent::End);
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn writes_after_disconnect_are_dropped() {
        let (tx, rx) = mpsc::unbounded_channel();
        let sink = StreamSink::new(tx);
        drop(rx);

        sink.closed().await;
        assert!(sink.is_closed());
        assert!(!sink.send(StreamEvent::End));
    }
}
