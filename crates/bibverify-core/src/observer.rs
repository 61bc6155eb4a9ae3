//! Progress and log notifications for whatever front end drives the pipeline.

use tokio::sync::mpsc;

/// Receives pipeline notifications. Implementations must return quickly.
pub trait Observer: Send + Sync {
    /// Called once per reference, before it is processed. `index` is 1-based.
    fn on_progress(&self, index: usize, total: usize, key: &str);

    /// Human-readable step description; not meant to be parsed.
    fn on_log(&self, message: &str);
}

/// Ignores everything; for headless use.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopObserver;

impl Observer for NoopObserver {
    fn on_progress(&self, _index: usize, _total: usize, _key: &str) {}
    fn on_log(&self, _message: &str) {}
}

/// Adapts a pair of closures.
pub struct FnObserver<P, L> {
    progress: P,
    log: L,
}

impl<P, L> FnObserver<P, L>
where
    P: Fn(usize, usize, &str) + Send + Sync,
    L: Fn(&str) + Send + Sync,
{
    pub fn new(progress: P, log: L) -> Self {
        Self { progress, log }
    }
}

impl<P, L> Observer for FnObserver<P, L>
where
    P: Fn(usize, usize, &str) + Send + Sync,
    L: Fn(&str) + Send + Sync,
{
    fn on_progress(&self, index: usize, total: usize, key: &str) {
        (self.progress)(index, total, key)
    }

    fn on_log(&self, message: &str) {
        (self.log)(message)
    }
}

/// Notification as sent through a [`ChannelObserver`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ObserverEvent {
    Progress {
        index: usize,
        total: usize,
        key: String,
    },
    Log(String),
}

/// Forwards notifications into an unbounded channel so a slow consumer never
/// stalls the pipeline. Sends after the receiver is dropped are discarded.
#[derive(Debug, Clone)]
pub struct ChannelObserver {
    tx: mpsc::UnboundedSender<ObserverEvent>,
}

impl ChannelObserver {
    pub fn new(tx: mpsc::UnboundedSender<ObserverEvent>) -> Self {
        Self { tx }
    }

    pub fn channel() -> (Self, mpsc::UnboundedReceiver<ObserverEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self::new(tx), rx)
    }
}

impl Observer for ChannelObserver {
    fn on_progress(&self, index: usize, total: usize, key: &str) {
        let _ = self.tx.send(ObserverEvent::Progress {
            index,
            total,
            key: key.to_string(),
        });
    }

    fn on_log(&self, message: &str) {
        let _ = self.tx.send(ObserverEvent::Log(message.to_string()));
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;

    #[test]
    fn channel_observer_forwards_in_order() {
        let (observer, mut rx) = ChannelObserver::channel();
        observer.on_progress(1, 2, "a");
        observer.on_log("step");
        assert_eq!(
            rx.try_recv().unwrap(),
            ObserverEvent::Progress {
                index: 1,
                total: 2,
                key: "a".into()
            }
        );
        assert_eq!(rx.try_recv().unwrap(), ObserverEvent::Log("step".into()));
    }

    #[test]
    fn channel_observer_survives_dropped_receiver() {
        let (observer, rx) = ChannelObserver::channel();
        drop(rx);
        observer.on_log("nobody listening");
    }

    #[test]
    fn fn_observer_calls_closures() {
        let seen = Mutex::new(Vec::new());
        let observer = FnObserver::new(
            |i, t, k: &str| seen.lock().unwrap().push(format!("{i}/{t} {k}")),
            |m: &str| seen.lock().unwrap().push(m.to_string()),
        );
        observer.on_progress(3, 4, "key");
        observer.on_log("hello");
        assert_eq!(*seen.lock().unwrap(), vec!["3/4 key", "hello"]);
    }
}
