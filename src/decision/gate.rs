use std::sync::Arc;
use std::sync::Mutex;
use tokio::sync::OwnedSemaphorePermit;
use tokio::sync::Semaphore;

/// Exclusive send lock for an unframed request/response channel.
///
/// The transport carries no message ids, so a reply can only be matched to
/// its request if at most one request is outstanding. `enter` takes the single
/// permit and parks it; whoever observes the reply, an error, or the close
/// calls `leave` (or `close`) to release it.
#[derive(Debug)]
pub struct Gate {
    permits: Arc<Semaphore>,
    held: Mutex<Option<OwnedSemaphorePermit>>,
}

impl Default for Gate {
    fn default() -> Self {
        Self {
            permits: Arc::new(Semaphore::new(1)),
            held: Mutex::new(None),
        }
    }
}

impl Gate {
    /// Waits for the previous request to be answered, then takes the lock.
    pub async fn enter(&self) -> anyhow::Result<()> {
        let permit = self
            .permits
            .clone()
            .acquire_owned()
            .await
            .map_err(|_| anyhow::anyhow!("decision channel closed"))?;
        match self.held.lock() {
            Ok(mut held) => {
                *held = Some(permit);
                Ok(())
            }
            Err(_) => Err(anyhow::anyhow!("decision gate poisoned")),
        }
    }
    /// Releases the lock if held. Harmless when nothing is outstanding.
    pub fn leave(&self) {
        if let Ok(mut held) = self.held.lock() {
            held.take();
        }
    }
    /// Releases the lock and refuses every future `enter`.
    pub fn close(&self) {
        self.permits.close();
        self.leave();
    }
    pub fn is_closed(&self) -> bool {
        self.permits.is_closed()
    }
    /// Resolves once nothing is outstanding, without taking the lock.
    pub async fn idle(&self) -> anyhow::Result<()> {
        self.permits
            .acquire()
            .await
            .map(drop)
            .map_err(|_| anyhow::anyhow!("decision channel closed"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn second_enter_waits_for_leave() {
        let gate = Arc::new(Gate::default());
        gate.enter().await.unwrap();
        let waiter = tokio::spawn({
            let gate = gate.clone();
            async move { gate.enter().await }
        });
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!waiter.is_finished());
        gate.leave();
        assert!(waiter.await.unwrap().is_ok());
    }

    #[tokio::test]
    async fn close_releases_waiters_with_error() {
        let gate = Arc::new(Gate::default());
        gate.enter().await.unwrap();
        let waiter = tokio::spawn({
            let gate = gate.clone();
            async move { gate.enter().await }
        });
        tokio::time::sleep(Duration::from_millis(20)).await;
        gate.close();
        assert!(waiter.await.unwrap().is_err());
        assert!(gate.is_closed());
        assert!(gate.idle().await.is_err());
    }

    #[tokio::test]
    async fn leave_without_enter_is_harmless() {
        let gate = Gate::default();
        gate.leave();
        gate.leave();
        assert!(gate.idle().await.is_ok());
        gate.enter().await.unwrap();
    }
}
