// Payment Monitor - polls the payment service for each unpaid job
//
// One polling task per job. When funds are locked the monitor emits
// `PaymentEvent::Confirmed` on its channel and the poller exits; the
// worker consuming the channel runs the job.

use crate::domain::{JobId, PaymentId, PaymentState};
use crate::port::PaymentGateway;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

/// Emitted when a watched payment settles one way or the other
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PaymentEvent {
    /// Funds locked: run the job
    Confirmed { job_id: JobId, payment_id: PaymentId },
    /// Payment ended without funds being locked
    Abandoned { job_id: JobId, state: PaymentState },
}

type Watchers = Arc<Mutex<HashMap<JobId, (u64, JoinHandle<()>)>>>;

pub struct PaymentMonitor {
    gateway: Arc<dyn PaymentGateway>,
    events: mpsc::UnboundedSender<PaymentEvent>,
    poll_interval: Duration,
    watchers: Watchers,
    generation: AtomicU64,
}

impl PaymentMonitor {
    /// Create a monitor and the receiving end of its event channel
    pub fn new(
        gateway: Arc<dyn PaymentGateway>,
        poll_interval: Duration,
    ) -> (Self, mpsc::UnboundedReceiver<PaymentEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let monitor = Self {
            gateway,
            events: tx,
            poll_interval,
            watchers: Arc::new(Mutex::new(HashMap::new())),
            generation: AtomicU64::new(0),
        };
        (monitor, rx)
    }

    /// Start polling `payment_id` on behalf of `job_id`
    ///
    /// Replaces any poller already running for the job.
    pub fn watch(&self, job_id: JobId, payment_id: PaymentId) {
        let generation = self.generation.fetch_add(1, Ordering::SeqCst);

        // Held across spawn so the task can't deregister before it's registered
        let mut watchers = self.watchers.lock().unwrap_or_else(|e| e.into_inner());
        if let Some((_, previous)) = watchers.remove(&job_id) {
            previous.abort();
        }

        info!(job_id = %job_id, payment_id = %payment_id, "Starting payment status monitoring");

        let handle = tokio::spawn(poll_payment(
            Arc::clone(&self.gateway),
            self.events.clone(),
            self.poll_interval,
            Arc::clone(&self.watchers),
            generation,
            job_id.clone(),
            payment_id,
        ));
        watchers.insert(job_id, (generation, handle));
    }

    /// Stop polling for a job (no-op if not watched)
    pub fn unwatch(&self, job_id: &JobId) {
        let removed = self
            .watchers
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .remove(job_id);
        if let Some((_, handle)) = removed {
            handle.abort();
            info!(job_id = %job_id, "Stopped payment status monitoring");
        }
    }

    pub fn is_watching(&self, job_id: &JobId) -> bool {
        self.watchers
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .contains_key(job_id)
    }

    pub fn watched_count(&self) -> usize {
        self.watchers.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    /// Abort every poller (shutdown)
    pub fn stop_all(&self) {
        let mut watchers = self.watchers.lock().unwrap_or_else(|e| e.into_inner());
        let count = watchers.len();
        for (_, (_, handle)) in watchers.drain() {
            handle.abort();
        }
        info!(stopped = count, "Payment monitoring stopped");
    }
}

impl Drop for PaymentMonitor {
    fn drop(&mut self) {
        if let Ok(mut watchers) = self.watchers.lock() {
            for (_, (_, handle)) in watchers.drain() {
                handle.abort();
            }
        }
    }
}

async fn poll_payment(
    gateway: Arc<dyn PaymentGateway>,
    events: mpsc::UnboundedSender<PaymentEvent>,
    poll_interval: Duration,
    watchers: Watchers,
    generation: u64,
    job_id: JobId,
    payment_id: PaymentId,
) {
    // First check one interval after registration
    let mut ticker =
        tokio::time::interval_at(tokio::time::Instant::now() + poll_interval, poll_interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    let event = loop {
        ticker.tick().await;

        match gateway.check_payment_status(&payment_id).await {
            Ok(state) if state.is_confirmed() => {
                info!(job_id = %job_id, payment_id = %payment_id, "Payment confirmed");
                break PaymentEvent::Confirmed {
                    job_id: job_id.clone(),
                    payment_id: payment_id.clone(),
                };
            }
            Ok(state) if state.is_abandoned() => {
                warn!(job_id = %job_id, payment_id = %payment_id, state = %state, "Payment abandoned");
                break PaymentEvent::Abandoned {
                    job_id: job_id.clone(),
                    state,
                };
            }
            Ok(state) => {
                debug!(job_id = %job_id, state = %state, "Payment not yet confirmed");
            }
            Err(e) => {
                warn!(job_id = %job_id, payment_id = %payment_id, error = %e, "Payment status check failed");
            }
        }
    };

    {
        let mut watchers = watchers.lock().unwrap_or_else(|e| e.into_inner());
        if watchers.get(&job_id).map(|(g, _)| *g) == Some(generation) {
            watchers.remove(&job_id);
        }
    }

    if events.send(event).is_err() {
        warn!(job_id = %job_id, "Payment event dropped: no worker listening");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::port::payment_gateway::mocks::MockPaymentGateway;
    use crate::port::PaymentError;

    const FAST: Duration = Duration::from_millis(10);

    async fn wait_until_unwatched(monitor: &PaymentMonitor, job_id: &JobId) {
        for _ in 0..200 {
            if !monitor.is_watching(job_id) {
                return;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        panic!("job {} still watched", job_id);
    }

    #[tokio::test]
    async fn test_confirmation_emits_event_and_stops() {
        let gateway = Arc::new(MockPaymentGateway::new());
        gateway.script(
            "pay-x",
            vec![
                Ok(PaymentState::Pending),
                Err(PaymentError::Transport("flaky".to_string())),
                Ok(PaymentState::FundsLocked),
            ],
        );
        let (monitor, mut rx) = PaymentMonitor::new(gateway.clone(), FAST);

        monitor.watch("job-1".to_string(), "pay-x".to_string());
        assert!(monitor.is_watching(&"job-1".to_string()));

        let event = rx.recv().await.unwrap();
        assert_eq!(
            event,
            PaymentEvent::Confirmed {
                job_id: "job-1".to_string(),
                payment_id: "pay-x".to_string()
            }
        );
        wait_until_unwatched(&monitor, &"job-1".to_string()).await;
        assert!(gateway.status_checks() >= 3);
    }

    #[tokio::test]
    async fn test_abandoned_payment() {
        let gateway = Arc::new(MockPaymentGateway::new());
        gateway.script("pay-r", vec![Ok(PaymentState::RefundWithdrawn)]);
        let (monitor, mut rx) = PaymentMonitor::new(gateway, FAST);

        monitor.watch("job-2".to_string(), "pay-r".to_string());

        let event = rx.recv().await.unwrap();
        assert_eq!(
            event,
            PaymentEvent::Abandoned {
                job_id: "job-2".to_string(),
                state: PaymentState::RefundWithdrawn
            }
        );
    }

    #[tokio::test]
    async fn test_unwatch_stops_polling() {
        let gateway = Arc::new(MockPaymentGateway::new());
        let (monitor, mut rx) = PaymentMonitor::new(gateway.clone(), FAST);

        monitor.watch("job-3".to_string(), "pay-never".to_string());
        tokio::time::sleep(Duration::from_millis(30)).await;
        monitor.unwatch(&"job-3".to_string());
        assert!(!monitor.is_watching(&"job-3".to_string()));

        let checks = gateway.status_checks();
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(gateway.status_checks(), checks);
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_rewatch_replaces_poller() {
        let gateway = Arc::new(MockPaymentGateway::new());
        let (monitor, _rx) = PaymentMonitor::new(gateway, FAST);

        monitor.watch("job-4".to_string(), "pay-a".to_string());
        monitor.watch("job-4".to_string(), "pay-b".to_string());
        assert_eq!(monitor.watched_count(), 1);

        monitor.stop_all();
        assert_eq!(monitor.watched_count(), 0);
    }
}
