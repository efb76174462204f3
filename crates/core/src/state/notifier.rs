//! Per-job fan-out of live update messages.
//!
//! Every subscriber owns an unbounded channel. Registrations and published
//! messages go through one command queue drained by a background pump task,
//! so a subscriber sees messages in the order they were published and never
//! sees one published before its own `connected` snapshot.
//!
//! Delivery is best-effort. A subscriber whose receiver is gone is dropped
//! from the registry on the next message for its job. After a terminal
//! message (`completed`, `error` or `cancelled`) all subscribers of that job
//! are released and their streams end.

use sc_protocol::ipc::JobMessage;
use sc_protocol::job_models::{Job, JobId};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot, RwLock};
use tokio_stream::wrappers::UnboundedReceiverStream;
use tokio_util::sync::CancellationToken;

/// Identifies one subscription within the notifier.
pub type SubscriberId = u64;

struct Subscriber {
    id: SubscriberId,
    sender: mpsc::UnboundedSender<JobMessage>,
}

type Registry = HashMap<JobId, Vec<Subscriber>>;

enum Command {
    Register { job_id: JobId, subscriber: Subscriber },
    Unregister { job_id: JobId, id: SubscriberId },
    Publish(JobMessage),
    Forget(JobId),
    Flush(oneshot::Sender<()>),
}

/// Receiving end of a job subscription.
///
/// The first message is always `connected`. Dropping the handle is enough to
/// stop receiving; the notifier prunes it on the next delivery attempt.
#[derive(Debug)]
pub struct Subscription {
    id: SubscriberId,
    job_id: JobId,
    receiver: mpsc::UnboundedReceiver<JobMessage>,
}

impl Subscription {
    pub fn id(&self) -> SubscriberId {
        self.id
    }

    pub fn job_id(&self) -> JobId {
        self.job_id
    }

    /// Next message, or `None` once the subscription has been released.
    pub async fn recv(&mut self) -> Option<JobMessage> {
        self.receiver.recv().await
    }

    /// Next message if one is already queued.
    pub fn try_recv(&mut self) -> Option<JobMessage> {
        self.receiver.try_recv().ok()
    }

    pub fn into_stream(self) -> UnboundedReceiverStream<JobMessage> {
        UnboundedReceiverStream::new(self.receiver)
    }
}

/// Registry of job subscribers and the task that delivers to them.
///
/// Must be created inside a Tokio runtime.
pub struct Notifier {
    commands: mpsc::UnboundedSender<Command>,
    registry: Arc<RwLock<Registry>>,
    next_id: AtomicU64,
    shutdown: CancellationToken,
}

impl Notifier {
    pub fn new() -> Self {
        let (commands, queue) = mpsc::unbounded_channel();
        let registry = Arc::new(RwLock::new(Registry::new()));
        let shutdown = CancellationToken::new();

        tokio::spawn(run_pump(queue, Arc::clone(&registry), shutdown.clone()));

        Self {
            commands,
            registry,
            next_id: AtomicU64::new(1),
            shutdown,
        }
    }

    /// Subscribe to a job, starting with a `connected` snapshot of `job`.
    ///
    /// A job that is already terminal gets the snapshot only.
    pub fn subscribe(&self, job: &Job) -> Subscription {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let (sender, receiver) = mpsc::unbounded_channel();

        let _ = sender.send(JobMessage::connected(job));
        if !job.state.is_terminal() {
            self.send(Command::Register {
                job_id: job.id,
                subscriber: Subscriber { id, sender },
            });
        }

        Subscription {
            id,
            job_id: job.id,
            receiver,
        }
    }

    /// Remove a subscriber. Unknown ids are ignored.
    pub fn unsubscribe(&self, job_id: JobId, id: SubscriberId) {
        self.send(Command::Unregister { job_id, id });
    }

    /// Queue a message for every subscriber of its job. Never blocks.
    pub fn publish(&self, message: JobMessage) {
        self.send(Command::Publish(message));
    }

    /// Release every subscriber of a job.
    pub fn forget(&self, job_id: JobId) {
        self.send(Command::Forget(job_id));
    }

    /// Wait until every command queued so far has been processed.
    pub async fn flush(&self) {
        let (done, wait) = oneshot::channel();
        self.send(Command::Flush(done));
        let _ = wait.await;
    }

    /// Number of registered subscribers of a job.
    pub async fn subscriber_count(&self, job_id: JobId) -> usize {
        self.registry
            .read()
            .await
            .get(&job_id)
            .map_or(0, |subscribers| subscribers.len())
    }

    /// Stop the pump and release all subscribers.
    pub fn shutdown(&self) {
        self.shutdown.cancel();
    }

    fn send(&self, command: Command) {
        if self.commands.send(command).is_err() {
            tracing::debug!("Notifier stopped; command dropped");
        }
    }
}

impl Default for Notifier {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for Notifier {
    fn drop(&mut self) {
        self.shutdown.cancel();
    }
}

async fn run_pump(
    mut queue: mpsc::UnboundedReceiver<Command>,
    registry: Arc<RwLock<Registry>>,
    shutdown: CancellationToken,
) {
    loop {
        tokio::select! {
            biased;
            _ = shutdown.cancelled() => break,
            command = queue.recv() => match command {
                Some(command) => handle(command, &registry).await,
                None => break,
            },
        }
    }

    let mut registry = registry.write().await;
    let count: usize = registry.values().map(Vec::len).sum();
    registry.clear();
    tracing::debug!(count, "Notifier stopped, released subscribers");
}

async fn handle(command: Command, registry: &RwLock<Registry>) {
    match command {
        Command::Register { job_id, subscriber } => {
            registry
                .write()
                .await
                .entry(job_id)
                .or_default()
                .push(subscriber);
        }
        Command::Unregister { job_id, id } => {
            let mut registry = registry.write().await;
            if let Some(subscribers) = registry.get_mut(&job_id) {
                subscribers.retain(|subscriber| subscriber.id != id);
                if subscribers.is_empty() {
                    registry.remove(&job_id);
                }
            }
        }
        Command::Publish(message) => deliver(message, registry).await,
        Command::Forget(job_id) => {
            registry.write().await.remove(&job_id);
        }
        Command::Flush(done) => {
            let _ = done.send(());
        }
    }
}

async fn deliver(message: JobMessage, registry: &RwLock<Registry>) {
    let job_id = message.job_id();
    let mut registry = registry.write().await;
    let Some(subscribers) = registry.get_mut(&job_id) else {
        return;
    };

    subscribers.retain(|subscriber| {
        let delivered = subscriber.sender.send(message.clone()).is_ok();
        if !delivered {
            tracing::warn!(
                %job_id,
                subscriber_id = subscriber.id,
                "Dropping unreachable subscriber"
            );
        }
        delivered
    });

    if subscribers.is_empty() || message.is_terminal() {
        registry.remove(&job_id);
    }
}
