use anyhow::Result;
use tokio::{sync::mpsc, task::JoinHandle};
use tokio_util::sync::CancellationToken;

/// Minimal actor trait. `Self: Sized` avoids object-safety issues when using `Context<Self>`.
#[async_trait::async_trait]
pub trait Actor: Send + Sized + 'static {
    type Msg: Send + 'static;

    /// Handle a single message. Return `Err` to stop the actor.
    async fn handle(&mut self, msg: Self::Msg, ctx: &mut Context<Self>) -> Result<()>;
}

/// Runtime context for an actor instance.
pub struct Context<A: Actor> {
    // Weak, so dropping every external `Addr` still ends the loop.
    addr: mpsc::WeakSender<A::Msg>,
    cancel: CancellationToken,
    pub stop: bool,
}

impl<A: Actor> Context<A> {
    /// This actor's `Addr`, e.g. to post a follow-up to itself. `None` once
    /// every external address has been dropped.
    ///
    /// ```
    /// # use anyhow::Result;
    /// # use async_trait::async_trait;
    /// # use proxykit_actors::actor::{self, Actor, Context};
    /// #[derive(Debug)]
    /// enum Probe {
    ///     Start(&'static str),
    ///     Finished(&'static str),
    /// }
    /// struct Prober {
    ///     finished: Vec<&'static str>,
    /// }
    /// #[async_trait]
    /// impl Actor for Prober {
    ///     type Msg = Probe;
    ///     async fn handle(&mut self, msg: Probe, ctx: &mut Context<Self>) -> Result<()> {
    ///         match msg {
    ///             Probe::Start(id) => {
    ///                 if let Some(addr) = ctx.addr() {
    ///                     let _ = addr.try_send(Probe::Finished(id));
    ///                 }
    ///             }
    ///             Probe::Finished(id) => {
    ///                 self.finished.push(id);
    ///                 ctx.stop();
    ///             }
    ///         }
    ///         Ok(())
    ///     }
    /// }
    /// let rt = tokio::runtime::Runtime::new().unwrap();
    /// rt.block_on(async {
    ///     let actor::ActorHandle { addr, task } =
    ///         actor::spawn_actor(Prober { finished: Vec::new() }, 2);
    ///     addr.send(Probe::Start("firefox-container-1")).await.unwrap();
    ///     task.await.unwrap().unwrap();
    /// });
    /// ```
    pub fn addr(&self) -> Option<Addr<A>> {
        self.addr.upgrade().map(Addr)
    }

    /// Token cancelled when the actor is shut down; hand it to spawned work.
    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Request a graceful stop after processing the current message.
    pub fn stop(&mut self) {
        self.stop = true;
    }
}

/// Address for sending messages to an actor.
pub struct Addr<A: Actor>(mpsc::Sender<A::Msg>);

/// Manual Clone to avoid unnecessary bounds on `A`/`A::Msg`.
impl<A: Actor> Clone for Addr<A> {
    fn clone(&self) -> Self {
        Self(self.0.clone())
    }
}

impl<A: Actor> Addr<A> {
    /// Async send; awaits backpressure. Returns the message if the receiver is dropped.
    pub async fn send(&self, msg: A::Msg) -> std::result::Result<(), A::Msg> {
        self.0.send(msg).await.map_err(|e| e.0)
    }

    /// Try to send without waiting. Returns the message if the mailbox is full or closed.
    pub fn try_send(&self, msg: A::Msg) -> std::result::Result<(), A::Msg> {
        self.0.try_send(msg).map_err(|e| e.into_inner())
    }

    /// Bounded mailbox capacity.
    pub fn capacity(&self) -> usize {
        self.0.max_capacity()
    }

    pub fn is_closed(&self) -> bool {
        self.0.is_closed()
    }
}

/// Handle to a running actor task.
pub struct ActorHandle<A: Actor> {
    pub addr: Addr<A>,
    pub task: JoinHandle<anyhow::Result<()>>,
}

/// Spawn an actor with a bounded mailbox.
///
/// Stop conditions:
/// - `handle` returns `Err`
/// - all senders are dropped
/// - `ctx.stop()` is called
///
/// ```
/// # use anyhow::Result;
/// # use async_trait::async_trait;
/// # use proxykit_actors::actor::{self, Actor, Context};
/// struct ContainerCounter(usize);
/// #[async_trait]
/// impl Actor for ContainerCounter {
///     type Msg = String;
///     async fn handle(&mut self, _id: String, ctx: &mut Context<Self>) -> Result<()> {
///         self.0 += 1;
///         if self.0 == 2 {
///             ctx.stop();
///         }
///         Ok(())
///     }
/// }
/// let rt = tokio::runtime::Runtime::new().unwrap();
/// rt.block_on(async {
///     let actor::ActorHandle { addr, task } = actor::spawn_actor(ContainerCounter(0), 8);
///     assert_eq!(addr.capacity(), 8);
///     addr.send("firefox-container-1".into()).await.unwrap();
///     addr.send("firefox-container-2".into()).await.unwrap();
///     task.await.unwrap().unwrap();
/// });
/// ```
pub fn spawn_actor<A: Actor>(actor: A, capacity: usize) -> ActorHandle<A> {
    spawn_actor_with_cancel(actor, capacity, CancellationToken::new())
}

/// Like [`spawn_actor`], but the loop also exits once `cancel` fires.
pub fn spawn_actor_with_cancel<A: Actor>(
    mut actor: A,
    capacity: usize,
    cancel: CancellationToken,
) -> ActorHandle<A> {
    let (tx, mut rx) = mpsc::channel::<A::Msg>(capacity);
    let weak = tx.downgrade();
    let addr = Addr(tx);

    let task = tokio::spawn(async move {
        let mut ctx = Context {
            addr: weak,
            cancel: cancel.clone(),
            stop: false,
        };

        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                maybe_msg = rx.recv() => {
                    let Some(msg) = maybe_msg else { break };
                    if let Err(e) = actor.handle(msg, &mut ctx).await {
                        tracing::error!(error = ?e, "actor.stopped_on_error");
                        return Err(e);
                    }
                    if ctx.stop {
                        break;
                    }
                }
            }
        }
        Ok(())
    });

    ActorHandle { addr, task }
}
