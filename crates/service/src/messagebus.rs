//! Message bus: routes commands and events to registered handlers.

use std::collections::{HashMap, VecDeque};
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use common::BatchRef;
use domain::{Command, CommandKind, Event, EventKind, Message};

use crate::config::BusConfig;
use crate::error::{Result, ServiceError};
use crate::unit_of_work::UnitOfWork;

/// Boxed future returned by a registered handler.
pub type HandlerFuture<T> = Pin<Box<dyn Future<Output = Result<T>> + Send>>;

/// Handler for a command: exactly one per command kind, produces a
/// result that is returned to the external caller.
pub type CommandHandler = Arc<dyn Fn(Command) -> HandlerFuture<Option<BatchRef>> + Send + Sync>;

/// Handler for an event: zero-or-more per event kind, fire-and-forget.
pub type EventHandler = Arc<dyn Fn(Event) -> HandlerFuture<()> + Send + Sync>;

/// Registry mapping message kinds to handlers.
///
/// Built once at the composition root and handed to the bus by value;
/// there is no process-wide mutable handler table.
#[derive(Default)]
pub struct HandlerRegistry {
    commands: HashMap<CommandKind, CommandHandler>,
    events: HashMap<EventKind, Vec<EventHandler>>,
}

impl HandlerRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers the handler for a command kind, replacing any previous
    /// registration.
    pub fn register_command(&mut self, kind: CommandKind, handler: CommandHandler) {
        self.commands.insert(kind, handler);
    }

    /// Appends a handler to an event kind's ordered list.
    pub fn register_event(&mut self, kind: EventKind, handler: EventHandler) {
        self.events.entry(kind).or_default().push(handler);
    }

    fn command_handler(&self, kind: CommandKind) -> Option<&CommandHandler> {
        self.commands.get(&kind)
    }

    fn event_handlers(&self, kind: EventKind) -> &[EventHandler] {
        self.events.get(&kind).map_or(&[], Vec::as_slice)
    }
}

/// The dispatch loop.
///
/// One external call seeds a FIFO queue with one message; handling a
/// message may surface new events through the unit of work, which are
/// appended to the same queue and processed before control returns to
/// the caller.
///
/// Command faults propagate immediately, discarding the rest of the
/// queue. Event-handler faults are retried with exponential backoff and
/// then swallowed; they never abort sibling handlers or the enclosing
/// command.
pub struct MessageBus {
    uow: Arc<dyn UnitOfWork>,
    registry: HandlerRegistry,
    config: BusConfig,
}

impl MessageBus {
    /// Creates a bus over a unit of work and a fully built registry.
    pub fn new(uow: Arc<dyn UnitOfWork>, registry: HandlerRegistry, config: BusConfig) -> Self {
        Self {
            uow,
            registry,
            config,
        }
    }

    /// Returns the unit of work this bus dispatches against.
    pub fn uow(&self) -> &Arc<dyn UnitOfWork> {
        &self.uow
    }

    /// Drains the queue seeded with `message`.
    ///
    /// Returns the ordered results of every command processed; events
    /// contribute side effects only.
    #[tracing::instrument(skip_all)]
    pub async fn handle(&self, message: impl Into<Message>) -> Result<Vec<Option<BatchRef>>> {
        let seed = message.into();
        tracing::debug!(seed = seed.name(), "dispatch started");

        let mut queue: VecDeque<Message> = VecDeque::from([seed]);
        let mut results = Vec::new();
        let mut processed = 0usize;

        while let Some(message) = queue.pop_front() {
            processed += 1;
            if processed > self.config.max_messages {
                tracing::error!(
                    limit = self.config.max_messages,
                    "runaway cascade, aborting dispatch"
                );
                return Err(ServiceError::CascadeOverflow {
                    limit: self.config.max_messages,
                });
            }

            match message {
                Message::Command(command) => {
                    let result = self.handle_command(command, &mut queue).await?;
                    results.push(result);
                }
                Message::Event(event) => {
                    self.handle_event(event, &mut queue).await;
                }
            }
        }

        Ok(results)
    }

    async fn handle_command(
        &self,
        command: Command,
        queue: &mut VecDeque<Message>,
    ) -> Result<Option<BatchRef>> {
        let kind = command.kind();
        metrics::counter!("messagebus_commands_total").increment(1);
        tracing::debug!(command = %kind, "handling command");

        let handler = self
            .registry
            .command_handler(kind)
            .ok_or(ServiceError::MissingHandler(kind.as_str()))?;

        let outcome = handler(command).await;
        // Close the transaction scope; a no-op if the handler committed.
        self.uow.rollback().await;

        match outcome {
            Ok(result) => {
                self.enqueue_new_events(queue).await;
                Ok(result)
            }
            Err(err) => {
                metrics::counter!("messagebus_command_failures_total").increment(1);
                tracing::error!(command = %kind, error = %err, "command handler failed");
                Err(err)
            }
        }
    }

    async fn handle_event(&self, event: Event, queue: &mut VecDeque<Message>) {
        let kind = event.kind();
        metrics::counter!("messagebus_events_total").increment(1);
        tracing::debug!(event = %kind, "handling event");

        for handler in self.registry.event_handlers(kind) {
            self.invoke_with_retry(kind, handler, &event).await;
            // Follow-on events enter the queue whether the handler
            // ultimately succeeded or not.
            self.enqueue_new_events(queue).await;
        }
    }

    /// Runs one event handler with bounded retries, then swallows.
    async fn invoke_with_retry(&self, kind: EventKind, handler: &EventHandler, event: &Event) {
        let mut backoff = self.config.base_backoff;
        for attempt in 1..=self.config.max_retries {
            let outcome = handler(event.clone()).await;
            self.uow.rollback().await;

            match outcome {
                Ok(()) => return,
                Err(err) if attempt < self.config.max_retries => {
                    metrics::counter!("messagebus_handler_retries_total").increment(1);
                    tracing::warn!(
                        event = %kind,
                        attempt,
                        error = %err,
                        "event handler failed, backing off"
                    );
                    tokio::time::sleep(backoff).await;
                    backoff *= 2;
                }
                Err(err) => {
                    metrics::counter!("messagebus_handler_failures_total").increment(1);
                    tracing::error!(
                        event = %kind,
                        attempts = self.config.max_retries,
                        error = %err,
                        "event handler failed permanently"
                    );
                }
            }
        }
    }

    async fn enqueue_new_events(&self, queue: &mut VecDeque<Message>) {
        queue.extend(
            self.uow
                .collect_new_events()
                .await
                .into_iter()
                .map(Message::from),
        );
    }
}
