//! The message sum type consumed by the bus.

use serde::{Deserialize, Serialize};

use crate::commands::Command;
use crate::events::Event;

/// A unit of work for the message bus: either a command or an event.
///
/// A closed sum type, dispatched with an exhaustive match. There is no
/// "neither" case; the unrecognized-message failure mode is a command
/// kind with no registered handler.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Message {
    Command(Command),
    Event(Event),
}

impl Message {
    /// Returns the type name of the wrapped command or event.
    pub fn name(&self) -> &'static str {
        match self {
            Message::Command(command) => command.kind().as_str(),
            Message::Event(event) => event.kind().as_str(),
        }
    }
}

impl From<Command> for Message {
    fn from(command: Command) -> Self {
        Message::Command(command)
    }
}

impl From<Event> for Message {
    fn from(event: Event) -> Self {
        Message::Event(event)
    }
}
