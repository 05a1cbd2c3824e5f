/// CommandBuffer - fixed-capacity buffer of deferred commands
///
/// Each recorded command is a boxed closure replayed on the execution
/// thread. Capacity is accounted in bytes so a buffer holds a bounded
/// amount of captured state regardless of how many commands it contains:
/// every command costs the size of its closure, rounded up to
/// `COMMAND_ALIGNMENT`, plus the size of the box header.
///
/// Buffers are recycled by the `CommandListManager`: `execute` and `clear`
/// empty the buffer but keep its allocation.

use std::fmt;
use std::mem::size_of;

/// A recorded command
pub type Command = Box<dyn FnOnce() + Send>;

/// Alignment of one command in the byte accounting
pub const COMMAND_ALIGNMENT: usize = 16;

pub struct CommandBuffer {
    capacity: usize,
    cursor: usize,
    commands: Vec<Command>,
}

impl CommandBuffer {
    /// Create an empty buffer accepting `capacity` bytes of commands
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            cursor: 0,
            commands: Vec::new(),
        }
    }

    /// Bytes accounted for a command of closure type `F`
    pub fn command_cost<F: FnOnce() + Send + 'static>() -> usize {
        size_of::<F>().next_multiple_of(COMMAND_ALIGNMENT) + size_of::<Command>()
    }

    /// Append `command`
    ///
    /// Returns the command back if it does not fit. An empty buffer always
    /// accepts one command, whatever its size.
    pub fn push<F: FnOnce() + Send + 'static>(&mut self, command: F) -> Result<(), F> {
        let cost = Self::command_cost::<F>();
        if !self.commands.is_empty() && self.cursor + cost > self.capacity {
            return Err(command);
        }
        self.cursor += cost;
        self.commands.push(Box::new(command));
        Ok(())
    }

    /// Run every command in recording order and empty the buffer
    ///
    /// Returns the number of commands executed.
    pub fn execute(&mut self) -> usize {
        let count = self.commands.len();
        for command in self.commands.drain(..) {
            command();
        }
        self.cursor = 0;
        count
    }

    /// Drop every command without running it
    pub fn clear(&mut self) {
        self.commands.clear();
        self.cursor = 0;
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Bytes accounted so far
    pub fn used(&self) -> usize {
        self.cursor
    }

    pub fn remaining(&self) -> usize {
        self.capacity.saturating_sub(self.cursor)
    }

    /// Number of recorded commands
    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }
}

impl fmt::Debug for CommandBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommandBuffer")
            .field("capacity", &self.capacity)
            .field("used", &self.cursor)
            .field("commands", &self.commands.len())
            .finish()
    }
}

#[cfg(test)]
#[path = "command_buffer_tests.rs"]
mod tests;
