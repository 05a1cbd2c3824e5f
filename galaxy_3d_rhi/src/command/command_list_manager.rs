/// CommandListManager - command buffer pool and the submit/execute queue pair
///
/// Recording threads allocate buffers, fill them through a `CommandList` and
/// commit them to the *submit* queue. Once per frame the coordinating thread
/// calls `end_frame`, which hands everything committed during the frame to
/// the *execute* queue, drained by the execution thread. A buffer committed
/// in frame N is therefore never executed before frame N ends.
///
/// Executed buffers are cleared and kept on a free list for reuse. Every
/// mutation happens under one short-hold `parking_lot::Mutex`; diagnostics
/// are logged after the lock is released.
///
/// Every buffer handed out (allocated, returned by a submit call or popped
/// for execution) counts against `max_cmd_buffers` until it comes back
/// through `release_cmd_buffer`. Dropping one instead leaks its slot.

use std::collections::VecDeque;
use std::sync::Arc;
use parking_lot::{Mutex, MutexGuard};
use crate::command::{CommandBuffer, CommandList};
use crate::config::Config;
use crate::error::Result;
use crate::rhi::Context;
use crate::{engine_debug, engine_trace, engine_warn, engine_fatal};

const LOG_SOURCE: &str = "galaxy3d::cmd";

/// Snapshot of the manager's buffers
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CommandListStats {
    /// Buffers created by the pool (free + queued + handed out)
    pub total_buffers: usize,
    pub free_buffers: usize,
    /// Buffers committed during the current frame
    pub submitted: usize,
    /// Buffers waiting for the execution thread
    pub pending_execution: usize,
    /// Frames ended so far
    pub frame: u64,
}

#[derive(Debug)]
struct Queues {
    free: Vec<CommandBuffer>,
    queues: [VecDeque<CommandBuffer>; 2],
    /// Index of the submit queue, the other one is the execute queue
    submit: usize,
    live: usize,
    frame: u64,
    in_frame: bool,
}

impl Queues {
    fn exec(&self) -> usize {
        1 - self.submit
    }
}

#[derive(Debug)]
pub struct CommandListManager {
    cmd_buffer_capacity: usize,
    max_cmd_buffers: usize,
    queue_overflow_limit: usize,
    state: Mutex<Queues>,
}

impl CommandListManager {
    /// Fails with `Error::InvalidConfig` when `config` does not validate
    pub fn new(config: &Config) -> Result<Self> {
        config.validate()?;

        Ok(Self {
            cmd_buffer_capacity: config.cmd_buffer_capacity,
            max_cmd_buffers: config.max_cmd_buffers,
            queue_overflow_limit: config.queue_overflow_limit,
            state: Mutex::new(Queues {
                free: Vec::new(),
                queues: [VecDeque::new(), VecDeque::new()],
                submit: 0,
                live: 0,
                frame: 0,
                in_frame: false,
            }),
        })
    }

    /// Create a recorder bound to this manager and `context`
    pub fn create_command_list(self: &Arc<Self>, context: Arc<dyn Context>) -> CommandList {
        CommandList::new(Arc::clone(self), context)
    }

    // ===== Buffer pool =====

    /// Take an empty buffer from the free list, or create one
    ///
    /// # Panics
    ///
    /// When `max_cmd_buffers` buffers are already alive.
    pub fn allocate_cmd_buffer(&self) -> CommandBuffer {
        self.take_free(self.state.lock())
    }

    /// Clear `buffer` (its commands are dropped unexecuted) and return it to the free list
    pub fn release_cmd_buffer(&self, mut buffer: CommandBuffer) {
        buffer.clear();
        self.state.lock().free.push(buffer);
    }

    // ===== Submission =====

    /// Commit `submitted` to the submit queue and return an empty buffer
    pub fn submit_and_allocate_cmd_buffer(&self, submitted: CommandBuffer) -> CommandBuffer {
        let state = self.push_submit(self.state.lock(), std::iter::once(submitted));
        self.take_free(state)
    }

    /// Commit an ordered batch of buffers at once and return an empty buffer
    ///
    /// The batch lands contiguously in the submit queue, so commands
    /// recorded by other threads never interleave with it.
    pub fn submit_cmd_buffers(&self, batch: Vec<CommandBuffer>) -> CommandBuffer {
        let state = self.push_submit(self.state.lock(), batch.into_iter());
        self.take_free(state)
    }

    /// Pop the next buffer to execute, without blocking
    ///
    /// The caller owns the buffer and must hand it back through
    /// `release_cmd_buffer` once executed.
    pub fn pop_command_buffer_for_execution(&self) -> Option<CommandBuffer> {
        let mut state = self.state.lock();
        let exec = state.exec();
        state.queues[exec].pop_front()
    }

    /// Replay every buffer currently waiting for execution and recycle it
    ///
    /// Returns the number of buffers executed. Must be called from the
    /// execution thread.
    pub fn execute_pending(&self) -> usize {
        let mut executed = 0;
        while let Some(mut buffer) = self.pop_command_buffer_for_execution() {
            buffer.execute();
            self.release_cmd_buffer(buffer);
            executed += 1;
        }
        executed
    }

    // ===== Frame lifecycle =====

    pub fn begin_frame(&self) {
        let mut state = self.state.lock();
        debug_assert!(!state.in_frame, "begin_frame called twice without end_frame");
        state.in_frame = true;
    }

    /// Hand the buffers committed during this frame to the execution thread
    ///
    /// Buffers the execution thread has not consumed yet stay ahead of the
    /// newly handed over ones.
    pub fn end_frame(&self) {
        let mut state = self.state.lock();
        debug_assert!(state.in_frame, "end_frame called without begin_frame");
        state.in_frame = false;

        state.submit = state.exec();
        let submit = state.submit;
        let exec = state.exec();

        let ended = state.frame;
        let leftovers = std::mem::take(&mut state.queues[submit]);
        let stale = leftovers.len();
        for buffer in leftovers.into_iter().rev() {
            state.queues[exec].push_front(buffer);
        }

        state.frame += 1;
        let frame = state.frame;
        let handed = state.queues[exec].len();
        drop(state);

        if stale > 0 {
            engine_warn!(LOG_SOURCE,
                "{} command buffers from a previous frame were not executed before frame {} ended",
                stale, ended);
        }
        engine_trace!(LOG_SOURCE,
            "Frame {} ended, {} command buffers handed to execution", frame, handed);
    }

    pub fn stats(&self) -> CommandListStats {
        let state = self.state.lock();
        CommandListStats {
            total_buffers: state.live,
            free_buffers: state.free.len(),
            submitted: state.queues[state.submit].len(),
            pending_execution: state.queues[state.exec()].len(),
            frame: state.frame,
        }
    }

    pub fn cmd_buffer_capacity(&self) -> usize {
        self.cmd_buffer_capacity
    }

    // ===== Internals =====

    /// Pop a free buffer or create one; consumes the guard
    fn take_free(&self, mut state: MutexGuard<'_, Queues>) -> CommandBuffer {
        if let Some(buffer) = state.free.pop() {
            return buffer;
        }
        let live = state.live;
        if live >= self.max_cmd_buffers {
            drop(state);
            engine_fatal!(LOG_SOURCE,
                "Command buffer pool exhausted: {} buffers alive (max_cmd_buffers = {})",
                live, self.max_cmd_buffers);
        }
        state.live += 1;
        let live = state.live;
        drop(state);

        if live % 256 == 0 {
            engine_debug!(LOG_SOURCE, "{} command buffers alive", live);
        }
        CommandBuffer::new(self.cmd_buffer_capacity)
    }

    /// Append `batch` to the submit queue, contiguously
    fn push_submit<'a, I>(&'a self, mut state: MutexGuard<'a, Queues>, batch: I) -> MutexGuard<'a, Queues>
    where
        I: ExactSizeIterator<Item = CommandBuffer>,
    {
        let submit = state.submit;
        let queued = state.queues[submit].len();
        if queued + batch.len() > self.queue_overflow_limit {
            let frame = state.frame;
            drop(state);
            engine_fatal!(LOG_SOURCE,
                "Submit queue overflow: {} buffers committed in frame {} (queue_overflow_limit = {})",
                queued, frame, self.queue_overflow_limit);
        }
        state.queues[submit].extend(batch);
        state
    }
}

#[cfg(test)]
#[path = "command_list_manager_tests.rs"]
mod tests;
