use std::collections::VecDeque;

use log::warn;

use statecast_shared::types::CommandSeq;
use statecast_shared::UserCommand;

/// Commands sent but not yet acknowledged by the server, oldest first.
/// Reconciliation discards everything the server has processed and replays
/// the rest, in order, on top of the authoritative snapshot.
pub struct CommandHistory {
    commands: VecDeque<UserCommand>,
    limit: usize,
}

impl CommandHistory {
    pub fn new(limit: usize) -> Self {
        Self {
            commands: VecDeque::new(),
            limit,
        }
    }

    /// Appends a just-sent command. Sequences must arrive in increasing
    /// order; a command that would break the order is refused, because
    /// replaying it later would integrate input out of order.
    pub fn push(&mut self, command: UserCommand) {
        if let Some(last) = self.commands.back() {
            if command.sequence <= last.sequence {
                warn!(
                    "command {} pushed after {}, refusing out-of-order history entry",
                    command.sequence, last.sequence
                );
                return;
            }
        }
        if self.commands.len() == self.limit {
            let dropped = self.commands.pop_front();
            if let Some(dropped) = dropped {
                warn!(
                    "command history full, dropping unacknowledged command {}",
                    dropped.sequence
                );
            }
        }
        self.commands.push_back(command);
    }

    /// Drops every command the server has processed (sequence ≤ `through`)
    pub fn discard_through(&mut self, through: CommandSeq) {
        while let Some(front) = self.commands.front() {
            if front.sequence <= through {
                self.commands.pop_front();
            } else {
                break;
            }
        }
    }

    /// Pending commands in strictly increasing sequence order
    pub fn iter(&self) -> impl Iterator<Item = &UserCommand> {
        self.commands.iter()
    }

    pub fn last(&self) -> Option<&UserCommand> {
        self.commands.back()
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    pub fn clear(&mut self) {
        self.commands.clear();
    }
}
