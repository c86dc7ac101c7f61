use crate::command::Command;
use serde::Serialize;

/// A command together with its position in the log.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LogEntry {
    pub index: usize,
    pub command: Command,
}

/// Append-only, in-memory sequence of submitted commands.
///
/// Entries are never reordered or removed; the index of an entry is the
/// number of entries that were appended before it.
#[derive(Debug, Default)]
pub struct CommandLog {
    entries: Vec<Command>,
}

impl CommandLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `command` and return its index.
    pub fn append(&mut self, command: Command) -> usize {
        let index = self.entries.len();
        self.entries.push(command);
        index
    }

    pub fn get(&self, index: usize) -> Option<&Command> {
        self.entries.get(index)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> impl Iterator<Item = LogEntry> + '_ {
        self.entries.iter().enumerate().map(|(index, command)| LogEntry {
            index,
            command: command.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::Target;
    use crate::types::Action;

    fn cmd(net: &str) -> Command {
        Command::new(Action::Deny, Target::Ipv4Net(net.into()))
    }

    #[test]
    fn append_returns_previous_length() {
        let mut log = CommandLog::new();
        assert!(log.is_empty());
        assert_eq!(log.append(cmd("10.0.0.1")), 0);
        assert_eq!(log.append(cmd("10.0.0.2")), 1);
        assert_eq!(log.append(cmd("10.0.0.3")), 2);
        assert_eq!(log.len(), 3);
    }

    #[test]
    fn get_past_end_is_absent() {
        let mut log = CommandLog::new();
        log.append(cmd("10.0.0.1"));
        assert_eq!(log.get(0), Some(&cmd("10.0.0.1")));
        assert!(log.get(1).is_none());
    }

    #[test]
    fn entries_keep_arrival_order() {
        let mut log = CommandLog::new();
        log.append(cmd("10.0.0.1"));
        log.append(cmd("10.0.0.2"));
        let indices: Vec<usize> = log.entries().map(|e| e.index).collect();
        assert_eq!(indices, vec![0, 1]);
        let last = log.entries().last().unwrap();
        assert_eq!(last.command, cmd("10.0.0.2"));
    }
}
