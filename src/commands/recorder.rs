use parking_lot::Mutex;

use super::traits::CommandReceiver;

/// In-memory [`CommandReceiver`] that keeps a copy of every command it sees.
#[derive(Debug)]
pub struct CommandRecorder<C> {
    commands: Mutex<Vec<C>>,
}

impl<C> Default for CommandRecorder<C> {
    fn default() -> Self {
        Self {
            commands: Mutex::new(Vec::new()),
        }
    }
}

impl<C: Clone> CommandRecorder<C> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn recorded(&self) -> Vec<C> {
        self.commands.lock().clone()
    }

    pub fn len(&self) -> usize {
        self.commands.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drain everything recorded so far.
    pub fn take(&self) -> Vec<C> {
        std::mem::take(&mut *self.commands.lock())
    }
}

impl<C: Clone + Send> CommandReceiver<C> for CommandRecorder<C> {
    fn add_command(&self, command: &C) {
        self.commands.lock().push(command.clone());
    }
}
