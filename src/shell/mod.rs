pub use self::shell::Shell;

mod builtins;
pub mod execute_command;
#[allow(clippy::module_inception)]
mod shell;
pub mod signal_relay;

/// Policy object to control a Shell's behavior
#[derive(Debug, Copy, Clone)]
pub struct ShellConfig {
    /// Determines if new command entries will be added to the shell's command history.
    ///
    /// Note: This is checked before the other command history config fields.
    enable_command_history: bool,

    /// Number of entries to store in the shell's command history
    command_history_capacity: usize,

    /// Determines if some messages (e.g. "exit", background job ids) should be displayed.
    display_messages: bool,
}

impl ShellConfig {
    /// Creates an interactive shell, e.g. command history, job messages
    ///
    /// # Complete List
    /// - Command History is enabled
    /// - Background job ids and completions are announced
    /// - "exit" is echoed on shutdown
    pub fn interactive(command_history_capacity: usize) -> Self {
        Self {
            enable_command_history: true,
            command_history_capacity,
            display_messages: true,
        }
    }

    /// Creates a noninteractive shell, e.g. no command history, no messages
    ///
    /// # Complete List
    /// - Command History is disabled.
    /// - Fewer messages are displayed
    pub fn noninteractive() -> Self {
        Default::default()
    }
}

impl Default for ShellConfig {
    fn default() -> Self {
        Self {
            enable_command_history: false,
            command_history_capacity: 0,
            display_messages: false,
        }
    }
}
