use leetpush_core::sync::{NotificationLevel, Notifier};

/// Prints notifications: successes to stdout, failures to stderr.
#[derive(Debug, Clone, Copy, Default)]
pub struct TerminalNotifier;

impl Notifier for TerminalNotifier {
    fn notify(&self, level: NotificationLevel, message: &str) {
        match level {
            NotificationLevel::Success => println!("{message}"),
            NotificationLevel::Error => eprintln!("{message}"),
        }
    }
}
