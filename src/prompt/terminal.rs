//! Prompt on the controlling terminal.

use std::io::{self, BufRead, IsTerminal, Write};
use std::os::fd::{AsFd, AsRawFd, BorrowedFd, RawFd};
use std::ptr;
use std::sync::atomic::{AtomicPtr, Ordering};

use nix::libc;
use nix::sys::signal::{sigaction, SaFlags, SigAction, SigHandler, SigSet, Signal};
use nix::sys::termios::{self, LocalFlags, SetArg, Termios};
use tracing::debug;

use crate::error::{BrokerError, BrokerResult};

use super::Prompt;

/// Reads answers from standard input, writing prompts to standard output.
///
/// End of input counts as an interrupt. Ctrl+C during an echoing prompt
/// ends the process through the default signal disposition. Ctrl+C during
/// a password prompt first restores terminal echo, then does the same.
#[derive(Debug, Default, Clone, Copy)]
pub struct TerminalPrompt;

impl TerminalPrompt {
    fn ask(prompt: &str) -> BrokerResult<()> {
        let mut stdout = io::stdout().lock();
        stdout.write_all(prompt.as_bytes())?;
        stdout.flush()?;
        Ok(())
    }

    fn read_answer() -> BrokerResult<String> {
        let mut line = String::new();
        if io::stdin().lock().read_line(&mut line)? == 0 {
            return Err(BrokerError::Interrupted);
        }
        let trimmed = line.trim_end_matches(['\r', '\n']).len();
        line.truncate(trimmed);
        Ok(line)
    }
}

impl Prompt for TerminalPrompt {
    fn read_line(&self, prompt: &str) -> BrokerResult<String> {
        Self::ask(prompt)?;
        Self::read_answer()
    }

    fn read_password(&self, prompt: &str) -> BrokerResult<String> {
        Self::ask(prompt)?;

        let stdin = io::stdin();
        if !stdin.is_terminal() {
            return Self::read_answer();
        }

        let _silenced = SilencedEcho::enable(stdin.as_fd())?;
        Self::read_answer()
    }
}

/// Terminal settings the SIGINT handler puts back.
static SAVED_TERMINAL: AtomicPtr<(RawFd, libc::termios)> = AtomicPtr::new(ptr::null_mut());

/// Echo disabled on a terminal until dropped.
///
/// While alive, SIGINT restores the saved settings before terminating the
/// process the default way.
struct SilencedEcho<'fd> {
    fd: BorrowedFd<'fd>,
    original: Termios,
    previous_action: SigAction,
}

impl<'fd> SilencedEcho<'fd> {
    fn enable(fd: BorrowedFd<'fd>) -> BrokerResult<Self> {
        let original = termios::tcgetattr(fd).map_err(io::Error::from)?;
        replace_saved(Some((fd.as_raw_fd(), libc::termios::from(original.clone()))));

        let action = SigAction::new(
            SigHandler::Handler(restore_terminal_on_interrupt),
            SaFlags::empty(),
            SigSet::empty(),
        );
        // SAFETY: the handler only calls async-signal-safe functions.
        let previous_action = match unsafe { sigaction(Signal::SIGINT, &action) } {
            Ok(previous) => previous,
            Err(e) => {
                replace_saved(None);
                return Err(io::Error::from(e).into());
            }
        };

        let guard = Self {
            fd,
            original,
            previous_action,
        };

        let mut silent = guard.original.clone();
        silent.local_flags.remove(LocalFlags::ECHO);
        silent.local_flags.insert(LocalFlags::ECHONL);
        termios::tcsetattr(fd, SetArg::TCSANOW, &silent).map_err(io::Error::from)?;

        Ok(guard)
    }
}

impl Drop for SilencedEcho<'_> {
    fn drop(&mut self) {
        if let Err(e) = termios::tcsetattr(self.fd, SetArg::TCSANOW, &self.original) {
            debug!(error = %e, "Failed to restore terminal echo");
        }
        // SAFETY: reinstates the disposition that was active before `enable`.
        if let Err(e) = unsafe { sigaction(Signal::SIGINT, &self.previous_action) } {
            debug!(error = %e, "Failed to restore SIGINT disposition");
        }
        replace_saved(None);
    }
}

fn replace_saved(saved: Option<(RawFd, libc::termios)>) {
    let new = saved.map_or(ptr::null_mut(), |s| Box::into_raw(Box::new(s)));
    let old = SAVED_TERMINAL.swap(new, Ordering::AcqRel);
    if !old.is_null() {
        // SAFETY: every non-null pointer stored here came from Box::into_raw.
        drop(unsafe { Box::from_raw(old) });
    }
}

/// Put back the saved terminal settings, if any.
fn restore_saved_terminal() {
    let saved = SAVED_TERMINAL.load(Ordering::Acquire);
    if saved.is_null() {
        return;
    }
    // SAFETY: the pointer stays valid until `replace_saved` swaps it out,
    // and tcsetattr is async-signal-safe.
    unsafe {
        let (fd, settings) = &*saved;
        libc::tcsetattr(*fd, libc::TCSANOW, settings);
    }
}

extern "C" fn restore_terminal_on_interrupt(_signal: libc::c_int) {
    restore_saved_terminal();
    // SAFETY: signal and raise are async-signal-safe. SIGINT stays blocked
    // until the handler returns, then the default action terminates.
    unsafe {
        libc::signal(libc::SIGINT, libc::SIG_DFL);
        libc::raise(libc::SIGINT);
    }
}
