//! Pause, step and abort
//!
//! The interpreter consults an [`ExecutionControl`] before every statement.
//! Those checkpoints are the only suspension points: an expression, once
//! started, always runs to completion.

use crate::parser::ast::SourceLocation;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, Sender, TryRecvError};
use std::sync::Arc;

/// Verdict of a checkpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Control {
    Continue,
    Abort,
}

pub trait ExecutionControl {
    /// Called before the statement at `at` runs; may block to pause execution
    fn checkpoint(&mut self, at: SourceLocation) -> Control;
}

/// Never pauses, never aborts
#[derive(Debug, Clone, Copy, Default)]
pub struct FreeRun;

impl ExecutionControl for FreeRun {
    fn checkpoint(&mut self, _at: SourceLocation) -> Control {
        Control::Continue
    }
}

/// Cloneable abort flag, observed at the next checkpoint
#[derive(Debug, Clone, Default)]
pub struct AbortHandle {
    flag: Arc<AtomicBool>,
}

impl AbortHandle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn abort(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    pub fn is_aborted(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }

    /// Re-arm the handle for another run
    pub fn clear(&self) {
        self.flag.store(false, Ordering::SeqCst);
    }
}

impl ExecutionControl for AbortHandle {
    fn checkpoint(&mut self, _at: SourceLocation) -> Control {
        if self.is_aborted() {
            Control::Abort
        } else {
            Control::Continue
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepCommand {
    /// Run one statement, then pause again
    Step,
    /// Stop pausing
    Resume,
    /// Pause at the next checkpoint
    Pause,
    Abort,
}

/// Channel-driven stepping
///
/// While paused, every checkpoint blocks until a command arrives; a closed
/// channel then counts as an abort. While running, commands are polled
/// without blocking.
#[derive(Debug)]
pub struct Stepper {
    commands: Receiver<StepCommand>,
    paused: bool,
}

impl Stepper {
    /// A stepper and the sender that drives it
    pub fn new(start_paused: bool) -> (Sender<StepCommand>, Stepper) {
        let (sender, commands) = mpsc::channel();
        (
            sender,
            Stepper {
                commands,
                paused: start_paused,
            },
        )
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }
}

impl ExecutionControl for Stepper {
    fn checkpoint(&mut self, at: SourceLocation) -> Control {
        loop {
            if self.paused {
                tracing::trace!(line = at.line, "paused");
                match self.commands.recv() {
                    Ok(StepCommand::Step) => return Control::Continue,
                    Ok(StepCommand::Resume) => {
                        self.paused = false;
                        return Control::Continue;
                    }
                    Ok(StepCommand::Pause) => {}
                    Ok(StepCommand::Abort) | Err(_) => return Control::Abort,
                }
            } else {
                match self.commands.try_recv() {
                    Ok(StepCommand::Pause) => self.paused = true,
                    Ok(StepCommand::Abort) => return Control::Abort,
                    Ok(StepCommand::Step) | Ok(StepCommand::Resume) => {}
                    Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => {
                        return Control::Continue
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_abort_handle_is_shared() {
        let handle = AbortHandle::new();
        let mut control = handle.clone();
        assert_eq!(control.checkpoint(SourceLocation::default()), Control::Continue);
        handle.abort();
        assert_eq!(control.checkpoint(SourceLocation::default()), Control::Abort);
        handle.clear();
        assert_eq!(control.checkpoint(SourceLocation::default()), Control::Continue);
    }

    #[test]
    fn test_stepper_consumes_one_step_per_checkpoint() {
        let (commands, mut stepper) = Stepper::new(true);
        commands.send(StepCommand::Step).unwrap();
        commands.send(StepCommand::Step).unwrap();
        commands.send(StepCommand::Abort).unwrap();

        let at = SourceLocation::default();
        assert_eq!(stepper.checkpoint(at), Control::Continue);
        assert_eq!(stepper.checkpoint(at), Control::Continue);
        assert_eq!(stepper.checkpoint(at), Control::Abort);
    }

    #[test]
    fn test_stepper_resume_and_pause() {
        let (commands, mut stepper) = Stepper::new(true);
        commands.send(StepCommand::Resume).unwrap();
        let at = SourceLocation::default();
        assert_eq!(stepper.checkpoint(at), Control::Continue);
        assert!(!stepper.is_paused());
        assert_eq!(stepper.checkpoint(at), Control::Continue);

        commands.send(StepCommand::Pause).unwrap();
        commands.send(StepCommand::Step).unwrap();
        assert_eq!(stepper.checkpoint(at), Control::Continue);
        assert!(stepper.is_paused());
    }

    #[test]
    fn test_disconnected_while_paused_aborts() {
        let (commands, mut stepper) = Stepper::new(true);
        drop(commands);
        assert_eq!(stepper.checkpoint(SourceLocation::default()), Control::Abort);
    }
}
