//! Jump management for control flow.
//!
//! This module tracks loop contexts for break/continue statements. Each
//! context remembers the procedure that opened it, so a jump can only target
//! a loop of the procedure it is compiled in.

use thiserror::Error;

use super::JumpLabel;
use crate::scope::ProcedureId;

/// Error from break/continue statements.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum JumpError {
    /// No enclosing loop at all.
    #[error("Not in a loop")]
    NotInLoop,
    /// The nearest loop belongs to another procedure.
    #[error("Cannot do non-local jump")]
    NonLocal,
}

/// Manages jump targets for control flow.
///
/// Tracks a stack of loop contexts to support nested loops with
/// proper break/continue handling.
#[derive(Debug, Default)]
pub struct JumpManager {
    /// Stack of loop contexts (innermost last)
    loops: Vec<LoopContext>,
}

/// Context for a single loop.
#[derive(Debug)]
struct LoopContext {
    /// Target offset for continue statements (the condition)
    continue_target: usize,
    /// Pending break jumps to patch past the loop's else body
    break_labels: Vec<JumpLabel>,
    owner: ProcedureId,
}

impl JumpManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Enter a new loop context owned by `owner`.
    pub fn enter_loop(&mut self, continue_target: usize, owner: ProcedureId) {
        self.loops.push(LoopContext {
            continue_target,
            break_labels: Vec::new(),
            owner,
        });
    }

    /// Exit the current loop context.
    ///
    /// Returns the break labels that need to be patched to jump past the loop.
    pub fn exit_loop(&mut self) -> Vec<JumpLabel> {
        self.loops
            .pop()
            .map(|ctx| ctx.break_labels)
            .unwrap_or_default()
    }

    pub fn in_loop(&self) -> bool {
        !self.loops.is_empty()
    }

    pub fn loop_depth(&self) -> usize {
        self.loops.len()
    }

    /// Check that a jump compiled in `procedure` may target the innermost loop.
    pub fn check_jump(&self, procedure: ProcedureId) -> Result<(), JumpError> {
        match self.loops.last() {
            None => Err(JumpError::NotInLoop),
            Some(ctx) if ctx.owner != procedure => Err(JumpError::NonLocal),
            Some(_) => Ok(()),
        }
    }

    /// Add a break label to be patched when the loop exits.
    pub fn add_break(&mut self, label: JumpLabel, procedure: ProcedureId) -> Result<(), JumpError> {
        self.check_jump(procedure)?;
        if let Some(ctx) = self.loops.last_mut() {
            ctx.break_labels.push(label);
        }
        Ok(())
    }

    /// Get the continue target for the current loop.
    pub fn continue_target(&self, procedure: ProcedureId) -> Result<usize, JumpError> {
        self.check_jump(procedure)?;
        self.loops
            .last()
            .map(|ctx| ctx.continue_target)
            .ok_or(JumpError::NotInLoop)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MAIN: ProcedureId = ProcedureId(0);
    const OTHER: ProcedureId = ProcedureId(1);

    #[test]
    fn new_manager_not_in_loop() {
        let manager = JumpManager::new();
        assert!(!manager.in_loop());
        assert_eq!(manager.check_jump(MAIN), Err(JumpError::NotInLoop));
    }

    #[test]
    fn nested_loops() {
        let mut manager = JumpManager::new();
        manager.enter_loop(10, MAIN);
        manager.enter_loop(20, MAIN);

        assert_eq!(manager.loop_depth(), 2);
        assert_eq!(manager.continue_target(MAIN), Ok(20));

        manager.exit_loop();
        assert_eq!(manager.continue_target(MAIN), Ok(10));
    }

    #[test]
    fn exit_loop_returns_breaks() {
        let mut manager = JumpManager::new();
        manager.enter_loop(10, MAIN);
        manager.add_break(JumpLabel(100), MAIN).unwrap();
        manager.add_break(JumpLabel(110), MAIN).unwrap();

        let breaks = manager.exit_loop();
        assert_eq!(breaks.len(), 2);
        assert_eq!(breaks[1].offset(), 110);
    }

    #[test]
    fn jump_into_other_procedure_loop() {
        let mut manager = JumpManager::new();
        manager.enter_loop(0, MAIN);
        assert_eq!(manager.continue_target(OTHER), Err(JumpError::NonLocal));
        assert_eq!(manager.add_break(JumpLabel(3), OTHER), Err(JumpError::NonLocal));
        assert!(manager.exit_loop().is_empty());
    }

    #[test]
    fn error_messages() {
        assert_eq!(JumpError::NotInLoop.to_string(), "Not in a loop");
        assert_eq!(JumpError::NonLocal.to_string(), "Cannot do non-local jump");
    }
}
