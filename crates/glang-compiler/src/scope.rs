//! Local scope management for procedure compilation.
//!
//! This module provides [`ScopeTracker`] for tracking local variables while
//! a unit is compiled. It handles:
//! - Variable declaration with slot allocation
//! - Nested block frames, each owned by the procedure that opened it
//! - Slot reclamation when a frame closes, with per-slot lifetimes
//! - The mutability/capture state machine of every variable

use glang_core::Span;
use rustc_hash::FxHashMap;
use thiserror::Error;

use crate::bytecode::LocalVarInfo;

// ============================================================================
// Types
// ============================================================================

/// Identity of a procedure being compiled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ProcedureId(pub usize);

/// Why a frame was opened.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScopeKind {
    /// The outermost frame of a procedure (holds its parameters).
    Procedure,
    /// A block statement.
    Block,
}

/// Mutability state of a local variable.
///
/// `EffectivelyFinal` moves to either `Mutable` or `Captured`, never both:
/// a captured variable cannot be assigned and an assigned variable cannot be
/// captured. `ForceFinal` never accepts an assignment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum VariableState {
    #[default]
    EffectivelyFinal,
    Mutable,
    Captured,
    ForceFinal,
}

impl VariableState {
    /// The state after an assignment.
    pub fn make_mutable(self) -> Result<Self, ScopeError> {
        match self {
            VariableState::EffectivelyFinal | VariableState::Mutable => Ok(VariableState::Mutable),
            VariableState::ForceFinal => Err(ScopeError::FinalModified),
            VariableState::Captured => Err(ScopeError::CapturedModified),
        }
    }

    /// The state after a read from another procedure.
    pub fn make_captured(self) -> Result<Self, ScopeError> {
        match self {
            VariableState::EffectivelyFinal | VariableState::Captured => {
                Ok(VariableState::Captured)
            }
            VariableState::ForceFinal => Ok(VariableState::ForceFinal),
            VariableState::Mutable => Err(ScopeError::MutableCaptured),
        }
    }

    pub fn is_final(self) -> bool {
        !matches!(self, VariableState::Mutable)
    }
}

/// Errors reported by the tracker. The messages are user-facing diagnostics.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ScopeError {
    #[error("Duplicate local variable {0}")]
    DuplicateLocal(String),
    #[error("Cannot access scopes from other methods currently")]
    CrossProcedure,
    #[error("Variable is final and cannot be modified")]
    FinalModified,
    #[error("Variable is captured in a closure and cannot be modified")]
    CapturedModified,
    #[error("Variable may be modified and cannot be captured in a closure")]
    MutableCaptured,
    #[error("Too many local variables")]
    TooManyLocals,
}

/// A declared local variable.
#[derive(Debug, Clone)]
pub struct Variable {
    pub name: String,
    pub slot: u16,
    pub span: Span,
    pub state: VariableState,
    /// Bytecode offset where the slot starts holding the variable.
    pub start: usize,
    pub is_param: bool,
}

#[derive(Debug)]
struct Frame {
    kind: ScopeKind,
    owner: ProcedureId,
    variables: Vec<Variable>,
    by_name: FxHashMap<String, usize>,
}

impl Frame {
    fn new(kind: ScopeKind, owner: ProcedureId) -> Self {
        Self {
            kind,
            owner,
            variables: Vec::new(),
            by_name: FxHashMap::default(),
        }
    }

    fn get_mut(&mut self, name: &str) -> Option<&mut Variable> {
        let index = *self.by_name.get(name)?;
        self.variables.get_mut(index)
    }
}

#[derive(Debug)]
struct ProcedureSlots {
    id: ProcedureId,
    next_slot: u16,
    max_slot: u16,
    locals: Vec<LocalVarInfo>,
}

/// Result of closing a procedure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClosedProcedure {
    pub id: ProcedureId,
    pub max_locals: u16,
    pub locals: Vec<LocalVarInfo>,
}

// ============================================================================
// ScopeTracker
// ============================================================================

/// Nested symbol tables of every procedure being compiled.
#[derive(Debug, Default)]
pub struct ScopeTracker {
    frames: Vec<Frame>,
    procedures: Vec<ProcedureSlots>,
    next_procedure: usize,
}

impl ScopeTracker {
    pub fn new() -> Self {
        Self::default()
    }

    // ==========================================================================
    // Frames
    // ==========================================================================

    /// Start compiling a procedure and open its outermost frame.
    pub fn enter_procedure(&mut self) -> ProcedureId {
        let id = ProcedureId(self.next_procedure);
        self.next_procedure += 1;
        self.procedures.push(ProcedureSlots {
            id,
            next_slot: 0,
            max_slot: 0,
            locals: Vec::new(),
        });
        self.frames.push(Frame::new(ScopeKind::Procedure, id));
        id
    }

    /// Close every frame of the current procedure and return its frame size
    /// and variable lifetimes.
    pub fn exit_procedure(&mut self, end: usize) -> Option<ClosedProcedure> {
        let id = self.current_procedure()?;
        while let Some(frame) = self.frames.last() {
            if frame.owner != id {
                break;
            }
            let kind = frame.kind;
            self.close(end);
            if kind == ScopeKind::Procedure {
                break;
            }
        }
        let slots = self.procedures.pop()?;
        Some(ClosedProcedure {
            id: slots.id,
            max_locals: slots.max_slot,
            locals: slots.locals,
        })
    }

    /// Open a block frame owned by the current procedure.
    pub fn open(&mut self) {
        if let Some(owner) = self.current_procedure() {
            self.frames.push(Frame::new(ScopeKind::Block, owner));
        }
    }

    /// Close the innermost frame at bytecode offset `end`.
    ///
    /// The frame's slots return to its procedure, and the `[start, end)`
    /// lifetime of each of its variables is returned (and kept for the
    /// procedure's debug table).
    pub fn close(&mut self, end: usize) -> Vec<LocalVarInfo> {
        let Some(frame) = self.frames.pop() else {
            return Vec::new();
        };
        let lifetimes: Vec<LocalVarInfo> = frame
            .variables
            .iter()
            .map(|v| LocalVarInfo {
                name: v.name.clone(),
                slot: v.slot,
                start: v.start.min(end),
                end,
            })
            .collect();
        if let Some(slots) = self.procedures.iter_mut().find(|p| p.id == frame.owner) {
            slots.next_slot -= frame.variables.len() as u16;
            slots.locals.extend(lifetimes.iter().cloned());
        }
        lifetimes
    }

    /// The procedure currently being compiled.
    pub fn current_procedure(&self) -> Option<ProcedureId> {
        self.procedures.last().map(|p| p.id)
    }

    /// Number of open frames.
    pub fn depth(&self) -> usize {
        self.frames.len()
    }

    /// Whether the innermost frame is the outermost frame of the first
    /// procedure, i.e. statements here are top-level.
    pub fn is_top_level(&self) -> bool {
        self.frames.len() == 1
    }

    // ==========================================================================
    // Declaration
    // ==========================================================================

    /// Declare a variable in the innermost frame, live from `start`.
    pub fn declare(&mut self, name: &str, span: Span, start: usize) -> Result<u16, ScopeError> {
        self.declare_with(name, span, start, VariableState::EffectivelyFinal, false)
    }

    /// Declare a variable that can never be assigned.
    pub fn declare_final(&mut self, name: &str, span: Span, start: usize) -> Result<u16, ScopeError> {
        self.declare_with(name, span, start, VariableState::ForceFinal, false)
    }

    /// Declare a parameter of the current procedure.
    pub fn declare_param(&mut self, name: &str, span: Span) -> Result<u16, ScopeError> {
        self.declare_with(name, span, 0, VariableState::EffectivelyFinal, true)
    }

    fn declare_with(
        &mut self,
        name: &str,
        span: Span,
        start: usize,
        state: VariableState,
        is_param: bool,
    ) -> Result<u16, ScopeError> {
        let Some(frame) = self.frames.last_mut() else {
            return Err(ScopeError::CrossProcedure);
        };
        if frame.by_name.contains_key(name) {
            return Err(ScopeError::DuplicateLocal(name.to_string()));
        }
        let Some(slots) = self.procedures.iter_mut().find(|p| p.id == frame.owner) else {
            return Err(ScopeError::CrossProcedure);
        };
        let slot = slots.next_slot;
        slots.next_slot = slot.checked_add(1).ok_or(ScopeError::TooManyLocals)?;
        slots.max_slot = slots.max_slot.max(slots.next_slot);

        frame.by_name.insert(name.to_string(), frame.variables.len());
        frame.variables.push(Variable {
            name: name.to_string(),
            slot,
            span,
            state,
            start,
            is_param,
        });
        Ok(slot)
    }

    /// Slot of `name` if it is declared in the innermost frame.
    pub fn declared_in_current(&self, name: &str) -> Option<u16> {
        let frame = self.frames.last()?;
        let index = *frame.by_name.get(name)?;
        frame.variables.get(index).map(|v| v.slot)
    }

    // ==========================================================================
    // Resolution
    // ==========================================================================

    /// Resolve a read of `name`, innermost frame first.
    ///
    /// `Ok(None)` means the name is not a local. A variable owned by another
    /// procedure is marked captured, and the access is still rejected.
    pub fn resolve(&mut self, name: &str) -> Result<Option<u16>, ScopeError> {
        let current = self.current_procedure();
        for frame in self.frames.iter_mut().rev() {
            let owner = frame.owner;
            if let Some(variable) = frame.get_mut(name) {
                if Some(owner) != current {
                    variable.state = variable.state.make_captured()?;
                    return Err(ScopeError::CrossProcedure);
                }
                return Ok(Some(variable.slot));
            }
        }
        Ok(None)
    }

    /// Resolve an assignment to `name`, marking the variable mutable.
    pub fn resolve_for_write(&mut self, name: &str) -> Result<Option<u16>, ScopeError> {
        let current = self.current_procedure();
        for frame in self.frames.iter_mut().rev() {
            let owner = frame.owner;
            if let Some(variable) = frame.get_mut(name) {
                variable.state = variable.state.make_mutable()?;
                if Some(owner) != current {
                    return Err(ScopeError::CrossProcedure);
                }
                return Ok(Some(variable.slot));
            }
        }
        Ok(None)
    }

    /// Look up a variable without changing its state.
    pub fn get(&self, name: &str) -> Option<&Variable> {
        self.frames.iter().rev().find_map(|frame| {
            let index = *frame.by_name.get(name)?;
            frame.variables.get(index)
        })
    }
}

// ============================================================================
// Tests
// ============================================================================
