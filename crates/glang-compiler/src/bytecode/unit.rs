//! Compiled code units.
//!
//! One source unit compiles to one [`CodeUnit`] named after its generated
//! type. The unit owns the shared constant pool and one [`Procedure`] per
//! compiled procedure; top-level statements live in the entry procedure.

use glang_core::abi::ENTRY_PROCEDURE;
use rustc_hash::FxHashMap;

use super::{BytecodeChunk, ConstantPool};

/// Debug record of one local variable: its slot and the bytecode range
/// `[start, end)` over which the slot holds it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalVarInfo {
    pub name: String,
    pub slot: u16,
    pub start: usize,
    pub end: usize,
}

/// A compiled procedure.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Procedure {
    pub name: String,
    /// Number of leading slots filled from the caller's arguments.
    pub param_count: u16,
    /// Size of the local slot frame.
    pub max_locals: u16,
    pub chunk: BytecodeChunk,
    pub locals: Vec<LocalVarInfo>,
}

impl Procedure {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Find the variable that occupies `slot` at bytecode `offset`.
    pub fn local_at(&self, slot: u16, offset: usize) -> Option<&LocalVarInfo> {
        self.locals
            .iter()
            .find(|l| l.slot == slot && l.start <= offset && offset < l.end)
    }
}

/// The compiled form of one source unit.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CodeUnit {
    /// Generated type name (`a.b.TestNs`).
    pub type_name: String,
    /// Display name of the source the unit came from.
    pub source_file: Option<String>,
    pub constants: ConstantPool,
    pub procedures: Vec<Procedure>,
}

impl CodeUnit {
    pub fn new(type_name: impl Into<String>) -> Self {
        Self {
            type_name: type_name.into(),
            ..Default::default()
        }
    }

    pub fn procedure(&self, name: &str) -> Option<&Procedure> {
        self.procedures.iter().find(|p| p.name == name)
    }

    /// The procedure holding the unit's top-level statements.
    pub fn entry(&self) -> Option<&Procedure> {
        self.procedure(ENTRY_PROCEDURE)
    }

    /// Simple name of the generated type (the segment after the last `.`).
    pub fn simple_name(&self) -> &str {
        self.type_name
            .rsplit_once('.')
            .map_or(self.type_name.as_str(), |(_, simple)| simple)
    }
}

/// Produces one output unit per generated type name.
///
/// The code generator asks for a unit each time it starts a new type, so a
/// single source can yield several units.
pub trait UnitFactory {
    fn unit(&mut self, type_name: &str) -> &mut CodeUnit;
}

impl UnitFactory for FxHashMap<String, CodeUnit> {
    fn unit(&mut self, type_name: &str) -> &mut CodeUnit {
        self.entry(type_name.to_string())
            .or_insert_with(|| CodeUnit::new(type_name))
    }
}

impl UnitFactory for Vec<CodeUnit> {
    fn unit(&mut self, type_name: &str) -> &mut CodeUnit {
        let index = match self.iter().position(|u| u.type_name == type_name) {
            Some(index) => index,
            None => {
                self.push(CodeUnit::new(type_name));
                self.len() - 1
            }
        };
        &mut self[index]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn factory_reuses_units() {
        let mut units: Vec<CodeUnit> = Vec::new();
        units.unit("a.TestNs").source_file = Some("test.glang".into());
        units.unit("a.OtherNs");
        assert_eq!(units.len(), 2);
        assert_eq!(units.unit("a.TestNs").source_file.as_deref(), Some("test.glang"));
    }

    #[test]
    fn map_factory() {
        let mut units: FxHashMap<String, CodeUnit> = FxHashMap::default();
        units.unit("TestNs").procedures.push(Procedure::new("main"));
        assert!(units["TestNs"].entry().is_some());
        assert_eq!(units["TestNs"].simple_name(), "TestNs");
    }

    #[test]
    fn local_lookup_by_range() {
        let mut proc = Procedure::new("main");
        proc.locals.push(LocalVarInfo {
            name: "x".into(),
            slot: 1,
            start: 4,
            end: 10,
        });
        assert_eq!(proc.local_at(1, 4).map(|l| l.name.as_str()), Some("x"));
        assert!(proc.local_at(1, 10).is_none());
        assert!(proc.local_at(0, 5).is_none());
    }

    #[test]
    fn simple_name_strips_package() {
        assert_eq!(CodeUnit::new("a.b.TestNs").simple_name(), "TestNs");
    }
}
