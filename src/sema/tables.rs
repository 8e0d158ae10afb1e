//! Symbol tables
//!
//! Three append-only, name-indexed stores populated during semantic
//! checking and read-only afterwards: interned string literals, variables
//! and functions. The variable namespace is a single flat scope; the
//! function namespace is logically separate.

use std::fmt;

use crate::types::Type;

// ==================== String Table ====================

/// Insertion-ordered string interner
///
/// Holds source string literals (quotes included) and, at interpretation
/// time, strings entered on stdin.
#[derive(Debug, Clone, Default)]
pub struct StrTable {
    entries: Vec<String>,
}

impl StrTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Intern a string: returns the existing index if it was seen before,
    /// else appends and returns the new index
    pub fn intern(&mut self, s: &str) -> usize {
        if let Some(idx) = self.entries.iter().position(|e| e == s) {
            return idx;
        }
        self.entries.push(s.to_string());
        self.entries.len() - 1
    }

    pub fn get(&self, idx: usize) -> &str {
        &self.entries[idx]
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(String::as_str)
    }
}

impl fmt::Display for StrTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Strings table:")?;
        for (i, s) in self.entries.iter().enumerate() {
            writeln!(f, "Entry {} -- {}", i, s)?;
        }
        Ok(())
    }
}

// ==================== Variable Table ====================

#[derive(Debug, Clone)]
pub struct VarEntry {
    pub name: String,
    pub line: u32,
    pub ty: Type,
}

/// Flat, insertion-ordered variable store; the entry index is the
/// variable's memory slot
#[derive(Debug, Clone, Default)]
pub struct VarTable {
    entries: Vec<VarEntry>,
}

impl VarTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Index of the most recent entry with this name
    pub fn lookup(&self, name: &str) -> Option<usize> {
        self.entries.iter().rposition(|e| e.name == name)
    }

    pub fn add(&mut self, name: &str, line: u32, ty: Type) -> usize {
        self.entries.push(VarEntry {
            name: name.to_string(),
            line,
            ty,
        });
        self.entries.len() - 1
    }

    pub fn name(&self, idx: usize) -> &str {
        &self.entries[idx].name
    }

    pub fn line(&self, idx: usize) -> u32 {
        self.entries[idx].line
    }

    pub fn ty(&self, idx: usize) -> Type {
        self.entries[idx].ty
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl fmt::Display for VarTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Variables table:")?;
        for (i, e) in self.entries.iter().enumerate() {
            writeln!(
                f,
                "Entry {} -- name: {}, line: {}, type: {}",
                i, e.name, e.line, e.ty
            )?;
        }
        Ok(())
    }
}

// ==================== Function Table ====================

#[derive(Debug, Clone)]
pub struct FuncEntry {
    pub name: String,
    pub line: u32,
    /// Declared return type; `NoType` for functions returning nothing
    pub ret: Type,
    /// Declared parameter count
    pub arity: usize,
}

#[derive(Debug, Clone, Default)]
pub struct FuncTable {
    entries: Vec<FuncEntry>,
}

impl FuncTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lookup(&self, name: &str) -> Option<usize> {
        self.entries.iter().rposition(|e| e.name == name)
    }

    pub fn add(&mut self, name: &str, line: u32, ret: Type, arity: usize) -> usize {
        self.entries.push(FuncEntry {
            name: name.to_string(),
            line,
            ret,
            arity,
        });
        self.entries.len() - 1
    }

    pub fn name(&self, idx: usize) -> &str {
        &self.entries[idx].name
    }

    pub fn line(&self, idx: usize) -> u32 {
        self.entries[idx].line
    }

    pub fn ret(&self, idx: usize) -> Type {
        self.entries[idx].ret
    }

    pub fn arity(&self, idx: usize) -> usize {
        self.entries[idx].arity
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl fmt::Display for FuncTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Functions table:")?;
        for (i, e) in self.entries.iter().enumerate() {
            writeln!(
                f,
                "Entry {} -- name: {}, line: {}, type: {}, arity: {}",
                i, e.name, e.line, e.ret, e.arity
            )?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn interning_is_idempotent_and_ordered() {
        let mut st = StrTable::new();
        let a = st.intern("\"hello\"");
        let b = st.intern("\"world\"");
        let a2 = st.intern("\"hello\"");
        assert_eq!(a, 0);
        assert_eq!(b, 1);
        assert_eq!(a2, a);
        assert_eq!(st.len(), 2);
        assert_eq!(st.get(1), "\"world\"");
    }

    #[test]
    fn var_lookup_returns_most_recent() {
        let mut vt = VarTable::new();
        vt.add("x", 1, Type::Int);
        vt.add("y", 2, Type::Bool);
        vt.add("x", 3, Type::Float32);
        assert_eq!(vt.lookup("x"), Some(2));
        assert_eq!(vt.lookup("y"), Some(1));
        assert_eq!(vt.lookup("z"), None);
    }

    #[test]
    fn func_table_records_signature() {
        let mut ft = FuncTable::new();
        let idx = ft.add("add", 2, Type::Int, 2);
        assert_eq!(ft.lookup("add"), Some(idx));
        assert_eq!(ft.ret(idx), Type::Int);
        assert_eq!(ft.arity(idx), 2);
    }
}
