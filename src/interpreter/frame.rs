use std::fmt;

use rustc_hash::FxHashMap;

use super::error::RuntimeError;
use super::value::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameKind {
    Program,
    Function,
}

impl fmt::Display for FrameKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FrameKind::Program => f.write_str("PROGRAM"),
            FrameKind::Function => f.write_str("FUNCTION"),
        }
    }
}

/// The bindings live during one program or function execution. Runtime
/// name lookup never leaves the record it starts in.
#[derive(Debug, Clone)]
pub struct ActivationRecord {
    pub name: String,
    pub kind: FrameKind,
    pub nesting_level: usize,
    members: FxHashMap<String, Value>,
}

impl ActivationRecord {
    pub fn new(name: &str, kind: FrameKind, nesting_level: usize) -> ActivationRecord {
        ActivationRecord {
            name: name.to_string(),
            kind,
            nesting_level,
            members: FxHashMap::default(),
        }
    }

    pub fn set(&mut self, name: &str, value: Value) {
        self.members.insert(name.to_string(), value);
    }

    pub fn get(&self, name: &str) -> Result<Value, RuntimeError> {
        self.members
            .get(name)
            .cloned()
            .ok_or_else(|| RuntimeError::NotBound {
                name: name.to_string(),
            })
    }

    pub fn contains(&self, name: &str) -> bool {
        self.members.contains_key(name)
    }
}

impl fmt::Display for ActivationRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {} {}", self.nesting_level, self.kind, self.name)?;
        let mut names = self.members.keys().collect::<Vec<_>>();
        names.sort();
        for name in names {
            write!(f, "\n    {name} = {}", self.members[name])?;
        }
        Ok(())
    }
}

/// Stack of activation records with an explicit depth limit, so runaway
/// recursion fails with a typed error instead of exhausting the host stack.
pub struct CallStack {
    records: Vec<ActivationRecord>,
    limit: usize,
}

impl CallStack {
    pub fn new(limit: usize) -> CallStack {
        CallStack {
            records: Vec::new(),
            limit,
        }
    }

    pub fn push(&mut self, record: ActivationRecord) -> Result<(), RuntimeError> {
        if self.records.len() >= self.limit {
            return Err(RuntimeError::StackOverflow { limit: self.limit });
        }
        self.records.push(record);
        Ok(())
    }

    pub fn pop(&mut self) -> Option<ActivationRecord> {
        self.records.pop()
    }

    pub fn peek(&self) -> Option<&ActivationRecord> {
        self.records.last()
    }

    pub fn peek_mut(&mut self) -> Option<&mut ActivationRecord> {
        self.records.last_mut()
    }

    pub fn depth(&self) -> usize {
        self.records.len()
    }
}

impl fmt::Display for CallStack {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CALL STACK")?;
        for record in self.records.iter().rev() {
            write!(f, "\n{record}")?;
        }
        Ok(())
    }
}
