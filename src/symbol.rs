use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Rc;

use crate::ast::Ast;

/// A name the analyzer has resolved: a builtin type, a declared variable,
/// or a function (user-defined or native).
#[derive(Debug, Clone, PartialEq)]
pub enum Symbol {
    BuiltinType(Rc<BuiltinTypeSymbol>),
    Var(Rc<VarSymbol>),
    Func(Rc<FuncSymbol>),
}

impl Symbol {
    pub fn name(&self) -> &str {
        match self {
            Symbol::BuiltinType(sym) => sym.name,
            Symbol::Var(sym) => &sym.name,
            Symbol::Func(sym) => &sym.name,
        }
    }

    pub fn scope_level(&self) -> usize {
        match self {
            Symbol::BuiltinType(sym) => sym.scope_level.get(),
            Symbol::Var(sym) => sym.scope_level.get(),
            Symbol::Func(sym) => sym.scope_level.get(),
        }
    }

    /// Called once by the scope that takes ownership of the name.
    pub fn set_scope_level(&self, level: usize) {
        match self {
            Symbol::BuiltinType(sym) => sym.scope_level.set(level),
            Symbol::Var(sym) => sym.scope_level.set(level),
            Symbol::Func(sym) => sym.scope_level.set(level),
        }
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Symbol::BuiltinType(sym) => write!(f, "{sym}"),
            Symbol::Var(sym) => write!(f, "{sym}"),
            Symbol::Func(sym) => write!(f, "{sym}"),
        }
    }
}

#[derive(Debug, PartialEq)]
pub struct BuiltinTypeSymbol {
    pub name: &'static str,
    pub scope_level: Cell<usize>,
}

impl BuiltinTypeSymbol {
    pub fn new(name: &'static str) -> Rc<BuiltinTypeSymbol> {
        Rc::new(BuiltinTypeSymbol {
            name,
            scope_level: Cell::new(0),
        })
    }
}

impl fmt::Display for BuiltinTypeSymbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

#[derive(Debug, PartialEq)]
pub struct VarSymbol {
    pub name: String,
    pub declared_type: Option<Symbol>,
    pub scope_level: Cell<usize>,
}

impl VarSymbol {
    pub fn new(name: String, declared_type: Option<Symbol>) -> Rc<VarSymbol> {
        Rc::new(VarSymbol {
            name,
            declared_type,
            scope_level: Cell::new(0),
        })
    }
}

impl fmt::Display for VarSymbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.declared_type {
            Some(ty) => write!(f, "<{}: {}>", self.name, ty.name()),
            None => write!(f, "<{}>", self.name),
        }
    }
}

pub struct FuncSymbol {
    pub name: String,
    pub formal_params: RefCell<Vec<Rc<VarSymbol>>>,
    /// Statements of the declaration body, attached after its scope has
    /// been analyzed. Natives have no body here.
    pub body: RefCell<Option<Rc<Vec<Ast>>>>,
    pub is_native: bool,
    pub scope_level: Cell<usize>,
}

impl FuncSymbol {
    pub fn new(name: String) -> Rc<FuncSymbol> {
        Rc::new(FuncSymbol {
            name,
            formal_params: RefCell::new(Vec::new()),
            body: RefCell::new(None),
            is_native: false,
            scope_level: Cell::new(0),
        })
    }

    pub fn native(name: &str, params: &[(&str, &'static str)]) -> Rc<FuncSymbol> {
        let formal_params = params
            .iter()
            .map(|(param, type_name)| {
                VarSymbol::new(
                    (*param).to_string(),
                    Some(Symbol::BuiltinType(BuiltinTypeSymbol::new(type_name))),
                )
            })
            .collect();
        Rc::new(FuncSymbol {
            name: name.to_string(),
            formal_params: RefCell::new(formal_params),
            body: RefCell::new(None),
            is_native: true,
            scope_level: Cell::new(0),
        })
    }
}

// The body of a recursive function holds a call node that resolves back to
// this symbol, so deriving Debug would recurse forever.
impl fmt::Debug for FuncSymbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FuncSymbol")
            .field("name", &self.name)
            .field("formal_params", &self.formal_params)
            .field("is_native", &self.is_native)
            .field("scope_level", &self.scope_level)
            .finish_non_exhaustive()
    }
}

// Same cycle as Debug: compare by identity-relevant fields only.
impl PartialEq for FuncSymbol {
    fn eq(&self, other: &FuncSymbol) -> bool {
        self.name == other.name && self.is_native == other.is_native
    }
}

impl fmt::Display for FuncSymbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let params = self
            .formal_params
            .borrow()
            .iter()
            .map(|param| param.name.clone())
            .collect::<Vec<_>>()
            .join(", ");
        write!(f, "<{}({params})>", self.name)
    }
}

#[cfg(test)]
mod tests {
    use std::rc::Rc;

    use crate::ast::Ast;

    use super::{BuiltinTypeSymbol, FuncSymbol, Symbol, VarSymbol};

    #[test]
    fn var_symbol_displays_its_type() {
        let integer = Symbol::BuiltinType(BuiltinTypeSymbol::new("INTEGER"));
        let var = VarSymbol::new("radius".to_string(), Some(integer));
        assert_eq!(var.to_string(), "<radius: INTEGER>");

        let untyped = VarSymbol::new("str".to_string(), None);
        assert_eq!(untyped.to_string(), "<str>");
    }

    #[test]
    fn func_symbol_displays_parameter_names() {
        let func = FuncSymbol::native("randInt", &[("x", "INTEGER"), ("y", "INTEGER")]);
        assert_eq!(func.to_string(), "<randInt(x, y)>");
    }

    #[test]
    fn func_symbol_debug_survives_a_self_referencing_body() {
        let func = FuncSymbol::new("loop".to_string());
        let call = Ast::call("loop".to_string(), Vec::new(), 1, 1);
        if let Ast::FuncCall { resolved, .. } = &call {
            *resolved.borrow_mut() = Some(Rc::clone(&func));
        }
        *func.body.borrow_mut() = Some(Rc::new(vec![call]));

        let rendered = format!("{func:?}");
        assert!(rendered.contains("\"loop\""));
        assert!(!rendered.contains("FuncCall"));
    }

    #[test]
    fn func_symbols_compare_by_name_and_origin() {
        let a = FuncSymbol::new("area".to_string());
        let b = FuncSymbol::new("area".to_string());
        *b.formal_params.borrow_mut() = vec![VarSymbol::new("r".to_string(), None)];
        assert_eq!(a, b);

        let native = FuncSymbol::native("area", &[]);
        assert_ne!(a, native);
    }

    #[test]
    fn scope_level_is_assigned_after_construction() {
        let sym = Symbol::Var(VarSymbol::new("x".to_string(), None));
        assert_eq!(sym.scope_level(), 0);
        sym.set_scope_level(2);
        assert_eq!(sym.scope_level(), 2);
    }
}
