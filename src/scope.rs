use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use rustc_hash::FxHashMap;

use crate::natives::NativeRegistry;
use crate::runner::LogOptions;
use crate::symbol::{BuiltinTypeSymbol, Symbol};

/// One lexical scope: a name table chained to the scope that encloses it.
///
/// Native functions are not stored in any table. Both lookup paths consult
/// the registry before the tables, so a native name wins over a declaration
/// at every level.
pub struct ScopedSymbolTable {
    pub scope_name: String,
    pub scope_level: usize,
    pub enclosing: Option<Rc<ScopedSymbolTable>>,
    symbols: RefCell<FxHashMap<String, Symbol>>,
    natives: Rc<NativeRegistry>,
    options: LogOptions,
}

impl ScopedSymbolTable {
    pub fn new(
        scope_name: &str,
        scope_level: usize,
        enclosing: Option<Rc<ScopedSymbolTable>>,
        natives: Rc<NativeRegistry>,
        options: LogOptions,
    ) -> Rc<ScopedSymbolTable> {
        Rc::new(ScopedSymbolTable {
            scope_name: scope_name.to_string(),
            scope_level,
            enclosing,
            symbols: RefCell::new(FxHashMap::default()),
            natives,
            options,
        })
    }

    /// Declarable type names. BOOLEAN is a literal keyword only, so it is
    /// deliberately absent and `VAR b: BOOLEAN` fails to resolve.
    pub fn seed_builtins(&self) {
        self.insert(Symbol::BuiltinType(BuiltinTypeSymbol::new("INTEGER")));
        self.insert(Symbol::BuiltinType(BuiltinTypeSymbol::new("REAL")));
        self.insert(Symbol::BuiltinType(BuiltinTypeSymbol::new("STRING")));
    }

    pub fn insert(&self, symbol: Symbol) {
        self.log(&format!("Insert: {}", symbol.name()));
        symbol.set_scope_level(self.scope_level);
        self.symbols
            .borrow_mut()
            .insert(symbol.name().to_string(), symbol);
    }

    /// Resolves a name against this scope and everything enclosing it.
    pub fn lookup(&self, name: &str) -> Option<Symbol> {
        self.log(&format!("Lookup: {name} (Scope name: {})", self.scope_name));
        if let Some(native) = self.natives.symbol(name) {
            return Some(Symbol::Func(native));
        }
        if let Some(symbol) = self.symbols.borrow().get(name) {
            return Some(symbol.clone());
        }
        self.enclosing.as_ref()?.lookup(name)
    }

    /// Resolves a name without walking the enclosing chain.
    pub fn lookup_current(&self, name: &str) -> Option<Symbol> {
        self.log(&format!("Lookup: {name} (Scope name: {})", self.scope_name));
        if let Some(native) = self.natives.symbol(name) {
            return Some(Symbol::Func(native));
        }
        self.symbols.borrow().get(name).cloned()
    }

    fn log(&self, message: &str) {
        if self.options.scope {
            eprintln!("{message}");
        }
    }
}

impl fmt::Display for ScopedSymbolTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let h1 = "SCOPE (SCOPE SYMBOL TABLE)";
        writeln!(f, "{h1}")?;
        writeln!(f, "{}", "=".repeat(h1.len()))?;
        writeln!(f, "{:<7}: {}", "Scope name", self.scope_name)?;
        writeln!(f, "{:<7}: {}", "Scope level", self.scope_level)?;
        let enclosing = match &self.enclosing {
            Some(scope) => scope.scope_name.as_str(),
            None => "None",
        };
        writeln!(f, "{:<7}: {enclosing}", "Enclosing scope")?;
        let h2 = "Scope (Scoped symbol table) contents";
        writeln!(f, "{h2}")?;
        write!(f, "{}", "-".repeat(h2.len()))?;

        let symbols = self.symbols.borrow();
        let mut names = symbols.keys().collect::<Vec<_>>();
        names.sort();
        for name in names {
            write!(f, "\n{name:<7}: {}", symbols[name])?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::rc::Rc;

    use crate::natives::NativeRegistry;
    use crate::runner::LogOptions;
    use crate::symbol::{Symbol, VarSymbol};

    use super::ScopedSymbolTable;

    fn global() -> Rc<ScopedSymbolTable> {
        let scope = ScopedSymbolTable::new(
            "global",
            1,
            None,
            Rc::new(NativeRegistry::standard()),
            LogOptions::default(),
        );
        scope.seed_builtins();
        scope
    }

    #[test]
    fn seeds_declarable_types_only() {
        let scope = global();
        for name in ["INTEGER", "REAL", "STRING"] {
            assert!(matches!(scope.lookup(name), Some(Symbol::BuiltinType(_))));
        }
        assert_eq!(scope.lookup("BOOLEAN"), None);
    }

    #[test]
    fn insert_stamps_the_scope_level() {
        let scope = global();
        let var = Symbol::Var(VarSymbol::new("x".to_string(), None));
        scope.insert(var);
        let found = scope.lookup("x").unwrap();
        assert_eq!(found.scope_level(), 1);
    }

    #[test]
    fn lookup_walks_the_enclosing_chain() {
        let outer = global();
        outer.insert(Symbol::Var(VarSymbol::new("x".to_string(), None)));
        let inner = ScopedSymbolTable::new(
            "area",
            2,
            Some(Rc::clone(&outer)),
            Rc::new(NativeRegistry::standard()),
            LogOptions::default(),
        );

        assert!(inner.lookup("x").is_some());
        assert!(inner.lookup_current("x").is_none());
    }

    #[test]
    fn natives_shadow_every_table() {
        let scope = global();
        scope.insert(Symbol::Var(VarSymbol::new("print".to_string(), None)));

        // Even the scope's own entry loses to the registry.
        assert!(matches!(scope.lookup("print"), Some(Symbol::Func(f)) if f.is_native));
        assert!(matches!(scope.lookup_current("print"), Some(Symbol::Func(f)) if f.is_native));
    }

    #[test]
    fn dump_lists_symbols_in_name_order() {
        let scope = global();
        scope.insert(Symbol::Var(VarSymbol::new("beta".to_string(), None)));
        scope.insert(Symbol::Var(VarSymbol::new("alpha".to_string(), None)));

        let dump = scope.to_string();
        let alpha = dump.find("alpha").unwrap();
        let beta = dump.find("beta").unwrap();
        assert!(alpha < beta);
        assert!(dump.starts_with("SCOPE (SCOPE SYMBOL TABLE)"));
        assert!(dump.contains("Scope name: global"));
    }
}
