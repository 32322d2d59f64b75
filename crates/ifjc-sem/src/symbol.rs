//! Symbol records and their table keys.
//!
//! The key encoding carries overloading and kind disambiguation: functions
//! live under `name$arity` (different arities coexist), getters under
//! `name$get`, setters under `name$set`, and variables under their bare
//! name. Identifiers cannot contain `$`, so the key spaces never collide.

use ifjc_util::{DataType, ScopeId};

/// A variable (or parameter) symbol.
#[derive(Debug, Clone)]
pub struct VarSymbol {
    /// Type of the last assigned value; advisory under dynamic typing.
    pub ty: DataType,
    pub defined: bool,
    pub initialized: bool,
    /// The scope the variable was declared in, used by the emitter to
    /// compute its frame reference.
    pub scope: ScopeId,
}

/// A function symbol under an arity-encoded key.
#[derive(Debug, Clone)]
pub struct FuncSymbol {
    pub params: Vec<(String, DataType)>,
    pub defined: bool,
    pub return_type: DataType,
}

/// A getter symbol under a `$get` key.
#[derive(Debug, Clone)]
pub struct GetterSymbol {
    pub return_type: DataType,
    pub defined: bool,
}

/// A setter symbol under a `$set` key.
#[derive(Debug, Clone)]
pub struct SetterSymbol {
    /// Declared (or first-call-refined) parameter type; `Undef` and `Null`
    /// both act as wildcards.
    pub param_type: DataType,
    pub defined: bool,
}

/// Any symbol table entry.
#[derive(Debug, Clone)]
pub enum Symbol {
    Var(VarSymbol),
    Func(FuncSymbol),
    Getter(GetterSymbol),
    Setter(SetterSymbol),
}

/// Overload key of a function with the given arity.
pub fn func_key(name: &str, arity: usize) -> String {
    format!("{name}${arity}")
}

/// Table key of a getter.
pub fn getter_key(name: &str) -> String {
    format!("{name}$get")
}

/// Table key of a setter.
pub fn setter_key(name: &str) -> String {
    format!("{name}$set")
}

/// The built-in functions preloaded into the global scope, as
/// `(key, parameter types, return type)`.
pub fn builtins() -> Vec<(&'static str, Vec<(&'static str, DataType)>, DataType)> {
    use DataType::{Num, String as Str, Undef};
    vec![
        ("Ifj.read_str$0", vec![], Str),
        ("Ifj.read_num$0", vec![], Num),
        ("Ifj.write$1", vec![("term", Undef)], DataType::Null),
        ("Ifj.floor$1", vec![("term", Num)], Num),
        ("Ifj.str$1", vec![("term", Undef)], Str),
        ("Ifj.length$1", vec![("s", Str)], Num),
        (
            "Ifj.substring$3",
            vec![("s", Str), ("i", Num), ("j", Num)],
            Str,
        ),
        ("Ifj.strcmp$2", vec![("s1", Str), ("s2", Str)], Num),
        ("Ifj.ord$2", vec![("s", Str), ("i", Num)], Num),
        ("Ifj.chr$1", vec![("i", Num)], Str),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_encodings() {
        assert_eq!(func_key("foo", 2), "foo$2");
        assert_eq!(func_key("main", 0), "main$0");
        assert_eq!(getter_key("count"), "count$get");
        assert_eq!(setter_key("count"), "count$set");
    }

    #[test]
    fn test_builtin_table_shape() {
        let table = builtins();
        assert_eq!(table.len(), 10);
        for (key, params, _) in &table {
            let (_, arity) = key.rsplit_once('$').unwrap();
            assert_eq!(arity.parse::<usize>().unwrap(), params.len());
            assert!(key.starts_with("Ifj."));
        }
    }
}
