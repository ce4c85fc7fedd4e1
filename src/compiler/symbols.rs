//! Compile-time symbol tables
//!
//! A [`Program`] owns everything the compiler learns about a translation unit:
//! every variable [`Symbol`] (globals, locals, parameters, builtin
//! parameters), struct layouts, function descriptors, and the string-literal
//! pool. Entries are referenced by small index newtypes and never removed, so
//! IR can point at them without borrowing the tables.
//!
//! Symbols are metadata only. Storage for them is bound per call frame by the
//! interpreter (see [`crate::memory::stack`]).

use crate::compiler::types::{BaseType, Type};
use crate::ir::{BuiltinOp, Expr, Stmt};
use crate::parser::ast::SourceLocation;
use rustc_hash::FxHashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SymbolId(pub(crate) usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FunctionId(pub(crate) usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StructId(pub(crate) usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StringId(pub(crate) usize);

/// Shape of an array variable
#[derive(Debug, Clone)]
pub struct ArraySpec {
    /// Element count, validated at compile time
    pub length: u32,
    /// The compiled size expression, re-resolved at frame allocation
    pub length_expr: Expr,
}

/// A variable known to the compiler
#[derive(Debug, Clone)]
pub struct Symbol {
    pub name: String,
    /// For arrays this is the pointer-to-element type
    pub ty: Type,
    /// Bytes of storage bound per frame
    pub size: u32,
    pub array: Option<ArraySpec>,
    pub declared_at: SourceLocation,
}

impl Symbol {
    pub fn is_array(&self) -> bool {
        self.array.is_some()
    }

    /// Element type of an array symbol
    pub fn element_type(&self) -> Option<Type> {
        self.array.as_ref().and_then(|_| self.ty.deref())
    }
}

/// A struct field with its fixed offset
#[derive(Debug, Clone)]
pub struct Member {
    pub name: String,
    pub ty: Type,
    pub size: u32,
    pub offset: u32,
    pub array_length: Option<u32>,
}

#[derive(Debug, Clone)]
pub struct StructType {
    pub name: String,
    pub members: Vec<Member>,
    pub total_size: u32,
}

impl StructType {
    pub fn member(&self, name: &str) -> Option<&Member> {
        self.members.iter().find(|m| m.name == name)
    }
}

/// What runs when a function is called
#[derive(Debug, Clone)]
pub enum FunctionBody {
    /// Signature registered, body still being compiled
    Declared,
    Compiled(Stmt),
    Builtin(BuiltinOp),
}

/// A callable: user-defined or builtin, invoked through the same protocol
#[derive(Debug, Clone)]
pub struct Function {
    pub name: String,
    pub return_type: Type,
    pub params: Vec<SymbolId>,
    /// Every variable bound per call, parameters first, in declaration order
    pub locals: Vec<SymbolId>,
    pub body: FunctionBody,
    pub defined_at: SourceLocation,
}

impl Function {
    pub fn is_builtin(&self) -> bool {
        matches!(self.body, FunctionBody::Builtin(_))
    }

    pub fn returns_value(&self) -> bool {
        !self.return_type.is_void()
    }
}

/// Symbol tables for one compiled program
#[derive(Debug, Clone, Default)]
pub struct Program {
    symbols: Vec<Symbol>,
    globals: Vec<SymbolId>,
    global_names: FxHashMap<String, SymbolId>,
    structs: Vec<StructType>,
    struct_names: FxHashMap<String, StructId>,
    functions: Vec<Function>,
    function_names: FxHashMap<String, FunctionId>,
    strings: Vec<String>,
    string_ids: FxHashMap<String, StringId>,
}

impl Program {
    pub fn new() -> Self {
        Self::default()
    }

    // ===== Variables =====

    pub fn add_symbol(&mut self, symbol: Symbol) -> SymbolId {
        self.symbols.push(symbol);
        SymbolId(self.symbols.len() - 1)
    }

    pub fn symbol(&self, id: SymbolId) -> &Symbol {
        &self.symbols[id.0]
    }

    pub fn add_global(&mut self, symbol: Symbol) -> SymbolId {
        let name = symbol.name.clone();
        let id = self.add_symbol(symbol);
        self.globals.push(id);
        self.global_names.insert(name, id);
        id
    }

    pub fn global(&self, name: &str) -> Option<SymbolId> {
        self.global_names.get(name).copied()
    }

    /// Global variables in declaration order
    pub fn globals(&self) -> &[SymbolId] {
        &self.globals
    }

    // ===== Structs =====

    pub fn add_struct(&mut self, layout: StructType) -> StructId {
        let name = layout.name.clone();
        self.structs.push(layout);
        let id = StructId(self.structs.len() - 1);
        self.struct_names.insert(name, id);
        id
    }

    pub fn struct_by_name(&self, name: &str) -> Option<StructId> {
        self.struct_names.get(name).copied()
    }

    pub fn struct_type(&self, id: StructId) -> &StructType {
        &self.structs[id.0]
    }

    pub fn struct_named(&self, name: &str) -> Option<&StructType> {
        self.struct_by_name(name).map(|id| self.struct_type(id))
    }

    // ===== Functions =====

    pub fn add_function(&mut self, function: Function) -> FunctionId {
        let name = function.name.clone();
        self.functions.push(function);
        let id = FunctionId(self.functions.len() - 1);
        self.function_names.insert(name, id);
        id
    }

    pub fn function(&self, id: FunctionId) -> &Function {
        &self.functions[id.0]
    }

    pub fn function_mut(&mut self, id: FunctionId) -> &mut Function {
        &mut self.functions[id.0]
    }

    pub fn function_by_name(&self, name: &str) -> Option<FunctionId> {
        self.function_names.get(name).copied()
    }

    pub fn functions(&self) -> impl Iterator<Item = (FunctionId, &Function)> {
        self.functions
            .iter()
            .enumerate()
            .map(|(i, f)| (FunctionId(i), f))
    }

    // ===== String literals =====

    pub fn intern_string(&mut self, text: &str) -> StringId {
        if let Some(id) = self.string_ids.get(text) {
            return *id;
        }
        self.strings.push(text.to_string());
        let id = StringId(self.strings.len() - 1);
        self.string_ids.insert(text.to_string(), id);
        id
    }

    pub fn find_string(&self, text: &str) -> Option<StringId> {
        self.string_ids.get(text).copied()
    }

    pub fn string(&self, id: StringId) -> &str {
        &self.strings[id.0]
    }

    pub fn strings(&self) -> impl Iterator<Item = (StringId, &str)> {
        self.strings
            .iter()
            .enumerate()
            .map(|(i, s)| (StringId(i), s.as_str()))
    }

    /// Storage size of a complete type, `None` for `void` and unknown structs
    pub fn size_of(&self, ty: &Type) -> Option<u32> {
        if let Some(size) = ty.fixed_size() {
            return Some(size);
        }
        match &ty.base {
            BaseType::Struct(name) => self.struct_named(name).map(|s| s.total_size),
            _ => None,
        }
    }
}
