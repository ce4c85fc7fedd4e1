//! Lowering of parsed programs into executable IR
//!
//! The [`Compiler`] is the mutable context shared by every production's
//! compile step: it knows which function or struct is being compiled, owns the
//! block scopes of the current function, and writes symbols, struct layouts
//! and function descriptors into a [`Program`].
//!
//! [`Compiler::compile`] dispatches on the node's production name through the
//! [`GrammarRegistry`], the same table the parser used to build the node.
//!
//! # Storage
//!
//! Declarations only record metadata. A local gets a fresh address each time
//! its function is called, and globals get theirs when a run starts. That is
//! what lets recursive calls own distinct copies of their locals.
//!
//! # Runtime lowering
//!
//! Array initializers keep their value nodes uncompiled until the assignment
//! executes. [`Compiler::for_runtime`] builds a read-only context over the
//! finished program for that purpose; it can resolve names and types but
//! refuses to declare anything.

pub mod constant;
mod errors;
pub mod symbols;
pub mod types;

pub use errors::{BuildError, CompileError};

use crate::grammar::GrammarRegistry;
use crate::ir::{Expr, ExprKind, Stmt, StmtKind};
use crate::parser::ast::{AstNode, SourceLocation, TypeName};
use rustc_hash::FxHashMap;
use symbols::{
    ArraySpec, Function, FunctionBody, FunctionId, Member, Program, StringId, StructId,
    StructType, Symbol, SymbolId,
};
use types::Type;

/// Names visible at one point of a function body
pub type NameScope = FxHashMap<String, SymbolId>;

/// Output of a compile step
#[derive(Debug)]
pub enum Lowered {
    Expr(Expr),
    Stmt(Stmt),
    /// Declarations register symbols and emit no instruction
    Declared,
}

enum Target<'a> {
    Building(&'a mut Program),
    Frozen(&'a Program),
}

struct FunctionContext {
    id: FunctionId,
    return_type: Type,
    scopes: Vec<NameScope>,
    loop_depth: usize,
}

struct StructBuilder {
    name: String,
    members: Vec<Member>,
    next_offset: u32,
}

pub struct Compiler<'a> {
    registry: &'a GrammarRegistry,
    target: Target<'a>,
    function: Option<FunctionContext>,
    structure: Option<StructBuilder>,
}

impl<'a> Compiler<'a> {
    pub fn new(registry: &'a GrammarRegistry, program: &'a mut Program) -> Self {
        Self {
            registry,
            target: Target::Building(program),
            function: None,
            structure: None,
        }
    }

    /// Read-only context for lowering expressions inside `function` while it runs
    pub fn for_runtime(
        registry: &'a GrammarRegistry,
        program: &'a Program,
        function: FunctionId,
        scope: &NameScope,
    ) -> Self {
        let return_type = program.function(function).return_type.clone();
        Self {
            registry,
            target: Target::Frozen(program),
            function: Some(FunctionContext {
                id: function,
                return_type,
                scopes: vec![scope.clone()],
                loop_depth: 0,
            }),
            structure: None,
        }
    }

    pub fn registry(&self) -> &'a GrammarRegistry {
        self.registry
    }

    pub fn program(&self) -> &Program {
        match &self.target {
            Target::Building(program) => &**program,
            Target::Frozen(program) => *program,
        }
    }

    fn program_mut(&mut self, at: SourceLocation) -> Result<&mut Program, CompileError> {
        match &mut self.target {
            Target::Building(program) => Ok(&mut **program),
            Target::Frozen(_) => Err(CompileError::new(
                "declarations are not allowed while the program is running",
                at,
            )),
        }
    }

    // ===== Dispatch =====

    /// Lower a node through its production's compile step
    pub fn compile(&mut self, node: &AstNode) -> Result<Lowered, CompileError> {
        let production = self.registry.get(node.production).ok_or_else(|| {
            CompileError::new(
                format!("unknown grammar production '{}'", node.production),
                node.starts_at,
            )
        })?;
        let compile = production.compile.ok_or_else(|| {
            CompileError::new(
                format!("'{}' cannot be compiled on its own", node.production),
                node.starts_at,
            )
        })?;
        compile(self, node)
    }

    pub fn compile_expr(&mut self, node: &AstNode) -> Result<Expr, CompileError> {
        match self.compile(node)? {
            Lowered::Expr(expr) => Ok(expr),
            _ => Err(CompileError::new("expected an expression", node.starts_at)),
        }
    }

    pub fn compile_stmt(&mut self, node: &AstNode) -> Result<Stmt, CompileError> {
        Ok(match self.compile(node)? {
            Lowered::Stmt(stmt) => stmt,
            Lowered::Expr(expr) => Stmt::new(StmtKind::Expr(expr), node.starts_at),
            Lowered::Declared => Stmt::new(StmtKind::Empty, node.starts_at),
        })
    }

    // ===== Types =====

    /// Turn a written type into a [`Type`], checking that structs exist
    pub fn resolve_type(
        &self,
        name: &TypeName,
        pointers: usize,
        at: SourceLocation,
    ) -> Result<Type, CompileError> {
        let ty = Type::from_name(name, pointers);
        if let TypeName::Struct(struct_name) = name {
            let being_defined = self
                .structure
                .as_ref()
                .is_some_and(|s| &s.name == struct_name);
            if being_defined && pointers == 0 {
                return Err(CompileError::new(
                    format!("field has incomplete type '{}'", ty),
                    at,
                ));
            }
            if !being_defined && self.program().struct_by_name(struct_name).is_none() {
                return Err(CompileError::new(
                    format!("unknown type 'struct {}'", struct_name),
                    at,
                ));
            }
        }
        Ok(ty)
    }

    /// Storage size of a complete type
    pub fn size_of(&self, ty: &Type, at: SourceLocation) -> Result<u32, CompileError> {
        self.program()
            .size_of(ty)
            .ok_or_else(|| CompileError::new(format!("storage size of '{}' is unknown", ty), at))
    }

    // ===== Structs =====

    pub fn in_struct(&self) -> bool {
        self.structure.is_some()
    }

    pub fn begin_struct(&mut self, name: &str, at: SourceLocation) -> Result<(), CompileError> {
        if self.program().struct_by_name(name).is_some() {
            return Err(CompileError::new(
                format!("redefinition of 'struct {}'", name),
                at,
            ));
        }
        self.structure = Some(StructBuilder {
            name: name.to_string(),
            members: Vec::new(),
            next_offset: 0,
        });
        Ok(())
    }

    pub fn finish_struct(&mut self, at: SourceLocation) -> Result<StructId, CompileError> {
        let builder = self
            .structure
            .take()
            .ok_or_else(|| CompileError::new("no struct is being defined", at))?;
        let layout = StructType {
            name: builder.name,
            members: builder.members,
            total_size: builder.next_offset,
        };
        Ok(self.program_mut(at)?.add_struct(layout))
    }

    // ===== Functions =====

    pub fn current_function(&self) -> Option<FunctionId> {
        self.function.as_ref().map(|f| f.id)
    }

    pub fn return_type(&self) -> Option<&Type> {
        self.function.as_ref().map(|f| &f.return_type)
    }

    /// Register a function signature so its own body can call it
    pub fn begin_function(
        &mut self,
        name: &str,
        return_type: Type,
        at: SourceLocation,
    ) -> Result<FunctionId, CompileError> {
        if self.program().function_by_name(name).is_some() {
            return Err(CompileError::new(
                format!("redefinition of function '{}'", name),
                at,
            ));
        }
        let id = self.program_mut(at)?.add_function(Function {
            name: name.to_string(),
            return_type: return_type.clone(),
            params: Vec::new(),
            locals: Vec::new(),
            body: FunctionBody::Declared,
            defined_at: at,
        });
        self.function = Some(FunctionContext {
            id,
            return_type,
            scopes: vec![NameScope::default()],
            loop_depth: 0,
        });
        Ok(id)
    }

    pub fn finish_function(&mut self, body: Stmt) -> Result<(), CompileError> {
        let at = body.location;
        let context = self
            .function
            .take()
            .ok_or_else(|| CompileError::new("no function is being defined", at))?;
        self.program_mut(at)?.function_mut(context.id).body = FunctionBody::Compiled(body);
        Ok(())
    }

    // ===== Scopes =====

    pub fn enter_scope(&mut self) {
        if let Some(function) = &mut self.function {
            function.scopes.push(NameScope::default());
        }
    }

    pub fn exit_scope(&mut self) {
        if let Some(function) = &mut self.function {
            if function.scopes.len() > 1 {
                function.scopes.pop();
            }
        }
    }

    /// Every local visible right now, inner declarations shadowing outer ones
    pub fn visible_names(&self) -> NameScope {
        let mut visible = NameScope::default();
        if let Some(function) = &self.function {
            for scope in &function.scopes {
                visible.extend(scope.iter().map(|(k, v)| (k.clone(), *v)));
            }
        }
        visible
    }

    pub fn enter_loop(&mut self) {
        if let Some(function) = &mut self.function {
            function.loop_depth += 1;
        }
    }

    pub fn exit_loop(&mut self) {
        if let Some(function) = &mut self.function {
            function.loop_depth = function.loop_depth.saturating_sub(1);
        }
    }

    pub fn in_loop(&self) -> bool {
        self.function.as_ref().is_some_and(|f| f.loop_depth > 0)
    }

    // ===== Symbols =====

    /// Record a variable in the innermost table: struct members, function
    /// locals, or globals, depending on what is being compiled
    pub fn declare(
        &mut self,
        name: &str,
        ty: Type,
        size: u32,
        array: Option<ArraySpec>,
        is_param: bool,
        at: SourceLocation,
    ) -> Result<(), CompileError> {
        if let Some(builder) = &mut self.structure {
            if builder.members.iter().any(|m| m.name == name) {
                return Err(CompileError::new(format!("duplicate member '{}'", name), at));
            }
            builder.members.push(Member {
                name: name.to_string(),
                ty,
                size,
                offset: builder.next_offset,
                array_length: array.map(|a| a.length),
            });
            builder.next_offset += size;
            return Ok(());
        }

        let symbol = Symbol {
            name: name.to_string(),
            ty,
            size,
            array,
            declared_at: at,
        };

        let Some((function_id, redeclared)) = self.function.as_ref().map(|f| {
            let redeclared = f.scopes.last().is_some_and(|s| s.contains_key(name));
            (f.id, redeclared)
        }) else {
            if self.program().global(name).is_some() {
                return Err(CompileError::new(format!("redefinition of '{}'", name), at));
            }
            self.program_mut(at)?.add_global(symbol);
            return Ok(());
        };

        if redeclared {
            return Err(CompileError::new(format!("redeclaration of '{}'", name), at));
        }

        let program = self.program_mut(at)?;
        let id = program.add_symbol(symbol);
        let descriptor = program.function_mut(function_id);
        descriptor.locals.push(id);
        if is_param {
            descriptor.params.push(id);
        }
        if let Some(scope) = self.function.as_mut().and_then(|f| f.scopes.last_mut()) {
            scope.insert(name.to_string(), id);
        }
        Ok(())
    }

    /// Resolve a variable name: innermost block first, then globals
    pub fn lookup(&self, name: &str, at: SourceLocation) -> Result<SymbolId, CompileError> {
        if let Some(function) = &self.function {
            for scope in function.scopes.iter().rev() {
                if let Some(id) = scope.get(name) {
                    return Ok(*id);
                }
            }
        }
        self.program()
            .global(name)
            .ok_or_else(|| CompileError::new(format!("'{}' undeclared", name), at))
    }

    pub fn symbol(&self, id: SymbolId) -> &Symbol {
        self.program().symbol(id)
    }

    /// Element count when `expr` designates a whole array variable or field
    pub fn array_length(&self, expr: &Expr) -> Option<u32> {
        match &expr.kind {
            ExprKind::Var(id) => self.symbol(*id).array.as_ref().map(|a| a.length),
            ExprKind::Member { array, .. } => *array,
            _ => None,
        }
    }

    pub fn intern_string(&mut self, text: &str, at: SourceLocation) -> Result<StringId, CompileError> {
        match &mut self.target {
            Target::Building(program) => Ok(program.intern_string(text)),
            Target::Frozen(program) => program.find_string(text).ok_or_else(|| {
                CompileError::new(format!("string literal \"{}\" was never compiled", text), at)
            }),
        }
    }
}

/// Compile a parsed program into `program`
pub fn compile_program(
    registry: &GrammarRegistry,
    program: &mut Program,
    root: &AstNode,
) -> Result<(), CompileError> {
    let mut compiler = Compiler::new(registry, program);
    compiler.compile(root)?;
    Ok(())
}
