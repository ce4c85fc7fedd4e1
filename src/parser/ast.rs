// AST definitions produced by the grammar productions

/// Source location information for error reporting
///
/// `offset` is the character index into the source text; `line` and `column`
/// are 1-based and derived from it by the lexer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SourceLocation {
    pub offset: usize,
    pub line: usize,
    pub column: usize,
}

impl SourceLocation {
    pub fn new(offset: usize, line: usize, column: usize) -> Self {
        Self {
            offset,
            line,
            column,
        }
    }
}

/// Base type names as written in declarations
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeName {
    Int,
    Char,
    Void,
    Struct(String),
}

/// Binary operators
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinOp {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    And,
    Or,
}

impl BinOp {
    pub fn symbol(self) -> &'static str {
        match self {
            BinOp::Add => "+",
            BinOp::Sub => "-",
            BinOp::Mul => "*",
            BinOp::Div => "/",
            BinOp::Mod => "%",
            BinOp::Eq => "==",
            BinOp::Ne => "!=",
            BinOp::Lt => "<",
            BinOp::Le => "<=",
            BinOp::Gt => ">",
            BinOp::Ge => ">=",
            BinOp::And => "&&",
            BinOp::Or => "||",
        }
    }
}

/// Unary operators
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnOp {
    Neg,    // -x
    Not,    // !x
    Deref,  // *x
    AddrOf, // &x
}

/// Bracketed declarator after a variable name
#[derive(Debug, Clone)]
pub enum ArrayDeclarator {
    /// `[expr]`: fixed-size array, size resolved at compile time
    Sized(Box<AstNode>),
    /// `[]`: only valid for parameters, where it means one more pointer level
    Unsized,
}

/// Operand of `sizeof`
#[derive(Debug, Clone)]
pub enum SizeofTarget {
    Type { name: TypeName, pointers: usize },
    Expr(Box<AstNode>),
}

/// Production-specific payload of an [`AstNode`]
#[derive(Debug, Clone)]
pub enum Content {
    // Declarations
    Program {
        items: Vec<AstNode>,
    },
    StructDef {
        name: String,
        members: Vec<AstNode>,
    },
    FunctionDef {
        return_type: TypeName,
        pointers: usize,
        name: String,
        params: Vec<AstNode>,
        body: Box<AstNode>,
    },
    Param {
        type_name: TypeName,
        item: Box<AstNode>,
    },
    Type(TypeName),
    VarDec {
        type_name: TypeName,
        items: Vec<AstNode>,
    },
    VarItem {
        pointers: usize,
        name: String,
        array: Option<ArrayDeclarator>,
    },

    // Statements
    Block {
        statements: Vec<AstNode>,
    },
    If {
        condition: Box<AstNode>,
        then_branch: Box<AstNode>,
        else_branch: Option<Box<AstNode>>,
    },
    While {
        condition: Box<AstNode>,
        body: Box<AstNode>,
    },
    DoWhile {
        body: Box<AstNode>,
        condition: Box<AstNode>,
    },
    For {
        init: Option<Box<AstNode>>,
        condition: Option<Box<AstNode>>,
        increment: Option<Box<AstNode>>,
        body: Box<AstNode>,
    },
    Return(Option<Box<AstNode>>),
    Break,
    Continue,
    Empty,
    ExpressionStatement(Box<AstNode>),

    // Expressions
    Assign {
        left: Box<AstNode>,
        right: Box<AstNode>,
    },
    ArrayInit {
        values: Vec<AstNode>,
    },
    Binary {
        op: BinOp,
        left: Box<AstNode>,
        right: Box<AstNode>,
    },
    Unary {
        op: UnOp,
        operand: Box<AstNode>,
    },
    Sizeof(SizeofTarget),
    Index {
        base: Box<AstNode>,
        index: Box<AstNode>,
    },
    Member {
        object: Box<AstNode>,
        field: String,
    },
    PointerMember {
        pointer: Box<AstNode>,
        field: String,
    },
    Call {
        name: String,
        args: Vec<AstNode>,
    },
    IntLiteral(i32),
    CharLiteral(i8),
    StringLiteral(String),
    Null,
    Identifier(String),
}

/// A parsed grammar node, tagged with the production that produced it
#[derive(Debug, Clone)]
pub struct AstNode {
    pub production: &'static str,
    pub content: Content,
    pub starts_at: SourceLocation,
}

impl AstNode {
    pub fn new(production: &'static str, content: Content, starts_at: SourceLocation) -> Self {
        Self {
            production,
            content,
            starts_at,
        }
    }

    /// Whether this node was produced by the named production
    pub fn is(&self, production: &str) -> bool {
        self.production == production
    }
}
