//! Token definitions for the Go-like surface syntax

/// A token produced by the lexer
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    /// 1-based source line
    pub line: u32,
}

impl Token {
    pub fn new(kind: TokenKind, line: u32) -> Self {
        Self { kind, line }
    }
}

/// Token kinds
#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    // ============ Keywords ============
    Package,
    Main,
    Import,
    Func,
    Var,
    If,
    Else,
    For,
    Switch,
    Case,
    Default,
    Return,
    True,
    False,
    /// `int`
    IntType,
    /// `float32`
    Float32Type,
    /// `bool`
    BoolType,
    /// `string`
    StringType,
    /// `fmt.Scanln`
    Input,
    /// `fmt.Println`
    Output,

    // ============ Literals ============
    Ident(String),
    IntLit(i32),
    FloatLit(f32),
    /// Interpreted string literal, quotes preserved
    StrLit(String),

    // ============ Operators ============
    EqEq,
    NotEq,
    Less,
    LessEq,
    Greater,
    GreaterEq,
    Star,
    Slash,
    Percent,
    Plus,
    Minus,
    Assign,
    DeclAssign,
    PlusAssign,
    MinusAssign,
    PlusPlus,
    MinusMinus,

    // ============ Punctuation ============
    LParen,
    RParen,
    LBrace,
    RBrace,
    LBracket,
    RBracket,
    Comma,
    Colon,
    Semi,
    Amp,

    Eof,
}

impl TokenKind {
    /// Map an identifier to its keyword kind, if it is one
    pub fn keyword_from_str(text: &str) -> Option<TokenKind> {
        let kind = match text {
            "package" => TokenKind::Package,
            "main" => TokenKind::Main,
            "import" => TokenKind::Import,
            "func" => TokenKind::Func,
            "var" => TokenKind::Var,
            "if" => TokenKind::If,
            "else" => TokenKind::Else,
            "for" => TokenKind::For,
            "switch" => TokenKind::Switch,
            "case" => TokenKind::Case,
            "default" => TokenKind::Default,
            "return" => TokenKind::Return,
            "true" => TokenKind::True,
            "false" => TokenKind::False,
            "int" => TokenKind::IntType,
            "float32" => TokenKind::Float32Type,
            "bool" => TokenKind::BoolType,
            "string" => TokenKind::StringType,
            _ => return None,
        };
        Some(kind)
    }

    /// Short description used in syntax error messages
    pub fn describe(&self) -> String {
        match self {
            TokenKind::Ident(name) => format!("identifier '{}'", name),
            TokenKind::IntLit(v) => format!("int literal '{}'", v),
            TokenKind::FloatLit(v) => format!("float literal '{}'", v),
            TokenKind::StrLit(s) => format!("string literal {}", s),
            TokenKind::Eof => "end of input".to_string(),
            other => format!("'{:?}'", other),
        }
    }
}
