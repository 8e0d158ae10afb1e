//! Type system for minigo
//!
//! The value-type domain and the unification rules for arithmetic,
//! equality and ordering. Unification is total: incompatible operand
//! pairs yield [`Type::NoType`] instead of an error.

use std::fmt;

/// Resolved value type of an expression or declaration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Type {
    Int,
    Float32,
    Bool,
    Str,
    /// Statements and incompatible unifications
    NoType,
}

impl Type {
    /// Check if this is a numeric type
    pub fn is_numeric(self) -> bool {
        matches!(self, Type::Int | Type::Float32)
    }

    /// Unify operand types for `* / % + -`.
    ///
    /// `int` with `int` stays `int`; any numeric pairing involving
    /// `float32` widens to `float32`. Everything else is incompatible.
    pub fn unify_math(self, other: Type) -> Type {
        match (self, other) {
            (Type::Int, Type::Int) => Type::Int,
            (Type::Int, Type::Float32)
            | (Type::Float32, Type::Int)
            | (Type::Float32, Type::Float32) => Type::Float32,
            _ => Type::NoType,
        }
    }

    /// Unify operand types for `==` and `!=`.
    ///
    /// Defined for identical concrete types only; the result is `bool`.
    pub fn unify_equality(self, other: Type) -> Type {
        if self == other && self != Type::NoType {
            Type::Bool
        } else {
            Type::NoType
        }
    }

    /// Unify operand types for `< <= > >=`.
    ///
    /// Numeric pairs follow the same widening as [`Type::unify_math`],
    /// strings order lexicographically, and `bool` has no natural order.
    pub fn unify_ordering(self, other: Type) -> Type {
        match (self, other) {
            (l, r) if l.is_numeric() && r.is_numeric() => Type::Bool,
            (Type::Str, Type::Str) => Type::Bool,
            _ => Type::NoType,
        }
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Type::Int => "int",
            Type::Float32 => "float32",
            Type::Bool => "bool",
            Type::Str => "string",
            Type::NoType => "no_type",
        };
        write!(f, "{}", s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn math_unification_widens_to_float() {
        assert_eq!(Type::Int.unify_math(Type::Int), Type::Int);
        assert_eq!(Type::Int.unify_math(Type::Float32), Type::Float32);
        assert_eq!(Type::Float32.unify_math(Type::Int), Type::Float32);
        assert_eq!(Type::Float32.unify_math(Type::Float32), Type::Float32);
    }

    #[test]
    fn math_unification_rejects_non_numerics() {
        for t in [Type::Int, Type::Float32, Type::Bool, Type::Str, Type::NoType] {
            assert_eq!(Type::Bool.unify_math(t), Type::NoType);
            assert_eq!(Type::Str.unify_math(t), Type::NoType);
            assert_eq!(t.unify_math(Type::Bool), Type::NoType);
            assert_eq!(t.unify_math(Type::Str), Type::NoType);
        }
    }

    #[test]
    fn equality_unification_needs_identical_tags() {
        for t in [Type::Int, Type::Float32, Type::Bool, Type::Str] {
            assert_eq!(t.unify_equality(t), Type::Bool);
        }
        assert_eq!(Type::Int.unify_equality(Type::Float32), Type::NoType);
        assert_eq!(Type::Str.unify_equality(Type::Bool), Type::NoType);
        assert_eq!(Type::NoType.unify_equality(Type::NoType), Type::NoType);
    }

    #[test]
    fn ordering_unification() {
        assert_eq!(Type::Int.unify_ordering(Type::Float32), Type::Bool);
        assert_eq!(Type::Str.unify_ordering(Type::Str), Type::Bool);
        assert_eq!(Type::Bool.unify_ordering(Type::Bool), Type::NoType);
        assert_eq!(Type::Str.unify_ordering(Type::Int), Type::NoType);
    }
}
