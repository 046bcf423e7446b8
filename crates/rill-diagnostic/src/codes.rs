//! Error codes for Rill diagnostics.

/// Error codes for categorizing diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    // Lexer errors (E0001 - E0099)
    UnexpectedCharacter,
    UnterminatedString,
    InvalidEscape,
    InvalidNumber,

    // Parser errors (E0100 - E0199)
    UnexpectedToken,
    ExpectedExpression,
    UnclosedDelimiter,
    TrailingInput,
    NestingTooDeep,
    DuplicateField,
}

impl ErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            // Lexer
            ErrorCode::UnexpectedCharacter => "E0001",
            ErrorCode::UnterminatedString => "E0002",
            ErrorCode::InvalidEscape => "E0003",
            ErrorCode::InvalidNumber => "E0004",

            // Parser
            ErrorCode::UnexpectedToken => "E0100",
            ErrorCode::ExpectedExpression => "E0101",
            ErrorCode::UnclosedDelimiter => "E0102",
            ErrorCode::TrailingInput => "E0103",
            ErrorCode::NestingTooDeep => "E0104",
            ErrorCode::DuplicateField => "E0105",
        }
    }

    /// Get a human-readable description of the error.
    pub fn description(&self) -> &'static str {
        match self {
            ErrorCode::UnexpectedCharacter => "unexpected character in input",
            ErrorCode::UnterminatedString => "string literal is not terminated",
            ErrorCode::InvalidEscape => "invalid escape sequence in string",
            ErrorCode::InvalidNumber => "invalid number literal",

            ErrorCode::UnexpectedToken => "unexpected token",
            ErrorCode::ExpectedExpression => "expected an expression",
            ErrorCode::UnclosedDelimiter => "unclosed delimiter",
            ErrorCode::TrailingInput => "unexpected input after the expression",
            ErrorCode::NestingTooDeep => "expression is nested too deeply",
            ErrorCode::DuplicateField => "record field is defined more than once",
        }
    }

    /// Get a suggested fix for the error, if available.
    pub fn suggestion(&self) -> Option<&'static str> {
        match self {
            ErrorCode::UnterminatedString => {
                Some("add a closing quote `\"` to terminate the string")
            }
            ErrorCode::UnclosedDelimiter => Some("add the matching closing delimiter"),
            ErrorCode::TrailingInput => Some("a Rill input is a single expression"),
            ErrorCode::DuplicateField => Some("remove or rename one of the definitions"),
            _ => None,
        }
    }
}
