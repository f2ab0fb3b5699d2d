//! glang parser crate.
//!
//! This crate provides the lexer and parser for glang source code:
//! - Lexical analysis (tokenization)
//! - Abstract Syntax Tree (AST) definitions
//! - A recursive-descent parser with panic-mode error recovery
//!
//! # Example
//!
//! ```
//! use glang_parser::Parser;
//! use bumpalo::Bump;
//!
//! let arena = Bump::new();
//! let source = r#"
//!     var greeting = "hello"
//!     if greeting println(greeting)
//! "#;
//!
//! match Parser::parse(source, &arena) {
//!     Ok(script) => println!("Parsed successfully: {} statements", script.statements().len()),
//!     Err(errors) => eprintln!("Parse errors: {}", errors),
//! }
//! ```

pub mod ast;
pub mod lexer;

pub use ast::{Parser, Script};
pub use lexer::{Lexer, Token, TokenKind};
