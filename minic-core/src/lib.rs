//! Core of the minic toolchain.
//!
//! The pipeline is:
//!
//!   source
//!     -> lexer + parser  (reduction events)
//!     -> builder         (AST + flat symbol table)
//!     -> render / codegen_c
//!     -> toolchain       (external C compiler, then the program itself)
//!
//! The CLI and any other front end should go through `compiler` and
//! `toolchain` rather than wiring the stages by hand.

// ---------------------------------------------------------------------
// Error handling
// ---------------------------------------------------------------------

pub mod error;

// ---------------------------------------------------------------------
// Front-end: lexing and parsing
// ---------------------------------------------------------------------

pub mod lexer;
pub mod parser;
pub mod reduce;

// ---------------------------------------------------------------------
// Semantic actions: AST and declarations
// ---------------------------------------------------------------------

pub mod ast;
pub mod builder;
pub mod symbols;

// ---------------------------------------------------------------------
// Back-end: rendering, code generation and orchestration
// ---------------------------------------------------------------------

pub mod codegen_c;
pub mod compiler;
pub mod render;
pub mod toolchain;

// ---------------------------------------------------------------------
// Public API re-exports
// ---------------------------------------------------------------------

pub use compiler::{CompilationArtifact, compile_c, compile_file, write_c_source};
pub use error::CoreError;
pub use toolchain::{ArtifactPaths, ExecutionReport, SystemRunner, Toolchain, build_and_run};
