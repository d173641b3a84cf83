use std::fs;
use std::path::Path;

use tracing::{debug, info};

use crate::ast::Program;
use crate::builder::AstBuilder;
use crate::codegen_c::generate_c;
use crate::error::CoreError;
use crate::parser::parse_with;
use crate::render::render_tree;
use crate::symbols::SymbolTable;

#[derive(Debug)]
pub struct CompilationArtifact {
    pub program: Program,
    pub symbols: SymbolTable,
    /// Connector-style dump of `program`.
    pub tree: String,
    /// Complete C translation unit.
    pub c_source: String,
}

/// Run the front end over `source`. Nothing is rendered or generated
/// unless the whole program parses and every name checks out.
pub fn compile_c(source: &str) -> Result<CompilationArtifact, CoreError> {
    let mut builder = AstBuilder::new(SymbolTable::new());
    let program = parse_with(source, &mut builder)?;
    let symbols = builder.finish();
    debug!(
        statements = program.body.len(),
        declared = symbols.len(),
        "built syntax tree"
    );

    let tree = render_tree(&program);
    let c_source = generate_c(&program);

    Ok(CompilationArtifact {
        program,
        symbols,
        tree,
        c_source,
    })
}

pub fn compile_file(input: impl AsRef<Path>) -> Result<CompilationArtifact, CoreError> {
    let input = input.as_ref();
    let source = fs::read_to_string(input).map_err(|err| CoreError::resource(input, err))?;
    info!(input = %input.display(), bytes = source.len(), "compiling");
    compile_c(&source)
}

pub fn write_c_source(
    artifact: &CompilationArtifact,
    output: impl AsRef<Path>,
) -> Result<(), CoreError> {
    let output = output.as_ref();
    if let Some(parent) = output.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).map_err(|err| CoreError::resource(parent, err))?;
        }
    }
    fs::write(output, &artifact.c_source).map_err(|err| CoreError::resource(output, err))?;
    info!(output = %output.display(), "wrote C source");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{BinaryOperator, Expr, Stmt};
    use crate::toolchain::{ArtifactPaths, ExecutionReport, SystemRunner, Toolchain, build_and_run};
    use std::path::PathBuf;
    use std::time::Duration;

    fn host_compiler() -> Option<PathBuf> {
        ["gcc", "cc", "clang"]
            .into_iter()
            .find_map(|name| which::which(name).ok())
    }

    /// Compile and run `source`, or `None` when no C compiler is installed.
    fn run_program(source: &str) -> Option<String> {
        let compiler = host_compiler()?;
        let dir = tempfile::tempdir().expect("tempdir");
        let paths = ArtifactPaths {
            source: dir.path().join("output.c"),
            executable: dir.path().join("program"),
            results: dir.path().join("result.txt"),
        };
        let artifact = compile_c(source).expect("compile");
        write_c_source(&artifact, &paths.source).expect("write source");

        let runner = SystemRunner::new().with_timeout(Duration::from_secs(60));
        match build_and_run(&Toolchain::new(compiler), &paths, &runner) {
            ExecutionReport::Succeeded { output } => Some(output),
            other => panic!("toolchain failed: {other:?}"),
        }
    }

    #[test]
    fn builds_declaration_with_product() {
        let artifact = compile_c("int x = 2 * 8; print(x);").expect("compile");
        assert_eq!(
            artifact.program.body.statements,
            vec![
                Stmt::Declaration {
                    name: "x".to_string(),
                    init: Some(Expr::Binary {
                        op: BinaryOperator::Mul,
                        left: Box::new(Expr::Number(2)),
                        right: Box::new(Expr::Number(8)),
                    }),
                },
                Stmt::Print {
                    value: Expr::Identifier("x".to_string())
                },
            ]
        );
        assert!(artifact.symbols.contains("x"));
        assert!(artifact.tree.starts_with("BLOCK\n"));
        assert!(artifact.c_source.contains("int x = (2 * 8);"));
    }

    #[test]
    fn undeclared_use_produces_no_artifact() {
        let dir = tempfile::tempdir().expect("tempdir");
        let input = dir.path().join("input.txt");
        fs::write(&input, "print(y);").expect("write input");

        let err = compile_file(&input).unwrap_err();
        assert!(matches!(err, CoreError::UndeclaredVariable(name) if name == "y"));
    }

    #[test]
    fn duplicate_declaration_is_fatal() {
        let err = compile_c("int x; int x;").unwrap_err();
        assert!(matches!(&err, CoreError::DuplicateDeclaration(name) if name == "x"));
        assert_eq!(err.to_string(), "variable 'x' is already declared");
    }

    #[test]
    fn missing_input_is_a_resource_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        let input = dir.path().join("absent.txt");
        let err = compile_file(&input).unwrap_err();
        assert!(matches!(err, CoreError::ResourceError { .. }));

        // The io cause is part of the message, not a second chained error.
        let message = err.to_string();
        assert!(message.starts_with(&format!("cannot access {}: ", input.display())));
        assert_eq!(message.matches("cannot access").count(), 1);
        assert!(std::error::Error::source(&err).is_none());
    }

    #[test]
    fn writes_source_into_new_directory() {
        let dir = tempfile::tempdir().expect("tempdir");
        let output = dir.path().join("build").join("output.c");
        let artifact = compile_c("print(\"hi\");").expect("compile");
        write_c_source(&artifact, &output).expect("write");
        let written = fs::read_to_string(&output).expect("read back");
        assert_eq!(written, artifact.c_source);
    }

    #[test]
    fn runs_product_program() {
        if let Some(output) = run_program("int x = 2 * 8; print(x);") {
            assert_eq!(output, "16\n");
        }
    }

    #[test]
    fn runs_assignment_program() {
        if let Some(output) = run_program("int x; x = 5; print(x + 1);") {
            assert_eq!(output, "6\n");
        }
    }

    #[test]
    fn runs_if_else_program() {
        let source = "if (1 < 2) { print(1); } else { print(2); }";
        let artifact = compile_c(source).expect("compile");
        assert!(artifact.c_source.contains("printf(\"%d\\n\", 1);"));
        assert!(artifact.c_source.contains("printf(\"%d\\n\", 2);"));
        if let Some(output) = run_program(source) {
            assert_eq!(output, "1\n");
        }
    }

    #[test]
    fn runs_strings_and_negation() {
        let source = "int a = -3; if (a < 0) { print(\"negative\"); } print(-a * 2);";
        if let Some(output) = run_program(source) {
            assert_eq!(output, "negative\n6\n");
        }
    }
}
