//! Import resolution across schema files.
//!
//! Compilation runs in two phases. Discovery walks the import graph with an
//! explicit stack, loading and lexing every distinct file once and
//! recording a dependencies-first order. Parsing then visits files in that
//! order so each importer sees the finished symbol tables of its imports.

use crate::error::{Result, SchemaError};
use crate::lexer::{Token, TokenKind, tokenize};
use crate::parser::{ImportHandler, Parser, ResolvedImport};
use crate::symbols::SymbolTable;
use crate::types::Program;
use crate::validation::validate_program;
use std::collections::HashMap;
use std::path::{Component, Path, PathBuf};

/// Access to schema sources.
pub trait SourceLoader {
    /// Maps `path` as written in `importer` (or the root path when
    /// `importer` is `None`) to a canonical file identity.
    ///
    /// # Errors
    /// Returns `FileResolution` if the file does not exist.
    fn resolve(&self, importer: Option<&Path>, path: &str) -> Result<PathBuf>;

    /// Reads the source of a canonical path.
    ///
    /// # Errors
    /// Returns `FileResolution` if the file cannot be read.
    fn load(&self, path: &Path) -> Result<String>;
}

/// Loads sources from disk. Import paths are relative to the importing file.
#[derive(Debug, Default, Clone, Copy)]
pub struct FsLoader;

impl SourceLoader for FsLoader {
    fn resolve(&self, importer: Option<&Path>, path: &str) -> Result<PathBuf> {
        let joined = relative_to(importer, path);
        std::fs::canonicalize(&joined).map_err(|e| SchemaError::file_resolution(joined, e))
    }

    fn load(&self, path: &Path) -> Result<String> {
        std::fs::read_to_string(path).map_err(|e| SchemaError::file_resolution(path, e))
    }
}

/// In-memory sources keyed by normalized path.
#[derive(Debug, Default, Clone)]
pub struct MemoryLoader {
    files: HashMap<PathBuf, String>,
}

impl MemoryLoader {
    /// Creates an empty loader.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a file.
    #[must_use]
    pub fn with_file(mut self, path: impl AsRef<Path>, source: impl Into<String>) -> Self {
        self.insert(path, source);
        self
    }

    /// Adds or replaces a file.
    pub fn insert(&mut self, path: impl AsRef<Path>, source: impl Into<String>) {
        self.files.insert(normalize(path.as_ref()), source.into());
    }
}

impl SourceLoader for MemoryLoader {
    fn resolve(&self, importer: Option<&Path>, path: &str) -> Result<PathBuf> {
        let resolved = normalize(&relative_to(importer, path));
        if self.files.contains_key(&resolved) {
            Ok(resolved)
        } else {
            Err(SchemaError::file_resolution(path, "file not found"))
        }
    }

    fn load(&self, path: &Path) -> Result<String> {
        self.files
            .get(path)
            .cloned()
            .ok_or_else(|| SchemaError::file_resolution(path, "file not found"))
    }
}

fn relative_to(importer: Option<&Path>, path: &str) -> PathBuf {
    match importer.and_then(Path::parent) {
        Some(dir) => dir.join(path),
        None => PathBuf::from(path),
    }
}

/// Lexically removes `.` and `..` components.
fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if !out.pop() {
                    out.push("..");
                }
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}

/// Result of compiling a root schema and everything it imports.
#[derive(Debug)]
pub struct Compilation {
    /// Canonical path of the root file.
    pub root: PathBuf,
    /// Declaration tree of the root file, imports nested.
    pub program: Program,
    /// Symbols visible in the root file.
    pub symbols: SymbolTable,
    /// Every file, dependencies first.
    pub files: Vec<PathBuf>,
}

/// A discovered file awaiting parsing.
struct SourceFile {
    tokens: Vec<Token>,
    /// Canonical target of each well-formed import directive, in order.
    /// Unresolvable targets are raised when the parser reaches them.
    imports: Vec<Result<PathBuf>>,
}

/// Discovery output: every reachable file, dependencies-first order and the
/// owning edge of each import.
struct Discovery {
    files: HashMap<PathBuf, Result<SourceFile>>,
    order: Vec<PathBuf>,
    owners: HashMap<PathBuf, (PathBuf, usize)>,
}

/// Compiles a schema file together with its imports.
#[derive(Debug, Default, Clone)]
pub struct Compiler<L> {
    loader: L,
}

impl<L: SourceLoader> Compiler<L> {
    /// Creates a compiler reading sources through `loader`.
    #[must_use]
    pub fn new(loader: L) -> Self {
        Self { loader }
    }

    /// Compiles `root` and every file it transitively imports, then
    /// validates the merged program.
    ///
    /// Errors surface in source order: a failure inside an imported file, or
    /// an import that cannot be resolved, is reported when the importer's
    /// parser reaches the `import` directive.
    ///
    /// # Errors
    /// Returns the first error raised by any file; errors from imported
    /// files are returned unchanged.
    pub fn compile(&self, root: impl AsRef<Path>) -> Result<Compilation> {
        let root_name = root.as_ref().to_string_lossy();
        let root = self.loader.resolve(None, &root_name)?;
        tracing::debug!(root = %root.display(), "compiling schema");

        let Discovery {
            mut files,
            order,
            owners,
        } = self.discover(&root);

        let mut exports: HashMap<PathBuf, SymbolTable> = HashMap::new();
        let mut programs: HashMap<PathBuf, Program> = HashMap::new();
        let mut failures: HashMap<PathBuf, SchemaError> = HashMap::new();
        for path in &order {
            let Some(file) = files.remove(path) else {
                continue;
            };
            let parsed = file.and_then(|file| {
                let mut handler = ResolveContext {
                    targets: &file.imports,
                    next: 0,
                    owners: &owners,
                    exports: &exports,
                    failures: &failures,
                    programs: &mut programs,
                };
                let mut parser = Parser::new(file.tokens, path.clone());
                let program = parser.parse(&mut handler)?;
                Ok((program, parser.into_symbols()))
            });
            match parsed {
                Ok((program, symbols)) => {
                    tracing::debug!(file = %path.display(), "parsed schema file");
                    exports.insert(path.clone(), symbols);
                    programs.insert(path.clone(), program);
                }
                Err(err) => {
                    tracing::debug!(file = %path.display(), error = %err, "schema file failed");
                    failures.insert(path.clone(), err);
                }
            }
        }

        if let Some(err) = failures.remove(&root) {
            return Err(err);
        }
        let program = programs.remove(&root).unwrap_or_default();
        let symbols = exports
            .remove(&root)
            .unwrap_or_else(|| SymbolTable::new(root.clone()));
        validate_program(&program)?;
        tracing::info!(files = order.len(), "schema compiled");

        Ok(Compilation {
            root,
            program,
            symbols,
            files: order,
        })
    }

    /// Loads every reachable file once. Files that fail to load or lex are
    /// kept as errors and not walked further.
    fn discover(&self, root: &Path) -> Discovery {
        let mut files = HashMap::new();
        let mut order = Vec::new();
        let mut owners = HashMap::new();

        files.insert(root.to_path_buf(), self.read(root));
        let mut stack: Vec<(PathBuf, usize)> = vec![(root.to_path_buf(), 0)];

        while let Some(frame) = stack.last_mut() {
            let importer = frame.0.clone();
            let index = frame.1;
            let next = files
                .get(&importer)
                .and_then(|f: &Result<SourceFile>| f.as_ref().ok())
                .and_then(|f| f.imports.get(index))
                .map(|target| target.as_ref().ok().cloned());
            let Some(target) = next else {
                order.push(importer);
                stack.pop();
                continue;
            };
            frame.1 += 1;
            let Some(target) = target else {
                continue;
            };

            if files.contains_key(&target) {
                tracing::debug!(
                    importer = %importer.display(),
                    target = %target.display(),
                    "skipping already discovered import"
                );
                continue;
            }

            tracing::debug!(file = %target.display(), "discovered import");
            files.insert(target.clone(), self.read(&target));
            owners.insert(target.clone(), (importer, index));
            stack.push((target, 0));
        }

        Discovery {
            files,
            order,
            owners,
        }
    }

    fn read(&self, path: &Path) -> Result<SourceFile> {
        let source = self.loader.load(path)?;
        let tokens = tokenize(&source)?;
        let imports = tokens
            .windows(2)
            .filter(|w| w[0].kind == TokenKind::Import && w[1].kind == TokenKind::String)
            .map(|w| self.loader.resolve(Some(path), &w[1].text))
            .collect();
        Ok(SourceFile { tokens, imports })
    }
}

/// Per-file import handler used during the parse phase.
struct ResolveContext<'a> {
    targets: &'a [Result<PathBuf>],
    next: usize,
    owners: &'a HashMap<PathBuf, (PathBuf, usize)>,
    exports: &'a HashMap<PathBuf, SymbolTable>,
    failures: &'a HashMap<PathBuf, SchemaError>,
    programs: &'a mut HashMap<PathBuf, Program>,
}

impl ImportHandler for ResolveContext<'_> {
    fn resolve_import(&mut self, importer: &Path, path: &str) -> Result<ResolvedImport> {
        let index = self.next;
        self.next += 1;
        let target = match self.targets.get(index) {
            Some(Ok(target)) => target,
            Some(Err(err)) => return Err(err.clone()),
            None => return Err(SchemaError::file_resolution(path, "import was not discovered")),
        };
        if let Some(err) = self.failures.get(target) {
            return Err(err.clone());
        }

        let owned = self
            .owners
            .get(target)
            .is_some_and(|(owner, i)| owner == importer && *i == index);
        let declarations = if owned {
            self.programs
                .remove(target)
                .map(|p| p.declarations)
                .unwrap_or_default()
        } else {
            tracing::debug!(
                importer = %importer.display(),
                target = %target.display(),
                "import already merged elsewhere"
            );
            Vec::new()
        };

        let exports = self.exports.get(target).cloned();
        if exports.is_some() {
            tracing::debug!(
                importer = %importer.display(),
                target = %target.display(),
                "merging imported symbols"
            );
        }

        Ok(ResolvedImport {
            declarations,
            exports,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Declaration;

    fn compile(loader: MemoryLoader, root: &str) -> Result<Compilation> {
        Compiler::new(loader).compile(root)
    }

    fn import_sizes(program: &Program) -> Vec<(String, usize)> {
        program
            .declarations
            .iter()
            .filter_map(|d| match d {
                Declaration::Import(i) => Some((i.path.clone(), i.declarations.len())),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn test_single_import() {
        let loader = MemoryLoader::new()
            .with_file("common.pkt", "packet Header { id: u32 }")
            .with_file("main.pkt", "import \"common.pkt\"\npacket Login : Header { user: string }");
        let compilation = compile(loader, "main.pkt").expect("Failed to compile");

        assert_eq!(
            import_sizes(&compilation.program),
            vec![("common.pkt".to_string(), 1)]
        );
        assert_eq!(compilation.files.len(), 2);
        assert!(compilation.symbols.packet("Header").is_some());
        let names: Vec<_> = compilation
            .program
            .flatten()
            .iter()
            .map(|d| d.name().to_string())
            .collect();
        assert_eq!(names, vec!["Header", "Login"]);
    }

    #[test]
    fn test_diamond_import_is_idempotent() {
        let loader = MemoryLoader::new()
            .with_file("a.pkt", "packet Base { id: u8 }")
            .with_file("b.pkt", "import \"a.pkt\"\npacket B : Base {}")
            .with_file("c.pkt", "import \"a.pkt\"\npacket C : Base {}")
            .with_file("main.pkt", "import \"b.pkt\"\nimport \"c.pkt\"\npacket M { b: B c: C }");
        let compilation = compile(loader, "main.pkt").expect("Failed to compile");

        let packets: Vec<_> = compilation
            .program
            .packets()
            .iter()
            .map(|p| p.name.clone())
            .collect();
        assert_eq!(packets, vec!["Base", "B", "C", "M"]);
        assert_eq!(compilation.files.len(), 4);
    }

    #[test]
    fn test_repeated_import_yields_empty_record() {
        let loader = MemoryLoader::new()
            .with_file("a.pkt", "packet A {}")
            .with_file("main.pkt", "import \"a.pkt\"\nimport \"./a.pkt\"\npacket M { a: A }");
        let compilation = compile(loader, "main.pkt").expect("Failed to compile");
        assert_eq!(
            import_sizes(&compilation.program),
            vec![("a.pkt".to_string(), 1), ("./a.pkt".to_string(), 0)]
        );
    }

    #[test]
    fn test_relative_to_importer() {
        let loader = MemoryLoader::new()
            .with_file("proto/common/types.pkt", "type Id = u64")
            .with_file("proto/session.pkt", "import \"common/types.pkt\"\npacket S { id: Id }")
            .with_file("main.pkt", "import \"proto/session.pkt\"\npacket M { s: S }");
        let compilation = compile(loader, "main.pkt").expect("Failed to compile");
        assert_eq!(compilation.files[0], PathBuf::from("proto/common/types.pkt"));
        assert!(compilation.symbols.alias("Id").is_some());
    }

    #[test]
    fn test_circular_import_terminates() {
        let loader = MemoryLoader::new()
            .with_file("a.pkt", "import \"b.pkt\"\npacket A {}")
            .with_file("b.pkt", "import \"a.pkt\"\npacket B {}");
        let compilation = compile(loader, "a.pkt").expect("Failed to compile");
        assert_eq!(
            compilation.files,
            vec![PathBuf::from("b.pkt"), PathBuf::from("a.pkt")]
        );
        assert!(compilation.symbols.packet("B").is_some());
    }

    #[test]
    fn test_circular_import_back_edge_merges_nothing() {
        let loader = MemoryLoader::new()
            .with_file("a.pkt", "import \"b.pkt\"\npacket A {}")
            .with_file("b.pkt", "import \"a.pkt\"\npacket B { a: A }");
        let err = compile(loader, "a.pkt").unwrap_err();
        assert!(err.to_string().contains("Undefined type 'A'"), "{err}");
    }

    #[test]
    fn test_missing_import() {
        let loader = MemoryLoader::new().with_file("main.pkt", "import \"nope.pkt\"");
        let err = compile(loader, "main.pkt").unwrap_err();
        assert!(matches!(err, SchemaError::FileResolution { .. }));
    }

    #[test]
    fn test_missing_root() {
        let err = compile(MemoryLoader::new(), "main.pkt").unwrap_err();
        assert!(matches!(err, SchemaError::FileResolution { .. }));
    }

    #[test]
    fn test_error_in_imported_file_propagates() {
        let loader = MemoryLoader::new()
            .with_file("bad.pkt", "packet P { x: Nope }")
            .with_file("main.pkt", "import \"bad.pkt\"");
        let err = compile(loader, "main.pkt").unwrap_err();
        assert!(err.is_parse());
        assert!(err.to_string().contains("line 1, column 15"), "{err}");
    }

    #[test]
    fn test_error_before_missing_import_reported_first() {
        let loader = MemoryLoader::new()
            .with_file("main.pkt", "packet P { x: Missing }\nimport \"nope.pkt\"");
        let err = compile(loader, "main.pkt").unwrap_err();
        assert!(err.is_parse(), "{err}");
        assert!(err.to_string().contains("Undefined type 'Missing'"), "{err}");
    }

    #[test]
    fn test_missing_import_before_error_reported_first() {
        let loader = MemoryLoader::new()
            .with_file("main.pkt", "import \"nope.pkt\"\npacket P { x: Missing }");
        let err = compile(loader, "main.pkt").unwrap_err();
        assert!(matches!(err, SchemaError::FileResolution { .. }), "{err}");
    }

    #[test]
    fn test_error_before_broken_import_reported_first() {
        let loader = MemoryLoader::new()
            .with_file("bad.pkt", "packet B { x: u8 @ }")
            .with_file("main.pkt", "packet P { x: Missing }\nimport \"bad.pkt\"");
        let err = compile(loader, "main.pkt").unwrap_err();
        assert!(err.to_string().contains("Undefined type 'Missing'"), "{err}");
    }

    #[test]
    fn test_lexical_error_in_import_reported_at_directive() {
        let loader = MemoryLoader::new()
            .with_file("bad.pkt", "packet B { x: u8 @ }")
            .with_file("main.pkt", "packet P { x: u8 }\nimport \"bad.pkt\"");
        let err = compile(loader, "main.pkt").unwrap_err();
        assert!(matches!(err, SchemaError::Lexical(ref e) if e.column == 18), "{err}");
    }

    #[test]
    fn test_conflicting_definitions_across_files() {
        let loader = MemoryLoader::new()
            .with_file("a.pkt", "packet Header { x: u8 }")
            .with_file("b.pkt", "packet Header { y: u8 }")
            .with_file("main.pkt", "import \"a.pkt\"\nimport \"b.pkt\"");
        let err = compile(loader, "main.pkt").unwrap_err();
        assert!(matches!(err, SchemaError::DuplicateDefinition { .. }));
    }

    #[test]
    fn test_local_redefinition_of_import_fails() {
        let loader = MemoryLoader::new()
            .with_file("a.pkt", "packet Header {}")
            .with_file("main.pkt", "import \"a.pkt\"\npacket Header {}");
        let err = compile(loader, "main.pkt").unwrap_err();
        assert!(err.to_string().contains("already defined"), "{err}");
    }

    #[test]
    fn test_normalize() {
        assert_eq!(normalize(Path::new("a/./b/../c.pkt")), PathBuf::from("a/c.pkt"));
        assert_eq!(normalize(Path::new("../x.pkt")), PathBuf::from("../x.pkt"));
    }

    #[test]
    fn test_fs_loader() {
        let dir = tempfile::tempdir().expect("Failed to create temp dir");
        std::fs::write(dir.path().join("common.pkt"), "enum Kind : u8 { A }")
            .expect("Failed to write");
        std::fs::write(
            dir.path().join("main.pkt"),
            "import \"common.pkt\"\npacket P { k: Kind = A }",
        )
        .expect("Failed to write");

        let compilation = Compiler::new(FsLoader)
            .compile(dir.path().join("main.pkt"))
            .expect("Failed to compile");
        assert!(compilation.symbols.enum_def("Kind").is_some());
        assert!(compilation.root.is_absolute());
    }
}
