//! File Selector: walks a materialized tree, filters out non-text/binary and
//! excluded paths, and produces a prioritized ordered list of candidate files.

use std::path::Path;
use tracing::{debug, info, warn};

/// Directory names whose whole subtree is excluded from the walk.
const EXCLUDED_DIRS: &[&str] = &[
    ".git",
    "node_modules",
    "__pycache__",
    ".venv",
    "venv",
    "env",
    ".env",
];

/// Known binary/non-text extensions, dropped unconditionally.
const BINARY_EXTENSIONS: &[&str] = &[
    "pyc", "pyo", "pyd", "so", "dll", "exe", "bin", "jpg", "jpeg", "png", "gif", "svg", "ico",
    "pdf", "zip", "tar", "gz", "mp4", "mp3",
];

/// Known text/code extensions, the allow-list for remaining files.
const TEXT_EXTENSIONS: &[&str] = &[
    "py", "js", "ts", "jsx", "tsx", "go", "rs", "java", "cpp", "c", "h", "hpp", "cs", "rb", "php",
    "swift", "kt", "scala", "md", "json", "yaml", "yml", "toml", "xml", "html", "css",
];

/// Conventionally-unextensioned files kept regardless of the allow-list.
const KEEP_FILENAMES: &[&str] = &["Dockerfile", "Makefile", "README.md"];

/// Documentation-pattern names, matched case-insensitively anywhere in the path.
const DOC_PATTERNS: &[&str] = &["readme", "changelog", "license", "contributing"];

/// Canonical entry-point filenames, matched exactly against the basename.
const ENTRY_POINT_NAMES: &[&str] = &[
    "main.py", "app.py", "index.js", "index.ts", "index.tsx", "main.js", "main.ts", "server.py",
    "app.js", "app.ts",
];

/// Build/config filenames, matched as case-insensitive substrings of the path.
const CONFIG_PATTERNS: &[&str] = &[
    "package.json",
    "requirements.txt",
    "dockerfile",
    "docker-compose",
    "setup.py",
    "pyproject.toml",
    "cargo.toml",
    "go.mod",
    "pom.xml",
    "tsconfig.json",
    "webpack.config",
    "vite.config",
    "tailwind.config",
    "cloudbuild.yaml",
    ".github/workflows",
];

/// Conventional source-directory segments for the fourth priority bucket.
const SOURCE_DIR_SEGMENTS: &[&str] = &["src", "app", "lib", "components", "core"];

/// Errors from file selection. An absent local root is fatal for the job.
#[derive(Debug)]
pub enum SelectError {
    MissingRoot(std::path::PathBuf),
    Io(std::io::Error),
}

impl From<std::io::Error> for SelectError {
    fn from(e: std::io::Error) -> Self {
        SelectError::Io(e)
    }
}

impl std::fmt::Display for SelectError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SelectError::MissingRoot(p) => write!(f, "local path does not exist: {}", p.display()),
            SelectError::Io(e) => write!(f, "file walk error: {e}"),
        }
    }
}

impl std::error::Error for SelectError {}

/// Walk `root` and return the prioritized list of relative file paths to
/// summarize.
pub fn select_files(root: &Path) -> Result<Vec<String>, SelectError> {
    if !root.exists() {
        warn!(path = %root.display(), "Local path does not exist");
        return Err(SelectError::MissingRoot(root.to_path_buf()));
    }

    let mut files = Vec::new();
    visit_dir(root, root, &mut files)?;

    info!(count = files.len(), "Indexed candidate files");
    if files.is_empty() {
        warn!(path = %root.display(), "No candidate files found in repository");
    }

    Ok(prioritize(files))
}

fn visit_dir(dir: &Path, root: &Path, results: &mut Vec<String>) -> Result<(), SelectError> {
    // Sorted entries keep the walk (and therefore bucket-internal order)
    // deterministic across platforms.
    let mut entries: Vec<_> = std::fs::read_dir(dir)?.collect::<Result<_, _>>()?;
    entries.sort_by_key(|e| e.file_name());

    for entry in entries {
        let path = entry.path();
        if path.is_dir() {
            let dir_name = path.file_name().and_then(|n| n.to_str()).unwrap_or("");
            if EXCLUDED_DIRS.contains(&dir_name) {
                debug!(path = %path.display(), "Skipping excluded directory");
                continue;
            }
            visit_dir(&path, root, results)?;
        } else if path.is_file() {
            let file_name = path.file_name().and_then(|n| n.to_str()).unwrap_or("");
            let extension = path
                .extension()
                .and_then(|e| e.to_str())
                .map(|e| e.to_ascii_lowercase());

            if let Some(ext) = &extension {
                if BINARY_EXTENSIONS.contains(&ext.as_str()) {
                    continue;
                }
            }

            let allowed_ext = extension
                .as_deref()
                .map(|e| TEXT_EXTENSIONS.contains(&e))
                .unwrap_or(false);
            if !allowed_ext && !KEEP_FILENAMES.contains(&file_name) {
                continue;
            }

            let rel_path = path
                .strip_prefix(root)
                .expect("walked path is under root")
                .to_string_lossy()
                .into_owned();
            results.push(rel_path);
        }
    }
    Ok(())
}

/// Order files into five priority buckets, each keeping first-seen order:
/// documentation, entry points, build/config, conventional source dirs, rest.
///
/// Important files should appear (and complete) first: the summarization
/// budget is bounded and consumers poll progressively.
pub fn prioritize(files: Vec<String>) -> Vec<String> {
    let mut doc_files = Vec::new();
    let mut entry_files = Vec::new();
    let mut config_files = Vec::new();
    let mut core_files = Vec::new();
    let mut other_files = Vec::new();

    for file_path in files {
        let path_lower = file_path.to_ascii_lowercase();
        let base_lower = Path::new(&file_path)
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("")
            .to_ascii_lowercase();

        if DOC_PATTERNS.iter().any(|p| path_lower.contains(p)) {
            doc_files.push(file_path);
        } else if ENTRY_POINT_NAMES.iter().any(|p| *p == base_lower) {
            entry_files.push(file_path);
        } else if CONFIG_PATTERNS.iter().any(|p| path_lower.contains(p)) {
            config_files.push(file_path);
        } else if Path::new(&path_lower)
            .components()
            .rev()
            .skip(1)
            .any(|c| match c {
                std::path::Component::Normal(seg) => SOURCE_DIR_SEGMENTS
                    .contains(&seg.to_str().unwrap_or("")),
                _ => false,
            })
        {
            core_files.push(file_path);
        } else {
            other_files.push(file_path);
        }
    }

    let mut prioritized = doc_files;
    prioritized.extend(entry_files);
    prioritized.extend(config_files);
    prioritized.extend(core_files);
    prioritized.extend(other_files);
    prioritized
}
