//! Per-File Summarizer: reads one file, asks the chat model for a structured
//! summary plus dependency list, and absorbs every per-file failure so a
//! single file can never abort the job.

use std::path::Path;
use std::sync::Arc;

use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, warn};

use crate::contract::ChatModel;

/// Marker appended to file content cut at the character budget.
const TRUNCATION_MARKER: &str = "\n... (truncated for brevity)";

/// Sentinel summaries: the `summary` field is non-empty by contract.
const EMPTY_RESPONSE_SUMMARY: &str = "No summary available - model returned empty response.";
const MISSING_SUMMARY: &str = "No summary available.";

/// Structured per-file output of summarization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SummaryDocument {
    /// Relative path of the summarized file, stable identifier downstream.
    pub file: String,
    pub summary: String,
    /// Relative-path strings the model infers the file depends on. May be
    /// empty; not required to resolve to real files.
    #[serde(default)]
    pub dependencies: Vec<String>,
}

/// Summarizes individual files against a chat model.
pub struct FileSummarizer {
    model: Arc<dyn ChatModel>,
    max_file_chars: usize,
}

impl FileSummarizer {
    pub fn new(model: Arc<dyn ChatModel>, max_file_chars: usize) -> Self {
        Self {
            model,
            max_file_chars,
        }
    }

    /// Produce a summary document for one file, or `None` when the file is
    /// unreadable or empty (silently excluded, not an error entry).
    pub async fn summarize_file(&self, root: &Path, rel_path: &str) -> Option<SummaryDocument> {
        let full_path = root.join(rel_path);

        let bytes = match std::fs::read(&full_path) {
            Ok(bytes) => bytes,
            Err(e) => {
                warn!(file = rel_path, error = ?e, "Failed to read file, skipping");
                return None;
            }
        };
        // Best-effort decode; invalid bytes are replaced, never fatal.
        let content = String::from_utf8_lossy(&bytes).into_owned();

        if content.trim().is_empty() {
            debug!(file = rel_path, "Skipping empty file");
            return None;
        }

        let (content, truncated) = truncate_chars(&content, self.max_file_chars);

        let file_type = Path::new(rel_path)
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("text")
            .to_ascii_lowercase();

        let imports = detect_imports(rel_path, &content);
        let imports_str = if imports.is_empty() {
            "None found".to_string()
        } else {
            imports
                .iter()
                .take(10)
                .cloned()
                .collect::<Vec<_>>()
                .join(", ")
        };

        let prompt = build_prompt(rel_path, &file_type, truncated, &content, &imports_str);

        match self.model.complete(&prompt).await {
            Ok(response) => {
                let (summary, dependencies) = parse_model_response(rel_path, &response);
                Some(SummaryDocument {
                    file: rel_path.to_string(),
                    summary,
                    dependencies,
                })
            }
            Err(e) => {
                // The file is kept even when the model call fails.
                error!(file = rel_path, error = %e, "Model call failed");
                Some(SummaryDocument {
                    file: rel_path.to_string(),
                    summary: format!("Error processing file: {e}"),
                    dependencies: Vec::new(),
                })
            }
        }
    }
}

/// Cut `content` at `max_chars` characters, appending a visible marker.
fn truncate_chars(content: &str, max_chars: usize) -> (String, bool) {
    match content.char_indices().nth(max_chars) {
        Some((byte_idx, _)) => {
            let mut cut = content[..byte_idx].to_string();
            cut.push_str(TRUNCATION_MARKER);
            (cut, true)
        }
        None => (content.to_string(), false),
    }
}

fn build_prompt(
    rel_path: &str,
    file_type: &str,
    truncated: bool,
    content: &str,
    imports_str: &str,
) -> String {
    let truncation_note = if truncated {
        "Note: File content was truncated due to length\n"
    } else {
        ""
    };
    format!(
        "Analyze the following code file and return ONLY a valid JSON object \
         (no markdown, no code blocks, no explanations).\n\
         \n\
         File: {rel_path}\n\
         File Type: {file_type}\n\
         {truncation_note}\
         \n\
         Code:\n\
         ```{file_type}\n\
         {content}\n\
         ```\n\
         \n\
         Detected import statements (for reference): {imports_str}\n\
         \n\
         Return a JSON object with this exact structure:\n\
         {{\n\
           \"summary\": \"A clear 2-4 sentence description of what this file does, its purpose, and key components\",\n\
           \"dependencies\": [\"relative/path/to/file1.py\", \"relative/path/to/file2.js\"]\n\
         }}\n\
         \n\
         For the dependencies array: list only internal files of this repository \
         that this file imports or references, as paths relative to the repository \
         root. Do not include external packages or standard library modules. \
         Return ONLY the JSON object, nothing else."
    )
}

/// Apply the response-handling ladder: sentinel on empty, strip code fences,
/// JSON extraction with coercion, raw-text fallback on parse failure.
fn parse_model_response(rel_path: &str, response: &str) -> (String, Vec<String>) {
    let trimmed = response.trim();
    if trimmed.is_empty() {
        warn!(file = rel_path, "Empty response from model");
        return (EMPTY_RESPONSE_SUMMARY.to_string(), Vec::new());
    }

    let unfenced = strip_code_fences(trimmed);

    match serde_json::from_str::<serde_json::Value>(&unfenced) {
        Ok(parsed) => {
            let summary = match parsed.get("summary").and_then(|s| s.as_str()) {
                Some(s) if !s.trim().is_empty() => s.to_string(),
                _ => MISSING_SUMMARY.to_string(),
            };
            // Non-list dependencies are coerced to an empty list.
            let dependencies = parsed
                .get("dependencies")
                .and_then(|d| d.as_array())
                .map(|items| {
                    items
                        .iter()
                        .filter_map(|v| v.as_str().map(str::to_string))
                        .collect()
                })
                .unwrap_or_default();
            (summary, dependencies)
        }
        Err(e) => {
            // Never lose the file: the raw text becomes the summary.
            debug!(file = rel_path, error = %e, "Model response was not valid JSON, using raw text");
            (unfenced, Vec::new())
        }
    }
}

/// Remove leading/trailing markdown code-fence markers if present.
fn strip_code_fences(text: &str) -> String {
    if !text.starts_with("```") {
        return text.to_string();
    }
    let open = Regex::new(r"^```(?:json)?\s*").expect("static regex");
    let close = Regex::new(r"```\s*$").expect("static regex");
    let stripped = open.replace(text, "");
    let stripped = close.replace(&stripped, "");
    stripped.trim().to_string()
}

/// Best-effort static import detection, language-aware for two families:
/// indentation-style imports (Python) and brace-style imports (JS/TS).
///
/// Only supplies hint text for the prompt; never determines the final
/// `dependencies` value.
fn detect_imports(rel_path: &str, content: &str) -> Vec<String> {
    let ext = Path::new(rel_path)
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("");
    let base_dir = Path::new(rel_path)
        .parent()
        .map(|p| p.to_string_lossy().into_owned())
        .unwrap_or_default();

    let mut imports = Vec::new();
    match ext {
        "py" => {
            let pattern = Regex::new(r"(?m)^(?:from\s+([.\w]+)\s+)?import\s+([\w\s,]+)")
                .expect("static regex");
            for caps in pattern.captures_iter(content) {
                let module = caps
                    .get(1)
                    .map(|m| m.as_str().to_string())
                    .unwrap_or_else(|| {
                        caps.get(2)
                            .map(|m| m.as_str().split(',').next().unwrap_or("").trim().to_string())
                            .unwrap_or_default()
                    });
                // Only relative imports can resolve to repository files.
                if module.starts_with('.') {
                    let module_path = module.replace('.', "/");
                    let module_path = module_path.trim_start_matches('/');
                    if module_path.is_empty() {
                        continue;
                    }
                    if base_dir.is_empty() {
                        imports.push(format!("{module_path}.py"));
                    } else {
                        imports.push(format!("{base_dir}/{module_path}.py"));
                    }
                }
            }
        }
        "js" | "jsx" | "ts" | "tsx" => {
            let pattern = Regex::new(r#"import\s+.*?from\s+["']([./\w-]+)["']"#)
                .expect("static regex");
            for caps in pattern.captures_iter(content) {
                let target = caps.get(1).map(|m| m.as_str()).unwrap_or("");
                if !target.starts_with('.') {
                    continue;
                }
                let resolved = normalize_relative(&base_dir, target);
                let has_ext = [".js", ".ts", ".jsx", ".tsx"]
                    .iter()
                    .any(|e| resolved.ends_with(e));
                if has_ext {
                    imports.push(resolved);
                } else {
                    for e in [".ts", ".tsx", ".js", ".jsx"] {
                        imports.push(format!("{resolved}{e}"));
                    }
                }
            }
        }
        _ => {}
    }
    imports
}

/// Join `target` onto `base_dir` and collapse `.`/`..` segments.
fn normalize_relative(base_dir: &str, target: &str) -> String {
    let mut segments: Vec<&str> = if base_dir.is_empty() {
        Vec::new()
    } else {
        base_dir.split('/').collect()
    };
    for part in target.split('/') {
        match part {
            "" | "." => {}
            ".." => {
                segments.pop();
            }
            seg => segments.push(seg),
        }
    }
    segments.join("/")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truncation_appends_visible_marker() {
        let (cut, truncated) = truncate_chars("abcdef", 3);
        assert!(truncated);
        assert_eq!(cut, format!("abc{TRUNCATION_MARKER}"));

        let (kept, truncated) = truncate_chars("abc", 10);
        assert!(!truncated);
        assert_eq!(kept, "abc");
    }

    #[test]
    fn valid_json_response_is_extracted() {
        let (summary, deps) = parse_model_response(
            "app.py",
            r#"{"summary": "Prints hi.", "dependencies": ["util.py"]}"#,
        );
        assert_eq!(summary, "Prints hi.");
        assert_eq!(deps, vec!["util.py".to_string()]);
    }

    #[test]
    fn fenced_json_response_is_unwrapped() {
        let response = "```json\n{\"summary\": \"Fenced.\", \"dependencies\": []}\n```";
        let (summary, deps) = parse_model_response("app.py", response);
        assert_eq!(summary, "Fenced.");
        assert!(deps.is_empty());
    }

    #[test]
    fn non_json_response_becomes_summary_verbatim() {
        let (summary, deps) = parse_model_response("app.py", "This file prints hi.");
        assert_eq!(summary, "This file prints hi.");
        assert!(deps.is_empty());
    }

    #[test]
    fn empty_response_yields_sentinel() {
        let (summary, deps) = parse_model_response("app.py", "   \n ");
        assert_eq!(summary, EMPTY_RESPONSE_SUMMARY);
        assert!(deps.is_empty());
    }

    #[test]
    fn non_list_dependencies_are_coerced_to_empty() {
        let (summary, deps) = parse_model_response(
            "app.py",
            r#"{"summary": "Ok.", "dependencies": "util.py"}"#,
        );
        assert_eq!(summary, "Ok.");
        assert!(deps.is_empty());
    }

    #[test]
    fn missing_summary_falls_back_to_sentinel() {
        let (summary, _) = parse_model_response("app.py", r#"{"dependencies": []}"#);
        assert_eq!(summary, MISSING_SUMMARY);
    }

    #[test]
    fn python_relative_imports_are_detected() {
        let imports = detect_imports("pkg/module.py", "from .config import settings\n");
        assert_eq!(imports, vec!["pkg/config.py".to_string()]);
    }

    #[test]
    fn javascript_relative_imports_expand_extensions() {
        let imports = detect_imports(
            "src/index.js",
            "import { Button } from './components/Button'\n",
        );
        assert_eq!(imports.len(), 4);
        assert!(imports.contains(&"src/components/Button.ts".to_string()));
        assert!(imports.contains(&"src/components/Button.jsx".to_string()));
    }

    #[test]
    fn external_imports_are_ignored() {
        assert!(detect_imports("app.py", "import os\nimport flask\n").is_empty());
        assert!(detect_imports("index.ts", "import React from 'react'\n").is_empty());
    }
}
