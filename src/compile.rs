//! Artifact Compiler: deterministically renders the collected summaries into
//! one self-contained HTML document with a table of contents.
//!
//! Deterministic given `(documents, repo_url, generated_at)`: the generation
//! timestamp is injected by the caller so re-running with identical inputs
//! produces identical output.

use tracing::warn;

use crate::summarize::SummaryDocument;

/// Rendered final document: an ordered sequence of anchored sections plus a
/// table-of-contents index keyed by the same anchors. Immutable after
/// creation.
#[derive(Debug, Clone)]
pub struct CompiledArtifact {
    pub html: String,
    pub toc_entries: usize,
    pub sections: usize,
}

/// Render `documents` (in input order) into the final HTML page.
///
/// Documents whose summary is empty after trimming are skipped and do not
/// consume an anchor id: anchors are dense, sequential and 1-based. With no
/// renderable documents, one visible placeholder section and toc entry are
/// emitted instead of an empty body.
pub fn compile(documents: &[SummaryDocument], repo_url: &str, generated_at: &str) -> CompiledArtifact {
    let repo_name = display_name(repo_url);

    let mut toc_items = Vec::new();
    let mut sections = Vec::new();

    for doc in documents {
        if doc.summary.trim().is_empty() {
            warn!(file = %doc.file, "Skipping document with empty summary");
            continue;
        }
        let anchor_id = format!("doc-{}", sections.len() + 1);
        let file = escape_html(&doc.file);
        let summary = escape_html(doc.summary.trim());

        toc_items.push(format!(
            r##"<li><a href="#{anchor_id}">{file}</a></li>"##
        ));
        sections.push(format!(
            "<section id=\"{anchor_id}\" class=\"doc-section\">\n\
             <h2>{file}</h2>\n\
             <div class=\"doc-content\"><p>{summary}</p></div>\n\
             </section>"
        ));
    }

    if sections.is_empty() {
        warn!("No documents to compile, emitting placeholder section");
        toc_items.push(
            r##"<li class="toc-placeholder">No files available</li>"##.to_string(),
        );
        sections.push(
            "<section class=\"doc-section\">\n\
             <h2>No Documentation Generated</h2>\n\
             <div class=\"doc-content\"><p>No files were successfully processed. \
             The repository may be empty, contain only excluded files, or all \
             files may have failed to process.</p></div>\n\
             </section>"
                .to_string(),
        );
    }

    let toc_entries = toc_items.len();
    let section_count = sections.len();
    let escaped_repo_name = escape_html(&repo_name);
    let escaped_repo_url = escape_html(repo_url);
    let escaped_generated_at = escape_html(generated_at);
    let toc_html = toc_items.join("\n");
    let sections_html = sections.join("\n");

    let html = format!(
        "<!DOCTYPE html>\n\
         <html lang=\"en\">\n\
         <head>\n\
         <meta charset=\"UTF-8\">\n\
         <meta name=\"viewport\" content=\"width=device-width, initial-scale=1.0\">\n\
         <title>{escaped_repo_name} - Documentation</title>\n\
         <script src=\"https://cdn.tailwindcss.com\"></script>\n\
         <style>\n\
         body {{ font-family: sans-serif; line-height: 1.6; }}\n\
         .sidebar {{ position: fixed; left: 0; top: 0; width: 280px; height: 100vh; overflow-y: auto; padding: 2rem 1rem; border-right: 1px solid #222; }}\n\
         .main-content {{ margin-left: 280px; padding: 2rem 4rem; max-width: 1200px; }}\n\
         .doc-section {{ margin-bottom: 3rem; padding-bottom: 2rem; border-bottom: 1px solid #222; }}\n\
         </style>\n\
         </head>\n\
         <body>\n\
         <div class=\"sidebar\">\n\
         <h1>Table of Contents</h1>\n\
         <ul>\n{toc_html}\n</ul>\n\
         </div>\n\
         <div class=\"main-content\">\n\
         <div class=\"header\">\n\
         <h1>{escaped_repo_name}</h1>\n\
         <p>Generated Documentation &bull; {escaped_generated_at}</p>\n\
         <p><a href=\"{escaped_repo_url}\" target=\"_blank\">View Repository</a></p>\n\
         </div>\n\
         {sections_html}\n\
         </div>\n\
         </body>\n\
         </html>"
    );

    CompiledArtifact {
        html,
        toc_entries,
        sections: section_count,
    }
}

/// Repository display name: last path segment of the URL, trailing `.git`
/// stripped; a generic placeholder when the URL is empty.
fn display_name(repo_url: &str) -> String {
    if repo_url.is_empty() {
        return "Repository".to_string();
    }
    let last = repo_url.rsplit('/').next().unwrap_or(repo_url);
    let name = last.strip_suffix(".git").unwrap_or(last);
    if name.is_empty() {
        "Repository".to_string()
    } else {
        name.to_string()
    }
}

/// Escape user-supplied text against markup injection.
fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#x27;"),
            other => escaped.push(other),
        }
    }
    escaped
}
