//! `@import` directive inspection for stylesheets

use regex::Regex;
use std::ops::Range;
use std::sync::LazyLock;

use super::{MultiLineCommentStripper, ProcessorError, ResourcePreProcessor};
use crate::model::Resource;

/// Candidate `@import` tokens; identifiers such as `@import-foo` are
/// rejected in `is_import_token`.
static IMPORT_TOKEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)@import").expect("Valid regex"));

/// A complete import statement, anchored at the `@import` token.
/// Groups 1-3 capture the `url(...)` forms, 4-5 the bare string forms.
static IMPORT_STATEMENT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#"(?i)^@import\s*(?:url\(\s*(?:"([^"]*)"|'([^']*)'|([^"'()\s]*))\s*\)|"([^"\n]*)"|'([^'\n]*)')[^;{}\n]*;?"#,
    )
    .expect("Valid regex")
});

#[derive(Debug, Clone, PartialEq, Eq)]
struct ImportStatement {
    span: Range<usize>,
    uri: String,
}

/// Finds the stylesheets imported by a css resource.
///
/// As a pre-processor it removes the import statements (and comments) from
/// the content; the imported resources are exposed through [`Self::imports`].
#[derive(Debug, Clone, Copy, Default)]
pub struct CssImportProcessor {
    stripper: MultiLineCommentStripper,
}

impl CssImportProcessor {
    pub const ALIAS: &'static str = "cssImport";

    pub fn new() -> Self {
        Self {
            stripper: MultiLineCommentStripper::new(),
        }
    }

    /// Resources imported by `resource`, in declaration order.
    ///
    /// Imported URIs are resolved against the importing resource and carry
    /// its type. Commented-out imports are ignored.
    pub fn imports(&self, resource: &Resource, content: &str) -> Result<Vec<Resource>, ProcessorError> {
        let content = self.stripper.strip(content);
        let statements = parse_statements(resource.uri(), &content)?;
        Ok(statements
            .into_iter()
            .map(|s| Resource::new(resolve_import(resource.uri(), &s.uri), resource.resource_type()))
            .collect())
    }
}

impl ResourcePreProcessor for CssImportProcessor {
    fn pre_process(&self, resource: &Resource, content: &str) -> Result<String, ProcessorError> {
        let content = self.stripper.strip(content);
        let statements = parse_statements(resource.uri(), &content)?;

        let mut output = String::with_capacity(content.len());
        let mut cursor = 0;
        for statement in &statements {
            output.push_str(&content[cursor..statement.span.start]);
            cursor = statement.span.end;
        }
        output.push_str(&content[cursor..]);

        Ok(output)
    }
}

/// Import statements of `content`, in order.
///
/// Tokens that do not start a well-formed directive (inside a string, an
/// unrelated at-rule) are skipped. Only an import naming an empty uri is
/// an error.
fn parse_statements(uri: &str, content: &str) -> Result<Vec<ImportStatement>, ProcessorError> {
    let mut statements = Vec::new();

    for token in IMPORT_TOKEN.find_iter(content) {
        if !is_import_token(content, token.start(), token.end()) {
            continue;
        }

        let rest = &content[token.start()..];
        let Some(captures) = IMPORT_STATEMENT.captures(rest) else {
            tracing::debug!(uri = %uri, offset = token.start(), "Skipping unparsable @import");
            continue;
        };

        let imported = (1..=5)
            .find_map(|i| captures.get(i))
            .map(|m| m.as_str().trim())
            .unwrap_or_default();

        if imported.is_empty() {
            return Err(malformed(uri, token.start(), "empty import uri"));
        }

        let whole = captures.get(0).map(|m| m.end()).unwrap_or_default();
        statements.push(ImportStatement {
            span: token.start()..token.start() + whole,
            uri: imported.to_string(),
        });
    }

    Ok(statements)
}

/// `@import` standing on its own: not quoted, not part of a longer identifier
fn is_import_token(content: &str, start: usize, end: usize) -> bool {
    let quoted = content[..start].ends_with(['"', '\'']);
    let continued = content[end..]
        .chars()
        .next()
        .is_some_and(|c| c.is_alphanumeric() || c == '_' || c == '-');
    !quoted && !continued
}

fn malformed(uri: &str, offset: usize, message: &str) -> ProcessorError {
    ProcessorError::Malformed {
        uri: uri.to_string(),
        message: format!("invalid @import at byte {}: {}", offset, message),
    }
}

/// Resolve an imported URI against the URI of the stylesheet importing it.
///
/// Absolute URIs (with a scheme, or starting with `/`) are returned as-is;
/// relative ones are joined to the directory of `parent_uri` and normalized.
pub fn resolve_import(parent_uri: &str, import: &str) -> String {
    if has_scheme(import) || import.starts_with('/') {
        return import.to_string();
    }

    let base = match parent_uri.rfind('/') {
        Some(idx) => &parent_uri[..=idx],
        None => match scheme_prefix_len(parent_uri) {
            Some(len) => &parent_uri[..len],
            None => "",
        },
    };

    normalize(&format!("{}{}", base, import))
}

fn has_scheme(uri: &str) -> bool {
    scheme_prefix_len(uri).is_some()
}

/// Length of a `scheme:` prefix (a single letter is treated as a drive, not a scheme)
fn scheme_prefix_len(uri: &str) -> Option<usize> {
    let colon = uri.find(':')?;
    let scheme = &uri[..colon];
    let valid = scheme.len() > 1
        && scheme.starts_with(|c: char| c.is_ascii_alphabetic())
        && scheme
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'));
    valid.then_some(colon + 1)
}

/// Collapse `.` and `..` segments, keeping any scheme and authority intact
fn normalize(uri: &str) -> String {
    let (prefix, path) = split_authority(uri);

    let absolute = path.starts_with('/');
    let mut segments: Vec<&str> = Vec::new();
    for segment in path.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                if matches!(segments.last(), Some(last) if *last != "..") {
                    segments.pop();
                } else if !absolute {
                    segments.push("..");
                }
            }
            other => segments.push(other),
        }
    }

    let mut normalized = String::from(prefix);
    if absolute {
        normalized.push('/');
    }
    normalized.push_str(&segments.join("/"));
    normalized
}

fn split_authority(uri: &str) -> (&str, &str) {
    if let Some(idx) = uri.find("://") {
        let after = idx + 3;
        let path_start = uri[after..].find('/').map(|i| after + i).unwrap_or(uri.len());
        return uri.split_at(path_start);
    }
    match scheme_prefix_len(uri) {
        Some(len) => uri.split_at(len),
        None => ("", uri),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ResourceType;

    fn css(uri: &str) -> Resource {
        Resource::new(uri, ResourceType::Css)
    }

    fn uris(resources: &[Resource]) -> Vec<&str> {
        resources.iter().map(|r| r.uri()).collect()
    }

    #[test]
    fn test_detects_all_import_forms() {
        let content = r#"
@import url("a.css");
@import url('b.css') screen;
@import url(c.css);
@import "d.css";
@import 'e.css' print;
body { color: red; }
"#;
        let imports = CssImportProcessor::new()
            .imports(&css("/css/main.css"), content)
            .unwrap();

        assert_eq!(
            uris(&imports),
            vec!["/css/a.css", "/css/b.css", "/css/c.css", "/css/d.css", "/css/e.css"]
        );
        assert!(imports.iter().all(|r| r.resource_type() == ResourceType::Css));
    }

    #[test]
    fn test_ignores_commented_imports() {
        let content = "/* @import url(old.css); */\n@import url(new.css);";
        let imports = CssImportProcessor::new()
            .imports(&css("main.css"), content)
            .unwrap();

        assert_eq!(uris(&imports), vec!["new.css"]);
    }

    #[test]
    fn test_no_imports() {
        let imports = CssImportProcessor::new()
            .imports(&css("main.css"), "body { margin: 0 }")
            .unwrap();
        assert!(imports.is_empty());
    }

    #[test]
    fn test_empty_import_uri_is_an_error() {
        let result = CssImportProcessor::new().imports(&css("main.css"), "@import url(\"\");");
        assert!(matches!(result, Err(ProcessorError::Malformed { .. })));
    }

    #[test]
    fn test_stray_import_tokens_are_skipped() {
        let content = "@import \"b.css\";\n.x::before { content: \"@import\"; }\n@import-ish: 1;\n@import ;\n@import 'c.css';";
        let imports = CssImportProcessor::new()
            .imports(&css("a.css"), content)
            .unwrap();

        assert_eq!(uris(&imports), vec!["b.css", "c.css"]);
    }

    #[test]
    fn test_pre_process_removes_import_statements() {
        let content = "@import url(a.css);\nbody { color: red; }\n";
        let output = CssImportProcessor::new()
            .pre_process(&css("main.css"), content)
            .unwrap();

        assert_eq!(output.trim(), "body { color: red; }");
    }

    #[test]
    fn test_resolve_relative_imports() {
        assert_eq!(resolve_import("/css/main.css", "a.css"), "/css/a.css");
        assert_eq!(resolve_import("/css/main.css", "../shared/b.css"), "/shared/b.css");
        assert_eq!(resolve_import("/css/main.css", "./c.css"), "/css/c.css");
        assert_eq!(resolve_import("css/main.css", "../../x.css"), "../x.css");
        assert_eq!(resolve_import("main.css", "a.css"), "a.css");
    }

    #[test]
    fn test_resolve_keeps_absolute_imports() {
        assert_eq!(resolve_import("/css/main.css", "/root.css"), "/root.css");
        assert_eq!(
            resolve_import("/css/main.css", "http://cdn.example.com/x.css"),
            "http://cdn.example.com/x.css"
        );
    }

    #[test]
    fn test_resolve_against_url_parent() {
        assert_eq!(
            resolve_import("http://cdn.example.com/css/main.css", "../img/a.css"),
            "http://cdn.example.com/img/a.css"
        );
        assert_eq!(
            resolve_import("file:styles/main.css", "a.css"),
            "file:styles/a.css"
        );
    }
}
