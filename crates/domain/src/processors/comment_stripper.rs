//! Multi-line comment stripper

use regex::Regex;
use std::sync::LazyLock;

use super::{ProcessorError, ResourcePostProcessor, ResourcePreProcessor};
use crate::model::Resource;

/// `/* ... */` comments, with leading indentation and one trailing newline
static COMMENT_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)[\t ]*/\*.*?\*/[\r\n]?").expect("Valid regex"));

static EMPTY_LINE_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^[\t ]*\r?\n").expect("Valid regex"));

/// Removes multi-line comments and the blank lines left behind
#[derive(Debug, Clone, Copy, Default)]
pub struct MultiLineCommentStripper;

impl MultiLineCommentStripper {
    pub const ALIAS: &'static str = "multilineStripper";

    pub fn new() -> Self {
        Self
    }

    pub fn strip(&self, content: &str) -> String {
        let without_comments = COMMENT_PATTERN.replace_all(content, "");
        EMPTY_LINE_PATTERN
            .replace_all(&without_comments, "")
            .into_owned()
    }
}

impl ResourcePreProcessor for MultiLineCommentStripper {
    fn pre_process(&self, _resource: &Resource, content: &str) -> Result<String, ProcessorError> {
        Ok(self.strip(content))
    }
}

impl ResourcePostProcessor for MultiLineCommentStripper {
    fn post_process(&self, content: &str) -> Result<String, ProcessorError> {
        Ok(self.strip(content))
    }
}
