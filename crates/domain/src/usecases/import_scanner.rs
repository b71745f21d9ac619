//! Recursive change detection across stylesheet import graphs

use futures::FutureExt;
use futures::future::BoxFuture;
use std::collections::HashSet;

use crate::model::{Change, Resource};
use crate::ports::UriLocator;
use crate::processors::CssImportProcessor;
use crate::usecases::change_detector::{Observation, PendingFingerprint, ResourceChangeDetector};
use crate::usecases::fail_open::{ScanError, fail_open};

/// State of one top-level check: the URIs evaluated so far, and the
/// uncommitted fingerprint of the change that ended the check.
#[derive(Debug, Default)]
pub struct ScanState {
    visited: HashSet<String>,
    pending: Option<PendingFingerprint>,
}

impl ScanState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_visited(&self, uri: &str) -> bool {
        self.visited.contains(uri)
    }

    /// Fingerprint of the detected change, to be committed by the caller
    pub fn take_pending(&mut self) -> Option<PendingFingerprint> {
        self.pending.take()
    }
}

/// Whether `resource`, or any stylesheet it transitively imports, changed
/// for `group`.
///
/// A resource already visited contributes no change, which is what makes
/// cyclic imports terminate. Evaluation stops at the first change, whose
/// new digest is left in `state` rather than recorded. Retrieval and parse
/// failures are treated as "unchanged".
pub fn is_changed<'a, L>(
    detector: &'a ResourceChangeDetector<L>,
    resource: &'a Resource,
    group: &'a str,
    state: &'a mut ScanState,
) -> BoxFuture<'a, Change>
where
    L: UriLocator + ?Sized,
{
    async move {
        if !state.visited.insert(resource.uri().to_string()) {
            tracing::debug!(uri = %resource.uri(), "Already visited");
            return Change::Unchanged;
        }

        tracing::debug!(uri = %resource.uri(), group = %group, "Checking resource for changes");

        match detector.observe(resource.uri(), group).await {
            Ok(Observation::Changed(pending)) => {
                state.pending = Some(pending);
                return Change::Changed;
            }
            Ok(Observation::Unchanged) => {}
            Err(e) => {
                tracing::debug!(
                    resource = %resource,
                    error = %e,
                    "Cannot check resource, assuming it is unchanged"
                );
                return Change::Unchanged;
            }
        }

        if !resource.is_css() {
            return Change::Unchanged;
        }

        let imports = imports_changed(detector, resource, group, state).await;
        fail_open(resource, imports)
    }
    .boxed()
}

async fn imports_changed<L>(
    detector: &ResourceChangeDetector<L>,
    resource: &Resource,
    group: &str,
    state: &mut ScanState,
) -> Result<Change, ScanError>
where
    L: UriLocator + ?Sized,
{
    let content = detector.content(resource.uri()).await?;
    let text = String::from_utf8_lossy(&content).into_owned();
    let imports = CssImportProcessor::new().imports(resource, &text)?;

    for import in &imports {
        tracing::debug!(parent = %resource.uri(), import = %import.uri(), "Found @import");
        if is_changed(detector, import, group, state).await.is_changed() {
            tracing::debug!(import = %import.uri(), "Import changed");
            return Ok(Change::Changed);
        }
    }

    Ok(Change::Unchanged)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ResourceType;
    use crate::usecases::change_detector::tests::FakeLocator;
    use std::sync::Arc;

    fn css(uri: &str) -> Resource {
        Resource::new(uri, ResourceType::Css)
    }

    async fn scan(
        detector: &ResourceChangeDetector<FakeLocator>,
        resource: &Resource,
    ) -> Change {
        let mut state = ScanState::new();
        let change = is_changed(detector, resource, "main", &mut state).await;
        if let Some(pending) = state.take_pending() {
            detector.commit(pending);
        }
        detector.reset_cycle();
        change
    }

    #[tokio::test]
    async fn test_changed_import_marks_parent_changed() {
        let locator = Arc::new(FakeLocator::with(&[
            ("a.css", "@import url(b.css);\na { }"),
            ("b.css", "b { }"),
        ]));
        let detector = ResourceChangeDetector::new(Arc::clone(&locator));
        let a = css("a.css");

        assert_eq!(scan(&detector, &a).await, Change::Unchanged);

        locator.set("b.css", "b { color: blue }");

        // a.css's own bytes are unchanged
        assert!(!detector.check_changed("a.css", "main").await.unwrap());
        detector.reset_cycle();

        assert_eq!(scan(&detector, &a).await, Change::Changed);
    }

    #[tokio::test]
    async fn test_cyclic_imports_terminate_unchanged() {
        let locator = Arc::new(FakeLocator::with(&[
            ("a.css", "@import 'b.css';"),
            ("b.css", "@import 'a.css';"),
        ]));
        let detector = ResourceChangeDetector::new(Arc::clone(&locator));
        let a = css("a.css");

        assert_eq!(scan(&detector, &a).await, Change::Unchanged);
        assert_eq!(scan(&detector, &a).await, Change::Unchanged);
    }

    #[tokio::test]
    async fn test_self_import_terminates() {
        let locator = Arc::new(FakeLocator::with(&[("a.css", "@import 'a.css';")]));
        let detector = ResourceChangeDetector::new(Arc::clone(&locator));

        assert_eq!(scan(&detector, &css("a.css")).await, Change::Unchanged);
    }

    #[tokio::test]
    async fn test_missing_import_is_unchanged() {
        let locator = Arc::new(FakeLocator::with(&[(
            "a.css",
            "@import url(missing.css);\na { }",
        )]));
        let detector = ResourceChangeDetector::new(Arc::clone(&locator));
        let a = css("a.css");

        assert_eq!(scan(&detector, &a).await, Change::Unchanged);
        assert_eq!(scan(&detector, &a).await, Change::Unchanged);
    }

    #[tokio::test]
    async fn test_malformed_import_is_unchanged() {
        let locator = Arc::new(FakeLocator::with(&[("a.css", "@import url(\"\");")]));
        let detector = ResourceChangeDetector::new(Arc::clone(&locator));

        assert_eq!(scan(&detector, &css("a.css")).await, Change::Unchanged);
    }

    #[tokio::test]
    async fn test_stops_at_first_changed_import() {
        let locator = Arc::new(FakeLocator::with(&[
            ("a.css", "@import 'b.css';\n@import 'c.css';"),
            ("b.css", "b { }"),
            ("c.css", "c { }"),
        ]));
        let detector = ResourceChangeDetector::new(Arc::clone(&locator));
        let a = css("a.css");

        scan(&detector, &a).await;
        locator.clear_fetches();
        locator.set("b.css", "b { color: red }");

        assert_eq!(scan(&detector, &a).await, Change::Changed);
        assert_eq!(locator.fetches(), vec!["a.css", "b.css"]);
    }

    #[tokio::test]
    async fn test_nested_import_change_propagates() {
        let locator = Arc::new(FakeLocator::with(&[
            ("css/a.css", "@import url(\"nested/b.css\");"),
            ("css/nested/b.css", "@import url(\"../c.css\");"),
            ("css/c.css", "c { }"),
        ]));
        let detector = ResourceChangeDetector::new(Arc::clone(&locator));
        let a = css("css/a.css");

        assert_eq!(scan(&detector, &a).await, Change::Unchanged);
        locator.set("css/c.css", "c { margin: 0 }");
        assert_eq!(scan(&detector, &a).await, Change::Changed);
    }

    #[tokio::test]
    async fn test_non_css_resources_are_not_scanned() {
        let locator = Arc::new(FakeLocator::with(&[
            ("app.js", "// @import url(x.css);"),
            ("x.css", "x { }"),
        ]));
        let detector = ResourceChangeDetector::new(Arc::clone(&locator));
        let js = Resource::new("app.js", ResourceType::Js);

        assert_eq!(scan(&detector, &js).await, Change::Unchanged);
        assert_eq!(locator.fetches(), vec!["app.js"]);
    }

    #[tokio::test]
    async fn test_quoted_import_token_does_not_hide_changes() {
        let locator = Arc::new(FakeLocator::with(&[
            ("a.css", "@import 'b.css';\n.x::before { content: \"@import\"; }"),
            ("b.css", "b { }"),
        ]));
        let detector = ResourceChangeDetector::new(Arc::clone(&locator));
        let a = css("a.css");

        assert_eq!(scan(&detector, &a).await, Change::Unchanged);
        locator.set("b.css", "b { color: blue }");
        assert_eq!(scan(&detector, &a).await, Change::Changed);
    }

    #[tokio::test]
    async fn test_change_is_left_pending() {
        let locator = Arc::new(FakeLocator::with(&[
            ("a.css", "@import 'b.css';"),
            ("b.css", "b { }"),
        ]));
        let detector = ResourceChangeDetector::new(Arc::clone(&locator));
        let a = css("a.css");

        scan(&detector, &a).await;
        locator.set("b.css", "b { color: blue }");

        let mut state = ScanState::new();
        assert!(is_changed(&detector, &a, "main", &mut state).await.is_changed());
        assert!(state.is_visited("b.css"));
        detector.reset_cycle();

        let pending = state.take_pending().unwrap();
        assert_eq!(pending.uri(), "b.css");
        assert_eq!(pending.group(), "main");

        // nothing was recorded, so the change is still visible
        assert_eq!(scan(&detector, &a).await, Change::Changed);
        assert_eq!(scan(&detector, &a).await, Change::Unchanged);
    }
}
