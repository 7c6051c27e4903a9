//! Logging and debugging facilities for Strata.
//!
//! This module provides:
//! - Target names for the `tracing` instrumentation emitted by each subsystem
//! - Debug visualization for hierarchical structures ([`TreeFormatter`])
//! - Performance tracing hooks ([`PerfSpan`])
//!
//! # Tracing Integration
//!
//! Strata uses the `tracing` crate for instrumentation. To see logs, install
//! a subscriber in your application:
//!
//! ```ignore
//! tracing_subscriber::fmt()
//!     .with_env_filter("strata::collection=debug")
//!     .init();
//! ```

use std::fmt::{self, Write as FmtWrite};

/// Target names for log filtering.
///
/// Use these with `tracing` directives to filter logs by subsystem.
pub mod targets {
    /// Signal/slot system target.
    pub const SIGNAL: &str = "strata_core::signal";
    /// Paged collection target (fetches, deferral, navigation).
    pub const COLLECTION: &str = "strata::collection";
    /// Hierarchical selection target.
    pub const SELECTION: &str = "strata::selection";
    /// Performance span target.
    pub const PERF: &str = "strata::perf";
}

/// Style options for tree visualization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TreeStyle {
    /// ASCII characters for tree branches.
    Ascii,
    /// Unicode box-drawing characters.
    #[default]
    Unicode,
    /// Indentation only, each node prefixed with `- `.
    Compact,
}

/// Configuration for tree debug output.
#[derive(Debug, Clone)]
pub struct TreeFormatOptions {
    /// The style of tree visualization.
    pub style: TreeStyle,
    /// Whether to append node IDs.
    pub show_ids: bool,
    /// Maximum depth to traverse (None for unlimited).
    pub max_depth: Option<usize>,
    /// Indent width for each level in [`TreeStyle::Compact`].
    pub indent_size: usize,
}

impl Default for TreeFormatOptions {
    fn default() -> Self {
        Self {
            style: TreeStyle::default(),
            show_ids: false,
            max_depth: None,
            indent_size: 2,
        }
    }
}

impl TreeFormatOptions {
    /// Options that include node IDs.
    pub fn detailed() -> Self {
        Self {
            show_ids: true,
            ..Default::default()
        }
    }

    /// Set the tree style.
    pub fn with_style(mut self, style: TreeStyle) -> Self {
        self.style = style;
        self
    }

    /// Limit the traversal depth.
    pub fn with_max_depth(mut self, depth: usize) -> Self {
        self.max_depth = Some(depth);
        self
    }
}

/// A hierarchical structure that can be rendered by [`TreeFormatter`].
pub trait TreeDebug {
    /// Handle used to address nodes.
    type NodeId: Copy + fmt::Debug;

    /// Top-level nodes, in order.
    fn debug_roots(&self) -> Vec<Self::NodeId>;

    /// Children of `id`, in order.
    fn debug_children(&self, id: Self::NodeId) -> Vec<Self::NodeId>;

    /// One-line label for `id`.
    fn debug_label(&self, id: Self::NodeId) -> String;
}

/// Renders any [`TreeDebug`] structure as indented text.
#[derive(Debug, Clone, Default)]
pub struct TreeFormatter {
    options: TreeFormatOptions,
}

impl TreeFormatter {
    /// Create a formatter with default options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a formatter with custom options.
    pub fn with_options(options: TreeFormatOptions) -> Self {
        Self { options }
    }

    /// Format the whole tree.
    pub fn format<T: TreeDebug + ?Sized>(&self, tree: &T) -> String {
        let mut output = String::new();
        self.write_tree(tree, &mut output)
            .expect("write to String");
        output
    }

    /// Write the whole tree into any `fmt::Write` sink.
    pub fn write_tree<T, W>(&self, tree: &T, output: &mut W) -> fmt::Result
    where
        T: TreeDebug + ?Sized,
        W: FmtWrite,
    {
        let roots = tree.debug_roots();
        if roots.is_empty() {
            return writeln!(output, "(empty)");
        }
        let mut trail = Vec::new();
        let count = roots.len();
        for (i, root) in roots.into_iter().enumerate() {
            self.write_subtree(tree, root, i + 1 == count, &mut trail, output)?;
        }
        Ok(())
    }

    fn write_subtree<T, W>(
        &self,
        tree: &T,
        id: T::NodeId,
        is_last: bool,
        trail: &mut Vec<bool>,
        output: &mut W,
    ) -> fmt::Result
    where
        T: TreeDebug + ?Sized,
        W: FmtWrite,
    {
        let depth = trail.len();
        if self.options.max_depth.is_some_and(|max| depth > max) {
            return Ok(());
        }

        output.write_str(&self.build_prefix(trail, is_last))?;
        output.write_str(&tree.debug_label(id))?;
        if self.options.show_ids {
            write!(output, " [{id:?}]")?;
        }
        output.write_char('\n')?;

        let children = tree.debug_children(id);
        let count = children.len();
        trail.push(is_last);
        for (i, child) in children.into_iter().enumerate() {
            self.write_subtree(tree, child, i + 1 == count, trail, output)?;
        }
        trail.pop();
        Ok(())
    }

    /// Build the prefix for a node; `trail` holds `is_last` for each ancestor.
    fn build_prefix(&self, trail: &[bool], is_last: bool) -> String {
        if trail.is_empty() {
            return String::new();
        }

        if self.options.style == TreeStyle::Compact {
            let mut prefix = " ".repeat(trail.len() * self.options.indent_size);
            prefix.push_str("- ");
            return prefix;
        }

        let (pipe, tee, corner) = match self.options.style {
            TreeStyle::Ascii => ("|   ", "+-- ", "`-- "),
            _ => ("\u{2502}   ", "\u{251c}\u{2500}\u{2500} ", "\u{2514}\u{2500}\u{2500} "),
        };

        // The root level never draws a connector column.
        let mut prefix = String::new();
        for &ancestor_last in &trail[1..] {
            prefix.push_str(if ancestor_last { "    " } else { pipe });
        }
        prefix.push_str(if is_last { corner } else { tee });
        prefix
    }
}

/// A guard that keeps a tracing span entered until dropped.
///
/// Used to time page fetches and other potentially slow operations.
#[derive(Debug)]
pub struct PerfSpan {
    #[allow(dead_code)]
    span: tracing::span::EnteredSpan,
}

impl PerfSpan {
    /// Create a new performance span.
    pub fn new(name: &'static str) -> Self {
        let span = tracing::info_span!(target: "strata::perf", "perf", operation = name);
        Self {
            span: span.entered(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Outline {
        labels: Vec<&'static str>,
        children: Vec<Vec<usize>>,
        roots: Vec<usize>,
    }

    impl TreeDebug for Outline {
        type NodeId = usize;

        fn debug_roots(&self) -> Vec<usize> {
            self.roots.clone()
        }

        fn debug_children(&self, id: usize) -> Vec<usize> {
            self.children[id].clone()
        }

        fn debug_label(&self, id: usize) -> String {
            self.labels[id].to_string()
        }
    }

    fn outline() -> Outline {
        // 0: root { 1: a { 3: a1 }, 2: b }
        Outline {
            labels: vec!["root", "a", "b", "a1"],
            children: vec![vec![1, 2], vec![3], vec![], vec![]],
            roots: vec![0],
        }
    }

    #[test]
    fn test_format_empty() {
        let tree = Outline {
            labels: vec![],
            children: vec![],
            roots: vec![],
        };
        assert_eq!(TreeFormatter::new().format(&tree), "(empty)\n");
    }

    #[test]
    fn test_format_ascii() {
        let formatter =
            TreeFormatter::with_options(TreeFormatOptions::default().with_style(TreeStyle::Ascii));
        let output = formatter.format(&outline());
        assert_eq!(output, "root\n+-- a\n|   `-- a1\n`-- b\n");
    }

    #[test]
    fn test_format_unicode_contains_labels() {
        let output = TreeFormatter::new().format(&outline());
        for label in ["root", "a", "a1", "b"] {
            assert!(output.contains(label));
        }
        assert!(output.contains('\u{2514}'));
    }

    #[test]
    fn test_format_max_depth() {
        let formatter = TreeFormatter::with_options(
            TreeFormatOptions::default()
                .with_style(TreeStyle::Compact)
                .with_max_depth(1),
        );
        let output = formatter.format(&outline());
        assert_eq!(output, "root\n  - a\n  - b\n");
    }

    #[test]
    fn test_format_with_ids() {
        let formatter = TreeFormatter::with_options(TreeFormatOptions::detailed());
        let output = formatter.format(&outline());
        assert!(output.starts_with("root [0]\n"));
    }

    #[test]
    fn test_perf_span() {
        let _span = PerfSpan::new("test_operation");
    }
}
