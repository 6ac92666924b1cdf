//! Recovery of line comments from a YAML document's concrete syntax tree.
//!
//! `serde_yaml` discards comments, so the comment trailing a step's
//! `uses:` line is recovered separately by re-parsing the source with
//! tree-sitter and walking a route of keys and indices down to the
//! `uses:` value.

use std::collections::BTreeMap;

use tree_sitter::{Language, Node, Parser, Tree};

/// A single step in a route through a YAML document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Component<'a> {
    Key(&'a str),
    Index(usize),
}

/// A YAML document's syntax tree, plus its comments indexed by line.
pub(crate) struct Document<'src> {
    source: &'src str,
    tree: Tree,
    /// Line number → (start byte, comment text sans `#`).
    comments: BTreeMap<usize, (usize, &'src str)>,
}

impl<'src> Document<'src> {
    /// Parses `source` into a document, or returns `None` if tree-sitter
    /// can't produce a clean tree for it.
    pub(crate) fn parse(source: &'src str) -> Option<Self> {
        let mut parser = Parser::new();
        let language: Language = tree_sitter_yaml::LANGUAGE.into();
        if let Err(e) = parser.set_language(&language) {
            tracing::debug!("couldn't load the YAML grammar: {e}");
            return None;
        }

        let tree = parser.parse(source, None)?;
        if tree.root_node().has_error() {
            tracing::debug!("YAML syntax tree has errors, skipping comment capture");
            return None;
        }

        let mut comments = BTreeMap::new();
        collect_comments(source, tree.root_node(), &mut comments);

        Some(Self {
            source,
            tree,
            comments,
        })
    }

    /// Returns the trimmed text of the comment on the same line as,
    /// and after, the value at `route`.
    pub(crate) fn trailing_comment(&self, route: &[Component]) -> Option<&'src str> {
        let node = self.query(route)?;
        let end = node.end_position();

        match self.comments.get(&end.row) {
            Some((start_byte, text)) if *start_byte >= node.end_byte() => Some(text.trim()),
            _ => None,
        }
    }

    fn query(&self, route: &[Component]) -> Option<Node<'_>> {
        // stream → document → top-level block_node / flow_node
        let stream = self.tree.root_node();
        let mut cur = stream.walk();
        let document = stream
            .named_children(&mut cur)
            .find(|n| n.kind() == "document")?;
        let mut focus = document
            .named_children(&mut cur)
            .find(|n| matches!(n.kind(), "block_node" | "flow_node"))?;

        for component in route {
            focus = self.descend(focus, *component)?;
        }

        Some(focus)
    }

    fn descend<'t>(&self, node: Node<'t>, component: Component) -> Option<Node<'t>> {
        // The interesting child of a block_node / flow_node sits after
        // any anchor or tag.
        let mut cur = node.walk();
        let inner = node
            .named_children(&mut cur)
            .find(|n| !matches!(n.kind(), "anchor" | "tag" | "comment"))?;

        match (inner.kind(), component) {
            ("block_mapping" | "flow_mapping", Component::Key(key)) => {
                let mut cur = inner.walk();
                inner
                    .named_children(&mut cur)
                    .filter(|n| matches!(n.kind(), "block_mapping_pair" | "flow_pair"))
                    .find(|pair| {
                        pair.child_by_field_name("key")
                            .is_some_and(|k| self.key_text(k) == key)
                    })?
                    .child_by_field_name("value")
            }
            ("block_sequence", Component::Index(idx)) => {
                let mut cur = inner.walk();
                let item = inner
                    .named_children(&mut cur)
                    .filter(|n| n.kind() == "block_sequence_item")
                    .nth(idx)?;

                let mut cur = item.walk();
                item.named_children(&mut cur)
                    .find(|n| matches!(n.kind(), "block_node" | "flow_node"))
            }
            ("flow_sequence", Component::Index(idx)) => {
                let mut cur = inner.walk();
                inner
                    .named_children(&mut cur)
                    .filter(|n| n.kind() == "flow_node")
                    .nth(idx)
            }
            _ => None,
        }
    }

    /// Returns a mapping key's text, with any anchor skipped and quotes
    /// removed.
    fn key_text(&self, key: Node) -> &'src str {
        let mut cur = key.walk();
        let scalar = key
            .named_children(&mut cur)
            .find(|n| n.kind() != "anchor")
            .unwrap_or(key);

        let text = &self.source[scalar.byte_range()];
        match scalar.kind() {
            "single_quote_scalar" | "double_quote_scalar" => {
                let mut chars = text.chars();
                chars.next();
                chars.next_back();
                chars.as_str()
            }
            _ => text,
        }
    }
}

fn collect_comments<'src>(
    source: &'src str,
    node: Node,
    comments: &mut BTreeMap<usize, (usize, &'src str)>,
) {
    if node.kind() == "comment" {
        let text = &source[node.byte_range()];
        comments.insert(
            node.start_position().row,
            (node.start_byte(), text.strip_prefix('#').unwrap_or(text)),
        );
        return;
    }

    let mut cur = node.walk();
    for child in node.children(&mut cur) {
        collect_comments(source, child, comments);
    }
}
