//! Parse tree (spec §4.8.4 / C8): an arena of nodes, each either a token leaf
//! or a production's list of children, plus a parallel `values` slot an
//! analyzer can fill in while walking the tree.

use crate::production::ProductionId;
use crate::token_pattern::TokenId;
use crate::util::Position;
use std::borrow::Cow;
use std::io::Write;

pub type NodeId = usize;

#[derive(Debug, Clone)]
enum NodeData {
    Token {
        pattern_id: TokenId,
        name: String,
        image: String,
        start: Position,
        end: Position,
        /// A zero-width placeholder standing in for a required token the
        /// parser never found (spec §4.8.3): no image, `start == end`, kept
        /// in the tree rather than discarding the subtree around it.
        hole: bool,
    },
    Production {
        pattern_id: ProductionId,
        name: String,
        children: Vec<NodeId>,
        hidden: bool,
    },
}

/// Arena-based parse tree. `V` is the semantic value an analyzer attaches to
/// each node post-parse (e.g. an evaluated number, a resolved symbol); it
/// starts out empty for every node.
pub struct ParseTree<V> {
    nodes: Vec<NodeData>,
    parents: Vec<Option<NodeId>>,
    values: Vec<Vec<V>>,
    root: NodeId,
}

impl<V> ParseTree<V> {
    pub(crate) fn new() -> TreeBuilder<V> {
        TreeBuilder {
            nodes: Vec::new(),
            parents: Vec::new(),
            values: Vec::new(),
        }
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.parents[id]
    }

    pub fn is_token(&self, id: NodeId) -> bool {
        matches!(self.nodes[id], NodeData::Token { .. })
    }

    pub fn token_pattern_id(&self, id: NodeId) -> Option<TokenId> {
        match &self.nodes[id] {
            NodeData::Token { pattern_id, .. } => Some(*pattern_id),
            NodeData::Production { .. } => None,
        }
    }

    pub fn production_pattern_id(&self, id: NodeId) -> Option<ProductionId> {
        match &self.nodes[id] {
            NodeData::Production { pattern_id, .. } => Some(*pattern_id),
            NodeData::Token { .. } => None,
        }
    }

    pub fn name(&self, id: NodeId) -> &str {
        match &self.nodes[id] {
            NodeData::Token { name, .. } => name,
            NodeData::Production { name, .. } => name,
        }
    }

    pub fn image(&self, id: NodeId) -> Option<&str> {
        match &self.nodes[id] {
            NodeData::Token { image, .. } => Some(image),
            NodeData::Production { .. } => None,
        }
    }

    /// Whether this node is a hole: a required token the parser never found,
    /// synthesized so the rest of the tree around it survives (spec §4.8.3).
    pub fn is_hole(&self, id: NodeId) -> bool {
        matches!(self.nodes[id], NodeData::Token { hole: true, .. })
    }

    pub fn start(&self, id: NodeId) -> Position {
        match &self.nodes[id] {
            NodeData::Token { start, .. } => *start,
            NodeData::Production { children, .. } => children
                .first()
                .map(|&c| self.start(c))
                .unwrap_or(Position::START),
        }
    }

    pub fn end(&self, id: NodeId) -> Position {
        match &self.nodes[id] {
            NodeData::Token { end, .. } => *end,
            NodeData::Production { children, .. } => children
                .last()
                .map(|&c| self.end(c))
                .unwrap_or(Position::START),
        }
    }

    /// A node's children, with any hidden (synthetic) production child
    /// spliced out in favor of its own children, recursively (spec §3): a
    /// hidden production never shows up itself, only what it stands for.
    pub fn children(&self, id: NodeId) -> Vec<NodeId> {
        match &self.nodes[id] {
            NodeData::Token { .. } => Vec::new(),
            NodeData::Production { children, .. } => {
                let mut out = Vec::with_capacity(children.len());
                for &child in children {
                    if self.is_hidden(child) {
                        out.extend(self.children(child));
                    } else {
                        out.push(child);
                    }
                }
                out
            }
        }
    }

    fn is_hidden(&self, id: NodeId) -> bool {
        matches!(self.nodes[id], NodeData::Production { hidden: true, .. })
    }

    /// An analyzer's accumulated values for this node. Empty until something
    /// calls [`push_value`](Self::push_value); the list is mutable throughout
    /// analysis and carries no meaning of its own to the parser.
    pub fn values(&self, id: NodeId) -> &[V] {
        &self.values[id]
    }

    pub fn push_value(&mut self, id: NodeId, value: V) {
        self.values[id].push(value);
    }

    pub fn clear_values(&mut self, id: NodeId) {
        self.values[id].clear();
    }

    fn label(&self, id: NodeId) -> String {
        match &self.nodes[id] {
            NodeData::Production { pattern_id, name, .. } => format!("{}({})", name, pattern_id),
            NodeData::Token {
                pattern_id,
                name,
                image,
                start,
                hole,
                ..
            } => {
                if *hole {
                    return format!("{}({}): <missing>, line: {}, col: {}", name, pattern_id, start.line, start.column);
                }
                let first_line = image.lines().next().unwrap_or("");
                let truncated = if image.lines().count() > 1 {
                    format!("{}(...)", first_line)
                } else {
                    first_line.to_string()
                };
                format!(
                    "{}({}): {:?}, line: {}, col: {}",
                    name, pattern_id, truncated, start.line, start.column
                )
            }
        }
    }

    /// The exact, stable tree dump format (spec §6): two-space indent per
    /// level, one node per line.
    pub fn print_normative<W: Write>(&self, w: &mut W) -> std::io::Result<()> {
        self.print_node(w, self.root, 0)
    }

    fn print_node<W: Write>(&self, w: &mut W, id: NodeId, depth: usize) -> std::io::Result<()> {
        writeln!(w, "{}{}", "  ".repeat(depth), self.label(id))?;
        for child in self.children(id) {
            self.print_node(w, child, depth + 1)?;
        }
        Ok(())
    }

    pub fn dump_to_string(&self) -> String {
        let mut buf = Vec::new();
        self.print_normative(&mut buf).expect("writing to a Vec never fails");
        String::from_utf8(buf).expect("labels are always valid UTF-8")
    }

    /// A [`ptree`]-backed pretty printer for interactive/debug use. Not the
    /// normative format (that's [`print_normative`](Self::print_normative)) —
    /// just a convenience for humans staring at a terminal.
    pub fn print_tree_pretty(&self) -> std::io::Result<()> {
        ptree::print_tree(&TreeView { tree: self, id: self.root })
    }

    pub fn view(&self, id: NodeId) -> TreeView<'_, V> {
        TreeView { tree: self, id }
    }
}

pub(crate) struct TreeBuilder<V> {
    nodes: Vec<NodeData>,
    parents: Vec<Option<NodeId>>,
    values: Vec<Vec<V>>,
}

impl<V> TreeBuilder<V> {
    pub fn push_token(
        &mut self,
        parent: Option<NodeId>,
        pattern_id: TokenId,
        name: String,
        image: String,
        start: Position,
        end: Position,
    ) -> NodeId {
        let id = self.nodes.len();
        self.nodes.push(NodeData::Token {
            pattern_id,
            name,
            image,
            start,
            end,
            hole: false,
        });
        self.parents.push(parent);
        self.values.push(Vec::new());
        id
    }

    /// Synthesize a hole standing in for a required token the parser never
    /// found at `position` (spec §4.8.3): zero-width, no image, `hole` set.
    pub fn push_hole(&mut self, parent: Option<NodeId>, pattern_id: TokenId, name: String, position: Position) -> NodeId {
        let id = self.nodes.len();
        self.nodes.push(NodeData::Token {
            pattern_id,
            name,
            image: String::new(),
            start: position,
            end: position,
            hole: true,
        });
        self.parents.push(parent);
        self.values.push(Vec::new());
        id
    }

    /// Reserve a production node up front so its children can point back at
    /// it as `parent` while they're being built; finalize with its children
    /// once they're known. `hidden` marks a synthetic production whose own
    /// node never appears in traversal — only its children do (spec §3).
    pub fn reserve_production(
        &mut self,
        parent: Option<NodeId>,
        pattern_id: ProductionId,
        name: String,
        hidden: bool,
    ) -> NodeId {
        let id = self.nodes.len();
        self.nodes.push(NodeData::Production {
            pattern_id,
            name,
            children: Vec::new(),
            hidden,
        });
        self.parents.push(parent);
        self.values.push(Vec::new());
        id
    }

    pub fn set_children(&mut self, id: NodeId, new_children: Vec<NodeId>) {
        if let NodeData::Production { children, .. } = &mut self.nodes[id] {
            *children = new_children;
        }
    }

    pub fn finish(self, root: NodeId) -> ParseTree<V> {
        ParseTree {
            nodes: self.nodes,
            parents: self.parents,
            values: self.values,
            root,
        }
    }
}

#[derive(Clone, Copy)]
pub struct TreeView<'t, V> {
    tree: &'t ParseTree<V>,
    id: NodeId,
}

impl<'t, V> ptree::TreeItem for TreeView<'t, V> {
    type Child = TreeView<'t, V>;

    fn write_self<W: Write>(&self, f: &mut W, _style: &ptree::Style) -> std::io::Result<()> {
        write!(f, "{}", self.tree.label(self.id))
    }

    fn children(&self) -> Cow<[Self::Child]> {
        Cow::from(
            self.tree
                .children(self.id)
                .iter()
                .map(|&id| TreeView { tree: self.tree, id })
                .collect::<Vec<_>>(),
        )
    }
}
