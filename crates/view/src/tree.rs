//! Tree renderer: owns expand/collapse state for a schema tree, keyed by structural path.

use std::collections::HashSet;

use kindlens_core::SchemaNode;

/// Child indices from the top-level section down to a node.
pub type NodePath = Vec<usize>;

/// One visible line of the rendered tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TreeLine {
    pub path: NodePath,
    pub depth: usize,
    pub name: String,
    pub required: bool,
    pub type_badge: String,
    pub description: Option<String>,
    pub expandable: bool,
    pub expanded: bool,
    pub unrenderable: bool,
}

#[derive(Debug, Default)]
pub struct TreeView {
    roots: Vec<SchemaNode>,
    expanded: HashSet<NodePath>,
}

impl TreeView {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the tree. Prior expand state is dropped: sections open, everything below closed.
    pub fn load(&mut self, roots: Vec<SchemaNode>) {
        self.expanded = (0..roots.len()).filter(|i| !roots[*i].is_leaf()).map(|i| vec![i]).collect();
        self.roots = roots;
    }

    pub fn clear(&mut self) {
        self.roots.clear();
        self.expanded.clear();
    }

    pub fn roots(&self) -> &[SchemaNode] {
        &self.roots
    }

    pub fn is_empty(&self) -> bool {
        self.roots.is_empty()
    }

    pub fn node(&self, path: &[usize]) -> Option<&SchemaNode> {
        let (first, rest) = path.split_first()?;
        rest.iter().try_fold(self.roots.get(*first)?, |n, i| n.children.get(*i))
    }

    pub fn is_expanded(&self, path: &[usize]) -> bool {
        self.expanded.contains(path)
    }

    /// Flip one node. Leaves and unknown paths are ignored.
    pub fn toggle(&mut self, path: &[usize]) {
        if self.node(path).map_or(true, SchemaNode::is_leaf) {
            return;
        }
        if !self.expanded.remove(path) {
            self.expanded.insert(path.to_vec());
        }
    }

    pub fn expand_all(&mut self) {
        fn walk(nodes: &[SchemaNode], prefix: &mut NodePath, out: &mut HashSet<NodePath>) {
            for (i, n) in nodes.iter().enumerate() {
                prefix.push(i);
                if !n.is_leaf() {
                    out.insert(prefix.clone());
                    walk(&n.children, prefix, out);
                }
                prefix.pop();
            }
        }
        let mut out = HashSet::new();
        walk(&self.roots, &mut Vec::new(), &mut out);
        self.expanded = out;
    }

    pub fn collapse_all(&mut self) {
        self.expanded.clear();
    }

    /// Visible lines in display order: a node's children follow it only when it is expanded.
    pub fn lines(&self) -> Vec<TreeLine> {
        let mut out = Vec::new();
        let mut path = Vec::new();
        self.collect(&self.roots, &mut path, &mut out);
        out
    }

    fn collect(&self, nodes: &[SchemaNode], path: &mut NodePath, out: &mut Vec<TreeLine>) {
        for (i, n) in nodes.iter().enumerate() {
            path.push(i);
            let expanded = self.expanded.contains(path.as_slice());
            out.push(TreeLine {
                path: path.clone(),
                depth: path.len() - 1,
                name: n.name.clone(),
                required: n.required,
                type_badge: n.node_type.clone(),
                description: n.description.clone(),
                expandable: !n.is_leaf(),
                expanded,
                unrenderable: n.unrenderable,
            });
            if expanded {
                self.collect(&n.children, path, out);
            }
            path.pop();
        }
    }

    /// Indented text rendering for terminals.
    pub fn render_text(&self) -> String {
        let mut out = String::new();
        for line in self.lines() {
            let marker = match (line.expandable, line.expanded) {
                (true, true) => "▾",
                (true, false) => "▸",
                (false, _) => " ",
            };
            out.push_str(&"  ".repeat(line.depth));
            out.push_str(marker);
            out.push(' ');
            out.push_str(&line.name);
            if line.required {
                out.push_str(" *required");
            }
            if !line.type_badge.is_empty() {
                out.push_str(&format!(" [{}]", line.type_badge));
            }
            if line.unrenderable {
                out.push_str(" (unrenderable)");
            }
            if let Some(d) = &line.description {
                let first = d.lines().next().unwrap_or_default();
                out.push_str(&format!(" - {}", first));
            }
            out.push('\n');
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn leaf(name: &str, ty: &str) -> SchemaNode {
        SchemaNode { name: name.into(), node_type: ty.into(), ..Default::default() }
    }

    fn object(name: &str, children: Vec<SchemaNode>) -> SchemaNode {
        SchemaNode { name: name.into(), node_type: "object".into(), children, ..Default::default() }
    }

    fn sample() -> Vec<SchemaNode> {
        vec![
            object("spec", vec![object("template", vec![leaf("image", "string")]), leaf("replicas", "integer")]),
            object("status", vec![leaf("phase", "string")]),
        ]
    }

    fn names(v: &TreeView) -> Vec<String> {
        v.lines().into_iter().map(|l| l.name).collect()
    }

    #[test]
    fn sections_open_and_deeper_nodes_closed_by_default() {
        let mut v = TreeView::new();
        v.load(sample());
        assert_eq!(names(&v), vec!["spec", "template", "replicas", "status", "phase"]);
        let template = &v.lines()[1];
        assert!(template.expandable && !template.expanded);
        assert_eq!(template.depth, 1);
    }

    #[test]
    fn toggle_is_local_and_keyed_by_path() {
        let mut v = TreeView::new();
        v.load(sample());
        v.toggle(&[0, 0]);
        assert_eq!(names(&v), vec!["spec", "template", "image", "replicas", "status", "phase"]);
        v.toggle(&[0]);
        assert_eq!(names(&v), vec!["spec", "status", "phase"]);
        // inner state survives collapsing the parent
        v.toggle(&[0]);
        assert!(v.is_expanded(&[0, 0]));
        // leaves and unknown paths are ignored
        v.toggle(&[0, 1]);
        v.toggle(&[9, 9]);
        assert!(!v.is_expanded(&[0, 1]));
    }

    #[test]
    fn reload_discards_expand_state() {
        let mut v = TreeView::new();
        v.load(sample());
        v.toggle(&[0, 0]);
        v.toggle(&[1]);
        v.load(sample());
        assert!(v.is_expanded(&[0]) && v.is_expanded(&[1]));
        assert!(!v.is_expanded(&[0, 0]));
    }

    #[test]
    fn expand_all_reaches_every_branch() {
        let mut v = TreeView::new();
        v.load(sample());
        v.expand_all();
        assert_eq!(v.lines().len(), 6);
        v.collapse_all();
        assert_eq!(names(&v), vec!["spec", "status"]);
    }

    #[test]
    fn text_rendering_shows_badges() {
        let mut v = TreeView::new();
        let mut x = leaf("x", "string");
        x.required = true;
        x.description = Some("The x.\nMore.".into());
        let mut deep = leaf("deep", "");
        deep.unrenderable = true;
        v.load(vec![object("spec", vec![x, deep])]);
        assert_eq!(v.render_text(), "▾ spec [object]\n    x *required [string] - The x.\n    deep (unrenderable)\n");
    }
}
