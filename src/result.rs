use std::fmt::Write;

/// Tag given to token leaves that carry no name and no part-of-speech tag.
pub const DEFAULT_LEAF_TAG: &str = "token";

/// One node of a match result: a named span over the token stream.
///
/// Leaves carry the text of the token(s) they matched; branches carry
/// children. Actions such as [`join`](crate::actions::join) collapse a
/// branch back into a text node.
#[derive(Debug, Clone, PartialEq)]
pub struct ResultNode {
    tag: String,
    text: Option<String>,
    children: Vec<ResultNode>,
    start: usize,
    end: usize,
}

impl ResultNode {
    pub fn leaf(tag: impl Into<String>, text: impl Into<String>, start: usize, end: usize) -> Self {
        ResultNode {
            tag: tag.into(),
            text: Some(text.into()),
            children: Vec::new(),
            start,
            end,
        }
    }

    /// Wrap `children` into a node spanning `[start, end)`.
    pub fn branch(tag: impl Into<String>, children: Vec<ResultNode>, start: usize, end: usize) -> Self {
        ResultNode {
            tag: tag.into(),
            text: None,
            children,
            start,
            end,
        }
    }

    pub fn tag(&self) -> &str {
        &self.tag
    }

    pub fn text(&self) -> Option<&str> {
        self.text.as_deref()
    }

    pub fn children(&self) -> &[ResultNode] {
        &self.children
    }

    pub fn start(&self) -> usize {
        self.start
    }

    pub fn end(&self) -> usize {
        self.end
    }

    pub fn set_tag(&mut self, tag: impl Into<String>) {
        self.tag = tag.into();
    }

    pub fn set_text(&mut self, text: impl Into<String>) {
        self.text = Some(text.into());
    }

    /// Rewrite every text of this subtree in place.
    pub fn map_texts(&mut self, f: &dyn Fn(&str) -> String) {
        if let Some(text) = self.text.take() {
            self.text = Some(f(&text));
        }
        for child in &mut self.children {
            child.map_texts(f);
        }
    }

    /// Every node of this subtree, depth first, starting with `self`.
    pub fn iter(&self) -> impl Iterator<Item = &ResultNode> {
        let mut stack = vec![self];
        std::iter::from_fn(move || {
            let node = stack.pop()?;
            stack.extend(node.children.iter().rev());
            Some(node)
        })
    }

    /// Texts of this subtree in document order.
    pub fn texts(&self) -> Vec<&str> {
        self.iter().filter_map(ResultNode::text).collect()
    }

    /// Direct children tagged `name`.
    pub fn children_named<'a, 'n>(&'a self, name: &'n str) -> impl Iterator<Item = &'a ResultNode> + 'n
    where
        'a: 'n,
    {
        self.children.iter().filter(move |child| child.tag == name)
    }

    /// Outermost descendants tagged `name`, excluding `self`. Nodes nested
    /// inside a match are not visited.
    pub fn descendants_named<'a>(&'a self, name: &str) -> Vec<&'a ResultNode> {
        fn collect<'a>(nodes: &'a [ResultNode], name: &str, found: &mut Vec<&'a ResultNode>) {
            for node in nodes {
                if node.tag == name {
                    found.push(node);
                } else {
                    collect(&node.children, name, found);
                }
            }
        }
        let mut found = Vec::new();
        collect(&self.children, name, &mut found);
        found
    }

    /// Own text, or the space-joined texts of the subtree for a branch.
    pub fn text_content(&self) -> String {
        match &self.text {
            Some(text) => text.clone(),
            None => self.texts().join(" "),
        }
    }

    /// Nodes tagged `name`: the direct children if there are any,
    /// otherwise the outermost descendants (`./name`, falling back to `//name`).
    pub fn select(&self, name: &str) -> Vec<&ResultNode> {
        let strict: Vec<&ResultNode> = self.children_named(name).collect();
        if !strict.is_empty() {
            return strict;
        }
        self.descendants_named(name)
    }

    /// First node returned by [`select`](Self::select).
    pub fn select_first(&self, name: &str) -> Option<&ResultNode> {
        self.select(name).into_iter().next()
    }

    /// [`text_content`](Self::text_content) of every selected node.
    pub fn select_text(&self, name: &str) -> Vec<String> {
        self.select(name).into_iter().map(ResultNode::text_content).collect()
    }

    /// Render as XML-like markup, e.g. `<raw_value>24.1</raw_value>`.
    pub fn to_xml(&self) -> String {
        let mut out = String::new();
        self.write_xml(&mut out);
        out
    }

    fn write_xml(&self, out: &mut String) {
        if self.text.is_none() && self.children.is_empty() {
            let _ = write!(out, "<{}/>", self.tag);
            return;
        }
        let _ = write!(out, "<{}>", self.tag);
        if let Some(text) = &self.text {
            out.push_str(text);
        }
        for child in &self.children {
            child.write_xml(out);
        }
        let _ = write!(out, "</{}>", self.tag);
    }
}

/// A successful scan result: the produced nodes and the token span they cover.
#[derive(Debug, Clone, PartialEq)]
pub struct Match {
    pub nodes: Vec<ResultNode>,
    pub start: usize,
    pub end: usize,
}

impl Match {
    /// The single root node, when the grammar produced exactly one.
    pub fn root(&self) -> Option<&ResultNode> {
        match self.nodes.as_slice() {
            [root] => Some(root),
            _ => None,
        }
    }

    pub fn to_xml(&self) -> String {
        self.nodes.iter().map(ResultNode::to_xml).collect()
    }
}
