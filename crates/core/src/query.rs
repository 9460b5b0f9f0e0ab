//! Query trees
//!
//! A [`Query`] is a tree of fragment lists. Each root-to-leaf walk is one
//! alternative chain of navigation steps; [`Query::filters`] flattens the
//! tree into those chains.
//!
//! ```text
//!            [tenant t]
//!            /        \
//!     [-contains-]  [-contains-]        two chains:
//!     [type env]    [type feed]         t -> env, t -> feed
//! ```
//!
//! Trees are built either node by node with a [`QueryBuilder`], or uniformly
//! at every leaf with a [`SymmetricExtender`].

use crate::filter::Filter;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A filter together with its role in the query
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum QueryFragment {
    /// A hop in the topology
    Path(Filter),
    /// A predicate at the current hop
    Filter(Filter),
}

impl QueryFragment {
    /// The wrapped filter
    pub fn filter(&self) -> &Filter {
        match self {
            QueryFragment::Path(f) | QueryFragment::Filter(f) => f,
        }
    }

    /// True for path fragments
    pub fn is_path(&self) -> bool {
        matches!(self, QueryFragment::Path(_))
    }
}

impl fmt::Display for QueryFragment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QueryFragment::Path(filter) => write!(f, "/{}", filter),
            QueryFragment::Filter(filter) => write!(f, "?{}", filter),
        }
    }
}

/// How a [`SymmetricExtender`] wraps the filters it is given
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FragmentMode {
    /// As [`QueryFragment::Path`]
    Path,
    /// As [`QueryFragment::Filter`]
    Filter,
}

impl FragmentMode {
    /// Wrap `filter` in a fragment of this flavor
    pub fn wrap(self, filter: Filter) -> QueryFragment {
        match self {
            FragmentMode::Path => QueryFragment::Path(filter),
            FragmentMode::Filter => QueryFragment::Filter(filter),
        }
    }
}

/// Immutable tree of alternative fragment chains
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Query {
    fragments: Vec<QueryFragment>,
    subtrees: Vec<Query>,
}

impl Query {
    /// The query with no fragments: one empty chain
    pub fn empty() -> Query {
        Query::default()
    }

    /// Node-by-node builder
    pub fn builder() -> QueryBuilder {
        QueryBuilder::new()
    }

    /// Symmetric extender over an empty tree, in path mode
    pub fn path() -> SymmetricExtender {
        SymmetricExtender::new(Query::empty()).path()
    }

    /// Symmetric extender over an empty tree, in filter mode
    pub fn filter() -> SymmetricExtender {
        SymmetricExtender::new(Query::empty()).filter()
    }

    /// Symmetric extender continuing this tree
    pub fn extend(&self) -> SymmetricExtender {
        SymmetricExtender::new(self.clone())
    }

    /// Fragments of the root node
    pub fn fragments(&self) -> &[QueryFragment] {
        &self.fragments
    }

    /// Child trees of the root node
    pub fn subtrees(&self) -> &[Query] {
        &self.subtrees
    }

    /// True if the root node has no children
    pub fn is_leaf(&self) -> bool {
        self.subtrees.is_empty()
    }

    /// Number of alternative chains
    pub fn leaf_count(&self) -> usize {
        if self.is_leaf() {
            1
        } else {
            self.subtrees.iter().map(Query::leaf_count).sum()
        }
    }

    /// Every root-to-leaf chain of fragments, depth first
    pub fn fragment_chains(&self) -> Vec<Vec<QueryFragment>> {
        let mut chains = Vec::with_capacity(self.leaf_count());
        let mut prefix = Vec::new();
        self.collect_chains(&mut prefix, &mut chains);
        chains
    }

    fn collect_chains(&self, prefix: &mut Vec<QueryFragment>, out: &mut Vec<Vec<QueryFragment>>) {
        let mark = prefix.len();
        prefix.extend(self.fragments.iter().cloned());
        if self.is_leaf() {
            out.push(prefix.clone());
        } else {
            for subtree in &self.subtrees {
                subtree.collect_chains(prefix, out);
            }
        }
        prefix.truncate(mark);
    }

    /// Every root-to-leaf chain of filters, depth first
    pub fn filters(&self) -> Vec<Vec<Filter>> {
        self.fragment_chains()
            .into_iter()
            .map(|chain| chain.into_iter().map(|f| f.filter().clone()).collect())
            .collect()
    }

    fn for_each_leaf(&mut self, op: &mut dyn FnMut(&mut Query)) {
        if self.subtrees.is_empty() {
            op(self);
        } else {
            for subtree in &mut self.subtrees {
                subtree.for_each_leaf(op);
            }
        }
    }

    fn map_fragments(&self, convert: &dyn Fn(&QueryFragment) -> QueryFragment) -> Query {
        Query {
            fragments: self.fragments.iter().map(convert).collect(),
            subtrees: self
                .subtrees
                .iter()
                .map(|q| q.map_fragments(convert))
                .collect(),
        }
    }
}

impl fmt::Display for Query {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, chain) in self.fragment_chains().iter().enumerate() {
            if i > 0 {
                f.write_str(" | ")?;
            }
            for fragment in chain {
                write!(f, "{}", fragment)?;
            }
        }
        Ok(())
    }
}

// ============================================================================
// Builder
// ============================================================================

#[derive(Debug, Clone, Default)]
struct Node {
    fragments: Vec<QueryFragment>,
    parent: Option<usize>,
    children: Vec<usize>,
}

/// Arena builder for query trees
///
/// Nodes are addressed by index. [`branch`](Self::branch) opens a child of
/// the current node, [`done`](Self::done) returns to the parent, and
/// [`build`](Self::build) materializes the whole tree from its root no matter
/// which node is current.
///
/// ```
/// use trellis_core::{Filter, Query};
///
/// let query = Query::builder()
///     .with_path(Filter::id("t"))
///     .branch()
///     .with_path(Filter::id("a"))
///     .done()
///     .branch()
///     .with_path(Filter::id("b"))
///     .build();
/// assert_eq!(query.filters().len(), 2);
/// ```
#[derive(Debug, Clone)]
pub struct QueryBuilder {
    nodes: Vec<Node>,
    current: usize,
}

impl Default for QueryBuilder {
    fn default() -> Self {
        QueryBuilder::new()
    }
}

impl QueryBuilder {
    /// Builder positioned at an empty root
    pub fn new() -> Self {
        QueryBuilder {
            nodes: vec![Node::default()],
            current: 0,
        }
    }

    fn from_query(query: &Query) -> Self {
        let mut builder = QueryBuilder {
            nodes: Vec::new(),
            current: 0,
        };
        builder.load(query, None);
        builder
    }

    fn load(&mut self, query: &Query, parent: Option<usize>) -> usize {
        let index = self.nodes.len();
        self.nodes.push(Node {
            fragments: query.fragments.clone(),
            parent,
            children: Vec::new(),
        });
        for subtree in &query.subtrees {
            let child = self.load(subtree, Some(index));
            self.nodes[index].children.push(child);
        }
        index
    }

    /// Append fragments to the current node
    pub fn with<I>(mut self, fragments: I) -> Self
    where
        I: IntoIterator<Item = QueryFragment>,
    {
        self.nodes[self.current].fragments.extend(fragments);
        self
    }

    /// Append a path fragment to the current node
    pub fn with_path(self, filter: Filter) -> Self {
        self.with([QueryFragment::Path(filter)])
    }

    /// Append a filter fragment to the current node
    pub fn with_filter(self, filter: Filter) -> Self {
        self.with([QueryFragment::Filter(filter)])
    }

    /// Open a child of the current node and move into it
    pub fn branch(mut self) -> Self {
        let child = self.nodes.len();
        self.nodes.push(Node {
            fragments: Vec::new(),
            parent: Some(self.current),
            children: Vec::new(),
        });
        self.nodes[self.current].children.push(child);
        self.current = child;
        self
    }

    /// Seal the current node and move to its parent; no-op at the root
    pub fn done(mut self) -> Self {
        if let Some(parent) = self.nodes[self.current].parent {
            self.current = parent;
        }
        self
    }

    /// Index depth of the current node (root is 0)
    pub fn depth(&self) -> usize {
        let mut depth = 0;
        let mut node = self.current;
        while let Some(parent) = self.nodes[node].parent {
            depth += 1;
            node = parent;
        }
        depth
    }

    fn root(&self) -> usize {
        let mut node = self.current;
        while let Some(parent) = self.nodes[node].parent {
            node = parent;
        }
        node
    }

    fn materialize(&self, index: usize) -> Query {
        let node = &self.nodes[index];
        Query {
            fragments: node.fragments.clone(),
            subtrees: node
                .children
                .iter()
                .map(|&child| self.materialize(child))
                .collect(),
        }
    }

    /// Seal every open node up to the root and produce the tree
    pub fn build(self) -> Query {
        self.materialize(self.root())
    }
}

impl From<&Query> for QueryBuilder {
    fn from(query: &Query) -> Self {
        QueryBuilder::from_query(query)
    }
}

// ============================================================================
// Symmetric extension
// ============================================================================

/// Applies the same extension to every current leaf of a tree
///
/// Flattening a tree grown only through a symmetric extender yields the
/// product of the branch counts of each step.
///
/// ```
/// use trellis_core::{Filter, Query};
///
/// let query = Query::path()
///     .with_branches(vec![vec![Filter::id("a")], vec![Filter::id("b")]])
///     .with_branches(vec![vec![Filter::id("c")], vec![Filter::id("d")]])
///     .get();
/// assert_eq!(query.filters().len(), 4);
/// ```
#[derive(Debug, Clone)]
pub struct SymmetricExtender {
    tree: Query,
    mode: FragmentMode,
}

impl SymmetricExtender {
    /// Extend `tree`, in path mode
    pub fn new(tree: Query) -> Self {
        SymmetricExtender {
            tree,
            mode: FragmentMode::Path,
        }
    }

    /// Wrap subsequent filters as path fragments
    pub fn path(mut self) -> Self {
        self.mode = FragmentMode::Path;
        self
    }

    /// Wrap subsequent filters as filter fragments
    pub fn filter(mut self) -> Self {
        self.mode = FragmentMode::Filter;
        self
    }

    /// Current wrapping mode
    pub fn mode(&self) -> FragmentMode {
        self.mode
    }

    /// Append `filters` to every leaf without branching
    pub fn with<I>(mut self, filters: I) -> Self
    where
        I: IntoIterator<Item = Filter>,
    {
        let fragments: Vec<QueryFragment> =
            filters.into_iter().map(|f| self.mode.wrap(f)).collect();
        if fragments.is_empty() {
            return self;
        }
        self.tree
            .for_each_leaf(&mut |leaf| leaf.fragments.extend(fragments.iter().cloned()));
        self
    }

    /// Give every leaf one child per filter list
    ///
    /// A single list is appended without branching; an empty list of lists
    /// leaves the tree unchanged.
    pub fn with_branches(mut self, branches: Vec<Vec<Filter>>) -> Self {
        match branches.len() {
            0 => self,
            1 => {
                let only = branches.into_iter().next().unwrap_or_default();
                self.with(only)
            }
            _ => {
                let mode = self.mode;
                let children: Vec<Query> = branches
                    .into_iter()
                    .map(|filters| Query {
                        fragments: filters.into_iter().map(|f| mode.wrap(f)).collect(),
                        subtrees: Vec::new(),
                    })
                    .collect();
                self.tree
                    .for_each_leaf(&mut |leaf| leaf.subtrees = children.clone());
                self
            }
        }
    }

    /// Graft `other` onto every leaf, re-wrapping its filters in the current mode
    pub fn with_query(self, other: &Query) -> Self {
        let mode = self.mode;
        self.merge(other, move |fragment| mode.wrap(fragment.filter().clone()))
    }

    /// Graft `other` onto every leaf, converting each of its fragments
    pub fn merge<F>(mut self, other: &Query, converter: F) -> Self
    where
        F: Fn(&QueryFragment) -> QueryFragment,
    {
        let converted = other.map_fragments(&converter);
        self.tree.for_each_leaf(&mut |leaf| {
            leaf.fragments.extend(converted.fragments.iter().cloned());
            leaf.subtrees = converted.subtrees.clone();
        });
        self
    }

    /// Continue node by node
    pub fn into_builder(self) -> QueryBuilder {
        QueryBuilder::from_query(&self.tree)
    }

    /// The extended tree
    pub fn get(self) -> Query {
        self.tree
    }
}
