use crate::newtypes::{NodeId, Position, Time};
use crate::tables::{NodeFlags, TableCollection};

/// Error type related to [``TreeSequence``] and [``Tree``].
#[derive(thiserror::Error, Debug, PartialEq)]
pub enum TreesError {
    /// Returned by [``TreeSequence::new``].
    #[error("Tables not indexed.")]
    TablesNotIndexed,
    /// Returned when a [`NodeId`] is not
    /// present in a [`Tree`] or [`TreeSequence`].
    #[error("Node ID out of range")]
    NodeIdOutOfRange,
    /// Returned if a tree sequence is
    /// initialized with no samples.
    #[error("No samples found.")]
    NoSamples,
    /// Returned if sample lists contain duplicate [`NodeId`].
    #[error("Duplicate samples.")]
    DuplicateSamples,
}

/// Result type for operations on trees and tree sequences.
pub type TreesResult<T> = Result<T, TreesError>;

/// Data describing the topological relationship
/// between [`NodeId`] in a [`Tree`].
#[derive(Copy, Clone)]
struct TopologyData {
    parent: NodeId,
    left_child: NodeId,
    right_child: NodeId,
    left_sib: NodeId,
    right_sib: NodeId,
}

impl Default for TopologyData {
    fn default() -> Self {
        Self {
            parent: NodeId::NULL,
            left_child: NodeId::NULL,
            right_child: NodeId::NULL,
            left_sib: NodeId::NULL,
            right_sib: NodeId::NULL,
        }
    }
}

trait NodeIterator {
    fn next_node(&mut self);
    fn current_node(&mut self) -> Option<NodeId>;
}

struct ChildIterator<'a> {
    current_child: Option<NodeId>,
    next_child: NodeId,
    tree: &'a Tree<'a>,
}

impl<'a> ChildIterator<'a> {
    fn new(tree: &'a Tree, u: NodeId) -> Self {
        ChildIterator {
            current_child: None,
            next_child: tree.topology[u.0 as usize].left_child,
            tree,
        }
    }
}

impl NodeIterator for ChildIterator<'_> {
    fn next_node(&mut self) {
        self.current_child = match self.next_child {
            NodeId::NULL => None,
            r => {
                let cr = Some(r);
                self.next_child = self.tree.topology[r.0 as usize].right_sib;
                cr
            }
        };
    }

    fn current_node(&mut self) -> Option<NodeId> {
        self.current_child
    }
}

iterator_for_nodeiterator!(ChildIterator<'_>);

/// A tree is the genealogy of a non-recombining
/// segment of a genome.  A [`TreeSequence`] contains
/// the information needed to efficiently build trees
/// and iterate over each tree in a genome.
pub struct Tree<'treeseq> {
    topology: Vec<TopologyData>,
    left: Position,
    right: Position,
    samples: &'treeseq [NodeId],
    sample_index_map: Vec<NodeId>,
    treeseq: &'treeseq TreeSequence,
    // The following help implement StreamingIterator
    input_edge_index: usize,
    output_edge_index: usize,
    x: Position,
    advanced: bool,
}

impl<'treeseq> Tree<'treeseq> {
    fn new(treeseq: &'treeseq TreeSequence) -> Self {
        let mut sample_index_map = vec![NodeId::NULL; treeseq.tables.num_nodes()];
        for (i, s) in treeseq.samples.iter().enumerate() {
            sample_index_map[s.0 as usize] = NodeId::from(i);
        }
        Self {
            topology: vec![TopologyData::default(); treeseq.tables.num_nodes()],
            left: Position::MIN,
            right: Position::MIN,
            samples: treeseq.samples.as_slice(),
            sample_index_map,
            treeseq,
            input_edge_index: 0,
            output_edge_index: 0,
            x: Position(0),
            advanced: false,
        }
    }

    fn id_in_range<N: Into<NodeId>>(&self, u: N) -> TreesResult<()> {
        let n = u.into();
        if n < 0 || (n.0 as usize) >= self.num_nodes() {
            Err(TreesError::NodeIdOutOfRange)
        } else {
            Ok(())
        }
    }

    /// The number of nodes in the tree sequence.
    pub fn num_nodes(&self) -> usize {
        self.treeseq.tables.num_nodes()
    }

    /// Return the `[left, right)` [`Position`] interval for
    /// which this tree is the genealogy.
    pub fn range(&self) -> (Position, Position) {
        (self.left, self.right)
    }

    /// Return the length of this tree along the genome.
    pub fn span(&self) -> i64 {
        self.right.0 - self.left.0
    }

    /// Return the parent of node `u`.
    pub fn parent<N: Into<NodeId> + Copy>(&self, u: N) -> TreesResult<NodeId> {
        self.id_in_range(u)?;
        Ok(self.topology[u.into().0 as usize].parent)
    }

    /// Return the left (first) child of node `u`.
    pub fn left_child<N: Into<NodeId> + Copy>(&self, u: N) -> TreesResult<NodeId> {
        self.id_in_range(u)?;
        Ok(self.topology[u.into().0 as usize].left_child)
    }

    /// Return an [`Iterator`] over the children of node `u`.
    ///
    /// # Errors
    ///
    /// [`TreesError::NodeIdOutOfRange`] if `u` is out of range.
    pub fn children<N: Into<NodeId> + Copy>(
        &self,
        u: N,
    ) -> Result<impl Iterator<Item = NodeId> + '_, TreesError> {
        self.id_in_range(u)?;
        Ok(ChildIterator::new(self, u.into()))
    }

    /// Return the time of node `u`.
    pub fn node_time<N: Into<NodeId> + Copy>(&self, u: N) -> TreesResult<Time> {
        self.id_in_range(u)?;
        Ok(self.treeseq.tables.node(u.into()).time)
    }

    /// Return a slice of the samples in this tree sequence.
    pub fn sample_nodes(&self) -> &[NodeId] {
        self.samples
    }

    /// Return the sample index of node `u`, or [`NodeId::NULL`]
    /// if `u` is not a sample.
    pub fn sample_index<N: Into<NodeId> + Copy>(&self, u: N) -> TreesResult<NodeId> {
        self.id_in_range(u)?;
        Ok(self.sample_index_map[u.into().0 as usize])
    }

    /// Walk from `u` to the root of the current tree.
    pub fn root_of<N: Into<NodeId> + Copy>(&self, u: N) -> TreesResult<NodeId> {
        self.id_in_range(u)?;
        let mut r = u.into();
        let mut p = self.topology[r.0 as usize].parent;
        while p != NodeId::NULL {
            r = p;
            p = self.topology[r.0 as usize].parent;
        }
        Ok(r)
    }

    /// Collect the sample indexes subtended by node `u`
    /// via a preorder traversal of its subtree.
    ///
    /// If `u` is itself a sample, it is included.
    pub fn samples_below<N: Into<NodeId> + Copy>(&self, u: N) -> TreesResult<Vec<usize>> {
        self.id_in_range(u)?;
        let mut rv = vec![];
        let mut node_stack = vec![u.into()];
        while let Some(n) = node_stack.pop() {
            let index = self.sample_index_map[n.0 as usize];
            if index != NodeId::NULL {
                rv.push(index.0 as usize);
            }
            let mut c = self.topology[n.0 as usize].right_child;
            while c != NodeId::NULL {
                node_stack.push(c);
                c = self.topology[c.0 as usize].left_sib;
            }
        }
        Ok(rv)
    }
}

/// Left-to-right iteration of trees.
impl<'treeseq> streaming_iterator::StreamingIterator for Tree<'treeseq> {
    type Item = Tree<'treeseq>;

    fn advance(&mut self) {
        let tables = &self.treeseq.tables;
        let edge_table = tables.edges_.as_slice();
        let edge_input_order = tables.edge_input_order.as_slice();
        let edge_output_order = tables.edge_output_order.as_slice();
        if self.input_edge_index < edge_input_order.len() || self.x < tables.genome_length() {
            for edge_index in edge_output_order[self.output_edge_index..].iter() {
                let current_edge = edge_table[*edge_index];
                if current_edge.right != self.x {
                    break;
                }
                let lsib = self.topology[current_edge.child.0 as usize].left_sib;
                let rsib = self.topology[current_edge.child.0 as usize].right_sib;

                if lsib == NodeId::NULL {
                    self.topology[current_edge.parent.0 as usize].left_child = rsib;
                } else {
                    self.topology[lsib.0 as usize].right_sib = rsib;
                }
                if rsib == NodeId::NULL {
                    self.topology[current_edge.parent.0 as usize].right_child = lsib;
                } else {
                    self.topology[rsib.0 as usize].left_sib = lsib;
                }
                let child_topo = &mut self.topology[current_edge.child.0 as usize];
                child_topo.parent = NodeId::NULL;
                child_topo.left_sib = NodeId::NULL;
                child_topo.right_sib = NodeId::NULL;
                self.output_edge_index += 1;
            }
            for edge_index in edge_input_order[self.input_edge_index..].iter() {
                let current_edge = edge_table[*edge_index];
                if current_edge.left != self.x {
                    break;
                }
                let rchild = self.topology[current_edge.parent.0 as usize].right_child;

                if rchild == NodeId::NULL {
                    self.topology[current_edge.parent.0 as usize].left_child = current_edge.child;
                    self.topology[current_edge.child.0 as usize].left_sib = NodeId::NULL;
                } else {
                    self.topology[rchild.0 as usize].right_sib = current_edge.child;
                    self.topology[current_edge.child.0 as usize].left_sib = rchild;
                }
                self.topology[current_edge.child.0 as usize].right_sib = NodeId::NULL;
                self.topology[current_edge.child.0 as usize].parent = current_edge.parent;
                self.topology[current_edge.parent.0 as usize].right_child = current_edge.child;
                self.input_edge_index += 1;
            }

            let mut right = tables.genome_length();
            if self.input_edge_index < edge_input_order.len() {
                right = std::cmp::min(
                    right,
                    edge_table[edge_input_order[self.input_edge_index]].left,
                );
            }
            if self.output_edge_index < edge_output_order.len() {
                right = std::cmp::min(
                    right,
                    edge_table[edge_output_order[self.output_edge_index]].right,
                );
            }
            self.left = self.x;
            self.right = right;
            self.x = right;
            self.advanced = true;
        } else {
            self.advanced = false;
        }
    }

    fn get(&self) -> Option<&Self::Item> {
        match self.advanced {
            true => Some(self),
            false => None,
        }
    }
}

/// A tree sequence.
pub struct TreeSequence {
    tables: TableCollection,
    samples: Vec<NodeId>,
}

impl TreeSequence {
    /// Create a new tree sequence from a [`TableCollection`].
    ///
    /// The input tables are consumed, owned by the tree sequence.
    ///
    /// The list of samples is populated from the [`node flags`](crate::Node::flags):
    /// any flag containing [`IS_SAMPLE`](NodeFlags::IS_SAMPLE) will be
    /// in the list, in node id order.
    ///
    /// # Errors
    ///
    /// [`TreesError::TablesNotIndexed`] if
    /// [`build_indexes`](TableCollection::build_indexes) has not been called.
    ///
    /// [`TreesError::NoSamples`] if no node is flagged as a sample.
    pub fn new(tables: TableCollection) -> TreesResult<Self> {
        if !tables.is_indexed() {
            return Err(TreesError::TablesNotIndexed);
        }
        let mut samples = vec![];
        for (i, n) in tables.nodes_.iter().enumerate() {
            if n.flags & NodeFlags::IS_SAMPLE.bits() > 0 {
                samples.push(NodeId::from(i));
            }
        }
        if samples.is_empty() {
            return Err(TreesError::NoSamples);
        }
        Ok(Self { tables, samples })
    }

    /// Create a new tree sequence from a table collection
    /// and a list of samples, ignoring node flags.
    ///
    /// # Errors
    ///
    /// [`TreesError`] if the samples list is empty or has duplicates.
    pub fn new_with_samples(tables: TableCollection, samples: &[NodeId]) -> TreesResult<Self> {
        if !tables.is_indexed() {
            return Err(TreesError::TablesNotIndexed);
        }
        if samples.is_empty() {
            return Err(TreesError::NoSamples);
        }
        let mut seen = vec![0; tables.nodes_.len()];
        for s in samples {
            if *s == NodeId::NULL || (s.0 as usize) >= seen.len() {
                return Err(TreesError::NodeIdOutOfRange);
            }
            if seen[s.0 as usize] != 0 {
                return Err(TreesError::DuplicateSamples);
            }
            seen[s.0 as usize] = 1;
        }
        Ok(Self {
            tables,
            samples: samples.to_vec(),
        })
    }

    /// Access the underlying [`TableCollection`].
    pub fn tables(&self) -> &TableCollection {
        &self.tables
    }

    /// Move the underlying [`TableCollection`], consuming `self`.
    pub fn into_tables(self) -> TableCollection {
        self.tables
    }

    /// Return a streaming iterator over all [`Tree`]
    /// objects in the tree sequence.
    pub fn tree_iterator(&self) -> Tree<'_> {
        Tree::new(self)
    }

    /// The sample nodes, in the order they were recorded.
    pub fn sample_nodes(&self) -> &[NodeId] {
        &self.samples
    }
}
