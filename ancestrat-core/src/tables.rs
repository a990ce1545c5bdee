use crate::newtypes::{EdgeId, MutationId, NodeId, PopulationId, Position, SiteId, Time};
use bitflags::bitflags;
use thiserror::Error;

/// Error type related to [``TableCollection``]
#[derive(Error, Debug, PartialEq)]
pub enum TablesError {
    /// Returned by [``TableCollection::new``].
    #[error("Invalid genome length")]
    InvalidGenomeLength,
    /// Returned when invalid node `ID`s are encountered.
    #[error("Invalid node: {found:?}")]
    InvalidNodeValue {
        /// The invalid `ID`
        found: NodeId,
    },
    /// Returned when invalid positions are encountered.
    #[error("Invalid value for position: {found:?}")]
    InvalidPosition {
        /// The invalid position
        found: Position,
    },
    /// Returned when table validation detects duplicate positions
    /// in a site table.
    #[error("Duplicated site positions found")]
    DuplicatedSitePosition,
    /// Returned when site tables are not properly sorted.
    #[error("Site positions are unsorted")]
    UnsortedSitePosition,
    #[error("Site ID out of bounds")]
    /// Returned when a [``MutationRecord``]'s [`SiteId`] is out of bounds.
    SiteOutOfBounds,
    /// Returned when mutation tables are not sorted by site position.
    #[error("Mutations not sorted by increasing position")]
    UnsortedMutationPositions,
    /// Returned when a [``MutationRecord``]'s time field is not finite.
    #[error("Invalid Mutation time.")]
    InvalidMutationTime,
    /// Returned when a [``Node``]'s time field is not finite.
    #[error("Invalid Node time.")]
    InvalidNodeTime,
    /// Returned when an [``Edge``]'s left/right
    /// values are invalid.
    #[error("Invalid position range: {found:?}")]
    InvalidLeftRight {
        /// The invalid `(left, right)`.
        found: (Position, Position),
    },
    #[error("Invalid value for population: {found:?}")]
    /// Returned when a population `ID` is invalid.
    InvalidPopulation {
        /// The invalid population `ID`
        found: PopulationId,
    },
    #[error("Parent is NULL")]
    /// Can be returned by [``validate_edge_table``]
    NullParent,
    #[error("Child is NULL")]
    /// Can be returned by [``validate_edge_table``]
    NullChild,
    #[error("Node is out of bounds")]
    /// Can be returned by [``validate_edge_table``]
    NodeOutOfBounds,
    #[error("Node time order violation")]
    /// Can be returned by [``validate_edge_table``]
    NodeTimesUnordered,
    #[error("Parents not sorted by time")]
    /// Can be returned by [``validate_edge_table``]
    ParentTimesUnsorted,
    #[error("Edges not sorted by child")]
    /// Can be returned by [``validate_edge_table``]
    EdgesNotSortedByChild,
    #[error("Edges not sorted by left")]
    /// Can be returned by [``validate_edge_table``]
    EdgesNotSortedByLeft,
    #[error("Duplicate edges")]
    /// Can be returned by [``validate_edge_table``]
    DuplicateEdges,
    /// Returned by [`crate::TreeSequence::new`] when tables
    /// have not been indexed.
    #[error("Tables not indexed")]
    TablesNotIndexed,
}

/// Result type for operations on tables
pub type TablesResult<T> = std::result::Result<T, TablesError>;

/// A Node of a tree sequence.
///
/// Time is measured backwards: samples live at time 0
/// and parents have *larger* times than their children.
#[derive(Copy, Clone)]
pub struct Node {
    /// Time, in generations before the present
    pub time: Time,
    /// Population of the node
    pub population: PopulationId,
    /// Bit flags
    pub flags: u32,
}

/// An Edge is a transmission event
///
/// An edge is a record of transmission of
/// a half-open chunk of genome `[left, right)`
/// from `parent` to `child`.
#[derive(Copy, Clone)]
pub struct Edge {
    /// Left end
    pub left: Position,
    /// Right end
    pub right: Position,
    /// Index of parent in a [`NodeTable`]
    pub parent: NodeId,
    /// Index of child in a [`NodeTable`]
    pub child: NodeId,
}

/// A Site is the location and ancestral state
/// of a [`MutationRecord`].
#[derive(Clone)]
pub struct Site {
    /// Position of the site
    pub position: Position,
    /// The ancestral state.
    /// [``None``] implies client code
    /// will apply a default.
    pub ancestral_state: Option<Vec<u8>>,
}

/// A MutationRecord is the minimal information
/// needed about a mutation to track it
/// on a tree sequence.
#[derive(Clone)]
pub struct MutationRecord {
    /// The node where the mutation maps
    pub node: NodeId,
    /// The index of the corresponding [``Site``].
    pub site: SiteId,
    /// The origin time of the mutation
    pub time: Time,
    /// The derived state.
    /// [``None``] implies client code
    /// will apply a default.
    pub derived_state: Option<Vec<u8>>,
}

/// A node table
pub type NodeTable = Vec<Node>;
/// An edge table
pub type EdgeTable = Vec<Edge>;
/// A site table
pub type SiteTable = Vec<Site>;
/// A Mutation table
pub type MutationTable = Vec<MutationRecord>;

bitflags! {
    /// Set properties of a [`Node`].
    #[derive(Default)]
    pub struct NodeFlags: u32 {
        /// Default
        const NONE = 0;
        /// The node is a sample node.
        const IS_SAMPLE = 1 << 0;
    }
}

fn position_non_negative(x: Position) -> TablesResult<()> {
    if x.0 < 0 {
        Err(TablesError::InvalidPosition { found: x })
    } else {
        Ok(())
    }
}

fn node_non_negative(x: NodeId) -> TablesResult<()> {
    if x < 0 {
        Err(TablesError::InvalidNodeValue { found: x })
    } else {
        Ok(())
    }
}

fn edge_table_add_row(
    edges: &mut EdgeTable,
    left: Position,
    right: Position,
    parent: NodeId,
    child: NodeId,
) -> TablesResult<EdgeId> {
    if right <= left {
        return Err(TablesError::InvalidLeftRight {
            found: (left, right),
        });
    }
    position_non_negative(left)?;
    position_non_negative(right)?;
    node_non_negative(parent)?;
    node_non_negative(child)?;

    edges.push(Edge {
        left,
        right,
        parent,
        child,
    });

    Ok(EdgeId::from(edges.len() - 1))
}

fn node_table_add_row(
    nodes: &mut NodeTable,
    time: Time,
    population: PopulationId,
    flags: u32,
) -> TablesResult<NodeId> {
    if !time.0.is_finite() {
        return Err(TablesError::InvalidNodeTime);
    }
    if population < 0 {
        return Err(TablesError::InvalidPopulation { found: population });
    }
    nodes.push(Node {
        time,
        population,
        flags,
    });

    Ok(NodeId::from(nodes.len() - 1))
}

fn site_table_add_row(
    sites: &mut SiteTable,
    position: Position,
    ancestral_state: Option<Vec<u8>>,
) -> TablesResult<SiteId> {
    position_non_negative(position)?;
    sites.push(Site {
        position,
        ancestral_state,
    });

    Ok(SiteId::from(sites.len() - 1))
}

fn mutation_table_add_row(
    mutations: &mut MutationTable,
    node: NodeId,
    site: SiteId,
    time: Time,
    derived_state: Option<Vec<u8>>,
) -> TablesResult<MutationId> {
    node_non_negative(node)?;
    if !time.0.is_finite() {
        return Err(TablesError::InvalidMutationTime);
    }
    mutations.push(MutationRecord {
        node,
        site,
        time,
        derived_state,
    });

    Ok(MutationId::from(mutations.len() - 1))
}

// Canonical order: parents from youngest to oldest,
// then by parent id, child id, and left coordinate.
fn sort_edges(nodes: &[Node], edges: &mut [Edge]) {
    edges.sort_by(|a, b| {
        let ta = nodes[a.parent.0 as usize].time;
        let tb = nodes[b.parent.0 as usize].time;
        match ta.0.total_cmp(&tb.0) {
            std::cmp::Ordering::Equal => {
                if a.parent == b.parent {
                    if a.child == b.child {
                        return a.left.cmp(&b.left);
                    }
                    a.child.cmp(&b.child)
                } else {
                    a.parent.cmp(&b.parent)
                }
            }
            x => x,
        }
    });
}

fn record_site(sites: &[Site], mutation: &mut MutationRecord, new_site_table: &mut SiteTable) {
    let position = sites[mutation.site.0 as usize].position;
    if new_site_table.is_empty() || new_site_table[new_site_table.len() - 1].position != position {
        new_site_table.push(sites[mutation.site.0 as usize].clone());
    }

    mutation.site = SiteId((new_site_table.len() - 1) as i32);
}

// Mutations at the same site are ordered oldest first, so that
// variant decoding applies younger states over older ones.
fn sort_mutation_table(sites: &[Site], mutations: &mut [MutationRecord]) {
    mutations.sort_by(|a, b| {
        let pa = sites[a.site.0 as usize].position;
        let pb = sites[b.site.0 as usize].position;
        match pa.cmp(&pb) {
            std::cmp::Ordering::Equal => b.time.0.total_cmp(&a.time.0),
            x => x,
        }
    });
}

/// Perform a data integrity check on an [``EdgeTable``].
///
/// This checks, amongst other things, the sorting order
/// of the edges.
///
/// # Parameters
///
/// * `len`, the genome length of the tables.
///          Best obtained via [``TableCollection::genome_length``].
/// * `edges`, the [``EdgeTable``]
/// * `nodes`, the [``NodeTable``]
///
/// # Return
///
/// Returns ``Ok(true)`` if the tables pass all tests.
/// This return value allows this function to be used in
/// things like [``debug_assert``].
///
/// # Errors
///
/// Will return [``TablesError``] if the tables are not valid.
pub fn validate_edge_table(len: Position, edges: &[Edge], nodes: &[Node]) -> TablesResult<bool> {
    if edges.is_empty() {
        return Ok(true);
    }
    let mut last_parent: usize = edges[0].parent.0 as usize;
    let mut last_child: usize = edges[0].child.0 as usize;
    let mut last_left: Position = edges[0].left;

    for (i, edge) in edges.iter().enumerate() {
        if edge.parent == NodeId::NULL {
            return Err(TablesError::NullParent);
        }
        if edge.child == NodeId::NULL {
            return Err(TablesError::NullChild);
        }
        if edge.parent < 0 || edge.parent.0 as usize >= nodes.len() {
            return Err(TablesError::NodeOutOfBounds);
        }
        if edge.child < 0 || edge.child.0 as usize >= nodes.len() {
            return Err(TablesError::NodeOutOfBounds);
        }
        if edge.left.0 < 0 || edge.left > len {
            return Err(TablesError::InvalidPosition { found: edge.left });
        }
        if edge.right.0 < 0 || edge.right > len {
            return Err(TablesError::InvalidPosition { found: edge.right });
        }
        if edge.left >= edge.right {
            return Err(TablesError::InvalidLeftRight {
                found: (edge.left, edge.right),
            });
        }

        // time is measured backwards, so children are younger
        // (smaller values) than their parents
        if nodes[edge.child.0 as usize].time >= nodes[edge.parent.0 as usize].time {
            return Err(TablesError::NodeTimesUnordered);
        }

        if i > 0 {
            match nodes[edge.parent.0 as usize]
                .time
                .partial_cmp(&nodes[last_parent].time)
            {
                Some(std::cmp::Ordering::Less) => {
                    return Err(TablesError::ParentTimesUnsorted);
                }
                Some(std::cmp::Ordering::Equal) => {
                    if edge.parent.0 as usize == last_parent {
                        if (edge.child.0 as usize) < last_child {
                            return Err(TablesError::EdgesNotSortedByChild);
                        }
                        if edge.child.0 as usize == last_child {
                            match edge.left.cmp(&last_left) {
                                std::cmp::Ordering::Greater => (),
                                std::cmp::Ordering::Equal => {
                                    return Err(TablesError::DuplicateEdges)
                                }
                                std::cmp::Ordering::Less => {
                                    return Err(TablesError::EdgesNotSortedByLeft)
                                }
                            }
                        }
                    }
                }
                Some(_) => (),
                None => panic!("invalid node times"),
            }
        }
        last_parent = edge.parent.0 as usize;
        last_child = edge.child.0 as usize;
        last_left = edge.left;
    }

    Ok(true)
}

/// Check that all node times are finite.
pub fn validate_node_table(nodes: &[Node]) -> TablesResult<()> {
    for n in nodes {
        if !n.time.0.is_finite() {
            return Err(TablesError::InvalidNodeTime);
        }
    }
    Ok(())
}

/// Check sorting and bounds of a [``SiteTable``].
pub fn validate_site_table(len: Position, sites: &[Site]) -> TablesResult<()> {
    for (i, site) in sites.iter().enumerate() {
        if site.position < 0 || site.position >= len {
            return Err(TablesError::InvalidPosition {
                found: site.position,
            });
        }
        if i > 0 {
            if sites[i - 1].position == site.position {
                return Err(TablesError::DuplicatedSitePosition);
            }
            if sites[i - 1].position > site.position {
                return Err(TablesError::UnsortedSitePosition);
            }
        }
    }
    Ok(())
}

/// Check sorting and bounds of a [``MutationTable``].
pub fn validate_mutation_table(
    mutations: &[MutationRecord],
    sites: &[Site],
    nodes: &[Node],
) -> TablesResult<()> {
    for (i, mutation) in mutations.iter().enumerate() {
        if !mutation.time.0.is_finite() {
            return Err(TablesError::InvalidMutationTime);
        }
        if mutation.site < 0 || (mutation.site.0 as usize) >= sites.len() {
            return Err(TablesError::SiteOutOfBounds);
        }
        if mutation.node < 0 || (mutation.node.0 as usize) >= nodes.len() {
            return Err(TablesError::NodeOutOfBounds);
        }
        if i > 0
            && sites[mutations[i - 1].site.0 as usize].position
                > sites[mutation.site.0 as usize].position
        {
            return Err(TablesError::UnsortedMutationPositions);
        }
    }
    Ok(())
}

/// A collection of node, edge, site, and mutation tables.
#[derive(Clone)]
pub struct TableCollection {
    length_: Position, // Not visible outside of this module

    pub(crate) nodes_: NodeTable,
    pub(crate) edges_: EdgeTable,
    pub(crate) sites_: SiteTable,
    pub(crate) mutations_: MutationTable,
    pub(crate) edge_input_order: Vec<usize>,
    pub(crate) edge_output_order: Vec<usize>,
    pub(crate) is_indexed: bool,
}

impl TableCollection {
    /// Create a new instance.
    ///
    /// # Parameters
    ///
    /// * `genome_length`: the total genome length for the tables.
    ///
    /// # Errors
    ///
    /// Will return [``TablesError``] if `genome_length < 1`.
    pub fn new<P: Into<Position>>(genome_length: P) -> TablesResult<TableCollection> {
        let p = genome_length.into();
        if p.0 < 1 {
            return Err(TablesError::InvalidGenomeLength);
        }

        Ok(TableCollection {
            length_: p,
            nodes_: NodeTable::new(),
            edges_: EdgeTable::new(),
            sites_: SiteTable::new(),
            mutations_: MutationTable::new(),
            edge_input_order: vec![],
            edge_output_order: vec![],
            is_indexed: false,
        })
    }

    /// Add a [``Node``] to the [``NodeTable``]
    ///
    /// # Parameters
    ///
    /// * `time`, time of the node in generations before present.
    /// * `population`, the population where the node is found.
    ///
    /// # Returns
    ///
    /// A [``NodeId``].
    pub fn add_node<T: Into<Time>, P: Into<PopulationId> + Copy>(
        &mut self,
        time: T,
        population: P,
    ) -> TablesResult<NodeId> {
        self.add_node_with_flags(time, population, NodeFlags::default().bits())
    }

    /// Add a [``Node``] to the [``NodeTable``] with flags set.
    ///
    /// See [`NodeFlags`].
    pub fn add_node_with_flags<T: Into<Time>, P: Into<PopulationId> + Copy>(
        &mut self,
        time: T,
        population: P,
        flags: u32,
    ) -> TablesResult<NodeId> {
        self.is_indexed = false;
        node_table_add_row(&mut self.nodes_, time.into(), population.into(), flags)
    }

    /// Add an [``Edge``] to the [``EdgeTable``].
    ///
    /// # Errors
    ///
    /// Will return [``TablesError``] if any of the input
    /// are invalid.
    pub fn add_edge<L: Into<Position>, R: Into<Position>, P: Into<NodeId>, C: Into<NodeId>>(
        &mut self,
        left: L,
        right: R,
        parent: P,
        child: C,
    ) -> TablesResult<EdgeId> {
        self.is_indexed = false;
        edge_table_add_row(
            &mut self.edges_,
            left.into(),
            right.into(),
            parent.into(),
            child.into(),
        )
    }

    /// Add a [``Site``] to the [``SiteTable``].
    ///
    /// # Errors
    ///
    /// Will return [``TablesError``] if `position` is out of range.
    pub fn add_site<P: Into<Position>, A: Into<Option<Vec<u8>>>>(
        &mut self,
        position: P,
        ancestral_state: A,
    ) -> TablesResult<SiteId> {
        let p = position.into();
        if p >= self.length_ || p.0 < 0 {
            return Err(TablesError::InvalidPosition { found: p });
        }
        site_table_add_row(&mut self.sites_, p, ancestral_state.into())
    }

    /// Add a [``MutationRecord``] to the [``MutationTable``].
    ///
    /// # Parameters
    ///
    /// * `node`, the node where the mutation maps.
    /// * `site`, the id of the mutation's [``Site``].
    /// * `time`, the origin time of the mutation.
    /// * `derived_state`, the derived state of the variant.
    pub fn add_mutation<N: Into<NodeId>, S: Into<SiteId>, T: Into<Time>, D: Into<Option<Vec<u8>>>>(
        &mut self,
        node: N,
        site: S,
        time: T,
        derived_state: D,
    ) -> TablesResult<MutationId> {
        mutation_table_add_row(
            &mut self.mutations_,
            node.into(),
            site.into(),
            time.into(),
            derived_state.into(),
        )
    }

    /// Get genome length
    pub fn genome_length(&self) -> Position {
        self.length_
    }

    /// Return immutable reference to the [mutation table](MutationTable)
    pub fn mutations(&self) -> &[MutationRecord] {
        &self.mutations_
    }

    /// Return immutable reference to the [edge table](EdgeTable)
    pub fn edges(&self) -> &[Edge] {
        &self.edges_
    }

    /// Return number of edges
    pub fn num_edges(&self) -> usize {
        self.edges_.len()
    }

    /// Return number of nodes
    pub fn num_nodes(&self) -> usize {
        self.nodes_.len()
    }

    /// Return immutable reference to [node table](NodeTable)
    pub fn nodes(&self) -> &[Node] {
        &self.nodes_
    }

    /// Return the i-th [``Node``].
    pub fn node<N: Into<NodeId>>(&self, i: N) -> &Node {
        &self.nodes_[i.into().0 as usize]
    }

    /// Return the i-th [``Edge``].
    pub fn edge<E: Into<EdgeId>>(&self, i: E) -> &Edge {
        &self.edges_[i.into().0 as usize]
    }

    /// Return the i-th [``Site``].
    pub fn site<S: Into<SiteId>>(&self, i: S) -> &Site {
        &self.sites_[i.into().0 as usize]
    }

    /// Return the i-th [``MutationRecord``].
    pub fn mutation<M: Into<MutationId>>(&self, i: M) -> &MutationRecord {
        &self.mutations_[i.into().0 as usize]
    }

    /// Return immutable reference to [site table](SiteTable)
    pub fn sites(&self) -> &[Site] {
        &self.sites_
    }

    /// Sort all tables into canonical order.
    ///
    /// Edges are sorted by parent time (youngest parents first),
    /// then parent id, child id, and left coordinate.
    /// Sites are sorted by position, mutation site ids are remapped,
    /// and mutations are sorted by site position with mutations at
    /// the same site ordered oldest first.
    ///
    /// # Side effects
    ///
    /// Sorting invalidates current table indexes.
    pub fn sort_tables(&mut self) {
        self.is_indexed = false;
        sort_edges(&self.nodes_, &mut self.edges_);
        sort_mutation_table(&self.sites_, &mut self.mutations_);
        let mut new_sites = SiteTable::new();
        for m in &mut self.mutations_ {
            record_site(&self.sites_, m, &mut new_sites);
        }
        self.sites_ = new_sites;
    }

    /// Merge contiguous edges with identical parent and child.
    ///
    /// Requires the edge table to be in the canonical sorted order
    /// produced by [``TableCollection::sort_tables``].
    pub fn squash_edges(&mut self) {
        if self.edges_.is_empty() {
            return;
        }
        self.is_indexed = false;
        let mut squashed = EdgeTable::new();
        for edge in self.edges_.iter() {
            match squashed.last_mut() {
                Some(last)
                    if last.parent == edge.parent
                        && last.child == edge.child
                        && last.right == edge.left =>
                {
                    last.right = edge.right;
                }
                _ => squashed.push(*edge),
            }
        }
        self.edges_ = squashed;
    }

    /// Build the edge insertion/removal indexes needed
    /// for tree iteration.
    ///
    /// # Errors
    ///
    /// Will return [``TablesError``] if the edge table is invalid.
    pub fn build_indexes(&mut self) -> TablesResult<()> {
        validate_edge_table(self.length_, &self.edges_, &self.nodes_)?;
        self.edge_input_order = (0..self.edges_.len()).collect();
        self.edge_output_order = (0..self.edges_.len()).collect();
        let edges = &self.edges_;
        let nodes = &self.nodes_;
        // insertion: by left, then youngest parents first so that
        // children are linked before their ancestors
        self.edge_input_order.sort_by(|&a, &b| {
            let ea = &edges[a];
            let eb = &edges[b];
            ea.left
                .cmp(&eb.left)
                .then(
                    nodes[ea.parent.0 as usize]
                        .time
                        .0
                        .total_cmp(&nodes[eb.parent.0 as usize].time.0),
                )
                .then(ea.parent.cmp(&eb.parent))
                .then(ea.child.cmp(&eb.child))
        });
        // removal: by right, oldest parents first
        self.edge_output_order.sort_by(|&a, &b| {
            let ea = &edges[a];
            let eb = &edges[b];
            ea.right
                .cmp(&eb.right)
                .then(
                    nodes[eb.parent.0 as usize]
                        .time
                        .0
                        .total_cmp(&nodes[ea.parent.0 as usize].time.0),
                )
                .then(ea.parent.cmp(&eb.parent))
                .then(ea.child.cmp(&eb.child))
        });
        self.is_indexed = true;
        Ok(())
    }

    /// Return `true` if [``TableCollection::build_indexes``] has been
    /// called and no table has been modified since.
    pub fn is_indexed(&self) -> bool {
        self.is_indexed
    }

    /// Run validation on all tables.
    pub fn validate(&self) -> TablesResult<bool> {
        validate_node_table(&self.nodes_)?;
        validate_edge_table(self.length_, &self.edges_, &self.nodes_)?;
        validate_site_table(self.length_, &self.sites_)?;
        validate_mutation_table(&self.mutations_, &self.sites_, &self.nodes_)?;
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_node_tables() -> TableCollection {
        let mut tables = TableCollection::new(100).unwrap();
        tables.add_node(1.0, 0).unwrap();
        tables
            .add_node_with_flags(0.0, 0, NodeFlags::IS_SAMPLE.bits())
            .unwrap();
        tables
    }

    #[test]
    fn test_genome_length() {
        assert!(TableCollection::new(0).is_err());
        assert!(TableCollection::new(-1).is_err());
        let tables = TableCollection::new(100).unwrap();
        assert_eq!(tables.genome_length(), 100);
    }

    #[test]
    fn test_add_edge() {
        let mut tables = two_node_tables();
        let id = tables.add_edge(0, 100, 0, 1).unwrap();
        assert_eq!(id, 0);
        assert!(tables.add_edge(50, 50, 0, 1).is_err());
        assert!(tables.add_edge(-1, 100, 0, 1).is_err());
        assert!(tables.add_edge(0, 100, NodeId::NULL, 1).is_err());
    }

    #[test]
    fn test_child_older_than_parent() {
        let mut tables = TableCollection::new(100).unwrap();
        let parent = tables.add_node(0.0, 0).unwrap();
        let child = tables.add_node(1.0, 0).unwrap();
        tables.add_edge(0, 100, parent, child).unwrap();
        assert_eq!(
            validate_edge_table(tables.genome_length(), tables.edges(), tables.nodes()),
            Err(TablesError::NodeTimesUnordered)
        );
    }

    #[test]
    fn test_site_position_bounds() {
        let mut tables = TableCollection::new(100).unwrap();
        assert!(tables.add_site(100, None).is_err());
        assert!(tables.add_site(99, Some(vec![b'A'])).is_ok());
    }

    #[test]
    fn test_sort_and_squash() {
        let mut tables = TableCollection::new(100).unwrap();
        let parent = tables.add_node(1.0, 0).unwrap();
        let child = tables
            .add_node_with_flags(0.0, 0, NodeFlags::IS_SAMPLE.bits())
            .unwrap();
        tables.add_edge(50, 100, parent, child).unwrap();
        tables.add_edge(0, 50, parent, child).unwrap();
        tables.sort_tables();
        tables.squash_edges();
        assert_eq!(tables.num_edges(), 1);
        assert_eq!(tables.edge(0).left, 0);
        assert_eq!(tables.edge(0).right, 100);
        tables.build_indexes().unwrap();
        assert!(tables.is_indexed());
    }

    #[test]
    fn test_mutation_sorting() {
        let mut tables = two_node_tables();
        let s0 = tables.add_site(60, Some(vec![b'A'])).unwrap();
        let s1 = tables.add_site(10, Some(vec![b'C'])).unwrap();
        tables.add_mutation(1, s0, 0.5, Some(vec![b'G'])).unwrap();
        tables.add_mutation(1, s1, 0.25, Some(vec![b'T'])).unwrap();
        tables.add_mutation(1, s1, 0.75, Some(vec![b'G'])).unwrap();
        tables.sort_tables();
        // sites remapped to position order
        assert_eq!(tables.site(0).position, 10);
        assert_eq!(tables.site(1).position, 60);
        // oldest mutation first within a site
        assert_eq!(tables.mutation(0).site, 0);
        assert_eq!(tables.mutation(0).time.into_raw(), 0.75);
        assert_eq!(tables.mutation(1).time.into_raw(), 0.25);
        assert_eq!(tables.mutation(2).site, 1);
        assert!(tables.validate().is_ok());
    }
}
