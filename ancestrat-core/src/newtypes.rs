/// An identifier for a node in a genealogy.
///
/// ```
/// # use ancestrat_core::newtypes::NodeId;
/// let n = NodeId::from(-1);
/// assert_eq!(n, NodeId::NULL);
/// let r = n.into_raw();
/// assert_eq!(r, -1);
/// ```
#[repr(transparent)]
#[derive(Copy, Clone, Debug, Eq, PartialEq, Ord, PartialOrd, std::hash::Hash)]
pub struct NodeId(pub(crate) i32);

/// An identifier for an edge.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Ord, PartialOrd, std::hash::Hash)]
#[repr(transparent)]
pub struct EdgeId(pub(crate) i32);

/// An identifier for a site.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Ord, PartialOrd, std::hash::Hash)]
#[repr(transparent)]
pub struct SiteId(pub(crate) i32);

/// An identifier for a mutation.
#[repr(transparent)]
#[derive(Copy, Clone, Debug, Eq, PartialEq, Ord, PartialOrd, std::hash::Hash)]
pub struct MutationId(pub(crate) i32);

/// An identifier for a population.
#[repr(transparent)]
#[derive(Copy, Clone, Debug, Eq, PartialEq, Ord, PartialOrd, std::hash::Hash)]
pub struct PopulationId(pub(crate) i32);

impl_table_id!(NodeId);
impl_table_id!(EdgeId);
impl_table_id!(SiteId);
impl_table_id!(MutationId);
impl_table_id!(PopulationId);

/// A position/coordinate within a genome.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Ord, PartialOrd, std::hash::Hash)]
#[repr(transparent)]
pub struct Position(pub(crate) i64);

impl Position {
    /// Minimum value
    pub const MIN: Position = Position(i64::MIN);
    /// Maximum value
    pub const MAX: Position = Position(i64::MAX);

    /// Create a new Position
    ///
    /// # Returns
    ///
    /// * `Some` if `position` is non-negative
    /// * `None` otherwise
    ///
    /// # Examples
    ///
    /// ```
    /// let p = ancestrat_core::Position::new(10).unwrap();
    /// assert_eq!(p, 10); // can be compared to i64
    /// let p2 = ancestrat_core::Position::new(11).unwrap();
    /// assert!(p < p2);
    /// ```
    pub fn new(position: i64) -> Option<Self> {
        if position >= 0 {
            Some(Self(position))
        } else {
            None
        }
    }

    /// Create a new position with a non-negative integer
    ///
    /// # Panics
    ///
    /// Will panic if `position` < 0.
    pub fn new_valid(position: i64) -> Self {
        match Self::new(position) {
            Some(p) => p,
            None => panic!("fatal: negative position {}", position),
        }
    }

    /// Return the underlying value.
    pub fn into_raw(self) -> i64 {
        self.0
    }
}

/// A time value, measured in generations before the present.
///
/// Sample nodes have time 0; ancestors have larger times.
#[repr(transparent)]
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Time(pub(crate) f64);

impl Time {
    /// Minimum value
    pub const MIN: Time = Time(f64::MIN);
    /// Maximum value
    pub const MAX: Time = Time(f64::MAX);

    /// Return the underlying value.
    pub fn into_raw(self) -> f64 {
        self.0
    }
}

impl PartialEq<i64> for Position {
    fn eq(&self, other: &i64) -> bool {
        self.0 == *other
    }
}

impl PartialEq<Position> for i64 {
    fn eq(&self, other: &Position) -> bool {
        *self == other.0
    }
}

impl PartialOrd<i64> for Position {
    fn partial_cmp(&self, other: &i64) -> Option<std::cmp::Ordering> {
        self.0.partial_cmp(other)
    }
}

impl PartialOrd<Position> for i64 {
    fn partial_cmp(&self, other: &Position) -> Option<std::cmp::Ordering> {
        self.partial_cmp(&other.0)
    }
}

impl From<i64> for Position {
    fn from(value: i64) -> Self {
        Self(value)
    }
}

impl From<Position> for i64 {
    fn from(value: Position) -> Self {
        value.0
    }
}

impl From<f64> for Time {
    fn from(value: f64) -> Self {
        Self(value)
    }
}

impl From<i64> for Time {
    fn from(value: i64) -> Self {
        Self(value as f64)
    }
}

impl From<i32> for Time {
    fn from(value: i32) -> Self {
        Self(f64::from(value))
    }
}

impl From<Time> for f64 {
    fn from(value: Time) -> Self {
        value.0
    }
}

impl PartialOrd<Time> for Time {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        match self.0.partial_cmp(&other.0) {
            None => panic!("fatal: partial_cmp for Time received non-finite values"),
            Some(x) => Some(x),
        }
    }
}
