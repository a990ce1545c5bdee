#![macro_use]

macro_rules! iterator_for_nodeiterator {
    ($ty: ty) => {
        impl Iterator for $ty {
            type Item = $crate::newtypes::NodeId;
            fn next(&mut self) -> Option<Self::Item> {
                self.next_node();
                self.current_node()
            }
        }
    };
}

macro_rules! impl_table_id {
    ($idtype: ident) => {
        impl $idtype {
            pub const NULL: $idtype = Self(-1);

            /// Return the underlying value.
            pub fn into_raw(self) -> i32 {
                self.0
            }

            /// Return true if `self` is equal to the type's `NULL` value.
            pub fn is_null(&self) -> bool {
                *self == Self::NULL
            }
        }

        impl From<i32> for $idtype {
            fn from(value: i32) -> Self {
                if value >= 0 {
                    Self(value)
                } else {
                    Self::NULL
                }
            }
        }

        impl From<usize> for $idtype {
            fn from(value: usize) -> Self {
                use num_traits::ToPrimitive;
                match value.to_i32() {
                    Some(x) => Self(x),
                    None => Self::NULL,
                }
            }
        }

        impl From<$idtype> for usize {
            fn from(value: $idtype) -> Self {
                value.0 as Self
            }
        }

        impl From<$idtype> for i32 {
            fn from(value: $idtype) -> Self {
                value.0
            }
        }

        impl PartialEq<i32> for $idtype {
            fn eq(&self, other: &i32) -> bool {
                self.0 == *other
            }
        }

        impl PartialEq<$idtype> for i32 {
            fn eq(&self, other: &$idtype) -> bool {
                *self == other.0
            }
        }

        impl PartialOrd<i32> for $idtype {
            fn partial_cmp(&self, other: &i32) -> Option<std::cmp::Ordering> {
                self.0.partial_cmp(other)
            }
        }

        impl PartialOrd<$idtype> for i32 {
            fn partial_cmp(&self, other: &$idtype) -> Option<std::cmp::Ordering> {
                self.partial_cmp(&other.0)
            }
        }
    };
}
