//! Index types for mesh elements.
//!
//! Welded meshes refer to vertices and triangles by position. The wrappers
//! here keep the two kinds of index from being mixed up, and are generic over
//! the underlying integer so large scans can use `u64` while typical meshes
//! stay on `u32`.

use std::fmt::{self, Debug};
use std::hash::Hash;

/// Trait for integer types that can be used as mesh indices.
///
/// Implemented for `u16`, `u32`, and `u64`.
pub trait MeshIndex: Copy + Eq + Ord + Hash + Debug + Send + Sync + 'static {
    /// The largest index this type can hold.
    const MAX: Self;

    /// Convert from usize to this index type.
    ///
    /// Callers must check [`MeshIndex::can_address`] first; the value is
    /// truncated otherwise.
    fn from_usize(v: usize) -> Self;

    /// Convert to usize.
    fn to_usize(self) -> usize;

    /// Whether `count` elements can all be given an index of this type.
    fn can_address(count: usize) -> bool {
        count == 0 || count - 1 <= Self::MAX.to_usize()
    }
}

macro_rules! impl_mesh_index {
    ($($ty:ty),*) => {
        $(
            impl MeshIndex for $ty {
                const MAX: Self = <$ty>::MAX;

                #[inline]
                fn from_usize(v: usize) -> Self {
                    debug_assert!(
                        Self::can_address(v + 1),
                        "index {} too large for {}",
                        v,
                        stringify!($ty)
                    );
                    v as $ty
                }

                #[inline]
                fn to_usize(self) -> usize {
                    self as usize
                }
            }
        )*
    };
}

impl_mesh_index!(u16, u32, u64);

/// A type-safe vertex index.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
#[repr(transparent)]
pub struct VertexId<I: MeshIndex = u32>(I);

/// A type-safe triangle index.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
#[repr(transparent)]
pub struct FaceId<I: MeshIndex = u32>(I);

macro_rules! impl_index_type {
    ($name:ident, $display:literal) => {
        impl<I: MeshIndex> $name<I> {
            /// Create a new index from a raw value.
            #[inline]
            pub fn new(index: usize) -> Self {
                Self(I::from_usize(index))
            }

            /// Get the index as usize.
            #[inline]
            pub fn index(self) -> usize {
                self.0.to_usize()
            }

            /// Get the raw value of the underlying type.
            #[inline]
            pub fn raw(self) -> I {
                self.0
            }
        }

        impl<I: MeshIndex> Debug for $name<I> {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}({})", $display, self.index())
            }
        }

        impl<I: MeshIndex> From<usize> for $name<I> {
            fn from(v: usize) -> Self {
                Self::new(v)
            }
        }
    };
}

impl_index_type!(VertexId, "V");
impl_index_type!(FaceId, "F");
