use std::cmp::Ordering;
use std::fmt::Debug;
use std::ops::Add;

use num_traits::Zero;

/// Edge weight of a [`crate::graph::Graph`].
///
/// Weights must be non-negative and totally ordered so that they can be kept
/// in a binary heap, even if the underlying type is a float.
pub trait Weight: Copy + Debug + Zero + Add<Output = Self> + PartialOrd + Send + Sync {
    fn total_cmp(&self, other: &Self) -> Ordering;
}

macro_rules! weight_impl_fl {
    ($T:ident) => {
        impl Weight for $T {
            #[inline]
            fn total_cmp(&self, other: &Self) -> Ordering {
                $T::total_cmp(self, other)
            }
        }
    };
}

macro_rules! weight_impl_ord {
    ($T:ident) => {
        impl Weight for $T {
            #[inline]
            fn total_cmp(&self, other: &Self) -> Ordering {
                Ord::cmp(self, other)
            }
        }
    };
}
weight_impl_fl!(f32);
weight_impl_fl!(f64);
weight_impl_ord!(u32);
weight_impl_ord!(u64);
