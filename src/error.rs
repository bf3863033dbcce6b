use std::{error, fmt};

/// Error enumerates over all possible errors that this package
/// shall return.
#[derive(Debug, PartialEq)]
pub enum Error<K>
where
    K: Clone + Ord,
{
    /// Returned by try_put() API when the value is missing.
    NilValue,
    /// Fatal case, a blue link is leaning left.
    LeftBlue,
    /// Fatal case, two blue links in a row along a path.
    ConsecutiveBlues,
    /// Fatal case, paths to empty links cross different number of
    /// black links. The String component of this variant can be used
    /// for debugging.
    UnbalancedBlacks(String),
    /// Fatal case, index entries are not in sort-order.
    SortError(K, K),
    /// Fatal case, subtree size does not match its children.
    SizeMismatch(String),
}

impl<K> fmt::Display for Error<K>
where
    K: Clone + Ord + fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::NilValue => write!(f, "value must not be nil"),
            Error::LeftBlue => write!(f, "blue link leaning left"),
            Error::ConsecutiveBlues => write!(f, "consecutive blue links"),
            Error::UnbalancedBlacks(s) => write!(f, "unbalanced blacks, {}", s),
            Error::SortError(a, b) => write!(f, "sort error {:?} {:?}", a, b),
            Error::SizeMismatch(s) => write!(f, "size mismatch, {}", s),
        }
    }
}

impl<K> error::Error for Error<K> where K: Clone + Ord + fmt::Debug {}
