/// Can be used while indexing keys without values, like
/// ``Bbtree<K, Empty>``, turning the tree into an ordered set with rank
/// and select.
#[derive(Clone, Debug, Default, Eq, PartialEq, PartialOrd, Ord)]
pub struct Empty {}
