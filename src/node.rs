use std::ops::Deref;

/// Node corresponds to a single entry in Bbtree instance. Color is not a
/// property of the node itself, it describes the link from its parent.
pub struct Node<K, V>
where
    K: Clone + Ord,
    V: Clone,
{
    pub(crate) key: K,
    pub(crate) value: V,
    pub(crate) blue: bool,                     // store: incoming link, blue or black
    pub(crate) size: usize,                    // store: number of nodes in this subtree
    pub(crate) left: Option<Box<Node<K, V>>>,  // store: left child
    pub(crate) right: Option<Box<Node<K, V>>>, // store: right child
}

// Primary operations on a single node.
impl<K, V> Node<K, V>
where
    K: Clone + Ord,
    V: Clone,
{
    // CREATE operation, fresh nodes are always glued to their parent.
    pub(crate) fn new(key: K, value: V) -> Box<Node<K, V>> {
        Box::new(Node {
            key,
            value,
            blue: true,
            size: 1,
            left: None,
            right: None,
        })
    }

    #[inline]
    pub(crate) fn left_deref(&self) -> Option<&Node<K, V>> {
        self.left.as_ref().map(Deref::deref)
    }

    #[inline]
    pub(crate) fn right_deref(&self) -> Option<&Node<K, V>> {
        self.right.as_ref().map(Deref::deref)
    }

    #[inline]
    pub(crate) fn to_entry(&self) -> (K, V) {
        (self.key.clone(), self.value.clone())
    }

    // recompute subtree size from the children.
    #[inline]
    pub(crate) fn resize(&mut self) {
        self.size = size(self.left_deref()) + size(self.right_deref()) + 1;
    }

    #[inline]
    pub(crate) fn set_blue(&mut self) {
        self.blue = true
    }

    #[inline]
    pub(crate) fn set_black(&mut self) {
        self.blue = false
    }

    #[inline]
    pub(crate) fn toggle_link(&mut self) {
        self.blue = !self.blue
    }

    #[inline]
    pub(crate) fn is_blue(&self) -> bool {
        self.blue
    }
}

/// Number of nodes under link, zero for an empty link.
#[inline]
pub(crate) fn size<K, V>(node: Option<&Node<K, V>>) -> usize
where
    K: Clone + Ord,
    V: Clone,
{
    node.map_or(0, |node| node.size)
}

/// Empty links are black.
#[inline]
pub(crate) fn is_blue<K, V>(node: Option<&Node<K, V>>) -> bool
where
    K: Clone + Ord,
    V: Clone,
{
    node.map_or(false, Node::is_blue)
}

#[inline]
pub(crate) fn is_black<K, V>(node: Option<&Node<K, V>>) -> bool
where
    K: Clone + Ord,
    V: Clone,
{
    !is_blue(node)
}
