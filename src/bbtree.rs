use std::{
    borrow::Borrow,
    cmp::{Ord, Ordering},
    fmt, mem,
    ops::DerefMut,
};

use parking_lot::Mutex;

use crate::depth::Depth;
use crate::error::Error;
use crate::node::{is_black, is_blue, size, Node};

/// Bbtree manage a single instance of in-memory index using a black and
/// blue tree, a binary representation of a 2-3 tree where a blue link
/// glues a node to its parent and a black link is a genuine split.
///
/// Blue links lean right, which is the mirror image of the common
/// [left-leaning-red-black][llrb] formulation. Every node carries its
/// subtree size, so rank and select are logarithmic.
///
/// All operations, read or write, serialize on a single lock.
///
/// [llrb]: https://en.wikipedia.org/wiki/Left-leaning_red-black_tree
pub struct Bbtree<K, V>
where
    K: Clone + Ord,
    V: Clone,
{
    name: String,
    root: Mutex<Option<Box<Node<K, V>>>>,
}

/// Different ways to construct a new Bbtree instance.
impl<K, V> Bbtree<K, V>
where
    K: Clone + Ord,
    V: Clone,
{
    /// Create an empty instance of Bbtree, identified by `name`.
    /// Applications can choose unique names.
    pub fn new<S>(name: S) -> Bbtree<K, V>
    where
        S: AsRef<str>,
    {
        Bbtree {
            name: name.as_ref().to_string(),
            root: Mutex::new(None),
        }
    }

    /// Create a new instance of Bbtree and load it with entries from
    /// `iter`. Later duplicates of a key overwrite earlier ones.
    pub fn load_from<S, I>(name: S, iter: I) -> Bbtree<K, V>
    where
        S: AsRef<str>,
        I: Iterator<Item = (K, V)>,
    {
        let bbtree = Bbtree::new(name);
        {
            let mut root = bbtree.root.lock();
            for (key, value) in iter {
                let (mut node, _) = Bbtree::do_put(root.take(), key, value);
                node.set_black();
                *root = Some(node);
            }
            log::debug!("{}: loaded {} entries", bbtree.name, size(root.as_deref()));
        }
        bbtree
    }
}

/// Maintenance API.
impl<K, V> Bbtree<K, V>
where
    K: Clone + Ord,
    V: Clone,
{
    /// Identify this instance. Applications can choose unique names while
    /// creating Bbtree instances.
    #[inline]
    pub fn id(&self) -> String {
        self.name.clone()
    }

    /// Return number of entries in this instance.
    #[inline]
    pub fn len(&self) -> usize {
        size(self.root.lock().as_deref())
    }

    /// Same as [`Bbtree::len`].
    #[inline]
    pub fn size(&self) -> usize {
        self.len()
    }

    /// Check whether this index is empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.root.lock().is_none()
    }

    /// Return quickly with basic statisics, only entries() and
    /// node_size() are valid with this statisics.
    pub fn stats(&self) -> Stats {
        let entries = self.len();
        Stats::new(entries, mem::size_of::<Node<K, V>>())
    }

    /// Validate the tree with following rules:
    ///
    /// * No blue link leans left.
    /// * From root to any leaf, no consecutive blues allowed in its path.
    /// * Number of blacks should be same under left child and right child.
    /// * Subtree size of every node matches its children.
    /// * Make sure keys are in sorted order.
    ///
    /// Additionally return full statistics on the tree. Refer to [`Stats`]
    /// for more information.
    pub fn validate(&self) -> Result<Stats, Error<K>>
    where
        K: fmt::Debug,
    {
        let root = self.root.lock();
        let root = root.as_deref();
        let mut stats = Stats::new(size(root), mem::size_of::<Node<K, V>>());
        stats.set_depths(Depth::new());
        match Bbtree::validate_tree(root, false, 0, 0, &mut stats) {
            Ok(blacks) => {
                stats.set_blacks(blacks);
                Ok(stats)
            }
            Err(err) => {
                log::error!("{}: validate failed, {}", self.name, err);
                Err(err)
            }
        }
    }
}

/// Write operations on Bbtree instance.
impl<K, V> Bbtree<K, V>
where
    K: Clone + Ord,
    V: Clone,
{
    /// Set value for key. If there is an existing entry for key,
    /// overwrite the old value with new value and return the old value.
    pub fn put(&self, key: K, value: V) -> Option<V> {
        let mut root = self.root.lock();
        let (mut node, old_value) = Bbtree::do_put(root.take(), key, value);
        node.set_black();
        *root = Some(node);
        old_value
    }

    /// Same as [`Bbtree::put`], for callers holding an optional value.
    /// A missing value is refused and the index is left untouched.
    pub fn try_put(&self, key: K, value: Option<V>) -> Result<Option<V>, Error<K>> {
        match value {
            Some(value) => Ok(self.put(key, value)),
            None => {
                log::warn!("{}: refusing to put a nil value", self.name);
                Err(Error::NilValue)
            }
        }
    }

    /// Delete key from this instance and return its value. If key is
    /// not present, then delete is effectively a no-op.
    pub fn remove<Q>(&self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        let mut root = self.root.lock();
        if Bbtree::do_find(root.as_deref(), key).is_none() {
            log::debug!("{}: remove of a missing key", self.name);
            return None;
        }
        let node = root.take()?;
        let (node, old_value) = Bbtree::do_remove(node, key);
        *root = Bbtree::blacken(node);
        old_value
    }

    /// Delete the entry with smallest key and return it. No-op on an
    /// empty index.
    pub fn remove_min(&self) -> Option<(K, V)> {
        let mut root = self.root.lock();
        let (node, old_node) = Bbtree::do_remove_min(root.take());
        *root = Bbtree::blacken(node);
        old_node.map(|node| {
            let node = *node;
            (node.key, node.value)
        })
    }

    /// Delete the entry with largest key and return it. No-op on an
    /// empty index.
    pub fn remove_max(&self) -> Option<(K, V)> {
        let mut root = self.root.lock();
        let (node, old_node) = Bbtree::do_remove_max(root.take());
        *root = Bbtree::blacken(node);
        old_node.map(|node| {
            let node = *node;
            (node.key, node.value)
        })
    }

    fn blacken(node: Option<Box<Node<K, V>>>) -> Option<Box<Node<K, V>>> {
        node.map(|mut node| {
            node.set_black();
            node
        })
    }
}

/// Read operations on Bbtree instance.
impl<K, V> Bbtree<K, V>
where
    K: Clone + Ord,
    V: Clone,
{
    /// Get the entry for key.
    pub fn find<Q>(&self, key: &Q) -> Option<(K, V)>
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        let root = self.root.lock();
        Bbtree::do_find(root.as_deref(), key).map(Node::to_entry)
    }

    /// Check whether key is present in this instance.
    pub fn contains<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        let root = self.root.lock();
        Bbtree::do_find(root.as_deref(), key).is_some()
    }

    /// Return the entry with smallest key.
    pub fn min(&self) -> Option<(K, V)> {
        let root = self.root.lock();
        let mut nref = root.as_deref()?;
        while let Some(left) = nref.left_deref() {
            nref = left;
        }
        Some(nref.to_entry())
    }

    /// Return the entry with largest key.
    pub fn max(&self) -> Option<(K, V)> {
        let root = self.root.lock();
        let mut nref = root.as_deref()?;
        while let Some(right) = nref.right_deref() {
            nref = right;
        }
        Some(nref.to_entry())
    }

    /// Return the number of keys strictly less than `key`. `key` need
    /// not be present in the index.
    pub fn rank<Q>(&self, key: &Q) -> usize
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        let root = self.root.lock();
        Bbtree::do_rank(root.as_deref(), key)
    }

    /// Return the entry at 0-indexed position `index` in sort order,
    /// None if index is out of bounds.
    pub fn select(&self, mut index: usize) -> Option<(K, V)> {
        let root = self.root.lock();
        let mut node = root.as_deref();
        while let Some(nref) = node {
            let rank = size(nref.left_deref());
            node = match index.cmp(&rank) {
                Ordering::Less => nref.left_deref(),
                Ordering::Greater => {
                    index -= rank + 1;
                    nref.right_deref()
                }
                Ordering::Equal => return Some(nref.to_entry()),
            };
        }
        None
    }

    /// Return the number of keys between low and high, both inclusive.
    /// A malformed range, where low is greater than high, counts zero.
    pub fn count<Q>(&self, low: &Q, high: &Q) -> usize
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        if low > high {
            return 0;
        }
        let root = self.root.lock();
        let root = root.as_deref();
        let count = Bbtree::do_rank(root, high) - Bbtree::do_rank(root, low);
        match Bbtree::do_find(root, high) {
            Some(_) => count + 1,
            None => count,
        }
    }

    /// Return all entries strictly between low and high, in sort order.
    pub fn range<Q>(&self, low: &Q, high: &Q) -> Vec<(K, V)>
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        let root = self.root.lock();
        let mut acc: Vec<(K, V)> = vec![];
        Bbtree::range_iter(root.as_deref(), low, high, &mut acc);
        acc
    }

    /// Return all entries in this instance, in sort order.
    pub fn in_order(&self) -> Vec<(K, V)> {
        let root = self.root.lock();
        let mut acc: Vec<(K, V)> = Vec::with_capacity(size(root.as_deref()));
        Bbtree::scan_iter(root.as_deref(), &mut acc);
        acc
    }
}

type Upsert<K, V> = (Box<Node<K, V>>, Option<V>);

type Delete<K, V> = (Option<Box<Node<K, V>>>, Option<V>);

type Delmin<K, V> = (Option<Box<Node<K, V>>>, Option<Box<Node<K, V>>>);

impl<K, V> Bbtree<K, V>
where
    K: Clone + Ord,
    V: Clone,
{
    fn do_put(node: Option<Box<Node<K, V>>>, key: K, value: V) -> Upsert<K, V> {
        let mut node = match node {
            None => return (Node::new(key, value), None),
            Some(node) => node,
        };

        match node.key.cmp(&key) {
            Ordering::Greater => {
                let (left, o) = Bbtree::do_put(node.left.take(), key, value);
                node.left = Some(left);
                (Bbtree::fixup(node), o)
            }
            Ordering::Less => {
                let (right, o) = Bbtree::do_put(node.right.take(), key, value);
                node.right = Some(right);
                (Bbtree::fixup(node), o)
            }
            Ordering::Equal => {
                let old_value = mem::replace(&mut node.value, value);
                (Bbtree::fixup(node), Some(old_value))
            }
        }
    }

    // key must be present under node, callers check before descending.
    fn do_remove<Q>(mut node: Box<Node<K, V>>, key: &Q) -> Delete<K, V>
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        if node.key.borrow().lt(key) {
            let right = node.right_deref();
            if is_black(right) && is_black(right.and_then(Node::right_deref)) {
                node = Bbtree::move_blue_right(node);
            }
            let (right, old_value) = match node.right.take() {
                Some(right) => Bbtree::do_remove(right, key),
                None => (None, None),
            };
            node.right = right;
            return (Some(Bbtree::fixup(node)), old_value);
        }

        if is_blue(node.right_deref()) {
            node = Bbtree::rotate_left(node);
        }

        if node.key.borrow().eq(key) && node.left.is_none() {
            let node = *node;
            return (None, Some(node.value));
        }

        let left = node.left_deref();
        if left.is_some() && is_black(left) && is_black(left.and_then(Node::right_deref)) {
            node = Bbtree::move_blue_left(node);
        }

        if node.key.borrow().eq(key) {
            // splice in the predecessor.
            let (left, res_node) = Bbtree::do_remove_max(node.left.take());
            let pred = match res_node {
                Some(pred) => *pred,
                None => panic!("do_remove(): fatal logic, call the programmer"),
            };
            node.left = left;
            node.key = pred.key;
            let old_value = mem::replace(&mut node.value, pred.value);
            (Some(Bbtree::fixup(node)), Some(old_value))
        } else {
            let (left, old_value) = match node.left.take() {
                Some(left) => Bbtree::do_remove(left, key),
                None => (None, None),
            };
            node.left = left;
            (Some(Bbtree::fixup(node)), old_value)
        }
    }

    fn do_remove_min(node: Option<Box<Node<K, V>>>) -> Delmin<K, V> {
        let mut node = match node {
            None => return (None, None),
            Some(node) => node,
        };
        if is_blue(node.right_deref()) {
            node = Bbtree::rotate_left(node);
        }
        if node.left.is_none() {
            return (None, Some(node));
        }
        let left = node.left_deref();
        if is_black(left) && is_black(left.and_then(Node::right_deref)) {
            node = Bbtree::move_blue_left(node);
        }
        let (left, old_node) = Bbtree::do_remove_min(node.left.take());
        node.left = left;
        (Some(Bbtree::fixup(node)), old_node)
    }

    fn do_remove_max(node: Option<Box<Node<K, V>>>) -> Delmin<K, V> {
        let mut node = match node {
            None => return (None, None),
            Some(node) => node,
        };
        if node.right.is_none() {
            return (None, Some(node));
        }
        let right = node.right_deref();
        if is_black(right) && is_black(right.and_then(Node::right_deref)) {
            node = Bbtree::move_blue_right(node);
        }
        let (right, old_node) = Bbtree::do_remove_max(node.right.take());
        node.right = right;
        (Some(Bbtree::fixup(node)), old_node)
    }

    fn do_find<'a, Q>(node: Option<&'a Node<K, V>>, key: &Q) -> Option<&'a Node<K, V>>
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        let mut node = node;
        while let Some(nref) = node {
            node = match nref.key.borrow().cmp(key) {
                Ordering::Less => nref.right_deref(),
                Ordering::Greater => nref.left_deref(),
                Ordering::Equal => return Some(nref),
            };
        }
        None
    }

    fn do_rank<Q>(node: Option<&Node<K, V>>, key: &Q) -> usize
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        let (mut node, mut rank) = (node, 0);
        while let Some(nref) = node {
            node = match nref.key.borrow().cmp(key) {
                Ordering::Greater => nref.left_deref(),
                Ordering::Less => {
                    rank += size(nref.left_deref()) + 1;
                    nref.right_deref()
                }
                Ordering::Equal => return rank + size(nref.left_deref()),
            };
        }
        rank
    }

    fn scan_iter(node: Option<&Node<K, V>>, acc: &mut Vec<(K, V)>) {
        if let Some(node) = node {
            Bbtree::scan_iter(node.left_deref(), acc);
            acc.push(node.to_entry());
            Bbtree::scan_iter(node.right_deref(), acc);
        }
    }

    fn range_iter<Q>(node: Option<&Node<K, V>>, low: &Q, high: &Q, acc: &mut Vec<(K, V)>)
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        let node = match node {
            None => return,
            Some(node) => node,
        };
        let (above_low, below_high) = (node.key.borrow().gt(low), node.key.borrow().lt(high));
        if above_low {
            Bbtree::range_iter(node.left_deref(), low, high, acc);
        }
        if above_low && below_high {
            acc.push(node.to_entry());
        }
        if below_high {
            Bbtree::range_iter(node.right_deref(), low, high, acc);
        }
    }

    fn validate_tree(
        node: Option<&Node<K, V>>,
        fromblue: bool,
        mut nb: usize,
        depth: usize,
        stats: &mut Stats,
    ) -> Result<usize, Error<K>> {
        let node = match node {
            None => {
                if let Some(depths) = stats.depths.as_mut() {
                    depths.sample(depth);
                }
                return Ok(nb);
            }
            Some(node) => node,
        };

        let blue = node.is_blue();
        if fromblue && blue {
            return Err(Error::ConsecutiveBlues);
        }
        if is_blue(node.left_deref()) {
            return Err(Error::LeftBlue);
        }
        if !blue {
            nb += 1;
        }
        let (left, right) = (node.left_deref(), node.right_deref());
        let lblacks = Bbtree::validate_tree(left, blue, nb, depth + 1, stats)?;
        let rblacks = Bbtree::validate_tree(right, blue, nb, depth + 1, stats)?;
        if lblacks != rblacks {
            let err = format!("left: {} right: {}", lblacks, rblacks);
            return Err(Error::UnbalancedBlacks(err));
        }
        if node.size != size(left) + size(right) + 1 {
            let err = format!("size: {} left: {} right: {}", node.size, size(left), size(right));
            return Err(Error::SizeMismatch(err));
        }
        if let Some(left) = left {
            if left.key.ge(&node.key) {
                return Err(Error::SortError(left.key.clone(), node.key.clone()));
            }
        }
        if let Some(right) = right {
            if right.key.le(&node.key) {
                return Err(Error::SortError(right.key.clone(), node.key.clone()));
            }
        }
        Ok(lblacks)
    }

    //--------- rotation routines for 2-3 algorithm ----------------

    //              (i)                       (i)
    //               |                         |
    //              node                       x
    //              /  \                      / \
    //             /    (b)                 (b)  \
    //            /       \                 /     \
    //          left       x             node      xr
    //                    / \            /  \
    //                  xl   xr       left   xl
    //
    fn rotate_left(mut node: Box<Node<K, V>>) -> Box<Node<K, V>> {
        let mut x = match node.right.take() {
            Some(x) if x.is_blue() => x,
            _ => panic!("rotate_left(): rotating a black link ? Call the programmer"),
        };
        node.right = x.left.take();
        x.blue = node.blue;
        x.size = node.size;
        node.set_blue();
        node.resize();
        x.left = Some(node);
        x
    }

    //              (i)                       (i)
    //               |                         |
    //              node                       x
    //              /  \                      / \
    //            (b)   \                   (b)  \
    //           /       \                 /      \
    //          x       right             xl      node
    //         / \                                / \
    //       xl   xr                             xr  right
    //
    fn rotate_right(mut node: Box<Node<K, V>>) -> Box<Node<K, V>> {
        let mut x = match node.left.take() {
            Some(x) if x.is_blue() => x,
            _ => panic!("rotate_right(): rotating a black link ? Call the programmer"),
        };
        node.left = x.right.take();
        x.blue = node.blue;
        x.size = node.size;
        node.set_blue();
        node.resize();
        x.right = Some(node);
        x
    }

    //        (x)                   (!x)
    //         |                     |
    //        node                  node
    //        / \                   / \
    //      (y) (z)              (!y) (!z)
    //     /      \              /      \
    //   left    right         left    right
    //
    fn flip(node: &mut Node<K, V>) {
        match (node.left.as_mut(), node.right.as_mut()) {
            (Some(left), Some(right)) => {
                left.toggle_link();
                right.toggle_link();
            }
            _ => panic!("flip(): missing child link ? Call the programmer"),
        }
        node.toggle_link();
    }

    fn fixup(mut node: Box<Node<K, V>>) -> Box<Node<K, V>> {
        if is_blue(node.left_deref()) && is_black(node.right_deref()) {
            node = Bbtree::rotate_right(node);
        }
        node = {
            let right = node.right_deref();
            if is_blue(right) && is_blue(right.and_then(Node::right_deref)) {
                Bbtree::rotate_left(node)
            } else {
                node
            }
        };
        if is_blue(node.right_deref()) && is_blue(node.left_deref()) {
            Bbtree::flip(node.deref_mut());
        }
        node.resize();
        node
    }

    fn move_blue_left(mut node: Box<Node<K, V>>) -> Box<Node<K, V>> {
        Bbtree::flip(node.deref_mut());
        let right = node.right_deref();
        if is_blue(right.and_then(Node::right_deref)) {
            node = Bbtree::rotate_left(node);
            Bbtree::flip(node.deref_mut());
        }
        node
    }

    fn move_blue_right(mut node: Box<Node<K, V>>) -> Box<Node<K, V>> {
        Bbtree::flip(node.deref_mut());
        let left = node.left_deref();
        if is_blue(left.and_then(Node::right_deref)) {
            node.left = node.left.take().map(Bbtree::rotate_left);
            node = Bbtree::rotate_right(node);
            Bbtree::flip(node.deref_mut());
        }
        node
    }
}

/// Statistics on [`Bbtree`] tree. Serves two purpose:
///
/// * To get partial but quick statistics via [`Bbtree::stats`] method.
/// * To get full statisics via [`Bbtree::validate`] method.
#[derive(Default, Debug)]
pub struct Stats {
    entries: usize, // number of entries in the tree.
    node_size: usize,
    blacks: Option<usize>,
    depths: Option<Depth>,
}

impl Stats {
    fn new(entries: usize, node_size: usize) -> Stats {
        Stats {
            entries,
            node_size,
            blacks: Default::default(),
            depths: Default::default(),
        }
    }

    #[inline]
    fn set_blacks(&mut self, blacks: usize) {
        self.blacks = Some(blacks)
    }

    #[inline]
    fn set_depths(&mut self, depths: Depth) {
        self.depths = Some(depths)
    }

    /// Return number entries in [`Bbtree`] instance.
    #[inline]
    pub fn entries(&self) -> usize {
        self.entries
    }

    /// Return node-size, including over-head for `Bbtree<k,V>`. Although
    /// the node overhead is constant, the node size varies based on
    /// key and value types. EG:
    ///
    /// ```
    /// use bbtree_index::Bbtree;
    /// let bbtree: Bbtree<u64,u64> = Bbtree::new("myinstance");
    ///
    /// // size of key: 8 bytes
    /// // size of value: 8 bytes
    /// // overhead is 32 bytes
    /// assert_eq!(bbtree.stats().node_size(), 48);
    /// ```
    #[inline]
    pub fn node_size(&self) -> usize {
        self.node_size
    }

    /// Return number of black links from root to any empty link.
    #[inline]
    pub fn blacks(&self) -> Option<usize> {
        self.blacks
    }

    /// Return [`Depth`] statistics, available only after validate().
    pub fn depths(&self) -> Option<Depth> {
        match &self.depths {
            Some(depths) if depths.samples() > 0 => Some(depths.clone()),
            _ => None,
        }
    }
}
