use crate::node::{is_black, is_blue, size, Node};

#[test]
fn test_new_node() {
    let node: Box<Node<i64, i64>> = Node::new(10, 100);
    assert!(node.is_blue());
    assert_eq!(node.size, 1);
    assert!(node.left.is_none() && node.right.is_none());
    assert_eq!(node.to_entry(), (10, 100));
}

#[test]
fn test_link_predicates() {
    let mut node: Box<Node<i64, i64>> = Node::new(10, 100);
    assert!(is_blue(Some(&*node)));
    assert_eq!(size(Some(&*node)), 1);

    node.set_black();
    assert!(!is_blue(Some(&*node)));
    assert!(is_black(Some(&*node)));
    node.toggle_link();
    assert!(is_blue(Some(&*node)));

    // empty links are black and hold nothing.
    assert!(!is_blue::<i64, i64>(None));
    assert!(is_black::<i64, i64>(None));
    assert_eq!(size::<i64, i64>(None), 0);
}

#[test]
fn test_resize() {
    let mut node: Box<Node<i64, i64>> = Node::new(10, 100);
    let mut left = Node::new(5, 50);
    left.left = Some(Node::new(1, 10));
    left.resize();
    node.left = Some(left);
    node.right = Some(Node::new(20, 200));
    node.resize();
    assert_eq!(node.size, 4);
    assert_eq!(size(node.left_deref()), 2);
    assert_eq!(size(node.right_deref()), 1);
}
