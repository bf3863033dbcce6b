use crate::depth::Depth;

#[test]
fn test_depth_empty() {
    let depth = Depth::new();
    assert_eq!(depth.samples(), 0);
    assert_eq!(depth.mean(), 0);
    assert!(depth.percentiles().is_empty());
}

#[test]
fn test_depth_sample() {
    let mut depth = Depth::new();
    for d in [2, 5, 2, 2].iter() {
        depth.sample(*d);
    }
    assert_eq!(depth.samples(), 4);
    assert_eq!(depth.min(), 2);
    assert_eq!(depth.max(), 5);
    assert_eq!(depth.mean(), 2);
    assert_eq!(depth.percentiles(), vec![(100, 5)]);
}

#[test]
fn test_depth_percentiles() {
    let mut depth = Depth::new();
    (0..9).for_each(|_| depth.sample(2));
    depth.sample(3);
    assert_eq!(depth.percentiles(), vec![(90, 2), (100, 3)]);

    // zero depth is a valid minimum, an empty tree samples it.
    let mut depth = Depth::new();
    depth.sample(0);
    assert_eq!((depth.min(), depth.max()), (0, 0));
}
