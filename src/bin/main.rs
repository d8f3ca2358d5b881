use std::{fmt, ptr::NonNull};

use cordyceps::Linked;
use cordyceps_tbtree::{Links, ThreadedTree, TreeNode};

#[derive(Debug)]
#[repr(C)]
struct TestNode {
    links: Links<TestNode>,
    key: u32,
}

impl TestNode {
    fn new(key: u32) -> Box<TestNode> {
        Box::new(TestNode {
            links: Links::new(),
            key,
        })
    }
}

unsafe impl Linked<Links<TestNode>> for TestNode {
    type Handle = Box<TestNode>;

    fn into_ptr(r: Self::Handle) -> NonNull<Self> {
        NonNull::from(Box::leak(r))
    }

    unsafe fn from_ptr(ptr: NonNull<Self>) -> Self::Handle {
        unsafe { Box::from_raw(ptr.as_ptr()) }
    }

    unsafe fn links(ptr: NonNull<Self>) -> NonNull<Links<TestNode>> {
        // SAFETY: Self is #[repr(C)] and `links` is first field
        ptr.cast()
    }
}

impl TreeNode<Links<TestNode>> for TestNode {
    type Key = u32;

    fn key(&self) -> &Self::Key {
        &self.key
    }
}

struct Label(u32);

impl From<&u32> for Label {
    fn from(key: &u32) -> Self {
        Label(*key)
    }
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

fn main() -> fmt::Result {
    let mut tree: ThreadedTree<TestNode> = ThreadedTree::new();

    for key in [4, 2, 6, 1, 3, 5, 7] {
        if let Err(occupied) = tree.insert(TestNode::new(key)) {
            println!("{occupied}");
        }
        tree.assert_invariants();
        println!("{tree:?}");
    }

    if let Err(occupied) = tree.insert(TestNode::new(4)) {
        println!("{occupied}");
    }

    println!("ceiling(0) = {:?}", tree.ceiling(&0).map(|node| node.key));
    println!("reversed: {:?}", tree.iter().rev().map(|node| node.key).collect::<Vec<_>>());

    let mut graph = String::new();
    tree.dotgraph::<_, Label>("demo", &mut graph)?;
    println!("{graph}");

    let four = tree.remove(&4).map(|node| node.key);
    assert_eq!(four, Some(4));
    tree.assert_invariants();
    println!("{tree:?}");

    drop(tree);
    Ok(())
}
