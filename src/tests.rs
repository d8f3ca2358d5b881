extern crate std;

use core::{fmt, ptr};
use std::{format, ops::Range, prelude::v1::*, vec};

use cordyceps::Linked;

use proptest::prelude::*;

use crate::model::{self, TestNode};

use super::*;

fn links<'a>(node: NonNull<TestNode>) -> &'a Links<TestNode> {
    unsafe { TestNode::links(node).as_ref() }
}

fn key_of(node: NonNull<TestNode>) -> u32 {
    unsafe { node.as_ref().key }
}

fn keys(tree: &ThreadedTree<TestNode>) -> Vec<u32> {
    tree.iter().map(|node| node.key).collect()
}

fn permutations(keys: &[u32]) -> Vec<Vec<u32>> {
    if keys.len() <= 1 {
        return vec![keys.to_vec()];
    }

    let mut out = Vec::new();
    for (i, &first) in keys.iter().enumerate() {
        let mut rest = keys.to_vec();
        rest.remove(i);

        for mut tail in permutations(&rest) {
            tail.insert(0, first);
            out.push(tail);
        }
    }

    out
}

fn build(keys: &[u32]) -> ThreadedTree<TestNode> {
    let mut tree = ThreadedTree::new();

    for &key in keys {
        tree.insert(TestNode::new(key)).unwrap();
        tree.assert_invariants();
    }

    tree
}

fn insert_find_all(keys: &[u32]) {
    let tree = build(keys);

    for key in keys {
        let node = tree.get_raw(key).expect("item not found");
        assert_eq!(key_of(node), *key);
        assert_eq!(tree.ceiling_raw(key), Some(node));
    }

    let mut sorted = keys.to_vec();
    sorted.sort_unstable();
    assert_eq!(keys_of_tree(&tree), sorted);
}

fn keys_of_tree(tree: &ThreadedTree<TestNode>) -> Vec<u32> {
    let forward = keys(tree);
    let mut backward: Vec<u32> = tree.iter().rev().map(|node| node.key).collect();
    backward.reverse();
    assert_eq!(forward, backward);
    forward
}

fn insert_remove(insert_order: &[u32], remove_order: &[u32]) {
    let mut tree = build(insert_order);
    let mut expected: Vec<u32> = keys(&tree);

    for key in remove_order {
        let node = tree.get_raw(key).expect("item not found");
        let removed = unsafe { tree.remove_at(node) };
        assert_eq!(removed.key, *key);
        tree.assert_invariants();

        expected.retain(|k| k != key);
        assert_eq!(keys_of_tree(&tree), expected);
    }

    assert!(tree.is_empty());
}

#[test]
fn zero_elems_find() {
    insert_find_all(&[]);
}

#[test]
fn single_elem_find() {
    insert_find_all(&[0]);
}

#[test]
fn all_orders_find() {
    for n in 2..=5 {
        let keys: Vec<u32> = (0..n).collect();

        for order in permutations(&keys) {
            insert_find_all(&order);
        }
    }
}

#[test]
fn all_orders_remove() {
    for n in 1..=4 {
        let keys: Vec<u32> = (0..n).collect();
        let orders = permutations(&keys);

        for insert_order in &orders {
            for remove_order in &orders {
                insert_remove(insert_order, remove_order);
            }
        }
    }
}

#[test]
fn empty_tree() {
    let tree: ThreadedTree<TestNode> = ThreadedTree::new();
    assert!(tree.is_empty());
    assert_eq!(tree.len(), 0);
    assert!(tree.root().is_none());
    assert!(tree.first().is_none());
    assert!(tree.last().is_none());
    assert!(tree.get(&0).is_none());
    assert!(tree.ceiling(&0).is_none());
    assert!(tree.iter().next().is_none());
    tree.assert_invariants();
}

#[test]
fn insert_duplicate_and_remove_root() {
    let mut tree: ThreadedTree<TestNode> = ThreadedTree::default();

    tree.insert(TestNode::new(123)).unwrap();
    let first = tree.root.unwrap();
    assert_eq!(key_of(first), 123);
    assert_eq!(tree.first().unwrap().key, 123);
    assert_eq!(tree.last().unwrap().key, 123);
    assert_eq!(links(first).parent(), None);
    assert_eq!(links(first).slot(Dir::Left), None);
    assert_eq!(links(first).slot(Dir::Right), None);
    assert!(links(first).is_leaf());
    unsafe {
        assert_eq!(tree.predecessor(first), None);
        assert_eq!(tree.successor(first), None);
    }

    {
        let occupied = tree.insert(TestNode::new(123)).unwrap_err();
        assert!(ptr::eq(occupied.existing().get_ref(), first.as_ptr()));
        assert_eq!(occupied.rejected().key, 123);
    }
    assert_eq!(tree.len(), 1);
    tree.assert_invariants();

    tree.insert(TestNode::new(456)).unwrap();
    let root = tree.root.unwrap();
    let high = tree.get_raw(&456).unwrap();
    assert_eq!(root, first);
    assert!(!links(root).is_leaf());
    assert!(links(root).is_thread(Dir::Left));
    assert!(!links(root).is_thread(Dir::Right));
    assert_eq!(tree.first().unwrap().key, 123);
    assert_eq!(tree.last().unwrap().key, 456);
    assert_eq!(links(high).parent(), Some(root));
    assert_eq!(links(high).slot(Dir::Left), Some(root));
    assert_eq!(links(high).slot(Dir::Right), None);
    assert!(links(high).is_leaf());
    unsafe {
        assert_eq!(tree.predecessor(high), Some(root));
        assert_eq!(tree.successor(high), None);
    }

    tree.insert(TestNode::new(0)).unwrap();
    let low = tree.get_raw(&0).unwrap();
    assert_eq!(tree.root.unwrap(), root);
    assert!(!links(root).is_thread(Dir::Left));
    assert!(!links(root).is_thread(Dir::Right));
    assert_eq!(tree.first().unwrap().key, 0);
    assert_eq!(tree.last().unwrap().key, 456);
    assert_eq!(links(low).parent(), Some(root));
    assert_eq!(links(low).slot(Dir::Left), None);
    assert_eq!(links(low).slot(Dir::Right), Some(root));
    assert!(links(low).is_leaf());
    unsafe {
        assert_eq!(tree.predecessor(low), None);
        assert_eq!(tree.successor(low), Some(root));
    }
    tree.assert_invariants();

    // Move the minimum to the top and back.
    unsafe {
        (*low.as_ptr()).key = 777;
        tree.reinsert(low).unwrap();
    }
    tree.assert_invariants();
    assert_eq!(tree.last_raw(), Some(low));

    unsafe {
        (*low.as_ptr()).key = 0;
        tree.reinsert(low).unwrap();
    }
    tree.assert_invariants();
    assert_eq!(tree.first_raw(), Some(low));

    let mut removed = Vec::new();
    while let Some(root) = tree.root {
        let node = unsafe { tree.remove_at(root) };
        assert!(ptr::eq(&*node, root.as_ptr()));
        removed.push(node.key);
        tree.assert_invariants();
    }

    assert_eq!(removed, [123, 456, 0]);
    assert!(tree.is_empty());
    assert!(tree.first().is_none());
    assert!(tree.last().is_none());
}

#[test]
fn remove_last() {
    let values = [1, 2, 3, 4, 5];
    let mut tree: ThreadedTree<TestNode> = ThreadedTree::new();

    for (i, &value) in values.iter().enumerate() {
        tree.insert(TestNode::new(value)).unwrap();
        assert_eq!(keys(&tree), values[..=i]);
    }

    let mut removals = 0;
    while let Some(node) = tree.pop_last() {
        removals += 1;
        assert_eq!(node.key, values[values.len() - removals]);
        assert_eq!(keys(&tree), values[..values.len() - removals]);
        tree.assert_invariants();
    }

    assert_eq!(removals, 5);
    assert!(tree.is_empty());
}

#[test]
fn remove_first() {
    let values = [5, 4, 3, 2, 1];
    let mut tree: ThreadedTree<TestNode> = ThreadedTree::new();

    for (i, &value) in values.iter().enumerate() {
        tree.insert(TestNode::new(value)).unwrap();

        let reversed: Vec<u32> = tree.iter().rev().map(|node| node.key).collect();
        assert_eq!(reversed, values[..=i]);
    }

    let mut removals = 0;
    while let Some(node) = tree.pop_first() {
        removals += 1;
        assert_eq!(node.key, values[values.len() - removals]);

        let reversed: Vec<u32> = tree.iter().rev().map(|node| node.key).collect();
        assert_eq!(reversed, values[..values.len() - removals]);
        tree.assert_invariants();
    }

    assert_eq!(removals, 5);
    assert!(tree.is_empty());
}

#[test]
fn neighbours_are_symmetric() {
    let tree = build(&[50, 20, 70, 10, 30, 60, 80, 25, 35, 65]);

    let first = tree.first_raw().unwrap();
    let last = tree.last_raw().unwrap();

    unsafe {
        assert_eq!(tree.predecessor(first), None);
        assert_eq!(tree.successor(last), None);

        let mut cur = first;
        let mut count = 1;
        while let Some(next) = tree.successor(cur) {
            assert!(key_of(cur) < key_of(next));
            assert_eq!(tree.predecessor(next), Some(cur));
            cur = next;
            count += 1;
        }

        assert_eq!(cur, last);
        assert_eq!(count, tree.len());
    }
}

type Shape = Vec<(u32, Option<u32>, bool, Option<u32>, bool, Option<u32>)>;

// Captures every link of every node, by key.
fn shape(tree: &ThreadedTree<TestNode>) -> Shape {
    tree.iter()
        .map(|node| {
            let ptr = NonNull::from(node);
            let links = links(ptr);

            (
                node.key,
                links.parent().map(key_of),
                links.is_thread(Dir::Left),
                links.slot(Dir::Left).map(key_of),
                links.is_thread(Dir::Right),
                links.slot(Dir::Right).map(key_of),
            )
        })
        .collect()
}

#[test]
fn insert_then_remove_restores_shape() {
    let mut tree = build(&[50, 20, 70, 10, 30, 60, 80, 25, 35]);
    let before = shape(&tree);

    for key in [0, 5, 15, 22, 27, 33, 40, 55, 65, 75, 90] {
        tree.insert(TestNode::new(key)).unwrap();
        tree.assert_invariants();

        let removed = tree.remove(&key).unwrap();
        assert_eq!(removed.key, key);
        tree.assert_invariants();

        assert_eq!(shape(&tree), before, "inserting and removing {key}");
    }
}

#[test]
fn duplicate_is_rejected() {
    let mut tree = build(&[3, 1, 2]);
    let before = shape(&tree);

    let occupied = tree.insert(TestNode::new(2)).unwrap_err();
    assert_eq!(occupied.existing().key, 2);
    assert_eq!(format!("{occupied:?}"), "Occupied { key: 2, .. }");

    let rejected = occupied.into_rejected();
    assert_eq!(rejected.key, 2);
    assert_eq!(links(NonNull::from(&*rejected)).parent(), None);

    assert_eq!(tree.len(), 3);
    assert_eq!(shape(&tree), before);
}

#[test]
fn ceiling() {
    let tree = build(&[20, 10, 30]);

    let ceil = |key: u32| tree.ceiling(&key).map(|node| node.key);
    assert_eq!(ceil(0), Some(10));
    assert_eq!(ceil(10), Some(10));
    assert_eq!(ceil(11), Some(20));
    assert_eq!(ceil(20), Some(20));
    assert_eq!(ceil(25), Some(30));
    assert_eq!(ceil(30), Some(30));
    assert_eq!(ceil(31), None);
}

#[test]
fn ceiling_follows_right_thread() {
    // 5 is a left leaf whose right thread is the only candidate above 7.
    let tree = build(&[10, 5]);
    assert_eq!(tree.ceiling(&7).map(|node| node.key), Some(10));

    let tree = build(&[10, 5, 7]);
    assert_eq!(tree.ceiling(&8).map(|node| node.key), Some(10));
    assert_eq!(tree.ceiling(&6).map(|node| node.key), Some(7));
}

#[test]
fn reinsert_in_place_is_noop() {
    let mut tree = build(&[20, 10, 30]);
    let node = tree.get_raw(&20).unwrap();
    let left = links(node).slot(Dir::Left);
    let right = links(node).slot(Dir::Right);

    unsafe {
        (*node.as_ptr()).key = 25;
        tree.reinsert(node).unwrap();
    }

    tree.assert_invariants();
    assert_eq!(tree.root, Some(node));
    assert_eq!(links(node).slot(Dir::Left), left);
    assert_eq!(links(node).slot(Dir::Right), right);
    assert_eq!(keys(&tree), [10, 25, 30]);
}

#[test]
fn reinsert_moves_node() {
    let mut tree = build(&[20, 10, 30, 5, 15, 25, 35]);
    let node = tree.get_raw(&15).unwrap();

    unsafe {
        (*node.as_ptr()).key = 27;
        tree.reinsert(node).unwrap();
    }

    tree.assert_invariants();
    assert_eq!(keys(&tree), [5, 10, 20, 25, 27, 30, 35]);
    assert_eq!(tree.get_raw(&27), Some(node));
}

#[test]
fn reinsert_collision_detaches() {
    let mut tree = build(&[20, 10, 30]);
    let node = tree.get_raw(&10).unwrap();

    let rejected = unsafe {
        (*node.as_ptr()).key = 30;
        let occupied = tree.reinsert(node).unwrap_err();
        assert_eq!(occupied.existing().key, 30);
        assert!(!ptr::eq(occupied.existing().get_ref(), node.as_ptr()));
        occupied.into_rejected()
    };

    assert!(ptr::eq(&*rejected, node.as_ptr()));
    tree.assert_invariants();
    assert_eq!(tree.len(), 2);
    assert_eq!(keys(&tree), [20, 30]);
}

#[test]
fn iter_from_both_ends() {
    let tree = build(&[3, 1, 4, 5, 2]);

    let mut iter = tree.iter();
    assert_eq!(iter.len(), 5);
    assert_eq!(iter.next().map(|n| n.key), Some(1));
    assert_eq!(iter.next_back().map(|n| n.key), Some(5));
    assert_eq!(iter.len(), 3);

    let rest: Vec<u32> = iter.map(|n| n.key).collect();
    assert_eq!(rest, [2, 3, 4]);

    let all: Vec<u32> = (&tree).into_iter().map(|n| n.key).collect();
    assert_eq!(all, [1, 2, 3, 4, 5]);
    assert_eq!(format!("{tree:?}"), "{1, 2, 3, 4, 5}");
}

#[test]
fn cursor_resumes_from_ceiling() {
    let tree = build(&[6, 2, 8, 0, 4]);

    let resumed: Vec<u32> = tree.cursor_ceiling(&3).map(|n| n.key).collect();
    assert_eq!(resumed, [4, 6, 8]);

    let mut curs = tree.cursor_ceiling(&9);
    assert!(curs.get().is_none());
    assert_eq!(curs.peek_next().map(|n| n.key), Some(0));
    assert_eq!(curs.peek_prev().map(|n| n.key), Some(8));

    curs.move_prev();
    assert_eq!(curs.get().map(|n| n.key), Some(8));

    let mut curs = tree.cursor_last();
    curs.move_next();
    assert!(curs.get().is_none());
    curs.move_next();
    assert_eq!(curs.get().map(|n| n.key), Some(0));
    assert_eq!(tree.cursor_first().get().map(|n| n.key), Some(0));
}

#[test]
fn remove_while_iterating() {
    let mut tree = build(&[5, 2, 8, 1, 3, 7, 9, 0, 4, 6]);

    let mut removed = Vec::new();
    let mut curs = tree.cursor_first_mut();
    while let Some(key) = curs.get().map(|node| node.key) {
        if key % 2 == 0 {
            removed.push(curs.remove_current().unwrap().key);
        } else {
            curs.move_next();
        }
    }
    drop(curs);

    tree.assert_invariants();
    assert_eq!(removed, [0, 2, 4, 6, 8]);
    assert_eq!(keys(&tree), [1, 3, 5, 7, 9]);

    let mut curs = tree.cursor_last_mut();
    while curs.get().is_some() {
        curs.remove_current_and_move_prev();
    }
    drop(curs);

    tree.assert_invariants();
    assert!(tree.is_empty());
}

#[test]
fn cursor_rekeys_current() {
    let mut tree = build(&[4, 2, 6, 1, 3, 5, 7]);
    let node = tree.get_raw(&3).unwrap();

    let mut curs = unsafe { tree.cursor_at_mut(node) };
    unsafe { curs.get_mut().unwrap().get_unchecked_mut().key = 10 };
    curs.reinsert_current().unwrap();
    assert_eq!(curs.get().map(|n| n.key), Some(10));
    assert_eq!(curs.peek_prev().map(|n| n.key), Some(7));

    unsafe { curs.get_mut().unwrap().get_unchecked_mut().key = 1 };
    let rejected = curs.reinsert_current().unwrap_err().into_rejected();
    assert_eq!(rejected.key, 1);
    assert!(curs.get().is_none());
    drop(curs);

    tree.assert_invariants();
    assert_eq!(keys(&tree), [1, 2, 4, 5, 6, 7]);
}

#[test]
fn clear() {
    let mut tree = build(&[3, 1, 2, 5, 4]);
    tree.clear();
    assert!(tree.is_empty());
    tree.assert_invariants();

    tree.insert(TestNode::new(9)).unwrap();
    assert_eq!(keys(&tree), [9]);
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

#[test]
fn dotgraph() {
    let empty: ThreadedTree<TestNode> = ThreadedTree::new();
    let mut out = String::new();
    empty.dotgraph::<_, Label>("e", &mut out).unwrap();
    assert_eq!(out, "digraph \"graph-e\" {}");

    let tree = build(&[2, 1, 3]);
    let mut out = String::new();
    tree.dotgraph::<_, Label>("t", &mut out).unwrap();

    assert!(out.contains("\"grapht-2\":sw -> \"grapht-1\";"));
    assert!(out.contains("\"grapht-2\":se -> \"grapht-3\";"));
    assert!(out.contains("\"grapht-1\":sw -> \"grapht-nil\" [style=dashed"));
    assert!(out.contains("\"grapht-1\":se -> \"grapht-2\" [style=dashed"));
    assert!(out.contains("\"grapht-3\":sw -> \"grapht-2\" [style=dashed"));
    assert!(out.contains("\"grapht-3\":se -> \"grapht-nil\" [style=dashed"));
}

// An element indexed by two trees at once, through two traversal slots. The trees only borrow
// the elements, which stay owned by the `Vec`.
struct Person {
    by_age: Links<Person>,
    by_name: Links<ByName>,
    age: u32,
    name: &'static str,
}

#[repr(transparent)]
struct ByName(Person);

unsafe impl Linked<Links<Person>> for Person {
    type Handle = NonNull<Person>;

    fn into_ptr(r: Self::Handle) -> NonNull<Self> {
        r
    }

    unsafe fn from_ptr(ptr: NonNull<Self>) -> Self::Handle {
        ptr
    }

    unsafe fn links(ptr: NonNull<Self>) -> NonNull<Links<Person>> {
        let ptr = ptr.as_ptr();
        unsafe { NonNull::new_unchecked(ptr::addr_of_mut!((*ptr).by_age)) }
    }
}

impl TreeNode<Links<Person>> for Person {
    type Key = u32;

    fn key(&self) -> &Self::Key {
        &self.age
    }
}

unsafe impl Linked<Links<ByName>> for ByName {
    type Handle = NonNull<ByName>;

    fn into_ptr(r: Self::Handle) -> NonNull<Self> {
        r
    }

    unsafe fn from_ptr(ptr: NonNull<Self>) -> Self::Handle {
        ptr
    }

    unsafe fn links(ptr: NonNull<Self>) -> NonNull<Links<ByName>> {
        let ptr = ptr.as_ptr();
        unsafe { NonNull::new_unchecked(ptr::addr_of_mut!((*ptr).0.by_name)) }
    }
}

impl TreeNode<Links<ByName>> for ByName {
    type Key = &'static str;

    fn key(&self) -> &Self::Key {
        &self.0.name
    }
}

#[test]
fn two_trees_share_elements() {
    let mut people: Vec<Person> = [(31, "carol"), (25, "alice"), (40, "bob")]
        .into_iter()
        .map(|(age, name)| Person {
            by_age: Links::new(),
            by_name: Links::new(),
            age,
            name,
        })
        .collect();
    let base = people.as_mut_ptr();

    let mut by_age: ThreadedTree<Person> = ThreadedTree::new();
    let mut by_name: ThreadedTree<ByName> = ThreadedTree::new();

    for i in 0..3 {
        let person = unsafe { NonNull::new_unchecked(base.add(i)) };
        by_age.insert(person).unwrap();
        by_name.insert(person.cast::<ByName>()).unwrap();
    }

    by_age.assert_invariants();
    by_name.assert_invariants();

    let ages: Vec<u32> = by_age.iter().map(|p| p.age).collect();
    let names: Vec<&str> = by_name.iter().map(|p| p.0.name).collect();
    assert_eq!(ages, [25, 31, 40]);
    assert_eq!(names, ["alice", "bob", "carol"]);

    // Leaving one tree does not disturb the other.
    let bob = by_age.remove(&40).unwrap();
    assert_eq!(unsafe { bob.as_ref().name }, "bob");
    by_age.assert_invariants();
    by_name.assert_invariants();
    assert_eq!(by_name.get(&"bob").map(|p| p.0.age), Some(40));
    assert_eq!(by_name.ceiling(&"b").map(|p| p.0.name), Some("bob"));

    drop(by_age);
    drop(by_name);
    assert_eq!(people.len(), 3);
}

#[cfg(miri)]
const FUZZ_RANGE: Range<usize> = 0..10;

#[cfg(not(miri))]
const FUZZ_RANGE: Range<usize> = 0..1000;

proptest::proptest! {
    #![proptest_config(ProptestConfig {
        max_shrink_iters: 65536,
        .. ProptestConfig::default()
    })]

    #[test]
    fn btree_equivalence(ops in proptest::collection::vec(model::op_strategy(), FUZZ_RANGE)) {
        model::run_btree_equivalence(ops);
    }

    #[test]
    fn cursor_equivalence(
        values in proptest::collection::vec(0u32..1000, 0..100),
        ops in proptest::collection::vec(model::cursor_op_strategy(), FUZZ_RANGE),
    ) {
        model::run_cursor_equivalence(values, ops);
    }
}
