use core::{iter::FusedIterator, marker::PhantomData};

use crate::{Dir, Link, Links, ThreadedTree, TreeNode};

/// An iterator over the elements of a [`ThreadedTree`], in key order.
///
/// Each step follows a single thread or descends one subtree; no parent pointers are used.
pub struct Iter<'tree, T: TreeNode<Links<T>>> {
    front: Link<T>,
    back: Link<T>,

    len: usize,
    _tree: PhantomData<&'tree ThreadedTree<T>>,
}

impl<'tree, T: TreeNode<Links<T>>> Iter<'tree, T> {
    pub(crate) fn new(tree: &'tree ThreadedTree<T>) -> Self {
        Iter {
            front: tree.first_raw(),
            back: tree.last_raw(),
            len: tree.len(),
            _tree: PhantomData,
        }
    }
}

impl<'tree, T: TreeNode<Links<T>>> Iterator for Iter<'tree, T> {
    type Item = &'tree T;

    fn next(&mut self) -> Option<Self::Item> {
        if self.len == 0 {
            return None;
        }

        let cur = self.front?;

        self.front = unsafe { ThreadedTree::step(cur, Dir::Right) };
        self.len -= 1;

        Some(unsafe { cur.as_ref() })
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.len, Some(self.len))
    }
}

impl<T: TreeNode<Links<T>>> DoubleEndedIterator for Iter<'_, T> {
    fn next_back(&mut self) -> Option<Self::Item> {
        if self.len == 0 {
            return None;
        }

        let cur = self.back?;

        self.back = unsafe { ThreadedTree::step(cur, Dir::Left) };
        self.len -= 1;

        Some(unsafe { cur.as_ref() })
    }
}

impl<T: TreeNode<Links<T>>> ExactSizeIterator for Iter<'_, T> {}

impl<T: TreeNode<Links<T>>> FusedIterator for Iter<'_, T> {}
