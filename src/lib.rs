//! An intrusive, double-threaded binary search tree.
#![no_std]

// Conventions used in comments:
// - A node's left and right *slots* each hold either a child or a *thread*.
// - A thread on the left side points at the node's in-order predecessor, a thread on the right
//   side at its in-order successor. Threads of the minimum (left) and maximum (right) are null.
// - Which of the two a slot holds is recorded by the two flag bits packed into the node's parent
//   pointer (see `thread.rs`).
//
// The invariants maintained by every public operation are:
// 1. Only the root has a null parent pointer.
// 2. A slot holds a child iff its thread flag is clear.
// 3. A threaded slot points at exactly the node an unthreaded in-order walk would visit
//    before (left) or after (right) the node.
// 4. In-order key order is strict; no two nodes compare equal.
//
// Corollaries:
// 5. The successor of a node is either its right thread or the minimum of its right subtree,
//    so stepping never touches parent pointers.
// 6. The minimum of a node's right subtree is the only node whose left thread points at it.
//    Symmetrically for the maximum of its left subtree. Moving a node therefore only requires
//    patching these two threads.

#[cfg(any(test, feature = "alloc"))]
extern crate alloc;
#[cfg(any(test, feature = "std"))]
extern crate std;

use core::{
    borrow::Borrow,
    cell::UnsafeCell,
    cmp::Ordering,
    fmt,
    marker::{PhantomData, PhantomPinned},
    mem,
    ops::Not,
    pin::Pin,
    ptr::NonNull,
};

use cordyceps::Linked;

mod cursor;
#[cfg(any(test, feature = "alloc"))]
mod debug;
mod iter;
#[cfg(any(test, feature = "model"))]
pub mod model;
mod thread;

#[cfg(test)]
mod tests;

pub use cursor::{Cursor, CursorMut};
pub use iter::Iter;

use thread::ThreadPtr;

/// An element that can be linked into a [`ThreadedTree`], ordered by its key.
pub trait TreeNode<L>: Linked<L> {
    type Key: Ord + fmt::Debug;

    /// Returns the key of this element.
    ///
    /// The key must not change while the element is linked, except as described by
    /// [`ThreadedTree::reinsert`].
    fn key(&self) -> &Self::Key;
}

/// An intrusive, double-threaded binary search tree.
///
/// The tree does not allocate: every node embeds its own [`Links`], and the tree only rewires
/// them. Null child slots are reused as threads to the in-order neighbours of a node, so
/// stepping to the next or previous element takes no parent walk and no stack.
///
/// The tree is not self-balancing. Operations that descend from the root run in _O(depth)_ time,
/// which degrades to _O(n)_ for adversarial (e.g. sorted) insertion orders.
pub struct ThreadedTree<T>
where
    T: TreeNode<Links<T>>,
{
    root: Link<T>,
    len: usize,
}

/// The traversal slot embedded in every node of a [`ThreadedTree`].
pub struct Links<T> {
    inner: UnsafeCell<LinksInner<T>>,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum Dir {
    Left = 0,
    Right = 1,
}

impl Not for Dir {
    type Output = Dir;

    fn not(self) -> Self::Output {
        match self {
            Dir::Left => Dir::Right,
            Dir::Right => Dir::Left,
        }
    }
}

#[repr(C)]
struct LinksInner<T> {
    parent: ThreadPtr<T>,
    slots: [Link<T>; 2],
    _unpin: PhantomPinned,
}

type Link<T> = Option<NonNull<T>>;

/// The error returned when inserting a node whose key is already present.
///
/// The tree is left unmodified. The existing node can be inspected through
/// [`existing`](Occupied::existing), and the rejected node is handed back by
/// [`into_rejected`](Occupied::into_rejected).
#[must_use]
pub struct Occupied<'tree, T>
where
    T: TreeNode<Links<T>>,
{
    existing: NonNull<T>,
    rejected: T::Handle,
    _tree: PhantomData<&'tree ThreadedTree<T>>,
}

impl<T> ThreadedTree<T>
where
    T: TreeNode<Links<T>>,
{
    /// Returns a new empty tree.
    pub const fn new() -> ThreadedTree<T> {
        ThreadedTree { root: None, len: 0 }
    }

    /// Returns `true` if the tree contains no elements.
    pub const fn is_empty(&self) -> bool {
        let empty = self.len() == 0;

        if cfg!(debug_assertions) {
            // Can't use assert_eq!() in const fn.
            assert!(empty == self.root.is_none());
        }

        empty
    }

    /// Returns the number of elements in the tree.
    pub const fn len(&self) -> usize {
        self.len
    }

    /// Returns the root element of the tree.
    pub fn root(&self) -> Option<Pin<&T>> {
        self.root
            .map(|root| unsafe { Pin::new_unchecked(root.as_ref()) })
    }

    #[doc(hidden)]
    pub fn assert_invariants(&self) {
        let Some(root) = self.root else {
            assert_eq!(self.len, 0, "empty tree must have length 0");
            return;
        };

        unsafe {
            assert_eq!(
                T::links(root).as_ref().parent(),
                None,
                "root must not have a parent"
            );

            let mut prev = None;
            let mut count = 0;
            self.assert_invariants_at(root, &mut prev, &mut count);

            // The last node visited is the maximum, whose right thread must be null.
            let max = prev.expect("non-empty tree must visit a node");
            assert!(T::links(max).as_ref().is_thread(Dir::Right));
            assert_eq!(T::links(max).as_ref().slot(Dir::Right), None);

            assert_eq!(count, self.len, "length does not match node count");
        }
    }

    // Walks the subtree rooted at `node` in order, checking every link against the walk.
    //
    // `prev` holds the last node visited before `node`'s subtree.
    #[allow(clippy::only_used_in_recursion)]
    unsafe fn assert_invariants_at(
        &self,
        node: NonNull<T>,
        prev: &mut Link<T>,
        count: &mut usize,
    ) {
        unsafe {
            match T::links(node).as_ref().child(Dir::Left) {
                Some(left) => {
                    assert_eq!(T::links(left).as_ref().parent(), Some(node));
                    self.assert_invariants_at(left, prev, count);
                }

                None => assert_eq!(
                    T::links(node).as_ref().slot(Dir::Left),
                    *prev,
                    "left thread of {:?} must point at its predecessor",
                    node.as_ref().key(),
                ),
            }

            if let Some(prev) = *prev {
                assert!(
                    prev.as_ref().key() < node.as_ref().key(),
                    "keys out of order: {:?} >= {:?}",
                    prev.as_ref().key(),
                    node.as_ref().key(),
                );

                if T::links(prev).as_ref().is_thread(Dir::Right) {
                    assert_eq!(
                        T::links(prev).as_ref().slot(Dir::Right),
                        Some(node),
                        "right thread of {:?} must point at its successor",
                        prev.as_ref().key(),
                    );
                }
            }

            *prev = Some(node);
            *count += 1;

            if let Some(right) = T::links(node).as_ref().child(Dir::Right) {
                assert_eq!(T::links(right).as_ref().parent(), Some(node));
                self.assert_invariants_at(right, prev, count);
            }
        }
    }

    /// Returns `true` if the tree contains an element with the given key.
    pub fn contains_key<Q>(&self, key: &Q) -> bool
    where
        T::Key: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        self.get_raw(key).is_some()
    }

    /// Returns a reference to the element corresponding to `key`.
    pub fn get<Q>(&self, key: &Q) -> Option<Pin<&T>>
    where
        T::Key: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        let ptr = self.get_raw(key)?;
        unsafe { Some(Pin::new_unchecked(ptr.as_ref())) }
    }

    pub(crate) fn get_raw<Q>(&self, key: &Q) -> Link<T>
    where
        T::Key: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        let mut cur = self.root?;

        loop {
            unsafe {
                let dir = match key.cmp(cur.as_ref().key().borrow()) {
                    Ordering::Less => Dir::Left,
                    Ordering::Equal => return Some(cur),
                    Ordering::Greater => Dir::Right,
                };

                cur = T::links(cur).as_ref().child(dir)?;
            }
        }
    }

    /// Returns the element with the smallest key greater than or equal to `key`.
    pub fn ceiling<Q>(&self, key: &Q) -> Option<Pin<&T>>
    where
        T::Key: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        let ptr = self.ceiling_raw(key)?;
        unsafe { Some(Pin::new_unchecked(ptr.as_ref())) }
    }

    pub(crate) fn ceiling_raw<Q>(&self, key: &Q) -> Link<T>
    where
        T::Key: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        let mut cur = self.root?;

        loop {
            unsafe {
                let links = T::links(cur).as_ref();

                match key.cmp(cur.as_ref().key().borrow()) {
                    // Nothing in the tree falls between `cur` and its predecessor.
                    Ordering::Less => match links.child(Dir::Left) {
                        Some(left) => cur = left,
                        None => return Some(cur),
                    },

                    Ordering::Equal => return Some(cur),

                    // The right thread, if any, is the first node greater than `key`.
                    Ordering::Greater => match links.child(Dir::Right) {
                        Some(right) => cur = right,
                        None => return links.slot(Dir::Right),
                    },
                }
            }
        }
    }

    /// Returns the minimum element of the tree.
    pub fn first(&self) -> Option<Pin<&T>> {
        self.first_raw()
            .map(|first| unsafe { Pin::new_unchecked(first.as_ref()) })
    }

    /// Returns the maximum element of the tree.
    pub fn last(&self) -> Option<Pin<&T>> {
        self.last_raw()
            .map(|last| unsafe { Pin::new_unchecked(last.as_ref()) })
    }

    pub(crate) fn first_raw(&self) -> Link<T> {
        self.root
            .map(|root| unsafe { Self::extreme_in_subtree(root, Dir::Left) })
    }

    pub(crate) fn last_raw(&self) -> Link<T> {
        self.root
            .map(|root| unsafe { Self::extreme_in_subtree(root, Dir::Right) })
    }

    /// Returns the in-order predecessor of `node`, or `None` if `node` is the minimum.
    ///
    /// This takes _O(1)_ time when `node` has no left child.
    ///
    /// # Safety
    ///
    /// It is the caller's responsibility to ensure that `node` is an element of `self`.
    pub unsafe fn predecessor(&self, node: NonNull<T>) -> Option<NonNull<T>> {
        unsafe { Self::step(node, Dir::Left) }
    }

    /// Returns the in-order successor of `node`, or `None` if `node` is the maximum.
    ///
    /// This takes _O(1)_ time when `node` has no right child.
    ///
    /// # Safety
    ///
    /// It is the caller's responsibility to ensure that `node` is an element of `self`.
    pub unsafe fn successor(&self, node: NonNull<T>) -> Option<NonNull<T>> {
        unsafe { Self::step(node, Dir::Right) }
    }

    // Returns the in-order neighbour of `node` in direction `dir`.
    #[inline]
    pub(crate) unsafe fn step(node: NonNull<T>, dir: Dir) -> Link<T> {
        unsafe {
            let links = T::links(node).as_ref();

            match links.child(dir) {
                Some(child) => Some(Self::extreme_in_subtree(child, !dir)),
                None => links.slot(dir),
            }
        }
    }

    // Returns the node reached by following children in direction `dir` from `root`, i.e. the
    // minimum (`Dir::Left`) or maximum (`Dir::Right`) of the subtree.
    #[inline]
    unsafe fn extreme_in_subtree(root: NonNull<T>, dir: Dir) -> NonNull<T> {
        let mut cur = root;

        while let Some(next) = unsafe { T::links(cur).as_ref().child(dir) } {
            cur = next;
        }

        cur
    }

    /// Inserts an item into the tree.
    ///
    /// If an element with an equal key is already present, the tree is left unchanged and the
    /// item is handed back inside the returned [`Occupied`].
    ///
    /// This operation completes in _O(depth)_ time.
    pub fn insert(&mut self, item: T::Handle) -> Result<(), Occupied<'_, T>> {
        let ptr = T::into_ptr(item);

        match unsafe { self.insert_raw(ptr) } {
            Ok(()) => Ok(()),
            Err(existing) => Err(Occupied {
                existing,
                rejected: unsafe { T::from_ptr(ptr) },
                _tree: PhantomData,
            }),
        }
    }

    // Links `ptr` into the tree, or returns the node whose key equals `ptr`'s.
    unsafe fn insert_raw(&mut self, ptr: NonNull<T>) -> Result<(), NonNull<T>> {
        let Some(mut cur) = self.root else {
            // Tree is empty. Set `ptr` as the root, with null threads on both sides.
            unsafe { T::links(ptr).as_mut().init_leaf(None, None, None) };

            self.root = Some(ptr);
            self.len += 1;
            return Ok(());
        };

        // Descend the tree until the missing child on the comparison side is found.
        loop {
            let ordering = unsafe { ptr.as_ref().key().cmp(cur.as_ref().key()) };

            let dir = match ordering {
                Ordering::Less => Dir::Left,
                Ordering::Equal => return Err(cur),
                Ordering::Greater => Dir::Right,
            };

            unsafe {
                let cur_links = T::links(cur).as_mut();

                match cur_links.child(dir) {
                    // Descend.
                    Some(child) => cur = child,

                    // Set `ptr` as child. It takes over `cur`'s thread on the `dir` side and
                    // threads back to `cur` on the other.
                    None => {
                        let inherited = cur_links.slot(dir);
                        cur_links.set_child(dir, ptr);

                        let (left, right) = match dir {
                            Dir::Left => (inherited, Some(cur)),
                            Dir::Right => (Some(cur), inherited),
                        };
                        T::links(ptr).as_mut().init_leaf(Some(cur), left, right);

                        self.len += 1;
                        return Ok(());
                    }
                }
            }
        }
    }

    /// Removes an arbitrary node from the tree.
    ///
    /// This operation completes in _O(depth)_ time.
    ///
    /// # Safety
    ///
    /// It is the caller's responsibility to ensure that `node` is an element of `self`, and not any
    /// other tree.
    pub unsafe fn remove_at(&mut self, node: NonNull<T>) -> T::Handle {
        debug_assert!(self.len > 0, "cannot remove from an empty tree");

        unsafe {
            let left = T::links(node).as_ref().child(Dir::Left);
            let right = T::links(node).as_ref().child(Dir::Right);

            match (left, right) {
                (Some(left), Some(right)) => {
                    // The successor has no left child, so it can be unlinked as a leaf or unary
                    // node and then take over `node`'s position.
                    let successor = Self::extreme_in_subtree(right, Dir::Left);
                    let predecessor = Self::extreme_in_subtree(left, Dir::Right);

                    self.unlink(successor);

                    // If `successor` was `node`'s right child, `node`'s right slot now holds
                    // `successor`'s former right child or right thread.
                    let parent = T::links(node).as_ref().parent();
                    let node_right = T::links(node).as_ref().child(Dir::Right);
                    let node_right_thread = T::links(node).as_ref().slot(Dir::Right);

                    self.replace_child_or_set_root(parent, node, successor);

                    let succ_links = T::links(successor).as_mut();
                    succ_links.set_parent(parent);
                    succ_links.set_child(Dir::Left, left);
                    T::links(left).as_mut().set_parent(Some(successor));

                    match node_right {
                        Some(node_right) => {
                            succ_links.set_child(Dir::Right, node_right);
                            T::links(node_right).as_mut().set_parent(Some(successor));

                            // The minimum of the right subtree still threads back to `node`.
                            let min = Self::extreme_in_subtree(node_right, Dir::Left);
                            T::links(min)
                                .as_mut()
                                .set_thread(Dir::Left, Some(successor));
                        }

                        None => {
                            succ_links.set_thread(Dir::Right, node_right_thread);
                        }
                    }

                    T::links(predecessor)
                        .as_mut()
                        .set_thread(Dir::Right, Some(successor));
                }

                _ => self.unlink(node),
            }

            T::links(node).as_mut().clear();
            self.len -= 1;

            T::from_ptr(node)
        }
    }

    // Unlinks `node`, which must have at most one child, elevating the child (if any) into its
    // place. `len` is not updated and `node`'s links are left as they were.
    unsafe fn unlink(&mut self, node: NonNull<T>) {
        unsafe {
            let parent = T::links(node).as_ref().parent();
            let left = T::links(node).as_ref().child(Dir::Left);
            let right = T::links(node).as_ref().child(Dir::Right);

            if T::links(node).as_ref().is_leaf() {
                match parent {
                    // The parent's slot becomes a thread to whatever `node` threaded to.
                    Some(parent) => {
                        let dir = self.which_child(parent, node);
                        let thread = T::links(node).as_ref().slot(dir);
                        T::links(parent).as_mut().set_thread(dir, thread);
                    }

                    None => self.root = None,
                }

                return;
            }

            let (child, dir) = match (left, right) {
                (Some(left), None) => (left, Dir::Left),
                (None, Some(right)) => (right, Dir::Right),
                _ => unreachable!("`node` must have at most one child"),
            };

            // The extreme node of `child`'s subtree facing away from `dir` threads back to `node`;
            // point it past `node` instead.
            let neighbor = Self::extreme_in_subtree(child, !dir);
            let thread = T::links(node).as_ref().slot(!dir);
            T::links(neighbor).as_mut().set_thread(!dir, thread);

            self.replace_child_or_set_root(parent, node, child);
            T::links(child).as_mut().set_parent(parent);
        }
    }

    // Replaces the child pointer of `parent` pointing at `old_child` with `new_child`, or sets
    // `new_child` as the root if `parent` is `None`.
    //
    // `new_child`'s parent pointer is not updated.
    #[inline]
    unsafe fn replace_child_or_set_root(
        &mut self,
        parent: Link<T>,
        old_child: NonNull<T>,
        new_child: NonNull<T>,
    ) {
        match parent {
            Some(parent) => unsafe {
                let dir = self.which_child(parent, old_child);
                T::links(parent).as_mut().set_child(dir, new_child);
            },

            None => self.root = Some(new_child),
        }
    }

    // Returns which side of `parent` holds `child`.
    //
    // # Safety
    //
    // `child` must be a child node of `parent`.
    unsafe fn which_child(&self, parent: NonNull<T>, child: NonNull<T>) -> Dir {
        let links = unsafe { T::links(parent).as_ref() };

        if links.child(Dir::Left) == Some(child) {
            Dir::Left
        } else {
            debug_assert_eq!(
                links.child(Dir::Right),
                Some(child),
                "`child` must be a child of `parent`"
            );
            Dir::Right
        }
    }

    /// Removes the element corresponding to `key` from the tree.
    pub fn remove<Q>(&mut self, key: &Q) -> Option<T::Handle>
    where
        T::Key: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        let ptr = self.get_raw(key)?;
        Some(unsafe { self.remove_at(ptr) })
    }

    /// Removes and returns the minimum element of the tree.
    pub fn pop_first(&mut self) -> Option<T::Handle> {
        let ptr = self.first_raw()?;
        Some(unsafe { self.remove_at(ptr) })
    }

    /// Removes and returns the maximum element of the tree.
    pub fn pop_last(&mut self) -> Option<T::Handle> {
        let ptr = self.last_raw()?;
        Some(unsafe { self.remove_at(ptr) })
    }

    /// Restores the position of `node` after its key was modified in place.
    ///
    /// Only the in-order neighbours of `node` are compared against it. If both are still on the
    /// correct side, this is a no-op. Otherwise `node` is removed and inserted again, which fails
    /// with [`Occupied`] if its new key collides with another element. In that case `node` is
    /// left out of the tree and its handle is returned through the error.
    ///
    /// # Safety
    ///
    /// It is the caller's responsibility to ensure that `node` is an element of `self`, and that
    /// no key other than `node`'s was modified since the tree was last in order.
    pub unsafe fn reinsert(&mut self, node: NonNull<T>) -> Result<(), Occupied<'_, T>> {
        let misplaced = unsafe {
            let key = node.as_ref().key();

            Self::step(node, Dir::Left).is_some_and(|prev| prev.as_ref().key() >= key)
                || Self::step(node, Dir::Right).is_some_and(|next| key >= next.as_ref().key())
        };

        if !misplaced {
            return Ok(());
        }

        let item = unsafe { self.remove_at(node) };
        self.insert(item)
    }

    /// Returns an iterator over the elements of the tree in key order.
    pub fn iter(&self) -> Iter<'_, T> {
        Iter::new(self)
    }

    /// Returns a cursor pointing at the minimum element of the tree.
    pub fn cursor_first(&self) -> Cursor<'_, T> {
        Cursor::first(self)
    }

    /// Returns a cursor pointing at the maximum element of the tree.
    pub fn cursor_last(&self) -> Cursor<'_, T> {
        Cursor::last(self)
    }

    /// Returns a cursor pointing at the first element whose key is greater than or equal to
    /// `key`, or at the "ghost" non-element if there is none.
    pub fn cursor_ceiling<Q>(&self, key: &Q) -> Cursor<'_, T>
    where
        T::Key: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        let ptr = self.ceiling_raw(key);
        Cursor::at(self, ptr)
    }

    /// Returns a mutable cursor pointing at the minimum element of the tree.
    pub fn cursor_first_mut(&mut self) -> CursorMut<'_, T> {
        CursorMut::first(self)
    }

    /// Returns a mutable cursor pointing at the maximum element of the tree.
    pub fn cursor_last_mut(&mut self) -> CursorMut<'_, T> {
        CursorMut::last(self)
    }

    /// Returns a mutable cursor pointing at `node`.
    ///
    /// # Safety
    ///
    /// It is the caller's responsibility to ensure that `node` is an element of `self`.
    pub unsafe fn cursor_at_mut(&mut self, node: NonNull<T>) -> CursorMut<'_, T> {
        CursorMut::at(self, Some(node))
    }

    /// Clears the tree, removing all elements.
    ///
    /// Elements are released in key order by dropping their handles.
    pub fn clear(&mut self) {
        let mut opt_cur = self.first_raw();

        self.root = None;
        self.len = 0;

        while let Some(cur) = opt_cur {
            unsafe {
                // Nodes after `cur` are reachable through its right slot, so step before
                // releasing it.
                opt_cur = Self::step(cur, Dir::Right);

                T::links(cur).as_mut().clear();
                drop(T::from_ptr(cur));
            }
        }
    }
}

impl<T> Default for ThreadedTree<T>
where
    T: TreeNode<Links<T>>,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Drop for ThreadedTree<T>
where
    T: TreeNode<Links<T>>,
{
    fn drop(&mut self) {
        self.clear();
    }
}

impl<T> fmt::Debug for ThreadedTree<T>
where
    T: TreeNode<Links<T>>,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.iter().map(T::key)).finish()
    }
}

impl<'tree, T> IntoIterator for &'tree ThreadedTree<T>
where
    T: TreeNode<Links<T>>,
{
    type Item = &'tree T;
    type IntoIter = Iter<'tree, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<'tree, T> Occupied<'tree, T>
where
    T: TreeNode<Links<T>>,
{
    /// Returns the element already in the tree whose key collided.
    pub fn existing(&self) -> Pin<&'tree T> {
        // SAFETY: the tree is borrowed for `'tree`.
        unsafe { Pin::new_unchecked(self.existing.as_ref()) }
    }

    /// Returns a reference to the rejected item.
    pub fn rejected(&self) -> &T::Handle {
        &self.rejected
    }

    /// Consumes the error, returning the rejected item.
    pub fn into_rejected(self) -> T::Handle {
        self.rejected
    }
}

impl<T> fmt::Debug for Occupied<'_, T>
where
    T: TreeNode<Links<T>>,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Occupied")
            .field("key", unsafe { self.existing.as_ref().key() })
            .finish_non_exhaustive()
    }
}

impl<T> fmt::Display for Occupied<'_, T>
where
    T: TreeNode<Links<T>>,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "key {:?} is already present in the tree", unsafe {
            self.existing.as_ref().key()
        })
    }
}

impl<T> Links<T> {
    /// Returns a new, unlinked traversal slot.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            inner: UnsafeCell::new(LinksInner {
                parent: ThreadPtr::null(),
                slots: [None; 2],
                _unpin: PhantomPinned,
            }),
        }
    }

    /// Returns `true` if both slots are threads, i.e. the node has no children.
    #[inline]
    fn is_leaf(&self) -> bool {
        self.is_thread(Dir::Left) && self.is_thread(Dir::Right)
    }

    #[inline]
    fn is_thread(&self, dir: Dir) -> bool {
        unsafe { (*self.inner.get()).parent.is_thread(dir) }
    }

    #[inline]
    fn parent(&self) -> Link<T> {
        unsafe { (*self.inner.get()).parent.ptr() }
    }

    // Returns the raw contents of the `dir` slot: a child or a thread.
    #[inline]
    fn slot(&self, dir: Dir) -> Link<T> {
        unsafe { (*self.inner.get()).slots[dir as usize] }
    }

    // Returns the `dir` child, or `None` if the slot is a thread.
    #[inline]
    fn child(&self, dir: Dir) -> Link<T> {
        if self.is_thread(dir) {
            None
        } else {
            self.slot(dir)
        }
    }

    #[inline]
    fn set_parent(&mut self, parent: Link<T>) -> Link<T> {
        let inner = self.inner.get_mut();
        let old = inner.parent.ptr();
        inner.parent.set_ptr(parent);
        old
    }

    #[inline]
    fn set_child(&mut self, dir: Dir, child: NonNull<T>) -> Link<T> {
        let inner = self.inner.get_mut();
        inner.parent.set_thread(dir, false);
        mem::replace(&mut inner.slots[dir as usize], Some(child))
    }

    #[inline]
    fn set_thread(&mut self, dir: Dir, thread: Link<T>) -> Link<T> {
        let inner = self.inner.get_mut();
        inner.parent.set_thread(dir, true);
        mem::replace(&mut inner.slots[dir as usize], thread)
    }

    // Links a childless node under `parent` with the given threads.
    #[inline]
    fn init_leaf(&mut self, parent: Link<T>, left: Link<T>, right: Link<T>) {
        let inner = self.inner.get_mut();
        inner.parent = ThreadPtr::new(parent, true, true);
        inner.slots = [left, right];
    }

    #[inline]
    fn clear(&mut self) {
        let inner = self.inner.get_mut();
        inner.parent = ThreadPtr::null();
        inner.slots = [None; 2];
    }
}

impl<T> Default for Links<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> fmt::Debug for Links<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = unsafe { &*self.inner.get() };

        f.debug_struct("Links")
            .field("parent", &inner.parent)
            .field("left", &inner.slots[Dir::Left as usize])
            .field("right", &inner.slots[Dir::Right as usize])
            .finish()
    }
}
