use core::{marker::PhantomData, pin::Pin, ptr::NonNull};

use crate::{Link, Links, Occupied, ThreadedTree, TreeNode};

/// A cursor over a [`ThreadedTree`].
///
/// A cursor points either to an element of the tree or to a "ghost" non-element that connects the
/// last element to the first.
pub struct Cursor<'tree, T>
where
    T: TreeNode<Links<T>>,
{
    curs: CursorRaw<T>,
    phantom: PhantomData<&'tree ThreadedTree<T>>,
}

impl<'tree, T> Cursor<'tree, T>
where
    T: TreeNode<Links<T>>,
{
    pub(crate) fn first(tree: &'tree ThreadedTree<T>) -> Cursor<'tree, T> {
        Cursor::at(tree, tree.first_raw())
    }

    pub(crate) fn last(tree: &'tree ThreadedTree<T>) -> Cursor<'tree, T> {
        Cursor::at(tree, tree.last_raw())
    }

    pub(crate) fn at(tree: &'tree ThreadedTree<T>, ptr: Link<T>) -> Cursor<'tree, T> {
        Cursor {
            curs: CursorRaw {
                tree: tree.into(),
                ptr,
            },
            phantom: PhantomData,
        }
    }

    /// Moves the cursor to the next element of the `ThreadedTree`.
    ///
    /// If the cursor is pointing to the "ghost" non-element, this method moves it to the first
    /// element. If it is pointing to the last element, this method moves it to the "ghost"
    /// non-element.
    pub fn move_next(&mut self) {
        unsafe { self.curs.move_next() }
    }

    /// Moves the cursor to the previous element of the `ThreadedTree`.
    ///
    /// If the cursor is pointing to the "ghost" non-element, this method moves it to the last
    /// element. If it is pointing to the first element, this method moves it to the "ghost"
    /// non-element.
    pub fn move_prev(&mut self) {
        unsafe { self.curs.move_prev() }
    }

    /// Returns a reference to the item pointed to by the cursor.
    ///
    /// This returns `None` if the cursor is currently pointing to the "ghost" non-element.
    pub fn get(&self) -> Option<&'tree T> {
        unsafe { self.curs.get() }
    }

    /// Returns a reference to the next item.
    ///
    /// If the cursor is pointing to the "ghost" non-element, this method returns the first element.
    /// If it is pointing to the last element, this method returns `None`.
    pub fn peek_next(&self) -> Option<&'tree T> {
        unsafe { self.curs.peek_next() }
    }

    /// Returns a reference to the previous item.
    ///
    /// If the cursor is pointing to the "ghost" non-element, this method returns the last element.
    /// If it is pointing to the first element, this method returns `None`.
    pub fn peek_prev(&self) -> Option<&'tree T> {
        unsafe { self.curs.peek_prev() }
    }
}

impl<'tree, T> Iterator for Cursor<'tree, T>
where
    T: TreeNode<Links<T>>,
{
    type Item = &'tree T;

    /// Yields the current element and advances. Iteration ends at the "ghost" non-element.
    fn next(&mut self) -> Option<Self::Item> {
        let cur = self.get()?;
        self.move_next();
        Some(cur)
    }
}

/// A cursor over a [`ThreadedTree`] which supports editing operations.
///
/// A cursor points either to an element of the tree or to a "ghost" non-element that connects the
/// last element to the first.
pub struct CursorMut<'tree, T>
where
    T: TreeNode<Links<T>>,
{
    curs: CursorRaw<T>,
    phantom: PhantomData<&'tree mut ThreadedTree<T>>,
}

impl<'tree, T> CursorMut<'tree, T>
where
    T: TreeNode<Links<T>>,
{
    pub(crate) fn first(tree: &'tree mut ThreadedTree<T>) -> CursorMut<'tree, T> {
        let ptr = tree.first_raw();
        CursorMut::at(tree, ptr)
    }

    pub(crate) fn last(tree: &'tree mut ThreadedTree<T>) -> CursorMut<'tree, T> {
        let ptr = tree.last_raw();
        CursorMut::at(tree, ptr)
    }

    pub(crate) fn at(tree: &'tree mut ThreadedTree<T>, ptr: Link<T>) -> CursorMut<'tree, T> {
        CursorMut {
            curs: CursorRaw {
                tree: tree.into(),
                ptr,
            },
            phantom: PhantomData,
        }
    }

    /// Returns a read-only cursor pointing to the current element.
    ///
    /// The `CursorMut` remains immutably borrowed for the lifetime of the returned `Cursor`.
    pub fn as_cursor(&self) -> Cursor<'_, T> {
        Cursor {
            curs: CursorRaw {
                tree: self.curs.tree,
                ptr: self.curs.ptr,
            },
            phantom: PhantomData,
        }
    }

    /// Moves the cursor to the next element of the `ThreadedTree`.
    ///
    /// If the cursor is pointing to the "ghost" non-element, this method will move it to the first
    /// element. If it is pointing to the last element, this method will move it to the "ghost"
    /// non-element.
    pub fn move_next(&mut self) {
        unsafe { self.curs.move_next() }
    }

    /// Moves the cursor to the previous element of the `ThreadedTree`.
    ///
    /// If the cursor is pointing to the "ghost" non-element, this method will move it to the last
    /// element. If it is pointing to the first element, this method will move it to the "ghost"
    /// non-element.
    pub fn move_prev(&mut self) {
        unsafe { self.curs.move_prev() }
    }

    /// Returns a reference to the item pointed to by the cursor.
    ///
    /// This returns `None` if the cursor is currently pointing to the "ghost" non-element.
    pub fn get(&self) -> Option<&T> {
        unsafe { self.curs.get() }
    }

    /// Returns a pinned mutable reference to the item pointed to by the cursor.
    ///
    /// This returns `None` if the cursor is currently pointing to the "ghost" non-element.
    ///
    /// # Safety
    ///
    /// The caller must ensure that modifications to the returned value do not violate the
    /// invariants of the tree. If the key of the item is modified, the caller must call
    /// [`reinsert_current`](CursorMut::reinsert_current) before using the tree or the cursor in
    /// any other way.
    pub unsafe fn get_mut(&mut self) -> Option<Pin<&mut T>> {
        unsafe { self.curs.get_mut() }
    }

    /// Returns a reference to the next item.
    ///
    /// If the cursor is pointing to the "ghost" non-element, this method returns the first element.
    /// If it is pointing to the last element, this method returns `None`.
    pub fn peek_next(&self) -> Option<&T> {
        unsafe { self.curs.peek_next() }
    }

    /// Returns a reference to the previous item.
    ///
    /// If the cursor is pointing to the "ghost" non-element, this method returns the last element.
    /// If it is pointing to the first element, this method returns `None`.
    pub fn peek_prev(&self) -> Option<&T> {
        unsafe { self.curs.peek_prev() }
    }

    /// Removes the current element from the tree.
    ///
    /// This returns the removed element and moves the cursor to the next element. If the cursor is
    /// pointing to the "ghost" non-element, this method returns `None`, and neither the tree nor
    /// the cursor is modified.
    pub fn remove_current(&mut self) -> Option<T::Handle> {
        unsafe { self.curs.remove_current() }
    }

    /// Removes the current element from the tree.
    ///
    /// This returns the removed element and moves the cursor to the previous element. If the cursor is
    /// pointing to the "ghost" non-element, this method returns `None`, and neither the tree nor
    /// the cursor is modified.
    pub fn remove_current_and_move_prev(&mut self) -> Option<T::Handle> {
        unsafe { self.curs.remove_current_and_move_prev() }
    }

    /// Restores the position of the current element after its key was modified through
    /// [`get_mut`](CursorMut::get_mut).
    ///
    /// The cursor keeps pointing at the element. If the new key collides with another element,
    /// the current element is removed, the cursor moves to the "ghost" non-element and the
    /// element is handed back through the error.
    pub fn reinsert_current(&mut self) -> Result<(), Occupied<'_, T>> {
        let Some(cur) = self.curs.ptr else {
            return Ok(());
        };

        let tree = unsafe { self.curs.tree.as_mut() };

        match unsafe { tree.reinsert(cur) } {
            Ok(()) => Ok(()),
            Err(occupied) => {
                self.curs.ptr = None;
                Err(occupied)
            }
        }
    }
}

struct CursorRaw<T>
where
    T: TreeNode<Links<T>>,
{
    tree: NonNull<ThreadedTree<T>>,
    ptr: Option<NonNull<T>>,
}

impl<T> CursorRaw<T>
where
    T: TreeNode<Links<T>>,
{
    unsafe fn move_next(&mut self) {
        let tree = unsafe { self.tree.as_ref() };

        match self.ptr {
            Some(p) => self.ptr = unsafe { tree.successor(p) },
            None => self.ptr = tree.first_raw(),
        }
    }

    unsafe fn move_prev(&mut self) {
        let tree = unsafe { self.tree.as_ref() };

        match self.ptr {
            Some(p) => self.ptr = unsafe { tree.predecessor(p) },
            None => self.ptr = tree.last_raw(),
        }
    }

    unsafe fn get<'a>(&self) -> Option<&'a T> {
        self.ptr.map(|p| unsafe { p.as_ref() })
    }

    unsafe fn get_mut(&mut self) -> Option<Pin<&mut T>> {
        self.ptr
            .map(|mut p| unsafe { Pin::new_unchecked(p.as_mut()) })
    }

    unsafe fn peek_next<'a>(&self) -> Option<&'a T> {
        let tree = unsafe { self.tree.as_ref() };

        let next_ptr = match self.ptr {
            Some(p) => unsafe { tree.successor(p) },
            None => tree.first_raw(),
        };

        next_ptr.map(|p| unsafe { p.as_ref() })
    }

    unsafe fn peek_prev<'a>(&self) -> Option<&'a T> {
        let tree = unsafe { self.tree.as_ref() };

        let prev_ptr = match self.ptr {
            Some(p) => unsafe { tree.predecessor(p) },
            None => tree.last_raw(),
        };

        prev_ptr.map(|p| unsafe { p.as_ref() })
    }

    unsafe fn remove_current(&mut self) -> Option<T::Handle> {
        let remove = self.ptr?;

        // Capture the neighbour before `remove` is unlinked.
        unsafe { self.move_next() };

        let tree = unsafe { self.tree.as_mut() };
        Some(unsafe { tree.remove_at(remove) })
    }

    unsafe fn remove_current_and_move_prev(&mut self) -> Option<T::Handle> {
        let remove = self.ptr?;

        unsafe { self.move_prev() };

        let tree = unsafe { self.tree.as_mut() };
        Some(unsafe { tree.remove_at(remove) })
    }
}
