use core::{
    fmt,
    ptr::{self, NonNull},
};

use sptr::Strict;

use crate::Dir;

const LEFT_THREAD: usize = 0b01;
const RIGHT_THREAD: usize = 0b10;
const TAG_MASK: usize = LEFT_THREAD | RIGHT_THREAD;

/// A parent pointer carrying the two thread flags of its node in the low address bits.
pub(crate) struct ThreadPtr<T> {
    ptr: *mut T,
}

impl<T> Clone for ThreadPtr<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for ThreadPtr<T> {}

impl<T> ThreadPtr<T> {
    /// A null parent with both flags clear.
    pub(crate) const fn null() -> ThreadPtr<T> {
        ThreadPtr {
            ptr: ptr::null_mut(),
        }
    }

    pub(crate) fn new(
        parent: Option<NonNull<T>>,
        left_thread: bool,
        right_thread: bool,
    ) -> ThreadPtr<T> {
        let ptr = opt_nonnull_to_raw(parent);

        assert!(
            ptr.addr() & TAG_MASK == 0,
            "tree nodes must be aligned to at least 4 bytes"
        );

        let tags = (left_thread as usize * LEFT_THREAD) | (right_thread as usize * RIGHT_THREAD);

        ThreadPtr {
            ptr: ptr.map_addr(|addr| addr | tags),
        }
    }

    pub(crate) fn ptr(&self) -> Option<NonNull<T>> {
        NonNull::new(self.ptr.map_addr(|tagged_addr| tagged_addr & !TAG_MASK))
    }

    #[inline]
    pub(crate) fn is_thread(&self, dir: Dir) -> bool {
        self.ptr.addr() & dir.thread_bit() != 0
    }

    pub(crate) fn set_ptr(&mut self, parent: Option<NonNull<T>>) {
        *self = ThreadPtr::new(
            parent,
            self.is_thread(Dir::Left),
            self.is_thread(Dir::Right),
        );
    }

    #[inline]
    pub(crate) fn set_thread(&mut self, dir: Dir, thread: bool) {
        let bit = dir.thread_bit();

        self.ptr = self.ptr.map_addr(|tagged_addr| {
            if thread {
                tagged_addr | bit
            } else {
                tagged_addr & !bit
            }
        });
    }
}

impl<T> fmt::Debug for ThreadPtr<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ThreadPtr")
            .field("parent", &self.ptr())
            .field("left_thread", &self.is_thread(Dir::Left))
            .field("right_thread", &self.is_thread(Dir::Right))
            .finish()
    }
}

impl Dir {
    #[inline]
    pub(crate) const fn thread_bit(self) -> usize {
        match self {
            Dir::Left => LEFT_THREAD,
            Dir::Right => RIGHT_THREAD,
        }
    }
}

fn opt_nonnull_to_raw<T>(ptr: Option<NonNull<T>>) -> *mut T {
    match ptr {
        Some(p) => p.as_ptr(),
        None => ptr::null_mut(),
    }
}
