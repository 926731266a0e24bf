use core::{
    cell::UnsafeCell,
    fmt,
    marker::{PhantomData, PhantomPinned},
    mem,
    ops::{Deref, Not},
    pin::Pin,
    ptr::NonNull,
};

use crate::{AvlTree, Link, TreeNode};

/// The links embedded in every element of an [`AvlTree`].
///
/// A fresh `Links` is unlinked: no parent, no children, balance factor 0.
pub struct Links<T: ?Sized> {
    inner: UnsafeCell<LinksInner<T>>,
}

#[repr(C)]
struct LinksInner<T: ?Sized> {
    parent: Link<T>,
    children: [Link<T>; 2],
    balance: i8,
    _unpin: PhantomPinned,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub(crate) enum Dir {
    Left = 0,
    Right = 1,
}

impl Dir {
    /// The change in balance factor caused by the subtree on this side growing by one level.
    #[inline]
    pub(crate) fn sign(self) -> i8 {
        match self {
            Dir::Left => -1,
            Dir::Right => 1,
        }
    }
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

impl<T: ?Sized> Links<T> {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            inner: UnsafeCell::new(LinksInner {
                parent: None,
                children: [None; 2],
                balance: 0,
                _unpin: PhantomPinned,
            }),
        }
    }

    /// Returns the balance factor, `height(right) - height(left)`.
    #[inline]
    pub fn balance(&self) -> i8 {
        unsafe { (*self.inner.get()).balance }
    }

    #[inline]
    pub fn has_left(&self) -> bool {
        self.left().is_some()
    }

    #[inline]
    pub fn has_right(&self) -> bool {
        self.right().is_some()
    }

    #[inline]
    pub(crate) fn parent(&self) -> Link<T> {
        unsafe { (*self.inner.get()).parent }
    }

    #[inline]
    pub(crate) fn child(&self, dir: Dir) -> Link<T> {
        unsafe { (*self.inner.get()).children[dir as usize] }
    }

    #[inline]
    pub(crate) fn left(&self) -> Link<T> {
        self.child(Dir::Left)
    }

    #[inline]
    pub(crate) fn right(&self) -> Link<T> {
        self.child(Dir::Right)
    }

    #[inline]
    pub(crate) fn set_parent(&mut self, parent: Link<T>) -> Link<T> {
        mem::replace(&mut self.inner.get_mut().parent, parent)
    }

    #[inline]
    pub(crate) fn set_child(&mut self, dir: Dir, child: Link<T>) -> Link<T> {
        mem::replace(&mut self.inner.get_mut().children[dir as usize], child)
    }

    #[inline]
    pub(crate) fn set_left(&mut self, left: Link<T>) -> Link<T> {
        self.set_child(Dir::Left, left)
    }

    #[inline]
    pub(crate) fn set_right(&mut self, right: Link<T>) -> Link<T> {
        self.set_child(Dir::Right, right)
    }

    #[inline]
    pub(crate) fn set_balance(&mut self, balance: i8) {
        self.inner.get_mut().balance = balance;
    }

    /// Resets the links to the unlinked state.
    pub(crate) fn clear(&mut self) {
        let inner = self.inner.get_mut();
        inner.parent = None;
        inner.children = [None; 2];
        inner.balance = 0;
    }
}

impl<T: ?Sized> Default for Links<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: ?Sized> fmt::Debug for Links<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Links")
            .field("parent", &self.parent())
            .field("left", &self.left())
            .field("right", &self.right())
            .field("balance", &self.balance())
            .finish()
    }
}

/// A shared reference to an element linked into an [`AvlTree`].
///
/// Unlike a plain `&T`, a `NodeRef` can navigate the tree structure around the element: its
/// parent, its children and its inorder successor.
pub struct NodeRef<'tree, T>
where
    T: TreeNode<Links<T>> + ?Sized,
{
    ptr: NonNull<T>,
    _tree: PhantomData<&'tree AvlTree<T>>,
}

impl<'tree, T> NodeRef<'tree, T>
where
    T: TreeNode<Links<T>> + ?Sized,
{
    // # Safety
    //
    // `ptr` must be an element of a tree that is borrowed for `'tree`.
    pub(crate) unsafe fn new(ptr: NonNull<T>) -> Self {
        NodeRef {
            ptr,
            _tree: PhantomData,
        }
    }

    pub(crate) unsafe fn from_link(link: Link<T>) -> Option<Self> {
        link.map(|ptr| unsafe { NodeRef::new(ptr) })
    }

    #[inline]
    fn links(&self) -> &'tree Links<T> {
        unsafe { T::links(self.ptr).as_ref() }
    }

    /// Returns the pinned element.
    pub fn get(&self) -> Pin<&'tree T> {
        unsafe { Pin::new_unchecked(self.ptr.as_ref()) }
    }

    pub fn key(&self) -> &'tree T::Key {
        unsafe { self.ptr.as_ref().key() }
    }

    /// Returns the element's balance factor, `height(right) - height(left)`.
    pub fn balance_factor(&self) -> i8 {
        self.links().balance()
    }

    pub fn parent(&self) -> Option<NodeRef<'tree, T>> {
        unsafe { NodeRef::from_link(self.links().parent()) }
    }

    pub fn left(&self) -> Option<NodeRef<'tree, T>> {
        unsafe { NodeRef::from_link(self.links().left()) }
    }

    pub fn right(&self) -> Option<NodeRef<'tree, T>> {
        unsafe { NodeRef::from_link(self.links().right()) }
    }

    pub fn has_left(&self) -> bool {
        self.links().has_left()
    }

    pub fn has_right(&self) -> bool {
        self.links().has_right()
    }

    pub fn is_root(&self) -> bool {
        self.links().parent().is_none()
    }

    /// Returns the leftmost element of this element's right subtree.
    ///
    /// Returns `None` if this element has no right child, even if it has a successor elsewhere
    /// in the tree.
    pub fn inorder_successor(&self) -> Option<NodeRef<'tree, T>> {
        unsafe { NodeRef::from_link(AvlTree::<T>::find_inorder_successor(self.ptr)) }
    }
}

impl<T> Clone for NodeRef<'_, T>
where
    T: TreeNode<Links<T>> + ?Sized,
{
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for NodeRef<'_, T> where T: TreeNode<Links<T>> + ?Sized {}

impl<T> Deref for NodeRef<'_, T>
where
    T: TreeNode<Links<T>> + ?Sized,
{
    type Target = T;

    fn deref(&self) -> &T {
        unsafe { self.ptr.as_ref() }
    }
}

impl<T> PartialEq for NodeRef<'_, T>
where
    T: TreeNode<Links<T>> + ?Sized,
{
    fn eq(&self, other: &Self) -> bool {
        self.ptr == other.ptr
    }
}

impl<T> Eq for NodeRef<'_, T> where T: TreeNode<Links<T>> + ?Sized {}

impl<T> fmt::Debug for NodeRef<'_, T>
where
    T: TreeNode<Links<T>> + ?Sized,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NodeRef")
            .field("key", self.key())
            .field("balance", &self.balance_factor())
            .finish()
    }
}
