//! 強参照のハンドル`RefCounted`と、`construct`系を持たない`EmbeddedRefCounted`を定義する。

use crate::entry::{decrement_count, EntryPtr, IntrusiveEntry, PlainEntry};
use crate::WeakRef;
use std::{
    any::Any,
    fmt::Debug,
    mem,
    ops::Deref,
    ptr::NonNull,
};

/// 参照カウンタで管理されたオブジェクトへの強参照
///
/// `std::sync::Arc`に近いが、次の点が異なる。
/// - nullを取ることができ、`is_valid`/`is_null`で確認する。
/// - `cast`で別の型(トレイトオブジェクトなど)のハンドルに変換しても、
///   破棄されるのは常に作成時の具体的な型である。
/// - `share_ref_count_from`で、別のオブジェクトの寿命に紐づけたハンドルを作れる。
pub struct RefCounted<T: ?Sized> {
    entry: Option<EntryPtr>,
    pointee: Option<NonNull<T>>,
}
impl<T: ?Sized> RefCounted<T> {
    /// 何も指していないハンドルを作成する
    pub const fn null() -> Self {
        Self {
            entry: None,
            pointee: None,
        }
    }

    /// 強参照を一つ所有している前提でハンドルを組み立てる
    pub(crate) fn from_raw_parts(entry: EntryPtr, pointee: NonNull<T>) -> Self {
        Self {
            entry: Some(entry),
            pointee: Some(pointee),
        }
    }

    pub(crate) fn entry(&self) -> Option<EntryPtr> {
        self.entry
    }

    pub(crate) fn address(&self) -> Option<NonNull<()>> {
        self.pointee.map(|p| p.cast::<()>())
    }

    /// nullでないオブジェクトを指しているかどうか
    pub fn is_valid(&self) -> bool {
        self.entry
            .map_or(false, |e| unsafe { e.as_ref() }.counters().count() > 0)
    }

    /// `!is_valid()`と同じ
    pub fn is_null(&self) -> bool {
        !self.is_valid()
    }

    /// 指しているオブジェクトへの参照を取得する
    pub fn get(&self) -> Option<&T> {
        self.pointee.map(|p| unsafe { &*p.as_ptr() })
    }

    /// 指しているオブジェクトへの生ポインタを取得する
    pub fn as_ptr(&self) -> Option<NonNull<T>> {
        self.pointee
    }

    /// 強参照の数。nullなら0。
    pub fn ref_count(&self) -> i32 {
        self.entry
            .map_or(0, |e| unsafe { e.as_ref() }.counters().count())
    }

    /// 弱参照の数。nullなら0。
    pub fn weak_count(&self) -> i32 {
        self.entry
            .map_or(0, |e| unsafe { e.as_ref() }.counters().weakcount())
    }

    /// 参照を手放してnullにする。nullに対して呼んでも何もしない。
    pub fn reset(&mut self) {
        drop(mem::take(self));
    }

    /// 別のハンドルと中身を入れ替える
    pub fn swap(&mut self, other: &mut Self) {
        mem::swap(self, other);
    }

    /// 同じオブジェクトを指しているかどうか
    pub fn ptr_eq(a: &Self, b: &Self) -> bool {
        a.address() == b.address()
    }

    /// 弱参照を作成する
    pub fn downgrade(&self) -> WeakRef<T> {
        WeakRef::from(self)
    }

    /// 同じエントリを共有したまま、指す先を`f`の返す参照に付け替えたハンドルを作成する。
    ///
    /// トレイトオブジェクトへのアップキャストやフィールドへの射影に使う。
    /// ```
    /// # use refcounted::RefCounted;
    /// # use std::fmt::Debug;
    /// let value = RefCounted::new(42_u32);
    /// let debug = value.cast(|v| v as &(dyn Debug + Send + Sync + 'static));
    /// assert_eq!(value.ref_count(), 2);
    /// # drop(debug);
    /// ```
    pub fn cast<U: ?Sized>(&self, f: impl FnOnce(&T) -> &U) -> RefCounted<U> {
        match (self.entry, self.get()) {
            (Some(entry), Some(value)) => {
                let pointee = NonNull::from(f(value));
                unsafe { entry.as_ref() }.counters().increment_count();
                RefCounted::from_raw_parts(entry, pointee)
            }
            _ => RefCounted::null(),
        }
    }

    /// `resource`の参照カウントを共有しつつ、`pointee`を指すハンドルを作成する。
    ///
    /// ## Safety
    /// `resource`のエントリが生きている間、`pointee`が有効であることを呼び出し側が保証すること。
    pub unsafe fn share_ref_count_from<U: ?Sized>(
        resource: &RefCounted<U>,
        pointee: NonNull<T>,
    ) -> Self {
        match resource.entry {
            Some(entry) => {
                entry.as_ref().counters().increment_count();
                Self::from_raw_parts(entry, pointee)
            }
            None => Self::null(),
        }
    }
}

impl<T> RefCounted<T> {
    /// 型を検査せずに`U`のハンドルに変換する
    ///
    /// ## Safety
    /// 指しているオブジェクトが実際に`U`として読めること。
    pub unsafe fn cast_unchecked<U>(&self) -> RefCounted<U> {
        match self.pointee {
            Some(p) => RefCounted::share_ref_count_from(self, p.cast::<U>()),
            None => RefCounted::null(),
        }
    }
}

impl<T: Send + Sync + 'static> RefCounted<T> {
    /// カウンタと同じメモリブロックに`value`を配置したハンドルを作成する
    pub fn new(value: T) -> Self {
        let (entry, pointee) = IntrusiveEntry::allocate(value);
        Self::from_raw_parts(entry, pointee)
    }

    /// 今持っている参照を手放してから、新しく`value`を配置する
    pub fn construct(&mut self, value: T) {
        self.reset();
        *self = Self::new(value);
    }

    /// 今持っている参照を手放してから、`f`の返す値を新しく配置する
    pub fn construct_with(&mut self, f: impl FnOnce() -> T) {
        self.reset();
        *self = Self::new(f());
    }

    /// 今持っている参照を手放してから、`T::default()`を新しく配置する
    pub fn construct_default(&mut self)
    where
        T: Default,
    {
        self.construct_with(T::default);
    }
}

impl<T: ?Sized + Send + Sync + 'static> RefCounted<T> {
    /// 既存の`Box<T>`を参照カウンタで包む。カウンタは別のメモリブロックに確保される。
    pub fn from_box(value: Box<T>) -> Self {
        let (entry, pointee) = PlainEntry::allocate(value);
        Self::from_raw_parts(entry, pointee)
    }

    /// 今持っている参照を手放してから、`value`を包む
    pub fn reset_with(&mut self, value: Box<T>) {
        self.reset();
        *self = Self::from_box(value);
    }
}

impl RefCounted<dyn Any + Send + Sync> {
    /// 具体的な型`U`のハンドルへの変換を試みる。型が違えば`None`。
    pub fn downcast<U: Any + Send + Sync>(&self) -> Option<RefCounted<U>> {
        let concrete = self.get()?.downcast_ref::<U>()?;
        Some(unsafe { RefCounted::share_ref_count_from(self, NonNull::from(concrete)) })
    }
}

// Debugトレイトの実装
impl<T: ?Sized> Debug for RefCounted<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RefCounted")
            .field("pointee", &self.address())
            .field("count", &self.ref_count())
            .field("weakcount", &self.weak_count())
            .finish()
    }
}

impl<T: ?Sized> Default for RefCounted<T> {
    fn default() -> Self {
        Self::null()
    }
}

// TがSendかつSyncであればRefCountedはSendかつSync
unsafe impl<T: ?Sized + Send + Sync> Send for RefCounted<T> {}
unsafe impl<T: ?Sized + Send + Sync> Sync for RefCounted<T> {}

// RefCountedはTにDerefする
impl<T: ?Sized> Deref for RefCounted<T> {
    type Target = T;
    fn deref(&self) -> &Self::Target {
        match self.pointee {
            Some(p) => unsafe { &*p.as_ptr() },
            None => panic!("Dereferencing NULL pointer"),
        }
    }
}

// Cloneで参照カウントを増やす
impl<T: ?Sized> Clone for RefCounted<T> {
    fn clone(&self) -> Self {
        if let Some(entry) = self.entry {
            unsafe { entry.as_ref() }.counters().increment_count();
        }
        Self {
            entry: self.entry,
            pointee: self.pointee,
        }
    }
}

// Drop時に参照カウントを減らし、0になったら破棄する
impl<T: ?Sized> Drop for RefCounted<T> {
    fn drop(&mut self) {
        self.pointee = None;
        if let Some(entry) = self.entry.take() {
            unsafe { decrement_count(entry) };
        }
    }
}

crate::impl_pointer_ordering!(RefCounted);

/// `construct`系を持たない強参照
///
/// `EmbeddedRefCount::create_new`で作られるオブジェクトのように、
/// 参照カウンタと一緒に作られることを前提としたオブジェクトに使う。
/// `RefCounted`との間は`From`で相互に変換できる。
pub struct EmbeddedRefCounted<T: ?Sized>(RefCounted<T>);
impl<T: ?Sized> EmbeddedRefCounted<T> {
    /// 何も指していないハンドルを作成する
    pub const fn null() -> Self {
        Self(RefCounted::null())
    }

    /// nullでないオブジェクトを指しているかどうか
    pub fn is_valid(&self) -> bool {
        self.0.is_valid()
    }

    /// `!is_valid()`と同じ
    pub fn is_null(&self) -> bool {
        self.0.is_null()
    }

    /// 指しているオブジェクトへの参照を取得する
    pub fn get(&self) -> Option<&T> {
        self.0.get()
    }

    /// 指しているオブジェクトへの生ポインタを取得する
    pub fn as_ptr(&self) -> Option<NonNull<T>> {
        self.0.as_ptr()
    }

    /// 強参照の数
    pub fn ref_count(&self) -> i32 {
        self.0.ref_count()
    }

    /// 弱参照の数
    pub fn weak_count(&self) -> i32 {
        self.0.weak_count()
    }

    /// 参照を手放してnullにする
    pub fn reset(&mut self) {
        self.0.reset()
    }

    /// 別のハンドルと中身を入れ替える
    pub fn swap(&mut self, other: &mut Self) {
        self.0.swap(&mut other.0)
    }

    /// 同じオブジェクトを指しているかどうか
    pub fn ptr_eq(a: &Self, b: &Self) -> bool {
        RefCounted::ptr_eq(&a.0, &b.0)
    }

    /// 弱参照を作成する
    pub fn downgrade(&self) -> WeakRef<T> {
        self.0.downgrade()
    }

    /// `RefCounted::cast`を参照
    pub fn cast<U: ?Sized>(&self, f: impl FnOnce(&T) -> &U) -> EmbeddedRefCounted<U> {
        EmbeddedRefCounted(self.0.cast(f))
    }

    /// 内側の`RefCounted`を参照する
    pub fn as_ref_counted(&self) -> &RefCounted<T> {
        &self.0
    }

    pub(crate) fn address(&self) -> Option<NonNull<()>> {
        self.0.address()
    }
}

impl<T: ?Sized> From<RefCounted<T>> for EmbeddedRefCounted<T> {
    fn from(value: RefCounted<T>) -> Self {
        Self(value)
    }
}

impl<T: ?Sized> From<EmbeddedRefCounted<T>> for RefCounted<T> {
    fn from(value: EmbeddedRefCounted<T>) -> Self {
        value.0
    }
}

impl<T: ?Sized> Debug for EmbeddedRefCounted<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EmbeddedRefCounted")
            .field("pointee", &self.address())
            .field("count", &self.ref_count())
            .finish()
    }
}

impl<T: ?Sized> Default for EmbeddedRefCounted<T> {
    fn default() -> Self {
        Self::null()
    }
}

impl<T: ?Sized> Clone for EmbeddedRefCounted<T> {
    fn clone(&self) -> Self {
        Self(self.0.clone())
    }
}

impl<T: ?Sized> Deref for EmbeddedRefCounted<T> {
    type Target = T;
    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

crate::impl_pointer_ordering!(EmbeddedRefCounted);
