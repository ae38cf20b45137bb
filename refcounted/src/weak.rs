//! 弱参照のハンドル`WeakRef`を定義する。

use crate::entry::{decrement_weakcount, EntryPtr};
use crate::{EmbeddedRefCounted, RefCounted};
use std::{fmt::Debug, ptr::NonNull};

/// 参照カウンタで管理されたオブジェクトへの弱参照
///
/// オブジェクトを生かし続けないので、循環参照を切るために使う。
/// 有効性はオブジェクトの強参照が残っているかどうかで判定される。
/// 中身を使うときは`upgrade`で一時的に強参照を取る。
pub struct WeakRef<T: ?Sized> {
    entry: Option<EntryPtr>,
    pointee: Option<NonNull<T>>,
}
impl<T: ?Sized> WeakRef<T> {
    /// 何も指していない弱参照を作成する
    pub const fn null() -> Self {
        Self {
            entry: None,
            pointee: None,
        }
    }

    /// 弱参照を一つ所有している前提で組み立てる
    pub(crate) fn from_raw_parts(entry: EntryPtr, pointee: NonNull<T>) -> Self {
        Self {
            entry: Some(entry),
            pointee: Some(pointee),
        }
    }

    pub(crate) fn address(&self) -> Option<NonNull<()>> {
        self.pointee.map(|p| p.cast::<()>())
    }

    /// 対象のオブジェクトにまだ強参照が残っているかどうか
    pub fn is_valid(&self) -> bool {
        self.entry
            .map_or(false, |e| unsafe { e.as_ref() }.counters().count() > 0)
    }

    /// `!is_valid()`と同じ
    pub fn is_null(&self) -> bool {
        !self.is_valid()
    }

    /// 最後に指していたポインタを返す。
    /// オブジェクトがすでに破棄されていても値は変わらないので、参照外しには使わないこと。
    pub fn get(&self) -> Option<NonNull<T>> {
        self.pointee
    }

    /// 有効性を確認せずに参照を取得する
    ///
    /// ## Safety
    /// オブジェクトの強参照が残っていること。
    /// 通常は`upgrade`を使うこと。
    pub unsafe fn get_unchecked(&self) -> &T {
        match self.pointee {
            Some(p) => &*p.as_ptr(),
            None => panic!("Dereferencing NULL pointer"),
        }
    }

    /// 強参照を取得する。オブジェクトがすでに破棄されていればnullを返す。
    pub fn upgrade(&self) -> RefCounted<T> {
        match (self.entry, self.pointee) {
            (Some(entry), Some(pointee))
                if unsafe { entry.as_ref() }.counters().try_increment_count() =>
            {
                RefCounted::from_raw_parts(entry, pointee)
            }
            _ => RefCounted::null(),
        }
    }

    /// 強参照の数
    pub fn ref_count(&self) -> i32 {
        self.entry
            .map_or(0, |e| unsafe { e.as_ref() }.counters().count())
    }

    /// 弱参照の数
    pub fn weak_count(&self) -> i32 {
        self.entry
            .map_or(0, |e| unsafe { e.as_ref() }.counters().weakcount())
    }

    /// 弱参照を手放してnullにする
    pub fn reset(&mut self) {
        drop(std::mem::take(self));
    }

    /// 同じオブジェクトを指しているかどうか
    pub fn ptr_eq(a: &Self, b: &Self) -> bool {
        a.address() == b.address()
    }
}

impl<T: ?Sized> From<&RefCounted<T>> for WeakRef<T> {
    fn from(strong: &RefCounted<T>) -> Self {
        match (strong.entry(), strong.as_ptr()) {
            (Some(entry), Some(pointee)) => {
                unsafe { entry.as_ref() }.counters().increment_weakcount();
                Self::from_raw_parts(entry, pointee)
            }
            _ => Self::null(),
        }
    }
}

impl<T: ?Sized> From<&EmbeddedRefCounted<T>> for WeakRef<T> {
    fn from(strong: &EmbeddedRefCounted<T>) -> Self {
        Self::from(strong.as_ref_counted())
    }
}

// Debugトレイトの実装
impl<T: ?Sized> Debug for WeakRef<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WeakRef")
            .field("pointee", &self.address())
            .field("valid", &self.is_valid())
            .finish()
    }
}

impl<T: ?Sized> Default for WeakRef<T> {
    fn default() -> Self {
        Self::null()
    }
}

// TがSendかつSyncであればWeakRefはSendかつSync
unsafe impl<T: ?Sized + Send + Sync> Send for WeakRef<T> {}
unsafe impl<T: ?Sized + Send + Sync> Sync for WeakRef<T> {}

// Cloneで弱参照カウントを増やす
impl<T: ?Sized> Clone for WeakRef<T> {
    fn clone(&self) -> Self {
        if let Some(entry) = self.entry {
            unsafe { entry.as_ref() }.counters().increment_weakcount();
        }
        Self {
            entry: self.entry,
            pointee: self.pointee,
        }
    }
}

// Drop時に弱参照カウントを減らし、強参照も残っていなければエントリを解放する
impl<T: ?Sized> Drop for WeakRef<T> {
    fn drop(&mut self) {
        if let Some(entry) = self.entry.take() {
            unsafe { decrement_weakcount(entry) };
        }
    }
}

crate::impl_pointer_ordering!(WeakRef);
