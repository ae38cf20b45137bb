//! 参照カウントのブックキーピングを行うエントリを定義する。
//!
//! エントリは強参照と弱参照の数を保持し、
//! オブジェクトの破棄(`destroy_object`)とエントリ自身の解放(`delete_entry`)の二つのフックを持つ。
//! 強参照全体で暗黙の弱参照を一つ持つことで、エントリの解放がちょうど一回になるようにしている。

use parking_lot::Mutex;
use std::{
    cell::UnsafeCell,
    mem::MaybeUninit,
    ptr::{self, NonNull},
    sync::atomic::{fence, AtomicI32, Ordering},
};

/// 型を消去したエントリへのポインタ
pub(crate) type EntryPtr = NonNull<dyn RefCountEntry>;

const MAX_REFS: i32 = i32::MAX / 2;

/// 強参照と弱参照のカウンタ
pub(crate) struct RefCountCounters {
    count: AtomicI32,
    // 強参照全体で1つ分の暗黙の弱参照を含む
    weakcount: AtomicI32,
    // weakcountのうちEmbeddedEntryが自分のエントリに対して持っている分
    embedded_weakcount: AtomicI32,
    lock: Mutex<()>,
}
impl RefCountCounters {
    pub(crate) fn new() -> Self {
        Self {
            count: AtomicI32::new(1),
            weakcount: AtomicI32::new(1),
            embedded_weakcount: AtomicI32::new(0),
            lock: Mutex::new(()),
        }
    }

    /// 強参照の数
    pub(crate) fn count(&self) -> i32 {
        self.count.load(Ordering::Acquire)
    }

    /// 弱参照の数
    pub(crate) fn weakcount(&self) -> i32 {
        let weak = self.weakcount.load(Ordering::Acquire)
            - self.embedded_weakcount.load(Ordering::Acquire);
        if self.count() > 0 {
            weak - 1
        } else {
            weak
        }
    }

    pub(crate) fn increment_count(&self) {
        let old = self.count.fetch_add(1, Ordering::Relaxed);
        if old <= 0 {
            let _guard = self.lock.lock();
            self.count.fetch_sub(1, Ordering::Relaxed);
            panic!("RefCounted::increment_count: Tried to increment the count of an object but it had already been destroyed!");
        }
        if old > MAX_REFS {
            panic!("Too many references to RefCounted");
        }
    }

    /// 強参照がまだ残っている場合に限り強参照を増やす。
    pub(crate) fn try_increment_count(&self) -> bool {
        let mut n = self.count.load(Ordering::Relaxed);
        loop {
            if n == 0 {
                return false;
            }
            assert!(n <= MAX_REFS, "Too many references to RefCounted");
            match self
                .count
                .compare_exchange_weak(n, n + 1, Ordering::Acquire, Ordering::Relaxed)
            {
                Ok(_) => return true,
                Err(current) => n = current,
            }
        }
    }

    /// `EmbeddedEntry`が持つ弱参照を数える。`weakcount()`には含めない。
    pub(crate) fn increment_embedded_weakcount(&self) {
        self.increment_weakcount();
        self.embedded_weakcount.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn release_embedded_weakcount(&self) {
        self.embedded_weakcount.fetch_sub(1, Ordering::Relaxed);
    }

    pub(crate) fn increment_weakcount(&self) {
        let old = self.weakcount.fetch_add(1, Ordering::Relaxed);
        if old <= 0 {
            let _guard = self.lock.lock();
            self.weakcount.fetch_sub(1, Ordering::Relaxed);
            panic!("RefCounted::increment_weakcount: Tried to increment the count of an object but it had already been destroyed!");
        }
        if old > MAX_REFS {
            panic!("Too many weak references to RefCounted");
        }
    }
}

/// 参照カウントの対象を保持するエントリ
///
/// ## Safety
/// `destroy_object`は強参照が0になったときにちょうど一回だけ呼ばれる。
/// 実装側はそれ以降保持しているオブジェクトにアクセスしてはならない。
pub(crate) unsafe trait RefCountEntry: Send + Sync {
    fn counters(&self) -> &RefCountCounters;

    /// 保持しているオブジェクトを破棄する。エントリのメモリは解放しない。
    unsafe fn destroy_object(&self);

    /// エントリ自身のメモリを解放する。
    fn delete_entry(self: Box<Self>) {
        drop(self)
    }
}

/// 強参照を一つ手放す。最後の強参照であればオブジェクトを破棄する。
///
/// ## Safety
/// `entry`は生きていて、呼び出し側が強参照を一つ所有していること。
pub(crate) unsafe fn decrement_count(entry: EntryPtr) {
    let e = entry.as_ref();
    let counters = e.counters();
    let old = counters.count.fetch_sub(1, Ordering::Release);
    debug_assert!(old > 0, "BUG - Count was negative.");
    if old == 1 {
        fence(Ordering::Acquire);
        // オブジェクトのDropがpanicしても強参照全体で持っていた弱参照は手放す
        let _release = ImplicitWeakRelease(entry);
        // ロックを持ったままエントリを解放しないこと
        let _guard = counters.lock.lock();
        e.destroy_object();
    }
}

// 宣言と逆順に破棄されるので、ロックを外してから弱参照を手放す
struct ImplicitWeakRelease(EntryPtr);
impl Drop for ImplicitWeakRelease {
    fn drop(&mut self) {
        unsafe { decrement_weakcount(self.0) };
    }
}

/// 弱参照を一つ手放す。最後の参照であればエントリを解放する。
///
/// ## Safety
/// `entry`は生きていて、呼び出し側が弱参照を一つ所有していること。
pub(crate) unsafe fn decrement_weakcount(entry: EntryPtr) {
    let old = entry
        .as_ref()
        .counters()
        .weakcount
        .fetch_sub(1, Ordering::Release);
    debug_assert!(old > 0, "BUG - Weak count was negative.");
    if old == 1 {
        fence(Ordering::Acquire);
        Box::from_raw(entry.as_ptr()).delete_entry();
    }
}

/// オブジェクトをカウンタと同じメモリブロックに配置するエントリ
pub(crate) struct IntrusiveEntry<T> {
    counters: RefCountCounters,
    value: UnsafeCell<MaybeUninit<T>>,
}
impl<T: Send + Sync + 'static> IntrusiveEntry<T> {
    /// エントリを確保してその中に`value`を配置する。強参照の数は1から始まる。
    pub(crate) fn allocate(value: T) -> (EntryPtr, NonNull<T>) {
        #[cfg(test)]
        tests::entry_allocated();
        let raw = Box::into_raw(Box::new(Self {
            counters: RefCountCounters::new(),
            value: UnsafeCell::new(MaybeUninit::new(value)),
        }));
        unsafe {
            let pointee = NonNull::new_unchecked((*raw).value.get().cast::<T>());
            let entry: *mut dyn RefCountEntry = raw;
            (NonNull::new_unchecked(entry), pointee)
        }
    }
}
unsafe impl<T: Send + Sync> RefCountEntry for IntrusiveEntry<T> {
    fn counters(&self) -> &RefCountCounters {
        &self.counters
    }

    unsafe fn destroy_object(&self) {
        ptr::drop_in_place((*self.value.get()).as_mut_ptr());
    }
}
// IntrusiveEntryの中身はTがSendかつSyncならSendかつSync
unsafe impl<T: Send + Sync> Send for IntrusiveEntry<T> {}
unsafe impl<T: Send + Sync> Sync for IntrusiveEntry<T> {}

#[cfg(test)]
impl<T> Drop for IntrusiveEntry<T> {
    fn drop(&mut self) {
        tests::entry_freed();
    }
}

/// 別に確保された`Box<T>`を指すエントリ
pub(crate) struct PlainEntry<T: ?Sized> {
    counters: RefCountCounters,
    ptr: NonNull<T>,
}
impl<T: ?Sized + Send + Sync + 'static> PlainEntry<T> {
    pub(crate) fn allocate(value: Box<T>) -> (EntryPtr, NonNull<T>) {
        #[cfg(test)]
        tests::entry_allocated();
        let ptr = unsafe { NonNull::new_unchecked(Box::into_raw(value)) };
        let raw = Box::into_raw(Box::new(Self {
            counters: RefCountCounters::new(),
            ptr,
        }));
        let entry: *mut dyn RefCountEntry = raw;
        (unsafe { NonNull::new_unchecked(entry) }, ptr)
    }
}
unsafe impl<T: ?Sized + Send + Sync> RefCountEntry for PlainEntry<T> {
    fn counters(&self) -> &RefCountCounters {
        &self.counters
    }

    unsafe fn destroy_object(&self) {
        drop(Box::from_raw(self.ptr.as_ptr()));
    }
}
unsafe impl<T: ?Sized + Send + Sync> Send for PlainEntry<T> {}
unsafe impl<T: ?Sized + Send + Sync> Sync for PlainEntry<T> {}

#[cfg(test)]
impl<T: ?Sized> Drop for PlainEntry<T> {
    fn drop(&mut self) {
        tests::entry_freed();
    }
}
