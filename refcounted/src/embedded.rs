//! オブジェクトが自分自身への参照を配れるようにするための仕組みを定義する。

use crate::entry::{decrement_weakcount, EntryPtr, IntrusiveEntry};
use crate::{EmbeddedRefCounted, RefCounted, WeakRef};
use std::{any::TypeId, fmt::Debug, ptr::NonNull, sync::OnceLock};

// エントリと、そのエントリが保持しているオブジェクトのアドレスと型
#[derive(Clone, Copy)]
struct Binding {
    entry: EntryPtr,
    pointee: NonNull<()>,
    type_id: TypeId,
}
// エントリのカウンタはアトミックなので、ポインタはスレッド間で共有してよい
unsafe impl Send for Binding {}
unsafe impl Sync for Binding {}

/// 自分を保持しているエントリへのポインタ
///
/// `EmbeddedRefCount`を実装する型にフィールドとして持たせる。
/// `create_new`で作成されたときに一度だけ設定される。
/// 設定時のオブジェクトのアドレスと型も記録しておき、
/// それ以外のオブジェクトからこのエントリへの参照は作らせない。
/// 設定されている間はエントリへの弱参照を一つ持つので、エントリが先に解放されることはない。
pub struct EmbeddedEntry {
    binding: OnceLock<Binding>,
}
impl EmbeddedEntry {
    /// 未設定の状態で作成する
    pub const fn new() -> Self {
        Self {
            binding: OnceLock::new(),
        }
    }

    /// `create_new`経由で作成されていればtrue
    pub fn is_bound(&self) -> bool {
        self.binding.get().is_some()
    }

    pub(crate) fn bind<T: 'static>(&self, entry: EntryPtr, pointee: NonNull<T>) {
        let bound = self
            .binding
            .set(Binding {
                entry,
                pointee: pointee.cast(),
                type_id: TypeId::of::<T>(),
            })
            .is_ok();
        assert!(bound, "EmbeddedEntry is already bound to another entry");
        unsafe { entry.as_ref() }
            .counters()
            .increment_embedded_weakcount();
    }

    /// `this`がこのエントリに保持されているオブジェクトそのものであればエントリを返す
    pub(crate) fn entry_for<T: 'static>(&self, this: &T) -> Option<EntryPtr> {
        self.binding
            .get()
            .filter(|b| {
                b.pointee == NonNull::from(this).cast() && b.type_id == TypeId::of::<T>()
            })
            .map(|b| b.entry)
    }
}
// 設定時に取った弱参照を手放す
impl Drop for EmbeddedEntry {
    fn drop(&mut self) {
        if let Some(binding) = self.binding.take() {
            unsafe {
                binding.entry.as_ref().counters().release_embedded_weakcount();
                decrement_weakcount(binding.entry);
            }
        }
    }
}

impl Default for EmbeddedEntry {
    fn default() -> Self {
        Self::new()
    }
}
impl Debug for EmbeddedEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EmbeddedEntry")
            .field("bound", &self.is_bound())
            .finish()
    }
}

/// 自分自身への強参照/弱参照を取得できるオブジェクト
///
/// 親オブジェクトが子に自分への弱参照を渡すときなどに使う。
/// オブジェクトは必ず`create_new`で作成すること。
/// それ以外の方法で作られたオブジェクトや、
/// 別のオブジェクトの`EmbeddedEntry`を返す実装からはnullの参照しか得られない。
///
/// ```
/// use refcounted::{EmbeddedEntry, EmbeddedRefCount};
///
/// struct Node {
///     embedded: EmbeddedEntry,
/// }
/// impl EmbeddedRefCount for Node {
///     fn embedded_entry(&self) -> &EmbeddedEntry {
///         &self.embedded
///     }
/// }
///
/// let node = Node::create_new(Node { embedded: EmbeddedEntry::new() });
/// assert_eq!(node.ref_count(), 1);
/// let again = node.get_reference();
/// assert_eq!(node.ref_count(), 2);
/// # drop(again);
/// ```
pub trait EmbeddedRefCount: Sized + Send + Sync + 'static {
    /// 自分が持っている`EmbeddedEntry`を返す
    fn embedded_entry(&self) -> &EmbeddedEntry;

    /// `value`をカウンタと同じメモリブロックに配置し、最初の強参照を返す。
    /// 強参照の数は1から始まる。
    fn create_new(value: Self) -> EmbeddedRefCounted<Self> {
        let (entry, pointee) = IntrusiveEntry::allocate(value);
        unsafe { pointee.as_ref() }
            .embedded_entry()
            .bind(entry, pointee);
        RefCounted::from_raw_parts(entry, pointee).into()
    }

    /// 自分への強参照を取得する。`create_new`で作られていなければnull。
    ///
    /// 破棄中のオブジェクトに対して呼ぶとpanicする。
    fn get_reference(&self) -> EmbeddedRefCounted<Self> {
        match self.embedded_entry().entry_for(self) {
            Some(entry) => {
                unsafe { entry.as_ref() }.counters().increment_count();
                RefCounted::from_raw_parts(entry, NonNull::from(self)).into()
            }
            None => EmbeddedRefCounted::null(),
        }
    }

    /// 自分への弱参照を取得する。`create_new`で作られていなければnull。
    fn get_weak_reference(&self) -> WeakRef<Self> {
        match self.embedded_entry().entry_for(self) {
            Some(entry) => {
                unsafe { entry.as_ref() }.counters().increment_weakcount();
                WeakRef::from_raw_parts(entry, NonNull::from(self))
            }
            None => WeakRef::null(),
        }
    }
}
