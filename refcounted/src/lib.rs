//! GPUオブジェクトのように生成と破棄が頻繁に起きるオブジェクトグラフのための
//! 強参照/弱参照つきの参照カウンタ。
//!
//! 参照カウントの実装には「詳解 Rustアトミック操作とロック ―並行処理実装のための低レイヤプログラミング」の
//! Arcの実装を参考にしている。
//! メモリのOrderingなどは、それに準拠している。
//!
//! - [`RefCounted`]: 強参照。最後の強参照が破棄されるとオブジェクトが破棄される。
//! - [`EmbeddedRefCounted`]: `construct`系を持たない強参照。
//! - [`WeakRef`]: 弱参照。オブジェクトを生かし続けない。使う前に`is_valid`か`upgrade`で確認する。
//! - [`EmbeddedRefCount`]: 自分自身への参照を配れるようにするためのトレイト。
//!
//! オブジェクトとカウンタは基本的に一つのアロケーションにまとめて確保される。
//! 既存の`Box<T>`を包む場合だけ、カウンタ用のブロックが別に確保される。
#![warn(missing_docs)]

/// ポインタのアドレスで比較・順序付け・ハッシュを行う実装を生成する。
/// nullはnullと等しい。
macro_rules! impl_pointer_ordering {
    ($name:ident) => {
        impl<T: ?Sized> PartialEq for $name<T> {
            fn eq(&self, other: &Self) -> bool {
                self.address() == other.address()
            }
        }
        impl<T: ?Sized> Eq for $name<T> {}
        impl<T: ?Sized> PartialOrd for $name<T> {
            fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
                Some(self.cmp(other))
            }
        }
        impl<T: ?Sized> Ord for $name<T> {
            fn cmp(&self, other: &Self) -> std::cmp::Ordering {
                self.address().cmp(&other.address())
            }
        }
        impl<T: ?Sized> std::hash::Hash for $name<T> {
            fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
                self.address().hash(state)
            }
        }
    };
}
pub(crate) use impl_pointer_ordering;

mod entry;

mod strong;
pub use strong::{EmbeddedRefCounted, RefCounted};

mod weak;
pub use weak::WeakRef;

mod embedded;
pub use embedded::{EmbeddedEntry, EmbeddedRefCount};
