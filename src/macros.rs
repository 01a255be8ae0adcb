/// Debug ビルドでは `assert!` と同様に働き、Release ビルドでは条件が偽のとき未定義動作となる。
///
/// # Safety
///
/// 条件は必ず真でなければならない。
macro_rules! assert_unchecked {
    ($cond:expr $(,)?) => {
        if cfg!(debug_assertions) {
            assert!($cond);
        } else if !$cond {
            ::std::hint::unreachable_unchecked()
        }
    };
}

pub(crate) use assert_unchecked;
