use std::num::ParseIntError;

use thiserror::Error;

use crate::macros::assert_unchecked;

/// 4bit 値 (`0..=15`)。レター 1 文字が持つ情報量に相当する。
#[derive(Clone, Copy, Default, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct Nibble(u8);

impl Nibble {
    /// 最小の内部値。
    pub const MIN_VALUE: u8 = 0;

    /// 最大の内部値。
    pub const MAX_VALUE: u8 = 0xF;

    /// 最小値。
    pub const MIN: Self = Self(Self::MIN_VALUE);

    /// 最大値。
    pub const MAX: Self = Self(Self::MAX_VALUE);

    /// 引数が値域内にあるかどうかを返す。
    pub const fn in_range(x: u8) -> bool {
        x <= Self::MAX_VALUE
    }

    /// `u8` から `Nibble` を作る。引数が値域内になければ `None` を返す。
    pub const fn new(inner: u8) -> Option<Self> {
        if Self::in_range(inner) {
            Some(unsafe { Self::new_unchecked(inner) })
        } else {
            None
        }
    }

    /// `u8` から `Nibble` を作る。
    ///
    /// # Safety
    ///
    /// 引数は値域内になければならない。
    pub const unsafe fn new_unchecked(inner: u8) -> Self {
        assert_unchecked!(Self::in_range(inner));
        Self(inner)
    }

    /// 内部値を返す。
    pub const fn get(self) -> u8 {
        self.0
    }

    /// 全ての値を昇順で返す。
    pub fn all(
    ) -> impl Iterator<Item = Self> + DoubleEndedIterator + ExactSizeIterator + std::iter::FusedIterator
    {
        (Self::MIN_VALUE..=Self::MAX_VALUE).map(|i| unsafe { Self::new_unchecked(i) })
    }

    /// 指定された基数で文字列をパースする。
    pub fn from_str_radix(s: &str, radix: u32) -> Result<Self, NibbleParseError> {
        let value = u8::from_str_radix(s, radix)?;

        if value > Self::MAX_VALUE {
            return Err(NibbleParseError::AboveMax);
        }

        Ok(unsafe { Self::new_unchecked(value) })
    }
}

macro_rules! impl_primitive_from_nibble {
    ($($ty:ty)*) => {
        $(
            impl From<Nibble> for $ty {
                fn from(x: Nibble) -> Self {
                    Self::from(x.get())
                }
            }
        )*
    };
}

impl_primitive_from_nibble!(i16 i32 i64 i128 isize u8 u16 u32 u64 u128 usize);

impl std::str::FromStr for Nibble {
    type Err = NibbleParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_str_radix(s, 10)
    }
}

macro_rules! impl_fmt_traits {
    ($($trait:ident),*) => {
        $(
            impl std::fmt::$trait for Nibble {
                fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                    std::fmt::$trait::fmt(&self.0, f)
                }
            }
        )*
    };
}

impl_fmt_traits!(Binary, Debug, Display, LowerExp, LowerHex, Octal, UpperExp, UpperHex);

/// 4bit 値のパース時に発生しうるエラー。
#[derive(Clone, Debug, Eq, PartialEq, Error)]
pub enum NibbleParseError {
    /// 最大値よりも大きい。
    #[error("number is above 15")]
    AboveMax,

    /// パースエラー。
    #[error(transparent)]
    Parse(#[from] ParseIntError),
}
