use arrayvec::ArrayVec;
use rand::Rng;
use thiserror::Error;

use crate::format::{format_block, BlockFormat, FormatError};
use crate::letter::{Glyph, Letter, LetterError};
use crate::parse::{parse_into, ParseError, ParseStyle};

/// レター列ブロックの最大文字数 (ワイドレイアウトのパスワード)。
pub const BLOCK_MAX_LEN: usize = 8;

/// 固定文字数のレター列と、それが表す数値との相互変換を提供するブロック。
///
/// レター列・文字列・数値のどの表現を書き換えても、他の表現は常に一貫する。
/// セルの囮許可は実装型ごとの配置規則で管理され、格納時に再計算される。
#[allow(clippy::len_without_is_empty)]
pub trait LetterBlock: Clone {
    /// 型名。エラーメッセージに使われる。
    const NAME: &'static str;

    /// 文字数を返す。
    fn len(&self) -> usize;

    /// 数値のビット数を返す。
    fn bits(&self) -> u32;

    /// `i` 番目のセルを返す。
    ///
    /// # Panics
    ///
    /// `i` が文字数以上のとき panic する。
    fn letter(&self, i: usize) -> Letter;

    /// `i` 番目のセルを設定する。セルの囮許可は配置規則で再計算される。
    ///
    /// # Panics
    ///
    /// `i` が文字数以上のとき panic する。
    fn set_letter(&mut self, i: usize, letter: Letter);

    /// ブロック全体が表す数値を返す。
    fn value(&self) -> u32;

    /// 数値からレター列を設定し直す。表示文字は全て正規文字となる。
    fn set_value(&mut self, value: u32) -> Result<(), BlockError>;

    /// レター列を設定する。表示文字 (囮文字を含む) は保持される。
    fn set_letters(&mut self, letters: &[Letter]) -> Result<(), BlockError>;

    /// 表せる最大の数値を返す。
    fn max_value(&self) -> u32 {
        (1 << self.bits()) - 1
    }

    /// レター列を文字列として返す。
    fn text(&self) -> String {
        (0..self.len()).map(|i| self.letter(i).to_char()).collect()
    }

    /// 文字列からレター列を設定する。大文字小文字を区別しない。
    fn set_text(&mut self, text: &str) -> Result<(), BlockError> {
        let letters = letters_from_text(text, self.len())?;
        self.set_letters(&letters)
    }

    /// 全セルを格納した配列を返す。
    fn to_letters(&self) -> ArrayVec<Letter, BLOCK_MAX_LEN> {
        (0..self.len()).map(|i| self.letter(i)).collect()
    }

    /// 囮文字を正規の `Z` に置換する。置換が許されたセルのみが対象となる。
    fn normalize(&mut self) {
        for i in 0..self.len() {
            let letter = self.letter(i).normalized();
            self.set_letter(i, letter);
        }
    }

    /// 囮文字を指定の文字に置換する。置換が許されたセルのみが対象となる。
    ///
    /// `zero` は値 0 の文字 (`Z` または囮文字) でなければならない。
    fn normalize_to(&mut self, zero: Glyph) -> Result<(), BlockError> {
        for i in 0..self.len() {
            let letter = self.letter(i).normalized_to(zero)?;
            self.set_letter(i, letter);
        }

        Ok(())
    }

    /// 囮文字を正規の `Z` に置換したブロックを返す。
    fn normalized(&self) -> Self {
        let mut res = self.clone();
        res.normalize();
        res
    }

    /// 囮文字を指定の文字に置換したブロックを返す。
    fn normalized_to(&self, zero: Glyph) -> Result<Self, BlockError> {
        let mut res = self.clone();
        res.normalize_to(zero)?;
        Ok(res)
    }

    /// 値 0 のセルの表示文字を囮文字からランダムに選び直す。置換が許されたセルのみが対象となる。
    fn randomize<R: Rng>(&mut self, rng: &mut R) {
        for i in 0..self.len() {
            let letter = self.letter(i).randomized(rng);
            self.set_letter(i, letter);
        }
    }

    /// 値 0 のセルの表示文字を囮文字からランダムに選び直したブロックを返す。
    fn randomized<R: Rng>(&self, rng: &mut R) -> Self {
        let mut res = self.clone();
        res.randomize(rng);
        res
    }

    /// 文字列をパースしてブロックを作る。全ての記法を許可する。
    fn parse(text: &str) -> Result<Self, ParseError>
    where
        Self: Default,
    {
        Self::parse_styled(text, ParseStyle::ANY)
    }

    /// 記法を制限して文字列をパースし、ブロックを作る。
    fn parse_styled(text: &str, style: ParseStyle) -> Result<Self, ParseError>
    where
        Self: Default,
    {
        let mut block = Self::default();
        parse_into(&mut block, text, style)?;

        Ok(block)
    }

    /// 文字列をパースしてブロックを作る。失敗したら `None` を返す。
    fn try_parse(text: &str) -> Option<Self>
    where
        Self: Default,
    {
        Self::parse(text).ok()
    }

    /// 記法を制限して文字列をパースし、ブロックを作る。失敗したら `None` を返す。
    fn try_parse_styled(text: &str, style: ParseStyle) -> Option<Self>
    where
        Self: Default,
    {
        Self::parse_styled(text, style).ok()
    }

    /// フォーマット文字列に従ってブロックを文字列化する。乱数源にはスレッドローカル RNG を使う。
    fn format(&self, spec: &str) -> Result<String, FormatError> {
        self.format_with(spec, &mut rand::thread_rng())
    }

    /// フォーマット文字列に従ってブロックを文字列化する。
    fn format_with<R: Rng>(&self, spec: &str, rng: &mut R) -> Result<String, FormatError> {
        let format = BlockFormat::parse(spec, Self::NAME)?;

        Ok(format_block(self, &format, rng))
    }
}

/// ブロックと比較可能な値。レター列/文字列/数値のいずれか。
#[derive(Clone, Copy, Debug)]
pub enum Comparand<'a> {
    /// レター列。
    Letters(&'a [Letter]),
    /// レター列の文字列表現。
    Text(&'a str),
    /// 数値。
    Value(u32),
}

/// ブロックと `Comparand` が同じ値を表すかどうかを返す。
///
/// どの形式も一旦数値に落としてから比較する。文字数が合わないレター列や、
/// レター列として解釈できない文字列は等しくないものとして扱う。
pub fn block_cmp<B: LetterBlock>(block: &B, other: Comparand<'_>) -> bool {
    match other {
        Comparand::Letters(letters) => {
            let mut probe = block.clone();
            probe.set_letters(letters).is_ok() && probe.value() == block.value()
        }
        Comparand::Text(text) => {
            let mut probe = block.clone();
            probe.set_text(text).is_ok() && probe.value() == block.value()
        }
        Comparand::Value(value) => block.value() == value,
    }
}

/// 文字列をレター列に変換する。文字数は `len` に一致しなければならない。
pub(crate) fn letters_from_text(
    text: &str,
    len: usize,
) -> Result<ArrayVec<Letter, BLOCK_MAX_LEN>, BlockError> {
    let n = text.chars().count();
    if n != len {
        return Err(BlockError::InvalidLength {
            expected: len,
            actual: n,
        });
    }

    let mut letters = ArrayVec::new();
    for (i, c) in text.chars().enumerate() {
        let glyph = Glyph::from_char(c).ok_or(BlockError::InvalidChar { pos: i, ch: c })?;
        letters.push(Letter::new(glyph, false));
    }

    Ok(letters)
}

/// ブロック型に `Display`/`FromStr`/値ベースの比較/多相な `PartialEq` を実装する。
macro_rules! impl_block_traits {
    ($ty:ident) => {
        impl std::fmt::Display for $ty {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(&crate::block::LetterBlock::text(self))
            }
        }

        impl std::str::FromStr for $ty {
            type Err = crate::parse::ParseError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                <Self as crate::block::LetterBlock>::parse(s)
            }
        }

        impl PartialEq for $ty {
            fn eq(&self, other: &Self) -> bool {
                crate::block::LetterBlock::value(self) == crate::block::LetterBlock::value(other)
            }
        }

        impl Eq for $ty {}

        impl PartialOrd for $ty {
            fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
                Some(self.cmp(other))
            }
        }

        impl Ord for $ty {
            fn cmp(&self, other: &Self) -> std::cmp::Ordering {
                crate::block::LetterBlock::value(self)
                    .cmp(&crate::block::LetterBlock::value(other))
            }
        }

        impl std::hash::Hash for $ty {
            fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
                crate::block::LetterBlock::value(self).hash(state);
            }
        }

        impl PartialEq<u32> for $ty {
            fn eq(&self, other: &u32) -> bool {
                crate::block::block_cmp(self, crate::block::Comparand::Value(*other))
            }
        }

        impl PartialEq<$ty> for u32 {
            fn eq(&self, other: &$ty) -> bool {
                other == self
            }
        }

        impl PartialEq<str> for $ty {
            fn eq(&self, other: &str) -> bool {
                crate::block::block_cmp(self, crate::block::Comparand::Text(other))
            }
        }

        impl PartialEq<&str> for $ty {
            fn eq(&self, other: &&str) -> bool {
                crate::block::block_cmp(self, crate::block::Comparand::Text(other))
            }
        }

        impl PartialEq<[crate::letter::Letter]> for $ty {
            fn eq(&self, other: &[crate::letter::Letter]) -> bool {
                crate::block::block_cmp(self, crate::block::Comparand::Letters(other))
            }
        }

        impl PartialEq<&[crate::letter::Letter]> for $ty {
            fn eq(&self, other: &&[crate::letter::Letter]) -> bool {
                crate::block::block_cmp(self, crate::block::Comparand::Letters(other))
            }
        }

        impl<const N: usize> PartialEq<[crate::letter::Letter; N]> for $ty {
            fn eq(&self, other: &[crate::letter::Letter; N]) -> bool {
                crate::block::block_cmp(self, crate::block::Comparand::Letters(other))
            }
        }
    };
}

pub(crate) use impl_block_traits;

/// ブロック操作で発生しうるエラー。
#[derive(Clone, Debug, Eq, PartialEq, Error)]
pub enum BlockError {
    /// 文字数が正しくない。
    #[error("expected {expected} letters, got {actual}")]
    InvalidLength { expected: usize, actual: usize },

    /// 数値が範囲外。
    #[error("value {value:#X} is out of range (max {max:#X})")]
    ValueOutOfRange { value: u32, max: u32 },

    /// 無効な文字が含まれている。
    #[error("invalid letter character '{ch}' at position {pos}")]
    InvalidChar { pos: usize, ch: char },

    /// レター操作のエラー。
    #[error(transparent)]
    Letter(#[from] LetterError),
}
