use arrayvec::ArrayVec;
use bitvec::prelude::*;

use crate::block::{impl_block_traits, BlockError, LetterBlock};
use crate::letter::Letter;
use crate::nibble::Nibble;
use crate::parse::{parse_into, ParseError, ParseStyle};

/// `FlagData` の内部バッファ。
pub type FlagDataInner = ArrayVec<Letter, { FlagData::MAX_LEN }>;

/// フラグ列のレイアウト。文字数とビット配置を定める。
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
pub enum FlagLayout {
    /// 5 文字 20bit。先頭のセルが最上位ニブルとなる。
    #[default]
    Wide,

    /// 4 文字 16bit。先頭のセルが最下位ニブルとなる。
    Narrow,
}

impl FlagLayout {
    /// 文字数を返す。
    #[allow(clippy::len_without_is_empty)]
    pub const fn len(self) -> usize {
        match self {
            Self::Wide => 5,
            Self::Narrow => 4,
        }
    }

    /// 値のビット数を返す。
    pub const fn bits(self) -> u32 {
        match self {
            Self::Wide => 20,
            Self::Narrow => 16,
        }
    }

    /// `i` 番目のセルのビットシフト量を返す。
    const fn shift(self, i: usize) -> u32 {
        match self {
            Self::Wide => 4 * (self.len() as u32 - 1 - i as u32),
            Self::Narrow => 4 * i as u32,
        }
    }

    /// `i` 番目のセルが囮文字を許すかどうかを返す。
    const fn allow_decoy(self, i: usize) -> bool {
        match self {
            Self::Wide => i >= 2,
            Self::Narrow => i >= 1,
        }
    }
}

/// フラグ列。レイアウトに応じて 5 文字 (20bit) または 4 文字 (16bit) のレター列となる。
///
/// 比較はレイアウトを区別せず数値のみで行う。
#[derive(Clone, Debug)]
pub struct FlagData {
    letters: FlagDataInner,
    layout: FlagLayout,
}

impl FlagData {
    /// フラグ列の最大文字数。
    pub const MAX_LEN: usize = 5;

    /// 値 0 の `Wide` レイアウトのフラグ列を作る。
    pub fn new() -> Self {
        Self::with_layout(FlagLayout::Wide)
    }

    /// 値 0 のフラグ列を作る。
    pub fn with_layout(layout: FlagLayout) -> Self {
        let mut letters = FlagDataInner::new();
        for i in 0..layout.len() {
            let mut letter = Letter::default();
            letter.set_allow_decoy(layout.allow_decoy(i));
            letters.push(letter);
        }

        Self { letters, layout }
    }

    /// 値を指定してフラグ列を作る。値が範囲外ならエラーを返す。
    pub fn from_value(layout: FlagLayout, value: u32) -> Result<Self, BlockError> {
        let mut res = Self::with_layout(layout);
        res.set_value(value)?;

        Ok(res)
    }

    /// レイアウトと記法を指定して文字列をパースし、フラグ列を作る。
    pub fn parse_layout(
        text: &str,
        layout: FlagLayout,
        style: ParseStyle,
    ) -> Result<Self, ParseError> {
        let mut res = Self::with_layout(layout);
        parse_into(&mut res, text, style)?;

        Ok(res)
    }

    /// レイアウトを返す。
    pub const fn layout(&self) -> FlagLayout {
        self.layout
    }

    /// `index` 番目のフラグビットを返す。LSB がビット 0 となる。
    ///
    /// # Panics
    ///
    /// `index` がビット数以上のとき panic する。
    pub fn bit(&self, index: usize) -> bool {
        let value = self.value();
        let bits = &value.view_bits::<Lsb0>()[..self.bits() as usize];

        bits[index]
    }

    /// `index` 番目のフラグビットを設定する。LSB がビット 0 となる。
    ///
    /// # Panics
    ///
    /// `index` がビット数以上のとき panic する。
    pub fn set_bit(&mut self, index: usize, on: bool) {
        let mut value = self.value();
        let bits = &mut value.view_bits_mut::<Lsb0>()[..self.bits() as usize];
        bits.set(index, on);

        self.store_value(value);
    }

    /// 全セルを走査するイテレータを返す。
    pub fn iter(&self) -> std::slice::Iter<'_, Letter> {
        self.letters.iter()
    }

    /// 値からレター列を設定し直す。値は値域内でなければならない。
    fn store_value(&mut self, value: u32) {
        for i in 0..self.layout.len() {
            let nibble = (value >> self.layout.shift(i) & 0xF) as u8;
            self.letters[i].set_value(unsafe { Nibble::new_unchecked(nibble) });
        }
    }
}

impl Default for FlagData {
    fn default() -> Self {
        Self::new()
    }
}

impl LetterBlock for FlagData {
    const NAME: &'static str = "flag data";

    fn len(&self) -> usize {
        self.layout.len()
    }

    fn bits(&self) -> u32 {
        self.layout.bits()
    }

    fn letter(&self, i: usize) -> Letter {
        self.letters[i]
    }

    fn set_letter(&mut self, i: usize, letter: Letter) {
        let mut letter = letter;
        letter.set_allow_decoy(self.layout.allow_decoy(i));
        self.letters[i] = letter;
    }

    fn value(&self) -> u32 {
        (0..self.layout.len())
            .map(|i| u32::from(self.letters[i].value().get()) << self.layout.shift(i))
            .fold(0, |acc, x| acc | x)
    }

    fn set_value(&mut self, value: u32) -> Result<(), BlockError> {
        if value > self.max_value() {
            return Err(BlockError::ValueOutOfRange {
                value,
                max: self.max_value(),
            });
        }

        self.store_value(value);

        Ok(())
    }

    fn set_letters(&mut self, letters: &[Letter]) -> Result<(), BlockError> {
        if letters.len() != self.layout.len() {
            return Err(BlockError::InvalidLength {
                expected: self.layout.len(),
                actual: letters.len(),
            });
        }

        for (i, &letter) in letters.iter().enumerate() {
            self.set_letter(i, letter);
        }

        Ok(())
    }
}

impl std::ops::Index<usize> for FlagData {
    type Output = Letter;

    fn index(&self, i: usize) -> &Self::Output {
        &self.letters[i]
    }
}

impl<'a> IntoIterator for &'a FlagData {
    type Item = &'a Letter;
    type IntoIter = std::slice::Iter<'a, Letter>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl IntoIterator for FlagData {
    type Item = Letter;
    type IntoIter = arrayvec::IntoIter<Letter, { Self::MAX_LEN }>;

    fn into_iter(self) -> Self::IntoIter {
        self.letters.into_iter()
    }
}

impl_block_traits!(FlagData);
