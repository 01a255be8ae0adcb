use crate::block::{impl_block_traits, BlockError, LetterBlock};
use crate::letter::Letter;
use crate::nibble::Nibble;

/// チェックサム文字。1 文字 4bit のレター列ブロック。
///
/// 値の算出規則はタイトルごとに異なるため、このクレートでは格納と照合のみを提供する。
#[derive(Clone, Debug, Default)]
pub struct Checksum {
    letters: [Letter; Self::LEN],
}

impl Checksum {
    /// 文字数。
    pub const LEN: usize = 1;

    /// 数値のビット数。
    pub const BITS: u32 = 4;

    /// 値 0 のチェックサムを作る。
    pub const fn new() -> Self {
        Self {
            letters: [Letter::from_value(Nibble::MIN, false); Self::LEN],
        }
    }

    /// 4bit 値から正規文字のチェックサムを作る。
    pub const fn from_nibble(value: Nibble) -> Self {
        Self {
            letters: [Letter::from_value(value, false); Self::LEN],
        }
    }

    /// 4bit 値を返す。
    pub const fn nibble(&self) -> Nibble {
        self.letters[0].value()
    }

    /// 全セルを走査するイテレータを返す。
    pub fn iter(&self) -> std::slice::Iter<'_, Letter> {
        self.letters.iter()
    }
}

impl LetterBlock for Checksum {
    const NAME: &'static str = "checksum";

    fn len(&self) -> usize {
        Self::LEN
    }

    fn bits(&self) -> u32 {
        Self::BITS
    }

    fn letter(&self, i: usize) -> Letter {
        self.letters[i]
    }

    fn set_letter(&mut self, i: usize, letter: Letter) {
        // チェックサムは囮文字への置換を一切許さない。
        let mut letter = letter;
        letter.set_allow_decoy(false);
        self.letters[i] = letter;
    }

    fn value(&self) -> u32 {
        u32::from(self.nibble().get())
    }

    fn set_value(&mut self, value: u32) -> Result<(), BlockError> {
        if value > self.max_value() {
            return Err(BlockError::ValueOutOfRange {
                value,
                max: self.max_value(),
            });
        }

        self.letters[0].set_value(unsafe { Nibble::new_unchecked(value as u8) });

        Ok(())
    }

    fn set_letters(&mut self, letters: &[Letter]) -> Result<(), BlockError> {
        if letters.len() != Self::LEN {
            return Err(BlockError::InvalidLength {
                expected: Self::LEN,
                actual: letters.len(),
            });
        }

        self.set_letter(0, letters[0]);

        Ok(())
    }
}

impl std::ops::Index<usize> for Checksum {
    type Output = Letter;

    fn index(&self, i: usize) -> &Self::Output {
        &self.letters[i]
    }
}

impl<'a> IntoIterator for &'a Checksum {
    type Item = &'a Letter;
    type IntoIter = std::slice::Iter<'a, Letter>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl IntoIterator for Checksum {
    type Item = Letter;
    type IntoIter = std::array::IntoIter<Letter, { Self::LEN }>;

    fn into_iter(self) -> Self::IntoIter {
        self.letters.into_iter()
    }
}

impl_block_traits!(Checksum);

#[cfg(test)]
mod tests {
    use crate::letter::Glyph;
    use crate::parse::ParseStyle;

    use super::*;

    #[test]
    fn test_checksum_nibble_roundtrip() {
        for value in Nibble::all() {
            let sum = Checksum::from_nibble(value);
            assert_eq!(sum.nibble(), value);
            assert_eq!(sum.value(), u32::from(value.get()));
            assert_eq!(sum.letter(0).glyph(), Glyph::canonical(value));
        }
    }

    #[test]
    fn test_checksum_parse() {
        let sum = Checksum::parse_styled("X", ParseStyle::LETTERS).unwrap();
        assert_eq!(sum.value(), 15);

        // 囮文字も入力としては受理され、値 0 となる。
        let sum = Checksum::parse_styled("M", ParseStyle::LETTERS).unwrap();
        assert_eq!(sum.value(), 0);
        assert_eq!(sum.text(), "M");
    }

    #[test]
    fn test_checksum_never_decoy() {
        let mut rng = rand::thread_rng();

        // 置換は許されないので、表示文字はそのまま残る。
        let sum = Checksum::parse_styled("M", ParseStyle::LETTERS).unwrap();
        assert_eq!(sum.normalized().text(), "M");
        assert_eq!(sum.randomized(&mut rng).text(), "M");
    }
}
