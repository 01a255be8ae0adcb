use rand::Rng;

use crate::block::{impl_block_traits, BlockError, LetterBlock};
use crate::letter::Letter;
use crate::nibble::Nibble;

/// シーン ID。3 文字のレター列で 10bit の値を表す。
///
/// 値のビット配置は以下の通り (`l0..l2` は各セルの 4bit 値):
///
/// ```text
/// value = l0 | l1 << 4 | (l2 & 0b0011) << 8
/// ```
///
/// 3 文字目の上位 2bit は値に寄与しないパディングで、表示の揺らぎにのみ使われる。
/// 2 文字目は 3 文字目のセル値 (パディングを含む) が非 0 のときのみ囮文字を許す。
#[derive(Clone, Debug)]
pub struct SceneId {
    letters: [Letter; Self::LEN],
}

impl SceneId {
    /// 文字数。
    pub const LEN: usize = 3;

    /// 値のビット数。
    pub const BITS: u32 = 10;

    /// 値の最大値。
    pub const MAX_VALUE: u32 = (1 << Self::BITS) - 1;

    /// 値 0 のシーン ID を作る。
    pub fn new() -> Self {
        Self {
            letters: [Letter::default(); Self::LEN],
        }
    }

    /// 値を指定してシーン ID を作る。値が範囲外ならエラーを返す。
    pub fn from_value(value: u32) -> Result<Self, BlockError> {
        let mut res = Self::new();
        res.set_value(value)?;

        Ok(res)
    }

    /// 3 文字目のパディング 2bit を返す。
    pub fn padding(&self) -> u8 {
        self.letters[2].value().get() >> 2
    }

    /// 全セルを走査するイテレータを返す。
    pub fn iter(&self) -> std::slice::Iter<'_, Letter> {
        self.letters.iter()
    }

    /// 各セルの囮許可を配置規則に従って設定し直す。
    fn refresh_decoy_flags(&mut self) {
        let tail_nonzero = self.letters[2].value().get() != 0;
        self.letters[0].set_allow_decoy(false);
        self.letters[1].set_allow_decoy(tail_nonzero);
        self.letters[2].set_allow_decoy(false);
    }
}

impl Default for SceneId {
    fn default() -> Self {
        Self::new()
    }
}

impl LetterBlock for SceneId {
    const NAME: &'static str = "scene id";

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
        self.letters[i] = letter;
        self.refresh_decoy_flags();
    }

    fn value(&self) -> u32 {
        let l0 = u32::from(self.letters[0].value().get());
        let l1 = u32::from(self.letters[1].value().get());
        let l2 = u32::from(self.letters[2].value().get());

        l0 | l1 << 4 | (l2 & 0b0011) << 8
    }

    fn set_value(&mut self, value: u32) -> Result<(), BlockError> {
        if value > Self::MAX_VALUE {
            return Err(BlockError::ValueOutOfRange {
                value,
                max: Self::MAX_VALUE,
            });
        }

        // パディングは 0 にリセットされる。
        let nibbles = [value & 0xF, value >> 4 & 0xF, value >> 8 & 0b0011];
        for (letter, nibble) in self.letters.iter_mut().zip(nibbles) {
            letter.set_value(unsafe { Nibble::new_unchecked(nibble as u8) });
        }
        self.refresh_decoy_flags();

        Ok(())
    }

    fn set_letters(&mut self, letters: &[Letter]) -> Result<(), BlockError> {
        if letters.len() != Self::LEN {
            return Err(BlockError::InvalidLength {
                expected: Self::LEN,
                actual: letters.len(),
            });
        }

        self.letters.copy_from_slice(letters);
        self.refresh_decoy_flags();

        Ok(())
    }

    fn randomize<R: Rng>(&mut self, rng: &mut R) {
        // パディング 2bit を振り直してから囮文字を選び直す。値は変わらない。
        let keep = self.letters[2].value().get() & 0b0011;
        let padding = rng.gen_range(0u8..4);
        self.letters[2]
            .set_value(unsafe { Nibble::new_unchecked(keep | padding << 2) });
        self.refresh_decoy_flags();

        for i in 0..Self::LEN {
            let letter = self.letters[i].randomized(rng);
            self.letters[i] = letter;
        }
    }
}

impl std::ops::Index<usize> for SceneId {
    type Output = Letter;

    fn index(&self, i: usize) -> &Self::Output {
        &self.letters[i]
    }
}

impl<'a> IntoIterator for &'a SceneId {
    type Item = &'a Letter;
    type IntoIter = std::slice::Iter<'a, Letter>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl IntoIterator for SceneId {
    type Item = Letter;
    type IntoIter = std::array::IntoIter<Letter, { Self::LEN }>;

    fn into_iter(self) -> Self::IntoIter {
        self.letters.into_iter()
    }
}

impl_block_traits!(SceneId);

#[cfg(test)]
mod tests {
    use rand::SeedableRng as _;
    use rand_chacha::ChaCha8Rng;

    use crate::letter::Glyph;
    use crate::parse::ParseStyle;

    use super::*;

    #[test]
    fn test_scene_value_roundtrip() {
        for value in 0..=SceneId::MAX_VALUE {
            let scene = SceneId::from_value(value).unwrap();
            assert_eq!(scene.value(), value);
            assert_eq!(SceneId::parse(&scene.text()).unwrap().value(), value);
        }
    }

    #[test]
    fn test_scene_packing() {
        let scene = SceneId::from_value(0x30F).unwrap();
        assert_eq!(scene.text(), "XZE");
        assert_eq!(scene.letter(0).glyph(), Glyph::X);
        assert_eq!(scene.letter(1).glyph(), Glyph::Z);
        assert_eq!(scene.letter(2).glyph(), Glyph::E);

        assert!(matches!(
            SceneId::from_value(0x400),
            Err(BlockError::ValueOutOfRange { .. })
        ));
    }

    #[test]
    fn test_scene_padding_is_masked() {
        // 3 文字目のパディング 2bit は値に寄与しない。
        let a = SceneId::parse_styled("XZE", ParseStyle::LETTERS).unwrap();
        let b = SceneId::parse_styled("XZX", ParseStyle::LETTERS).unwrap();

        assert_eq!(a.value(), b.value());
        assert_eq!(a, b);
        assert_eq!(a.padding(), 0b00);
        assert_eq!(b.padding(), 0b11);
    }

    #[test]
    fn test_scene_decoy_rule() {
        // 3 文字目のセル値が非 0 のときのみ 2 文字目が囮許可となる。
        let scene = SceneId::from_value(0x30F).unwrap();
        assert!(!scene.letter(0).allow_decoy());
        assert!(scene.letter(1).allow_decoy());
        assert!(!scene.letter(2).allow_decoy());

        let scene = SceneId::from_value(0x00F).unwrap();
        assert!(!scene.letter(1).allow_decoy());
    }

    #[test]
    fn test_scene_randomize() {
        let mut rng = ChaCha8Rng::seed_from_u64(0);

        let scene = SceneId::from_value(0x30F).unwrap();
        for _ in 0..100 {
            let r = scene.randomized(&mut rng);
            assert_eq!(r.value(), 0x30F);
            assert_eq!(r.letter(0).glyph(), Glyph::X);
            assert!(r.letter(1).glyph().is_decoy());
            assert!(!r.letter(2).glyph().is_decoy());
        }
    }

    #[test]
    fn test_scene_randomize_padding() {
        let mut rng = ChaCha8Rng::seed_from_u64(1);

        // パディングは再抽選されるが、値は不変。
        let scene = SceneId::from_value(0x30F).unwrap();
        let mut seen = [false; 4];
        for _ in 0..100 {
            let r = scene.randomized(&mut rng);
            assert_eq!(r.value(), 0x30F);
            seen[usize::from(r.padding())] = true;
        }
        assert!(seen.iter().all(|&b| b));
    }

    #[test]
    fn test_scene_normalize() {
        let mut rng = ChaCha8Rng::seed_from_u64(42);

        let scene = SceneId::from_value(0x30F).unwrap().randomized(&mut rng);
        let norm = scene.normalized();
        assert_eq!(norm.value(), scene.value());
        assert_eq!(norm.letter(1).glyph(), Glyph::Z);
        assert_eq!(norm.normalized().text(), norm.text());
    }

    #[test]
    fn test_scene_display_fromstr() {
        let scene: SceneId = "XZE".parse().unwrap();
        assert_eq!(scene.to_string(), "XZE");
        assert_eq!(scene.value(), 0x30F);
    }
}
