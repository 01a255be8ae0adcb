use rand::Rng;

use crate::block::{impl_block_traits, BlockError, LetterBlock};
use crate::flags::{FlagData, FlagLayout};
use crate::letter::Letter;
use crate::parse::{parse_into, ParseError, ParseStyle};
use crate::scene::SceneId;

/// パスワード全体。シーン ID とフラグ列を連結したレター列ブロック。
///
/// 数値はシーン ID を上位、フラグ列を下位に詰めたものとなる。
#[derive(Clone, Debug, Default)]
pub struct Password {
    scene: SceneId,
    flags: FlagData,
}

impl Password {
    /// 値 0 の `Wide` レイアウトのパスワードを作る。
    pub fn new() -> Self {
        Self::default()
    }

    /// シーン ID とフラグ列からパスワードを作る。
    pub fn from_parts(scene: SceneId, flags: FlagData) -> Self {
        Self { scene, flags }
    }

    /// レイアウトと記法を指定して文字列をパースし、パスワードを作る。
    pub fn parse_layout(
        text: &str,
        layout: FlagLayout,
        style: ParseStyle,
    ) -> Result<Self, ParseError> {
        let mut res = Self::from_parts(SceneId::new(), FlagData::with_layout(layout));
        parse_into(&mut res, text, style)?;

        Ok(res)
    }

    /// シーン ID 部を返す。
    pub const fn scene(&self) -> &SceneId {
        &self.scene
    }

    /// フラグ列部を返す。
    pub const fn flags(&self) -> &FlagData {
        &self.flags
    }

    /// シーン ID 部への可変参照を返す。
    pub fn scene_mut(&mut self) -> &mut SceneId {
        &mut self.scene
    }

    /// フラグ列部への可変参照を返す。
    pub fn flags_mut(&mut self) -> &mut FlagData {
        &mut self.flags
    }

    /// シーン ID とフラグ列に分解する。
    pub fn into_parts(self) -> (SceneId, FlagData) {
        (self.scene, self.flags)
    }

    /// 全セルを走査するイテレータを返す。
    pub fn iter(
        &self,
    ) -> std::iter::Chain<std::slice::Iter<'_, Letter>, std::slice::Iter<'_, Letter>> {
        self.scene.iter().chain(self.flags.iter())
    }
}

impl LetterBlock for Password {
    const NAME: &'static str = "password";

    fn len(&self) -> usize {
        SceneId::LEN + self.flags.len()
    }

    fn bits(&self) -> u32 {
        SceneId::BITS + self.flags.bits()
    }

    fn letter(&self, i: usize) -> Letter {
        if i < SceneId::LEN {
            self.scene.letter(i)
        } else {
            self.flags.letter(i - SceneId::LEN)
        }
    }

    fn set_letter(&mut self, i: usize, letter: Letter) {
        if i < SceneId::LEN {
            self.scene.set_letter(i, letter);
        } else {
            self.flags.set_letter(i - SceneId::LEN, letter);
        }
    }

    fn value(&self) -> u32 {
        self.scene.value() << self.flags.bits() | self.flags.value()
    }

    fn set_value(&mut self, value: u32) -> Result<(), BlockError> {
        if value > self.max_value() {
            return Err(BlockError::ValueOutOfRange {
                value,
                max: self.max_value(),
            });
        }

        let flag_mask = (1 << self.flags.bits()) - 1;
        self.scene.set_value(value >> self.flags.bits())?;
        self.flags.set_value(value & flag_mask)?;

        Ok(())
    }

    fn set_letters(&mut self, letters: &[Letter]) -> Result<(), BlockError> {
        if letters.len() != self.len() {
            return Err(BlockError::InvalidLength {
                expected: self.len(),
                actual: letters.len(),
            });
        }

        self.scene.set_letters(&letters[..SceneId::LEN])?;
        self.flags.set_letters(&letters[SceneId::LEN..])?;

        Ok(())
    }

    fn randomize<R: Rng>(&mut self, rng: &mut R) {
        // シーン ID のパディングも振り直すため、各部に委譲する。
        self.scene.randomize(rng);
        self.flags.randomize(rng);
    }
}

impl std::ops::Index<usize> for Password {
    type Output = Letter;

    fn index(&self, i: usize) -> &Self::Output {
        if i < SceneId::LEN {
            &self.scene[i]
        } else {
            &self.flags[i - SceneId::LEN]
        }
    }
}

impl<'a> IntoIterator for &'a Password {
    type Item = &'a Letter;
    type IntoIter = std::iter::Chain<std::slice::Iter<'a, Letter>, std::slice::Iter<'a, Letter>>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl IntoIterator for Password {
    type Item = Letter;
    type IntoIter = std::iter::Chain<
        std::array::IntoIter<Letter, { SceneId::LEN }>,
        arrayvec::IntoIter<Letter, { FlagData::MAX_LEN }>,
    >;

    fn into_iter(self) -> Self::IntoIter {
        self.scene.into_iter().chain(self.flags)
    }
}

impl_block_traits!(Password);

#[cfg(test)]
mod tests {
    use rand::SeedableRng as _;
    use rand_chacha::ChaCha8Rng;

    use crate::letter::Glyph;

    use super::*;

    #[test]
    fn test_password_composition() {
        let scene = SceneId::from_value(0x30F).unwrap();
        let flags = FlagData::from_value(FlagLayout::Wide, 0x70000).unwrap();
        let password = Password::from_parts(scene, flags);

        assert_eq!(password.len(), 8);
        assert_eq!(password.bits(), 30);
        assert_eq!(password.value(), 0x30F << 20 | 0x70000);
        assert_eq!(password.text(), "XZEJZZZZ");
    }

    #[test]
    fn test_password_parse_roundtrip() {
        let password = Password::parse("XZEJZZZZ").unwrap();
        assert_eq!(password.scene().value(), 0x30F);
        assert_eq!(password.flags().value(), 0x70000);
        assert_eq!(password.to_string(), "XZEJZZZZ");

        let reparsed: Password = password.to_string().parse().unwrap();
        assert_eq!(reparsed, password);
    }

    #[test]
    fn test_password_narrow_layout() {
        let password =
            Password::parse_layout("XZECEUA", FlagLayout::Narrow, ParseStyle::LETTERS).unwrap();
        assert_eq!(password.len(), 7);
        assert_eq!(password.bits(), 26);
        assert_eq!(password.scene().value(), 0x30F);
        assert_eq!(password.flags().value(), 0x1234);
        assert_eq!(password.value(), 0x30F << 16 | 0x1234);
    }

    #[test]
    fn test_password_set_value() {
        let mut password = Password::new();
        password.set_value(0x30F7_0000).unwrap();
        assert_eq!(password.scene().value(), 0x30F);
        assert_eq!(password.flags().value(), 0x70000);

        assert!(matches!(
            password.set_value(0x4000_0000),
            Err(BlockError::ValueOutOfRange { .. })
        ));
    }

    #[test]
    fn test_password_randomize_normalize() {
        let mut rng = ChaCha8Rng::seed_from_u64(2);

        let password = Password::parse("XZEJZZZZ").unwrap();
        for _ in 0..50 {
            let r = password.randomized(&mut rng);
            assert_eq!(r.value(), password.value());

            let n = r.normalized();
            assert_eq!(n.value(), password.value());
            assert!(n.iter().all(|letter| !letter.glyph().is_decoy()));
        }
    }

    #[test]
    fn test_password_letter_routing() {
        let mut password = Password::parse("XZEJZZZZ").unwrap();
        assert_eq!(password.letter(0).glyph(), Glyph::X);
        assert_eq!(password.letter(3).glyph(), Glyph::J);
        assert_eq!(password[7].glyph(), Glyph::Z);

        let mut letter = password.letter(7);
        letter.set_char('a').unwrap();
        password.set_letter(7, letter);
        assert_eq!(password.flags().value(), 0x70001);
    }

    #[test]
    fn test_password_polymorphic_eq() {
        let password = Password::parse("XZEJZZZZ").unwrap();

        assert_eq!(password, 0x30F7_0000);
        assert_eq!(0x30F7_0000, password);
        assert_eq!(password, "xzejzzzz");
        assert_eq!(password, *password.to_letters());
    }
}
