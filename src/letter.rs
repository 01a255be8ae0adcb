use rand::Rng;
use thiserror::Error;

use crate::macros::assert_unchecked;
use crate::nibble::Nibble;

/// パスワードに使われる英大文字。
///
/// 正規 16 文字がそれぞれ 4bit 値 0..=15 に対応し、囮 10 文字は全て値 0 として
/// デコードされる。両者を合わせると `A..=Z` の 26 文字を過不足なく覆う。
#[repr(u8)]
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub enum Glyph {
    A = 0,
    B = 1,
    C = 2,
    D = 3,
    E = 4,
    F = 5,
    G = 6,
    H = 7,
    I = 8,
    J = 9,
    K = 10,
    L = 11,
    M = 12,
    N = 13,
    O = 14,
    P = 15,
    Q = 16,
    R = 17,
    S = 18,
    T = 19,
    U = 20,
    V = 21,
    W = 22,
    X = 23,
    Y = 24,
    Z = 25,
}

impl Glyph {
    /// 正規文字。添字が 4bit 値に対応する。
    pub const CANONICALS: [Self; 16] = {
        use Glyph::*;
        [Z, A, U, E, C, G, W, J, L, H, N, P, R, T, O, X]
    };

    /// 囮文字。デコード値は全て 0。
    pub const DECOYS: [Self; 10] = {
        use Glyph::*;
        [B, D, F, I, K, M, Q, S, V, Y]
    };

    /// 英字の並び (`A..=Z`) における添字から `Glyph` を作る。無効値に対しては `None` を返す。
    pub const fn from_index(index: u8) -> Option<Self> {
        if index < 26 {
            Some(unsafe { Self::from_index_unchecked(index) })
        } else {
            None
        }
    }

    /// 英字の並び (`A..=Z`) における添字から `Glyph` を作る。
    ///
    /// # Safety
    ///
    /// `index` は有効値、即ち `0..=25` でなければならない。
    pub const unsafe fn from_index_unchecked(index: u8) -> Self {
        assert_unchecked!(index < 26);
        std::mem::transmute(index)
    }

    /// 英字を `Glyph` に変換する。大文字小文字を区別しない。無効な文字に対しては `None` を返す。
    pub const fn from_char(c: char) -> Option<Self> {
        if c.is_ascii_alphabetic() {
            let index = c.to_ascii_uppercase() as u8 - b'A';
            Some(unsafe { Self::from_index_unchecked(index) })
        } else {
            None
        }
    }

    /// 4bit 値に対応する正規文字を返す。
    pub const fn canonical(value: Nibble) -> Self {
        Self::CANONICALS[value.get() as usize]
    }

    /// 英字の並び (`A..=Z`) における添字を返す。
    pub const fn to_index(self) -> u8 {
        self as u8
    }

    /// 対応する英大文字を返す。
    pub const fn to_char(self) -> char {
        (b'A' + self.to_index()) as char
    }

    /// 対応する 4bit 値を返す。囮文字は全て 0 となる。
    pub const fn value(self) -> Nibble {
        let v: u8 = match self {
            Self::Z => 0x0,
            Self::A => 0x1,
            Self::U => 0x2,
            Self::E => 0x3,
            Self::C => 0x4,
            Self::G => 0x5,
            Self::W => 0x6,
            Self::J => 0x7,
            Self::L => 0x8,
            Self::H => 0x9,
            Self::N => 0xA,
            Self::P => 0xB,
            Self::R => 0xC,
            Self::T => 0xD,
            Self::O => 0xE,
            Self::X => 0xF,
            Self::B
            | Self::D
            | Self::F
            | Self::I
            | Self::K
            | Self::M
            | Self::Q
            | Self::S
            | Self::V
            | Self::Y => 0x0,
        };

        unsafe { Nibble::new_unchecked(v) }
    }

    /// 囮文字かどうかを返す。
    pub const fn is_decoy(self) -> bool {
        matches!(
            self,
            Self::B
                | Self::D
                | Self::F
                | Self::I
                | Self::K
                | Self::M
                | Self::Q
                | Self::S
                | Self::V
                | Self::Y
        )
    }

    /// 全ての文字をアルファベット順で返す。
    pub const fn all() -> [Self; 26] {
        use Glyph::*;

        #[rustfmt::skip]
        const ALL: [Glyph; 26] = [
            A, B, C, D, E, F, G, H, I, J, K, L, M,
            N, O, P, Q, R, S, T, U, V, W, X, Y, Z,
        ];

        ALL
    }
}

/// パスワード 1 文字分のセル。表示用の文字と、囮文字への置換を許すかどうかを持つ。
///
/// 比較は 4bit 値のみで行う。つまり値 0 のセル同士は表示文字が異なっても等しい。
#[derive(Clone, Copy, Debug)]
pub struct Letter {
    glyph: Glyph,
    allow_decoy: bool,
}

impl Letter {
    /// 表示文字と囮許可を指定して `Letter` を作る。
    pub const fn new(glyph: Glyph, allow_decoy: bool) -> Self {
        Self { glyph, allow_decoy }
    }

    /// 4bit 値から正規文字の `Letter` を作る。
    pub const fn from_value(value: Nibble, allow_decoy: bool) -> Self {
        Self::new(Glyph::canonical(value), allow_decoy)
    }

    /// 英字から `Letter` を作る。大文字小文字を区別しない。無効な文字に対しては `None` を返す。
    pub const fn from_char(c: char, allow_decoy: bool) -> Option<Self> {
        match Glyph::from_char(c) {
            Some(glyph) => Some(Self::new(glyph, allow_decoy)),
            None => None,
        }
    }

    /// 表示文字を返す。
    pub const fn glyph(self) -> Glyph {
        self.glyph
    }

    /// 対応する英大文字を返す。
    pub const fn to_char(self) -> char {
        self.glyph.to_char()
    }

    /// 4bit 値を返す。
    pub const fn value(self) -> Nibble {
        self.glyph.value()
    }

    /// 囮文字への置換が許されているかどうかを返す。
    pub const fn allow_decoy(self) -> bool {
        self.allow_decoy
    }

    /// 囮文字への置換を許すかどうかを設定する。
    pub fn set_allow_decoy(&mut self, allow: bool) {
        self.allow_decoy = allow;
    }

    /// 表示文字を英字で設定する。大文字小文字を区別しない。
    pub fn set_char(&mut self, c: char) -> Result<(), LetterError> {
        let glyph = Glyph::from_char(c).ok_or(LetterError::InvalidChar { ch: c })?;
        self.glyph = glyph;

        Ok(())
    }

    /// 4bit 値を設定する。表示文字は正規文字となる。
    pub fn set_value(&mut self, value: Nibble) {
        self.glyph = Glyph::canonical(value);
    }

    /// 囮文字を正規の `Z` に置換したセルを返す。置換が許されていなければ何もしない。
    pub const fn normalized(self) -> Self {
        if self.allow_decoy && self.glyph.is_decoy() {
            Self::new(Glyph::Z, self.allow_decoy)
        } else {
            self
        }
    }

    /// 囮文字を指定の文字に置換したセルを返す。置換が許されていなければ何もしない。
    ///
    /// `zero` は値 0 の文字 (`Z` または囮文字) でなければならない。
    pub fn normalized_to(self, zero: Glyph) -> Result<Self, LetterError> {
        if zero.value().get() != 0 {
            return Err(LetterError::NotZero {
                ch: zero.to_char(),
            });
        }

        if self.allow_decoy && self.glyph.is_decoy() {
            Ok(Self::new(zero, self.allow_decoy))
        } else {
            Ok(self)
        }
    }

    /// 値 0 のセルの表示文字を囮文字からランダムに選び直したセルを返す。
    /// 置換が許されていなければ何もしない。
    pub fn randomized<R: Rng>(self, rng: &mut R) -> Self {
        if self.allow_decoy && self.value().get() == 0 {
            let glyph = Glyph::DECOYS[rng.gen_range(0..Glyph::DECOYS.len())];
            Self::new(glyph, self.allow_decoy)
        } else {
            self
        }
    }

    /// 指定されたモードでセルを文字列化する。
    pub fn render<R: Rng>(self, mode: LetterFormat, rng: &mut R) -> String {
        match mode {
            LetterFormat::Plain => self.to_char().to_string(),
            LetterFormat::Normalized => self.normalized().to_char().to_string(),
            LetterFormat::Randomized => self.randomized(rng).to_char().to_string(),
            LetterFormat::Binary => format!("{:04b}", self.value().get()),
            LetterFormat::Decimal => self.value().get().to_string(),
            LetterFormat::Hex => format!("{:X}", self.value().get()),
        }
    }
}

impl Default for Letter {
    fn default() -> Self {
        Self::new(Glyph::Z, false)
    }
}

impl PartialEq for Letter {
    fn eq(&self, other: &Self) -> bool {
        self.value() == other.value()
    }
}

impl Eq for Letter {}

impl PartialOrd for Letter {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Letter {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.value().cmp(&other.value())
    }
}

impl std::hash::Hash for Letter {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.value().hash(state);
    }
}

/// レター 1 文字の表示モード。
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum LetterFormat {
    /// 表示文字をそのまま出力する。
    Plain,
    /// 囮文字を `Z` に置換して出力する。
    Normalized,
    /// 値 0 の文字を囮文字からランダムに選んで出力する。
    Randomized,
    /// 4bit 値を 2 進 4 桁で出力する。
    Binary,
    /// 4bit 値を 10 進で出力する。
    Decimal,
    /// 4bit 値を 16 進 1 桁で出力する。
    Hex,
}

impl LetterFormat {
    /// モード指定文字から `LetterFormat` を作る。大文字小文字を区別しない。
    /// 無効な文字に対しては `None` を返す。
    pub const fn from_char(c: char) -> Option<Self> {
        match c {
            'S' | 's' => Some(Self::Plain),
            'N' | 'n' => Some(Self::Normalized),
            'R' | 'r' => Some(Self::Randomized),
            'B' | 'b' => Some(Self::Binary),
            'D' | 'd' => Some(Self::Decimal),
            'X' | 'x' => Some(Self::Hex),
            _ => None,
        }
    }
}

/// レター操作で発生しうるエラー。
#[derive(Clone, Debug, Eq, PartialEq, Error)]
pub enum LetterError {
    /// 英字でない文字が指定された。
    #[error("invalid letter character '{ch}'")]
    InvalidChar { ch: char },

    /// 値 0 の文字が要求される箇所に非 0 の文字が指定された。
    #[error("'{ch}' is not a zero-valued letter")]
    NotZero { ch: char },
}
