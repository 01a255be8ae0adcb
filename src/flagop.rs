use std::fmt::Write as _;

use arrayvec::ArrayVec;
use thiserror::Error;

use crate::block::LetterBlock;
use crate::flags::FlagData;
use crate::letter::{Glyph, Letter};
use crate::nibble::Nibble;

/// フラグ操作の種別。
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum FlagOpKind {
    /// セルを 0 にする。オペランドは無視される。
    Zero,
    /// セルの 4bit 値をビット反転する。オペランドは無視される。
    Negate,
    /// セルにオペランドを代入する。
    Set,
    /// セルにオペランドを加える。15 で飽和する。
    Add,
    /// セルからオペランドを引く。0 で飽和する。
    Sub,
    /// セルとオペランドの AND をとる。
    And,
    /// セルとオペランドの OR をとる。
    Or,
    /// セルとオペランドの XOR をとる。
    Xor,
}

impl FlagOpKind {
    /// 操作を表す記号を返す。
    pub const fn glyph(self) -> char {
        match self {
            Self::Zero => '0',
            Self::Negate => '~',
            Self::Set => '=',
            Self::Add => '+',
            Self::Sub => '-',
            Self::And => '&',
            Self::Or => '|',
            Self::Xor => '^',
        }
    }

    /// 記号から `FlagOpKind` を作る。無効な文字に対しては `None` を返す。
    pub const fn from_glyph(c: char) -> Option<Self> {
        match c {
            '0' => Some(Self::Zero),
            '~' => Some(Self::Negate),
            '=' => Some(Self::Set),
            '+' => Some(Self::Add),
            '-' => Some(Self::Sub),
            '&' => Some(Self::And),
            '|' => Some(Self::Or),
            '^' => Some(Self::Xor),
            _ => None,
        }
    }

    /// 全ての操作種別を返す。
    pub const fn all() -> [Self; 8] {
        use FlagOpKind::*;

        [Zero, Negate, Set, Add, Sub, And, Or, Xor]
    }
}

/// フラグ操作の対象セルとオペランド。
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub struct FlagOpTarget {
    /// 対象セルの添字。
    pub index: usize,
    /// オペランドの 4bit 値。
    pub operand: Nibble,
}

impl FlagOpTarget {
    /// 添字とオペランドを指定して `FlagOpTarget` を作る。
    pub const fn new(index: usize, operand: Nibble) -> Self {
        Self { index, operand }
    }
}

/// `FlagOp` の対象リスト。
pub type FlagOpTargets = ArrayVec<FlagOpTarget, { FlagData::MAX_LEN }>;

/// フラグ列に対する 1 つの操作。適用は [`FlagOp::apply`] で行う。
///
/// テキスト形式は操作記号 1 文字とセル数ぶんの位置文字からなる。位置文字は
/// `-` または `.` で対象外、パスワード文字でその値をオペランドとする対象を表す。
/// `Display` は `.`、小文字、囮文字を正規形 (`-` と正規文字) に直して出力する。
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct FlagOp {
    kind: FlagOpKind,
    len: usize,
    targets: FlagOpTargets,
}

impl FlagOp {
    /// 種別、セル数、対象リストを指定して `FlagOp` を作る。
    ///
    /// セル数が範囲外、対象が空、または対象の添字がセル数以上なら `None` を返す。
    pub fn new(kind: FlagOpKind, len: usize, targets: &[FlagOpTarget]) -> Option<Self> {
        let ok = matches!(len, 1..=FlagData::MAX_LEN)
            && !targets.is_empty()
            && targets.len() <= len
            && targets.iter().all(|t| t.index < len);

        ok.then(|| Self {
            kind,
            len,
            targets: targets.iter().copied().collect(),
        })
    }

    /// テキスト形式をパースして `FlagOp` を作る。`len` は対象のフラグ列のセル数。
    pub fn parse(text: &str, len: usize) -> Result<Self, FlagOpParseError> {
        if !matches!(len, 1..=FlagData::MAX_LEN) {
            return Err(FlagOpParseError::UnsupportedLength { len });
        }

        let mut chars = text.chars();
        let op_char = chars.next().ok_or(FlagOpParseError::InvalidLength {
            expected: 1 + len,
            actual: 0,
        })?;
        let kind = FlagOpKind::from_glyph(op_char)
            .ok_or(FlagOpParseError::InvalidOpChar { ch: op_char })?;

        let positions = chars.as_str();
        let n = positions.chars().count();
        if n != len {
            return Err(FlagOpParseError::InvalidLength {
                expected: 1 + len,
                actual: 1 + n,
            });
        }

        let mut targets = FlagOpTargets::new();
        for (i, c) in positions.chars().enumerate() {
            if matches!(c, '-' | '.') {
                continue;
            }

            let glyph = Glyph::from_char(c).ok_or(FlagOpParseError::InvalidChar {
                pos: i + 1,
                ch: c,
            })?;
            targets.push(FlagOpTarget::new(i, glyph.value()));
        }

        if targets.is_empty() {
            return Err(FlagOpParseError::NoTargets);
        }

        Ok(Self { kind, len, targets })
    }

    /// 操作種別を返す。
    pub const fn kind(&self) -> FlagOpKind {
        self.kind
    }

    /// 対象のフラグ列のセル数を返す。
    #[allow(clippy::len_without_is_empty)]
    pub const fn len(&self) -> usize {
        self.len
    }

    /// 対象リストを返す。
    pub fn targets(&self) -> &[FlagOpTarget] {
        &self.targets
    }

    /// フラグ列に操作を適用する。書き換えたセルの表示文字は正規文字となる。
    pub fn apply(&self, flags: &mut FlagData) -> Result<(), FlagOpApplyError> {
        if self.len != flags.len() {
            return Err(FlagOpApplyError::LengthMismatch {
                op_len: self.len,
                flags_len: flags.len(),
            });
        }

        for t in &self.targets {
            let v = flags.letter(t.index).value().get();
            let o = t.operand.get();

            let res = match self.kind {
                FlagOpKind::Zero => 0,
                FlagOpKind::Negate => !v & 0xF,
                FlagOpKind::Set => o,
                FlagOpKind::Add => (v + o).min(0xF),
                FlagOpKind::Sub => v.saturating_sub(o),
                FlagOpKind::And => v & o,
                FlagOpKind::Or => v | o,
                FlagOpKind::Xor => v ^ o,
            };

            let letter = Letter::from_value(unsafe { Nibble::new_unchecked(res) }, false);
            flags.set_letter(t.index, letter);
        }

        Ok(())
    }
}

impl std::fmt::Display for FlagOp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_char(self.kind.glyph())?;

        for i in 0..self.len {
            match self.targets.iter().find(|t| t.index == i) {
                Some(t) => f.write_char(Glyph::canonical(t.operand).to_char())?,
                None => f.write_char('-')?,
            }
        }

        Ok(())
    }
}

/// 順序付きのフラグ操作列。先頭から順に適用される。
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct FlagOpBatch(Vec<FlagOp>);

impl FlagOpBatch {
    /// 空の操作列を作る。
    pub fn new() -> Self {
        Self(Vec::new())
    }

    /// 操作を末尾に追加する。
    pub fn push(&mut self, op: FlagOp) {
        self.0.push(op);
    }

    /// 操作列全体を含むスライスを返す。
    pub fn as_slice(&self) -> &[FlagOp] {
        &self.0
    }

    /// 空白区切りのテキスト形式をパースして `FlagOpBatch` を作る。
    pub fn parse(text: &str, len: usize) -> Result<Self, FlagOpParseError> {
        text.split_ascii_whitespace()
            .map(|word| FlagOp::parse(word, len))
            .collect()
    }

    /// フラグ列に全ての操作を順に適用する。
    pub fn apply(&self, flags: &mut FlagData) -> Result<(), FlagOpApplyError> {
        for op in &self.0 {
            op.apply(flags)?;
        }

        Ok(())
    }
}

impl std::fmt::Display for FlagOpBatch {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for (i, op) in self.0.iter().enumerate() {
            if i != 0 {
                f.write_char(' ')?;
            }
            write!(f, "{op}")?;
        }

        Ok(())
    }
}

impl FromIterator<FlagOp> for FlagOpBatch {
    fn from_iter<I: IntoIterator<Item = FlagOp>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl std::ops::Deref for FlagOpBatch {
    type Target = [FlagOp];

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl IntoIterator for FlagOpBatch {
    type Item = FlagOp;
    type IntoIter = std::vec::IntoIter<FlagOp>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<'a> IntoIterator for &'a FlagOpBatch {
    type Item = &'a FlagOp;
    type IntoIter = std::slice::Iter<'a, FlagOp>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

/// フラグ操作のパースで発生しうるエラー。
#[derive(Clone, Debug, Eq, PartialEq, Error)]
pub enum FlagOpParseError {
    /// 対応外のセル数が指定された。
    #[error("unsupported flag data length {len}")]
    UnsupportedLength { len: usize },

    /// 文字数が正しくない。
    #[error("expected {expected} characters, got {actual}")]
    InvalidLength { expected: usize, actual: usize },

    /// 無効な操作記号。
    #[error("invalid operator character '{ch}'")]
    InvalidOpChar { ch: char },

    /// 無効な位置文字。
    #[error("invalid position character '{ch}' at position {pos}")]
    InvalidChar { pos: usize, ch: char },

    /// 対象がひとつもない。
    #[error("flag op has no targets")]
    NoTargets,
}

/// フラグ操作の適用で発生しうるエラー。
#[derive(Clone, Debug, Eq, PartialEq, Error)]
pub enum FlagOpApplyError {
    /// 操作とフラグ列のセル数が一致しない。
    #[error("flag op is for {op_len} letters, but flag data has {flags_len}")]
    LengthMismatch { op_len: usize, flags_len: usize },
}

#[cfg(test)]
mod tests {
    use crate::flags::FlagLayout;

    use super::*;

    #[test]
    fn test_flagop_glyph_roundtrip() {
        for kind in FlagOpKind::all() {
            assert_eq!(FlagOpKind::from_glyph(kind.glyph()), Some(kind));
        }
        assert_eq!(FlagOpKind::from_glyph('?'), None);
    }

    #[test]
    fn test_flagop_parse_display_roundtrip() {
        let op = FlagOp::parse("+---A-", 5).unwrap();
        assert_eq!(op.kind(), FlagOpKind::Add);
        assert_eq!(op.len(), 5);
        itertools::assert_equal(
            op.targets().iter().copied(),
            [FlagOpTarget::new(3, Nibble::new(1).unwrap())],
        );
        assert_eq!(op.to_string(), "+---A-");

        // '.'、小文字、囮文字は正規形に直して出力される。
        assert_eq!(FlagOp::parse("=X....", 5).unwrap().to_string(), "=X----");
        assert_eq!(FlagOp::parse("=x....", 5).unwrap().to_string(), "=X----");
        assert_eq!(FlagOp::parse("=B....", 5).unwrap().to_string(), "=Z----");
    }

    #[test]
    fn test_flagop_parse_errors() {
        assert_eq!(
            FlagOp::parse("+---A-", 0),
            Err(FlagOpParseError::UnsupportedLength { len: 0 })
        );
        assert_eq!(
            FlagOp::parse("+---A-", 6),
            Err(FlagOpParseError::UnsupportedLength { len: 6 })
        );
        assert_eq!(
            FlagOp::parse("+----", 5),
            Err(FlagOpParseError::InvalidLength {
                expected: 6,
                actual: 5,
            })
        );
        assert_eq!(
            FlagOp::parse("?---A-", 5),
            Err(FlagOpParseError::InvalidOpChar { ch: '?' })
        );
        assert_eq!(
            FlagOp::parse("+--1A-", 5),
            Err(FlagOpParseError::InvalidChar { pos: 3, ch: '1' })
        );
        assert_eq!(
            FlagOp::parse("+-----", 5),
            Err(FlagOpParseError::NoTargets)
        );
    }

    #[test]
    fn test_flagop_new() {
        let target = FlagOpTarget::new(3, Nibble::new(1).unwrap());

        let op = FlagOp::new(FlagOpKind::Add, 5, &[target]).unwrap();
        assert_eq!(op.to_string(), "+---A-");

        assert!(FlagOp::new(FlagOpKind::Add, 5, &[]).is_none());
        assert!(FlagOp::new(FlagOpKind::Add, 6, &[target]).is_none());
        assert!(FlagOp::new(FlagOpKind::Add, 3, &[target]).is_none());
    }

    #[test]
    fn test_flagop_apply() {
        let f = |op_text: &str, before: u32| {
            let op = FlagOp::parse(op_text, 5).unwrap();
            let mut flags = FlagData::from_value(FlagLayout::Wide, before).unwrap();
            op.apply(&mut flags).unwrap();

            flags.value()
        };

        assert_eq!(f("=A----", 0), 0x10000);
        assert_eq!(f("+E----", 0x10000), 0x40000);
        assert_eq!(f("+X----", 0x40000), 0xF0000);
        assert_eq!(f("-A----", 0), 0);
        assert_eq!(f("0A----", 0x70000), 0);
        assert_eq!(f("~A----", 0x70000), 0x80000);
        assert_eq!(f("&G----", 0x70000), 0x50000);
        assert_eq!(f("|L----", 0x70000), 0xF0000);
        assert_eq!(f("^X----", 0x70000), 0x80000);
        assert_eq!(f("+AAAAA", 0x11111), 0x22222);
    }

    #[test]
    fn test_flagop_apply_length_mismatch() {
        let op = FlagOp::parse("+---A-", 5).unwrap();
        let mut flags = FlagData::with_layout(FlagLayout::Narrow);

        assert_eq!(
            op.apply(&mut flags),
            Err(FlagOpApplyError::LengthMismatch {
                op_len: 5,
                flags_len: 4,
            })
        );
    }

    #[test]
    fn test_flagop_batch() {
        let batch = FlagOpBatch::parse("=A---- +E----", 5).unwrap();
        assert_eq!(batch.len(), 2);
        assert_eq!(batch.to_string(), "=A---- +E----");

        let mut flags = FlagData::new();
        batch.apply(&mut flags).unwrap();
        assert_eq!(flags.value(), 0x40000);

        assert_eq!(
            FlagOpBatch::parse("=A---- bogus", 5),
            Err(FlagOpParseError::InvalidOpChar { ch: 'b' })
        );
    }
}
