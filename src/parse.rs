use arrayvec::ArrayVec;
use thiserror::Error;

use crate::block::{BlockError, LetterBlock, BLOCK_MAX_LEN};
use crate::letter::{Glyph, Letter};

/// パース時に許可する記法の集合。
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub struct ParseStyle {
    letters: bool,
    binary: bool,
    hex: bool,
    decimal: bool,
    specifier: bool,
}

impl ParseStyle {
    /// 全ての記法を許可するスタイル。
    pub const ANY: Self = Self {
        letters: true,
        binary: true,
        hex: true,
        decimal: true,
        specifier: true,
    };

    /// レター列のみを許可するスタイル。
    pub const LETTERS: Self = Self {
        letters: true,
        binary: false,
        hex: false,
        decimal: false,
        specifier: false,
    };

    /// 2 進数のみを許可するスタイル。`0b` 指定子も受理する。
    pub const BINARY: Self = Self {
        letters: false,
        binary: true,
        hex: false,
        decimal: false,
        specifier: true,
    };

    /// 16 進数のみを許可するスタイル。`0x` 指定子も受理する。
    pub const HEX: Self = Self {
        letters: false,
        binary: false,
        hex: true,
        decimal: false,
        specifier: true,
    };

    /// 10 進数のみを許可するスタイル。
    pub const DECIMAL: Self = Self {
        letters: false,
        binary: false,
        hex: false,
        decimal: true,
        specifier: false,
    };

    /// レター列記法を許可するかどうかを設定したスタイルを返す。
    pub const fn allow_letters(self, allow: bool) -> Self {
        Self {
            letters: allow,
            ..self
        }
    }

    /// 2 進記法を許可するかどうかを設定したスタイルを返す。
    pub const fn allow_binary(self, allow: bool) -> Self {
        Self {
            binary: allow,
            ..self
        }
    }

    /// 16 進記法を許可するかどうかを設定したスタイルを返す。
    pub const fn allow_hex(self, allow: bool) -> Self {
        Self { hex: allow, ..self }
    }

    /// 10 進記法を許可するかどうかを設定したスタイルを返す。
    pub const fn allow_decimal(self, allow: bool) -> Self {
        Self {
            decimal: allow,
            ..self
        }
    }

    /// `0b`/`0x` 指定子を許可するかどうかを設定したスタイルを返す。
    pub const fn allow_specifier(self, allow: bool) -> Self {
        Self {
            specifier: allow,
            ..self
        }
    }
}

impl Default for ParseStyle {
    fn default() -> Self {
        Self::ANY
    }
}

/// パスワード文字列の記法。
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum Notation {
    /// レター列。
    Letters,
    /// 2 進数。
    Binary,
    /// 16 進数。
    Hex,
    /// 10 進数。
    Decimal,
}

impl std::fmt::Display for Notation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Letters => "letters",
            Self::Binary => "binary",
            Self::Hex => "hex",
            Self::Decimal => "decimal",
        };

        f.write_str(s)
    }
}

/// パースで発生しうるエラー。
#[derive(Clone, Debug, Eq, PartialEq, Error)]
pub enum ParseError {
    /// 入力が空。
    #[error("empty {kind} string")]
    Empty { kind: &'static str },

    /// 入力の前後に空白がある。
    #[error("{kind} string has leading or trailing whitespace")]
    PaddedInput { kind: &'static str },

    /// スタイルが `0b`/`0x` 指定子を許可していない。
    #[error("notation specifier is not allowed for {kind}")]
    SpecifierNotAllowed { kind: &'static str },

    /// スタイルがこの記法を許可していない。
    #[error("{notation} notation is not allowed for {kind}")]
    NotationDisabled {
        kind: &'static str,
        notation: Notation,
    },

    /// 文字数が正しくない。
    #[error("expected {expected} characters for {kind}, got {actual}")]
    InvalidLength {
        kind: &'static str,
        expected: usize,
        actual: usize,
    },

    /// 記法上無効な文字が含まれている。
    #[error("invalid character '{ch}' at position {pos} in {kind} string")]
    InvalidChar {
        kind: &'static str,
        pos: usize,
        ch: char,
    },

    /// 複数の記法が異なる値として解釈できてしまう。
    #[error("ambiguous {kind} string (multiple notations match)")]
    Ambiguous { kind: &'static str },

    /// 許可された記法がひとつもない。
    #[error("no permitted notation for {kind}")]
    Unrecognized { kind: &'static str },

    /// 数値として解釈できない。
    #[error("invalid number in {kind} string: {source}")]
    Int {
        kind: &'static str,
        source: std::num::ParseIntError,
    },

    /// ブロックへの適用に失敗した。
    #[error("invalid {kind}: {source}")]
    Block {
        kind: &'static str,
        source: BlockError,
    },
}

/// デコード結果。レター列そのものか、数値のいずれか。
enum Decoded {
    Letters(ArrayVec<Letter, BLOCK_MAX_LEN>),
    Value(u32),
}

/// スタイルに従って文字列をパースし、ブロックに適用する。
///
/// `0b`/`0x` 指定子、および数字のみの 10 進記法は単独で確定する。
/// それ以外はレター列、16 進、2 進の順に試し、複数の記法が異なる値として
/// 成立したら `Ambiguous` を返す。値まで一致した場合はレター列解釈が勝つ。
pub(crate) fn parse_into<B: LetterBlock>(
    block: &mut B,
    text: &str,
    style: ParseStyle,
) -> Result<(), ParseError> {
    let kind = B::NAME;

    if text.is_empty() {
        return Err(ParseError::Empty { kind });
    }
    if text.trim() != text {
        return Err(ParseError::PaddedInput { kind });
    }

    if let Some(rest) = strip_specifier(text, 'b') {
        return if !style.specifier {
            Err(ParseError::SpecifierNotAllowed { kind })
        } else if !style.binary {
            Err(ParseError::NotationDisabled {
                kind,
                notation: Notation::Binary,
            })
        } else {
            let decoded = decode_binary(block, rest, kind)?;
            apply(block, decoded, kind)
        };
    }

    if let Some(rest) = strip_specifier(text, 'x') {
        return if !style.specifier {
            Err(ParseError::SpecifierNotAllowed { kind })
        } else if !style.hex {
            Err(ParseError::NotationDisabled {
                kind,
                notation: Notation::Hex,
            })
        } else {
            let decoded = decode_hex(block, rest, kind)?;
            apply(block, decoded, kind)
        };
    }

    // 数字のみの入力は 10 進として確定する。レター列とは衝突しない。
    if style.decimal && text.chars().all(|c| c.is_ascii_digit()) {
        let decoded = decode_decimal(block, text, kind)?;
        return apply(block, decoded, kind);
    }

    let candidates: [(bool, fn(&B, &str, &'static str) -> Result<Decoded, ParseError>); 3] = [
        (style.letters, decode_letters),
        (style.hex, decode_hex),
        (style.binary, decode_binary),
    ];

    let mut first_err: Option<ParseError> = None;
    let mut hit: Option<(Decoded, u32)> = None;

    for (enabled, decode) in candidates {
        if !enabled {
            continue;
        }

        let res = decode(block, text, kind).and_then(|decoded| {
            let value = decoded_value(block, &decoded)?;
            Ok((decoded, value))
        });
        match res {
            Ok((decoded, value)) => match &hit {
                Some((_, prev)) if *prev != value => return Err(ParseError::Ambiguous { kind }),
                Some(_) => {}
                None => hit = Some((decoded, value)),
            },
            Err(e) => {
                if first_err.is_none() {
                    first_err = Some(e);
                }
            }
        }
    }

    match hit {
        Some((decoded, _)) => apply(block, decoded, kind),
        None => Err(first_err.unwrap_or(ParseError::Unrecognized { kind })),
    }
}

/// `0<radix_char>` 形式の記法指定子を除去する。大文字小文字を区別しない。
fn strip_specifier(text: &str, radix_char: char) -> Option<&str> {
    let mut chars = text.chars();
    if chars.next() != Some('0') {
        return None;
    }
    let c = chars.next()?;

    c.eq_ignore_ascii_case(&radix_char).then(|| chars.as_str())
}

/// デコード結果の表す数値を返す。
fn decoded_value<B: LetterBlock>(block: &B, decoded: &Decoded) -> Result<u32, ParseError> {
    match decoded {
        Decoded::Letters(letters) => {
            let mut probe = block.clone();
            probe
                .set_letters(letters)
                .map_err(|source| ParseError::Block {
                    kind: B::NAME,
                    source,
                })?;

            Ok(probe.value())
        }
        Decoded::Value(value) => Ok(*value),
    }
}

/// デコード結果をブロックに適用する。
fn apply<B: LetterBlock>(
    block: &mut B,
    decoded: Decoded,
    kind: &'static str,
) -> Result<(), ParseError> {
    let res = match decoded {
        Decoded::Letters(letters) => block.set_letters(&letters),
        Decoded::Value(value) => block.set_value(value),
    };

    res.map_err(|source| ParseError::Block { kind, source })
}

/// 数値がブロックの値域内かどうかを確かめる。
fn check_range<B: LetterBlock>(
    block: &B,
    value: u32,
    kind: &'static str,
) -> Result<(), ParseError> {
    if value > block.max_value() {
        return Err(ParseError::Block {
            kind,
            source: BlockError::ValueOutOfRange {
                value,
                max: block.max_value(),
            },
        });
    }

    Ok(())
}

/// レター列としてデコードする。文字数はブロックの文字数に一致しなければならない。
fn decode_letters<B: LetterBlock>(
    block: &B,
    text: &str,
    kind: &'static str,
) -> Result<Decoded, ParseError> {
    let expected = block.len();
    let actual = text.chars().count();
    if actual != expected {
        return Err(ParseError::InvalidLength {
            kind,
            expected,
            actual,
        });
    }

    let mut letters = ArrayVec::new();
    for (pos, ch) in text.chars().enumerate() {
        let glyph = Glyph::from_char(ch).ok_or(ParseError::InvalidChar { kind, pos, ch })?;
        letters.push(Letter::new(glyph, false));
    }

    Ok(Decoded::Letters(letters))
}

/// 16 進数としてデコードする。桁数はブロックの文字数に一致しなければならない。
fn decode_hex<B: LetterBlock>(
    block: &B,
    text: &str,
    kind: &'static str,
) -> Result<Decoded, ParseError> {
    let expected = block.len();
    let actual = text.chars().count();
    if actual != expected {
        return Err(ParseError::InvalidLength {
            kind,
            expected,
            actual,
        });
    }

    if let Some((pos, ch)) = text
        .chars()
        .enumerate()
        .find(|&(_, c)| !c.is_ascii_hexdigit())
    {
        return Err(ParseError::InvalidChar { kind, pos, ch });
    }

    let value = u32::from_str_radix(text, 16).map_err(|source| ParseError::Int { kind, source })?;
    check_range(block, value, kind)?;

    Ok(Decoded::Value(value))
}

/// 2 進数としてデコードする。空白を除いた桁数は `4 * len` に一致しなければならない。
/// 内部の空白を許すのは 2 進記法のみ。
fn decode_binary<B: LetterBlock>(
    block: &B,
    text: &str,
    kind: &'static str,
) -> Result<Decoded, ParseError> {
    let digits: String = text.chars().filter(|c| !c.is_ascii_whitespace()).collect();

    let expected = 4 * block.len();
    let actual = digits.chars().count();
    if actual != expected {
        return Err(ParseError::InvalidLength {
            kind,
            expected,
            actual,
        });
    }

    if let Some((pos, ch)) = digits
        .chars()
        .enumerate()
        .find(|&(_, c)| !matches!(c, '0' | '1'))
    {
        return Err(ParseError::InvalidChar { kind, pos, ch });
    }

    let value =
        u32::from_str_radix(&digits, 2).map_err(|source| ParseError::Int { kind, source })?;
    check_range(block, value, kind)?;

    Ok(Decoded::Value(value))
}

/// 10 進数としてデコードする。桁数の制限はない。
fn decode_decimal<B: LetterBlock>(
    block: &B,
    text: &str,
    kind: &'static str,
) -> Result<Decoded, ParseError> {
    let value = text
        .parse::<u32>()
        .map_err(|source| ParseError::Int { kind, source })?;
    check_range(block, value, kind)?;

    Ok(Decoded::Value(value))
}

#[cfg(test)]
mod tests {
    use crate::checksum::Checksum;
    use crate::flags::{FlagData, FlagLayout};
    use crate::password::Password;
    use crate::scene::SceneId;

    use super::*;

    #[test]
    fn test_parse_letters() {
        let scene = SceneId::parse("XZE").unwrap();
        assert_eq!(scene.value(), 783);

        let scene = SceneId::parse("xze").unwrap();
        assert_eq!(scene.value(), 783);

        // 囮文字はどの位置でも入力として受理され、表示文字も保持される。
        let scene = SceneId::parse("BBB").unwrap();
        assert_eq!(scene.value(), 0);
        assert_eq!(scene.text(), "BBB");
    }

    #[test]
    fn test_parse_decimal_priority() {
        let scene = SceneId::parse("15").unwrap();
        assert_eq!(scene.value(), 15);

        let scene = SceneId::parse("1023").unwrap();
        assert_eq!(scene.value(), 1023);

        assert_eq!(
            SceneId::parse("1024"),
            Err(ParseError::Block {
                kind: "scene id",
                source: BlockError::ValueOutOfRange {
                    value: 1024,
                    max: 1023,
                },
            })
        );
    }

    #[test]
    fn test_parse_specifier() {
        let f = |text: &str| SceneId::parse(text).map(|scene| scene.value());

        assert_eq!(f("0x30F"), Ok(783));
        assert_eq!(f("0X30f"), Ok(783));
        assert_eq!(f("0x3FF"), Ok(1023));
        assert_eq!(f("0b001100001111"), Ok(783));
        assert_eq!(f("0b0011 0000 1111"), Ok(783));

        assert_eq!(
            SceneId::parse_styled("0x30F", ParseStyle::LETTERS),
            Err(ParseError::SpecifierNotAllowed { kind: "scene id" })
        );
        assert_eq!(
            SceneId::parse_styled("0x30F", ParseStyle::ANY.allow_hex(false)),
            Err(ParseError::NotationDisabled {
                kind: "scene id",
                notation: Notation::Hex,
            })
        );
    }

    #[test]
    fn test_parse_bare_notations() {
        // '3' はレターでないため、16 進のみが成立する。
        let scene = SceneId::parse("30F").unwrap();
        assert_eq!(scene.value(), 783);

        // 空白入りの 2 進は指定子なしでも一意に定まる。
        let scene = SceneId::parse("0011 0000 1111").unwrap();
        assert_eq!(scene.value(), 783);

        let scene = SceneId::parse_styled("001100001111", ParseStyle::BINARY).unwrap();
        assert_eq!(scene.value(), 783);

        let scene = SceneId::parse_styled("30F", ParseStyle::HEX).unwrap();
        assert_eq!(scene.value(), 783);

        let scene = SceneId::parse_styled("783", ParseStyle::DECIMAL).unwrap();
        assert_eq!(scene.value(), 783);
    }

    #[test]
    fn test_parse_ambiguous() {
        // 全ての文字がレターかつ 16 進数字である入力は曖昧となる。
        assert_eq!(
            FlagData::parse("ACEAB"),
            Err(ParseError::Ambiguous { kind: "flag data" })
        );

        let flags = FlagData::parse_styled("ACEAB", ParseStyle::LETTERS).unwrap();
        assert_eq!(flags.value(), 0x14310);

        let flags = FlagData::parse_styled("ACEAB", ParseStyle::HEX).unwrap();
        assert_eq!(flags.value(), 0xACEAB);
    }

    #[test]
    fn test_parse_single_letter_ambiguity() {
        assert_eq!(
            Checksum::parse("C"),
            Err(ParseError::Ambiguous { kind: "checksum" })
        );

        // 'Z' は 16 進数字ではないため、レター解釈のみが成立する。
        let sum = Checksum::parse("Z").unwrap();
        assert_eq!(sum.value(), 0);
    }

    #[test]
    fn test_parse_empty_and_padding() {
        assert_eq!(
            SceneId::parse(""),
            Err(ParseError::Empty { kind: "scene id" })
        );
        assert_eq!(
            SceneId::parse(" XZE"),
            Err(ParseError::PaddedInput { kind: "scene id" })
        );
        assert_eq!(
            SceneId::parse("XZE "),
            Err(ParseError::PaddedInput { kind: "scene id" })
        );
    }

    #[test]
    fn test_parse_wrong_length() {
        assert_eq!(
            SceneId::parse("XZEJ"),
            Err(ParseError::InvalidLength {
                kind: "scene id",
                expected: 3,
                actual: 4,
            })
        );
        assert_eq!(
            Password::parse("XZEJZZZ"),
            Err(ParseError::InvalidLength {
                kind: "password",
                expected: 8,
                actual: 7,
            })
        );
    }

    #[test]
    fn test_parse_invalid_char() {
        assert_eq!(
            SceneId::parse("A1Z"),
            Err(ParseError::InvalidChar {
                kind: "scene id",
                pos: 1,
                ch: '1',
            })
        );
    }

    #[test]
    fn test_try_parse() {
        assert_eq!(SceneId::try_parse("XZE").map(|s| s.value()), Some(783));
        assert_eq!(SceneId::try_parse("bogus"), None);

        let flags = FlagData::try_parse_styled("ACEAB", ParseStyle::LETTERS);
        assert_eq!(flags.map(|f| f.value()), Some(0x14310));
    }

    #[test]
    fn test_parse_layout_entry_points() {
        let flags =
            FlagData::parse_layout("0x1234", FlagLayout::Narrow, ParseStyle::ANY).unwrap();
        assert_eq!(flags.value(), 0x1234);
        assert_eq!(flags.text(), "CEUA");
    }
}
