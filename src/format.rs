use bitvec::prelude::*;
use rand::Rng;
use thiserror::Error;

use crate::block::LetterBlock;
use crate::letter::LetterFormat;

/// パース済みのフォーマット指定。
///
/// 文法:
///
/// * 空文字列: レター列をそのまま出力する。
/// * `P<mode>[spacing]`: 1 文字ずつ `mode` (`S`/`N`/`R`/`B`/`D`/`X`) で出力する。
///   `spacing` は文字間の空白数。省略時は `D` のみ 1、他は 0。
///   `mode` が小文字なら出力も小文字となる。
/// * `VB[spacing]`: 値全体を `4 * len` 桁のゼロ詰め 2 進で出力する。
///   `spacing` は 4 桁ごとの空白数 (省略時 0)。
/// * `VX[width]` / `VD[width]`: 値全体をゼロ詰め 16 進/10 進で出力する。
///   `x` なら小文字となる。
/// * `VN[places]`: 値全体を 3 桁区切りの 10 進で出力する。
///   `places` は小数部の桁数 (省略時 0)。
#[derive(Clone, Copy, Debug)]
pub struct BlockFormat {
    op: FormatOp,
    lowercase: bool,
    spacing: usize,
}

#[derive(Clone, Copy, Debug)]
enum FormatOp {
    Text,
    PerLetter(LetterFormat),
    ValueBinary,
    ValueHex { width: usize },
    ValueDecimal { width: usize },
    ValueNumber { places: usize },
}

impl BlockFormat {
    /// フォーマット指定文字列をパースする。`kind` はエラーメッセージ用のブロック名。
    pub fn parse(spec: &str, kind: &'static str) -> Result<Self, FormatError> {
        let err = || FormatError::Unknown {
            spec: spec.to_owned(),
            kind,
        };

        if spec.is_empty() {
            return Ok(Self {
                op: FormatOp::Text,
                lowercase: false,
                spacing: 0,
            });
        }

        let mut chars = spec.chars();
        match chars.next() {
            Some('P' | 'p') => {
                let mode_char = chars.next().ok_or_else(err)?;
                let mode = LetterFormat::from_char(mode_char).ok_or_else(err)?;
                let spacing = match chars.as_str() {
                    "" => usize::from(matches!(mode, LetterFormat::Decimal)),
                    rest => rest.parse().map_err(|_| err())?,
                };

                Ok(Self {
                    op: FormatOp::PerLetter(mode),
                    lowercase: mode_char.is_ascii_lowercase(),
                    spacing,
                })
            }
            Some('V' | 'v') => {
                let net = chars.next().ok_or_else(err)?;
                let width = parse_width(chars.as_str()).ok_or_else(err)?;

                match net {
                    'B' | 'b' => Ok(Self {
                        op: FormatOp::ValueBinary,
                        lowercase: false,
                        spacing: width,
                    }),
                    'X' | 'x' => Ok(Self {
                        op: FormatOp::ValueHex { width },
                        lowercase: net.is_ascii_lowercase(),
                        spacing: 0,
                    }),
                    'D' | 'd' => Ok(Self {
                        op: FormatOp::ValueDecimal { width },
                        lowercase: false,
                        spacing: 0,
                    }),
                    'N' | 'n' => Ok(Self {
                        op: FormatOp::ValueNumber { places: width },
                        lowercase: false,
                        spacing: 0,
                    }),
                    _ => Err(err()),
                }
            }
            _ => Err(err()),
        }
    }
}

/// 数値引数をパースする。空文字列は 0 とみなす。
fn parse_width(s: &str) -> Option<usize> {
    if s.is_empty() {
        Some(0)
    } else {
        s.parse().ok()
    }
}

/// フォーマット指定に従ってブロックを文字列化する。
pub(crate) fn format_block<B: LetterBlock, R: Rng>(
    block: &B,
    format: &BlockFormat,
    rng: &mut R,
) -> String {
    let sep = " ".repeat(format.spacing);

    let res = match format.op {
        FormatOp::Text => block.text(),
        FormatOp::PerLetter(mode) => {
            let mut buf = String::new();
            for i in 0..block.len() {
                if i != 0 {
                    buf.push_str(&sep);
                }
                buf.push_str(&block.letter(i).render(mode, rng));
            }
            buf
        }
        FormatOp::ValueBinary => {
            let value = block.value();
            let bits = &value.view_bits::<Lsb0>()[..4 * block.len()];

            let mut buf = String::new();
            for (i, bit) in bits.iter().by_vals().rev().enumerate() {
                if i != 0 && i % 4 == 0 {
                    buf.push_str(&sep);
                }
                buf.push(if bit { '1' } else { '0' });
            }
            buf
        }
        FormatOp::ValueHex { width } => {
            let value = block.value();
            format!("{value:0width$X}")
        }
        FormatOp::ValueDecimal { width } => {
            let value = block.value();
            format!("{value:0width$}")
        }
        FormatOp::ValueNumber { places } => group_thousands(block.value(), places),
    };

    if format.lowercase {
        res.to_ascii_lowercase()
    } else {
        res
    }
}

/// 10 進表記に 3 桁ごとのコンマを挿入する。`places > 0` なら小数部 (常にゼロ) を付ける。
fn group_thousands(value: u32, places: usize) -> String {
    let digits = value.to_string();
    let n = digits.len();

    let mut buf = String::new();
    for (i, c) in digits.chars().enumerate() {
        if i != 0 && (n - i) % 3 == 0 {
            buf.push(',');
        }
        buf.push(c);
    }

    if places > 0 {
        buf.push('.');
        for _ in 0..places {
            buf.push('0');
        }
    }

    buf
}

/// フォーマットで発生しうるエラー。
#[derive(Clone, Debug, Eq, PartialEq, Error)]
pub enum FormatError {
    /// 未知のフォーマット指定。
    #[error("unknown format spec \"{spec}\" for {kind}")]
    Unknown { spec: String, kind: &'static str },
}
