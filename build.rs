// build.rs
//! Generates the JIS X 0208 table used by the 8-bit tokenizer.
//!
//! Every two-byte EUC-JP code of rows 1..=84 is probed through `encoding_rs`;
//! codes that decode to exactly one scalar value are recorded, the rest are
//! left as `'\0'`. Rows 85..=94 hold the ARIB additional symbols, which are
//! hand-written in `src/tokenizer/tables.rs`.

use std::env;
use std::fmt::Write as _;
use std::fs;
use std::path::Path;

const ROWS: usize = 94;
const CELLS: usize = 94;
const KANJI_ROWS: usize = 84;

fn main() {
    println!("cargo:rerun-if-changed=build.rs");

    let mut table = vec!['\0'; ROWS * CELLS];
    for row in 0..KANJI_ROWS {
        for cell in 0..CELLS {
            let euc = [0xA1 + row as u8, 0xA1 + cell as u8];
            let (text, had_errors) = encoding_rs::EUC_JP.decode_without_bom_handling(&euc);
            if had_errors { continue }
            let mut chars = text.chars();
            if let (Some(ch), None) = (chars.next(), chars.next()) {
                table[row * CELLS + cell] = ch;
            }
        }
    }

    let mut out = String::with_capacity(ROWS * CELLS * 12);
    writeln!(out, "/// JIS X 0208 row/cell (0-based) to Unicode, `'\\0'` when unmapped.").ok();
    writeln!(out, "pub static JIS_X0208: [char; {}] = [", ROWS * CELLS).ok();
    for ch in &table {
        writeln!(out, "    '\\u{{{:04X}}}',", *ch as u32).ok();
    }
    writeln!(out, "];").ok();

    let dest = Path::new(&env::var("OUT_DIR").expect("OUT_DIR is set by cargo")).join("jis_x0208.rs");
    fs::write(&dest, out).expect("write generated table");
}
