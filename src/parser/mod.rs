//! Tokens to positioned drawing primitives, and primitives to layout regions.

pub mod regioner;
pub mod state;

use serde::Serialize;

pub use regioner::{merge_regions, Glyph, Region, RegionItem, Regioner, Span};
pub use state::ParserState;

use crate::tokenizer::{Bitmap, DrcsGlyph, Token};
use crate::types::ParserOptions;

const DELETE_GLYPH: &str = "\u{2588}";

#[derive(Clone, Debug, PartialEq, Serialize)]
pub enum Primitive {
    Character { text: String, non_spacing: bool, state: ParserState },
    Drcs { glyph: DrcsGlyph, state: ParserState },
    Bitmap { bitmap: Bitmap, state: ParserState },
    /// Seconds of TIME waits accumulated before the screen was cleared
    ClearScreen { time: f64 },
}

impl Primitive {
    pub fn state(&self) -> Option<&ParserState> {
        match self {
            Primitive::Character { state, .. }
            | Primitive::Drcs { state, .. }
            | Primitive::Bitmap { state, .. } => Some(state),
            Primitive::ClearScreen { .. } => None,
        }
    }
}

/// Walks tokens and keeps the active presentation state between calls.
#[derive(Debug, Clone)]
pub struct Parser {
    state:  ParserState,
    /// Non-spacing characters waiting for the next spacing one
    held:   Vec<String>,
    /// Pending RPC count; 0 repeats to the end of the row
    repeat: Option<u8>,
}

impl Parser {
    pub fn new(options: ParserOptions) -> Self {
        Self { state: ParserState::initial(options.magnification), held: Vec::new(), repeat: None }
    }

    pub fn state(&self) -> &ParserState {
        &self.state
    }

    pub fn parse(&mut self, tokens: &[Token]) -> Vec<Primitive> {
        let mut out = Vec::new();
        for token in tokens {
            self.apply(token, &mut out);
        }
        self.flush_held(&mut out);
        out
    }

    fn flush_held(&mut self, out: &mut Vec<Primitive>) {
        for text in self.held.drain(..) {
            out.push(Primitive::Character { text, non_spacing: true, state: self.state });
        }
    }

    /// Emits a spacing glyph, honoring a pending RPC, and advances past it.
    fn spacing(&mut self, emit: impl Fn(ParserState, &mut Vec<Primitive>), out: &mut Vec<Primitive>) {
        self.flush_held(out);
        let times = match self.repeat.take() {
            None => 1,
            Some(0) => self.state.remaining_in_row(),
            Some(n) => n as usize,
        };
        for _ in 0..times {
            emit(self.state, out);
            self.state.forward();
        }
    }

    fn apply(&mut self, token: &Token, out: &mut Vec<Primitive>) {
        match token {
            Token::Character { text, non_spacing: true } => self.held.push(text.clone()),
            Token::Character { text, non_spacing: false } => self.spacing(
                |state, buf| buf.push(Primitive::Character { text: text.clone(), non_spacing: false, state }),
                out,
            ),
            Token::Space => self.spacing(
                |state, buf| buf.push(Primitive::Character { text: " ".into(), non_spacing: false, state }),
                out,
            ),
            Token::Delete => self.spacing(
                |state, buf| buf.push(Primitive::Character { text: DELETE_GLYPH.into(), non_spacing: false, state }),
                out,
            ),
            Token::Drcs { glyph, combining } => self.spacing(
                |state, buf| {
                    buf.push(Primitive::Drcs { glyph: glyph.clone(), state });
                    if let Some(text) = combining {
                        buf.push(Primitive::Character { text: text.clone(), non_spacing: true, state });
                    }
                },
                out,
            ),
            Token::Bitmap(bitmap) => out.push(Primitive::Bitmap { bitmap: bitmap.clone(), state: self.state }),
            Token::RepeatCharacter(n) => self.repeat = Some(*n),
            _ => self.control(token, out),
        }
    }

    fn control(&mut self, token: &Token, out: &mut Vec<Primitive>) {
        let state = &mut self.state;
        match token {
            Token::ActivePositionBackward => state.backward(),
            Token::ActivePositionForward => state.forward(),
            Token::ActivePositionDown => state.down(),
            Token::ActivePositionUp => state.up(),
            Token::ActivePositionReturn => state.newline(),
            Token::ParameterizedActivePositionForward(n) => {
                for _ in 0..*n {
                    state.forward();
                }
            }
            Token::ActivePositionSet { x, y } => state.set_cell(*x, *y),
            Token::ActiveCoordinatePositionSet { x, y } => {
                state.position = [*x as f64 * state.magnification, *y as f64 * state.magnification];
            }
            Token::ClearScreen => out.push(Primitive::ClearScreen { time: state.elapsed_time }),

            Token::ColorForeground(c) => state.foreground = state.color(*c),
            Token::ColorBackground(c) => state.background = state.color(*c),
            Token::ColorHalfForeground(c) => state.half_foreground = state.color(*c),
            Token::ColorHalfBackground(c) => state.half_background = state.color(*c),
            Token::PalletControl(p) => state.pallet = *p,
            Token::RasterColorCommand(c) => state.raster = Some(*c as u8),
            Token::CharacterSize(size) => state.size = *size,
            Token::FlashingControl(mode) => state.flashing = *mode,
            Token::PatternPolarity(p) => state.polarity = *p,
            Token::WritingModeModification(mode) => state.writing_mode = *mode,
            Token::HighlightBlock(h) => state.highlight = *h,
            Token::StartLining => state.underline = true,
            Token::StopLining => state.underline = false,
            Token::OrnamentControl(orn) => state.ornament = *orn,
            Token::TimeControlWait(secs) => state.elapsed_time += secs,

            Token::SetWritingFormat(format) => state.set_writing_format(*format),
            Token::SetDisplayFormat { width, height } => {
                state.area = [*width as f64 * state.magnification, *height as f64 * state.magnification];
            }
            Token::SetDisplayPosition { x, y } => {
                state.margin = [*x as f64 * state.magnification, *y as f64 * state.magnification];
            }
            Token::CharacterCompositionDotDesignation { width, height } => {
                state.font_size = [*width as f64 * state.magnification, *height as f64 * state.magnification];
            }
            Token::SetHorizontalSpacing(p) => state.hspace = *p as f64 * state.magnification,
            Token::SetVerticalSpacing(p) => state.vspace = *p as f64 * state.magnification,

            Token::Character { .. }
            | Token::Space
            | Token::Delete
            | Token::Drcs { .. }
            | Token::Bitmap(_)
            | Token::RepeatCharacter(_)
            | Token::Null
            | Token::Bell
            | Token::Cancel
            | Token::RecordSeparator
            | Token::UnitSeparator
            | Token::TimeControlMode(_)
            | Token::BuiltinSoundReplay(_) => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tokenizer::CharacterSize;

    fn parse(tokens: &[Token]) -> Vec<Primitive> {
        Parser::new(ParserOptions::default()).parse(tokens)
    }

    fn positions(primitives: &[Primitive]) -> Vec<[f64; 2]> {
        primitives.iter().filter_map(|p| p.state()).map(|s| s.position).collect()
    }

    #[test]
    fn swf_character_and_clear_screen() {
        let mut parser = Parser::new(ParserOptions::default());
        let out = parser.parse(&[Token::SetWritingFormat(7), Token::character("A"), Token::ClearScreen]);
        assert_eq!(parser.state().plane, [960.0, 540.0]);
        assert_eq!(out.len(), 2);
        assert!(matches!(&out[0], Primitive::Character { text, state, .. } if text == "A" && state.position == [0.0, 59.0]));
        assert_eq!(out[1], Primitive::ClearScreen { time: 0.0 });
    }

    #[test]
    fn snapshots_do_not_follow_later_changes() {
        let out = parse(&[Token::character("a"), Token::ColorForeground(2), Token::character("b")]);
        let colors: Vec<u8> = out.iter().filter_map(|p| p.state()).map(|s| s.foreground).collect();
        assert_eq!(colors, [7, 2]);
    }

    #[test]
    fn pallet_is_high_nibble() {
        let out = parse(&[Token::PalletControl(2), Token::ColorBackground(3), Token::Space]);
        assert_eq!(out[0].state().unwrap().background, 0x23);
    }

    #[test]
    fn aps_uses_margin_and_cell() {
        let out = parse(&[
            Token::SetDisplayPosition { x: 100, y: 50 },
            Token::ActivePositionSet { x: 2, y: 1 },
            Token::character("x"),
        ]);
        assert_eq!(positions(&out), [[180.0, 169.0]]);
    }

    #[test]
    fn non_spacing_flushes_before_next_spacing() {
        let acute = Token::Character { text: "\u{0301}".into(), non_spacing: true };
        let out = parse(&[Token::character("a"), acute, Token::character("e")]);
        let texts: Vec<(&str, bool)> = out
            .iter()
            .map(|p| match p {
                Primitive::Character { text, non_spacing, .. } => (text.as_str(), *non_spacing),
                _ => ("", false),
            })
            .collect();
        assert_eq!(texts, [("a", false), ("\u{0301}", true), ("e", false)]);
        assert_eq!(positions(&out), [[0.0, 59.0], [40.0, 59.0], [40.0, 59.0]]);
    }

    #[test]
    fn repeat_character() {
        let out = parse(&[Token::RepeatCharacter(3), Token::character("-"), Token::character("x")]);
        assert_eq!(out.len(), 4);

        let mut parser = Parser::new(ParserOptions::default());
        let row = parser.parse(&[Token::ActivePositionSet { x: 20, y: 0 }, Token::RepeatCharacter(0), Token::Space]);
        assert_eq!(row.len(), 4);
        assert_eq!(parser.state().position, [0.0, 119.0]);
    }

    #[test]
    fn repeat_to_row_end_is_bounded() {
        let zero_cell = parse(&[
            Token::CharacterCompositionDotDesignation { width: 0, height: 0 },
            Token::SetHorizontalSpacing(0),
            Token::RepeatCharacter(0),
            Token::Space,
        ]);
        assert_eq!(zero_cell.len(), 1);

        let wide = parse(&[
            Token::SetDisplayFormat { width: 40_000_000, height: 540 },
            Token::RepeatCharacter(0),
            Token::Space,
        ]);
        assert_eq!(wide.len(), 1920);
    }

    #[test]
    fn repeat_applies_to_drcs() {
        let glyph = DrcsGlyph { width: 8, height: 1, depth: 1, data: vec![0xFF] };
        let out = parse(&[
            Token::RepeatCharacter(3),
            Token::Drcs { glyph, combining: Some("\u{0301}".into()) },
            Token::character("x"),
        ]);
        let drcs = out.iter().filter(|p| matches!(p, Primitive::Drcs { .. })).count();
        let marks = out.iter().filter(|p| matches!(p, Primitive::Character { non_spacing: true, .. })).count();
        let xs = out.iter().filter(|p| matches!(p, Primitive::Character { text, .. } if text == "x")).count();
        assert_eq!((drcs, marks, xs), (3, 3, 1));
        assert_eq!(positions(&out)[4], [80.0, 59.0]);
    }

    #[test]
    fn time_wait_accumulates() {
        let out = parse(&[Token::TimeControlWait(1.5), Token::TimeControlWait(2.0), Token::ClearScreen]);
        assert_eq!(out, [Primitive::ClearScreen { time: 3.5 }]);
    }

    #[test]
    fn size_changes_advance() {
        let out = parse(&[Token::CharacterSize(CharacterSize::Middle), Token::character("a"), Token::character("b")]);
        assert_eq!(positions(&out), [[0.0, 59.0], [20.0, 59.0]]);
    }
}
