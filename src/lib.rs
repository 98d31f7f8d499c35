// src/lib.rs
//! ARIB STD-B24 closed captions: MPEG-TS demultiplexing, data group
//! framing, 8-bit and UTF-8 character coding, and presentation layout.
//!
//! Decoding runs [`Demuxer`] → [`DataGroup::read`] → [`CaptionDecoder`] →
//! [`Parser`] → [`Regioner`]. Encoding runs an [`Encode`] implementation →
//! [`build_statement`] → [`DataGroup::write`].

pub mod caption;
pub mod constants;
pub mod datagroup;
pub mod encoder;
pub mod error;
pub mod parser;
pub mod processor;
pub mod psi;
pub mod tokenizer;
pub mod types;

pub use caption::{build_statement, CaptionDecoder, DecodedCaption};
pub use datagroup::{
    CaptionManagement, CaptionStatement, DataGroup, DataGroupBody, DataUnit, LanguageEntry, PesData,
};
pub use encoder::{Encode, Encoded, Jis8Encoder, Utf8Encoder};
pub use error::{Error, Result};
pub use parser::{Parser, ParserState, Primitive, Region, Regioner, Span};
pub use processor::Demuxer;
pub use tokenizer::{Jis8Tokenizer, Token, Tokenize, Utf8Tokenizer};
pub use types::*;
