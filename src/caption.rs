//! Data groups to token streams, one tokenizer per caption language.

use std::collections::HashMap;

use log::{debug, trace};
use serde::Serialize;

use crate::datagroup::{CaptionStatement, DataGroup, DataGroupBody, LanguageEntry, PesData, TimeControlMode};
use crate::encoder::Encoded;
use crate::error::Result;
use crate::tokenizer::{self, Token, Tokenize};
use crate::types::{DecodeOptions, Profile, TextCodingSystem};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DecodedCaption {
    pub language_index: u8,
    /// Entry from the latest management record, if one matched
    pub language: Option<LanguageEntry>,
    pub profile: Profile,
    pub tcs: TextCodingSystem,
    pub tokens: Vec<Token>,
}

struct LanguageTokenizer {
    profile:   Profile,
    tcs:       TextCodingSystem,
    tokenizer: Box<dyn Tokenize + Send>,
}

/// Applies management records and tokenizes statements against them.
pub struct CaptionDecoder {
    options:    DecodeOptions,
    languages:  Vec<LanguageEntry>,
    tokenizers: HashMap<u8, LanguageTokenizer>,
}

impl CaptionDecoder {
    pub fn new(options: DecodeOptions) -> Self {
        Self { options, languages: Vec::new(), tokenizers: HashMap::new() }
    }

    /// Languages of the latest management record
    pub fn languages(&self) -> &[LanguageEntry] {
        &self.languages
    }

    /// Entry whose tag equals the index, else the entry at that position
    pub fn resolve(&self, language_index: u8) -> Option<&LanguageEntry> {
        self.languages
            .iter()
            .find(|l| l.language_tag == language_index)
            .or_else(|| self.languages.get(language_index as usize))
    }

    /// Decodes a caption PES payload: the PES data header, then one data group.
    pub fn decode_pes(&mut self, payload: &[u8]) -> Result<Option<DecodedCaption>> {
        let pes = PesData::read(payload)?;
        let group = DataGroup::read(pes.data_group)?;
        self.decode(&group)
    }

    /// Management groups update the language table and yield nothing.
    pub fn decode(&mut self, group: &DataGroup) -> Result<Option<DecodedCaption>> {
        let statement = match &group.body {
            DataGroupBody::Management(management) => {
                trace!("management record with {} languages", management.languages.len());
                self.languages = management.languages.clone();
                return Ok(None);
            }
            DataGroupBody::Statement(statement) => statement,
        };

        let index = statement.language_index;
        let language = self.resolve(index).cloned();
        if language.is_none() && !self.languages.is_empty() {
            debug!("statement for language {index} has no management entry");
        }
        let iso = language.as_ref().map(|l| l.iso_639_code()).unwrap_or_default();
        let profile = self.options.association.resolve(&iso);
        let tcs = self
            .options
            .tcs_override
            .or(language.as_ref().map(LanguageEntry::text_coding_system))
            .unwrap_or_default();

        let symbols = self.options.symbols;
        let slot = self.tokenizers.entry(index).or_insert_with(|| LanguageTokenizer {
            profile,
            tcs,
            tokenizer: tokenizer::for_language(tcs, profile, symbols),
        });
        if slot.profile != profile || slot.tcs != tcs {
            debug!("language {index} switched to {profile:?}/{tcs:?}, DRCS dropped");
            *slot = LanguageTokenizer { profile, tcs, tokenizer: tokenizer::for_language(tcs, profile, symbols) };
        }

        let tokens = slot.tokenizer.tokenize_units(&statement.units)?;
        Ok(Some(DecodedCaption { language_index: index, language, profile, tcs, tokens }))
    }
}

/// Statement record for encoder output: supporting units first, then the text.
pub fn build_statement(encoded: &Encoded, language_index: u8) -> CaptionStatement<'_> {
    CaptionStatement {
        language_index,
        tmd: TimeControlMode::Free,
        start_time: None,
        units: encoded.data_units(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::datagroup::{CaptionManagement, DataUnit};
    use crate::encoder::{Encode, Jis8Encoder};
    use crate::types::Association;

    fn entry(tag: u8, iso: &[u8; 3], tcs: u8) -> LanguageEntry {
        LanguageEntry {
            language_tag: tag,
            display_mode: 0x0A,
            display_condition: None,
            iso_639: *iso,
            format: 0,
            tcs,
            rollup_mode: 0,
        }
    }

    fn group(body: DataGroupBody<'_>) -> DataGroup<'_> {
        DataGroup { group: 0, version: 0, link_number: 0, last_link_number: 0, body, crc: 0, crc_valid: true }
    }

    fn statement(index: u8, bytes: &[u8]) -> DataGroup<'_> {
        group(DataGroupBody::Statement(CaptionStatement {
            language_index: index,
            tmd: TimeControlMode::Free,
            start_time: None,
            units: vec![DataUnit::Statement(bytes)],
        }))
    }

    #[test]
    fn statements_follow_the_latest_management() {
        let mut decoder = CaptionDecoder::new(DecodeOptions::default());
        let management = group(DataGroupBody::Management(CaptionManagement {
            tmd: TimeControlMode::Free,
            offset_time: None,
            languages: vec![entry(0, b"jpn", 0), entry(1, b"por", 1)],
            units: vec![],
        }));
        assert_eq!(decoder.decode(&management).unwrap(), None);

        let decoded = decoder.decode(&statement(1, "olá".as_bytes())).unwrap().unwrap();
        assert_eq!(decoded.language.as_ref().map(LanguageEntry::iso_639_code).as_deref(), Some("por"));
        assert_eq!(decoded.tcs, TextCodingSystem::Utf8);
        assert_eq!(decoded.profile, Profile::Sbtvd);
        assert_eq!(decoded.tokens, ["o", "l", "á"].map(Token::character));
    }

    #[test]
    fn defaults_without_management() {
        let mut decoder = CaptionDecoder::new(DecodeOptions { association: Association::Sbtvd, ..Default::default() });
        let decoded = decoder.decode(&statement(0, b"Hi")).unwrap().unwrap();
        assert_eq!(decoded.language, None);
        assert_eq!((decoded.profile, decoded.tcs), (Profile::Sbtvd, TextCodingSystem::Jis8));
        assert_eq!(decoded.tokens, ["H", "i"].map(Token::character));
    }

    #[test]
    fn drcs_persist_per_language() {
        let glyph = crate::tokenizer::DrcsGlyph { width: 8, height: 1, depth: 1, data: vec![0x7E] };
        let drcs = Token::Drcs { glyph, combining: None };
        let encoded = Jis8Encoder::new(Profile::Arib).encode(&[drcs.clone()]).unwrap();
        let with_defs = group(DataGroupBody::Statement(build_statement(&encoded, 0)));

        let mut decoder = CaptionDecoder::new(DecodeOptions::default());
        assert_eq!(decoder.decode(&with_defs).unwrap().unwrap().tokens, [drcs.clone()]);
        // The same codes without definitions still resolve for language 0 only.
        let bare = encoded.statement.clone();
        assert_eq!(decoder.decode(&statement(0, &bare)).unwrap().unwrap().tokens, [drcs]);
        assert_eq!(
            decoder.decode(&statement(1, &bare)).unwrap().unwrap().tokens,
            [Token::character(crate::constants::GETA)]
        );
    }

    #[test]
    fn pes_payload_round_trip() {
        let stmt = statement(0, b"\x0E\x41");
        let payload = PesData::write(crate::constants::DATA_IDENTIFIER_CAPTION, &stmt.write().unwrap());
        let decoded = CaptionDecoder::new(DecodeOptions::default()).decode_pes(&payload).unwrap().unwrap();
        assert_eq!(decoded.tokens, [Token::character("A")]);
    }
}
