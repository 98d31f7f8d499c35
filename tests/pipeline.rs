//! Transport stream to caption regions, end to end.

mod common;

use arib_caption::datagroup::TimeControlMode;
use arib_caption::parser::Glyph;
use arib_caption::types::{DecodeOptions, DemuxOptions, ParserOptions, RegionerOptions};
use arib_caption::{
    build_statement, CaptionDecoder, CaptionKind, CaptionManagement, DataGroup, DataGroupBody,
    Encode, Jis8Encoder, LanguageEntry, Parser, PesData, Profile, Regioner, Token,
};
use common::*;

fn group(id: u8, body: DataGroupBody<'_>) -> Vec<u8> {
    DataGroup { group: id, version: 0, link_number: 0, last_link_number: 0, body, crc: 0, crc_valid: true }
        .write()
        .unwrap()
}

fn management() -> Vec<u8> {
    let japanese = LanguageEntry {
        language_tag: 0,
        display_mode: 0x0A,
        display_condition: None,
        iso_639: *b"jpn",
        format: 0,
        tcs: 0,
        rollup_mode: 0,
    };
    group(
        0,
        DataGroupBody::Management(CaptionManagement {
            tmd: TimeControlMode::Free,
            offset_time: None,
            languages: vec![japanese],
            units: Vec::new(),
        }),
    )
}

fn caption_tokens() -> Vec<Token> {
    vec![
        Token::ClearScreen,
        Token::SetWritingFormat(7),
        Token::ActivePositionSet { x: 2, y: 3 },
        Token::character("字"),
        Token::character("幕"),
        Token::ColorForeground(3),
        Token::character("!"),
    ]
}

fn transport_stream(statement: &[u8]) -> Vec<u8> {
    let mut ts = Vec::new();
    let (mut cc_pat, mut cc_pmt, mut cc_video, mut cc_caption) = (0u8, 0u8, 0u8, 0u8);
    ts.extend(packets(0x0000, &mut cc_pat, &pat()));
    ts.extend(packets(PMT_PID, &mut cc_pmt, &pmt()));
    // captions ahead of the first video PTS are held until it arrives
    ts.extend(packets(CAPTION_PID, &mut cc_caption, &pes(0xBD, Some(1_000_000), &PesData::write(0x80, &management()))));
    ts.extend(packets(CAPTION_PID, &mut cc_caption, &pes(0xBD, Some(1_090_000), &PesData::write(0x80, statement))));
    ts.extend(packets(VIDEO_PID, &mut cc_video, &pes(0xE0, Some(1_000_000), &[0u8; 300])));
    ts
}

#[test]
fn caption_statement_survives_the_whole_chain() {
    let tokens = caption_tokens();
    let encoded = Jis8Encoder::new(Profile::Arib).encode(&tokens).unwrap();
    let statement = group(1, DataGroupBody::Statement(build_statement(&encoded, 0)));
    let ts = transport_stream(&statement);

    let mut demuxer = arib_caption::Demuxer::new(DemuxOptions::default());
    let mut units = Vec::new();
    // odd-sized chunks exercise the partial-packet carry-over
    for chunk in ts.chunks(100) {
        units.extend(demuxer.push(chunk));
    }
    units.extend(demuxer.flush());
    assert_eq!(demuxer.program(), Some(PROGRAM));
    assert_eq!(units.len(), 2);
    assert!(units.iter().all(|u| u.kind == CaptionKind::Caption));
    assert_eq!(units[0].pts, 0.0);
    assert!((units[1].pts - 1.0).abs() < 1e-9);

    let mut decoder = CaptionDecoder::new(DecodeOptions::default());
    assert_eq!(decoder.decode_pes(&units[0].payload).unwrap(), None);
    assert_eq!(decoder.languages().len(), 1);

    let caption = decoder.decode_pes(&units[1].payload).unwrap().unwrap();
    assert_eq!(caption.profile, Profile::Arib);
    assert_eq!(caption.language.as_ref().map(|l| l.iso_639_code()), Some("jpn".to_string()));
    assert_eq!(caption.tokens, tokens);

    let primitives = Parser::new(ParserOptions::default()).parse(&caption.tokens);
    let regions = Regioner::new(RegionerOptions::default()).regions(&primitives);
    assert_eq!(regions.len(), 1);
    let region = &regions[0];
    assert_eq!(region.text(), "字幕!");
    assert_eq!((region.x, region.y, region.width, region.height), (80.0, 180.0, 120.0, 60.0));
    let foregrounds: Vec<u8> = region.items().iter().map(|i| i.state.foreground).collect();
    assert_eq!(foregrounds, [7, 7, 3]);
    assert!(matches!(&region.items()[0].glyph, Glyph::Text(t) if t == "字"));

    let json = serde_json::to_string(&regions).unwrap();
    assert!(json.contains(r#""Text":"字""#), "{json}");
}

#[test]
fn caption_pid_is_ignored_until_a_pmt_announces_it() {
    let mut cc = 0u8;
    let ts = packets(CAPTION_PID, &mut cc, &pes(0xBD, Some(0), &PesData::write(0x80, &management())));
    let mut demuxer = arib_caption::Demuxer::new(DemuxOptions::default());
    assert!(demuxer.push(&ts).is_empty());
    assert!(demuxer.flush().is_empty());
    assert_eq!(demuxer.program(), None);
}

#[test]
fn corrupt_data_group_crc_is_reported_by_strict_read() {
    let mut bytes = management();
    let last = bytes.len() - 1;
    bytes[last] ^= 0xFF;
    let lenient = DataGroup::read(&bytes).unwrap();
    assert!(!lenient.crc_valid);
    assert!(DataGroup::read_strict(&bytes).is_err());
}
