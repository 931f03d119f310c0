mod common;

use common::*;
use mpegts_captions::eia608::{control_command, from_basic_pair, parity_word, Control};
use mpegts_captions::nal::NalAccumulator;
use mpegts_captions::parsers::{remove_emulation_prevention, CcData, CcType, Cea708Unit, Sei, SeiMessageType};
use mpegts_captions::types::{OutputFormat, OverflowPolicy, ProcessorConfig};
use mpegts_captions::{process_reader, CaptionMode, CaptionProcessor, Status};

fn unit(codes: &[u16]) -> Cea708Unit {
    let mut unit = Cea708Unit::atsc(0.0);
    for &cc in codes {
        unit.add_cc(true, CcType::NtscCcField1, cc);
    }
    unit
}

fn ctrl(c: Control) -> u16 {
    control_command(c, 0)
}

fn padding() -> u16 {
    parity_word(0)
}

/// PTS == DTS, one frame every 3003 ticks
fn in_order(codes: Vec<Vec<u16>>) -> Vec<(u64, u64, Vec<Cea708Unit>)> {
    codes
        .into_iter()
        .enumerate()
        .map(|(i, c)| {
            let t = 90_000 + i as u64 * FRAME_TICKS;
            (t, t, vec![unit(&c)])
        })
        .collect()
}

fn run_packets(processor: &mut CaptionProcessor, packets: &[Vec<u8>]) -> Vec<String> {
    let mut texts = Vec::new();
    for pkt in packets {
        for frame in processor.process_packet(pkt).unwrap() {
            texts.push(frame.to_text());
        }
    }
    texts
}

fn hi_stream() -> Vec<Vec<u8>> {
    caption_stream(&in_order(vec![
        vec![ctrl(Control::ResumeCaptionLoading), ctrl(Control::ResumeCaptionLoading)],
        vec![from_basic_pair('H', 'I').unwrap()],
        vec![ctrl(Control::EndOfCaption), ctrl(Control::EndOfCaption)],
        vec![padding()],
        vec![padding()],
    ]))
}

#[test]
fn pop_on_caption_end_to_end() {
    let mut processor = CaptionProcessor::new(ProcessorConfig::default());
    let texts = run_packets(&mut processor, &hi_stream());

    assert_eq!(texts, vec!["HI".to_string()]);
    assert_eq!(processor.demux().pmt_pid(), Some(PMT_PID));
    assert_eq!(processor.demux().caption_pid(), Some(VIDEO_PID));
    assert_eq!(processor.frame().mode(), CaptionMode::PopOn);
    assert_eq!(processor.frame().to_text(), "HI");
}

#[test]
fn end_to_end_with_crc_checks() {
    let config = ProcessorConfig { verify_psi_crc: true, reorder_overflow: OverflowPolicy::Reject };
    let mut processor = CaptionProcessor::new(config);
    assert_eq!(run_packets(&mut processor, &hi_stream()), vec!["HI".to_string()]);
}

#[test]
fn corrupt_pmt_is_dropped_when_verifying() {
    let mut packets = hi_stream();
    packets[1][9] ^= 0x5A; // program_number

    let mut strict = CaptionProcessor::new(ProcessorConfig { verify_psi_crc: true, ..Default::default() });
    assert!(run_packets(&mut strict, &packets).is_empty());
    assert_eq!(strict.demux().caption_pid(), None);
}

#[test]
fn b_frames_are_presented_in_pts_order() {
    let t = FRAME_TICKS;
    let base = 90_000;
    let rdc = ctrl(Control::ResumeDirectCaptioning);
    let pair = |c: char| from_basic_pair(c, c).unwrap();

    // decode order I P B B, presentation order I B B P
    let frames = vec![
        (base + t, base, vec![unit(&[rdc, pair('A')])]),
        (base + 4 * t, base + t, vec![unit(&[pair('D')])]),
        (base + 2 * t, base + 2 * t, vec![unit(&[pair('B')])]),
        (base + 3 * t, base + 3 * t, vec![unit(&[pair('C')])]),
        (base + 5 * t, base + 4 * t, vec![unit(&[padding()])]),
        (base + 6 * t, base + 5 * t, vec![unit(&[padding()])]),
        (base + 7 * t, base + 6 * t, vec![unit(&[padding()])]),
    ];
    let mut processor = CaptionProcessor::new(ProcessorConfig::default());
    let texts = run_packets(&mut processor, &caption_stream(&frames));

    assert_eq!(texts, vec!["AA", "AABB", "AABBCC", "AABBCCDD"]);
    assert_eq!(processor.frame().mode(), CaptionMode::PaintOn);
}

#[test]
fn roll_up_scrolls_lines() {
    let mut codes = vec![vec![ctrl(Control::RollUp2), ctrl(Control::RollUp2)]];
    codes.push(vec![from_basic_pair('O', 'N').unwrap(), from_basic_pair('E', ' ').unwrap()]);
    codes.push(vec![ctrl(Control::CarriageReturn), ctrl(Control::CarriageReturn)]);
    codes.push(vec![from_basic_pair('T', 'W').unwrap(), from_basic_pair('O', ' ').unwrap()]);
    codes.push(vec![padding()]);
    codes.push(vec![padding()]);

    let mut processor = CaptionProcessor::new(ProcessorConfig::default());
    let texts = run_packets(&mut processor, &caption_stream(&in_order(codes)));

    assert_eq!(texts.first().map(String::as_str), Some("ON"));
    assert_eq!(texts.last().map(String::as_str), Some("ONE\nTWO"));
    assert_eq!(processor.frame().mode(), CaptionMode::RollUp(2));
}

#[test]
fn escaped_sei_payload_is_decoded() {
    // an invalid entry of zeros forces emulation-prevention bytes into the NAL
    let mut first = unit(&[ctrl(Control::ResumeDirectCaptioning)]);
    first.user_data.cc_data.insert(0, CcData { marker_bits: 0, valid: false, cc_type: CcType::NtscCcField1, payload: 0 });
    first.user_data.cc_data.insert(0, CcData { marker_bits: 0, valid: false, cc_type: CcType::NtscCcField1, payload: 0 });
    first.user_data.cc_count = first.user_data.cc_data.len() as u8;
    assert!(access_unit(std::slice::from_ref(&first)).windows(3).any(|w| w == [0x00, 0x00, 0x03]));

    let frames = vec![
        (90_000, 90_000, vec![first]),
        (93_003, 93_003, vec![unit(&[from_basic_pair('O', 'K').unwrap()])]),
        (96_006, 96_006, vec![unit(&[padding()])]),
        (99_009, 99_009, vec![unit(&[padding()])]),
    ];
    let mut processor = CaptionProcessor::new(ProcessorConfig::default());
    assert_eq!(run_packets(&mut processor, &caption_stream(&frames)), vec!["OK".to_string()]);
}

#[test]
fn sei_before_four_byte_start_code() {
    let units = vec![unit(&[ctrl(Control::ResumeCaptionLoading)]), unit(&[padding()])];
    let mut acc = NalAccumulator::new();
    acc.push(&access_unit_long_start_code(&units)).unwrap();

    let mut seis = Vec::new();
    while let Some(nal) = acc.next_nal() {
        if nal.nal_type() == 6 {
            seis.push(Sei::from_rbsp(&remove_emulation_prevention(nal.payload()), 0.0).unwrap());
        }
    }
    assert_eq!(seis.len(), 1);
    let kinds: Vec<_> = seis[0].messages.iter().map(|m| m.kind()).collect();
    assert_eq!(kinds, vec![SeiMessageType::UserDataRegisteredItuTT35; 2]);
    assert!(seis[0].messages.iter().all(|m| !m.payload.is_empty()));

    let frames = in_order(vec![
        vec![ctrl(Control::ResumeCaptionLoading), ctrl(Control::ResumeCaptionLoading)],
        vec![from_basic_pair('H', 'I').unwrap()],
        vec![ctrl(Control::EndOfCaption), ctrl(Control::EndOfCaption)],
        vec![padding()],
        vec![padding()],
    ]);
    let mut processor = CaptionProcessor::new(ProcessorConfig::default());
    let packets = caption_stream_with(&frames, access_unit_long_start_code);
    let mut texts = Vec::new();
    for pkt in &packets {
        texts.extend(processor.process_packet(pkt).unwrap().iter().map(|f| f.to_text()));
        assert_ne!(processor.status(), Status::Error);
    }
    assert_eq!(texts, vec!["HI".to_string()]);
}

#[test]
fn parity_errors_only_drop_the_bad_code() {
    let bad = from_basic_pair('X', 'X').unwrap() ^ 0x0080;
    let codes = vec![
        vec![ctrl(Control::ResumeDirectCaptioning)],
        vec![bad, from_basic_pair('O', 'K').unwrap()],
        vec![padding()],
        vec![padding()],
    ];
    let mut processor = CaptionProcessor::new(ProcessorConfig::default());
    let mut texts = Vec::new();
    let mut errors = 0;
    for pkt in caption_stream(&in_order(codes)) {
        texts.extend(processor.process_packet(&pkt).unwrap().iter().map(|f| f.to_text()));
        if processor.status() == Status::Error {
            errors += 1;
        }
    }
    assert_eq!(texts, vec!["OK".to_string()]);
    assert_eq!(errors, 1);
}

#[test]
fn wrong_packet_size_is_fatal() {
    let mut processor = CaptionProcessor::new(ProcessorConfig::default());
    let err = processor.process_packet(&[0x47; 204]).unwrap_err();
    assert!(err.is_fatal());
}

#[tokio::test]
async fn reader_prints_frames_and_flushes_the_tail() {
    // the EndOfCaption unit is only released by the final flush
    let stream = caption_stream(&in_order(vec![
        vec![ctrl(Control::ResumeCaptionLoading)],
        vec![from_basic_pair('H', 'I').unwrap()],
        vec![ctrl(Control::EndOfCaption)],
    ]));
    let bytes: Vec<u8> = stream.concat();

    let mut out = Vec::new();
    let summary = process_reader(&bytes[..], ProcessorConfig::default(), OutputFormat::Text, &mut out)
        .await
        .unwrap();

    assert_eq!(summary.packets, stream.len() as u64);
    assert_eq!(summary.frames, 1);
    assert_eq!(summary.errors, 0);
    assert_eq!(String::from_utf8(out).unwrap(), "-------------------------------\nHI\n");
}

#[tokio::test]
async fn reader_json_output() {
    let bytes: Vec<u8> = hi_stream().concat();
    let mut out = Vec::new();
    process_reader(&bytes[..], ProcessorConfig::default(), OutputFormat::Json, &mut out)
        .await
        .unwrap();

    let text = String::from_utf8(out).unwrap();
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines.len(), 1);
    let v: serde_json::Value = serde_json::from_str(lines[0]).unwrap();
    assert_eq!(v["lines"][0], "HI");
    assert_eq!(v["mode"], "pop-on");
}
