// End-to-end decoding of a trace file against a DBC file
use dbc_log_decoder::formats::format_timestamp;
use dbc_log_decoder::{Decoder, DecoderConfig, Result};
use std::fs;
use tempfile::TempDir;

// Extended IDs 0x80000100 and 0x80000101 mask to 0x100 and 0x101
const BATTERY_DBC: &str = r#"VERSION ""

BU_: BMS HOST

BO_ 2147483904 PackStatus: 8 BMS
 SG_ PackVoltage : 0|16@1+ (0.1,0) [0|1000] "V" HOST
 SG_ PackCurrent : 16|16@1- (0.1,0) [-500|500] "A" HOST
 SG_ Broken : 32|8@1+ (1,0) "" HOST

BO_ 2147483905 CellData: 8 BMS
 SG_ Mux M : 0|8@1+ (1,0) [0|255] "" HOST
 SG_ Cell0 m0 : 8|16@1+ (0.001,0) [0|5] "V" HOST
 SG_ Cell1 m1 : 8|16@1+ (0.001,0) [0|5] "V" HOST
"#;

fn trace_file(frames: &[&str]) -> String {
    let mut content: String = (0..14).map(|i| format!("; header {}\n", i)).collect();
    for frame in frames {
        content.push_str(frame);
        content.push('\n');
    }
    content
}

fn setup(frames: &[&str]) -> (TempDir, Decoder) {
    let _ = env_logger::builder().is_test(true).try_init();

    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("battery.dbc"), BATTERY_DBC).unwrap();
    fs::write(dir.path().join("drive.log"), trace_file(frames)).unwrap();

    let mut decoder = Decoder::new();
    decoder.add_dbc(&dir.path().join("battery.dbc")).unwrap();
    (dir, decoder)
}

#[test]
fn decodes_trace_end_to_end() {
    let (dir, decoder) = setup(&[
        "09:00:00:0100 Rx 1 0x100 DT 8 E8 03 F6 FF 00 00 00 00",
        "09:00:00:0200 Rx 1 0x101 DT 8 00 C4 09 00 00 00 00 00",
        "09:00:00:0300 Rx 1 0x101 DT 8 01 B8 0B 00 00 00 00 00",
        "09:00:00:0400 Rx 1 0x7FF DT 1 00",
        "09:00:00:0500 Tx 1 0x100 DT 8 00 00 00 00 00 00 00 00",
    ]);

    let frames: Vec<_> = decoder
        .decode_file(&dir.path().join("drive.log"), DecoderConfig::new())
        .unwrap()
        .collect::<Result<_>>()
        .unwrap();

    assert_eq!(frames.len(), 3);

    let pack = &frames[0];
    assert_eq!(pack.message_name, "PackStatus");
    assert_eq!(format_timestamp(&pack.timestamp), "09:00:00:0100");
    assert!((pack.signal("PackVoltage").unwrap() - 100.0).abs() < 1e-9);
    assert!((pack.signal("PackCurrent").unwrap() + 1.0).abs() < 1e-9);
    assert_eq!(pack.signal("Broken"), None);

    let cell0 = &frames[1];
    assert!((cell0.signal("Cell0").unwrap() - 2.5).abs() < 1e-9);
    assert_eq!(cell0.signal("Cell1"), None);
    assert_eq!(cell0.signal("Mux"), None);

    let cell1 = &frames[2];
    assert!((cell1.signal("Cell1").unwrap() - 3.0).abs() < 1e-9);
    assert_eq!(cell1.signal("Cell0"), None);
}

#[test]
fn reports_skipped_schema_lines() {
    let (_dir, decoder) = setup(&[]);

    let stats = decoder.database_stats();
    assert_eq!(stats.num_messages, 2);
    assert_eq!(stats.num_signals, 5);
    assert_eq!(stats.num_skipped_lines, 1);
    assert_eq!(decoder.skipped_lines()[0].line_number, 8);
    assert_eq!(
        decoder.signal_names(),
        vec!["PackVoltage", "PackCurrent", "Mux", "Cell0", "Cell1"]
    );
}

#[test]
fn read_frames_applies_message_filter() {
    let (dir, _decoder) = setup(&[
        "09:00:00:0100 Rx 1 0x100 DT 1 01",
        "09:00:00:0200 Rx 1 0x101 DT 1 01",
    ]);

    let config = DecoderConfig::new().with_message_filter(vec![0x101]);
    let frames = Decoder::read_frames(&dir.path().join("drive.log"), &config).unwrap();
    assert_eq!(frames.len(), 1);
    assert_eq!(frames[0].can_id, 0x101);
}

#[test]
fn decoding_is_shareable_across_threads() {
    let (_dir, decoder) = setup(&[]);
    let payloads: Vec<Vec<u8>> = (0u8..8).map(|i| vec![i % 2, 0xE8, 0x03]).collect();

    let decoder = &decoder;
    std::thread::scope(|scope| {
        let handles: Vec<_> = payloads
            .iter()
            .map(|payload| scope.spawn(move || decoder.decode(0x101, payload, ()).unwrap()))
            .collect();
        for (i, handle) in handles.into_iter().enumerate() {
            let frame = handle.join().unwrap();
            let expected = if i % 2 == 0 { "Cell0" } else { "Cell1" };
            assert!((frame.signal(expected).unwrap() - 1.0).abs() < 1e-9);
        }
    });
}
