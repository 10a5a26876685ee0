use std::path::PathBuf;

use sipimport::{
    load, load_sip256, Dialect, ElectrodePair, LoadOptions, PhaseConvention, SipError,
};
use tempfile::TempDir;

fn write(dir: &TempDir, name: &str, contents: &[u8]) -> PathBuf {
    let path = dir.path().join(name);
    std::fs::write(&path, contents).unwrap();
    path
}

const SWEEP: &str = "1000.00000000 0.4609 -6.72598 0.02234 0.01280 c 20.067 1.00 0 11:08:02 21/02/2019";

fn fuchs3_file() -> String {
    let mut text = String::from(
        "SIP Fuchs III  Version 3.2\n\
         [Number of Frequencies] 4\n\
         [Geometric Factor] 12.5\n\
         [Begin Sequence]\n\
         1 2 3 4\n\
         [End Sequence]\n\
         No Date Time U/V I/mA Current R/Ohm K Freq Amp Phase\n",
    );
    for (i, (f, amp, ph)) in [(1000.0, 10.0, 1.5), (100.0, 11.0, 2.5), (10.0, 12.0, 3.5)]
        .iter()
        .enumerate()
    {
        text.push_str(&format!(
            "{i} 01.01.2020 10:00:00 0.1 0.2 0.3 0.4 0.5 0.6 2.0 0.7 {f} {amp} {ph}\n"
        ));
    }
    text.push('\n');
    text
}

#[test]
fn txt_spectrum_negates_phase() {
    let dir = tempfile::tempdir().unwrap();
    let path = write(&dir, "sweep.txt", b"header\n1.0 2.0 x 3.0\n2.0 4.0 x -1.0\n");

    let loaded = load(&path, &LoadOptions::default()).unwrap();
    assert_eq!(loaded.dialect, Dialect::DelimitedText);
    assert_eq!(loaded.record.frequency(), &[1.0, 2.0]);
    assert_eq!(loaded.record.amplitude(), &[2.0, 4.0]);
    assert_eq!(loaded.record.phase(), &[-3.0, 1.0]);
}

#[test]
fn fuchs3_columns_have_equal_length() {
    let dir = tempfile::tempdir().unwrap();
    let path = write(&dir, "fuchs.res", fuchs3_file().as_bytes());

    let loaded = load(&path, &LoadOptions::default()).unwrap();
    let rec = &loaded.record;
    assert_eq!(loaded.dialect, Dialect::FuchsIII);
    assert_eq!(rec.len(), 3);
    assert_eq!(rec.frequency().len(), rec.amplitude().len());
    assert_eq!(rec.amplitude().len(), rec.phase().len());
    assert_eq!(rec.frequency(), &[1000.0, 100.0, 10.0]);
    assert_eq!(rec.amplitude(), &[5.0, 5.5, 6.0]);
    assert_eq!(rec.convention(), PhaseConvention::Normalized);
    assert!((rec.phase()[0] + 1.5_f64.to_radians()).abs() < 1e-12);
    assert_eq!(loaded.header["Geometric_Factor"].as_f64(), Some(12.5));
}

#[test]
fn parsing_twice_is_identical() {
    let dir = tempfile::tempdir().unwrap();
    let path = write(&dir, "fuchs.res", fuchs3_file().as_bytes());
    let opts = LoadOptions::default();

    let a = load(&path, &opts).unwrap();
    let b = load(&path, &opts).unwrap();
    let bits = |v: &[f64]| v.iter().map(|x| x.to_bits()).collect::<Vec<_>>();
    assert_eq!(bits(a.record.phase()), bits(b.record.phase()));
    assert_eq!(a, b);
}

#[test]
fn quad_first_line_uses_fuchs3_reader() {
    let dir = tempfile::tempdir().unwrap();
    let text = fuchs3_file().replacen("SIP Fuchs III", "SIP-Quad", 1);
    let path = write(&dir, "quad.dat", text.as_bytes());

    let loaded = load(&path, &LoadOptions::default()).unwrap();
    assert_eq!(loaded.dialect, Dialect::SipQuad);
    assert_eq!(loaded.record.len(), 3);
}

#[test]
fn unknown_file_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let path = write(&dir, "data.bin", b"\x00\x01 binary junk\n");
    let err = load(&path, &LoadOptions::default()).unwrap_err();
    assert!(matches!(err, SipError::UnsupportedFormat { .. }));
}

#[test]
fn latin9_bytes_do_not_fail() {
    let dir = tempfile::tempdir().unwrap();
    let path = write(
        &dir,
        "radic.res",
        b"SIP-Fuchs Software rev.: 070903 \xB0\xA4\nFreq/Hz\tRho\tPhi/\xB0\tdRho\tdPhi\n1\t2\t3\t4\t5\n10\t20\t30\t40\t50\n",
    );
    let loaded = load(&path, &LoadOptions::default()).unwrap();
    assert_eq!(loaded.dialect, Dialect::SipFuchs);
    assert_eq!(loaded.record.frequency(), &[10.0]);
}

#[test]
fn sip256_marker_attribution() {
    let dir = tempfile::tempdir().unwrap();
    let text = format!(
        "[Begin Layout]\n1 0\n[End Layout]\n\
         [Messdaten SIP256]\n\
         Reading 1\n\
         Remote Unit 3\n\
         Frequency /Hz  RA/Ohmm\n\
         {SWEEP}\n\
         Reading 2 / 0.300 5 / 7\n\
         {SWEEP}\n"
    );
    let path = write(&dir, "survey.res", text.as_bytes());

    let log = load_sip256(&path, &LoadOptions::default()).unwrap();
    assert_eq!(log.electrode_pairs(), vec![ElectrodePair { a: 5, b: 7 }]);
    assert_eq!(log.readings[1].electrodes, Some(ElectrodePair { a: 5, b: 7 }));
    assert_eq!(log.readings[0].electrodes, None);
    assert_eq!(log.remote_unit_ids(), vec![vec![3], vec![]]);
    assert_eq!(log.readings[0].remote_units[0].rows.len(), 1);
}

#[test]
fn sip256_truncated_sweep_is_kept() {
    let dir = tempfile::tempdir().unwrap();
    let text = format!(
        "[Messdaten SIP256]\nReading 1 / 0.3 1 / 2\nRemote Unit 1\n{SWEEP}\n{SWEEP}\n{SWEEP}"
    );
    let path = write(&dir, "cut.res", text.as_bytes());

    let log = load_sip256(&path, &LoadOptions::default()).unwrap();
    assert_eq!(log.readings.len(), 1);
    assert_eq!(log.readings[0].remote_units[0].rows.len(), 3);
    let matrices = log.matrices();
    assert_eq!(matrices[0][0].len(), 3);
    assert_eq!(matrices[0][0][2][0], 1000.0);
}

#[test]
fn sip256_repairs_glued_columns() {
    let dir = tempfile::tempdir().unwrap();
    let glued = "1000.00000000 0.4609-6.72598 0.02234 0.01280 nc 20.067 1.00 0 11:08:02 21/02/2019";
    let text = format!("[Messdaten SIP256D]\nReading 1 / 0.3 1 / 2\n{glued}\n");
    let path = write(&dir, "glued.res", text.as_bytes());

    let log = load_sip256(&path, &LoadOptions::default()).unwrap();
    let row = &log.readings[0].remote_units[0].rows[0];
    assert_eq!(row.resistance, 0.4609);
    assert_eq!(row.phase, -6.72598);
    assert_eq!(row.calibrated, 0.0);
    assert!(log.diagnostics.is_empty());
}
