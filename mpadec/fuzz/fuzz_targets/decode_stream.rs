#![no_main]
use libfuzzer_sys::fuzz_target;
use mpadec::{Error, Mp3Decoder, SourceReader};

fuzz_target!(|data: Vec<u8>| {
    let mut decoder = Mp3Decoder::new(Default::default());

    if decoder.begin_decode(SourceReader::new(std::io::Cursor::new(data), "fuzz")).is_err() {
        return;
    }

    loop {
        match decoder.decode() {
            Ok(Some(unit)) => {
                assert_eq!(unit.samples.len() as u64, unit.dur * unit.channel_count as u64);
            }
            Ok(None) => break,
            Err(Error::DecodeError(_)) => (),
            Err(_) => break,
        }
    }
});
