#![no_main]
use libfuzzer_sys::fuzz_target;
use mpadec::sync::{SourceFrame, SourceReader, SyncOptions};

fuzz_target!(|data: Vec<u8>| {
    let opts = SyncOptions { max_garbage_len: 512 };
    let mut reader = SourceReader::with_options(std::io::Cursor::new(&data), "fuzz", opts);

    let mut pos = 0;

    while let Ok(Some(item)) = reader.next_frame() {
        assert_eq!(item.pos(), pos as u64);
        assert_eq!(item.data(), &data[pos..pos + item.data().len()]);

        if let SourceFrame::Invalid(garbage) = &item {
            assert!(garbage.data.len() <= 512);
        }

        pos += item.data().len();
    }

    assert_eq!(pos, data.len());
});
