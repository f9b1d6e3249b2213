#![no_main]

use libfuzzer_sys::fuzz_target;
use tunebox::cursor::PlaybackCursor;

fuzz_target!(|data: &[u8]| {
    let mut cursor = PlaybackCursor::new();
    let mut len = 0usize;

    for byte in data {
        match byte % 5 {
            0 => {
                cursor.next(len);
            }
            1 => {
                cursor.previous(len);
            }
            2 => {
                cursor.select_index(usize::from(byte / 5), len);
            }
            3 => {
                len = (len + 1).min(64);
                cursor.resolve(len);
            }
            _ => {
                len = usize::from(byte / 5) % 8;
                cursor.resolve(len);
            }
        }

        match cursor.index() {
            Some(idx) => assert!(idx < len),
            None => assert_eq!(len, 0),
        }
    }
});
