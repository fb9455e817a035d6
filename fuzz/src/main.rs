//! AFL fuzz target for the wire frame parser.
//!
//! Reads test cases from standard input and feeds them to
//! [`ngenius_ped::frame::parse`] in a loop compatible with AFL's persistent
//! mode. The parser never raises — it always returns a frame, falling back
//! to `{parseError, raw}` on unrecognised input — so this target exists to
//! catch panics (string-slicing on a bad byte boundary, integer overflow) on
//! adversarial or truncated replies rather than to find rejected inputs.
unsafe extern "C" {
    fn __AFL_LOOP(cnt: u32) -> i32;
}
use std::io::{self, Read};

/// A PED reply is bounded at 16 KiB (spec.md §6); cap the fuzz input to the
/// same size so persistent mode doesn't grow unboundedly.
const MAX_REPLY_SIZE: usize = 16 * 1024;

fn main() {
    let mut data = Vec::with_capacity(MAX_REPLY_SIZE);
    loop {
        if unsafe { __AFL_LOOP(1000) } == 0 {
            break;
        }
        data.clear();
        if io::stdin().take(MAX_REPLY_SIZE as u64).read_to_end(&mut data).is_err() {
            return;
        }

        let raw = String::from_utf8_lossy(&data);
        let _frame = ngenius_ped::frame::parse(&raw);
    }
}
