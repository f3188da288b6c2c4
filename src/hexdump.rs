//! Hex dump formatting for memory read back from the target.

// Copyright (C) 2025 Piers Finlayson <piers@piers.rocks>
//
// MIT License

use alloc::string::String;
use core::fmt::Write;

const BYTES_PER_ROW: usize = 16;

const HEADER: &str = " -------- -------- -------- -------- --------  ----------------";

/// Format `data`, read from `addr`, as a hex dump.
///
/// Rows cover 16-byte aligned blocks of the address space, so data that does
/// not start on a 16 byte boundary is indented on the first row.  Each row is
/// the row address, four groups of four bytes, and the printable ASCII.
pub fn hexdump(data: &[u8], addr: u32) -> String {
    let mut out = String::new();
    out.push_str(HEADER);
    out.push('\n');

    let mut row_addr = addr & !0xF;
    let mut lead = (addr & 0xF) as usize;
    let mut rest = data;

    while !rest.is_empty() {
        let take = rest.len().min(BYTES_PER_ROW - lead);
        let (row, tail) = rest.split_at(take);

        // Writing to a String cannot fail.
        let _ = write!(out, " {row_addr:08x} ");
        for col in 0..BYTES_PER_ROW {
            match col.checked_sub(lead).and_then(|i| row.get(i)) {
                Some(byte) => {
                    let _ = write!(out, "{byte:02x}");
                }
                None => out.push_str("  "),
            }
            if col % 4 == 3 {
                out.push(' ');
            }
        }

        out.push(' ');
        out.extend(core::iter::repeat_n(' ', lead));
        out.extend(row.iter().map(|&b| printable(b)));
        out.push('\n');

        row_addr = row_addr.wrapping_add(BYTES_PER_ROW as u32);
        lead = 0;
        rest = tail;
    }

    out
}

fn printable(byte: u8) -> char {
    if (0x20..0x7F).contains(&byte) {
        byte as char
    } else {
        '.'
    }
}
