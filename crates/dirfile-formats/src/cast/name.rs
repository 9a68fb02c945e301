//! Member name recovery from cast member info blocks

use crate::reader::{ByteReader, Endianness};

/// Smallest info block carrying an item table
const MIN_TABLE_SIZE: usize = 10;

/// Item of the info table holding the member name
const NAME_ITEM: usize = 1;

/// Printable ASCII range accepted by the fallback scan
const PRINTABLE: std::ops::RangeInclusive<u8> = 0x20..=0x7E;

/// Extract a member name from a cast member info block
///
/// The block starts with a big-endian item table (`u32` header, `u16`
/// count, `u32` items length, `count` item offsets) followed by the items;
/// the name is item 1 as a length-prefixed string. When the table is
/// missing or inconsistent the first printable length-prefixed run in the
/// block is used instead. Returns an empty string when neither yields a
/// name.
pub fn extract_member_name(info: &[u8]) -> String {
    structured_name(info)
        .filter(|name| !name.is_empty())
        .unwrap_or_else(|| scan_pascal_string(info))
}

fn structured_name(info: &[u8]) -> Option<String> {
    if info.len() < MIN_TABLE_SIZE {
        return None;
    }

    let mut reader = ByteReader::new(info, Endianness::Big);
    reader.read_u32().ok()?;
    let count = reader.read_u16().ok()? as usize;
    let items_length = reader.read_u32().ok()? as usize;
    if count <= NAME_ITEM {
        return None;
    }

    let mut offsets = Vec::with_capacity(count);
    for _ in 0..count {
        offsets.push(reader.read_u32().ok()? as usize);
    }

    let items = &info[reader.position()..];
    let limit = items_length.min(items.len());
    if limit == 0 {
        return None;
    }

    let start = offsets[NAME_ITEM].min(limit);
    let end = offsets
        .get(NAME_ITEM + 1)
        .copied()
        .unwrap_or(items_length)
        .min(limit);
    if end <= start {
        return None;
    }

    read_bounded_pascal(&items[start..end])
}

/// Length-prefixed string that must fit inside `item`
fn read_bounded_pascal(item: &[u8]) -> Option<String> {
    let (&len, rest) = item.split_first()?;
    let len = len as usize;
    if len == 0 || len > rest.len() {
        return None;
    }
    Some(String::from_utf8_lossy(&rest[..len]).into_owned())
}

/// First length-prefixed run of printable ASCII in `data`
pub fn scan_pascal_string(data: &[u8]) -> String {
    (0..data.len())
        .find_map(|i| {
            let len = data[i] as usize;
            let text = data.get(i + 1..i + 1 + len)?;
            (len > 0 && text.iter().all(|b| PRINTABLE.contains(b)))
                .then(|| String::from_utf8_lossy(text).into_owned())
        })
        .unwrap_or_default()
}
