//! Cast library decoding over both storage layouts
#![allow(clippy::expect_used, clippy::unwrap_used, clippy::panic)]

mod common;

use common::{MovieBuilder, cast_member, cast_table, key_table};
use dirfile_archive::{Archive, ArchiveError, Endianness, MemberType};
use pretty_assertions::assert_eq;

/// Ids of the fixture resources
struct Layout {
    config: u32,
    table: u32,
    bitmap: u32,
    script: u32,
    truncated: u32,
}

/// Movie with one cast library of six slots, four of them populated
///
/// Slot 4 points at a resource that does not exist.
fn library(endian: Endianness) -> (MovieBuilder, Layout) {
    let mut builder = MovieBuilder::new();
    let first = builder.next_id();
    let layout = Layout {
        config: first,
        table: first + 1,
        bitmap: first + 2,
        script: first + 3,
        truncated: first + 4,
    };

    builder.add(b"VWCF", b"movie config".to_vec());
    builder.add(
        b"CAS*",
        cast_table(&[0, layout.bitmap, layout.script, 0, 999, layout.truncated]),
    );
    builder.add(b"CASt", cast_member(1, "Logo"));
    builder.add(b"CASt", cast_member(11, "startMovie"));
    builder.add(b"CASt", vec![0, 0, 0, 1, 0]);
    builder.add(
        b"KEY*",
        key_table(
            &[
                (layout.table, layout.config, b"CAS*"),
                (layout.bitmap, layout.table, b"CASt"),
                (layout.script, layout.table, b"CASt"),
            ],
            endian,
        ),
    );
    (builder, layout)
}

fn check_library(archive: &Archive, layout: &Layout) {
    let cast = archive.cast_library(layout.table).unwrap();
    assert_eq!(cast.resource_id, layout.table);
    assert_eq!(cast.parent_id, Some(layout.config));
    assert_eq!(cast.entry_count, 6);

    let slots: Vec<_> = cast
        .members
        .iter()
        .map(|m| (m.slot_index, m.resource_id))
        .collect();
    assert_eq!(
        slots,
        vec![
            (1, layout.bitmap),
            (2, layout.script),
            (4, 999),
            (5, layout.truncated)
        ]
    );

    let logo = cast.member_at(1).unwrap();
    assert_eq!(logo.member_type, MemberType::Bitmap);
    assert_eq!(logo.name, "Logo");

    let script = cast.member_named("startMovie").unwrap();
    assert_eq!(script.slot_index, 2);
    assert_eq!(script.member_type, MemberType::Script);

    for slot in [4, 5] {
        let member = cast.member_at(slot).unwrap();
        assert_eq!(member.member_type, MemberType::Unknown);
        assert_eq!(member.name, "");
    }
    assert!(cast.member_at(0).is_none());
}

#[test]
fn test_classic_big_endian_library() {
    common::init_tracing();
    let (builder, layout) = library(Endianness::Big);
    let archive = Archive::open(builder.build_classic(Endianness::Big)).unwrap();
    check_library(&archive, &layout);
}

#[test]
fn test_classic_little_endian_library() {
    let (builder, layout) = library(Endianness::Little);
    let archive = Archive::open(builder.build_classic(Endianness::Little)).unwrap();
    check_library(&archive, &layout);
}

#[test]
fn test_afterburner_library() {
    let (builder, layout) = library(Endianness::Little);
    let archive = Archive::open(builder.build_afterburner(Endianness::Little)).unwrap();
    check_library(&archive, &layout);
}

#[test]
fn test_cast_libraries_in_directory_order() {
    let (mut builder, layout) = library(Endianness::Big);
    let empty = builder.add(b"CAS*", Vec::new());
    let archive = Archive::open(builder.build_classic(Endianness::Big)).unwrap();

    let libraries: Vec<_> = archive
        .cast_libraries()
        .into_iter()
        .map(Result::unwrap)
        .collect();
    assert_eq!(libraries.len(), 2);
    assert_eq!(libraries[0].resource_id, layout.table);
    assert_eq!(libraries[0].members.len(), 4);

    assert_eq!(libraries[1].resource_id, empty);
    assert_eq!(libraries[1].entry_count, 0);
    assert!(libraries[1].members.is_empty());
    assert_eq!(libraries[1].parent_id, None);
}

#[test]
fn test_unknown_library_id() {
    let (builder, _) = library(Endianness::Big);
    let archive = Archive::open(builder.build_classic(Endianness::Big)).unwrap();
    assert!(matches!(
        archive.cast_library(4242),
        Err(ArchiveError::NotFound(4242))
    ));
}

#[test]
fn test_library_serializes() {
    let (builder, layout) = library(Endianness::Big);
    let archive = Archive::open(builder.build_afterburner(Endianness::Big)).unwrap();
    let cast = archive.cast_library(layout.table).unwrap();

    let json = serde_json::to_value(&cast).unwrap();
    assert_eq!(json["entry_count"], 6);
    assert_eq!(json["members"][0]["name"], "Logo");
    assert_eq!(json["members"][0]["slot_index"], 1);
}
