//! Allocation behaviour of compiled mappings
//!
//! A counting global allocator tracks allocations made by the current test
//! thread, so nested record reads can be shown not to copy whole records.
//!
//! Copyright (c) 2025 Labyrinth Team
//! Licensed under the Apache-2.0 license


use labyrinth_core::{Mapper, SealedMapper};
use std::alloc::{GlobalAlloc, Layout, System};
use std::cell::Cell;
use test_support::*;

struct CountingAllocator;

thread_local! {
    static ALLOCATIONS: Cell<usize> = const { Cell::new(0) };
}

unsafe impl GlobalAlloc for CountingAllocator {
    unsafe fn alloc(&self, layout: Layout) -> *mut u8 {
        let _ = ALLOCATIONS.try_with(|count| count.set(count.get() + 1));
        System.alloc(layout)
    }

    unsafe fn dealloc(&self, ptr: *mut u8, layout: Layout) {
        System.dealloc(ptr, layout)
    }
}

#[global_allocator]
static GLOBAL: CountingAllocator = CountingAllocator;

fn allocations_during<R>(f: impl FnOnce() -> R) -> (R, usize) {
    let before = ALLOCATIONS.with(Cell::get);
    let result = f();
    let after = ALLOCATIONS.with(Cell::get);
    (result, after - before)
}

fn large_source() -> PatchCardCommandParameters {
    let comment = "c".repeat(10 * 1024);
    let mut source = minimal_params(1, 10, Some(comment.as_str()));
    source.data.content = Some("x".repeat(10 * 1024));
    source
}

fn nested_title_mapper() -> SealedMapper {
    let mut mapper = Mapper::new();
    mapper
        .configure::<PatchCardCommand, PatchCardCommandParameters>(|m| {
            m.map_property(params(|p| p.field("data").field("title")), command_field("title"))?;
            Ok(())
        })
        .unwrap();
    mapper.seal()
}

#[test]
fn test_nested_member_read_copies_only_the_leaf() {
    let mapper = nested_title_mapper();
    let mut source = large_source();

    let (command, count) = allocations_during(|| {
        mapper
            .map::<PatchCardCommand, PatchCardCommandParameters>(&source)
            .unwrap()
    });
    assert_eq!(command.title(), None);
    assert_eq!(count, 0, "absent nested value must not allocate");

    source.data.title = Some("title".to_string());
    let (command, count) = allocations_during(|| {
        mapper
            .map::<PatchCardCommand, PatchCardCommandParameters>(&source)
            .unwrap()
    });
    assert_eq!(command.title(), Some("title"));
    assert_eq!(count, 1, "only the copied title may allocate");
}

#[test]
fn test_nested_auto_map_borrows_the_intermediate() {
    let mut mapper = Mapper::new();
    mapper
        .configure::<PatchCardCommand, PatchCardCommandParameters>(|m| {
            m.auto_map(params(|p| p.field("data")))?;
            Ok(())
        })
        .unwrap();
    let mapper = mapper.seal();

    let mut source = large_source();
    source.data.content = None;

    let (command, count) = allocations_during(|| {
        mapper
            .map::<PatchCardCommand, PatchCardCommandParameters>(&source)
            .unwrap()
    });
    assert_eq!(command.content(), None);
    assert_eq!(count, 0);
}
