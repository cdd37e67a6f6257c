//! Per-kind pagination state. Pure state updates; refetching is the caller's job.

use crate::schema::EntityKind;
use serde::Serialize;
use std::collections::HashMap;

pub const DEFAULT_PAGE_SIZE: u32 = 10;

/// Query parameters of one page request (`pageNumber`, `pageSize`).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PageRequest {
    pub page_number: u32,
    pub page_size: u32,
}

impl PageRequest {
    pub fn new(page_number: u32, page_size: u32) -> Self {
        Self {
            page_number: page_number.max(1),
            page_size: page_size.max(1),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PaginationState {
    pub current_page: u32,
    pub page_size: u32,
    pub total_count: u64,
}

impl Default for PaginationState {
    fn default() -> Self {
        Self {
            current_page: 1,
            page_size: DEFAULT_PAGE_SIZE,
            total_count: 0,
        }
    }
}

impl PaginationState {
    /// ceil(total_count / page_size), never below 1.
    pub fn total_pages(&self) -> u32 {
        let size = u64::from(self.page_size.max(1));
        let pages = self.total_count.div_ceil(size).max(1);
        u32::try_from(pages).unwrap_or(u32::MAX)
    }

    pub fn has_previous(&self) -> bool {
        self.current_page > 1
    }

    pub fn has_next(&self) -> bool {
        self.current_page < self.total_pages()
    }

    pub fn request(&self) -> PageRequest {
        PageRequest::new(self.current_page, self.page_size)
    }
}

/// Holds one `PaginationState` per kind, created on first touch with defaults.
#[derive(Clone, Debug, Default)]
pub struct PaginationController {
    states: HashMap<EntityKind, PaginationState>,
}

impl PaginationController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self, kind: EntityKind) -> PaginationState {
        self.states.get(&kind).copied().unwrap_or_default()
    }

    fn entry(&mut self, kind: EntityKind) -> &mut PaginationState {
        self.states.entry(kind).or_default()
    }

    /// Values below 1 are clamped to 1.
    pub fn set_current_page(&mut self, kind: EntityKind, page: u32) {
        self.entry(kind).current_page = page.max(1);
    }

    /// Values below 1 are clamped to 1.
    pub fn set_page_size(&mut self, kind: EntityKind, size: u32) {
        self.entry(kind).page_size = size.max(1);
    }

    pub fn set_total_count(&mut self, kind: EntityKind, total: u64) {
        self.entry(kind).total_count = total;
    }

    pub fn total_pages(&self, kind: EntityKind) -> u32 {
        self.state(kind).total_pages()
    }

    pub fn request(&self, kind: EntityKind) -> PageRequest {
        self.state(kind).request()
    }
}
