//! Contact list query state: view preset, search text, page and page size.

use crate::model::{ContactStatus, ContactType};

pub const PAGE_SIZES: [u32; 4] = [25, 50, 100, 200];

/// Parameters of `GET /api/contacts`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ContactQuery {
    pub search: Option<String>,
    pub status: Option<ContactStatus>,
    pub contact_type: Option<ContactType>,
    pub page: u32,
    pub limit: u32,
}

impl ContactQuery {
    pub fn params(&self) -> Vec<(&'static str, String)> {
        let mut params = Vec::new();
        if let Some(search) = &self.search {
            params.push(("search", search.clone()));
        }
        if let Some(status) = self.status {
            params.push(("status", status.wire().to_string()));
        }
        if let Some(contact_type) = self.contact_type {
            params.push(("contactType", contact_type.wire().to_string()));
        }
        params.push(("page", self.page.to_string()));
        params.push(("limit", self.limit.to_string()));
        params
    }
}

/// Saved filters offered as tabs above the table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ViewPreset {
    All,
    Leads,
    Buyers,
    Sellers,
    PastClients,
    New,
    Qualified,
    Won,
}

impl ViewPreset {
    pub const ALL: [ViewPreset; 8] = [
        ViewPreset::All,
        ViewPreset::Leads,
        ViewPreset::Buyers,
        ViewPreset::Sellers,
        ViewPreset::PastClients,
        ViewPreset::New,
        ViewPreset::Qualified,
        ViewPreset::Won,
    ];

    pub fn title(self) -> &'static str {
        match self {
            ViewPreset::All => "ALL",
            ViewPreset::Leads => "LEADS",
            ViewPreset::Buyers => "BUYERS",
            ViewPreset::Sellers => "SELLERS",
            ViewPreset::PastClients => "PAST CLIENTS",
            ViewPreset::New => "NEW",
            ViewPreset::Qualified => "QUALIFIED",
            ViewPreset::Won => "WON",
        }
    }

    pub fn parse(input: &str) -> Option<Self> {
        let folded = input.trim().to_ascii_uppercase().replace(['_', '-'], " ");
        Self::ALL.iter().copied().find(|p| p.title() == folded)
    }

    pub fn filters(self) -> (Option<ContactStatus>, Option<ContactType>) {
        match self {
            ViewPreset::All => (None, None),
            ViewPreset::Leads => (None, Some(ContactType::Lead)),
            ViewPreset::Buyers => (None, Some(ContactType::Buyer)),
            ViewPreset::Sellers => (None, Some(ContactType::Seller)),
            ViewPreset::PastClients => (None, Some(ContactType::PastClient)),
            ViewPreset::New => (Some(ContactStatus::New), None),
            ViewPreset::Qualified => (Some(ContactStatus::Qualified), None),
            ViewPreset::Won => (Some(ContactStatus::ClosedWon), None),
        }
    }

    pub fn cycle(self, delta: isize) -> Self {
        let len = Self::ALL.len() as isize;
        let index = Self::ALL.iter().position(|p| *p == self).unwrap_or(0) as isize;
        Self::ALL[((index + delta) % len + len) as usize % Self::ALL.len()]
    }
}

/// An entry of the compact page-number strip.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageLink {
    Page(u32),
    Gap,
}

/// First, last, and `window` pages either side of `current`, with gaps
/// collapsed into [`PageLink::Gap`].
pub fn page_strip(current: u32, total_pages: u32, window: u32) -> Vec<PageLink> {
    if total_pages == 0 {
        return Vec::new();
    }
    let current = current.clamp(1, total_pages);
    let start = current.saturating_sub(window).max(1);
    let end = (current + window).min(total_pages);

    let mut strip = Vec::new();
    if start > 1 {
        strip.push(PageLink::Page(1));
        if start > 2 {
            strip.push(PageLink::Gap);
        }
    }
    for page in start..=end {
        strip.push(PageLink::Page(page));
    }
    if end < total_pages {
        if end + 1 < total_pages {
            strip.push(PageLink::Gap);
        }
        strip.push(PageLink::Page(total_pages));
    }
    strip
}

/// Maps UI filter/search/page state to one server query.
#[derive(Debug, Clone)]
pub struct PageController {
    preset: ViewPreset,
    search: String,
    page: u32,
    page_size: u32,
    total: u64,
    total_pages: u32,
}

impl PageController {
    pub fn new(page_size: u32) -> Self {
        Self {
            preset: ViewPreset::All,
            search: String::new(),
            page: 1,
            page_size: page_size.max(1),
            total: 0,
            total_pages: 0,
        }
    }

    pub fn query(&self) -> ContactQuery {
        let (status, contact_type) = self.preset.filters();
        ContactQuery {
            search: if self.search.is_empty() {
                None
            } else {
                Some(self.search.clone())
            },
            status,
            contact_type,
            page: self.page,
            limit: self.page_size,
        }
    }

    pub fn preset(&self) -> ViewPreset {
        self.preset
    }

    pub fn search(&self) -> &str {
        &self.search
    }

    pub fn page(&self) -> u32 {
        self.page
    }

    pub fn page_size(&self) -> u32 {
        self.page_size
    }

    pub fn total(&self) -> u64 {
        self.total
    }

    pub fn total_pages(&self) -> u32 {
        self.total_pages
    }

    /// Returns true when the query changed.
    pub fn set_preset(&mut self, preset: ViewPreset) -> bool {
        if self.preset == preset {
            return false;
        }
        self.preset = preset;
        self.page = 1;
        true
    }

    pub fn set_search(&mut self, search: &str) -> bool {
        let search = search.trim();
        if self.search == search {
            return false;
        }
        self.search = search.to_string();
        self.page = 1;
        true
    }

    pub fn set_page_size(&mut self, page_size: u32) -> bool {
        let page_size = page_size.max(1);
        if self.page_size == page_size {
            return false;
        }
        self.page_size = page_size;
        self.page = 1;
        true
    }

    /// Step through [`PAGE_SIZES`]; a custom size snaps to the nearest entry.
    pub fn cycle_page_size(&mut self, delta: isize) -> bool {
        let index = PAGE_SIZES
            .iter()
            .position(|s| *s >= self.page_size)
            .unwrap_or(PAGE_SIZES.len() - 1) as isize;
        let next = (index + delta).clamp(0, PAGE_SIZES.len() as isize - 1) as usize;
        self.set_page_size(PAGE_SIZES[next])
    }

    pub fn has_prev(&self) -> bool {
        self.page > 1
    }

    pub fn has_next(&self) -> bool {
        self.page < self.total_pages
    }

    pub fn next_page(&mut self) -> bool {
        if !self.has_next() {
            return false;
        }
        self.page += 1;
        true
    }

    pub fn prev_page(&mut self) -> bool {
        if !self.has_prev() {
            return false;
        }
        self.page -= 1;
        true
    }

    pub fn first_page(&mut self) -> bool {
        self.go_to(1)
    }

    pub fn last_page(&mut self) -> bool {
        self.go_to(self.total_pages.max(1))
    }

    pub fn go_to(&mut self, page: u32) -> bool {
        let page = page.clamp(1, self.total_pages.max(1));
        if page == self.page {
            return false;
        }
        self.page = page;
        true
    }

    /// Record the server's counts. Returns true when the current page fell
    /// off the end (rows were deleted elsewhere) and was pulled back, so the
    /// caller should query again.
    pub fn apply_counts(&mut self, total: u64, total_pages: u32) -> bool {
        self.total = total;
        self.total_pages = total_pages;
        if total_pages > 0 && self.page > total_pages {
            self.page = total_pages;
            return true;
        }
        false
    }

    pub fn strip(&self) -> Vec<PageLink> {
        page_strip(self.page, self.total_pages, 1)
    }
}
