//! State of one listing view: the active filters, the current page and the
//! properties loaded for it. A view owns its store; nothing is global.

use rentlens_protocol::listing::ListingQuery;
use rentlens_protocol::listing::Property;
use rentlens_protocol::listing::PropertyPage;

use crate::error::Result;
use crate::listings::ListingClient;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListingFilters {
    pub min_price: Option<u32>,
    pub max_price: Option<u32>,
    pub beds: Option<u32>,
    pub borough: Option<String>,
}

#[derive(Debug)]
pub struct ListingView {
    filters: ListingFilters,
    page_size: u32,
    /// Zero-based page index.
    page: u32,
    properties: Vec<Property>,
}

impl ListingView {
    pub fn new(page_size: u32) -> Self {
        Self {
            filters: ListingFilters::default(),
            page_size: page_size.max(1),
            page: 0,
            properties: Vec::new(),
        }
    }

    pub fn filters(&self) -> &ListingFilters {
        &self.filters
    }

    pub fn page(&self) -> u32 {
        self.page
    }

    pub fn properties(&self) -> &[Property] {
        &self.properties
    }

    /// Replace the filters. A new filter set always starts from the first
    /// page and drops the loaded properties.
    pub fn set_filters(&mut self, filters: ListingFilters) {
        if filters != self.filters {
            self.filters = filters;
            self.page = 0;
            self.properties.clear();
        }
    }

    pub fn go_to_page(&mut self, page: u32) {
        if page != self.page {
            self.page = page;
            self.properties.clear();
        }
    }

    /// A full page suggests there may be more.
    pub fn has_next_page(&self) -> bool {
        self.properties.len() as u32 >= self.page_size
    }

    pub fn next_page(&mut self) {
        self.go_to_page(self.page.saturating_add(1));
    }

    pub fn previous_page(&mut self) {
        self.go_to_page(self.page.saturating_sub(1));
    }

    pub fn query(&self) -> ListingQuery {
        ListingQuery {
            skip: self.page.saturating_mul(self.page_size),
            limit: self.page_size,
            min_price: self.filters.min_price,
            max_price: self.filters.max_price,
            beds: self.filters.beds,
            borough: self.filters.borough.clone(),
        }
    }

    pub fn apply_page(&mut self, page: PropertyPage) {
        self.properties = page.properties;
    }

    /// Fetch the current page through `client` and store it.
    pub async fn load(&mut self, client: &ListingClient) -> Result<&[Property]> {
        let page = client.list(&self.query()).await?;
        self.apply_page(page);
        Ok(&self.properties)
    }
}
