use serde::{Deserialize, Serialize};

/// A page of results returned from the search and list endpoints. Pages are numbered from 1.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page<T> {
    page: u32,
    results: Vec<T>,
    total_pages: u32,
    total_results: u32,
}

impl<T> Page<T> {
    pub fn page(&self) -> u32 {
        self.page
    }

    pub fn results(&self) -> &[T] {
        &self.results
    }

    /// Return the results in this page while consuming the page.
    pub fn take_results(self) -> Vec<T> {
        self.results
    }

    pub fn total_pages(&self) -> u32 {
        self.total_pages
    }

    pub fn total_results(&self) -> u32 {
        self.total_results
    }

    /// Returns the number of the page after this one, if there is one. Pass it to the request builder's `page`-function
    /// to fetch it.
    pub fn next_page(&self) -> Option<u32> {
        (self.page < self.total_pages).then(|| self.page + 1)
    }
}
