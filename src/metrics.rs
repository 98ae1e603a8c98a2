#[derive(Debug, Clone, Default, PartialEq)]
pub struct PageMetrics {
    pub page_number: usize,
    pub command_count: usize,
    pub block_count: usize,
    pub table_rows: usize,
    pub content_bytes: usize,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct DocumentMetrics {
    pub pages: Vec<PageMetrics>,
    pub layout_ms: f64,
    pub total_bytes: usize,
}

impl DocumentMetrics {
    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    /// Body rows placed across all pages; repeated header rows are not counted.
    pub fn table_rows(&self) -> usize {
        self.pages.iter().map(|page| page.table_rows).sum()
    }
}
