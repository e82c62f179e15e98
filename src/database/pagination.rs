use serde::{Deserialize, Serialize};

use crate::constants::{MAX_PAGE_SIZE, RECIPE_COUNT_PER_PAGE};

#[derive(Serialize, Deserialize, Debug)]
pub struct PageContext<T> {
    pub rows: Vec<T>,
    pub total_rows: i64,
    pub next_offset: i64,
    pub prev_offset: i64,
    pub page_list: Vec<(String, i64)>,
    pub message: Option<String>,
}

impl<T> PageContext<T> {
    pub fn from_rows(rows: Vec<T>, total_rows: i64, page_size: i64, current_offset: i64) -> Self {
        if rows.is_empty() {
            return Self::no_rows();
        }

        let last_offset = ((total_rows - 1) / page_size) * page_size;
        let next_offset = (current_offset + page_size).min(last_offset);
        let prev_offset = (current_offset - page_size).max(0);

        let page_count = (total_rows + page_size - 1) / page_size;
        let page_list = (0..page_count)
            .map(|n| {
                let offset = n * page_size;
                let page = if offset == current_offset {
                    String::from("...")
                } else {
                    format!("{}", n + 1)
                };

                (page, offset)
            })
            .collect();

        Self {
            rows,
            total_rows,
            next_offset,
            prev_offset,
            page_list,
            message: Some(format!(
                "{} - {} / {}",
                current_offset,
                (current_offset + page_size).min(total_rows),
                total_rows
            )),
        }
    }

    pub fn no_rows() -> Self {
        Self {
            rows: vec![],
            total_rows: 0,
            next_offset: 0,
            prev_offset: 0,
            page_list: vec![(String::from("1"), 0)],
            message: Some(String::from("No results")),
        }
    }
}

/// Page size is configuration, not caller input: absent falls back to the
/// default, oversized clamps to the maximum.
pub fn clamp_page_size(requested: Option<i64>) -> i64 {
    requested
        .unwrap_or(RECIPE_COUNT_PER_PAGE)
        .clamp(1, MAX_PAGE_SIZE)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_rows_yield_the_empty_page() {
        let page = PageContext::<i64>::from_rows(vec![], 0, 10, 0);
        assert_eq!(page.total_rows, 0);
        assert_eq!(page.page_list, vec![(String::from("1"), 0)]);
    }

    #[test]
    fn offsets_advance_and_saturate() {
        // 25 rows, 10 per page, on the first page.
        let page = PageContext::from_rows(vec![1; 10], 25, 10, 0);
        assert_eq!(page.next_offset, 10);
        assert_eq!(page.prev_offset, 0);
        assert_eq!(page.page_list.len(), 3);

        // Last page: next stays put.
        let page = PageContext::from_rows(vec![1; 5], 25, 10, 20);
        assert_eq!(page.next_offset, 20);
        assert_eq!(page.prev_offset, 10);
    }

    #[test]
    fn current_page_is_marked_in_the_page_list() {
        let page = PageContext::from_rows(vec![1; 10], 25, 10, 10);
        assert_eq!(page.page_list[0], (String::from("1"), 0));
        assert_eq!(page.page_list[1], (String::from("..."), 10));
        assert_eq!(page.page_list[2], (String::from("3"), 20));
    }

    #[test]
    fn page_size_falls_back_and_clamps() {
        assert_eq!(clamp_page_size(None), RECIPE_COUNT_PER_PAGE);
        assert_eq!(clamp_page_size(Some(25)), 25);
        assert_eq!(clamp_page_size(Some(500)), MAX_PAGE_SIZE);
        assert_eq!(clamp_page_size(Some(0)), 1);
    }
}
