use serde::Serialize;

use crate::config::PaginationConfig;

/// Resolved pagination window, always 1-based and non-empty
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PageParams {
    pub page: u32,
    pub per_page: u32,
}

impl PageParams {
    /// Coerce raw `page` / `per_page` query values into a usable window.
    ///
    /// Values are read with leading-integer semantics, so `"12abc"` is 12 and
    /// `"abc"` is 0. A zero or negative page means the first page; a zero or
    /// negative `per_page` means the configured default. `per_page` is capped
    /// at the configured maximum.
    pub fn coerce(page: Option<&str>, per_page: Option<&str>, config: &PaginationConfig) -> Self {
        let page = page.map(leading_int).unwrap_or(0);
        let per_page = per_page.map(leading_int).unwrap_or(0);

        let page = if page < 1 { 1 } else { page.min(u32::MAX as i64) as u32 };
        let per_page = if per_page < 1 {
            config.default_per_page
        } else {
            per_page.min(u32::MAX as i64) as u32
        };
        let max = config.max_per_page.max(1);
        if per_page > max {
            tracing::debug!("per_page {} exceeds max {}, capping", per_page, max);
        }

        Self {
            page,
            per_page: per_page.min(max).max(1),
        }
    }

    pub fn offset(&self) -> u64 {
        (self.page as u64 - 1) * self.per_page as u64
    }

    pub fn limit(&self) -> u64 {
        self.per_page as u64
    }
}

/// One page of results plus the totals needed to render navigation
#[derive(Debug, Clone, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub page: u32,
    pub per_page: u32,
    pub total_count: u64,
    pub total_pages: u64,
}

impl<T> Page<T> {
    pub fn new(items: Vec<T>, params: PageParams, total_count: u64) -> Self {
        let per_page = params.per_page.max(1) as u64;
        Self {
            items,
            page: params.page,
            per_page: params.per_page,
            total_count,
            total_pages: total_count.div_ceil(per_page),
        }
    }
}

/// Parse the leading integer of a string; anything unparsable is 0
fn leading_int(raw: &str) -> i64 {
    let s = raw.trim_start();
    let (negative, digits) = match s.as_bytes().first() {
        Some(b'-') => (true, &s[1..]),
        Some(b'+') => (false, &s[1..]),
        _ => (false, s),
    };
    let end = digits
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(digits.len());
    // Saturate on overflow rather than wrapping back to zero.
    let value = digits[..end]
        .parse::<i64>()
        .unwrap_or(if end == 0 { 0 } else { i64::MAX });
    if negative { -value } else { value }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> PaginationConfig {
        PaginationConfig { default_per_page: 50, max_per_page: 200 }
    }

    #[test]
    fn leading_int_matches_lenient_parsing() {
        assert_eq!(leading_int("12"), 12);
        assert_eq!(leading_int("12abc"), 12);
        assert_eq!(leading_int("abc"), 0);
        assert_eq!(leading_int(""), 0);
        assert_eq!(leading_int("  -3"), -3);
        assert_eq!(leading_int("+4x"), 4);
        assert_eq!(leading_int("99999999999999999999999"), i64::MAX);
    }

    #[test]
    fn missing_values_fall_back_to_first_page_and_default_size() {
        let p = PageParams::coerce(None, None, &config());
        assert_eq!(p, PageParams { page: 1, per_page: 50 });
        assert_eq!(p.offset(), 0);
    }

    #[test]
    fn zero_and_garbage_values_fall_back() {
        let p = PageParams::coerce(Some("0"), Some("zero"), &config());
        assert_eq!(p, PageParams { page: 1, per_page: 50 });
        let p = PageParams::coerce(Some("-2"), Some("-10"), &config());
        assert_eq!(p, PageParams { page: 1, per_page: 50 });
    }

    #[test]
    fn explicit_values_are_kept_and_capped() {
        let p = PageParams::coerce(Some("3"), Some("20"), &config());
        assert_eq!(p, PageParams { page: 3, per_page: 20 });
        assert_eq!(p.offset(), 40);

        let p = PageParams::coerce(Some("1"), Some("5000"), &config());
        assert_eq!(p.per_page, 200);
    }

    #[test]
    fn page_totals_round_up() {
        let params = PageParams { page: 1, per_page: 20 };
        let page = Page::new(vec![1, 2, 3], params, 41);
        assert_eq!(page.total_pages, 3);
        let empty: Page<i32> = Page::new(vec![], params, 0);
        assert_eq!(empty.total_pages, 0);
    }
}
