use serde::Serialize;

pub const DEFAULT_PER_PAGE: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Paginator {
    per_page: usize,
}

/// The slice of an ordered result set that makes up one page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageWindow {
    pub number: usize,
    pub num_pages: usize,
    pub total: usize,
    pub offset: usize,
    pub limit: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub number: usize,
    pub num_pages: usize,
    pub total: usize,
    pub has_next: bool,
    pub has_previous: bool,
    pub next_page_number: Option<usize>,
    pub previous_page_number: Option<usize>,
}

impl Default for Paginator {
    fn default() -> Self {
        Self::new(DEFAULT_PER_PAGE)
    }
}

impl Paginator {
    pub fn new(per_page: usize) -> Self {
        Self {
            per_page: per_page.max(1),
        }
    }

    pub fn per_page(&self) -> usize {
        self.per_page
    }

    /// Resolves a raw `?page=` value against `total` items.
    ///
    /// Missing, non-numeric and non-positive values select the first page;
    /// values past the end select the last one. An empty set still has one page.
    pub fn window(&self, raw_page: Option<&str>, total: usize) -> PageWindow {
        let num_pages = total.div_ceil(self.per_page).max(1);
        let number = match raw_page.map(parse_page) {
            Some(Requested::Number(n)) => n.clamp(1, num_pages as i64) as usize,
            Some(Requested::PastEnd) => num_pages,
            Some(Requested::Invalid) | None => 1,
        };

        PageWindow {
            number,
            num_pages,
            total,
            offset: (number - 1) * self.per_page,
            limit: self.per_page,
        }
    }

    pub fn paginate<T>(&self, items: Vec<T>, raw_page: Option<&str>) -> Page<T> {
        let window = self.window(raw_page, items.len());
        let slice = items
            .into_iter()
            .skip(window.offset)
            .take(window.limit)
            .collect();
        Page::new(slice, window)
    }
}

enum Requested {
    Number(i64),
    PastEnd,
    Invalid,
}

fn parse_page(raw: &str) -> Requested {
    let raw = raw.trim();
    match raw.parse::<i64>() {
        Ok(n) => Requested::Number(n),
        Err(_) => {
            let (positive, digits) = match raw.strip_prefix('-') {
                Some(rest) => (false, rest),
                None => (true, raw.strip_prefix('+').unwrap_or(raw)),
            };
            if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
                Requested::Invalid
            } else if positive {
                Requested::PastEnd
            } else {
                Requested::Number(1)
            }
        }
    }
}

impl<T> Page<T> {
    pub fn new(items: Vec<T>, window: PageWindow) -> Self {
        let has_next = window.number < window.num_pages;
        let has_previous = window.number > 1;
        Self {
            items,
            number: window.number,
            num_pages: window.num_pages,
            total: window.total,
            has_next,
            has_previous,
            next_page_number: has_next.then(|| window.number + 1),
            previous_page_number: has_previous.then(|| window.number - 1),
        }
    }
}
