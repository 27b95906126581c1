const FOOTER_PREFIX: &str = "page ";

/// Packs rendered items into pages of at most `budget` characters.
///
/// Items are never split: an item longer than the budget gets a page of its own.
/// Concatenating the returned pages yields the concatenated input.
pub fn paginate<S: AsRef<str>>(items: &[S], budget: usize) -> Vec<String> {
    let mut pages = Vec::new();
    let mut current = String::new();
    let mut current_len = 0;

    for item in items {
        let item = item.as_ref();
        let item_len = item.chars().count();

        if !current.is_empty() && current_len + item_len > budget {
            pages.push(std::mem::take(&mut current));
            current_len = 0;
        }

        current.push_str(item);
        current_len += item_len;
    }

    if !current.is_empty() {
        pages.push(current);
    }

    pages
}

/// Footer appended to a page so the displayed page can be read back later.
pub fn page_footer(page: usize, total: usize) -> String {
    format!("\n{}{}/{}", FOOTER_PREFIX, page, total)
}

pub fn with_footer(page_text: &str, page: usize, total: usize) -> String {
    format!("{}{}", page_text, page_footer(page, total))
}

/// Reads `page <n>/<total>` from the last line of a message.
pub fn parse_page_footer(text: &str) -> Option<(usize, usize)> {
    let last_line = text.trim_end().lines().last()?;
    let (page, total) = last_line.trim().strip_prefix(FOOTER_PREFIX)?.split_once('/')?;
    let page = page.trim().parse::<usize>().ok()?;
    let total = total.trim().parse::<usize>().ok()?;

    (page >= 1 && page <= total).then_some((page, total))
}

/// Which navigation targets make sense from a given page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageNav {
    pub page: usize,
    pub total: usize,
    pub first: bool,
    pub previous: bool,
    pub next: bool,
    pub last: bool,
}

impl PageNav {
    pub fn new(page: usize, total: usize) -> Self {
        // at two pages first/last would duplicate previous/next
        let wide = total > 2;
        Self {
            page,
            total,
            first: wide && page > 2,
            previous: page > 1,
            next: page < total,
            last: wide && page + 1 < total,
        }
    }

    pub fn is_empty(&self) -> bool {
        !(self.first || self.previous || self.next || self.last)
    }
}
