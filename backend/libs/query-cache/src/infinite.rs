//! Cached state of a cursor-paginated ("load more") list

/// One loaded page
#[derive(Debug, Clone, PartialEq)]
pub struct PageData<T> {
    pub items: Vec<T>,
    pub next_cursor: Option<String>,
}

/// Pages loaded so far, oldest request first
#[derive(Debug, Clone, PartialEq)]
pub struct InfinitePages<T> {
    pub pages: Vec<PageData<T>>,
}

impl<T> Default for InfinitePages<T> {
    fn default() -> Self {
        Self { pages: Vec::new() }
    }
}

impl<T> InfinitePages<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_page(&mut self, page: PageData<T>) {
        self.pages.push(page);
    }

    /// Cursor for the next "load more", `None` once the list is exhausted
    /// or before anything was loaded.
    pub fn next_cursor(&self) -> Option<&str> {
        self.pages.last().and_then(|p| p.next_cursor.as_deref())
    }

    pub fn has_next_page(&self) -> bool {
        self.next_cursor().is_some()
    }

    /// Put a freshly created item at the top of the list.
    ///
    /// Returns `false` when no page has been loaded yet; the item will show
    /// up on the first fetch instead.
    pub fn prepend_to_first_page(&mut self, item: T) -> bool {
        match self.pages.first_mut() {
            Some(first) => {
                first.items.insert(0, item);
                true
            }
            None => false,
        }
    }

    /// Drop items from every page; returns how many were removed.
    pub fn retain<F: FnMut(&T) -> bool>(&mut self, mut keep: F) -> usize {
        let mut removed = 0;
        for page in &mut self.pages {
            let before = page.items.len();
            page.items.retain(|item| keep(item));
            removed += before - page.items.len();
        }
        removed
    }

    pub fn for_each_mut<F: FnMut(&mut T)>(&mut self, mut f: F) {
        for item in self.pages.iter_mut().flat_map(|p| p.items.iter_mut()) {
            f(item);
        }
    }

    pub fn items(&self) -> impl Iterator<Item = &T> {
        self.pages.iter().flat_map(|p| p.items.iter())
    }
}
