//! In-memory list adapters: hold an already-fetched page of records,
//! filter it by free text and route selection / favorite actions to callbacks.

use crate::catalog::model::{Exercise, Workout};

/// Fields a free-text filter looks at.
pub trait Searchable {
    fn search_fields(&self) -> Vec<&str>;
}

impl Searchable for Exercise {
    fn search_fields(&self) -> Vec<&str> {
        let mut fields = vec![self.name.as_str(), self.category.as_str()];
        fields.extend(self.muscle_groups.iter().map(String::as_str));
        fields
    }
}

impl Searchable for Workout {
    fn search_fields(&self) -> Vec<&str> {
        vec![
            self.name.as_str(),
            self.category.as_str(),
            self.difficulty.as_str(),
        ]
    }
}

pub trait Favoritable {
    fn is_favorite(&self) -> bool;
}

impl Favoritable for Workout {
    fn is_favorite(&self) -> bool {
        self.is_favorite
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FavoriteAction {
    Add,
    Remove,
}

impl FavoriteAction {
    pub fn from_current(is_favorite: bool) -> Self {
        if is_favorite {
            FavoriteAction::Remove
        } else {
            FavoriteAction::Add
        }
    }
}

/// Case-insensitive substring match; a blank query matches everything.
pub fn matches<T: Searchable>(item: &T, query: &str) -> bool {
    let query = query.trim().to_lowercase();
    if query.is_empty() {
        return true;
    }
    item.search_fields()
        .iter()
        .any(|f| f.to_lowercase().contains(&query))
}

type Callback<T> = Box<dyn Fn(&T) + Send + Sync>;

pub struct CatalogList<T> {
    items: Vec<T>,
    visible: Vec<usize>,
    query: String,
    on_select: Option<Callback<T>>,
    on_favorite: Option<Callback<T>>,
}

impl<T> Default for CatalogList<T> {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            visible: Vec::new(),
            query: String::new(),
            on_select: None,
            on_favorite: None,
        }
    }
}

impl<T: Searchable> CatalogList<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on_select(mut self, f: impl Fn(&T) + Send + Sync + 'static) -> Self {
        self.on_select = Some(Box::new(f));
        self
    }

    pub fn on_favorite(mut self, f: impl Fn(&T) + Send + Sync + 'static) -> Self {
        self.on_favorite = Some(Box::new(f));
        self
    }

    /// Replaces the page; the current query is reapplied.
    pub fn submit(&mut self, items: Vec<T>) {
        self.items = items;
        self.refresh();
    }

    pub fn filter(&mut self, query: &str) {
        self.query = query.to_string();
        self.refresh();
    }

    fn refresh(&mut self) {
        self.visible = self
            .items
            .iter()
            .enumerate()
            .filter(|(_, item)| matches(*item, &self.query))
            .map(|(i, _)| i)
            .collect();
    }

    pub fn len(&self) -> usize {
        self.visible.len()
    }

    pub fn is_empty(&self) -> bool {
        self.visible.is_empty()
    }

    pub fn visible(&self) -> impl Iterator<Item = &T> {
        self.visible.iter().map(|&i| &self.items[i])
    }

    pub fn get(&self, position: usize) -> Option<&T> {
        self.visible.get(position).map(|&i| &self.items[i])
    }

    /// Positions are relative to the filtered view.
    pub fn select(&self, position: usize) -> Option<&T> {
        let item = self.get(position)?;
        if let Some(cb) = &self.on_select {
            cb(item);
        }
        Some(item)
    }

    pub fn into_visible(self) -> Vec<T> {
        let keep: std::collections::HashSet<usize> = self.visible.into_iter().collect();
        self.items
            .into_iter()
            .enumerate()
            .filter(|(i, _)| keep.contains(i))
            .map(|(_, item)| item)
            .collect()
    }
}

impl<T: Searchable + Favoritable> CatalogList<T> {
    /// Reports which way the favorite state should flip for the row.
    pub fn toggle_favorite(&self, position: usize) -> Option<FavoriteAction> {
        let item = self.get(position)?;
        if let Some(cb) = &self.on_favorite {
            cb(item);
        }
        Some(FavoriteAction::from_current(item.is_favorite()))
    }
}
