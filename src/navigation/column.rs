use crate::models::{Library, ListItem, MediaItem, MixedItem, Playlist, Season, Show};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnType {
    Libraries,
    Movies,
    Shows,
    Mixed,
    Seasons,
    Episodes,
    Playlists,
    PlaylistItems,
}

/// The entity sequence a column holds, tagged by `ColumnType` (spec §4.7).
#[derive(Debug, Clone)]
pub enum ColumnItems {
    Libraries(Vec<Library>),
    Movies(Vec<MediaItem>),
    Shows(Vec<Show>),
    Mixed(Vec<MixedItem>),
    Seasons(Vec<Season>),
    Episodes(Vec<MediaItem>),
    Playlists(Vec<Playlist>),
    PlaylistItems(Vec<MediaItem>),
}

impl ColumnItems {
    pub fn kind(&self) -> ColumnType {
        match self {
            ColumnItems::Libraries(_) => ColumnType::Libraries,
            ColumnItems::Movies(_) => ColumnType::Movies,
            ColumnItems::Shows(_) => ColumnType::Shows,
            ColumnItems::Mixed(_) => ColumnType::Mixed,
            ColumnItems::Seasons(_) => ColumnType::Seasons,
            ColumnItems::Episodes(_) => ColumnType::Episodes,
            ColumnItems::Playlists(_) => ColumnType::Playlists,
            ColumnItems::PlaylistItems(_) => ColumnType::PlaylistItems,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            ColumnItems::Libraries(v) => v.len(),
            ColumnItems::Movies(v) => v.len(),
            ColumnItems::Shows(v) => v.len(),
            ColumnItems::Mixed(v) => v.len(),
            ColumnItems::Seasons(v) => v.len(),
            ColumnItems::Episodes(v) => v.len(),
            ColumnItems::Playlists(v) => v.len(),
            ColumnItems::PlaylistItems(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Type-erased view for cursor/title/search logic that doesn't care
    /// which concrete entity a column holds (spec §3.1 "ListItem capability").
    pub fn as_list_items(&self) -> Vec<&dyn ListItem> {
        match self {
            ColumnItems::Libraries(v) => v.iter().map(|i| i as &dyn ListItem).collect(),
            ColumnItems::Movies(v) => v.iter().map(|i| i as &dyn ListItem).collect(),
            ColumnItems::Shows(v) => v.iter().map(|i| i as &dyn ListItem).collect(),
            ColumnItems::Mixed(v) => v.iter().map(|i| i as &dyn ListItem).collect(),
            ColumnItems::Seasons(v) => v.iter().map(|i| i as &dyn ListItem).collect(),
            ColumnItems::Episodes(v) => v.iter().map(|i| i as &dyn ListItem).collect(),
            ColumnItems::Playlists(v) => v.iter().map(|i| i as &dyn ListItem).collect(),
            ColumnItems::PlaylistItems(v) => v.iter().map(|i| i as &dyn ListItem).collect(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortSpec {
    TitleAsc,
    TitleDesc,
    RecentlyAdded,
}

/// One level of the Miller-columns navigation stack.
#[derive(Debug, Clone)]
pub struct Column {
    pub kind: ColumnType,
    pub title: String,
    pub items: ColumnItems,
    pub cursor: usize,
    pub focused: bool,
    pub loading: bool,
    pub filter: Option<String>,
    pub filter_typing: bool,
    pub sort: Option<SortSpec>,
    pub spinner_frame: usize,
}

impl Column {
    pub fn new(title: impl Into<String>, items: ColumnItems) -> Self {
        Self {
            kind: items.kind(),
            title: title.into(),
            items,
            cursor: 0,
            focused: false,
            loading: false,
            filter: None,
            filter_typing: false,
            sort: None,
            spinner_frame: 0,
        }
    }

    pub fn current(&self) -> Option<&dyn ListItem> {
        self.items.as_list_items().into_iter().nth(self.cursor)
    }

    /// Moves the cursor to the item whose `get_id()` matches `id`. Returns
    /// `false` if no such item exists (spec §4.8 step 2).
    pub fn set_selected_by_id(&mut self, id: &str) -> bool {
        match self.items.as_list_items().into_iter().position(|item| item.get_id() == id) {
            Some(idx) => {
                self.cursor = idx;
                true
            }
            None => false,
        }
    }
}

/// A stack of columns plus a parallel cursor-save stack (spec §4.7).
/// Invariant: `cursor_saves.len() == columns.len().saturating_sub(1)`.
#[derive(Debug, Clone, Default)]
pub struct ColumnStack {
    columns: Vec<Column>,
    cursor_saves: Vec<usize>,
}

impl ColumnStack {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn top(&self) -> Option<&Column> {
        self.columns.last()
    }

    pub fn top_mut(&mut self) -> Option<&mut Column> {
        self.columns.last_mut()
    }

    pub fn parent(&self) -> Option<&Column> {
        let len = self.columns.len();
        if len < 2 {
            return None;
        }
        self.columns.get(len - 2)
    }

    pub fn depth(&self) -> usize {
        self.columns.len()
    }

    pub fn can_go_back(&self) -> bool {
        self.columns.len() > 1
    }

    pub fn push(&mut self, mut new_column: Column, saved_cursor: usize) {
        if let Some(top) = self.columns.last_mut() {
            self.cursor_saves.push(top.cursor);
            top.focused = false;
        }
        new_column.cursor = saved_cursor;
        new_column.focused = true;
        self.columns.push(new_column);
    }

    /// Refuses to pop the last column, returning `None`.
    pub fn pop(&mut self) -> Option<(Column, usize)> {
        if self.columns.len() <= 1 {
            return None;
        }
        let mut popped = self.columns.pop().expect("len > 1 checked above");
        popped.focused = false;
        let restored_cursor = self.cursor_saves.pop().unwrap_or(0);
        if let Some(top) = self.columns.last_mut() {
            top.focused = true;
            top.cursor = restored_cursor;
        }
        Some((popped, restored_cursor))
    }

    /// Swaps the top column without touching the cursor-save stack.
    pub fn replace(&mut self, mut new_column: Column) {
        new_column.focused = true;
        if let Some(top) = self.columns.last_mut() {
            *top = new_column;
        } else {
            self.columns.push(new_column);
        }
    }

    pub fn reset(&mut self, mut column: Column) {
        self.columns.clear();
        self.cursor_saves.clear();
        column.focused = true;
        self.columns.push(column);
    }

    pub fn update_spinner_frame(&mut self, frame: usize) {
        for column in &mut self.columns {
            column.spinner_frame = frame;
        }
    }
}
