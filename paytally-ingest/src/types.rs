/// Columns the payments table can carry. Anything else is ignored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Column {
    Submitted,
    Label,
    Kind,
    Duration,
    Amount,
}

impl Column {
    /// Classify a header cell by its text.
    pub fn from_header(text: &str) -> Option<Column> {
        let h = text.trim().to_ascii_lowercase();
        if h.is_empty() {
            None
        } else if h.contains("type") || h.contains("kind") {
            Some(Column::Kind)
        } else if h.contains("amount") || h.contains("earn") || h.contains("pay") {
            Some(Column::Amount)
        } else if h.contains("duration") || h.contains("spent") || h.contains("hours") {
            Some(Column::Duration)
        } else if h.contains("submitted") || h.contains("date") || h.contains("created") {
            Some(Column::Submitted)
        } else if h.contains("project") || h.contains("name") || h.contains("description") {
            Some(Column::Label)
        } else {
            None
        }
    }
}

/// Cell position of each known column in a table row.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ColumnMap {
    slots: Vec<Option<Column>>,
}

impl ColumnMap {
    /// Layout used when a page carries no header row.
    pub fn fallback() -> Self {
        Self {
            slots: vec![
                Some(Column::Submitted),
                Some(Column::Label),
                Some(Column::Kind),
                Some(Column::Duration),
                Some(Column::Amount),
            ],
        }
    }

    pub fn from_headers<S: AsRef<str>>(headers: &[S]) -> Self {
        Self {
            slots: headers.iter().map(|h| Column::from_header(h.as_ref())).collect(),
        }
    }

    pub fn index_of(&self, column: Column) -> Option<usize> {
        self.slots.iter().position(|c| *c == Some(column))
    }

    /// A map without an amount column can't produce entries.
    pub fn is_usable(&self) -> bool {
        self.index_of(Column::Amount).is_some()
    }

    /// Cell text for `column`, empty when the row has no such cell.
    pub fn get<'a>(&self, cells: &'a [String], column: Column) -> &'a str {
        self.index_of(column)
            .and_then(|i| cells.get(i))
            .map(String::as_str)
            .unwrap_or("")
    }
}
