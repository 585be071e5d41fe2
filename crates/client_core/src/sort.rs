use shared::{
    domain::{SortColumn, SortOrder},
    protocol::ListMeetingsQuery,
};

/// Active `(column, order)` pair for a list. The server does the ordering;
/// this only decides what to ask for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SortController {
    column: SortColumn,
    order: SortOrder,
}

impl Default for SortController {
    fn default() -> Self {
        Self::new(SortColumn::MeetingDate, SortOrder::Desc)
    }
}

impl SortController {
    pub fn new(column: SortColumn, order: SortOrder) -> Self {
        Self { column, order }
    }

    pub fn column(&self) -> SortColumn {
        self.column
    }

    pub fn order(&self) -> SortOrder {
        self.order
    }

    /// Reselecting the active column flips the order; any other column
    /// becomes active in ascending order.
    pub fn select_column(&mut self, column: SortColumn) {
        if self.column == column {
            self.order = self.order.flipped();
        } else {
            self.column = column;
            self.order = SortOrder::Asc;
        }
    }

    pub fn query(&self) -> ListMeetingsQuery {
        ListMeetingsQuery {
            sort: self.column,
            order: self.order,
        }
    }
}
