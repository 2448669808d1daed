use crate::filters::{self, FilterSpec, FilterState, FilterValue};
use crate::paging::{page_window, PaginationState};
use crate::records::Record;
use crate::search::filter_indices;
use crate::sorting::{sort_indices, SortState};
use serde::{Deserialize, Serialize};
use serde_json::Value;

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ColumnSpec {
    pub key: String,
    #[serde(default)]
    pub header: String,
    #[serde(default = "default_true")]
    pub sortable: bool,
    #[serde(default)]
    pub filterable: bool,
    /// Layout hint passed through to the renderer untouched.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<Value>,
}

/// The collection a view works on plus the specs that shape it.
#[derive(Debug, Clone, Default)]
pub struct Table {
    pub records: Vec<Record>,
    pub columns: Vec<ColumnSpec>,
    pub filters: Vec<FilterSpec>,
    pub row_key: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ViewState {
    pub search_query: String,
    pub filter_state: FilterState,
    pub sort: SortState,
    pub pagination: PaginationState,
}

impl ViewState {
    pub fn initial(table: &Table, page_size: usize) -> Self {
        ViewState {
            search_query: String::new(),
            filter_state: filters::initial_state(&table.filters),
            sort: SortState::default(),
            pagination: PaginationState::first(page_size),
        }
    }

    /// Applies one user action. The page is not reclamped here; `View`
    /// settles it against the recomputed count.
    pub fn reduce(&self, table: &Table, action: Action, default_page_size: usize) -> ViewState {
        let mut next = self.clone();
        match action {
            Action::Search(query) => {
                next.search_query = query;
                next.pagination = PaginationState::first(self.pagination.page_size);
            }
            Action::SetFilter { name, value } => {
                next.filter_state =
                    filters::with_value(&table.filters, &self.filter_state, &name, value);
                next.pagination = PaginationState::first(self.pagination.page_size);
            }
            Action::ReplaceFilters(incoming) => {
                next.filter_state = filters::replaced(&table.filters, &incoming);
                next.pagination = PaginationState::first(self.pagination.page_size);
            }
            Action::ClearFilters => {
                next.search_query = String::new();
                next.filter_state = filters::initial_state(&table.filters);
                next.pagination = PaginationState::first(self.pagination.page_size);
            }
            Action::ToggleSort(column) => {
                next.sort = self.sort.toggled(&column, &table.columns);
            }
            Action::SetSort(requested) => {
                next.sort = self.sort.validated(requested, &table.columns);
            }
            Action::SetPage(page) => {
                next.pagination =
                    PaginationState::new(page, self.pagination.page_size as i64, default_page_size);
            }
            Action::SetPageSize(size) => {
                next.pagination = PaginationState::new(1, size, default_page_size);
            }
        }
        next
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    Search(String),
    SetFilter { name: String, value: FilterValue },
    ReplaceFilters(FilterState),
    ClearFilters,
    ToggleSort(String),
    SetSort(SortState),
    SetPage(i64),
    SetPageSize(i64),
}

/// Derived view of a table under one state.
#[derive(Debug, Clone, PartialEq)]
pub struct ViewModel {
    /// Every matching record index, in display order.
    pub ordered: Vec<usize>,
    /// Record indexes on the current page.
    pub visible: Vec<usize>,
    pub total_filtered_count: usize,
    pub total_pages: usize,
    pub current_page: usize,
    pub page_size: usize,
    pub page_window: Vec<usize>,
    pub active_filter_count: usize,
}

/// Search, filter, sort, then slice the current page. The page used is the
/// state's page clamped to what the filtered count allows.
pub fn compute(table: &Table, state: &ViewState) -> ViewModel {
    let matched = filter_indices(
        &table.records,
        &state.search_query,
        &table.filters,
        &state.filter_state,
    );
    let ordered = sort_indices(&table.records, &matched, &state.sort);
    let count = ordered.len();
    let pagination = state.pagination.clamped(count);
    let total_pages = pagination.total_pages(count);
    let visible = ordered[pagination.range(count)].to_vec();

    ViewModel {
        visible,
        total_filtered_count: count,
        total_pages,
        current_page: pagination.current_page,
        page_size: pagination.page_size,
        page_window: page_window(pagination.current_page, total_pages),
        active_filter_count: filters::active_filter_count(&table.filters, &state.filter_state),
        ordered,
    }
}

/// One open list screen: its table, its state, and the last computed view.
#[derive(Debug, Clone)]
pub struct View {
    pub table: Table,
    pub state: ViewState,
    model: ViewModel,
    default_page_size: usize,
}

impl View {
    pub fn new(table: Table, page_size: Option<i64>, default_page_size: usize) -> Self {
        let page_size = PaginationState::new(1, page_size.unwrap_or(0), default_page_size).page_size;
        let state = ViewState::initial(&table, page_size);
        let model = compute(&table, &state);
        View {
            table,
            state,
            model,
            default_page_size,
        }
    }

    pub fn model(&self) -> &ViewModel {
        &self.model
    }

    pub fn dispatch(&mut self, action: Action) -> &ViewModel {
        let next = self
            .state
            .reduce(&self.table, action, self.default_page_size);
        self.settle(next);
        &self.model
    }

    /// New collection: search, filters, sort and page start over. The page
    /// size is kept.
    pub fn replace_records(&mut self, records: Vec<Record>) -> &ViewModel {
        self.table.records = records;
        self.reset()
    }

    pub fn replace_filter_specs(&mut self, specs: Vec<FilterSpec>) -> &ViewModel {
        self.table.filters = specs;
        self.reset()
    }

    fn reset(&mut self) -> &ViewModel {
        let next = ViewState::initial(&self.table, self.state.pagination.page_size);
        self.settle(next);
        &self.model
    }

    fn settle(&mut self, next: ViewState) {
        let model = compute(&self.table, &next);
        self.state = next;
        self.state.pagination.current_page = model.current_page;
        self.model = model;
    }
}
