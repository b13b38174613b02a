pub mod csv_io;
pub mod domain;
pub mod gate;
pub mod ports;
pub mod render;
pub mod view;

pub use csv_io::{export_csv, import_csv, parse_csv, CsvError, CsvExport, ImportReport, RowError};
pub use domain::{Card, CardDetails, Grading, ValidationError};
pub use gate::{AdminSession, GateError, GateOutcome, HashScheme, PasswordGate, PrivilegedAction};
pub use ports::{CardStore, PortError, PortResult};
pub use render::{render_dashboard, render_form, render_list, CardForm, DashboardView, FormView, ListView};
pub use view::{CardFilter, Collection, CollectionStatus, SortDirection, SortField, SortKey, ViewState, PAGE_SIZE};
