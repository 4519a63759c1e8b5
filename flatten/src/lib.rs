pub mod config;
pub mod directive;
pub mod flattener;
pub mod inline;
pub mod normalize;
pub mod reference;
pub mod run;

pub use config::FlattenConfig;
pub use flattener::{
    FlattenDiagnostic, FlattenError, Flattened, Flattener, IncludeRecord, IncludeStatus,
};
pub use inline::FragmentShape;
pub use run::{flatten_file, normalize_file};
