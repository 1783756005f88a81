#[macro_export]
macro_rules! reexport {
    ($module:ident) => {
        $crate::reexport!($module, false);
    };
    ($module:ident, test) => {
        $crate::reexport!($module, true);
    };
    ($module:ident, $is_test:literal) => {
        #[cfg_attr($is_test, cfg(test))]
        mod $module;
        #[cfg_attr($is_test, cfg(test))]
        #[allow(unused_imports)]
        #[allow(ambiguous_glob_reexports)]
        pub use $module::*;
    };
}

reexport!(testing, test);
reexport!(error);
reexport!(config);
reexport!(stats);
reexport!(document);
reexport!(parse);
reexport!(metadata);
reexport!(authority);
reexport!(diagnostics);
reexport!(autocomplete);
reexport!(workspace);
pub mod splitter;
pub mod sql;

#[allow(unused_imports)]
pub(crate) use tracing::{debug, error, info, span, trace, warn};
