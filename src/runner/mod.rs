pub mod api;
pub mod ds;
pub mod eval;
pub mod plugin;
pub mod runtime;
pub mod std_lib;
