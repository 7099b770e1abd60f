pub(crate) mod changelog;
pub(crate) mod cursor;
pub(crate) mod scheduler;
pub(crate) mod snapshot;
pub(crate) mod worker;
