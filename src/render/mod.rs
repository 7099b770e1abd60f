pub(crate) mod fullmap;
pub(crate) mod tile;
