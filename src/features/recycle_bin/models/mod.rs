mod recycle_bin_entry;

pub use recycle_bin_entry::{RecycleBinEntry, RecycleBinRow, RecycleStatus};
