mod recycle_bin_service;

pub use recycle_bin_service::RecycleBinService;
