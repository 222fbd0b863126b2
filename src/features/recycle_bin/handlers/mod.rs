pub mod recycle_bin_handler;

pub use recycle_bin_handler::{
    __path_confirm_restore, __path_list_bin, __path_purge, __path_request_restore,
    confirm_restore, list_bin, purge, request_restore,
};
