pub mod share_handler;

pub use share_handler::{
    __path_leave_share, __path_list_file_shares, __path_list_share_candidates,
    __path_list_shared_with_me, __path_revoke_share, __path_share_file, __path_verify_shared_pin,
    leave_share, list_file_shares, list_share_candidates, list_shared_with_me, revoke_share,
    share_file, verify_shared_pin,
};
