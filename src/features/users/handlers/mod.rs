pub mod profile_handler;

pub use profile_handler::{
    __path_deactivate_account, __path_get_profile, __path_set_pin, __path_update_profile,
    __path_upload_avatar, deactivate_account, get_profile, set_pin, update_profile,
    upload_avatar,
};
