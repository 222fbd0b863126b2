pub mod admin_handler;

pub use admin_handler::{
    __path_approve_restore, __path_create_admin, __path_delete_admin, __path_list_admins,
    __path_list_audit_logs, __path_list_blocked_files, __path_list_restore_requests,
    __path_list_users, __path_reject_restore, __path_set_user_status, __path_sign_in,
    __path_unblock_file, __path_update_admin, approve_restore, create_admin, delete_admin,
    list_admins, list_audit_logs, list_blocked_files, list_restore_requests, list_users,
    reject_restore, set_user_status, sign_in, unblock_file, update_admin,
};
