pub mod file_handler;

pub use file_handler::{
    __path_check_scan, __path_delete_file, __path_download_file, __path_get_file,
    __path_list_files, __path_replace_file, __path_request_unblock, __path_start_scan,
    __path_upload_file, __path_verify_pin, __path_verify_unblock, check_scan, delete_file,
    download_file, get_file, list_files, read_upload, replace_file, request_unblock, start_scan,
    upload_file, verify_pin, verify_unblock,
};
