pub mod access_token_handler;

pub use access_token_handler::{
    __path_issue_token, __path_validate_token, issue_token, validate_token,
};
