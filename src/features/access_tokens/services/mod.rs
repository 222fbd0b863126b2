mod access_token_service;

pub use access_token_service::AccessTokenService;
