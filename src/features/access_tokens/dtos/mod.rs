mod access_token_dto;

pub use access_token_dto::{IssueTokenDto, IssuedTokenDto, TokenValidationDto, ValidateTokenDto};
