mod admin_dtos;

pub use admin_dtos::{
    AdminDeletedDto, AdminDto, AdminSessionResponseDto, BlockedFileDto, CreateAdminDto,
    UpdateAccountStatusDto, UpdateAdminDto,
};
